//! Console output formatting for query results.

use colored::Colorize;

use crate::sqlgen::SqlGeneration;

/// Prints the generated SQL, optionally preceded by the candidate tables.
pub fn print_sql_generation(generation: &SqlGeneration, show_tables: bool) {
    if show_tables {
        println!("{}", "Candidate tables:".green());
        for candidate in &generation.tables {
            println!("  {} (similarity: {:.2})", candidate.id.yellow(), candidate.score);
        }
        println!();
    }
    println!("{}", "SQLQuery:".green());
    println!("{}", generation.sql);
}
