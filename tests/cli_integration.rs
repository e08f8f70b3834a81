use assert_cmd::Command;
use predicates::prelude::*;
use std::error::Error;
use tempfile::tempdir;

fn bqsql_cmd() -> Command {
    Command::cargo_bin("bqsql-cli").expect("binary should build")
}

#[test]
fn test_cli_help() -> Result<(), Box<dyn Error>> {
    bqsql_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("index"))
        .stdout(predicate::str::contains("query"))
        .stdout(predicate::str::contains("stats"))
        .stdout(predicate::str::contains("clear"));
    Ok(())
}

#[test]
fn test_cli_version() -> Result<(), Box<dyn Error>> {
    bqsql_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("bqsql-cli"));
    Ok(())
}

#[test]
fn test_cli_no_subcommand_fails() -> Result<(), Box<dyn Error>> {
    bqsql_cmd().assert().failure();
    Ok(())
}

#[test]
fn test_index_requires_project_and_dataset() -> Result<(), Box<dyn Error>> {
    bqsql_cmd()
        .arg("index")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--project-id"));

    bqsql_cmd()
        .arg("index")
        .arg("--project-id")
        .arg("my_project")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--dataset-id"));
    Ok(())
}

#[test]
fn test_query_requires_question() -> Result<(), Box<dyn Error>> {
    bqsql_cmd().arg("query").assert().failure();
    Ok(())
}

#[test]
fn test_unknown_subcommand_fails() -> Result<(), Box<dyn Error>> {
    bqsql_cmd()
        .arg("frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("frobnicate"));
    Ok(())
}

// Runs `index` with no credentials in the environment. The command must
// create a default config file at the override path and fail before making
// any network request.
#[test]
fn test_index_without_credentials_fails_and_creates_config() -> Result<(), Box<dyn Error>> {
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.toml");

    bqsql_cmd()
        .env("BQSQL_TEST_CONFIG_PATH", &config_path)
        .env_remove("BIGQUERY_ACCESS_TOKEN")
        .env_remove("OPENAI_API_KEY")
        .arg("index")
        .arg("--project-id")
        .arg("my_project")
        .arg("--dataset-id")
        .arg("my_dataset")
        .assert()
        .failure()
        .stderr(predicate::str::contains("BIGQUERY_ACCESS_TOKEN"));

    assert!(config_path.exists(), "default config should be written");
    let content = std::fs::read_to_string(&config_path)?;
    assert!(content.contains("qdrant_url"));
    Ok(())
}
