use anyhow::Result;
use qdrant_client::Qdrant;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::store::delete_all;

/// Handles the `clear` command.
pub async fn handle_clear(config: &AppConfig, client: Arc<Qdrant>) -> Result<()> {
    let existed = delete_all(client, &config.collection_name).await?;
    if existed {
        println!("Collection '{}' deleted.", config.collection_name);
    } else {
        println!("Collection '{}' did not exist.", config.collection_name);
    }
    Ok(())
}
