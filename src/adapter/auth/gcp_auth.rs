//! GCP Authentication
//!
//! Google Cloud Platform認証機能

use anyhow::{Context, Result};
use google_cloud_bigquery::client::{Client, ClientConfig};
use log::info;
use std::path::Path;

/// Expands tilde in path and returns the full path
pub fn expand_key_path(key_path: &str) -> String {
    shellexpand::tilde(key_path).to_string()
}

/// Creates a BigQuery client
///
/// With a key path the service account key is used, otherwise
/// Application Default Credentials.
pub async fn create_bigquery_client(key_path: Option<&str>) -> Result<Client> {
    if let Some(key_path) = key_path {
        let expanded_path = expand_key_path(key_path);
        if !Path::new(&expanded_path).is_file() {
            anyhow::bail!("Service account key file not found: {}", expanded_path);
        }
        std::env::set_var("GOOGLE_APPLICATION_CREDENTIALS", &expanded_path);
        info!("Authenticating with service account key {}", expanded_path);
    } else {
        info!("No service account key configured, using Application Default Credentials");
    }

    let (config, _project_id) = ClientConfig::new_with_auth()
        .await
        .context("Failed to authenticate with Google Cloud")?;

    let client = Client::new(config)
        .await
        .context("Failed to create BigQuery client")?;

    Ok(client)
}
