//! Polls a running instance's `/api/v2/health` and prints the response.

use anyhow::{Context, Result};

pub async fn run(base_url: String) -> Result<()> {
    let url = format!("{}/api/v2/health", base_url.trim_end_matches('/'));
    let body: serde_json::Value =
        reqwest::get(&url).await.with_context(|| format!("GET {url}"))?.json().await.context("decoding health response")?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
