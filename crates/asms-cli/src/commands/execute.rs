//! Runs exactly one unit in-process, with no transport started —
//! useful for scripting and for exercising a unit without standing up a
//! server.

use crate::stack::build_stack;
use anyhow::{Context, Result};
use asms_core::{AsmsConfig, Request, RequestType};
use clap::ValueEnum;
use tokio_util::sync::CancellationToken;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum RequestTypeArg {
    Command,
    Query,
}

impl From<RequestTypeArg> for RequestType {
    fn from(value: RequestTypeArg) -> Self {
        match value {
            RequestTypeArg::Command => RequestType::Command,
            RequestTypeArg::Query => RequestType::Query,
        }
    }
}

pub async fn run(config: AsmsConfig, request_type: RequestTypeArg, unit: String, input: String) -> Result<()> {
    let stack = build_stack(&config)?;
    let input_value: serde_json::Value = serde_json::from_str(&input).context("--input must be a JSON object")?;
    let input_map = input_value
        .as_object()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("--input must be a JSON object"))?
        .into_iter()
        .collect();

    let request = Request::new(request_type.into(), unit, input_map);
    let response = stack.gateway.handle(CancellationToken::new(), request).await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
