//! Ask command

use crate::app::AskArgs;
use anyhow::Result;
use futures::StreamExt;
use qasystem_core::{pipeline, AskRequest, Config, Context, QaError, Question};
use std::io::Read;
use tokio::io::AsyncWriteExt;

pub async fn run(args: AskArgs, config: &Config) -> Result<()> {
    let request = match (args.question, args.topic) {
        (Some(question), Some(topic)) => AskRequest {
            questions: vec![Question::new(question, topic)],
        },
        _ => read_request(args.input.as_deref())?,
    };

    let ctx = Context::from_config(config)?;
    let mut frames = pipeline::ask(&ctx, request).await?;

    let mut stdout = tokio::io::stdout();
    while let Some(frame) = frames.next().await {
        stdout.write_all(frame?.as_bytes()).await?;
        stdout.flush().await?;
    }
    Ok(())
}

fn read_request(input: Option<&std::path::Path>) -> Result<AskRequest> {
    let raw = match input {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)?,
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let request = serde_json::from_str(&raw)
        .map_err(|e| QaError::InvalidInput(format!("invalid request: {}", e)))?;
    Ok(request)
}
