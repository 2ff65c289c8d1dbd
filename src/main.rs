// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::{bail, Context as _, Result};
use std::env;
use std::fs;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use maestro::config::load_properties;
use maestro::context::User;
use maestro::executor::{Config, Executor};
use maestro::serialisation::OperationSerialiser;

const EXECUTOR_ID: &str = "maestro-cli";
const CLI_USER: &str = "cli";

/// Parse a comma-separated auth list, ignoring blanks
fn parse_auths(arg: Option<&String>) -> Vec<String> {
    arg.map(|list| {
        list.split(',')
            .map(str::trim)
            .filter(|auth| !auth.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <properties> <operation-file> [auth,...]", args[0]);
        eprintln!("Example: {} configs/executor.yaml configs/operation.json User,ReadUser", args[0]);
        std::process::exit(1);
    }

    let output = run(&args[1], &args[2], parse_auths(args.get(3))).await?;
    println!("{}", output);
    Ok(())
}

async fn run(properties_path: &str, operation_path: &str, auths: Vec<String>) -> Result<String> {
    let properties = load_properties(properties_path)
        .with_context(|| format!("loading properties from {}", properties_path))?;
    let serialiser = OperationSerialiser::from_properties(&properties.serialiser);

    let content = fs::read_to_string(operation_path)
        .with_context(|| format!("reading operation from {}", operation_path))?;
    let operation = serialiser.deserialise(&content)?;

    let config = Config::from_properties(EXECUTOR_ID, properties)?;
    let executor = Executor::new(config)?;
    if !executor.is_supported(operation.kind()) {
        bail!("operation {} is not supported by this executor", operation.kind());
    }

    let user = User::builder(CLI_USER).op_auths(auths).build();
    let started = Instant::now();
    let result = executor.execute_as(&operation, user).await?;
    tracing::info!(
        operation = %operation.kind(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Operation complete"
    );

    Ok(serde_json::to_string_pretty(&result)?)
}
