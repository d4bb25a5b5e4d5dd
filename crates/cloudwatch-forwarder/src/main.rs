// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::{env, process::ExitCode, sync::Arc};
use tokio::io::BufReader;
use tracing::{debug, error, info};

use cloudwatch_shipper::{
    cloudwatch::CloudWatchLogsClient, config::ForwarderConfig, forward::forward_lines, logger,
    shipper::SequencedLogShipper,
};

#[tokio::main]
pub async fn main() -> ExitCode {
    // Logging comes up before the config so config errors are visible
    let log_level = env::var("CLOUDWATCH_LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("info".to_string());
    if let Err(e) = logger::init(&log_level) {
        eprintln!("Unable to set up logging: {e}");
        return ExitCode::FAILURE;
    }
    debug!("Logging subsystem enabled");

    let config = match ForwarderConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let client = Arc::new(CloudWatchLogsClient::from_config(&config));

    info!("Running cloudwatch logger...");
    let mut shipper = match SequencedLogShipper::new(
        client,
        config.log_group.clone(),
        config.log_stream.clone(),
        config.shipper_options(),
    )
    .await
    {
        Ok(s) => s,
        Err(e) => {
            error!("Unable to start cloudwatch logger: {e}");
            return ExitCode::FAILURE;
        }
    };
    info!("Logger is up");

    info!("Streaming logs...");
    let stdin = BufReader::new(tokio::io::stdin());
    match forward_lines(stdin, &mut shipper, config.max_line_bytes()).await {
        Ok(count) => {
            info!("Streaming logs ended after {count} lines");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error reading input: {e}");
            ExitCode::FAILURE
        }
    }
}
