// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::constants::{
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_RETRY_BACKOFF_BASE_MS, MAX_MSG_SIZE, MAX_RETRIES,
    NULL_SEQUENCE_TOKEN,
};
use crate::error::ConfigError;
use crate::retry::RetryStrategy;
use crate::shipper::ShipperOptions;
use aws_sdk_cloudwatchlogs::config::Credentials;
use std::env;
use std::str::FromStr;
use std::time::Duration;

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Name under which the static credentials are reported by the SDK
const CREDENTIALS_PROVIDER_NAME: &str = "cloudwatch-forwarder-env";

/// Configuration of the forwarder, read from the environment
#[derive(Debug, Clone)]
pub struct ForwarderConfig {
    /// Destination log group
    pub log_group: String,
    /// Destination log stream inside `log_group`
    pub log_stream: String,
    pub credentials: Credentials,
    pub region: String,
    /// Endpoint override, the SDK resolves the regional endpoint otherwise
    pub endpoint: Option<String>,
    /// PutLogEvents attempts per line
    pub max_retries: u32,
    /// Lines longer than this many characters are truncated
    pub max_message_size: usize,
    /// Base of the exponential backoff after generic failures, 0 disables it
    pub retry_backoff_base_ms: u64,
    pub request_timeout: Duration,
    /// Console log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl ForwarderConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let log_group = required("CLOUDWATCH_LOG_GROUP")?;
        let log_stream = required("CLOUDWATCH_LOG_STREAM")?;
        let access_key_id = required("AWS_ACCESS_KEY_ID")?;
        let secret_access_key = required("AWS_SECRET_ACCESS_KEY")?;
        let session_token = env::var("AWS_SESSION_TOKEN")
            .ok()
            .filter(|token| !token.is_empty());
        let region = required("AWS_REGION").or_else(|_| {
            env::var("AWS_DEFAULT_REGION")
                .ok()
                .filter(|region| !region.is_empty())
                .ok_or(ConfigError::MissingVariable("AWS_REGION"))
        })?;

        let endpoint = env::var("CLOUDWATCH_ENDPOINT_URL")
            .ok()
            .filter(|url| !url.is_empty());

        let max_retries = parsed("CLOUDWATCH_MAX_RETRIES", MAX_RETRIES)?;
        let max_message_size = parsed("CLOUDWATCH_MAX_MESSAGE_SIZE", MAX_MSG_SIZE)?;
        let retry_backoff_base_ms =
            parsed("CLOUDWATCH_RETRY_BACKOFF_MS", DEFAULT_RETRY_BACKOFF_BASE_MS)?;
        let request_timeout = Duration::from_secs(parsed(
            "CLOUDWATCH_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?);

        let log_level = env::var("CLOUDWATCH_LOG_LEVEL")
            .map(|val| val.to_lowercase())
            .unwrap_or_else(|_| "info".to_string());

        let config = ForwarderConfig {
            log_group,
            log_stream,
            credentials: Credentials::new(
                access_key_id,
                secret_access_key,
                session_token,
                None,
                CREDENTIALS_PROVIDER_NAME,
            ),
            region,
            endpoint,
            max_retries,
            max_message_size,
            retry_backoff_base_ms,
            request_timeout,
            log_level,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_group.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "CLOUDWATCH_LOG_GROUP cannot be empty".to_string(),
            ));
        }

        if self.log_stream.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "CLOUDWATCH_LOG_STREAM cannot be empty".to_string(),
            ));
        }

        // CloudWatch refuses these characters in stream names
        if self.log_stream.contains([':', '*']) {
            return Err(ConfigError::Invalid(format!(
                "Log stream name '{}' cannot contain ':' or '*'",
                self.log_stream
            )));
        }

        if let Some(endpoint) = &self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(ConfigError::Invalid(format!(
                    "CLOUDWATCH_ENDPOINT_URL '{endpoint}' must be an http or https URL"
                )));
            }
        }

        if self.max_retries == 0 {
            return Err(ConfigError::Invalid(
                "CLOUDWATCH_MAX_RETRIES must be greater than 0".to_string(),
            ));
        }

        if self.max_message_size == 0 || self.max_message_size > MAX_MSG_SIZE {
            return Err(ConfigError::Invalid(format!(
                "CLOUDWATCH_MAX_MESSAGE_SIZE must be between 1 and {MAX_MSG_SIZE}"
            )));
        }

        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }

        Ok(())
    }

    pub fn retry_strategy(&self) -> RetryStrategy {
        RetryStrategy::from_backoff(self.max_retries, self.retry_backoff_base_ms)
    }

    /// Bytes of an input line worth reading: enough for `max_message_size`
    /// characters of up to 4 bytes each.
    pub fn max_line_bytes(&self) -> usize {
        self.max_message_size.saturating_mul(4)
    }

    pub fn shipper_options(&self) -> ShipperOptions {
        ShipperOptions {
            max_message_size: self.max_message_size,
            retry_strategy: self.retry_strategy(),
            null_sequence_token: NULL_SEQUENCE_TOKEN.to_string(),
        }
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::MissingVariable(name))
}

fn parsed<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        Err(_) => Ok(default),
    }
}
