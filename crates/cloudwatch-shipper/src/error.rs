// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::store::StoreError;

/// Errors that prevent the shipper from being started.
///
/// Once a shipper exists, delivery problems are never reported through this
/// type; they are logged and absorbed by [`crate::shipper::SequencedLogShipper`].
#[derive(Debug, thiserror::Error)]
pub enum ShipperError {
    #[error("Unable to ensure log group '{group}': {source}")]
    LogGroup {
        group: String,
        #[source]
        source: StoreError,
    },

    #[error("Unable to ensure log stream '{stream}' in group '{group}': {source}")]
    LogStream {
        group: String,
        stream: String,
        #[source]
        source: StoreError,
    },
}

/// Errors raised while reading or validating the forwarder configuration
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is not set")]
    MissingVariable(&'static str),

    #[error("Invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ConfigError::MissingVariable("CLOUDWATCH_LOG_GROUP");
        assert_eq!(
            error.to_string(),
            "CLOUDWATCH_LOG_GROUP environment variable is not set"
        );

        let error = ConfigError::InvalidValue {
            name: "CLOUDWATCH_MAX_RETRIES",
            value: "many".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid value for CLOUDWATCH_MAX_RETRIES: 'many'"
        );
    }

    #[test]
    fn test_shipper_error_names_destination() {
        let error = ShipperError::LogStream {
            group: "app".to_string(),
            stream: "web-1".to_string(),
            source: StoreError::Transport("connection refused".to_string()),
        };
        let message = error.to_string();
        assert!(message.contains("'web-1'"));
        assert!(message.contains("'app'"));
        assert!(message.contains("connection refused"));
    }
}
