// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! [`LogStore`] backed by the AWS SDK for CloudWatch Logs.
//!
//! The SDK's own retries are disabled: every attempt is driven by the shipper,
//! which needs to see each sequence token error to resynchronise.

use crate::config::ForwarderConfig;
use crate::store::{
    LogGroup, LogGroupsPage, LogStore, PutLogEventsRequest, PutLogEventsResponse,
    RejectedLogEventsInfo, StoreError, TokenMismatchKind,
};
use async_trait::async_trait;
use aws_sdk_cloudwatchlogs::config::retry::RetryConfig;
use aws_sdk_cloudwatchlogs::config::timeout::TimeoutConfig;
use aws_sdk_cloudwatchlogs::config::{BehaviorVersion, Region};
use aws_sdk_cloudwatchlogs::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_cloudwatchlogs::operation::create_log_group::CreateLogGroupError;
use aws_sdk_cloudwatchlogs::operation::create_log_stream::CreateLogStreamError;
use aws_sdk_cloudwatchlogs::operation::put_log_events::PutLogEventsError;
use aws_sdk_cloudwatchlogs::types::InputLogEvent;
use aws_sdk_cloudwatchlogs::{Client, Config};
use std::time::Instant;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CloudWatchLogsClient {
    client: Client,
}

impl CloudWatchLogsClient {
    pub fn new(client: Client) -> Self {
        CloudWatchLogsClient { client }
    }

    /// Builds an SDK client with static credentials, the configured region
    /// and, when set, the endpoint override.
    pub fn from_config(config: &ForwarderConfig) -> Self {
        let mut builder = Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(config.credentials.clone())
            .retry_config(RetryConfig::disabled())
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(config.request_timeout)
                    .build(),
            );
        builder.set_endpoint_url(config.endpoint.clone());

        Self::new(Client::from_conf(builder.build()))
    }
}

/// Splits SDK failures into service answers, handed to `service`, and
/// everything that never produced one.
fn classify<E, R>(err: SdkError<E, R>, service: impl FnOnce(E) -> StoreError) -> StoreError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match err {
        SdkError::ServiceError(context) => service(context.into_err()),
        other => StoreError::Transport(DisplayErrorContext(&other).to_string()),
    }
}

fn message_of<E: ProvideErrorMetadata>(err: &E) -> String {
    err.message().unwrap_or_default().to_string()
}

fn service_error<E: ProvideErrorMetadata>(err: &E) -> StoreError {
    StoreError::Service {
        code: err.code().unwrap_or("Unknown").to_string(),
        message: message_of(err),
    }
}

fn put_error(err: PutLogEventsError) -> StoreError {
    let message = message_of(&err);
    match err {
        PutLogEventsError::DataAlreadyAcceptedException(_) => StoreError::TokenMismatch {
            kind: TokenMismatchKind::DataAlreadyAccepted,
            message,
        },
        PutLogEventsError::InvalidSequenceTokenException(_) => StoreError::TokenMismatch {
            kind: TokenMismatchKind::InvalidSequenceToken,
            message,
        },
        PutLogEventsError::ResourceNotFoundException(_) => StoreError::ResourceNotFound(message),
        other => service_error(&other),
    }
}

fn create_group_error(err: CreateLogGroupError) -> StoreError {
    let message = message_of(&err);
    match err {
        CreateLogGroupError::ResourceAlreadyExistsException(_) => {
            StoreError::ResourceAlreadyExists(message)
        }
        CreateLogGroupError::OperationAbortedException(_) => StoreError::OperationAborted(message),
        other => service_error(&other),
    }
}

fn create_stream_error(err: CreateLogStreamError) -> StoreError {
    let message = message_of(&err);
    match err {
        CreateLogStreamError::ResourceAlreadyExistsException(_) => {
            StoreError::ResourceAlreadyExists(message)
        }
        CreateLogStreamError::ResourceNotFoundException(_) => StoreError::ResourceNotFound(message),
        other => service_error(&other),
    }
}

#[async_trait]
impl LogStore for CloudWatchLogsClient {
    async fn describe_log_groups(
        &self,
        prefix: &str,
        next_token: Option<&str>,
    ) -> Result<LogGroupsPage, StoreError> {
        let output = self
            .client
            .describe_log_groups()
            .log_group_name_prefix(prefix)
            .set_next_token(next_token.map(str::to_string))
            .send()
            .await
            .map_err(|e| classify(e, |e| service_error(&e)))?;

        Ok(LogGroupsPage {
            log_groups: output
                .log_groups()
                .iter()
                .filter_map(|group| group.log_group_name())
                .map(|name| LogGroup {
                    log_group_name: name.to_string(),
                })
                .collect(),
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn create_log_group(&self, group: &str) -> Result<(), StoreError> {
        self.client
            .create_log_group()
            .log_group_name(group)
            .send()
            .await
            .map_err(|e| classify(e, create_group_error))?;
        Ok(())
    }

    async fn create_log_stream(&self, group: &str, stream: &str) -> Result<(), StoreError> {
        self.client
            .create_log_stream()
            .log_group_name(group)
            .log_stream_name(stream)
            .send()
            .await
            .map_err(|e| classify(e, create_stream_error))?;
        Ok(())
    }

    async fn put_log_events(
        &self,
        request: &PutLogEventsRequest,
    ) -> Result<PutLogEventsResponse, StoreError> {
        let events = request
            .log_events
            .iter()
            .map(|event| {
                InputLogEvent::builder()
                    .timestamp(event.timestamp)
                    .message(event.message.clone())
                    .build()
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let time = Instant::now();
        let result = self
            .client
            .put_log_events()
            .log_group_name(&request.log_group_name)
            .log_stream_name(&request.log_stream_name)
            .set_log_events(Some(events))
            .set_sequence_token(request.sequence_token.clone())
            .send()
            .await;
        debug!(
            "CLOUDWATCH | PutLogEvents answered in {} ms",
            time.elapsed().as_millis()
        );
        let output = result.map_err(|e| classify(e, put_error))?;

        Ok(PutLogEventsResponse {
            next_sequence_token: output.next_sequence_token().map(str::to_string),
            rejected_log_events_info: output.rejected_log_events_info().map(|info| {
                RejectedLogEventsInfo {
                    too_new_log_event_start_index: info
                        .too_new_log_event_start_index()
                        .map(i64::from),
                    too_old_log_event_end_index: info.too_old_log_event_end_index().map(i64::from),
                    expired_log_event_end_index: info.expired_log_event_end_index().map(i64::from),
                }
            }),
        })
    }
}
