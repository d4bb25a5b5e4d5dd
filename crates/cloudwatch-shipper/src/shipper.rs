// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Line by line delivery into a single CloudWatch log stream.
//!
//! CloudWatch orders writes to a stream with sequence tokens: every successful
//! `PutLogEvents` returns the token the next call must carry. The shipper keeps
//! that token and, when it drifts (a previous partial write, another writer, a
//! recreated stream), resynchronises from the store's own error message, which
//! ends with the token it expects.
//!
//! # Protocol
//!
//! Each line is sent as one event, with up to `attempts` tries:
//!
//! - **Success**: store `nextSequenceToken` for the next line. If the store
//!   rejected the event, warn and keep the previous token.
//! - **Token mismatch**: take the expected token from the error and retry with
//!   it, or without any token when the store answers `null`.
//! - **Stream not found**: recreate the stream and retry without a token.
//! - **Anything else**: warn, back off, retry unchanged.
//!
//! Nothing is ever returned to the caller as an error. A lost line must not
//! stop the process whose output is being shipped.

use crate::constants::{DEFAULT_RETRY_BACKOFF_BASE_MS, MAX_MSG_SIZE, MAX_RETRIES, NULL_SEQUENCE_TOKEN};
use crate::ensurer::LogGroupEnsurer;
use crate::error::ShipperError;
use crate::forward::LineLogger;
use crate::retry::RetryStrategy;
use crate::store::{LogEvent, LogStore, PutLogEventsRequest, RejectedLogEventsInfo, StoreError};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Tunables of the delivery protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipperOptions {
    /// Lines longer than this many characters are truncated.
    pub max_message_size: usize,
    pub retry_strategy: RetryStrategy,
    /// Token value meaning "send no token at all".
    pub null_sequence_token: String,
}

impl Default for ShipperOptions {
    fn default() -> Self {
        ShipperOptions {
            max_message_size: MAX_MSG_SIZE,
            retry_strategy: RetryStrategy::Exponential {
                attempts: MAX_RETRIES,
                base_delay_ms: DEFAULT_RETRY_BACKOFF_BASE_MS,
            },
            null_sequence_token: NULL_SEQUENCE_TOKEN.to_string(),
        }
    }
}

/// What happened to a line handed to [`SequencedLogShipper::deliver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Empty line, nothing was sent.
    Skipped,
    Delivered,
    /// The call succeeded but the store refused the event.
    Rejected(RejectedLogEventsInfo),
    /// Every attempt failed. `last_error` is `None` only when no attempt
    /// was allowed.
    Exhausted { last_error: Option<StoreError> },
}

pub struct SequencedLogShipper<S> {
    store: Arc<S>,
    ensurer: LogGroupEnsurer<S>,
    group: String,
    stream: String,
    /// Token the store expects on the next append, if any.
    token: Option<String>,
    options: ShipperOptions,
}

impl<S: LogStore> SequencedLogShipper<S> {
    /// Ensures the group and the stream exist, then returns a shipper ready
    /// to write to them.
    pub async fn new(
        store: Arc<S>,
        group: impl Into<String>,
        stream: impl Into<String>,
        options: ShipperOptions,
    ) -> Result<Self, ShipperError> {
        let group = group.into();
        let stream = stream.into();
        let ensurer = LogGroupEnsurer::new(Arc::clone(&store));

        ensurer
            .ensure_group(&group)
            .await
            .map_err(|source| ShipperError::LogGroup {
                group: group.clone(),
                source,
            })?;
        ensurer
            .create_stream(&group, &stream)
            .await
            .map_err(|source| ShipperError::LogStream {
                group: group.clone(),
                stream: stream.clone(),
                source,
            })?;
        info!("CLOUDWATCH | Shipping to log stream '{stream}' in group '{group}'");

        Ok(SequencedLogShipper {
            store,
            ensurer,
            group,
            stream,
            token: None,
            options,
        })
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn stream(&self) -> &str {
        &self.stream
    }

    /// Token that will be sent with the next line.
    pub fn sequence_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Sends `line` as a single log event and reports how it went.
    pub async fn deliver(&mut self, line: &str) -> DeliveryOutcome {
        if line.is_empty() {
            debug!("CLOUDWATCH | Empty messages are not sent to CloudWatch");
            return DeliveryOutcome::Skipped;
        }

        let message = truncate_chars(line, self.options.max_message_size);
        if message.len() < line.len() {
            warn!(
                "CLOUDWATCH | Very long message, truncating to {} characters",
                self.options.max_message_size
            );
        }

        let mut request = PutLogEventsRequest {
            log_group_name: self.group.clone(),
            log_stream_name: self.stream.clone(),
            log_events: vec![LogEvent::now(message.to_string())],
            sequence_token: self.token.clone(),
        };

        let attempts = self.options.retry_strategy.attempts();
        let mut last_error = None;
        for attempt in 1..=attempts {
            match self.store.put_log_events(&request).await {
                Ok(response) => {
                    if response.has_rejections() {
                        let rejected = response.rejected_log_events_info.unwrap_or_default();
                        warn!("CLOUDWATCH | Can't deliver logs. Event rejected: {rejected:?}");
                        return DeliveryOutcome::Rejected(rejected);
                    }
                    if let Some(token) = response.next_sequence_token {
                        self.token = Some(token);
                    }
                    return DeliveryOutcome::Delivered;
                }
                Err(e @ StoreError::TokenMismatch { .. }) => {
                    warn!("CLOUDWATCH | Event already logged or token is not valid");
                    request.sequence_token = e
                        .expected_sequence_token()
                        .filter(|token| *token != self.options.null_sequence_token)
                        .map(str::to_string);
                    last_error = Some(e);
                }
                Err(e @ StoreError::ResourceNotFound(_)) => {
                    warn!("CLOUDWATCH | Log stream not found. Creating new...");
                    if let Err(create_error) =
                        self.ensurer.create_stream(&self.group, &self.stream).await
                    {
                        warn!("CLOUDWATCH | Unable to recreate log stream: {create_error}");
                    }
                    request.sequence_token = None;
                    last_error = Some(e);
                }
                Err(e) => {
                    warn!("CLOUDWATCH | Can't deliver logs. Retry: #{attempt}. Error: {e}");
                    last_error = Some(e);
                    let delay = self.options.retry_strategy.delay_after(attempt);
                    if attempt < attempts && !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        match &last_error {
            Some(e) => warn!("CLOUDWATCH | Can't deliver logs after {attempts} attempts: {e}"),
            None => warn!("CLOUDWATCH | Can't deliver logs: no attempt allowed"),
        }
        DeliveryOutcome::Exhausted { last_error }
    }
}

#[async_trait]
impl<S: LogStore> LineLogger for SequencedLogShipper<S> {
    async fn log(&mut self, line: &str) {
        self.deliver(line).await;
    }
}

/// Cuts `line` to at most `max` characters, on a character boundary.
fn truncate_chars(line: &str, max: usize) -> &str {
    match line.char_indices().nth(max) {
        Some((index, _)) => &line[..index],
        None => line,
    }
}
