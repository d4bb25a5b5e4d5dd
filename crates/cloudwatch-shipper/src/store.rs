// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Logical operations of the remote log store.
//!
//! The shipper and the ensurer only ever talk to CloudWatch through
//! [`LogStore`]. Remote failures come back as a [`StoreError`] variant so the
//! retry protocol can dispatch on them with a plain `match`.

use async_trait::async_trait;

/// A single log event as sent to `PutLogEvents`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub message: String,
}

impl LogEvent {
    /// Builds an event stamped with the current wall-clock time.
    pub fn now(message: String) -> Self {
        LogEvent {
            timestamp: chrono::Utc::now().timestamp_millis(),
            message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutLogEventsRequest {
    pub log_group_name: String,
    pub log_stream_name: String,
    pub log_events: Vec<LogEvent>,
    pub sequence_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutLogEventsResponse {
    pub next_sequence_token: Option<String>,
    pub rejected_log_events_info: Option<RejectedLogEventsInfo>,
}

impl PutLogEventsResponse {
    /// True when the store accepted the call but refused at least one event.
    pub fn has_rejections(&self) -> bool {
        self.rejected_log_events_info
            .as_ref()
            .is_some_and(|info| !info.is_empty())
    }
}

/// Indexes of events refused by `PutLogEvents`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RejectedLogEventsInfo {
    pub too_new_log_event_start_index: Option<i64>,
    pub too_old_log_event_end_index: Option<i64>,
    pub expired_log_event_end_index: Option<i64>,
}

impl RejectedLogEventsInfo {
    pub fn is_empty(&self) -> bool {
        self.too_new_log_event_start_index.is_none()
            && self.too_old_log_event_end_index.is_none()
            && self.expired_log_event_end_index.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogGroup {
    pub log_group_name: String,
}

/// One page of a `DescribeLogGroups` listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogGroupsPage {
    pub log_groups: Vec<LogGroup>,
    pub next_token: Option<String>,
}

/// Which of the two sequence token errors the store raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenMismatchKind {
    /// The batch was already accepted under the token that was sent.
    DataAlreadyAccepted,
    /// The token sent is not the one the stream expects.
    InvalidSequenceToken,
}

/// Remote store failures, classified by what the caller can do about them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store expects a different sequence token. The expected token is the
    /// last word of `message`.
    #[error("Sequence token mismatch ({kind:?}): {message}")]
    TokenMismatch {
        kind: TokenMismatchKind,
        message: String,
    },

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Resource already exists: {0}")]
    ResourceAlreadyExists(String),

    #[error("Operation aborted: {0}")]
    OperationAborted(String),

    /// Any other error reported by the store.
    #[error("{code}: {message}")]
    Service { code: String, message: String },

    /// The request never produced a usable response.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl StoreError {
    /// Token embedded in a sequence token error, taken as the trailing
    /// whitespace-delimited word of the message.
    pub fn expected_sequence_token(&self) -> Option<&str> {
        match self {
            StoreError::TokenMismatch { message, .. } => message.split_whitespace().last(),
            _ => None,
        }
    }

    /// True for the errors a concurrent creator of the same resource causes.
    pub fn is_create_race(&self) -> bool {
        matches!(
            self,
            StoreError::ResourceAlreadyExists(_) | StoreError::OperationAborted(_)
        )
    }
}

/// The four CloudWatch Logs operations the shipper depends on.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Lists log groups whose name starts with `prefix`, one page at a time.
    async fn describe_log_groups(
        &self,
        prefix: &str,
        next_token: Option<&str>,
    ) -> Result<LogGroupsPage, StoreError>;

    async fn create_log_group(&self, group: &str) -> Result<(), StoreError>;

    async fn create_log_stream(&self, group: &str, stream: &str) -> Result<(), StoreError>;

    async fn put_log_events(
        &self,
        request: &PutLogEventsRequest,
    ) -> Result<PutLogEventsResponse, StoreError>;
}
