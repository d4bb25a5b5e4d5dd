// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Scripted [`LogStore`] double shared by the ensurer and shipper tests.
//!
//! Answers are queued per operation and consumed in order; once a queue is
//! empty the operation succeeds with an empty answer. Every call is recorded.

use crate::store::{LogGroupsPage, LogStore, PutLogEventsRequest, PutLogEventsResponse, StoreError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    DescribeLogGroups {
        prefix: String,
        next_token: Option<String>,
    },
    CreateLogGroup(String),
    CreateLogStream {
        group: String,
        stream: String,
    },
    PutLogEvents(PutLogEventsRequest),
}

#[derive(Debug, Default)]
pub(crate) struct MockLogStore {
    calls: Mutex<Vec<Call>>,
    describe: Mutex<VecDeque<Result<LogGroupsPage, StoreError>>>,
    create_group: Mutex<VecDeque<Result<(), StoreError>>>,
    create_stream: Mutex<VecDeque<Result<(), StoreError>>>,
    put: Mutex<VecDeque<Result<PutLogEventsResponse, StoreError>>>,
}

impl MockLogStore {
    pub(crate) fn push_describe(&self, answer: Result<LogGroupsPage, StoreError>) {
        self.describe.lock().unwrap().push_back(answer);
    }

    pub(crate) fn push_create_group(&self, answer: Result<(), StoreError>) {
        self.create_group.lock().unwrap().push_back(answer);
    }

    pub(crate) fn push_create_stream(&self, answer: Result<(), StoreError>) {
        self.create_stream.lock().unwrap().push_back(answer);
    }

    pub(crate) fn push_put(&self, answer: Result<PutLogEventsResponse, StoreError>) {
        self.put.lock().unwrap().push_back(answer);
    }

    /// Queues a successful append answering with `token`.
    pub(crate) fn push_put_token(&self, token: &str) {
        self.push_put(Ok(PutLogEventsResponse {
            next_sequence_token: Some(token.to_string()),
            rejected_log_events_info: None,
        }));
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub(crate) fn put_requests(&self) -> Vec<PutLogEventsRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::PutLogEvents(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn describe_calls(&self) -> usize {
        self.count(|call| matches!(call, Call::DescribeLogGroups { .. }))
    }

    pub(crate) fn create_group_calls(&self) -> usize {
        self.count(|call| matches!(call, Call::CreateLogGroup(_)))
    }

    pub(crate) fn create_stream_calls(&self) -> usize {
        self.count(|call| matches!(call, Call::CreateLogStream { .. }))
    }

    fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| predicate(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl LogStore for MockLogStore {
    async fn describe_log_groups(
        &self,
        prefix: &str,
        next_token: Option<&str>,
    ) -> Result<LogGroupsPage, StoreError> {
        self.record(Call::DescribeLogGroups {
            prefix: prefix.to_string(),
            next_token: next_token.map(str::to_string),
        });
        let answer = self.describe.lock().unwrap().pop_front();
        answer.unwrap_or_else(|| Ok(LogGroupsPage::default()))
    }

    async fn create_log_group(&self, group: &str) -> Result<(), StoreError> {
        self.record(Call::CreateLogGroup(group.to_string()));
        let answer = self.create_group.lock().unwrap().pop_front();
        answer.unwrap_or(Ok(()))
    }

    async fn create_log_stream(&self, group: &str, stream: &str) -> Result<(), StoreError> {
        self.record(Call::CreateLogStream {
            group: group.to_string(),
            stream: stream.to_string(),
        });
        let answer = self.create_stream.lock().unwrap().pop_front();
        answer.unwrap_or(Ok(()))
    }

    async fn put_log_events(
        &self,
        request: &PutLogEventsRequest,
    ) -> Result<PutLogEventsResponse, StoreError> {
        self.record(Call::PutLogEvents(request.clone()));
        let answer = self.put.lock().unwrap().pop_front();
        answer.unwrap_or_else(|| Ok(PutLogEventsResponse::default()))
    }
}
