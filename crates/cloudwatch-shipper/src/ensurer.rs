// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::store::{LogStore, StoreError};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Makes sure log groups and streams exist before they are written to.
///
/// Creation is idempotent: "already exists" and "operation aborted" answers
/// mean somebody else created the resource concurrently, which is fine.
#[derive(Debug)]
pub struct LogGroupEnsurer<S> {
    store: Arc<S>,
}

impl<S: LogStore> LogGroupEnsurer<S> {
    pub fn new(store: Arc<S>) -> Self {
        LogGroupEnsurer { store }
    }

    /// Returns once `group` exists in the store.
    ///
    /// Existing groups are looked up first so that no create call is made for
    /// them. A failing lookup is not fatal: the create call decides.
    pub async fn ensure_group(&self, group: &str) -> Result<(), StoreError> {
        match self.group_exists(group).await {
            Ok(true) => {
                debug!("CLOUDWATCH | Log group '{group}' already exists");
                return Ok(());
            }
            Ok(false) => {}
            Err(e) => {
                warn!("CLOUDWATCH | Unable to list log groups, creating '{group}' directly: {e}");
            }
        }

        debug!("CLOUDWATCH | Creating log group '{group}'");
        tolerate_create_race(self.store.create_log_group(group).await)
    }

    /// Creates `stream` in `group` unless it already exists.
    pub async fn create_stream(&self, group: &str, stream: &str) -> Result<(), StoreError> {
        debug!("CLOUDWATCH | Creating log stream '{stream}' in '{group}'");
        tolerate_create_race(self.store.create_log_stream(group, stream).await)
    }

    async fn group_exists(&self, group: &str) -> Result<bool, StoreError> {
        let mut next_token: Option<String> = None;
        let mut seen_tokens = HashSet::new();
        loop {
            let page = self
                .store
                .describe_log_groups(group, next_token.as_deref())
                .await?;
            if page
                .log_groups
                .iter()
                .any(|log_group| log_group.log_group_name == group)
            {
                return Ok(true);
            }
            match page.next_token {
                // A token seen before means the listing is going in circles
                Some(token) if seen_tokens.insert(token.clone()) => {
                    next_token = Some(token);
                }
                _ => return Ok(false),
            }
        }
    }
}

fn tolerate_create_race(result: Result<(), StoreError>) -> Result<(), StoreError> {
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.is_create_race() => {
            debug!("CLOUDWATCH | Resource created concurrently: {e}");
            Ok(())
        }
        Err(e) => {
            error!("CLOUDWATCH | Can't make request to AWS CloudWatch: {e}");
            Err(e)
        }
    }
}
