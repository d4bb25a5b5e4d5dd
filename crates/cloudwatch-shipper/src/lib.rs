// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Delivery of text lines to AWS CloudWatch Logs.
//!
//! The crate is built around two components:
//!
//! - [`ensurer::LogGroupEnsurer`] makes sure the destination log group and stream
//!   exist before anything is written, tolerating concurrent creators.
//! - [`shipper::SequencedLogShipper`] turns every input line into a single
//!   `PutLogEvents` call, keeping track of the stream's sequence token and
//!   recovering from token mismatches and missing streams on its own.
//!
//! The remote store is reached through the [`store::LogStore`] trait;
//! [`cloudwatch::CloudWatchLogsClient`] implements it on top of the AWS SDK.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod cloudwatch;
pub mod config;
pub mod constants;
pub mod ensurer;
pub mod error;
pub mod forward;
pub mod logger;
pub mod retry;
pub mod shipper;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;
