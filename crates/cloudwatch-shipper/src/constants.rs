// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Limits and protocol constants for CloudWatch Logs delivery.
//!
//! Every value here is only a default: [`crate::shipper::ShipperOptions`] and
//! [`crate::config::ForwarderConfig`] allow overriding them at runtime.

/// Size limit of a single log event in bytes: 256 KiB minus CloudWatch's
/// fixed 26 byte per event overhead.
pub const MAX_EVENT_BYTES: usize = 262_144 - 26;

/// Maximum number of characters sent in a single log event.
///
/// Lines are cut by characters and a character takes up to 4 bytes in UTF-8,
/// so a line cut at this length always fits in [`MAX_EVENT_BYTES`].
pub const MAX_MSG_SIZE: usize = MAX_EVENT_BYTES / 4;

/// Number of `PutLogEvents` attempts made for a single line.
///
/// Token resynchronisation and stream recreation consume attempts just like
/// generic failures do.
pub const MAX_RETRIES: u32 = 5;

/// Token value reported by CloudWatch when the stream expects no token.
///
/// It shows up as the last word of a sequence token error message, e.g.
/// `The next expected sequenceToken is: null`.
pub const NULL_SEQUENCE_TOKEN: &str = "null";

/// Base delay of the exponential backoff applied after generic failures.
pub const DEFAULT_RETRY_BACKOFF_BASE_MS: u64 = 100;

/// Longest wait between two attempts, whatever the attempt number.
pub const MAX_RETRY_DELAY_MS: u64 = 5_000;

/// Per operation timeout of the CloudWatch client.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
