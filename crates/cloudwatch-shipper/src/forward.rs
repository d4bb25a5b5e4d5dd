// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

/// Something that accepts output lines one at a time.
#[async_trait]
pub trait LineLogger: Send {
    /// Logs a single line. Never fails: delivery problems stay inside the
    /// implementation.
    async fn log(&mut self, line: &str);
}

/// Reads `reader` to the end and hands every line to `logger`, in order,
/// waiting for each line to be fully handled before reading the next one.
///
/// Line terminators (`\n` and `\r\n`) are stripped and invalid UTF-8 is
/// replaced. At most `max_line_bytes` bytes of a line are kept; the rest of
/// it is read and dropped. Returns the number of lines read.
pub async fn forward_lines<R, L>(
    mut reader: R,
    logger: &mut L,
    max_line_bytes: usize,
) -> std::io::Result<u64>
where
    R: AsyncBufRead + Unpin,
    L: LineLogger + ?Sized,
{
    let mut buf = Vec::new();
    let mut count = 0;
    loop {
        buf.clear();
        if !read_line_capped(&mut reader, &mut buf, max_line_bytes).await? {
            break;
        }
        count += 1;

        let line = String::from_utf8_lossy(strip_carriage_return(&buf));
        logger.log(&line).await;
    }
    debug!("CLOUDWATCH | Forwarded {count} lines");
    Ok(count)
}

/// Same as `read_until(b'\n')` without the newline, except that the line
/// is not stored beyond `max` bytes. Returns false at end of input.
async fn read_line_capped<R>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    max: usize,
) -> std::io::Result<bool>
where
    R: AsyncBufRead + Unpin,
{
    let mut read_any = false;
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(read_any);
        }
        read_any = true;

        let (chunk, used, done) = match available.iter().position(|b| *b == b'\n') {
            Some(index) => (&available[..index], index + 1, true),
            None => (available, available.len(), false),
        };
        let room = max.saturating_sub(buf.len());
        buf.extend_from_slice(&chunk[..chunk.len().min(room)]);
        reader.consume(used);

        if done {
            return Ok(true);
        }
    }
}

fn strip_carriage_return(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}
