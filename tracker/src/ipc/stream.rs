//! Stream loop: line framing over any reader/writer pair.

use std::io::{self, BufRead, Read, Write};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use super::dispatch;
use crate::gesture::GestureController;

/// Maximum accepted line length (1 MiB), excluding the newline.
const MAX_LINE_SIZE: usize = 1_048_576;

/// Counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub messages: u64,
    pub lines_written: u64,
    pub rejected: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineRead {
    Eof,
    Complete,
    /// Longer than `MAX_LINE_SIZE`; the rest of the line was discarded.
    Oversized,
}

/// Read one line into `buf`, never buffering more than `MAX_LINE_SIZE + 1`
/// bytes of it.
fn read_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<LineRead> {
    buf.clear();
    let limit = MAX_LINE_SIZE as u64 + 1;
    let n = reader.by_ref().take(limit).read_until(b'\n', buf)?;
    if n == 0 {
        return Ok(LineRead::Eof);
    }
    if buf.ends_with(b"\n") || n < limit as usize {
        return Ok(LineRead::Complete);
    }

    buf.clear();
    skip_line(reader)?;
    Ok(LineRead::Oversized)
}

/// Discard input up to and including the next newline.
fn skip_line<R: BufRead>(reader: &mut R) -> io::Result<()> {
    loop {
        let available = reader.fill_buf()?;
        if available.is_empty() {
            return Ok(());
        }
        match available.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                reader.consume(pos + 1);
                return Ok(());
            }
            None => {
                let len = available.len();
                reader.consume(len);
            }
        }
    }
}

/// Read messages until EOF, writing every response and event line.
///
/// Blank lines and `;` comments are skipped.  Frames without `:t` are
/// stamped with the time elapsed since the stream started.
pub fn run_stream<R: BufRead, W: Write>(
    controller: &mut GestureController,
    mut reader: R,
    mut writer: W,
    trace: bool,
) -> Result<StreamStats> {
    let started = Instant::now();
    let mut stats = StreamStats::default();
    let mut buf = Vec::new();
    let mut line_no = 0u64;

    loop {
        let read = read_line(&mut reader, &mut buf)
            .with_context(|| format!("reading input line {}", line_no + 1))?;
        line_no += 1;
        match read {
            LineRead::Eof => break,
            LineRead::Oversized => {
                warn!(line = line_no, "message exceeds maximum size");
                writeln!(
                    writer,
                    "(:type :response :id 0 :status :error :reason \"message exceeds maximum size\")"
                )
                .context("writing response")?;
                stats.rejected += 1;
                stats.lines_written += 1;
                continue;
            }
            LineRead::Complete => {}
        }

        let text = String::from_utf8_lossy(&buf);
        let raw = text.trim();
        if raw.is_empty() || raw.starts_with(';') {
            continue;
        }
        if trace {
            debug!(line = line_no, "<- {}", raw);
        }

        let fallback_ms = started.elapsed().as_secs_f64() * 1000.0;
        let reply = dispatch::handle_message(controller, raw, fallback_ms);
        if reply.rejected {
            stats.rejected += 1;
        }
        for out in &reply.lines {
            if trace {
                debug!("-> {}", out);
            }
            writeln!(writer, "{}", out).context("writing response")?;
            stats.lines_written += 1;
        }
        stats.messages += 1;
    }

    writer.flush().context("flushing output")?;
    Ok(stats)
}
