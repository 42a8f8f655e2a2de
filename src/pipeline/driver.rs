//! Line-at-a-time driver for the filtering pipeline.

use std::io::{self, BufRead, BufWriter, Read, Write};

use tracing::{debug, trace};

use super::dispatch::classify;
use super::emit::{decide, reject, LineResult};
use super::parse::{parse_line, ParsedAddress};
use crate::classifier::Classifier;
use crate::error::FilterError;

/// Longest accepted input line in bytes, excluding the line terminator.
///
/// A 64 KiB scan buffer has to hold the line and its `\n`.
pub const MAX_LINE_BYTES: usize = 64 * 1024 - 1;

/// Counters for a finished run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub lines: usize,
    pub passed: usize,
    pub dropped: usize,
    pub diagnostics: usize,
}

/// Run one raw line through parse, classify and decide.
pub fn process_line<C: Classifier + ?Sized>(line: &str, classifier: &C) -> Option<LineResult> {
    match parse_line(line.trim()) {
        ParsedAddress::Invalid(text) => Some(reject(&text)),
        ParsedAddress::Valid(ip) => decide(ip, classify(classifier, ip)),
    }
}

/// Filter `input` into `output`, one line at a time, in input order.
///
/// Output goes through a [`BufWriter`] that is flushed before returning on
/// every path. A read or write failure stops the loop; everything emitted
/// before it is kept and the failure is returned once.
pub fn run<R, W, C>(mut input: R, output: W, classifier: &C) -> Result<RunSummary, FilterError>
where
    R: BufRead,
    W: Write,
    C: Classifier + ?Sized,
{
    let mut writer = BufWriter::new(output);
    let mut summary = RunSummary::default();
    let mut buf = Vec::new();

    let failure = loop {
        buf.clear();
        match read_line(&mut input, &mut buf) {
            Ok(true) => {}
            Ok(false) => break None,
            Err(e) => break Some(FilterError::StreamRead(e)),
        }

        let line = String::from_utf8_lossy(&buf);
        summary.lines += 1;
        trace!("line {}: {:?}", summary.lines, line);

        let result = match process_line(&line, classifier) {
            Some(result) => result,
            None => {
                summary.dropped += 1;
                continue;
            }
        };
        match result {
            LineResult::Pass(_) => summary.passed += 1,
            LineResult::Diagnostic(_) => summary.diagnostics += 1,
        }

        if let Err(e) = writeln!(writer, "{}", result) {
            break Some(FilterError::Write(e));
        }
    };

    let flushed = writer.flush();

    debug!(
        "Processed {} lines: {} passed, {} dropped, {} diagnostics",
        summary.lines, summary.passed, summary.dropped, summary.diagnostics
    );

    match (failure, flushed) {
        (Some(err), _) => Err(err),
        (None, Err(e)) => Err(FilterError::Write(e)),
        (None, Ok(())) => Ok(summary),
    }
}

/// Read one line into `buf` without its `\n`. Returns `false` at end of input.
fn read_line<R: BufRead>(input: &mut R, buf: &mut Vec<u8>) -> io::Result<bool> {
    let limit = MAX_LINE_BYTES as u64 + 1;
    let read = input.by_ref().take(limit).read_until(b'\n', buf)?;
    if read == 0 {
        return Ok(false);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
    } else if buf.len() > MAX_LINE_BYTES {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("line too long (limit {} bytes)", MAX_LINE_BYTES),
        ));
    }
    Ok(true)
}
