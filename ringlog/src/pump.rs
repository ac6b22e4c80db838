//! The producer loop.
//!
//! A pump reads newline-framed text from any [`BufRead`] and writes each
//! line to a [`RingLog`]. It is the log's single writer: in a supervisor it
//! runs on its own thread, reading a child process's output.
//!
//! Lines are stored without their terminator. One trailing `\n` or `\r\n`
//! is stripped; a final line without a terminator is still written.
//!
//! # Example
//!
//! ```rust
//! use std::io::Cursor;
//! use std::sync::Arc;
//! use ringlog::{RingLog, pump};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let log = Arc::new(RingLog::new(8)?);
//! let handle = pump::spawn_pump(Arc::clone(&log), Cursor::new("a\nb\r\nc"), "reader")?;
//!
//! assert_eq!(handle.join()?, 3);
//! assert_eq!(log.list_all(), vec!["a", "b", "c"]);
//! # Ok(())
//! # }
//! ```

use std::io::{BufRead, ErrorKind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use crate::error::{PumpError, Result};
use crate::log::RingLog;

/// Reads lines from `reader` until end of input and writes them to `log`.
///
/// Returns the number of lines read.
///
/// # Errors
///
/// Returns [`PumpError::Read`] if reading fails or the input is not valid
/// UTF-8. Lines read before the failure stay in the log.
pub fn pump_lines<R: BufRead>(log: &RingLog, reader: R) -> Result<u64> {
    pump_until(log, reader, &AtomicBool::new(false))
}

fn pump_until<R: BufRead>(log: &RingLog, mut reader: R, stop: &AtomicBool) -> Result<u64> {
    let mut buf = String::new();
    let mut lines_read = 0u64;

    while !stop.load(Ordering::Relaxed) {
        buf.clear();
        match reader.read_line(&mut buf) {
            Ok(0) => break,
            Ok(_) => {
                log.write(strip_terminator(&buf));
                lines_read += 1;
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(PumpError::Read {
                    lines_read,
                    source: e,
                }
                .into());
            }
        }
    }

    Ok(lines_read)
}

fn strip_terminator(line: &str) -> &str {
    match line.strip_suffix('\n') {
        Some(line) => line.strip_suffix('\r').unwrap_or(line),
        None => line,
    }
}

/// Runs [`pump_lines`] on a new named thread.
///
/// # Errors
///
/// Returns [`PumpError::Spawn`] if the thread cannot be created.
pub fn spawn_pump<R>(log: Arc<RingLog>, reader: R, name: impl Into<String>) -> Result<PumpHandle>
where
    R: BufRead + Send + 'static,
{
    let name = name.into();
    let stop = Arc::new(AtomicBool::new(false));

    let handle = {
        let stop = Arc::clone(&stop);
        let thread_name = name.clone();

        thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                tracing::debug!(pump = %thread_name, log = %log.name(), "pump started");
                let result = pump_until(&log, reader, &stop);
                match &result {
                    Ok(lines) => tracing::debug!(pump = %thread_name, lines, "pump finished"),
                    Err(e) => tracing::warn!(pump = %thread_name, error = %e, "pump stopped"),
                }
                result
            })
            .map_err(|e| PumpError::Spawn {
                name: name.clone(),
                source: e,
            })?
    };

    Ok(PumpHandle { name, stop, handle })
}

/// Handle to a pump running on its own thread.
///
/// Dropping the handle detaches the thread; it keeps running until its
/// input ends.
#[derive(Debug)]
pub struct PumpHandle {
    name: String,
    stop: Arc<AtomicBool>,
    handle: JoinHandle<Result<u64>>,
}

impl PumpHandle {
    /// Returns the thread name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Asks the pump to stop before its next line.
    ///
    /// A pump blocked inside a read only notices once that read returns.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Returns whether the pump thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the pump to exit and returns the number of lines read.
    ///
    /// # Errors
    ///
    /// Returns the pump's own error, or [`PumpError::Panicked`] if the
    /// thread panicked.
    pub fn join(self) -> Result<u64> {
        let name = self.name;
        self.handle
            .join()
            .map_err(|_| PumpError::Panicked { name })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RingLogError;
    use std::io::{self, BufReader, Cursor, Read};

    /// Endless source of `tick\n` lines.
    struct Ticker;

    impl Read for Ticker {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let line = b"tick\n";
            let n = line.len().min(buf.len());
            buf[..n].copy_from_slice(&line[..n]);
            Ok(n)
        }
    }

    #[test]
    fn test_strip_terminator() {
        assert_eq!(strip_terminator("plain\n"), "plain");
        assert_eq!(strip_terminator("dos\r\n"), "dos");
        assert_eq!(strip_terminator("last"), "last");
        assert_eq!(strip_terminator("\n"), "");
        assert_eq!(strip_terminator("lone\r"), "lone\r");
        assert_eq!(strip_terminator("twice\n\n"), "twice\n");
    }

    #[test]
    fn test_pump_lines() {
        let log = RingLog::new(8).unwrap();
        let lines = pump_lines(&log, Cursor::new("one\r\n\nthree\nfour")).unwrap();

        assert_eq!(lines, 4);
        assert_eq!(log.list_all(), vec!["one", "", "three", "four"]);
    }

    #[test]
    fn test_pump_empty_input() {
        let log = RingLog::new(8).unwrap();
        assert_eq!(pump_lines(&log, Cursor::new("")).unwrap(), 0);
        assert!(log.is_empty());
    }

    #[test]
    fn test_pump_invalid_utf8() {
        let log = RingLog::new(8).unwrap();
        let input: &[u8] = b"good\n\xff\xfe bad\nnever\n";

        let result = pump_lines(&log, input);
        assert!(matches!(
            result,
            Err(RingLogError::Pump(PumpError::Read { lines_read: 1, .. }))
        ));
        assert_eq!(log.list_all(), vec!["good"]);
    }

    #[test]
    fn test_spawn_pump_reads_to_end() {
        let log = Arc::new(RingLog::new(4).unwrap());
        let input = (0..10).map(|k| format!("line {k}\n")).collect::<String>();

        let handle = spawn_pump(Arc::clone(&log), Cursor::new(input), "test-pump").unwrap();
        assert_eq!(handle.name(), "test-pump");
        assert_eq!(handle.join().unwrap(), 10);
        assert_eq!(log.list_all(), vec!["line 6", "line 7", "line 8", "line 9"]);
    }

    #[test]
    fn test_spawn_pump_stops_on_request() {
        let log = Arc::new(RingLog::new(16).unwrap());
        let handle =
            spawn_pump(Arc::clone(&log), BufReader::new(Ticker), "endless-pump").unwrap();

        while log.total_written() < 3 {
            thread::yield_now();
        }
        handle.stop();

        let lines = handle.join().unwrap();
        assert!(lines >= 3);
        assert_eq!(log.total_written(), lines);
        assert!(log.list_all().iter().all(|line| line == "tick"));
    }
}
