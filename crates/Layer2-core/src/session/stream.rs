//! PTY byte stream with expect-style waiting
//!
//! A reader thread pushes raw chunks into a bounded channel; `PtyStream`
//! accumulates them and answers "wait until one of these patterns shows
//! up, or the deadline passes, or the stream ends".

use regex::bytes::Regex;
use std::io::{self, Read};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::debug;

/// Chunks buffered between the reader thread and the session
const READ_CHANNEL_CAPACITY: usize = 100;

/// A pattern to wait for
#[derive(Debug, Clone, Copy)]
pub enum Pattern<'a> {
    Exact(&'a [u8]),
    Regex(&'a Regex),
}

impl Pattern<'_> {
    fn find(&self, haystack: &[u8]) -> Option<(usize, usize)> {
        match self {
            Pattern::Exact(needle) => {
                find_subslice(haystack, needle).map(|start| (start, start + needle.len()))
            }
            Pattern::Regex(re) => re.find(haystack).map(|m| (m.start(), m.end())),
        }
    }
}

/// Result of waiting on the stream
#[derive(Debug, PartialEq, Eq)]
pub enum Expect {
    /// `index` is the position of the matching pattern in the request.
    /// Everything up to and including the match is consumed.
    Matched { index: usize, before: Vec<u8> },
    /// Deadline passed; buffered bytes are left in place
    Timeout,
    /// Stream ended without a match; buffered bytes are left in place
    Eof,
}

/// Buffered view over the PTY output channel
pub struct PtyStream {
    rx: mpsc::Receiver<Vec<u8>>,
    buffer: Vec<u8>,
    eof: bool,
}

impl PtyStream {
    pub fn new(rx: mpsc::Receiver<Vec<u8>>) -> Self {
        Self {
            rx,
            buffer: Vec::new(),
            eof: false,
        }
    }

    /// Start a reader thread over a blocking PTY reader
    pub fn spawn_reader(reader: Box<dyn Read + Send>) -> io::Result<Self> {
        let (tx, rx) = mpsc::channel::<Vec<u8>>(READ_CHANNEL_CAPACITY);
        std::thread::Builder::new()
            .name("shelldock-pty-reader".to_string())
            .spawn(move || read_loop(reader, tx))?;
        Ok(Self::new(rx))
    }

    pub async fn expect_exact(&mut self, needle: &[u8], deadline: Instant) -> Expect {
        self.expect_any(&[Pattern::Exact(needle)], deadline).await
    }

    /// Wait for the earliest match among `patterns`.
    ///
    /// When two patterns match at the same offset the first one listed wins.
    pub async fn expect_any(&mut self, patterns: &[Pattern<'_>], deadline: Instant) -> Expect {
        loop {
            let hit = patterns
                .iter()
                .enumerate()
                .filter_map(|(i, p)| p.find(&self.buffer).map(|(s, e)| (s, i, e)))
                .min();

            if let Some((start, index, end)) = hit {
                let rest = self.buffer.split_off(end);
                let mut before = std::mem::replace(&mut self.buffer, rest);
                before.truncate(start);
                return Expect::Matched { index, before };
            }

            if self.eof {
                return Expect::Eof;
            }

            match tokio::time::timeout_at(deadline, self.rx.recv()).await {
                Ok(Some(chunk)) => self.buffer.extend_from_slice(&chunk),
                Ok(None) => self.eof = true,
                Err(_) => return Expect::Timeout,
            }
        }
    }

    /// Discard incoming bytes until nothing arrives for `quiet`, or the
    /// deadline passes. Returns the number of bytes dropped.
    pub async fn drain_quiet(&mut self, quiet: Duration, deadline: Instant) -> usize {
        let mut dropped = std::mem::take(&mut self.buffer).len();
        while !self.eof {
            let window = (Instant::now() + quiet).min(deadline);
            match tokio::time::timeout_at(window, self.rx.recv()).await {
                Ok(Some(chunk)) => dropped += chunk.len(),
                Ok(None) => self.eof = true,
                Err(_) => break,
            }
        }
        dropped
    }

    /// Take everything buffered so far
    pub fn take_buffer(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }

    #[cfg(test)]
    pub(crate) fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    pub fn is_eof(&self) -> bool {
        self.eof
    }
}

fn read_loop(mut reader: Box<dyn Read + Send>, tx: mpsc::Sender<Vec<u8>>) {
    let mut buf = [0u8; 4096];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if tx.blocking_send(buf[..n].to_vec()).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                std::thread::sleep(Duration::from_millis(10));
            }
            // EIO once the child side closes
            Err(e) => {
                debug!("PTY reader stopped: {}", e);
                break;
            }
        }
    }
    debug!("PTY reader reached end of stream");
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
