//! Scripted in-memory shell for unit tests
//!
//! Answers each written line the way an interactive bash on a PTY would:
//! echo, output with CRLF line ends, then the installed prompt.

use super::error::Result;
use super::shell::{ShellProcess, ShellSession};
use super::stream::PtyStream;
use super::supervisor::SessionLauncher;
use async_trait::async_trait;
use dock_foundation::ShellType;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

type Channel = Arc<Mutex<Option<mpsc::Sender<Vec<u8>>>>>;
type Handler = Arc<dyn Fn(&str) -> Reply + Send + Sync>;

/// How the fake shell answers one line
pub(crate) enum Reply {
    Output {
        text: String,
        echo: bool,
        prompt: bool,
    },
    /// The shell exits; the stream reaches EOF
    Exit,
}

impl Reply {
    pub(crate) fn output(text: impl Into<String>) -> Self {
        Self::Output {
            text: text.into(),
            echo: true,
            prompt: true,
        }
    }

    /// Output and prompt, but no echo of the command line
    pub(crate) fn silent_output(text: impl Into<String>) -> Self {
        Self::Output {
            text: text.into(),
            echo: false,
            prompt: true,
        }
    }

    /// Echo and partial output; the prompt never comes back
    pub(crate) fn hang(text: impl Into<String>) -> Self {
        Self::Output {
            text: text.into(),
            echo: true,
            prompt: false,
        }
    }
}

#[derive(Clone)]
pub(crate) struct FakeShell {
    handler: Handler,
    current: Arc<Mutex<Option<Channel>>>,
    lines: Arc<AtomicUsize>,
    launches: Arc<AtomicUsize>,
    fail_launches: Arc<AtomicUsize>,
    interrupts: Arc<AtomicUsize>,
    ignore_interrupts: Arc<AtomicBool>,
}

impl FakeShell {
    pub(crate) fn new(handler: impl Fn(&str) -> Reply + Send + Sync + 'static) -> Self {
        Self {
            handler: Arc::new(handler),
            current: Arc::new(Mutex::new(None)),
            lines: Arc::new(AtomicUsize::new(0)),
            launches: Arc::new(AtomicUsize::new(0)),
            fail_launches: Arc::new(AtomicUsize::new(0)),
            interrupts: Arc::new(AtomicUsize::new(0)),
            ignore_interrupts: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A session that is still Uninitialized
    pub(crate) fn session(&self) -> ShellSession {
        let (tx, rx) = mpsc::channel(256);
        let channel: Channel = Arc::new(Mutex::new(Some(tx)));
        if let Ok(mut current) = self.current.lock() {
            *current = Some(channel.clone());
        }
        let alive = Arc::new(AtomicBool::new(true));
        let writer = FakeWriter {
            pending: Vec::new(),
            channel,
            token: None,
            handler: self.handler.clone(),
            alive: alive.clone(),
            lines: self.lines.clone(),
            interrupts: self.interrupts.clone(),
            ignore_interrupts: self.ignore_interrupts.clone(),
        };
        ShellSession::from_parts(
            ShellType::Bash,
            PtyStream::new(rx),
            Box::new(writer),
            Box::new(FakeProcess { alive }),
            Duration::from_millis(100),
        )
    }

    pub(crate) async fn ready_session(&self) -> ShellSession {
        let mut session = self.session();
        session
            .synchronize(Duration::from_secs(2))
            .await
            .expect("fake shell synchronizes");
        session
    }

    /// Push raw bytes into the most recent session's stream
    pub(crate) fn emit(&self, bytes: &[u8]) {
        let current = self.current.lock().unwrap();
        if let Some(channel) = current.as_ref() {
            if let Some(tx) = channel.lock().unwrap().as_ref() {
                let _ = tx.try_send(bytes.to_vec());
            }
        }
    }

    pub(crate) fn emit_prompt(&self, token: &str) {
        self.emit(token.as_bytes());
    }

    /// Command lines received so far, across all sessions
    pub(crate) fn lines_written(&self) -> usize {
        self.lines.load(Ordering::SeqCst)
    }

    /// Ctrl-C bytes received so far
    pub(crate) fn interrupts(&self) -> usize {
        self.interrupts.load(Ordering::SeqCst)
    }

    /// Stuck commands stay stuck even after Ctrl-C
    pub(crate) fn ignore_interrupts(&self) {
        self.ignore_interrupts.store(true, Ordering::SeqCst);
    }

    pub(crate) fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    /// Make the next `n` launches fail with a startup timeout
    pub(crate) fn fail_next_launches(&self, n: usize) {
        self.fail_launches.store(n, Ordering::SeqCst);
    }
}

#[async_trait]
impl SessionLauncher for FakeShell {
    async fn launch(&self) -> Result<ShellSession> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        if self
            .fail_launches
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(super::error::SessionError::StartupTimeout(1));
        }
        Ok(self.ready_session().await)
    }
}

struct FakeWriter {
    pending: Vec<u8>,
    channel: Channel,
    token: Option<String>,
    handler: Handler,
    alive: Arc<AtomicBool>,
    lines: Arc<AtomicUsize>,
    interrupts: Arc<AtomicUsize>,
    ignore_interrupts: Arc<AtomicBool>,
}

impl FakeWriter {
    fn send(&self, text: String) {
        if let Some(tx) = self.channel.lock().unwrap().as_ref() {
            let _ = tx.try_send(text.into_bytes());
        }
    }

    /// The foreground command dies and the prompt comes back
    fn interrupt(&mut self) {
        self.interrupts.fetch_add(1, Ordering::SeqCst);
        if self.ignore_interrupts.load(Ordering::SeqCst) {
            return;
        }
        if let Some(token) = &self.token {
            self.send(format!("^C\r\n{token}"));
        }
    }

    fn respond(&mut self, line: &str) {
        if let Some(token) = parse_prompt_statement(line) {
            self.send(format!("{line}\r\n{token}"));
            self.token = Some(token);
            return;
        }

        self.lines.fetch_add(1, Ordering::SeqCst);
        let reply = if line == "exit" {
            Reply::Exit
        } else {
            (self.handler)(line)
        };

        match reply {
            Reply::Exit => {
                self.alive.store(false, Ordering::SeqCst);
                self.channel.lock().unwrap().take();
            }
            Reply::Output { text, echo, prompt } => {
                let mut out = String::new();
                if echo {
                    out.push_str(line);
                    out.push_str("\r\n");
                }
                out.push_str(&text.replace('\n', "\r\n"));
                if prompt {
                    if let Some(token) = &self.token {
                        out.push_str(token);
                    }
                }
                self.send(out);
            }
        }
    }
}

impl Write for FakeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for byte in buf {
            match byte {
                0x03 => self.interrupt(),
                other => self.pending.push(*other),
            }
        }
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw[..pos]).into_owned();
            self.respond(&line);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// `PS1='head''tail'; ...` -> `headtail`
fn parse_prompt_statement(line: &str) -> Option<String> {
    let rest = line.strip_prefix("PS1='")?;
    let end = rest.find("';")?;
    Some(rest[..end].replace("''", ""))
}

struct FakeProcess {
    alive: Arc<AtomicBool>,
}

impl ShellProcess for FakeProcess {
    fn try_wait(&mut self) -> io::Result<Option<u32>> {
        Ok(if self.alive.load(Ordering::SeqCst) {
            None
        } else {
            Some(0)
        })
    }

    fn kill(&mut self) -> io::Result<()> {
        self.alive.store(false, Ordering::SeqCst);
        Ok(())
    }
}
