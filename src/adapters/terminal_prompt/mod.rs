// Terminal prompt adapter - Line-based stdin/stdout I/O for interactive ordering

use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use crate::ports::PromptPort;
use crate::utils::interrupt;

/// How often a pending prompt checks for Ctrl-C
const INTERRUPT_POLL: Duration = Duration::from_millis(100);

/// Prompt adapter over the process's stdin and stdout.
///
/// Lines are read on a background thread so a pending prompt can notice
/// Ctrl-C without waiting for Enter. `None` from the reader means end of input.
#[derive(Debug, Default)]
pub struct StdinPromptAdapter {
    lines: Option<Receiver<Option<String>>>,
}

impl StdinPromptAdapter {
    /// Create new prompt adapter
    pub fn new() -> Self {
        Self { lines: None }
    }

    fn lines(&mut self) -> &Receiver<Option<String>> {
        self.lines.get_or_insert_with(spawn_stdin_reader)
    }
}

fn spawn_stdin_reader() -> Receiver<Option<String>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        loop {
            let mut line = String::new();
            match stdin.lock().read_line(&mut line) {
                Ok(0) | Err(_) => {
                    let _ = tx.send(None);
                    return;
                }
                Ok(_) => {
                    if tx.send(Some(line)).is_err() {
                        return;
                    }
                }
            }
        }
    });
    rx
}

impl PromptPort for StdinPromptAdapter {
    fn show(&mut self, line: &str) {
        println!("{}", line);
    }

    fn ask(&mut self, prompt: &str) -> Option<String> {
        let mut stdout = io::stdout();
        let _ = write!(stdout, "{}", prompt);
        let _ = stdout.flush();

        let answer = loop {
            if interrupt::interrupted() {
                break None;
            }
            match self.lines().recv_timeout(INTERRUPT_POLL) {
                Ok(line) => break line,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break None,
            }
        };

        match answer {
            Some(line) => Some(line.trim().to_string()),
            None => {
                // Keep the next message off the prompt line.
                println!();
                None
            }
        }
    }
}
