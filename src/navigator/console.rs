//! Line-oriented terminal I/O

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use tracing::warn;

use crate::sftp::OverwriteConfirm;

#[async_trait]
pub trait Console: Send + Sync {
    /// Next input line without its terminator, `None` once input is closed.
    async fn read_line(&self) -> Option<String>;

    /// Write `text` as is, no newline added.
    fn print(&self, text: &str);

    /// Print `question` and read the answer.
    async fn prompt(&self, question: &str) -> Option<String> {
        self.print(question);
        self.read_line().await
    }
}

/// Console over the process stdin/stdout
pub struct StdConsole {
    lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl StdConsole {
    pub fn new() -> Self {
        Self {
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }
}

impl Default for StdConsole {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Console for StdConsole {
    async fn read_line(&self) -> Option<String> {
        match self.lines.lock().await.next_line().await {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to read from stdin: {}", e);
                None
            }
        }
    }

    fn print(&self, text: &str) {
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }
}

/// Asks on the console before a download replaces a local file
pub struct ConsoleConfirm {
    console: Arc<dyn Console>,
}

impl ConsoleConfirm {
    pub fn new(console: Arc<dyn Console>) -> Self {
        Self { console }
    }
}

#[async_trait]
impl OverwriteConfirm for ConsoleConfirm {
    async fn confirm_overwrite(&self, path: &Path) -> bool {
        let question = format!(
            "File \"{}\" already exists, overwrite? [y/N] ",
            path.display()
        );
        match self.console.prompt(&question).await {
            Some(answer) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            None => false,
        }
    }
}
