//! Interactive remote browser
//!
//! Shows the listing of the current remote directory, lets the user move
//! up or into directories and hands files or whole directories to the
//! [`TransferEngine`].

mod console;
mod menu;

use std::sync::Arc;

use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::path::PathCursor;
use crate::sftp::{format_size, EntryKind, EntryList, RemoteEntry, SftpError, TransferEngine};

pub use console::{Console, ConsoleConfirm, StdConsole};
pub use menu::{home_menu, resolve_local, upload_mode};

/// Parsed answer to the selection prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selection {
    Quit,
    /// 0 is the parent directory, 1.. are listing positions
    Index(usize),
}

/// Leading integer of `input`, like `strtol` would read it.
fn leading_number(input: &str) -> Option<i64> {
    let input = input.trim_start();
    let digits_start = usize::from(input.starts_with(['-', '+']));
    let digits_len = input[digits_start..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits_len == 0 {
        return None;
    }
    input[..digits_start + digits_len].parse().ok()
}

fn parse_selection(input: &str, len: usize) -> Result<Selection, String> {
    let trimmed = input.trim();
    if trimmed.eq_ignore_ascii_case("q") {
        return Ok(Selection::Quit);
    }

    let number = leading_number(trimmed).ok_or("Invalid input, not a number\n")?;
    match usize::try_from(number) {
        Ok(index) if index <= len => Ok(Selection::Index(index)),
        _ => Err(format!(
            "Invalid input, the number should be between 0 and {}\n",
            len
        )),
    }
}

pub struct Navigator {
    engine: TransferEngine,
    console: Arc<dyn Console>,
    cwd: PathCursor,
    download_dir: PathCursor,
}

impl Navigator {
    pub fn new(
        engine: TransferEngine,
        console: Arc<dyn Console>,
        start: PathCursor,
        download_dir: PathCursor,
    ) -> Self {
        Self {
            engine,
            console,
            cwd: start,
            download_dir,
        }
    }

    /// Current remote directory
    pub fn cwd(&self) -> &PathCursor {
        &self.cwd
    }

    pub fn engine(&self) -> &TransferEngine {
        &self.engine
    }

    /// Browse until the user quits or input ends.
    ///
    /// Only a failure to list the starting directory ends the loop with an
    /// error. A directory that can't be listed after moving is reported and
    /// the previous directory is kept; failed transfers are reported and
    /// browsing continues.
    pub async fn run(&mut self) -> Result<(), SftpError> {
        let mut list = EntryList::list(self.engine.remote(), &self.cwd).await?;

        loop {
            self.console
                .print(&format!("\nYou are now at \"{}\" directory\n", self.cwd));
            self.console.print(&list.render());

            let index = loop {
                let question = format!(
                    "Choose a file or directory(0-{}) or q to quit: ",
                    list.len()
                );
                let Some(line) = self.console.prompt(&question).await else {
                    return Ok(());
                };
                match parse_selection(&line, list.len()) {
                    Ok(Selection::Quit) => return Ok(()),
                    Ok(Selection::Index(index)) => break index,
                    Err(message) => self.console.print(&message),
                }
            };

            let previous = self.cwd.duplicate();
            if index == 0 {
                if self.cwd.ascend().is_err() {
                    self.console.print("Already at the root directory\n");
                }
            } else {
                let entry = list.get(index)?.clone();
                let result = match entry.kind {
                    EntryKind::Regular => self.handle_file(&entry).await,
                    EntryKind::Directory => self.handle_directory(&entry).await,
                    kind => {
                        self.console.print(&format!(
                            "Can't handle \"{}\", it is a {} entry\n",
                            entry.name, kind
                        ));
                        Ok(())
                    }
                };

                if let Err(e) = result {
                    self.console.print(&format!("Error: {}\n", e));
                }
            }

            match EntryList::list(self.engine.remote(), &self.cwd).await {
                Ok(fresh) => list = fresh,
                Err(e) => {
                    self.console.print(&format!("Error: {}\n", e));
                    self.cwd = previous;
                }
            }
        }
    }

    /// Offer the actions available for a regular file of the listing.
    pub async fn handle_file(&mut self, entry: &RemoteEntry) -> Result<(), SftpError> {
        let source = self.cwd.child(&entry.name)?;

        self.console.print(&format!(
            "\"{}\" ({})\n1. Download the file\n",
            entry.name,
            format_size(entry.size)
        ));
        let Some(choice) = self.console.prompt("Choose an action or 0 to go back: ").await
        else {
            return Ok(());
        };
        if choice.trim() != "1" {
            return Ok(());
        }

        self.ensure_download_dir().await?;
        let span = info_span!("transfer", id = %Uuid::new_v4(), source = %source);
        let bytes = self
            .engine
            .download_file(&source, &self.download_dir, entry.size)
            .instrument(span)
            .await?;

        self.console.print(&format!(
            "Downloaded {} ({}) to {}\n",
            entry.name,
            format_size(bytes),
            self.download_dir
        ));
        Ok(())
    }

    /// Offer the actions available for a directory of the listing.
    pub async fn handle_directory(&mut self, entry: &RemoteEntry) -> Result<(), SftpError> {
        let source = self.cwd.child(&entry.name)?;

        self.console.print(&format!(
            "\"{}\"\n1. Download the directory recursively\n2. Go inside the directory\n",
            entry.name
        ));
        let Some(choice) = self.console.prompt("Choose an action or 0 to go back: ").await
        else {
            return Ok(());
        };

        match choice.trim() {
            "1" => {
                self.ensure_download_dir().await?;
                let span = info_span!("transfer", id = %Uuid::new_v4(), source = %source);
                let report = self
                    .engine
                    .download_dir(&source, &self.download_dir)
                    .instrument(span)
                    .await?;

                self.console.print(&format!(
                    "Downloaded {} files ({}) into {}\n",
                    report.files,
                    format_size(report.bytes),
                    self.download_dir
                ));
                for (path, error) in &report.failed {
                    self.console.print(&format!("  failed: {}: {}\n", path, error));
                }
            }
            "2" => self.cwd = source,
            _ => {}
        }
        Ok(())
    }

    async fn ensure_download_dir(&self) -> Result<(), SftpError> {
        tokio::fs::create_dir_all(self.download_dir.to_path_buf())
            .await
            .map_err(|e| SftpError::Create {
                path: self.download_dir.to_string(),
                source: e,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::console::testing::ScriptedConsole;
    use super::*;
    use crate::path::Platform;
    use crate::sftp::testing::MemoryRemote;
    use tempfile::tempdir;

    fn sample_remote() -> Arc<MemoryRemote> {
        let remote = MemoryRemote::new();
        remote.add_dir("/root");
        remote.add_dir("/root/empty_sub");
        remote.add_file("/root/f1.txt", b"first file");
        remote.add_special("/root/link", EntryKind::Symlink);
        remote.add_dir("/root/sub");
        remote.add_file("/root/sub/f2.txt", b"second");
        Arc::new(remote)
    }

    fn navigator(
        remote: Arc<MemoryRemote>,
        console: Arc<ScriptedConsole>,
        download_dir: &std::path::Path,
    ) -> Navigator {
        Navigator::new(
            TransferEngine::new(remote),
            console,
            PathCursor::new("/root", Platform::Unix).unwrap(),
            PathCursor::new(download_dir.to_str().unwrap(), Platform::local()).unwrap(),
        )
    }

    #[test]
    fn test_parse_selection() {
        assert_eq!(parse_selection("q", 3), Ok(Selection::Quit));
        assert_eq!(parse_selection(" 2\n", 3), Ok(Selection::Index(2)));
        assert_eq!(parse_selection("3abc", 3), Ok(Selection::Index(3)));
        assert_eq!(parse_selection("0", 0), Ok(Selection::Index(0)));
        assert_eq!(
            parse_selection("abc", 3),
            Err("Invalid input, not a number\n".to_string())
        );
        assert!(parse_selection("4", 3).is_err());
        assert!(parse_selection("-1", 3).is_err());
    }

    // Listing of /root: 1 empty_sub, 2 f1.txt, 3 link, 4 sub

    #[tokio::test]
    async fn test_go_inside_and_download_file() {
        let tmp = tempdir().unwrap();
        let console = ScriptedConsole::new(&["4", "2", "1", "1", "q"]);
        let mut nav = navigator(sample_remote(), console.clone(), tmp.path());

        nav.run().await.unwrap();

        assert_eq!(nav.cwd().as_str(), "/root/sub");
        assert_eq!(std::fs::read(tmp.path().join("f2.txt")).unwrap(), b"second");
        let output = console.output();
        assert!(output.contains("You are now at \"/root\" directory"));
        assert!(output.contains("You are now at \"/root/sub\" directory"));
        assert!(output.contains("1. Download the file"));
    }

    #[tokio::test]
    async fn test_invalid_input_and_parent() {
        let tmp = tempdir().unwrap();
        let console = ScriptedConsole::new(&["abc", "9", "3", "0", "0", "0"]);
        let mut nav = navigator(sample_remote(), console.clone(), tmp.path());

        nav.run().await.unwrap();

        let output = console.output();
        assert!(output.contains("Invalid input, not a number"));
        assert!(output.contains("between 0 and 4"));
        assert!(output.contains("\"link\", it is a symbolic link entry"));
        assert!(output.contains("Already at the root directory"));
        assert!(nav.cwd().is_root());
    }

    #[tokio::test]
    async fn test_download_directory() {
        let tmp = tempdir().unwrap();
        let downloads = tmp.path().join("Downloads");
        let console = ScriptedConsole::new(&["4", "1", "q"]);
        let mut nav = navigator(sample_remote(), console.clone(), &downloads);

        nav.run().await.unwrap();

        assert_eq!(
            std::fs::read(downloads.join("sub").join("f2.txt")).unwrap(),
            b"second"
        );
        assert!(console.output().contains("Downloaded 1 files"));
        assert_eq!(nav.cwd().as_str(), "/root");
    }

    #[tokio::test]
    async fn test_transfer_error_keeps_browsing() {
        let tmp = tempdir().unwrap();
        std::fs::create_dir(tmp.path().join("sub")).unwrap();
        let console = ScriptedConsole::new(&["4", "1", "q"]);
        let mut nav = navigator(sample_remote(), console.clone(), tmp.path());

        nav.run().await.unwrap();

        let output = console.output();
        assert!(output.contains("Error: Directory"));
        assert!(output.contains("already exists"));
    }

    #[tokio::test]
    async fn test_unlistable_directory_keeps_previous() {
        let tmp = tempdir().unwrap();
        let remote = sample_remote();
        remote.fail_listing_of("/root/sub");
        let console = ScriptedConsole::new(&["4", "2", "q"]);
        let mut nav = navigator(remote, console.clone(), tmp.path());

        nav.run().await.unwrap();
        assert_eq!(nav.cwd().as_str(), "/root");
        let output = console.output();
        assert!(output.contains("Error: "));
        assert_eq!(output.matches("You are now at \"/root\" directory").count(), 2);

        // Navigate mode can be entered again from the same place
        let again = ScriptedConsole::new(&["q"]);
        nav.console = again.clone() as Arc<dyn Console>;
        nav.run().await.unwrap();
        assert_eq!(nav.cwd().as_str(), "/root");
        assert!(again.output().contains("You are now at \"/root\" directory"));
    }

    #[tokio::test]
    async fn test_listing_failure_ends_navigation() {
        let tmp = tempdir().unwrap();
        let remote = sample_remote();
        remote.fail_listing_of("/root");
        let mut nav = navigator(remote, ScriptedConsole::new(&["q"]), tmp.path());

        assert!(matches!(nav.run().await, Err(SftpError::Listing { .. })));
    }
}
