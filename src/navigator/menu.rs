//! Home menu and upload mode

use std::path::PathBuf;

use tracing::{info_span, Instrument};
use uuid::Uuid;

use super::console::Console;
use super::Navigator;
use crate::path::{PathCursor, Platform};
use crate::sftp::{format_size, SftpError, TransferEngine};

const HOME_MENU: &str = "\nChoose an option:\n1. upload mode\n2. easy navigate mode\nq. quit\n";

/// Top-level loop: pick upload mode or navigate mode until the user quits.
pub async fn home_menu(navigator: &mut Navigator, console: &dyn Console) {
    loop {
        console.print(HOME_MENU);
        let Some(choice) = console.prompt("> ").await else {
            return;
        };

        let result = match choice.trim() {
            "1" => upload_mode(navigator.engine(), console).await,
            "2" => navigator.run().await,
            "q" | "Q" | "0" => return,
            other => {
                console.print(&format!("Unknown option \"{}\"\n", other));
                Ok(())
            }
        };

        if let Err(e) = result {
            console.print(&format!("Error: {}\n", e));
        }
    }
}

/// Local path typed by the user, relative paths taken from the working
/// directory.
pub fn resolve_local(input: &str) -> Result<PathCursor, SftpError> {
    let path = PathBuf::from(input);
    let absolute = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .map_err(|e| SftpError::Open {
                path: input.to_string(),
                source: e,
            })?
            .join(path)
    };

    Ok(PathCursor::new(
        &absolute.to_string_lossy(),
        Platform::local(),
    )?)
}

/// Ask for a local file or directory and a remote directory, then upload.
pub async fn upload_mode(engine: &TransferEngine, console: &dyn Console) -> Result<(), SftpError> {
    let Some(local) = console.prompt("Local file or directory to upload: ").await else {
        return Ok(());
    };
    let local = local.trim();
    if local.is_empty() {
        return Ok(());
    }
    let source = resolve_local(local)?;

    let Some(remote) = console.prompt("Remote destination directory: ").await else {
        return Ok(());
    };
    let remote = remote.trim();
    let remote = if remote.is_empty() { "." } else { remote };
    let resolved = engine
        .remote()
        .canonicalize(remote)
        .await
        .map_err(|e| SftpError::Open {
            path: remote.to_string(),
            source: e,
        })?;
    let destination = PathCursor::new(&resolved, Platform::Unix)?;

    let metadata = match tokio::fs::metadata(source.to_path_buf()).await {
        Ok(metadata) => metadata,
        Err(e) => {
            console.print(&format!(
                "Error finding the file to be uploaded ({}): {}\n",
                source, e
            ));
            return Ok(());
        }
    };

    let span = info_span!("transfer", id = %Uuid::new_v4(), source = %source);
    if metadata.is_dir() {
        let report = engine
            .upload_dir(&source, &destination)
            .instrument(span)
            .await?;
        console.print(&format!(
            "Uploaded {} files ({}) into {}\n",
            report.files,
            format_size(report.bytes),
            destination
        ));
        for (path, error) in &report.failed {
            console.print(&format!("  failed: {}: {}\n", path, error));
        }
    } else if metadata.is_file() {
        let bytes = engine
            .upload_file(&source, &destination)
            .instrument(span)
            .await?;
        console.print(&format!(
            "Uploaded {} ({}) into {}\n",
            source,
            format_size(bytes),
            destination
        ));
    } else {
        console.print(&format!(
            "Error finding the file to be uploaded: {} is neither a file nor a directory\n",
            source
        ));
    }

    Ok(())
}
