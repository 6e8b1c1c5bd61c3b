//! Document loading: every readable UTF-8 file under a directory becomes a
//! [`Document`]. PDFs contribute their extracted text.

use std::path::{Path, PathBuf};

use {
    tracing::{debug, info, warn},
    walkdir::{DirEntry, WalkDir},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub source: PathBuf,
    pub text: String,
}

/// Outcome of a directory load.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub documents: Vec<Document>,
    /// Files that could not be read or were not valid UTF-8.
    pub skipped: usize,
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Text layer of a PDF, parsed on the blocking pool.
async fn extract_pdf_text(bytes: Vec<u8>) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| anyhow::anyhow!("pdf parser failed: {e}"))?
        .map_err(|e| anyhow::anyhow!("failed to extract pdf text: {e}"))
}

fn extension_allowed(path: &Path, extensions: &[String]) -> bool {
    if extensions.is_empty() {
        return true;
    }
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    extensions
        .iter()
        .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
}

/// Walk `dir` in file-name order and read every matching file.
///
/// Hidden files and directories are ignored. Files that fail to read or decode
/// are logged and counted in [`LoadReport::skipped`]; whitespace-only files
/// produce no document.
pub async fn load_documents(dir: &Path, extensions: &[String]) -> anyhow::Result<LoadReport> {
    if !dir.exists() {
        anyhow::bail!("document directory {} does not exist", dir.display());
    }

    let mut report = LoadReport::default();
    let walker = WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "failed to walk document directory entry");
                report.skipped += 1;
                continue;
            },
        };
        let path = entry.path();
        if !path.is_file() || !extension_allowed(path, extensions) {
            continue;
        }

        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read document");
                report.skipped += 1;
                continue;
            },
        };
        let text = if is_pdf(path) {
            match extract_pdf_text(bytes).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to parse pdf, skipping");
                    report.skipped += 1;
                    continue;
                },
            }
        } else {
            match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(_) => {
                    warn!(path = %path.display(), "document is not valid UTF-8, skipping");
                    report.skipped += 1;
                    continue;
                },
            }
        };
        if text.trim().is_empty() {
            debug!(path = %path.display(), "empty document, skipping");
            continue;
        }

        report.documents.push(Document {
            source: path.to_path_buf(),
            text,
        });
    }

    info!(
        dir = %dir.display(),
        documents = report.documents.len(),
        skipped = report.skipped,
        "loaded documents"
    );
    Ok(report)
}
