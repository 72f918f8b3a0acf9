use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::ir::CfgDocument;

/// Reads CFG documents from files and directories.
///
/// Directories are walked recursively and only `.json` entries are taken,
/// in sorted order so runs are deterministic.
pub(crate) fn load_inputs(inputs: &[PathBuf]) -> Result<Vec<CfgDocument>> {
    let mut files = Vec::new();
    for input in inputs {
        collect_files(input, &mut files)?;
    }

    let mut documents = Vec::with_capacity(files.len());
    for path in files {
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let document: CfgDocument = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse CFG document {}", path.display()))?;
        debug!(
            path = %path.display(),
            methods = document.methods.len(),
            "loaded CFG document"
        );
        documents.push(document);
    }
    info!(documents = documents.len(), "loaded CFG documents");
    Ok(documents)
}

fn collect_files(path: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    if !path.is_dir() {
        files.push(path.to_path_buf());
        return Ok(());
    }
    let mut entries = Vec::new();
    for entry in
        fs::read_dir(path).with_context(|| format!("failed to list {}", path.display()))?
    {
        let entry = entry.with_context(|| format!("failed to list {}", path.display()))?;
        entries.push(entry.path());
    }
    entries.sort();
    for entry in entries {
        if entry.is_dir() {
            collect_files(&entry, files)?;
        } else if entry.extension().is_some_and(|extension| extension == "json") {
            files.push(entry);
        }
    }
    Ok(())
}
