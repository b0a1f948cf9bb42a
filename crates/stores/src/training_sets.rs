use std::path::{Path, PathBuf};

use anyhow::{Context, Error};
use tracing::{debug, info, Level};
use workflow::model::ModelKind;
use workflow::source::SourceNumber;

/// The marker an experiment report folder name contains for the source it was run on, e.g. `([2])`.
pub fn source_marker(source: SourceNumber) -> String {
    format!("([{}])", source)
}

/// Find the experiment report folders that hold learning data for a model kind and source.
///
/// Only the direct sub-folders of `reports_dir` are considered, sorted by name.
#[tracing::instrument(level = Level::DEBUG)]
pub fn find_training_sets(reports_dir: &Path, kind: ModelKind, source: SourceNumber) -> Result<Vec<PathBuf>, Error> {
    let marker = source_marker(source);

    let entries = std::fs::read_dir(reports_dir)
        .with_context(|| format!("Error reading reports. directory: {}", reports_dir.display()))?;

    let mut folders = vec![];
    for entry in entries {
        let entry = entry.with_context(|| format!("Error reading reports. directory: {}", reports_dir.display()))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.contains(kind.report_tag()) && name.contains(&marker) {
            debug!("Found training set. folder: {:?}", path);
            folders.push(path);
        }
    }

    folders.sort();

    info!(
        "Found training sets. kind: {}, source: {}, count: {}",
        kind,
        source,
        folders.len()
    );

    Ok(folders)
}
