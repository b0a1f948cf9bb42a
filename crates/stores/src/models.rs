use std::path::{Path, PathBuf};

use anyhow::{Context, Error};
use tracing::{info, trace, Level};
use workflow::file;
use workflow::material::MaterialName;
use workflow::model::{ModelKind, ModelManifest, ModelReference};

pub const MANIFEST_FILE_NAME: &str = "model.json";

fn folder_prefix(kind: ModelKind, material: &MaterialName) -> String {
    format!("{}_", kind.session_key(material))
}

/// The next free sequence number for a model folder, starting at 1.
fn next_sequence(models_dir: &Path, prefix: &str) -> Result<u32, Error> {
    let entries = std::fs::read_dir(models_dir)
        .with_context(|| format!("Error reading models. directory: {}", models_dir.display()))?;

    let mut highest = 0;
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let sequence = name
            .to_string_lossy()
            .strip_prefix(prefix)
            .and_then(|remainder| remainder.parse::<u32>().ok());
        if let Some(sequence) = sequence {
            highest = highest.max(sequence);
        }
    }

    Ok(highest + 1)
}

/// Store a model in a new folder, `<models_dir>/<prefix>_model_<material>_<n>`.
pub fn store_model(models_dir: &Path, manifest: &ModelManifest) -> Result<ModelReference, Error> {
    std::fs::create_dir_all(models_dir)
        .with_context(|| format!("Error creating models directory. directory: {}", models_dir.display()))?;

    let prefix = folder_prefix(manifest.kind, &manifest.material);
    let sequence = next_sequence(models_dir, &prefix)?;
    let model_dir = models_dir.join(format!("{}{}", prefix, sequence));

    std::fs::create_dir(&model_dir)
        .with_context(|| format!("Error creating model directory. directory: {}", model_dir.display()))?;
    file::save(manifest, &model_dir.join(MANIFEST_FILE_NAME))?;

    info!(
        "Stored model. kind: {}, material: '{}', path: {:?}",
        manifest.kind, manifest.material, model_dir
    );

    Ok(ModelReference::new(model_dir))
}

/// List the models in `models_dir`, sorted by folder name.
///
/// Folders without a manifest are skipped, a missing directory has no models.
#[tracing::instrument(level = Level::DEBUG)]
pub fn list_models(models_dir: &Path) -> Result<Vec<(ModelReference, ModelManifest)>, Error> {
    if !models_dir.exists() {
        info!("No models directory. directory: {:?}", models_dir);
        return Ok(vec![]);
    }

    let entries = std::fs::read_dir(models_dir)
        .with_context(|| format!("Error reading models. directory: {}", models_dir.display()))?;

    let mut folders: Vec<PathBuf> = vec![];
    for entry in entries {
        let path = entry?.path();
        if path.join(MANIFEST_FILE_NAME).is_file() {
            folders.push(path);
        }
    }
    folders.sort();

    let mut models = vec![];
    for folder in folders {
        let manifest_path = folder.join(MANIFEST_FILE_NAME);
        let manifest: ModelManifest = file::load(&manifest_path)
            .with_context(|| format!("Error loading model manifest. file: {}", manifest_path.display()))?;

        trace!("{:?}", manifest);

        models.push((ModelReference::new(folder), manifest));
    }

    Ok(models)
}
