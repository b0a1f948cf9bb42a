use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use indexmap::IndexMap;
use itertools::Itertools;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, Level};

use crate::composition::{CompositionLedger, TargetComposition, MINIMUM_NON_ZERO_VALUES};
use crate::file::{self, FileError};
use crate::material::MaterialName;
use crate::model::{BoundModels, ModelKind, ModelReference};
use crate::source::{ActiveSources, SourceNumber, SOURCE_COUNT};
use crate::stage::{StageConditions, StageGate};
use crate::training::{TrainingBuffer, TrainingDataError};

/// The minimum number of sources a workflow needs.
pub const MINIMUM_ACTIVE_SOURCES: usize = 2;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Too few sources. active: {active}, required: {required}", required = MINIMUM_ACTIVE_SOURCES)]
    TooFewSources { active: usize },
    #[error("Too few non-zero values. non_zero: {non_zero}, required: {required}", required = MINIMUM_NON_ZERO_VALUES)]
    TooFewNonZero { non_zero: usize },
    #[error("Unknown material. material: '{0}'")]
    UnknownMaterial(MaterialName),
    #[error("Material is not active. material: '{0}'")]
    InactiveMaterial(MaterialName),
    #[error("Model already bound. kind: {kind}, material: '{material}', model: '{model}'")]
    AlreadyBound {
        kind: ModelKind,
        material: MaterialName,
        model: ModelReference,
    },
    #[error("Session file already exists. path: {0:?}")]
    AlreadyExists(PathBuf),
    #[error("Model not found. model: '{0}'")]
    ModelNotFound(ModelReference),
    #[error("Session file not found. path: {0:?}")]
    NotFound(PathBuf),
    #[error("Invalid session file. path: {path:?}, reason: {reason}")]
    Parse { path: PathBuf, reason: String },
    #[error("IO error. path: {path:?}, cause: {cause}")]
    Io { path: PathBuf, cause: std::io::Error },
    #[error(transparent)]
    TrainingData(#[from] TrainingDataError),
}

/// How an error is presented to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Conflict,
    NotFound,
    Format,
    Io,
}

impl SessionError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SessionError::TooFewSources { .. }
            | SessionError::TooFewNonZero { .. }
            | SessionError::UnknownMaterial(_)
            | SessionError::InactiveMaterial(_) => ErrorCategory::Validation,
            SessionError::AlreadyBound { .. } | SessionError::AlreadyExists(_) => ErrorCategory::Conflict,
            SessionError::ModelNotFound(_) | SessionError::NotFound(_) => ErrorCategory::NotFound,
            SessionError::Parse { .. } => ErrorCategory::Format,
            SessionError::Io { .. } => ErrorCategory::Io,
            SessionError::TrainingData(error) => match error {
                TrainingDataError::NotFound(_) => ErrorCategory::NotFound,
                TrainingDataError::Io { .. } => ErrorCategory::Io,
                TrainingDataError::Parse { .. } | TrainingDataError::SchemaMismatch { .. } => ErrorCategory::Format,
            },
        }
    }
}

impl From<FileError> for SessionError {
    fn from(error: FileError) -> Self {
        match error {
            FileError::NotFound(path) => SessionError::NotFound(path),
            FileError::Io {
                path,
                cause,
            } => SessionError::Io {
                path,
                cause,
            },
            FileError::Parse {
                path,
                cause,
            } => SessionError::Parse {
                path,
                reason: cause.to_string(),
            },
        }
    }
}

/// The persisted form of a session.
///
/// Bound models are stored as top-level `<prefix>_model_<material>` keys, other unknown keys are kept as-is.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct SessionFile {
    #[serde(rename = "target materials")]
    target_materials: [MaterialName; SOURCE_COUNT],
    active_sources: ActiveSources,
    #[serde(skip_serializing_if = "CompositionLedger::is_empty")]
    #[serde(default)]
    target_compositions: CompositionLedger,
    #[serde(flatten)]
    extra: IndexMap<String, Value>,
}

/// The state of one workflow, persisted to a JSON file after every change to the ledger or the bound models.
///
/// Training buffers are working state and are not persisted.
#[derive(Debug)]
pub struct Session {
    path: PathBuf,
    target_materials: [MaterialName; SOURCE_COUNT],
    active_sources: ActiveSources,
    ledger: CompositionLedger,
    bound_models: BoundModels,
    extra: IndexMap<String, Value>,
    training_buffers: BTreeMap<(ModelKind, SourceNumber), TrainingBuffer>,
}

impl Session {
    /// Create a new session and write it to `path`.
    ///
    /// An existing session file is never replaced, its ledger and bound models are kept.
    pub fn create(
        path: PathBuf,
        target_materials: [MaterialName; SOURCE_COUNT],
        active_sources: ActiveSources,
    ) -> Result<Self, SessionError> {
        let active = active_sources.active_count();
        if active < MINIMUM_ACTIVE_SOURCES {
            return Err(SessionError::TooFewSources {
                active,
            });
        }

        if path.exists() {
            return Err(SessionError::AlreadyExists(path));
        }

        let session = Self {
            path,
            target_materials,
            active_sources,
            ledger: CompositionLedger::default(),
            bound_models: BoundModels::default(),
            extra: IndexMap::new(),
            training_buffers: BTreeMap::new(),
        };
        session.save()?;

        info!(
            "Created workflow. path: {:?}, active_materials: [{}]",
            session.path,
            session
                .active_materials()
                .map(|(_, material)| material)
                .join(", ")
        );

        Ok(session)
    }

    #[tracing::instrument(level = Level::DEBUG)]
    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let session_file: SessionFile = file::load(path)?;
        let invalid = |reason: String| SessionError::Parse {
            path: path.to_path_buf(),
            reason,
        };

        if let Some(duplicate) = session_file
            .target_materials
            .iter()
            .duplicates()
            .next()
        {
            return Err(invalid(format!("duplicate target material '{}'", duplicate)));
        }

        let active = session_file.active_sources.active_count();
        if active < MINIMUM_ACTIVE_SOURCES {
            return Err(invalid(format!("too few active sources, active: {}", active)));
        }

        let is_active_material = |material: &MaterialName| {
            session_file
                .target_materials
                .iter()
                .position(|candidate| candidate.eq(material))
                .and_then(SourceNumber::from_index)
                .is_some_and(|source| session_file.active_sources.is_active(source))
        };

        for composition in session_file.target_compositions.iter() {
            if let Some((material, _)) = composition
                .iter()
                .find(|(material, _)| !is_active_material(material))
            {
                return Err(invalid(format!("composition contains inactive material '{}'", material)));
            }
            if !composition.is_bindable() {
                return Err(invalid(format!(
                    "composition has too few non-zero values, composition: {}",
                    composition
                )));
            }
        }

        let mut bound_models = BoundModels::default();
        let mut extra = IndexMap::new();
        for (key, value) in session_file.extra {
            let Some((kind, material)) = ModelKind::parse_session_key(&key) else {
                extra.insert(key, value);
                continue;
            };

            let material = MaterialName::from_str(material)
                .map_err(|_| invalid(format!("invalid model key '{}'", key)))?;
            if !is_active_material(&material) {
                return Err(invalid(format!("model bound to inactive or unknown material '{}'", material)));
            }
            let Value::String(model) = value else {
                return Err(invalid(format!("model reference for '{}' is not a string", key)));
            };

            bound_models
                .bind(kind, material, ModelReference::new(PathBuf::from(model)))
                .map_err(|_| invalid(format!("duplicate model key '{}'", key)))?;
        }

        let session = Self {
            path: path.to_path_buf(),
            target_materials: session_file.target_materials,
            active_sources: session_file.active_sources,
            ledger: session_file.target_compositions,
            bound_models,
            extra,
            training_buffers: BTreeMap::new(),
        };

        info!(
            "Loaded workflow. path: {:?}, compositions: {}, models: {}",
            session.path,
            session.ledger.len(),
            session.bound_models.len()
        );

        Ok(session)
    }

    pub fn save(&self) -> Result<(), SessionError> {
        let mut extra = self.extra.clone();
        for (kind, material, model) in self.bound_models.iter() {
            extra.insert(kind.session_key(material), Value::String(model.to_string()));
        }

        let session_file = SessionFile {
            target_materials: self.target_materials.clone(),
            active_sources: self.active_sources,
            target_compositions: self.ledger.clone(),
            extra,
        };

        file::save(&session_file, &self.path)?;
        debug!("Saved workflow. path: {:?}", self.path);

        Ok(())
    }

    /// Save to a new path, subsequent saves go to the new path.
    pub fn save_as(&mut self, path: PathBuf) -> Result<(), SessionError> {
        let previous = std::mem::replace(&mut self.path, path);
        if let Err(error) = self.save() {
            self.path = previous;
            return Err(error);
        }
        info!("Saved workflow. path: {:?}", self.path);
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn target_materials(&self) -> &[MaterialName; SOURCE_COUNT] {
        &self.target_materials
    }

    pub fn active_sources(&self) -> ActiveSources {
        self.active_sources
    }

    /// The active sources and their materials, in source order.
    pub fn active_materials(&self) -> impl Iterator<Item = (SourceNumber, &MaterialName)> + '_ {
        self.active_sources
            .active_source_numbers()
            .map(|source| (source, &self.target_materials[source.index()]))
    }

    pub fn ledger(&self) -> &CompositionLedger {
        &self.ledger
    }

    pub fn bound_models(&self) -> &BoundModels {
        &self.bound_models
    }

    /// The source of an active material.
    pub fn active_source_of(&self, material: &MaterialName) -> Result<SourceNumber, SessionError> {
        let source = self
            .target_materials
            .iter()
            .position(|candidate| candidate.eq(material))
            .and_then(SourceNumber::from_index)
            .ok_or_else(|| SessionError::UnknownMaterial(material.clone()))?;

        match self.active_sources.is_active(source) {
            true => Ok(source),
            false => Err(SessionError::InactiveMaterial(material.clone())),
        }
    }

    /// Append a composition to the ledger and persist the session.
    ///
    /// Active materials missing from `values` are recorded as zero. If the session cannot be saved the
    /// composition is not kept.
    pub fn bind_composition(
        &mut self,
        values: &IndexMap<MaterialName, u32>,
    ) -> Result<TargetComposition, SessionError> {
        for material in values.keys() {
            self.active_source_of(material)?;
        }

        let composition = TargetComposition::new(
            self.active_materials()
                .map(|(_, material)| {
                    let value = values
                        .get(material)
                        .copied()
                        .unwrap_or_default();
                    (material.clone(), value)
                })
                .collect(),
        );

        if !composition.is_bindable() {
            return Err(SessionError::TooFewNonZero {
                non_zero: composition.non_zero_count(),
            });
        }

        self.ledger.append(composition.clone());
        if let Err(error) = self.save() {
            self.ledger.pop();
            return Err(error);
        }

        info!(
            "Bound target composition. index: {}, composition: {}",
            self.ledger.len() - 1,
            composition
        );

        Ok(composition)
    }

    /// Bind a trained model to an active material and persist the session.
    pub fn bind_model(
        &mut self,
        kind: ModelKind,
        material: &MaterialName,
        model: ModelReference,
    ) -> Result<(), SessionError> {
        self.active_source_of(material)?;

        if !model.path().exists() {
            return Err(SessionError::ModelNotFound(model));
        }

        self.bound_models
            .bind(kind, material.clone(), model.clone())
            .map_err(|existing| SessionError::AlreadyBound {
                kind,
                material: material.clone(),
                model: existing,
            })?;

        if let Err(error) = self.save() {
            self.bound_models.remove(kind, material);
            return Err(error);
        }

        info!("Bound model. kind: {}, material: '{}', model: '{}'", kind, material, model);

        Ok(())
    }

    /// The stage gate, derived from the current ledger and bound models.
    pub fn stage_gate(&self) -> StageGate {
        StageGate::from_conditions(self)
    }

    pub fn training_buffer(&self, kind: ModelKind, material: &MaterialName) -> Result<Option<&TrainingBuffer>, SessionError> {
        let source = self.active_source_of(material)?;
        Ok(self.training_buffers.get(&(kind, source)))
    }

    pub fn training_buffer_mut(
        &mut self,
        kind: ModelKind,
        material: &MaterialName,
    ) -> Result<&mut TrainingBuffer, SessionError> {
        let source = self.active_source_of(material)?;
        Ok(self
            .training_buffers
            .entry((kind, source))
            .or_default())
    }

    /// Merge the learning data of each training set folder into the buffer, in order.
    ///
    /// Stops at the first folder that cannot be loaded, earlier folders stay merged.
    pub fn add_training_sets(
        &mut self,
        kind: ModelKind,
        material: &MaterialName,
        folders: &[PathBuf],
    ) -> Result<usize, SessionError> {
        let buffer = self.training_buffer_mut(kind, material)?;
        let mut added = 0;
        for folder in folders {
            added += buffer.load_training_set(folder)?;
        }
        Ok(added)
    }

    pub fn clear_training_data(&mut self, kind: ModelKind, material: &MaterialName) -> Result<(), SessionError> {
        self.training_buffer_mut(kind, material)?
            .clear();
        info!("Cleared training data. kind: {}, material: '{}'", kind, material);
        Ok(())
    }
}

impl StageConditions for Session {
    fn has_bound_compositions(&self) -> bool {
        !self.ledger.is_empty()
    }

    fn has_bound_model(&self, kind: ModelKind) -> bool {
        self.bound_models.has_kind(kind)
    }
}
