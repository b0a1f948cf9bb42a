use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use strum::IntoEnumIterator;
use strum_macros::EnumIter;
use thiserror::Error;
use time::serde::rfc3339;
use time::OffsetDateTime;
use tracing::info;

use crate::material::MaterialName;
use crate::source::SourceNumber;
use crate::training::TrainingBuffer;

/// The kinds of predictive model the workflow trains.
#[derive(
    Debug,
    serde::Serialize,
    serde::Deserialize,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumIter
)]
pub enum ModelKind {
    /// Exploration of the minimum deposition rate, the "EE" models.
    MinimumRate,
    SputterProcess,
}

impl ModelKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            ModelKind::MinimumRate => "EE",
            ModelKind::SputterProcess => "SP",
        }
    }

    /// Experiment report folders that hold learning data for this kind contain the tag in their name.
    pub fn report_tag(&self) -> &'static str {
        match self {
            ModelKind::MinimumRate => "EE_LearnMinimumRate",
            ModelKind::SputterProcess => "SP_LearnSputterProcess",
        }
    }

    /// e.g. `EE_model_Zr`
    pub fn session_key(&self, material: &MaterialName) -> String {
        format!("{}_model_{}", self.prefix(), material)
    }

    /// The inverse of [`ModelKind::session_key`], `None` if the key is not a model key.
    pub fn parse_session_key(key: &str) -> Option<(ModelKind, &str)> {
        ModelKind::iter().find_map(|kind| {
            key.strip_prefix(kind.prefix())
                .and_then(|remainder| remainder.strip_prefix("_model_"))
                .map(|material| (kind, material))
        })
    }
}

impl Display for ModelKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.prefix())
    }
}

/// An opaque reference to a trained model, a model folder or file.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct ModelReference(PathBuf);

impl ModelReference {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl Display for ModelReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// At most one model per (kind, material), once bound a model cannot be replaced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BoundModels(BTreeMap<(ModelKind, MaterialName), ModelReference>);

impl BoundModels {
    /// Returns the already bound model on conflict, leaving the existing binding in place.
    pub(crate) fn bind(
        &mut self,
        kind: ModelKind,
        material: MaterialName,
        model: ModelReference,
    ) -> Result<(), ModelReference> {
        match self.0.entry((kind, material)) {
            std::collections::btree_map::Entry::Occupied(entry) => Err(entry.get().clone()),
            std::collections::btree_map::Entry::Vacant(entry) => {
                entry.insert(model);
                Ok(())
            }
        }
    }

    pub(crate) fn remove(&mut self, kind: ModelKind, material: &MaterialName) -> Option<ModelReference> {
        self.0.remove(&(kind, material.clone()))
    }

    pub fn get(&self, kind: ModelKind, material: &MaterialName) -> Option<&ModelReference> {
        self.0.get(&(kind, material.clone()))
    }

    pub fn has_kind(&self, kind: ModelKind) -> bool {
        self.0
            .keys()
            .any(|(candidate, _)| candidate.eq(&kind))
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModelKind, &MaterialName, &ModelReference)> {
        self.0
            .iter()
            .map(|((kind, material), model)| (*kind, material, model))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Describes a trained model, stored alongside the model.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct ModelManifest {
    pub kind: ModelKind,
    pub material: MaterialName,
    pub source: SourceNumber,
    pub columns: Vec<String>,
    pub rows: usize,
    pub training_sets: Vec<PathBuf>,
    #[serde(with = "rfc3339")]
    pub created: OffsetDateTime,
}

#[derive(Error, Debug)]
pub enum TrainingError {
    #[error("No training data. kind: {kind}, material: '{material}'")]
    NoTrainingData { kind: ModelKind, material: MaterialName },
}

pub trait ModelTrainer {
    fn train(
        &self,
        kind: ModelKind,
        material: &MaterialName,
        source: SourceNumber,
        buffer: &TrainingBuffer,
    ) -> Result<ModelManifest, TrainingError>;
}

/// Summarises the training data without fitting anything.
///
/// Stands in for the classifier training until the features, labels and evaluation metric are defined.
#[derive(Debug, Default)]
pub struct PlaceholderTrainer;

impl ModelTrainer for PlaceholderTrainer {
    fn train(
        &self,
        kind: ModelKind,
        material: &MaterialName,
        source: SourceNumber,
        buffer: &TrainingBuffer,
    ) -> Result<ModelManifest, TrainingError> {
        if buffer.is_empty() {
            return Err(TrainingError::NoTrainingData {
                kind,
                material: material.clone(),
            });
        }

        let manifest = ModelManifest {
            kind,
            material: material.clone(),
            source,
            columns: buffer.columns().to_vec(),
            rows: buffer.len(),
            training_sets: buffer.training_sets(),
            created: OffsetDateTime::now_utc(),
        };

        info!(
            "Trained placeholder model. kind: {}, material: '{}', rows: {}, training_sets: {}",
            kind,
            material,
            manifest.rows,
            manifest.training_sets.len()
        );

        Ok(manifest)
    }
}
