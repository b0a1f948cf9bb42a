use std::fmt::{Display, Formatter};

use strum::IntoEnumIterator;
use strum_macros::EnumIter;
use tracing::{debug, info};

use crate::model::ModelKind;

/// The stages of the self-driving workflow, in order.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter)]
pub enum Stage {
    DefineTargetCompositions,
    FindBoundaries,
    LearnSputterProcess,
    CalibrateCompositions,
    LearnFeatureMap,
    FeatureIdentification,
}

pub const STAGE_COUNT: usize = 6;

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::DefineTargetCompositions => "Define Target Compositions",
            Stage::FindBoundaries => "Find Boundaries",
            Stage::LearnSputterProcess => "Learn Sputter Process",
            Stage::CalibrateCompositions => "Calibrate Compositions",
            Stage::LearnFeatureMap => "Learn Feature Map",
            Stage::FeatureIdentification => "Feature Identification",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn all() -> impl Iterator<Item = Stage> {
        Stage::iter()
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The session state the stage unlock predicates are evaluated against.
pub trait StageConditions {
    fn has_bound_compositions(&self) -> bool;
    fn has_bound_model(&self, kind: ModelKind) -> bool;
}

/// Tracks which stages are enabled.
///
/// Derived from the session, never persisted. Stages are only ever enabled, never disabled again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageGate {
    enabled: [bool; STAGE_COUNT],
}

impl StageGate {
    pub fn new() -> Self {
        let mut enabled = [false; STAGE_COUNT];
        enabled[Stage::DefineTargetCompositions.index()] = true;
        Self {
            enabled,
        }
    }

    /// The gate for an existing session, stages unlocked earlier are not reported as newly enabled.
    pub fn from_conditions(conditions: &impl StageConditions) -> Self {
        let mut gate = Self::new();
        for stage in gate.unlock(conditions) {
            debug!("Stage unlocked. stage: '{}'", stage);
        }
        gate
    }

    /// `None` for stages that have no unlock condition yet, they stay disabled.
    fn is_unlocked(stage: Stage, conditions: &impl StageConditions) -> Option<bool> {
        match stage {
            Stage::DefineTargetCompositions => Some(true),
            Stage::FindBoundaries => Some(conditions.has_bound_compositions()),
            Stage::LearnSputterProcess => Some(conditions.has_bound_model(ModelKind::MinimumRate)),
            Stage::CalibrateCompositions | Stage::LearnFeatureMap | Stage::FeatureIdentification => None,
        }
    }

    fn unlock(&mut self, conditions: &impl StageConditions) -> Vec<Stage> {
        let mut unlocked = vec![];
        for stage in Stage::iter() {
            if self.enabled[stage.index()] {
                continue;
            }
            if let Some(true) = Self::is_unlocked(stage, conditions) {
                self.enabled[stage.index()] = true;
                unlocked.push(stage);
            }
        }
        unlocked
    }

    /// Evaluate the unlock conditions, returns the newly enabled stages.
    pub fn refresh(&mut self, conditions: &impl StageConditions) -> Vec<Stage> {
        let unlocked = self.unlock(conditions);
        for stage in unlocked.iter() {
            info!("Stage enabled. stage: '{}'", stage);
        }
        unlocked
    }

    pub fn is_enabled(&self, stage: Stage) -> bool {
        self.enabled[stage.index()]
    }

    pub fn enabled_stages(&self) -> impl Iterator<Item = Stage> + '_ {
        Stage::iter().filter(|stage| self.is_enabled(*stage))
    }
}

impl Default for StageGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Formats the gate as e.g. `['Define Target Compositions': enabled, 'Find Boundaries': disabled, ...]`
pub struct StageSummary<'a>(pub &'a StageGate);

impl<'a> Display for StageSummary<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}]",
            Stage::iter()
                .map(|stage| {
                    let state = match self.0.is_enabled(stage) {
                        true => "enabled",
                        false => "disabled",
                    };
                    format!("'{}': {}", stage, state)
                })
                .collect::<Vec<String>>()
                .join(", ")
        )
    }
}
