use std::fmt::{Display, Formatter};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_with::{serde_as, DeserializeAs, PickFirst};

use crate::material::MaterialName;

/// The minimum number of non-zero values a target composition needs before it can be bound.
pub const MINIMUM_NON_ZERO_VALUES: usize = 2;

/// A desired relative quantity per active material, in source order.
#[serde_as]
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct TargetComposition(
    // older session files store the text of the entry fields, e.g. `"Zr": "10"`
    #[serde_as(as = "IndexMap<_, PickFirst<(_, EntryText)>>")] IndexMap<MaterialName, u32>,
);

/// Composition values as text, an empty entry field counts as zero.
struct EntryText;

impl<'de> DeserializeAs<'de, u32> for EntryText {
    fn deserialize_as<D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        let text = text.trim();
        if text.is_empty() {
            return Ok(0);
        }
        text.parse::<u32>()
            .map_err(serde::de::Error::custom)
    }
}

impl TargetComposition {
    pub fn new(values: IndexMap<MaterialName, u32>) -> Self {
        Self(values)
    }

    pub fn get(&self, material: &MaterialName) -> Option<u32> {
        self.0.get(material).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MaterialName, &u32)> {
        self.0.iter()
    }

    pub fn non_zero_count(&self) -> usize {
        self.0
            .values()
            .filter(|value| **value > 0)
            .count()
    }

    pub fn is_bindable(&self) -> bool {
        self.non_zero_count() >= MINIMUM_NON_ZERO_VALUES
    }
}

impl Display for TargetComposition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}]",
            self.0
                .iter()
                .map(|(material, value)| format!("{}={}", material, value))
                .collect::<Vec<String>>()
                .join(", ")
        )
    }
}

/// The bound target compositions of a workflow.
///
/// Append-only, entries cannot be changed once bound.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct CompositionLedger(Vec<TargetComposition>);

impl CompositionLedger {
    pub(crate) fn append(&mut self, composition: TargetComposition) {
        self.0.push(composition);
    }

    /// Used to undo an append when the session could not be persisted.
    pub(crate) fn pop(&mut self) -> Option<TargetComposition> {
        self.0.pop()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TargetComposition> {
        self.0.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TargetComposition> {
        self.0.iter()
    }
}
