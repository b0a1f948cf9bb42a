use std::fmt::{Display, Formatter};
use std::str::FromStr;

use thiserror::Error;

/// The number of physical sputtering sources in the chamber.
pub const SOURCE_COUNT: usize = 6;

/// A 1-based source slot number, `1..=SOURCE_COUNT`.
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
    Hash
)]
#[serde(try_from = "u8", into = "u8")]
pub struct SourceNumber(u8);

impl SourceNumber {
    pub fn from_index(index: usize) -> Option<Self> {
        (index < SOURCE_COUNT).then(|| Self(index as u8 + 1))
    }

    pub fn index(&self) -> usize {
        (self.0 - 1) as usize
    }

    pub fn all() -> impl Iterator<Item = SourceNumber> {
        (0..SOURCE_COUNT).filter_map(Self::from_index)
    }
}

impl TryFrom<u8> for SourceNumber {
    type Error = SourceNumberError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (1..=SOURCE_COUNT as u8).contains(&value) {
            Ok(Self(value))
        } else {
            Err(SourceNumberError::OutOfRange(value as usize))
        }
    }
}

impl From<SourceNumber> for u8 {
    fn from(value: SourceNumber) -> Self {
        value.0
    }
}

impl FromStr for SourceNumber {
    type Err = SourceNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<u8>()
            .map_err(|_| SourceNumberError::Invalid(s.to_string()))?;
        Self::try_from(value)
    }
}

impl Display for SourceNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SourceNumberError {
    #[error("Source number out of range, expected 1..={last}. value: {0}", last = SOURCE_COUNT)]
    OutOfRange(usize),
    #[error("Invalid source number: '{0}'")]
    Invalid(String),
}

/// One flag per source slot, `true` when the source takes part in the workflow.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct ActiveSources(pub [bool; SOURCE_COUNT]);

impl ActiveSources {
    pub fn from_source_numbers(sources: &[SourceNumber]) -> Self {
        let mut flags = [false; SOURCE_COUNT];
        for source in sources {
            flags[source.index()] = true;
        }
        Self(flags)
    }

    pub fn is_active(&self, source: SourceNumber) -> bool {
        self.0[source.index()]
    }

    pub fn active_count(&self) -> usize {
        self.0
            .iter()
            .filter(|active| **active)
            .count()
    }

    pub fn active_source_numbers(&self) -> impl Iterator<Item = SourceNumber> + '_ {
        SourceNumber::all().filter(|source| self.is_active(*source))
    }
}
