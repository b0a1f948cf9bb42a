use std::fmt::{Display, Formatter};
use std::str::FromStr;

use thiserror::Error;

/// The name of a target material, e.g. `Zr` or `CuS`.
///
/// Material names are used as column headers, session-file keys and model-folder names, so they
/// must be non-empty and contain no whitespace or control characters.
#[derive(
    Debug,
    serde::Serialize,
    serde::Deserialize,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash
)]
#[serde(try_from = "String", into = "String")]
pub struct MaterialName(String);

impl MaterialName {
    fn is_valid(value: &str) -> bool {
        !value.is_empty()
            && value
                .chars()
                .all(|c| !(c.is_whitespace() || c.is_control()))
    }

    /// For the built-in default materials.
    pub(crate) fn from_static(value: &'static str) -> Self {
        debug_assert!(Self::is_valid(value));
        Self(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for MaterialName {
    type Err = MaterialNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_string())
    }
}

impl TryFrom<String> for MaterialName {
    type Error = MaterialNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if Self::is_valid(&value) {
            Ok(Self(value))
        } else {
            Err(MaterialNameError::InvalidMaterialName(value))
        }
    }
}

impl From<MaterialName> for String {
    fn from(value: MaterialName) -> Self {
        value.0
    }
}

impl Display for MaterialName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum MaterialNameError {
    #[error("Invalid material name: '{0}'")]
    InvalidMaterialName(String),
}
