use std::str::FromStr;

use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;
use tracing::info;

use crate::material::{MaterialName, MaterialNameError};
use crate::source::{SourceNumber, SOURCE_COUNT};

#[derive(
    Debug,
    serde::Serialize,
    serde::Deserialize,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Display,
    EnumString
)]
pub enum SputterMode {
    #[serde(rename = "pulsed DC")]
    #[strum(serialize = "pulsed DC")]
    PulsedDc,
    #[serde(rename = "RF")]
    #[strum(serialize = "RF")]
    Rf,
}

/// Configuration of a single sputtering source.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct SourceSettings {
    pub material: MaterialName,
    /// The power supply connected to the source.
    pub supply: u8,
    pub target: String,
    /// The QCM nearest to the source.
    pub qcm: u8,
    pub mode: SputterMode,
    pub max_power: u32,
    pub ramp_rate: u32,
    pub presputter_power: u32,
    pub presputter_voltage: u32,
}

/// The editable fields of a [`SourceSettings`].
#[derive(
    Debug,
    serde::Serialize,
    serde::Deserialize,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Display,
    EnumString,
    EnumIter
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SourceField {
    Material,
    Supply,
    Target,
    Qcm,
    Mode,
    MaxPower,
    RampRate,
    PresputterPower,
    PresputterVoltage,
}

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Invalid material. cause: {0}")]
    InvalidMaterial(#[from] MaterialNameError),
    #[error("Invalid value for field. source: {source_number}, field: {field}, value: '{value}'")]
    InvalidValue {
        source_number: SourceNumber,
        field: SourceField,
        value: String,
    },
    #[error("Duplicate material. material: '{0}'")]
    DuplicateMaterial(MaterialName),
    #[error("Wrong number of sources. expected: {expected}, found: {0}", expected = SOURCE_COUNT)]
    WrongSourceCount(usize),
}

/// The configuration of all the sources, indexed by [`SourceNumber`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfiguration {
    sources: [SourceSettings; SOURCE_COUNT],
}

impl SourceConfiguration {
    pub fn new(sources: Vec<SourceSettings>) -> Result<Self, ConfigurationError> {
        let count = sources.len();
        let sources: [SourceSettings; SOURCE_COUNT] = sources
            .try_into()
            .map_err(|_| ConfigurationError::WrongSourceCount(count))?;

        let configuration = Self {
            sources,
        };
        configuration.ensure_unique_materials()?;

        Ok(configuration)
    }

    fn ensure_unique_materials(&self) -> Result<(), ConfigurationError> {
        for (index, settings) in self.sources.iter().enumerate() {
            if self.sources[..index]
                .iter()
                .any(|other| other.material.eq(&settings.material))
            {
                return Err(ConfigurationError::DuplicateMaterial(settings.material.clone()));
            }
        }
        Ok(())
    }

    pub fn source(&self, source: SourceNumber) -> &SourceSettings {
        &self.sources[source.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (SourceNumber, &SourceSettings)> {
        SourceNumber::all().zip(self.sources.iter())
    }

    pub fn materials(&self) -> [MaterialName; SOURCE_COUNT] {
        self.sources
            .each_ref()
            .map(|settings| settings.material.clone())
    }

    pub fn source_number_of(&self, material: &MaterialName) -> Option<SourceNumber> {
        self.iter()
            .find(|(_, settings)| settings.material.eq(material))
            .map(|(source, _)| source)
    }

    /// Parse `value` and apply it to the field of the source.
    ///
    /// Returns `true` if the configuration was modified.
    pub fn set(&mut self, source: SourceNumber, field: SourceField, value: &str) -> Result<bool, ConfigurationError> {
        let invalid = || ConfigurationError::InvalidValue {
            source_number: source,
            field,
            value: value.to_string(),
        };

        let mut updated = self.sources[source.index()].clone();
        match field {
            SourceField::Material => updated.material = MaterialName::from_str(value)?,
            SourceField::Supply => updated.supply = value.parse().map_err(|_| invalid())?,
            SourceField::Target => {
                if value.trim().is_empty() {
                    return Err(invalid());
                }
                updated.target = value.to_string()
            }
            SourceField::Qcm => updated.qcm = value.parse().map_err(|_| invalid())?,
            SourceField::Mode => updated.mode = SputterMode::from_str(value).map_err(|_| invalid())?,
            SourceField::MaxPower => updated.max_power = value.parse().map_err(|_| invalid())?,
            SourceField::RampRate => updated.ramp_rate = value.parse().map_err(|_| invalid())?,
            SourceField::PresputterPower => updated.presputter_power = value.parse().map_err(|_| invalid())?,
            SourceField::PresputterVoltage => updated.presputter_voltage = value.parse().map_err(|_| invalid())?,
        }

        if updated.eq(&self.sources[source.index()]) {
            info!("Source configuration unchanged. source: {}, field: {}", source, field);
            return Ok(false);
        }

        let old = std::mem::replace(&mut self.sources[source.index()], updated);
        if let Err(error) = self.ensure_unique_materials() {
            self.sources[source.index()] = old;
            return Err(error);
        }

        info!(
            "Source configuration updated. source: {}, field: {}, value: '{}'",
            source, field, value
        );
        Ok(true)
    }
}

impl Default for SourceConfiguration {
    fn default() -> Self {
        let materials = ["Zr", "CuS", "Sn", "SnS", "Ba", "ZnS"];
        let qcms = [1, 1, 2, 2, 3, 3];
        let modes = [
            SputterMode::PulsedDc,
            SputterMode::PulsedDc,
            SputterMode::PulsedDc,
            SputterMode::PulsedDc,
            SputterMode::Rf,
            SputterMode::Rf,
        ];
        let max_powers = [70, 50, 50, 50, 70, 50];
        let ramp_rates = [10, 5, 10, 5, 5, 5];
        let presputter_powers = [50, 35, 35, 35, 50, 35];

        let sources = std::array::from_fn(|index| SourceSettings {
            material: MaterialName::from_static(materials[index]),
            supply: index as u8 + 1,
            target: format!("{}_01", materials[index]),
            qcm: qcms[index],
            mode: modes[index],
            max_power: max_powers[index],
            ramp_rate: ramp_rates[index],
            presputter_power: presputter_powers[index],
            presputter_voltage: 0,
        });

        Self {
            sources,
        }
    }
}
