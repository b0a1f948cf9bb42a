use workflow::config::{SourceSettings, SputterMode};
use workflow::material::MaterialName;
use workflow::source::SourceNumber;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct SourceRecord {
    pub source: SourceNumber,
    pub material: MaterialName,
    pub supply: u8,
    pub target: String,
    pub qcm: u8,
    pub mode: SputterMode,
    pub max_power: u32,
    pub ramp_rate: u32,
    pub presputter_power: u32,
    pub presputter_voltage: u32,
}

impl SourceRecord {
    pub fn from_settings(source: SourceNumber, settings: &SourceSettings) -> Self {
        Self {
            source,
            material: settings.material.clone(),
            supply: settings.supply,
            target: settings.target.clone(),
            qcm: settings.qcm,
            mode: settings.mode,
            max_power: settings.max_power,
            ramp_rate: settings.ramp_rate,
            presputter_power: settings.presputter_power,
            presputter_voltage: settings.presputter_voltage,
        }
    }

    pub fn build_source_settings(self) -> SourceSettings {
        SourceSettings {
            material: self.material,
            supply: self.supply,
            target: self.target,
            qcm: self.qcm,
            mode: self.mode,
            max_power: self.max_power,
            ramp_rate: self.ramp_rate,
            presputter_power: self.presputter_power,
            presputter_voltage: self.presputter_voltage,
        }
    }
}
