use clap::ValueEnum;
use workflow::config::SourceField;
use workflow::model::ModelKind;

/// Args decouple the CLI arg handling requirements from the internal data structures

#[derive(ValueEnum, Clone, Debug)]
#[value(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModelKindArg {
    /// Minimum deposition rate models, 'EE'
    #[value(name("EE"))]
    MinimumRate,
    /// Sputter process models, 'SP'
    #[value(name("SP"))]
    SputterProcess,
}

impl From<ModelKindArg> for ModelKind {
    fn from(value: ModelKindArg) -> Self {
        match value {
            ModelKindArg::MinimumRate => Self::MinimumRate,
            ModelKindArg::SputterProcess => Self::SputterProcess,
        }
    }
}

#[derive(ValueEnum, Clone, Debug)]
#[value(rename_all = "kebab-case")]
pub enum SourceFieldArg {
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

impl From<SourceFieldArg> for SourceField {
    fn from(value: SourceFieldArg) -> Self {
        match value {
            SourceFieldArg::Material => Self::Material,
            SourceFieldArg::Supply => Self::Supply,
            SourceFieldArg::Target => Self::Target,
            SourceFieldArg::Qcm => Self::Qcm,
            SourceFieldArg::Mode => Self::Mode,
            SourceFieldArg::MaxPower => Self::MaxPower,
            SourceFieldArg::RampRate => Self::RampRate,
            SourceFieldArg::PresputterPower => Self::PresputterPower,
            SourceFieldArg::PresputterVoltage => Self::PresputterVoltage,
        }
    }
}
