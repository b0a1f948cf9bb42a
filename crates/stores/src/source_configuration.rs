use std::path::Path;

use anyhow::{bail, Context, Error};
use csv::QuoteStyle;
use itertools::Itertools;
use tracing::{info, trace, Level};
use workflow::config::SourceConfiguration;
use workflow::source::SourceNumber;

use crate::csv::SourceRecord;

#[tracing::instrument(level = Level::DEBUG)]
pub fn load_source_configuration(path: &Path) -> Result<SourceConfiguration, Error> {
    info!("Loading source configuration. path: {:?}", path);

    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Error reading source configuration. file: {}", path.display()))?;

    let mut records: Vec<SourceRecord> = vec![];

    for result in csv_reader.deserialize() {
        let record: SourceRecord = result.with_context(|| "Deserializing source record".to_string())?;

        trace!("{:?}", record);

        records.push(record);
    }

    if let Some(duplicate) = records
        .iter()
        .map(|record| record.source)
        .duplicates()
        .next()
    {
        bail!("Duplicate source in source configuration. source: {}", duplicate);
    }

    let missing = SourceNumber::all()
        .filter(|source| {
            !records
                .iter()
                .any(|record| record.source.eq(source))
        })
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        bail!(
            "Missing sources in source configuration. sources: [{}]",
            missing.iter().join(", ")
        );
    }

    records.sort_by_key(|record| record.source);

    let configuration = SourceConfiguration::new(
        records
            .into_iter()
            .map(SourceRecord::build_source_settings)
            .collect(),
    )
    .with_context(|| format!("Building source configuration. file: {}", path.display()))?;

    Ok(configuration)
}

/// Load the source configuration, or the defaults if there is no configuration file yet.
pub fn load_or_default(path: &Path) -> Result<SourceConfiguration, Error> {
    if !path.exists() {
        info!("Source configuration not found, using defaults. path: {:?}", path);
        return Ok(SourceConfiguration::default());
    }
    load_source_configuration(path)
}

pub fn store_source_configuration(path: &Path, configuration: &SourceConfiguration) -> Result<(), Error> {
    info!("Storing source configuration. path: {:?}", path);

    let mut writer = csv::WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_path(path)
        .with_context(|| format!("Error writing source configuration. file: {}", path.display()))?;

    for (source, settings) in configuration.iter() {
        writer.serialize(SourceRecord::from_settings(source, settings))?;
    }

    writer.flush()?;

    Ok(())
}
