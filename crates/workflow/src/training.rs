use std::path::{Path, PathBuf};

use itertools::Itertools;
use thiserror::Error;
use tracing::{debug, info, trace};

/// The file in an experiment report folder that holds the learning data.
pub const LEARNING_DATA_FILE_NAME: &str = "learning_data.csv";

#[derive(Error, Debug)]
pub enum TrainingDataError {
    #[error("Training data not found. path: {0:?}")]
    NotFound(PathBuf),
    #[error("Unable to read training data. path: {path:?}, cause: {cause}")]
    Io { path: PathBuf, cause: std::io::Error },
    #[error("Unable to parse training data. path: {path:?}, reason: {reason}")]
    Parse { path: PathBuf, reason: String },
    #[error("Training data columns do not match. path: {path:?}, expected: {expected:?}, actual: {actual:?}")]
    SchemaMismatch {
        path: PathBuf,
        expected: Vec<String>,
        actual: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TrainingRow {
    values: Vec<String>,
    /// The training set (report folder or file) the row was loaded from.
    training_set: PathBuf,
}

/// Accumulates the rows of one or more learning-data files that share the same columns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrainingBuffer {
    /// Established by the first load, forgotten on clear.
    columns: Option<Vec<String>>,
    rows: Vec<TrainingRow>,
}

impl TrainingBuffer {
    /// Load a CSV file, merging its rows into the buffer.
    ///
    /// The file is read completely before anything is merged, on error the buffer is left unchanged.
    /// Returns the number of rows added.
    pub fn load_csv(&mut self, path: &Path) -> Result<usize, TrainingDataError> {
        self.load(path, path.to_path_buf())
    }

    /// Load the learning data from an experiment report folder.
    pub fn load_training_set(&mut self, folder: &Path) -> Result<usize, TrainingDataError> {
        let path = folder.join(LEARNING_DATA_FILE_NAME);
        self.load(&path, folder.to_path_buf())
    }

    fn load(&mut self, path: &Path, training_set: PathBuf) -> Result<usize, TrainingDataError> {
        let (columns, records) = read_csv(path)?;

        if let Some(expected) = &self.columns {
            if !expected.eq(&columns) {
                return Err(TrainingDataError::SchemaMismatch {
                    path: path.to_path_buf(),
                    expected: expected.clone(),
                    actual: columns,
                });
            }
        }

        let added = records.len();
        self.columns.get_or_insert(columns);
        self.rows
            .extend(records.into_iter().map(|values| TrainingRow {
                values,
                training_set: training_set.clone(),
            }));

        info!(
            "Loaded training data. path: {:?}, rows: {}, total_rows: {}",
            path,
            added,
            self.rows.len()
        );

        Ok(added)
    }

    pub fn clear(&mut self) {
        self.columns = None;
        self.rows.clear();
        debug!("Cleared training data");
    }

    pub fn columns(&self) -> &[String] {
        self.columns.as_deref().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The distinct training sets, in the order they were loaded.
    pub fn training_sets(&self) -> Vec<PathBuf> {
        self.rows
            .iter()
            .map(|row| row.training_set.clone())
            .unique()
            .collect()
    }

    /// Render the rows as a text table, columns right-aligned, without the training-set bookkeeping.
    pub fn as_text(&self) -> String {
        let Some(columns) = &self.columns else {
            return String::new();
        };

        let widths = columns
            .iter()
            .enumerate()
            .map(|(index, column)| {
                self.rows
                    .iter()
                    .map(|row| row.values[index].chars().count())
                    .chain(std::iter::once(column.chars().count()))
                    .max()
                    .unwrap_or_default()
            })
            .collect::<Vec<_>>();

        let format_line = |values: &[String]| {
            values
                .iter()
                .zip(widths.iter())
                .map(|(value, width)| format!("{:>width$}", value, width = width))
                .join("  ")
        };

        std::iter::once(format_line(columns))
            .chain(
                self.rows
                    .iter()
                    .map(|row| format_line(&row.values)),
            )
            .join("\n")
    }
}

fn read_csv(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>), TrainingDataError> {
    if !path.is_file() {
        return Err(TrainingDataError::NotFound(path.to_path_buf()));
    }

    let map_error = |error: csv::Error| match error.into_kind() {
        csv::ErrorKind::Io(cause) => TrainingDataError::Io {
            path: path.to_path_buf(),
            cause,
        },
        other => TrainingDataError::Parse {
            path: path.to_path_buf(),
            reason: format!("{:?}", other),
        },
    };

    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(map_error)?;

    let columns = csv_reader
        .headers()
        .map_err(map_error)?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();

    if columns.is_empty() || columns.iter().any(String::is_empty) {
        return Err(TrainingDataError::Parse {
            path: path.to_path_buf(),
            reason: "missing or empty column name".to_string(),
        });
    }
    if let Some(duplicate) = columns.iter().duplicates().next() {
        return Err(TrainingDataError::Parse {
            path: path.to_path_buf(),
            reason: format!("duplicate column name '{}'", duplicate),
        });
    }

    let mut records = vec![];
    for result in csv_reader.records() {
        let record = result.map_err(map_error)?;
        trace!("{:?}", record);

        records.push(
            record
                .iter()
                .map(str::to_string)
                .collect::<Vec<_>>(),
        );
    }

    Ok((columns, records))
}
