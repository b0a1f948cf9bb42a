/// Stores are for loading/storing the different kinds of data the workflow uses.
///
/// All stores are files or folders:
/// * The source configuration, a CSV file.
/// * Experiment report folders holding learning data.
/// * Model folders, each with a JSON manifest.
/// * Recipe text files.
pub mod source_configuration;
pub mod training_sets;
pub mod models;
pub mod recipes;

pub mod csv;
