#![deny(missing_docs)]

use std::path::{Path, PathBuf};

use bertha_app::{Event, MaterialName, SourceNumber};
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use cli::args::{ModelKindArg, SourceFieldArg};
use cli::parsers::{material_value_parser, source_number_parser};

#[derive(Parser, Debug)]
#[command(name = "bertha_cli")]
#[command(bin_name = "bertha_cli")]
#[command(version, about, long_about = None)]
pub(crate) struct Opts {
    #[command(subcommand)]
    pub(crate) command: ModeCommand,

    /// Trace log file
    #[arg(long, num_args = 0..=1, default_missing_value = "trace.log")]
    pub(crate) trace: Option<PathBuf>,

    /// Source configuration file, the defaults are used if it does not exist
    #[arg(long, default_value = "sources.csv", value_name = "SOURCES_FILE")]
    pub(crate) sources: PathBuf,

    #[command(flatten)]
    pub(crate) verbose: Verbosity<InfoLevel>,
}

#[derive(Debug, Subcommand)]
pub(crate) enum ModeCommand {
    /// Source configuration mode
    Sources(SourcesArgs),

    /// Workflow mode
    Workflow(WorkflowArgs),

    /// Recipe library mode
    Recipes(RecipesArgs),
}

#[derive(Debug, Parser)]
pub(crate) struct SourcesArgs {
    #[command(subcommand)]
    pub(crate) command: SourcesCommand,
}

#[derive(Debug, Subcommand)]
pub(crate) enum SourcesCommand {
    /// Show the source configuration
    Show,
    /// Set a field of a source
    Set {
        /// Source number, 1-6
        #[arg(long, value_parser = source_number_parser)]
        source: SourceNumber,

        /// Field
        #[arg(long)]
        field: SourceFieldArg,

        /// Value, e.g. 'Zr', '70' or 'pulsed DC'
        #[arg(long)]
        value: String,
    },
}

#[derive(Debug, Parser)]
pub(crate) struct WorkflowArgs {
    /// Path
    #[arg(long, default_value = ".")]
    pub(crate) path: PathBuf,

    /// Workflow name
    #[arg(long, value_name = "WORKFLOW_NAME")]
    pub(crate) workflow: String,

    #[command(subcommand)]
    pub(crate) command: WorkflowCommand,
}

#[derive(Debug, Subcommand)]
pub(crate) enum WorkflowCommand {
    /// Create a new workflow using the materials of the given sources
    Create {
        /// Active source, at least two are required, e.g. '--source 1 --source 2'
        #[arg(long = "source", required = true, num_args = 1.., value_parser = source_number_parser)]
        sources: Vec<SourceNumber>,
    },
    /// Save the workflow
    Save {
        /// Save to another file, which becomes the workflow file
        #[arg(long = "as", value_name = "FILE")]
        save_as: Option<PathBuf>,
    },
    /// Bind a target composition
    BindComposition {
        /// Material value, e.g. '--value Zr=10 --value CuS=5'. Missing active materials are zero.
        #[arg(long = "value", required = true, num_args = 1.., value_parser = material_value_parser)]
        values: Vec<(MaterialName, u32)>,
    },
    /// List the experiment report folders that hold training data for a material
    ListTrainingSets {
        /// Model kind
        #[arg(long)]
        kind: ModelKindArg,

        /// Target material
        #[arg(long)]
        material: MaterialName,

        /// Reports directory
        #[arg(long, value_name = "DIR")]
        reports: PathBuf,
    },
    /// Load training sets and show the training data
    ShowTrainingData {
        /// Model kind
        #[arg(long)]
        kind: ModelKindArg,

        /// Target material
        #[arg(long)]
        material: MaterialName,

        /// Training set folder
        #[arg(long = "training-set", required = true, num_args = 1.., value_name = "DIR")]
        training_sets: Vec<PathBuf>,
    },
    /// Load training sets and train a model
    TrainModel {
        /// Model kind
        #[arg(long)]
        kind: ModelKindArg,

        /// Target material
        #[arg(long)]
        material: MaterialName,

        /// Training set folder
        #[arg(long = "training-set", required = true, num_args = 1.., value_name = "DIR")]
        training_sets: Vec<PathBuf>,

        /// Models directory
        #[arg(long, value_name = "DIR")]
        models: PathBuf,
    },
    /// List the trained models
    ListModels {
        /// Models directory
        #[arg(long, value_name = "DIR")]
        models: PathBuf,
    },
    /// Bind a trained model to a material
    BindModel {
        /// Model kind
        #[arg(long)]
        kind: ModelKindArg,

        /// Target material
        #[arg(long)]
        material: MaterialName,

        /// Model folder
        #[arg(long, value_name = "DIR")]
        model: PathBuf,
    },
    /// Show the stages, bound compositions and bound models
    Stages,
}

#[derive(Debug, Parser)]
pub(crate) struct RecipesArgs {
    /// Recipes directory
    #[arg(long, default_value = ".")]
    pub(crate) path: PathBuf,

    #[command(subcommand)]
    pub(crate) command: RecipesCommand,
}

#[derive(Debug, Subcommand)]
pub(crate) enum RecipesCommand {
    /// List the recipes
    List,
    /// Show a recipe
    Show {
        /// Recipe file name, e.g. 'deposition.txt'
        #[arg(long)]
        name: String,
    },
}

/// The events for a command, in the order they must be processed.
pub(crate) fn build_events(command: ModeCommand) -> Vec<Event> {
    match command {
        ModeCommand::Sources(args) => match args.command {
            SourcesCommand::Show => vec![Event::ShowSources],
            SourcesCommand::Set {
                source,
                field,
                value,
            } => vec![Event::SetSourceField {
                source,
                field: field.into(),
                value,
            }],
        },
        ModeCommand::Recipes(args) => match args.command {
            RecipesCommand::List => vec![Event::ListRecipes {
                path: args.path,
            }],
            RecipesCommand::Show {
                name,
            } => vec![Event::ShowRecipe {
                path: args.path,
                name,
            }],
        },
        ModeCommand::Workflow(args) => {
            let path = build_workflow_file_path(&args.workflow, &args.path);

            let events = match args.command {
                WorkflowCommand::Create {
                    sources,
                } => {
                    return vec![Event::CreateWorkflow {
                        path,
                        sources,
                    }]
                }
                WorkflowCommand::Save {
                    save_as: None,
                } => vec![Event::Save],
                WorkflowCommand::Save {
                    save_as: Some(save_as),
                } => vec![Event::SaveAs {
                    path: save_as,
                }],
                WorkflowCommand::BindComposition {
                    values,
                } => vec![Event::BindComposition {
                    values,
                }],
                WorkflowCommand::ListTrainingSets {
                    kind,
                    material,
                    reports,
                } => vec![Event::ListTrainingSets {
                    kind: kind.into(),
                    material,
                    reports,
                }],
                WorkflowCommand::ShowTrainingData {
                    kind,
                    material,
                    training_sets,
                } => vec![
                    Event::AddTrainingSets {
                        kind: kind.clone().into(),
                        material: material.clone(),
                        training_sets,
                    },
                    Event::ShowTrainingData {
                        kind: kind.into(),
                        material,
                    },
                ],
                WorkflowCommand::TrainModel {
                    kind,
                    material,
                    training_sets,
                    models,
                } => vec![
                    Event::AddTrainingSets {
                        kind: kind.clone().into(),
                        material: material.clone(),
                        training_sets,
                    },
                    Event::TrainModel {
                        kind: kind.into(),
                        material,
                        models,
                    },
                ],
                WorkflowCommand::ListModels {
                    models,
                } => vec![Event::ListModels {
                    models,
                }],
                WorkflowCommand::BindModel {
                    kind,
                    material,
                    model,
                } => vec![Event::BindModel {
                    kind: kind.into(),
                    material,
                    model,
                }],
                WorkflowCommand::Stages => vec![Event::ShowStages],
            };

            // all other workflow commands operate on an existing workflow
            std::iter::once(Event::Load {
                path,
            })
            .chain(events)
            .collect()
        }
    }
}

/// e.g. `<directory>/workflow-<name>.json`
pub(crate) fn build_workflow_file_path(name: &str, directory: &Path) -> PathBuf {
    let mut workflow_file_path: PathBuf = PathBuf::from(directory);
    workflow_file_path.push(format!("workflow-{}.json", name));
    workflow_file_path
}
