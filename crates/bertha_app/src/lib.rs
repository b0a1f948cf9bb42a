use std::path::PathBuf;
use std::time::SystemTime;

use crux_core::macros::effect;
use crux_core::render::RenderOperation;
pub use crux_core::Core;
use crux_core::{render, App, Command};
use thiserror::Error;
use tracing::{debug, info, trace};
pub use workflow::config::{SourceField, SourceSettings, SputterMode};
use workflow::config::{ConfigurationError, SourceConfiguration};
pub use workflow::material::MaterialName;
pub use workflow::model::{ModelKind, ModelManifest, ModelReference};
use workflow::model::{ModelTrainer, PlaceholderTrainer, TrainingError};
use workflow::session::{Session, SessionError};
pub use workflow::source::SourceNumber;
use workflow::source::ActiveSources;
pub use workflow::stage::Stage;
use workflow::stage::{StageGate, StageSummary};
use workflow::training::TrainingBuffer;

use crate::effects::workflow_view_renderer;
use crate::effects::workflow_view_renderer::WorkflowViewRendererOperation;

pub mod effects;

#[derive(Default)]
pub struct Bertha;

pub struct ModelSources {
    /// `None` until the configuration has been loaded, the defaults are used until then.
    path: Option<PathBuf>,
    configuration: SourceConfiguration,
    modified: bool,
}

pub struct ModelWorkflow {
    session: Session,
    /// Refreshed after every change to the session, so that newly enabled stages are reported.
    stage_gate: StageGate,
}

impl ModelWorkflow {
    fn new(session: Session) -> Self {
        let stage_gate = StageGate::from_conditions(&session);
        debug!("Stages. {}", StageSummary(&stage_gate));

        Self {
            session,
            stage_gate,
        }
    }

    fn refresh_stages(&mut self) -> Vec<Stage> {
        self.stage_gate.refresh(&self.session)
    }
}

pub struct Model {
    sources: ModelSources,
    model_workflow: Option<ModelWorkflow>,
    trainer: Box<dyn ModelTrainer + Send + Sync>,

    error: Option<(chrono::DateTime<chrono::Utc>, String)>,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            sources: ModelSources {
                path: None,
                configuration: SourceConfiguration::default(),
                modified: false,
            },
            model_workflow: None,
            trainer: Box::new(PlaceholderTrainer),
            error: None,
        }
    }
}

impl Model {
    fn model_workflow(&mut self) -> Result<&mut ModelWorkflow, AppError> {
        self.model_workflow
            .as_mut()
            .ok_or(AppError::OperationRequiresWorkflow)
    }
}

#[effect]
pub enum Effect {
    Render(RenderOperation),
    WorkflowView(WorkflowViewRendererOperation),
}

#[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug, Clone)]
pub struct SourceOverview {
    pub source: SourceNumber,
    pub settings: SourceSettings,
    /// `None` when no workflow is loaded.
    pub active: Option<bool>,
}

#[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug, Clone)]
pub struct StageOverview {
    pub stage: Stage,
    pub enabled: bool,
}

#[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug, Clone)]
pub struct CompositionOverview {
    pub values: Vec<(MaterialName, u32)>,
}

#[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug, Clone)]
pub struct ModelOverview {
    pub reference: ModelReference,
    pub manifest: ModelManifest,
}

#[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug, Clone)]
pub enum WorkflowView {
    Sources {
        sources: Vec<SourceOverview>,
    },
    Stages {
        stages: Vec<StageOverview>,
        compositions: Vec<CompositionOverview>,
        models: Vec<(ModelKind, MaterialName, ModelReference)>,
    },
    TrainingSets {
        kind: ModelKind,
        material: MaterialName,
        training_sets: Vec<PathBuf>,
    },
    TrainingData {
        kind: ModelKind,
        material: MaterialName,
        training_sets: Vec<PathBuf>,
        rows: usize,
        /// The rows as a text table.
        text: String,
    },
    Models {
        models: Vec<ModelOverview>,
    },
    TrainedModel(ModelOverview),
    Recipes {
        names: Vec<String>,
    },
    Recipe {
        name: String,
        content: String,
    },
}

#[derive(serde::Serialize, serde::Deserialize, Default, PartialEq, Debug)]
pub struct BerthaOperationViewModel {
    pub sources_modified: bool,
    pub workflow_loaded: bool,
    pub error: Option<(chrono::DateTime<chrono::Utc>, String)>,
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub enum Event {
    None,

    //
    // Sources
    //
    LoadSources {
        path: PathBuf,
    },
    SaveSources,
    SetSourceField {
        source: SourceNumber,
        field: SourceField,
        value: String,
    },

    //
    // Workflow
    //
    CreateWorkflow {
        /// The name of the workflow file
        path: PathBuf,
        sources: Vec<SourceNumber>,
    },
    Load {
        path: PathBuf,
    },
    Save,
    SaveAs {
        path: PathBuf,
    },
    BindComposition {
        values: Vec<(MaterialName, u32)>,
    },

    //
    // Training
    //
    AddTrainingSets {
        kind: ModelKind,
        material: MaterialName,
        training_sets: Vec<PathBuf>,
    },
    ClearTrainingData {
        kind: ModelKind,
        material: MaterialName,
    },
    TrainModel {
        kind: ModelKind,
        material: MaterialName,
        models: PathBuf,
    },
    BindModel {
        kind: ModelKind,
        material: MaterialName,
        model: PathBuf,
    },

    //
    // Views
    //
    ListTrainingSets {
        kind: ModelKind,
        material: MaterialName,
        reports: PathBuf,
    },
    ShowTrainingData {
        kind: ModelKind,
        material: MaterialName,
    },
    ListModels {
        models: PathBuf,
    },
    ListRecipes {
        path: PathBuf,
    },
    ShowRecipe {
        path: PathBuf,
        name: String,
    },
    ShowStages,
    ShowSources,
}

impl Bertha {
    fn update_inner(
        &self,
        event: <Bertha as App>::Event,
    ) -> Box<
        dyn FnOnce(
            &mut <Bertha as App>::Model,
        ) -> Result<Command<<Bertha as App>::Effect, <Bertha as App>::Event>, AppError>,
    > {
        match event {
            Event::None => Box::new(|_model: &mut Model| Ok(render::render())),
            Event::LoadSources {
                path,
            } => Box::new(move |model: &mut Model| {
                let configuration = stores::source_configuration::load_or_default(&path).map_err(AppError::StoreError)?;

                model.sources = ModelSources {
                    path: Some(path),
                    configuration,
                    modified: false,
                };

                Ok(render::render())
            }),
            Event::SaveSources => Box::new(|model: &mut Model| {
                let ModelSources {
                    path,
                    configuration,
                    modified,
                } = &mut model.sources;

                let Some(path) = path else {
                    return Err(AppError::OperationRequiresSourceConfiguration);
                };

                stores::source_configuration::store_source_configuration(path.as_path(), configuration)
                    .map_err(AppError::StoreError)?;
                *modified = false;

                info!("Saved source configuration. path: {:?}", path);

                Ok(render::render())
            }),
            Event::SetSourceField {
                source,
                field,
                value,
            } => Box::new(move |model: &mut Model| {
                let modified = model
                    .sources
                    .configuration
                    .set(source, field, &value)
                    .map_err(AppError::ConfigurationError)?;

                model.sources.modified |= modified;

                Ok(render::render())
            }),
            Event::CreateWorkflow {
                path,
                sources,
            } => Box::new(move |model: &mut Model| {
                info!("Creating workflow. path: {:?}", &path);

                let target_materials = model.sources.configuration.materials();
                let active_sources = ActiveSources::from_source_numbers(&sources);

                let session =
                    Session::create(path, target_materials, active_sources).map_err(AppError::SessionError)?;
                model
                    .model_workflow
                    .replace(ModelWorkflow::new(session));

                info!("Created workflow successfully.");
                Ok(render::render())
            }),
            Event::Load {
                path,
            } => Box::new(move |model: &mut Model| {
                info!("Load workflow. path: {:?}", &path);

                let session = Session::load(&path).map_err(AppError::SessionError)?;
                model
                    .model_workflow
                    .replace(ModelWorkflow::new(session));

                Ok(render::render())
            }),
            Event::Save => Box::new(|model: &mut Model| {
                let model_workflow = model.model_workflow()?;
                model_workflow
                    .session
                    .save()
                    .map_err(AppError::SessionError)?;

                info!("Saved workflow. path: {:?}", model_workflow.session.path());

                Ok(render::render())
            }),
            Event::SaveAs {
                path,
            } => Box::new(move |model: &mut Model| {
                let model_workflow = model.model_workflow()?;
                model_workflow
                    .session
                    .save_as(path)
                    .map_err(AppError::SessionError)?;

                Ok(render::render())
            }),
            Event::BindComposition {
                values,
            } => Box::new(move |model: &mut Model| {
                let model_workflow = model.model_workflow()?;
                model_workflow
                    .session
                    .bind_composition(&values.into_iter().collect())
                    .map_err(AppError::SessionError)?;

                model_workflow.refresh_stages();

                Ok(render::render())
            }),
            Event::AddTrainingSets {
                kind,
                material,
                training_sets,
            } => Box::new(move |model: &mut Model| {
                let model_workflow = model.model_workflow()?;
                let added = model_workflow
                    .session
                    .add_training_sets(kind, &material, &training_sets)
                    .map_err(AppError::SessionError)?;

                info!(
                    "Added training data. kind: {}, material: '{}', training_sets: {}, rows: {}",
                    kind,
                    material,
                    training_sets.len(),
                    added
                );

                Ok(render::render())
            }),
            Event::ClearTrainingData {
                kind,
                material,
            } => Box::new(move |model: &mut Model| {
                model
                    .model_workflow()?
                    .session
                    .clear_training_data(kind, &material)
                    .map_err(AppError::SessionError)?;

                Ok(render::render())
            }),
            Event::TrainModel {
                kind,
                material,
                models,
            } => Box::new(move |model: &mut Model| {
                let Model {
                    model_workflow,
                    trainer,
                    ..
                } = model;
                let session = &model_workflow
                    .as_ref()
                    .ok_or(AppError::OperationRequiresWorkflow)?
                    .session;

                let source = session
                    .active_source_of(&material)
                    .map_err(AppError::SessionError)?;
                let empty = TrainingBuffer::default();
                let buffer = session
                    .training_buffer(kind, &material)
                    .map_err(AppError::SessionError)?
                    .unwrap_or(&empty);

                let manifest = trainer
                    .train(kind, &material, source, buffer)
                    .map_err(AppError::TrainingError)?;
                let reference = stores::models::store_model(&models, &manifest).map_err(AppError::StoreError)?;

                Ok(workflow_view_renderer::view(WorkflowView::TrainedModel(ModelOverview {
                    reference,
                    manifest,
                })))
            }),
            Event::BindModel {
                kind,
                material,
                model: model_path,
            } => Box::new(move |model: &mut Model| {
                let model_workflow = model.model_workflow()?;
                model_workflow
                    .session
                    .bind_model(kind, &material, ModelReference::new(model_path))
                    .map_err(AppError::SessionError)?;

                model_workflow.refresh_stages();

                Ok(render::render())
            }),
            Event::ListTrainingSets {
                kind,
                material,
                reports,
            } => Box::new(move |model: &mut Model| {
                let source = model
                    .model_workflow()?
                    .session
                    .active_source_of(&material)
                    .map_err(AppError::SessionError)?;

                let training_sets = stores::training_sets::find_training_sets(&reports, kind, source)
                    .map_err(AppError::StoreError)?;

                Ok(workflow_view_renderer::view(WorkflowView::TrainingSets {
                    kind,
                    material,
                    training_sets,
                }))
            }),
            Event::ShowTrainingData {
                kind,
                material,
            } => Box::new(move |model: &mut Model| {
                let model_workflow = model.model_workflow()?;
                let view = match model_workflow
                    .session
                    .training_buffer(kind, &material)
                    .map_err(AppError::SessionError)?
                {
                    Some(buffer) => WorkflowView::TrainingData {
                        kind,
                        material,
                        training_sets: buffer.training_sets(),
                        rows: buffer.len(),
                        text: buffer.as_text(),
                    },
                    None => WorkflowView::TrainingData {
                        kind,
                        material,
                        training_sets: vec![],
                        rows: 0,
                        text: String::new(),
                    },
                };

                Ok(workflow_view_renderer::view(view))
            }),
            Event::ListModels {
                models,
            } => Box::new(move |_model: &mut Model| {
                let models = stores::models::list_models(&models)
                    .map_err(AppError::StoreError)?
                    .into_iter()
                    .map(|(reference, manifest)| ModelOverview {
                        reference,
                        manifest,
                    })
                    .collect();

                Ok(workflow_view_renderer::view(WorkflowView::Models {
                    models,
                }))
            }),
            Event::ListRecipes {
                path,
            } => Box::new(move |_model: &mut Model| {
                let names = stores::recipes::list_recipes(&path).map_err(AppError::StoreError)?;

                Ok(workflow_view_renderer::view(WorkflowView::Recipes {
                    names,
                }))
            }),
            Event::ShowRecipe {
                path,
                name,
            } => Box::new(move |_model: &mut Model| {
                let content = stores::recipes::read_recipe(&path, &name).map_err(AppError::StoreError)?;

                Ok(workflow_view_renderer::view(WorkflowView::Recipe {
                    name,
                    content,
                }))
            }),
            Event::ShowStages => Box::new(|model: &mut Model| {
                let ModelWorkflow {
                    session,
                    stage_gate,
                } = model.model_workflow()?;

                let stages = Stage::all()
                    .map(|stage| StageOverview {
                        stage,
                        enabled: stage_gate.is_enabled(stage),
                    })
                    .collect();

                let compositions = session
                    .ledger()
                    .iter()
                    .map(|composition| CompositionOverview {
                        values: composition
                            .iter()
                            .map(|(material, value)| (material.clone(), *value))
                            .collect(),
                    })
                    .collect();

                let models = session
                    .bound_models()
                    .iter()
                    .map(|(kind, material, reference)| (kind, material.clone(), reference.clone()))
                    .collect();

                Ok(workflow_view_renderer::view(WorkflowView::Stages {
                    stages,
                    compositions,
                    models,
                }))
            }),
            Event::ShowSources => Box::new(|model: &mut Model| {
                let active_sources = model
                    .model_workflow
                    .as_ref()
                    .map(|model_workflow| model_workflow.session.active_sources());

                let sources = model
                    .sources
                    .configuration
                    .iter()
                    .map(|(source, settings)| SourceOverview {
                        source,
                        settings: settings.clone(),
                        active: active_sources.map(|active_sources| active_sources.is_active(source)),
                    })
                    .collect();

                Ok(workflow_view_renderer::view(WorkflowView::Sources {
                    sources,
                }))
            }),
        }
    }
}

impl App for Bertha {
    type Event = Event;
    type Model = Model;
    type ViewModel = BerthaOperationViewModel;
    type Capabilities = ();
    type Effect = Effect;

    fn update(
        &self,
        event: Self::Event,
        model: &mut Self::Model,
        _caps: &Self::Capabilities,
    ) -> Command<Self::Effect, Self::Event> {
        let try_fn = self.update_inner(event);

        match try_fn(model) {
            Err(e) => {
                model
                    .error
                    .replace((chrono::DateTime::from(SystemTime::now()), e.to_string()));
                render::render()
            }
            Ok(command) => {
                model.error.take();
                command
            }
        }
    }

    fn view(&self, model: &Self::Model) -> Self::ViewModel {
        let view_model = BerthaOperationViewModel {
            sources_modified: model.sources.modified,
            workflow_loaded: model.model_workflow.is_some(),
            error: model.error.clone(),
        };

        trace!("view model: {:?}", view_model);

        view_model
    }
}

#[derive(Error, Debug)]
enum AppError {
    #[error("Operation requires a workflow")]
    OperationRequiresWorkflow,
    #[error("Operation requires a source configuration file")]
    OperationRequiresSourceConfiguration,
    #[error("{0}")]
    SessionError(SessionError),
    #[error("Source configuration error. cause: {0}")]
    ConfigurationError(ConfigurationError),
    #[error("Training error. cause: {0}")]
    TrainingError(TrainingError),
    #[error("Store error. cause: {0:#}")]
    StoreError(anyhow::Error),
}
