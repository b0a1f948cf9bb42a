use bertha_app::WorkflowView;

/// Print a view to stdout, for the operator.
pub fn print(view: &WorkflowView) {
    match view {
        WorkflowView::Sources {
            sources,
        } => {
            for overview in sources {
                let settings = &overview.settings;
                let active = match overview.active {
                    Some(true) => ", active",
                    Some(false) => ", inactive",
                    None => "",
                };
                println!(
                    "Source {}: material: {}, supply: {}, target: {}, qcm: {}, mode: {}, max_power: {}, ramp_rate: {}, presputter_power: {}, presputter_voltage: {}{}",
                    overview.source,
                    settings.material,
                    settings.supply,
                    settings.target,
                    settings.qcm,
                    settings.mode,
                    settings.max_power,
                    settings.ramp_rate,
                    settings.presputter_power,
                    settings.presputter_voltage,
                    active
                );
            }
        }
        WorkflowView::Stages {
            stages,
            compositions,
            models,
        } => {
            for overview in stages {
                let state = match overview.enabled {
                    true => "enabled",
                    false => "disabled",
                };
                println!("Stage {}: {}, {}", overview.stage.index(), overview.stage, state);
            }
            for (index, composition) in compositions.iter().enumerate() {
                let values = composition
                    .values
                    .iter()
                    .map(|(material, value)| format!("{}={}", material, value))
                    .collect::<Vec<_>>()
                    .join(", ");
                println!("Composition {}: {}", index + 1, values);
            }
            for (kind, material, reference) in models {
                println!("Model {}: {}", kind.session_key(material), reference);
            }
        }
        WorkflowView::TrainingSets {
            training_sets,
            ..
        } => {
            for training_set in training_sets {
                println!("{}", training_set.display());
            }
        }
        WorkflowView::TrainingData {
            training_sets,
            rows,
            text,
            ..
        } => {
            for training_set in training_sets {
                println!("Training set: {}", training_set.display());
            }
            println!("Rows: {}", rows);
            if !text.is_empty() {
                println!("{}", text);
            }
        }
        WorkflowView::Models {
            models,
        } => {
            for overview in models {
                println!(
                    "{}: kind: {}, material: {}, rows: {}, created: {}",
                    overview.reference,
                    overview.manifest.kind,
                    overview.manifest.material,
                    overview.manifest.rows,
                    overview.manifest.created
                );
            }
        }
        WorkflowView::TrainedModel(overview) => {
            println!("Trained model: {}", overview.reference);
        }
        WorkflowView::Recipes {
            names,
        } => {
            for name in names {
                println!("{}", name);
            }
        }
        WorkflowView::Recipe {
            content,
            ..
        } => {
            print!("{}", content);
        }
    }
}
