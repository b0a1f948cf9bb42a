use std::sync::Arc;

use anyhow::{anyhow, bail};
use bertha_app::effects::workflow_view_renderer::WorkflowViewRendererOperation;
use bertha_app::{Bertha, Effect, Event};
use crossbeam_channel::unbounded;
use tracing::trace;

use crate::view;

pub type Core = Arc<crux_core::Core<Bertha>>;

pub fn new() -> Core {
    Arc::new(crux_core::Core::new())
}

/// Process an event and handle the resulting effects, including those of follow-up events.
///
/// Fails with the error message of the view model if the event could not be applied.
pub fn run(core: &Core, event: Event) -> anyhow::Result<()> {
    trace!("event: {:?}", event);

    let (tx, rx) = unbounded::<Effect>();
    for effect in core.process_event(event) {
        tx.send(effect)
            .map_err(|e| anyhow!("{:?}", e))?;
    }
    drop(tx);

    while let Ok(effect) = rx.recv() {
        trace!("run. effect: {:?}", effect);
        match effect {
            Effect::Render(_) => {
                let view_model = core.view();

                if let Some((_timestamp, message)) = view_model.error {
                    bail!(message)
                }

                // Saving the source configuration after a change is implicit for the CLI.
                if view_model.sources_modified {
                    run(core, Event::SaveSources)?
                }
            }
            Effect::WorkflowView(request) => match request.operation {
                WorkflowViewRendererOperation::View {
                    view,
                } => view::print(&view),
            },
        }
    }
    Ok(())
}
