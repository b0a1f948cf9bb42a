use std::future::Future;

use crux_core::capability::Operation;
use crux_core::command::NotificationBuilder;
use crux_core::{Command, Request};

use crate::WorkflowView;

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
pub enum WorkflowViewRendererOperation {
    View { view: WorkflowView },
}

impl Operation for WorkflowViewRendererOperation {
    type Output = ();
}

pub fn view_builder<Effect, Event>(view: WorkflowView) -> NotificationBuilder<Effect, Event, impl Future<Output = ()>>
where
    Effect: From<Request<WorkflowViewRendererOperation>> + Send + 'static,
    Event: Send + 'static,
{
    Command::notify_shell(WorkflowViewRendererOperation::View {
        view,
    })
}

pub fn view<Effect, Event>(view: WorkflowView) -> Command<Effect, Event>
where
    Effect: From<Request<WorkflowViewRendererOperation>> + Send + 'static,
    Event: Send + 'static,
{
    view_builder(view).into()
}
