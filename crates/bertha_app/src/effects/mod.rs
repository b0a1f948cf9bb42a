pub mod workflow_view_renderer;
