pub mod composition;
pub mod config;
pub mod file;
pub mod material;
pub mod model;
pub mod session;
pub mod source;
pub mod stage;
pub mod training;
