pub mod event;
pub mod payload;
pub mod progress;
pub mod stage;
pub mod submit;
pub mod task;
