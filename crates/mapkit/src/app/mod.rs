mod frontend;
mod input;
mod loop_runner;
mod rendering;
mod ui;

pub use loop_runner::{run_app, run_app_with_paths, AppError, LoopConfig};
