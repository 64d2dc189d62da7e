mod bootstrap;
mod config;
mod loop_runner;

pub(crate) use loop_runner::run;
