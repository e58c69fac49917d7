pub mod completions;
pub mod config;
pub mod cycle;
pub mod settings;
pub mod sleeps;
