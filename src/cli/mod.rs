pub mod args;
pub mod commands;
pub mod output;

pub use args::{CliArgs, ModeArg};
pub use commands::handle_commands;
pub use output::{render, seconds_to_mmss, DisplayFields, OutputFormat};
