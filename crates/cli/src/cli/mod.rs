pub mod commands;
pub mod output;

pub use commands::{CliArgs, LogFormatArg, MetadataPolicyArg, OutputFormatArg};
pub use output::{OutputFormat, OutputFormatter};
