pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{
    ChunkArgs, CleanArgs, CliArgs, Commands, OutputFormatArg, ScrapeArgs, SearchArgs, ServeArgs,
};
pub use output::{OutputFormat, OutputFormatter};
