use gencibuild_cli::cli::{CliArgs, LogFormatArg, OutputFormatter};
use gencibuild_cli::logging::{init_logging, parse_level, LoggingConfig};
use gencibuild_cli::{NAME, VERSION};
use gencibuild_core::{run, GenCiBuildConfig, GitCli, RealFileSystem};

use anyhow::{Context, Result};
use clap::Parser;
use std::process;
use tracing::{debug, error, info, Level};

fn main() {
    let args = CliArgs::parse();
    let env_config = GenCiBuildConfig::default();
    init_logging_from_args(&args, &env_config);

    debug!("{} v{} starting", NAME, VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match handle_run(&args, env_config) {
        Ok(()) => 0,
        Err(e) => {
            error!("{:#}", e);
            1
        }
    };

    process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs, config: &GenCiBuildConfig) {
    let level = if let Some(level_str) = &args.log_level {
        level_or_default(level_str)
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        level_or_default(&config.log_level)
    };

    init_logging(LoggingConfig {
        level,
        use_json: args.log_format == LogFormatArg::Json,
        ..LoggingConfig::default()
    });
}

fn level_or_default(level_str: &str) -> Level {
    parse_level(level_str).unwrap_or_else(|| {
        eprintln!(
            "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
            level_str
        );
        Level::INFO
    })
}

fn handle_run(args: &CliArgs, env_config: GenCiBuildConfig) -> Result<()> {
    let config = args
        .apply_to(env_config)
        .context("Invalid command-line arguments")?;
    config
        .validate()
        .context("Please check your environment variables and command-line arguments")?;
    debug!("{}", config);

    let fs = RealFileSystem::new();
    let git = GitCli::new();
    let appended = run(&config, &args.run_request(), &fs, &git)?;

    info!("Added {} CI build(s)", appended.len());

    let output = OutputFormatter::new(args.format.into()).format(&appended)?;
    println!("{}", output);

    Ok(())
}
