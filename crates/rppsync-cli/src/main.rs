mod commands;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rppsync_core::{CopySelection, diagnostics::init_tracing_with_options};

use crate::{
    commands::CommandContext,
    config::{AppConfig, OutputFormat},
};

#[derive(Debug, Parser)]
#[command(name = "rppsync")]
#[command(about = "Compare REAPER project tracks and copy settings between them")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Overrides `diagnostics.logs_dir` from the config file.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Print machine readable JSON instead of text.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the master and every track with volume, pan, effects and envelopes.
    Tracks { file: PathBuf },
    /// Compare one track per file, or pair all tracks by name when no selector is given.
    Diff {
        left: PathBuf,
        right: PathBuf,

        /// `master`, `#<index>`, a track GUID or a track name.
        #[arg(long = "left")]
        left_track: Option<String>,

        #[arg(long = "right")]
        right_track: Option<String>,
    },
    /// Copy selected settings from a track of one file into a track of another.
    Copy {
        from: PathBuf,
        to: PathBuf,

        #[arg(long)]
        source: String,

        #[arg(long)]
        dest: String,

        /// Comma separated subset of volume, pan, effects, envelopes.
        #[arg(long)]
        select: Option<CopySelection>,

        /// Write here instead of overwriting the destination file.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Write two sample projects to a directory.
    Demo { dir: PathBuf },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    let log_dir = cli
        .log_dir
        .clone()
        .unwrap_or_else(|| config.diagnostics.logs_dir.clone());
    let _telemetry = init_tracing_with_options(
        &log_dir,
        &config.diagnostics.trace_file_prefix,
        &config.diagnostics.rust_log_filter,
    )?;

    let context = CommandContext {
        format: if cli.json {
            OutputFormat::Json
        } else {
            config.output.format
        },
        compare: config.compare,
        default_selection: config.copy.default_selection.clone(),
    };

    let output = match &cli.command {
        Commands::Tracks { file } => commands::tracks(&context, file)?,
        Commands::Diff {
            left,
            right,
            left_track,
            right_track,
        } => commands::diff(
            &context,
            left,
            right,
            left_track.as_deref(),
            right_track.as_deref(),
        )?,
        Commands::Copy {
            from,
            to,
            source,
            dest,
            select,
            output,
        } => commands::copy(
            &context,
            from,
            to,
            source,
            dest,
            select.as_ref(),
            output.as_deref(),
        )?,
        Commands::Demo { dir } => commands::demo(&context, dir)?,
    };

    println!("{output}");
    Ok(())
}
