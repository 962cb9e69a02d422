//! Sodalite entrypoint: a reverse-engineering toolkit for compiled
//! shader-material containers.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::clear::ClearArgs;
use commands::info::InfoArgs;
use commands::label::LabelArgs;
use commands::pack::PackArgs;
use commands::restore::RestoreArgs;
use commands::unpack::UnpackArgs;
use config::Config;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(
    name = "sodalite",
    version,
    about = "Shader material reverse-engineering toolkit for the RenderDragon engine"
)]
struct Args {
    /// Configuration file path (overrides discovery of `sodalite.toml`).
    #[arg(long = "config", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Unpack packed materials into an editable folder layout.
    Unpack {
        /// Material files or folders of materials.
        inputs: Vec<PathBuf>,
        /// Output directory.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Sort variants and flags for diff-friendly output.
        #[arg(long)]
        sort_flags: bool,
        /// Skip writing shader payload files.
        #[arg(long)]
        skip_shaders: bool,
    },
    /// Pack unpacked material folders back into containers.
    Pack {
        inputs: Vec<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Reconstruct combined shader sources and varying.def.sc files.
    Restore {
        inputs: Vec<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Expression search budget per condition, in seconds.
        #[arg(long)]
        timeout: Option<f64>,
        /// Worker threads for the per-material fan-out.
        #[arg(long)]
        max_workers: Option<usize>,
        /// Emit one source per pass instead of pass conditionals.
        #[arg(long)]
        split_passes: bool,
        /// Fold all stages into one source with stage conditionals.
        #[arg(long)]
        merge_stages: bool,
        /// Skip the GLSL-to-shader-compiler rewrites.
        #[arg(long)]
        no_processing: bool,
    },
    /// Print a summary of each material.
    Info { inputs: Vec<PathBuf> },
    /// Insert shader-information comments into text payloads.
    Label {
        inputs: Vec<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Strip shader payloads from materials.
    Clear {
        inputs: Vec<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(config.log.filter.clone().unwrap_or_else(|| "info".into()))
    });

    match &config.log.file {
        Some(path) => {
            let directory = path.parent().unwrap_or(std::path::Path::new("."));
            let file_name = path.file_name().unwrap_or(std::ffi::OsStr::new("sodalite.log"));
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            None
        }
    }
}

fn output_dir(cli: Option<PathBuf>, config: &Config) -> PathBuf {
    cli.or_else(|| config.output.clone())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = config::load(args.config.as_deref())?;
    let _log_guard = init_tracing(&config);

    match args.command {
        Command::Unpack {
            inputs,
            output,
            sort_flags,
            skip_shaders,
        } => commands::unpack::run(&UnpackArgs {
            inputs,
            output: output_dir(output, &config),
            sort_flags,
            skip_shaders,
        }),
        Command::Pack { inputs, output } => commands::pack::run(&PackArgs {
            inputs,
            output: output_dir(output, &config),
        }),
        Command::Restore {
            inputs,
            output,
            timeout,
            max_workers,
            split_passes,
            merge_stages,
            no_processing,
        } => commands::restore::run(&RestoreArgs {
            inputs,
            output: output_dir(output, &config),
            timeout: timeout.or(config.restore.timeout),
            max_workers: max_workers.or(config.restore.max_workers),
            split_passes,
            merge_stages,
            no_processing,
        }),
        Command::Info { inputs } => commands::info::run(&InfoArgs { inputs }),
        Command::Label { inputs, output } => commands::label::run(&LabelArgs {
            inputs,
            output: output_dir(output, &config),
        }),
        Command::Clear { inputs, output } => commands::clear::run(&ClearArgs {
            inputs,
            output: output_dir(output, &config),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restore_flags_parse() {
        let args = Args::parse_from([
            "sodalite",
            "restore",
            "materials/",
            "-o",
            "out",
            "--timeout",
            "2.5",
            "--split-passes",
        ]);
        match args.command {
            Command::Restore {
                inputs,
                output,
                timeout,
                split_passes,
                merge_stages,
                ..
            } => {
                assert_eq!(inputs, vec![PathBuf::from("materials/")]);
                assert_eq!(output, Some(PathBuf::from("out")));
                assert_eq!(timeout, Some(2.5));
                assert!(split_passes);
                assert!(!merge_stages);
            }
            _ => panic!("expected restore"),
        }
    }

    #[test]
    fn cli_output_overrides_config_output() {
        let config = Config {
            output: Some(PathBuf::from("from-config")),
            ..Config::default()
        };
        assert_eq!(
            output_dir(Some(PathBuf::from("from-cli")), &config),
            PathBuf::from("from-cli")
        );
        assert_eq!(output_dir(None, &config), PathBuf::from("from-config"));
        assert_eq!(output_dir(None, &Config::default()), PathBuf::from("."));
    }
}
