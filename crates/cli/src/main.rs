//! gdbind generator CLI
//!
//! Plans how engine classes are split across modules and writes the binding
//! sources for each of them:
//!
//! - `gdbind plan` - partition a module configuration into filter files
//! - `gdbind generate` - write one module from filter files
//! - `gdbind build` - plan and generate every module in one run

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gdbind")]
#[command(about = "Engine binding generator", long_about = None)]
#[command(version)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one module from filter files
    Generate {
        /// Path to extension_api.json
        api: PathBuf,
        /// Directory the module directory is written into
        out_dir: PathBuf,
        /// Module name
        #[arg(short, long, default_value = "godot")]
        module: String,
        /// Classes generated by this module
        #[arg(long)]
        class_filter: PathBuf,
        /// Classes this module may reference
        #[arg(long)]
        available_class_filter: PathBuf,
        /// Builtin value types generated by this module
        #[arg(long)]
        builtin_filter: PathBuf,
        /// Text inserted verbatim after the module header
        #[arg(long)]
        preamble_file: Option<PathBuf>,
        /// Single combined module using the bucketed file layout
        #[arg(long)]
        combined: bool,
        /// Module configuration supplying tiers and generation settings
        #[arg(long)]
        tiers: Option<PathBuf>,
    },

    /// Partition the modules of a configuration and write their filter files
    Plan {
        /// Path to gdbind.toml
        config: PathBuf,
        /// Working directory; filters go to <workdir>/filters
        workdir: PathBuf,
    },

    /// Plan and generate every module
    Build {
        /// Path to gdbind.toml
        config: PathBuf,
        /// Path to extension_api.json
        api: PathBuf,
        /// Working directory; modules go to <workdir>/<module>
        workdir: PathBuf,
        /// Only generate the umbrella module, bucketed
        #[arg(long)]
        combined: bool,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Generate {
            api,
            out_dir,
            module,
            class_filter,
            available_class_filter,
            builtin_filter,
            preamble_file,
            combined,
            tiers,
        } => {
            let args = commands::generate::GenerateArgs {
                api,
                out_dir,
                module,
                class_filter,
                available_class_filter,
                builtin_filter,
                preamble_file,
                combined,
                tiers,
            };
            commands::generate::execute(&args)?;
        }

        Commands::Plan { config, workdir } => {
            commands::plan::execute(&config, &workdir)?;
        }

        Commands::Build {
            config,
            api,
            workdir,
            combined,
        } => {
            commands::build::execute(&config, &api, &workdir, combined)?;
        }
    }

    Ok(())
}
