//! CLI entry point: builds a component container from a directory of
//! JSON configuration files, starts it, and stops it on a keypress.
//!
//! Wires exactly two factory types — `Logger` and `Scheduler` — which is
//! enough to exercise the container and scheduler end to end; a host
//! embedding this crate registers its own factories the same way before
//! calling `Container::init`.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use component_container::{FsConfigLoader, Runtime};
use iot_runtime::{LoggerFactory, SchedulerFactory};

#[derive(Parser)]
#[command(name = "iot-runtime")]
#[command(about = "Runs a component container configured from a directory of JSON files")]
struct Cli {
    /// Directory holding `<name>.json` (the container's own
    /// component-name -> component-type map) plus one JSON file per
    /// component named in it.
    #[arg(short, long)]
    config_dir: PathBuf,

    /// Name of the top-level container to load; also the stem of its
    /// own config file inside `config_dir`.
    #[arg(short = 'n', long, default_value = "app")]
    name: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let loader = FsConfigLoader::new(&cli.config_dir);
    let runtime = Runtime::new();
    runtime.register_factory(Arc::new(LoggerFactory));
    runtime.register_factory(Arc::new(SchedulerFactory));

    let Some(container) = runtime.alloc_container(cli.name.clone()) else {
        tracing::error!(name = %cli.name, "a container with this name is already running in this process");
        std::process::exit(1);
    };

    container.init(&loader);
    tracing::info!(container = %cli.name, components = container.len(), "container initialized");

    container.start();
    tracing::info!("components started, press enter to stop");

    let mut line = String::new();
    let _ = std::io::stdin().read_line(&mut line);

    container.stop();
    tracing::info!("components stopped");
}
