//! Kindle CLI - check, list, and simulate effect files

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{check, list, simulate};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kindle")]
#[command(about = "Data-driven 2D particle effects", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report malformed values and unknown field kinds
    Check {
        /// Path to effect file
        file: String,
    },

    /// List the effects in a file
    List {
        /// Path to effect file
        file: String,
    },

    /// Run one effect headless and print what it does
    Simulate {
        /// Path to effect file
        file: String,

        /// Effect name
        #[arg(long)]
        effect: String,

        /// Seconds of simulated time
        #[arg(long, default_value = "3.0")]
        seconds: f64,

        /// Render frames per second driving the fixed-step clock
        #[arg(long, default_value = "60")]
        frame_rate: u32,

        /// Emitter position
        #[arg(long, default_value = "0")]
        x: f32,
        #[arg(long, default_value = "0")]
        y: f32,

        /// Launch angle offset in degrees
        #[arg(long, default_value = "0")]
        angle: f32,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check { file } => check::run(&file),
        Commands::List { file } => list::run(&file),
        Commands::Simulate {
            file,
            effect,
            seconds,
            frame_rate,
            x,
            y,
            angle,
        } => simulate::run(simulate::SimulateArgs {
            file,
            effect,
            seconds,
            frame_rate,
            position: glam::Vec2::new(x, y),
            angle,
        }),
    }
}
