mod demo;
mod logger;

use anyhow::Result;
use clap::*;
use demo::{Example, Options};
use elvis_config::{LogLevel, ProjectConfig};

/// Runs one of the ELVIS III IRQ examples against a simulated FPGA session.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Project config, created with defaults when missing.
    #[arg(short, long)]
    config: Option<String>,
    /// Log at debug level regardless of the config.
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: SubCommands,
}

#[derive(Subcommand, Debug)]
enum SubCommands {
    /// Onboard button interrupt.
    Button(RunArgs),
    /// One-shot timer interrupt on IRQ 0.
    Timer(RunArgs),
    /// Digital input edge interrupt.
    Di(RunArgs),
    /// Analog input threshold interrupt.
    Ai(RunArgs),
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    /// Seconds the main loop runs for.
    #[arg(short, long)]
    duration: Option<u64>,
    /// IRQ number to register on.
    #[arg(long)]
    irq: Option<u8>,
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let config = ProjectConfig::load_or_create(args.config.as_deref().unwrap_or(".project.toml"))?;
    logger::init(if args.verbose {
        LogLevel::Debug
    } else {
        config.log_level
    })?;

    let (example, run) = match args.command {
        SubCommands::Button(a) => (Example::Button, a),
        SubCommands::Timer(a) => (Example::Timer, a),
        SubCommands::Di(a) => (Example::Di, a),
        SubCommands::Ai(a) => (Example::Ai, a),
    };

    demo::run(
        example,
        &config,
        Options {
            duration_secs: run.duration,
            irq: run.irq,
        },
    )
}
