use std::io::{BufRead, BufReader, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use matshell_contracts::{
    STARTUP_MATRIX_DIM, STARTUP_MATRIX_HIGH, STARTUP_MATRIX_LOW, STARTUP_MATRIX_NAME,
};
use matshell_core::{Command, Dispatcher, Registry};

mod config;
mod logging;
mod session;

use config::{CliOverrides, ShellConfig};
use session::{OutputMode, Session};

#[derive(Parser, Debug)]
#[command(name = "matshell")]
#[command(about = "Interactive shell over a fixed-size registry of named u32 matrices.", long_about = None)]
struct Cli {
    /// JSON config file (schema matshell.config@0.1.0).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of registry slots.
    #[arg(long)]
    capacity: Option<usize>,
    /// Directory that `read` and `write` resolve file names against.
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Seed for `random`; entropy when unset.
    #[arg(long)]
    seed: Option<u64>,
    /// Read commands from this file instead of stdin.
    #[arg(long)]
    script: Option<PathBuf>,
    /// Emit one JSON report per command.
    #[arg(long, default_value_t = false)]
    json: bool,
    /// Skip creating and writing the startup matrix.
    #[arg(long, default_value_t = false)]
    no_startup_matrix: bool,
    #[arg(long, short = 'v', default_value_t = false)]
    verbose: bool,
}

fn main() -> ExitCode {
    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(2)
        }
    }
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    let overrides = CliOverrides {
        capacity: cli.capacity,
        data_dir: cli.data_dir.clone(),
        seed: cli.seed,
        no_startup_matrix: cli.no_startup_matrix,
    };
    let cfg = ShellConfig::resolve(cli.config.as_deref(), &overrides)?;
    tracing::debug!(?cfg, "config resolved");

    let registry = Registry::new(cfg.capacity).context("build registry")?;
    let mut dispatcher = Dispatcher::new(registry, &cfg.data_dir, cfg.seed);

    if cfg.startup_matrix {
        seed_startup_matrix(&mut dispatcher).context("startup matrix")?;
    }

    let mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };
    let (input, interactive): (Box<dyn BufRead>, bool) = match &cli.script {
        Some(path) => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("open script: {}", path.display()))?;
            (Box::new(BufReader::new(file)), false)
        }
        None => (
            Box::new(std::io::stdin().lock()),
            std::io::stdin().is_terminal(),
        ),
    };
    let prompt = interactive.then_some(cfg.prompt.as_str());

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let outcome = Session::new(mode, prompt).run(&mut dispatcher, input, &mut out);
    let released = dispatcher.shutdown();
    tracing::debug!(released, "shutdown complete");
    let stats = outcome?;
    out.flush().context("flush stdout")?;
    tracing::info!(
        succeeded = stats.succeeded,
        failed = stats.failed,
        "session finished"
    );
    Ok(())
}

/// Creates the startup matrix, fills it and writes it to the data dir.
fn seed_startup_matrix(dispatcher: &mut Dispatcher) -> Result<()> {
    let steps = [
        Command::Create {
            name: STARTUP_MATRIX_NAME.to_string(),
            rows: STARTUP_MATRIX_DIM,
            cols: STARTUP_MATRIX_DIM,
        },
        Command::Random {
            name: STARTUP_MATRIX_NAME.to_string(),
            low: STARTUP_MATRIX_LOW,
            high: STARTUP_MATRIX_HIGH,
        },
        Command::Write {
            name: STARTUP_MATRIX_NAME.to_string(),
        },
    ];
    for step in &steps {
        let outcome = dispatcher
            .execute(step)
            .with_context(|| format!("{} {STARTUP_MATRIX_NAME}", step.kind()))?;
        tracing::info!(%outcome, "startup");
    }
    Ok(())
}
