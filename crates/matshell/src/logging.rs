use std::io::IsTerminal;
use std::sync::OnceLock;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

static INITIALISED: OnceLock<()> = OnceLock::new();

const FILTER_VARS: [&str; 2] = ["MATSHELL_LOG", "RUST_LOG"];

/// Installs the stderr subscriber. Returns `false` when one was already
/// installed by an earlier call.
pub fn init_tracing(verbose: bool) -> bool {
    if INITIALISED.set(()).is_err() {
        return false;
    }
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_ansi(std::io::stderr().is_terminal());
    Registry::default()
        .with(filter(verbose))
        .with(fmt_layer)
        .try_init()
        .is_ok()
}

fn filter(verbose: bool) -> EnvFilter {
    for var in FILTER_VARS {
        if let Ok(raw) = std::env::var(var) {
            if raw.trim().is_empty() {
                continue;
            }
            if let Ok(f) = EnvFilter::try_new(raw.trim()) {
                return f;
            }
        }
    }
    EnvFilter::new(default_directive(verbose))
}

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "warn"
    }
}
