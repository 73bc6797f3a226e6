//! Tracing subscriber setup

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log level selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    #[default]
    Normal,
    Verbose,
    Debug,
}

impl Verbosity {
    pub fn from_flags(verbose: bool, debug: bool) -> Self {
        if debug {
            Verbosity::Debug
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }

    /// Filter used when `RUST_LOG` is not set
    pub fn default_directives(self) -> &'static str {
        match self {
            Verbosity::Normal => "info",
            Verbosity::Verbose => "info,h02ownd=debug,h02own_core=debug,h02own_mqtt=debug",
            Verbosity::Debug => "info,h02ownd=trace,h02own_core=trace,h02own_mqtt=trace",
        }
    }
}

/// Install the global subscriber. `RUST_LOG` overrides `verbosity`.
pub fn init(verbosity: Verbosity) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| verbosity.default_directives().into()),
        )
        .with(fmt::layer())
        .init();
}
