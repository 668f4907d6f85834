// SPDX-License-Identifier: Apache-2.0

//! Logging initialization for the adoauth CLI.
//!
//! Uses `tracing` with `tracing-subscriber` for structured logging on stderr,
//! so stdout stays clean for the token or header being printed.
//! Log level can be controlled via the `RUST_LOG` environment variable.
//!
//! # Examples
//!
//! ```bash
//! # Default: warn for adoauth
//! adoauth header --auth-type pat
//!
//! # Debug output for troubleshooting
//! RUST_LOG=adoauth_core=debug adoauth header --auth-type pat
//! ```

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize the logging subsystem.
///
/// `RUST_LOG` wins when set. Otherwise `verbose` (-v) selects debug-level
/// output for adoauth crates and warn-level output by default.
pub fn init_logging(verbose: bool) {
    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let default_filter = if verbose {
        "adoauth=debug,adoauth_core=debug"
    } else {
        "adoauth=warn,adoauth_core=warn"
    };
    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
