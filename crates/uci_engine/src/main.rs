//! UCI front end.
//!
//! Usage: `uci_engine [search-config.toml]`. Protocol text goes to stdout;
//! logs go to stderr, filtered by `RUST_LOG` (default `info`).

mod session;

use std::io::{self, BufRead};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use classical_engine::SearchConfig;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::session::{Output, Session};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_logging();

    let config = match std::env::args().nth(1) {
        Some(path) => match SearchConfig::load(&path) {
            Ok(config) => {
                info!(%path, "loaded search config");
                config
            }
            Err(err) => {
                error!(%err, "cannot start");
                return ExitCode::FAILURE;
            }
        },
        None => SearchConfig::default(),
    };

    // UCI engines communicate via stdin/stdout.
    let out: Output = Arc::new(Mutex::new(io::stdout()));
    let mut session = Session::new(config, out);

    for line in io::stdin().lock().lines() {
        let Ok(line) = line else {
            break;
        };
        if !session.handle(&line) {
            break;
        }
    }
    session.finish_search();
    ExitCode::SUCCESS
}
