//! Attach-and-bump worker for smoke checks and cross-process tests.
//!
//! Reads the locator from `STATPOOL_REGION`, attaches, then applies each
//! `code` or `code:count` argument in order. Exits 1 on attach or increment
//! failure, 2 on usage errors.

use tracing_subscriber::{fmt, EnvFilter};

use statpool_agent::{RegionLocator, Worker, REGION_ENV_VAR};
use statpool_core::{CounterError, CounterStore};

fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let raw = match std::env::var(REGION_ENV_VAR) {
        Ok(raw) => raw,
        Err(_) => {
            eprintln!("{REGION_ENV_VAR} is not set");
            std::process::exit(2);
        }
    };
    let locator = match RegionLocator::from_env_value(&raw) {
        Ok(locator) => locator,
        Err(error) => fatal(&error),
    };
    let worker = match Worker::attach(&locator) {
        Ok(worker) => worker,
        Err(error) => fatal(&error),
    };

    let store = worker.store();
    for arg in std::env::args().skip(1) {
        let (code, count) = match parse_bump(&arg) {
            Some(pair) => pair,
            None => {
                eprintln!("bad argument {arg:?}, expected CODE or CODE:COUNT");
                std::process::exit(2);
            }
        };
        for _ in 0..count {
            if let Err(error) = store.increment(code) {
                fatal(&error);
            }
        }
    }
}

/// `404` bumps once, `404:3` bumps three times.
fn parse_bump(arg: &str) -> Option<(u16, u64)> {
    match arg.split_once(':') {
        Some((code, count)) => Some((code.parse().ok()?, count.parse().ok()?)),
        None => Some((arg.parse().ok()?, 1)),
    }
}

fn fatal(error: &CounterError) -> ! {
    tracing::error!(%error, severity = error.severity().as_str(), "statpool-worker failed");
    std::process::exit(1)
}
