//! Logging setup (SPEC_FULL §C). A threaded `slog::Logger`, built via
//! `sloggers`, handed explicitly to the pieces that need it rather than
//! installed as a global — mirrors `flux::logging::init` from the
//! teacher's authenticator service, which returns a logger instead of
//! calling `slog_scope::set_global_logger`.

use sloggers::terminal::{Destination, TerminalLoggerBuilder};
use sloggers::types::Severity;
use sloggers::Build;

/// Build a terminal logger at the given severity. `component` is
/// attached as a fixed key-value pair so log lines from the chunk
/// manager, the dispatcher and the listener are easy to tell apart
/// when interleaved on one connection's event loop.
pub fn init(component: &'static str, severity: Severity) -> slog::Logger {
    let mut builder = TerminalLoggerBuilder::new();
    builder.level(severity);
    builder.destination(Destination::Stderr);
    let logger = builder.build().expect("terminal logger always builds");
    logger.new(slog::o!("component" => component))
}
