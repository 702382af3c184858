//! Logging facilities for the simulator, re-exporting the five logging
//! macros: `error!`, `warn!`, `info!`, `debug!` and `trace!`, where `error!`
//! represents the highest-priority messages and `trace!` the lowest.
//!
//! Logging is limited to warnings and errors by default; the binary raises
//! the level from its `-v`-style verbosity flags.

pub use log::{debug, error, info, trace, warn, LevelFilter};

use log4rs::{
    append::console::ConsoleAppender,
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
    Handle,
};
use std::sync::{Mutex, OnceLock};

const DEFAULT_LOG_PATTERN: &str = "{h({l})} {M}: {m}{n}";

static ROOT_HANDLE: OnceLock<Mutex<Handle>> = OnceLock::new();

fn build_config(level: LevelFilter) -> Config {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(DEFAULT_LOG_PATTERN)))
        .build();
    Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(level))
        .expect("valid logging configuration")
}

/// Installs the global logger at `level`, or reconfigures it if it is
/// already installed.
pub fn set_log_level(level: LevelFilter) {
    let handle = ROOT_HANDLE.get_or_init(|| {
        let handle = log4rs::init_config(build_config(LevelFilter::Off))
            .expect("no other global logger is installed");
        Mutex::new(handle)
    });
    handle.lock().unwrap().set_config(build_config(level));
}

/// Maps a `-v` count to a level filter: warnings by default, then info,
/// debug, and trace.
pub fn level_from_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_mapping() {
        assert_eq!(level_from_verbosity(0), LevelFilter::Warn);
        assert_eq!(level_from_verbosity(1), LevelFilter::Info);
        assert_eq!(level_from_verbosity(2), LevelFilter::Debug);
        assert_eq!(level_from_verbosity(3), LevelFilter::Trace);
        assert_eq!(level_from_verbosity(200), LevelFilter::Trace);
    }
}
