// Copyright 2021 Siemens AG
// SPDX-License-Identifier: MIT

use std::io::Write;

use env_logger::{Builder, Target};
use log::LevelFilter;

/// Level from the command line, else from `RUST_LOG`, else `warn`.
/// Log lines go to stderr; stdout carries results.
pub fn init_logging(level: Option<&str>) {
    let log_level = level
        .and_then(|l| l.parse::<LevelFilter>().ok())
        .or_else(|| std::env::var("RUST_LOG").ok().and_then(|v| v.parse::<LevelFilter>().ok()))
        .unwrap_or(LevelFilter::Warn);

    Builder::new()
        .filter_level(log_level)
        .target(Target::Stderr)
        .format(|buf, record| {
            writeln!(buf, "[{} {:5} {}] {}",
                buf.timestamp_seconds(),
                record.level(),
                record.target(),
                record.args())
        })
        .init();
    log::debug!("Logger initialized (level: {})", log_level);
}
