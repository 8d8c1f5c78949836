use colored::Colorize;
use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;

/// Sets up the logging configuration for the server.
///
/// Level labels are colored, each line carries a timestamp. The default level is
/// `Info` for this crate and `Warn` for the HTTP stack; `RUST_LOG` overrides both.
pub fn setup_log() {
    let mut builder = Builder::new();

    builder
        .format(|buf, record| {
            let l = record.level();
            let colored_level = match l {
                log::Level::Error => l.to_string().red().bold(),
                log::Level::Warn => l.to_string().yellow().bold(),
                log::Level::Info => l.to_string().green().bold(),
                log::Level::Debug => l.to_string().blue().bold(),
                log::Level::Trace => l.to_string().purple().bold(),
            };
            writeln!(
                buf,
                "{} {} {}",
                buf.timestamp_seconds().to_string().dimmed(),
                colored_level,
                record.args()
            )
        })
        .filter(None, LevelFilter::Info)
        .filter(Some("hyper"), LevelFilter::Warn)
        .filter(Some("axum"), LevelFilter::Warn)
        .parse_default_env();

    // Tests may install their own logger first
    let _ = builder.try_init();
}
