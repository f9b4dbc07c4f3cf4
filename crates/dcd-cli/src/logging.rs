use crate::error::{CliError, Result};
use std::fs::File;
use std::path::Path;
use tracing::Subscriber;
use tracing_subscriber::{
    filter::{LevelFilter, Targets},
    fmt::{self, format::FmtSpan, MakeWriter},
    prelude::*,
    registry::LookupSpan,
    Layer,
};

/// Target prefix shared by the library and the binary.
const TRAJECTORY_TARGET: &str = "dcdkit";

fn level_filter(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// The log file records trajectory events at DEBUG or finer, independent of
/// `-q` and of a lower terminal verbosity, and drops other crates' events.
fn file_filter(terminal: LevelFilter) -> Targets {
    Targets::new().with_target(TRAJECTORY_TARGET, terminal.max(LevelFilter::DEBUG))
}

/// Plain-text layer that also reports when each span (a concat run, a writer
/// resume) closes, with its busy and idle time.
fn trajectory_file_layer<S, W>(writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
}

pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let terminal = level_filter(verbosity, quiet);
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .compact()
        .with_filter(terminal);

    let file_layer = log_file
        .map(|path| -> Result<_> {
            let file = File::create(path).map_err(CliError::Io)?;
            Ok(trajectory_file_layer(file).with_filter(file_filter(terminal)))
        })
        .transpose()?;

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}
