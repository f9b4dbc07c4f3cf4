use crate::cli::{InfoArgs, OutputFormat};
use crate::error::{CliError, Result};
use dcdkit::workflows::inspect::{self, TrajectorySummary};
use std::fmt::Write;
use tracing::info;

pub fn run(args: InfoArgs) -> Result<()> {
    if args.file.is_dir() {
        return Err(CliError::Argument(format!(
            "'{}' is a directory, expected a trajectory file",
            args.file.display()
        )));
    }
    info!("Inspecting {:?}.", args.file);
    let summary = inspect::run(&args.file)?;
    print!("{}", render(&summary, args.format)?);
    Ok(())
}

fn render(summary: &TrajectorySummary, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(summary)),
        OutputFormat::Toml => {
            toml::to_string_pretty(summary).map_err(|e| CliError::Other(e.into()))
        }
    }
}

fn render_text(summary: &TrajectorySummary) -> String {
    let header = &summary.header;
    let mut out = String::new();
    let _ = writeln!(out, "File:        {}", summary.path.display());
    let _ = writeln!(out, "Size:        {} bytes", summary.file_size);
    let _ = writeln!(out, "Atoms:       {}", header.natoms);
    let _ = writeln!(out, "Frames:      {}", summary.frame_count);
    if !summary.declared_matches {
        let _ = writeln!(out, "Declared:    {} (header is stale)", header.nsteps);
    }
    let _ = writeln!(out, "Frame size:  {} bytes", summary.frame_size);
    let _ = writeln!(out, "Timestep:    {}", header.timestep);
    let _ = writeln!(out, "Duration:    {}", summary.duration());
    let _ = writeln!(
        out,
        "Unit cell:   {}",
        if header.has_box { "yes" } else { "no" }
    );
    for (i, title) in header.trimmed_titles().enumerate() {
        let _ = writeln!(out, "Title {:<5} {}", format!("{}:", i + 1), title);
    }
    out
}
