use crate::cli::CatArgs;
use crate::config::FileConcatConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use dcdkit::engine::progress::ProgressReporter;
use dcdkit::workflows::concat::{self, ConcatSummary};
use tracing::{debug, info};

pub fn run(args: CatArgs) -> Result<()> {
    let config = FileConcatConfig::for_args(&args)?.merge_with_cli(&args)?;
    debug!("Resolved concatenation config: {:?}", config);

    let handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(handler.get_callback());
    let summary = concat::run(&args.inputs, &args.output, &config, &reporter)?;

    info!(
        frames = summary.frames_after,
        "Wrote {:?}.",
        summary.output
    );
    println!("{}", describe(&summary));
    Ok(())
}

fn describe(summary: &ConcatSummary) -> String {
    let copied: u64 = summary.inputs.iter().map(|i| i.frames_copied).sum();
    if summary.frames_before > 0 {
        format!(
            "Appended {} frames from {} inputs to {} ({} frames total).",
            copied,
            summary.inputs.len(),
            summary.output.display(),
            summary.frames_after
        )
    } else {
        format!(
            "Wrote {} frames from {} inputs to {}.",
            copied,
            summary.inputs.len(),
            summary.output.display()
        )
    }
}
