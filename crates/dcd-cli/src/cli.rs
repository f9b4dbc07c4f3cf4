use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan",
    version,
    about = "dcdkit - Inspect, concatenate, and extend molecular-dynamics trajectories in the DCD format.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the header and frame statistics of a trajectory.
    Info(InfoArgs),
    /// Concatenate one or more trajectories into a single output file.
    Cat(CatArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Toml,
}

/// Arguments for the `info` subcommand.
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Path to the trajectory file.
    #[arg(required = true, value_name = "FILE")]
    pub file: PathBuf,

    /// How to print the summary.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Arguments for the `cat` subcommand.
#[derive(Args, Debug)]
pub struct CatArgs {
    /// Input trajectories, copied in the order given.
    #[arg(required = true, num_args = 1.., value_name = "INPUT")]
    pub inputs: Vec<PathBuf>,

    /// Path of the output trajectory.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Continue an existing output file instead of overwriting it.
    #[arg(short, long)]
    pub append: bool,

    /// Optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Number of frames to drop from the start of every input.
    #[arg(long, value_name = "INT")]
    pub skip: Option<usize>,

    /// Keep every N-th frame after the skipped ones.
    #[arg(long, value_name = "INT")]
    pub stride: Option<usize>,

    /// Timestep recorded in a newly created output.
    /// Defaults to the first input's timestep scaled by the stride.
    #[arg(short, long, value_name = "FLOAT")]
    pub timestep: Option<f64>,

    /// Title line for a newly created output. Can be used multiple times.
    #[arg(long = "title", value_name = "TEXT")]
    pub titles: Vec<String>,

    /// Frame count declared in the header of a newly created output.
    #[arg(long, value_name = "INT")]
    pub expected_frames: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_info_with_format() {
        let cli = Cli::parse_from(["dcdkit", "info", "run.dcd", "--format", "toml"]);
        match cli.command {
            Commands::Info(args) => {
                assert_eq!(args.file, PathBuf::from("run.dcd"));
                assert_eq!(args.format, OutputFormat::Toml);
            }
            _ => panic!("Expected 'info' subcommand"),
        }
    }

    #[test]
    fn parses_cat_with_repeated_titles_and_global_flags() {
        let cli = Cli::parse_from([
            "dcdkit", "cat", "-o", "out.dcd", "a.dcd", "b.dcd", "--title", "first", "--title",
            "second", "--stride", "2", "-vv",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Cat(args) => {
                assert_eq!(args.inputs.len(), 2);
                assert_eq!(args.titles, vec!["first", "second"]);
                assert_eq!(args.stride, Some(2));
                assert!(!args.append);
                assert!(args.config.is_none());
            }
            _ => panic!("Expected 'cat' subcommand"),
        }
    }

    #[test]
    fn cat_requires_an_input() {
        assert!(Cli::try_parse_from(["dcdkit", "cat", "-o", "out.dcd"]).is_err());
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["dcdkit", "-q", "-v", "info", "run.dcd"]).is_err());
    }
}
