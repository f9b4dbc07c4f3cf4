use crate::cli::CatArgs;
use crate::error::{CliError, Result};
use dcdkit::engine::config::{ConcatConfig, ConcatConfigBuilder, OpenMode, WriterConfigBuilder};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

pub struct DefaultsConfig {
    pub skip: usize,
    pub stride: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self { skip: 0, stride: 1 }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct FileOutputConfig {
    timestep: Option<f64>,
    titles: Option<Vec<String>>,
    expected_frames: Option<u32>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct FileSelectionConfig {
    skip: Option<usize>,
    stride: Option<usize>,
}

/// Settings for `cat` as read from a TOML file. Every key is optional.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct FileConcatConfig {
    output: Option<FileOutputConfig>,
    selection: Option<FileSelectionConfig>,
}

impl FileConcatConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Loads the file named by `--config`, or an empty configuration.
    pub fn for_args(args: &CatArgs) -> Result<Self> {
        match &args.config {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Resolves every setting with command-line flags taking precedence over
    /// the file, and the file over built-in defaults.
    pub fn merge_with_cli(self, args: &CatArgs) -> Result<ConcatConfig> {
        let defaults = DefaultsConfig::default();
        let output = self.output.unwrap_or_default();
        let selection = self.selection.unwrap_or_default();

        let mode = if args.append {
            OpenMode::Append
        } else {
            OpenMode::Create
        };
        let mut writer = WriterConfigBuilder::new().mode(mode);

        let timestep = args.timestep.or(output.timestep);
        if let Some(timestep) = timestep {
            writer = writer.timestep(timestep);
        }
        if !args.titles.is_empty() {
            writer = writer.titles(args.titles.iter().cloned());
        } else if let Some(titles) = output.titles {
            writer = writer.titles(titles);
        }
        if let Some(frames) = args.expected_frames.or(output.expected_frames) {
            writer = writer.expected_frames(frames);
        }
        let writer = writer.build().map_err(|e| CliError::Config(e.to_string()))?;

        ConcatConfigBuilder::new()
            .writer(writer)
            .skip(args.skip.or(selection.skip).unwrap_or(defaults.skip))
            .stride(args.stride.or(selection.stride).unwrap_or(defaults.stride))
            .inherit_timestep(timestep.is_none())
            .build()
            .map_err(|e| CliError::Config(e.to_string()))
    }
}
