use crate::core::models::header::{DEFAULT_TIMESTEP, DEFAULT_TITLE};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// How a writer treats an existing file at its target path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    /// Truncate or create the file.
    #[default]
    Create,
    /// Continue after the last frame of an existing file. Falls back to
    /// [`OpenMode::Create`] when the file does not exist.
    Append,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WriterConfig {
    pub mode: OpenMode,
    pub timestep: f64,
    pub titles: Vec<String>,
    /// Frame count declared up front. Writes past it grow the header.
    pub expected_frames: Option<u32>,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            mode: OpenMode::Create,
            timestep: DEFAULT_TIMESTEP,
            titles: vec![DEFAULT_TITLE.to_string()],
            expected_frames: None,
        }
    }
}

/// Checks that `timestep` is positive, finite and representable in the
/// single precision header slot.
pub fn validate_timestep(timestep: f64) -> Result<f64, ConfigError> {
    if !timestep.is_finite() || timestep <= 0.0 {
        return Err(ConfigError::InvalidParameter {
            name: "timestep",
            reason: format!("must be a positive finite number, got {}", timestep),
        });
    }
    if timestep > f64::from(f32::MAX) {
        return Err(ConfigError::InvalidParameter {
            name: "timestep",
            reason: "does not fit the single precision header slot".to_string(),
        });
    }
    Ok(timestep)
}

#[derive(Default)]
pub struct WriterConfigBuilder {
    mode: Option<OpenMode>,
    timestep: Option<f64>,
    titles: Vec<String>,
    expected_frames: Option<u32>,
}

impl WriterConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(mut self, mode: OpenMode) -> Self {
        self.mode = Some(mode);
        self
    }
    pub fn timestep(mut self, timestep: f64) -> Self {
        self.timestep = Some(timestep);
        self
    }
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.titles.push(title.into());
        self
    }
    pub fn titles<I, T>(mut self, titles: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.titles.extend(titles.into_iter().map(Into::into));
        self
    }
    pub fn expected_frames(mut self, frames: u32) -> Self {
        self.expected_frames = Some(frames);
        self
    }

    pub fn build(self) -> Result<WriterConfig, ConfigError> {
        let timestep = validate_timestep(self.timestep.unwrap_or(DEFAULT_TIMESTEP))?;
        let titles = if self.titles.is_empty() {
            vec![DEFAULT_TITLE.to_string()]
        } else {
            self.titles
        };
        Ok(WriterConfig {
            mode: self.mode.unwrap_or_default(),
            timestep,
            titles,
            expected_frames: self.expected_frames,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConcatConfig {
    pub writer: WriterConfig,
    /// Frames dropped from the start of every input.
    pub skip: usize,
    /// Keep every `stride`-th frame after `skip`.
    pub stride: usize,
    /// Take the timestep of a freshly created output from the first input,
    /// scaled by `stride`, instead of from `writer`.
    pub inherit_timestep: bool,
}

#[derive(Default)]
pub struct ConcatConfigBuilder {
    writer: Option<WriterConfig>,
    skip: Option<usize>,
    stride: Option<usize>,
    inherit_timestep: Option<bool>,
}

impl ConcatConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writer(mut self, writer: WriterConfig) -> Self {
        self.writer = Some(writer);
        self
    }
    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }
    pub fn stride(mut self, stride: usize) -> Self {
        self.stride = Some(stride);
        self
    }
    pub fn inherit_timestep(mut self, inherit: bool) -> Self {
        self.inherit_timestep = Some(inherit);
        self
    }

    pub fn build(self) -> Result<ConcatConfig, ConfigError> {
        let stride = self.stride.unwrap_or(1);
        if stride == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "stride",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(ConcatConfig {
            writer: self.writer.unwrap_or_default(),
            skip: self.skip.unwrap_or(0),
            stride,
            inherit_timestep: self.inherit_timestep.unwrap_or(true),
        })
    }
}
