use super::config::{OpenMode, WriterConfig};
use super::reader::DcdReader;
use crate::core::io::error::{ConsistencyErrorKind, DcdError, StateErrorKind};
use crate::core::io::header::MAX_ATOMS;
use crate::core::io::{frame, header};
use crate::core::models::frame::CoordinateFrame;
use crate::core::models::header::{DcdHeader, Title};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{debug, trace, warn};

/// A writer for DCD trajectories whose length need not be known in advance.
///
/// The header can be configured and written explicitly, or left to the writer:
/// the first frame fixes the atom count and periodicity, and every frame
/// written beyond the declared frame count grows that count and rewrites the
/// header in place. After each [`write_frame`](Self::write_frame) the stream is
/// flushed and holds a complete, readable trajectory.
///
/// ```no_run
/// # use dcdkit::engine::writer::DcdWriter;
/// # use dcdkit::core::models::frame::Frame;
/// # fn run(frames: Vec<Frame>) -> Result<(), dcdkit::core::io::error::DcdError> {
/// let mut writer = DcdWriter::create("output.dcd")?;
/// writer.set_header(500, 10, 1e-3, false)?;
/// writer.set_title("MY TITLE HERE")?;
/// writer.write_header()?;
/// writer.write_frames(&frames)?;
/// # Ok(())
/// # }
/// ```
pub struct DcdWriter<S: Write + Seek> {
    stream: S,
    header: DcdHeader,
    current: u32,
    header_written: bool,
}

impl DcdWriter<BufWriter<File>> {
    /// Creates (or truncates) a trajectory file.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, DcdError> {
        Self::open(path, OpenMode::Create)
    }

    /// Continues an existing trajectory file, or creates it if missing.
    pub fn append<P: AsRef<Path>>(path: P) -> Result<Self, DcdError> {
        Self::open(path, OpenMode::Append)
    }

    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self, DcdError> {
        let config = WriterConfig {
            mode,
            ..WriterConfig::default()
        };
        Self::open_with_config(path, &config)
    }

    /// Opens `path` according to `config`.
    ///
    /// In [`OpenMode::Append`] against an existing file the header recovered
    /// from that file takes precedence over the timestep, titles and expected
    /// frame count in `config`, and the header is considered written.
    ///
    /// # Errors
    ///
    /// Returns [`DcdError::Io`] if the file cannot be opened, or a format error
    /// if an existing file being appended to is not a valid trajectory.
    pub fn open_with_config<P: AsRef<Path>>(
        path: P,
        config: &WriterConfig,
    ) -> Result<Self, DcdError> {
        let path = path.as_ref();
        if config.mode == OpenMode::Append && path.exists() {
            return Self::resume(path);
        }

        debug!("Creating trajectory {:?}.", path);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(DcdWriter::with_config(BufWriter::new(file), config))
    }

    fn resume(path: &Path) -> Result<Self, DcdError> {
        let (mut header, frames) = {
            let reader = DcdReader::open(path)?;
            (reader.header().clone(), reader.frame_count())
        };
        let current = u32::try_from(frames).map_err(|_| {
            DcdError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("existing trajectory holds {} frames", frames),
            ))
        })?;
        if header.nsteps < current {
            warn!(
                declared = header.nsteps,
                actual = current,
                "Resuming a trajectory whose header under-reports its frames."
            );
            header.nsteps = current;
        }

        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let mut stream = BufWriter::new(file);
        stream.seek(SeekFrom::End(0))?;
        debug!(
            natoms = header.natoms,
            frames = current,
            "Resuming trajectory {:?} for appending.",
            path
        );

        Ok(Self {
            stream,
            header,
            current,
            header_written: true,
        })
    }

    /// Writes `frames` to `path` in one call, sizing the header from the list.
    ///
    /// With `append` set and an existing file at `path`, the frames are added
    /// after the file's own frames and `titles` is ignored. An empty `titles`
    /// list keeps the default title.
    pub fn write_trajectory<P, F>(
        path: P,
        frames: &[F],
        titles: &[String],
        append: bool,
    ) -> Result<Self, DcdError>
    where
        P: AsRef<Path>,
        F: CoordinateFrame,
    {
        let mode = if append {
            OpenMode::Append
        } else {
            OpenMode::Create
        };
        let mut writer = Self::open(path, mode)?;

        if !writer.header_written {
            if let Some(first) = frames.first() {
                let natoms = checked_atom_count(first)?;
                let nsteps = u32::try_from(frames.len()).map_err(|_| {
                    DcdError::Consistency(ConsistencyErrorKind::TooManyFrames(frames.len() as u64))
                })?;
                let timestep = writer.header.timestep;
                writer.set_header(natoms, nsteps, timestep, first.is_periodic())?;
            }
            if !titles.is_empty() {
                writer.set_titles(titles.iter().map(String::as_str))?;
            }
            writer.write_header()?;
        }
        writer.write_frames(frames)?;
        Ok(writer)
    }
}

impl<S: Write + Seek> DcdWriter<S> {
    /// Wraps a caller-owned stream with the default configuration.
    ///
    /// The stream should be empty; the header is written at its start and
    /// frames are appended at its end. Use [`into_inner`](Self::into_inner) to
    /// take it back.
    pub fn from_stream(stream: S) -> Self {
        Self::with_config(stream, &WriterConfig::default())
    }

    pub fn with_config(stream: S, config: &WriterConfig) -> Self {
        let header = DcdHeader {
            natoms: 0,
            nsteps: config.expected_frames.unwrap_or(0),
            timestep: config.timestep,
            has_box: false,
            titles: config.titles.iter().map(|t| Title::from(t.as_str())).collect(),
        };
        Self {
            stream,
            header,
            current: 0,
            header_written: false,
        }
    }

    /// Sets the pending header fields.
    ///
    /// # Errors
    ///
    /// Returns [`StateErrorKind::HeaderAlreadyWritten`] once the header has
    /// been written, explicitly or by a frame write, and
    /// [`ConsistencyErrorKind::TooManyAtoms`] above [`MAX_ATOMS`].
    pub fn set_header(
        &mut self,
        natoms: u32,
        nsteps: u32,
        timestep: f64,
        has_box: bool,
    ) -> Result<(), DcdError> {
        self.ensure_header_pending()?;
        if natoms > MAX_ATOMS {
            return Err(DcdError::Consistency(ConsistencyErrorKind::TooManyAtoms(
                natoms as usize,
            )));
        }
        self.header.natoms = natoms;
        self.header.nsteps = nsteps;
        self.header.timestep = timestep;
        self.header.has_box = has_box;
        Ok(())
    }

    pub fn set_titles<I, T>(&mut self, titles: I) -> Result<(), DcdError>
    where
        I: IntoIterator<Item = T>,
        T: Into<Title>,
    {
        self.ensure_header_pending()?;
        self.header.titles = titles.into_iter().map(Into::into).collect();
        Ok(())
    }

    /// Replaces all titles with `title`.
    pub fn set_title(&mut self, title: impl Into<Title>) -> Result<(), DcdError> {
        self.ensure_header_pending()?;
        self.header.titles.clear();
        self.header.titles.push(title.into());
        Ok(())
    }

    pub fn add_title(&mut self, title: impl Into<Title>) -> Result<(), DcdError> {
        self.ensure_header_pending()?;
        self.header.titles.push(title.into());
        Ok(())
    }

    /// Writes the header records at the start of the stream.
    ///
    /// # Errors
    ///
    /// Fails with a state error if the header was already written or if the
    /// stream is not positioned at its start.
    pub fn write_header(&mut self) -> Result<(), DcdError> {
        self.ensure_header_pending()?;
        let position = self.stream.stream_position()?;
        if position != 0 {
            return Err(DcdError::State(StateErrorKind::HeaderNotAtStart { position }));
        }
        header::write_header(&mut self.stream, &self.header)?;
        self.stream.flush()?;
        self.header_written = true;
        debug!(
            natoms = self.header.natoms,
            nsteps = self.header.nsteps,
            "Wrote trajectory header."
        );
        Ok(())
    }

    /// Appends one frame, growing the header if needed, and flushes.
    ///
    /// # Errors
    ///
    /// Returns a consistency error, without writing anything, if the frame's
    /// atom count differs from the trajectory's or if the trajectory carries a
    /// periodic box and the frame does not. I/O failures are returned as
    /// [`DcdError::Io`]; a failure while rewriting the header leaves the file
    /// unusable.
    pub fn write_frame<F: CoordinateFrame + ?Sized>(&mut self, frame: &F) -> Result<(), DcdError> {
        let natoms = checked_atom_count(frame)?;

        let adopted = self.header.natoms == 0;
        if adopted {
            self.header.natoms = natoms;
            self.header.has_box = frame.is_periodic();
            debug!(
                natoms,
                has_box = self.header.has_box,
                "Trajectory shape taken from the first frame."
            );
        } else {
            if natoms != self.header.natoms {
                return Err(DcdError::Consistency(
                    ConsistencyErrorKind::AtomCountMismatch {
                        expected: self.header.natoms,
                        actual: frame.atom_count(),
                    },
                ));
            }
            if self.header.has_box && !frame.is_periodic() {
                return Err(DcdError::Consistency(
                    ConsistencyErrorKind::MissingPeriodicBox,
                ));
            }
        }

        if self.current >= self.header.nsteps {
            let declared = self.header.nsteps;
            self.header.nsteps = declared.checked_add(1).ok_or(DcdError::Consistency(
                ConsistencyErrorKind::TooManyFrames(u64::from(declared)),
            ))?;
            self.rewrite_header()?;
        } else if adopted || !self.header_written {
            self.rewrite_header()?;
        }

        frame::write_frame(&mut self.stream, frame, self.header.natoms, self.header.has_box)?;
        self.stream.flush()?;
        self.current += 1;
        trace!(frame = self.current, "Wrote trajectory frame.");
        Ok(())
    }

    /// Writes each frame in order, stopping at the first failure.
    ///
    /// Frames before the failing one stay written.
    pub fn write_frames<I>(&mut self, frames: I) -> Result<(), DcdError>
    where
        I: IntoIterator,
        I::Item: CoordinateFrame,
    {
        for frame in frames {
            self.write_frame(&frame)?;
        }
        Ok(())
    }

    fn rewrite_header(&mut self) -> Result<(), DcdError> {
        self.stream.seek(SeekFrom::Start(0))?;
        header::write_header(&mut self.stream, &self.header)?;
        self.stream.seek(SeekFrom::End(0))?;
        self.header_written = true;
        debug!(nsteps = self.header.nsteps, "Rewrote trajectory header.");
        Ok(())
    }

    fn ensure_header_pending(&self) -> Result<(), DcdError> {
        if self.header_written {
            Err(DcdError::State(StateErrorKind::HeaderAlreadyWritten))
        } else {
            Ok(())
        }
    }

    pub fn frames_written(&self) -> u32 {
        self.current
    }

    pub fn header(&self) -> &DcdHeader {
        &self.header
    }

    pub fn natoms(&self) -> u32 {
        self.header.natoms
    }

    /// Frame count currently declared in the header.
    pub fn nsteps(&self) -> u32 {
        self.header.nsteps
    }

    pub fn timestep(&self) -> f64 {
        self.header.timestep
    }

    pub fn has_box(&self) -> bool {
        self.header.has_box
    }

    pub fn titles(&self) -> &[Title] {
        &self.header.titles
    }

    pub fn is_header_written(&self) -> bool {
        self.header_written
    }

    pub fn flush(&mut self) -> Result<(), DcdError> {
        self.stream.flush()?;
        Ok(())
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Flushes and returns the underlying stream without closing it.
    pub fn into_inner(mut self) -> Result<S, DcdError> {
        self.stream.flush()?;
        Ok(self.stream)
    }

    /// Flushes and releases the stream.
    pub fn close(self) -> Result<(), DcdError> {
        self.into_inner().map(drop)
    }
}

fn checked_atom_count<F: CoordinateFrame + ?Sized>(frame: &F) -> Result<u32, DcdError> {
    let count = frame.atom_count();
    if count == 0 {
        return Err(DcdError::Consistency(ConsistencyErrorKind::EmptyFrame));
    }
    u32::try_from(count)
        .ok()
        .filter(|&n| n <= MAX_ATOMS)
        .ok_or(DcdError::Consistency(ConsistencyErrorKind::TooManyAtoms(count)))
}
