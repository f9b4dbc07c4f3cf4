use crate::core::io::error::{DcdError, FormatErrorKind};
use crate::core::io::header::{self, ControlBlock, MIN_HEADER_LEN};
use crate::core::io::frame;
use crate::core::models::frame::Frame;
use crate::core::models::header::DcdHeader;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, warn};

/// Decodes the header at the current position of `stream` without touching
/// any frame records.
///
/// On success the stream is left positioned at the first frame.
///
/// # Errors
///
/// Returns [`FormatErrorKind::FileTooShort`] if fewer bytes than the smallest
/// possible header remain, and any other format error raised while decoding
/// the header records.
pub fn read_header<R: Read + Seek + ?Sized>(stream: &mut R) -> Result<DcdHeader, DcdError> {
    read_header_and_control(stream).map(|(header, _)| header)
}

/// Convenience wrapper around [`read_header`] for a file on disk.
pub fn read_header_from_path<P: AsRef<Path>>(path: P) -> Result<DcdHeader, DcdError> {
    let mut reader = BufReader::new(File::open(path)?);
    read_header(&mut reader)
}

fn read_header_and_control<R: Read + Seek + ?Sized>(
    stream: &mut R,
) -> Result<(DcdHeader, ControlBlock), DcdError> {
    let start = stream.stream_position()?;
    let end = stream.seek(SeekFrom::End(0))?;
    stream.seek(SeekFrom::Start(start))?;

    let available = end.saturating_sub(start);
    if available < MIN_HEADER_LEN {
        return Err(DcdError::Format(FormatErrorKind::FileTooShort {
            length: available,
            minimum: MIN_HEADER_LEN,
        }));
    }
    header::read_header(stream)
}

/// Sequential and random access to the frames of a DCD trajectory.
///
/// The number of frames is derived from the stream length rather than trusted
/// from the header, so a file whose header was never updated can still be read
/// in full.
pub struct DcdReader<R: Read + Seek> {
    stream: R,
    header: DcdHeader,
    control: ControlBlock,
    first_frame_offset: u64,
    frame_size: u64,
    frame_count: u64,
    next_frame: u64,
}

impl DcdReader<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DcdError> {
        let path = path.as_ref();
        debug!("Opening trajectory {:?} for reading.", path);
        Self::new(BufReader::new(File::open(path)?))
    }
}

impl<R: Read + Seek> DcdReader<R> {
    /// Decodes the header at the start of `stream` and indexes its frames.
    ///
    /// # Errors
    ///
    /// Fails with a format error if the header is invalid or if the bytes after
    /// it do not divide into whole frames.
    pub fn new(mut stream: R) -> Result<Self, DcdError> {
        stream.seek(SeekFrom::Start(0))?;
        let (header, control) = read_header_and_control(&mut stream)?;
        let first_frame_offset = stream.stream_position()?;
        let end = stream.seek(SeekFrom::End(0))?;
        stream.seek(SeekFrom::Start(first_frame_offset))?;

        let frame_size = frame::frame_len(header.natoms, header.has_box);
        let body = end - first_frame_offset;
        if body % frame_size != 0 {
            return Err(DcdError::Format(FormatErrorKind::PartialFrame {
                trailing: body % frame_size,
                frame_size,
            }));
        }
        let frame_count = body / frame_size;
        if frame_count != u64::from(header.nsteps) {
            warn!(
                declared = header.nsteps,
                actual = frame_count,
                "Trajectory header frame count disagrees with the file size; using the file size."
            );
        }
        debug!(
            natoms = header.natoms,
            frames = frame_count,
            has_box = header.has_box,
            "Decoded trajectory header."
        );

        Ok(Self {
            stream,
            header,
            control,
            first_frame_offset,
            frame_size,
            frame_count,
            next_frame: 0,
        })
    }

    pub fn header(&self) -> &DcdHeader {
        &self.header
    }

    /// The raw control block, including bookkeeping words not surfaced in
    /// [`DcdHeader`].
    pub fn control(&self) -> &ControlBlock {
        &self.control
    }

    pub fn natoms(&self) -> u32 {
        self.header.natoms
    }

    /// On-disk size of one frame in bytes.
    pub fn frame_size(&self) -> u64 {
        self.frame_size
    }

    /// Number of whole frames present in the stream.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Index of the frame the next [`read_frame`](Self::read_frame) returns.
    pub fn position(&self) -> u64 {
        self.next_frame
    }

    /// Reads the next frame, or `None` once every frame has been read.
    pub fn read_frame(&mut self) -> Result<Option<Frame>, DcdError> {
        if self.next_frame >= self.frame_count {
            return Ok(None);
        }
        let frame = frame::read_frame(&mut self.stream, self.header.natoms, self.header.has_box)?;
        self.next_frame += 1;
        Ok(Some(frame))
    }

    /// Positions the reader so the next read returns frame `index`.
    ///
    /// Seeking to `frame_count()` is allowed and leaves the reader exhausted.
    pub fn seek_frame(&mut self, index: u64) -> Result<(), DcdError> {
        if index > self.frame_count {
            return Err(DcdError::Format(FormatErrorKind::FrameOutOfRange {
                index,
                count: self.frame_count,
            }));
        }
        self.stream
            .seek(SeekFrom::Start(self.first_frame_offset + index * self.frame_size))?;
        self.next_frame = index;
        Ok(())
    }

    /// Iterates over the remaining frames.
    pub fn frames(&mut self) -> Frames<'_, R> {
        Frames { reader: self }
    }

    /// Reads every frame from the start of the trajectory.
    pub fn read_all(&mut self) -> Result<Vec<Frame>, DcdError> {
        self.seek_frame(0)?;
        self.frames().collect()
    }

    pub fn into_inner(self) -> R {
        self.stream
    }
}

pub struct Frames<'r, R: Read + Seek> {
    reader: &'r mut DcdReader<R>,
}

impl<R: Read + Seek> Iterator for Frames<'_, R> {
    type Item = Result<Frame, DcdError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read_frame().transpose()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.reader.frame_count - self.reader.next_frame) as usize;
        (0, Some(remaining))
    }
}
