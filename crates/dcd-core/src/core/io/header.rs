//! Encoding and decoding of the three DCD header records.
//!
//! ```text
//! [ control record: 84 bytes = 21 words ]
//! [ title record:   u32 count, count x 80-byte titles ]
//! [ atom record:    u32 natoms ]
//! ```
//!
//! The control block packs unrelated fields (a magic tag, counters and a float
//! timestep) into one array of 32-bit words. [`ControlBlock`] gives each word a
//! name and is converted to and from bytes at fixed offsets.

use super::error::{DcdError, FormatErrorKind};
use super::record::{self, framed_len};
use crate::core::models::header::{DcdHeader, TITLE_WIDTH, Title};
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use std::io::{Read, Write};

/// Magic tag stored in the first word of a coordinate trajectory.
pub const MAGIC: [u8; 4] = *b"CORD";

/// Version word written in the last slot of the control block.
pub const CHARMM_VERSION: u32 = 27;

/// Payload size of the control record.
pub const CONTROL_BLOCK_LEN: usize = 84;

/// Smallest possible header: control record, an empty title record and the
/// atom-count record.
pub const MIN_HEADER_LEN: u64 =
    framed_len(CONTROL_BLOCK_LEN as u64) + framed_len(4) + framed_len(4);

mod offsets {
    pub const MAGIC: usize = 0;
    pub const NSTEPS: usize = 4;
    pub const FIRST_STEP: usize = 8;
    pub const SAVE_INTERVAL: usize = 12;
    pub const TOTAL_STEPS: usize = 16;
    pub const DEGREES_OF_FREEDOM: usize = 32;
    pub const FIXED_ATOMS: usize = 36;
    pub const TIMESTEP: usize = 40;
    pub const HAS_BOX: usize = 44;
    pub const VERSION: usize = 80;
}

/// Named view of the 84-byte control record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlBlock {
    pub magic: [u8; 4],
    /// Declared number of frames.
    pub nsteps: u32,
    pub first_step: u32,
    pub save_interval: u32,
    /// Legacy duplicate of `nsteps`.
    pub total_steps: u32,
    pub degrees_of_freedom: i32,
    pub fixed_atoms: u32,
    pub timestep: f32,
    pub has_box: bool,
    pub version: u32,
}

impl ControlBlock {
    /// Builds the control block written for `header`.
    pub fn for_header(header: &DcdHeader) -> Self {
        Self {
            magic: MAGIC,
            nsteps: header.nsteps,
            first_step: 1,
            save_interval: 1,
            total_steps: header.nsteps,
            degrees_of_freedom: degrees_of_freedom(header.natoms),
            fixed_atoms: 0,
            timestep: header.timestep as f32,
            has_box: header.has_box,
            version: CHARMM_VERSION,
        }
    }

    pub fn to_bytes(&self) -> [u8; CONTROL_BLOCK_LEN] {
        let mut buf = [0u8; CONTROL_BLOCK_LEN];
        buf[offsets::MAGIC..offsets::MAGIC + 4].copy_from_slice(&self.magic);
        LittleEndian::write_u32(&mut buf[offsets::NSTEPS..], self.nsteps);
        LittleEndian::write_u32(&mut buf[offsets::FIRST_STEP..], self.first_step);
        LittleEndian::write_u32(&mut buf[offsets::SAVE_INTERVAL..], self.save_interval);
        LittleEndian::write_u32(&mut buf[offsets::TOTAL_STEPS..], self.total_steps);
        LittleEndian::write_i32(
            &mut buf[offsets::DEGREES_OF_FREEDOM..],
            self.degrees_of_freedom,
        );
        LittleEndian::write_u32(&mut buf[offsets::FIXED_ATOMS..], self.fixed_atoms);
        LittleEndian::write_f32(&mut buf[offsets::TIMESTEP..], self.timestep);
        LittleEndian::write_u32(&mut buf[offsets::HAS_BOX..], u32::from(self.has_box));
        LittleEndian::write_u32(&mut buf[offsets::VERSION..], self.version);
        buf
    }

    /// Decodes a control record payload.
    ///
    /// # Errors
    ///
    /// Returns a format error if the payload is not 84 bytes or does not start
    /// with the `CORD` tag.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, DcdError> {
        if buf.len() != CONTROL_BLOCK_LEN {
            return Err(DcdError::Format(FormatErrorKind::UnexpectedRecordLength {
                record: "control",
                expected: CONTROL_BLOCK_LEN,
                actual: buf.len(),
            }));
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&buf[offsets::MAGIC..offsets::MAGIC + 4]);
        if magic != MAGIC {
            return Err(DcdError::Format(FormatErrorKind::BadMagic { found: magic }));
        }
        Ok(Self {
            magic,
            nsteps: LittleEndian::read_u32(&buf[offsets::NSTEPS..]),
            first_step: LittleEndian::read_u32(&buf[offsets::FIRST_STEP..]),
            save_interval: LittleEndian::read_u32(&buf[offsets::SAVE_INTERVAL..]),
            total_steps: LittleEndian::read_u32(&buf[offsets::TOTAL_STEPS..]),
            degrees_of_freedom: LittleEndian::read_i32(&buf[offsets::DEGREES_OF_FREEDOM..]),
            fixed_atoms: LittleEndian::read_u32(&buf[offsets::FIXED_ATOMS..]),
            timestep: LittleEndian::read_f32(&buf[offsets::TIMESTEP..]),
            has_box: LittleEndian::read_u32(&buf[offsets::HAS_BOX..]) != 0,
            version: LittleEndian::read_u32(&buf[offsets::VERSION..]),
        })
    }
}

/// Largest atom count whose degrees of freedom fit the signed control word.
pub const MAX_ATOMS: u32 = 715_827_884;

/// `3 * natoms - 6`, saturated to the signed 32-bit word it is stored in.
///
/// Writers reject atom counts above [`MAX_ATOMS`], so saturation only applies
/// to headers built by hand.
pub fn degrees_of_freedom(natoms: u32) -> i32 {
    let dof = i64::from(natoms) * 3 - 6;
    i32::try_from(dof).unwrap_or(i32::MAX)
}

/// Pads `title` with spaces or truncates it to exactly `width` bytes.
///
/// Truncation is byte based, so a multi-byte character straddling the limit
/// is cut.
pub fn fix_string_size(title: &[u8], width: usize) -> Vec<u8> {
    let mut bytes: Vec<u8> = title.iter().copied().take(width).collect();
    bytes.resize(width, b' ');
    bytes
}

/// On-disk size of the header records for `title_count` titles.
pub fn header_len(title_count: usize) -> u64 {
    MIN_HEADER_LEN + (title_count * TITLE_WIDTH) as u64
}

/// Writes the control, title and atom-count records for `header`.
pub fn write_header<W: Write + ?Sized>(writer: &mut W, header: &DcdHeader) -> Result<(), DcdError> {
    let control = ControlBlock::for_header(header);
    record::write_record(writer, &control.to_bytes())?;

    let count = u32::try_from(header.titles.len()).map_err(|_| {
        DcdError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} titles do not fit the title count word", header.titles.len()),
        ))
    })?;
    let mut titles: Vec<u8> = Vec::with_capacity(4 + TITLE_WIDTH * header.titles.len());
    titles.write_u32::<LittleEndian>(count)?;
    for title in &header.titles {
        titles.extend_from_slice(&fix_string_size(title.as_bytes(), TITLE_WIDTH));
    }
    record::write_record(writer, &titles)?;

    record::write_record(writer, &header.natoms.to_le_bytes())?;
    Ok(())
}

/// Reads the three header records, returning the decoded header together with
/// the raw control block.
pub fn read_header<R: Read + ?Sized>(reader: &mut R) -> Result<(DcdHeader, ControlBlock), DcdError> {
    let control = ControlBlock::from_bytes(&record::read_record(reader)?)?;
    let titles = decode_titles(&record::read_record(reader)?)?;
    let natoms = LittleEndian::read_u32(&record::read_record_exact(reader, "atom-count", 4)?);

    let header = DcdHeader {
        natoms,
        nsteps: control.nsteps,
        timestep: f64::from(control.timestep),
        has_box: control.has_box,
        titles,
    };
    Ok((header, control))
}

fn decode_titles(payload: &[u8]) -> Result<Vec<Title>, DcdError> {
    if payload.len() < 4 || (payload.len() - 4) % TITLE_WIDTH != 0 {
        return Err(DcdError::Format(FormatErrorKind::InvalidTitleBlock {
            length: payload.len(),
        }));
    }
    let declared = LittleEndian::read_u32(&payload[..4]);
    let blocks = &payload[4..];
    let actual = blocks.len() / TITLE_WIDTH;
    if declared as usize != actual {
        return Err(DcdError::Format(FormatErrorKind::TitleCountMismatch {
            declared,
            actual,
        }));
    }
    Ok(blocks
        .chunks_exact(TITLE_WIDTH)
        .map(Title::from_bytes)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_header() -> DcdHeader {
        let mut header = DcdHeader::new(10, 5, 0.002, true);
        header.titles = vec!["first".into(), "second".into()];
        header
    }

    fn encode(header: &DcdHeader) -> Vec<u8> {
        let mut buf = Vec::new();
        write_header(&mut buf, header).unwrap();
        buf
    }

    #[test]
    fn control_block_words_are_at_fixed_offsets() {
        let buf = encode(&sample_header());
        let words: Vec<u32> = buf[4..88]
            .chunks_exact(4)
            .map(LittleEndian::read_u32)
            .collect();

        assert_eq!(&buf[4..8], b"CORD");
        assert_eq!(words[1], 5);
        assert_eq!(words[2], 1);
        assert_eq!(words[3], 1);
        assert_eq!(words[4], 5);
        assert_eq!(words[8], 24);
        assert_eq!(words[9], 0);
        assert_eq!(f32::from_bits(words[10]), 0.002f32);
        assert_eq!(words[11], 1);
        assert_eq!(words[20], CHARMM_VERSION);
        assert!(words[12..20].iter().all(|&w| w == 0));
    }

    #[test]
    fn header_has_expected_total_length() {
        let header = sample_header();
        let buf = encode(&header);
        assert_eq!(buf.len() as u64, header_len(2));
        assert_eq!(header_len(0), 116);
        assert_eq!(&buf[buf.len() - 12..], &[4, 0, 0, 0, 10, 0, 0, 0, 4, 0, 0, 0]);
    }

    #[test]
    fn degrees_of_freedom_go_negative_for_tiny_systems() {
        let control = ControlBlock::for_header(&DcdHeader::new(1, 0, 0.001, false));
        assert_eq!(control.degrees_of_freedom, -3);
        let decoded = ControlBlock::from_bytes(&control.to_bytes()).unwrap();
        assert_eq!(decoded.degrees_of_freedom, -3);
    }

    #[test]
    fn read_header_recovers_written_fields() {
        let header = sample_header();
        let (decoded, control) = read_header(&mut Cursor::new(encode(&header))).unwrap();

        assert_eq!(decoded.natoms, 10);
        assert_eq!(decoded.nsteps, 5);
        assert_eq!(decoded.timestep, f64::from(0.002f32));
        assert!(decoded.has_box);
        assert_eq!(decoded.titles.len(), 2);
        assert_eq!(decoded.titles[0], format!("{:<80}", "first"));
        assert_eq!(control.total_steps, 5);
        assert_eq!(control.version, CHARMM_VERSION);
    }

    #[test]
    fn short_titles_are_space_padded() {
        let mut header = sample_header();
        header.titles = vec!["abc".into()];
        let (decoded, _) = read_header(&mut Cursor::new(encode(&header))).unwrap();
        let title = decoded.titles[0].as_bytes();
        assert_eq!(title.len(), 80);
        assert!(title.starts_with(b"abc"));
        assert_eq!(title.iter().skip(3).filter(|&&b| b == b' ').count(), 77);
    }

    #[test]
    fn long_titles_are_truncated_to_eighty_bytes() {
        let long: String = (0..85).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let mut header = sample_header();
        header.titles = vec![long.clone().into()];
        let (decoded, _) = read_header(&mut Cursor::new(encode(&header))).unwrap();
        assert_eq!(decoded.titles[0], long[..80]);
    }

    #[test]
    fn fix_string_size_handles_exact_width() {
        let exact = "x".repeat(80);
        assert_eq!(fix_string_size(exact.as_bytes(), 80), exact.as_bytes());
        assert_eq!(fix_string_size(b"", 4), b"    ");
    }

    #[test]
    fn non_utf8_title_bytes_round_trip_exactly() {
        let mut raw = vec![b'C', 0xE9, b'!'];
        raw.resize(TITLE_WIDTH, b' ');
        let mut cut = "a".repeat(79).into_bytes();
        cut.push(0xC3);

        let mut header = sample_header();
        header.titles = vec![Title::from_bytes(raw.clone()), Title::from_bytes(cut.clone())];
        let buf = encode(&header);
        assert_eq!(&buf[100..180], raw.as_slice());

        let (decoded, _) = read_header(&mut Cursor::new(buf.clone())).unwrap();
        assert_eq!(decoded.titles[0].as_bytes(), raw.as_slice());
        assert_eq!(decoded.titles[1].as_bytes(), cut.as_slice());
        assert_eq!(encode(&decoded), buf);
    }

    #[test]
    fn degrees_of_freedom_saturate_for_huge_systems() {
        assert_eq!(degrees_of_freedom(3), 3);
        assert_eq!(degrees_of_freedom(MAX_ATOMS), i32::MAX - 1);
        assert_eq!(degrees_of_freedom(MAX_ATOMS + 1), i32::MAX);
        assert_eq!(degrees_of_freedom(u32::MAX), i32::MAX);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut buf = encode(&sample_header());
        buf[4..8].copy_from_slice(b"VELD");
        let err = read_header(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(
            err,
            DcdError::Format(FormatErrorKind::BadMagic { found }) if &found == b"VELD"
        ));
    }

    #[test]
    fn control_record_of_wrong_size_is_rejected() {
        let mut buf = Vec::new();
        record::write_record(&mut buf, &[0u8; 80]).unwrap();
        let err = read_header(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(
            err,
            DcdError::Format(FormatErrorKind::UnexpectedRecordLength {
                record: "control",
                ..
            })
        ));
    }

    #[test]
    fn title_block_that_is_not_whole_titles_is_rejected() {
        let mut buf = Vec::new();
        record::write_record(&mut buf, &ControlBlock::for_header(&sample_header()).to_bytes())
            .unwrap();
        let mut titles = vec![1, 0, 0, 0];
        titles.extend_from_slice(&[b' '; 79]);
        record::write_record(&mut buf, &titles).unwrap();
        record::write_record(&mut buf, &10u32.to_le_bytes()).unwrap();

        let err = read_header(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(
            err,
            DcdError::Format(FormatErrorKind::InvalidTitleBlock { length: 83 })
        ));
    }

    #[test]
    fn title_count_disagreeing_with_block_is_rejected() {
        let mut titles = vec![3, 0, 0, 0];
        titles.extend_from_slice(&[b' '; 160]);
        let err = decode_titles(&titles).unwrap_err();
        assert!(matches!(
            err,
            DcdError::Format(FormatErrorKind::TitleCountMismatch {
                declared: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn zero_titles_round_trip() {
        let mut header = sample_header();
        header.titles.clear();
        let (decoded, _) = read_header(&mut Cursor::new(encode(&header))).unwrap();
        assert!(decoded.titles.is_empty());
    }
}
