//! Fortran unformatted "blocked record" framing.
//!
//! Every structure in a DCD file is stored as `u32(len) || payload || u32(len)`,
//! little endian. The helpers here are the only place that knows about that
//! framing; header and frame codecs deal in payloads.

use super::error::{DcdError, FormatErrorKind};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

/// Number of framing bytes surrounding every record payload.
pub const RECORD_OVERHEAD: u64 = 8;

/// Returns the on-disk size of a record holding `payload_len` bytes.
pub const fn framed_len(payload_len: u64) -> u64 {
    payload_len + RECORD_OVERHEAD
}

/// Appends one record to `writer`.
///
/// # Errors
///
/// Returns [`DcdError::Io`] if the payload is longer than a 32-bit length field
/// can describe or if the underlying writer fails.
pub fn write_record<W: Write + ?Sized>(writer: &mut W, payload: &[u8]) -> Result<(), DcdError> {
    let len = u32::try_from(payload.len()).map_err(|_| {
        DcdError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("record payload of {} bytes exceeds u32 range", payload.len()),
        ))
    })?;
    writer.write_u32::<LittleEndian>(len)?;
    writer.write_all(payload)?;
    writer.write_u32::<LittleEndian>(len)?;
    Ok(())
}

/// Reads one record from `reader` and returns its payload.
///
/// # Errors
///
/// Returns [`FormatErrorKind::TruncatedRecord`] if the stream ends before the
/// trailing length field, and [`FormatErrorKind::RecordLengthMismatch`] if the
/// two length fields disagree.
pub fn read_record<R: Read + ?Sized>(reader: &mut R) -> Result<Vec<u8>, DcdError> {
    let leading = reader
        .read_u32::<LittleEndian>()
        .map_err(DcdError::from_read)?;

    // A corrupt length must not turn into a huge up-front allocation.
    let mut payload = Vec::new();
    Read::take(&mut *reader, u64::from(leading))
        .read_to_end(&mut payload)
        .map_err(DcdError::from_read)?;
    if payload.len() as u64 != u64::from(leading) {
        return Err(DcdError::Format(FormatErrorKind::TruncatedRecord));
    }

    let trailing = reader
        .read_u32::<LittleEndian>()
        .map_err(DcdError::from_read)?;
    if leading != trailing {
        return Err(DcdError::Format(FormatErrorKind::RecordLengthMismatch {
            leading,
            trailing,
        }));
    }
    Ok(payload)
}

/// Reads one record and checks that its payload has exactly `expected` bytes.
pub(crate) fn read_record_exact<R: Read + ?Sized>(
    reader: &mut R,
    record: &'static str,
    expected: usize,
) -> Result<Vec<u8>, DcdError> {
    let payload = read_record(reader)?;
    if payload.len() != expected {
        return Err(DcdError::Format(FormatErrorKind::UnexpectedRecordLength {
            record,
            expected,
            actual: payload.len(),
        }));
    }
    Ok(payload)
}
