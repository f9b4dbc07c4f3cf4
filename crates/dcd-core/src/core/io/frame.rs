//! Encoding and decoding of a single trajectory frame.
//!
//! ```text
//! [ unit cell: 6 x f64 (a, 90, b, 90, 90, c) ]   only when the trajectory has a box
//! [ X: natoms x f32 ]
//! [ Y: natoms x f32 ]
//! [ Z: natoms x f32 ]
//! ```

use super::error::DcdError;
use super::record::{self, framed_len};
use crate::core::models::frame::{CoordinateFrame, Frame};
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use nalgebra::{Point3, Vector3};
use std::io::{Read, Write};

/// Angle written for every unit-cell angle; only orthorhombic boxes are stored.
pub const DEFAULT_UNIT_CELL_ANGLE: f64 = 90.0;

/// Payload size of the unit-cell record.
pub const UNIT_CELL_LEN: usize = 6 * 8;

/// On-disk size of one frame.
pub fn frame_len(natoms: u32, has_box: bool) -> u64 {
    let cell = if has_box {
        framed_len(UNIT_CELL_LEN as u64)
    } else {
        0
    };
    cell + 3 * framed_len(u64::from(natoms) * 4)
}

/// Writes the records of one frame.
///
/// The caller is responsible for having validated the frame: `frame` must hold
/// at least `natoms` atoms and, when `has_box` is set, a periodic box. Any box
/// on a frame written without `has_box` is dropped.
pub fn write_frame<W, F>(
    writer: &mut W,
    frame: &F,
    natoms: u32,
    has_box: bool,
) -> Result<(), DcdError>
where
    W: Write + ?Sized,
    F: CoordinateFrame + ?Sized,
{
    if has_box {
        let dims = frame.periodic_box().unwrap_or_else(Vector3::zeros);
        write_unit_cell(writer, &dims)?;
    }

    let n = natoms as usize;
    let mut axis: Vec<u8> = Vec::with_capacity(n * 4);
    for component in 0..3 {
        axis.clear();
        for i in 0..n {
            axis.write_f32::<LittleEndian>(frame.coord(i)[component])?;
        }
        record::write_record(writer, &axis)?;
    }
    Ok(())
}

fn write_unit_cell<W: Write + ?Sized>(writer: &mut W, dims: &Vector3<f64>) -> Result<(), DcdError> {
    let cell = [
        dims.x,
        DEFAULT_UNIT_CELL_ANGLE,
        dims.y,
        DEFAULT_UNIT_CELL_ANGLE,
        DEFAULT_UNIT_CELL_ANGLE,
        dims.z,
    ];
    let mut buf = [0u8; UNIT_CELL_LEN];
    LittleEndian::write_f64_into(&cell, &mut buf);
    record::write_record(writer, &buf)
}

/// Reads the records of one frame.
pub fn read_frame<R: Read + ?Sized>(
    reader: &mut R,
    natoms: u32,
    has_box: bool,
) -> Result<Frame, DcdError> {
    let periodic_box = if has_box {
        let payload = record::read_record_exact(reader, "unit-cell", UNIT_CELL_LEN)?;
        let mut cell = [0f64; 6];
        LittleEndian::read_f64_into(&payload, &mut cell);
        Some(Vector3::new(cell[0], cell[2], cell[5]))
    } else {
        None
    };

    let n = natoms as usize;
    let mut axes: [Vec<f32>; 3] = [Vec::new(), Vec::new(), Vec::new()];
    for (axis, name) in axes.iter_mut().zip(["x", "y", "z"]) {
        let payload = record::read_record_exact(reader, name, n * 4)?;
        axis.resize(n, 0f32);
        LittleEndian::read_f32_into(&payload, axis);
    }

    let [xs, ys, zs] = axes;
    let coords = xs
        .into_iter()
        .zip(ys)
        .zip(zs)
        .map(|((x, y), z)| Point3::new(x, y, z))
        .collect();
    Ok(Frame {
        coords,
        periodic_box,
    })
}
