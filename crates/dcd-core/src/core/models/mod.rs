//! Data models shared by the trajectory codecs.
//!
//! - [`header`] - Decoded trajectory metadata and header constants
//! - [`frame`] - Coordinate frames and the [`frame::CoordinateFrame`] trait that
//!   lets external structure models feed the writer directly

pub mod frame;
pub mod header;
