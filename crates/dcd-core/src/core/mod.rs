//! # Core Module
//!
//! The stateless foundation of the library: trajectory data models and the
//! binary codecs that map them onto the DCD byte layout.
//!
//! ## Architecture
//!
//! - **Data Models** ([`models`]) - Decoded headers, coordinate frames, and the
//!   [`CoordinateFrame`](models::frame::CoordinateFrame) trait through which
//!   external structure models are written
//! - **Binary I/O** ([`io`]) - Record framing, header and frame codecs, and the
//!   error taxonomy shared by the whole crate
//!
//! Nothing in this module keeps state between calls; sessions that track frame
//! counts and header rewrites live in [`crate::engine`].

pub mod io;
pub mod models;
