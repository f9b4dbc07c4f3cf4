//! Complete procedures built on the reader and writer sessions.
//!
//! Each workflow exposes a single `run` function. [`concat`] copies frames from
//! several trajectories into one, optionally appending to an existing output,
//! and [`inspect`] summarizes a trajectory file without loading its frames.

pub mod concat;
pub mod inspect;
