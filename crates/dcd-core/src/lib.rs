//! # dcdkit Core Library
//!
//! Reading, writing, and incrementally growing molecular-dynamics trajectories
//! stored in the DCD format: Fortran unformatted, length-prefixed binary
//! records holding a fixed header followed by one coordinate frame per time
//! sample.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`DcdHeader`, `Frame`)
//!   and the byte-exact codecs for records, headers, and frames.
//!
//! - **[`engine`]: The Session Layer.** `DcdWriter` tracks declared and written
//!   frame counts, rewrites the header in place as a file grows, validates every
//!   frame against the trajectory's atom count and periodicity, and resumes
//!   writing onto existing files. `DcdReader` recovers headers and iterates
//!   frames.
//!
//! - **[`workflows`]: The Public API.** Complete procedures such as
//!   concatenating trajectories or summarizing a file, used by the command-line
//!   tool.
//!
//! ## Example
//!
//! ```no_run
//! use dcdkit::core::models::frame::Frame;
//! use dcdkit::engine::writer::DcdWriter;
//! use nalgebra::Point3;
//!
//! # fn main() -> Result<(), dcdkit::core::io::error::DcdError> {
//! let mut writer = DcdWriter::create("out.dcd")?;
//! for step in 0..10 {
//!     let frame = Frame::new(vec![Point3::new(step as f32, 0.0, 0.0); 3]);
//!     writer.write_frame(&frame)?;
//! }
//! assert_eq!(writer.frames_written(), 10);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod engine;
pub mod workflows;
