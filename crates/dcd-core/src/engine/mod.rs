//! # Engine Module
//!
//! Stateful trajectory sessions built on the stateless codecs in
//! [`crate::core`].
//!
//! ## Architecture
//!
//! - **Writing** ([`writer`]) - `DcdWriter`, which tracks declared and written
//!   frame counts, grows the header in place, enforces atom-count and box
//!   consistency, and resumes existing files
//! - **Reading** ([`reader`]) - Header recovery and sequential or random frame
//!   access through `DcdReader`
//! - **Configuration** ([`config`]) - Writer and concatenation settings with
//!   validating builders
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress reporting
//!   for long-running workflows

pub mod config;
pub mod progress;
pub mod reader;
pub mod writer;
