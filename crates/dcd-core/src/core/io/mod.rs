//! Binary codecs for the DCD trajectory format.
//!
//! The layout is built from Fortran unformatted "blocked records"
//! ([`record`]). A file starts with three header records ([`header`]) followed
//! by one group of records per frame ([`frame`]). All integers and floats are
//! little endian.

pub mod error;
pub mod frame;
pub mod header;
pub mod record;
