use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;

/// Width in bytes of every title stored in a DCD header.
pub const TITLE_WIDTH: usize = 80;

/// Title seeded into freshly created trajectories that were given none.
pub const DEFAULT_TITLE: &str = "AUTO GENERATED";

/// Timestep used when the caller never configures one.
pub const DEFAULT_TIMESTEP: f64 = 0.001;

/// One title line of a DCD header.
///
/// Titles are kept as raw bytes. Files from other programs may hold Latin-1 or
/// otherwise non-UTF-8 text, and a title cut at 80 bytes may end inside a
/// multi-byte character, so text is only decoded (lossily) for display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Title(Vec<u8>);

impl Title {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }

    /// Display text without the fixed-width space padding.
    pub fn trimmed(&self) -> Cow<'_, str> {
        let end = self.0.iter().rposition(|&b| b != b' ').map_or(0, |i| i + 1);
        String::from_utf8_lossy(&self.0[..end])
    }
}

impl From<&str> for Title {
    fn from(text: &str) -> Self {
        Self(text.as_bytes().to_vec())
    }
}

impl From<String> for Title {
    fn from(text: String) -> Self {
        Self(text.into_bytes())
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl Serialize for Title {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string_lossy())
    }
}

impl PartialEq<str> for Title {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl PartialEq<&str> for Title {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl PartialEq<String> for Title {
    fn eq(&self, other: &String) -> bool {
        self.0 == other.as_bytes()
    }
}

/// Trajectory-level metadata stored at the start of a DCD file.
///
/// This is the decoded, format-independent view of the three header records.
/// The raw control block, including the bookkeeping words that carry no
/// meaning for consumers, is available as
/// [`ControlBlock`](crate::core::io::header::ControlBlock).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DcdHeader {
    /// Number of atoms in every frame.
    pub natoms: u32,
    /// Declared number of frames.
    pub nsteps: u32,
    /// Time between frames. Stored on disk with single precision.
    pub timestep: f64,
    /// Whether every frame carries a unit-cell record.
    pub has_box: bool,
    /// Title lines, in order.
    pub titles: Vec<Title>,
}

impl DcdHeader {
    /// Creates a header with no titles.
    pub fn new(natoms: u32, nsteps: u32, timestep: f64, has_box: bool) -> Self {
        Self {
            natoms,
            nsteps,
            timestep,
            has_box,
            titles: Vec::new(),
        }
    }

    /// Titles with the fixed-width space padding removed.
    pub fn trimmed_titles(&self) -> impl Iterator<Item = Cow<'_, str>> {
        self.titles.iter().map(Title::trimmed)
    }
}

impl Default for DcdHeader {
    fn default() -> Self {
        Self {
            natoms: 0,
            nsteps: 0,
            timestep: DEFAULT_TIMESTEP,
            has_box: false,
            titles: vec![Title::from(DEFAULT_TITLE)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_header_is_unconfigured_with_auto_title() {
        let header = DcdHeader::default();
        assert_eq!(header.natoms, 0);
        assert_eq!(header.nsteps, 0);
        assert_eq!(header.timestep, DEFAULT_TIMESTEP);
        assert!(!header.has_box);
        assert_eq!(header.titles, vec![DEFAULT_TITLE.to_string()]);
    }

    #[test]
    fn trimmed_titles_strip_only_trailing_spaces() {
        let mut header = DcdHeader::new(3, 1, 0.002, false);
        header.titles.push(format!("{:<80}", "  hello").into());
        header.titles.push("plain".into());
        let trimmed: Vec<_> = header.trimmed_titles().collect();
        assert_eq!(trimmed, vec!["  hello", "plain"]);
    }

    #[test]
    fn titles_keep_non_utf8_bytes() {
        let title = Title::from_bytes(vec![b'C', 0xE9, b'!', b' ', b' ']);
        assert_eq!(title.as_bytes(), &[b'C', 0xE9, b'!', b' ', b' ']);
        assert_eq!(title.trimmed(), "C\u{FFFD}!");
        assert_ne!(title, Title::from("C\u{FFFD}!  "));
    }

    #[test]
    fn all_space_title_trims_to_empty() {
        assert_eq!(Title::from("    ").trimmed(), "");
        assert!(Title::default().is_empty());
    }
}
