use crate::core::io::error::DcdError;
use crate::core::models::header::DcdHeader;
use crate::engine::reader::DcdReader;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrajectorySummary {
    pub path: PathBuf,
    pub file_size: u64,
    pub frame_size: u64,
    pub frame_count: u64,
    /// Whether the header's frame count agrees with the frames on disk.
    pub declared_matches: bool,
    pub header: DcdHeader,
}

impl TrajectorySummary {
    /// Simulated time covered by the stored frames.
    pub fn duration(&self) -> f64 {
        self.header.timestep * self.frame_count as f64
    }
}

/// Decodes the header of the trajectory at `path` and counts its frames.
#[instrument(skip_all, name = "inspect_workflow")]
pub fn run(path: &Path) -> Result<TrajectorySummary, DcdError> {
    let file_size = std::fs::metadata(path)?.len();
    let reader = DcdReader::open(path)?;
    let header = reader.header().clone();
    let frame_count = reader.frame_count();
    info!(
        natoms = header.natoms,
        frames = frame_count,
        "Inspected trajectory {:?}.",
        path
    );
    Ok(TrajectorySummary {
        path: path.to_path_buf(),
        file_size,
        declared_matches: u64::from(header.nsteps) == frame_count,
        frame_size: reader.frame_size(),
        frame_count,
        header,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::error::FormatErrorKind;
    use crate::core::io::frame::frame_len;
    use crate::core::io::header::header_len;
    use crate::core::models::frame::Frame;
    use crate::engine::writer::DcdWriter;
    use nalgebra::{Point3, Vector3};
    use tempfile::tempdir;

    #[test]
    fn summarizes_a_written_trajectory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("boxed.dcd");
        let frames: Vec<_> = (0..3)
            .map(|i| {
                Frame::with_box(
                    vec![Point3::new(i as f32, 0.0, 0.0); 6],
                    Vector3::new(9.0, 9.0, 9.0),
                )
            })
            .collect();
        DcdWriter::write_trajectory(&path, &frames, &["inspect me".to_string()], false).unwrap();

        let summary = run(&path).unwrap();
        assert_eq!(summary.header.natoms, 6);
        assert!(summary.header.has_box);
        assert_eq!(summary.frame_count, 3);
        assert_eq!(summary.frame_size, frame_len(6, true));
        assert_eq!(summary.file_size, header_len(1) + 3 * frame_len(6, true));
        assert!(summary.declared_matches);
        assert_eq!(summary.header.trimmed_titles().collect::<Vec<_>>(), vec!["inspect me"]);
    }

    #[test]
    fn duration_scales_with_frame_count() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plain.dcd");
        let frames = vec![Frame::new(vec![Point3::origin(); 2]); 4];
        DcdWriter::write_trajectory(&path, &frames, &[], false).unwrap();

        let summary = run(&path).unwrap();
        assert_eq!(summary.duration(), summary.header.timestep * 4.0);
    }

    #[test]
    fn non_trajectory_files_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"not a trajectory").unwrap();

        let err = run(&path).unwrap_err();
        assert!(matches!(
            err,
            DcdError::Format(FormatErrorKind::FileTooShort { length: 16, .. })
        ));
    }

    #[test]
    fn missing_files_surface_io_errors() {
        let dir = tempdir().unwrap();
        assert!(matches!(run(&dir.path().join("absent.dcd")), Err(DcdError::Io(_))));
    }
}
