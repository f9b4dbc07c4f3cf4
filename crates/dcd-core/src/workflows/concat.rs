use crate::core::io::error::DcdError;
use crate::engine::config::{ConcatConfig, OpenMode, WriterConfig, validate_timestep};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::reader::DcdReader;
use crate::engine::writer::DcdWriter;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputSummary {
    pub path: PathBuf,
    pub frames_available: u64,
    pub frames_copied: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConcatSummary {
    pub output: PathBuf,
    pub inputs: Vec<InputSummary>,
    /// Frames already present in the output before this run.
    pub frames_before: u32,
    /// Frames in the output after this run.
    pub frames_after: u32,
}

/// Number of frames selected from a trajectory of `count` frames.
pub fn selected_frames(count: u64, skip: usize, stride: usize) -> u64 {
    let remaining = count.saturating_sub(skip as u64);
    remaining.div_ceil(stride.max(1) as u64)
}

/// Copies frames from `inputs`, in order, into `output`.
///
/// The output is created or appended to according to `config.writer.mode`.
/// Frames of every input are filtered by `config.skip` and `config.stride`
/// and validated by the writer, so all inputs must share one atom count. A
/// failure aborts the run, leaving every frame copied so far in place.
///
/// # Errors
///
/// Returns [`DcdError::Io`] with [`io::ErrorKind::InvalidInput`] if `output`
/// is also one of the inputs, and otherwise propagates reader and writer errors.
#[instrument(skip_all, name = "concat_workflow")]
pub fn run<P: AsRef<Path>>(
    inputs: &[P],
    output: &Path,
    config: &ConcatConfig,
    reporter: &ProgressReporter,
) -> Result<ConcatSummary, DcdError> {
    reject_output_among_inputs(inputs, output)?;

    let writer_config = effective_writer_config(inputs, output, config)?;
    let mut writer = DcdWriter::open_with_config(output, &writer_config)?;
    let frames_before = writer.frames_written();
    info!(
        inputs = inputs.len(),
        existing_frames = frames_before,
        "Concatenating trajectories into {:?}.",
        output
    );

    let mut summaries = Vec::with_capacity(inputs.len());
    for (index, input) in inputs.iter().enumerate() {
        let path = input.as_ref();
        let mut reader = DcdReader::open(path)?;
        let available = reader.frame_count();
        let total = selected_frames(available, config.skip, config.stride);
        reporter.report(Progress::InputStart {
            index,
            path: path.to_path_buf(),
            total_frames: total,
        });

        let mut copied = 0;
        let mut next = config.skip as u64;
        while next < available {
            reader.seek_frame(next)?;
            let Some(frame) = reader.read_frame()? else {
                break;
            };
            writer.write_frame(&frame)?;
            copied += 1;
            reporter.report(Progress::FrameCopied);
            next += config.stride as u64;
        }
        reporter.report(Progress::InputFinish);

        if copied == 0 {
            warn!("No frames selected from {:?}.", path);
        }
        info!(copied, available, "Finished input {:?}.", path);
        summaries.push(InputSummary {
            path: path.to_path_buf(),
            frames_available: available,
            frames_copied: copied,
        });
    }

    let frames_after = writer.frames_written();
    writer.close()?;
    Ok(ConcatSummary {
        output: output.to_path_buf(),
        inputs: summaries,
        frames_before,
        frames_after,
    })
}

fn effective_writer_config<P: AsRef<Path>>(
    inputs: &[P],
    output: &Path,
    config: &ConcatConfig,
) -> Result<WriterConfig, DcdError> {
    let mut writer = config.writer.clone();
    let creating = writer.mode == OpenMode::Create || !output.exists();
    if creating && config.inherit_timestep {
        if let Some(first) = inputs.first() {
            let header = crate::engine::reader::read_header_from_path(first)?;
            match validate_timestep(header.timestep * config.stride as f64) {
                Ok(timestep) => writer.timestep = timestep,
                Err(e) => warn!(
                    "Cannot inherit the timestep of {:?} ({}); keeping {}.",
                    first.as_ref(),
                    e,
                    writer.timestep
                ),
            }
        }
    }
    Ok(writer)
}

fn reject_output_among_inputs<P: AsRef<Path>>(inputs: &[P], output: &Path) -> Result<(), DcdError> {
    let Ok(output) = output.canonicalize() else {
        return Ok(());
    };
    for input in inputs {
        if input.as_ref().canonicalize().is_ok_and(|p| p == output) {
            return Err(DcdError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("output {:?} is also an input", output),
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::frame::Frame;
    use crate::core::models::header::DEFAULT_TIMESTEP;
    use crate::engine::config::{ConcatConfigBuilder, WriterConfigBuilder};
    use nalgebra::Point3;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn frames(range: std::ops::Range<usize>, natoms: usize) -> Vec<Frame> {
        range
            .map(|i| Frame::new(vec![Point3::new(i as f32, 0.5, -1.0); natoms]))
            .collect()
    }

    fn write(path: &Path, frames: &[Frame], timestep: f64) {
        let config = WriterConfigBuilder::new().timestep(timestep).build().unwrap();
        let mut writer = DcdWriter::open_with_config(path, &config).unwrap();
        writer.write_frames(frames).unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn selected_frames_accounts_for_skip_and_stride() {
        assert_eq!(selected_frames(10, 0, 1), 10);
        assert_eq!(selected_frames(10, 2, 3), 3);
        assert_eq!(selected_frames(10, 10, 1), 0);
        assert_eq!(selected_frames(3, 5, 2), 0);
        assert_eq!(selected_frames(7, 0, 2), 4);
    }

    #[test]
    fn concatenates_inputs_in_order() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.dcd");
        let b = dir.path().join("b.dcd");
        let out = dir.path().join("out.dcd");
        write(&a, &frames(0..3, 4), 0.002);
        write(&b, &frames(3..5, 4), 0.002);

        let config = ConcatConfigBuilder::new().build().unwrap();
        let summary = run(&[&a, &b], &out, &config, &ProgressReporter::new()).unwrap();
        assert_eq!(summary.frames_before, 0);
        assert_eq!(summary.frames_after, 5);
        assert_eq!(summary.inputs[1].frames_copied, 2);

        let mut reader = DcdReader::open(&out).unwrap();
        assert_eq!(reader.header().nsteps, 5);
        assert_eq!(reader.header().timestep, f64::from(0.002f32));
        assert_eq!(reader.read_all().unwrap(), frames(0..5, 4));
    }

    #[test]
    fn skip_and_stride_select_frames_and_scale_timestep() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.dcd");
        let out = dir.path().join("out.dcd");
        write(&a, &frames(0..10, 2), 0.5);

        let config = ConcatConfigBuilder::new().skip(1).stride(4).build().unwrap();
        let copied = Arc::new(AtomicU64::new(0));
        let counter = copied.clone();
        let reporter = ProgressReporter::with_callback(Box::new(move |event| {
            if matches!(event, Progress::FrameCopied) {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        }));
        run(&[&a], &out, &config, &reporter).unwrap();
        assert_eq!(copied.load(Ordering::SeqCst), 3);

        let mut reader = DcdReader::open(&out).unwrap();
        assert_eq!(reader.header().timestep, 2.0);
        let picked: Vec<f32> = reader
            .read_all()
            .unwrap()
            .iter()
            .map(|f| f.coords[0].x)
            .collect();
        assert_eq!(picked, vec![1.0, 5.0, 9.0]);
    }

    fn write_with_raw_timestep(path: &Path, timestep: f64) {
        let mut writer = DcdWriter::create(path).unwrap();
        writer.set_header(2, 1, timestep, false).unwrap();
        writer.write_frame(&frames(0..1, 2)[0]).unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn unusable_inherited_timestep_falls_back_to_configured_one() {
        let dir = tempdir().unwrap();
        let zero = dir.path().join("zero.dcd");
        let huge = dir.path().join("huge.dcd");
        write_with_raw_timestep(&zero, 0.0);
        write_with_raw_timestep(&huge, f64::from(f32::MAX));

        let cases = [(&zero, 1, "zero_out.dcd"), (&huge, 2, "huge_out.dcd")];
        for (input, stride, name) in cases {
            let out = dir.path().join(name);
            let config = ConcatConfigBuilder::new().stride(stride).build().unwrap();
            run(&[input], &out, &config, &ProgressReporter::new()).unwrap();

            let header = crate::engine::reader::read_header_from_path(&out).unwrap();
            assert_eq!(header.timestep, f64::from(DEFAULT_TIMESTEP as f32));
        }
    }

    #[test]
    fn append_mode_extends_existing_output() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.dcd");
        let out = dir.path().join("out.dcd");
        write(&out, &frames(0..2, 3), 0.001);
        write(&a, &frames(2..4, 3), 0.001);

        let writer = WriterConfigBuilder::new()
            .mode(OpenMode::Append)
            .build()
            .unwrap();
        let config = ConcatConfigBuilder::new().writer(writer).build().unwrap();
        let summary = run(&[&a], &out, &config, &ProgressReporter::new()).unwrap();
        assert_eq!(summary.frames_before, 2);
        assert_eq!(summary.frames_after, 4);

        let mut reader = DcdReader::open(&out).unwrap();
        assert_eq!(reader.read_all().unwrap(), frames(0..4, 3));
    }

    #[test]
    fn mismatched_inputs_abort_after_copied_frames() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.dcd");
        let b = dir.path().join("b.dcd");
        let out = dir.path().join("out.dcd");
        write(&a, &frames(0..2, 3), 0.001);
        write(&b, &frames(0..2, 5), 0.001);

        let config = ConcatConfigBuilder::new().build().unwrap();
        let err = run(&[&a, &b], &out, &config, &ProgressReporter::new()).unwrap_err();
        assert!(err.is_consistency());

        let reader = DcdReader::open(&out).unwrap();
        assert_eq!(reader.frame_count(), 2);
    }

    #[test]
    fn output_that_is_also_an_input_is_rejected() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.dcd");
        write(&a, &frames(0..2, 3), 0.001);

        let config = ConcatConfigBuilder::new().build().unwrap();
        let err = run(&[&a], &a, &config, &ProgressReporter::new()).unwrap_err();
        assert!(matches!(err, DcdError::Io(e) if e.kind() == io::ErrorKind::InvalidInput));
        assert_eq!(DcdReader::open(&a).unwrap().frame_count(), 2);
    }
}
