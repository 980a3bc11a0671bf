//! Locating frame files on disk.

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use tracing::warn;

use flowgrid_common::FlowgridResult;

use crate::frame::AmrFrame;
use crate::paths;
use crate::read::{read_frame, FrameReadOptions};

/// Frame files of one run may be closed a few seconds apart.
const CLOSE_DELAY: Duration = Duration::from_secs(5);

/// Frame numbers with a primary file under `dir`, ascending.
pub fn available_frames(dir: impl AsRef<Path>, prefix: &str) -> FlowgridResult<Vec<usize>> {
    let mut frames = Vec::new();
    for entry in fs::read_dir(dir)? {
        let name = entry?.file_name();
        if let Some(name) = name.to_str() {
            if let Some(frameno) = paths::parse_q_name(name, prefix) {
                frames.push(frameno);
            }
        }
    }
    frames.sort_unstable();
    frames.dedup();
    Ok(frames)
}

/// Frame numbers of the most recent run under `dir`.
///
/// A directory reused across runs can hold stale high-numbered frames
/// from an earlier, longer run. Walking the frames in ascending order,
/// the first primary file modified more than [`CLOSE_DELAY`] before
/// its predecessor starts the stale tail, which is dropped.
pub fn latest_run_frames(dir: impl AsRef<Path>, prefix: &str) -> FlowgridResult<Vec<usize>> {
    let dir = dir.as_ref();
    let frames = available_frames(dir, prefix)?;
    if frames.is_empty() {
        warn!("no {prefix}.q files found under {}", dir.display());
        return Ok(frames);
    }

    let mut kept = Vec::with_capacity(frames.len());
    let mut previous = SystemTime::UNIX_EPOCH;
    for &frameno in &frames {
        let modified = fs::metadata(paths::q_path(dir, prefix, frameno))?.modified()?;
        if let Ok(gap) = previous.duration_since(modified) {
            if gap > CLOSE_DELAY {
                warn!("frames {frameno} and above appear to be from an old run and are ignored");
                break;
            }
        }
        kept.push(frameno);
        previous = modified;
    }
    Ok(kept)
}

/// Reads the listed frames in order and hands each to `hook`,
/// stopping at the first read or hook error.
pub fn for_each_frame<F>(
    dir: impl AsRef<Path>,
    frames: &[usize],
    opts: &FrameReadOptions,
    mut hook: F,
) -> FlowgridResult<()>
where
    F: FnMut(&AmrFrame) -> FlowgridResult<()>,
{
    let dir = dir.as_ref();
    for &frameno in frames {
        let frame = read_frame(dir, frameno, opts)?;
        hook(&frame)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn test_available_frames_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["fort.q0003", "fort.q0000", "fort.q0010", "fort.t0000", "fort.a0003", "notes.txt"] {
            File::create(dir.path().join(name)).unwrap();
        }
        let frames = available_frames(dir.path(), "fort").unwrap();
        assert_eq!(frames, vec![0, 3, 10]);
        assert!(available_frames(dir.path(), "run").unwrap().is_empty());
    }

    #[test]
    fn test_latest_run_keeps_fresh_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["fort.q0000", "fort.q0001", "fort.q0002"] {
            File::create(dir.path().join(name)).unwrap();
        }
        // All written just now, none can predate its neighbour by more
        // than the close delay.
        let frames = latest_run_frames(dir.path(), "fort").unwrap();
        assert_eq!(frames, vec![0, 1, 2]);
    }

    #[test]
    fn test_latest_run_drops_stale_tail() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["fort.q0000", "fort.q0001", "fort.q0002"] {
            File::create(dir.path().join(name)).unwrap();
        }
        let old = SystemTime::now() - Duration::from_secs(3600);
        let stale = File::options()
            .write(true)
            .open(dir.path().join("fort.q0002"))
            .unwrap();
        stale.set_modified(old).unwrap();
        let frames = latest_run_frames(dir.path(), "fort").unwrap();
        assert_eq!(frames, vec![0, 1]);
    }

    #[test]
    fn test_latest_run_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(latest_run_frames(dir.path(), "fort").unwrap().is_empty());
    }
}
