//! File naming shared by the three frame streams.

use std::path::{Path, PathBuf};

pub(crate) fn time_path(dir: &Path, prefix: &str, frameno: usize) -> PathBuf {
    dir.join(format!("{prefix}.t{frameno:04}"))
}

pub(crate) fn q_path(dir: &Path, prefix: &str, frameno: usize) -> PathBuf {
    dir.join(format!("{prefix}.q{frameno:04}"))
}

pub(crate) fn aux_frame_path(dir: &Path, prefix: &str, frameno: usize) -> PathBuf {
    dir.join(format!("{prefix}.a{frameno:04}"))
}

/// Frame-independent auxiliary file, used by runs whose aux values do
/// not change over time.
pub(crate) fn aux_plain_path(dir: &Path, prefix: &str) -> PathBuf {
    dir.join(format!("{prefix}.a"))
}

/// Frame number of a primary file name, `None` for anything else.
pub(crate) fn parse_q_name(name: &str, prefix: &str) -> Option<usize> {
    let digits = name.strip_prefix(prefix)?.strip_prefix(".q")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
