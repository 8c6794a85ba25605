//! Output file naming
//!
//! `movie.mp4` part 3 becomes `movie_part03.mp4`; an input without an
//! extension keeps none (`README` -> `README_part01`). Part numbers are
//! zero-padded to two digits and simply grow wider from part 100 on.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Path of part `part_number` (one-based), next to the input.
pub fn part_path(input: &Path, part_number: usize) -> PathBuf {
    input.with_file_name(part_file_name(input, part_number))
}

/// Path of part `part_number` (one-based), placed in `output_dir` if given.
pub fn part_path_in(input: &Path, part_number: usize, output_dir: Option<&Path>) -> PathBuf {
    match output_dir {
        Some(dir) => dir.join(part_file_name(input, part_number)),
        None => part_path(input, part_number),
    }
}

/// File name component of part `part_number` (one-based).
pub fn part_file_name(input: &Path, part_number: usize) -> OsString {
    let suffix = format!("_part{:02}", part_number);

    let mut name = input
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_default();
    name.push(&suffix);
    if let Some(ext) = input.extension() {
        name.push(".");
        name.push(ext);
    }
    name
}
