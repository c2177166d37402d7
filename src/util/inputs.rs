//! Input path expansion for the CLI.
//!
//! Plain paths are forwarded as given. Directories are walked with
//! [`walkdir`] when recursion is requested, yielding regular files in
//! file-name order; symlinks are not followed.

use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Expand `inputs` into the list of files to analyse.
///
/// A directory without `recursive` is an error.
pub fn expand_inputs<P: AsRef<Path>>(inputs: &[P], recursive: bool) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        let input = input.as_ref();
        if !input.is_dir() {
            files.push(input.to_path_buf());
            continue;
        }
        if !recursive {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is a directory (use -r to descend)", input.display()),
            ));
        }
        for entry in WalkDir::new(input).sort_by_file_name() {
            let entry = entry.map_err(io::Error::from)?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
    }
    Ok(files)
}
