use std::path::{Path, PathBuf};

use crate::error::ExecError;

const PROTOCOL_EXTENSIONS: [&str; 2] = ["md", "txt"];

pub fn read_file(path: impl AsRef<Path>) -> Result<String, ExecError> {
    Ok(std::fs::read_to_string(path)?)
}

/// Look for `<name>.md` or `<name>.txt` in `dir`.
pub fn find_protocol(dir: impl AsRef<Path>, name: &str) -> Option<PathBuf> {
    PROTOCOL_EXTENSIONS
        .iter()
        .map(|ext| dir.as_ref().join(format!("{name}.{ext}")))
        .find(|path| path.is_file())
}
