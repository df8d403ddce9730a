use std::io;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::run::RunResult;

/// `<name>_<YYYYMMDD_HHMMSS>.json`, stamped with the run's own timestamp.
pub fn result_file_name(name: &str, result: &RunResult) -> String {
    format!("{name}_{}.json", result.timestamp().format("%Y%m%d_%H%M%S"))
}

/// Write `result` as pretty JSON into `dir`.
///
/// The directory must already exist; it is created by the setup check, not
/// here. Two runs of the same experiment within one second overwrite each
/// other.
pub fn save_result(dir: &Path, name: &str, result: &RunResult) -> io::Result<PathBuf> {
    if !dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("results directory {} does not exist", dir.display()),
        ));
    }

    let path = dir.join(result_file_name(name, result));
    let json = result.to_json_pretty().map_err(io::Error::other)?;
    std::fs::write(&path, json)?;

    info!(path = %path.display(), "saved run result");
    Ok(path)
}
