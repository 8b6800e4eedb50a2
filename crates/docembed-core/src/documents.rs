//! Reading the input document array and writing the output records.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use tempfile::{Builder, NamedTempFile};

use crate::error::{Error, Result};
use crate::types::{Document, OutputRecord};

/// Read a JSON array of `{id, text}` objects.
///
/// The whole array is validated up front: a malformed file or a single
/// entry with a missing or wrong-typed field fails the run.
pub fn read_documents(path: &Path) -> Result<Vec<Document>> {
    let file = File::open(path).map_err(|source| Error::InputOpen { path: path.to_path_buf(), source })?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|source| Error::Schema { path: path.to_path_buf(), source })
}

/// Write records as a pretty-printed JSON array (2-space indentation).
///
/// Output goes to a temporary file next to `path` that is renamed into place
/// once fully written, so a failed write never leaves a truncated file.
/// The file gets the same umask-derived mode a plain `File::create` would.
pub fn write_records(path: &Path, records: &[OutputRecord]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let tmp = output_temp_file(dir).map_err(|source| Error::OutputOpen { path: path.to_path_buf(), source })?;
    let write_err = |source: std::io::Error| Error::OutputWrite { path: path.to_path_buf(), source };

    let mut writer = BufWriter::new(tmp);
    serde_json::to_writer_pretty(&mut writer, records).map_err(|e| write_err(e.into()))?;
    writer.flush().map_err(write_err)?;
    let tmp = writer.into_inner().map_err(|e| write_err(e.into_error()))?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

#[cfg(unix)]
fn output_temp_file(dir: &Path) -> std::io::Result<NamedTempFile> {
    use std::fs::Permissions;
    use std::os::unix::fs::PermissionsExt;
    Builder::new().prefix(".docembed").permissions(Permissions::from_mode(0o666)).tempfile_in(dir)
}

#[cfg(not(unix))]
fn output_temp_file(dir: &Path) -> std::io::Result<NamedTempFile> {
    Builder::new().prefix(".docembed").tempfile_in(dir)
}
