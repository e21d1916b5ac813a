use chrono::NaiveDate;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("export I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("could not move export into place: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// `<entity>-export-<YYYY-MM-DD>.csv`
pub fn export_filename(entity: &str, date: NaiveDate) -> String {
    format!("{}-export-{}.csv", entity, date.format("%Y-%m-%d"))
}

/// Header row, then one record per row.
pub fn write_csv<W: io::Write>(out: W, headers: &[String], rows: &[Vec<String>]) -> Result<(), ExportError> {
    let mut w = csv::Writer::from_writer(out);
    w.write_record(headers)?;
    for row in rows {
        w.write_record(row)?;
    }
    w.flush()?;
    Ok(())
}

/// Write to a temporary file in `dir`, then atomically persist it as
/// `file_name`. The temp file is removed if anything fails.
pub(crate) fn export_to_dir(
    dir: &Path,
    file_name: &str,
    headers: &[String],
    rows: &[Vec<String>],
) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    write_csv(tmp.as_file_mut(), headers, rows)?;
    tmp.as_file().sync_all()?;

    let target = dir.join(file_name);
    tmp.persist(&target)?;
    info!(path = %target.display(), rows = rows.len(), "export written");
    Ok(target)
}
