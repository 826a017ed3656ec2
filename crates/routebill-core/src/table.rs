//! Header-plus-rows tables backed by CSV files.
//!
//! Both the ledger and the invoice template are plain tables. Rows keep their
//! file order and may be ragged; a missing trailing cell reads as empty.

use std::io::Write;
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use tempfile::NamedTempFile;
use tracing::trace;

use crate::Result;

/// An in-memory table: one header row followed by data rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Read a table from a CSV file. Blank lines are skipped.
    ///
    /// A file with no rows at all yields an empty header.
    pub fn read(path: &Path) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;

        let mut records = Vec::new();
        for record in reader.records() {
            let record = record?;
            let cells: Vec<String> = record.iter().map(str::to_string).collect();
            if cells.iter().all(|c| c.trim().is_empty()) {
                continue;
            }
            records.push(cells);
        }

        let mut records = records.into_iter();
        let header = records.next().unwrap_or_default();
        let rows: Vec<Vec<String>> = records.collect();
        trace!("Read {} rows from {}", rows.len(), path.display());

        Ok(Self { header, rows })
    }

    /// Serialize the table as CSV.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = WriterBuilder::new().flexible(true).from_writer(writer);
        wtr.write_record(&self.header)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Replace `path` with this table: write a sibling temp file, sync it, rename it over.
    pub fn write_atomic(&self, path: &Path) -> Result<()> {
        write_atomic(path, |file| self.write_to(file))
    }
}

/// Write a file via a temp file in the same directory followed by a rename,
/// so readers see either the old or the new content.
pub fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut std::fs::File) -> Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir)?;
    write(temp.as_file_mut())?;
    // Keep the replaced file's mode; a fresh temp file is owner-only.
    match std::fs::metadata(path) {
        Ok(existing) => temp.as_file().set_permissions(existing.permissions())?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    trace!("Wrote {}", path.display());
    Ok(())
}

/// Cell at `index`, or `""` when the row is too short.
pub fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(String::as_str).unwrap_or("")
}

/// Set the cell at `index`, growing the row as needed.
pub fn set_cell(row: &mut Vec<String>, index: usize, value: impl Into<String>) {
    if row.len() <= index {
        row.resize(index + 1, String::new());
    }
    row[index] = value.into();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_read_ragged_and_blank_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        std::fs::write(&path, "a,b,c\n1,2\n,,\n4,5,6\n").unwrap();

        let table = Table::read(&path).unwrap();

        assert_eq!(table.header, vec!["a", "b", "c"]);
        assert_eq!(table.rows, vec![vec!["1", "2"], vec!["4", "5", "6"]]);
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        std::fs::write(&path, "old\n").unwrap();

        let table = Table {
            header: vec!["x".into(), "y".into()],
            rows: vec![vec!["1".into(), "a, b".into()]],
        };
        table.write_atomic(&path).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x,y\n1,\"a, b\"\n");
        assert_eq!(Table::read(&path).unwrap(), table);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_keeps_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.csv");
        std::fs::write(&path, "old\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        write_atomic(&path, |file| Ok(file.write_all(b"new\n")?)).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new\n");
    }

    #[test]
    fn test_cell_helpers() {
        let mut row = vec!["a".to_string()];
        assert_eq!(cell(&row, 3), "");
        set_cell(&mut row, 2, "c");
        assert_eq!(row, vec!["a", "", "c"]);
    }
}
