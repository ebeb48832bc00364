//! Whitespace-separated numeric tables.
//!
//! Tabulated inputs (bound curves, R-ratio grids, spectral functions, r-value grids) are
//! plain text: one row per line, columns separated by any run of spaces or tabs, `#`
//! starting a comment line. Rows are read with `csv` and split on whitespace so ragged
//! column alignment is accepted.

use std::fs::File;
use std::path::Path;

use crate::error::AppError;
use crate::limit::RValueGrid;
use crate::math::Interpolator;

/// Read all numeric rows of a table. Every row must have `columns` entries.
pub fn read_table(path: &Path, columns: usize) -> Result<Vec<Vec<f64>>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open table '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b' ')
        .comment(Some(b'#'))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record
            .map_err(|e| AppError::new(2, format!("Failed to read table '{}': {e}", path.display())))?;
        let fields: Vec<&str> = record.iter().flat_map(str::split_whitespace).collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() != columns {
            return Err(AppError::new(
                2,
                format!(
                    "Table '{}' row {}: expected {columns} columns, found {}.",
                    path.display(),
                    line + 1,
                    fields.len()
                ),
            ));
        }
        let row = fields
            .iter()
            .map(|f| {
                f.parse::<f64>().map_err(|_| {
                    AppError::new(
                        2,
                        format!("Table '{}' row {}: '{f}' is not a number.", path.display(), line + 1),
                    )
                })
            })
            .collect::<Result<Vec<f64>, AppError>>()?;
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(AppError::new(2, format!("Table '{}' has no rows.", path.display())));
    }
    Ok(rows)
}

/// Two-column `(mass, value)` table as an interpolator.
pub fn read_curve(path: &Path) -> Result<Interpolator, AppError> {
    let rows = read_table(path, 2)?;
    let (xs, ys) = rows.into_iter().map(|r| (r[0], r[1])).unzip();
    Interpolator::new(xs, ys)
        .map_err(|e| AppError::new(2, format!("Invalid curve '{}': {e}", path.display())))
}

/// Three-column `(mass, coupling, r)` table as an r-value grid.
///
/// Every `(mass, coupling)` combination must appear exactly once; row order is free.
pub fn read_rvalue_grid(path: &Path) -> Result<RValueGrid, AppError> {
    let rows = read_table(path, 3)?;

    let axis = |col: usize| {
        let mut v: Vec<f64> = rows.iter().map(|r| r[col]).collect();
        v.sort_by(f64::total_cmp);
        v.dedup();
        v
    };
    let masses = axis(0);
    let couplings = axis(1);

    let mut values = vec![f64::NAN; masses.len() * couplings.len()];
    for r in &rows {
        let i = masses.partition_point(|m| *m < r[0]);
        let j = couplings.partition_point(|g| *g < r[1]);
        values[i * couplings.len() + j] = r[2];
    }
    if rows.len() != values.len() {
        return Err(AppError::new(
            2,
            format!(
                "r-value table '{}' is not a full grid ({} rows for {} x {} points).",
                path.display(),
                rows.len(),
                masses.len(),
                couplings.len()
            ),
        ));
    }

    RValueGrid::new(masses, couplings, values)
        .map_err(|e| AppError::new(2, format!("Invalid r-value table '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn reads_ragged_whitespace_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "a.lmt", "# mass  coupling\n0.01   1e-3\n  0.02\t2e-3\n\n0.05 4e-3\n");
        let curve = read_curve(&path).unwrap();
        assert_eq!(curve.xs(), &[0.01, 0.02, 0.05]);
        assert!((curve.eval(0.035) - 3e-3).abs() < 1e-15);
    }

    #[test]
    fn rejects_wrong_column_counts_and_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "bad.lmt", "0.01 1e-3 7\n");
        assert_eq!(read_curve(&path).unwrap_err().exit_code(), 2);
        let path = write(&dir, "text.lmt", "0.01 abc\n");
        assert!(read_curve(&path).is_err());
        assert!(read_curve(&dir.path().join("missing.lmt")).is_err());
    }

    #[test]
    fn assembles_rvalue_grids_in_any_row_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "r.lmt",
            "0.2 1e-4 4\n0.1 1e-4 1\n0.1 1e-3 2\n0.2 1e-3 5\n",
        );
        let grid = read_rvalue_grid(&path).unwrap();
        assert_eq!(grid.masses(), &[0.1, 0.2]);
        assert_eq!(grid.row(0), &[1.0, 2.0]);
        assert_eq!(grid.row(1), &[4.0, 5.0]);

        let path = write(&dir, "holes.lmt", "0.1 1e-4 1\n0.2 1e-3 5\n");
        assert!(read_rvalue_grid(&path).is_err());
    }
}
