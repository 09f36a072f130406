//! Flat-file export of a single symbol's daily series.
//!
//! Columns: `Date, Open, High, Low, Close, Volume`, then every derived column
//! in name order (`MA20`, `MA50`, ...). Missing derived values are empty cells.
//! Files land in the configured export directory as `{SYMBOL}_data.{ext}`.

use crate::domain::DailySeries;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

const BASE_COLUMNS: [&str; 6] = ["Date", "Open", "High", "Low", "Close", "Volume"];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV encoding: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet encoding: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    #[error("unknown export format '{0}' (expected csv or excel)")]
    UnknownFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Excel,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Excel => "xlsx",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Csv => write!(f, "csv"),
            ExportFormat::Excel => write!(f, "excel"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            other => Err(ExportError::UnknownFormat(other.to_string())),
        }
    }
}

/// Writes series into a fixed export directory.
#[derive(Debug, Clone)]
pub struct Exporter {
    export_dir: PathBuf,
}

impl Exporter {
    pub fn new(export_dir: impl Into<PathBuf>) -> Self {
        Self {
            export_dir: export_dir.into(),
        }
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    pub fn path_for(&self, symbol: &str, format: ExportFormat) -> PathBuf {
        self.export_dir
            .join(format!("{symbol}_data.{}", format.extension()))
    }

    /// Write one file and return its path. Creates the export directory.
    pub fn export(
        &self,
        symbol: &str,
        series: &DailySeries,
        format: ExportFormat,
    ) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(&self.export_dir)?;
        let path = self.path_for(symbol, format);

        match format {
            ExportFormat::Csv => fs::write(&path, export_csv(series)?)?,
            ExportFormat::Excel => write_xlsx(series, &path)?,
        }

        info!(symbol, path = %path.display(), %format, "data exported");
        Ok(path)
    }
}

/// Render the series as CSV text.
pub fn export_csv(series: &DailySeries) -> Result<String, ExportError> {
    let derived: Vec<&str> = series.column_names().collect();
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(BASE_COLUMNS.iter().copied().chain(derived.iter().copied()))?;

    for (i, obs) in series.observations().iter().enumerate() {
        let mut record = vec![
            obs.date.to_string(),
            obs.open.to_string(),
            obs.high.to_string(),
            obs.low.to_string(),
            obs.close.to_string(),
            obs.volume.to_string(),
        ];
        record.extend(
            derived
                .iter()
                .map(|name| series.value_at(name, i).map(|v| v.to_string()).unwrap_or_default()),
        );
        wtr.write_record(&record)?;
    }

    let data = wtr
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))?;
    Ok(String::from_utf8_lossy(&data).into_owned())
}

fn write_xlsx(series: &DailySeries, path: &Path) -> Result<(), ExportError> {
    let derived: Vec<&str> = series.column_names().collect();
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();

    for (col, name) in BASE_COLUMNS.iter().chain(derived.iter()).enumerate() {
        sheet.write_string(0, col as u16, *name)?;
    }

    for (i, obs) in series.observations().iter().enumerate() {
        let row = (i + 1) as u32;
        sheet.write_string(row, 0, obs.date.to_string())?;
        for (col, value) in [obs.open, obs.high, obs.low, obs.close, obs.volume]
            .into_iter()
            .enumerate()
        {
            sheet.write_number(row, (col + 1) as u16, value)?;
        }
        for (offset, name) in derived.iter().enumerate() {
            if let Some(value) = series.value_at(name, i) {
                sheet.write_number(row, (BASE_COLUMNS.len() + offset) as u16, value)?;
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{make_observations, with_moving_averages};

    fn sample() -> DailySeries {
        let mut series = DailySeries::from_sorted(make_observations(&[10.0, 11.0, 12.0])).unwrap();
        with_moving_averages(&mut series, &[2]);
        series
    }

    #[test]
    fn csv_has_base_and_derived_columns() {
        let csv = export_csv(&sample()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("Date,Open,High,Low,Close,Volume,MA2"));
        assert_eq!(lines.next(), Some("2024-01-02,10,11,9,10,1000,"));
        assert_eq!(lines.next(), Some("2024-01-03,10,12,9,11,1000,10.5"));
        assert_eq!(lines.count(), 1);
    }

    #[test]
    fn export_writes_csv_file_into_dir() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(dir.path().join("exports"));

        let path = exporter.export("AAPL", &sample(), ExportFormat::Csv).unwrap();

        assert_eq!(path, dir.path().join("exports").join("AAPL_data.csv"));
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("Date,Open"));
    }

    #[test]
    fn export_writes_xlsx_file() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(dir.path());

        let path = exporter.export("AAPL", &sample(), ExportFormat::Excel).unwrap();

        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("xlsx"));
        let bytes = fs::read(&path).unwrap();
        // xlsx is a zip container
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn format_parsing() {
        assert_eq!("csv".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("Excel".parse::<ExportFormat>().unwrap(), ExportFormat::Excel);
        assert!(matches!(
            "pdf".parse::<ExportFormat>(),
            Err(ExportError::UnknownFormat(_))
        ));
        assert_eq!(ExportFormat::Excel.to_string(), "excel");
    }
}
