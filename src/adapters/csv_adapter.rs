//! CSV file bar data adapter.
//!
//! One file per instrument and frequency: `{instrument}_{frequency}.csv` with
//! header `timestamp,open,high,low,close,volume`.

use crate::domain::error::TurtleError;
use crate::domain::frequency::Frequency;
use crate::domain::ohlcv::Bar;
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, instrument: &str, frequency: Frequency) -> PathBuf {
        self.base_path
            .join(format!("{}_{}.csv", instrument, frequency))
    }
}

/// Parse bar rows from CSV text. Rows are returned oldest first.
pub fn parse_bars(content: &str) -> Result<Vec<Bar>, TurtleError> {
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut bars = Vec::new();

    for (row, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| TurtleError::DataFormat {
            reason: format!("CSV parse error: {}", e),
        })?;
        let line = row + 2;

        let timestamp = parse_timestamp(field(&record, 0, "timestamp", line)?).ok_or_else(|| {
            TurtleError::DataFormat {
                reason: format!("line {}: invalid timestamp", line),
            }
        })?;

        bars.push(Bar {
            timestamp,
            open: parse_price(&record, 1, "open", line)?,
            high: parse_price(&record, 2, "high", line)?,
            low: parse_price(&record, 3, "low", line)?,
            close: parse_price(&record, 4, "close", line)?,
            volume: parse_price(&record, 5, "volume", line)?,
        });
    }

    bars.sort_by_key(|b| b.timestamp);
    Ok(bars)
}

fn field<'r>(
    record: &'r csv::StringRecord,
    index: usize,
    name: &str,
    line: usize,
) -> Result<&'r str, TurtleError> {
    record.get(index).map(str::trim).ok_or_else(|| TurtleError::DataFormat {
        reason: format!("line {}: missing {} column", line, name),
    })
}

fn parse_price(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
    line: usize,
) -> Result<f64, TurtleError> {
    field(record, index, name, line)?
        .parse()
        .map_err(|e| TurtleError::DataFormat {
            reason: format!("line {}: invalid {} value: {}", line, name, e),
        })
}

fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self, instrument: &str, frequency: Frequency) -> Result<Vec<Bar>, TurtleError> {
        let path = self.csv_path(instrument, frequency);
        if !path.exists() {
            return Err(TurtleError::NoData {
                instrument: instrument.to_string(),
                frequency: frequency.to_string(),
            });
        }
        let content = fs::read_to_string(&path)?;
        let bars = parse_bars(&content)?;
        log::debug!("loaded {} bars from {}", bars.len(), path.display());
        Ok(bars)
    }

    fn list_instruments(&self, frequency: Frequency) -> Result<Vec<String>, TurtleError> {
        let suffix = format!("_{}.csv", frequency);
        let mut instruments = Vec::new();

        for entry in fs::read_dir(&self.base_path)? {
            let name = entry?.file_name();
            let name = name.to_string_lossy();
            if let Some(instrument) = name.strip_suffix(&suffix) {
                instruments.push(instrument.to_string());
            }
        }

        instruments.sort();
        Ok(instruments)
    }
}
