//! CSV bar source and CSV exporters.
//!
//! Input columns are located by header name: `timestamp, open, high, low,
//! close` are required, `volume` is optional and may be left empty per row.

use crate::domain::bar::{Bar, normalize_bars};
use crate::domain::error::FxError;
use crate::domain::indicator::IndicatorFrame;
use crate::domain::signal::SignalRecord;
use crate::ports::data_port::DataPort;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use std::fs;
use std::path::{Path, PathBuf};

pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

struct Columns {
    timestamp: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, FxError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let require = |name: &str| {
            find(name).ok_or_else(|| FxError::DataSource {
                reason: format!("missing {name} column"),
            })
        };
        Ok(Columns {
            timestamp: require("timestamp")?,
            open: require("open")?,
            high: require("high")?,
            low: require("low")?,
            close: require("close")?,
            volume: find("volume"),
        })
    }
}

/// RFC 3339, or a naive `YYYY-MM-DD HH:MM:SS` / `YYYY-MM-DD` taken as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, FxError> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Some(naive) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(naive.and_utc());
    }
    Err(FxError::DataSource {
        reason: format!("invalid timestamp '{raw}'"),
    })
}

fn parse_price(record: &csv::StringRecord, index: usize, name: &str) -> Result<f64, FxError> {
    record
        .get(index)
        .ok_or_else(|| FxError::DataSource {
            reason: format!("missing {name} value"),
        })?
        .trim()
        .parse()
        .map_err(|e| FxError::DataSource {
            reason: format!("invalid {name} value: {e}"),
        })
}

/// Read bars from any CSV reader, then dedupe and sort.
pub fn read_bars<R: std::io::Read>(reader: R) -> Result<Vec<Bar>, FxError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers().map_err(|e| FxError::DataSource {
        reason: format!("CSV header error: {e}"),
    })?;
    let columns = Columns::from_headers(headers)?;

    let mut bars = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| FxError::DataSource {
            reason: format!("CSV parse error: {e}"),
        })?;

        let timestamp = parse_timestamp(record.get(columns.timestamp).unwrap_or_default())?;
        let volume = match columns.volume {
            Some(i) if record.get(i).is_some_and(|v| !v.trim().is_empty()) => {
                Some(parse_price(&record, i, "volume")?)
            }
            _ => None,
        };

        bars.push(Bar {
            timestamp,
            open: parse_price(&record, columns.open, "open")?,
            high: parse_price(&record, columns.high, "high")?,
            low: parse_price(&record, columns.low, "low")?,
            close: parse_price(&record, columns.close, "close")?,
            volume,
        });
    }

    Ok(normalize_bars(bars))
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self) -> Result<Vec<Bar>, FxError> {
        let content = fs::read_to_string(&self.path).map_err(|e| FxError::DataSource {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;
        read_bars(content.as_bytes())
    }

    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn format_opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn report_err(path: &Path, e: impl std::fmt::Display) -> FxError {
    FxError::Report {
        reason: format!("failed to write {}: {}", path.display(), e),
    }
}

pub fn write_bars_csv(path: &Path, bars: &[Bar]) -> Result<(), FxError> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| report_err(path, e))?;
    wtr.write_record(["timestamp", "open", "high", "low", "close", "volume"])
        .map_err(|e| report_err(path, e))?;
    for bar in bars {
        wtr.write_record([
            format_timestamp(bar.timestamp),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            format_opt(bar.volume),
        ])
        .map_err(|e| report_err(path, e))?;
    }
    wtr.flush()?;
    Ok(())
}

const FRAME_HEADERS: [&str; 16] = [
    "timestamp",
    "open",
    "high",
    "low",
    "close",
    "tick_volume",
    "ema_fast",
    "ema_slow",
    "rsi",
    "macd",
    "macd_signal",
    "macd_hist",
    "atr",
    "bb_mid",
    "bb_upper",
    "bb_lower",
];

fn frame_fields(frame: &IndicatorFrame) -> Vec<String> {
    vec![
        format_timestamp(frame.bar.timestamp),
        frame.bar.open.to_string(),
        frame.bar.high.to_string(),
        frame.bar.low.to_string(),
        frame.bar.close.to_string(),
        frame.tick_volume.to_string(),
        frame.ema_fast.to_string(),
        frame.ema_slow.to_string(),
        frame.rsi.to_string(),
        frame.macd.to_string(),
        frame.macd_signal.to_string(),
        frame.macd_hist.to_string(),
        frame.atr.to_string(),
        format_opt(frame.bb_mid),
        format_opt(frame.bb_upper),
        format_opt(frame.bb_lower),
    ]
}

pub fn write_indicators_csv(path: &Path, frames: &[IndicatorFrame]) -> Result<(), FxError> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| report_err(path, e))?;
    wtr.write_record(FRAME_HEADERS)
        .map_err(|e| report_err(path, e))?;
    for frame in frames {
        wtr.write_record(frame_fields(frame))
            .map_err(|e| report_err(path, e))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Indicator columns followed by `signal, score, sl, tp`. Brackets are empty
/// on flat rows.
pub fn write_signals_csv(path: &Path, records: &[SignalRecord]) -> Result<(), FxError> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| report_err(path, e))?;
    let mut headers: Vec<&str> = FRAME_HEADERS.to_vec();
    headers.extend(["signal", "score", "sl", "tp"]);
    wtr.write_record(&headers)
        .map_err(|e| report_err(path, e))?;

    for record in records {
        let mut fields = frame_fields(&record.frame);
        fields.push(record.signal.as_i8().to_string());
        fields.push(record.score.to_string());
        fields.push(format_opt(record.bracket.map(|b| b.stop_loss)));
        fields.push(format_opt(record.bracket.map(|b| b.take_profit)));
        wtr.write_record(&fields)
            .map_err(|e| report_err(path, e))?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn setup_csv(content: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("EURUSD_M5.csv");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn fetch_bars_returns_correct_data() {
        let (_dir, path) = setup_csv(
            "timestamp,open,high,low,close,volume\n\
             2024-01-15 10:00:00,1.0900,1.0910,1.0890,1.0905,120\n\
             2024-01-15 10:05:00,1.0905,1.0920,1.0900,1.0915,80\n",
        );
        let bars = CsvAdapter::new(path).fetch_bars().unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(
            bars[0].timestamp,
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()
        );
        assert_eq!(bars[0].open, 1.0900);
        assert_eq!(bars[0].high, 1.0910);
        assert_eq!(bars[0].low, 1.0890);
        assert_eq!(bars[0].close, 1.0905);
        assert_eq!(bars[0].volume, Some(120.0));
    }

    #[test]
    fn volume_is_optional() {
        let (_dir, path) = setup_csv(
            "timestamp,open,high,low,close\n\
             2024-01-15T10:00:00Z,1.0,1.1,0.9,1.05\n",
        );
        let bars = CsvAdapter::new(path).fetch_bars().unwrap();
        assert_eq!(bars[0].volume, None);
    }

    #[test]
    fn empty_volume_cell_is_none() {
        let (_dir, path) = setup_csv(
            "timestamp,open,high,low,close,volume\n\
             2024-01-15T10:00:00Z,1.0,1.1,0.9,1.05,\n",
        );
        let bars = CsvAdapter::new(path).fetch_bars().unwrap();
        assert_eq!(bars[0].volume, None);
    }

    #[test]
    fn rfc3339_offsets_are_normalised_to_utc() {
        let ts = parse_timestamp("2024-01-15T12:00:00+02:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap());
    }

    #[test]
    fn duplicates_keep_last_and_sort() {
        let (_dir, path) = setup_csv(
            "timestamp,open,high,low,close\n\
             2024-01-15 10:05:00,2.0,2.0,2.0,2.0\n\
             2024-01-15 10:00:00,1.0,1.0,1.0,1.0\n\
             2024-01-15 10:05:00,3.0,3.0,3.0,3.0\n",
        );
        let bars = CsvAdapter::new(path).fetch_bars().unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 1.0);
        assert_eq!(bars[1].close, 3.0);
    }

    #[test]
    fn missing_column_is_error() {
        let (_dir, path) = setup_csv("timestamp,open,high,close\n2024-01-15,1,1,1\n");
        let err = CsvAdapter::new(path).fetch_bars().unwrap_err();
        assert!(matches!(err, FxError::DataSource { ref reason } if reason.contains("low")));
    }

    #[test]
    fn bad_price_is_error() {
        let (_dir, path) = setup_csv("timestamp,open,high,low,close\n2024-01-15,1,x,1,1\n");
        assert!(CsvAdapter::new(path).fetch_bars().is_err());
    }

    #[test]
    fn missing_file_is_error() {
        let adapter = CsvAdapter::new(PathBuf::from("/nonexistent/bars.csv"));
        assert!(matches!(
            adapter.fetch_bars(),
            Err(FxError::DataSource { .. })
        ));
    }

    #[test]
    fn bars_written_can_be_read_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        let bars = vec![Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 5, 0).unwrap(),
            open: 1.08,
            high: 1.09,
            low: 1.07,
            close: 1.085,
            volume: Some(250.0),
        }];
        write_bars_csv(&path, &bars).unwrap();
        let read = CsvAdapter::new(path).fetch_bars().unwrap();
        assert_eq!(read, bars);
    }

    #[test]
    fn describe_names_path() {
        let adapter = CsvAdapter::new(PathBuf::from("data/eurusd.csv"));
        assert_eq!(adapter.describe(), "csv:data/eurusd.csv");
    }
}
