//! SCADA CSV ingest.
//!
//! Turns a SCADA export (one `Timestamp` column plus any number of numeric
//! sensor columns) into a single aggregate `ScadaSeries`:
//!
//! - **Strict timestamps**: every row must carry a `Timestamp` in the fixed
//!   `DD-Mon-YY HH:MM:SS` format, otherwise the load fails
//! - **Permissive values**: empty or non-numeric sensor cells are treated as
//!   absent and skipped when summing
//! - **Permissive selection**: selectors that match nothing produce an
//!   all-NaN series with a warning, not an error

use std::fs::File;
use std::path::Path;

use chrono::NaiveDateTime;
use csv::StringRecord;
use log::{debug, info, warn};

use crate::domain::SourceSelection;
use crate::error::{Result, ScadaError};
use crate::io::groups::group_selectors;
use crate::series::ScadaSeries;

/// Name of the index column.
pub const TIMESTAMP_COLUMN: &str = "Timestamp";

/// `chrono` format of the `Timestamp` column, e.g. `01-Jan-15 00:00:00`.
pub const SCADA_DATE_FORMAT: &str = "%d-%b-%y %H:%M:%S";

/// What a load read and which columns it aggregated.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub rows_read: usize,
    pub sensor_columns: Vec<String>,
    pub selected_columns: Vec<String>,
    /// Non-empty sensor cells that did not parse as a finite number.
    pub malformed_cells: usize,
}

/// Load `path`, summing the columns that match `selectors` (all columns for `None`).
pub fn load<S: AsRef<str>>(path: impl AsRef<Path>, selectors: Option<&[S]>) -> Result<ScadaSeries> {
    load_with_report(path, selectors).map(|(series, _)| series)
}

/// Load the columns of a named site group.
///
/// Unknown groups resolve to no selectors, so the series aggregates zero
/// columns.
pub fn load_named_group(path: impl AsRef<Path>, group: &str) -> Result<ScadaSeries> {
    let selectors = resolve_group(group);
    let series = load(path, Some(selectors))?;
    Ok(series.with_name(group))
}

/// Load according to a CLI-style source selection.
pub fn load_selection(path: impl AsRef<Path>, source: &SourceSelection) -> Result<(ScadaSeries, LoadReport)> {
    match source {
        SourceSelection::All => load_with_report::<&str>(path, None),
        SourceSelection::Columns(selectors) => load_with_report(path, Some(selectors.as_slice())),
        SourceSelection::Group(group) => {
            let (series, report) = load_with_report(path, Some(resolve_group(group)))?;
            Ok((series.with_name(group.as_str()), report))
        }
    }
}

fn resolve_group(group: &str) -> &'static [&'static str] {
    group_selectors(group).unwrap_or_else(|| {
        warn!("unknown site group '{group}': no columns will be selected");
        &[]
    })
}

/// Load and also report what was read.
pub fn load_with_report<S: AsRef<str>>(
    path: impl AsRef<Path>,
    selectors: Option<&[S]>,
) -> Result<(ScadaSeries, LoadReport)> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| file_read_error(path, e.to_string()))?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| csv_error(path, e, 1))?
        .clone();

    let (ts_idx, sensors) = split_headers(&headers)?;

    let (selected_idx, selected_columns): (Vec<usize>, Vec<String>) = sensors
        .iter()
        .filter(|(_, name)| selectors.is_none_or(|s| matches_any(name, s)))
        .cloned()
        .unzip();
    let sensor_columns: Vec<String> = sensors.into_iter().map(|(_, name)| name).collect();

    if selected_columns.is_empty() {
        warn!(
            "no columns of '{}' matched {:?}; every row will aggregate to NaN",
            path.display(),
            selectors.map(|s| s.iter().map(AsRef::as_ref).collect::<Vec<_>>())
        );
    }

    let mut points = Vec::new();
    let mut malformed_cells = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header, CSV lines are 1-based.
        let line = idx + 2;
        let record = result.map_err(|e| csv_error(path, e, line))?;

        let raw = record.get(ts_idx).unwrap_or_default();
        let stamp = parse_timestamp(raw).map_err(|e| ScadaError::Schema(format!("line {line}: {e}")))?;

        let (value, malformed) = aggregate_row(&record, &selected_idx);
        malformed_cells += malformed;
        points.push((stamp, value));
    }

    let rows_read = points.len();
    if malformed_cells > 0 {
        warn!(
            "'{}': {malformed_cells} non-numeric sensor cell(s) treated as missing",
            path.display()
        );
    }

    let name = series_name(path, selectors);
    info!(
        "loaded '{}': {rows_read} rows, {}/{} columns selected",
        path.display(),
        selected_columns.len(),
        sensor_columns.len()
    );
    debug!("selected columns: {selected_columns:?}");

    let report = LoadReport {
        rows_read,
        sensor_columns,
        selected_columns,
        malformed_cells,
    };

    Ok((ScadaSeries::new(name, points), report))
}

/// Every column containing any selector as a substring, in column order.
///
/// `None` selects every column; an empty selector list selects nothing.
/// Matching is case-sensitive.
pub fn fuzzy_search<C: AsRef<str>, S: AsRef<str>>(columns: &[C], selectors: Option<&[S]>) -> Vec<String> {
    let Some(selectors) = selectors else {
        return columns.iter().map(|c| c.as_ref().to_string()).collect();
    };

    columns
        .iter()
        .map(AsRef::as_ref)
        .filter(|column| matches_any(column, selectors))
        .map(str::to_string)
        .collect()
}

fn matches_any<S: AsRef<str>>(column: &str, selectors: &[S]) -> bool {
    selectors.iter().any(|s| column.contains(s.as_ref()))
}

/// `fuzzy_search`, but an empty match is a `NoMatch` error.
pub fn require_match<C: AsRef<str>, S: AsRef<str>>(columns: &[C], selectors: Option<&[S]>) -> Result<Vec<String>> {
    let matched = fuzzy_search(columns, selectors);
    if matched.is_empty() {
        let wanted: Vec<&str> = selectors.unwrap_or_default().iter().map(AsRef::as_ref).collect();
        return Err(ScadaError::NoMatch(format!("no column matches any of {wanted:?}")));
    }
    Ok(matched)
}

/// Sensor column names of a SCADA export, without loading its rows.
pub fn read_columns(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| csv_error(path, e, 1))?;
    let headers = reader.headers().map_err(|e| csv_error(path, e, 1))?;

    let (_, sensors) = split_headers(headers)?;
    Ok(sensors.into_iter().map(|(_, name)| name).collect())
}

/// Index of the first `Timestamp` header plus every other `(index, name)`.
///
/// Later headers that are also named `Timestamp` count as sensor columns.
fn split_headers(headers: &StringRecord) -> Result<(usize, Vec<(usize, String)>)> {
    let ts_idx = headers
        .iter()
        .position(|name| normalize_header_name(name) == TIMESTAMP_COLUMN)
        .ok_or_else(|| ScadaError::Schema(format!("missing required column: `{TIMESTAMP_COLUMN}`")))?;

    let sensors = headers
        .iter()
        .enumerate()
        .filter(|&(idx, _)| idx != ts_idx)
        .map(|(idx, name)| (idx, normalize_header_name(name)))
        .collect();

    Ok((ts_idx, sensors))
}

/// Parse a `DD-Mon-YY HH:MM:SS` stamp.
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), SCADA_DATE_FORMAT).map_err(|_| {
        ScadaError::Schema(format!(
            "invalid timestamp '{s}' (expected DD-Mon-YY HH:MM:SS, e.g. 01-Jan-15 00:00:00)"
        ))
    })
}

pub fn format_timestamp(t: NaiveDateTime) -> String {
    t.format(SCADA_DATE_FORMAT).to_string()
}

/// Sum of the parseable cells, NaN when none are present.
fn aggregate_row(record: &StringRecord, selected_idx: &[usize]) -> (f64, usize) {
    let mut sum = 0.0;
    let mut present = 0usize;
    let mut malformed = 0usize;

    for &idx in selected_idx {
        match record.get(idx).map(str::trim).filter(|s| !s.is_empty()) {
            None => {}
            Some(cell) => match parse_cell(cell) {
                Some(v) => {
                    sum += v;
                    present += 1;
                }
                None => malformed += 1,
            },
        }
    }

    if present == 0 { (f64::NAN, malformed) } else { (sum, malformed) }
}

fn parse_cell(s: &str) -> Option<f64> {
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

fn normalize_header_name(name: &str) -> String {
    // Excel exports often prefix the first header with a UTF-8 BOM.
    name.trim().trim_start_matches('\u{feff}').to_string()
}

fn series_name<S: AsRef<str>>(path: &Path, selectors: Option<&[S]>) -> String {
    match selectors {
        Some(selectors) if !selectors.is_empty() => selectors
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join("+"),
        _ => path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "scada".to_string()),
    }
}

fn file_read_error(path: &Path, message: String) -> ScadaError {
    ScadaError::FileRead {
        path: path.display().to_string(),
        message,
    }
}

fn csv_error(path: &Path, err: csv::Error, line: usize) -> ScadaError {
    if err.is_io_error() {
        file_read_error(path, err.to_string())
    } else {
        ScadaError::Schema(format!("line {line}: {err}"))
    }
}

impl ScadaSeries {
    /// See [`load`].
    pub fn load<S: AsRef<str>>(path: impl AsRef<Path>, selectors: Option<&[S]>) -> Result<ScadaSeries> {
        load(path, selectors)
    }

    /// See [`load_named_group`].
    pub fn load_named_group(path: impl AsRef<Path>, group: &str) -> Result<ScadaSeries> {
        load_named_group(path, group)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use chrono::NaiveDate;
    use tempfile::NamedTempFile;

    use super::*;

    const SAMPLE: &str = "\
Timestamp,TAP_MW,TWF_MW,TWC_MW,WWD_MW
01-Jan-15 00:00:00,10,20,5,1
01-Jan-15 00:00:04,12,,6,2
01-Jan-15 00:00:08,,,,
01-Jan-15 00:00:12,11,18,x,3
";

    fn write_csv(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn values(s: &ScadaSeries) -> Vec<f64> {
        s.values().collect()
    }

    #[test]
    fn parses_fixed_timestamp_format() {
        let t = parse_timestamp("01-Jan-15 13:05:09").unwrap();
        let expected = NaiveDate::from_ymd_opt(2015, 1, 1)
            .unwrap()
            .and_hms_opt(13, 5, 9)
            .unwrap();
        assert_eq!(t, expected);
        assert_eq!(format_timestamp(t), "01-Jan-15 13:05:09");

        assert!(parse_timestamp("2015-01-01 00:00:00").is_err());
        assert!(parse_timestamp("01/Jan/15 00:00:00").is_err());
    }

    #[test]
    fn fuzzy_search_preserves_column_order() {
        let columns = ["TAP_MW", "TWF_MW", "Other"];
        assert_eq!(fuzzy_search(&columns, Some(&["TWF", "TAP"][..])), vec!["TAP_MW", "TWF_MW"]);
        assert_eq!(fuzzy_search(&columns, Some(&["MW"][..])), vec!["TAP_MW", "TWF_MW"]);
        assert!(fuzzy_search(&columns, Some(&["tap"][..])).is_empty());
        assert!(fuzzy_search::<_, &str>(&columns, Some(&[][..])).is_empty());
        assert_eq!(fuzzy_search::<_, &str>(&columns, None), vec!["TAP_MW", "TWF_MW", "Other"]);
    }

    #[test]
    fn require_match_reports_no_match() {
        let columns = ["TAP_MW"];
        assert!(matches!(
            require_match(&columns, Some(&["WHL"][..])),
            Err(ScadaError::NoMatch(_))
        ));
        assert_eq!(require_match(&columns, Some(&["TAP"][..])).unwrap(), vec!["TAP_MW"]);
    }

    #[test]
    fn load_all_sums_every_sensor_column() {
        let file = write_csv(SAMPLE);
        let (s, report) = load_with_report::<&str>(file.path(), None).unwrap();

        assert_eq!(report.rows_read, 4);
        assert_eq!(report.selected_columns.len(), 4);
        assert_eq!(report.malformed_cells, 1);

        let v = values(&s);
        assert_eq!(v[0], 36.0);
        assert_eq!(v[1], 20.0);
        assert!(v[2].is_nan());
        assert_eq!(v[3], 32.0);
    }

    #[test]
    fn load_with_selectors() {
        let file = write_csv(SAMPLE);
        let s = load(file.path(), Some(&["TWF", "TWC"][..])).unwrap();
        assert_eq!(s.name(), "TWF+TWC");
        let v = values(&s);
        assert_eq!(v[0], 25.0);
        assert_eq!(v[1], 6.0);
        assert!(v[2].is_nan());
        assert_eq!(v[3], 18.0);
    }

    #[test]
    fn named_group_matches_selector_load() {
        let file = write_csv(SAMPLE);
        let by_group = load_named_group(file.path(), "Te Apiti").unwrap();
        let by_selector = load(file.path(), Some(&["TAP"][..])).unwrap();

        assert_eq!(by_group.name(), "Te Apiti");
        assert_eq!(by_group.len(), by_selector.len());
        for (a, b) in by_group.points().iter().zip(by_selector.points()) {
            assert_eq!(a.0, b.0);
            assert!(a.1 == b.1 || (a.1.is_nan() && b.1.is_nan()));
        }
    }

    #[test]
    fn unknown_group_selects_nothing() {
        let file = write_csv(SAMPLE);
        let s = load_named_group(file.path(), "Atlantis").unwrap();
        assert_eq!(s.len(), 4);
        assert!(s.values().all(f64::is_nan));
    }

    #[test]
    fn missing_timestamp_column_is_schema_error() {
        let file = write_csv("Time,TAP_MW\n01-Jan-15 00:00:00,1\n");
        assert!(matches!(load::<&str>(file.path(), None), Err(ScadaError::Schema(_))));
    }

    #[test]
    fn bad_timestamp_is_schema_error() {
        let file = write_csv("Timestamp,TAP_MW\n01-Jan-15 00:00:00,1\n2015-01-01 00:00:04,2\n");
        let err = load::<&str>(file.path(), None).unwrap_err();
        assert!(matches!(&err, ScadaError::Schema(msg) if msg.contains("line 3")));
    }

    #[test]
    fn missing_file_is_file_read_error() {
        let err = load::<&str>("/definitely/not/here.csv", None).unwrap_err();
        assert!(matches!(err, ScadaError::FileRead { .. }));
    }

    #[test]
    fn bom_and_unsorted_rows_are_normalized() {
        let file = write_csv(
            "\u{feff}Timestamp,TAP_MW\n01-Jan-15 00:00:08,3\n01-Jan-15 00:00:00,1\n01-Jan-15 00:00:04,2\n",
        );
        let s = load::<&str>(file.path(), None).unwrap();
        assert_eq!(values(&s), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn reads_sensor_columns() {
        let file = write_csv(SAMPLE);
        assert_eq!(
            read_columns(file.path()).unwrap(),
            vec!["TAP_MW", "TWF_MW", "TWC_MW", "WWD_MW"]
        );
    }

    #[test]
    fn column_listing_matches_loaded_columns_with_repeated_timestamp_header() {
        let file = write_csv("Timestamp,TAP_MW,Timestamp\n01-Jan-15 00:00:00,1,2\n");

        let columns = read_columns(file.path()).unwrap();
        let (_, report) = load_with_report::<&str>(file.path(), None).unwrap();
        assert_eq!(columns, vec!["TAP_MW", "Timestamp"]);
        assert_eq!(columns, report.sensor_columns);

        let missing = write_csv("Time,TAP_MW\n01-Jan-15 00:00:00,1\n");
        assert!(matches!(read_columns(missing.path()), Err(ScadaError::Schema(_))));
    }
}
