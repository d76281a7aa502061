use std::collections::HashMap;
use std::io;
use std::path::Path;

use csv::{Reader, ReaderBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, ScheduleError};
use crate::schedule::SolveRequest;

const ACTIVITY_ALTERNATES: &[&str] = &["dance", "activity", "name", "dance name"];
const MEMBER_ALTERNATES: &[&str] = &["members", "dancers", "participants", "member"];

/// How to read an activity table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TableOptions {
    pub activity_column: String,
    pub member_column: String,
    /// Header rows (case-insensitive) that start a section to leave out
    pub exclude_section_headers: Vec<String>,
    /// Header rows (case-insensitive) that end a left-out section
    pub include_section_headers: Vec<String>,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            activity_column: "Dance".to_string(),
            member_column: "Members".to_string(),
            exclude_section_headers: vec!["not included".to_string()],
            include_section_headers: vec!["season dances".to_string(), "side projects".to_string()],
        }
    }
}

/// Activities in table order plus who takes part in each.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityTable {
    pub activities: Vec<String>,
    pub participants: HashMap<String, Vec<String>>,
}

impl ActivityTable {
    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    /// A request with no constraints, ready for the caller to fill in.
    pub fn into_request(self) -> SolveRequest {
        SolveRequest::new(self.activities, self.participants)
    }
}

/// Splits a member cell on commas, dropping blanks
pub fn parse_members(cell: &str) -> Vec<String> {
    cell.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}

fn find_column(headers: &[String], configured: &str, alternates: &[&str]) -> Result<usize> {
    let matches = |wanted: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(wanted.trim()))
    };
    matches(configured)
        .or_else(|| alternates.iter().find_map(|alt| matches(alt)))
        .ok_or_else(|| ScheduleError::MissingColumn(configured.to_string()))
}

fn collect_table<I>(headers: &[String], rows: I, options: &TableOptions) -> Result<ActivityTable>
where
    I: IntoIterator<Item = Result<Vec<String>>>,
{
    let activity_col = find_column(headers, &options.activity_column, ACTIVITY_ALTERNATES)?;
    let member_col = find_column(headers, &options.member_column, MEMBER_ALTERNATES)?;

    let is_header = |name: &str, list: &[String]| {
        let lower = name.to_lowercase();
        list.iter().any(|h| h.trim().to_lowercase() == lower)
    };

    let mut table = ActivityTable::default();
    let mut skip_section = false;

    for row in rows {
        let row = row?;
        let name = row.get(activity_col).map(|s| s.trim()).unwrap_or("");
        if name.is_empty() {
            continue;
        }

        if is_header(name, &options.exclude_section_headers) {
            debug!(header = name, "skipping section");
            skip_section = true;
            continue;
        }
        if is_header(name, &options.include_section_headers) {
            skip_section = false;
            continue;
        }
        if skip_section {
            continue;
        }

        let members = parse_members(row.get(member_col).map(String::as_str).unwrap_or(""));
        if table.participants.insert(name.to_string(), members).is_some() {
            warn!(activity = name, "activity listed twice, keeping the later row");
        } else {
            table.activities.push(name.to_string());
        }
    }

    debug!(activities = table.len(), "read activity table");
    Ok(table)
}

fn read_from<R: io::Read>(mut reader: Reader<R>, options: &TableOptions) -> Result<ActivityTable> {
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let rows = reader
        .records()
        .map(|record| -> Result<Vec<String>> { Ok(record?.iter().map(str::to_string).collect()) });
    collect_table(&headers, rows, options)
}

/// Loads activities from a CSV file
pub fn load_activities<P: AsRef<Path>>(
    csv_path: P,
    options: &TableOptions,
) -> Result<ActivityTable> {
    let reader = ReaderBuilder::new().flexible(true).from_path(csv_path)?;
    read_from(reader, options)
}

/// Reads activities from any CSV source, e.g. an uploaded body
pub fn read_activities<R: io::Read>(source: R, options: &TableOptions) -> Result<ActivityTable> {
    read_from(ReaderBuilder::new().flexible(true).from_reader(source), options)
}

/// Reads activities from spreadsheet values, first row being the header.
/// Rows may be shorter than the header.
pub fn table_from_rows(rows: &[Vec<String>], options: &TableOptions) -> Result<ActivityTable> {
    let (headers, body) = rows
        .split_first()
        .ok_or_else(|| ScheduleError::MissingColumn(options.activity_column.clone()))?;
    collect_table(headers, body.iter().cloned().map(Ok), options)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = "\
Dance,Members,Notes
Season Dances,,
Opening,\"Ana, Ben ,Cy\",
Tango,\"Ben,Dee\",
,,
Side Projects,,
Hip Hop,Eve,
NOT Included,,
Ballet,Ana,cut
Jazz,Ben,cut
";

    #[test]
    fn test_reads_and_skips_excluded_section() {
        let table = read_activities(SHEET.as_bytes(), &TableOptions::default()).unwrap();
        assert_eq!(table.activities, vec!["Opening", "Tango", "Hip Hop"]);
        assert_eq!(table.participants["Opening"], vec!["Ana", "Ben", "Cy"]);
        assert_eq!(table.participants["Hip Hop"], vec!["Eve"]);
        assert!(!table.participants.contains_key("Ballet"));
    }

    #[test]
    fn test_include_header_ends_skipped_section() {
        let csv = "Dance,Members\nA,x\nNot Included,\nB,y\nSide Projects,\nC,z\n";
        let table = read_activities(csv.as_bytes(), &TableOptions::default()).unwrap();
        assert_eq!(table.activities, vec!["A", "C"]);
    }

    #[test]
    fn test_alternate_column_names() {
        let csv = "Activity,Participants\nWarmup,\"p1, p2\"\n";
        let table = read_activities(csv.as_bytes(), &TableOptions::default()).unwrap();
        assert_eq!(table.activities, vec!["Warmup"]);
        assert_eq!(table.participants["Warmup"], vec!["p1", "p2"]);
    }

    #[test]
    fn test_missing_column() {
        let csv = "Title,Cast\nA,x\n";
        let err = read_activities(csv.as_bytes(), &TableOptions::default()).unwrap_err();
        assert!(matches!(err, ScheduleError::MissingColumn(ref c) if c == "Dance"));
    }

    #[test]
    fn test_rows_from_sheet_values() {
        let rows: Vec<Vec<String>> = vec![
            vec!["Dance".into(), "Members".into()],
            vec!["Solo".into()],
            vec!["Duet".into(), "a, b".into()],
            vec!["Duet".into(), "a, c".into()],
        ];
        let table = table_from_rows(&rows, &TableOptions::default()).unwrap();
        assert_eq!(table.activities, vec!["Solo", "Duet"]);
        assert!(table.participants["Solo"].is_empty());
        assert_eq!(table.participants["Duet"], vec!["a", "c"]);
    }

    #[test]
    fn test_custom_exclude_headers() {
        let options = TableOptions {
            exclude_section_headers: vec!["Alternates".into()],
            ..Default::default()
        };
        let csv = "Dance,Members\nA,x\nalternates,\nB,y\n";
        let table = read_activities(csv.as_bytes(), &options).unwrap();
        assert_eq!(table.activities, vec!["A"]);
    }
}
