//! Movie credit records and the TSV reader that produces them.

use crate::error::NetworkError;
use castnet_core::InputConfig;
use std::collections::HashMap;
use std::path::Path;

/// Values some upstream exports write for a missing field.
const NULL_MARKERS: [&str; 4] = ["\\N", "nan", "NaN", "None"];

/// A credit field after parsing: either a proper list of keys or the reason it isn't one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreditList {
    Listed(Vec<String>),
    Malformed(String),
}

impl CreditList {
    /// Parse a separator-joined credit field. Keys are whitespace-trimmed.
    ///
    /// A missing, blank, or null-marker field is malformed, as is a list with an
    /// empty element (`"a,,b"`).
    pub fn parse(field: Option<&str>, separator: char) -> Self {
        let Some(raw) = field else {
            return Self::Malformed("field is missing".to_string());
        };
        let raw = raw.trim();
        if raw.is_empty() {
            return Self::Malformed("field is empty".to_string());
        }
        if NULL_MARKERS.contains(&raw) {
            return Self::Malformed(format!("field is a null marker ({raw})"));
        }
        let mut keys = Vec::new();
        for (pos, key) in raw.split(separator).enumerate() {
            let key = key.trim();
            if key.is_empty() {
                return Self::Malformed(format!("element {pos} is empty"));
            }
            keys.push(key.to_string());
        }
        Self::Listed(keys)
    }

    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Listed(keys.into_iter().map(Into::into).collect())
    }
}

/// One movie's credits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieRecord {
    pub id: String,
    /// Release year; `None` when the row carries no parseable year.
    pub year: Option<i32>,
    pub cast: CreditList,
    /// Director list; `None` when the input has no crew column at all.
    pub crew: Option<CreditList>,
}

impl MovieRecord {
    /// Actor-only record, mostly for tests and programmatic callers.
    pub fn new<I, S>(id: &str, year: i32, cast: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.to_string(),
            year: Some(year),
            cast: CreditList::from_keys(cast),
            crew: None,
        }
    }

    pub fn with_crew<I, S>(mut self, crew: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.crew = Some(CreditList::from_keys(crew));
        self
    }
}

/// Reads movie records from delimited text with a header row.
#[derive(Debug, Clone)]
pub struct RecordReader {
    config: InputConfig,
}

impl RecordReader {
    pub fn new(config: InputConfig) -> Self {
        Self { config }
    }

    pub fn read_path(&self, path: &Path) -> Result<Vec<MovieRecord>, NetworkError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            NetworkError::invalid_input(format!("failed to read {}: {e}", path.display()))
        })?;
        self.read_str(&content)
    }

    /// Parse every data row. Rows without an identifier are skipped with a warning.
    pub fn read_str(&self, content: &str) -> Result<Vec<MovieRecord>, NetworkError> {
        let delimiter = self.config.delimiter;
        let mut lines = content.lines();

        let header: HashMap<String, usize> = lines
            .next()
            .ok_or_else(|| NetworkError::invalid_input("empty movie table"))?
            .trim_start_matches('\u{feff}')
            .split(delimiter)
            .enumerate()
            .map(|(i, name)| (name.trim().trim_matches('"').to_string(), i))
            .collect();

        let id_col = *header.get(&self.config.id_column).ok_or_else(|| {
            NetworkError::invalid_input(format!("missing column '{}'", self.config.id_column))
        })?;
        let cast_col = *header.get(&self.config.cast_column).ok_or_else(|| {
            NetworkError::invalid_input(format!("missing column '{}'", self.config.cast_column))
        })?;
        let year_col = header.get(&self.config.year_column).copied();
        let date_col = self
            .config
            .release_date_column
            .as_ref()
            .and_then(|name| header.get(name).copied());
        let crew_col = header.get(&self.config.crew_column).copied();

        let mut records = Vec::new();
        for (line_no, line) in lines.enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line
                .split(delimiter)
                .map(|s| s.trim().trim_matches('"'))
                .collect();
            let field = |col: usize| fields.get(col).copied();

            let id = field(id_col).unwrap_or_default();
            if id.is_empty() {
                // +2: one for the header, one for 1-based numbering.
                tracing::warn!(line = line_no + 2, "row has no movie id, skipping");
                continue;
            }

            let year = year_col
                .and_then(|c| field(c))
                .and_then(parse_year)
                .or_else(|| date_col.and_then(|c| field(c)).and_then(parse_release_date));

            records.push(MovieRecord {
                id: id.to_string(),
                year,
                cast: CreditList::parse(field(cast_col), self.config.list_separator),
                crew: crew_col.map(|c| CreditList::parse(field(c), self.config.list_separator)),
            });
        }

        tracing::debug!(rows = records.len(), "movie table parsed");
        Ok(records)
    }
}

fn parse_year(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    // Year columns exported through a float dtype read "2001.0".
    let raw = raw.strip_suffix(".0").unwrap_or(raw);
    raw.parse().ok()
}

fn parse_release_date(raw: &str) -> Option<i32> {
    chrono::NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .ok()
        .map(|d| chrono::Datelike::year(&d))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader() -> RecordReader {
        RecordReader::new(InputConfig::default())
    }

    #[test]
    fn test_credit_list_parse() {
        assert_eq!(
            CreditList::parse(Some(" nm1, nm2 ,nm3"), ','),
            CreditList::from_keys(["nm1", "nm2", "nm3"])
        );
        assert!(matches!(
            CreditList::parse(None, ','),
            CreditList::Malformed(_)
        ));
        assert!(matches!(
            CreditList::parse(Some("  "), ','),
            CreditList::Malformed(_)
        ));
        assert!(matches!(
            CreditList::parse(Some("\\N"), ','),
            CreditList::Malformed(_)
        ));
        assert!(matches!(
            CreditList::parse(Some("a,,b"), ','),
            CreditList::Malformed(_)
        ));
    }

    #[test]
    fn test_read_with_year_column() {
        let tsv = "tconst\tstartYear\tactors\tdirectors\n\
                   tt1\t2001\tA,B,C\tD1\n\
                   tt2\t2002.0\tB\t\n";
        let records = reader().read_str(tsv).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "tt1");
        assert_eq!(records[0].year, Some(2001));
        assert_eq!(records[0].cast, CreditList::from_keys(["A", "B", "C"]));
        assert_eq!(records[0].crew, Some(CreditList::from_keys(["D1"])));
        assert_eq!(records[1].year, Some(2002));
        assert!(matches!(records[1].crew, Some(CreditList::Malformed(_))));
    }

    #[test]
    fn test_read_falls_back_to_release_date() {
        let tsv = "tconst\trelease_date\tactors\n\
                   tt9\t2019-07-04\tA,B\n\
                   tt10\tsoon\tA\n";
        let records = reader().read_str(tsv).unwrap();
        assert_eq!(records[0].year, Some(2019));
        assert_eq!(records[1].year, None);
        assert_eq!(records[0].crew, None);
    }

    #[test]
    fn test_short_rows_and_missing_ids() {
        let tsv = "tconst\tstartYear\tactors\n\
                   tt1\t2001\n\
                   \t2001\tA,B\n";
        let records = reader().read_str(tsv).unwrap();
        assert_eq!(records.len(), 1);
        assert!(matches!(records[0].cast, CreditList::Malformed(_)));
    }

    #[test]
    fn test_header_with_byte_order_mark() {
        let tsv = "\u{feff}tconst\tstartYear\tactors\ntt1\t2001\tA,B\n";
        let records = reader().read_str(tsv).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "tt1");
        assert_eq!(records[0].cast, CreditList::from_keys(["A", "B"]));
    }

    #[test]
    fn test_missing_required_column() {
        let err = reader().read_str("id\tactors\nx\tA\n").unwrap_err();
        assert!(matches!(err, NetworkError::InvalidInput(_)));
        assert!(reader().read_str("").is_err());
    }
}
