use std::collections::BTreeMap;
use std::ops::Range;
use std::path::Path;

use super::error::ExtractError;

/// Names of the eight plane columns of a simulator output line, in line order
pub const COLUMN_NAMES: [&str; 8] = ["v0", "v1", "u0", "u1", "x0", "x1", "x2", "x3"];

/// Describes where the fields of a simulator output line live.
///
/// Offsets are in characters. The value span may contain spaces, which are
/// dropped before the digits are grouped into values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesExtractor {
    pub header_prefix: Option<String>,
    pub error_code: Range<usize>,
    pub span: Range<usize>,
    pub digits_per_value: usize,
}

impl Default for SeriesExtractor {
    fn default() -> Self {
        Self {
            header_prefix: Some(String::from("A3")),
            error_code: 6..8,
            span: 12..59,
            digits_per_value: 4,
        }
    }
}

/// The values of one line and the error code it carried
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSeries {
    pub values: Vec<u32>,
    pub error_code: String,
}

/// All lines extracted from a file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSeries {
    pub lines: Vec<LineSeries>,
}

impl FieldSeries {
    /// Lines grouped by their error code, codes in ascending order
    pub fn grouped(&self) -> BTreeMap<&str, Vec<&LineSeries>> {
        let mut groups: BTreeMap<&str, Vec<&LineSeries>> = BTreeMap::new();
        for line in &self.lines {
            groups.entry(line.error_code.as_str()).or_default().push(line);
        }
        groups
    }

    /// Split the values into the eight plane columns, keeping the non-zero
    /// values sorted. Passing an error code restricts the split to lines with
    /// that code; None takes every line.
    pub fn per_column(&self, error_code: Option<&str>) -> BTreeMap<&'static str, Vec<u32>> {
        let mut columns: BTreeMap<&'static str, Vec<u32>> =
            COLUMN_NAMES.iter().map(|name| (*name, Vec::new())).collect();
        for line in self
            .lines
            .iter()
            .filter(|line| error_code.map_or(true, |code| line.error_code == code))
        {
            if line.values.len() > COLUMN_NAMES.len() {
                log::warn!(
                    "Line with error code {} has {} values; only the first {} are kept",
                    line.error_code,
                    line.values.len(),
                    COLUMN_NAMES.len()
                );
            }
            for (name, value) in COLUMN_NAMES.iter().zip(&line.values) {
                if *value != 0 {
                    if let Some(column) = columns.get_mut(name) {
                        column.push(*value);
                    }
                }
            }
        }
        for column in columns.values_mut() {
            column.sort_unstable();
        }
        columns
    }
}

impl SeriesExtractor {
    /// Values of a single line. Leading digits are zero padded so that every
    /// value has `digits_per_value` digits.
    fn parse_values(&self, line: &str) -> Result<Vec<u32>, ExtractError> {
        let end = self.span.end.min(line.len());
        let digits: Vec<char> = match line.get(self.span.start..end) {
            Some(span) => span.chars().filter(|c| !c.is_whitespace()).collect(),
            None => Vec::new(),
        };
        if digits.is_empty() {
            return Ok(Vec::new());
        }
        let width = self.digits_per_value.max(1);
        let padding = (width - digits.len() % width) % width;
        let padded: Vec<char> = std::iter::repeat('0')
            .take(padding)
            .chain(digits)
            .collect();

        let mut values = Vec::with_capacity(padded.len() / width);
        for chunk in padded.chunks(width) {
            let text: String = chunk.iter().collect();
            values.push(u32::from_str_radix(&text, 16)?);
        }
        Ok(values)
    }

    /// Extract a line; `line_number` is only used to report errors.
    /// Returns None when the span holds no values.
    pub fn extract_line(
        &self,
        line: &str,
        line_number: usize,
    ) -> Result<Option<LineSeries>, ExtractError> {
        if let Some(prefix) = &self.header_prefix {
            let head = line.get(..prefix.len()).unwrap_or(line);
            if !head.eq_ignore_ascii_case(prefix) {
                return Err(ExtractError::MissingHeader(line_number, head.to_string()));
            }
        }
        let error_code = line
            .get(self.error_code.clone())
            .ok_or(ExtractError::ShortLine(line_number))?
            .to_string();

        let values = self.parse_values(line)?;
        if values.is_empty() {
            return Ok(None);
        }
        Ok(Some(LineSeries { values, error_code }))
    }

    /// Extract every non blank line of a text
    pub fn extract_text(&self, text: &str) -> Result<FieldSeries, ExtractError> {
        let mut series = FieldSeries::default();
        for (idx, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(extracted) = self.extract_line(line, idx + 1)? {
                series.lines.push(extracted);
            }
        }
        log::info!("Extracted {} lines of values", series.lines.len());
        Ok(series)
    }

    pub fn extract_file(&self, path: &Path) -> Result<FieldSeries, ExtractError> {
        if !path.exists() {
            return Err(ExtractError::BadFilePath(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        self.extract_text(&text)
    }
}
