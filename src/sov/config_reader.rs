use crate::sov::*;

use precinct_results::DuplicateRowPolicy;
use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use std::fs;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct InputSettings {
    #[serde(rename = "electionData")]
    pub election_data: String,
    #[serde(rename = "counterData")]
    pub counter_data: Option<String>,
    pub precincts: String,
    #[serde(rename = "resultsDirectory")]
    pub results_directory: String,
    #[serde(rename = "precinctGeometry")]
    pub precinct_geometry: Option<String>,
    #[serde(rename = "geometryIdProperty")]
    pub geometry_id_property: Option<String>,
}

impl InputSettings {
    pub fn geometry_id_property(&self) -> &str {
        self.geometry_id_property.as_deref().unwrap_or("Precinct")
    }
}

/// Where the data sits in a statement of votes spreadsheet.
///
/// Row and column indexes start at 1, as in Excel. Columns may also be given
/// with their letters ("I").
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct SheetLayout {
    #[serde(rename = "headerRowIndex")]
    _header_row_index: Option<JSValue>,
    #[serde(rename = "firstCandidateColumnIndex")]
    _first_candidate_column_index: Option<JSValue>,
    #[serde(rename = "precinctColumn")]
    pub precinct_column: Option<String>,
    #[serde(rename = "typeColumn")]
    pub type_column: Option<String>,
    #[serde(rename = "locationColumn")]
    pub location_column: Option<String>,
}

impl SheetLayout {
    /// The 0-based index of the header row.
    pub fn header_row_index(&self) -> SovResult<usize> {
        read_js_index(&self._header_row_index, "headerRowIndex", 3)
    }

    /// The 0-based index of the first candidate column.
    pub fn first_candidate_column_index(&self) -> SovResult<usize> {
        read_js_index(
            &self._first_candidate_column_index,
            "firstCandidateColumnIndex",
            9,
        )
    }

    pub fn precinct_column(&self) -> &str {
        self.precinct_column.as_deref().unwrap_or("PRECINCT")
    }

    pub fn type_column(&self) -> &str {
        self.type_column.as_deref().unwrap_or("TYPE")
    }

    pub fn location_column(&self) -> &str {
        self.location_column.as_deref().unwrap_or("LOCATION")
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "generateCsv")]
    pub generate_csv: Option<bool>,
    #[serde(rename = "generateJson")]
    pub generate_json: Option<bool>,
}

impl OutputSettings {
    pub fn output_directory(&self) -> &str {
        self.output_directory.as_deref().unwrap_or("output")
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct SovRules {
    #[serde(rename = "duplicateRowPolicy")]
    _duplicate_row_policy: Option<String>,
}

impl SovRules {
    pub fn duplicate_row_policy(&self) -> SovResult<DuplicateRowPolicy> {
        match self._duplicate_row_policy.as_deref() {
            None | Some("reject") => Ok(DuplicateRowPolicy::Reject),
            Some("overwrite") => Ok(DuplicateRowPolicy::Overwrite),
            Some(x) => UnknownOptionSnafu {
                field: "duplicateRowPolicy",
                value: x,
            }
            .fail(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SovConfig {
    #[serde(rename = "inputSettings")]
    pub input_settings: InputSettings,
    #[serde(rename = "sheetLayout", default)]
    pub sheet_layout: SheetLayout,
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(default)]
    pub rules: SovRules,
}

pub fn parse_config(contents: &str, path: &str) -> SovResult<SovConfig> {
    serde_json::from_str(contents).context(ParsingJsonSnafu { path })
}

pub fn read_config(path: &str) -> SovResult<SovConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    parse_config(&contents, path)
}

/// Reads a reference precinct_results.json file.
pub fn read_summary(path: &str) -> SovResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })
}

/// Reads a non-negative integer that may be written as a number or a string.
pub fn read_js_int(x: &JSValue, field: &str) -> SovResult<u64> {
    match x {
        JSValue::Number(n) => n.as_u64().context(ParsingJsonNumberSnafu { field }),
        JSValue::String(s) => s
            .trim()
            .parse::<u64>()
            .ok()
            .context(ParsingJsonNumberSnafu { field }),
        _ => None::<u64>.context(ParsingJsonNumberSnafu { field }),
    }
}

/// Reads a boolean that may be written as true/false or 1/0.
pub fn read_js_bool(x: &JSValue, field: &str) -> SovResult<bool> {
    match x {
        JSValue::Bool(b) => Ok(*b),
        JSValue::Number(n) if n.as_u64() == Some(0) => Ok(false),
        JSValue::Number(n) if n.as_u64() == Some(1) => Ok(true),
        JSValue::Null => Ok(false),
        _ => None::<bool>.context(ParsingJsonNumberSnafu { field }),
    }
}

/// Reads a 1-based row or column index and returns it 0-based.
fn read_js_index(x: &Option<JSValue>, field: &str, default: usize) -> SovResult<usize> {
    let one_based: usize = match x {
        None => default,
        // Excel-style column letters
        Some(JSValue::String(s))
            if !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic()) =>
        {
            let mut idx: usize = 0;
            for c in s.to_ascii_uppercase().chars() {
                idx = idx
                    .checked_mul(26)
                    .and_then(|x| x.checked_add(c as usize - 'A' as usize + 1))
                    .context(ParsingJsonNumberSnafu { field })?;
            }
            idx
        }
        Some(js) => read_js_int(js, field)? as usize,
    };
    one_based
        .checked_sub(1)
        .context(ParsingJsonNumberSnafu { field })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = parse_config(
            r#"{"inputSettings": {
                "electionData": "inputs/election_data.json",
                "precincts": "inputs/precincts.csv",
                "resultsDirectory": "tmp/results"}}"#,
            "config.json",
        )
        .unwrap();
        assert_eq!(config.input_settings.counter_data, None);
        assert_eq!(config.input_settings.geometry_id_property(), "Precinct");
        assert_eq!(config.sheet_layout.header_row_index().unwrap(), 2);
        assert_eq!(config.sheet_layout.first_candidate_column_index().unwrap(), 8);
        assert_eq!(config.sheet_layout.precinct_column(), "PRECINCT");
        assert_eq!(config.output_settings.output_directory(), "output");
        assert_eq!(
            config.rules.duplicate_row_policy().unwrap(),
            DuplicateRowPolicy::Reject
        );
    }

    #[test]
    fn layout_accepts_numbers_strings_and_letters() {
        let config = parse_config(
            r#"{"inputSettings": {
                "electionData": "e.json", "precincts": "p.csv", "resultsDirectory": "r"},
                "sheetLayout": {"headerRowIndex": "1", "firstCandidateColumnIndex": "AA"},
                "rules": {"duplicateRowPolicy": "overwrite"}}"#,
            "config.json",
        )
        .unwrap();
        assert_eq!(config.sheet_layout.header_row_index().unwrap(), 0);
        assert_eq!(config.sheet_layout.first_candidate_column_index().unwrap(), 26);
        assert_eq!(
            config.rules.duplicate_row_policy().unwrap(),
            DuplicateRowPolicy::Overwrite
        );
    }

    #[test]
    fn bad_options_are_reported() {
        let config = parse_config(
            r#"{"inputSettings": {
                "electionData": "e.json", "precincts": "p.csv", "resultsDirectory": "r"},
                "sheetLayout": {"headerRowIndex": 0},
                "rules": {"duplicateRowPolicy": "ignore"}}"#,
            "config.json",
        )
        .unwrap();
        assert!(matches!(
            config.sheet_layout.header_row_index(),
            Err(SovError::ParsingJsonNumber { .. })
        ));
        assert!(matches!(
            config.rules.duplicate_row_policy(),
            Err(SovError::UnknownOption { .. })
        ));
    }

    #[test]
    fn oversized_column_letters_are_reported() {
        let layout: SheetLayout =
            serde_json::from_str(r#"{"firstCandidateColumnIndex": "ZZZZZZZZZZZZZZZZZZZZZZZZZZZZZZ"}"#)
                .unwrap();
        assert!(matches!(
            layout.first_candidate_column_index(),
            Err(SovError::ParsingJsonNumber { .. })
        ));
    }

    #[test]
    fn missing_inputs_fail() {
        assert!(matches!(
            parse_config(r#"{"inputSettings": {}}"#, "config.json"),
            Err(SovError::ParsingJson { .. })
        ));
    }
}
