// Reading the statement of votes spreadsheets, one file per contest.

use std::fs;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, DataType, Range, Reader};
use precinct_results::RawRow;

use crate::sov::config_reader::SheetLayout;
use crate::sov::io_common::{cell_to_count, cell_to_string};
use crate::sov::*;

/// The content of one contest spreadsheet, before any name is resolved.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ContestSheet {
    /// The candidate column labels, as printed in the header.
    pub labels: Vec<String>,
    pub rows: Vec<RawRow>,
}

/// Lists the spreadsheets of a results directory, in file name order.
pub fn list_contest_files(dir: &Path) -> SovResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).context(ListingDirectorySnafu {
        path: dir.display().to_string(),
    })?;
    let mut res: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let p = entry
            .context(ListingDirectorySnafu {
                path: dir.display().to_string(),
            })?
            .path();
        let is_sheet = p
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("xls") || e.eq_ignore_ascii_case("xlsx"))
            .unwrap_or(false);
        if is_sheet && p.is_file() {
            res.push(p);
        } else {
            debug!("list_contest_files: skipping {:?}", p);
        }
    }
    res.sort();
    Ok(res)
}

pub fn read_contest_sheet(path: &str, layout: &SheetLayout) -> SovResult<ContestSheet> {
    let mut workbook = open_workbook_auto(path).context(OpeningExcelSnafu { path })?;
    let wrange = workbook
        .worksheet_range_at(0)
        .context(EmptyExcelSnafu { path })?
        .context(OpeningExcelSnafu { path })?;
    parse_contest_range(path, &wrange, layout)
}

/// Reads a sheet whose first used cell may not be A1.
pub fn parse_contest_range(
    path: &str,
    wrange: &Range<DataType>,
    layout: &SheetLayout,
) -> SovResult<ContestSheet> {
    let (start_row, start_col) = wrange.start().context(EmptyExcelSnafu { path })?;
    debug!(
        "parse_contest_range: {}: first used cell at row {}, column {}",
        path,
        start_row + 1,
        start_col + 1
    );
    parse_contest_rows(
        path,
        wrange.rows(),
        (start_row as usize, start_col as usize),
        layout,
    )
}

fn find_column(path: &str, header: &[DataType], name: &str) -> SovResult<usize> {
    header
        .iter()
        .position(|c| cell_to_string(c).as_deref() == Some(name))
        .context(ExcelMissingColumnSnafu { path, column: name })
}

/// Reads the rows of the first sheet of a statement of votes.
///
/// `origin` is the 0-based (row, column) of the first cell of `rows` in the
/// sheet, so that the layout indexes stay absolute. The rows before the
/// header are titles and are ignored. Rows with no content at all are
/// skipped.
pub fn parse_contest_rows<'a>(
    path: &str,
    rows: impl Iterator<Item = &'a [DataType]>,
    origin: (usize, usize),
    layout: &SheetLayout,
) -> SovResult<ContestSheet> {
    let (origin_row, origin_col) = origin;
    let header_idx = layout.header_row_index()?;
    let first_candidate_idx = layout.first_candidate_column_index()?;
    let header_rel = header_idx
        .checked_sub(origin_row)
        .context(ExcelLayoutOutsideSheetSnafu {
            path,
            field: "headerRowIndex",
            index: header_idx + 1,
        })?;
    let first_candidate_rel =
        first_candidate_idx
            .checked_sub(origin_col)
            .context(ExcelLayoutOutsideSheetSnafu {
                path,
                field: "firstCandidateColumnIndex",
                index: first_candidate_idx + 1,
            })?;

    let mut iter = rows.skip(header_rel);
    let header = iter.next().context(EmptyExcelSnafu { path })?;
    debug!("parse_contest_rows: header: {:?}", header);

    let precinct_col = find_column(path, header, layout.precinct_column())?;
    let type_col = find_column(path, header, layout.type_column())?;
    // Some exports omit the polling place column.
    let location_col = find_column(path, header, layout.location_column()).ok();

    let candidate_cols: Vec<(usize, String)> = header
        .iter()
        .enumerate()
        .skip(first_candidate_rel)
        .filter_map(|(idx, c)| cell_to_string(c).map(|s| (idx, s)))
        .collect();
    debug!(
        "parse_contest_rows: {}: candidate columns: {:?}",
        path, candidate_cols
    );

    let empty = DataType::Empty;
    let mut res: Vec<RawRow> = Vec::new();
    for (idx, row) in iter.enumerate() {
        // 1-based, as displayed by spreadsheet programs
        let lineno = (header_idx + idx + 2) as u64;
        if row.iter().all(|c| cell_to_string(c).is_none()) {
            continue;
        }
        let cell = |i: usize| row.get(i).unwrap_or(&empty);
        let precinct_id = cell_to_string(cell(precinct_col)).context(ExcelWrongCellTypeSnafu {
            path,
            lineno,
            content: format!("{:?}", cell(precinct_col)),
        })?;
        let vote_type = cell_to_string(cell(type_col)).unwrap_or_default();
        let location = location_col.and_then(|i| cell_to_string(cell(i)));
        let mut counts: Vec<u64> = Vec::with_capacity(candidate_cols.len());
        for (col, _) in candidate_cols.iter() {
            let c = cell(*col);
            let count = cell_to_count(c).context(ExcelWrongCellTypeSnafu {
                path,
                lineno,
                content: format!("{:?}", c),
            })?;
            counts.push(count);
        }
        res.push(RawRow {
            precinct_id,
            vote_type,
            location,
            counts,
        });
    }
    Ok(ContestSheet {
        labels: candidate_cols.into_iter().map(|(_, s)| s).collect(),
        rows: res,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::Cell;

    fn s(x: &str) -> DataType {
        DataType::String(x.to_string())
    }

    fn layout() -> SheetLayout {
        serde_json::from_str(r#"{"headerRowIndex": 2, "firstCandidateColumnIndex": "D"}"#)
            .unwrap()
    }

    #[test]
    fn rows_are_read_after_the_header() {
        let rows: Vec<Vec<DataType>> = vec![
            vec![s("Mayor")],
            vec![s("PRECINCT"), s("TYPE"), s("LOCATION"), s("BREED"), s(""), s("LENO ")],
            vec![DataType::Float(1101.0), s("POLLING PLACE"), DataType::Empty, DataType::Float(10.0), DataType::Empty, DataType::Int(3)],
            vec![DataType::Empty, DataType::Empty],
            vec![s("1101"), s("TOTAL"), s("CITY HALL"), DataType::Float(10.0)],
        ];
        let sheet = parse_contest_rows("results-5.xls", rows.iter().map(|r| r.as_slice()), (0, 0), &layout())
            .unwrap();
        assert_eq!(sheet.labels, vec!["BREED".to_string(), "LENO".to_string()]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0].precinct_id, "1101");
        assert_eq!(sheet.rows[0].vote_type, "POLLING PLACE");
        assert_eq!(sheet.rows[0].location, None);
        assert_eq!(sheet.rows[0].counts, vec![10, 3]);
        // Short rows read as empty cells.
        assert_eq!(sheet.rows[1].counts, vec![10, 0]);
        assert_eq!(sheet.rows[1].location.as_deref(), Some("CITY HALL"));
    }

    fn offset_sheet() -> Range<DataType> {
        // Column A is empty on every row: the used range starts at B1.
        let cells = vec![
            Cell::new((0, 1), s("Mayor")),
            Cell::new((2, 1), s("PRECINCT")),
            Cell::new((2, 2), s("TYPE")),
            Cell::new((2, 3), s("LOCATION")),
            Cell::new((2, 8), s("BREED")),
            Cell::new((2, 9), s("LENO")),
            Cell::new((3, 1), s("1101")),
            Cell::new((3, 2), s("TOTAL")),
            Cell::new((3, 3), s("CITY HALL")),
            Cell::new((3, 8), DataType::Float(15.0)),
            Cell::new((3, 9), DataType::Float(5.0)),
        ];
        Range::from_sparse(cells)
    }

    #[test]
    fn layout_indexes_are_absolute() {
        let wrange = offset_sheet();
        assert_eq!(wrange.start(), Some((0, 1)));
        // Default layout: header on row 3, candidates from column I.
        let sheet = parse_contest_range("results-5.xls", &wrange, &SheetLayout::default()).unwrap();
        assert_eq!(sheet.labels, vec!["BREED".to_string(), "LENO".to_string()]);
        assert_eq!(sheet.rows.len(), 1);
        assert_eq!(sheet.rows[0].counts, vec![15, 5]);
        assert_eq!(sheet.rows[0].location.as_deref(), Some("CITY HALL"));
    }

    #[test]
    fn layout_before_the_used_range_fails() {
        let wrange = offset_sheet();
        let layout: SheetLayout =
            serde_json::from_str(r#"{"firstCandidateColumnIndex": "A"}"#).unwrap();
        let err = parse_contest_range("results-5.xls", &wrange, &layout).unwrap_err();
        assert!(matches!(
            err,
            SovError::ExcelLayoutOutsideSheet { index: 1, .. }
        ));

        let rows: Vec<Vec<DataType>> = vec![vec![s("PRECINCT"), s("TYPE")]];
        let layout: SheetLayout = serde_json::from_str(r#"{"headerRowIndex": 1}"#).unwrap();
        let err = parse_contest_rows(
            "results-5.xls",
            rows.iter().map(|r| r.as_slice()),
            (2, 0),
            &layout,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SovError::ExcelLayoutOutsideSheet { index: 1, .. }
        ));
    }

    #[test]
    fn fractional_counts_are_rejected() {
        let rows: Vec<Vec<DataType>> = vec![
            vec![s("PRECINCT"), s("TYPE"), s("LOCATION"), s("BREED")],
            vec![s("1101"), s("TOTAL"), s(""), DataType::Float(2.5)],
        ];
        let layout: SheetLayout =
            serde_json::from_str(r#"{"headerRowIndex": 1, "firstCandidateColumnIndex": 4}"#)
                .unwrap();
        let err = parse_contest_rows("results-5.xls", rows.iter().map(|r| r.as_slice()), (0, 0), &layout)
            .unwrap_err();
        assert!(matches!(err, SovError::ExcelWrongCellType { lineno: 2, .. }));
    }

    #[test]
    fn missing_columns_are_reported() {
        let rows: Vec<Vec<DataType>> = vec![vec![s("PCT"), s("TYPE")]];
        let layout: SheetLayout = serde_json::from_str(r#"{"headerRowIndex": 1}"#).unwrap();
        let err = parse_contest_rows("results-5.xls", rows.iter().map(|r| r.as_slice()), (0, 0), &layout)
            .unwrap_err();
        assert!(matches!(err, SovError::ExcelMissingColumn { .. }));
    }

    #[test]
    fn short_sheets_are_reported() {
        let rows: Vec<Vec<DataType>> = vec![vec![s("Mayor")]];
        let err = parse_contest_rows(
            "results-5.xls",
            rows.iter().map(|r| r.as_slice()),
            (0, 0),
            &SheetLayout::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SovError::EmptyExcel { .. }));
    }
}
