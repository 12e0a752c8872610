// Primitives shared by the readers.

use std::path::Path;

use calamine::DataType;
use precinct_results::ContestId;

use crate::sov::*;

pub fn simplify_file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

/// The contest id is the integer after the last '-' of the file stem:
/// `sov-results-14.xls` holds contest 14.
pub fn contest_id_from_path(path: &Path) -> SovResult<ContestId> {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    stem.rsplit('-')
        .next()
        .and_then(|s| s.trim().parse::<u32>().ok())
        .map(ContestId)
        .context(ContestIdFromFileNameSnafu {
            path: simplify_file_name(path),
        })
}

/// The textual content of a cell. Integral numbers are written without a
/// decimal part, so that precinct 1101 read as a float is still "1101".
pub fn cell_to_string(cell: &DataType) -> Option<String> {
    match cell {
        DataType::String(s) => {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        }
        DataType::Int(i) => Some(i.to_string()),
        DataType::Float(f) if f.fract() == 0.0 => Some(format!("{}", *f as i64)),
        DataType::Float(f) => Some(f.to_string()),
        DataType::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A vote count. Empty cells count as zero; anything that is not a
/// non-negative integer is rejected.
pub fn cell_to_count(cell: &DataType) -> Option<u64> {
    match cell {
        DataType::Empty => Some(0),
        DataType::Int(i) if *i >= 0 => Some(*i as u64),
        DataType::Float(f) if *f >= 0.0 && f.fract() == 0.0 => Some(*f as u64),
        DataType::String(s) if s.trim().is_empty() => Some(0),
        DataType::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contest_ids_from_file_names() {
        assert_eq!(
            contest_id_from_path(Path::new("tmp/results/sov-results-14.xls")).unwrap(),
            ContestId(14)
        );
        assert_eq!(
            contest_id_from_path(Path::new("3.xlsx")).unwrap(),
            ContestId(3)
        );
        assert!(matches!(
            contest_id_from_path(Path::new("results-mayor.xls")),
            Err(SovError::ContestIdFromFileName { .. })
        ));
    }

    #[test]
    fn cells_as_strings() {
        assert_eq!(cell_to_string(&DataType::Float(1101.0)), Some("1101".to_string()));
        assert_eq!(cell_to_string(&DataType::Int(7)), Some("7".to_string()));
        assert_eq!(
            cell_to_string(&DataType::String(" PCT 1101 ".to_string())),
            Some("PCT 1101".to_string())
        );
        assert_eq!(cell_to_string(&DataType::String("  ".to_string())), None);
        assert_eq!(cell_to_string(&DataType::Empty), None);
    }

    #[test]
    fn cells_as_counts() {
        assert_eq!(cell_to_count(&DataType::Float(12.0)), Some(12));
        assert_eq!(cell_to_count(&DataType::Int(3)), Some(3));
        assert_eq!(cell_to_count(&DataType::Empty), Some(0));
        assert_eq!(cell_to_count(&DataType::String("42".to_string())), Some(42));
        assert_eq!(cell_to_count(&DataType::Float(1.5)), None);
        assert_eq!(cell_to_count(&DataType::Int(-1)), None);
        assert_eq!(cell_to_count(&DataType::String("n/a".to_string())), None);
    }
}
