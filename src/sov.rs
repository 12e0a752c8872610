use log::{debug, info, warn};

use precinct_results::*;
use snafu::{prelude::*, Snafu};

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use text_diff::print_diff;

use crate::sov::config_reader::*;

mod config_reader;
mod export;
mod io_common;
mod io_geometry;
mod io_metadata;
mod io_roster;
mod io_sov;

#[derive(Debug, Snafu)]
pub enum SovError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Expected a positive number for {field}"))]
    ParsingJsonNumber { field: String },
    #[snafu(display("Unknown value {value:?} for option {field}"))]
    UnknownOption { field: String, value: String },
    #[snafu(display("Could not find the parent directory of {path}"))]
    MissingParentDir { path: String },

    #[snafu(display("Error opening the CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error parsing line {lineno} of the CSV file {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: u64,
    },

    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::Error,
        path: String,
    },
    #[snafu(display("The spreadsheet {path} has no sheet or is too short"))]
    EmptyExcel { path: String },
    #[snafu(display("The spreadsheet {path} has no column {column:?}"))]
    ExcelMissingColumn { path: String, column: String },
    #[snafu(display("{path}: unexpected cell at line {lineno}: {content}"))]
    ExcelWrongCellType {
        path: String,
        lineno: u64,
        content: String,
    },
    #[snafu(display("{path}: {field} {index} points before the first used cell of the sheet"))]
    ExcelLayoutOutsideSheet {
        path: String,
        field: String,
        index: usize,
    },
    #[snafu(display("Could not read a contest id from the file name {path}"))]
    ContestIdFromFileName { path: String },
    #[snafu(display("Error listing the directory {path}"))]
    ListingDirectory {
        source: std::io::Error,
        path: String,
    },

    #[snafu(display("Feature {index} of {path} has no property {property:?}"))]
    MissingGeometryId {
        path: String,
        index: usize,
        property: String,
    },

    #[snafu(display("Error loading the precinct roster {path}"))]
    Roster {
        source: ResultsError,
        path: String,
    },
    #[snafu(display("Error loading contest {contest_id} from the election data"))]
    ContestMetadata {
        source: ResultsError,
        contest_id: u32,
    },
    #[snafu(display("Error loading the results of contest {contest_id} from {path}"))]
    ContestResults {
        source: ResultsError,
        contest_id: ContestId,
        path: String,
    },
    #[snafu(display("Error loading the boundary of precinct {precinct_id}"))]
    PrecinctGeometry {
        source: ResultsError,
        precinct_id: String,
    },

    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing the CSV file {path}"))]
    WritingCsv { source: csv::Error, path: String },
    #[snafu(display("Difference detected between the consolidated results and the reference {path}"))]
    ReferenceMismatch { path: String },
}

pub type SovResult<T> = Result<T, SovError>;

/// Joins a path of the configuration to the directory of the configuration.
fn resolve_path(root: &Path, p: &str) -> PathBuf {
    root.join(p)
}

fn display_path(p: &Path) -> String {
    p.display().to_string()
}

/// Aggregates one contest spreadsheet and inserts its results.
///
/// Returns the number of inserted results.
fn load_contest(
    store: &mut ResultsStore,
    contest_id: ContestId,
    sheet: &io_sov::ContestSheet,
    policy: DuplicateRowPolicy,
) -> Result<usize, ResultsError> {
    let batch = {
        let pool = store.candidate_pool(contest_id)?;
        debug!(
            "load_contest: contest {}: {} candidates, {} columns",
            contest_id,
            pool.len(),
            sheet.labels.len()
        );
        aggregate_contest(&pool, &sheet.labels, &sheet.rows, policy)?
    };
    store.insert_contest_batch(batch)
}

fn load_boundaries(
    store: &mut ResultsStore,
    boundaries: Vec<(PrecinctId, Geometry)>,
) -> SovResult<usize> {
    let mut count = 0;
    for (precinct_id, geometry) in boundaries.into_iter() {
        let mp = to_multi_polygon(&geometry).context(PrecinctGeometrySnafu {
            precinct_id: precinct_id.as_str(),
        })?;
        store
            .update_precinct_geometry(&precinct_id, mp)
            .context(PrecinctGeometrySnafu {
                precinct_id: precinct_id.as_str(),
            })?;
        count += 1;
    }
    Ok(count)
}

/// Builds the consolidated store from all the inputs named in the configuration.
pub fn consolidate(config: &SovConfig, root: &Path) -> SovResult<ResultsStore> {
    let inputs = &config.input_settings;
    let mut store = ResultsStore::new();

    // Precincts
    let roster_p = display_path(&resolve_path(root, &inputs.precincts));
    info!("Loading precincts from {:?}", roster_p);
    for p in io_roster::read_roster(&roster_p)? {
        store
            .insert_precinct(p)
            .context(RosterSnafu { path: &roster_p })?;
    }

    // Official totals, if provided
    let totals: Option<HashMap<CandidateId, u64>> = match &inputs.counter_data {
        Some(p) => {
            let counter_p = display_path(&resolve_path(root, p));
            info!("Loading official totals from {:?}", counter_p);
            Some(io_metadata::read_counter_feed(&counter_p)?)
        }
        None => None,
    };

    // Contests and candidates
    let election_p = display_path(&resolve_path(root, &inputs.election_data));
    info!("Loading contests from {:?}", election_p);
    let groups = io_metadata::read_election_data(&election_p)?;
    let (num_contests, num_candidates) =
        io_metadata::seed_contests(&mut store, &groups, totals.as_ref())?;
    info!(
        "Loaded {} contests and {} candidates",
        num_contests, num_candidates
    );

    // Results
    let policy = config.rules.duplicate_row_policy()?;
    let results_dir = resolve_path(root, &inputs.results_directory);
    info!("Loading results from {:?}", results_dir);
    for file in io_sov::list_contest_files(&results_dir)? {
        let path = display_path(&file);
        let contest_id = io_common::contest_id_from_path(&file)?;
        let sheet = io_sov::read_contest_sheet(&path, &config.sheet_layout)?;
        let num_results = load_contest(&mut store, contest_id, &sheet, policy).context(
            ContestResultsSnafu {
                contest_id,
                path: &path,
            },
        )?;
        info!(
            "Contest {}: {} results from {:?}",
            contest_id, num_results, path
        );
    }

    // Boundaries, if provided
    if let Some(p) = &inputs.precinct_geometry {
        let geometry_p = display_path(&resolve_path(root, p));
        info!("Loading precinct geographies from {:?}", geometry_p);
        let boundaries = io_geometry::read_boundaries(&geometry_p, inputs.geometry_id_property())?;
        let count = load_boundaries(&mut store, boundaries)?;
        info!("Loaded {} precinct boundaries", count);
    }

    Ok(store)
}

pub fn run_consolidation(
    config_path: &str,
    out_override: &Option<String>,
    reference_path: &Option<String>,
) -> SovResult<()> {
    let config = read_config(config_path)?;
    info!("config: {:?}", config);
    let root = Path::new(config_path)
        .parent()
        .context(MissingParentDirSnafu { path: config_path })?;

    let store = consolidate(&config, root)?;
    info!("Consolidated {} results", store.num_results());

    let out_dir: PathBuf = match out_override {
        Some(p) => PathBuf::from(p),
        None => resolve_path(root, config.output_settings.output_directory()),
    };
    let results_js = export::write_outputs(&store, &out_dir, &config.output_settings)?;

    // The reference results, if provided for comparison
    if let Some(reference_p) = reference_path {
        let reference_js = read_summary(reference_p)?;
        let pretty_reference =
            serde_json::to_string_pretty(&reference_js).context(ParsingJsonSnafu {
                path: reference_p.as_str(),
            })?;
        let pretty_results = serde_json::to_string_pretty(&results_js).context(ParsingJsonSnafu {
            path: reference_p.as_str(),
        })?;
        if pretty_reference != pretty_results {
            warn!("Found differences with the reference results");
            print_diff(pretty_reference.as_str(), pretty_results.as_str(), "\n");
            return ReferenceMismatchSnafu {
                path: reference_p.as_str(),
            }
            .fail();
        }
        info!("The results match the reference {:?}", reference_p);
    }

    Ok(())
}
