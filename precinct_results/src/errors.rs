use std::fmt::Display;

use snafu::Snafu;

use crate::model::{CandidateId, ContestId, PrecinctId, VoteType};

/// The tables of the data model, used to name the place of an integrity error.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum TableName {
    Precincts,
    Contests,
    Candidates,
    Results,
}

impl Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TableName::Precincts => "precincts",
            TableName::Contests => "contests",
            TableName::Candidates => "candidates",
            TableName::Results => "results",
        };
        write!(f, "{}", s)
    }
}

/// The precise reason of an integrity violation.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Violation {
    DuplicatePrimaryKey,
    /// A foreign key column points to a row that does not exist.
    MissingReference {
        column: &'static str,
        target: TableName,
        value: String,
    },
    /// The candidate of a result runs in another contest.
    CandidateContestMismatch {
        candidate_id: CandidateId,
        candidate_contest: ContestId,
    },
}

impl Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::DuplicatePrimaryKey => write!(f, "duplicate primary key"),
            Violation::MissingReference {
                column,
                target,
                value,
            } => write!(f, "{column} = {value} does not exist in {target}"),
            Violation::CandidateContestMismatch {
                candidate_id,
                candidate_contest,
            } => write!(
                f,
                "candidate {candidate_id} belongs to contest {candidate_contest}"
            ),
        }
    }
}

/// Errors that stop the consolidation. None of them is recoverable: the source
/// data must be corrected and the run restarted.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ResultsError {
    #[snafu(display(
        "contest {contest_id}: could not find a unique candidate for column {label:?}"
    ))]
    AmbiguousOrUnmatchedName { contest_id: ContestId, label: String },

    #[snafu(display(
        "contest {contest_id}: columns {first_label:?} and {second_label:?} both resolve to candidate {candidate_id}"
    ))]
    DuplicateColumnResolution {
        contest_id: ContestId,
        first_label: String,
        second_label: String,
        candidate_id: CandidateId,
    },

    #[snafu(display("could not determine the vote type: {label:?}"))]
    UnrecognizedVoteType { label: String },

    #[snafu(display("could not determine the number of seats to elect: {phrase:?}"))]
    UnrecognizedCardinalityPhrase { phrase: String },

    #[snafu(display(
        "contest {contest_id}: precinct {precinct_id} has more than one {vote_type} row"
    ))]
    DuplicateVoteTypeRow {
        contest_id: ContestId,
        precinct_id: PrecinctId,
        vote_type: VoteType,
    },

    #[snafu(display(
        "contest {contest_id}: row for precinct {precinct_id} has {found} counts, expected {expected}"
    ))]
    ColumnCountMismatch {
        contest_id: ContestId,
        precinct_id: PrecinctId,
        expected: usize,
        found: usize,
    },

    #[snafu(display(
        "contest {contest_id}: precinct {precinct_id}, candidate {candidate_id}: total {total} is not {polling_place} + {vote_by_mail}"
    ))]
    InconsistentTotal {
        contest_id: ContestId,
        precinct_id: PrecinctId,
        candidate_id: CandidateId,
        polling_place: u64,
        vote_by_mail: u64,
        total: u64,
    },

    #[snafu(display("integrity violation in {table} for key {key}: {violation}"))]
    IntegrityViolation {
        table: TableName,
        key: String,
        violation: Violation,
    },

    #[snafu(display("no row with key {key} in {table}"))]
    NotFound { table: TableName, key: String },

    #[snafu(display("unsupported geometry type {kind:?}, expected Polygon or MultiPolygon"))]
    UnsupportedGeometryType { kind: String },

    #[snafu(display("malformed coordinates for geometry type {kind:?}"))]
    MalformedGeometry {
        kind: String,
        source: serde_json::Error,
    },
}

pub type ResultsResult<T> = Result<T, ResultsError>;
