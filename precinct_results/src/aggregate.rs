pub use crate::model::*;

use log::{debug, info, warn};
use snafu::prelude::*;
use std::collections::{BTreeMap, HashSet};

use crate::classify::classify_vote_type;
use crate::errors::*;
use crate::resolver::CandidatePool;

/// A body row of a contest spreadsheet, as read from the file.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RawRow {
    pub precinct_id: PrecinctId,
    /// The raw content of the TYPE column.
    pub vote_type: String,
    pub location: Option<String>,
    /// One count per candidate column, in column order.
    pub counts: Vec<u64>,
}

/// What to do when a precinct has two rows of the same vote type.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum DuplicateRowPolicy {
    /// Fail the contest.
    Reject,
    /// The later row replaces the earlier one.
    Overwrite,
}

/// The outcome of the aggregation of one contest spreadsheet.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ContestBatch {
    pub contest_id: ContestId,
    /// One record per (precinct, candidate), ordered by precinct then candidate.
    pub results: Vec<ResultRecord>,
    /// The polling location reported on the TOTAL row of each precinct.
    pub locations: Vec<(PrecinctId, String)>,
}

/// Folds the rows of one contest spreadsheet into one record per
/// (precinct, candidate).
///
/// The column labels are resolved once, when the tally is created.
///
/// ```
/// use precinct_results::aggregate::*;
///
/// let candidates = vec![Candidate {
///     id: CandidateId(11),
///     name: "LONDON BREED".to_string(),
///     party: "".to_string(),
///     contest_id: ContestId(1),
///     total_votes: None,
/// }];
/// let pool = precinct_results::CandidatePool::new(ContestId(1), candidates.iter().collect());
/// let mut tally = ContestTally::new(&pool, &["BREED".to_string()], DuplicateRowPolicy::Reject)?;
/// tally.add_row(&RawRow {
///     precinct_id: "1101".to_string(),
///     vote_type: "TOTAL".to_string(),
///     location: None,
///     counts: vec![42],
/// })?;
/// let batch = tally.finish()?;
/// assert_eq!(batch.results[0].counts.total, Some(42));
/// # Ok::<(), precinct_results::ResultsError>(())
/// ```
pub struct ContestTally {
    contest_id: ContestId,
    columns: Vec<CandidateId>,
    policy: DuplicateRowPolicy,
    tallies: BTreeMap<(PrecinctId, CandidateId), VoteCounts>,
    seen_rows: HashSet<(PrecinctId, VoteType)>,
    locations: BTreeMap<PrecinctId, String>,
    num_rows: usize,
}

impl ContestTally {
    pub fn new(
        pool: &CandidatePool,
        labels: &[String],
        policy: DuplicateRowPolicy,
    ) -> ResultsResult<ContestTally> {
        let columns = pool.resolve_columns(labels)?;
        Ok(ContestTally {
            contest_id: pool.contest_id(),
            columns,
            policy,
            tallies: BTreeMap::new(),
            seen_rows: HashSet::new(),
            locations: BTreeMap::new(),
            num_rows: 0,
        })
    }

    /// The candidate of each column, in column order.
    pub fn columns(&self) -> &[CandidateId] {
        &self.columns
    }

    pub fn add_row(&mut self, row: &RawRow) -> ResultsResult<()> {
        let vote_type = classify_vote_type(&row.vote_type)?;
        ensure!(
            row.counts.len() == self.columns.len(),
            ColumnCountMismatchSnafu {
                contest_id: self.contest_id,
                precinct_id: row.precinct_id.as_str(),
                expected: self.columns.len(),
                found: row.counts.len(),
            }
        );

        let first_seen = self
            .seen_rows
            .insert((row.precinct_id.clone(), vote_type));
        if !first_seen {
            match self.policy {
                DuplicateRowPolicy::Reject => {
                    return DuplicateVoteTypeRowSnafu {
                        contest_id: self.contest_id,
                        precinct_id: row.precinct_id.as_str(),
                        vote_type,
                    }
                    .fail();
                }
                DuplicateRowPolicy::Overwrite => {
                    warn!(
                        "contest {}: precinct {}: {} row seen again, keeping the later one",
                        self.contest_id, row.precinct_id, vote_type
                    );
                }
            }
        }

        if vote_type == VoteType::Total {
            if let Some(loc) = row.location.as_ref().filter(|l| !l.is_empty()) {
                self.locations.insert(row.precinct_id.clone(), loc.clone());
            }
        }

        for (cid, count) in self.columns.iter().zip(row.counts.iter()) {
            self.tallies
                .entry((row.precinct_id.clone(), *cid))
                .or_default()
                .set(vote_type, *count);
        }
        self.num_rows += 1;
        debug!(
            "add_row: contest {}: precinct {} {}: {:?}",
            self.contest_id, row.precinct_id, vote_type, row.counts
        );
        Ok(())
    }

    /// Closes the tally and returns the records to insert.
    ///
    /// Fails if a total does not equal the sum of its polling place and vote
    /// by mail counts.
    pub fn finish(self) -> ResultsResult<ContestBatch> {
        let contest_id = self.contest_id;
        let mut results: Vec<ResultRecord> = Vec::with_capacity(self.tallies.len());
        for ((precinct_id, candidate_id), counts) in self.tallies.into_iter() {
            if counts.is_inconsistent() {
                return InconsistentTotalSnafu {
                    contest_id,
                    precinct_id,
                    candidate_id,
                    polling_place: counts.polling_place.unwrap_or_default(),
                    vote_by_mail: counts.vote_by_mail.unwrap_or_default(),
                    total: counts.total.unwrap_or_default(),
                }
                .fail();
            }
            results.push(ResultRecord {
                contest_id,
                precinct_id,
                candidate_id,
                counts,
            });
        }
        info!(
            "contest {}: {} rows folded into {} results",
            contest_id,
            self.num_rows,
            results.len()
        );
        Ok(ContestBatch {
            contest_id,
            results,
            locations: self.locations.into_iter().collect(),
        })
    }
}

/// Aggregates a complete contest spreadsheet in one call.
pub fn aggregate_contest(
    pool: &CandidatePool,
    labels: &[String],
    rows: &[RawRow],
    policy: DuplicateRowPolicy,
) -> ResultsResult<ContestBatch> {
    let mut tally = ContestTally::new(pool, labels, policy)?;
    for row in rows {
        tally.add_row(row)?;
    }
    tally.finish()
}
