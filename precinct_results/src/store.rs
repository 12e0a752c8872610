//! The relational data model: precincts, contests, candidates and results.
//!
//! Every insertion checks its primary key and its foreign keys. A failed
//! insertion leaves the store unchanged.

use log::{debug, info};
use snafu::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::fmt::Display;

use crate::aggregate::ContestBatch;
use crate::errors::*;
use crate::geometry::MultiPolygon;
use crate::model::*;
use crate::resolver::CandidatePool;

/// A keyed table with unique primary keys.
#[derive(Debug, Clone)]
pub struct Table<K, V> {
    name: TableName,
    rows: BTreeMap<K, V>,
}

impl<K: Ord + Display, V> Table<K, V> {
    pub fn new(name: TableName) -> Table<K, V> {
        Table {
            name,
            rows: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> TableName {
        self.name
    }

    pub fn insert(&mut self, key: K, value: V) -> ResultsResult<()> {
        ensure!(
            !self.rows.contains_key(&key),
            IntegrityViolationSnafu {
                table: self.name,
                key: key.to_string(),
                violation: Violation::DuplicatePrimaryKey,
            }
        );
        self.rows.insert(key, value);
        Ok(())
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.rows.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.rows.contains_key(key)
    }

    /// Applies a change to an existing row.
    pub fn update(&mut self, key: &K, f: impl FnOnce(&mut V)) -> ResultsResult<()> {
        let name = self.name;
        let row = self.rows.get_mut(key).context(NotFoundSnafu {
            table: name,
            key: key.to_string(),
        })?;
        f(row);
        Ok(())
    }

    /// The rows, in key order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The results of a contest in one precinct, for reporting.
#[derive(PartialEq, Debug, Clone)]
pub struct PrecinctBreakdown<'a> {
    pub precinct_id: &'a PrecinctId,
    /// Ordered by total votes, highest first.
    pub candidates: Vec<(&'a Candidate, &'a VoteCounts)>,
}

/// The single-writer store holding the consolidated election.
#[derive(Debug, Clone)]
pub struct ResultsStore {
    precincts: Table<PrecinctId, Precinct>,
    contests: Table<ContestId, Contest>,
    candidates: Table<CandidateId, Candidate>,
    results: Table<ResultKey, ResultRecord>,
}

impl Default for ResultsStore {
    fn default() -> Self {
        ResultsStore::new()
    }
}

impl ResultsStore {
    pub fn new() -> ResultsStore {
        ResultsStore {
            precincts: Table::new(TableName::Precincts),
            contests: Table::new(TableName::Contests),
            candidates: Table::new(TableName::Candidates),
            results: Table::new(TableName::Results),
        }
    }

    // ********* Insertions **********

    pub fn insert_precinct(&mut self, precinct: Precinct) -> ResultsResult<()> {
        debug!("insert_precinct: {:?}", precinct.id);
        self.precincts.insert(precinct.id.clone(), precinct)
    }

    pub fn insert_contest(&mut self, contest: Contest) -> ResultsResult<()> {
        debug!("insert_contest: {} {:?}", contest.id, contest.title);
        self.contests.insert(contest.id, contest)
    }

    /// Inserts a candidate. Its contest must already exist.
    pub fn insert_candidate(&mut self, candidate: Candidate) -> ResultsResult<()> {
        ensure!(
            self.contests.contains_key(&candidate.contest_id),
            IntegrityViolationSnafu {
                table: TableName::Candidates,
                key: candidate.id.to_string(),
                violation: Violation::MissingReference {
                    column: "contest_id",
                    target: TableName::Contests,
                    value: candidate.contest_id.to_string(),
                },
            }
        );
        debug!("insert_candidate: {} {:?}", candidate.id, candidate.name);
        self.candidates.insert(candidate.id, candidate)
    }

    /// Inserts a batch of results, all or nothing.
    ///
    /// The whole batch is checked before anything is written: the keys must
    /// be new and distinct, the contest, precinct and candidate must exist,
    /// and the candidate must run in the contest of the result.
    pub fn insert_results(&mut self, batch: Vec<ResultRecord>) -> ResultsResult<()> {
        self.check_results(&batch)?;
        self.commit_results(batch);
        Ok(())
    }

    /// Inserts the outcome of one contest spreadsheet, all or nothing: its
    /// results and the polling locations reported on its TOTAL rows.
    ///
    /// Returns the number of inserted results.
    pub fn insert_contest_batch(&mut self, batch: ContestBatch) -> ResultsResult<usize> {
        self.check_results(&batch.results)?;
        for (precinct_id, _) in batch.locations.iter() {
            ensure!(
                self.precincts.contains_key(precinct_id),
                NotFoundSnafu {
                    table: TableName::Precincts,
                    key: precinct_id.as_str(),
                }
            );
        }
        let num_results = batch.results.len();
        self.commit_results(batch.results);
        for (precinct_id, location) in batch.locations.iter() {
            // Cannot fail: the precinct was checked above.
            self.update_precinct_location(precinct_id, location)?;
        }
        Ok(num_results)
    }

    fn check_results(&self, batch: &[ResultRecord]) -> ResultsResult<()> {
        let mut batch_keys: HashSet<ResultKey> = HashSet::with_capacity(batch.len());
        for r in batch.iter() {
            let key = r.key();
            self.check_result(r, &key)?;
            ensure!(
                batch_keys.insert(key.clone()),
                IntegrityViolationSnafu {
                    table: TableName::Results,
                    key: key.to_string(),
                    violation: Violation::DuplicatePrimaryKey,
                }
            );
        }
        Ok(())
    }

    fn commit_results(&mut self, batch: Vec<ResultRecord>) {
        info!("insert_results: committing {} results", batch.len());
        for r in batch.into_iter() {
            // The keys were checked by check_results.
            self.results.rows.insert(r.key(), r);
        }
    }

    fn check_result(&self, r: &ResultRecord, key: &ResultKey) -> ResultsResult<()> {
        let violation = |violation: Violation| {
            IntegrityViolationSnafu {
                table: TableName::Results,
                key: key.to_string(),
                violation,
            }
            .build()
        };
        if self.results.contains_key(key) {
            return Err(violation(Violation::DuplicatePrimaryKey));
        }
        if !self.contests.contains_key(&r.contest_id) {
            return Err(violation(Violation::MissingReference {
                column: "contest_id",
                target: TableName::Contests,
                value: r.contest_id.to_string(),
            }));
        }
        if !self.precincts.contains_key(&r.precinct_id) {
            return Err(violation(Violation::MissingReference {
                column: "precinct_id",
                target: TableName::Precincts,
                value: r.precinct_id.clone(),
            }));
        }
        let candidate = self.candidates.get(&r.candidate_id).ok_or_else(|| {
            violation(Violation::MissingReference {
                column: "candidate_id",
                target: TableName::Candidates,
                value: r.candidate_id.to_string(),
            })
        })?;
        if candidate.contest_id != r.contest_id {
            return Err(violation(Violation::CandidateContestMismatch {
                candidate_id: candidate.id,
                candidate_contest: candidate.contest_id,
            }));
        }
        Ok(())
    }

    // ********* Point updates **********

    pub fn update_precinct_location(&mut self, id: &str, location: &str) -> ResultsResult<()> {
        self.precincts
            .update(&id.to_string(), |p| p.location = Some(location.to_string()))
    }

    pub fn update_precinct_geometry(
        &mut self,
        id: &str,
        geometry: MultiPolygon,
    ) -> ResultsResult<()> {
        self.precincts
            .update(&id.to_string(), |p| p.geometry = Some(geometry))
    }

    // ********* Queries **********

    pub fn precinct(&self, id: &str) -> Option<&Precinct> {
        self.precincts.get(&id.to_string())
    }

    pub fn contest(&self, id: ContestId) -> Option<&Contest> {
        self.contests.get(&id)
    }

    pub fn candidate(&self, id: CandidateId) -> Option<&Candidate> {
        self.candidates.get(&id)
    }

    pub fn precincts(&self) -> impl Iterator<Item = &Precinct> {
        self.precincts.values()
    }

    /// The contests, by id.
    pub fn contests(&self) -> impl Iterator<Item = &Contest> {
        self.contests.values()
    }

    /// The results, ordered by contest, precinct and candidate.
    pub fn results(&self) -> impl Iterator<Item = &ResultRecord> {
        self.results.values()
    }

    pub fn num_results(&self) -> usize {
        self.results.len()
    }

    /// The candidates of a contest, by id.
    pub fn candidates_for_contest(&self, contest_id: ContestId) -> Vec<&Candidate> {
        self.candidates
            .values()
            .filter(|c| c.contest_id == contest_id)
            .collect()
    }

    /// The closed set of candidates used to resolve the columns of a contest.
    pub fn candidate_pool(&self, contest_id: ContestId) -> ResultsResult<CandidatePool<'_>> {
        ensure!(
            self.contests.contains_key(&contest_id),
            NotFoundSnafu {
                table: TableName::Contests,
                key: contest_id.to_string(),
            }
        );
        Ok(CandidatePool::new(
            contest_id,
            self.candidates_for_contest(contest_id),
        ))
    }

    /// The candidates of a contest, by official total, highest first.
    ///
    /// Candidates without an official total come last.
    pub fn contest_standings(&self, contest_id: ContestId) -> Vec<&Candidate> {
        let mut res = self.candidates_for_contest(contest_id);
        // Stable sort: ties stay in id order.
        res.sort_by(|a, b| b.total_votes.cmp(&a.total_votes));
        res
    }

    /// The per-candidate results of a contest, grouped by precinct.
    pub fn precinct_breakdown(&self, contest_id: ContestId) -> Vec<PrecinctBreakdown<'_>> {
        let mut res: Vec<PrecinctBreakdown> = Vec::new();
        for r in self.results.values().filter(|r| r.contest_id == contest_id) {
            let candidate = match self.candidates.get(&r.candidate_id) {
                Some(c) => c,
                // Not reachable through insert_results.
                None => continue,
            };
            match res.last_mut() {
                Some(b) if *b.precinct_id == r.precinct_id => {
                    b.candidates.push((candidate, &r.counts));
                }
                _ => res.push(PrecinctBreakdown {
                    precinct_id: &r.precinct_id,
                    candidates: vec![(candidate, &r.counts)],
                }),
            }
        }
        for b in res.iter_mut() {
            b.candidates.sort_by(|x, y| y.1.total.cmp(&x.1.total));
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contest(id: u32) -> Contest {
        Contest {
            id: ContestId(id),
            group: "Local".to_string(),
            title: format!("Contest {}", id),
            contest_type: "Candidate".to_string(),
            non_partisan: true,
            voter_nominated: false,
            vote_for: 1,
        }
    }

    fn cand(id: u32, contest_id: u32, total: Option<u64>) -> Candidate {
        Candidate {
            id: CandidateId(id),
            name: format!("CANDIDATE {}", id),
            party: "".to_string(),
            contest_id: ContestId(contest_id),
            total_votes: total,
        }
    }

    fn result(contest_id: u32, precinct: &str, candidate_id: u32, total: u64) -> ResultRecord {
        ResultRecord {
            contest_id: ContestId(contest_id),
            precinct_id: precinct.to_string(),
            candidate_id: CandidateId(candidate_id),
            counts: VoteCounts {
                polling_place: None,
                vote_by_mail: None,
                total: Some(total),
            },
        }
    }

    fn seeded() -> ResultsStore {
        let mut s = ResultsStore::new();
        s.insert_precinct(Precinct::new("1101", 1, 1)).unwrap();
        s.insert_precinct(Precinct::new("1102", 1, 2)).unwrap();
        s.insert_contest(contest(1)).unwrap();
        s.insert_contest(contest(2)).unwrap();
        s.insert_candidate(cand(10, 1, Some(5))).unwrap();
        s.insert_candidate(cand(11, 1, Some(9))).unwrap();
        s.insert_candidate(cand(20, 2, None)).unwrap();
        s
    }

    fn is_violation(e: &ResultsError, expected: &Violation) -> bool {
        matches!(e, ResultsError::IntegrityViolation { violation, .. } if violation == expected)
    }

    #[test]
    fn duplicate_primary_keys_fail() {
        let mut s = seeded();
        let err = s.insert_precinct(Precinct::new("1101", 2, 2)).unwrap_err();
        assert!(is_violation(&err, &Violation::DuplicatePrimaryKey));
        assert!(s.insert_contest(contest(1)).is_err());
        assert!(s.insert_candidate(cand(10, 2, None)).is_err());
        // The first row is untouched.
        assert_eq!(s.precinct("1101").unwrap().serial_number, 1);
    }

    #[test]
    fn candidate_needs_contest() {
        let mut s = seeded();
        let err = s.insert_candidate(cand(30, 99, None)).unwrap_err();
        assert!(matches!(
            err,
            ResultsError::IntegrityViolation {
                table: TableName::Candidates,
                violation: Violation::MissingReference { column: "contest_id", .. },
                ..
            }
        ));
    }

    #[test]
    fn results_are_inserted() {
        let mut s = seeded();
        s.insert_results(vec![result(1, "1101", 10, 3), result(1, "1101", 11, 4)])
            .unwrap();
        assert_eq!(s.num_results(), 2);
    }

    #[test]
    fn cross_contest_candidate_fails() {
        let mut s = seeded();
        let err = s.insert_results(vec![result(2, "1101", 10, 3)]).unwrap_err();
        assert!(is_violation(
            &err,
            &Violation::CandidateContestMismatch {
                candidate_id: CandidateId(10),
                candidate_contest: ContestId(1),
            }
        ));
    }

    #[test]
    fn unknown_precinct_fails() {
        let mut s = seeded();
        let err = s.insert_results(vec![result(1, "9999", 10, 3)]).unwrap_err();
        assert!(matches!(
            err,
            ResultsError::IntegrityViolation {
                violation: Violation::MissingReference { column: "precinct_id", .. },
                ..
            }
        ));
    }

    #[test]
    fn failed_batch_writes_nothing() {
        let mut s = seeded();
        let batch = vec![
            result(1, "1101", 10, 3),
            result(1, "1102", 10, 3),
            result(1, "1102", 99, 3),
        ];
        assert!(s.insert_results(batch).is_err());
        assert_eq!(s.num_results(), 0);
    }

    #[test]
    fn duplicate_inside_batch_fails() {
        let mut s = seeded();
        let err = s
            .insert_results(vec![result(1, "1101", 10, 3), result(1, "1101", 10, 4)])
            .unwrap_err();
        assert!(is_violation(&err, &Violation::DuplicatePrimaryKey));
        assert_eq!(s.num_results(), 0);
    }

    #[test]
    fn contest_batch_with_unknown_location_writes_nothing() {
        let mut s = seeded();
        let batch = ContestBatch {
            contest_id: ContestId(1),
            results: vec![result(1, "1101", 10, 3)],
            locations: vec![
                ("1101".to_string(), "CITY HALL".to_string()),
                ("9999".to_string(), "LIBRARY".to_string()),
            ],
        };
        let err = s.insert_contest_batch(batch).unwrap_err();
        assert!(matches!(
            err,
            ResultsError::NotFound { table: TableName::Precincts, ref key } if key == "9999"
        ));
        assert_eq!(s.num_results(), 0);
        assert_eq!(s.precinct("1101").unwrap().location, None);
    }

    #[test]
    fn contest_batch_sets_locations() {
        let mut s = seeded();
        let batch = ContestBatch {
            contest_id: ContestId(1),
            results: vec![result(1, "1101", 10, 3), result(1, "1102", 10, 1)],
            locations: vec![("1102".to_string(), "LIBRARY".to_string())],
        };
        assert_eq!(s.insert_contest_batch(batch).unwrap(), 2);
        assert_eq!(s.num_results(), 2);
        assert_eq!(s.precinct("1102").unwrap().location.as_deref(), Some("LIBRARY"));
    }

    #[test]
    fn result_inserted_twice_fails() {
        let mut s = seeded();
        s.insert_results(vec![result(1, "1101", 10, 3)]).unwrap();
        let err = s.insert_results(vec![result(1, "1101", 10, 3)]).unwrap_err();
        assert!(is_violation(&err, &Violation::DuplicatePrimaryKey));
    }

    #[test]
    fn point_updates() {
        let mut s = seeded();
        s.update_precinct_location("1101", "CITY HALL").unwrap();
        s.update_precinct_location("1101", "CITY HALL").unwrap();
        assert_eq!(
            s.precinct("1101").unwrap().location.as_deref(),
            Some("CITY HALL")
        );
        let err = s.update_precinct_location("0000", "X").unwrap_err();
        assert!(matches!(
            err,
            ResultsError::NotFound {
                table: TableName::Precincts,
                ..
            }
        ));
        let mp = MultiPolygon(vec![]);
        s.update_precinct_geometry("1102", mp.clone()).unwrap();
        assert_eq!(s.precinct("1102").unwrap().geometry, Some(mp));
        assert!(s.update_precinct_geometry("0000", MultiPolygon(vec![])).is_err());
    }

    #[test]
    fn pool_holds_the_contest_candidates() {
        let s = seeded();
        let pool = s.candidate_pool(ContestId(1)).unwrap();
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.resolve("CANDIDATE 11").unwrap().candidate.id, CandidateId(11));
        assert!(matches!(
            s.candidate_pool(ContestId(42)),
            Err(ResultsError::NotFound {
                table: TableName::Contests,
                ..
            })
        ));
    }

    #[test]
    fn standings_by_total_descending() {
        let s = seeded();
        let ids: Vec<CandidateId> = s
            .contest_standings(ContestId(1))
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![CandidateId(11), CandidateId(10)]);
        assert_eq!(s.contest_standings(ContestId(2)).len(), 1);
    }

    #[test]
    fn breakdown_groups_by_precinct() {
        let mut s = seeded();
        s.insert_results(vec![
            result(1, "1101", 10, 3),
            result(1, "1101", 11, 4),
            result(1, "1102", 10, 8),
            result(1, "1102", 11, 1),
        ])
        .unwrap();
        let b = s.precinct_breakdown(ContestId(1));
        assert_eq!(b.len(), 2);
        assert_eq!(b[0].precinct_id, "1101");
        assert_eq!(b[0].candidates[0].0.id, CandidateId(11));
        assert_eq!(b[1].precinct_id, "1102");
        assert_eq!(b[1].candidates[0].0.id, CandidateId(10));
        assert!(s.precinct_breakdown(ContestId(2)).is_empty());
    }
}
