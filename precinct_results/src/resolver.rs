//! Resolution of spreadsheet column labels to the candidates of one contest.
//!
//! The labels printed in the statement of votes are abbreviated or formatted
//! differently from the names in the metadata feed ("SMITH" for
//! "John A. Smith Jr."). A label is resolved by trying a fixed sequence of
//! matching rules. The first rule that designates exactly one candidate wins.
//! No rule ranks candidates: a rule either gives a unique answer or passes.

use log::debug;
use std::collections::HashMap;

use crate::errors::*;
use crate::model::{Candidate, CandidateId, ContestId};
use crate::normalizer::normalize;

/// The suffix ignored by the last matching rule.
const SUFFIX_TOKEN: &str = "JR";

/// One rule of the resolution cascade.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum MatchRule {
    /// The normalized label is the normalized name.
    Exact,
    /// The last word of the label is contained in the name (surname).
    LastToken,
    /// The first word of the label is contained in the name (given name).
    FirstToken,
    /// Like `LastToken`, with the "JR" suffix removed from the label.
    SuffixStrippedLastToken,
}

impl MatchRule {
    /// The rules, in the order they are tried.
    pub const CASCADE: [MatchRule; 4] = [
        MatchRule::Exact,
        MatchRule::LastToken,
        MatchRule::FirstToken,
        MatchRule::SuffixStrippedLastToken,
    ];

    /// Returns the indexes of the names selected by this rule.
    ///
    /// `label` and `names` must already be normalized.
    fn select(self, label: &str, names: &[String]) -> Vec<usize> {
        let needle: Option<&str> = match self {
            MatchRule::Exact => {
                return positions(names, |n| n == label);
            }
            MatchRule::LastToken => label.split_whitespace().last(),
            MatchRule::FirstToken => label.split_whitespace().next(),
            MatchRule::SuffixStrippedLastToken => label
                .split_whitespace()
                .filter(|t| *t != SUFFIX_TOKEN)
                .last(),
        };
        match needle {
            Some(token) => positions(names, |n| n.contains(token)),
            // Nothing to match on: the rule is not decisive.
            None => vec![],
        }
    }
}

fn positions(names: &[String], pred: impl Fn(&str) -> bool) -> Vec<usize> {
    names
        .iter()
        .enumerate()
        .filter(|(_, n)| pred(n.as_str()))
        .map(|(idx, _)| idx)
        .collect()
}

/// A successful resolution, with the rule that produced it.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct Resolution<'a> {
    pub candidate: &'a Candidate,
    pub rule: MatchRule,
}

/// The closed set of candidates of one contest, with their names normalized
/// once.
#[derive(Debug, Clone)]
pub struct CandidatePool<'a> {
    contest_id: ContestId,
    candidates: Vec<&'a Candidate>,
    normalized: Vec<String>,
}

impl<'a> CandidatePool<'a> {
    pub fn new(contest_id: ContestId, candidates: Vec<&'a Candidate>) -> CandidatePool<'a> {
        let normalized = candidates.iter().map(|c| normalize(&c.name)).collect();
        CandidatePool {
            contest_id,
            candidates,
            normalized,
        }
    }

    pub fn contest_id(&self) -> ContestId {
        self.contest_id
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Resolves a single raw column label.
    pub fn resolve(&self, raw_label: &str) -> ResultsResult<Resolution<'a>> {
        let label = normalize(raw_label);
        for rule in MatchRule::CASCADE {
            if let [idx] = rule.select(&label, &self.normalized).as_slice() {
                let candidate = self.candidates[*idx];
                debug!(
                    "resolve: contest {}: {:?} -> {} ({:?}) by {:?}",
                    self.contest_id, raw_label, candidate.id, candidate.name, rule
                );
                return Ok(Resolution { candidate, rule });
            }
        }
        AmbiguousOrUnmatchedNameSnafu {
            contest_id: self.contest_id,
            label: raw_label,
        }
        .fail()
    }

    /// Resolves all the column labels of a spreadsheet, in order.
    ///
    /// Two distinct columns never resolve to the same candidate.
    pub fn resolve_columns(&self, raw_labels: &[String]) -> ResultsResult<Vec<CandidateId>> {
        let mut seen: HashMap<CandidateId, &str> = HashMap::new();
        let mut res: Vec<CandidateId> = Vec::with_capacity(raw_labels.len());
        for raw_label in raw_labels {
            let cid = self.resolve(raw_label)?.candidate.id;
            if let Some(first_label) = seen.insert(cid, raw_label.as_str()) {
                return DuplicateColumnResolutionSnafu {
                    contest_id: self.contest_id,
                    first_label,
                    second_label: raw_label.as_str(),
                    candidate_id: cid,
                }
                .fail();
            }
            res.push(cid);
        }
        Ok(res)
    }
}

/// Resolves one label against a set of candidates, without keeping the pool.
pub fn resolve<'a>(
    contest_id: ContestId,
    candidates: &'a [Candidate],
    raw_label: &str,
) -> ResultsResult<&'a Candidate> {
    let pool = CandidatePool::new(contest_id, candidates.iter().collect());
    pool.resolve(raw_label).map(|r| r.candidate)
}
