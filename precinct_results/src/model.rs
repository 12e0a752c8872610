// ********* Entity identifiers ***********

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::geometry::MultiPolygon;

/// Precinct identifiers are kept verbatim, as printed in the roster.
pub type PrecinctId = String;

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContestId(pub u32);

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(pub u32);

impl Display for ContestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for CandidateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ********* Entities ***********

/// A geographic voting unit.
///
/// The location and the geometry are filled in after the precinct has been
/// seeded from the roster.
#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct Precinct {
    pub id: PrecinctId,
    pub ballot_group: u32,
    pub serial_number: u32,
    pub location: Option<String>,
    pub geometry: Option<MultiPolygon>,
}

impl Precinct {
    pub fn new(id: &str, ballot_group: u32, serial_number: u32) -> Precinct {
        Precinct {
            id: id.to_string(),
            ballot_group,
            serial_number,
            location: None,
            geometry: None,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
pub struct Contest {
    pub id: ContestId,
    /// The name of the contest group in the metadata feed.
    pub group: String,
    pub title: String,
    pub contest_type: String,
    pub non_partisan: bool,
    pub voter_nominated: bool,
    /// Number of seats to elect ("vote for N").
    pub vote_for: u8,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    pub party: String,
    pub contest_id: ContestId,
    /// Official total from the counter feed, when one was provided.
    pub total_votes: Option<u64>,
}

/// The three ways a count is reported for a precinct.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd, Serialize)]
pub enum VoteType {
    PollingPlace,
    VoteByMail,
    Total,
}

impl VoteType {
    pub const ALL: [VoteType; 3] = [VoteType::PollingPlace, VoteType::VoteByMail, VoteType::Total];
}

impl Display for VoteType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            VoteType::PollingPlace => "polling_place",
            VoteType::VoteByMail => "vote_by_mail",
            VoteType::Total => "total",
        };
        write!(f, "{}", s)
    }
}

/// The counts of one candidate in one precinct.
///
/// A field stays `None` when the spreadsheet had no row of that vote type for
/// the precinct. This is not the same as a count of zero.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default, Serialize)]
pub struct VoteCounts {
    pub polling_place: Option<u64>,
    pub vote_by_mail: Option<u64>,
    pub total: Option<u64>,
}

impl VoteCounts {
    pub fn get(&self, vote_type: VoteType) -> Option<u64> {
        match vote_type {
            VoteType::PollingPlace => self.polling_place,
            VoteType::VoteByMail => self.vote_by_mail,
            VoteType::Total => self.total,
        }
    }

    /// Sets the count for the vote type and returns the previous value.
    pub fn set(&mut self, vote_type: VoteType, count: u64) -> Option<u64> {
        let slot = match vote_type {
            VoteType::PollingPlace => &mut self.polling_place,
            VoteType::VoteByMail => &mut self.vote_by_mail,
            VoteType::Total => &mut self.total,
        };
        slot.replace(count)
    }

    /// True when all the vote types are present and the total does not add up.
    pub fn is_inconsistent(&self) -> bool {
        match (self.polling_place, self.vote_by_mail, self.total) {
            (Some(pp), Some(vbm), Some(total)) => pp.checked_add(vbm) != Some(total),
            _ => false,
        }
    }
}

/// The primary key of a result: one record per (contest, precinct, candidate).
///
/// The field order gives the natural reporting order.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub struct ResultKey {
    pub contest_id: ContestId,
    pub precinct_id: PrecinctId,
    pub candidate_id: CandidateId,
}

impl Display for ResultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "(contest {}, precinct {}, candidate {})",
            self.contest_id, self.precinct_id, self.candidate_id
        )
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
pub struct ResultRecord {
    pub contest_id: ContestId,
    pub precinct_id: PrecinctId,
    pub candidate_id: CandidateId,
    pub counts: VoteCounts,
}

impl ResultRecord {
    pub fn key(&self) -> ResultKey {
        ResultKey {
            contest_id: self.contest_id,
            precinct_id: self.precinct_id.clone(),
            candidate_id: self.candidate_id,
        }
    }
}
