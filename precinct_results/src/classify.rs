use snafu::prelude::*;

use crate::errors::*;
use crate::model::VoteType;

/// Maps the label of the TYPE column of the statement of votes.
///
/// Only the three labels printed by the county are accepted.
pub fn classify_vote_type(raw: &str) -> ResultsResult<VoteType> {
    match raw {
        "POLLING PLACE" => Ok(VoteType::PollingPlace),
        "VBM PORTION" => Ok(VoteType::VoteByMail),
        "TOTAL" => Ok(VoteType::Total),
        _ => UnrecognizedVoteTypeSnafu { label: raw }.fail(),
    }
}

/// Reads the number of seats to elect from the "vote for" phrase of the
/// metadata feed ("Vote for no more than three").
///
/// An empty phrase means a single seat. Larger numbers must be added here
/// explicitly; they are never defaulted.
pub fn classify_seat_count(raw: &str) -> ResultsResult<u8> {
    if raw.is_empty() {
        return Ok(1);
    }
    let cases: [(&str, u8); 4] = [
        ("than two", 2),
        ("than three", 3),
        ("than four", 4),
        ("than five", 5),
    ];
    cases
        .iter()
        .find(|(suffix, _)| raw.ends_with(suffix))
        .map(|(_, n)| *n)
        .context(UnrecognizedCardinalityPhraseSnafu { phrase: raw })
}
