// Reading the contest metadata (election_data.json) and the official
// candidate totals (counter_data.json).

use std::collections::HashMap;
use std::fs;

use precinct_results::{classify_seat_count, Candidate, CandidateId, Contest, ContestId, ResultsStore};
use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

use crate::sov::config_reader::{read_js_bool, read_js_int};
use crate::sov::*;

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CandidateEntry {
    #[serde(rename = "ID")]
    id: JSValue,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Party", default)]
    party: Option<String>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ContestEntry {
    #[serde(rename = "ID")]
    id: JSValue,
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Type", default)]
    contest_type: Option<String>,
    #[serde(rename = "NonPartisan", default)]
    non_partisan: JSValue,
    #[serde(rename = "VoterNominated", default)]
    voter_nominated: JSValue,
    #[serde(rename = "VoteFor", default)]
    vote_for: Option<String>,
    #[serde(rename = "Candidates", default)]
    candidates: Vec<CandidateEntry>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ContestGroup {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Contests", default)]
    contests: Vec<ContestEntry>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
struct ElectionDataContent {
    #[serde(rename = "ContestGroups")]
    contest_groups: Vec<ContestGroup>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
struct ElectionData {
    #[serde(rename = "Data")]
    data: ElectionDataContent,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
struct CounterEntry {
    #[serde(rename = "ReferenceType")]
    reference_type: String,
    #[serde(rename = "ReferenceID")]
    reference_id: JSValue,
    #[serde(rename = "Value")]
    value: JSValue,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
struct CounterData {
    #[serde(rename = "Data")]
    data: Vec<CounterEntry>,
}

/// Contest and candidate ids fit in 32 bits; anything larger is an error.
fn read_js_id(x: &JSValue, field: &str) -> SovResult<u32> {
    let id = read_js_int(x, field)?;
    u32::try_from(id)
        .ok()
        .context(ParsingJsonNumberSnafu { field })
}

pub fn read_election_data(path: &str) -> SovResult<Vec<ContestGroup>> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("read_election_data: read {:?}", path);
    parse_election_data(&contents, path)
}

pub fn parse_election_data(contents: &str, path: &str) -> SovResult<Vec<ContestGroup>> {
    let ed: ElectionData = serde_json::from_str(contents).context(ParsingJsonSnafu { path })?;
    Ok(ed.data.contest_groups)
}

pub fn read_counter_feed(path: &str) -> SovResult<HashMap<CandidateId, u64>> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("read_counter_feed: read {:?}", path);
    parse_counter_feed(&contents, path)
}

/// The official totals by candidate. Only the CAND entries of the feed are
/// kept.
pub fn parse_counter_feed(contents: &str, path: &str) -> SovResult<HashMap<CandidateId, u64>> {
    let cd: CounterData = serde_json::from_str(contents).context(ParsingJsonSnafu { path })?;
    let mut res: HashMap<CandidateId, u64> = HashMap::new();
    for entry in cd.data.iter().filter(|e| e.reference_type == "CAND") {
        let id = read_js_id(&entry.reference_id, "ReferenceID")?;
        let value = read_js_int(&entry.value, "Value")?;
        res.insert(CandidateId(id), value);
    }
    debug!("parse_counter_feed: {} candidate totals", res.len());
    Ok(res)
}

/// Seeds the contests and their candidates.
///
/// Returns the number of contests and of candidates inserted.
pub fn seed_contests(
    store: &mut ResultsStore,
    groups: &[ContestGroup],
    totals: Option<&HashMap<CandidateId, u64>>,
) -> SovResult<(usize, usize)> {
    let mut num_contests = 0;
    let mut num_candidates = 0;
    for group in groups.iter() {
        for entry in group.contests.iter() {
            let contest_id = read_js_id(&entry.id, "ID")?;
            let vote_for = classify_seat_count(entry.vote_for.as_deref().unwrap_or_default())
                .context(ContestMetadataSnafu { contest_id })?;
            let contest = Contest {
                id: ContestId(contest_id),
                group: group.name.clone(),
                title: entry.title.clone(),
                contest_type: entry.contest_type.clone().unwrap_or_default(),
                non_partisan: read_js_bool(&entry.non_partisan, "NonPartisan")?,
                voter_nominated: read_js_bool(&entry.voter_nominated, "VoterNominated")?,
                vote_for,
            };
            store
                .insert_contest(contest)
                .context(ContestMetadataSnafu { contest_id })?;
            num_contests += 1;

            for c in entry.candidates.iter() {
                let id = CandidateId(read_js_id(&c.id, "ID")?);
                let total_votes = match totals {
                    Some(t) => {
                        let tv = t.get(&id).cloned();
                        if tv.is_none() {
                            warn!(
                                "seed_contests: no official total for candidate {} ({:?})",
                                id, c.name
                            );
                        }
                        tv
                    }
                    None => None,
                };
                let candidate = Candidate {
                    id,
                    name: c.name.clone(),
                    party: c.party.clone().unwrap_or_default(),
                    contest_id: ContestId(contest_id),
                    total_votes,
                };
                store
                    .insert_candidate(candidate)
                    .context(ContestMetadataSnafu { contest_id })?;
                num_candidates += 1;
            }
        }
    }
    Ok((num_contests, num_candidates))
}
