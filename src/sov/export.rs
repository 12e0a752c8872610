// Writing the consolidated results: two flat CSV tables and one nested JSON
// document.

use std::fs;
use std::path::Path;

use precinct_results::{Candidate, Contest, ContestId, PrecinctId, ResultsStore};
use serde::Serialize;
use serde_json::Value as JSValue;

use crate::sov::config_reader::OutputSettings;
use crate::sov::*;

pub const CONTEST_RESULTS_CSV: &str = "contest_results.csv";
pub const PRECINCT_RESULTS_CSV: &str = "precinct_results.csv";
pub const PRECINCT_RESULTS_JSON: &str = "precinct_results.json";

// ********* Flat tables **********

#[derive(Debug, Serialize)]
struct ContestResultRow<'a> {
    contest_id: ContestId,
    contest: &'a str,
    contest_group: &'a str,
    contest_type: &'a str,
    non_partisan: u8,
    voter_nominated: u8,
    vote_for: u8,
    candidate_id: u32,
    name: &'a str,
    party: &'a str,
    total_votes: Option<u64>,
}

#[derive(Debug, Serialize)]
struct PrecinctResultRow<'a> {
    precinct_id: &'a str,
    contest_id: ContestId,
    contest: &'a str,
    contest_group: &'a str,
    contest_type: &'a str,
    non_partisan: u8,
    voter_nominated: u8,
    vote_for: u8,
    candidate_id: u32,
    name: &'a str,
    party: &'a str,
    polling_place: Option<u64>,
    vote_by_mail: Option<u64>,
    total: Option<u64>,
}

fn contest_result_row<'a>(contest: &'a Contest, candidate: &'a Candidate) -> ContestResultRow<'a> {
    ContestResultRow {
        contest_id: contest.id,
        contest: &contest.title,
        contest_group: &contest.group,
        contest_type: &contest.contest_type,
        non_partisan: contest.non_partisan as u8,
        voter_nominated: contest.voter_nominated as u8,
        vote_for: contest.vote_for,
        candidate_id: candidate.id.0,
        name: &candidate.name,
        party: &candidate.party,
        total_votes: candidate.total_votes,
    }
}

fn write_csv<W: std::io::Write, T: Serialize>(
    wtr: &mut csv::Writer<W>,
    rows: impl Iterator<Item = T>,
    path: &str,
) -> SovResult<usize> {
    let mut count = 0;
    for row in rows {
        wtr.serialize(row).context(WritingCsvSnafu { path })?;
        count += 1;
    }
    wtr.flush().context(WritingOutputSnafu { path })?;
    Ok(count)
}

/// One line per candidate, ordered by contest then by official total.
pub fn write_contest_results<W: std::io::Write>(
    store: &ResultsStore,
    wtr: &mut csv::Writer<W>,
    path: &str,
) -> SovResult<usize> {
    let rows = store.contests().flat_map(|contest| {
        store
            .contest_standings(contest.id)
            .into_iter()
            .map(move |candidate| contest_result_row(contest, candidate))
    });
    write_csv(wtr, rows, path)
}

/// One line per result, ordered by contest, precinct and candidate.
pub fn write_precinct_results<W: std::io::Write>(
    store: &ResultsStore,
    wtr: &mut csv::Writer<W>,
    path: &str,
) -> SovResult<usize> {
    let rows = store.results().filter_map(|r| {
        let contest = store.contest(r.contest_id)?;
        let candidate = store.candidate(r.candidate_id)?;
        Some(PrecinctResultRow {
            precinct_id: &r.precinct_id,
            contest_id: contest.id,
            contest: &contest.title,
            contest_group: &contest.group,
            contest_type: &contest.contest_type,
            non_partisan: contest.non_partisan as u8,
            voter_nominated: contest.voter_nominated as u8,
            vote_for: contest.vote_for,
            candidate_id: candidate.id.0,
            name: &candidate.name,
            party: &candidate.party,
            polling_place: r.counts.polling_place,
            vote_by_mail: r.counts.vote_by_mail,
            total: r.counts.total,
        })
    });
    write_csv(wtr, rows, path)
}

// ********* Nested document **********

#[derive(Debug, Serialize)]
struct CandidateSummary<'a> {
    id: u32,
    name: &'a str,
    party: &'a str,
    votes: Option<u64>,
}

#[derive(Debug, Serialize)]
struct PrecinctCandidateSummary<'a> {
    id: u32,
    name: &'a str,
    polling_place: Option<u64>,
    vote_by_mail: Option<u64>,
    total: Option<u64>,
}

#[derive(Debug, Serialize)]
struct PrecinctSummary<'a> {
    precinct: &'a PrecinctId,
    candidates: Vec<PrecinctCandidateSummary<'a>>,
}

#[derive(Debug, Serialize)]
struct ContestSummary<'a> {
    id: u32,
    name: &'a str,
    group: &'a str,
    #[serde(rename = "type")]
    contest_type: &'a str,
    non_partisan: bool,
    voter_nominated: bool,
    vote_for: u8,
    candidates: Vec<CandidateSummary<'a>>,
    precincts: Vec<PrecinctSummary<'a>>,
}

fn contest_summary<'a>(store: &'a ResultsStore, contest: &'a Contest) -> ContestSummary<'a> {
    let candidates = store
        .contest_standings(contest.id)
        .into_iter()
        .map(|c| CandidateSummary {
            id: c.id.0,
            name: &c.name,
            party: &c.party,
            votes: c.total_votes,
        })
        .collect();
    let precincts = store
        .precinct_breakdown(contest.id)
        .into_iter()
        .map(|b| PrecinctSummary {
            precinct: b.precinct_id,
            candidates: b
                .candidates
                .into_iter()
                .map(|(c, counts)| PrecinctCandidateSummary {
                    id: c.id.0,
                    name: &c.name,
                    polling_place: counts.polling_place,
                    vote_by_mail: counts.vote_by_mail,
                    total: counts.total,
                })
                .collect(),
        })
        .collect();
    ContestSummary {
        id: contest.id.0,
        name: &contest.title,
        group: &contest.group,
        contest_type: &contest.contest_type,
        non_partisan: contest.non_partisan,
        voter_nominated: contest.voter_nominated,
        vote_for: contest.vote_for,
        candidates,
        precincts,
    }
}

/// The nested summary: each contest with its standings and its results by
/// precinct.
pub fn results_summary(store: &ResultsStore) -> JSValue {
    let contests: Vec<ContestSummary> = store
        .contests()
        .map(|c| contest_summary(store, c))
        .collect();
    // Only strings, integers and booleans: this cannot fail.
    serde_json::to_value(contests).unwrap_or(JSValue::Null)
}

/// Writes the outputs enabled in the settings and returns the JSON summary.
pub fn write_outputs(
    store: &ResultsStore,
    out_dir: &Path,
    settings: &OutputSettings,
) -> SovResult<JSValue> {
    let out_dir_p = out_dir.display().to_string();
    fs::create_dir_all(out_dir).context(WritingOutputSnafu { path: &out_dir_p })?;

    if settings.generate_csv.unwrap_or(true) {
        let p = out_dir.join(CONTEST_RESULTS_CSV).display().to_string();
        let mut wtr = csv::Writer::from_path(&p).context(WritingCsvSnafu { path: &p })?;
        let count = write_contest_results(store, &mut wtr, &p)?;
        info!("Wrote {} lines to {:?}", count, p);

        let p = out_dir.join(PRECINCT_RESULTS_CSV).display().to_string();
        let mut wtr = csv::Writer::from_path(&p).context(WritingCsvSnafu { path: &p })?;
        let count = write_precinct_results(store, &mut wtr, &p)?;
        info!("Wrote {} lines to {:?}", count, p);
    }

    let summary = results_summary(store);
    if settings.generate_json.unwrap_or(true) {
        let p = out_dir.join(PRECINCT_RESULTS_JSON).display().to_string();
        let contents = serde_json::to_string_pretty(&summary).context(ParsingJsonSnafu { path: &p })?;
        fs::write(&p, contents).context(WritingOutputSnafu { path: &p })?;
        info!("Wrote {:?}", p);
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> ResultsStore {
        let mut store = ResultsStore::new();
        store.insert_precinct(Precinct::new("1101", 1, 1)).unwrap();
        store.insert_precinct(Precinct::new("1102", 1, 2)).unwrap();
        store
            .insert_contest(Contest {
                id: ContestId(5),
                group: "Local".to_string(),
                title: "Mayor".to_string(),
                contest_type: "Candidate".to_string(),
                non_partisan: true,
                voter_nominated: false,
                vote_for: 1,
            })
            .unwrap();
        for (id, name, total) in [(51, "London Breed", Some(100)), (52, "Mark Leno", Some(200))] {
            store
                .insert_candidate(Candidate {
                    id: CandidateId(id),
                    name: name.to_string(),
                    party: "".to_string(),
                    contest_id: ContestId(5),
                    total_votes: total,
                })
                .unwrap();
        }
        let record = |p: &str, c: u32, pp: u64, vbm: u64| ResultRecord {
            contest_id: ContestId(5),
            precinct_id: p.to_string(),
            candidate_id: CandidateId(c),
            counts: VoteCounts {
                polling_place: Some(pp),
                vote_by_mail: Some(vbm),
                total: Some(pp + vbm),
            },
        };
        store
            .insert_results(vec![
                record("1101", 51, 10, 5),
                record("1101", 52, 1, 2),
                record("1102", 51, 0, 1),
                record("1102", 52, 4, 4),
            ])
            .unwrap();
        store
    }

    fn to_csv(f: impl Fn(&mut csv::Writer<Vec<u8>>) -> SovResult<usize>) -> String {
        let mut wtr = csv::Writer::from_writer(vec![]);
        f(&mut wtr).unwrap();
        String::from_utf8(wtr.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn contest_results_are_ordered_by_total() {
        let s = store();
        let out = to_csv(|w| write_contest_results(&s, w, "contest_results.csv"));
        assert_eq!(
            out,
            "contest_id,contest,contest_group,contest_type,non_partisan,voter_nominated,vote_for,candidate_id,name,party,total_votes\n\
             5,Mayor,Local,Candidate,1,0,1,52,Mark Leno,,200\n\
             5,Mayor,Local,Candidate,1,0,1,51,London Breed,,100\n"
        );
    }

    #[test]
    fn precinct_results_have_one_line_per_result() {
        let s = store();
        let out = to_csv(|w| write_precinct_results(&s, w, "precinct_results.csv"));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(
            lines[1],
            "1101,5,Mayor,Local,Candidate,1,0,1,51,London Breed,,10,5,15"
        );
        assert_eq!(lines[4], "1102,5,Mayor,Local,Candidate,1,0,1,52,Mark Leno,,4,4,8");
    }

    #[test]
    fn summary_nests_precincts_under_contests() {
        let summary = results_summary(&store());
        assert_eq!(
            summary[0]["candidates"],
            json!([
                {"id": 52, "name": "Mark Leno", "party": "", "votes": 200},
                {"id": 51, "name": "London Breed", "party": "", "votes": 100}
            ])
        );
        assert_eq!(summary[0]["type"], json!("Candidate"));
        assert_eq!(summary[0]["non_partisan"], json!(true));
        let precincts = summary[0]["precincts"].as_array().unwrap();
        assert_eq!(precincts.len(), 2);
        assert_eq!(precincts[1]["precinct"], json!("1102"));
        // Highest total first within a precinct.
        assert_eq!(precincts[1]["candidates"][0]["id"], json!(52));
        assert_eq!(precincts[1]["candidates"][0]["total"], json!(8));
    }

    #[test]
    fn missing_official_totals_are_written_empty() {
        let mut s = ResultsStore::new();
        s.insert_contest(Contest {
            id: ContestId(9),
            group: "Measures".to_string(),
            title: "Prop A".to_string(),
            contest_type: "Measure".to_string(),
            non_partisan: false,
            voter_nominated: false,
            vote_for: 1,
        })
        .unwrap();
        s.insert_candidate(Candidate {
            id: CandidateId(91),
            name: "YES".to_string(),
            party: "".to_string(),
            contest_id: ContestId(9),
            total_votes: None,
        })
        .unwrap();
        let out = to_csv(|w| write_contest_results(&s, w, "contest_results.csv"));
        assert!(out.ends_with("9,Prop A,Measures,Measure,0,0,1,91,YES,,\n"));
        assert_eq!(results_summary(&s)[0]["candidates"][0]["votes"], JSValue::Null);
    }
}
