// Reading the precinct roster (precincts.csv).

use std::io;

use precinct_results::Precinct;
use serde::Deserialize;

use crate::sov::*;

#[derive(Debug, Deserialize)]
struct RosterRow {
    #[serde(rename = "Precinct")]
    precinct: String,
    #[serde(rename = "BallotGroup")]
    ballot_group: u32,
    #[serde(rename = "SerialNumber")]
    serial_number: u32,
}

pub fn read_roster(path: &str) -> SovResult<Vec<Precinct>> {
    let rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    parse_roster(rdr, path)
}

pub fn parse_roster<R: io::Read>(mut rdr: csv::Reader<R>, path: &str) -> SovResult<Vec<Precinct>> {
    let mut res: Vec<Precinct> = Vec::new();
    for (idx, line_r) in rdr.deserialize::<RosterRow>().enumerate() {
        // The header is line 1.
        let lineno = (idx + 2) as u64;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        debug!("parse_roster: {}: {:?}", lineno, line);
        res.push(Precinct::new(
            &line.precinct,
            line.ballot_group,
            line.serial_number,
        ));
    }
    debug!("parse_roster: {}: {} precincts", path, res.len());
    Ok(res)
}
