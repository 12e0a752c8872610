/*!

This is the long-form manual for `precinct_results` and `sovload`.

## Inputs

A consolidation run reads five kinds of files, all named in the JSON
configuration (see below):

* the **election data** feed (`electionData`): the contest groups, their contests
  and the candidates of each contest
* the **counter data** feed (`counterData`, optional): the official total of each
  candidate
* the **precinct roster** (`precincts`): a CSV file with the columns `Precinct`,
  `BallotGroup` and `SerialNumber`
* the **statement of votes** (`resultsDirectory`): one Excel spreadsheet per
  contest, named `<anything>-<contest id>.xls`
* the **precinct boundaries** (`precinctGeometry`, optional): a GeoJSON feature
  collection, one feature per precinct

### Statement of votes

The third row of each spreadsheet is the header. It contains the `PRECINCT`,
`TYPE` and `LOCATION` columns and, starting at the ninth column, one column per
candidate. Each precinct has up to three rows: `POLLING PLACE`, `VBM PORTION`
and `TOTAL`.

The candidate columns are labeled with the name printed on the ballot, which
does not always match the name of the election data feed. Each label is
matched against the candidates of the contest with the following rules, in
order:

1. the label, without accents and punctuation, is the name of a candidate
2. the last word of the label appears in the name of exactly one candidate
3. the first word of the label appears in the name of exactly one candidate
4. the last word of the label, ignoring `JR`, appears in the name of exactly one
   candidate

A label that matches no rule stops the run, as does a pair of columns that
resolve to the same candidate.

## Configuration

```json
{
  "inputSettings": {
    "electionData": "inputs/election_data.json",
    "counterData": "inputs/counter_data.json",
    "precincts": "inputs/precincts.csv",
    "resultsDirectory": "tmp/results",
    "precinctGeometry": "inputs/precincts.json"
  },
  "sheetLayout": {
    "headerRowIndex": 3,
    "firstCandidateColumnIndex": 9
  },
  "outputSettings": {
    "outputDirectory": "tmp"
  },
  "rules": {
    "duplicateRowPolicy": "reject"
  }
}
```

Relative paths are resolved from the directory of the configuration file.
Boundaries are matched to precincts through the `Precinct` property of each
feature, or the property named by `geometryIdProperty`. Rows and columns of
`sheetLayout` count from 1; columns may also be given as letters (`"I"`).

With `"duplicateRowPolicy": "overwrite"`, a precinct that has two rows of the
same type keeps the later one. By default such a spreadsheet is rejected.

## Outputs

* `contest_results.csv`: one line per candidate with the official totals
* `precinct_results.csv`: one line per precinct and candidate, with the polling
  place, vote by mail and total counts
* `precinct_results.json`: the same results, grouped by contest and precinct

*/
