/*!

Consolidation of official election results.

The statement of votes of an election is published as several files that do
not agree with each other: a metadata feed with the contests and the
candidates, one spreadsheet per contest with the counts of each precinct, a
roster of the precincts and their boundaries. This crate turns them into one
relational data set:

* [`resolver`] maps the candidate columns of a spreadsheet to the candidates of
  the contest
* [`aggregate`] folds the polling place, vote by mail and total rows of each
  precinct into one record per candidate
* [`store`] holds the precincts, contests, candidates and results and checks
  their keys

See the [`manual`] for the file formats.

*/

pub mod aggregate;
mod classify;
mod errors;
pub mod geometry;
pub mod manual;
mod model;
mod normalizer;
pub mod resolver;
pub mod store;

pub use crate::aggregate::{
    aggregate_contest, ContestBatch, ContestTally, DuplicateRowPolicy, RawRow,
};
pub use crate::classify::*;
pub use crate::errors::*;
pub use crate::geometry::{to_multi_polygon, Geometry, MultiPolygon, Polygon};
pub use crate::model::*;
pub use crate::normalizer::normalize;
pub use crate::resolver::{resolve, CandidatePool, MatchRule, Resolution};
pub use crate::store::{PrecinctBreakdown, ResultsStore, Table};
