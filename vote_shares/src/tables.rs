// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// The two major-party labels that every comparative analysis reduces to.
pub struct MajorParty {}

impl MajorParty {
    pub const DEM: &'static str = "DEM";
    pub const REP: &'static str = "REP";
}

/// The option labels carried by a ballot proposal.
///
/// Proposals have no candidates; the option label takes the place of the
/// party label in the aggregated tables.
pub struct ProposalOption {}

impl ProposalOption {
    pub const YES: &'static str = "Yes";
    pub const NO: &'static str = "No";
}

/// A single precinct-level tally, as extracted from the results document.
///
/// One record is emitted per (contest, choice, precinct) occurrence. The
/// candidate field is absent for ballot proposals; the party field is absent
/// for nonpartisan candidates until a classification assigns one.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VoteRecord {
    pub precinct: String,
    pub votes: u64,
    pub candidate: Option<String>,
    pub party: Option<String>,
}

// ******** Output data structures *********

/// One precinct's share of the vote for one label (party or proposal option).
#[derive(PartialEq, Debug, Clone)]
pub struct ShareRow {
    pub precinct: String,
    pub party: Option<String>,
    /// Fraction of the precinct's total votes in this contest, in [0, 1].
    pub vote_share: f64,
}

/// An aggregated share table, one row per (precinct, label) group.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct ShareTable {
    pub rows: Vec<ShareRow>,
}

impl ShareTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Keeps only the rows carrying the given label.
    pub fn retain_party(&self, party: &str) -> ShareTable {
        ShareTable {
            rows: self
                .rows
                .iter()
                .filter(|r| r.party.as_deref() == Some(party))
                .cloned()
                .collect(),
        }
    }

    /// The share for a (precinct, label) pair, if present.
    pub fn share(&self, precinct: &str, party: Option<&str>) -> Option<f64> {
        self.rows
            .iter()
            .find(|r| r.precinct == precinct && r.party.as_deref() == party)
            .map(|r| r.vote_share)
    }

    /// The precincts present in this table, in row order.
    pub fn precincts(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.precinct.as_str()).collect()
    }
}

/// One row of a wide cross-tab: a precinct and one share per joined contest.
#[derive(PartialEq, Debug, Clone)]
pub struct CrossTabRow {
    pub precinct: String,
    pub shares: Vec<f64>,
}

/// The wide result of inner-joining share tables on precinct.
///
/// `categories` labels the share columns, in the same order as
/// `CrossTabRow::shares`. Only precincts present in every joined table
/// survive.
#[derive(PartialEq, Debug, Clone)]
pub struct CrossTab {
    pub categories: Vec<String>,
    pub rows: Vec<CrossTabRow>,
}

/// One row of the long form: a precinct's share for one contest category.
#[derive(PartialEq, Debug, Clone)]
pub struct LongRow {
    pub precinct: String,
    pub category: String,
    pub vote_share: f64,
}

/// The long form of one or more share tables, one row per
/// (precinct, category) pair.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct LongTable {
    pub rows: Vec<LongRow>,
}

impl LongTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The distinct categories, in first-appearance order.
    pub fn categories(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for r in self.rows.iter() {
            if !out.iter().any(|c| *c == r.category) {
                out.push(r.category.clone());
            }
        }
        out
    }
}

/// One row of a comparison table: a contest share next to a baseline share
/// for the same precinct.
#[derive(PartialEq, Debug, Clone)]
pub struct ComparisonRow {
    pub precinct: String,
    pub category: String,
    pub vote_share: f64,
    pub baseline_share: f64,
}

/// The final shape handed to the plotting collaborator: every row pairs one
/// contest-category share with the baseline share of the same precinct.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct ComparisonTable {
    /// Category order, for stable hue ordering downstream.
    pub categories: Vec<String>,
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Errors raised by the share computations.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ShareError {
    /// A precinct reported zero total votes for a contest, which leaves its
    /// shares undefined. Non-participating precincts must be filtered out
    /// before aggregation.
    ZeroTotalPrecinct(String),
}

impl Error for ShareError {}

impl Display for ShareError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShareError::ZeroTotalPrecinct(precinct) => {
                write!(f, "precinct {} has zero total votes", precinct)
            }
        }
    }
}
