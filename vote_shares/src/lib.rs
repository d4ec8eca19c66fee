mod tables;
use log::{debug, warn};

use std::collections::{BTreeMap, BTreeSet};

pub use crate::tables::*;

/// Reduces raw precinct tallies into per-precinct vote shares.
///
/// Records are grouped by (precinct, label) and summed, each precinct's
/// total is summed separately, and every group's votes are divided by its
/// precinct total. The raw counts are dropped from the output. The label is
/// opaque here: it is a party for office races and a Yes/No option for
/// ballot proposals.
///
/// An empty input produces an empty table. A precinct whose total is zero
/// has no defined shares and fails with [ShareError::ZeroTotalPrecinct].
pub fn aggregate_shares(records: &[VoteRecord]) -> Result<ShareTable, ShareError> {
    debug!("aggregate_shares: {} records", records.len());
    let mut groups: BTreeMap<(String, Option<String>), u64> = BTreeMap::new();
    let mut totals: BTreeMap<String, u64> = BTreeMap::new();
    for r in records.iter() {
        *groups
            .entry((r.precinct.clone(), r.party.clone()))
            .or_insert(0) += r.votes;
        *totals.entry(r.precinct.clone()).or_insert(0) += r.votes;
    }

    let mut rows: Vec<ShareRow> = Vec::with_capacity(groups.len());
    for ((precinct, party), votes) in groups {
        let total = totals.get(&precinct).copied().unwrap_or(0);
        if total == 0 {
            return Err(ShareError::ZeroTotalPrecinct(precinct));
        }
        rows.push(ShareRow {
            precinct,
            party,
            vote_share: votes as f64 / total as f64,
        });
    }
    debug!("aggregate_shares: {} share rows", rows.len());
    Ok(ShareTable { rows })
}

/// Overlays major-party labels onto an officially nonpartisan race.
///
/// Candidates in `progressives` are labeled DEM, candidates in
/// `conservatives` REP, and every other record is discarded. This is an
/// equivalence-class reduction so that nonpartisan races can be compared
/// against partisan baselines; it is not a validation step, so unclassified
/// candidates are dropped silently.
pub fn assign_parties_to_nonpartisan(
    records: &[VoteRecord],
    progressives: &[&str],
    conservatives: &[&str],
) -> Vec<VoteRecord> {
    let mut out: Vec<VoteRecord> = Vec::new();
    for r in records.iter() {
        let name = match r.candidate.as_deref() {
            Some(n) => n,
            None => continue,
        };
        // The conservative list is applied last and wins on overlap.
        let party = if conservatives.contains(&name) {
            Some(MajorParty::REP)
        } else if progressives.contains(&name) {
            Some(MajorParty::DEM)
        } else {
            None
        };
        if let Some(p) = party {
            out.push(VoteRecord {
                party: Some(p.to_string()),
                ..r.clone()
            });
        }
    }
    debug!(
        "assign_parties_to_nonpartisan: kept {} of {} records",
        out.len(),
        records.len()
    );
    out
}

// Joined tables are expected to carry a single label per precinct (callers
// reduce to one party or one option first). If a table still has several
// rows for a precinct, the first one is kept.
fn shares_by_precinct(table: &ShareTable) -> BTreeMap<&str, f64> {
    let mut out: BTreeMap<&str, f64> = BTreeMap::new();
    for r in table.rows.iter() {
        if out.contains_key(r.precinct.as_str()) {
            warn!(
                "join: several rows for precinct {}, keeping the first",
                r.precinct
            );
            continue;
        }
        out.insert(r.precinct.as_str(), r.vote_share);
    }
    out
}

impl CrossTab {
    fn single(table: &ShareTable, category: &str) -> CrossTab {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut rows: Vec<CrossTabRow> = Vec::new();
        for r in table.rows.iter() {
            if !seen.insert(r.precinct.as_str()) {
                warn!(
                    "join: several rows for precinct {}, keeping the first",
                    r.precinct
                );
                continue;
            }
            rows.push(CrossTabRow {
                precinct: r.precinct.clone(),
                shares: vec![r.vote_share],
            });
        }
        CrossTab {
            categories: vec![category.to_string()],
            rows,
        }
    }

    /// Inner-joins two share tables on precinct.
    ///
    /// The share columns are labeled with the caller-supplied suffixes to
    /// tell the contests apart. Precincts missing from either table are
    /// dropped: a precinct without data in one race is not comparable.
    pub fn join(left: &ShareTable, right: &ShareTable, suffixes: (&str, &str)) -> CrossTab {
        CrossTab::single(left, suffixes.0).and_join(right, suffixes.1)
    }

    /// Inner-joins one more share table on precinct, adding a column.
    pub fn and_join(&self, table: &ShareTable, suffix: &str) -> CrossTab {
        let shares = shares_by_precinct(table);
        let mut categories = self.categories.clone();
        categories.push(suffix.to_string());
        let mut rows: Vec<CrossTabRow> = Vec::new();
        for row in self.rows.iter() {
            if let Some(share) = shares.get(row.precinct.as_str()) {
                let mut row_shares = row.shares.clone();
                row_shares.push(*share);
                rows.push(CrossTabRow {
                    precinct: row.precinct.clone(),
                    shares: row_shares,
                });
            }
        }
        debug!(
            "and_join: {} of {} rows matched on precinct",
            rows.len(),
            self.rows.len()
        );
        CrossTab { categories, rows }
    }

    /// Reshapes the wide cross-tab into one row per (precinct, category).
    pub fn melt(&self) -> LongTable {
        let mut rows: Vec<LongRow> = Vec::new();
        for row in self.rows.iter() {
            for (category, share) in self.categories.iter().zip(row.shares.iter()) {
                rows.push(LongRow {
                    precinct: row.precinct.clone(),
                    category: category.clone(),
                    vote_share: *share,
                });
            }
        }
        LongTable { rows }
    }
}

impl LongTable {
    /// Turns one share table into long rows under a single category label.
    pub fn tagged(table: &ShareTable, category: &str) -> LongTable {
        LongTable {
            rows: table
                .rows
                .iter()
                .map(|r| LongRow {
                    precinct: r.precinct.clone(),
                    category: category.to_string(),
                    vote_share: r.vote_share,
                })
                .collect(),
        }
    }

    /// Stacks several long tables into one. Empty parts contribute nothing,
    /// so a topic absent from the ballot drops out without special casing.
    pub fn concat(parts: &[LongTable]) -> LongTable {
        LongTable {
            rows: parts.iter().flat_map(|p| p.rows.iter().cloned()).collect(),
        }
    }

    /// Inner-joins the long rows with a baseline share table on precinct.
    ///
    /// Every surviving row pairs its own share with the baseline share of
    /// the same precinct, which is the shape the plotting collaborator
    /// consumes (category share on one axis, baseline on the other).
    pub fn against(&self, baseline: &ShareTable) -> ComparisonTable {
        let baseline_shares = shares_by_precinct(baseline);
        let mut rows: Vec<ComparisonRow> = Vec::new();
        for r in self.rows.iter() {
            if let Some(share) = baseline_shares.get(r.precinct.as_str()) {
                rows.push(ComparisonRow {
                    precinct: r.precinct.clone(),
                    category: r.category.clone(),
                    vote_share: r.vote_share,
                    baseline_share: *share,
                });
            }
        }
        debug!(
            "against: {} of {} rows matched the baseline",
            rows.len(),
            self.rows.len()
        );
        ComparisonTable {
            categories: self.categories(),
            rows,
        }
    }
}

impl ComparisonTable {
    /// Appends the baseline itself as a category of the comparison,
    /// restricted to the precincts already present.
    ///
    /// Used when the baseline race should appear on the chart as its own
    /// series: its rows compare the baseline share against itself. The
    /// baseline series leads the category order.
    pub fn with_baseline_category(&self, baseline: &ShareTable, category: &str) -> ComparisonTable {
        let precincts: BTreeSet<&str> = self.rows.iter().map(|r| r.precinct.as_str()).collect();
        let mut categories = vec![category.to_string()];
        categories.extend(self.categories.iter().cloned());
        let mut rows = self.rows.clone();
        for r in baseline.rows.iter() {
            if precincts.contains(r.precinct.as_str()) {
                rows.push(ComparisonRow {
                    precinct: r.precinct.clone(),
                    category: category.to_string(),
                    vote_share: r.vote_share,
                    baseline_share: r.vote_share,
                });
            }
        }
        ComparisonTable { categories, rows }
    }
}
