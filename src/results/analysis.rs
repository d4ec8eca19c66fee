//! Composed comparisons over one results document.
//!
//! Each analysis extracts the contests it needs, reduces them to share
//! tables and joins them into the comparison shape consumed by the plotting
//! collaborator. Everything here is a pure transform; rendering and file
//! output stay outside this crate.

use log::info;

use snafu::prelude::*;

use vote_shares::*;

use crate::results::catalog::{ContestCatalog, ContestSelector, Office};
use crate::results::*;

/// Millage topics tracked year over year. Several are alternation patterns
/// so that wording variants land in the same topic bucket.
pub const MILLAGE_TOPICS: [&str; 8] = [
    "Police",
    "Senior Services",
    "Fire",
    "School|Educ",
    "Library",
    "Parks|Recreation|Playground|Path",
    "Road|Street",
    "Public Transportation",
];

// The 2024 nonpartisan slates, classified from endorsements and campaign
// materials.
const WALLED_LAKE_PROGRESSIVES: [&str; 4] = [
    "Susie Crafton",
    "Marc A. Siegler",
    "Ron Lippitt",
    "Michael Smith",
];
const WALLED_LAKE_CONSERVATIVES: [&str; 4] =
    ["Tricia Auten", "Rebecca Behrends", "Lisa West", "Steve Rix"];
const SUPREME_COURT_PROGRESSIVES: [&str; 2] = ["Kyra Harris Bolden", "Kimberly Ann Thomas"];
const SUPREME_COURT_CONSERVATIVES: [&str; 2] = ["Andrew Fink", "Patrick William O'Grady"];

// Statewide baselines must be present for a comparison to mean anything.
fn require_nonempty(table: ShareTable, office: &str) -> ResultsResult<ShareTable> {
    ensure!(!table.is_empty(), SelectorMismatchSnafu { office });
    Ok(table)
}

/// Walled Lake school-board shares, with the 2024 slates folded into the
/// major-party framework.
pub fn walled_lake_school_board_shares(
    doc: &ElectionDocument,
    catalog: &ContestCatalog,
) -> ResultsResult<ShareTable> {
    let records = office_candidates(doc, catalog.selectors(Office::WalledLakeSchoolBoard))?;
    let assigned = assign_parties_to_nonpartisan(
        &records,
        &WALLED_LAKE_PROGRESSIVES,
        &WALLED_LAKE_CONSERVATIVES,
    );
    aggregate_shares(&assigned).context(AggregationSnafu {})
}

/// Supreme-court shares: both seats merged, slates classified.
pub fn supreme_court_shares(
    doc: &ElectionDocument,
    catalog: &ContestCatalog,
) -> ResultsResult<ShareTable> {
    let mut selectors: Vec<ContestSelector> = catalog.selectors(Office::SupremeCourt).to_vec();
    selectors.extend_from_slice(catalog.selectors(Office::SupremeCourtSpecial));
    let records = office_candidates(doc, &selectors)?;
    let assigned = assign_parties_to_nonpartisan(
        &records,
        &SUPREME_COURT_PROGRESSIVES,
        &SUPREME_COURT_CONSERVATIVES,
    );
    aggregate_shares(&assigned).context(AggregationSnafu {})
}

/// School-board slate performance against the partisan baselines.
///
/// The conservative school-board share and the presidential share are
/// compared side by side against the State Board of Education share, all
/// per precinct.
pub fn school_board_comparison(
    doc: &ElectionDocument,
    catalog: &ContestCatalog,
) -> ResultsResult<ComparisonTable> {
    let party = MajorParty::REP;
    let board = walled_lake_school_board_shares(doc, catalog)?.retain_party(party);
    if board.is_empty() {
        whatever!("No classified school-board candidate matched the document");
    }
    let boe = require_nonempty(
        office_share(doc, catalog.selectors(Office::StateBoardOfEducation), party)?,
        "State Board of Education",
    )?;
    let potus = require_nonempty(
        office_share(doc, catalog.selectors(Office::President), party)?,
        "President",
    )?;

    let long = CrossTab::join(&board, &potus, ("Parental Rights Candidates", "Trump")).melt();
    Ok(long.against(&boe))
}

/// Congressional and legislative candidates against the top of the ticket.
pub fn president_vs_congress(
    doc: &ElectionDocument,
    catalog: &ContestCatalog,
) -> ResultsResult<ComparisonTable> {
    let party = MajorParty::REP;
    let legislature = office_share(doc, catalog.selectors(Office::StateLegislature), party)?;
    let congress = office_share(doc, catalog.selectors(Office::Congress), party)?;
    let potus = require_nonempty(
        office_share(doc, catalog.selectors(Office::President), party)?,
        "President",
    )?;

    let long = CrossTab::join(&legislature, &congress, ("Leg", "Cong")).melt();
    Ok(long.against(&potus).with_baseline_category(&potus, "POTUS"))
}

/// Countywide candidates against the top of the ticket.
pub fn countywide_offices(
    doc: &ElectionDocument,
    catalog: &ContestCatalog,
) -> ResultsResult<ComparisonTable> {
    let party = MajorParty::REP;
    let executive = office_share(doc, catalog.selectors(Office::CountyExecutive), party)?;
    let prosecutor = office_share(doc, catalog.selectors(Office::Prosecutor), party)?;
    let sheriff = office_share(doc, catalog.selectors(Office::Sheriff), party)?;
    let clerk = office_share(doc, catalog.selectors(Office::CountyClerk), party)?;
    let water = office_share(
        doc,
        catalog.selectors(Office::WaterResourcesCommissioner),
        party,
    )?;
    let potus = require_nonempty(
        office_share(doc, catalog.selectors(Office::President), party)?,
        "President",
    )?;

    let long = CrossTab::join(&executive, &prosecutor, ("Executive", "Prosecutor"))
        .and_join(&sheriff, "Sheriff")
        .and_join(&clerk, "Clerk")
        .and_join(&water, "WaterCom")
        .melt();
    Ok(long.against(&potus).with_baseline_category(&potus, "POTUS"))
}

/// Millage YES shares by topic against a statewide party baseline.
///
/// Topics with no matching measure that year drop out silently; the
/// remaining topics are stacked into one long table keyed by topic.
pub fn millage_vs_party(
    doc: &ElectionDocument,
    catalog: &ContestCatalog,
    party: &str,
) -> ResultsResult<ComparisonTable> {
    let mut parts: Vec<LongTable> = Vec::new();
    for topic in MILLAGE_TOPICS {
        let selector = ContestSelector::millage_on(topic)?;
        let shares = millage_shares(doc, &selector)?;
        if shares.is_empty() {
            info!("No millage on the ballot for topic {:?}", topic);
            continue;
        }
        let yes = shares.retain_party(ProposalOption::YES);
        parts.push(LongTable::tagged(&yes, topic));
    }

    let state = require_nonempty(
        office_share(doc, catalog.selectors(Office::StateBoardOfEducation), party)?,
        "State Board of Education",
    )?;
    Ok(LongTable::concat(&parts).against(&state))
}
