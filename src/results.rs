use log::{debug, info};

use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::Path;

use roxmltree::{Document, Node};

use serde::Serialize;
use serde_json::json;

use vote_shares::*;

pub mod analysis;
pub mod catalog;
pub(crate) mod xml;

use crate::results::catalog::ContestSelector;
use crate::results::xml::*;

#[derive(Debug, Snafu)]
pub enum ResultsError {
    #[snafu(display("Results document not found: {path}"))]
    NotFound { path: String },
    #[snafu(display("Error reading results document {path}"))]
    ReadingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Malformed results document"))]
    Parse { source: roxmltree::Error },
    #[snafu(display("The document has no ElectionResult root"))]
    MissingRoot {},
    #[snafu(display("Element {tag} is missing its {attribute} attribute"))]
    MissingAttribute { tag: String, attribute: String },
    #[snafu(display("Vote count {raw:?} for precinct {precinct} is not a number"))]
    MalformedVote {
        source: std::num::ParseIntError,
        raw: String,
        precinct: String,
    },
    #[snafu(display("Invalid contest text pattern {pattern:?}"))]
    Pattern {
        source: regex::Error,
        pattern: String,
    },
    #[snafu(display("No contest matched for required office {office}"))]
    SelectorMismatch { office: String },
    #[snafu(display("Could not aggregate vote shares"))]
    Aggregation { source: ShareError },
    #[snafu(display("Could not serialize results table"))]
    SerializingJson { source: serde_json::Error },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type ResultsResult<T> = Result<T, ResultsError>;

/// An election-results document, held as raw markup.
///
/// The document is read once; parsing happens per call and nothing is
/// cached, so every query sees the file as it was read.
pub struct ElectionReport {
    xml: String,
}

impl ElectionReport {
    /// Reads the backing file from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> ResultsResult<ElectionReport> {
        let path_str = path.as_ref().display().to_string();
        info!("Attempting to read results document {:?}", path_str);
        ensure!(path.as_ref().is_file(), NotFoundSnafu { path: path_str });
        let xml = fs::read_to_string(path.as_ref()).context(ReadingFileSnafu { path: path_str })?;
        Ok(ElectionReport { xml })
    }

    /// Wraps markup that is already in memory.
    pub fn from_xml<S: Into<String>>(xml: S) -> ElectionReport {
        ElectionReport { xml: xml.into() }
    }

    /// Parses the markup and checks for the results root.
    pub fn parse(&self) -> ResultsResult<ElectionDocument<'_>> {
        debug!("Parsing results document ({} bytes)", self.xml.len());
        let doc = Document::parse(&self.xml).context(ParseSnafu {})?;
        ensure!(
            descendants_with_tag(doc.root(), "ElectionResult").next().is_some(),
            MissingRootSnafu {}
        );
        Ok(ElectionDocument { doc })
    }
}

/// A parsed results tree, queryable by contest selector.
pub struct ElectionDocument<'input> {
    doc: Document<'input>,
}

impl<'input> ElectionDocument<'input> {
    /// All Contest nodes matching the selector, in document order.
    ///
    /// Zero matches is a valid outcome (e.g. a measure topic that was not
    /// on the ballot that year) and is not an error.
    pub fn contests(&self, selector: &ContestSelector) -> Vec<Node<'_, 'input>> {
        descendants_with_tag(self.doc.root(), "Contest")
            .filter(|n| selector.matches(n.attribute("key"), n.attribute("text")))
            .collect()
    }
}

fn precinct_record(
    node: Node<'_, '_>,
    candidate: Option<String>,
    party: Option<String>,
) -> ResultsResult<VoteRecord> {
    let precinct = required_attribute(node, "name")?.trim().to_string();
    let raw = required_attribute(node, "votes")?.trim();
    let votes: u64 = raw.parse().context(MalformedVoteSnafu {
        raw,
        precinct: precinct.clone(),
    })?;
    Ok(VoteRecord {
        precinct,
        votes,
        candidate,
        party,
    })
}

/// Emits one raw record per (contest, choice, precinct) occurrence under
/// the selector, with candidate and party taken from the choice verbatim.
pub fn extract_office_records(
    doc: &ElectionDocument,
    selector: &ContestSelector,
) -> ResultsResult<Vec<VoteRecord>> {
    let mut records: Vec<VoteRecord> = Vec::new();
    for contest in doc.contests(selector) {
        debug!("extract: contest {:?}", contest.attribute("text"));
        for choice in descendants_with_tag(contest, "Choice") {
            let candidate = choice.attribute("text").map(str::to_string);
            let party = choice.attribute("party").map(str::to_string);
            for precinct in descendants_with_tag(choice, "Precinct") {
                records.push(precinct_record(precinct, candidate.clone(), party.clone())?);
            }
        }
    }
    debug!("extract: {} records", records.len());
    Ok(records)
}

/// Emits one raw record per (measure, option, precinct) occurrence.
///
/// Proposals have no candidates; the option label (Yes/No) is carried in
/// the party field so the aggregation downstream stays label-agnostic.
pub fn extract_millage_records(
    doc: &ElectionDocument,
    selector: &ContestSelector,
) -> ResultsResult<Vec<VoteRecord>> {
    let mut records: Vec<VoteRecord> = Vec::new();
    for millage in doc.contests(selector) {
        debug!("extract: millage {:?}", millage.attribute("text"));
        for option in descendants_with_tag(millage, "Choice") {
            let label = required_attribute(option, "text")?.to_string();
            for precinct in descendants_with_tag(option, "Precinct") {
                records.push(precinct_record(precinct, None, Some(label.clone()))?);
            }
        }
    }
    Ok(records)
}

// An alphabetic character is upper-cased whenever the previous character
// was not alphabetic, so "O'GRADY" becomes "O'Grady".
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            word_start = false;
        } else {
            out.push(c);
            word_start = true;
        }
    }
    out
}

/// Raw candidate records for the given selectors, unioned.
///
/// This is the no-party-filter path: candidate names are normalized to
/// title case (the source text mixes capitalizations between contests) and
/// the party attribute is dropped, so that a later classification can
/// assign one.
pub fn office_candidates(
    doc: &ElectionDocument,
    selectors: &[ContestSelector],
) -> ResultsResult<Vec<VoteRecord>> {
    let mut records: Vec<VoteRecord> = Vec::new();
    for selector in selectors.iter() {
        records.extend(extract_office_records(doc, selector)?);
    }
    Ok(records
        .into_iter()
        .map(|r| VoteRecord {
            candidate: r.candidate.map(|c| title_case(&c)),
            party: None,
            ..r
        })
        .collect())
}

/// One party's per-precinct share of the two-major-party vote.
///
/// Records from all selectors are unioned, only DEM and REP rows are
/// retained, and the candidate field is dropped before aggregation so that
/// several candidates of one party sum into a single group.
pub fn office_share(
    doc: &ElectionDocument,
    selectors: &[ContestSelector],
    party: &str,
) -> ResultsResult<ShareTable> {
    let mut records: Vec<VoteRecord> = Vec::new();
    for selector in selectors.iter() {
        records.extend(extract_office_records(doc, selector)?);
    }
    let records: Vec<VoteRecord> = records
        .into_iter()
        .filter(|r| {
            let p = r.party.as_deref();
            p == Some(MajorParty::DEM) || p == Some(MajorParty::REP)
        })
        .map(|r| VoteRecord {
            candidate: None,
            ..r
        })
        .collect();
    let table = aggregate_shares(&records).context(AggregationSnafu {})?;
    Ok(table.retain_party(party))
}

/// Per-precinct shares of a ballot measure's options.
///
/// A selector with no matching measure yields an empty table: callers
/// iterating over measure topics skip it and move on.
pub fn millage_shares(
    doc: &ElectionDocument,
    selector: &ContestSelector,
) -> ResultsResult<ShareTable> {
    let records = extract_millage_records(doc, selector)?;
    if records.is_empty() {
        return Ok(ShareTable::default());
    }
    aggregate_shares(&records).context(AggregationSnafu {})
}

// ******** Output to the plotting collaborator *********

#[derive(Debug, Clone, Serialize)]
struct ShareRecord<'a> {
    precinct: &'a str,
    party: Option<&'a str>,
    #[serde(rename = "voteShare")]
    vote_share: f64,
}

#[derive(Debug, Clone, Serialize)]
struct ComparisonRecord<'a> {
    precinct: &'a str,
    category: &'a str,
    #[serde(rename = "voteShare")]
    vote_share: f64,
    #[serde(rename = "baselineShare")]
    baseline_share: f64,
}

/// Renders a share table as pretty JSON records.
pub fn share_table_json(table: &ShareTable) -> ResultsResult<String> {
    let records: Vec<ShareRecord<'_>> = table
        .rows
        .iter()
        .map(|r| ShareRecord {
            precinct: &r.precinct,
            party: r.party.as_deref(),
            vote_share: r.vote_share,
        })
        .collect();
    serde_json::to_string_pretty(&records).context(SerializingJsonSnafu {})
}

/// Renders a comparison table as pretty JSON, rows plus category order.
pub fn comparison_table_json(table: &ComparisonTable) -> ResultsResult<String> {
    let rows: Vec<ComparisonRecord<'_>> = table
        .rows
        .iter()
        .map(|r| ComparisonRecord {
            precinct: &r.precinct,
            category: &r.category,
            vote_share: r.vote_share,
            baseline_share: r.baseline_share,
        })
        .collect();
    let js = json!({"categories": table.categories, "rows": rows});
    serde_json::to_string_pretty(&js).context(SerializingJsonSnafu {})
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// A small general-election export covering two precincts, a statewide
    /// office split across reporting channels, two congressional districts,
    /// a nonpartisan school board, both supreme-court seats and one
    /// millage.
    pub const DETAIL_2024: &str = r#"
<ElectionResult>
  <Contest key="124" text="President of the United States">
    <Choice text="JOHN SMITH" party="REP">
      <VoteType name="Election Day">
        <Precinct name=" 1A " votes="25"/>
        <Precinct name="2B" votes="50"/>
      </VoteType>
      <VoteType name="Absentee">
        <Precinct name="1A" votes="15"/>
        <Precinct name="2B" votes="20"/>
      </VoteType>
    </Choice>
    <Choice text="JANE DOE" party="DEM">
      <VoteType name="Election Day">
        <Precinct name="1A" votes="40"/>
        <Precinct name="2B" votes="10"/>
      </VoteType>
      <VoteType name="Absentee">
        <Precinct name="1A" votes="20"/>
        <Precinct name="2B" votes="20"/>
      </VoteType>
    </Choice>
    <Choice text="THIRD GUY" party="LIB">
      <VoteType name="Election Day">
        <Precinct name="1A" votes="5"/>
      </VoteType>
    </Choice>
  </Contest>
  <Contest key="161" text="Member of the State Board of Education">
    <Choice text="EDNA DEMPSTER" party="DEM">
      <Precinct name="1A" votes="50"/>
      <Precinct name="2B" votes="40"/>
    </Choice>
    <Choice text="RALPH REPTON" party="REP">
      <Precinct name="1A" votes="50"/>
      <Precinct name="2B" votes="60"/>
    </Choice>
  </Contest>
  <Contest key="300" text="Representative in Congress 9th District">
    <Choice text="ALICE ADAMS" party="DEM">
      <Precinct name="1A" votes="55"/>
    </Choice>
    <Choice text="BOB BROWN" party="REP">
      <Precinct name="1A" votes="45"/>
    </Choice>
  </Contest>
  <Contest key="301" text="Representative in Congress 11th District">
    <Choice text="CARL CLARK" party="DEM">
      <Precinct name="2B" votes="35"/>
    </Choice>
    <Choice text="DAN DREW" party="REP">
      <Precinct name="2B" votes="65"/>
    </Choice>
  </Contest>
  <Contest key="400" text="Representative in State Legislature 20th District">
    <Choice text="LENA LOMBARD" party="DEM">
      <Precinct name="1A" votes="48"/>
    </Choice>
    <Choice text="LARS LUNDGREN" party="REP">
      <Precinct name="1A" votes="52"/>
    </Choice>
  </Contest>
  <Contest key="141" text="Board Member Walled Lake Cons School District">
    <Choice text="SUSIE CRAFTON">
      <Precinct name="1A" votes="30"/>
    </Choice>
    <Choice text="TRICIA AUTEN">
      <Precinct name="1A" votes="50"/>
    </Choice>
    <Choice text="UNAFFILIATED UMA">
      <Precinct name="1A" votes="20"/>
    </Choice>
  </Contest>
  <Contest key="178" text="Justice of Supreme Court">
    <Choice text="KYRA HARRIS BOLDEN">
      <Precinct name="1A" votes="60"/>
    </Choice>
    <Choice text="ANDREW FINK">
      <Precinct name="1A" votes="40"/>
    </Choice>
  </Contest>
  <Contest key="262" text="Justice of Supreme Court Incumbent Position Partial Term">
    <Choice text="KIMBERLY ANN THOMAS">
      <Precinct name="1A" votes="55"/>
    </Choice>
    <Choice text="PATRICK WILLIAM O'GRADY">
      <Precinct name="1A" votes="45"/>
    </Choice>
  </Contest>
  <Contest key="5001" text="Fire Department Millage Renewal">
    <Choice text="Yes">
      <Precinct name="1A" votes="70"/>
      <Precinct name="2B" votes="30"/>
    </Choice>
    <Choice text="No">
      <Precinct name="1A" votes="30"/>
      <Precinct name="2B" votes="70"/>
    </Choice>
  </Contest>
</ElectionResult>
"#;
}

#[cfg(test)]
mod tests {
    use super::fixtures::DETAIL_2024;
    use super::*;
    use crate::results::catalog::{ContestCatalog, Office};

    fn report() -> ElectionReport {
        let _ = env_logger::builder().is_test(true).try_init();
        ElectionReport::from_xml(DETAIL_2024)
    }

    #[test]
    fn opening_a_missing_file_fails_with_not_found() {
        let res = ElectionReport::open("/nonexistent/detail2024.xml");
        assert!(matches!(res, Err(ResultsError::NotFound { .. })));
    }

    #[test]
    fn malformed_markup_fails_to_parse() {
        let report = ElectionReport::from_xml("<ElectionResult><Contest></ElectionResult>");
        assert!(matches!(report.parse(), Err(ResultsError::Parse { .. })));
    }

    #[test]
    fn a_document_without_results_root_is_rejected() {
        let report = ElectionReport::from_xml("<SomethingElse/>");
        assert!(matches!(report.parse(), Err(ResultsError::MissingRoot { .. })));
    }

    #[test]
    fn non_numeric_vote_counts_are_rejected() {
        let report = ElectionReport::from_xml(
            r#"<ElectionResult>
                 <Contest key="9" text="Drain Commissioner">
                   <Choice text="X" party="DEM"><Precinct name="1A" votes="n/a"/></Choice>
                 </Contest>
               </ElectionResult>"#,
        );
        let doc = report.parse().unwrap();
        let res = extract_office_records(&doc, &ContestSelector::key("9"));
        assert!(matches!(res, Err(ResultsError::MalformedVote { .. })));
    }

    #[test]
    fn a_precinct_without_vote_attribute_is_rejected() {
        let report = ElectionReport::from_xml(
            r#"<ElectionResult>
                 <Contest key="9" text="Drain Commissioner">
                   <Choice text="X" party="DEM"><Precinct name="1A"/></Choice>
                 </Contest>
               </ElectionResult>"#,
        );
        let doc = report.parse().unwrap();
        let res = extract_office_records(&doc, &ContestSelector::key("9"));
        assert!(matches!(res, Err(ResultsError::MissingAttribute { .. })));
    }

    #[test]
    fn extraction_trims_precinct_names_and_sums_reporting_channels() {
        let report = report();
        let doc = report.parse().unwrap();
        let records = extract_office_records(&doc, &ContestSelector::key("124")).unwrap();
        // 2 channels x 2 precincts for both major parties, 1 row for the
        // third party.
        assert_eq!(records.len(), 9);
        assert!(records.iter().all(|r| r.precinct == "1A" || r.precinct == "2B"));
        let total: u64 = records.iter().map(|r| r.votes).sum();
        assert_eq!(total, 205);
    }

    #[test]
    fn selection_is_idempotent() {
        let report = report();
        let doc = report.parse().unwrap();
        let selector = ContestSelector::prefix("Representative in Congress");
        let first = extract_office_records(&doc, &selector).unwrap();
        let second = extract_office_records(&doc, &selector).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
    }

    #[test]
    fn office_share_filters_to_the_major_parties() {
        let report = report();
        let doc = report.parse().unwrap();
        let catalog = ContestCatalog::year_2024();
        let dem = office_share(&doc, catalog.selectors(Office::President), MajorParty::DEM)
            .unwrap();
        // The third-party tally is excluded before totals are taken.
        assert_eq!(dem.len(), 2);
        assert!((dem.share("1A", Some(MajorParty::DEM)).unwrap() - 0.6).abs() < 1e-9);
        assert!((dem.share("2B", Some(MajorParty::DEM)).unwrap() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn multi_district_selectors_union_before_aggregation() {
        let report = report();
        let doc = report.parse().unwrap();
        let catalog = ContestCatalog::year_2024();
        let rep = office_share(&doc, catalog.selectors(Office::Congress), MajorParty::REP)
            .unwrap();
        assert!((rep.share("1A", Some(MajorParty::REP)).unwrap() - 0.45).abs() < 1e-9);
        assert!((rep.share("2B", Some(MajorParty::REP)).unwrap() - 0.65).abs() < 1e-9);
    }

    #[test]
    fn office_candidates_drops_party_and_title_cases_names() {
        let report = report();
        let doc = report.parse().unwrap();
        let catalog = ContestCatalog::year_2024();
        let records =
            office_candidates(&doc, catalog.selectors(Office::WalledLakeSchoolBoard)).unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.party.is_none()));
        assert_eq!(records[0].candidate.as_deref(), Some("Susie Crafton"));
        assert_eq!(records[1].candidate.as_deref(), Some("Tricia Auten"));
    }

    #[test]
    fn title_casing_follows_word_boundaries() {
        assert_eq!(title_case("PATRICK WILLIAM O'GRADY"), "Patrick William O'Grady");
        assert_eq!(title_case("jane doe"), "Jane Doe");
        assert_eq!(title_case("McDonald"), "Mcdonald");
    }

    #[test]
    fn millage_shares_use_the_option_label() {
        let report = report();
        let doc = report.parse().unwrap();
        let selector = ContestSelector::millage_on("Fire").unwrap();
        let shares = millage_shares(&doc, &selector).unwrap();
        assert!((shares.share("1A", Some(ProposalOption::YES)).unwrap() - 0.7).abs() < 1e-9);
        assert!((shares.share("2B", Some(ProposalOption::YES)).unwrap() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn an_absent_millage_topic_yields_an_empty_table() {
        let report = report();
        let doc = report.parse().unwrap();
        let selector = ContestSelector::millage_on("Public Transportation").unwrap();
        let shares = millage_shares(&doc, &selector).unwrap();
        assert!(shares.is_empty());
    }

    #[test]
    fn share_tables_serialize_to_json_records() {
        let report = report();
        let doc = report.parse().unwrap();
        let catalog = ContestCatalog::year_2024();
        let dem = office_share(&doc, catalog.selectors(Office::President), MajorParty::DEM)
            .unwrap();
        let js = share_table_json(&dem).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&js).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
        assert_eq!(parsed[0]["precinct"], "1A");
        assert_eq!(parsed[0]["party"], "DEM");
        assert!((parsed[0]["voteShare"].as_f64().unwrap() - 0.6).abs() < 1e-9);
    }
}
