//! The contest catalog: how to find a contest inside a results document.
//!
//! Contests are located by stable numeric key where one is known (keys
//! survive ballot wording changes between drafts), by exact display text, or
//! by text rules for families of races whose membership is decided by the
//! wording ("Representative in Congress ..." matches every district at
//! once). The catalogs are per-election-year configuration handed to the
//! pipeline, not ambient lookup tables.

use snafu::ResultExt;

use std::collections::BTreeMap;

use regex::{Regex, RegexBuilder};

use crate::results::*;

/// A rule describing how to find one or more contests.
///
/// Selectors are a closed set evaluated by [ContestSelector::matches]; new
/// matching rules are added here without touching the extractor.
#[derive(Debug, Clone)]
pub enum ContestSelector {
    /// The stable numeric key attribute equals this value.
    ExactKey(String),
    /// The display text equals this value. Used when no stable key is known.
    ExactText(String),
    /// The display text starts with this prefix.
    TextPrefix(String),
    /// The display text contains every term.
    TextContainsAll(Vec<String>),
    /// The display text contains one of the literals or matches one of the
    /// case-insensitive patterns.
    TextContainsAnyPattern {
        literals: Vec<String>,
        patterns: Vec<Regex>,
    },
    /// Every inner selector matches.
    AllOf(Vec<ContestSelector>),
    /// The inner selector does not match.
    Not(Box<ContestSelector>),
}

impl ContestSelector {
    pub fn key(key: &str) -> ContestSelector {
        ContestSelector::ExactKey(key.to_string())
    }

    pub fn text(text: &str) -> ContestSelector {
        ContestSelector::ExactText(text.to_string())
    }

    pub fn prefix(prefix: &str) -> ContestSelector {
        ContestSelector::TextPrefix(prefix.to_string())
    }

    pub fn contains_all(terms: &[&str]) -> ContestSelector {
        ContestSelector::TextContainsAll(terms.iter().map(|t| t.to_string()).collect())
    }

    /// Millage contests on a topic.
    ///
    /// Matches contests whose text mentions "Millage" and the topic, either
    /// literally or as a case-insensitive pattern ("School|Educ" buckets
    /// both wordings under one topic).
    pub fn millage_on(topic: &str) -> ResultsResult<ContestSelector> {
        let pattern = RegexBuilder::new(topic)
            .case_insensitive(true)
            .build()
            .context(PatternSnafu { pattern: topic })?;
        Ok(ContestSelector::AllOf(vec![
            ContestSelector::contains_all(&["Millage"]),
            ContestSelector::TextContainsAnyPattern {
                literals: vec![topic.to_string()],
                patterns: vec![pattern],
            },
        ]))
    }

    /// The residual variant: millage contests whose text does not mention
    /// the topic literally.
    pub fn millage_excluding(topic: &str) -> ContestSelector {
        ContestSelector::AllOf(vec![
            ContestSelector::contains_all(&["Millage"]),
            ContestSelector::Not(Box::new(ContestSelector::contains_all(&[topic]))),
        ])
    }

    /// Evaluates the selector against a contest's key and display text.
    pub fn matches(&self, key: Option<&str>, text: Option<&str>) -> bool {
        match self {
            ContestSelector::ExactKey(k) => key == Some(k.as_str()),
            ContestSelector::ExactText(t) => text == Some(t.as_str()),
            ContestSelector::TextPrefix(p) => text.is_some_and(|t| t.starts_with(p.as_str())),
            ContestSelector::TextContainsAll(terms) => {
                text.is_some_and(|t| terms.iter().all(|term| t.contains(term.as_str())))
            }
            ContestSelector::TextContainsAnyPattern { literals, patterns } => {
                text.is_some_and(|t| {
                    literals.iter().any(|l| t.contains(l.as_str()))
                        || patterns.iter().any(|p| p.is_match(t))
                })
            }
            ContestSelector::AllOf(inner) => inner.iter().all(|s| s.matches(key, text)),
            ContestSelector::Not(inner) => !inner.matches(key, text),
        }
    }
}

/// The offices and race families a catalog can locate.
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Copy, Hash)]
pub enum Office {
    Governor,
    SecretaryOfState,
    AttorneyGeneral,
    StateBoardOfEducation,
    SupremeCourt,
    /// The partial-term supreme-court seat, tabulated as its own contest.
    SupremeCourtSpecial,
    President,
    CountyExecutive,
    Prosecutor,
    Sheriff,
    WaterResourcesCommissioner,
    CountyClerk,
    WalledLakeSchoolBoard,
    /// Every school-board race in the county at once.
    SchoolBoards,
    /// Every library-board race in the county at once.
    LibraryBoards,
    StateLegislature,
    Congress,
    CountyCommission,
}

/// The per-year registry of contest selectors.
#[derive(Debug, Clone)]
pub struct ContestCatalog {
    pub year: u16,
    offices: BTreeMap<Office, Vec<ContestSelector>>,
}

impl ContestCatalog {
    /// Statewide offices of the 2022 general election.
    pub fn year_2022() -> ContestCatalog {
        let mut offices: BTreeMap<Office, Vec<ContestSelector>> = BTreeMap::new();
        offices.insert(Office::Governor, vec![ContestSelector::key("124")]);
        offices.insert(Office::SecretaryOfState, vec![ContestSelector::key("71")]);
        offices.insert(Office::AttorneyGeneral, vec![ContestSelector::key("28")]);
        offices.insert(
            Office::StateBoardOfEducation,
            vec![ContestSelector::key("161")],
        );
        offices.insert(Office::SupremeCourt, vec![ContestSelector::key("178")]);
        ContestCatalog {
            year: 2022,
            offices,
        }
    }

    /// The 2024 general election: statewide, countywide and multi-district
    /// race families.
    pub fn year_2024() -> ContestCatalog {
        let mut offices: BTreeMap<Office, Vec<ContestSelector>> = BTreeMap::new();
        offices.insert(Office::President, vec![ContestSelector::key("124")]);
        offices.insert(
            Office::StateBoardOfEducation,
            vec![ContestSelector::key("161")],
        );
        offices.insert(Office::SupremeCourt, vec![ContestSelector::key("178")]);
        offices.insert(
            Office::SupremeCourtSpecial,
            vec![ContestSelector::key("262")],
        );
        offices.insert(Office::CountyExecutive, vec![ContestSelector::key("272")]);
        offices.insert(Office::Prosecutor, vec![ContestSelector::key("368")]);
        offices.insert(Office::Sheriff, vec![ContestSelector::key("244")]);
        offices.insert(
            Office::WaterResourcesCommissioner,
            vec![ContestSelector::key("216")],
        );
        offices.insert(
            Office::WalledLakeSchoolBoard,
            vec![ContestSelector::key("141")],
        );
        offices.insert(
            Office::CountyClerk,
            vec![ContestSelector::text("Clerk and Register of Deeds")],
        );
        offices.insert(
            Office::SchoolBoards,
            vec![ContestSelector::contains_all(&["Board Member", "School"])],
        );
        offices.insert(
            Office::LibraryBoards,
            vec![ContestSelector::contains_all(&["Board Member", "Library"])],
        );
        offices.insert(
            Office::StateLegislature,
            vec![ContestSelector::prefix("Representative in State Legislature")],
        );
        offices.insert(
            Office::Congress,
            vec![ContestSelector::prefix("Representative in Congress")],
        );
        offices.insert(
            Office::CountyCommission,
            vec![ContestSelector::prefix("County Commissioner")],
        );
        ContestCatalog {
            year: 2024,
            offices,
        }
    }

    /// The selectors registered for an office. Empty when the office is not
    /// part of this year's catalog, which callers treat like any other
    /// no-match case.
    pub fn selectors(&self, office: Office) -> &[ContestSelector] {
        self.offices
            .get(&office)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}
