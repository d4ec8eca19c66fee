/*!

Extraction and aggregation pipeline for county election-results exports.

The input is the hierarchical "detail" document published per election: a
single `ElectionResult` root holding repeated `Contest` elements (stable
`key` attribute and free-text `text` attribute), each holding repeated
`Choice` elements (candidate name and party, or a ballot-option label), each
holding precinct-level `Precinct` rows (`name` and `votes` attributes, both
text that needs trimming and parsing).

The pipeline locates contests with the selectors of
[results::catalog::ContestCatalog], extracts raw precinct tallies, and
reduces them with the [vote_shares] crate into per-precinct vote shares that
can be joined across contests. The composed comparisons in
[results::analysis] produce the tables a plotting collaborator consumes;
rendering itself is out of scope for this crate.

```
use precinct_shares::results::catalog::{ContestCatalog, Office};
use precinct_shares::results::{office_share, ElectionReport};
use vote_shares::MajorParty;

let report = ElectionReport::from_xml(
    r#"<ElectionResult>
         <Contest key="124" text="Governor">
           <Choice text="A" party="DEM"><Precinct name="1A" votes="60"/></Choice>
           <Choice text="B" party="REP"><Precinct name="1A" votes="40"/></Choice>
         </Contest>
       </ElectionResult>"#,
);
let doc = report.parse()?;
let catalog = ContestCatalog::year_2022();
let dem = office_share(&doc, catalog.selectors(Office::Governor), MajorParty::DEM)?;
assert_eq!(dem.share("1A", Some(MajorParty::DEM)), Some(0.6));
# Ok::<(), precinct_shares::results::ResultsError>(())
```

*/

pub mod results;
