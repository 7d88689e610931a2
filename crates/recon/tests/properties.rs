// Property-based tests for the cleaning stages and the scorer.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::HashSet;

use fundmatch_recon::config::CompoundReference;
use fundmatch_recon::dedupe::Deduplicator;
use fundmatch_recon::identifiers::IdentifierReconciler;
use fundmatch_recon::matcher;
use fundmatch_recon::normalize::{MissingReferenceFilter, ReferenceNormalizer};
use fundmatch_recon::split::ReferenceSplitter;
use fundmatch_recon::{Stage, Table, Value};
use proptest::prelude::*;

const REF: &str = "Funder Project Reference";
const DOI: &str = "DOIs (Digital Object Identifiers)";
const IDS: &str = "Additional source IDs";

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// Small alphabet so duplicates and tokens show up often.
fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Missing),
        Just(Value::text("")),
        Just(Value::text("n/a")),
        Just(Value::text("NA")),
        Just(Value::text("N/A ")),
        "[a-c]{1,2}".prop_map(Value::text),
        (0i32..3).prop_map(|n| Value::number(n as f64)),
    ]
}

fn arb_table() -> impl Strategy<Value = Table> {
    proptest::collection::vec(proptest::collection::vec(arb_value(), 3), 0..30)
        .prop_map(|rows| Table::from_rows(vec![REF.into(), DOI.into(), IDS.into()], rows))
}

fn arb_secondary() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Missing),
        "[0-9]{1,5}".prop_map(|n| Value::text(format!("PubMed: {n}"))),
        "[0-9]{1,5}".prop_map(|n| Value::text(format!("Scopus: {n}"))),
    ]
}

fn arb_identifier_table() -> impl Strategy<Value = Table> {
    let doi = prop_oneof![Just(Value::Missing), "10\\.[0-9]{1,3}/[a-z]{1,3}".prop_map(Value::text)];
    proptest::collection::vec((Just(Value::text("G1")), doi, arb_secondary()), 0..20).prop_map(
        |rows| {
            Table::from_rows(
                vec![REF.into(), DOI.into(), IDS.into()],
                rows.into_iter().map(|(r, d, s)| vec![r, d, s]).collect(),
            )
        },
    )
}

fn tokens() -> Vec<String> {
    vec!["n/a".into(), "na".into()]
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn dedupe_is_idempotent(table in arb_table()) {
        let once = Deduplicator.apply(table).unwrap();
        let twice = Deduplicator.apply(once.clone()).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn dedupe_keeps_first_occurrences_in_order(table in arb_table()) {
        let out = Deduplicator.apply(table.clone()).unwrap();

        let mut seen = HashSet::new();
        let expected: Vec<_> = table
            .rows()
            .iter()
            .filter(|row| seen.insert((*row).clone()))
            .cloned()
            .collect();
        prop_assert_eq!(out.rows(), expected.as_slice());
    }

    #[test]
    fn normalizer_only_clears_tokens(table in arb_table()) {
        let out = ReferenceNormalizer::new(REF, &tokens()).apply(table.clone()).unwrap();
        prop_assert_eq!(out.len(), table.len());

        for (before, after) in table.rows().iter().zip(out.rows()) {
            let is_token = matches!(
                before[0].as_str().map(str::to_lowercase).as_deref(),
                Some("n/a") | Some("na")
            );
            if is_token {
                prop_assert!(after[0].is_missing());
            } else {
                prop_assert_eq!(&after[0], &before[0]);
            }
            // Other columns untouched
            prop_assert_eq!(&after[1..], &before[1..]);
        }
    }

    #[test]
    fn no_missing_reference_survives_filter(table in arb_table()) {
        let normalized = ReferenceNormalizer::new(REF, &tokens()).apply(table).unwrap();
        let out = MissingReferenceFilter::new(REF).apply(normalized).unwrap();
        prop_assert!(out.rows().iter().all(|row| !row[0].is_missing()));
    }

    #[test]
    fn no_row_keeps_doi_and_secondary_id(table in arb_identifier_table()) {
        let reconciler = IdentifierReconciler::new(DOI, IDS, "PubMed:").unwrap();
        let out = reconciler.apply(table).unwrap();
        prop_assert!(out.rows().iter().all(|row| row[1].is_missing() || row[2].is_missing()));
        prop_assert!(out
            .rows()
            .iter()
            .all(|row| !row[2].to_text().starts_with("PubMed:")));
    }

    #[test]
    fn compound_splits_with_any_whitespace(gap in "[ \t\n]{1,6}", lead in "[ ]{0,2}") {
        let splitter = ReferenceSplitter::new(
            REF,
            &[CompoundReference { first: "123/A/1/Z".into(), second: "123/A/1/B".into() }],
        )
        .unwrap();
        let input = Table::from_rows(
            vec![REF.into()],
            vec![vec![Value::text(format!("{lead}123/A/1/Z{gap}123/A/1/B"))]],
        );
        let out = splitter.apply(input).unwrap();
        prop_assert_eq!(out.len(), 2);
        prop_assert_eq!(&out.rows()[0][0], &Value::text("123/A/1/Z"));
        prop_assert_eq!(&out.rows()[1][0], &Value::text("123/A/1/B"));
    }

    #[test]
    fn scores_are_bounded_and_symmetric(a in "[A-Za-z ]{0,20}", b in "[A-Za-z ]{0,20}") {
        let ab = matcher::score(&a, &b);
        prop_assert!(ab <= 100);
        prop_assert_eq!(ab, matcher::score(&b, &a));
    }

    #[test]
    fn names_score_100_against_themselves(a in "[A-Za-z][A-Za-z ]{0,20}") {
        prop_assert_eq!(matcher::score(&a, &a), 100);
    }
}
