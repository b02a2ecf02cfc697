use careline_core::StoreConfig;
use careline_records::{
    evidence_queries, literature_query, patient_context, psa_trend, NoteStore, PsaTrend,
    EXCLUSION_TERMS,
};

fn fixture_path(name: &str) -> String {
    format!("{}/tests/data/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn context_for(patient_id: i64) -> String {
    let store = NoteStore::from_path(fixture_path("records.csv"), &StoreConfig::default())
        .expect("fixture records should load");
    patient_context(patient_id, &store)
        .expect("patient should exist")
        .temporal_context
}

#[test]
fn treated_patient_shows_declining_psa() {
    let context = context_for(1);
    assert_eq!(psa_trend(&context), PsaTrend::SteadilyDeclining);

    let queries = evidence_queries(&context);
    assert_eq!(
        queries.pubmed,
        vec![
            "ADT prostate cancer",
            "PSA progression prostate cancer",
            "PIRADS scoring prostate cancer",
            "weight change prostate cancer",
        ]
    );
}

#[test]
fn rising_psa_with_bone_pain_drives_the_query() {
    let context = context_for(2);
    assert_eq!(psa_trend(&context), PsaTrend::Rising);

    let queries = evidence_queries(&context);
    assert_eq!(
        queries.trials,
        vec!["PSA progression prostate cancer", "bone metastases prostate cancer"]
    );

    assert_eq!(
        literature_query(&context),
        format!("(PSA trajectory OR bone pain prognosis OR PSA rising) {EXCLUSION_TERMS}")
    );
}
