use std::fs;

use careline_core::StoreConfig;
use careline_records::{extract_features, VisitStore};
use serde_json::Value;

fn fixture_path(name: &str) -> String {
    format!("{}/tests/data/{name}", env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn patient_features_match_golden() {
    let store = VisitStore::from_path(fixture_path("visits.csv"), &StoreConfig::default())
        .expect("Không đọc được bảng khám mẫu");

    let features = extract_features(1, &store).expect("Không tạo được vector đặc trưng");
    let actual = serde_json::to_value(features).expect("Không serialize vector đặc trưng");

    let expected = fs::read_to_string(fixture_path("features_patient_1.json"))
        .expect("Không đọc được golden snapshot");
    let expected_value: Value = serde_json::from_str(&expected).expect("Golden không hợp lệ");

    assert_eq!(actual, expected_value);
}
