//! Bridge WASM <-> JavaScript cho phân tích ghi chú và trích xuất đặc trưng.

use careline_core::{CarelineError, StoreConfig};
use careline_records::{NoteStore, VisitStore};
use serde::Deserialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[derive(Deserialize)]
struct JsStoreConfig {
    #[serde(default)]
    patient_id_column: Option<String>,
    #[serde(default)]
    visit_date_column: Option<String>,
    #[serde(default)]
    psa_column: Option<String>,
    #[serde(default)]
    weight_column: Option<String>,
    #[serde(default)]
    pirads_column: Option<String>,
    #[serde(default)]
    treatment_column: Option<String>,
    #[serde(default)]
    notes_column: Option<String>,
}

impl From<JsStoreConfig> for StoreConfig {
    fn from(cfg: JsStoreConfig) -> Self {
        let base = StoreConfig::default();
        StoreConfig {
            patient_id_column: cfg.patient_id_column.unwrap_or(base.patient_id_column),
            visit_date_column: cfg.visit_date_column.unwrap_or(base.visit_date_column),
            psa_column: cfg.psa_column.unwrap_or(base.psa_column),
            weight_column: cfg.weight_column.unwrap_or(base.weight_column),
            pirads_column: cfg.pirads_column.unwrap_or(base.pirads_column),
            treatment_column: cfg.treatment_column.unwrap_or(base.treatment_column),
            notes_column: cfg.notes_column.unwrap_or(base.notes_column),
        }
    }
}

/// Phân tích chuỗi ghi chú thành mảng `{ date, note }`.
#[wasm_bindgen]
pub fn parse_notes(raw: &str) -> Result<JsValue, JsValue> {
    install_panic_hook();

    let events = careline_records::parse_notes(raw);
    to_value(&events).map_err(|err| JsValue::from_str(&format!("Không serialize sự kiện: {err}")))
}

/// Trích xuất vector đặc trưng từ nội dung CSV của bảng khám.
#[wasm_bindgen]
pub fn extract_features(
    visits_csv: &str,
    patient_id: i64,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    install_panic_hook();

    let cfg = read_config(config)?;
    let store = VisitStore::from_csv_str(visits_csv, &cfg)
        .map_err(|err| JsValue::from_str(&format_careline_error(err)))?;
    let features = careline_records::extract_features(patient_id, &store)
        .map_err(|err| JsValue::from_str(&format_careline_error(err)))?;

    to_value(&features)
        .map_err(|err| JsValue::from_str(&format!("Không serialize vector đặc trưng: {err}")))
}

/// Dựng ngữ cảnh thời gian của bệnh nhân từ nội dung CSV hồ sơ.
#[wasm_bindgen]
pub fn patient_context(
    records_csv: &str,
    patient_id: i64,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    install_panic_hook();

    let cfg = read_config(config)?;
    let store = NoteStore::from_csv_str(records_csv, &cfg)
        .map_err(|err| JsValue::from_str(&format_careline_error(err)))?;
    let context = careline_records::patient_context(patient_id, &store)
        .map_err(|err| JsValue::from_str(&format_careline_error(err)))?;

    to_value(&context).map_err(|err| JsValue::from_str(&format!("Không serialize ngữ cảnh: {err}")))
}

fn read_config(config: Option<JsValue>) -> Result<StoreConfig, JsValue> {
    match config {
        Some(js_cfg) => {
            let cfg: JsStoreConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("Không đọc được config: {err}")))?;
            Ok(StoreConfig::from(cfg))
        }
        None => Ok(StoreConfig::default()),
    }
}

fn install_panic_hook() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

fn format_careline_error(err: CarelineError) -> String {
    format!("Careline error: {err}")
}
