//! Kiểu dữ liệu lõi cho hồ sơ khám, sự kiện lâm sàng và vector đặc trưng.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Định dạng ngày duy nhất được chấp nhận trong ghi chú và bảng khám.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Đọc ngày `YYYY-MM-DD`: năm đúng 4 chữ số, tháng và ngày 1–2 chữ số.
///
/// Chặn trước các dạng chrono vẫn chấp nhận với `%Y` (năm có dấu, năm ngắn,
/// khoảng trắng chen giữa).
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let mut parts = text.split('-');
    let (year, month, day) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let digits = |part: &str, min: usize, max: usize| {
        (min..=max).contains(&part.len()) && part.bytes().all(|b| b.is_ascii_digit())
    };
    if !(digits(year, 4, 4) && digits(month, 1, 2) && digits(day, 1, 2)) {
        return None;
    }

    NaiveDate::parse_from_str(text, DATE_FORMAT).ok()
}

/// Cấu hình tên cột trong các bảng CSV đầu vào.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    pub patient_id_column: String,
    pub visit_date_column: String,
    pub psa_column: String,
    pub weight_column: String,
    pub pirads_column: String,
    pub treatment_column: String,
    /// Cột chứa ghi chú lâm sàng dạng `ngày: nội dung|ngày: nội dung`.
    pub notes_column: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            patient_id_column: "PatientID".to_string(),
            visit_date_column: "VisitDate".to_string(),
            psa_column: "PSA".to_string(),
            weight_column: "Weight".to_string(),
            pirads_column: "PIRADS".to_string(),
            treatment_column: "Treatment".to_string(),
            notes_column: "Clinical Notes".to_string(),
        }
    }
}

/// Một sự kiện lâm sàng có ngày, lấy từ ghi chú tự do.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClinicalEvent {
    pub date: NaiveDate,
    pub note: String,
}

impl fmt::Display for ClinicalEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.date.format(DATE_FORMAT), self.note)
    }
}

/// Lý do một mục ghi chú bị bỏ qua.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Không có dấu phân tách `": "` giữa ngày và nội dung.
    MissingSeparator,
    /// Phần ngày không khớp `YYYY-MM-DD`.
    InvalidDate(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingSeparator => write!(f, "missing \": \" separator"),
            SkipReason::InvalidDate(raw) => write!(f, "invalid date {raw:?}"),
        }
    }
}

/// Kết quả phân tích một mục ghi chú: sự kiện hoặc bị bỏ qua.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    Event(ClinicalEvent),
    Skipped { entry: String, reason: SkipReason },
}

impl EntryOutcome {
    pub fn into_event(self) -> Option<ClinicalEvent> {
        match self {
            EntryOutcome::Event(event) => Some(event),
            EntryOutcome::Skipped { .. } => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, EntryOutcome::Skipped { .. })
    }
}

/// Một lần khám trong bảng lịch sử khám.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientVisitRecord {
    pub patient_id: i64,
    pub visit_date: NaiveDate,
    pub psa: Option<f64>,
    pub weight: Option<f64>,
    pub pirads: Option<f64>,
    pub treatment: Option<String>,
}

/// Nhóm điều trị được đánh dấu trong vector đặc trưng.
///
/// Việc so khớp là tìm chuỗi con trên giá trị đã viết hoa, nên
/// `"RADIATIONOLOGY"` cũng được tính là xạ trị.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TreatmentKind {
    Surgery,
    Radiation,
    Adt,
}

impl TreatmentKind {
    pub const ALL: [TreatmentKind; 3] = [
        TreatmentKind::Surgery,
        TreatmentKind::Radiation,
        TreatmentKind::Adt,
    ];

    /// Từ khóa viết hoa dùng để so khớp.
    pub fn keyword(self) -> &'static str {
        match self {
            TreatmentKind::Surgery => "SURGERY",
            TreatmentKind::Radiation => "RADIATION",
            TreatmentKind::Adt => "ADT",
        }
    }

    pub fn matches(self, treatment: &str) -> bool {
        treatment.to_uppercase().contains(self.keyword())
    }
}

/// Vector 11 đặc trưng cho mô hình dự đoán tuổi thọ.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct FeatureVector {
    #[serde(rename = "PSA_Initial")]
    pub psa_initial: f64,
    #[serde(rename = "PSA_Latest")]
    pub psa_latest: f64,
    #[serde(rename = "PSA_Change")]
    pub psa_change: f64,
    #[serde(rename = "Max_PIRADS")]
    pub max_pirads: f64,
    #[serde(rename = "Weight_Initial")]
    pub weight_initial: f64,
    #[serde(rename = "Weight_Latest")]
    pub weight_latest: f64,
    #[serde(rename = "Weight_Change")]
    pub weight_change: f64,
    /// Luôn bằng 0: bảng khám chưa có cột điểm đau xương.
    #[serde(rename = "Max_BonePainScore")]
    pub max_bone_pain_score: f64,
    #[serde(rename = "Has_Surgery")]
    pub has_surgery: f64,
    #[serde(rename = "Has_Radiation")]
    pub has_radiation: f64,
    #[serde(rename = "Has_ADT")]
    pub has_adt: f64,
}

impl FeatureVector {
    pub const LEN: usize = 11;

    /// Tên đặc trưng theo đúng thứ tự của [`FeatureVector::to_array`].
    pub const NAMES: [&'static str; Self::LEN] = [
        "PSA_Initial",
        "PSA_Latest",
        "PSA_Change",
        "Max_PIRADS",
        "Weight_Initial",
        "Weight_Latest",
        "Weight_Change",
        "Max_BonePainScore",
        "Has_Surgery",
        "Has_Radiation",
        "Has_ADT",
    ];

    /// Thứ tự cố định mà mô hình dự đoán mong đợi.
    pub fn to_array(&self) -> [f64; Self::LEN] {
        [
            self.psa_initial,
            self.psa_latest,
            self.psa_change,
            self.max_pirads,
            self.weight_initial,
            self.weight_latest,
            self.weight_change,
            self.max_bone_pain_score,
            self.has_surgery,
            self.has_radiation,
            self.has_adt,
        ]
    }

    pub fn has_treatment(&self, kind: TreatmentKind) -> bool {
        let flag = match kind {
            TreatmentKind::Surgery => self.has_surgery,
            TreatmentKind::Radiation => self.has_radiation,
            TreatmentKind::Adt => self.has_adt,
        };
        flag > 0.0
    }
}

/// Ngữ cảnh thời gian của một bệnh nhân cho các bước tóm tắt phía sau.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatientContext {
    pub patient_id: i64,
    pub event_count: usize,
    /// Các dòng `YYYY-MM-DD: ghi chú` nối bằng ký tự xuống dòng.
    pub temporal_context: String,
}

/// Mô hình nhận vector đặc trưng và trả về số năm sống dự đoán.
pub trait LifespanPredictor {
    fn predict(&self, features: &FeatureVector) -> Result<f64, CarelineError>;
}

/// Hồi quy tuyến tính trên 11 đặc trưng.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: [f64; FeatureVector::LEN],
}

impl LinearModel {
    pub fn new(intercept: f64, coefficients: [f64; FeatureVector::LEN]) -> Self {
        Self {
            intercept,
            coefficients,
        }
    }

    /// Đọc mô hình từ JSON `{"intercept": .., "coefficients": [..]}`.
    pub fn from_json_str(json: &str) -> Result<Self, CarelineError> {
        serde_json::from_str(json).map_err(|err| CarelineError::Model(err.to_string()))
    }
}

impl LifespanPredictor for LinearModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64, CarelineError> {
        let value = features
            .to_array()
            .iter()
            .zip(self.coefficients.iter())
            .fold(self.intercept, |acc, (x, w)| acc + x * w);

        if value.is_finite() {
            Ok(value)
        } else {
            Err(CarelineError::Model(format!(
                "Prediction is not a finite number: {value}"
            )))
        }
    }
}

/// Lỗi chung của careline.
#[derive(Debug, thiserror::Error)]
pub enum CarelineError {
    #[error("Không tìm thấy dữ liệu cho bệnh nhân {patient_id}")]
    NotFound { patient_id: i64 },
    #[error("Thiếu cột {0}")]
    MissingColumn(String),
    #[error("Không đọc được dữ liệu: {0}")]
    Parse(String),
    #[error("Lỗi truy cập tệp: {0}")]
    Io(String),
    #[error("Mô hình không hợp lệ: {0}")]
    Model(String),
}
