//! CSV-backed visit and clinical-note tables.

use std::fs::File;
use std::io;
use std::path::Path;

use careline_core::{parse_date, CarelineError, PatientVisitRecord, StoreConfig};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};

/// Cell values read as "no value".
const NA_MARKERS: [&str; 13] = [
    "", "NA", "N/A", "n/a", "#N/A", "<NA>", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None",
];

/// Visit history for every patient, in table order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisitStore {
    records: Vec<PatientVisitRecord>,
}

impl VisitStore {
    pub fn new(records: Vec<PatientVisitRecord>) -> Self {
        Self { records }
    }

    /// Load the visit table from a CSV file.
    pub fn from_path<P: AsRef<Path>>(path: P, config: &StoreConfig) -> Result<Self, CarelineError> {
        let file = open_file(path.as_ref())?;
        Self::from_reader(file, config)
    }

    pub fn from_csv_str(data: &str, config: &StoreConfig) -> Result<Self, CarelineError> {
        Self::from_reader(data.as_bytes(), config)
    }

    pub fn from_reader<R: io::Read>(reader: R, config: &StoreConfig) -> Result<Self, CarelineError> {
        let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
        let headers = reader.headers().map_err(csv_error)?.clone();

        let patient_id = column_index(&headers, &config.patient_id_column)?;
        let visit_date = column_index(&headers, &config.visit_date_column)?;
        let psa = column_index(&headers, &config.psa_column)?;
        let weight = column_index(&headers, &config.weight_column)?;
        let pirads = column_index(&headers, &config.pirads_column)?;
        let treatment = column_index(&headers, &config.treatment_column)?;

        let mut records = Vec::new();
        for (index, result) in reader.records().enumerate() {
            let row = result.map_err(csv_error)?;
            let line = index + 1;

            records.push(PatientVisitRecord {
                patient_id: Cell::new(&row, patient_id, line, &config.patient_id_column)
                    .patient_id()?,
                visit_date: Cell::new(&row, visit_date, line, &config.visit_date_column).date()?,
                psa: Cell::new(&row, psa, line, &config.psa_column).optional_number()?,
                weight: Cell::new(&row, weight, line, &config.weight_column).optional_number()?,
                pirads: Cell::new(&row, pirads, line, &config.pirads_column).optional_number()?,
                treatment: Cell::new(&row, treatment, line, &config.treatment_column)
                    .optional_text(),
            });
        }

        let store = Self::new(records);
        tracing::info!(
            rows = store.len(),
            patients = store.patient_ids().len(),
            "loaded visit table"
        );
        Ok(store)
    }

    pub fn records(&self) -> &[PatientVisitRecord] {
        &self.records
    }

    /// Visits of one patient, in table order.
    pub fn records_for(&self, patient_id: i64) -> impl Iterator<Item = &PatientVisitRecord> {
        self.records
            .iter()
            .filter(move |record| record.patient_id == patient_id)
    }

    /// Distinct patient ids in first-seen order.
    pub fn patient_ids(&self) -> Vec<i64> {
        distinct_ids(self.records.iter().map(|record| record.patient_id))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// One row of the patient record table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRow {
    pub patient_id: i64,
    pub notes: String,
}

/// Raw clinical notes per patient.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteStore {
    rows: Vec<NoteRow>,
}

impl NoteStore {
    pub fn new(rows: Vec<NoteRow>) -> Self {
        Self { rows }
    }

    pub fn from_path<P: AsRef<Path>>(path: P, config: &StoreConfig) -> Result<Self, CarelineError> {
        let file = open_file(path.as_ref())?;
        Self::from_reader(file, config)
    }

    pub fn from_csv_str(data: &str, config: &StoreConfig) -> Result<Self, CarelineError> {
        Self::from_reader(data.as_bytes(), config)
    }

    pub fn from_reader<R: io::Read>(reader: R, config: &StoreConfig) -> Result<Self, CarelineError> {
        let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
        let headers = reader.headers().map_err(csv_error)?.clone();

        let patient_id = column_index(&headers, &config.patient_id_column)?;
        let notes = column_index(&headers, &config.notes_column)?;

        let mut rows = Vec::new();
        for (index, result) in reader.records().enumerate() {
            let row = result.map_err(csv_error)?;
            let line = index + 1;

            rows.push(NoteRow {
                patient_id: Cell::new(&row, patient_id, line, &config.patient_id_column)
                    .patient_id()?,
                notes: Cell::new(&row, notes, line, &config.notes_column)
                    .optional_text()
                    .unwrap_or_default(),
            });
        }

        let store = Self::new(rows);
        tracing::info!(rows = store.len(), "loaded patient record table");
        Ok(store)
    }

    /// Notes from the first row of the patient, if any.
    pub fn notes_for(&self, patient_id: i64) -> Option<&str> {
        self.rows
            .iter()
            .find(|row| row.patient_id == patient_id)
            .map(|row| row.notes.as_str())
    }

    pub fn patient_ids(&self) -> Vec<i64> {
        distinct_ids(self.rows.iter().map(|row| row.patient_id))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

struct Cell<'a> {
    text: &'a str,
    line: usize,
    column: &'a str,
}

impl<'a> Cell<'a> {
    fn new(row: &'a StringRecord, index: usize, line: usize, column: &'a str) -> Self {
        Self {
            text: row.get(index).unwrap_or(""),
            line,
            column,
        }
    }

    fn is_missing(&self) -> bool {
        NA_MARKERS.contains(&self.text)
    }

    fn invalid(&self, expected: &str) -> CarelineError {
        CarelineError::Parse(format!(
            "row {}, column {}: expected {expected}, found {:?}",
            self.line, self.column, self.text
        ))
    }

    fn patient_id(&self) -> Result<i64, CarelineError> {
        self.text
            .parse::<i64>()
            .map_err(|_| self.invalid("an integer patient id"))
    }

    fn date(&self) -> Result<NaiveDate, CarelineError> {
        parse_date(self.text).ok_or_else(|| self.invalid("a YYYY-MM-DD date"))
    }

    fn optional_number(&self) -> Result<Option<f64>, CarelineError> {
        if self.is_missing() {
            return Ok(None);
        }
        self.text
            .parse::<f64>()
            .map(Some)
            .map_err(|_| self.invalid("a number"))
    }

    fn optional_text(&self) -> Option<String> {
        if self.is_missing() {
            None
        } else {
            Some(self.text.to_string())
        }
    }
}

fn column_index(headers: &StringRecord, name: &str) -> Result<usize, CarelineError> {
    headers
        .iter()
        .position(|header| header == name)
        .ok_or_else(|| CarelineError::MissingColumn(name.to_string()))
}

fn distinct_ids(ids: impl Iterator<Item = i64>) -> Vec<i64> {
    let mut seen = Vec::new();
    for id in ids {
        if !seen.contains(&id) {
            seen.push(id);
        }
    }
    seen
}

fn open_file(path: &Path) -> Result<File, CarelineError> {
    File::open(path).map_err(|err| CarelineError::Io(format!("{}: {err}", path.display())))
}

fn csv_error(err: csv::Error) -> CarelineError {
    CarelineError::Parse(err.to_string())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const VISITS: &str = "\
PatientID,VisitDate,PSA,Weight,PIRADS,Treatment
7,2024-01-10,5.5,,3,ADT
7,2024-02-10,NA,81.5,,
8,2024-03-01,2.0,70,4,None
";

    #[test]
    fn missing_cells_become_none() {
        let store = VisitStore::from_csv_str(VISITS, &StoreConfig::default()).unwrap();
        assert_eq!(store.len(), 3);

        let first = &store.records()[0];
        assert_eq!(first.psa, Some(5.5));
        assert_eq!(first.weight, None);
        assert_eq!(first.treatment.as_deref(), Some("ADT"));

        let second = &store.records()[1];
        assert_eq!(second.psa, None);
        assert_eq!(second.weight, Some(81.5));
        assert_eq!(second.pirads, None);
        assert_eq!(second.treatment, None);

        assert_eq!(store.records()[2].treatment, None);
    }

    #[test]
    fn patient_ids_are_distinct_in_first_seen_order() {
        let store = VisitStore::from_csv_str(VISITS, &StoreConfig::default()).unwrap();
        assert_eq!(store.patient_ids(), vec![7, 8]);
        assert_eq!(store.records_for(7).count(), 2);
        assert_eq!(store.records_for(99).count(), 0);
    }

    #[test]
    fn missing_column_is_reported() {
        let data = "PatientID,VisitDate,PSA,Weight,Treatment\n1,2024-01-01,1,2,ADT\n";
        let err = VisitStore::from_csv_str(data, &StoreConfig::default()).unwrap_err();
        assert!(matches!(err, CarelineError::MissingColumn(name) if name == "PIRADS"));
    }

    #[test]
    fn bad_number_names_row_and_column() {
        let data = "PatientID,VisitDate,PSA,Weight,PIRADS,Treatment\n\
                    1,2024-01-01,1.0,80,3,\n\
                    1,2024-02-01,high,80,3,\n";
        let err = VisitStore::from_csv_str(data, &StoreConfig::default()).unwrap_err();
        match err {
            CarelineError::Parse(message) => {
                assert!(message.contains("row 2"), "{message}");
                assert!(message.contains("PSA"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn bad_visit_date_fails_the_load() {
        for date in ["01/02/2024", "24-01-01", "+2024-01-01"] {
            let data = format!("PatientID,VisitDate,PSA,Weight,PIRADS,Treatment\n1,{date},1,2,3,\n");
            let err = VisitStore::from_csv_str(&data, &StoreConfig::default()).unwrap_err();
            assert!(matches!(err, CarelineError::Parse(_)), "{date}");
        }
    }

    #[test]
    fn pandas_style_na_markers_are_absent() {
        let data = "PatientID,VisitDate,PSA,Weight,PIRADS,Treatment\n\
                    1,2024-01-01,NULL,n/a,<NA>,#N/A\n\
                    1,2024-02-01,-nan,-NaN,NA,null\n";
        let store = VisitStore::from_csv_str(data, &StoreConfig::default()).unwrap();
        assert_eq!(store.records().len(), 2);
        for record in store.records() {
            assert_eq!(record.psa, None);
            assert_eq!(record.weight, None);
            assert_eq!(record.pirads, None);
            assert_eq!(record.treatment, None);
        }
    }

    #[test]
    fn custom_column_names_are_honoured() {
        let config = StoreConfig {
            patient_id_column: "id".to_string(),
            notes_column: "notes".to_string(),
            ..StoreConfig::default()
        };
        let store = NoteStore::from_csv_str("id,notes\n4,\"2024-01-01: seen\"\n", &config).unwrap();
        assert_eq!(store.notes_for(4), Some("2024-01-01: seen"));
    }

    #[test]
    fn notes_come_from_the_first_matching_row() {
        let data = "PatientID,Clinical Notes\n\
                    1,2024-01-01: first\n\
                    2,\n\
                    1,2024-05-01: second\n";
        let store = NoteStore::from_csv_str(data, &StoreConfig::default()).unwrap();
        assert_eq!(store.notes_for(1), Some("2024-01-01: first"));
        assert_eq!(store.notes_for(2), Some(""));
        assert_eq!(store.notes_for(3), None);
        assert_eq!(store.patient_ids(), vec![1, 2]);
    }

    #[test]
    fn stores_can_be_shared_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<VisitStore>();
        assert_send_sync::<NoteStore>();
    }

    #[test]
    fn loads_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(VISITS.as_bytes()).unwrap();

        let store = VisitStore::from_path(file.path(), &StoreConfig::default()).unwrap();
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn unreadable_path_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = NoteStore::from_path(dir.path().join("absent.csv"), &StoreConfig::default())
            .unwrap_err();
        assert!(matches!(err, CarelineError::Io(_)));
    }
}
