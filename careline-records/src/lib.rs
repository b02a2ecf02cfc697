//! Patient record tables to clinical events, feature vectors and patient context.
//!
//! Stores are loaded once by the caller and passed by reference to every
//! operation; nothing here keeps global state.

mod context;
mod evidence;
mod features;
mod notes;
mod store;

pub use context::{patient_context, render_timeline};
pub use evidence::{
    cite_study, evidence_queries, is_generic_abstract, literature_query, psa_trend, psa_values,
    summarize_finding, Citation, EvidenceQueries, PsaTrend, StudyMetadata, EXCLUSION_TERMS,
    FINDING_SUMMARY_CHARS,
};
pub use features::{extract_features, predict_lifespan};
pub use notes::{parse_entry, parse_note_entries, parse_notes, NOTE_DELIMITER, NOTE_SEPARATOR};
pub use store::{NoteRow, NoteStore, VisitStore};
