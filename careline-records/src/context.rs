//! Plain-text patient context assembled from parsed notes.

use careline_core::{CarelineError, ClinicalEvent, PatientContext};

use crate::notes::parse_notes;
use crate::store::NoteStore;

/// Render events as `YYYY-MM-DD: note` lines, one per event, in the given order.
pub fn render_timeline(events: &[ClinicalEvent]) -> String {
    events
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the temporal context for one patient from the record table.
pub fn patient_context(
    patient_id: i64,
    store: &NoteStore,
) -> Result<PatientContext, CarelineError> {
    let raw = store
        .notes_for(patient_id)
        .ok_or(CarelineError::NotFound { patient_id })?;

    let events = parse_notes(raw);
    Ok(PatientContext {
        patient_id,
        event_count: events.len(),
        temporal_context: render_timeline(&events),
    })
}
