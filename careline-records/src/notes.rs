//! Free-text clinical note parsing.

use careline_core::{parse_date, ClinicalEvent, EntryOutcome, SkipReason};

/// Separates entries inside a clinical notes field.
pub const NOTE_DELIMITER: char = '|';

/// Separates the date from the note text inside one entry.
pub const NOTE_SEPARATOR: &str = ": ";

/// Parse a notes field into dated events, dropping malformed entries.
///
/// Never fails: an empty or fully malformed field yields an empty list.
pub fn parse_notes(raw: &str) -> Vec<ClinicalEvent> {
    parse_note_entries(raw)
        .into_iter()
        .filter_map(|outcome| {
            if let EntryOutcome::Skipped { entry, reason } = &outcome {
                tracing::debug!(entry = %entry, reason = %reason, "skipping clinical note entry");
            }
            outcome.into_event()
        })
        .collect()
}

/// Parse every entry of a notes field, keeping the skipped ones tagged.
pub fn parse_note_entries(raw: &str) -> Vec<EntryOutcome> {
    raw.split(NOTE_DELIMITER).map(parse_entry).collect()
}

/// Parse a single `YYYY-MM-DD: text` entry.
pub fn parse_entry(entry: &str) -> EntryOutcome {
    let Some((date_str, content)) = entry.split_once(NOTE_SEPARATOR) else {
        return EntryOutcome::Skipped {
            entry: entry.trim().to_string(),
            reason: SkipReason::MissingSeparator,
        };
    };

    let date_str = date_str.trim();
    match parse_date(date_str) {
        Some(date) => EntryOutcome::Event(ClinicalEvent {
            date,
            note: content.trim().to_string(),
        }),
        None => EntryOutcome::Skipped {
            entry: entry.trim().to_string(),
            reason: SkipReason::InvalidDate(date_str.to_string()),
        },
    }
}
