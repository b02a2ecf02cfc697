//! Literature-search heuristics over a patient's temporal context.
//!
//! These helpers only build queries and format citations; fetching from
//! PubMed or ClinicalTrials.gov is left to the caller.

use std::fmt;

use serde::{Deserialize, Serialize};

const CONTEXT_HEADING: &str = "**2. Clinical Literature Context**";

/// Appended to every literature query to keep off-topic studies out.
pub const EXCLUSION_TERMS: &str = "NOT survey NOT preference NOT perception NOT qualitative NOT elbow NOT orthopedic NOT fracture";

/// Longest abstract excerpt kept in a citation, in characters.
pub const FINDING_SUMMARY_CHARS: usize = 350;

const EVIDENCE_KEYWORDS: [(&str, &str); 5] = [
    ("adt", "ADT prostate cancer"),
    ("psa", "PSA progression prostate cancer"),
    ("pirads", "PIRADS scoring prostate cancer"),
    ("bone pain", "bone metastases prostate cancer"),
    ("weight", "weight change prostate cancer"),
];

const GENERIC_PHRASES: [&str; 3] = [
    "most common cancer in men",
    "prostate cancer is the most commonly diagnosed",
    "prostate cancer is a leading cause",
];

const TRAJECTORY_TERMS: [&str; 6] = [
    "psa",
    "weight",
    "pirads",
    "response to therapy",
    "adt",
    "treatment outcome",
];

/// Search terms for PubMed and ClinicalTrials.gov.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvidenceQueries {
    pub pubmed: Vec<String>,
    pub trials: Vec<String>,
}

/// Pick one query per clinical keyword present in the context.
pub fn evidence_queries(context: &str) -> EvidenceQueries {
    let lower = context.to_lowercase();
    let selected: Vec<String> = EVIDENCE_KEYWORDS
        .iter()
        .filter(|(keyword, _)| lower.contains(keyword))
        .map(|(_, query)| query.to_string())
        .collect();

    if selected.is_empty() {
        return EvidenceQueries {
            pubmed: vec!["prostate cancer progression".to_string()],
            trials: vec!["prostate cancer treatment outcomes".to_string()],
        };
    }

    EvidenceQueries {
        pubmed: selected.clone(),
        trials: selected,
    }
}

/// Direction of the PSA values mentioned in the context.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PsaTrend {
    SteadilyDeclining,
    Rising,
    StableOrFluctuating,
}

impl PsaTrend {
    pub fn description(self) -> &'static str {
        match self {
            PsaTrend::SteadilyDeclining => "PSA steadily declining",
            PsaTrend::Rising => "PSA rising",
            PsaTrend::StableOrFluctuating => "PSA stable or fluctuating",
        }
    }
}

impl fmt::Display for PsaTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// PSA values written as `PSA=<value> ng/mL`, one per line at most.
pub fn psa_values(context: &str) -> Vec<f64> {
    context
        .lines()
        .filter_map(|line| {
            let lower = line.to_lowercase();
            let after = lower.split("psa=").nth(1)?;
            let value = after.split("ng/ml").next()?;
            value.trim().parse::<f64>().ok()
        })
        .collect()
}

/// Classify the PSA trajectory. A flat series counts as declining.
pub fn psa_trend(context: &str) -> PsaTrend {
    let values = psa_values(context);
    if values.len() < 2 {
        return PsaTrend::StableOrFluctuating;
    }

    if values.windows(2).all(|pair| pair[0] >= pair[1]) {
        PsaTrend::SteadilyDeclining
    } else if values.windows(2).any(|pair| pair[1] > pair[0]) {
        PsaTrend::Rising
    } else {
        // Only reachable with NaN values, which compare false both ways.
        PsaTrend::StableOrFluctuating
    }
}

/// Build a single boolean PubMed query explaining the patient's trends.
pub fn literature_query(context: &str) -> String {
    let lower = context.to_lowercase();
    let mut terms: Vec<&str> = Vec::new();

    if lower.contains("adt") {
        terms.push("ADT prostate cancer");
    }
    if lower.contains("psa") {
        terms.push("PSA trajectory");
    }
    if lower.contains("weight") || lower.contains("kg") {
        terms.push("weight change prostate cancer");
    }
    if lower.contains("pirads") {
        terms.push("PIRADS progression");
    }
    if lower.contains("bone pain") {
        terms.push("bone pain prognosis");
    }

    let trend = psa_trend(context).description();
    if !terms.contains(&trend) {
        terms.push(trend);
    }

    format!("({}) {EXCLUSION_TERMS}", terms.join(" OR "))
}

/// Citation fields of the top PubMed hit.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StudyMetadata {
    pub study_title: String,
    pub author: String,
    pub year: String,
    pub url: String,
    pub finding_summary: String,
}

/// Shorten an abstract to the excerpt quoted in a citation.
pub fn summarize_finding(abstract_text: &str) -> String {
    let excerpt: String = abstract_text.chars().take(FINDING_SUMMARY_CHARS).collect();
    format!("{}...", excerpt.trim())
}

/// Outcome of turning a study into a citation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Citation {
    NoStudy,
    MissingMetadata,
    Cited(String),
}

impl fmt::Display for Citation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Citation::NoStudy => write!(
                f,
                "{CONTEXT_HEADING} — No relevant PubMed study found for this patient."
            ),
            Citation::MissingMetadata => write!(
                f,
                "{CONTEXT_HEADING} — A relevant study was found but could not be cited due to missing metadata."
            ),
            Citation::Cited(text) => f.write_str(text),
        }
    }
}

/// Generic epidemiology abstracts say nothing about a patient's trajectory.
pub fn is_generic_abstract(summary: &str) -> bool {
    let lower = summary.to_lowercase();
    let is_generic = GENERIC_PHRASES.iter().any(|phrase| lower.contains(phrase));
    let has_trend_info = TRAJECTORY_TERMS.iter().any(|term| lower.contains(term));
    is_generic && !has_trend_info
}

pub fn cite_study(study: Option<&StudyMetadata>) -> Citation {
    let Some(study) = study else {
        return Citation::NoStudy;
    };

    if is_generic_abstract(&study.finding_summary) {
        return Citation::NoStudy;
    }

    let all_unknown = [&study.study_title, &study.author, &study.year]
        .iter()
        .all(|field| matches!(field.to_lowercase().as_str(), "unknown" | "n.d."));
    if !study.url.starts_with("http") || all_unknown {
        return Citation::MissingMetadata;
    }

    Citation::Cited(format!(
        "{CONTEXT_HEADING} — According to [{}, {}]({}), {} (from *{}*).",
        or_fallback(&study.author, "Unknown"),
        or_fallback(&study.year, "n.d."),
        study.url,
        study.finding_summary,
        or_fallback(&study.study_title, "Untitled"),
    ))
}

fn or_fallback<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}
