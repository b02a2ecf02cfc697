//! Visit history to feature vector reduction.

use careline_core::{
    CarelineError, FeatureVector, LifespanPredictor, PatientVisitRecord, TreatmentKind,
};

use crate::store::VisitStore;

/// Reduce a patient's visit history to the fixed 11-feature vector.
///
/// Fails with [`CarelineError::NotFound`] when the store has no visit for the
/// patient.
pub fn extract_features(
    patient_id: i64,
    store: &VisitStore,
) -> Result<FeatureVector, CarelineError> {
    let mut visits: Vec<&PatientVisitRecord> = store.records_for(patient_id).collect();
    if visits.is_empty() {
        return Err(CarelineError::NotFound { patient_id });
    }

    // Stable: visits on the same day keep table order.
    visits.sort_by_key(|visit| visit.visit_date);

    let psa: Vec<f64> = visits.iter().filter_map(|visit| visit.psa).collect();
    let weight: Vec<f64> = visits.iter().filter_map(|visit| visit.weight).collect();
    let pirads: Vec<f64> = visits.iter().filter_map(|visit| visit.pirads).collect();
    let treatments: Vec<&str> = visits
        .iter()
        .filter_map(|visit| visit.treatment.as_deref())
        .collect();

    let features = FeatureVector {
        psa_initial: first_or_zero(&psa),
        psa_latest: last_or_zero(&psa),
        psa_change: change_or_zero(&psa),
        max_pirads: max_or_zero(&pirads),
        weight_initial: first_or_zero(&weight),
        weight_latest: last_or_zero(&weight),
        weight_change: change_or_zero(&weight),
        max_bone_pain_score: 0.0,
        has_surgery: treatment_flag(&treatments, TreatmentKind::Surgery),
        has_radiation: treatment_flag(&treatments, TreatmentKind::Radiation),
        has_adt: treatment_flag(&treatments, TreatmentKind::Adt),
    };

    tracing::debug!(
        patient_id,
        visits = visits.len(),
        psa_points = psa.len(),
        weight_points = weight.len(),
        "extracted feature vector"
    );

    Ok(features)
}

/// Extract features for the patient and run them through the predictor.
pub fn predict_lifespan<P>(
    patient_id: i64,
    store: &VisitStore,
    predictor: &P,
) -> Result<f64, CarelineError>
where
    P: LifespanPredictor + ?Sized,
{
    let features = extract_features(patient_id, store)?;
    predictor.predict(&features)
}

fn first_or_zero(values: &[f64]) -> f64 {
    values.first().copied().unwrap_or(0.0)
}

fn last_or_zero(values: &[f64]) -> f64 {
    values.last().copied().unwrap_or(0.0)
}

fn change_or_zero(values: &[f64]) -> f64 {
    match values {
        [first, .., last] => last - first,
        _ => 0.0,
    }
}

fn max_or_zero(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::max).unwrap_or(0.0)
}

fn treatment_flag(treatments: &[&str], kind: TreatmentKind) -> f64 {
    if treatments.iter().any(|treatment| kind.matches(treatment)) {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_needs_two_points() {
        assert_eq!(change_or_zero(&[]), 0.0);
        assert_eq!(change_or_zero(&[7.5]), 0.0);
        assert_eq!(change_or_zero(&[2.0, 9.0, 3.0]), 1.0);
    }

    #[test]
    fn max_of_empty_is_zero() {
        assert_eq!(max_or_zero(&[]), 0.0);
        assert_eq!(max_or_zero(&[3.0, 5.0, 4.0]), 5.0);
    }

    #[test]
    fn flags_are_zero_or_one() {
        assert_eq!(treatment_flag(&["Salvage surgery"], TreatmentKind::Surgery), 1.0);
        assert_eq!(treatment_flag(&["Observation"], TreatmentKind::Adt), 0.0);
        assert_eq!(treatment_flag(&[], TreatmentKind::Radiation), 0.0);
    }
}
