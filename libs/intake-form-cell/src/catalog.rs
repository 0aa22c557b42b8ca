use serde::Serialize;

/// One selectable EHR record field. The catalog is externally defined and
/// static; it feeds mapping choice lists in the builder UI.
#[derive(Debug, Clone, Serialize)]
pub struct EhrCatalogEntry {
    pub category: &'static str,
    pub label: &'static str,
    pub value: &'static str,
}

const fn entry(category: &'static str, label: &'static str, value: &'static str) -> EhrCatalogEntry {
    EhrCatalogEntry {
        category,
        label,
        value,
    }
}

pub const EHR_FIELD_CATALOG: &[EhrCatalogEntry] = &[
    // Demographics
    entry("Demographics", "First name", "patient.first_name"),
    entry("Demographics", "Last name", "patient.last_name"),
    entry("Demographics", "Date of birth", "patient.date_of_birth"),
    entry("Demographics", "Gender", "patient.gender"),
    entry("Demographics", "Address", "patient.address_line"),
    entry("Demographics", "Phone number", "patient.phone"),
    entry("Demographics", "Email address", "patient.email"),
    entry("Demographics", "Preferred language", "patient.preferred_language"),
    entry("Demographics", "Emergency contact", "patient.emergency_contact"),
    // Insurance
    entry("Insurance", "Insurance provider", "coverage.provider"),
    entry("Insurance", "Member ID", "coverage.member_id"),
    entry("Insurance", "Group number", "coverage.group_number"),
    entry("Insurance", "Plan type", "coverage.plan_type"),
    entry("Insurance", "Policy holder", "coverage.policy_holder"),
    // Medications
    entry("Medications", "Medication name", "medication.name"),
    entry("Medications", "Dosage", "medication.dosage"),
    entry("Medications", "Frequency", "medication.frequency"),
    entry("Medications", "Start date", "medication.start_date"),
    entry("Medications", "Prescribing doctor", "medication.prescriber"),
    // Vitals
    entry("Vitals", "Height", "vitals.height"),
    entry("Vitals", "Weight", "vitals.weight"),
    entry("Vitals", "Blood pressure", "vitals.blood_pressure"),
    entry("Vitals", "Heart rate", "vitals.heart_rate"),
    entry("Vitals", "Temperature", "vitals.temperature"),
    // Clinical
    entry("Clinical", "Chief complaint", "condition.primary_complaint"),
    entry("Clinical", "Allergies", "allergy.description"),
    entry("Clinical", "Smoking status", "social_history.smoking_status"),
    entry("Clinical", "Family history", "family_history.summary"),
    entry("Clinical", "Clinical note", "observation.note"),
];

/// Whether a value is one of the known catalog fields. Suggested mappings are
/// currently accepted without this check; it is offered for callers that want
/// to validate before confirming.
pub fn is_known_ehr_field(value: &str) -> bool {
    EHR_FIELD_CATALOG.iter().any(|entry| entry.value == value)
}
