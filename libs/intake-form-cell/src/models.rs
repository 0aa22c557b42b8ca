use serde::{Deserialize, Serialize};

/// Composite key for one mappable item: a form field, optionally narrowed to
/// one of its sub-fields. At most one mapping exists per key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MappingKey {
    pub field_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_field: Option<String>,
}

impl MappingKey {
    pub fn field(field_id: impl Into<String>) -> Self {
        Self {
            field_id: field_id.into(),
            sub_field: None,
        }
    }

    pub fn sub(field_id: impl Into<String>, sub_field: impl Into<String>) -> Self {
        Self {
            field_id: field_id.into(),
            sub_field: Some(sub_field.into()),
        }
    }
}

/// A confirmed, user-owned association from a form field (or sub-field) to an
/// EHR record field path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EhrMapping {
    pub key: MappingKey,
    pub ehr_field: String,
}

/// A provisional mapping proposed by the AI collaborator. Never persisted;
/// always superseded or discarded once the user confirms or dismisses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingSuggestion {
    pub key: MappingKey,
    pub ehr_field: String,
    pub confidence: f32,
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalInfoConfig {
    pub first_name: bool,
    pub last_name: bool,
    pub date_of_birth: bool,
    pub gender: bool,
    pub address: bool,
    pub phone: bool,
    pub email: bool,
}

impl Default for PersonalInfoConfig {
    fn default() -> Self {
        Self {
            first_name: true,
            last_name: true,
            date_of_birth: true,
            gender: true,
            address: true,
            phone: true,
            email: true,
        }
    }
}

impl PersonalInfoConfig {
    pub fn enabled_keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        if self.first_name {
            keys.push("first_name");
        }
        if self.last_name {
            keys.push("last_name");
        }
        if self.date_of_birth {
            keys.push("date_of_birth");
        }
        if self.gender {
            keys.push("gender");
        }
        if self.address {
            keys.push("address");
        }
        if self.phone {
            keys.push("phone");
        }
        if self.email {
            keys.push("email");
        }
        keys
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthInsuranceConfig {
    pub provider: bool,
    pub member_id: bool,
    pub group_number: bool,
    pub plan_type: bool,
    pub policy_holder: bool,
}

impl Default for HealthInsuranceConfig {
    fn default() -> Self {
        Self {
            provider: true,
            member_id: true,
            group_number: true,
            plan_type: false,
            policy_holder: false,
        }
    }
}

impl HealthInsuranceConfig {
    pub fn enabled_keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        if self.provider {
            keys.push("provider");
        }
        if self.member_id {
            keys.push("member_id");
        }
        if self.group_number {
            keys.push("group_number");
        }
        if self.plan_type {
            keys.push("plan_type");
        }
        if self.policy_holder {
            keys.push("policy_holder");
        }
        keys
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MedicationHistoryConfig {
    pub medication_name: bool,
    pub dosage: bool,
    pub frequency: bool,
    pub start_date: bool,
    pub prescribing_doctor: bool,
}

impl Default for MedicationHistoryConfig {
    fn default() -> Self {
        Self {
            medication_name: true,
            dosage: true,
            frequency: true,
            start_date: false,
            prescribing_doctor: false,
        }
    }
}

impl MedicationHistoryConfig {
    pub fn enabled_keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        if self.medication_name {
            keys.push("medication_name");
        }
        if self.dosage {
            keys.push("dosage");
        }
        if self.frequency {
            keys.push("frequency");
        }
        if self.start_date {
            keys.push("start_date");
        }
        if self.prescribing_doctor {
            keys.push("prescribing_doctor");
        }
        keys
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VitalsConfig {
    pub height: bool,
    pub weight: bool,
    pub blood_pressure: bool,
    pub heart_rate: bool,
    pub temperature: bool,
}

impl Default for VitalsConfig {
    fn default() -> Self {
        Self {
            height: true,
            weight: true,
            blood_pressure: true,
            heart_rate: true,
            temperature: false,
        }
    }
}

impl VitalsConfig {
    pub fn enabled_keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        if self.height {
            keys.push("height");
        }
        if self.weight {
            keys.push("weight");
        }
        if self.blood_pressure {
            keys.push("blood_pressure");
        }
        if self.heart_rate {
            keys.push("heart_rate");
        }
        if self.temperature {
            keys.push("temperature");
        }
        keys
    }
}

/// Closed set of intake field kinds. Every per-kind operation below matches
/// exhaustively, so adding a kind forces each site to be updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    // Simple single-value inputs
    ShortText,
    LongText,
    Email,
    Phone,
    Number,
    Date,
    Time,
    YesNo,
    FileUpload,
    Dropdown {
        #[serde(default)]
        options: Vec<String>,
    },
    MultipleChoice {
        #[serde(default)]
        options: Vec<String>,
    },
    Checkboxes {
        #[serde(default)]
        options: Vec<String>,
    },
    // Composite kinds bundling togglable sub-fields
    PersonalInfo(PersonalInfoConfig),
    HealthInsurance(HealthInsuranceConfig),
    MedicationHistory(MedicationHistoryConfig),
    Vitals(VitalsConfig),
    // Structural and decorative kinds, never mappable
    SectionHeader,
    Notes,
    Image,
    Signature,
    RichText,
    PaymentDetails,
    CompanyHeader,
    UniversalAgreement,
}

impl FieldKind {
    pub fn default_label(&self) -> &'static str {
        match self {
            FieldKind::ShortText => "Short answer",
            FieldKind::LongText => "Long answer",
            FieldKind::Email => "Email address",
            FieldKind::Phone => "Phone number",
            FieldKind::Number => "Number",
            FieldKind::Date => "Date",
            FieldKind::Time => "Time",
            FieldKind::YesNo => "Yes / No",
            FieldKind::FileUpload => "File upload",
            FieldKind::Dropdown { .. } => "Dropdown",
            FieldKind::MultipleChoice { .. } => "Multiple choice",
            FieldKind::Checkboxes { .. } => "Checkboxes",
            FieldKind::PersonalInfo(_) => "Personal information",
            FieldKind::HealthInsurance(_) => "Health insurance",
            FieldKind::MedicationHistory(_) => "Medication history",
            FieldKind::Vitals(_) => "Vitals",
            FieldKind::SectionHeader => "Section",
            FieldKind::Notes => "Notes",
            FieldKind::Image => "Image",
            FieldKind::Signature => "Signature",
            FieldKind::RichText => "Rich text",
            FieldKind::PaymentDetails => "Payment details",
            FieldKind::CompanyHeader => "Company header",
            FieldKind::UniversalAgreement => "Agreement",
        }
    }

    /// The composite payload, if this kind carries one. Mapping re-analysis
    /// keys off the label and this payload only.
    pub fn composite_payload(&self) -> Option<&Self> {
        match self {
            kind @ (FieldKind::PersonalInfo(_)
            | FieldKind::HealthInsurance(_)
            | FieldKind::MedicationHistory(_)
            | FieldKind::Vitals(_)) => Some(kind),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FormField {
    pub fn new(id: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            id: id.into(),
            label: kind.default_label().to_string(),
            required: false,
            kind,
        }
    }

    /// Change the field's kind in place. A label the user never touched
    /// follows the new kind; an edited label is kept.
    pub fn change_kind(&mut self, kind: FieldKind) {
        if self.label == self.kind.default_label() {
            self.label = kind.default_label().to_string();
        }
        self.kind = kind;
    }

    /// The items of this field that can be mapped to EHR record fields.
    /// Composites yield one item per enabled sub-field, decorative kinds
    /// yield nothing, everything else yields the field itself.
    pub fn mappable_items(&self) -> Vec<MappingKey> {
        match &self.kind {
            FieldKind::PersonalInfo(config) => config
                .enabled_keys()
                .into_iter()
                .map(|sub| MappingKey::sub(&self.id, sub))
                .collect(),
            FieldKind::HealthInsurance(config) => config
                .enabled_keys()
                .into_iter()
                .map(|sub| MappingKey::sub(&self.id, sub))
                .collect(),
            FieldKind::MedicationHistory(config) => config
                .enabled_keys()
                .into_iter()
                .map(|sub| MappingKey::sub(&self.id, sub))
                .collect(),
            FieldKind::Vitals(config) => config
                .enabled_keys()
                .into_iter()
                .map(|sub| MappingKey::sub(&self.id, sub))
                .collect(),
            FieldKind::SectionHeader
            | FieldKind::Notes
            | FieldKind::Image
            | FieldKind::Signature
            | FieldKind::RichText
            | FieldKind::PaymentDetails
            | FieldKind::CompanyHeader
            | FieldKind::UniversalAgreement => Vec::new(),
            FieldKind::ShortText
            | FieldKind::LongText
            | FieldKind::Email
            | FieldKind::Phone
            | FieldKind::Number
            | FieldKind::Date
            | FieldKind::Time
            | FieldKind::YesNo
            | FieldKind::FileUpload
            | FieldKind::Dropdown { .. }
            | FieldKind::MultipleChoice { .. }
            | FieldKind::Checkboxes { .. } => vec![MappingKey::field(&self.id)],
        }
    }
}
