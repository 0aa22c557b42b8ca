// libs/intake-form-cell/tests/reconciler_test.rs
//
// Settlement, dismissal, deletion and in-flight race behavior of the field
// mapping reconciler. Settlement is an explicit call here, never a timer.

use assert_matches::assert_matches;

use intake_form_cell::models::{
    FieldKind, FormField, MappingKey, MappingSuggestion, VitalsConfig,
};
use intake_form_cell::services::reconciler::FieldMappingReconciler;

fn simple(id: &str, label: &str) -> FormField {
    let mut field = FormField::new(id, FieldKind::ShortText);
    field.label = label.to_string();
    field
}

fn vitals(id: &str, config: VitalsConfig) -> FormField {
    FormField::new(id, FieldKind::Vitals(config))
}

fn suggestion(key: MappingKey, ehr_field: &str) -> MappingSuggestion {
    MappingSuggestion {
        key,
        ehr_field: ehr_field.to_string(),
        confidence: 0.8,
        rationale: "looks right".to_string(),
    }
}

#[test]
fn new_fields_produce_one_batched_request() {
    let mut reconciler = FieldMappingReconciler::new();
    let fields = vec![simple("f1", "First name"), simple("f2", "Allergies")];

    let request = reconciler.settle(&fields).expect("new fields need analysis");
    assert_eq!(request.generation, 1);
    assert_eq!(
        request.keys,
        vec![MappingKey::field("f1"), MappingKey::field("f2")]
    );
    assert_eq!(request.fields.len(), 2);
    assert_eq!(reconciler.in_flight_keys().len(), 2);

    // An unchanged snapshot settles quietly.
    assert_matches!(reconciler.settle(&fields), None);
}

#[test]
fn decorative_fields_never_trigger_requests() {
    let mut reconciler = FieldMappingReconciler::new();
    let fields = vec![
        FormField::new("s1", FieldKind::SectionHeader),
        FormField::new("s2", FieldKind::RichText),
        FormField::new("s3", FieldKind::Signature),
    ];

    assert_matches!(reconciler.settle(&fields), None);
    assert!(reconciler.in_flight_keys().is_empty());
}

#[test]
fn composite_fields_request_their_enabled_sub_items() {
    let mut reconciler = FieldMappingReconciler::new();
    let fields = vec![vitals(
        "v1",
        VitalsConfig {
            height: true,
            weight: true,
            blood_pressure: false,
            heart_rate: false,
            temperature: false,
        },
    )];

    let request = reconciler.settle(&fields).unwrap();
    assert_eq!(
        request.keys,
        vec![MappingKey::sub("v1", "height"), MappingKey::sub("v1", "weight")]
    );
}

#[test]
fn confirming_during_flight_blocks_the_late_response() {
    let mut reconciler = FieldMappingReconciler::new();
    let fields = vec![simple("f1", "Email")];
    let request = reconciler.settle(&fields).unwrap();
    let key = MappingKey::field("f1");

    // User confirms manually while the batched request is still out.
    reconciler.set_mapping(key.clone(), "patient.email");

    reconciler.absorb(&request, vec![suggestion(key.clone(), "patient.phone")]);

    assert!(reconciler.suggestions().is_empty());
    assert_eq!(
        reconciler.confirmed_for(&key).map(|m| m.ehr_field.as_str()),
        Some("patient.email")
    );
    assert!(reconciler.in_flight_keys().is_empty());
}

#[test]
fn accepting_a_suggestion_promotes_it_to_confirmed() {
    let mut reconciler = FieldMappingReconciler::new();
    let fields = vec![simple("f1", "Email")];
    let request = reconciler.settle(&fields).unwrap();
    let key = MappingKey::field("f1");

    reconciler.absorb(&request, vec![suggestion(key.clone(), "patient.email")]);
    assert_eq!(reconciler.suggestions().len(), 1);

    assert!(reconciler.accept_suggestion(&key));
    assert!(reconciler.suggestions().is_empty());
    assert_eq!(
        reconciler.confirmed_for(&key).map(|m| m.ehr_field.as_str()),
        Some("patient.email")
    );

    // Accepting again has nothing to promote.
    assert!(!reconciler.accept_suggestion(&key));
}

#[test]
fn dismissal_suppresses_regeneration_until_content_changes() {
    let mut reconciler = FieldMappingReconciler::new();
    let fields = vec![simple("f1", "Email")];
    let request = reconciler.settle(&fields).unwrap();
    let key = MappingKey::field("f1");

    reconciler.absorb(&request, vec![suggestion(key.clone(), "patient.email")]);
    assert!(reconciler.dismiss_suggestion(&key));
    assert!(reconciler.is_dismissed(&key));

    // Unrelated new fields must not re-open the dismissed key.
    let with_new = vec![simple("f1", "Email"), simple("f2", "Phone")];
    let request = reconciler.settle(&with_new).unwrap();
    assert_eq!(request.keys, vec![MappingKey::field("f2")]);

    // Changing the dismissed field's label re-opens it.
    let relabeled = vec![simple("f1", "Work email"), simple("f2", "Phone")];
    let request = reconciler.settle(&relabeled).unwrap();
    assert!(request.keys.contains(&MappingKey::field("f1")));
    assert!(!reconciler.is_dismissed(&key));
}

#[test]
fn toggling_a_composite_sub_field_reopens_its_dismissals() {
    let mut reconciler = FieldMappingReconciler::new();
    let narrow = VitalsConfig {
        height: false,
        weight: false,
        blood_pressure: false,
        heart_rate: true,
        temperature: false,
    };
    let fields = vec![vitals("v1", narrow.clone())];
    let request = reconciler.settle(&fields).unwrap();

    let heart_rate = MappingKey::sub("v1", "heart_rate");
    reconciler.absorb(&request, vec![suggestion(heart_rate.clone(), "vitals.heart_rate")]);
    reconciler.dismiss_suggestion(&heart_rate);

    // Enabling another sub-field changes the mappable content.
    let wider = VitalsConfig {
        temperature: true,
        ..narrow
    };
    let request = reconciler.settle(&[vitals("v1", wider)]).unwrap();
    assert!(request.keys.contains(&heart_rate));
    assert!(request.keys.contains(&MappingKey::sub("v1", "temperature")));
    assert!(!reconciler.is_dismissed(&heart_rate));
}

#[test]
fn deleting_a_field_cascades_to_all_of_its_state() {
    let mut reconciler = FieldMappingReconciler::new();
    let fields = vec![simple("f1", "Email"), simple("f2", "Phone")];
    let request = reconciler.settle(&fields).unwrap();

    reconciler.absorb(
        &request,
        vec![
            suggestion(MappingKey::field("f1"), "patient.email"),
            suggestion(MappingKey::field("f2"), "patient.phone"),
        ],
    );
    reconciler.set_mapping(MappingKey::field("f2"), "patient.phone");

    // f2 is removed from the form.
    assert_matches!(reconciler.settle(&[simple("f1", "Email")]), None);

    assert!(reconciler.confirmed_for(&MappingKey::field("f2")).is_none());
    assert!(reconciler
        .suggestions()
        .iter()
        .all(|s| s.key.field_id != "f2"));
}

#[test]
fn deletion_mid_flight_excludes_the_field_from_the_merge() {
    let mut reconciler = FieldMappingReconciler::new();
    let fields = vec![simple("f1", "Email"), simple("f2", "Phone")];
    let request = reconciler.settle(&fields).unwrap();

    // f2 disappears before the response lands.
    assert_matches!(reconciler.settle(&[simple("f1", "Email")]), None);

    reconciler.absorb(
        &request,
        vec![
            suggestion(MappingKey::field("f1"), "patient.email"),
            suggestion(MappingKey::field("f2"), "patient.phone"),
        ],
    );

    let suggested_ids: Vec<&str> = reconciler
        .suggestions()
        .iter()
        .map(|s| s.key.field_id.as_str())
        .collect();
    assert_eq!(suggested_ids, vec!["f1"]);
    assert!(reconciler.in_flight_keys().is_empty());
}

#[test]
fn unsolicited_suggestions_for_unknown_fields_are_dropped() {
    let mut reconciler = FieldMappingReconciler::new();
    let fields = vec![simple("f1", "Email")];
    let request = reconciler.settle(&fields).unwrap();

    reconciler.absorb(
        &request,
        vec![suggestion(MappingKey::field("ghost"), "patient.email")],
    );
    assert!(reconciler.suggestions().is_empty());
}

#[test]
fn set_mapping_round_trips() {
    let mut reconciler = FieldMappingReconciler::new();
    let key = MappingKey::sub("p1", "first_name");

    reconciler.set_mapping(key.clone(), "patient.first_name");
    reconciler.set_mapping(key.clone(), "patient.first_name");
    let confirmed = reconciler.confirmed_mappings();
    assert_eq!(confirmed.len(), 1);
    assert_eq!(confirmed[0].ehr_field, "patient.first_name");

    reconciler.set_mapping(key.clone(), "");
    assert!(reconciler.confirmed_for(&key).is_none());
    assert!(reconciler.confirmed_mappings().is_empty());
}

#[test]
fn failed_fetch_clears_in_flight_without_inventing_state() {
    let mut reconciler = FieldMappingReconciler::new();
    let fields = vec![simple("f1", "Email")];
    let request = reconciler.settle(&fields).unwrap();
    assert_eq!(reconciler.in_flight_keys().len(), 1);

    reconciler.abandon(&request);
    assert!(reconciler.in_flight_keys().is_empty());
    assert!(reconciler.suggestions().is_empty());

    // The quiet snapshot stays quiet; a later edit naturally retries.
    assert_matches!(reconciler.settle(&fields), None);
    let request = reconciler.settle(&[simple("f1", "Contact email")]).unwrap();
    assert_eq!(request.keys, vec![MappingKey::field("f1")]);
}

#[test]
fn overlapping_requests_do_not_clobber_the_first_arrival() {
    let mut reconciler = FieldMappingReconciler::new();
    let key = MappingKey::field("f1");

    let first = reconciler.settle(&[simple("f1", "Email")]).unwrap();
    // A label edit before the first response triggers a second request.
    let second = reconciler.settle(&[simple("f1", "Work email")]).unwrap();
    assert!(second.generation > first.generation);

    reconciler.absorb(&first, vec![suggestion(key.clone(), "patient.email")]);
    reconciler.absorb(&second, vec![suggestion(key.clone(), "patient.phone")]);

    let suggestions = reconciler.suggestions();
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].ehr_field, "patient.email");
    assert!(reconciler.in_flight_keys().is_empty());
}

#[test]
fn option_edits_on_simple_fields_do_not_reanalyze() {
    let mut reconciler = FieldMappingReconciler::new();
    let before = FormField {
        id: "d1".to_string(),
        label: "Reason for visit".to_string(),
        required: false,
        kind: FieldKind::Dropdown {
            options: vec!["Checkup".to_string()],
        },
    };
    let request = reconciler.settle(&[before.clone()]).unwrap();
    reconciler.absorb(&request, vec![]);

    let mut after = before;
    after.kind = FieldKind::Dropdown {
        options: vec!["Checkup".to_string(), "Follow-up".to_string()],
    };
    assert_matches!(reconciler.settle(&[after]), None);
}
