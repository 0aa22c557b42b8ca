use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use tracing::debug;

use crate::models::{EhrMapping, FormField, MappingKey, MappingSuggestion};

/// One batched suggestion request produced by a settlement pass. Carries a
/// monotonically increasing generation stamp so overlapping responses can be
/// told apart in logs and tests.
#[derive(Debug, Clone, Serialize)]
pub struct SuggestionRequest {
    pub generation: u64,
    pub fields: Vec<FormField>,
    pub keys: Vec<MappingKey>,
}

/// State machine reconciling form-field snapshots against EHR mapping state.
///
/// Owned by one logical form session and mutated only through settlement
/// events and explicit user actions. Superseded requests are never cancelled;
/// `absorb` re-checks every key at merge time instead.
#[derive(Debug, Default)]
pub struct FieldMappingReconciler {
    previous_fields: Vec<FormField>,
    confirmed: BTreeMap<MappingKey, EhrMapping>,
    suggested: BTreeMap<MappingKey, MappingSuggestion>,
    dismissed: BTreeSet<MappingKey>,
    in_flight: BTreeSet<MappingKey>,
    generation: u64,
}

impl FieldMappingReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// One settlement pass over a stable field snapshot. Returns the batched
    /// suggestion request to send, if any marked field still has items that
    /// are neither confirmed, dismissed, nor already suggested.
    pub fn settle(&mut self, fields: &[FormField]) -> Option<SuggestionRequest> {
        let live_ids: BTreeSet<&str> = fields.iter().map(|f| f.id.as_str()).collect();

        // Orphan collection runs every pass, not only when something changed.
        self.confirmed.retain(|key, _| live_ids.contains(key.field_id.as_str()));
        self.suggested.retain(|key, _| live_ids.contains(key.field_id.as_str()));
        self.in_flight.retain(|key| live_ids.contains(key.field_id.as_str()));

        let prev_by_id: HashMap<&str, &FormField> = self
            .previous_fields
            .iter()
            .map(|f| (f.id.as_str(), f))
            .collect();

        let mut marked: Vec<FormField> = Vec::new();
        for field in fields {
            match prev_by_id.get(field.id.as_str()) {
                None => marked.push(field.clone()),
                Some(prev) if needs_reanalysis(prev, field) => {
                    // The user changed what is mappable; dismissals for the
                    // field's current items no longer apply.
                    for key in field.mappable_items() {
                        self.dismissed.remove(&key);
                    }
                    marked.push(field.clone());
                }
                Some(_) => {}
            }
        }

        self.previous_fields = fields.to_vec();

        let mut keys = Vec::new();
        let mut request_fields = Vec::new();
        for field in marked {
            let items: Vec<MappingKey> = field
                .mappable_items()
                .into_iter()
                .filter(|key| {
                    !self.confirmed.contains_key(key)
                        && !self.dismissed.contains(key)
                        && !self.suggested.contains_key(key)
                })
                .collect();
            if !items.is_empty() {
                keys.extend(items);
                request_fields.push(field);
            }
        }

        if keys.is_empty() {
            return None;
        }

        self.generation += 1;
        self.in_flight.extend(keys.iter().cloned());
        debug!(
            "Settlement pass {} requests suggestions for {} items across {} fields",
            self.generation,
            keys.len(),
            request_fields.len()
        );

        Some(SuggestionRequest {
            generation: self.generation,
            fields: request_fields,
            keys,
        })
    }

    /// Merge an asynchronous suggestion batch. State may have moved on while
    /// the request was in flight, so every key is re-checked here; a late
    /// response never resurrects a key the user meanwhile confirmed,
    /// dismissed, or whose field was deleted.
    pub fn absorb(&mut self, request: &SuggestionRequest, suggestions: Vec<MappingSuggestion>) {
        let live_ids: BTreeSet<&str> = self
            .previous_fields
            .iter()
            .map(|f| f.id.as_str())
            .collect();

        for suggestion in suggestions {
            if self.confirmed.contains_key(&suggestion.key)
                || self.dismissed.contains(&suggestion.key)
                || self.suggested.contains_key(&suggestion.key)
            {
                debug!(
                    "Dropping stale suggestion for {:?} (generation {})",
                    suggestion.key, request.generation
                );
                continue;
            }
            if !live_ids.contains(suggestion.key.field_id.as_str()) {
                continue;
            }
            self.suggested.insert(suggestion.key.clone(), suggestion);
        }

        // Second pass guarding against fields deleted mid-flight.
        self.suggested.retain(|key, _| live_ids.contains(key.field_id.as_str()));

        self.abandon(request);
    }

    /// Clear the in-flight markers of a request, whether it failed or was
    /// already absorbed.
    pub fn abandon(&mut self, request: &SuggestionRequest) {
        for key in &request.keys {
            self.in_flight.remove(key);
        }
    }

    /// Manual mapping override. An empty EHR field deletes the confirmed
    /// entry; anything else replaces-or-inserts and wins over any live
    /// suggestion for the same key.
    pub fn set_mapping(&mut self, key: MappingKey, ehr_field: &str) {
        if ehr_field.is_empty() {
            self.confirmed.remove(&key);
            return;
        }
        self.suggested.remove(&key);
        self.confirmed.insert(
            key.clone(),
            EhrMapping {
                key,
                ehr_field: ehr_field.to_string(),
            },
        );
    }

    /// Promote a live suggestion to a confirmed mapping. Returns false when no
    /// suggestion exists for the key.
    pub fn accept_suggestion(&mut self, key: &MappingKey) -> bool {
        match self.suggested.remove(key) {
            Some(suggestion) => {
                self.confirmed.insert(
                    key.clone(),
                    EhrMapping {
                        key: key.clone(),
                        ehr_field: suggestion.ehr_field,
                    },
                );
                true
            }
            None => false,
        }
    }

    /// Reject a suggestion. The key stays suppressed until the owning field's
    /// mappable content changes.
    pub fn dismiss_suggestion(&mut self, key: &MappingKey) -> bool {
        let removed = self.suggested.remove(key).is_some();
        self.dismissed.insert(key.clone());
        removed
    }

    pub fn confirmed_mappings(&self) -> Vec<&EhrMapping> {
        self.confirmed.values().collect()
    }

    pub fn confirmed_for(&self, key: &MappingKey) -> Option<&EhrMapping> {
        self.confirmed.get(key)
    }

    pub fn suggestions(&self) -> Vec<&MappingSuggestion> {
        self.suggested.values().collect()
    }

    pub fn in_flight_keys(&self) -> Vec<&MappingKey> {
        self.in_flight.iter().collect()
    }

    pub fn is_dismissed(&self, key: &MappingKey) -> bool {
        self.dismissed.contains(key)
    }
}

/// A field needs re-analysis when its label or any of the four composite
/// payloads changed by value. Other payload edits (e.g. dropdown options) do
/// not alter what is mappable.
fn needs_reanalysis(prev: &FormField, current: &FormField) -> bool {
    prev.label != current.label
        || prev.kind.composite_payload() != current.kind.composite_payload()
}
