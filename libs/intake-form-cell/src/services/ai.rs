use anyhow::{anyhow, Result};
use reqwest::{header, Client};
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;

use crate::catalog::EHR_FIELD_CATALOG;
use crate::models::{FieldKind, FormField, MappingKey, MappingSuggestion};
use crate::services::reconciler::SuggestionRequest;

pub struct IntakeAiClient {
    api_key: String,
    base_url: String,
    model: String,
    http_client: Client,
}

impl IntakeAiClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            api_key: config.ai_api_key.clone(),
            base_url: config.ai_base_url.trim_end_matches('/').to_string(),
            model: config.ai_model.clone(),
            http_client: Client::new(),
        }
    }

    /// Fetch EHR-mapping suggestions for the items of one settlement request
    /// in a single batched call. Callers treat failures as "no change".
    pub async fn suggest_mappings(
        &self,
        request: &SuggestionRequest,
    ) -> Result<Vec<MappingSuggestion>> {
        debug!(
            "Requesting mapping suggestions for {} items (generation {})",
            request.keys.len(),
            request.generation
        );

        let catalog_values: Vec<&str> = EHR_FIELD_CATALOG.iter().map(|e| e.value).collect();

        let prompt = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": "You map medical intake form fields to EHR record fields. Respond with a JSON array only. Each element has field_id, sub_field (omit for whole-field items), ehr_field, confidence between 0 and 1, and a short rationale."
                },
                {
                    "role": "user",
                    "content": format!(
                        "Known EHR fields: {}. Form fields: {}. Suggest one mapping for each of these items: {}",
                        catalog_values.join(", "),
                        serde_json::to_string(&request.fields)?,
                        serde_json::to_string(&request.keys)?
                    )
                }
            ],
            "temperature": 0.2
        });

        let content = self.chat_completion(prompt).await?;
        let entries: Vec<Value> = serde_json::from_str(strip_code_fences(&content))
            .map_err(|e| anyhow!("Invalid suggestion payload from AI service: {}", e))?;

        let mut suggestions = Vec::new();
        for entry in entries {
            match parse_suggestion(&entry) {
                Some(suggestion) => suggestions.push(suggestion),
                None => warn!("Skipping malformed suggestion entry: {}", entry),
            }
        }

        Ok(suggestions)
    }

    /// Generate intake fields from a free-text purpose description. This is
    /// the interactive builder action; errors surface to the user.
    pub async fn generate_fields(
        &self,
        description: &str,
        existing: &[FormField],
    ) -> Result<Vec<FormField>> {
        debug!(
            "Generating intake fields from description ({} chars, {} existing fields)",
            description.len(),
            existing.len()
        );

        let prompt = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": "You design medical intake forms. Respond with a JSON array only. Each element has type (one of the snake_case intake field kinds), label and required."
                },
                {
                    "role": "user",
                    "content": format!(
                        "Form purpose: {}. Existing fields: {}. Propose the additional fields this form needs.",
                        description,
                        serde_json::to_string(existing)?
                    )
                }
            ],
            "temperature": 0.5
        });

        let content = self.chat_completion(prompt).await?;
        let entries: Vec<Value> = serde_json::from_str(strip_code_fences(&content))
            .map_err(|e| anyhow!("Invalid field payload from AI service: {}", e))?;

        let mut fields = Vec::new();
        for entry in entries {
            match parse_generated_field(&entry) {
                Some(field) => fields.push(field),
                None => warn!("Skipping generated field with unknown shape: {}", entry),
            }
        }

        Ok(fields)
    }

    async fn chat_completion(&self, prompt: Value) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(header::CONTENT_TYPE, "application/json")
            .json(&prompt)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(anyhow!("AI service error: {}", error_text));
        }

        let ai_response: Value = response.json().await?;
        let content = ai_response["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| anyhow!("Invalid AI response format"))?;

        Ok(content.to_string())
    }
}

fn parse_suggestion(entry: &Value) -> Option<MappingSuggestion> {
    let field_id = entry["field_id"].as_str()?;
    let ehr_field = entry["ehr_field"].as_str()?;
    let sub_field = entry["sub_field"].as_str().map(|s| s.to_string());

    Some(MappingSuggestion {
        key: MappingKey {
            field_id: field_id.to_string(),
            sub_field,
        },
        ehr_field: ehr_field.to_string(),
        confidence: entry["confidence"].as_f64().unwrap_or(0.0) as f32,
        rationale: entry["rationale"].as_str().unwrap_or("").to_string(),
    })
}

fn parse_generated_field(entry: &Value) -> Option<FormField> {
    let label = entry["label"].as_str()?;

    // The kind tag plus any payload keys, without the FormField-level ones.
    let mut kind_value = entry.as_object()?.clone();
    kind_value.remove("label");
    kind_value.remove("required");
    kind_value.remove("id");
    let kind: FieldKind = serde_json::from_value(Value::Object(kind_value)).ok()?;

    let mut field = FormField::new(Uuid::new_v4().to_string(), kind);
    field.label = label.to_string();
    field.required = entry["required"].as_bool().unwrap_or(false);
    Some(field)
}

/// Models often wrap JSON answers in markdown fences; tolerate that.
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markdown_fences() {
        assert_eq!(strip_code_fences("[1, 2]"), "[1, 2]");
        assert_eq!(strip_code_fences("```json\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_code_fences("```\n[]\n```"), "[]");
    }

    #[test]
    fn parses_suggestion_with_and_without_sub_field() {
        let whole = json!({
            "field_id": "f1",
            "ehr_field": "patient.email",
            "confidence": 0.9,
            "rationale": "email input"
        });
        let parsed = parse_suggestion(&whole).unwrap();
        assert_eq!(parsed.key, MappingKey::field("f1"));
        assert_eq!(parsed.ehr_field, "patient.email");

        let sub = json!({
            "field_id": "f2",
            "sub_field": "heart_rate",
            "ehr_field": "vitals.heart_rate"
        });
        let parsed = parse_suggestion(&sub).unwrap();
        assert_eq!(parsed.key, MappingKey::sub("f2", "heart_rate"));
        assert_eq!(parsed.confidence, 0.0);
    }

    #[test]
    fn rejects_suggestion_missing_required_keys() {
        assert!(parse_suggestion(&json!({ "field_id": "f1" })).is_none());
        assert!(parse_suggestion(&json!({ "ehr_field": "patient.email" })).is_none());
    }

    #[test]
    fn parses_generated_field_and_assigns_fresh_id() {
        let entry = json!({ "type": "email", "label": "Work email", "required": true });
        let field = parse_generated_field(&entry).unwrap();
        assert_eq!(field.kind, FieldKind::Email);
        assert_eq!(field.label, "Work email");
        assert!(field.required);
        assert!(!field.id.is_empty());
    }

    #[test]
    fn rejects_generated_field_with_unknown_kind() {
        let entry = json!({ "type": "hologram", "label": "Nope" });
        assert!(parse_generated_field(&entry).is_none());
    }
}
