use std::env;

use chrono::NaiveDate;
use tracing::warn;

/// Earliest bookable calendar date when BOOKING_CUTOFF_DATE is not set.
const DEFAULT_BOOKING_CUTOFF: (i32, u32, u32) = (2025, 1, 1);

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub ai_api_key: String,
    pub ai_base_url: String,
    pub ai_model: String,
    pub booking_cutoff: NaiveDate,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            ai_api_key: env::var("OPENAI_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("OPENAI_API_KEY not set, using empty value");
                    String::new()
                }),
            ai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| {
                    warn!("OPENAI_BASE_URL not set, using default");
                    "https://api.openai.com/v1".to_string()
                }),
            ai_model: env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| {
                    warn!("OPENAI_MODEL not set, using default");
                    "gpt-4o".to_string()
                }),
            booking_cutoff: env::var("BOOKING_CUTOFF_DATE")
                .ok()
                .and_then(|raw| {
                    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                        .map_err(|e| warn!("BOOKING_CUTOFF_DATE is not a valid date: {}", e))
                        .ok()
                })
                .unwrap_or_else(|| {
                    let (y, m, d) = DEFAULT_BOOKING_CUTOFF;
                    NaiveDate::from_ymd_opt(y, m, d).unwrap()
                }),
        };

        if !config.is_ai_configured() {
            warn!("AI suggestion service not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_ai_configured(&self) -> bool {
        !self.ai_api_key.is_empty() && !self.ai_base_url.is_empty()
    }
}
