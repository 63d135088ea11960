//! Narrative attendance report from a generative text model.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::model::attendance::AttendanceRecord;

/// Returned whenever the model cannot produce a report.
pub const REPORT_FALLBACK: &str = "Sorry, an error occurred while generating the smart report.";

const REPORT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateResponse {
    fn text(&self) -> String {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
            .filter_map(|p| p.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }
}

pub struct ReportGenerator {
    http_client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    language: String,
}

impl ReportGenerator {
    pub fn new(
        api_key: Option<String>,
        model: String,
        base_url: String,
        language: String,
    ) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            http_client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            language,
        })
    }

    pub fn prompt(&self, records: &[AttendanceRecord]) -> String {
        let data = serde_json::to_string(records).unwrap_or_else(|_| "[]".to_string());
        format!(
            "Analyze the following attendance data and write a professional report in {lang} covering:\n\
             1. An overall attendance summary.\n\
             2. The most punctual employees.\n\
             3. Employees with repeated lateness.\n\
             4. Recommendations to improve productivity based on working hours.\n\n\
             Data: {data}",
            lang = self.language,
        )
    }

    /// Never fails; every error is logged and replaced by [`REPORT_FALLBACK`].
    pub async fn generate(&self, records: &[AttendanceRecord]) -> String {
        match self.request(records).await {
            Ok(text) if !text.trim().is_empty() => {
                info!(records = records.len(), "Attendance report generated");
                text
            }
            Ok(_) => {
                error!("Report model returned no text");
                REPORT_FALLBACK.to_string()
            }
            Err(e) => {
                error!(error = %e, "Error generating report");
                REPORT_FALLBACK.to_string()
            }
        }
    }

    async fn request(&self, records: &[AttendanceRecord]) -> anyhow::Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("GEMINI_API_KEY is not set"))?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": self.prompt(records) }] }],
            "generationConfig": { "temperature": REPORT_TEMPERATURE }
        });

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("model endpoint returned HTTP {}: {}", status.as_u16(), text);
        }

        let parsed: GenerateResponse = response.json().await?;
        Ok(parsed.text())
    }
}
