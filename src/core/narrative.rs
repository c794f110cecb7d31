use crate::domain::model::{DocumentReport, ExtractionStatus};
use crate::domain::ports::NarrativeService;
use crate::utils::error::{EtlError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn format_lab_results(report: &DocumentReport) -> String {
    let lines: Vec<String> = report
        .lab_results
        .iter()
        .filter(|result| result.status != ExtractionStatus::NotFound)
        .map(|result| {
            format!(
                "- {}: {} (reference {})",
                result.item,
                result.display_value(),
                result.reference_display
            )
        })
        .collect();

    if lines.is_empty() {
        "None extracted".to_string()
    } else {
        lines.join("\n")
    }
}

fn format_serology(report: &DocumentReport) -> String {
    report
        .serology
        .entries
        .iter()
        .map(|(assay, outcome)| format!("- {}: {}", assay.label(), outcome))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Plain-text prompt describing one analysed report.
pub fn build_prompt(report: &DocumentReport) -> String {
    let not_found = report
        .lab_results
        .iter()
        .filter(|result| result.status == ExtractionStatus::NotFound)
        .count();

    let mut prompt = format!(
        "Summarise the laboratory report '{}' for a dialysis patient in plain language.\n\
         Values marked with * are outside the reference range. \
         The summary is informational only and must not give medical advice.\n\n\
         Lab results ({} items not reported):\n{}\n\nSerology:\n{}\n",
        report.document,
        not_found,
        format_lab_results(report),
        format_serology(report)
    );

    if let Some(adequacy) = &report.adequacy {
        prompt.push_str(&format!(
            "\nDialysis adequacy:\n- URR (%): {}\n- KT/V: {}\n",
            adequacy.urr_display(),
            adequacy.ktv_display()
        ));
    }

    prompt
}

#[derive(Debug, Serialize)]
struct NarrativeRequest<'a> {
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct NarrativeResponse {
    text: String,
}

/// POSTs `{"prompt": ...}` to an endpoint answering `{"text": ...}`.
pub struct HttpNarrativeService {
    endpoint: String,
    client: Client,
}

impl HttpNarrativeService {
    pub fn new(endpoint: String, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self { endpoint, client })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl NarrativeService for HttpNarrativeService {
    async fn generate(&self, prompt: &str) -> Result<String> {
        tracing::debug!("📝 Requesting narrative from: {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&NarrativeRequest { prompt })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EtlError::NarrativeError {
                message: format!("endpoint returned status {}", status),
            });
        }

        let body: NarrativeResponse = response.json().await?;
        Ok(body.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{
        AdequacyOutcome, CatalogEntry, ExtractionResult, SerologyAssay, SerologyOutcome,
        SerologyResult,
    };

    fn report() -> DocumentReport {
        let potassium = CatalogEntry::new("Potassium", "mmol/L", Some(3.5), Some(5.1));
        let sodium = CatalogEntry::new("Sodium", "mmol/L", Some(135.0), Some(145.0));

        DocumentReport {
            document: "patient_a.txt".to_string(),
            lab_results: vec![
                ExtractionResult::found(&potassium, 6.2),
                ExtractionResult::not_found(&sodium),
            ],
            serology: SerologyResult {
                entries: SerologyAssay::ALL
                    .iter()
                    .map(|assay| (*assay, SerologyOutcome::NotDone))
                    .collect(),
            },
            adequacy: Some(AdequacyOutcome::Waiting {
                missing: vec!["Urea".to_string()],
            }),
            narrative: None,
        }
    }

    #[test]
    fn test_prompt_lists_found_values_only() {
        let prompt = build_prompt(&report());

        assert!(prompt.contains("- Potassium: 6.2* (reference 3.5-5.1)"));
        assert!(!prompt.contains("- Sodium"));
        assert!(prompt.contains("(1 items not reported)"));
        assert!(prompt.contains("- Anti HIV antibody: Not done"));
        assert!(prompt.contains("- URR (%): Waiting for values"));
    }

    #[test]
    fn test_prompt_without_adequacy_section() {
        let mut report = report();
        report.adequacy = None;
        assert!(!build_prompt(&report).contains("Dialysis adequacy"));
    }
}
