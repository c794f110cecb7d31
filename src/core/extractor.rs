//! Label-then-number extraction of catalog items from free report text.
//!
//! Matching runs in two stages. A case-insensitive literal search locates
//! every occurrence of a candidate label; the text following each
//! occurrence is then scanned, within a bounded window, for the first
//! numeric token allowed by the active [`SkipPolicy`]. The first label
//! occurrence that yields a token decides the item. A matched token that
//! fails to parse is reported as `ParseError` and does not fall through to
//! the remaining aliases.

use crate::core::catalog::{AliasTable, ReferenceCatalog};
use crate::domain::model::{CatalogEntry, ExtractionResult};
use crate::utils::error::{EtlError, Result};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

pub const DEFAULT_LOOKAHEAD_CHARS: usize = 80;

/// What may sit between a label and its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum SkipPolicy {
    /// Skip anything and take the first run of digits and dots. A unit
    /// containing digits (`10^9/L`) or a stray `.` between the label and
    /// the value is captured instead of the value.
    #[default]
    AnyCharacters,
    /// Only whitespace, `:` or `=` may precede the number, and the item's
    /// catalog unit must follow it.
    UnitAnchored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorSettings {
    pub skip_policy: SkipPolicy,
    /// Maximum number of characters between the end of a label and the start of its value.
    pub lookahead_chars: usize,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            skip_policy: SkipPolicy::AnyCharacters,
            lookahead_chars: DEFAULT_LOOKAHEAD_CHARS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NumericParse {
    Parsed(f64),
    Malformed(String),
}

pub fn parse_numeric(token: &str) -> NumericParse {
    match token.parse::<f64>() {
        Ok(value) if value.is_finite() => NumericParse::Parsed(value),
        _ => NumericParse::Malformed(token.to_string()),
    }
}

/// Stage one: case-insensitive literal label search.
#[derive(Debug, Clone)]
pub struct LabelMatcher {
    label: String,
    pattern: Regex,
}

impl LabelMatcher {
    pub fn new(label: &str) -> Result<Self> {
        if label.trim().is_empty() {
            return Err(EtlError::CatalogError {
                message: "cannot match an empty label".to_string(),
            });
        }

        let pattern = RegexBuilder::new(&regex::escape(label))
            .case_insensitive(true)
            .build()
            .map_err(|e| EtlError::ProcessingError {
                message: format!("cannot build matcher for label '{}': {}", label, e),
            })?;

        Ok(Self {
            label: label.to_string(),
            pattern,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Byte offsets just past each occurrence of the label.
    pub fn occurrence_ends<'t>(&'t self, text: &'t str) -> impl Iterator<Item = usize> + 't {
        self.pattern.find_iter(text).map(|m| m.end())
    }
}

/// Stage two: scan the text after a label for a numeric token.
#[derive(Debug, Clone)]
pub struct WindowScanner {
    lookahead_chars: usize,
    number_token: Regex,
    unit_anchored: Option<Regex>,
}

impl WindowScanner {
    pub fn new(settings: ExtractorSettings, unit: &str) -> Result<Self> {
        let number_token = Regex::new(r"[0-9.]+").map_err(|e| EtlError::ProcessingError {
            message: format!("cannot build numeric token pattern: {}", e),
        })?;

        let unit_anchored = match settings.skip_policy {
            SkipPolicy::AnyCharacters => None,
            SkipPolicy::UnitAnchored => Some(
                RegexBuilder::new(&format!(r"^[\s:=]*([0-9.]+)\s*{}", regex::escape(unit)))
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| EtlError::ProcessingError {
                        message: format!("cannot build unit pattern for '{}': {}", unit, e),
                    })?,
            ),
        };

        Ok(Self {
            lookahead_chars: settings.lookahead_chars,
            number_token,
            unit_anchored,
        })
    }

    /// The captured token, if one starts within the lookahead window of `after_label`.
    pub fn scan<'t>(&self, after_label: &'t str) -> Option<&'t str> {
        let token = match &self.unit_anchored {
            Some(pattern) => pattern.captures(after_label)?.get(1)?,
            None => {
                // 只在視窗內找起點，再延伸成完整的數字串
                let window_end = after_label
                    .char_indices()
                    .nth(self.lookahead_chars + 1)
                    .map_or(after_label.len(), |(index, _)| index);
                let start = self.number_token.find(&after_label[..window_end])?.start();
                self.number_token.find_at(after_label, start)?
            }
        };

        let skipped = after_label[..token.start()].chars().count();
        (skipped <= self.lookahead_chars).then_some(token.as_str())
    }
}

#[derive(Debug, Clone)]
struct ItemPlan {
    entry: CatalogEntry,
    candidates: Vec<LabelMatcher>,
    scanner: WindowScanner,
}

/// Holds no per-document state; one instance can serve a whole batch.
#[derive(Debug, Clone)]
pub struct ValueExtractor {
    plans: Vec<ItemPlan>,
}

impl ValueExtractor {
    pub fn new(
        catalog: &ReferenceCatalog,
        aliases: &AliasTable,
        settings: ExtractorSettings,
    ) -> Result<Self> {
        for target in aliases.unresolved_targets(catalog) {
            tracing::debug!("🔎 Alias target '{}' is not a catalog item, ignoring its aliases", target);
        }

        let mut plans = Vec::with_capacity(catalog.len());
        for entry in catalog.entries() {
            let mut labels = vec![entry.canonical_name.as_str()];
            for alias in aliases.aliases_for(&entry.canonical_name) {
                if !labels.contains(&alias) {
                    labels.push(alias);
                }
            }

            let candidates = labels
                .into_iter()
                .map(LabelMatcher::new)
                .collect::<Result<Vec<_>>>()?;

            plans.push(ItemPlan {
                entry: entry.clone(),
                candidates,
                scanner: WindowScanner::new(settings, &entry.unit)?,
            });
        }

        Ok(Self { plans })
    }

    /// Candidate labels for an item: canonical name first, then its aliases.
    pub fn candidate_labels(&self, canonical_name: &str) -> Vec<&str> {
        self.plans
            .iter()
            .find(|plan| plan.entry.canonical_name == canonical_name)
            .map(|plan| plan.candidates.iter().map(LabelMatcher::label).collect())
            .unwrap_or_default()
    }

    /// One result per catalog item, in catalog order.
    pub fn extract(&self, raw_text: &str) -> Vec<ExtractionResult> {
        self.plans
            .iter()
            .map(|plan| Self::extract_item(plan, raw_text))
            .collect()
    }

    fn extract_item(plan: &ItemPlan, raw_text: &str) -> ExtractionResult {
        for candidate in &plan.candidates {
            let Some(token) = Self::first_token(candidate, &plan.scanner, raw_text) else {
                continue;
            };

            return match parse_numeric(token) {
                NumericParse::Parsed(value) => {
                    tracing::trace!("{} ← '{}' = {}", plan.entry.canonical_name, candidate.label(), value);
                    ExtractionResult::found(&plan.entry, value)
                }
                NumericParse::Malformed(raw) => {
                    tracing::debug!(
                        "⚠️ {}: label '{}' matched but '{}' is not a number",
                        plan.entry.canonical_name,
                        candidate.label(),
                        raw
                    );
                    ExtractionResult::parse_error(&plan.entry)
                }
            };
        }

        ExtractionResult::not_found(&plan.entry)
    }

    fn first_token<'t>(
        candidate: &LabelMatcher,
        scanner: &WindowScanner,
        raw_text: &'t str,
    ) -> Option<&'t str> {
        candidate
            .occurrence_ends(raw_text)
            .find_map(|end| scanner.scan(&raw_text[end..]))
    }
}

/// Builds an extractor for a single pass over `raw_text`.
pub fn extract(
    raw_text: &str,
    catalog: &ReferenceCatalog,
    aliases: &AliasTable,
    settings: ExtractorSettings,
) -> Result<Vec<ExtractionResult>> {
    Ok(ValueExtractor::new(catalog, aliases, settings)?.extract(raw_text))
}
