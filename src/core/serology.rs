use crate::domain::model::{SerologyAssay, SerologyOutcome, SerologyResult};
use crate::utils::error::{EtlError, Result};
use regex::{Regex, RegexBuilder};

const HIV_QUALIFIERS: &str = "not detected|non reactive|detected|negative|positive|reactive";
const HEPATITIS_QUALIFIERS: &str = "not detected|detected|negative|positive";

fn case_insensitive(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| EtlError::ProcessingError {
            message: format!("cannot build serology pattern '{}': {}", pattern, e),
        })
}

/// 依關鍵字分類定性結果，"not detected" 類須先於 "detected" 判斷
pub fn interpret_keyword(text: &str) -> SerologyOutcome {
    let lower = text.to_lowercase();

    if lower.contains("not detected") || lower.contains("negative") || lower.contains("non reactive")
    {
        SerologyOutcome::Negative
    } else if lower.contains("detected") || lower.contains("positive") || lower.contains("reactive")
    {
        SerologyOutcome::Positive
    } else {
        SerologyOutcome::NotDone
    }
}

#[derive(Debug, Clone)]
struct AnchoredRule {
    anchor: Regex,
    capture: Regex,
}

impl AnchoredRule {
    fn new(anchor: &str, capture: &str) -> Result<Self> {
        Ok(Self {
            anchor: case_insensitive(&regex::escape(anchor))?,
            capture: case_insensitive(capture)?,
        })
    }

    /// First capture group found within `lookahead_chars` of an anchor occurrence.
    fn find<'t>(&self, text: &'t str, lookahead_chars: usize) -> Option<&'t str> {
        self.anchor.find_iter(text).find_map(|anchor| {
            let rest = &text[anchor.end()..];
            let caps = self.capture.captures(rest)?;
            let whole = caps.get(0)?;
            let skipped = rest[..whole.start()].chars().count();
            if skipped <= lookahead_chars {
                caps.get(1).map(|m| m.as_str())
            } else {
                None
            }
        })
    }
}

/// Qualitative hepatitis and HIV results, independent of the reference catalog.
#[derive(Debug, Clone)]
pub struct SerologyInterpreter {
    hiv: AnchoredRule,
    hbsag: AnchoredRule,
    hbsab_titer: AnchoredRule,
    hcv: AnchoredRule,
    lookahead_chars: usize,
}

impl SerologyInterpreter {
    pub fn new(lookahead_chars: usize) -> Result<Self> {
        let hiv_qualifier = format!("({})", HIV_QUALIFIERS);
        let hepatitis_qualifier = format!("({})", HEPATITIS_QUALIFIERS);

        Ok(Self {
            hiv: AnchoredRule::new("HIV", &hiv_qualifier)?,
            hbsag: AnchoredRule::new("Hepatitis B Surface antigen", &hepatitis_qualifier)?,
            hbsab_titer: AnchoredRule::new(
                "Hepatitis B Surface antibody",
                r"([0-9]+\.?[0-9]*)\s*IU/L",
            )?,
            hcv: AnchoredRule::new("Hepatitis C antibody", &hepatitis_qualifier)?,
            lookahead_chars,
        })
    }

    pub fn interpret(&self, raw_text: &str) -> SerologyResult {
        let entries = SerologyAssay::ALL
            .iter()
            .map(|assay| (*assay, self.interpret_assay(*assay, raw_text)))
            .collect();

        SerologyResult { entries }
    }

    fn interpret_assay(&self, assay: SerologyAssay, raw_text: &str) -> SerologyOutcome {
        let qualifier = |rule: &AnchoredRule| {
            rule.find(raw_text, self.lookahead_chars)
                .map(interpret_keyword)
                .unwrap_or(SerologyOutcome::NotDone)
        };

        match assay {
            SerologyAssay::HivAntibody => qualifier(&self.hiv),
            SerologyAssay::HepBSurfaceAntigen => qualifier(&self.hbsag),
            SerologyAssay::HepBSurfaceAntibody => self
                .hbsab_titer
                .find(raw_text, self.lookahead_chars)
                .map(|titer| SerologyOutcome::PositiveTiter(titer.to_string()))
                .unwrap_or(SerologyOutcome::NotDone),
            SerologyAssay::HepCAntibody => qualifier(&self.hcv),
            // 核心抗體尚未解析，固定回報 Not done
            SerologyAssay::HepBCoreAntibody => SerologyOutcome::NotDone,
        }
    }
}
