use crate::utils::error::ComputationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 參考目錄中的單一檢驗項目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub canonical_name: String,
    pub unit: String,
    pub low_bound: Option<f64>,
    pub high_bound: Option<f64>,
}

impl CatalogEntry {
    pub fn new(canonical_name: &str, unit: &str, low: Option<f64>, high: Option<f64>) -> Self {
        Self {
            canonical_name: canonical_name.to_string(),
            unit: unit.to_string(),
            low_bound: low,
            high_bound: high,
        }
    }

    /// 超出參考範圍時回傳 true；缺少的邊界視為開放
    pub fn is_out_of_range(&self, value: f64) -> bool {
        self.low_bound.is_some_and(|low| value < low)
            || self.high_bound.is_some_and(|high| value > high)
    }

    pub fn reference_display(&self) -> String {
        match (self.low_bound, self.high_bound) {
            (Some(low), Some(high)) => format!("{}-{}", low, high),
            _ => "-".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionStatus {
    Found,
    NotFound,
    ParseError,
}

/// One row of a document's lab table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub item: String,
    pub status: ExtractionStatus,
    pub value: Option<f64>,
    pub flagged: bool,
    pub reference_display: String,
}

impl ExtractionResult {
    pub fn found(entry: &CatalogEntry, value: f64) -> Self {
        Self {
            item: entry.canonical_name.clone(),
            status: ExtractionStatus::Found,
            value: Some(value),
            flagged: entry.is_out_of_range(value),
            reference_display: entry.reference_display(),
        }
    }

    pub fn not_found(entry: &CatalogEntry) -> Self {
        Self {
            item: entry.canonical_name.clone(),
            status: ExtractionStatus::NotFound,
            value: None,
            flagged: false,
            reference_display: "-".to_string(),
        }
    }

    pub fn parse_error(entry: &CatalogEntry) -> Self {
        Self {
            item: entry.canonical_name.clone(),
            status: ExtractionStatus::ParseError,
            value: None,
            flagged: false,
            reference_display: "-".to_string(),
        }
    }

    pub fn is_found(&self) -> bool {
        self.status == ExtractionStatus::Found
    }

    /// 表格與匯出共用的顯示字串
    pub fn display_value(&self) -> String {
        match (self.status, self.value) {
            (ExtractionStatus::Found, Some(value)) if self.flagged => format!("{}*", value),
            (ExtractionStatus::Found, Some(value)) => value.to_string(),
            (ExtractionStatus::ParseError, _) => "Parse error".to_string(),
            _ => "Not found".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SerologyAssay {
    HivAntibody,
    HepBSurfaceAntigen,
    HepBSurfaceAntibody,
    HepCAntibody,
    HepBCoreAntibody,
}

impl SerologyAssay {
    pub const ALL: [SerologyAssay; 5] = [
        SerologyAssay::HivAntibody,
        SerologyAssay::HepBSurfaceAntigen,
        SerologyAssay::HepBSurfaceAntibody,
        SerologyAssay::HepCAntibody,
        SerologyAssay::HepBCoreAntibody,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SerologyAssay::HivAntibody => "Anti HIV antibody",
            SerologyAssay::HepBSurfaceAntigen => "Hep B antigen (HBsAg)",
            SerologyAssay::HepBSurfaceAntibody => "Hep B antibody (HBsAb)",
            SerologyAssay::HepCAntibody => "Anti HCV antibody",
            SerologyAssay::HepBCoreAntibody => "Hep B Core antibody (HBcAb)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SerologyOutcome {
    Positive,
    Negative,
    NotDone,
    /// 抗體效價，保留報告中的原始數字
    PositiveTiter(String),
}

impl fmt::Display for SerologyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerologyOutcome::Positive => write!(f, "Positive"),
            SerologyOutcome::Negative => write!(f, "Negative"),
            SerologyOutcome::NotDone => write!(f, "Not done"),
            SerologyOutcome::PositiveTiter(titer) => write!(f, "Positive ({} IU/L)", titer),
        }
    }
}

/// Exactly one outcome per assay, in `SerologyAssay::ALL` order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerologyResult {
    pub entries: Vec<(SerologyAssay, SerologyOutcome)>,
}

impl SerologyResult {
    pub fn get(&self, assay: SerologyAssay) -> Option<&SerologyOutcome> {
        self.entries
            .iter()
            .find(|(candidate, _)| *candidate == assay)
            .map(|(_, outcome)| outcome)
    }

    pub fn get_by_label(&self, label: &str) -> Option<&SerologyOutcome> {
        self.entries
            .iter()
            .find(|(assay, _)| assay.label() == label)
            .map(|(_, outcome)| outcome)
    }
}

/// Treatment parameters collected from the user, validated at the config boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdequacyParams {
    pub duration_hours: f64,
    pub uf_volume_liters: f64,
    pub post_weight_kg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdequacyInput {
    pub pre_value: f64,
    pub post_value: f64,
    pub duration_hours: f64,
    pub uf_volume_liters: f64,
    pub post_weight_kg: f64,
}

impl AdequacyInput {
    pub fn new(pre_value: f64, post_value: f64, params: AdequacyParams) -> Self {
        Self {
            pre_value,
            post_value,
            duration_hours: params.duration_hours,
            uf_volume_liters: params.uf_volume_liters,
            post_weight_kg: params.post_weight_kg,
        }
    }
}

/// URR 與 KT/V 各自獨立成功或失敗
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdequacyResult {
    pub urr_percent: std::result::Result<f64, ComputationError>,
    pub ktv: std::result::Result<f64, ComputationError>,
}

impl AdequacyResult {
    pub fn urr_display(&self) -> String {
        match self.urr_percent {
            Ok(urr) => urr.to_string(),
            Err(_) => "Calculation error".to_string(),
        }
    }

    pub fn ktv_display(&self) -> String {
        match self.ktv {
            Ok(ktv) => ktv.to_string(),
            Err(_) => "Calculation error".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AdequacyOutcome {
    /// Pre or post urea was not extracted; the calculator was not invoked.
    Waiting { missing: Vec<String> },
    Computed(AdequacyResult),
}

impl AdequacyOutcome {
    pub fn urr_display(&self) -> String {
        match self {
            AdequacyOutcome::Waiting { .. } => "Waiting for values".to_string(),
            AdequacyOutcome::Computed(result) => result.urr_display(),
        }
    }

    pub fn ktv_display(&self) -> String {
        match self {
            AdequacyOutcome::Waiting { .. } => "Waiting for values".to_string(),
            AdequacyOutcome::Computed(result) => result.ktv_display(),
        }
    }
}

/// 已轉為純文字的檢驗報告
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocument {
    pub name: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    pub document: String,
    pub lab_results: Vec<ExtractionResult>,
    pub serology: SerologyResult,
    pub adequacy: Option<AdequacyOutcome>,
    pub narrative: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub reports: Vec<DocumentReport>,
    pub csv_output: String,
    pub tsv_output: String,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_display_requires_both_bounds() {
        let potassium = CatalogEntry::new("Potassium", "mmol/L", Some(3.5), Some(5.1));
        let alt = CatalogEntry::new("ALT", "U/L", None, None);
        let open_high = CatalogEntry::new("Ferritin", "µg/L", Some(30.0), None);

        assert_eq!(potassium.reference_display(), "3.5-5.1");
        assert_eq!(alt.reference_display(), "-");
        assert_eq!(open_high.reference_display(), "-");

        // 整數值的邊界以最短形式輸出
        let urea = CatalogEntry::new("Urea", "mmol/L", Some(3.0), Some(9.0));
        assert_eq!(urea.reference_display(), "3-9");
    }

    #[test]
    fn test_open_bounds_flag_only_one_side() {
        let open_high = CatalogEntry::new("Ferritin", "µg/L", Some(30.0), None);
        assert!(open_high.is_out_of_range(12.0));
        assert!(!open_high.is_out_of_range(5000.0));
    }

    #[test]
    fn test_display_value_marks_flagged_values() {
        let potassium = CatalogEntry::new("Potassium", "mmol/L", Some(3.5), Some(5.1));

        assert_eq!(ExtractionResult::found(&potassium, 6.2).display_value(), "6.2*");
        assert_eq!(ExtractionResult::found(&potassium, 4.0).display_value(), "4");
        assert_eq!(ExtractionResult::not_found(&potassium).display_value(), "Not found");
        assert_eq!(ExtractionResult::parse_error(&potassium).display_value(), "Parse error");
    }

    #[test]
    fn test_serology_outcome_display() {
        assert_eq!(
            SerologyOutcome::PositiveTiter("15.3".to_string()).to_string(),
            "Positive (15.3 IU/L)"
        );
        assert_eq!(SerologyOutcome::NotDone.to_string(), "Not done");
    }
}
