use crate::domain::model::CatalogEntry;
use crate::utils::error::{EtlError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Immutable table of lab items, iterated in insertion order.
#[derive(Debug, Clone)]
pub struct ReferenceCatalog {
    entries: Vec<CatalogEntry>,
}

impl ReferenceCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self> {
        let mut seen = HashSet::new();

        for entry in &entries {
            if entry.canonical_name.trim().is_empty() {
                return Err(EtlError::CatalogError {
                    message: "catalog item with an empty name".to_string(),
                });
            }

            if !seen.insert(entry.canonical_name.as_str()) {
                return Err(EtlError::CatalogError {
                    message: format!("duplicate item '{}'", entry.canonical_name),
                });
            }

            if entry.low_bound.is_some_and(f64::is_nan) || entry.high_bound.is_some_and(f64::is_nan) {
                return Err(EtlError::CatalogError {
                    message: format!("item '{}' has a NaN bound", entry.canonical_name),
                });
            }

            if let (Some(low), Some(high)) = (entry.low_bound, entry.high_bound) {
                if low > high {
                    return Err(EtlError::CatalogError {
                        message: format!(
                            "item '{}' has low bound {} above high bound {}",
                            entry.canonical_name, low, high
                        ),
                    });
                }
            }
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, canonical_name: &str) -> Option<&CatalogEntry> {
        self.entries
            .iter()
            .find(|entry| entry.canonical_name == canonical_name)
    }

    pub fn contains(&self, canonical_name: &str) -> bool {
        self.get(canonical_name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 內建的檢驗項目與參考範圍
    pub fn builtin() -> Self {
        let entry = |name: &str, unit: &str, low: Option<f64>, high: Option<f64>| {
            CatalogEntry::new(name, unit, low, high)
        };

        Self {
            entries: vec![
                entry("Urea", "mmol/L", Some(3.0), Some(9.0)),
                entry("Urea - Post Dialysis", "mmol/L", Some(3.0), Some(9.0)),
                entry("Creatinine", "µmol/L", Some(44.0), Some(110.0)),
                entry("Potassium", "mmol/L", Some(3.5), Some(5.1)),
                entry("Sodium", "mmol/L", Some(135.0), Some(145.0)),
                entry("Albumin", "g/L", Some(35.0), Some(50.0)),
                entry("Bilirubin", "µmol/L", None, None),
                entry("Calcium", "mmol/L", Some(2.10), Some(2.55)),
                entry("Phosphate", "mmol/L", Some(0.65), Some(1.45)),
                entry("Alkaline Phosphatase", "U/L", Some(40.0), Some(130.0)),
                entry("ALT", "U/L", None, None),
                entry("AST", "U/L", None, None),
                entry("Haemoglobin", "g/dL", Some(120.0), Some(150.0)),
                entry("White Cell Count", "µl", None, None),
                entry("Hypochromic cells", "%", None, None),
                entry("Platelets", "10^9/L", Some(150.0), Some(410.0)),
                entry("Glucose", "mmol/L", Some(3.9), Some(7.7)),
                entry("Total Protein", "g/L", None, None),
                entry("HbA1C", "%", None, None),
                entry("Serum Iron", "µmol/L", Some(9.0), Some(26.0)),
                entry("Sr. UIBC", "µmol/L", None, None),
                entry("Total Iron Binding Capacity", "µmol/L", None, None),
                entry("Saturation", "%", Some(13.0), Some(51.0)),
                entry("Ferritin", "µg/L", None, None),
                entry("Total Chol", "mmol/L", None, None),
                entry("Triglyceride", "mmol/L", None, None),
                entry("LDL-C L", "mmol/L", None, None),
                entry("HDL-C", "mmol/L", None, None),
                entry("Intact Parathyroid Hormone", "pg/mL", Some(1.6), Some(6.9)),
                entry("Lymphocytes", "HSD/CU mm", Some(1.0), Some(4.0)),
                entry("GGT", "U/L", None, None),
            ],
        }
    }
}

/// Alternate labels grouped under the item they refer to, as written in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasGroup {
    pub canonical: String,
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
struct AliasEntry {
    alias: String,
    targets: Vec<String>,
}

/// Alias → canonical names, kept in table-defined order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AliasTable {
    entries: Vec<AliasEntry>,
}

impl AliasTable {
    /// Validated construction for alias groups coming from configuration.
    pub fn new(groups: &[AliasGroup]) -> Result<Self> {
        for group in groups {
            if group.canonical.trim().is_empty() {
                return Err(EtlError::CatalogError {
                    message: "alias group with an empty canonical name".to_string(),
                });
            }

            // 空白別名會在文件每個位置都匹配
            if group.aliases.iter().any(|alias| alias.trim().is_empty()) {
                return Err(EtlError::CatalogError {
                    message: format!("alias group '{}' contains an empty alias", group.canonical),
                });
            }
        }

        Ok(Self::from_groups(groups))
    }

    pub fn from_groups(groups: &[AliasGroup]) -> Self {
        let mut entries: Vec<AliasEntry> = Vec::new();

        for group in groups {
            for alias in &group.aliases {
                match entries.iter_mut().find(|entry| entry.alias == *alias) {
                    Some(entry) => {
                        if !entry.targets.contains(&group.canonical) {
                            entry.targets.push(group.canonical.clone());
                        }
                    }
                    None => entries.push(AliasEntry {
                        alias: alias.clone(),
                        targets: vec![group.canonical.clone()],
                    }),
                }
            }
        }

        Self { entries }
    }

    pub fn targets_of(&self, alias: &str) -> &[String] {
        self.entries
            .iter()
            .find(|entry| entry.alias == alias)
            .map(|entry| entry.targets.as_slice())
            .unwrap_or(&[])
    }

    /// Aliases resolving to `canonical_name`, in table order.
    pub fn aliases_for(&self, canonical_name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|entry| entry.targets.iter().any(|target| target == canonical_name))
            .map(|entry| entry.alias.as_str())
            .collect()
    }

    /// 指向目錄中不存在項目的別名目標
    pub fn unresolved_targets(&self, catalog: &ReferenceCatalog) -> Vec<&str> {
        let mut unresolved: Vec<&str> = Vec::new();
        for target in self.entries.iter().flat_map(|entry| entry.targets.iter()) {
            if !catalog.contains(target) && !unresolved.contains(&target.as_str()) {
                unresolved.push(target.as_str());
            }
        }
        unresolved
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn builtin() -> Self {
        Self::from_groups(&builtin_alias_groups())
    }
}

pub fn builtin_alias_groups() -> Vec<AliasGroup> {
    let group = |canonical: &str, aliases: &[&str]| AliasGroup {
        canonical: canonical.to_string(),
        aliases: aliases.iter().map(|alias| alias.to_string()).collect(),
    };

    vec![
        group("Urea", &["Blood Urea", "Urea (BUN)"]),
        group("Urea - Post Dialysis", &["Postdialysis Urea", "Post BUN"]),
        // 目錄中沒有 "Sr. Creatinine"，此組別名不會生效
        group("Sr. Creatinine", &["Creatinine", "Serum Creatinine"]),
    ]
}
