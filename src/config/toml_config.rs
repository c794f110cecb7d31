use crate::config::validate_adequacy_params;
use crate::core::catalog::{AliasGroup, AliasTable, ReferenceCatalog};
use crate::core::extractor::{ExtractorSettings, SkipPolicy, DEFAULT_LOOKAHEAD_CHARS};
use crate::core::ConfigProvider;
use crate::domain::model::{AdequacyParams, CatalogEntry};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub report: ReportInfo,
    pub source: SourceConfig,
    pub extract: Option<ExtractConfig>,
    pub adequacy: Option<AdequacyParams>,
    pub narrative: Option<NarrativeConfig>,
    pub load: LoadConfig,
    pub catalog: Option<CatalogConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportInfo {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub input_path: String,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    pub skip_policy: Option<SkipPolicy>,
    pub lookahead_chars: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeConfig {
    pub endpoint: String,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    pub output_formats: Vec<String>,
    pub archive_name: Option<String>,
}

/// Replaces the built-in reference data; omitted parts keep the built-ins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub items: Option<Vec<CatalogEntry>>,
    pub aliases: Option<Vec<AliasGroup>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub json_logs: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${OUTPUT_DIR})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigValidationError {
            field: "environment".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        use crate::utils::validation::{
            validate_file_extensions, validate_output_formats, validate_path,
            validate_positive_number, validate_url,
        };

        validate_path("source.input_path", &self.source.input_path)?;
        if self.source.files.is_empty() {
            return Err(EtlError::MissingConfigError {
                field: "source.files".to_string(),
            });
        }
        validate_file_extensions("source.files", &self.source.files, &["txt"])?;

        validate_positive_number("extract.lookahead_chars", self.lookahead_chars(), 1)?;

        if let Some(params) = &self.adequacy {
            validate_adequacy_params("adequacy", params)?;
        }

        if let Some(narrative) = &self.narrative {
            validate_url("narrative.endpoint", &narrative.endpoint)?;
        }

        validate_path("load.output_path", &self.load.output_path)?;
        validate_output_formats("load.output_formats", &self.load.output_formats)?;

        // 目錄錯誤在載入前即應回報
        self.reference_data()?;

        Ok(())
    }

    pub fn input_path(&self) -> &str {
        &self.source.input_path
    }

    pub fn skip_policy(&self) -> SkipPolicy {
        self.extract
            .as_ref()
            .and_then(|e| e.skip_policy)
            .unwrap_or_default()
    }

    pub fn lookahead_chars(&self) -> usize {
        self.extract
            .as_ref()
            .and_then(|e| e.lookahead_chars)
            .unwrap_or(DEFAULT_LOOKAHEAD_CHARS)
    }

    pub fn narrative_timeout_seconds(&self) -> u64 {
        self.narrative
            .as_ref()
            .and_then(|n| n.timeout_seconds)
            .unwrap_or(30)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.json_logs)
            .unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn input_files(&self) -> &[String] {
        &self.source.files
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.load.output_formats
    }

    fn extractor_settings(&self) -> ExtractorSettings {
        ExtractorSettings {
            skip_policy: self.skip_policy(),
            lookahead_chars: self.lookahead_chars(),
        }
    }

    fn adequacy_params(&self) -> Option<AdequacyParams> {
        self.adequacy
    }

    fn archive_name(&self) -> &str {
        self.load.archive_name.as_deref().unwrap_or("lab_results.zip")
    }

    fn reference_data(&self) -> Result<(ReferenceCatalog, AliasTable)> {
        let catalog = match self.catalog.as_ref().and_then(|c| c.items.clone()) {
            Some(items) => ReferenceCatalog::new(items)?,
            None => ReferenceCatalog::builtin(),
        };

        let aliases = match self.catalog.as_ref().and_then(|c| c.aliases.as_ref()) {
            Some(groups) => AliasTable::new(groups)?,
            None => AliasTable::builtin(),
        };

        Ok((catalog, aliases))
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
