pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::extractor::{ExtractorSettings, SkipPolicy, DEFAULT_LOOKAHEAD_CHARS};
#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::domain::model::AdequacyParams;
#[cfg(feature = "cli")]
use crate::utils::error::{EtlError, Result};
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

pub const DURATION_HOURS_RANGE: (f64, f64) = (1.0, 8.0);
pub const UF_VOLUME_LITERS_RANGE: (f64, f64) = (0.0, 5.0);
pub const POST_WEIGHT_KG_RANGE: (f64, f64) = (30.0, 200.0);

/// 檢查透析參數是否在允許範圍內
pub fn validate_adequacy_params(
    section: &str,
    params: &crate::domain::model::AdequacyParams,
) -> crate::utils::error::Result<()> {
    use crate::utils::validation::validate_range;

    validate_range(
        &format!("{}.duration_hours", section),
        params.duration_hours,
        DURATION_HOURS_RANGE.0,
        DURATION_HOURS_RANGE.1,
    )?;
    validate_range(
        &format!("{}.uf_volume_liters", section),
        params.uf_volume_liters,
        UF_VOLUME_LITERS_RANGE.0,
        UF_VOLUME_LITERS_RANGE.1,
    )?;
    validate_range(
        &format!("{}.post_weight_kg", section),
        params.post_weight_kg,
        POST_WEIGHT_KG_RANGE.0,
        POST_WEIGHT_KG_RANGE.1,
    )
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "lab-report-etl")]
#[command(about = "Extract lab values from plain-text reports and compute dialysis adequacy")]
pub struct CliConfig {
    /// Directory the input reports are read from
    #[arg(long, default_value = ".")]
    pub input_dir: String,

    /// Plain-text reports, relative to --input-dir
    #[arg(long, value_delimiter = ',')]
    pub input_files: Vec<String>,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, value_delimiter = ',', default_value = "csv,json")]
    pub output_formats: Vec<String>,

    #[arg(long, value_enum, default_value_t = SkipPolicy::AnyCharacters)]
    pub skip_policy: SkipPolicy,

    #[arg(long, default_value_t = DEFAULT_LOOKAHEAD_CHARS)]
    pub lookahead_chars: usize,

    /// Session length in hours (1-8)
    #[arg(long)]
    pub duration_hours: Option<f64>,

    /// Ultrafiltration volume in liters (0-5)
    #[arg(long)]
    pub uf_volume_liters: Option<f64>,

    /// Post-dialysis weight in kg (30-200)
    #[arg(long)]
    pub post_weight_kg: Option<f64>,

    /// Endpoint of the narrative text service
    #[arg(long)]
    pub narrative_endpoint: Option<String>,

    #[arg(long, default_value = "30")]
    pub narrative_timeout_seconds: u64,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn input_files(&self) -> &[String] {
        &self.input_files
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.output_formats
    }

    fn extractor_settings(&self) -> ExtractorSettings {
        ExtractorSettings {
            skip_policy: self.skip_policy,
            lookahead_chars: self.lookahead_chars,
        }
    }

    fn adequacy_params(&self) -> Option<AdequacyParams> {
        Some(AdequacyParams {
            duration_hours: self.duration_hours?,
            uf_volume_liters: self.uf_volume_liters?,
            post_weight_kg: self.post_weight_kg?,
        })
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if self.input_files.is_empty() {
            return Err(EtlError::MissingConfigError {
                field: "input_files".to_string(),
            });
        }
        validation::validate_file_extensions("input_files", &self.input_files, &["txt"])?;
        validation::validate_path("input_dir", &self.input_dir)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_output_formats("output_formats", &self.output_formats)?;
        validation::validate_positive_number("lookahead_chars", self.lookahead_chars, 1)?;

        let given = [
            ("duration_hours", self.duration_hours.is_some()),
            ("uf_volume_liters", self.uf_volume_liters.is_some()),
            ("post_weight_kg", self.post_weight_kg.is_some()),
        ];
        // 三個透析參數須同時提供或同時省略
        if given.iter().any(|(_, present)| *present) {
            if let Some((field, _)) = given.iter().find(|(_, present)| !*present) {
                return Err(EtlError::MissingConfigError {
                    field: field.to_string(),
                });
            }
        }

        if let Some(params) = self.adequacy_params() {
            validate_adequacy_params("adequacy", &params)?;
        }

        if let Some(endpoint) = &self.narrative_endpoint {
            validation::validate_url("narrative_endpoint", endpoint)?;
        }

        Ok(())
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliConfig {
        let mut argv = vec!["lab-report-etl"];
        argv.extend_from_slice(args);
        CliConfig::parse_from(argv)
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["--input-files", "a.txt,b.txt"]);
        assert_eq!(config.input_files, vec!["a.txt", "b.txt"]);
        assert_eq!(config.output_formats, vec!["csv", "json"]);
        assert_eq!(config.extractor_settings(), ExtractorSettings::default());
        assert!(config.adequacy_params().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_skip_policy_flag() {
        let config = parse(&["--input-files", "a.txt", "--skip-policy", "unit-anchored"]);
        assert_eq!(config.skip_policy, SkipPolicy::UnitAnchored);
    }

    #[test]
    fn test_partial_adequacy_params_are_rejected() {
        let config = parse(&["--input-files", "a.txt", "--duration-hours", "4"]);
        let err = config.validate().unwrap_err();
        assert!(matches!(err, EtlError::MissingConfigError { field } if field == "uf_volume_liters"));
    }

    #[test]
    fn test_out_of_range_weight_is_rejected() {
        let config = parse(&[
            "--input-files",
            "a.txt",
            "--duration-hours",
            "4",
            "--uf-volume-liters",
            "1.7",
            "--post-weight-kg",
            "12",
        ]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pdf_inputs_are_rejected() {
        let config = parse(&["--input-files", "report.pdf"]);
        assert!(config.validate().is_err());
    }
}
