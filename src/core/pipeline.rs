use crate::core::adequacy::adequacy_from_results;
use crate::core::catalog::{AliasTable, ReferenceCatalog};
use crate::core::extractor::ValueExtractor;
use crate::core::narrative::build_prompt;
use crate::core::serology::SerologyInterpreter;
use crate::core::{
    ConfigProvider, DocumentReport, NarrativeService, Pipeline, SourceDocument, Storage,
    TransformResult,
};
use crate::domain::model::SerologyAssay;
use crate::utils::error::{EtlError, Result};
use serde::Serialize;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

/// Batch analysis of plain-text lab reports.
///
/// Documents are read from `source`, analysed one at a time with fresh
/// results, and the batch table is bundled into a ZIP archive written to
/// `sink`.
pub struct ReportPipeline<S: Storage, C: ConfigProvider> {
    source: S,
    sink: S,
    config: C,
    catalog: ReferenceCatalog,
    aliases: AliasTable,
    narrative: Option<Box<dyn NarrativeService>>,
}

impl<S: Storage, C: ConfigProvider> ReportPipeline<S, C> {
    pub fn new(source: S, sink: S, config: C) -> Result<Self> {
        let (catalog, aliases) = config.reference_data()?;
        tracing::debug!(
            "📚 Reference catalog loaded: {} items, {} aliases",
            catalog.len(),
            aliases.len()
        );

        Ok(Self {
            source,
            sink,
            config,
            catalog,
            aliases,
            narrative: None,
        })
    }

    pub fn with_narrative_service(mut self, service: Box<dyn NarrativeService>) -> Self {
        self.narrative = Some(service);
        self
    }

    pub fn catalog(&self) -> &ReferenceCatalog {
        &self.catalog
    }

    async fn narrate(&self, report: &DocumentReport) -> Option<String> {
        let service = self.narrative.as_ref()?;
        match service.generate(&build_prompt(report)).await {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!(
                    "⚠️ Narrative unavailable for {}: {} ({})",
                    report.document,
                    e,
                    e.recovery_suggestion()
                );
                None
            }
        }
    }

    fn table_header(&self) -> Vec<String> {
        let mut header = vec!["Patient".to_string()];
        header.extend(
            self.catalog
                .entries()
                .iter()
                .map(|entry| entry.canonical_name.clone()),
        );
        header.extend(SerologyAssay::ALL.iter().map(|assay| assay.label().to_string()));
        if self.config.adequacy_params().is_some() {
            header.push("URR (%)".to_string());
            header.push("KT/V".to_string());
        }
        header
    }

    fn table_row(report: &DocumentReport) -> Vec<String> {
        let mut row = vec![report.document.clone()];
        row.extend(report.lab_results.iter().map(|result| result.display_value()));
        row.extend(report.serology.entries.iter().map(|(_, outcome)| outcome.to_string()));
        if let Some(adequacy) = &report.adequacy {
            row.push(adequacy.urr_display());
            row.push(adequacy.ktv_display());
        }
        row
    }

    /// 依指定分隔符輸出批次表格
    fn render_table(&self, reports: &[DocumentReport], delimiter: u8) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(Vec::new());

        writer.write_record(self.table_header())?;
        for report in reports {
            writer.write_record(Self::table_row(report))?;
        }

        let bytes = writer.into_inner().map_err(|e| EtlError::ProcessingError {
            message: format!("failed to flush table: {}", e),
        })?;

        String::from_utf8(bytes).map_err(|e| EtlError::ProcessingError {
            message: format!("table is not valid UTF-8: {}", e),
        })
    }
}

#[derive(Serialize)]
struct ReportBundle<'a> {
    generated_at: chrono::DateTime<chrono::Utc>,
    reports: &'a [DocumentReport],
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ReportPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<SourceDocument>> {
        let files = self.config.input_files();
        if files.is_empty() {
            return Err(EtlError::MissingConfigError {
                field: "input_files".to_string(),
            });
        }

        let mut documents = Vec::with_capacity(files.len());
        for file in files {
            tracing::debug!("📄 Reading report: {}", file);
            let bytes = self.source.read_file(file).await?;
            documents.push(SourceDocument {
                name: file.clone(),
                text: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        Ok(documents)
    }

    async fn transform(&self, documents: Vec<SourceDocument>) -> Result<TransformResult> {
        let settings = self.config.extractor_settings();
        let extractor = ValueExtractor::new(&self.catalog, &self.aliases, settings)?;
        let serology = SerologyInterpreter::new(settings.lookahead_chars)?;
        let params = self.config.adequacy_params();

        let mut reports = Vec::with_capacity(documents.len());
        for document in documents {
            let lab_results = extractor.extract(&document.text);
            let found = lab_results.iter().filter(|r| r.is_found()).count();
            tracing::info!(
                "🧪 {}: {}/{} items found",
                document.name,
                found,
                lab_results.len()
            );

            let adequacy = params.map(|params| adequacy_from_results(&lab_results, params));
            let mut report = DocumentReport {
                document: document.name,
                serology: serology.interpret(&document.text),
                lab_results,
                adequacy,
                narrative: None,
            };
            report.narrative = self.narrate(&report).await;

            reports.push(report);
        }

        Ok(TransformResult {
            csv_output: self.render_table(&reports, b',')?,
            tsv_output: self.render_table(&reports, b'\t')?,
            reports,
            generated_at: chrono::Utc::now(),
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let formats = self.config.output_formats();
        let archive_name = self.config.archive_name();
        let output_path = format!("{}/{}", self.config.output_path(), archive_name);

        tracing::debug!("Creating ZIP file with formats: {:?}", formats);

        let zip_data = {
            let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

            for format in formats {
                match format.as_str() {
                    "csv" => {
                        zip.start_file::<_, ()>("output.csv", FileOptions::default())?;
                        zip.write_all(result.csv_output.as_bytes())?;
                    }
                    "tsv" => {
                        zip.start_file::<_, ()>("output.tsv", FileOptions::default())?;
                        zip.write_all(result.tsv_output.as_bytes())?;
                    }
                    "json" => {
                        zip.start_file::<_, ()>("reports.json", FileOptions::default())?;
                        let bundle = ReportBundle {
                            generated_at: result.generated_at,
                            reports: &result.reports,
                        };
                        zip.write_all(serde_json::to_string_pretty(&bundle)?.as_bytes())?;
                    }
                    other => {
                        return Err(EtlError::InvalidConfigValueError {
                            field: "output_formats".to_string(),
                            value: other.to_string(),
                            reason: "Unsupported format. Valid formats: csv, tsv, json"
                                .to_string(),
                        });
                    }
                }
            }

            let cursor = zip.finish()?;
            cursor.into_inner()
        };

        tracing::debug!("Writing ZIP file ({} bytes) to storage", zip_data.len());
        self.sink.write_file(archive_name, &zip_data).await?;

        Ok(output_path)
    }
}
