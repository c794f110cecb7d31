use crate::core::catalog::{AliasTable, ReferenceCatalog};
use crate::core::extractor::ExtractorSettings;
use crate::domain::model::{AdequacyParams, SourceDocument, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_files(&self) -> &[String];
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[String];
    fn extractor_settings(&self) -> ExtractorSettings;
    fn adequacy_params(&self) -> Option<AdequacyParams>;

    fn archive_name(&self) -> &str {
        "lab_results.zip"
    }

    /// 預設使用內建目錄與別名表
    fn reference_data(&self) -> Result<(ReferenceCatalog, AliasTable)> {
        Ok((ReferenceCatalog::builtin(), AliasTable::builtin()))
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<SourceDocument>>;
    async fn transform(&self, documents: Vec<SourceDocument>) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}

/// Opaque text generator used for the narrative commentary on a report.
#[async_trait]
pub trait NarrativeService: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}
