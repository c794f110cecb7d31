pub mod adequacy;
pub mod catalog;
pub mod etl;
pub mod extractor;
pub mod narrative;
pub mod pipeline;
pub mod serology;

pub use crate::domain::model::{DocumentReport, SourceDocument, TransformResult};
pub use crate::domain::ports::{ConfigProvider, NarrativeService, Pipeline, Storage};
pub use crate::utils::error::Result;
