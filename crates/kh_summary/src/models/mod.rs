use async_trait::async_trait;

use crate::types::{Provenance, SummaryRequest};
use kh_core::Result;

pub mod bart;
pub mod gemini;

pub use bart::BartModel;
pub use gemini::GeminiModel;

/// One stage in the summarization cascade. The pipeline walks an ordered
/// list of these and commits to the first acceptable output.
///
/// `Ok(None)` means the model declined or produced nothing usable; `Err`
/// means the call itself failed. Both are logged and skipped, the
/// distinction exists so the cause stays visible in traces.
#[async_trait]
pub trait SummaryModel: Send + Sync {
    fn name(&self) -> &str;

    fn provenance(&self) -> Provenance;

    /// Configuration and language gate, checked before any network call
    fn accepts(&self, request: &SummaryRequest) -> bool;

    /// Character count the output must exceed before the pipeline
    /// commits to it
    fn min_chars(&self) -> usize;

    async fn try_summarize(
        &self,
        request: &SummaryRequest,
        excerpt: &str,
    ) -> Result<Option<String>>;
}
