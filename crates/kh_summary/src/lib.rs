pub mod audio;
pub mod clean;
pub mod extractive;
pub mod fetch;
pub mod models;
pub mod pipeline;
pub mod types;

pub use audio::{AudioSynthesizer, GoogleTtsSynthesizer};
pub use fetch::ContentFetcher;
pub use models::SummaryModel;
pub use pipeline::SummaryPipeline;
pub use types::{Provenance, SummaryArtifact, SummaryRequest};

pub mod prelude {
    pub use crate::pipeline::SummaryPipeline;
    pub use crate::types::{Provenance, SummaryArtifact, SummaryRequest};
    pub use kh_core::{Error, Language, Result};
}
