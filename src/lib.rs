pub mod aggregator;
pub mod catalog;
pub mod config;
pub mod contracts;
pub mod domain;
pub mod error;
pub mod logger;
pub mod pipeline;
pub mod providers;
pub mod router;
pub mod rpc;
pub mod scoring;
pub mod state;
pub mod time;
pub mod units;
pub mod wallet;

pub use catalog::TokenCatalog;
pub use domain::{PipelineOutcome, QuoteRequest, QuoteResult, SurveyAnswer, TokenRecommendation};
pub use error::{PipelineError, ProviderError, ValidationError};
pub use pipeline::FallbackPipeline;
pub use scoring::{score_tokens_continuous, score_tokens_discrete};
