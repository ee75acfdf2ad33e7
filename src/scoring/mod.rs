pub mod continuous;
pub mod discrete;

use crate::catalog::TokenCatalog;
use crate::domain::{SurveyAnswer, TokenRecommendation};

pub use continuous::{cosine_similarity, derive_trait_vector, score_tokens_continuous};
pub use discrete::score_tokens_discrete;

/// A survey-to-deck ranking model.
///
/// Implementations are pure and total: every catalog token appears exactly
/// once in the output, best match first, ties kept in catalog order.
pub trait Scorer {
    fn name(&self) -> &'static str;
    fn score(&self, catalog: &TokenCatalog, answer: &SurveyAnswer) -> Vec<TokenRecommendation>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DiscreteScorer;

impl Scorer for DiscreteScorer {
    fn name(&self) -> &'static str {
        "discrete"
    }

    fn score(&self, catalog: &TokenCatalog, answer: &SurveyAnswer) -> Vec<TokenRecommendation> {
        score_tokens_discrete(catalog, answer)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ContinuousScorer;

impl Scorer for ContinuousScorer {
    fn name(&self) -> &'static str {
        "continuous"
    }

    fn score(&self, catalog: &TokenCatalog, answer: &SurveyAnswer) -> Vec<TokenRecommendation> {
        score_tokens_continuous(catalog, answer)
    }
}
