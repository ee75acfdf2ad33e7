use std::cmp::Ordering;

use crate::catalog::{TokenCatalog, TraitVector};
use crate::domain::{Horizon, MatchScore, Risk, SurveyAnswer, TokenRecommendation, Vibe};

/// Maps a survey answer onto the catalog's trait space.
pub fn derive_trait_vector(answer: &SurveyAnswer) -> TraitVector {
    let risk = match answer.risk {
        Risk::Low => 0.2,
        Risk::Medium => 0.5,
        Risk::High => 0.9,
    };
    // volatility tracks risk one-to-one
    let volatility = risk;
    let meme = match answer.vibe {
        Vibe::Serious => 0.1,
        Vibe::Balanced => 0.5,
        Vibe::Degen => 0.95,
    };
    let stability = 1.0 - volatility * 0.8;
    let yield_bias = match answer.horizon {
        Horizon::Short => 0.3,
        Horizon::Medium => 0.6,
        Horizon::Long => 0.8,
    };
    [risk, volatility, meme, stability, yield_bias]
}

/// Cosine of the angle between `a` and `b`; 0 when either has zero magnitude.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let mag_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let mag_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    // rounding can push parallel vectors a hair past 1
    (dot / (mag_a * mag_b)).clamp(-1.0, 1.0)
}

pub fn score_tokens_continuous(catalog: &TokenCatalog, answer: &SurveyAnswer) -> Vec<TokenRecommendation> {
    let user = derive_trait_vector(answer);
    let mut scored: Vec<(f64, TokenRecommendation)> = catalog
        .tokens()
        .iter()
        .map(|t| {
            let sim = cosine_similarity(&user, &t.vector);
            let rec = TokenRecommendation {
                symbol: t.symbol.clone(),
                display_name: t.name.clone(),
                score: MatchScore::Cosine(sim),
                address: t.address.clone(),
            };
            (sim, rec)
        })
        .collect();

    // sort_by is stable: equal similarities keep catalog order
    scored.sort_by(|(a, _), (b, _)| b.partial_cmp(a).unwrap_or(Ordering::Equal));
    scored.into_iter().map(|(_, rec)| rec).collect()
}
