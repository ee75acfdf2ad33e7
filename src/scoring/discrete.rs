use crate::catalog::{TokenCatalog, TokenProfile};
use crate::domain::{MatchScore, SurveyAnswer, TokenRecommendation};

pub const SECTOR_BONUS: f64 = 12.0;
pub const VOLATILITY_BONUS: f64 = 8.0;
pub const FREQUENCY_BONUS: f64 = 6.0;
pub const CHAIN_BONUS: f64 = 4.0;

fn base_score(token: &TokenProfile, answer: &SurveyAnswer) -> f64 {
    let w = &token.weights;
    let r = f64::from(w.risk[answer.risk.index()]);
    let h = f64::from(w.horizon[answer.horizon.index()]);
    let v = f64::from(w.vibe[answer.vibe.index()]);
    (r + h + v) / 3.0
}

fn bonus(catalog: &TokenCatalog, token: &TokenProfile, answer: &SurveyAnswer) -> f64 {
    let table = catalog.affinities();
    let symbol = token.symbol.as_str();
    let mut bonus = 0.0;
    if answer.sector.is_some_and(|s| table.sector_fit(s, symbol)) {
        bonus += SECTOR_BONUS;
    }
    if answer.volatility_tolerance.is_some_and(|v| table.volatility_fit(v, symbol)) {
        bonus += VOLATILITY_BONUS;
    }
    if answer.trade_frequency.is_some_and(|f| table.frequency_fit(f, symbol)) {
        bonus += FREQUENCY_BONUS;
    }
    if answer.chain_preference.is_some_and(|c| table.chain_fit(c, symbol)) {
        bonus += CHAIN_BONUS;
    }
    bonus
}

/// Percentage match for one token: mean attribute weight plus contextual
/// bonuses, rounded and capped at 100.
pub fn score_token(catalog: &TokenCatalog, token: &TokenProfile, answer: &SurveyAnswer) -> u8 {
    let raw = (base_score(token, answer) + bonus(catalog, token, answer)).round();
    raw.clamp(0.0, 100.0) as u8
}

pub fn score_tokens_discrete(catalog: &TokenCatalog, answer: &SurveyAnswer) -> Vec<TokenRecommendation> {
    let mut deck: Vec<TokenRecommendation> = catalog
        .tokens()
        .iter()
        .map(|t| TokenRecommendation {
            symbol: t.symbol.clone(),
            display_name: t.name.clone(),
            score: MatchScore::Percent(score_token(catalog, t, answer)),
            address: t.address.clone(),
        })
        .collect();

    deck.sort_by_key(|r| std::cmp::Reverse(percent(r)));
    deck
}

fn percent(rec: &TokenRecommendation) -> u8 {
    match rec.score {
        MatchScore::Percent(p) => p,
        MatchScore::Cosine(_) => 0,
    }
}
