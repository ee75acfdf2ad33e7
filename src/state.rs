use serde::{Deserialize, Serialize};

use crate::domain::TokenRecommendation;
use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub symbol: String,
    pub address: Option<String>,
}

/// Per-session matches and the token the user swiped right on.
///
/// Created at session start and owned by the caller; `reset` clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStore {
    matches: Vec<TokenRecommendation>,
    selected: Option<Selection>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the deck; a previous selection is dropped.
    pub fn set_matches(&mut self, matches: Vec<TokenRecommendation>) {
        self.matches = matches;
        self.selected = None;
    }

    pub fn matches(&self) -> &[TokenRecommendation] {
        &self.matches
    }

    pub fn select(&mut self, symbol: &str) -> Result<&Selection, ValidationError> {
        let rec = self
            .matches
            .iter()
            .find(|r| r.symbol.eq_ignore_ascii_case(symbol))
            .ok_or_else(|| ValidationError::UnknownToken(symbol.to_string()))?;
        Ok(self.selected.insert(Selection {
            symbol: rec.symbol.clone(),
            address: rec.address.clone(),
        }))
    }

    pub fn selected(&self) -> Option<&Selection> {
        self.selected.as_ref()
    }

    /// Best-ranked match that has a deployed address.
    pub fn top_executable(&self) -> Option<&TokenRecommendation> {
        self.matches.iter().find(|r| r.is_executable())
    }

    pub fn reset(&mut self) {
        self.matches.clear();
        self.selected = None;
    }
}
