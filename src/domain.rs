use std::fmt;
use std::str::FromStr;

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, ValidationError};

macro_rules! survey_enum {
    ($name:ident, $field:literal, [$($variant:ident => $text:literal),+ $(,)?]) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            /// Position in the attribute's weight table.
            pub fn index(self) -> usize {
                $name::ALL.iter().position(|v| *v == self).unwrap_or(0)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(ValidationError::InvalidField {
                        field: $field,
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

survey_enum!(Risk, "risk", [Low => "low", Medium => "medium", High => "high"]);
survey_enum!(Horizon, "horizon", [Short => "short", Medium => "medium", Long => "long"]);
survey_enum!(Vibe, "vibe", [Serious => "serious", Balanced => "balanced", Degen => "degen"]);
survey_enum!(Sector, "sector", [
    Memes => "memes",
    Bluechips => "bluechips",
    Stables => "stables",
    Narratives => "narratives",
]);
survey_enum!(VolatilityTolerance, "volatility", [Low => "low", Medium => "medium", High => "high"]);
survey_enum!(TradeFrequency, "frequency", [Scalp => "scalp", Swing => "swing", Position => "position"]);
survey_enum!(ChainPreference, "chain", [Monad => "monad", Eth => "eth", Alt => "alt"]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurveyAnswer {
    pub risk: Risk,
    pub horizon: Horizon,
    pub vibe: Vibe,

    #[serde(default)]
    pub sector: Option<Sector>,
    #[serde(default, rename = "volatility")]
    pub volatility_tolerance: Option<VolatilityTolerance>,
    #[serde(default, rename = "frequency")]
    pub trade_frequency: Option<TradeFrequency>,
    #[serde(default, rename = "chain")]
    pub chain_preference: Option<ChainPreference>,
}

impl SurveyAnswer {
    pub fn new(risk: Risk, horizon: Horizon, vibe: Vibe) -> Self {
        Self {
            risk,
            horizon,
            vibe,
            sector: None,
            volatility_tolerance: None,
            trade_frequency: None,
            chain_preference: None,
        }
    }

    /// Builds an answer from raw string fields keyed by `risk`, `horizon`,
    /// `vibe`, `sector`, `volatility`, `frequency` and `chain`.
    ///
    /// Blank optional fields are treated as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| get(key).ok_or(ValidationError::MissingField(key));

        Ok(Self {
            risk: required("risk")?.parse()?,
            horizon: required("horizon")?.parse()?,
            vibe: required("vibe")?.parse()?,
            sector: get("sector").map(|v| v.parse()).transpose()?,
            volatility_tolerance: get("volatility").map(|v| v.parse()).transpose()?,
            trade_frequency: get("frequency").map(|v| v.parse()).transpose()?,
            chain_preference: get("chain").map(|v| v.parse()).transpose()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", content = "value", rename_all = "snake_case")]
pub enum MatchScore {
    /// Discrete model, 0..=100.
    Percent(u8),
    /// Continuous model, cosine in [-1, 1].
    Cosine(f64),
}

impl MatchScore {
    pub fn value(self) -> f64 {
        match self {
            MatchScore::Percent(p) => f64::from(p),
            MatchScore::Cosine(c) => c,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecommendation {
    pub symbol: String,
    pub display_name: String,
    pub score: MatchScore,
    /// Unset when the token has no known deployment; such a match is not executable.
    pub address: Option<String>,
}

impl TokenRecommendation {
    pub fn is_executable(&self) -> bool {
        self.address.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub sell_token: String,
    pub buy_token: String,
    /// Smallest unit of the sell token.
    pub sell_amount: U256,
    pub taker_address: String,
    pub chain_id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    AggregatorNative,
    AggregatorWrapped,
    OnChainRouter,
    SyntheticFallback,
    DemoTransfer,
}

impl ProviderId {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderId::AggregatorNative => "aggregator_native",
            ProviderId::AggregatorWrapped => "aggregator_wrapped",
            ProviderId::OnChainRouter => "on_chain_router",
            ProviderId::SyntheticFallback => "synthetic_fallback",
            ProviderId::DemoTransfer => "demo_transfer",
        }
    }

    /// False for sources that fabricate an estimate or a stand-in action.
    pub fn is_authoritative(self) -> bool {
        !matches!(self, ProviderId::SyntheticFallback | ProviderId::DemoTransfer)
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ready-to-submit transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Executable {
    pub to: String,
    pub data: String,
    pub value: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteResult {
    pub price: String,
    pub buy_amount: U256,
    pub sell_amount: U256,
    pub provider: ProviderId,
    pub executable: Option<Executable>,
    #[serde(default)]
    pub estimated_gas: Option<u64>,
}

impl QuoteResult {
    pub fn is_binding(&self) -> bool {
        self.provider.is_authoritative()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRequest {
    pub to: String,
    pub data: Option<String>,
    pub value: U256,
    pub gas_limit: Option<u64>,
}

impl From<&Executable> for TxRequest {
    fn from(exe: &Executable) -> Self {
        Self {
            to: exe.to.clone(),
            data: Some(exe.data.clone()),
            value: exe.value,
            gas_limit: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxHandle {
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapReceipt {
    pub provider: ProviderId,
    pub tx_hash: String,
    /// Absent for the demo transfer, which has no quote behind it.
    pub quote: Option<QuoteResult>,
}

impl SwapReceipt {
    pub fn is_demo(&self) -> bool {
        self.provider == ProviderId::DemoTransfer
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    pub provider: ProviderId,
    pub error: ProviderError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome<T> {
    /// `failures` lists the providers tried before the one that succeeded.
    Success {
        result: T,
        failures: Vec<ProviderFailure>,
    },
    AllProvidersFailed(Vec<ProviderFailure>),
}

impl<T> PipelineOutcome<T> {
    pub fn result(&self) -> Option<&T> {
        match self {
            PipelineOutcome::Success { result, .. } => Some(result),
            PipelineOutcome::AllProvidersFailed(_) => None,
        }
    }

    pub fn failures(&self) -> &[ProviderFailure] {
        match self {
            PipelineOutcome::Success { failures, .. } => failures,
            PipelineOutcome::AllProvidersFailed(failures) => failures,
        }
    }
}
