use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{ChainPreference, Sector, TradeFrequency, VolatilityTolerance};

/// `(risk_level, volatility, meme_affinity, stability, yield_bias)`, each in [0, 1].
pub type TraitVector = [f64; 5];

/// Per-attribute affinity percentages, indexed by the attribute's enum order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscreteWeights {
    pub risk: [u8; 3],
    pub horizon: [u8; 3],
    pub vibe: [u8; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Liquidity {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenProfile {
    pub symbol: String,
    pub name: String,
    pub tagline: String,
    pub liquidity: Liquidity,
    pub fee_bps: u32,
    pub decimals: u8,
    pub address: Option<String>,
    pub vector: TraitVector,
    pub weights: DiscreteWeights,
}

/// Symbol sets that earn contextual bonuses in the discrete model.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AffinityTable {
    pub sector: HashMap<Sector, Vec<String>>,
    pub volatility: HashMap<VolatilityTolerance, Vec<String>>,
    pub frequency: HashMap<TradeFrequency, Vec<String>>,
    pub preferred_chain: Option<ChainPreference>,
    pub chain_companions: Vec<String>,
}

fn contains(set: Option<&Vec<String>>, symbol: &str) -> bool {
    set.is_some_and(|s| s.iter().any(|v| v == symbol))
}

impl AffinityTable {
    pub fn sector_fit(&self, sector: Sector, symbol: &str) -> bool {
        contains(self.sector.get(&sector), symbol)
    }

    pub fn volatility_fit(&self, tolerance: VolatilityTolerance, symbol: &str) -> bool {
        contains(self.volatility.get(&tolerance), symbol)
    }

    pub fn frequency_fit(&self, frequency: TradeFrequency, symbol: &str) -> bool {
        contains(self.frequency.get(&frequency), symbol)
    }

    pub fn chain_fit(&self, chain: ChainPreference, symbol: &str) -> bool {
        self.preferred_chain == Some(chain) && self.chain_companions.iter().any(|s| s == symbol)
    }
}

/// Read-only token reference data. Insertion order is the ranking tie-break.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenCatalog {
    tokens: Vec<TokenProfile>,
    affinities: AffinityTable,
}

// Monad testnet deployments.
pub const MONAD_CHAIN_ID: u64 = 10143;
pub const UNISWAP_V2_FACTORY: &str = "0x733e88f248b742db6c14c0b1713af5ad7fdd59d0";
pub const UNISWAP_V2_ROUTER: &str = "0xfb8e1c3b833f9e67a71c859a132cf783b645e436";
pub const WMON: &str = "0x760AfE86e5de5fa0Ee542fc7B7B713e1c5425701";
pub const USDC: &str = "0xf817257fed379853cDe0fa4F97AB987181B1E5Ea";
pub const USDT: &str = "0x88b8E2161DEDC77EF4ab7585569D2415a1C1055D";
pub const WETH: &str = "0xB5a30b0FDc5EA94A52fDc42e3E9760Cb8449Fb37";
pub const WBTC: &str = "0xcf5a6076cfa32686c0Df13aBaDa2b40dec133F1d";
pub const WSOL: &str = "0x5387C85A4965769f6B0Df430638a1388493486F1";

fn symbols(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[allow(clippy::too_many_arguments)]
fn profile(
    symbol: &str,
    name: &str,
    tagline: &str,
    liquidity: Liquidity,
    fee_bps: u32,
    decimals: u8,
    address: Option<&str>,
    vector: TraitVector,
    weights: DiscreteWeights,
) -> TokenProfile {
    TokenProfile {
        symbol: symbol.to_string(),
        name: name.to_string(),
        tagline: tagline.to_string(),
        liquidity,
        fee_bps,
        decimals,
        address: address.map(str::to_string),
        vector,
        weights,
    }
}

impl TokenCatalog {
    pub fn new(tokens: Vec<TokenProfile>, affinities: AffinityTable) -> Self {
        Self { tokens, affinities }
    }

    pub fn tokens(&self) -> &[TokenProfile] {
        &self.tokens
    }

    pub fn affinities(&self) -> &AffinityTable {
        &self.affinities
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn by_symbol(&self, symbol: &str) -> Option<&TokenProfile> {
        self.tokens.iter().find(|t| t.symbol.eq_ignore_ascii_case(symbol))
    }

    pub fn by_address(&self, address: &str) -> Option<&TokenProfile> {
        self.tokens.iter().find(|t| {
            t.address
                .as_deref()
                .is_some_and(|a| a.eq_ignore_ascii_case(address))
        })
    }

    pub fn resolve_address(&self, symbol: &str) -> Option<&str> {
        self.by_symbol(symbol).and_then(|t| t.address.as_deref())
    }

    /// Lower-cased address -> decimals for every deployed token.
    pub fn decimals_by_address(&self) -> HashMap<String, u8> {
        self.tokens
            .iter()
            .filter_map(|t| t.address.as_ref().map(|a| (a.to_ascii_lowercase(), t.decimals)))
            .collect()
    }

    /// The Monad testnet deck.
    pub fn monad_testnet() -> Self {
        let tokens = vec![
            profile(
                "WMON",
                "Wrapped MON",
                "The mysterious new kid on the block, fast and smooth.",
                Liquidity::High,
                5,
                18,
                Some(WMON),
                [0.6, 0.7, 0.5, 0.5, 0.5],
                DiscreteWeights { risk: [20, 60, 20], horizon: [20, 60, 20], vibe: [30, 50, 20] },
            ),
            profile(
                "WOOL",
                "Wrapped WOOL",
                "Fluffy but sturdy, keeps it cozy while stacking gains.",
                Liquidity::Low,
                30,
                18,
                None,
                [0.4, 0.5, 0.6, 0.6, 0.4],
                DiscreteWeights { risk: [40, 50, 10], horizon: [30, 50, 20], vibe: [35, 50, 15] },
            ),
            profile(
                "USDC",
                "USD Coin",
                "Clean, regulated and drama-free.",
                Liquidity::High,
                1,
                6,
                Some(USDC),
                [0.1, 0.1, 0.0, 1.0, 0.3],
                DiscreteWeights { risk: [80, 20, 0], horizon: [60, 35, 5], vibe: [70, 30, 0] },
            ),
            profile(
                "USDT",
                "Tether USD",
                "Dependable and everywhere.",
                Liquidity::High,
                1,
                6,
                Some(USDT),
                [0.1, 0.1, 0.0, 1.0, 0.3],
                DiscreteWeights { risk: [80, 20, 0], horizon: [60, 35, 5], vibe: [60, 35, 5] },
            ),
            profile(
                "WETH",
                "Wrapped ETH",
                "Classic, reliable and liquid everywhere.",
                Liquidity::High,
                5,
                18,
                Some(WETH),
                [0.4, 0.4, 0.2, 0.8, 0.5],
                DiscreteWeights { risk: [30, 60, 10], horizon: [20, 50, 30], vibe: [50, 45, 5] },
            ),
            profile(
                "WBTC",
                "Wrapped BTC",
                "The OG, slow and steady with big energy.",
                Liquidity::Medium,
                5,
                8,
                Some(WBTC),
                [0.5, 0.5, 0.1, 0.7, 0.4],
                DiscreteWeights { risk: [30, 60, 10], horizon: [15, 40, 45], vibe: [60, 35, 5] },
            ),
            profile(
                "WSOL",
                "Wrapped SOL",
                "The sprinter, fast moves and sunny vibes.",
                Liquidity::Medium,
                5,
                9,
                Some(WSOL),
                [0.6, 0.6, 0.2, 0.6, 0.5],
                DiscreteWeights { risk: [25, 60, 15], horizon: [25, 55, 20], vibe: [40, 50, 10] },
            ),
            profile(
                "PEPE",
                "PEPE",
                "Loud, meme-y and might moon.",
                Liquidity::Medium,
                30,
                18,
                None,
                [0.9, 0.95, 1.0, 0.1, 0.4],
                DiscreteWeights { risk: [5, 25, 90], horizon: [85, 35, 10], vibe: [0, 25, 95] },
            ),
        ];

        let affinities = AffinityTable {
            sector: HashMap::from([
                (Sector::Memes, symbols(&["WMON", "WOOL", "WSOL", "PEPE"])),
                (Sector::Bluechips, symbols(&["WETH", "WBTC"])),
                (Sector::Stables, symbols(&["USDC", "USDT"])),
                (Sector::Narratives, symbols(&["WMON", "WSOL", "WETH"])),
            ]),
            volatility: HashMap::from([
                (VolatilityTolerance::Low, symbols(&["USDC", "USDT"])),
                (VolatilityTolerance::Medium, symbols(&["WETH", "WBTC", "WOOL"])),
                (VolatilityTolerance::High, symbols(&["WMON", "WSOL", "PEPE"])),
            ]),
            frequency: HashMap::from([
                (TradeFrequency::Scalp, symbols(&["WMON", "WSOL", "PEPE"])),
                (TradeFrequency::Swing, symbols(&["WOOL", "WETH"])),
                (TradeFrequency::Position, symbols(&["WBTC", "USDC", "USDT"])),
            ]),
            preferred_chain: Some(ChainPreference::Monad),
            chain_companions: symbols(&["WMON", "WOOL"]),
        };

        Self::new(tokens, affinities)
    }
}

impl Default for TokenCatalog {
    fn default() -> Self {
        Self::monad_testnet()
    }
}
