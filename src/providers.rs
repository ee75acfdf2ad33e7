use std::collections::HashMap;

use alloy_primitives::U256;
use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::aggregator::{parse_amount, AggregatorClient, AggregatorQuoteRequest};
use crate::domain::{Executable, ProviderId, QuoteRequest, QuoteResult};
use crate::error::ProviderError;
use crate::units;

/// A source of price quotes, and optionally of executable swap transactions.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    fn id(&self) -> ProviderId;
    async fn quote(&self, req: &QuoteRequest) -> Result<QuoteResult, ProviderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SellAsset {
    Native,
    Wrapped,
}

/// Aggregator quotes selling either the native coin or its wrapped ERC20.
pub struct AggregatorProvider {
    client: AggregatorClient,
    sell_asset: SellAsset,
    sell_token: String,
}

impl AggregatorProvider {
    pub fn native(client: AggregatorClient, native_symbol: String) -> Self {
        Self {
            client,
            sell_asset: SellAsset::Native,
            sell_token: native_symbol,
        }
    }

    pub fn wrapped(client: AggregatorClient, wrapped_address: String) -> Self {
        Self {
            client,
            sell_asset: SellAsset::Wrapped,
            sell_token: wrapped_address,
        }
    }
}

#[async_trait]
impl QuoteProvider for AggregatorProvider {
    fn id(&self) -> ProviderId {
        match self.sell_asset {
            SellAsset::Native => ProviderId::AggregatorNative,
            SellAsset::Wrapped => ProviderId::AggregatorWrapped,
        }
    }

    async fn quote(&self, req: &QuoteRequest) -> Result<QuoteResult, ProviderError> {
        let q = self
            .client
            .quote(&AggregatorQuoteRequest {
                sell_token: self.sell_token.clone(),
                buy_token: req.buy_token.clone(),
                sell_amount: req.sell_amount.to_string(),
                taker_address: req.taker_address.clone(),
                chain_id: Some(req.chain_id),
            })
            .await?;

        let buy_amount = parse_amount(&q.buy_amount, "buyAmount")?;
        let sell_amount = parse_amount(&q.sell_amount, "sellAmount")?;

        // Native sells carry the amount as tx value; wrapped sells move the ERC20 instead.
        let value = match q.value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => parse_amount(v, "value")?,
            None => match self.sell_asset {
                SellAsset::Native => req.sell_amount,
                SellAsset::Wrapped => U256::ZERO,
            },
        };
        let executable = (!q.to.is_empty() && !q.data.is_empty()).then(|| Executable {
            to: q.to.clone(),
            data: q.data.clone(),
            value,
        });

        Ok(QuoteResult {
            price: q.price.clone(),
            buy_amount,
            sell_amount,
            provider: self.id(),
            executable,
            estimated_gas: q.estimated_gas(),
        })
    }
}

/// Last resort: a fixed-rate, clearly non-binding estimate.
pub struct SyntheticFallback {
    rate: Decimal,
    sell_decimals: u8,
    buy_decimals: HashMap<String, u8>,
}

const DEFAULT_DECIMALS: u8 = 18;

impl SyntheticFallback {
    /// `rate` is buy-token units per one sell-token unit.
    pub fn new(rate: Decimal, sell_decimals: u8, buy_decimals: HashMap<String, u8>) -> Self {
        Self {
            rate,
            sell_decimals,
            buy_decimals,
        }
    }

    fn decimals_for(&self, token: &str) -> u8 {
        self.buy_decimals
            .get(&token.to_ascii_lowercase())
            .copied()
            .unwrap_or(DEFAULT_DECIMALS)
    }
}

#[async_trait]
impl QuoteProvider for SyntheticFallback {
    fn id(&self) -> ProviderId {
        ProviderId::SyntheticFallback
    }

    async fn quote(&self, req: &QuoteRequest) -> Result<QuoteResult, ProviderError> {
        if self.rate <= Decimal::ZERO {
            return Err(ProviderError::Unavailable("synthetic rate is not positive".into()));
        }
        let buy_decimals = self.decimals_for(&req.buy_token);
        let buy_amount = units::to_decimal(req.sell_amount, self.sell_decimals)
            .and_then(|sell| sell.checked_mul(self.rate))
            .and_then(|est| units::from_decimal(est, buy_decimals))
            .ok_or_else(|| ProviderError::Unavailable("synthetic estimate out of range".into()))?;

        Ok(QuoteResult {
            price: self.rate.normalize().to_string(),
            buy_amount,
            sell_amount: req.sell_amount,
            provider: ProviderId::SyntheticFallback,
            executable: None,
            estimated_gas: None,
        })
    }
}
