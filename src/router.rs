use std::sync::Arc;

use alloy_primitives::{hex, Address, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::contracts::{self, IUniswapV2Router02};
use crate::domain::{Executable, ProviderId, QuoteRequest, QuoteResult};
use crate::error::ProviderError;
use crate::providers::QuoteProvider;
use crate::rpc::ChainReader;
use crate::time::deadline_after;
use crate::units;

/// Whether to confirm each hop has a pool before asking the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PairCheck {
    /// Call `getAmountsOut` directly; a missing pool surfaces as a revert.
    Skip,
    /// Query `getPair` for every hop and fail before touching the router.
    FailFast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapTxSettings {
    pub slippage_bps: u64,
    pub deadline_secs: u64,
}

#[derive(Debug, Clone)]
pub struct RouterSettings {
    pub router: Address,
    pub factory: Address,
    pub wrapped_native: Address,
    pub quote_stable: Address,
    pub native_decimals: u8,
    pub pair_check: PairCheck,
    /// When set, quotes also carry `swapExactETHForTokens` calldata.
    pub swap_tx: Option<SwapTxSettings>,
}

/// Heuristic route from the wrapped native coin to `buy_token`, always via the
/// quote stable. Pool existence is not checked here.
pub fn resolve_path(buy_token: Address, wrapped_native: Address, quote_stable: Address) -> Vec<Address> {
    if buy_token == quote_stable {
        vec![wrapped_native, quote_stable]
    } else {
        vec![wrapped_native, quote_stable, buy_token]
    }
}

pub fn min_amount_out(amount: U256, slippage_bps: u64) -> U256 {
    let bps = U256::from(10_000u64);
    let keep = U256::from(10_000u64.saturating_sub(slippage_bps));
    amount
        .checked_mul(keep)
        .map(|v| v / bps)
        .unwrap_or_else(|| amount / bps * keep)
}

/// Constant-product router quotes over `getAmountsOut`.
pub struct RouterProvider {
    reader: Arc<dyn ChainReader>,
    settings: RouterSettings,
}

impl RouterProvider {
    pub fn new(reader: Arc<dyn ChainReader>, settings: RouterSettings) -> Self {
        Self { reader, settings }
    }

    async fn verify_path(&self, path: &[Address]) -> Result<(), ProviderError> {
        for hop in path.windows(2) {
            let pair = self.reader.get_pair(self.settings.factory, hop[0], hop[1]).await?;
            if pair.is_none() {
                return Err(ProviderError::Unavailable(format!("no pool for {}/{}", hop[0], hop[1])));
            }
        }
        Ok(())
    }

    fn swap_tx(
        &self,
        settings: SwapTxSettings,
        req: &QuoteRequest,
        path: &[Address],
        buy_amount: U256,
    ) -> Result<Executable, ProviderError> {
        let taker = contracts::parse_address(&req.taker_address)
            .ok_or_else(|| ProviderError::Unavailable(format!("taker `{}` is not an address", req.taker_address)))?;
        let call = IUniswapV2Router02::swapExactETHForTokensCall {
            amountOutMin: min_amount_out(buy_amount, settings.slippage_bps),
            path: path.to_vec(),
            to: taker,
            deadline: U256::from(deadline_after(settings.deadline_secs)),
        };
        Ok(Executable {
            to: self.settings.router.to_string(),
            data: hex::encode_prefixed(call.abi_encode()),
            value: req.sell_amount,
        })
    }
}

#[async_trait]
impl QuoteProvider for RouterProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OnChainRouter
    }

    async fn quote(&self, req: &QuoteRequest) -> Result<QuoteResult, ProviderError> {
        let s = &self.settings;
        let buy_token = contracts::parse_address(&req.buy_token)
            .ok_or_else(|| ProviderError::Unavailable(format!("buy token `{}` is not an address", req.buy_token)))?;
        let path = resolve_path(buy_token, s.wrapped_native, s.quote_stable);
        debug!(?path, pair_check = ?s.pair_check, "router.quote");

        if s.pair_check == PairCheck::FailFast {
            self.verify_path(&path).await?;
        }

        let (amounts, buy_decimals) = tokio::join!(
            self.reader.get_amounts_out(s.router, req.sell_amount, &path),
            self.reader.decimals(buy_token),
        );
        let amounts = amounts?;
        if amounts.len() != path.len() {
            return Err(ProviderError::Malformed(format!(
                "getAmountsOut returned {} amounts for a {}-hop path",
                amounts.len(),
                path.len()
            )));
        }
        let buy_amount = amounts.last().copied().unwrap_or_default();
        let buy_decimals = buy_decimals.unwrap_or_else(|err| {
            warn!(token = %buy_token, error = %err, "router.decimals_unavailable");
            18
        });

        let executable = match s.swap_tx {
            Some(settings) => Some(self.swap_tx(settings, req, &path, buy_amount)?),
            None => None,
        };

        Ok(QuoteResult {
            price: units::price(req.sell_amount, s.native_decimals, buy_amount, buy_decimals),
            buy_amount,
            sell_amount: req.sell_amount,
            provider: ProviderId::OnChainRouter,
            executable,
            estimated_gas: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub pair: Address,
    pub token0: Address,
    pub token1: Address,
    pub symbol0: String,
    pub symbol1: String,
    /// Human units.
    pub reserve0: String,
    pub reserve1: String,
}

async fn snapshot(reader: &dyn ChainReader, pair: Address) -> Result<PoolSnapshot, ProviderError> {
    let (t0, t1) = tokio::join!(reader.token0(pair), reader.token1(pair));
    let (token0, token1) = (t0?, t1?);
    let reserves = reader.get_reserves(pair).await?;
    let (sym0, dec0, sym1, dec1) = tokio::join!(
        reader.symbol(token0),
        reader.decimals(token0),
        reader.symbol(token1),
        reader.decimals(token1),
    );
    Ok(PoolSnapshot {
        reserve0: units::format_units(reserves.reserve0, dec0?),
        reserve1: units::format_units(reserves.reserve1, dec1?),
        symbol0: sym0?,
        symbol1: sym1?,
        pair,
        token0,
        token1,
    })
}

/// Lists the factory pools among every pair of `candidates`.
///
/// A pool whose details cannot be read is skipped; a failing `getPair` aborts.
pub async fn scan_pools(
    reader: &dyn ChainReader,
    factory: Address,
    candidates: &[Address],
) -> Result<Vec<PoolSnapshot>, ProviderError> {
    let mut pairs = Vec::new();
    for (i, a) in candidates.iter().enumerate() {
        for b in &candidates[i + 1..] {
            if let Some(pair) = reader.get_pair(factory, *a, *b).await? {
                pairs.push(pair);
            }
        }
    }

    let mut pools = Vec::with_capacity(pairs.len());
    for pair in pairs {
        match snapshot(reader, pair).await {
            Ok(pool) => pools.push(pool),
            Err(err) => warn!(%pair, error = %err, "router.pool_snapshot_failed"),
        }
    }
    Ok(pools)
}
