use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::contracts::{IUniswapV2Factory, IUniswapV2Pair, IUniswapV2Router02, IERC20};
use crate::error::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reserves {
    pub reserve0: U256,
    pub reserve1: U256,
    pub block_timestamp_last: u32,
}

/// Read-only view of the AMM factory, pairs, router and ERC20 tokens.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// `None` when the factory has no pair for the two tokens.
    async fn get_pair(&self, factory: Address, token_a: Address, token_b: Address) -> Result<Option<Address>, ProviderError>;
    async fn get_reserves(&self, pair: Address) -> Result<Reserves, ProviderError>;
    async fn token0(&self, pair: Address) -> Result<Address, ProviderError>;
    async fn token1(&self, pair: Address) -> Result<Address, ProviderError>;
    async fn get_amounts_out(&self, router: Address, amount_in: U256, path: &[Address]) -> Result<Vec<U256>, ProviderError>;
    async fn symbol(&self, token: Address) -> Result<String, ProviderError>;
    async fn decimals(&self, token: Address) -> Result<u8, ProviderError>;
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: Option<Bytes>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// JSON-RPC `eth_call` client.
pub struct RpcClient {
    url: String,
    http: Client,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(url: String, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url,
            http,
            next_id: AtomicU64::new(1),
        })
    }

    pub async fn eth_call(&self, to: Address, data: Vec<u8>) -> Result<Bytes, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "eth_call",
            "params": [{ "to": to, "data": Bytes::from(data) }, "latest"],
        });
        debug!(id, %to, "rpc.eth_call");

        let resp = self.http.post(&self.url).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: RpcEnvelope = resp.json().await?;
        if let Some(err) = envelope.error {
            return Err(ProviderError::Revert(format!("{} (code {})", err.message, err.code)));
        }
        envelope
            .result
            .ok_or_else(|| ProviderError::Malformed("eth_call returned no result".into()))
    }

    async fn call<C: SolCall + Send>(&self, to: Address, call: C) -> Result<C::Return, ProviderError> {
        let out = self.eth_call(to, call.abi_encode()).await?;
        Ok(C::abi_decode_returns(&out)?)
    }
}

/// ERC20 `symbol()`; tolerates legacy tokens that return `bytes32`.
pub fn decode_symbol(out: &[u8]) -> Result<String, ProviderError> {
    match IERC20::symbolCall::abi_decode_returns(out) {
        Ok(symbol) => Ok(symbol),
        Err(_) if out.len() == 32 => Ok(String::from_utf8_lossy(out).trim_end_matches('\0').to_string()),
        Err(err) => Err(err.into()),
    }
}

#[async_trait]
impl ChainReader for RpcClient {
    async fn get_pair(&self, factory: Address, token_a: Address, token_b: Address) -> Result<Option<Address>, ProviderError> {
        let pair = self
            .call(
                factory,
                IUniswapV2Factory::getPairCall {
                    tokenA: token_a,
                    tokenB: token_b,
                },
            )
            .await?;
        Ok((!pair.is_zero()).then_some(pair))
    }

    async fn get_reserves(&self, pair: Address) -> Result<Reserves, ProviderError> {
        let r = self.call(pair, IUniswapV2Pair::getReservesCall {}).await?;
        Ok(Reserves {
            reserve0: U256::from(r.reserve0),
            reserve1: U256::from(r.reserve1),
            block_timestamp_last: r.blockTimestampLast,
        })
    }

    async fn token0(&self, pair: Address) -> Result<Address, ProviderError> {
        self.call(pair, IUniswapV2Pair::token0Call {}).await
    }

    async fn token1(&self, pair: Address) -> Result<Address, ProviderError> {
        self.call(pair, IUniswapV2Pair::token1Call {}).await
    }

    async fn get_amounts_out(&self, router: Address, amount_in: U256, path: &[Address]) -> Result<Vec<U256>, ProviderError> {
        self.call(
            router,
            IUniswapV2Router02::getAmountsOutCall {
                amountIn: amount_in,
                path: path.to_vec(),
            },
        )
        .await
    }

    async fn symbol(&self, token: Address) -> Result<String, ProviderError> {
        let out = self.eth_call(token, IERC20::symbolCall {}.abi_encode()).await?;
        decode_symbol(&out)
    }

    async fn decimals(&self, token: Address) -> Result<u8, ProviderError> {
        self.call(token, IERC20::decimalsCall {}).await
    }
}
