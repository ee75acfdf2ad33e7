use std::time::Duration;

use alloy_primitives::U256;
use anyhow::Result;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, ValidationError};

/// 0x-style swap aggregator client.
#[derive(Clone)]
pub struct AggregatorClient {
    base_url: String,
    api_key: Option<String>,
    http: Client,
}

impl AggregatorClient {
    pub fn new(base_url: String, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            http: Client::builder().timeout(timeout).build()?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn quote(&self, req: &AggregatorQuoteRequest) -> Result<AggregatorQuote, ProviderError> {
        let url = format!("{}/swap/v1/quote", self.base_url);
        let mut builder = self
            .http
            .get(url)
            .query(req)
            .header(ACCEPT, "application/json");
        // public endpoints work without a key
        if let Some(key) = self.api_key.as_deref() {
            builder = builder.header("0x-api-key", key);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ProviderError::Malformed(e.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatorQuoteRequest {
    /// Native symbol (e.g. `MON`) or an ERC20 address.
    pub sell_token: String,
    pub buy_token: String,
    /// Smallest units, decimal string.
    pub sell_amount: String,
    pub taker_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatorQuote {
    pub price: String,
    #[serde(default)]
    pub guaranteed_price: Option<String>,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub value: Option<String>,
    pub buy_amount: String,
    pub sell_amount: String,
    #[serde(default)]
    pub allowance_target: Option<String>,
    #[serde(default)]
    pub sources: Vec<LiquiditySource>,
    /// Some deployments send a number, others a string.
    #[serde(default)]
    pub estimated_gas: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquiditySource {
    pub name: String,
    pub proportion: String,
}

impl AggregatorQuote {
    pub fn estimated_gas(&self) -> Option<u64> {
        match self.estimated_gas.as_ref()? {
            serde_json::Value::Number(n) => n.as_u64(),
            serde_json::Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

/// Decimal integer string as sent by the API; full `uint256` range.
pub fn parse_amount(raw: &str, field: &str) -> Result<U256, ProviderError> {
    raw.trim()
        .parse::<U256>()
        .map_err(|_| ProviderError::Malformed(format!("{field} is not an integer: `{raw}`")))
}

pub fn ensure_slippage_bounds(slippage_bps: u64, max_slippage_bps: u64) -> Result<(), ValidationError> {
    if slippage_bps == 0 || slippage_bps > max_slippage_bps || max_slippage_bps >= 10_000 {
        return Err(ValidationError::InvalidSlippage {
            bps: slippage_bps,
            max: max_slippage_bps,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_api_field_names() {
        let req = AggregatorQuoteRequest {
            sell_token: "MON".into(),
            buy_token: "0xabc".into(),
            sell_amount: "1000".into(),
            taker_address: "0xdef".into(),
            chain_id: None,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["sellToken"], "MON");
        assert_eq!(v["takerAddress"], "0xdef");
        assert!(v.get("chainId").is_none());
    }

    #[test]
    fn quote_tolerates_missing_optional_fields() {
        let q: AggregatorQuote =
            serde_json::from_str(r#"{"price":"1.5","buyAmount":"15","sellAmount":"10","estimatedGas":"21000"}"#).unwrap();
        assert!(q.to.is_empty());
        assert_eq!(q.estimated_gas(), Some(21_000));
        assert!(q.sources.is_empty());
    }

    #[test]
    fn slippage_bounds() {
        assert!(ensure_slippage_bounds(50, 100).is_ok());
        assert!(ensure_slippage_bounds(0, 100).is_err());
        assert_eq!(
            ensure_slippage_bounds(150, 100),
            Err(ValidationError::InvalidSlippage { bps: 150, max: 100 })
        );
        assert!(ensure_slippage_bounds(50, 10_000).is_err());
    }

    #[test]
    fn amounts_must_be_integers() {
        assert_eq!(parse_amount("42", "buyAmount").unwrap(), U256::from(42u64));
        let beyond_u128 = "340282366920938463463374607431768211456";
        assert_eq!(parse_amount(beyond_u128, "buyAmount").unwrap(), U256::from(1u64) << 128);
        assert!(matches!(parse_amount("4.2", "buyAmount"), Err(ProviderError::Malformed(_))));
    }
}
