use alloy_primitives::Address;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::aggregator::ensure_slippage_bounds;
use crate::catalog;
use crate::contracts;
use crate::domain::SurveyAnswer;
use crate::router::PairCheck;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Chain
    pub chain_id: u64,
    pub chain_name: String,
    pub native_symbol: String,
    pub native_decimals: u8,
    pub rpc_url: String,

    // Aggregator
    pub zeroex_base_url: String,
    #[serde(skip_serializing)]
    pub zeroex_api_key: Option<String>,

    // Router / addresses
    pub router_address: Address,
    pub factory_address: Address,
    pub wrapped_native_address: Address,
    pub quote_stable_address: Address,
    pub pair_check: PairCheck,
    pub router_execution: bool,

    // Pipeline
    pub provider_timeout_ms: u64,
    pub synthetic_rate: f64,
    pub demo_fallback: bool,
    pub auto_switch_network: bool,

    // Execution
    pub dry_run: bool,
    pub slippage_bps: u64,
    pub max_slippage_bps: u64,
    pub swap_deadline_secs: u64,
    pub taker_address: Option<String>,
    pub sell_amount: Option<String>,
    pub swap_execute: bool,

    // Runtime
    pub log_json: bool,
    pub scan_pools: bool,
    /// From `SURVEY_RISK`, `SURVEY_HORIZON`, `SURVEY_VIBE` and the optional
    /// `SURVEY_*` fields; `None` when no survey key is set.
    pub survey: Option<SurveyAnswer>,
}

const SURVEY_KEYS: [&str; 7] = ["risk", "horizon", "vibe", "sector", "volatility", "frequency", "chain"];

fn parse_bool(raw: Option<String>, default: bool) -> bool {
    match raw.map(|s| s.trim().to_lowercase()) {
        None => default,
        Some(v) if v.is_empty() => default,
        Some(v) if v == "1" || v == "true" || v == "yes" || v == "y" || v == "on" => true,
        Some(v) if v == "0" || v == "false" || v == "no" || v == "n" || v == "off" => false,
        Some(_) => default,
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source; unset or unparsable
    /// values fall back to the Monad testnet defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let string = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());
        let flag = |key: &str, default: bool| parse_bool(var(key), default);
        let address = |key: &str, default: &str| -> Result<Address> {
            let raw = string(key, default);
            contracts::parse_address(&raw).ok_or_else(|| anyhow!("{key} `{raw}` is not an address"))
        };

        // Chain
        let chain_id = var("CHAIN_ID").and_then(|v| v.parse().ok()).unwrap_or(catalog::MONAD_CHAIN_ID);
        let chain_name = string("CHAIN_NAME", "Monad Testnet");
        let native_symbol = string("NATIVE_SYMBOL", "MON");
        let native_decimals = var("NATIVE_DECIMALS").and_then(|v| v.parse().ok()).unwrap_or(18);
        let rpc_url = var("MONAD_RPC")
            .or_else(|| var("RPC_URL"))
            .unwrap_or_else(|| "https://testnet-rpc.monad.xyz".to_string());

        // Aggregator
        let zeroex_base_url = string("ZEROEX_BASE", "https://api.0x.org");
        let zeroex_api_key = var("ZEROEX_API_KEY");

        // Router
        let router_address = address("ROUTER_ADDRESS", catalog::UNISWAP_V2_ROUTER)?;
        let factory_address = address("FACTORY_ADDRESS", catalog::UNISWAP_V2_FACTORY)?;
        let wrapped_native_address = address("WRAPPED_NATIVE_ADDRESS", catalog::WMON)?;
        let quote_stable_address = address("QUOTE_STABLE_ADDRESS", catalog::USDC)?;
        let pair_check = if flag("ROUTER_PAIR_CHECK", false) {
            PairCheck::FailFast
        } else {
            PairCheck::Skip
        };
        let router_execution = flag("ROUTER_EXECUTION", false);

        // Pipeline
        let provider_timeout_ms = var("PROVIDER_TIMEOUT_MS").and_then(|v| v.parse().ok()).unwrap_or(8_000);
        let synthetic_rate = var("SYNTHETIC_RATE").and_then(|v| v.parse::<f64>().ok()).unwrap_or(1800.0);
        let demo_fallback = flag("DEMO_FALLBACK", true);
        let auto_switch_network = flag("AUTO_SWITCH_NETWORK", true);

        if provider_timeout_ms == 0 {
            return Err(anyhow!("PROVIDER_TIMEOUT_MS must be positive"));
        }
        if !synthetic_rate.is_finite() || synthetic_rate <= 0.0 {
            return Err(anyhow!("SYNTHETIC_RATE must be a positive number"));
        }

        // Execution
        let dry_run = flag("DRY_RUN", true);
        let slippage_bps = var("SLIPPAGE_BPS").and_then(|v| v.parse().ok()).unwrap_or(50);
        let max_slippage_bps = var("MAX_SLIPPAGE_BPS").and_then(|v| v.parse().ok()).unwrap_or(100);
        ensure_slippage_bounds(slippage_bps, max_slippage_bps)?;
        let swap_deadline_secs = var("SWAP_DEADLINE_SECS").and_then(|v| v.parse().ok()).unwrap_or(1_200);
        let taker_address = var("TAKER_ADDRESS");
        let sell_amount = var("SELL_AMOUNT");
        let swap_execute = flag("SWAP_EXECUTE", false);

        // Runtime
        let log_json = var("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json"));
        let scan_pools = flag("SCAN_POOLS", false);
        let survey_var = |key: &str| var(&format!("SURVEY_{}", key.to_uppercase()));
        let survey = if SURVEY_KEYS.iter().any(|&k| survey_var(k).is_some()) {
            Some(SurveyAnswer::from_lookup(survey_var)?)
        } else {
            None
        };

        Ok(Self {
            chain_id,
            chain_name,
            native_symbol,
            native_decimals,
            rpc_url,
            zeroex_base_url,
            zeroex_api_key,
            router_address,
            factory_address,
            wrapped_native_address,
            quote_stable_address,
            pair_check,
            router_execution,
            provider_timeout_ms,
            synthetic_rate,
            demo_fallback,
            auto_switch_network,
            dry_run,
            slippage_bps,
            max_slippage_bps,
            swap_deadline_secs,
            taker_address,
            sell_amount,
            swap_execute,
            log_json,
            scan_pools,
            survey,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Risk, TradeFrequency};
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_target_monad_testnet() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.chain_id, 10143);
        assert_eq!(cfg.native_symbol, "MON");
        assert_eq!(cfg.zeroex_base_url, "https://api.0x.org");
        assert!(cfg.zeroex_api_key.is_none());
        assert_eq!(cfg.pair_check, PairCheck::Skip);
        assert!(cfg.dry_run);
        assert!(cfg.demo_fallback);
        assert!(!cfg.router_execution);
        assert!(!cfg.scan_pools);
        assert!(!cfg.swap_execute);
        assert!(cfg.sell_amount.is_none());
        assert!(cfg.survey.is_none());
        assert_eq!(cfg.synthetic_rate, 1800.0);
        assert_eq!(cfg.wrapped_native_address, contracts::parse_address(catalog::WMON).unwrap());
    }

    #[test]
    fn synthetic_rate_parses_as_float() {
        let cfg = load(&[("SYNTHETIC_RATE", "2000.5")]).unwrap();
        assert_eq!(cfg.synthetic_rate, 2000.5);
        assert!(load(&[("SYNTHETIC_RATE", "inf")]).is_err());
    }

    #[test]
    fn run_switches_share_bool_parsing() {
        let cfg = load(&[
            ("SCAN_POOLS", "Y"),
            ("SWAP_EXECUTE", "on"),
            ("SELL_AMOUNT", "0.25"),
        ])
        .unwrap();
        assert!(cfg.scan_pools);
        assert!(cfg.swap_execute);
        assert_eq!(cfg.sell_amount.as_deref(), Some("0.25"));
        assert!(!load(&[("SWAP_EXECUTE", "off")]).unwrap().swap_execute);
    }

    #[test]
    fn survey_reads_prefixed_keys() {
        let cfg = load(&[
            ("SURVEY_RISK", "high"),
            ("SURVEY_HORIZON", "short"),
            ("SURVEY_VIBE", "degen"),
            ("SURVEY_FREQUENCY", "scalp"),
        ])
        .unwrap();
        let survey = cfg.survey.unwrap();
        assert_eq!(survey.risk, Risk::High);
        assert_eq!(survey.trade_frequency, Some(TradeFrequency::Scalp));
        assert!(survey.sector.is_none());
    }

    #[test]
    fn partial_survey_is_rejected() {
        assert!(load(&[("SURVEY_RISK", "low")]).is_err());
    }

    #[test]
    fn address_overrides_must_be_addresses() {
        assert!(load(&[("ROUTER_ADDRESS", "router")]).is_err());
        let lower = catalog::WMON.to_ascii_lowercase();
        let cfg = load(&[("FACTORY_ADDRESS", lower.as_str())]).unwrap();
        assert_eq!(cfg.factory_address, cfg.wrapped_native_address);
    }

    #[test]
    fn overrides_apply() {
        let cfg = load(&[
            ("ZEROEX_BASE", "https://swap-api.monad.xyz"),
            ("ZEROEX_API_KEY", "k"),
            ("ROUTER_PAIR_CHECK", "yes"),
            ("PROVIDER_TIMEOUT_MS", "250"),
            ("DRY_RUN", "off"),
            ("LOG_FORMAT", "JSON"),
        ])
        .unwrap();
        assert_eq!(cfg.zeroex_base_url, "https://swap-api.monad.xyz");
        assert_eq!(cfg.zeroex_api_key.as_deref(), Some("k"));
        assert_eq!(cfg.pair_check, PairCheck::FailFast);
        assert_eq!(cfg.provider_timeout_ms, 250);
        assert!(!cfg.dry_run);
        assert!(cfg.log_json);
    }

    #[test]
    fn blank_api_key_is_absent() {
        assert!(load(&[("ZEROEX_API_KEY", "  ")]).unwrap().zeroex_api_key.is_none());
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(load(&[("PROVIDER_TIMEOUT_MS", "0")]).is_err());
        assert!(load(&[("SYNTHETIC_RATE", "-1")]).is_err());
        assert!(load(&[("SLIPPAGE_BPS", "500")]).is_err());
    }

    #[test]
    fn api_key_is_not_serialized() {
        let cfg = load(&[("ZEROEX_API_KEY", "secret")]).unwrap();
        assert!(!serde_json::to_string(&cfg).unwrap().contains("secret"));
    }
}
