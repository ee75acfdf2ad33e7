use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, U256};
use anyhow::{anyhow, Result};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::aggregator::AggregatorClient;
use crate::catalog::TokenCatalog;
use crate::config::Config;
use crate::contracts;
use crate::domain::{
    PipelineOutcome, ProviderFailure, ProviderId, QuoteRequest, QuoteResult, SwapReceipt, TxRequest,
};
use crate::error::{PipelineError, ProviderError, ValidationError};
use crate::providers::{AggregatorProvider, QuoteProvider, SyntheticFallback};
use crate::router::{RouterProvider, RouterSettings, SwapTxSettings};
use crate::rpc::{ChainReader, RpcClient};
use crate::units;
use crate::wallet::WalletSession;

/// Gas for a plain native transfer.
pub const DEMO_TRANSFER_GAS: u64 = 21_000;

/// The only assets a pipeline sells: the native coin, by symbol, or its
/// wrapped ERC20.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeAsset {
    pub symbol: String,
    pub wrapped: Address,
}

impl NativeAsset {
    pub fn new(symbol: impl Into<String>, wrapped: Address) -> Self {
        Self {
            symbol: symbol.into(),
            wrapped,
        }
    }

    pub fn accepts(&self, token: &str) -> bool {
        token.trim().eq_ignore_ascii_case(&self.symbol) || contracts::parse_address(token) == Some(self.wrapped)
    }
}

/// Tries quote/execution sources strictly in priority order and stops at the
/// first one that delivers.
///
/// Provider `i` running is the `Pending(i)` state; returning `Success` or
/// `AllProvidersFailed` are the terminal states. Providers never run
/// concurrently, and at most one transaction is submitted per `execute_swap`.
pub struct FallbackPipeline {
    chain_id: u64,
    native: NativeAsset,
    provider_timeout: Duration,
    auto_switch_network: bool,
    demo_fallback: bool,
    quote_chain: Vec<Arc<dyn QuoteProvider>>,
    execution_chain: Vec<Arc<dyn QuoteProvider>>,
    submission: Mutex<()>,
}

impl FallbackPipeline {
    pub fn new(chain_id: u64, native: NativeAsset, provider_timeout: Duration) -> Self {
        Self {
            chain_id,
            native,
            provider_timeout,
            auto_switch_network: true,
            demo_fallback: true,
            quote_chain: Vec::new(),
            execution_chain: Vec::new(),
            submission: Mutex::new(()),
        }
    }

    pub fn with_quote_chain(mut self, providers: Vec<Arc<dyn QuoteProvider>>) -> Self {
        self.quote_chain = providers;
        self
    }

    pub fn with_execution_chain(mut self, providers: Vec<Arc<dyn QuoteProvider>>) -> Self {
        self.execution_chain = providers;
        self
    }

    pub fn with_auto_switch_network(mut self, enabled: bool) -> Self {
        self.auto_switch_network = enabled;
        self
    }

    pub fn with_demo_fallback(mut self, enabled: bool) -> Self {
        self.demo_fallback = enabled;
        self
    }

    /// Standard chain: aggregator (native) -> aggregator (wrapped) -> router -> synthetic.
    pub fn from_config(cfg: &Config, catalog: &TokenCatalog) -> Result<Self> {
        let timeout = Duration::from_millis(cfg.provider_timeout_ms);
        let native_asset = NativeAsset::new(cfg.native_symbol.clone(), cfg.wrapped_native_address);
        let aggregator = AggregatorClient::new(cfg.zeroex_base_url.clone(), cfg.zeroex_api_key.clone(), timeout)?;
        let reader: Arc<dyn ChainReader> = Arc::new(RpcClient::new(cfg.rpc_url.clone(), timeout)?);

        let native: Arc<dyn QuoteProvider> =
            Arc::new(AggregatorProvider::native(aggregator.clone(), cfg.native_symbol.clone()));
        let wrapped: Arc<dyn QuoteProvider> =
            Arc::new(AggregatorProvider::wrapped(aggregator, cfg.wrapped_native_address.to_string()));
        let router: Arc<dyn QuoteProvider> = Arc::new(RouterProvider::new(
            reader,
            RouterSettings {
                router: cfg.router_address,
                factory: cfg.factory_address,
                wrapped_native: cfg.wrapped_native_address,
                quote_stable: cfg.quote_stable_address,
                native_decimals: cfg.native_decimals,
                pair_check: cfg.pair_check,
                swap_tx: cfg.router_execution.then_some(SwapTxSettings {
                    slippage_bps: cfg.slippage_bps,
                    deadline_secs: cfg.swap_deadline_secs,
                }),
            },
        ));
        let rate = units::decimal_from_f64(cfg.synthetic_rate)
            .ok_or_else(|| anyhow!("SYNTHETIC_RATE {} is not representable", cfg.synthetic_rate))?;
        let synthetic: Arc<dyn QuoteProvider> = Arc::new(SyntheticFallback::new(
            rate,
            cfg.native_decimals,
            catalog.decimals_by_address(),
        ));

        let mut execution_chain = vec![native.clone(), wrapped.clone()];
        if cfg.router_execution {
            execution_chain.push(router.clone());
        }

        Ok(Self::new(cfg.chain_id, native_asset, timeout)
            .with_quote_chain(vec![native, wrapped, router, synthetic])
            .with_execution_chain(execution_chain)
            .with_auto_switch_network(cfg.auto_switch_network)
            .with_demo_fallback(cfg.demo_fallback))
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn native_asset(&self) -> &NativeAsset {
        &self.native
    }

    pub async fn get_quote(&self, req: &QuoteRequest) -> Result<PipelineOutcome<QuoteResult>, PipelineError> {
        self.validate(req)?;
        self.ensure_chain(Some(req.chain_id))?;
        info!(buy_token = %req.buy_token, sell_amount = %req.sell_amount, "pipeline.get_quote");

        let mut failures = Vec::new();
        for provider in &self.quote_chain {
            match self.call(provider.as_ref(), req).await {
                Ok(quote) => {
                    if quote.is_binding() {
                        info!(provider = %quote.provider, price = %quote.price, buy_amount = %quote.buy_amount, "pipeline.quote_ok");
                    } else {
                        warn!(provider = %quote.provider, price = %quote.price, "pipeline.non_binding_estimate");
                    }
                    return Ok(PipelineOutcome::Success { result: quote, failures });
                }
                Err(error) => {
                    warn!(provider = %provider.id(), error = %error, "pipeline.provider_failed");
                    failures.push(ProviderFailure {
                        provider: provider.id(),
                        error,
                    });
                }
            }
        }

        error!(attempts = failures.len(), "pipeline.all_providers_failed");
        Ok(PipelineOutcome::AllProvidersFailed(failures))
    }

    /// Quote-then-submit through each executable source, then the demo transfer.
    ///
    /// Concurrent calls on one pipeline are serialized so a session never has
    /// two submissions in flight.
    pub async fn execute_swap(
        &self,
        req: &QuoteRequest,
        wallet: &dyn WalletSession,
    ) -> Result<PipelineOutcome<SwapReceipt>, PipelineError> {
        self.validate(req)?;
        self.ensure_chain(Some(req.chain_id))?;
        if !wallet.is_connected() {
            return Err(ValidationError::WalletNotConnected.into());
        }
        let wallet_address = wallet.address().ok_or(ValidationError::WalletNotConnected)?;
        if !wallet_address.eq_ignore_ascii_case(&req.taker_address) {
            return Err(ValidationError::TakerMismatch {
                taker: req.taker_address.clone(),
                wallet: wallet_address,
            }
            .into());
        }
        self.ensure_wallet_chain(wallet).await?;

        let _guard = self.submission.lock().await;
        info!(buy_token = %req.buy_token, sell_amount = %req.sell_amount, "pipeline.execute_swap");

        let mut failures = Vec::new();
        for provider in &self.execution_chain {
            match self.execute_with(provider.as_ref(), req, wallet).await {
                Ok(receipt) => {
                    info!(provider = %receipt.provider, tx = %receipt.tx_hash, "pipeline.swap_submitted");
                    return Ok(PipelineOutcome::Success { result: receipt, failures });
                }
                Err(error) => {
                    warn!(provider = %provider.id(), error = %error, "pipeline.execution_failed");
                    failures.push(ProviderFailure {
                        provider: provider.id(),
                        error,
                    });
                }
            }
        }

        if self.demo_fallback {
            match self.demo_transfer(req, wallet).await {
                Ok(receipt) => {
                    warn!(tx = %receipt.tx_hash, to = %req.buy_token, "pipeline.demo_transfer: not a swap");
                    return Ok(PipelineOutcome::Success { result: receipt, failures });
                }
                Err(error) => {
                    warn!(error = %error, "pipeline.demo_transfer_failed");
                    failures.push(ProviderFailure {
                        provider: ProviderId::DemoTransfer,
                        error,
                    });
                }
            }
        }

        error!(attempts = failures.len(), "pipeline.all_providers_failed");
        Ok(PipelineOutcome::AllProvidersFailed(failures))
    }

    async fn call(&self, provider: &dyn QuoteProvider, req: &QuoteRequest) -> Result<QuoteResult, ProviderError> {
        match tokio::time::timeout(self.provider_timeout, provider.quote(req)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.provider_timeout)),
        }
    }

    async fn execute_with(
        &self,
        provider: &dyn QuoteProvider,
        req: &QuoteRequest,
        wallet: &dyn WalletSession,
    ) -> Result<SwapReceipt, ProviderError> {
        let quote = self.call(provider, req).await?;
        if !quote.is_binding() {
            return Err(ProviderError::Unavailable("non-binding quote cannot be executed".into()));
        }
        let exe = quote
            .executable
            .as_ref()
            .ok_or_else(|| ProviderError::Unavailable("quote has no executable transaction".into()))?;

        // Submission is not bounded by the provider timeout: a dropped future
        // could still land on chain.
        let handle = wallet
            .submit_transaction(TxRequest::from(exe))
            .await
            .map_err(|e| ProviderError::Submission(e.to_string()))?;

        Ok(SwapReceipt {
            provider: quote.provider,
            tx_hash: handle.hash,
            quote: Some(quote),
        })
    }

    async fn demo_transfer(&self, req: &QuoteRequest, wallet: &dyn WalletSession) -> Result<SwapReceipt, ProviderError> {
        if contracts::parse_address(&req.buy_token).is_none() {
            return Err(ProviderError::Unavailable(format!(
                "buy token `{}` has no contract address",
                req.buy_token
            )));
        }
        let handle = wallet
            .submit_transaction(TxRequest {
                to: req.buy_token.clone(),
                data: None,
                value: req.sell_amount,
                gas_limit: Some(DEMO_TRANSFER_GAS),
            })
            .await
            .map_err(|e| ProviderError::Submission(e.to_string()))?;

        Ok(SwapReceipt {
            provider: ProviderId::DemoTransfer,
            tx_hash: handle.hash,
            quote: None,
        })
    }

    fn ensure_chain(&self, actual: Option<u64>) -> Result<(), PipelineError> {
        if actual == Some(self.chain_id) {
            return Ok(());
        }
        Err(PipelineError::NetworkMismatch {
            expected: self.chain_id,
            actual,
        })
    }

    async fn ensure_wallet_chain(&self, wallet: &dyn WalletSession) -> Result<(), PipelineError> {
        if wallet.chain_id() == Some(self.chain_id) {
            return Ok(());
        }
        if self.auto_switch_network {
            info!(from = ?wallet.chain_id(), to = self.chain_id, "pipeline.switch_network");
            if let Err(err) = wallet.switch_network(self.chain_id).await {
                warn!(error = %err, "pipeline.switch_network_failed");
            }
        }
        self.ensure_chain(wallet.chain_id())
    }

    fn validate(&self, req: &QuoteRequest) -> Result<(), ValidationError> {
        if req.sell_amount == U256::ZERO {
            return Err(ValidationError::ZeroAmount);
        }
        // every provider sells the native coin or its wrapped token
        if !self.native.accepts(&req.sell_token) {
            return Err(ValidationError::UnsupportedSellToken(req.sell_token.clone()));
        }
        if req.buy_token.trim().is_empty() {
            return Err(ValidationError::MissingBuyToken);
        }
        if req.taker_address.trim().is_empty() {
            return Err(ValidationError::MissingTaker);
        }
        Ok(())
    }
}
