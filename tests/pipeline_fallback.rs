use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use token_match::domain::{
    Executable, PipelineOutcome, ProviderId, QuoteRequest, QuoteResult, TxHandle, TxRequest,
};
use token_match::error::{NetworkSwitchError, PipelineError, ProviderError, ValidationError, WalletError};
use token_match::pipeline::{FallbackPipeline, NativeAsset, DEMO_TRANSFER_GAS};
use token_match::providers::{QuoteProvider, SyntheticFallback};
use token_match::wallet::WalletSession;

const CHAIN: u64 = 10143;
const TAKER: &str = "0x1111111111111111111111111111111111111111";
const USDC: &str = "0xf817257fed379853cDe0fa4F97AB987181B1E5Ea";
const WMON: &str = "0x760AfE86e5de5fa0Ee542fc7B7B713e1c5425701";

enum Behavior {
    Quote(QuoteResult),
    Fail(ProviderError),
    Hang,
}

struct FakeProvider {
    id: ProviderId,
    behavior: Behavior,
    calls: AtomicUsize,
}

impl FakeProvider {
    fn new(id: ProviderId, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            id,
            behavior,
            calls: AtomicUsize::new(0),
        })
    }

    fn ok(id: ProviderId) -> Arc<Self> {
        Self::new(id, Behavior::Quote(quote(id, None)))
    }

    fn executable(id: ProviderId, to: &str) -> Arc<Self> {
        let exe = Executable {
            to: to.into(),
            data: "0xdeadbeef".into(),
            value: U256::from(1_000u64),
        };
        Self::new(id, Behavior::Quote(quote(id, Some(exe))))
    }

    fn failing(id: ProviderId, error: ProviderError) -> Arc<Self> {
        Self::new(id, Behavior::Fail(error))
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteProvider for FakeProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    async fn quote(&self, _req: &QuoteRequest) -> Result<QuoteResult, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Quote(q) => Ok(q.clone()),
            Behavior::Fail(e) => Err(e.clone()),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Err(ProviderError::Transport("unreachable".into()))
            }
        }
    }
}

fn quote(provider: ProviderId, executable: Option<Executable>) -> QuoteResult {
    QuoteResult {
        price: "1800".into(),
        buy_amount: U256::from(1_800_000u64),
        sell_amount: U256::from(1_000u64),
        provider,
        executable,
        estimated_gas: None,
    }
}

fn request() -> QuoteRequest {
    QuoteRequest {
        sell_token: "MON".into(),
        buy_token: USDC.into(),
        sell_amount: U256::from(1_000u64),
        taker_address: TAKER.into(),
        chain_id: CHAIN,
    }
}

fn http_500() -> ProviderError {
    ProviderError::Status {
        status: 500,
        body: "boom".into(),
    }
}

fn chain(providers: &[&Arc<FakeProvider>]) -> Vec<Arc<dyn QuoteProvider>> {
    providers
        .iter()
        .map(|p| Arc::clone(*p) as Arc<dyn QuoteProvider>)
        .collect()
}

fn native() -> NativeAsset {
    NativeAsset::new("MON", WMON.parse::<Address>().unwrap())
}

fn pipeline() -> FallbackPipeline {
    FallbackPipeline::new(CHAIN, native(), Duration::from_millis(200))
}

struct FakeWallet {
    address: String,
    chain_id: std::sync::Mutex<Option<u64>>,
    can_switch: bool,
    reject_to: Vec<String>,
    delay: Duration,
    sent: Mutex<Vec<TxRequest>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeWallet {
    fn new() -> Self {
        Self {
            address: TAKER.into(),
            chain_id: std::sync::Mutex::new(Some(CHAIN)),
            can_switch: true,
            reject_to: Vec::new(),
            delay: Duration::ZERO,
            sent: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    fn on_chain(self, chain_id: Option<u64>) -> Self {
        *self.chain_id.lock().unwrap() = chain_id;
        self
    }

    fn rejecting(mut self, to: &str) -> Self {
        self.reject_to.push(to.to_string());
        self
    }

    async fn sent(&self) -> Vec<TxRequest> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl WalletSession for FakeWallet {
    fn is_connected(&self) -> bool {
        true
    }

    fn address(&self) -> Option<String> {
        Some(self.address.clone())
    }

    fn chain_id(&self) -> Option<u64> {
        *self.chain_id.lock().unwrap()
    }

    async fn submit_transaction(&self, tx: TxRequest) -> Result<TxHandle, WalletError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.reject_to.contains(&tx.to) {
            return Err(WalletError::Rejected("execution reverted".into()));
        }
        let mut sent = self.sent.lock().await;
        sent.push(tx);
        Ok(TxHandle {
            hash: format!("0x{:064x}", sent.len()),
        })
    }

    async fn switch_network(&self, chain_id: u64) -> Result<(), NetworkSwitchError> {
        if !self.can_switch {
            return Err(NetworkSwitchError {
                chain_id,
                reason: "user rejected".into(),
            });
        }
        *self.chain_id.lock().unwrap() = Some(chain_id);
        Ok(())
    }
}

#[tokio::test]
async fn router_answers_after_both_aggregators_fail() {
    let native = FakeProvider::failing(ProviderId::AggregatorNative, http_500());
    let wrapped = FakeProvider::failing(ProviderId::AggregatorWrapped, ProviderError::Transport("dns".into()));
    let router = FakeProvider::ok(ProviderId::OnChainRouter);
    let synthetic = FakeProvider::ok(ProviderId::SyntheticFallback);
    let pipeline = pipeline().with_quote_chain(chain(&[&native, &wrapped, &router, &synthetic]));

    let outcome = pipeline.get_quote(&request()).await.unwrap();

    let PipelineOutcome::Success { result, failures } = outcome else {
        panic!("expected a quote");
    };
    assert_eq!(result.provider, ProviderId::OnChainRouter);
    assert!(result.is_binding());
    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0].provider, ProviderId::AggregatorNative);
    assert_eq!(failures[0].error, http_500());
    assert_eq!(failures[1].provider, ProviderId::AggregatorWrapped);
    assert_eq!(synthetic.calls(), 0);
}

#[tokio::test]
async fn first_success_stops_the_chain() {
    let native = FakeProvider::ok(ProviderId::AggregatorNative);
    let wrapped = FakeProvider::ok(ProviderId::AggregatorWrapped);
    let router = FakeProvider::ok(ProviderId::OnChainRouter);
    let pipeline = pipeline().with_quote_chain(chain(&[&native, &wrapped, &router]));

    let outcome = pipeline.get_quote(&request()).await.unwrap();

    assert_eq!(outcome.result().map(|q| q.provider), Some(ProviderId::AggregatorNative));
    assert!(outcome.failures().is_empty());
    assert_eq!((native.calls(), wrapped.calls(), router.calls()), (1, 0, 0));
}

#[tokio::test]
async fn synthetic_estimate_when_real_providers_fail() {
    let native = FakeProvider::failing(ProviderId::AggregatorNative, http_500());
    let wrapped = FakeProvider::failing(ProviderId::AggregatorWrapped, http_500());
    let router = FakeProvider::failing(ProviderId::OnChainRouter, ProviderError::Revert("INSUFFICIENT_LIQUIDITY".into()));
    let synthetic: Arc<dyn QuoteProvider> = Arc::new(SyntheticFallback::new(
        Decimal::from(1800),
        18,
        HashMap::from([(USDC.to_ascii_lowercase(), 6)]),
    ));
    let mut providers = chain(&[&native, &wrapped, &router]);
    providers.push(synthetic);
    let pipeline = pipeline().with_quote_chain(providers);

    let outcome = pipeline.get_quote(&request()).await.unwrap();

    let PipelineOutcome::Success { result, failures } = outcome else {
        panic!("synthetic fallback must always answer");
    };
    assert_eq!(result.provider, ProviderId::SyntheticFallback);
    assert!(!result.is_binding());
    assert!(result.executable.is_none());
    assert_eq!(failures.len(), 3);
}

#[tokio::test]
async fn all_failed_is_reported_in_order() {
    let ids = [
        ProviderId::AggregatorNative,
        ProviderId::AggregatorWrapped,
        ProviderId::OnChainRouter,
        ProviderId::SyntheticFallback,
    ];
    let providers: Vec<_> = ids.iter().map(|id| FakeProvider::failing(*id, http_500())).collect();
    let pipeline = pipeline().with_quote_chain(chain(&providers.iter().collect::<Vec<_>>()));

    let outcome = pipeline.get_quote(&request()).await.unwrap();

    let PipelineOutcome::AllProvidersFailed(failures) = outcome else {
        panic!("expected total failure");
    };
    let order: Vec<_> = failures.iter().map(|f| f.provider).collect();
    assert_eq!(order, ids);
}

#[tokio::test]
async fn zero_amount_is_rejected_before_any_provider() {
    let native = FakeProvider::ok(ProviderId::AggregatorNative);
    let pipeline = pipeline().with_quote_chain(chain(&[&native]));
    let req = QuoteRequest { sell_amount: U256::ZERO, ..request() };

    let err = pipeline.get_quote(&req).await.unwrap_err();

    assert_eq!(err, PipelineError::Validation(ValidationError::ZeroAmount));
    assert_eq!(native.calls(), 0);
}

#[tokio::test]
async fn token_sells_are_rejected_before_any_provider() {
    let native = FakeProvider::ok(ProviderId::AggregatorNative);
    let pipeline = pipeline()
        .with_quote_chain(chain(&[&native]))
        .with_execution_chain(chain(&[&native]));
    let req = QuoteRequest {
        sell_token: USDC.into(),
        buy_token: WMON.into(),
        ..request()
    };

    let err = pipeline.get_quote(&req).await.unwrap_err();
    assert_eq!(
        err,
        PipelineError::Validation(ValidationError::UnsupportedSellToken(USDC.into()))
    );

    let wallet = FakeWallet::new();
    let err = pipeline.execute_swap(&req, &wallet).await.unwrap_err();
    assert!(matches!(err, PipelineError::Validation(ValidationError::UnsupportedSellToken(_))));
    assert_eq!(native.calls(), 0);
    assert!(wallet.sent().await.is_empty());
}

#[tokio::test]
async fn native_symbol_and_wrapped_address_are_sellable() {
    let native = FakeProvider::ok(ProviderId::AggregatorNative);
    let pipeline = pipeline().with_quote_chain(chain(&[&native]));

    for sell_token in ["mon", WMON, &WMON.to_ascii_lowercase()] {
        let req = QuoteRequest {
            sell_token: sell_token.to_string(),
            ..request()
        };
        assert!(pipeline.get_quote(&req).await.unwrap().result().is_some(), "{sell_token}");
    }
    assert_eq!(native.calls(), 3);
}

#[tokio::test]
async fn wrong_chain_is_refused() {
    let native = FakeProvider::ok(ProviderId::AggregatorNative);
    let pipeline = pipeline().with_quote_chain(chain(&[&native]));
    let req = QuoteRequest { chain_id: 1, ..request() };

    let err = pipeline.get_quote(&req).await.unwrap_err();

    assert_eq!(err, PipelineError::NetworkMismatch { expected: CHAIN, actual: Some(1) });
    assert_eq!(native.calls(), 0);
}

#[tokio::test]
async fn slow_provider_times_out_and_chain_advances() {
    let native = FakeProvider::new(ProviderId::AggregatorNative, Behavior::Hang);
    let wrapped = FakeProvider::ok(ProviderId::AggregatorWrapped);
    let pipeline = FallbackPipeline::new(CHAIN, self::native(), Duration::from_millis(50))
        .with_quote_chain(chain(&[&native, &wrapped]));

    let outcome = pipeline.get_quote(&request()).await.unwrap();

    assert_eq!(outcome.result().map(|q| q.provider), Some(ProviderId::AggregatorWrapped));
    assert_eq!(outcome.failures()[0].error, ProviderError::Timeout(Duration::from_millis(50)));
}

#[tokio::test]
async fn execution_falls_through_to_wrapped_aggregator() {
    let native = FakeProvider::executable(ProviderId::AggregatorNative, "0xaaaa");
    let wrapped = FakeProvider::executable(ProviderId::AggregatorWrapped, "0xbbbb");
    let pipeline = pipeline().with_execution_chain(chain(&[&native, &wrapped]));
    let wallet = FakeWallet::new().rejecting("0xaaaa");

    let outcome = pipeline.execute_swap(&request(), &wallet).await.unwrap();

    let PipelineOutcome::Success { result, failures } = outcome else {
        panic!("expected a submitted swap");
    };
    assert_eq!(result.provider, ProviderId::AggregatorWrapped);
    assert!(!result.is_demo());
    assert!(matches!(failures[0].error, ProviderError::Submission(_)));
    let sent = wallet.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "0xbbbb");
    assert_eq!(sent[0].data.as_deref(), Some("0xdeadbeef"));
}

#[tokio::test]
async fn quote_without_transaction_is_not_executable() {
    let native = FakeProvider::ok(ProviderId::AggregatorNative);
    let wrapped = FakeProvider::executable(ProviderId::AggregatorWrapped, "0xbbbb");
    let pipeline = pipeline().with_execution_chain(chain(&[&native, &wrapped]));
    let wallet = FakeWallet::new();

    let outcome = pipeline.execute_swap(&request(), &wallet).await.unwrap();

    assert_eq!(outcome.result().map(|r| r.provider), Some(ProviderId::AggregatorWrapped));
    assert!(matches!(outcome.failures()[0].error, ProviderError::Unavailable(_)));
}

#[tokio::test]
async fn demo_transfer_is_the_labelled_last_resort() {
    let native = FakeProvider::failing(ProviderId::AggregatorNative, http_500());
    let wrapped = FakeProvider::failing(ProviderId::AggregatorWrapped, http_500());
    let pipeline = pipeline().with_execution_chain(chain(&[&native, &wrapped]));
    let wallet = FakeWallet::new();

    let outcome = pipeline.execute_swap(&request(), &wallet).await.unwrap();

    let PipelineOutcome::Success { result, failures } = outcome else {
        panic!("expected demo transfer");
    };
    assert!(result.is_demo());
    assert!(!result.provider.is_authoritative());
    assert!(result.quote.is_none());
    assert_eq!(failures.len(), 2);
    let sent = wallet.sent().await;
    assert_eq!(
        sent,
        vec![TxRequest {
            to: USDC.into(),
            data: None,
            value: U256::from(1_000u64),
            gas_limit: Some(DEMO_TRANSFER_GAS),
        }]
    );
}

#[tokio::test]
async fn without_demo_fallback_execution_can_fail() {
    let native = FakeProvider::failing(ProviderId::AggregatorNative, http_500());
    let pipeline = pipeline()
        .with_execution_chain(chain(&[&native]))
        .with_demo_fallback(false);
    let wallet = FakeWallet::new();

    let outcome = pipeline.execute_swap(&request(), &wallet).await.unwrap();

    assert!(matches!(outcome, PipelineOutcome::AllProvidersFailed(ref f) if f.len() == 1));
    assert!(wallet.sent().await.is_empty());
}

#[tokio::test]
async fn failed_demo_transfer_is_recorded() {
    let pipeline = pipeline();
    let wallet = FakeWallet::new().rejecting(USDC);

    let outcome = pipeline.execute_swap(&request(), &wallet).await.unwrap();

    let PipelineOutcome::AllProvidersFailed(failures) = outcome else {
        panic!("a rejected demo transfer is not a success");
    };
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].provider, ProviderId::DemoTransfer);
}

#[tokio::test]
async fn wallet_is_switched_to_the_required_chain() {
    let native = FakeProvider::executable(ProviderId::AggregatorNative, "0xaaaa");
    let pipeline = pipeline().with_execution_chain(chain(&[&native]));
    let wallet = FakeWallet::new().on_chain(Some(1));

    let outcome = pipeline.execute_swap(&request(), &wallet).await.unwrap();

    assert_eq!(outcome.result().map(|r| r.provider), Some(ProviderId::AggregatorNative));
    assert_eq!(wallet.chain_id(), Some(CHAIN));
}

#[tokio::test]
async fn wallet_on_wrong_chain_blocks_execution() {
    let native = FakeProvider::executable(ProviderId::AggregatorNative, "0xaaaa");
    let pipeline = pipeline().with_execution_chain(chain(&[&native]));
    let mut wallet = FakeWallet::new().on_chain(Some(1));
    wallet.can_switch = false;

    let err = pipeline.execute_swap(&request(), &wallet).await.unwrap_err();

    assert_eq!(err, PipelineError::NetworkMismatch { expected: CHAIN, actual: Some(1) });
    assert_eq!(native.calls(), 0);
    assert!(wallet.sent().await.is_empty());
}

#[tokio::test]
async fn taker_must_be_the_wallet() {
    let pipeline = pipeline();
    let wallet = FakeWallet::new();
    let req = QuoteRequest {
        taker_address: "0x2222222222222222222222222222222222222222".into(),
        ..request()
    };

    let err = pipeline.execute_swap(&req, &wallet).await.unwrap_err();

    assert!(matches!(err, PipelineError::Validation(ValidationError::TakerMismatch { .. })));
}

#[tokio::test]
async fn overlapping_submissions_are_serialized() {
    let native = FakeProvider::executable(ProviderId::AggregatorNative, "0xaaaa");
    let pipeline = pipeline().with_execution_chain(chain(&[&native]));
    let mut wallet = FakeWallet::new();
    wallet.delay = Duration::from_millis(30);
    let req = request();

    let (a, b) = tokio::join!(
        pipeline.execute_swap(&req, &wallet),
        pipeline.execute_swap(&req, &wallet)
    );

    assert!(a.unwrap().result().is_some());
    assert!(b.unwrap().result().is_some());
    assert_eq!(wallet.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(wallet.sent().await.len(), 2);
}
