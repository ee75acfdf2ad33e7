use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use token_match::config::Config;
use token_match::domain::{PipelineOutcome, QuoteRequest};
use token_match::pipeline::FallbackPipeline;
use token_match::rpc::RpcClient;
use token_match::scoring::{DiscreteScorer, Scorer};
use token_match::state::SessionStore;
use token_match::wallet::DryRunWallet;
use token_match::{contracts, logger, router, units, TokenCatalog};

#[tokio::main]
async fn main() -> Result<()> {
    // Load local .env if present (no-op in prod envs)
    let _ = dotenvy::dotenv();

    let cfg = Config::from_env()?;
    logger::init_tracing(cfg.log_json);
    info!(
        chain_id = cfg.chain_id,
        chain = %cfg.chain_name,
        rpc = %cfg.rpc_url,
        aggregator = %cfg.zeroex_base_url,
        aggregator_key = cfg.zeroex_api_key.is_some(),
        pair_check = ?cfg.pair_check,
        dry_run = cfg.dry_run,
        "boot"
    );

    let catalog = TokenCatalog::monad_testnet();
    let Some(answer) = cfg.survey else {
        info!("SURVEY_RISK / SURVEY_HORIZON / SURVEY_VIBE not set, nothing to match");
        return Ok(());
    };

    let scorer = DiscreteScorer;
    let mut session = SessionStore::new();
    session.set_matches(scorer.score(&catalog, &answer));
    for (rank, rec) in session.matches().iter().enumerate() {
        info!(rank = rank + 1, symbol = %rec.symbol, score = rec.score.value(), executable = rec.is_executable(), "match");
    }

    if cfg.scan_pools {
        let reader = RpcClient::new(cfg.rpc_url.clone(), Duration::from_millis(cfg.provider_timeout_ms))?;
        let candidates: Vec<_> = catalog
            .tokens()
            .iter()
            .filter_map(|t| t.address.as_deref().and_then(contracts::parse_address))
            .collect();
        for pool in router::scan_pools(&reader, cfg.factory_address, &candidates).await? {
            info!(pair = %pool.pair, symbols = %format!("{}/{}", pool.symbol0, pool.symbol1), reserve0 = %pool.reserve0, reserve1 = %pool.reserve1, "pool");
        }
    }

    let (Some(taker), Some(amount)) = (cfg.taker_address.clone(), cfg.sell_amount.clone()) else {
        info!("TAKER_ADDRESS / SELL_AMOUNT not set, skipping quote");
        return Ok(());
    };
    let Some(top) = session.top_executable().map(|r| r.symbol.clone()) else {
        warn!("no executable match in deck");
        return Ok(());
    };
    let selection = session.select(&top)?.clone();
    let Some(buy_token) = selection.address else {
        return Ok(());
    };

    let pipeline = FallbackPipeline::from_config(&cfg, &catalog)?;
    let req = QuoteRequest {
        sell_token: cfg.native_symbol.clone(),
        buy_token,
        sell_amount: units::parse_units(&amount, cfg.native_decimals)?,
        taker_address: taker.clone(),
        chain_id: cfg.chain_id,
    };

    match pipeline.get_quote(&req).await? {
        PipelineOutcome::Success { result, failures } => info!(
            symbol = %selection.symbol,
            provider = %result.provider,
            binding = result.is_binding(),
            price = %result.price,
            buy_amount = %result.buy_amount,
            skipped = failures.len(),
            "quote"
        ),
        PipelineOutcome::AllProvidersFailed(failures) => warn!(attempts = failures.len(), "no quote available"),
    }

    if cfg.dry_run && cfg.swap_execute {
        let wallet = DryRunWallet::new(taker, cfg.chain_id);
        match pipeline.execute_swap(&req, &wallet).await? {
            PipelineOutcome::Success { result, .. } => {
                info!(provider = %result.provider, tx = %result.tx_hash, demo = result.is_demo(), "swap")
            }
            PipelineOutcome::AllProvidersFailed(failures) => warn!(attempts = failures.len(), "swap failed"),
        }
    }

    Ok(())
}
