use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use crate::domain::{TxHandle, TxRequest};
use crate::error::{NetworkSwitchError, WalletError};

/// The user's connected wallet. Signing and provider discovery live behind it.
#[async_trait]
pub trait WalletSession: Send + Sync {
    fn is_connected(&self) -> bool;
    fn address(&self) -> Option<String>;
    fn chain_id(&self) -> Option<u64>;
    async fn submit_transaction(&self, tx: TxRequest) -> Result<TxHandle, WalletError>;
    async fn switch_network(&self, chain_id: u64) -> Result<(), NetworkSwitchError>;
}

/// Records transactions instead of signing them.
pub struct DryRunWallet {
    address: String,
    chain_id: AtomicU64,
    sent: Mutex<Vec<TxRequest>>,
}

impl DryRunWallet {
    pub fn new(address: String, chain_id: u64) -> Self {
        Self {
            address,
            chain_id: AtomicU64::new(chain_id),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub async fn sent(&self) -> Vec<TxRequest> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl WalletSession for DryRunWallet {
    fn is_connected(&self) -> bool {
        true
    }

    fn address(&self) -> Option<String> {
        Some(self.address.clone())
    }

    fn chain_id(&self) -> Option<u64> {
        Some(self.chain_id.load(Ordering::SeqCst))
    }

    async fn submit_transaction(&self, tx: TxRequest) -> Result<TxHandle, WalletError> {
        let mut sent = self.sent.lock().await;
        info!(to = %tx.to, value = %tx.value, "dry_run: skipping send");
        sent.push(tx);
        Ok(TxHandle {
            hash: format!("DRY_RUN-{}", sent.len()),
        })
    }

    async fn switch_network(&self, chain_id: u64) -> Result<(), NetworkSwitchError> {
        self.chain_id.store(chain_id, Ordering::SeqCst);
        Ok(())
    }
}
