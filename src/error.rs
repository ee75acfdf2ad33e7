use std::time::Duration;

use thiserror::Error;

/// Rejected input. Surfaced straight to the caller, never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required survey field `{0}`")]
    MissingField(&'static str),
    #[error("invalid value `{value}` for survey field `{field}`")]
    InvalidField { field: &'static str, value: String },
    #[error("sell amount must be greater than zero")]
    ZeroAmount,
    #[error("invalid amount `{0}`")]
    InvalidAmount(String),
    #[error("buy token is not set")]
    MissingBuyToken,
    #[error("taker address is not set")]
    MissingTaker,
    #[error("wallet is not connected")]
    WalletNotConnected,
    #[error("taker {taker} does not match wallet address {wallet}")]
    TakerMismatch { taker: String, wallet: String },
    #[error("unknown token `{0}`")]
    UnknownToken(String),
    #[error("cannot sell `{0}`: only the native coin or its wrapped token is supported")]
    UnsupportedSellToken(String),
    #[error("slippage {bps} bps outside (0, {max}] bps")]
    InvalidSlippage { bps: u64, max: u64 },
}

/// Failure of a single quote or execution source. Recovered inside the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("http status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("call reverted: {0}")]
    Revert(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("unavailable: {0}")]
    Unavailable(String),
    #[error("transaction submission failed: {0}")]
    Submission(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::Malformed(err.to_string())
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}

impl From<alloy_sol_types::Error> for ProviderError {
    fn from(err: alloy_sol_types::Error) -> Self {
        ProviderError::Malformed(err.to_string())
    }
}

/// Errors that stop a pipeline invocation before any provider runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("network mismatch: expected chain {expected}, active chain {actual:?}")]
    NetworkMismatch { expected: u64, actual: Option<u64> },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("wallet is not connected")]
    NotConnected,
    #[error("transaction rejected: {0}")]
    Rejected(String),
    #[error("wallet transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot switch wallet to chain {chain_id}: {reason}")]
pub struct NetworkSwitchError {
    pub chain_id: u64,
    pub reason: String,
}
