//! Configuration for ledger hosts and relays.
//!
//! Everything here is plain `serde` data loaded from JSON. Protocol
//! constants that are not deployment choices live in [`crate::constants`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Pubkey, Result, XswapError, constants};

/// SPL token program (`Tokenkeg...`).
pub const TOKEN_PROGRAM_ID: Pubkey = Pubkey([
    6, 221, 246, 225, 215, 101, 161, 147, 217, 203, 225, 70, 206, 235, 121, 172, 28, 180, 133, 237,
    95, 91, 55, 145, 58, 140, 245, 133, 126, 255, 0, 169,
]);

/// Associated token account program (`ATokenGP...`).
pub const ASSOCIATED_TOKEN_PROGRAM_ID: Pubkey = Pubkey([
    140, 151, 37, 143, 78, 36, 137, 241, 187, 61, 16, 41, 20, 142, 13, 131, 11, 90, 19, 153, 218,
    255, 16, 132, 4, 142, 123, 216, 219, 233, 248, 89,
]);

/// Program ids and the local endpoint id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// The settlement program; owner of every derived address.
    pub program_id: Pubkey,
    /// The messaging endpoint program.
    pub endpoint_program: Pubkey,
    pub token_program: Pubkey,
    pub associated_token_program: Pubkey,
    /// Endpoint id of this ledger.
    pub local_eid: u32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            program_id: Pubkey::ZERO,
            endpoint_program: Pubkey::ZERO,
            token_program: TOKEN_PROGRAM_ID,
            associated_token_program: ASSOCIATED_TOKEN_PROGRAM_ID,
            local_eid: constants::LOCAL_CHAIN_ID,
        }
    }
}

/// `tracing-subscriber` settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `"info,xswap_ledger=debug"`.
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

/// Retry schedule for transport failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled for each further attempt.
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 200,
        }
    }
}

impl RetryPolicy {
    /// Delay before `attempt` (1-based). The first attempt is immediate.
    #[must_use]
    pub fn delay_ms(&self, attempt: u32) -> u64 {
        if attempt <= 1 {
            return 0;
        }
        self.backoff_ms
            .saturating_mul(1u64 << (attempt - 2).min(16))
    }
}

/// Off-ledger relay configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub network: NetworkConfig,
    /// Upper bound on swaps prepared concurrently.
    pub max_parallel: usize,
    pub retry: RetryPolicy,
    pub logging: LoggingConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            max_parallel: 8,
            retry: RetryPolicy::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl RelayConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_parallel == 0 {
            return Err(XswapError::Configuration {
                reason: "max_parallel must be at least 1".to_string(),
            });
        }
        if self.retry.max_attempts == 0 {
            return Err(XswapError::Configuration {
                reason: "retry.max_attempts must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
