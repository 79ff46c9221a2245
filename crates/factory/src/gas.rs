//! Gas estimation with fixed safety multipliers.

use alloy_primitives::U256;
use eyre::Result;
use singleton_factory_common::{CallRequest, ChainRpc};
use tracing::debug;

/// Gas price used when no RPC is available, 100 gwei.
pub const OFFLINE_GAS_PRICE: u128 = 100_000_000_000;

/// Gas limit used when no RPC is available.
pub const OFFLINE_GAS_LIMIT: u64 = 100_000;

/// Percent multipliers applied on top of the node's answers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GasMultipliers {
    pub gas_limit_percent: u64,
    pub gas_price_percent: u64,
}

impl GasMultipliers {
    /// Nonce and EVM CREATE2 flows: gas limit ×1.4.
    pub const EVM: Self = Self { gas_limit_percent: 140, gas_price_percent: 100 };

    /// zkSync flows: gas limit ×2, gas price ×2.
    pub const ZKSYNC: Self = Self { gas_limit_percent: 200, gas_price_percent: 200 };

    /// Node answers, unchanged.
    pub const NONE: Self = Self { gas_limit_percent: 100, gas_price_percent: 100 };
}

/// Gas parameters of a deployment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GasEstimate {
    pub gas_price: u128,
    pub gas_limit: u64,
}

impl GasEstimate {
    /// Fallback used by offline callers.
    pub const fn offline() -> Self {
        Self { gas_price: OFFLINE_GAS_PRICE, gas_limit: OFFLINE_GAS_LIMIT }
    }

    /// `gasPrice * gasLimit`.
    pub fn cost(&self) -> U256 {
        U256::from(self.gas_price) * U256::from(self.gas_limit)
    }

    /// Applies `multipliers`, rounding down.
    pub fn scaled(self, multipliers: GasMultipliers) -> Self {
        Self {
            gas_price: self.gas_price * multipliers.gas_price_percent as u128 / 100,
            gas_limit: (self.gas_limit as u128 * multipliers.gas_limit_percent as u128 / 100)
                as u64,
        }
    }
}

impl Default for GasEstimate {
    fn default() -> Self {
        Self::offline()
    }
}

/// Reads the gas price and estimates `request`, then applies `multipliers`.
///
/// RPC errors are returned as is.
pub async fn estimate(
    rpc: &dyn ChainRpc,
    request: &CallRequest,
    multipliers: GasMultipliers,
) -> Result<GasEstimate> {
    let gas_price = rpc.gas_price().await?;
    let gas_limit = rpc.estimate_gas(request).await?;
    debug!(gas_price, gas_limit, "node gas estimate");
    Ok(GasEstimate { gas_price, gas_limit }.scaled(multipliers))
}
