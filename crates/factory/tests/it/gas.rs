use crate::utils::{ScriptedRpc, dev_constants};
use alloy_primitives::U256;
use singleton_factory::{GasEstimate, GasMultipliers, gas};
use singleton_factory_common::CallRequest;

#[tokio::test]
async fn unscaled_estimate_costs_node_answers() {
    let constants = dev_constants();
    let rpc = ScriptedRpc { gas_price: Some(7), gas_estimate: Some(68_211), ..Default::default() };
    let request = CallRequest::create(constants.signer, constants.factory_bytecode.clone());

    let estimate = gas::estimate(&rpc, &request, GasMultipliers::NONE).await.unwrap();
    assert_eq!(estimate, GasEstimate { gas_price: 7, gas_limit: 68_211 });
    assert_eq!(estimate.cost(), U256::from(7 * 68_211));

    let padded = gas::estimate(&rpc, &request, GasMultipliers::EVM).await.unwrap();
    assert_eq!(padded.gas_limit, 95_495);
}

#[tokio::test]
async fn rpc_errors_are_returned() {
    let constants = dev_constants();
    let rpc = ScriptedRpc { gas_estimate: None, ..Default::default() };
    let request = CallRequest::create(constants.signer, constants.factory_bytecode.clone());
    assert!(gas::estimate(&rpc, &request, GasMultipliers::NONE).await.is_err());
}
