use crate::utils::{FixedRegistry, RUNTIME, ScriptedRpc, dev_constants, store, wallet};
use alloy_primitives::{U256, bytes};
use singleton_factory::{
    DeploymentPipeline, DeploymentScheme, EligibilityChecker, EligibilityOutcome, FeeParams,
    PrefundBuffer, PrepareRequest, eligibility::ELIGIBLE_RESPONSE,
};
use singleton_factory_common::{ChainRpc, DeploymentFailure, FailureKind, utils::resolve_rpc_url};

fn kind(outcome: &EligibilityOutcome) -> Option<FailureKind> {
    outcome.failure().map(|failure| failure.kind)
}

#[tokio::test]
async fn missing_rpc_url() {
    let constants = dev_constants();
    let (_dir, store) = store();
    let registry = FixedRegistry(true);

    let rpc = resolve_rpc_url(None, Some("please add my chain, thanks"));
    let report = EligibilityChecker::new(&constants, &store, &registry)
        .check(Err(rpc.unwrap_err()))
        .await;
    assert_eq!(kind(&report.outcome), Some(FailureKind::RpcUrlNotFound));
    assert_eq!(report.outcome.exit_code(), 10);
    assert_eq!(report.chain_id, None);
    assert_eq!(report.response, report.outcome.failure().unwrap().message());
}

#[tokio::test]
async fn chain_not_listed() {
    let constants = dev_constants();
    let (_dir, store) = store();
    let rpc = ScriptedRpc { chain_id: 999_999, ..Default::default() };

    let report = EligibilityChecker::new(&constants, &store, &FixedRegistry(false))
        .check(Ok(&rpc))
        .await;
    assert_eq!(kind(&report.outcome), Some(FailureKind::ChainNotListed));
    assert_eq!(report.outcome.exit_code(), 12);
    assert_eq!(report.chain_id, Some(999_999));
    assert_eq!(report.chainlist.as_deref(), Some("https://chains.test/eip155-999999.json"));
    assert_eq!(report.on_chainlist, Some(false));
    assert_eq!(report.nonce, None);

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["outcome"], "ChainNotListed");
    assert_eq!(json["labelOperation"], "--remove-label");
}

#[tokio::test]
async fn existing_artifact() {
    let constants = dev_constants();
    let (_dir, store) = store();
    let request = PrepareRequest {
        bytecode: constants.factory_bytecode.clone(),
        chain_id: 1337,
        nonce: 0,
        fees: FeeParams::Legacy { gas_price: 10, gas_limit: 100_000 },
        scheme: DeploymentScheme::NonceCreate,
    };
    DeploymentPipeline::new(&constants, &store).prepare(request, &wallet(), None).await.unwrap();

    let rpc = ScriptedRpc::default();
    let report =
        EligibilityChecker::new(&constants, &store, &FixedRegistry(true)).check(Ok(&rpc)).await;
    assert_eq!(kind(&report.outcome), Some(FailureKind::FactoryAlreadyDeployed));
    assert_eq!(report.chainlist, None);
}

#[tokio::test]
async fn code_at_factory_address() {
    let constants = dev_constants();
    let (_dir, store) = store();
    let registry = FixedRegistry(true);
    let checker = EligibilityChecker::new(&constants, &store, &registry);

    let cases = [
        (RUNTIME, 0, FailureKind::FactoryPreDeployed),
        (RUNTIME, 1, FailureKind::FactoryNotAddedToRepo),
        (bytes!("6000"), 0, FailureKind::FactoryDifferentBytecode),
        (Default::default(), 2, FailureKind::FactoryDeployerAccountNonceBurned),
    ];
    for (code, nonce, expected) in cases {
        let rpc = ScriptedRpc { code: code.clone(), nonce, ..Default::default() };
        let report = checker.check(Ok(&rpc)).await;
        assert_eq!(kind(&report.outcome), Some(expected), "code {code}, nonce {nonce}");
        assert_eq!(report.nonce, Some(nonce));
        assert_eq!(report.code, Some(code));
        assert_eq!(report.gas_price, None);
    }
}

#[tokio::test]
async fn gas_failures() {
    let constants = dev_constants();
    let (_dir, store) = store();
    let registry = FixedRegistry(true);
    let checker = EligibilityChecker::new(&constants, &store, &registry);

    let cases = [
        (
            ScriptedRpc { gas_price: None, ..Default::default() },
            FailureKind::GasPriceNotRetrieved,
        ),
        (
            ScriptedRpc { gas_estimate: Some(0), ..Default::default() },
            FailureKind::GasLimitNotEstimated,
        ),
        (
            ScriptedRpc { gas_estimate: None, ..Default::default() },
            FailureKind::GasLimitEstimationFailed,
        ),
        (
            ScriptedRpc { call_output: None, ..Default::default() },
            FailureKind::DeploymentSimulationFailed,
        ),
        (
            ScriptedRpc { call_output: Some(bytes!("6000")), ..Default::default() },
            FailureKind::FactoryDeploymentSimulationDifferentBytecode,
        ),
    ];
    for (rpc, expected) in cases {
        let report = checker.check(Ok(&rpc)).await;
        assert_eq!(kind(&report.outcome), Some(expected));
    }
}

#[tokio::test]
async fn prefund_needed_reports_shortfall() {
    let constants = dev_constants();
    let (_dir, store) = store();
    let rpc = ScriptedRpc {
        gas_price: Some(10),
        gas_estimate: Some(1_000),
        balance: U256::from(10_000),
        ..Default::default()
    };

    let report =
        EligibilityChecker::new(&constants, &store, &FixedRegistry(true)).check(Ok(&rpc)).await;
    let failure: &DeploymentFailure = report.outcome.failure().unwrap();
    assert_eq!(failure.kind, FailureKind::PrefundNeeded);
    assert_eq!(failure.param("required"), Some("15000"));
    assert_eq!(failure.param("shortfall"), Some("5000"));
    assert_eq!(failure.param("signer"), Some(constants.signer.to_string().as_str()));
    assert_eq!(report.gas_price.as_deref(), Some("10"));
    assert_eq!(report.gas_limit.as_deref(), Some("1000"));
    assert_eq!(report.gas_estimate.as_deref(), Some("15000"));
    assert_eq!(report.simulation, Some(RUNTIME));

    let report = EligibilityChecker::new(&constants, &store, &FixedRegistry(true))
        .with_buffer(PrefundBuffer(100))
        .check(Ok(&rpc))
        .await;
    assert_eq!(report.outcome, EligibilityOutcome::Eligible);
}

#[tokio::test]
async fn zero_gas_price_reaches_funding_check() {
    let constants = dev_constants();
    let (_dir, store) = store();
    let checker = EligibilityChecker::new(&constants, &store, &FixedRegistry(true));

    let rpc = ScriptedRpc { gas_price: Some(0), ..Default::default() };
    let report = checker.check(Ok(&rpc)).await;
    assert_eq!(report.outcome, EligibilityOutcome::Eligible);
    assert_eq!(report.gas_price.as_deref(), Some("0"));
    assert_eq!(report.gas_estimate.as_deref(), Some("0"));
    assert_eq!(report.balance.as_deref(), Some("0.000000000000000000"));
}

#[tokio::test]
async fn eligible_chain() {
    let constants = dev_constants();
    let (_dir, store) = store();
    let rpc = ScriptedRpc { balance: U256::from(10u128.pow(18)), ..Default::default() };

    let report =
        EligibilityChecker::new(&constants, &store, &FixedRegistry(true)).check(Ok(&rpc)).await;
    assert_eq!(report.outcome, EligibilityOutcome::Eligible);
    assert_eq!(report.outcome.exit_code(), 0);
    assert_eq!(report.response, ELIGIBLE_RESPONSE);
    assert_eq!(report.balance.as_deref(), Some("1.000000000000000000"));
    assert_eq!(report.chain_id, Some(rpc.chain_id().await.unwrap()));

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["labelOperation"], "--add-label");
    assert_eq!(json["outcome"], "Eligible");
}
