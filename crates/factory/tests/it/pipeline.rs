use crate::utils::{RUNTIME, ScriptedRpc, dev_constants, store, wallet};
use alloy_primitives::{Bytes, U256, bytes};
use singleton_factory::{
    ArtifactExists, DeploymentPipeline, DeploymentScheme, FeeParams, PrepareRequest, Stage,
    SubmitOptions, SubmitOutcome, verify_deployment,
};
use singleton_factory_common::{DeployerConstants, DeploymentFailure, FailureKind};
use singleton_factory_wallets::DeploymentSigner;
use singleton_factory_zksync::DEFAULT_GAS_PER_PUBDATA;
use std::time::Duration;

fn request(constants: &DeployerConstants) -> PrepareRequest {
    PrepareRequest {
        bytecode: constants.factory_bytecode.clone(),
        chain_id: 1337,
        nonce: 0,
        fees: FeeParams::Legacy { gas_price: 10, gas_limit: 95_495 },
        scheme: DeploymentScheme::NonceCreate,
    }
}

fn options() -> SubmitOptions {
    SubmitOptions {
        simulate: true,
        timeout: Duration::from_secs(5),
        poll_interval: Duration::from_millis(10),
    }
}

fn failure_kind(err: &eyre::Report) -> Option<FailureKind> {
    err.downcast_ref::<DeploymentFailure>().map(|failure| failure.kind)
}

#[tokio::test]
async fn prepare_then_submit_confirms() {
    let constants = dev_constants();
    let (_dir, store) = store();
    let mut rpc = ScriptedRpc::default();

    let mut pipeline = DeploymentPipeline::new(&constants, &store);
    let artifact = pipeline.prepare(request(&constants), &wallet(), Some(&rpc)).await.unwrap();
    assert_eq!(pipeline.trail().stages(), [Stage::Built, Stage::Signed, Stage::Persisted]);
    assert_eq!(artifact.signer_address, wallet().address());
    assert_eq!(artifact.address, constants.factory_address);
    assert_eq!(artifact.gas_price, 10);
    assert_eq!(artifact.gas_limit, 95_495);
    assert_eq!(store.read(1337).unwrap(), Some(artifact.clone()));
    assert_eq!(
        std::fs::read_to_string(store.bytecode_path()).unwrap(),
        format!("{}\n", constants.factory_bytecode)
    );

    let outcome = pipeline.submit(&rpc, options()).await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Confirmed(receipt) if receipt.status));
    assert_eq!(
        &pipeline.trail().stages()[3..],
        [Stage::Simulated, Stage::Broadcast, Stage::Confirmed]
    );
    assert_eq!(rpc.sent(), [artifact.transaction.clone()]);

    rpc.code = RUNTIME;
    let report = verify_deployment(&rpc, &store, &constants).await.unwrap();
    assert_eq!(report.chain_id, 1337);
    assert_eq!(report.address, constants.factory_address);
    assert_eq!(report.expected, Some(constants.codehash));
}

#[tokio::test]
async fn offline_prepare_is_bound_to_the_chain() {
    let constants = dev_constants();
    let (_dir, store) = store();
    let mut request = request(&constants);
    request.chain_id = 100;
    DeploymentPipeline::new(&constants, &store).prepare(request, &wallet(), None).await.unwrap();

    let rpc = ScriptedRpc { chain_id: 1337, ..Default::default() };
    let err = DeploymentPipeline::new(&constants, &store).submit(&rpc, options()).await.unwrap_err();
    assert!(err.to_string().contains("no deployment artifact for chain 1337"), "{err}");
    assert!(rpc.sent().is_empty());
}

#[tokio::test]
async fn second_prepare_keeps_the_first_artifact() {
    let constants = dev_constants();
    let (_dir, store) = store();
    let rpc = ScriptedRpc::default();

    let first = DeploymentPipeline::new(&constants, &store)
        .prepare(request(&constants), &wallet(), Some(&rpc))
        .await
        .unwrap();
    let before = std::fs::read(store.artifact_path(1337)).unwrap();

    let mut cheaper = request(&constants);
    cheaper.fees = FeeParams::Legacy { gas_price: 1, gas_limit: 95_495 };
    let mut pipeline = DeploymentPipeline::new(&constants, &store);
    let err = pipeline.prepare(cheaper, &wallet(), Some(&rpc)).await.unwrap_err();
    assert!(err.downcast_ref::<ArtifactExists>().is_some(), "{err}");
    assert!(!pipeline.trail().stages().contains(&Stage::Signed));

    assert_eq!(std::fs::read(store.artifact_path(1337)).unwrap(), before);
    assert_eq!(store.read(1337).unwrap(), Some(first));
}

#[tokio::test]
async fn reverted_receipt_leaves_artifact_untouched() {
    let constants = dev_constants();
    let (_dir, store) = store();
    let rpc = ScriptedRpc { receipt_status: Some(false), ..Default::default() };

    let mut pipeline = DeploymentPipeline::new(&constants, &store);
    pipeline.prepare(request(&constants), &wallet(), Some(&rpc)).await.unwrap();
    let before = std::fs::read(store.artifact_path(1337)).unwrap();

    let err = pipeline.submit(&rpc, options()).await.unwrap_err();
    assert_eq!(failure_kind(&err), Some(FailureKind::DeploymentReverted));
    assert_eq!(pipeline.trail().last(), Some(Stage::Reverted));
    assert_eq!(std::fs::read(store.artifact_path(1337)).unwrap(), before);
}

#[tokio::test]
async fn nonce_mismatch_stops_before_signing() {
    let constants = dev_constants();
    let (_dir, store) = store();
    let rpc = ScriptedRpc { nonce: 3, ..Default::default() };

    let mut pipeline = DeploymentPipeline::new(&constants, &store);
    let err = pipeline.prepare(request(&constants), &wallet(), Some(&rpc)).await.unwrap_err();
    let failure = err.downcast_ref::<DeploymentFailure>().unwrap();
    assert_eq!(failure.kind, FailureKind::NonceMismatch);
    assert_eq!(failure.param("actual"), Some("3"));
    assert_eq!(pipeline.trail().stages(), [Stage::Built, Stage::Failed]);
    assert_eq!(store.read(1337).unwrap(), None);
}

#[tokio::test]
async fn simulation_with_different_code_is_not_broadcast() {
    let constants = dev_constants();
    let (_dir, store) = store();
    let rpc = ScriptedRpc { call_output: Some(bytes!("6000")), ..Default::default() };

    let mut pipeline = DeploymentPipeline::new(&constants, &store);
    pipeline.prepare(request(&constants), &wallet(), Some(&rpc)).await.unwrap();
    let err = pipeline.submit(&rpc, options()).await.unwrap_err();
    assert_eq!(
        failure_kind(&err),
        Some(FailureKind::FactoryDeploymentSimulationDifferentBytecode)
    );
    assert_eq!(pipeline.trail().last(), Some(Stage::Failed));
    assert!(rpc.sent().is_empty());
}

#[tokio::test]
async fn failed_simulation_call() {
    let constants = dev_constants();
    let (_dir, store) = store();
    let rpc = ScriptedRpc { call_output: None, ..Default::default() };

    let mut pipeline = DeploymentPipeline::new(&constants, &store);
    pipeline.prepare(request(&constants), &wallet(), Some(&rpc)).await.unwrap();
    let err = pipeline.submit(&rpc, options()).await.unwrap_err();
    assert_eq!(failure_kind(&err), Some(FailureKind::DeploymentSimulationFailed));
}

#[tokio::test]
async fn skipping_simulation_broadcasts_directly() {
    let constants = dev_constants();
    let (_dir, store) = store();
    let rpc = ScriptedRpc { call_output: None, ..Default::default() };

    let mut pipeline = DeploymentPipeline::new(&constants, &store);
    pipeline.prepare(request(&constants), &wallet(), Some(&rpc)).await.unwrap();
    let options = SubmitOptions { simulate: false, ..options() };
    pipeline.submit(&rpc, options).await.unwrap();
    assert_eq!(&pipeline.trail().stages()[3..], [Stage::Broadcast, Stage::Confirmed]);
}

#[tokio::test(start_paused = true)]
async fn missing_receipt_is_unconfirmed() {
    let constants = dev_constants();
    let (_dir, store) = store();
    let rpc = ScriptedRpc { receipt_status: None, ..Default::default() };

    let mut pipeline = DeploymentPipeline::new(&constants, &store);
    pipeline.prepare(request(&constants), &wallet(), Some(&rpc)).await.unwrap();
    let outcome = pipeline.submit(&rpc, options()).await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Unconfirmed(_)));
    assert_eq!(pipeline.trail().last(), Some(Stage::Unconfirmed));
    assert_eq!(rpc.sent().len(), 1);
}

#[tokio::test]
async fn verify_detects_different_code() {
    let constants = dev_constants();
    let (_dir, store) = store();
    DeploymentPipeline::new(&constants, &store)
        .prepare(request(&constants), &wallet(), None)
        .await
        .unwrap();

    let rpc = ScriptedRpc { code: bytes!("6000"), ..Default::default() };
    let err = verify_deployment(&rpc, &store, &constants).await.unwrap_err();
    assert_eq!(failure_kind(&err), Some(FailureKind::BytecodeIntegrityMismatch));
}

#[tokio::test]
async fn verify_requires_the_canonical_address() {
    let constants = dev_constants();
    let (_dir, store) = store();
    DeploymentPipeline::new(&constants, &store)
        .prepare(request(&constants), &wallet(), None)
        .await
        .unwrap();

    let rpc = ScriptedRpc { code: RUNTIME, ..Default::default() };
    verify_deployment(&rpc, &store, &constants).await.unwrap();

    let moved = DeployerConstants { factory_address: wallet().address(), ..constants };
    let err = verify_deployment(&rpc, &store, &moved).await.unwrap_err();
    assert!(err.to_string().contains("unexpected address"), "{err}");
}

#[tokio::test]
async fn zksync_deployment_skips_simulation() {
    let constants = dev_constants();
    let (_dir, store) = store();
    let rpc = ScriptedRpc { call_output: None, ..Default::default() };
    let zk_bytecode = Bytes::from(vec![0u8; 32]);

    let request = PrepareRequest {
        bytecode: zk_bytecode,
        chain_id: 1337,
        nonce: 0,
        fees: FeeParams::ZkSync {
            max_fee_per_gas: 20,
            max_priority_fee_per_gas: 20,
            gas_limit: 136_422,
            gas_per_pubdata: U256::from(DEFAULT_GAS_PER_PUBDATA),
            factory_deps: Vec::new(),
            paymaster: None,
        },
        scheme: DeploymentScheme::zksync(),
    };
    let mut pipeline = DeploymentPipeline::new(&constants, &store);
    let artifact = pipeline.prepare(request, &wallet(), Some(&rpc)).await.unwrap();
    assert_eq!(artifact.transaction[0], 0x71);
    assert!(!store.bytecode_path().exists());

    pipeline.submit(&rpc, options()).await.unwrap();
    assert_eq!(
        &pipeline.trail().stages()[3..],
        [Stage::SimulationSkipped, Stage::Broadcast, Stage::Confirmed]
    );
}
