//! Storage helper as seen by the reconciliation engine: balance seeding,
//! exemption filtering, cancellation and concurrent workers.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use qc_18_storage_helper::{
    load_exempt_accounts, Asserter, BlockStorageHelper, ConfigError, ContextError,
    ExemptOperation, FetchError, FetcherConfig, LookupContext, MockNodeClient, NodeError, OperationStatus, StorageHelper,
    StorageHelperConfig, StorageHelperError, StorageHelperErrorKind,
};
use shared_types::{
    AccountCurrency, AccountIdentifier, Amount, BlockIdentifier, Currency, Metadata,
    NetworkIdentifier, Operation,
};

fn error_chain(err: &dyn std::error::Error) -> Vec<String> {
    let mut chain = vec![err.to_string()];
    let mut cause = err.source();
    while let Some(next) = cause {
        chain.push(next.to_string());
        cause = next.source();
    }
    chain
}

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn network() -> NetworkIdentifier {
    NetworkIdentifier::new("quantum-chain", "testnet")
}

fn btc() -> Currency {
    Currency::new("BTC", 8)
}

fn target_block() -> BlockIdentifier {
    BlockIdentifier::new(1_000, "0x3e8")
}

fn ruleset(network: NetworkIdentifier) -> Arc<Asserter> {
    Arc::new(Asserter::new(
        network,
        vec!["TRANSFER".to_string(), "FEE".to_string()],
        vec![
            OperationStatus::new("SUCCESS", true),
            OperationStatus::new("FAILURE", false),
        ],
        true,
    ))
}

fn helper(
    lookup: bool,
    exempt: Vec<AccountCurrency>,
    node: Arc<MockNodeClient>,
) -> BlockStorageHelper {
    let config = StorageHelperConfig::for_testing()
        .with_lookup_balance_by_block(lookup)
        .with_exempt_accounts(exempt);
    BlockStorageHelper::new(config, node, ruleset(network())).unwrap()
}

#[tokio::test]
async fn zero_balance_for_any_block_when_lookup_disabled() {
    init_logging();
    let node = Arc::new(MockNodeClient::default().failing(NodeError::Unavailable("down".into())));
    let helper = helper(false, vec![], node.clone());

    for block in [
        BlockIdentifier::new(0, "0x0"),
        target_block(),
        BlockIdentifier::new(i64::MAX, "0xffff"),
    ] {
        let amount = helper
            .account_balance(
                &LookupContext::background(),
                &AccountIdentifier::new("0xabc"),
                &btc(),
                &block,
            )
            .await
            .unwrap();
        assert_eq!(amount.value, "0");
        assert_eq!(amount.currency, btc());
    }
    assert_eq!(node.call_count(), 0);
}

#[tokio::test]
async fn requested_currency_is_authoritative() {
    init_logging();
    let mut requested = Currency::new("USDC", 6);
    let mut meta = Metadata::new();
    meta.insert("contract".to_string(), serde_json::json!("0xA0b8"));
    requested.metadata = Some(meta);

    // The node drops the currency metadata in its response.
    let node = Arc::new(
        MockNodeClient::default().with_balance("0xabc", Amount::new("42", Currency::new("USDC", 6))),
    );
    let helper = helper(true, vec![], node);

    let amount = helper
        .account_balance(
            &LookupContext::background(),
            &AccountIdentifier::new("0xabc"),
            &requested,
            &target_block(),
        )
        .await
        .unwrap();
    assert_eq!(amount, Amount::new("42", requested));
}

#[tokio::test]
async fn remote_failure_is_never_masked_as_zero() {
    init_logging();
    let node = Arc::new(MockNodeClient::default());
    let helper = helper(true, vec![], node);

    let err = helper
        .account_balance(
            &LookupContext::background(),
            &AccountIdentifier::new("0xunknown"),
            &btc(),
            &target_block(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), StorageHelperErrorKind::RemoteLookupFailure);
    assert!(err.to_string().contains("storage helper"));

    let chain = error_chain(&err);
    assert!(chain.iter().any(|cause| cause.contains("Account not found: 0xunknown")));
    assert!(matches!(
        err,
        StorageHelperError::BalanceLookupFailed {
            source: FetchError::Node(NodeError::AccountNotFound { .. })
        }
    ));
}

#[tokio::test]
async fn missing_currency_in_response_fails_lookup() {
    init_logging();
    let node = Arc::new(
        MockNodeClient::default().with_balance("0xabc", Amount::new("7", Currency::new("ETH", 18))),
    );
    let helper = helper(true, vec![], node);

    let err = helper
        .account_balance(
            &LookupContext::background(),
            &AccountIdentifier::new("0xabc"),
            &btc(),
            &target_block(),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StorageHelperError::BalanceLookupFailed {
            source: FetchError::CurrencyNotFound { ref symbol }
        } if symbol == "BTC"
    ));
}

#[tokio::test]
async fn cancellation_aborts_inflight_lookup() {
    init_logging();
    let node = Arc::new(
        MockNodeClient::default()
            .with_balance("0xabc", Amount::new("1", btc()))
            .with_delay(Duration::from_secs(3_600)),
    );
    // No per-request timeout: only the caller can end the request.
    let mut config = StorageHelperConfig::for_testing();
    config.fetcher.request_timeout_ms = None;
    let helper =
        Arc::new(BlockStorageHelper::new(config, node.clone(), ruleset(network())).unwrap());

    let (ctx, handle) = LookupContext::with_cancel();
    let worker = {
        let helper = Arc::clone(&helper);
        tokio::spawn(async move {
            helper
                .account_balance(&ctx, &AccountIdentifier::new("0xabc"), &btc(), &target_block())
                .await
        })
    };

    while node.call_count() == 0 {
        tokio::task::yield_now().await;
    }
    handle.cancel();

    let result = tokio::time::timeout(Duration::from_secs(5), worker)
        .await
        .expect("lookup did not abort after cancellation")
        .unwrap();
    let err = result.unwrap_err();
    assert!(err.is_cancellation());
    assert!(matches!(
        err,
        StorageHelperError::Cancelled {
            source: ContextError::Cancelled
        }
    ));
}

#[tokio::test(start_paused = true)]
async fn caller_deadline_is_distinct_from_remote_failure() {
    init_logging();
    let node = Arc::new(
        MockNodeClient::default()
            .with_balance("0xabc", Amount::new("1", btc()))
            .with_delay(Duration::from_secs(60)),
    );
    let helper = helper(true, vec![], node);

    let ctx = LookupContext::with_timeout(Duration::from_millis(200));
    let err = helper
        .account_balance(&ctx, &AccountIdentifier::new("0xabc"), &btc(), &target_block())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), StorageHelperErrorKind::Cancellation);
    assert!(matches!(
        err,
        StorageHelperError::Cancelled {
            source: ContextError::DeadlineExceeded
        }
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_lookups_do_not_cross_contaminate() {
    init_logging();
    let mut node = MockNodeClient::default();
    for i in 0..32 {
        node = node.with_balance(format!("0x{i:02x}"), Amount::new(format!("{}", i * 1_000), btc()));
    }
    let node = Arc::new(node);
    let helper = Arc::new(helper(true, vec![], node.clone()));

    let mut workers = Vec::new();
    for i in 0..32 {
        let helper = Arc::clone(&helper);
        workers.push(tokio::spawn(async move {
            let account = AccountIdentifier::new(format!("0x{i:02x}"));
            let amount = helper
                .account_balance(&LookupContext::background(), &account, &btc(), &target_block())
                .await
                .unwrap();
            (i, amount)
        }));
    }

    for worker in workers {
        let (i, amount) = worker.await.unwrap();
        assert_eq!(amount.value, format!("{}", i * 1_000));
        assert_eq!(amount.currency, btc());
    }
    assert_eq!(node.call_count(), 32);
}

#[tokio::test]
async fn exemption_filter_from_file() {
    init_logging();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"[{{"account_identifier": {{"address": "0xFEE"}}, "currency": {{"symbol": "BTC", "decimals": 8}}}}]"#
    )
    .unwrap();
    let exempt = load_exempt_accounts(file.path()).unwrap();
    let helper = helper(false, exempt, Arc::new(MockNodeClient::default()));

    let on = |currency: Currency| {
        Operation::new(
            0,
            "FEE",
            AccountIdentifier::new("0xFEE"),
            Amount::new("-5", currency),
        )
        .with_status("SUCCESS")
    };

    let filter = helper.exempt_func();
    assert!(filter.is_exempt(&on(btc())));
    assert!(!filter.is_exempt(&on(Currency::new("ETH", 18))));

    // Idempotent: a second filter from the same helper agrees.
    let again = helper.exempt_func();
    assert_eq!(again.as_slice(), filter.as_slice());
    assert!(again.is_exempt(&on(btc())));
}

#[tokio::test]
async fn empty_exempt_list_exempts_nothing() {
    let helper = helper(false, vec![], Arc::new(MockNodeClient::default()));
    let op = Operation::new(
        0,
        "TRANSFER",
        AccountIdentifier::new("0xFEE"),
        Amount::new("1", btc()),
    );
    assert!(!helper.exempt_func().is_exempt(&op));
    assert!(!helper.is_exempt(&op));
}

#[tokio::test]
async fn asserter_validates_indexed_operations() {
    let helper = helper(false, vec![], Arc::new(MockNodeClient::default()));
    let asserter = helper.asserter();

    assert_eq!(asserter.network(), &network());
    assert!(asserter.supports_historical_balance_lookup());

    let op = Operation::new(
        0,
        "TRANSFER",
        AccountIdentifier::new("0xabc"),
        Amount::new("10", btc()),
    )
    .with_status("FAILURE");
    assert!(asserter.operation_type(&op.op_type).is_ok());
    assert_eq!(asserter.operation_successful(&op), Ok(false));
    assert!(Arc::ptr_eq(&asserter, &helper.asserter()));
}

#[test]
fn config_file_round_trip_into_helper() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "network": {{"blockchain": "quantum-chain", "network": "testnet"}},
            "lookup_balance_by_block": true,
            "exempt_accounts": [
                {{"account_identifier": {{"address": "0xMINT"}}, "currency": {{"symbol": "QC", "decimals": 18}}}}
            ],
            "fetcher": {{"max_retries": 1, "retry_delay_ms": 5}}
        }}"#
    )
    .unwrap();

    let config = StorageHelperConfig::from_file(file.path()).unwrap();
    assert_eq!(config.fetcher.max_retries, 1);
    assert_eq!(config.fetcher.max_retry_delay_ms, 5_000);

    let helper = BlockStorageHelper::new(
        config,
        Arc::new(MockNodeClient::default()),
        ruleset(network()),
    )
    .unwrap();
    assert!(helper.lookup_balance_by_block());
    assert_eq!(helper.exempt_func().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn retry_budget_from_config_is_honoured() {
    init_logging();
    let node = Arc::new(MockNodeClient::default().failing(NodeError::Network("down".into())));
    let mut config = StorageHelperConfig::for_testing();
    config.fetcher = FetcherConfig {
        max_retries: 0,
        ..FetcherConfig::default()
    };
    let helper = BlockStorageHelper::new(config, node.clone(), ruleset(network())).unwrap();

    let err = helper
        .account_balance(
            &LookupContext::background(),
            &AccountIdentifier::new("0xabc"),
            &btc(),
            &target_block(),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StorageHelperError::BalanceLookupFailed {
            source: FetchError::RetriesExhausted { attempts: 1, .. }
        }
    ));
    assert_eq!(node.call_count(), 1);
}

#[test]
fn ruleset_for_another_network_is_rejected_at_construction() {
    let result = BlockStorageHelper::new(
        StorageHelperConfig::for_testing(),
        Arc::new(MockNodeClient::default()),
        ruleset(NetworkIdentifier::new("bitcoin", "mainnet")),
    );
    let err = result.err().expect("mismatched network accepted");
    assert!(matches!(err, ConfigError::NetworkMismatch { .. }));
    assert_eq!(
        err.to_string(),
        "Configured network quantum-chain/testnet does not match data source network bitcoin/mainnet"
    );
}
