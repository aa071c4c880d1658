use assert_matches::assert_matches;
use l1_adapter_integration_tests::{
    MockL1, Tester, bsc_testnet_fee_history, eventually, payload, wait_for_state,
};
use l1_adapter_network::{BSC_TESTNET_CHAIN_ID, ETHEREUM_MAINNET_CHAIN_ID, GWEI};
use l1_adapter_sender::{TrackerError, TxFailure, TxFailureReason, TxState};
use std::time::Duration;

#[test_log::test(tokio::test(start_paused = true))]
async fn bsc_testnet_truncated_fee_history() -> anyhow::Result<()> {
    let l1 = MockL1::new(5_000, bsc_testnet_fee_history());
    let tester = Tester::builder(BSC_TESTNET_CHAIN_ID)
        .l1(l1.clone())
        .start()?;

    let handle = tester.tracker.submit(payload(0)).await?;
    wait_for_state(&handle, "broadcast", |state| *state == TxState::Submitted).await;

    // Zero base fees and missing rewards fall back to the profile.
    let sent = l1.last_broadcast().unwrap();
    assert_eq!(sent.quote.priority_fee_wei, GWEI / 10);
    assert_eq!(sent.quote.base_fee_wei, GWEI);

    let block_number = l1.include(sent.hash, true);
    l1.advance(2);
    let confirmation = handle.wait().await?;
    assert_eq!(confirmation.tx_hash, sent.hash);
    assert_eq!(confirmation.block_number, block_number);
    assert_eq!(confirmation.attempt_count, 1);
    assert!(tester.tracker.in_flight().is_empty());

    tester.stop().await
}

#[test_log::test(tokio::test(start_paused = true))]
async fn ethereum_waits_for_twelve_confirmations() -> anyhow::Result<()> {
    let tester = Tester::builder(ETHEREUM_MAINNET_CHAIN_ID).start()?;
    let l1 = tester.l1.clone();

    let handle = tester.tracker.submit(payload(3)).await?;
    wait_for_state(&handle, "broadcast", |state| *state == TxState::Submitted).await;
    let sent = l1.last_broadcast().unwrap();
    assert_eq!(sent.quote.base_fee_wei, 20 * GWEI);
    assert_eq!(sent.quote.priority_fee_wei, 2 * GWEI);

    l1.include(sent.hash, true);
    l1.advance(11);
    wait_for_state(&handle, "11 confirmations", |state| {
        *state == TxState::AwaitingConfirmations { depth: 11 }
    })
    .await;

    l1.advance(1);
    handle.wait().await?;
    tester.stop().await
}

#[test_log::test(tokio::test(start_paused = true))]
async fn ethereum_shape_violation_fails_transaction() -> anyhow::Result<()> {
    let l1 = MockL1::new(1_000, bsc_testnet_fee_history());
    let tester = Tester::builder(ETHEREUM_MAINNET_CHAIN_ID)
        .l1(l1.clone())
        .start()?;

    let handle = tester.tracker.submit(payload(0)).await?;
    let err = handle.wait().await.unwrap_err();
    assert_matches!(
        err,
        TrackerError::Failed(TxFailure {
            reason: TxFailureReason::FeeHistoryShapeViolation(_),
            attempt_count: 0,
            ..
        })
    );
    assert!(l1.broadcasts().is_empty());

    tester.stop().await
}

#[test_log::test(tokio::test(start_paused = true))]
async fn stuck_transaction_is_repriced_until_budget_is_exhausted() -> anyhow::Result<()> {
    let l1 = MockL1::new(1_000, bsc_testnet_fee_history());
    let tester = Tester::builder(BSC_TESTNET_CHAIN_ID)
        .l1(l1.clone())
        .config(|config| {
            config.max_attempts = 3;
            config.stuck_timeout_blocks = 2;
        })
        .start()?;

    let stuck_timeout = tester.tracker.operating_config().stuck_timeout;
    let poll_interval = tester.tracker.operating_config().poll_interval;
    assert_eq!(stuck_timeout, Duration::from_secs(6));

    let handle = tester.tracker.submit(payload(42)).await?;
    wait_for_state(&handle, "broadcast", |state| *state == TxState::Submitted).await;
    tokio::time::sleep(stuck_timeout - Duration::from_secs(1)).await;
    assert_eq!(l1.broadcasts().len(), 1, "re-priced before the stuck timeout");

    let err = handle.wait().await.unwrap_err();
    let TrackerError::Failed(failure) = err else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(
        failure.reason,
        TxFailureReason::RetryBudgetExhausted { max_attempts: 3 }
    );
    assert_eq!(failure.attempt_count, 3);
    assert_eq!(failure.last_quote().unwrap().priority_fee_wei, 2 * GWEI / 5);

    let broadcasts = l1.broadcasts();
    assert_eq!(broadcasts.len(), 3);
    assert!(broadcasts.iter().all(|tx| tx.nonce == 42));
    let priority_fees: Vec<_> = broadcasts
        .iter()
        .map(|tx| tx.quote.priority_fee_wei)
        .collect();
    assert_eq!(priority_fees, vec![GWEI / 10, GWEI / 5, 2 * GWEI / 5]);

    // One replacement per timeout interval, sent on the first poll after the timeout.
    for (previous, next) in broadcasts.iter().zip(&broadcasts[1..]) {
        let gap = next.sent_at - previous.sent_at;
        assert!(gap >= stuck_timeout, "replacement sent after {gap:?}");
        assert!(gap <= stuck_timeout + poll_interval, "replacement sent after {gap:?}");
    }

    tester.stop().await
}

#[test_log::test(tokio::test(start_paused = true))]
async fn earlier_attempt_mined_while_replacements_are_rejected() -> anyhow::Result<()> {
    let l1 = MockL1::new(1_000, bsc_testnet_fee_history());
    let tester = Tester::builder(BSC_TESTNET_CHAIN_ID)
        .l1(l1.clone())
        .start()?;

    let handle = tester.tracker.submit(payload(0)).await?;
    wait_for_state(&handle, "broadcast", |state| *state == TxState::Submitted).await;
    let first = l1.last_broadcast().unwrap();

    // Replacements of a mined transaction are rejected by nodes.
    l1.reject_next(100, "nonce too low");
    wait_for_state(&handle, "stuck", |state| *state == TxState::Stuck).await;
    let block_number = l1.include(first.hash, true);
    l1.advance(10);

    let confirmation = handle.wait().await?;
    assert_eq!(confirmation.tx_hash, first.hash);
    assert_eq!(confirmation.block_number, block_number);
    assert!(confirmation.attempt_count < tester.tracker.operating_config().max_attempts);
    assert_eq!(l1.broadcasts().len(), 1);

    tester.stop().await
}

#[test_log::test(tokio::test(start_paused = true))]
async fn rejected_broadcast_is_repriced() -> anyhow::Result<()> {
    let l1 = MockL1::new(1_000, bsc_testnet_fee_history());
    l1.reject_next(1, "replacement transaction underpriced");
    let tester = Tester::builder(BSC_TESTNET_CHAIN_ID)
        .l1(l1.clone())
        .start()?;

    let handle = tester.tracker.submit(payload(0)).await?;
    wait_for_state(&handle, "accepted broadcast", |state| {
        *state == TxState::Submitted
    })
    .await;
    let status = handle.details();
    assert_eq!(status.attempt_count, 2);
    assert_eq!(status.quote_history.len(), 2);

    let broadcasts = l1.broadcasts();
    assert_eq!(broadcasts.len(), 1);
    assert_eq!(broadcasts[0].quote.priority_fee_wei, GWEI / 5);

    l1.include(broadcasts[0].hash, true);
    l1.advance(2);
    assert_eq!(handle.wait().await?.attempt_count, 2);
    tester.stop().await
}

#[test_log::test(tokio::test(start_paused = true))]
async fn configured_fee_bounds_override_profile() -> anyhow::Result<()> {
    let l1 = MockL1::new(1_000, bsc_testnet_fee_history());
    let tester = Tester::builder(BSC_TESTNET_CHAIN_ID)
        .l1(l1.clone())
        .config(|config| {
            config.min_priority_fee_wei = Some(GWEI as u64 / 2);
            config.target_base_fee_wei = Some(2 * GWEI as u64);
        })
        .start()?;
    assert_eq!(tester.tracker.profile().min_priority_fee_wei, GWEI / 2);

    let handle = tester.tracker.submit(payload(0)).await?;
    wait_for_state(&handle, "broadcast", |state| *state == TxState::Submitted).await;
    let sent = l1.last_broadcast().unwrap();
    assert_eq!(sent.quote.priority_fee_wei, GWEI / 2);
    assert_eq!(sent.quote.base_fee_wei, 2 * GWEI);
    tester.stop().await?;

    let inverted = Tester::builder(BSC_TESTNET_CHAIN_ID)
        .l1(l1)
        .config(|config| config.max_priority_fee_wei = Some(GWEI as u64 / 100))
        .start();
    assert!(inverted.is_err());
    Ok(())
}

#[test_log::test(tokio::test(start_paused = true))]
async fn in_flight_limit_blocks_submissions() -> anyhow::Result<()> {
    let l1 = MockL1::new(1_000, bsc_testnet_fee_history());
    let tester = Tester::builder(BSC_TESTNET_CHAIN_ID)
        .l1(l1.clone())
        .config(|config| config.max_in_flight_tx = Some(2))
        .start()?;

    let first = tester.tracker.submit(payload(0)).await?;
    let _second = tester.tracker.submit(payload(1)).await?;
    let blocked =
        tokio::time::timeout(Duration::from_secs(5), tester.tracker.submit(payload(2))).await;
    assert!(blocked.is_err(), "third submission must wait for a free slot");
    assert_eq!(tester.tracker.in_flight().len(), 2);

    wait_for_state(&first, "broadcast", |state| *state == TxState::Submitted).await;
    let sent = l1
        .broadcasts()
        .into_iter()
        .find(|tx| tx.nonce == 0)
        .unwrap();
    l1.include(sent.hash, true);
    l1.advance(2);
    first.wait().await?;

    let third =
        tokio::time::timeout(Duration::from_secs(5), tester.tracker.submit(payload(2))).await??;
    assert_eq!(third.details().nonce, 2);
    tester.stop().await
}

#[test_log::test(tokio::test(start_paused = true))]
async fn cancel_pending_transaction() -> anyhow::Result<()> {
    let l1 = MockL1::new(1_000, bsc_testnet_fee_history());
    // Keeps transactions pending.
    l1.set_fee_history(None);
    let tester = Tester::builder(BSC_TESTNET_CHAIN_ID)
        .l1(l1.clone())
        .start()?;

    let handle = tester.tracker.submit(payload(0)).await?;
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(handle.status(), TxState::Pending);
    assert!(l1.fee_history_requests() > 0);

    handle.cancel()?;
    assert_matches!(handle.wait().await, Err(TrackerError::Cancelled(id)) if id == handle.id());
    assert!(l1.broadcasts().is_empty());
    assert!(tester.tracker.in_flight().is_empty());

    tester.stop().await
}

#[test_log::test(tokio::test(start_paused = true))]
async fn cancel_after_broadcast_is_ignored() -> anyhow::Result<()> {
    let l1 = MockL1::new(1_000, bsc_testnet_fee_history());
    let tester = Tester::builder(BSC_TESTNET_CHAIN_ID)
        .l1(l1.clone())
        .start()?;

    let handle = tester.tracker.submit(payload(0)).await?;
    wait_for_state(&handle, "broadcast", |state| *state == TxState::Submitted).await;
    handle.cancel()?;
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(handle.status(), TxState::Submitted);

    let sent = l1.last_broadcast().unwrap();
    l1.include(sent.hash, true);
    l1.advance(2);
    handle.wait().await?;
    tester.stop().await
}

#[test_log::test(tokio::test(start_paused = true))]
async fn reorged_transaction_is_tracked_again() -> anyhow::Result<()> {
    let l1 = MockL1::new(1_000, bsc_testnet_fee_history());
    let tester = Tester::builder(BSC_TESTNET_CHAIN_ID)
        .l1(l1.clone())
        .start()?;

    let handle = tester.tracker.submit(payload(0)).await?;
    wait_for_state(&handle, "broadcast", |state| *state == TxState::Submitted).await;
    let sent = l1.last_broadcast().unwrap();

    l1.include(sent.hash, true);
    l1.advance(1);
    wait_for_state(&handle, "inclusion", |state| {
        *state == TxState::AwaitingConfirmations { depth: 1 }
    })
    .await;

    l1.drop_receipt(sent.hash);
    wait_for_state(&handle, "reorg", |state| *state == TxState::Submitted).await;

    let block_number = l1.include(sent.hash, true);
    l1.advance(2);
    let confirmation = handle.wait().await?;
    assert_eq!(confirmation.block_number, block_number);
    assert_eq!(l1.broadcasts().len(), 1);
    tester.stop().await
}

#[test_log::test(tokio::test(start_paused = true))]
async fn reverted_transaction_fails() -> anyhow::Result<()> {
    let l1 = MockL1::new(1_000, bsc_testnet_fee_history());
    let tester = Tester::builder(BSC_TESTNET_CHAIN_ID)
        .l1(l1.clone())
        .start()?;

    let handle = tester.tracker.submit(payload(0)).await?;
    wait_for_state(&handle, "broadcast", |state| *state == TxState::Submitted).await;
    let block_number = l1.include(l1.last_broadcast().unwrap().hash, false);

    let err = handle.wait().await.unwrap_err();
    assert_matches!(
        err,
        TrackerError::Failed(TxFailure { reason: TxFailureReason::Reverted { block_number: reverted_in }, .. })
            if reverted_in == block_number
    );
    tester.stop().await
}

#[test_log::test(tokio::test(start_paused = true))]
async fn restarted_tracker_requeries_instead_of_rebroadcasting() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let state_path = dir.path().join("tracker.json");
    let l1 = MockL1::new(1_000, bsc_testnet_fee_history());

    let tester = Tester::builder(BSC_TESTNET_CHAIN_ID)
        .l1(l1.clone())
        .config(|config| config.state_path = Some(state_path.clone()))
        .start()?;
    let handle = tester.tracker.submit(payload(7)).await?;
    wait_for_state(&handle, "broadcast", |state| *state == TxState::Submitted).await;
    tester.stop().await?;
    assert!(state_path.exists());
    assert_matches!(handle.wait().await, Err(TrackerError::Stopped));

    // Mined while the tracker was down.
    let sent = l1.last_broadcast().unwrap();
    l1.include(sent.hash, true);
    l1.advance(2);

    let restarted = Tester::builder(BSC_TESTNET_CHAIN_ID)
        .l1(l1.clone())
        .config(|config| config.state_path = Some(state_path.clone()))
        .start()?;
    // Owned by the running tracker now; a crash must not replay it.
    assert!(!state_path.exists());
    let restored = restarted.tracker.in_flight();
    assert_eq!(restored.len(), 1);
    assert_eq!(restored[0].nonce, 7);
    assert_eq!(restored[0].state, TxState::Submitted);

    eventually("restored transaction to confirm", || {
        restarted.tracker.in_flight().is_empty()
    })
    .await;
    assert_eq!(l1.broadcasts().len(), 1);

    // Ids of restored transactions are not reused.
    let next = restarted.tracker.submit(payload(8)).await?;
    assert!(next.id() > restored[0].id);
    restarted.stop().await
}

#[test_log::test(tokio::test(start_paused = true))]
async fn restored_transaction_is_repriced_only_after_timeout() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let state_path = dir.path().join("tracker.json");
    let l1 = MockL1::new(1_000, bsc_testnet_fee_history());

    let tester = Tester::builder(BSC_TESTNET_CHAIN_ID)
        .l1(l1.clone())
        .config(|config| config.state_path = Some(state_path.clone()))
        .start()?;
    let handle = tester.tracker.submit(payload(7)).await?;
    wait_for_state(&handle, "broadcast", |state| *state == TxState::Submitted).await;
    tester.stop().await?;

    let restarted = Tester::builder(BSC_TESTNET_CHAIN_ID)
        .l1(l1.clone())
        .config(|config| config.state_path = Some(state_path.clone()))
        .start()?;
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(l1.broadcasts().len(), 1);

    eventually("replacement broadcast", || l1.broadcasts().len() == 2).await;
    let broadcasts = l1.broadcasts();
    assert_eq!(broadcasts[1].nonce, 7);
    assert!(broadcasts[1].quote.priority_fee_wei > broadcasts[0].quote.priority_fee_wei);
    let restored = restarted.tracker.in_flight();
    assert_eq!(restored[0].attempt_count, 2);

    restarted.stop().await
}
