use crate::client::{L1Client, ReceiptInfo, SendError};
use crate::config::TrackerConfig;
use crate::metrics::METRICS;
use crate::model::{
    Confirmation, PayloadSigner, TrackedTransaction, TransactionPayload, TxFailure,
    TxFailureReason, TxId, TxState, TxStatus,
};
use crate::persistence::{self, PersistedTx};
use crate::pricing::{PricingError, fetch_sample, timed_rpc};
use alloy::primitives::TxHash;
use anyhow::Context;
use backon::{ExponentialBuilder, Retryable};
use dashmap::DashMap;
use futures::{StreamExt, stream};
use itertools::Itertools;
use l1_adapter_gas_oracle::{FeeHistorySample, GasQuote, Urgency, recommend, reprice};
use l1_adapter_network::{L1OperatingConfig, NetworkProfile, classify, resolve};
use std::collections::BTreeMap;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Semaphore, mpsc, oneshot, watch};
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error(transparent)]
    Failed(#[from] TxFailure),
    #[error("L1 transaction {0} was cancelled")]
    Cancelled(TxId),
    #[error("submission tracker is stopped")]
    Stopped,
}

#[derive(Debug)]
enum Command {
    Submit(TrackedTransaction),
    Cancel(TxId),
    Shutdown(oneshot::Sender<()>),
}

/// Submits transactions to L1 and follows them until they are confirmed or given up on.
///
/// This is a cheap-to-clone handle; all state is owned by the [`TrackerTask`] returned alongside
/// it, which must be spawned for anything to happen.
#[derive(Debug, Clone)]
pub struct SubmissionTracker {
    profile: NetworkProfile,
    operating_config: L1OperatingConfig,
    commands: mpsc::UnboundedSender<Command>,
    /// One permit per in-flight transaction.
    slots: Arc<Semaphore>,
    statuses: Arc<DashMap<TxId, TxStatus>>,
    next_id: Arc<AtomicU64>,
}

impl SubmissionTracker {
    /// Classifies the L1 network, resolves its operating config and restores transactions
    /// persisted by a previous run, if any.
    ///
    /// The state file is removed once restored, so that a crash of this run never replays it.
    pub fn new(
        chain_id: u64,
        rpc_url_hint: Option<&str>,
        config: TrackerConfig,
        client: Arc<dyn L1Client>,
        signer: Arc<dyn PayloadSigner>,
    ) -> anyhow::Result<(Self, TrackerTask)> {
        let profile = config
            .apply_fee_overrides(classify(chain_id, rpc_url_hint))
            .context("invalid L1 fee overrides")?;
        let operating_config = resolve(&profile).with_overrides(&config.overrides());

        let restored = match &config.state_path {
            Some(path) => {
                let restored = persistence::load(path, chain_id)?;
                persistence::clear(path)?;
                restored
            }
            None => Vec::new(),
        };
        let next_id = restored.iter().map(|tx| tx.id.0 + 1).max().unwrap_or(0);

        let slots = Arc::new(Semaphore::new(operating_config.max_in_flight_tx as usize));
        let statuses = Arc::new(DashMap::new());
        let mut in_flight = BTreeMap::new();
        for persisted in restored {
            // Restored transactions may exceed a since lowered limit; they are tracked regardless.
            let slot = slots.clone().try_acquire_owned().ok();
            let tx = persisted.restore(slot);
            statuses.insert(tx.id, tx.status());
            in_flight.insert(tx.id, tx);
        }
        if !in_flight.is_empty() {
            tracing::info!(
                chain_id,
                count = in_flight.len(),
                "restored in-flight L1 transactions"
            );
        }

        let (commands_sender, commands) = mpsc::unbounded_channel();
        let tracker = Self {
            profile,
            operating_config,
            commands: commands_sender,
            slots: slots.clone(),
            statuses: statuses.clone(),
            next_id: Arc::new(AtomicU64::new(next_id)),
        };
        let task = TrackerTask {
            profile,
            config: operating_config,
            tracker_config: config,
            client,
            signer,
            commands,
            slots,
            statuses,
            in_flight,
        };
        Ok((tracker, task))
    }

    pub fn profile(&self) -> &NetworkProfile {
        &self.profile
    }

    pub fn operating_config(&self) -> &L1OperatingConfig {
        &self.operating_config
    }

    /// Hands a transaction over to the tracker.
    ///
    /// Waits while `max_in_flight_tx` transactions are already tracked.
    pub async fn submit(
        &self,
        payload: TransactionPayload,
    ) -> Result<TrackedTransactionHandle, TrackerError> {
        let slot = self
            .slots
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| TrackerError::Stopped)?;
        let id = TxId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let nonce = payload.nonce;
        let tx = TrackedTransaction::new(id, payload, Some(slot));
        let handle = TrackedTransactionHandle {
            id,
            updates: tx.subscribe(),
            commands: self.commands.clone(),
        };

        self.statuses.insert(id, tx.status());
        if self.commands.send(Command::Submit(tx)).is_err() {
            self.statuses.remove(&id);
            return Err(TrackerError::Stopped);
        }
        tracing::debug!(%id, nonce, "accepted L1 transaction");
        Ok(handle)
    }

    pub fn status(&self, id: TxId) -> Option<TxStatus> {
        self.statuses.get(&id).map(|status| status.clone())
    }

    /// All transactions that are not finalized yet, ordered by id.
    pub fn in_flight(&self) -> Vec<TxStatus> {
        let mut statuses: Vec<_> = self
            .statuses
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        statuses.sort_by_key(|status| status.id);
        statuses
    }

    /// Stops the tracker, persisting in-flight transactions if a state path is configured.
    pub async fn shutdown(&self) -> anyhow::Result<()> {
        let (ack_sender, ack) = oneshot::channel();
        self.commands
            .send(Command::Shutdown(ack_sender))
            .map_err(|_| anyhow::anyhow!("submission tracker is already stopped"))?;
        ack.await
            .context("submission tracker stopped without persisting its state")
    }
}

/// Caller's view of a single tracked transaction.
#[derive(Debug, Clone)]
pub struct TrackedTransactionHandle {
    id: TxId,
    updates: watch::Receiver<TxStatus>,
    commands: mpsc::UnboundedSender<Command>,
}

impl TrackedTransactionHandle {
    pub fn id(&self) -> TxId {
        self.id
    }

    pub fn status(&self) -> TxState {
        self.updates.borrow().state.clone()
    }

    /// Full record including attempts made so far.
    pub fn details(&self) -> TxStatus {
        self.updates.borrow().clone()
    }

    /// Requests cancellation. Only takes effect if the transaction was not broadcast yet.
    pub fn cancel(&self) -> Result<(), TrackerError> {
        self.commands
            .send(Command::Cancel(self.id))
            .map_err(|_| TrackerError::Stopped)
    }

    /// Waits until the transaction reaches a terminal state.
    pub async fn wait(&self) -> Result<Confirmation, TrackerError> {
        let mut updates = self.updates.clone();
        let status = updates
            .wait_for(|status| status.state.is_terminal())
            .await
            .map_err(|_| TrackerError::Stopped)?
            .clone();
        match (status.state, status.tx_hash) {
            (TxState::Confirmed { block_number }, Some(tx_hash)) => Ok(Confirmation {
                tx_hash,
                block_number,
                attempt_count: status.attempt_count,
            }),
            (TxState::Failed(reason), _) => Err(TxFailure {
                id: status.id,
                nonce: status.nonce,
                reason,
                attempt_count: status.attempt_count,
                quote_history: status.quote_history,
            }
            .into()),
            (TxState::Cancelled, _) => Err(TrackerError::Cancelled(self.id)),
            _ => Err(TrackerError::Stopped),
        }
    }
}

/// Event loop of the tracker. The only writer of transaction state.
#[derive(Debug)]
pub struct TrackerTask {
    profile: NetworkProfile,
    config: L1OperatingConfig,
    tracker_config: TrackerConfig,
    client: Arc<dyn L1Client>,
    signer: Arc<dyn PayloadSigner>,
    commands: mpsc::UnboundedReceiver<Command>,
    slots: Arc<Semaphore>,
    statuses: Arc<DashMap<TxId, TxStatus>>,
    in_flight: BTreeMap<TxId, TrackedTransaction>,
}

impl TrackerTask {
    pub async fn run(mut self) -> anyhow::Result<()> {
        let head = self.wait_for_l1().await?;
        tracing::info!(
            chain_id = self.profile.chain_id,
            family = %self.profile.family,
            head,
            restored = self.in_flight.len(),
            config = ?self.config,
            "starting L1 submission tracker"
        );
        // Restored transactions are checked on chain before anything gets broadcast.
        self.check_receipts().await;

        let mut timer = tokio::time::interval(self.config.poll_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        timer.tick().await;

        let mut shutdown_ack = None;
        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        tracing::info!("all submission tracker handles dropped, stopping");
                        break;
                    };
                    if let ControlFlow::Break(ack) = self.handle_commands(command) {
                        shutdown_ack = Some(ack);
                        break;
                    }
                    self.broadcast_pending().await;
                }
                _ = timer.tick() => {
                    self.poll().await;
                }
            }
        }
        self.stop(shutdown_ack)
    }

    async fn wait_for_l1(&self) -> anyhow::Result<u64> {
        let timeout = self.tracker_config.rpc_timeout;
        (|| timed_rpc(timeout, "block_number", self.client.block_number()))
            .retry(
                ExponentialBuilder::default()
                    .with_factor(2.0)
                    .with_min_delay(Duration::from_secs(1))
                    .with_max_delay(Duration::from_secs(20))
                    .with_max_times(10),
            )
            .notify(|err, dur| {
                tracing::warn!(?err, ?dur, "retrying connection to L1");
            })
            .await
            .context("L1 is unreachable")
    }

    /// Handles `first` and everything else already queued, so that cancellations are applied
    /// before the next broadcast.
    fn handle_commands(&mut self, first: Command) -> ControlFlow<oneshot::Sender<()>> {
        self.handle_command(first)?;
        while let Ok(command) = self.commands.try_recv() {
            self.handle_command(command)?;
        }
        ControlFlow::Continue(())
    }

    fn handle_command(&mut self, command: Command) -> ControlFlow<oneshot::Sender<()>> {
        match command {
            Command::Submit(tx) => {
                tracing::info!(id = %tx.id, nonce = tx.payload.nonce, "tracking new L1 transaction");
                self.in_flight.insert(tx.id, tx);
            }
            Command::Cancel(id) => self.cancel(id),
            Command::Shutdown(ack) => return ControlFlow::Break(ack),
        }
        ControlFlow::Continue(())
    }

    fn cancel(&mut self, id: TxId) {
        match self.in_flight.get(&id).map(|tx| &tx.state) {
            Some(TxState::Pending) => {
                if let Some(mut tx) = self.in_flight.remove(&id) {
                    tx.transition(TxState::Cancelled);
                    self.put_back(tx);
                }
            }
            Some(state) => {
                tracing::info!(%id, state = state.label(), "L1 transaction already broadcast, ignoring cancellation");
            }
            None => {
                tracing::debug!(%id, "cancellation requested for unknown L1 transaction");
            }
        }
    }

    async fn poll(&mut self) {
        self.broadcast_pending().await;
        self.check_receipts().await;
        self.resubmit_stuck().await;
        self.report_metrics();
    }

    fn ids_in_state(&self, matches: impl Fn(&TxState) -> bool) -> Vec<TxId> {
        self.in_flight
            .values()
            .filter(|tx| matches(&tx.state))
            .map(|tx| tx.id)
            .collect()
    }

    async fn fee_history(&self) -> Result<FeeHistorySample, PricingError> {
        fetch_sample(
            self.client.as_ref(),
            &self.profile,
            self.tracker_config.fee_history_blocks,
            self.tracker_config.reward_percentile(),
            self.tracker_config.rpc_timeout,
        )
        .await
    }

    async fn broadcast_pending(&mut self) {
        let pending = self.ids_in_state(|state| *state == TxState::Pending);
        if pending.is_empty() {
            return;
        }
        let sample = match self.fee_history().await {
            Ok(sample) => sample,
            Err(err) => return self.on_pricing_error(&pending, err),
        };
        for id in pending {
            let Some(mut tx) = self.in_flight.remove(&id) else {
                continue;
            };
            let quote = recommend(&sample, &self.profile, Urgency::Normal);
            self.send_attempt(&mut tx, quote).await;
            self.put_back(tx);
        }
    }

    async fn resubmit_stuck(&mut self) {
        let stuck = self.ids_in_state(|state| *state == TxState::Stuck);
        let max_attempts = self.config.max_attempts;
        let (exhausted, to_reprice): (Vec<_>, Vec<_>) = stuck.into_iter().partition(|id| {
            self.in_flight
                .get(id)
                .is_some_and(|tx| tx.attempt_count >= max_attempts)
        });

        for id in exhausted {
            let Some(mut tx) = self.in_flight.remove(&id) else {
                continue;
            };
            // An earlier attempt may have been mined since the last receipt check.
            match self.latest_receipt(&tx.tx_hashes).await {
                Ok(Some((head, hash, receipt))) => self.on_receipt(&mut tx, head, hash, receipt),
                Ok(None) => {
                    tx.transition(TxState::Failed(TxFailureReason::RetryBudgetExhausted {
                        max_attempts,
                    }));
                }
                Err(err) => {
                    tracing::warn!(id = %tx.id, "failed to query L1 receipts before giving up, will retry on next poll: {err:#}");
                }
            }
            self.put_back(tx);
        }
        if to_reprice.is_empty() {
            return;
        }

        let sample = match self.fee_history().await {
            Ok(sample) => sample,
            Err(err) => return self.on_pricing_error(&to_reprice, err),
        };
        for id in to_reprice {
            let Some(mut tx) = self.in_flight.remove(&id) else {
                continue;
            };
            let quote = match tx.last_quote() {
                Some(previous) => reprice(previous, &sample, &self.profile),
                None => recommend(&sample, &self.profile, Urgency::Fast),
            };
            tracing::info!(
                id = %tx.id,
                nonce = tx.payload.nonce,
                attempt = tx.attempt_count + 1,
                base_fee = quote.base_fee_wei,
                priority_fee = quote.priority_fee_wei,
                "re-pricing stuck L1 transaction"
            );
            tx.transition(TxState::Resubmitted);
            self.send_attempt(&mut tx, quote).await;
            self.put_back(tx);
        }
    }

    fn on_pricing_error(&mut self, ids: &[TxId], err: PricingError) {
        match err {
            PricingError::ShapeViolation(violation) => {
                tracing::error!(%violation, "cannot price L1 transactions");
                for id in ids {
                    if let Some(mut tx) = self.in_flight.remove(id) {
                        tx.transition(TxState::Failed(
                            TxFailureReason::FeeHistoryShapeViolation(violation.to_string()),
                        ));
                        self.put_back(tx);
                    }
                }
            }
            PricingError::Unavailable(err) => {
                METRICS.fee_history_failures.inc();
                tracing::warn!(
                    count = ids.len(),
                    "failed to price L1 transactions, will retry on next poll: {err:#}"
                );
            }
        }
    }

    /// Signs and broadcasts one attempt of `tx` priced with `quote`.
    ///
    /// Ends in `Submitted` whenever the transaction may have reached the mempool, in `Stuck` if
    /// the node rejected it.
    async fn send_attempt(&self, tx: &mut TrackedTransaction, quote: GasQuote) {
        let signed = match self.signer.sign(&tx.payload, &quote).await {
            Ok(signed) => signed,
            Err(err) => {
                tracing::error!(id = %tx.id, nonce = tx.payload.nonce, "failed to sign L1 transaction: {err:#}");
                tx.transition(TxState::Failed(TxFailureReason::Signing(format!("{err:#}"))));
                return;
            }
        };

        tx.attempt_count += 1;
        tx.quote_history.push(quote);
        tx.last_submitted_at = Instant::now();
        METRICS.broadcasts.inc();

        let timeout = self.tracker_config.rpc_timeout;
        let result = tokio::time::timeout(timeout, self.client.broadcast(&signed.raw))
            .await
            .unwrap_or_else(|_| {
                Err(SendError::Transport(anyhow::anyhow!(
                    "broadcast timed out after {timeout:?}"
                )))
            });
        match result {
            Ok(hash) => {
                tx.tx_hashes.push(signed.hash);
                if hash != signed.hash {
                    tracing::warn!(id = %tx.id, expected = %signed.hash, reported = %hash, "L1 node reported unexpected transaction hash");
                    tx.tx_hashes.push(hash);
                }
                tracing::info!(
                    id = %tx.id,
                    nonce = tx.payload.nonce,
                    attempt = tx.attempt_count,
                    %hash,
                    base_fee = quote.base_fee_wei,
                    priority_fee = quote.priority_fee_wei,
                    "broadcast L1 transaction"
                );
                tx.transition(TxState::Submitted);
            }
            Err(SendError::Rejected(reason)) => {
                METRICS.rejected_broadcasts.inc();
                tracing::warn!(
                    id = %tx.id,
                    nonce = tx.payload.nonce,
                    attempt = tx.attempt_count,
                    %reason,
                    "L1 node rejected transaction, it will be re-priced"
                );
                tx.transition(TxState::Stuck);
            }
            Err(SendError::Transport(err)) => {
                // The node may have accepted it; its receipt is looked for like for any other.
                tx.tx_hashes.push(signed.hash);
                tracing::warn!(
                    id = %tx.id,
                    nonce = tx.payload.nonce,
                    hash = %signed.hash,
                    "outcome of L1 broadcast is unknown: {err:#}"
                );
                tx.transition(TxState::Submitted);
            }
        }
    }

    /// Looks for receipts of every transaction that was broadcast at least once, including stuck
    /// ones: an earlier attempt may get mined while its replacements are rejected.
    async fn check_receipts(&mut self) {
        let watched: Vec<(TxId, Vec<TxHash>)> = self
            .in_flight
            .values()
            .filter(|tx| {
                matches!(
                    tx.state,
                    TxState::Submitted | TxState::AwaitingConfirmations { .. } | TxState::Stuck
                ) && tx.was_broadcast()
            })
            .map(|tx| (tx.id, tx.tx_hashes.clone()))
            .collect();
        if watched.is_empty() {
            return;
        }

        let timeout = self.tracker_config.rpc_timeout;
        let head = match timed_rpc(timeout, "block_number", self.client.block_number()).await {
            Ok(head) => head,
            Err(err) => {
                tracing::warn!("failed to get L1 head, skipping receipt checks: {err:#}");
                return;
            }
        };

        let client = self.client.as_ref();
        let receipts: Vec<_> = stream::iter(watched)
            .map(|(id, hashes)| async move { (id, find_receipt(client, timeout, &hashes).await) })
            .buffer_unordered(self.tracker_config.receipt_query_concurrency.max(1))
            .collect()
            .await;

        for (id, receipt) in receipts {
            let Some(mut tx) = self.in_flight.remove(&id) else {
                continue;
            };
            match receipt {
                Ok(Some((hash, receipt))) => self.on_receipt(&mut tx, head, hash, receipt),
                Ok(None) => self.on_missing_receipt(&mut tx),
                Err(err) => {
                    tracing::warn!(%id, "failed to query L1 receipt, will retry on next poll: {err:#}");
                }
            }
            self.put_back(tx);
        }
    }

    fn on_receipt(&self, tx: &mut TrackedTransaction, head: u64, hash: TxHash, receipt: ReceiptInfo) {
        tx.included_hash = Some(hash);
        let block_number = receipt.block_number;
        if !receipt.success {
            tracing::error!(id = %tx.id, nonce = tx.payload.nonce, %hash, block_number, "L1 transaction reverted");
            tx.transition(TxState::Failed(TxFailureReason::Reverted { block_number }));
            return;
        }

        let depth = head.saturating_sub(block_number);
        if depth >= u64::from(self.config.wait_confirmations) {
            tx.transition(TxState::Confirmed { block_number });
        } else if tx.state != (TxState::AwaitingConfirmations { depth }) {
            tx.transition(TxState::AwaitingConfirmations { depth });
        }
    }

    /// Current L1 head along with a receipt of any of `hashes`, if there is one.
    async fn latest_receipt(
        &self,
        hashes: &[TxHash],
    ) -> anyhow::Result<Option<(u64, TxHash, ReceiptInfo)>> {
        if hashes.is_empty() {
            return Ok(None);
        }
        let timeout = self.tracker_config.rpc_timeout;
        let head = timed_rpc(timeout, "block_number", self.client.block_number()).await?;
        let receipt = find_receipt(self.client.as_ref(), timeout, hashes).await?;
        Ok(receipt.map(|(hash, receipt)| (head, hash, receipt)))
    }

    fn on_missing_receipt(&self, tx: &mut TrackedTransaction) {
        if tx.state == TxState::Stuck {
            return;
        }
        if let TxState::AwaitingConfirmations { depth } = tx.state {
            METRICS.reorged_out.inc();
            tracing::warn!(id = %tx.id, nonce = tx.payload.nonce, depth, "L1 transaction dropped out of the canonical chain");
            tx.included_hash = None;
            tx.last_submitted_at = Instant::now();
            tx.transition(TxState::Submitted);
            return;
        }

        let elapsed = tx.last_submitted_at.elapsed();
        if elapsed >= self.config.stuck_timeout {
            METRICS.confirmation_timeouts.inc();
            tracing::warn!(
                id = %tx.id,
                nonce = tx.payload.nonce,
                attempt = tx.attempt_count,
                ?elapsed,
                "L1 transaction not mined in time"
            );
            tx.transition(TxState::Stuck);
        }
    }

    /// Returns `tx` to the in-flight set, or drops it from tracking if it is finalized.
    fn put_back(&mut self, tx: TrackedTransaction) {
        if !tx.state.is_terminal() {
            self.statuses.insert(tx.id, tx.status());
            self.in_flight.insert(tx.id, tx);
            return;
        }

        self.statuses.remove(&tx.id);
        METRICS.finalized[&tx.state.label()].inc();
        match &tx.state {
            TxState::Confirmed { block_number } => {
                METRICS
                    .attempts_per_confirmation
                    .observe(tx.attempt_count as usize);
                tracing::info!(
                    id = %tx.id,
                    nonce = tx.payload.nonce,
                    block_number,
                    attempts = tx.attempt_count,
                    "L1 transaction confirmed"
                );
            }
            TxState::Failed(reason) => {
                tracing::error!(
                    id = %tx.id,
                    nonce = tx.payload.nonce,
                    attempts = tx.attempt_count,
                    last_quote = ?tx.last_quote(),
                    %reason,
                    "L1 transaction failed"
                );
            }
            _ => {
                tracing::info!(id = %tx.id, nonce = tx.payload.nonce, "L1 transaction cancelled");
            }
        }
    }

    fn report_metrics(&self) {
        let counts = self.in_flight.values().map(|tx| tx.state.label()).counts();
        for label in TxState::IN_FLIGHT_LABELS {
            METRICS.in_flight[&label].set(counts.get(label).copied().unwrap_or(0));
        }
    }

    fn stop(mut self, shutdown_ack: Option<oneshot::Sender<()>>) -> anyhow::Result<()> {
        self.slots.close();
        self.commands.close();
        // Submissions that raced with the shutdown are persisted along with the rest.
        while let Ok(command) = self.commands.try_recv() {
            if let Command::Submit(tx) = command {
                self.in_flight.insert(tx.id, tx);
            }
        }

        match &self.tracker_config.state_path {
            Some(path) => {
                let transactions: Vec<_> = self.in_flight.values().map(PersistedTx::from).collect();
                let count = transactions.len();
                persistence::store(path, self.profile.chain_id, transactions)?;
                tracing::info!(count, path = %path.display(), "persisted in-flight L1 transactions");
            }
            None if !self.in_flight.is_empty() => {
                tracing::warn!(
                    count = self.in_flight.len(),
                    "no state path configured, in-flight L1 transactions are not persisted"
                );
            }
            None => {}
        }

        if let Some(ack) = shutdown_ack {
            ack.send(()).ok();
        }
        Ok(())
    }
}

/// Looks for a receipt of any attempt, the latest one first.
async fn find_receipt(
    client: &dyn L1Client,
    timeout: Duration,
    hashes: &[TxHash],
) -> anyhow::Result<Option<(TxHash, ReceiptInfo)>> {
    for hash in hashes.iter().rev() {
        let receipt = timed_rpc(timeout, "transaction_receipt", client.transaction_receipt(*hash)).await?;
        if let Some(receipt) = receipt {
            return Ok(Some((*hash, receipt)));
        }
    }
    Ok(None)
}
