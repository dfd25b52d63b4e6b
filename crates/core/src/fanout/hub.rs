use futures::future::join_all;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, timeout, timeout_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::message::{Frame, HubMessage};
use super::sink::{SinkError, SnapshotSource, SubscriberSink};
use crate::clock::Clock;

#[derive(Debug, Clone)]
pub struct HubConfig {
    pub max_subscribers: usize,
    pub broadcast_interval: Duration,
    /// Per-write deadline for every frame and ping.
    pub write_timeout: Duration,
    /// A subscriber silent for this long is dropped.
    pub read_timeout: Duration,
    pub ping_interval: Duration,
    pub channel_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_subscribers: 3,
            broadcast_interval: Duration::from_secs(5),
            write_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(60),
            ping_interval: Duration::from_secs(30),
            channel_capacity: 32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("subscriber limit reached ({current}/{limit})")]
pub struct AdmissionRejected {
    pub limit: usize,
    pub current: usize,
}

#[derive(Error, Debug)]
pub enum HubError {
    #[error(transparent)]
    Rejected(#[from] AdmissionRejected),

    #[error("snapshot unavailable: {0}")]
    Snapshot(String),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("outbound channel full")]
    Backpressure,

    #[error("hub is not running")]
    Stopped,

    #[error("hub already started")]
    AlreadyStarted,
}

/// A reserved subscriber slot. Dropping it unused frees the slot.
pub struct AdmissionTicket {
    hub: Arc<FanoutHub>,
    used: bool,
}

impl Drop for AdmissionTicket {
    fn drop(&mut self) {
        if !self.used {
            self.hub.release_slot();
        }
    }
}

struct Subscriber {
    sink: Arc<dyn SubscriberSink>,
    closed: CancellationToken,
}

/// Outcome of one broadcast pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub removed: Vec<SubscriberId>,
}

pub struct FanoutHub {
    config: HubConfig,
    source: Arc<dyn SnapshotSource>,
    clock: Arc<dyn Clock>,
    next_id: AtomicU64,
    /// Reserved tickets plus registered subscribers.
    slots: AtomicUsize,
    registry: RwLock<HashMap<SubscriberId, Subscriber>>,
    outbound_tx: mpsc::Sender<Frame>,
    outbound_rx: Mutex<Option<mpsc::Receiver<Frame>>>,
}

impl FanoutHub {
    pub fn new(
        config: HubConfig,
        source: Arc<dyn SnapshotSource>,
        clock: Arc<dyn Clock>,
    ) -> Arc<Self> {
        let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
        Arc::new(Self {
            config,
            source,
            clock,
            next_id: AtomicU64::new(1),
            slots: AtomicUsize::new(0),
            registry: RwLock::new(HashMap::new()),
            outbound_tx: tx,
            outbound_rx: Mutex::new(Some(rx)),
        })
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.registry.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    // =========================================================================
    // Admission and registration
    // =========================================================================

    /// Reserves a slot before any handshake work. Rejection leaves every
    /// count unchanged.
    pub fn try_admit(self: &Arc<Self>) -> Result<AdmissionTicket, AdmissionRejected> {
        let limit = self.config.max_subscribers;
        match self
            .slots
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < limit).then_some(n + 1)
            }) {
            Ok(_) => Ok(AdmissionTicket {
                hub: Arc::clone(self),
                used: false,
            }),
            Err(current) => {
                warn!("Subscriber rejected: {}/{} slots in use", current, limit);
                Err(AdmissionRejected { limit, current })
            }
        }
    }

    fn release_slot(&self) {
        let _ = self
            .slots
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    }

    /// Sends the initial snapshot to `sink`, then makes it active.
    ///
    /// The subscriber only joins the registry after the snapshot write
    /// succeeds, so no update can reach it first.
    pub async fn register(
        &self,
        mut ticket: AdmissionTicket,
        sink: Arc<dyn SubscriberSink>,
    ) -> Result<SubscriberId, HubError> {
        let snapshot = self
            .source
            .snapshot()
            .await
            .map_err(|e| HubError::Snapshot(e.to_string()))?;
        let frame = HubMessage::initial(snapshot, self.clock.now())
            .to_frame()
            .map_err(|e| HubError::Snapshot(e.to_string()))?;

        let sent = match timeout(self.config.write_timeout, sink.send_text(frame)).await {
            Ok(result) => result,
            Err(_) => Err(SinkError::Timeout),
        };
        if let Err(e) = sent {
            warn!("Initial snapshot write failed: {}", e);
            sink.close().await;
            return Err(e.into());
        }

        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        {
            let mut registry = self.registry.write().unwrap_or_else(|e| e.into_inner());
            registry.insert(
                id,
                Subscriber {
                    sink,
                    closed: CancellationToken::new(),
                },
            );
        }
        ticket.used = true;

        info!(
            "Subscriber {} active ({}/{})",
            id,
            self.subscriber_count(),
            self.config.max_subscribers
        );
        Ok(id)
    }

    /// Removes a subscriber. Safe to call any number of times from any
    /// task; only the first call releases the slot and closes the sink.
    pub async fn remove(&self, id: SubscriberId) -> bool {
        let removed = self
            .registry
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id);

        match removed {
            Some(subscriber) => {
                self.release_slot();
                subscriber.closed.cancel();
                subscriber.sink.close().await;
                info!(
                    "Subscriber {} removed ({} remaining)",
                    id,
                    self.subscriber_count()
                );
                true
            }
            None => false,
        }
    }

    pub(super) fn subscriber_handle(
        &self,
        id: SubscriberId,
    ) -> Option<(Arc<dyn SubscriberSink>, CancellationToken)> {
        self.registry
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&id)
            .map(|s| (Arc::clone(&s.sink), s.closed.clone()))
    }

    pub async fn close_all(&self) {
        let ids: Vec<SubscriberId> = self
            .registry
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .copied()
            .collect();
        for id in ids {
            self.remove(id).await;
        }
    }

    // =========================================================================
    // Broadcast
    // =========================================================================

    /// Queues a message for every active subscriber.
    pub fn enqueue(&self, message: &HubMessage) -> Result<(), HubError> {
        let frame = message
            .to_frame()
            .map_err(|e| HubError::Snapshot(e.to_string()))?;
        self.outbound_tx.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => HubError::Backpressure,
            mpsc::error::TrySendError::Closed(_) => HubError::Stopped,
        })
    }

    /// Computes a fresh snapshot and queues it as an update. Skipped when
    /// nobody is listening.
    pub async fn broadcast_snapshot(&self) -> Result<bool, HubError> {
        if self.subscriber_count() == 0 {
            return Ok(false);
        }
        let snapshot = self
            .source
            .snapshot()
            .await
            .map_err(|e| HubError::Snapshot(e.to_string()))?;
        self.enqueue(&HubMessage::update(snapshot, self.clock.now()))?;
        Ok(true)
    }

    /// Writes `frame` to every active subscriber concurrently, each under
    /// the write deadline. Failed subscribers are removed after the pass.
    pub async fn deliver(&self, frame: Frame) -> DeliveryReport {
        let targets: Vec<(SubscriberId, Arc<dyn SubscriberSink>)> = self
            .registry
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(id, s)| (*id, Arc::clone(&s.sink)))
            .collect();

        let write_timeout = self.config.write_timeout;
        let results = join_all(targets.into_iter().map(|(id, sink)| {
            let frame = Arc::clone(&frame);
            async move {
                let result = match timeout(write_timeout, sink.send_text(frame)).await {
                    Ok(result) => result,
                    Err(_) => Err(SinkError::Timeout),
                };
                (id, result)
            }
        }))
        .await;

        let mut report = DeliveryReport::default();
        let mut failed = Vec::new();
        for (id, result) in results {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!("Write to subscriber {} failed: {}", id, e);
                    failed.push(id);
                }
            }
        }

        for id in failed {
            if self.remove(id).await {
                report.removed.push(id);
            }
        }

        debug!(
            "Broadcast delivered to {}, removed {}",
            report.delivered,
            report.removed.len()
        );
        report
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Spawns the consumer and the periodic producer. Both stop when
    /// `shutdown` (or the returned handle) is cancelled.
    pub fn start(self: &Arc<Self>, shutdown: &CancellationToken) -> Result<HubHandle, HubError> {
        let rx = self
            .outbound_rx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .ok_or(HubError::AlreadyStarted)?;

        let cancel = shutdown.child_token();
        let consumer = tokio::spawn(Arc::clone(self).run_consumer(rx, cancel.clone()));
        let producer = tokio::spawn(Arc::clone(self).run_producer(cancel.clone()));

        info!(
            "Fan-out hub started (max {} subscribers, every {:?})",
            self.config.max_subscribers, self.config.broadcast_interval
        );
        Ok(HubHandle {
            hub: Arc::clone(self),
            cancel,
            tasks: vec![consumer, producer],
        })
    }

    async fn run_consumer(self: Arc<Self>, mut rx: mpsc::Receiver<Frame>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                frame = rx.recv() => match frame {
                    Some(frame) => {
                        self.deliver(frame).await;
                    }
                    None => break,
                },
            }
        }
        debug!("Fan-out consumer stopped");
    }

    async fn run_producer(self: Arc<Self>, cancel: CancellationToken) {
        let period = self.config.broadcast_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.broadcast_snapshot().await {
                        warn!("Periodic broadcast skipped: {}", e);
                    }
                }
            }
        }
        debug!("Fan-out producer stopped");
    }
}

/// Owner handle for the hub's background tasks.
pub struct HubHandle {
    hub: Arc<FanoutHub>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl HubHandle {
    /// Cancels the background tasks, waits up to `grace` for them, then
    /// disconnects every subscriber.
    pub async fn stop(mut self, grace: Duration) {
        self.cancel.cancel();
        let deadline = Instant::now() + grace;
        for task in self.tasks.iter_mut() {
            if timeout_at(deadline, &mut *task).await.is_err() {
                warn!("Fan-out task did not stop within {:?}; aborting", grace);
                task.abort();
            }
        }
        self.hub.close_all().await;
        info!("Fan-out hub stopped");
    }
}
