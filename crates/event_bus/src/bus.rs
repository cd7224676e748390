//! EventBus - dispatch loop, dual-class queues, subscriber registry

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_channel::{bounded, Receiver, Sender, TrySendError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use contracts::{DeliveryClass, Event, EventKind};

use crate::error::BusError;
use crate::handler::{EventHandler, HandlerContext};
use crate::metrics::{BusMetrics, BusStats};

/// Queue capacities and drain behavior.
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Guaranteed-class queue depth. Generously sized: the publisher only
    /// ever waits on it as a last resort.
    pub lifecycle_capacity: usize,

    /// Best-effort frame queue depth. A full queue evicts its oldest
    /// entry instead of blocking the producer.
    pub frame_capacity: usize,

    /// How long stop() keeps dispatching queued events before aborting.
    pub drain_timeout: Duration,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            lifecycle_capacity: 10_000,
            frame_capacity: 1_024,
            drain_timeout: Duration::from_secs(5),
        }
    }
}

type HandlerRegistry = RwLock<HashMap<EventKind, Vec<Arc<dyn EventHandler>>>>;

/// State shared between the bus handle, publishers, and the dispatch loop.
struct BusShared {
    lifecycle_tx: Sender<Event>,
    frame_tx: Sender<Event>,

    /// Eviction side of the frame queue: the channel is MPMC, so the
    /// publisher pops the oldest entry here when the queue is full.
    frame_evict_rx: Receiver<Event>,

    /// Flips once to move the dispatch loop into its drain phase.
    shutdown_tx: watch::Sender<bool>,

    registry: HandlerRegistry,
    closed: AtomicBool,
    metrics: BusMetrics,
}

/// Cheaply cloneable publishing handle.
///
/// Producer-origin publishers are refused once shutdown begins. Handler
/// contexts hold an internal publisher that stays usable through the
/// drain, so derived events emitted while draining are still delivered.
#[derive(Clone)]
pub struct EventPublisher {
    shared: Arc<BusShared>,
    internal: bool,
}

impl EventPublisher {
    /// Publish one event.
    ///
    /// Guaranteed-class events wait on a full queue (bounded, rare
    /// fallback). Best-effort events never wait: a full frame queue drops
    /// its oldest entry in favor of the new one.
    ///
    /// # Errors
    /// `BusError::Closed` for producer-origin publishes once the bus has
    /// begun shutting down.
    pub async fn publish(&self, event: Event) -> Result<(), BusError> {
        if !self.internal && self.shared.closed.load(Ordering::Acquire) {
            return Err(BusError::Closed);
        }

        let kind = event.kind();
        match kind.delivery_class() {
            DeliveryClass::Guaranteed => {
                self.shared
                    .lifecycle_tx
                    .send(event)
                    .await
                    .map_err(|_| BusError::Closed)?;
            }
            DeliveryClass::BestEffort => self.publish_best_effort(event)?,
        }

        self.shared.metrics.record_published();
        metrics::counter!("lapcoach_events_published_total", "kind" => kind.as_str())
            .increment(1);
        Ok(())
    }

    /// Drop-oldest enqueue for the frame stream.
    fn publish_best_effort(&self, mut event: Event) -> Result<(), BusError> {
        loop {
            match self.shared.frame_tx.try_send(event) {
                Ok(()) => return Ok(()),
                Err(TrySendError::Full(rejected)) => {
                    if self.shared.frame_evict_rx.try_recv().is_ok() {
                        self.shared.metrics.record_dropped();
                        metrics::counter!("lapcoach_frames_dropped_total").increment(1);
                    }
                    event = rejected;
                }
                Err(TrySendError::Closed(_)) => return Err(BusError::Closed),
            }
        }
    }
}

/// The event bus.
///
/// Owns the dual-class queues and the subscriber registry - the only
/// shared mutable state in the core. All cross-handler communication goes
/// through published events.
pub struct EventBus {
    shared: Arc<BusShared>,
    lifecycle_rx: Receiver<Event>,
    frame_rx: Receiver<Event>,
    drain_timeout: Duration,
    loop_handle: Option<JoinHandle<()>>,
}

impl EventBus {
    /// Create a bus with the given queue configuration. No events are
    /// dispatched until `start()`.
    pub fn new(config: BusConfig) -> Self {
        let (lifecycle_tx, lifecycle_rx) = bounded(config.lifecycle_capacity);
        let (frame_tx, frame_rx) = bounded(config.frame_capacity);
        let frame_evict_rx = frame_rx.clone();
        let (shutdown_tx, _) = watch::channel(false);

        let shared = Arc::new(BusShared {
            lifecycle_tx,
            frame_tx,
            frame_evict_rx,
            shutdown_tx,
            registry: RwLock::new(HashMap::new()),
            closed: AtomicBool::new(false),
            metrics: BusMetrics::new(),
        });

        Self {
            shared,
            lifecycle_rx,
            frame_rx,
            drain_timeout: config.drain_timeout,
            loop_handle: None,
        }
    }

    /// Register a handler for one event kind.
    ///
    /// A handler may be registered under several kinds; each registration
    /// is independent.
    pub fn subscribe(&self, kind: EventKind, handler: Arc<dyn EventHandler>) {
        debug!(kind = kind.as_str(), handler = handler.name(), "subscribed handler");
        self.shared
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(kind)
            .or_default()
            .push(handler);
    }

    /// Publishing handle for producers.
    pub fn publisher(&self) -> EventPublisher {
        EventPublisher {
            shared: Arc::clone(&self.shared),
            internal: false,
        }
    }

    /// Publish directly through the bus handle.
    pub async fn publish(&self, event: Event) -> Result<(), BusError> {
        self.publisher().publish(event).await
    }

    /// Current frame queue depth (bounded by `frame_capacity`).
    pub fn frame_queue_len(&self) -> usize {
        self.frame_rx.len()
    }

    /// Current guaranteed queue depth.
    pub fn lifecycle_queue_len(&self) -> usize {
        self.lifecycle_rx.len()
    }

    /// Live counters.
    pub fn stats(&self) -> BusStats {
        self.shared.metrics.snapshot()
    }

    /// Spawn the dispatch loop. Idempotent.
    pub fn start(&mut self) {
        if self.loop_handle.is_some() {
            return;
        }
        let handler_count: usize = self
            .shared
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(Vec::len)
            .sum();
        info!(handlers = handler_count, "event bus started");

        let shared = Arc::clone(&self.shared);
        let lifecycle_rx = self.lifecycle_rx.clone();
        let frame_rx = self.frame_rx.clone();
        self.loop_handle = Some(tokio::spawn(async move {
            dispatch_loop(shared, lifecycle_rx, frame_rx).await;
        }));
    }

    /// Stop the bus: refuse producer publishes, drain queued events up to
    /// the drain timeout, then report counters.
    ///
    /// The closed flag flips before the drain begins, so there is no
    /// window where a producer publish races the drain. Handler-origin
    /// derived events stay deliverable until the drain finishes.
    pub async fn stop(mut self) -> BusStats {
        self.shared.closed.store(true, Ordering::Release);
        let _ = self.shared.shutdown_tx.send(true);

        if let Some(mut handle) = self.loop_handle.take() {
            tokio::select! {
                _ = &mut handle => {}
                _ = tokio::time::sleep(self.drain_timeout) => {
                    warn!(
                        timeout_ms = self.drain_timeout.as_millis() as u64,
                        "drain timeout reached, aborting dispatch loop"
                    );
                    handle.abort();
                    let _ = handle.await;
                }
            }
        }

        self.shared.lifecycle_tx.close();
        self.shared.frame_tx.close();

        let stats = self.shared.metrics.snapshot();
        info!(
            published = stats.published,
            delivered = stats.delivered,
            dropped = stats.dropped,
            handler_errors = stats.handler_errors,
            "event bus stopped"
        );
        stats
    }
}

/// Main loop: dequeue one event, fan it out, wait for the fan-out.
///
/// Lifecycle events win the biased select so a saturated frame queue can
/// never starve them. The loop only moves to the next event once every
/// handler invocation for the current one has finished, which both
/// preserves per-kind publish order across subscribers and serializes
/// invocations of any one stateful handler.
async fn dispatch_loop(
    shared: Arc<BusShared>,
    lifecycle_rx: Receiver<Event>,
    frame_rx: Receiver<Event>,
) {
    debug!("dispatch loop running");
    let mut shutdown_rx = shared.shutdown_tx.subscribe();

    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.changed() => break,
            ev = lifecycle_rx.recv() => match ev {
                Ok(ev) => fan_out(&shared, ev).await,
                Err(_) => break,
            },
            ev = frame_rx.recv() => match ev {
                Ok(ev) => fan_out(&shared, ev).await,
                Err(_) => break,
            },
        }
    }

    // Drain phase: deliver everything still queued, including derived
    // events handlers publish while the drain runs. A fan-out completes
    // before its cascade is dequeued, so this terminates once the
    // cascades do.
    debug!("dispatch loop draining");
    loop {
        if let Ok(ev) = lifecycle_rx.try_recv() {
            fan_out(&shared, ev).await;
            continue;
        }
        if let Ok(ev) = frame_rx.try_recv() {
            fan_out(&shared, ev).await;
            continue;
        }
        break;
    }
    debug!("dispatch loop drained");
}

/// Deliver one event to every subscriber of its kind.
///
/// Each invocation runs as its own task on the runtime's worker threads;
/// errors and panics are contained per invocation.
async fn fan_out(shared: &Arc<BusShared>, event: Event) {
    let kind = event.kind();
    let handlers: Vec<Arc<dyn EventHandler>> = {
        let registry = shared
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        registry.get(&kind).cloned().unwrap_or_default()
    };

    if handlers.is_empty() {
        return;
    }

    let event = Arc::new(event);
    let mut invocations = Vec::with_capacity(handlers.len());
    for handler in handlers {
        let event = Arc::clone(&event);
        let publisher = EventPublisher {
            shared: Arc::clone(shared),
            internal: true,
        };
        let name = handler.name();
        invocations.push((
            name,
            tokio::spawn(async move {
                let ctx = HandlerContext { publisher };
                handler.handle(&event, &ctx).await
            }),
        ));
    }

    for (name, invocation) in invocations {
        match invocation.await {
            Ok(Ok(())) => shared.metrics.record_delivered(),
            Ok(Err(e)) => {
                shared.metrics.record_delivered();
                shared.metrics.record_handler_error();
                metrics::counter!("lapcoach_handler_errors_total", "handler" => name)
                    .increment(1);
                warn!(handler = name, kind = kind.as_str(), error = %e, "handler failed");
            }
            Err(join_err) => {
                shared.metrics.record_handler_error();
                metrics::counter!("lapcoach_handler_errors_total", "handler" => name)
                    .increment(1);
                error!(handler = name, kind = kind.as_str(), error = %join_err, "handler panicked");
            }
        }
    }
}
