//! Tick and broadcast scheduling.
//!
//! A single mutex guards the simulation, the subscriber set and the timer
//! handle. Control requests, subscription changes and every tick's
//! step-serialize-send sequence all run inside that one critical section, so a
//! remove-by-index can never interleave with a step iterating the store.

use std::{
    collections::HashMap,
    sync::{Arc, Weak},
    time::Duration,
};

use orbit_core::{Particle, RunState, Simulation, SimulationError};
use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use thiserror::Error;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::MissedTickBehavior,
};

use crate::config::{ConfigError, ServerConfig};

/// Opaque handle identifying one connection.
pub type SubscriberId = uuid::Uuid;

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Subscriber channel closed")]
    Closed,

    #[error("Delivery failed: {0}")]
    Failed(String),
}

/// Push target for serialized snapshots. Implementations must hand the
/// payload off without waiting on I/O; the scheduler calls this while holding
/// its lock.
pub trait SnapshotSink: Send + Sync {
    fn deliver(&self, payload: Arc<str>) -> Result<(), DeliveryError>;
}

impl SnapshotSink for mpsc::UnboundedSender<Arc<str>> {
    fn deliver(&self, payload: Arc<str>) -> Result<(), DeliveryError> {
        self.send(payload).map_err(|_| DeliveryError::Closed)
    }
}

/// Pull-style view of the scheduler, served by the status route.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SimulationStatus {
    pub running: bool,
    pub tick: u64,
    pub particles: usize,
    pub subscribers: usize,
    pub broadcasting: bool,
}

/// Turns a snapshot into the push payload.
type Encoder = fn(&[Particle]) -> serde_json::Result<String>;

fn encode_json(particles: &[Particle]) -> serde_json::Result<String> {
    serde_json::to_string(particles)
}

struct Shared {
    simulation: Simulation,
    subscribers: HashMap<SubscriberId, Arc<dyn SnapshotSink>>,
    ticker: Option<JoinHandle<()>>,
    /// Bumped whenever a ticker starts or stops. A ticker whose captured
    /// generation no longer matches exits without stepping, which covers a
    /// ticker that was already waiting on the lock when it was aborted.
    generation: u64,
    encode: Encoder,
    rng: ChaCha8Rng,
}

impl Shared {
    /// Timer entry point. Returns `None` if the calling ticker is stale.
    fn ticker_fired(&mut self, generation: u64) -> Option<usize> {
        if generation != self.generation {
            return None;
        }
        Some(self.broadcast_tick())
    }

    /// One timer firing: step, serialize, then fan out. Returns the number of
    /// successful deliveries.
    fn broadcast_tick(&mut self) -> usize {
        if self.subscribers.is_empty() {
            return 0;
        }

        let particles = self.simulation.step();
        // Finite particles always encode; failure is handled all the same.
        let payload: Arc<str> = match (self.encode)(particles) {
            Ok(json) => json.into(),
            Err(err) => {
                tracing::error!(error = %err, "Failed to serialize snapshot, skipping broadcast");
                return 0;
            }
        };

        let mut delivered = 0;
        for (id, sink) in &self.subscribers {
            match sink.deliver(Arc::clone(&payload)) {
                Ok(()) => delivered += 1,
                Err(err) => {
                    tracing::warn!(subscriber_id = %id, error = %err, "Failed to deliver snapshot");
                }
            }
        }
        tracing::trace!(
            tick = self.simulation.tick(),
            delivered,
            subscribers = self.subscribers.len(),
            "Snapshot broadcast"
        );
        delivered
    }

    fn start_ticker(&mut self, shared: Weak<Mutex<Shared>>, period: Duration) {
        self.generation += 1;
        self.ticker = Some(spawn_ticker(shared, period, self.generation));
    }

    fn stop_ticker(&mut self) {
        self.generation += 1;
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

/// Owns the simulation and drives it while anyone is listening.
///
/// Cloning is cheap; every clone shares the same state.
#[derive(Clone)]
pub struct BroadcastScheduler {
    shared: Arc<Mutex<Shared>>,
    period: Duration,
}

impl BroadcastScheduler {
    /// Validates `config` before building the scheduler, since seeding draws
    /// from the configured ranges.
    pub fn new(config: &ServerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = match config.simulation.seed.rng_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_rng(&mut rand::rng()),
        };
        Ok(Self {
            shared: Arc::new(Mutex::new(Shared {
                simulation: Simulation::new(&config.simulation),
                subscribers: HashMap::new(),
                ticker: None,
                generation: 0,
                encode: encode_json,
                rng,
            })),
            period: config.broadcast_period(),
        })
    }

    /// Registers a subscriber and starts the timer if it is the first one.
    /// Must be called from within a tokio runtime.
    ///
    /// Returns `false` if `id` is already subscribed.
    pub fn subscribe(&self, id: SubscriberId, sink: Arc<dyn SnapshotSink>) -> bool {
        let mut shared = self.shared.lock();
        if shared.subscribers.contains_key(&id) {
            tracing::warn!(subscriber_id = %id, "Subscriber already registered");
            return false;
        }
        shared.subscribers.insert(id, sink);
        tracing::info!(subscriber_id = %id, subscribers = shared.subscribers.len(), "Subscriber added");

        if shared.ticker.is_none() {
            shared.start_ticker(Arc::downgrade(&self.shared), self.period);
            tracing::info!(period = ?self.period, "Broadcasting started");
        }
        true
    }

    /// Removes a subscriber and stops the timer once none remain.
    ///
    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut shared = self.shared.lock();
        if shared.subscribers.remove(&id).is_none() {
            return false;
        }
        tracing::info!(subscriber_id = %id, subscribers = shared.subscribers.len(), "Subscriber removed");

        if shared.subscribers.is_empty() {
            shared.stop_ticker();
            tracing::info!("No active subscribers, broadcasting stopped");
        }
        true
    }

    /// Runs one timer firing immediately.
    pub fn broadcast_tick(&self) -> usize {
        self.shared.lock().broadcast_tick()
    }

    pub fn is_active(&self) -> bool {
        self.shared.lock().ticker.is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.lock().subscribers.len()
    }

    pub fn add(&self, particle: Particle) -> Result<(), SimulationError> {
        self.shared.lock().simulation.add(particle)
    }

    pub fn remove(&self, index: i64) -> Result<Particle, SimulationError> {
        let mut shared = self.shared.lock();
        let index = to_index(index, shared.simulation.len())?;
        shared.simulation.remove(index)
    }

    pub fn get(&self, index: i64) -> Result<Particle, SimulationError> {
        let shared = self.shared.lock();
        let index = to_index(index, shared.simulation.len())?;
        shared.simulation.get(index)
    }

    pub fn reset(&self) {
        self.shared.lock().simulation.reset();
    }

    pub fn toggle(&self) -> RunState {
        self.shared.lock().simulation.toggle()
    }

    /// Replaces the particles with `count` random ones.
    pub fn start(&self, count: i64) -> Result<usize, SimulationError> {
        let mut shared = self.shared.lock();
        let Shared {
            simulation, rng, ..
        } = &mut *shared;
        simulation.start(count, rng)
    }

    pub fn snapshot(&self) -> Vec<Particle> {
        self.shared.lock().simulation.snapshot()
    }

    pub fn status(&self) -> SimulationStatus {
        let shared = self.shared.lock();
        SimulationStatus {
            running: shared.simulation.is_running(),
            tick: shared.simulation.tick(),
            particles: shared.simulation.len(),
            subscribers: shared.subscribers.len(),
            broadcasting: shared.ticker.is_some(),
        }
    }
}

fn to_index(index: i64, len: usize) -> Result<usize, SimulationError> {
    usize::try_from(index).map_err(|_| SimulationError::IndexOutOfRange { index, len })
}

fn spawn_ticker(shared: Weak<Mutex<Shared>>, period: Duration, generation: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let Some(shared) = shared.upgrade() else {
                break;
            };
            if shared.lock().ticker_fired(generation).is_none() {
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingSink {
        attempts: AtomicUsize,
    }

    impl SnapshotSink for FailingSink {
        fn deliver(&self, _payload: Arc<str>) -> Result<(), DeliveryError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(DeliveryError::Failed("socket gone".to_string()))
        }
    }

    fn create_test_scheduler() -> BroadcastScheduler {
        let mut config = ServerConfig::default();
        config.simulation.seed.rng_seed = Some(7);
        BroadcastScheduler::new(&config).unwrap()
    }

    fn failing_encoder(_particles: &[Particle]) -> serde_json::Result<String> {
        Err(serde::ser::Error::custom("unencodable snapshot"))
    }

    fn channel() -> (Arc<dyn SnapshotSink>, mpsc::UnboundedReceiver<Arc<str>>) {
        let (tx, rx) = mpsc::unbounded_channel::<Arc<str>>();
        (Arc::new(tx), rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<Arc<str>>) -> Vec<Arc<str>> {
        let mut payloads = Vec::new();
        while let Ok(payload) = rx.try_recv() {
            payloads.push(payload);
        }
        payloads
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_follows_subscribers() {
        let scheduler = create_test_scheduler();
        scheduler.start(10).unwrap();
        assert!(!scheduler.is_active());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(scheduler.status().tick, 0, "stepped without subscribers");

        let first = SubscriberId::new_v4();
        let second = SubscriberId::new_v4();
        let (sink1, mut rx1) = channel();
        let (sink2, mut rx2) = channel();

        assert!(scheduler.subscribe(first, sink1));
        assert!(scheduler.is_active());
        assert!(scheduler.subscribe(second, sink2));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!drain(&mut rx1).is_empty());
        assert!(!drain(&mut rx2).is_empty());

        assert!(scheduler.unsubscribe(first));
        assert!(scheduler.is_active(), "one subscriber is still listening");

        assert!(scheduler.unsubscribe(second));
        assert!(!scheduler.is_active());

        tokio::task::yield_now().await;
        let tick = scheduler.status().tick;
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(scheduler.status().tick, tick, "stepped after last unsubscribe");
    }

    #[tokio::test(start_paused = true)]
    async fn test_resubscribe_restarts_timer() {
        let scheduler = create_test_scheduler();
        let id = SubscriberId::new_v4();

        let (sink, _rx) = channel();
        scheduler.subscribe(id, sink);
        scheduler.unsubscribe(id);
        assert!(!scheduler.is_active());

        let (sink, mut rx) = channel();
        scheduler.subscribe(id, sink);
        assert!(scheduler.is_active());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_subscribe_rejected() {
        let scheduler = create_test_scheduler();
        let id = SubscriberId::new_v4();
        let (sink, _rx) = channel();

        assert!(scheduler.subscribe(id, Arc::clone(&sink)));
        assert!(!scheduler.subscribe(id, sink));
        assert_eq!(scheduler.subscriber_count(), 1);

        assert!(scheduler.unsubscribe(id));
        assert!(!scheduler.unsubscribe(id));
    }

    #[test]
    fn test_tick_without_subscribers_does_nothing() {
        let scheduler = create_test_scheduler();
        scheduler.start(5).unwrap();
        let before = scheduler.snapshot();

        assert_eq!(scheduler.broadcast_tick(), 0);
        assert_eq!(scheduler.snapshot(), before);
        assert_eq!(scheduler.status().tick, 0);
    }

    #[tokio::test]
    async fn test_tick_steps_then_sends_snapshot() {
        let scheduler = create_test_scheduler();
        scheduler.start(5).unwrap();
        let (sink, mut rx) = channel();
        scheduler.subscribe(SubscriberId::new_v4(), sink);

        let before = scheduler.snapshot();
        assert_eq!(scheduler.broadcast_tick(), 1);

        let payloads = drain(&mut rx);
        let last = payloads.last().expect("a payload was delivered");
        assert_eq!(&**last, serde_json::to_string(&scheduler.snapshot()).unwrap());
        assert_ne!(&**last, serde_json::to_string(&before).unwrap());
    }

    #[tokio::test]
    async fn test_paused_still_broadcasts() {
        let scheduler = create_test_scheduler();
        scheduler.start(3).unwrap();
        assert_eq!(scheduler.toggle(), RunState::Paused);
        let (sink, mut rx) = channel();
        scheduler.subscribe(SubscriberId::new_v4(), sink);

        let before = scheduler.snapshot();
        assert_eq!(scheduler.broadcast_tick(), 1);

        let payloads = drain(&mut rx);
        assert_eq!(payloads.len(), 1);
        assert_eq!(&*payloads[0], serde_json::to_string(&before).unwrap());
    }

    #[tokio::test]
    async fn test_failed_delivery_is_isolated() {
        let scheduler = create_test_scheduler();
        let failing = Arc::new(FailingSink {
            attempts: AtomicUsize::new(0),
        });
        let (sink, mut rx) = channel();

        scheduler.subscribe(SubscriberId::new_v4(), failing.clone());
        scheduler.subscribe(SubscriberId::new_v4(), sink);
        drain(&mut rx);

        assert_eq!(scheduler.broadcast_tick(), 1);
        assert_eq!(scheduler.broadcast_tick(), 1);

        assert!(failing.attempts.load(Ordering::SeqCst) >= 2);
        assert_eq!(drain(&mut rx).len(), 2);
        assert_eq!(scheduler.subscriber_count(), 2);
        assert!(scheduler.is_active());
    }

    #[tokio::test]
    async fn test_closed_channel_keeps_subscriber() {
        let scheduler = create_test_scheduler();
        let id = SubscriberId::new_v4();
        let (sink, rx) = channel();
        scheduler.subscribe(id, sink);
        drop(rx);

        assert_eq!(scheduler.broadcast_tick(), 0);
        assert_eq!(scheduler.subscriber_count(), 1);
    }

    #[test]
    fn test_negative_index_rejected() {
        let scheduler = create_test_scheduler();
        scheduler.start(2).unwrap();

        assert_eq!(
            scheduler.get(-1),
            Err(SimulationError::IndexOutOfRange { index: -1, len: 2 })
        );
        assert!(scheduler.remove(-3).is_err());
        assert!(scheduler.remove(2).is_err());
        assert_eq!(scheduler.snapshot().len(), 2);
    }

    #[test]
    fn test_remove_shifts_down() {
        let scheduler = create_test_scheduler();
        scheduler.start(4).unwrap();
        let before = scheduler.snapshot();

        let removed = scheduler.remove(1).unwrap();
        assert_eq!(removed, before[1]);
        assert_eq!(scheduler.get(1).unwrap(), before[2]);
        assert_eq!(scheduler.get(2).unwrap(), before[3]);
    }

    #[test]
    fn test_status_reports_state() {
        let scheduler = create_test_scheduler();
        scheduler.start(6).unwrap();
        scheduler.toggle();

        assert_eq!(
            scheduler.status(),
            SimulationStatus {
                running: false,
                tick: 0,
                particles: 6,
                subscribers: 0,
                broadcasting: false,
            }
        );

        scheduler.reset();
        assert!(scheduler.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_stale_ticker_does_not_step() {
        let scheduler = create_test_scheduler();
        scheduler.start(3).unwrap();
        let id = SubscriberId::new_v4();

        let (sink, _rx) = channel();
        scheduler.subscribe(id, sink);
        let stale = scheduler.shared.lock().generation;
        scheduler.unsubscribe(id);

        let (sink, mut rx) = channel();
        scheduler.subscribe(id, sink);
        let current = scheduler.shared.lock().generation;
        assert_ne!(stale, current);

        // A ticker from before the restart that was already queued on the lock.
        assert_eq!(scheduler.shared.lock().ticker_fired(stale), None);
        assert_eq!(scheduler.status().tick, 0);
        assert!(drain(&mut rx).is_empty());

        assert_eq!(scheduler.shared.lock().ticker_fired(current), Some(1));
        assert_eq!(scheduler.status().tick, 1);
    }

    #[tokio::test]
    async fn test_encode_failure_skips_broadcast() {
        let scheduler = create_test_scheduler();
        scheduler.start(3).unwrap();
        let (sink, mut rx) = channel();
        scheduler.subscribe(SubscriberId::new_v4(), sink);

        scheduler.shared.lock().encode = failing_encoder;
        assert_eq!(scheduler.broadcast_tick(), 0);
        assert!(drain(&mut rx).is_empty());
        assert_eq!(scheduler.subscriber_count(), 1);

        scheduler.shared.lock().encode = encode_json;
        assert_eq!(scheduler.broadcast_tick(), 1);
        assert_eq!(drain(&mut rx).len(), 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = ServerConfig::default();
        config.simulation.seed.position = 5.0..5.0;
        assert!(matches!(
            BroadcastScheduler::new(&config),
            Err(ConfigError::Simulation(SimulationError::InvalidConfig(_)))
        ));

        config = ServerConfig::default();
        config.broadcast_period_ms = 0;
        assert!(matches!(
            BroadcastScheduler::new(&config),
            Err(ConfigError::ZeroPeriod)
        ));
    }
}
