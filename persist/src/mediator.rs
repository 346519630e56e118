//! Persistence mediator
//!
//! Observes a state container, restores persisted fields on the first
//! state change, then writes changed fields back to a durable store.
//! Restore and save passes run one at a time on a dedicated worker task;
//! queued save snapshots collapse into the most recent one.
//!
//! Notifications are expected from one dispatching thread at a time. The
//! snapshot is taken inside the notification, so two threads dispatching
//! concurrently may enqueue their snapshots out of order.

use parking_lot::Mutex;
use rehydra_core::{
    DurableStore, Lifecycle, PersistConfig, PersistEvent, Reducer, RehydraError,
    RehydraResult, StateContainer, StateMap, SubscriptionId,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::codec::KeyCodec;
use crate::events::{panic_message, EventBus, Listener};
use crate::filter::KeyFilter;
use crate::lifecycle::{Gate, LifecycleGate};
use crate::logger::{PersistLogger, TracingLogger};
use crate::reducer::rehydrating;

/// Work handled by the persistence worker
pub(crate) enum Job {
    Restore(StateMap),
    Save(StateMap),
    Purge(oneshot::Sender<RehydraResult<()>>),
    Remove(Vec<String>, oneshot::Sender<RehydraResult<()>>),
    Flush(oneshot::Sender<()>),
}

impl Job {
    fn name(&self) -> &'static str {
        match self {
            Job::Restore(_) => "restore",
            Job::Save(_) => "save",
            Job::Purge(_) => "purge",
            Job::Remove(..) => "remove",
            Job::Flush(_) => "flush",
        }
    }
}

/// Keeps selected container fields synchronized with a durable store
pub struct Mediator {
    pub(crate) config: PersistConfig,
    pub(crate) filter: KeyFilter,
    pub(crate) codec: KeyCodec,
    pub(crate) container: Arc<dyn StateContainer>,
    pub(crate) store: Arc<dyn DurableStore>,
    pub(crate) logger: Arc<dyn PersistLogger>,
    pub(crate) lifecycle: LifecycleGate,
    /// Encoded key → last written or read encoded value
    pub(crate) last_persisted: Mutex<HashMap<String, String>>,
    pub(crate) restored: AtomicBool,
    pub(crate) events: EventBus,
    jobs: mpsc::UnboundedSender<Job>,
    subscription: Mutex<Option<SubscriptionId>>,
}

impl Mediator {
    /// Bind a mediator to `container` and `store`.
    ///
    /// Subscribes to the container and installs `rehydrating(base)` as its
    /// root reducer. Must be called from inside a tokio runtime.
    pub fn attach(
        container: Arc<dyn StateContainer>,
        store: Arc<dyn DurableStore>,
        base: Reducer,
        config: PersistConfig,
        logger: Arc<dyn PersistLogger>,
    ) -> RehydraResult<Arc<Self>> {
        config.validate()?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| RehydraError::Runtime(e.to_string()))?;

        let (jobs, rx) = mpsc::unbounded_channel();
        let mediator = Arc::new(Self {
            filter: KeyFilter::from_config(&config),
            codec: KeyCodec::new(config.prefix.clone()),
            config,
            container: container.clone(),
            store,
            logger,
            lifecycle: LifecycleGate::new(),
            last_persisted: Mutex::new(HashMap::new()),
            restored: AtomicBool::new(false),
            events: EventBus::new(),
            jobs,
            subscription: Mutex::new(None),
        });

        runtime.spawn(run_worker(Arc::downgrade(&mediator), rx));

        let weak = Arc::downgrade(&mediator);
        let id = container.subscribe(Arc::new(move || {
            if let Some(mediator) = weak.upgrade() {
                mediator.on_state_change();
            }
        }));
        *mediator.subscription.lock() = Some(id);

        container.replace_reducer(rehydrating(base));
        debug!(prefix = %mediator.codec.prefix(), "Persistence mediator attached");

        Ok(mediator)
    }

    pub fn add_event_listener(&self, event: PersistEvent, listener: Listener) {
        self.events.add(event, listener);
    }

    pub fn remove_event_listener(&self, event: PersistEvent, listener: &Listener) {
        self.events.remove(event, listener);
    }

    /// Whether the first restore completed
    pub fn is_restored(&self) -> bool {
        self.restored.load(Ordering::SeqCst)
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.current()
    }

    pub fn config(&self) -> &PersistConfig {
        &self.config
    }

    /// Resolve once the restore has finished, successfully or not
    pub async fn wait_ready(&self) {
        self.lifecycle.wait_ready().await;
    }

    /// Resolve after every job queued before this call has run
    pub async fn flush(&self) -> RehydraResult<()> {
        let (tx, rx) = oneshot::channel();
        self.enqueue(Job::Flush(tx))?;
        rx.await.map_err(|_| RehydraError::WorkerStopped)
    }

    /// Remove every key under the configured prefix from the durable
    /// store and forget the diff baseline.
    pub async fn purge(&self) -> RehydraResult<()> {
        let (tx, rx) = oneshot::channel();
        self.enqueue(Job::Purge(tx))?;
        rx.await.map_err(|_| RehydraError::WorkerStopped)?
    }

    /// Delete the stored entries of `fields` and forget their baseline.
    ///
    /// Runs after every job queued before it. A removed field that is
    /// still in the state is written again on the next change pass.
    pub async fn remove(&self, fields: &[String]) -> RehydraResult<()> {
        let (tx, rx) = oneshot::channel();
        self.enqueue(Job::Remove(fields.to_vec(), tx))?;
        rx.await.map_err(|_| RehydraError::WorkerStopped)?
    }

    fn on_state_change(&self) {
        self.log(format_args!("~~ state change"));

        let job = match self.lifecycle.observe() {
            Gate::Restore => Job::Restore(self.container.get_state()),
            Gate::Save => Job::Save(self.container.get_state()),
            Gate::Drop => {
                self.log(format_args!("== not ready to save changes yet"));
                return;
            }
        };

        if let Err(e) = self.enqueue(job) {
            self.logger.error(&e);
        }
    }

    fn enqueue(&self, job: Job) -> RehydraResult<()> {
        self.jobs.send(job).map_err(|_| RehydraError::WorkerStopped)
    }

    async fn run(&self, job: Job) {
        match job {
            Job::Restore(state) => self.restore(state).await,
            Job::Save(state) => self.save(&state).await,
            Job::Purge(reply) => {
                let _ = reply.send(self.purge_keys().await);
            }
            Job::Remove(fields, reply) => {
                let _ = reply.send(self.remove_fields(&fields).await);
            }
            Job::Flush(reply) => {
                let _ = reply.send(());
            }
        }
    }

    async fn purge_keys(&self) -> RehydraResult<()> {
        let keys: Vec<String> = self
            .store
            .all_keys()
            .await
            .map_err(read_failure)?
            .into_iter()
            .filter(|key| self.codec.owns(key))
            .collect();

        self.log(format_args!("xx purge {} keys", keys.len()));
        if !keys.is_empty() {
            self.store.multi_remove(&keys).await.map_err(write_failure)?;
        }
        self.last_persisted.lock().clear();
        Ok(())
    }

    async fn remove_fields(&self, fields: &[String]) -> RehydraResult<()> {
        let keys: Vec<String> = fields.iter().map(|field| self.codec.encode_key(field)).collect();

        self.log(format_args!("xx remove {:?}", keys));
        if keys.is_empty() {
            return Ok(());
        }
        self.store.multi_remove(&keys).await.map_err(write_failure)?;

        let mut last_persisted = self.last_persisted.lock();
        for key in &keys {
            last_persisted.remove(key);
        }
        Ok(())
    }

    pub(crate) fn emit(&self, event: PersistEvent, payload: &StateMap) {
        self.log(format_args!("{} {:?}", event, payload));
        self.events.emit(event, payload, self.logger.as_ref());
    }

    pub(crate) fn log(&self, message: fmt::Arguments<'_>) {
        if self.config.log {
            self.logger.trace(message);
        }
    }
}

impl Drop for Mediator {
    fn drop(&mut self) {
        if let Some(id) = self.subscription.get_mut().take() {
            self.container.unsubscribe(id);
        }
    }
}

/// Attach with the default `tracing` log sink
pub fn persist_store(
    container: Arc<dyn StateContainer>,
    store: Arc<dyn DurableStore>,
    base: Reducer,
    config: PersistConfig,
) -> RehydraResult<Arc<Mediator>> {
    Mediator::attach(container, store, base, config, Arc::new(TracingLogger))
}

pub(crate) fn read_failure(err: RehydraError) -> RehydraError {
    match err {
        RehydraError::StorageRead(_) => err,
        other => RehydraError::StorageRead(other.to_string()),
    }
}

pub(crate) fn write_failure(err: RehydraError) -> RehydraError {
    match err {
        RehydraError::StorageWrite(_) => err,
        other => RehydraError::StorageWrite(other.to_string()),
    }
}

async fn run_worker(mediator: Weak<Mediator>, mut rx: mpsc::UnboundedReceiver<Job>) {
    let mut pending: Option<Job> = None;

    loop {
        let job = match pending.take() {
            Some(job) => job,
            None => match rx.recv().await {
                Some(job) => job,
                None => break,
            },
        };

        // Collapse queued saves into the newest snapshot
        let job = match job {
            Job::Save(mut latest) => {
                while let Ok(next) = rx.try_recv() {
                    match next {
                        Job::Save(newer) => latest = newer,
                        other => {
                            pending = Some(other);
                            break;
                        }
                    }
                }
                Job::Save(latest)
            }
            other => other,
        };

        let Some(mediator) = mediator.upgrade() else {
            break;
        };
        let logger = mediator.logger.clone();
        let name = job.name();

        // A panicking job only loses its own task
        let outcome = tokio::spawn(async move { mediator.run(job).await }).await;
        if let Err(e) = outcome {
            if e.is_panic() {
                logger.error(&RehydraError::JobPanicked {
                    job: name.to_string(),
                    message: panic_message(e.into_panic().as_ref()),
                });
            }
        }
    }

    debug!("Persistence worker stopped");
}
