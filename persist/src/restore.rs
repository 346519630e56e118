//! One-shot restore pass

use rehydra_core::{Action, PersistEvent, RehydraError, RehydraResult, StateMap};
use serde_json::Value;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::Ordering;

use crate::events::panic_message;
use crate::lifecycle::LifecycleGate;
use crate::mediator::{read_failure, Mediator};

/// Marks the lifecycle READY when dropped, unwinding included
struct ReadyOnExit<'a>(&'a LifecycleGate);

impl Drop for ReadyOnExit<'_> {
    fn drop(&mut self) {
        self.0.mark_ready();
    }
}

impl Mediator {
    /// Restore persisted fields into the container, then go READY.
    ///
    /// READY is reached on every exit path. `is_restored` only becomes
    /// true once the merged payload has been dispatched.
    ///
    /// When the durable read fails nothing is dispatched and the diff
    /// baseline stays empty. The first change after READY then writes
    /// every filtered in-memory value, replacing whatever the store still
    /// held. Like every save this is at-most-once.
    ///
    /// A reducer panic on `REHYDRATE` is logged; the container keeps its
    /// pre-restore state and no `restore` event is emitted.
    pub(crate) async fn restore(&self, state: StateMap) {
        let _ready = ReadyOnExit(&self.lifecycle);
        self.log(format_args!(">> restore"));

        let payload = match self.reconcile(&state).await {
            Ok(payload) => payload,
            Err(e) => {
                self.logger.error(&e);
                return;
            }
        };

        let action = Action::rehydrate(payload.clone());
        let kind = action.kind.clone();
        let dispatched = panic::catch_unwind(AssertUnwindSafe(|| self.container.dispatch(action)));
        if let Err(cause) = dispatched {
            self.logger.error(&RehydraError::DispatchPanicked {
                action: kind,
                message: panic_message(cause.as_ref()),
            });
            return;
        }

        self.emit(PersistEvent::Restore, &payload);
        self.restored.store(true, Ordering::SeqCst);
    }

    /// Read stored values, seed the missing ones, return the merged payload
    async fn reconcile(&self, state: &StateMap) -> RehydraResult<StateMap> {
        let keys: Vec<String> = state
            .keys()
            .filter(|field| self.filter.allows(field))
            .map(|field| self.codec.encode_key(field))
            .collect();

        let results = self.store.multi_get(&keys).await.map_err(read_failure)?;

        let mut stored = StateMap::new();
        let mut not_stored = StateMap::new();
        {
            let mut last_persisted = self.last_persisted.lock();

            for (encoded_key, encoded_value) in results {
                let field = match self.codec.decode_key(&encoded_key) {
                    Ok(field) => field.to_string(),
                    Err(e) => {
                        self.logger.error(&e);
                        continue;
                    }
                };

                let value = match encoded_value {
                    Some(raw) => match self.codec.decode_value(&field, &raw) {
                        Ok(Value::Null) => None,
                        Ok(value) => Some((raw, value)),
                        Err(e) => {
                            // Corrupt entries are overwritten by the seeding pass
                            self.logger.error(&e);
                            None
                        }
                    },
                    None => None,
                };

                match value {
                    Some((raw, value)) => {
                        self.log(format_args!("restore {} {}", encoded_key, raw));
                        last_persisted.insert(encoded_key, raw);
                        stored.insert(field, value);
                    }
                    None => {
                        if let Some(fallback) = state.get(&field) {
                            not_stored.insert(field, fallback.clone());
                        }
                    }
                }
            }
        }

        if !not_stored.is_empty() {
            self.log(format_args!(">> save initial values {:?}", not_stored));
            self.save(&not_stored).await;
        }

        let mut payload = stored;
        payload.extend(not_stored);
        Ok(payload)
    }
}
