//! Diff-and-save pass

use rehydra_core::{PersistEvent, StateMap};

use crate::mediator::{write_failure, Mediator};

impl Mediator {
    /// Write every filtered field whose encoded value differs from the
    /// last persisted one.
    ///
    /// The baseline is updated before the write is confirmed and is not
    /// rolled back on failure: a value lost to a failed write is only
    /// retried once it changes again.
    pub(crate) async fn save(&self, state: &StateMap) {
        self.log(format_args!("<< save"));

        let mut batch = Vec::new();
        let mut payload = StateMap::new();
        {
            let mut last_persisted = self.last_persisted.lock();

            for (field, value) in state.iter().filter(|(field, _)| self.filter.allows(field)) {
                let encoded_value = match self.codec.encode_value(field, value) {
                    Ok(encoded) => encoded,
                    Err(e) => {
                        self.logger.error(&e);
                        continue;
                    }
                };
                let encoded_key = self.codec.encode_key(field);

                if last_persisted.get(&encoded_key) == Some(&encoded_value) {
                    continue;
                }

                self.log(format_args!("save {} {}", field, encoded_value));
                last_persisted.insert(encoded_key.clone(), encoded_value.clone());
                batch.push((encoded_key, encoded_value));
                payload.insert(field.clone(), value.clone());
            }
        }

        if batch.is_empty() {
            return;
        }

        match self.store.multi_set(batch).await {
            Ok(()) => self.emit(PersistEvent::Save, &payload),
            Err(e) => self.logger.error(&write_failure(e)),
        }
    }
}
