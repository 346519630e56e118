//! CLI Commands

use anyhow::Context;
use rehydra_core::{reducer, Action, PersistEvent, Reducer, StateContainer, StateMap};
use rehydra_persist::{listener, persist_store, KeyCodec, Mediator};
use rehydra_state::{create_store, open_store, SharedDurableStore, SharedStore};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::CliConfig;

/// Action merging its payload object into the state
pub const SET_ACTION: &str = "SET";

/// Action removing the listed fields from the state
pub const UNSET_ACTION: &str = "UNSET";

/// Reducer for the command line session
pub fn session_reducer() -> Reducer {
    reducer(|mut state, action| {
        match (action.kind.as_str(), &action.payload) {
            (SET_ACTION, Value::Object(fields)) => {
                for (field, value) in fields {
                    state.insert(field.clone(), value.clone());
                }
            }
            (UNSET_ACTION, Value::Array(fields)) => {
                for field in fields.iter().filter_map(Value::as_str) {
                    state.remove(field);
                }
            }
            _ => {}
        }
        state
    })
}

/// Parse a value argument as JSON, falling back to a plain string
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// A container, a durable store, and the mediator between them
pub struct Session {
    container: SharedStore,
    store: SharedDurableStore,
    mediator: Arc<Mediator>,
    codec: KeyCodec,
}

impl Session {
    /// Open the store, attach the mediator, and wait for the restore
    pub async fn open(config: &CliConfig) -> anyhow::Result<Self> {
        let store = open_store(&config.storage).context("opening durable store")?;
        let codec = KeyCodec::new(config.persist.prefix.clone());

        // Fields only known to the store still need a slot to be restored into
        let mut defaults = config.defaults.clone();
        for key in store.all_keys().await? {
            if let Ok(field) = codec.decode_key(&key) {
                defaults.entry(field.to_string()).or_insert(Value::Null);
            }
        }
        let container = create_store(session_reducer(), defaults);

        let mediator = persist_store(
            container.clone(),
            store.clone(),
            session_reducer(),
            config.persist.clone(),
        )?;
        mediator.add_event_listener(
            PersistEvent::Save,
            listener(|payload| {
                let fields: Vec<&String> = payload.keys().collect();
                debug!(?fields, "Saved fields");
            }),
        );

        mediator.wait_ready().await;
        if mediator.is_restored() {
            info!("Restored state ({} fields)", container.get_state().len());
        } else {
            warn!("Restore failed, continuing from defaults");
        }

        Ok(Self {
            container,
            store,
            mediator,
            codec,
        })
    }

    pub fn state(&self) -> StateMap {
        self.container.get_state()
    }

    pub fn get(&self, field: &str) -> Option<Value> {
        self.container.get_state().get(field).cloned()
    }

    /// Set fields and wait until the resulting save has run
    pub async fn set(&self, fields: StateMap) -> anyhow::Result<()> {
        self.container
            .dispatch(Action::new(SET_ACTION, Value::Object(fields)));
        self.mediator.flush().await?;
        Ok(())
    }

    /// Remove fields from the state and delete their stored entries
    pub async fn unset(&self, fields: &[String]) -> anyhow::Result<()> {
        let payload = Value::Array(fields.iter().cloned().map(Value::String).collect());
        self.container.dispatch(Action::new(UNSET_ACTION, payload));
        self.mediator
            .remove(fields)
            .await
            .context("removing stored fields")?;
        Ok(())
    }

    /// Raw durable entries under this session's prefix
    pub async fn entries(&self) -> anyhow::Result<Vec<(String, String)>> {
        let keys: Vec<String> = self
            .store
            .all_keys()
            .await?
            .into_iter()
            .filter(|key| self.codec.owns(key))
            .collect();

        let values = self.store.multi_get(&keys).await?;
        Ok(values
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key, v)))
            .collect())
    }

    pub async fn purge(&self) -> anyhow::Result<()> {
        self.mediator.purge().await?;
        Ok(())
    }

    /// Drain pending work before exit
    pub async fn close(self) -> anyhow::Result<()> {
        self.mediator.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rehydra_core::{PersistConfig, StorageConfig};
    use serde_json::json;
    use tempfile::TempDir;

    fn config(path: &std::path::Path) -> CliConfig {
        let mut defaults = StateMap::new();
        defaults.insert("theme".into(), json!("light"));
        defaults.insert("volume".into(), json!(5));

        CliConfig {
            persist: PersistConfig::default().with_whitelist(["theme", "volume"]),
            storage: StorageConfig::sled(path),
            defaults,
        }
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("42"), json!(42));
        assert_eq!(parse_value("[1,2]"), json!([1, 2]));
        assert_eq!(parse_value("dark"), json!("dark"));
        assert_eq!(parse_value("\"quoted\""), json!("quoted"));
    }

    #[test]
    fn test_session_reducer() {
        let reduce = session_reducer();
        let mut state = StateMap::new();
        state.insert("a".into(), json!(1));

        let state = reduce(state, &Action::new(SET_ACTION, json!({"b": 2})));
        let state = reduce(state, &Action::new(UNSET_ACTION, json!(["a"])));

        assert_eq!(Value::Object(state), json!({"b": 2}));
    }

    #[tokio::test]
    async fn test_session_persists_between_runs() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp.path().join("db"));

        {
            let session = Session::open(&config).await.unwrap();
            let mut fields = StateMap::new();
            fields.insert("theme".into(), json!("dark"));
            fields.insert("scratch".into(), json!("not persisted"));
            session.set(fields).await.unwrap();

            let entries = session.entries().await.unwrap();
            assert_eq!(
                entries,
                vec![
                    ("reduxPersist:theme".to_string(), "\"dark\"".to_string()),
                    ("reduxPersist:volume".to_string(), "5".to_string()),
                ]
            );
            session.close().await.unwrap();
        }

        // A field missing from the defaults is still restored
        let mut fewer = config.clone();
        fewer.defaults.remove("volume");
        let session = Session::open(&fewer).await.unwrap();
        assert_eq!(session.get("theme"), Some(json!("dark")));
        assert_eq!(session.get("volume"), Some(json!(5)));
        assert_eq!(session.get("scratch"), None);

        session.purge().await.unwrap();
        assert!(session.entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unset_is_not_restored_by_next_session() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp.path().join("db"));

        {
            let session = Session::open(&config).await.unwrap();
            let mut fields = StateMap::new();
            fields.insert("theme".into(), json!("dark"));
            session.set(fields).await.unwrap();
            session.close().await.unwrap();
        }

        {
            let session = Session::open(&config).await.unwrap();
            assert_eq!(session.get("theme"), Some(json!("dark")));

            session.unset(&["theme".to_string()]).await.unwrap();
            assert_eq!(session.get("theme"), None);
            assert_eq!(
                session.entries().await.unwrap(),
                vec![("reduxPersist:volume".to_string(), "5".to_string())]
            );
            session.close().await.unwrap();
        }

        // Back to the configured default, not the old stored value
        let session = Session::open(&config).await.unwrap();
        assert_eq!(session.get("theme"), Some(json!("light")));
    }
}
