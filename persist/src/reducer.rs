//! Reducer composition for rehydration

use rehydra_core::{reducer, Reducer};
use serde_json::Value;

/// Wrap `base` so `REHYDRATE` payload fields override the current state.
///
/// Fields absent from the payload are left untouched. Every other action
/// is passed to `base` unchanged.
pub fn rehydrating(base: Reducer) -> Reducer {
    reducer(move |state, action| {
        if !action.is_rehydrate() {
            return base(state, action);
        }

        let mut merged = state;
        if let Value::Object(payload) = &action.payload {
            for (field, value) in payload {
                merged.insert(field.clone(), value.clone());
            }
        }
        base(merged, action)
    })
}
