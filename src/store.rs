use std::{collections::HashMap, rc::Rc};

use crate::target::TargetRef;

/// Stable identity for a target, valid while the engine holds the target
/// handle alive. Targets may not support attaching arbitrary data, so
/// original values are kept in this side table instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct TargetKey(usize);

pub(crate) fn target_key(target: &TargetRef) -> TargetKey {
    TargetKey(Rc::as_ptr(target) as *const () as usize)
}

/// Per-engine bookkeeping for pre-engine target state. Every capture is
/// write-once: the first value stored for a key wins for the engine's
/// lifetime.
#[derive(Debug, Default)]
pub(crate) struct TargetStore {
    entries: HashMap<TargetKey, TargetData>,
}

#[derive(Debug, Default)]
struct TargetData {
    original_transform: Option<String>,
    original_display: Option<String>,
}

impl TargetStore {
    pub(crate) fn capture_transform(&mut self, key: TargetKey, value: impl Into<String>) {
        let entry = self.entries.entry(key).or_default();
        if entry.original_transform.is_none() {
            entry.original_transform = Some(value.into());
        }
    }

    pub(crate) fn original_transform(&self, key: TargetKey) -> Option<&str> {
        self.entries
            .get(&key)
            .and_then(|data| data.original_transform.as_deref())
    }

    pub(crate) fn capture_display(&mut self, key: TargetKey, value: impl Into<String>) {
        let entry = self.entries.entry(key).or_default();
        if entry.original_display.is_none() {
            entry.original_display = Some(value.into());
        }
    }

    pub(crate) fn original_display(&self, key: TargetKey) -> Option<&str> {
        self.entries
            .get(&key)
            .and_then(|data| data.original_display.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_are_write_once() {
        let key = TargetKey(7);
        let mut store = TargetStore::default();

        store.capture_transform(key, "rotate(45) ");
        store.capture_transform(key, "scale(2) ");
        assert_eq!(store.original_transform(key), Some("rotate(45) "));

        store.capture_display(key, "");
        store.capture_display(key, "block");
        assert_eq!(store.original_display(key), Some(""));
    }

    #[test]
    fn missing_keys_read_as_none() {
        let store = TargetStore::default();
        assert_eq!(store.original_transform(TargetKey(1)), None);
        assert_eq!(store.original_display(TargetKey(1)), None);
    }
}
