// src/vault/memory.rs
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{RecordEnvelope, SecretRecord, SecretVault, VaultError};

#[derive(Debug, Clone)]
struct StoredItem {
    key: String,
    envelope: RecordEnvelope,
}

#[derive(Debug, Default)]
struct MemoryState {
    items: Vec<StoredItem>,
    unavailable: Option<String>,
}

/// In-process store with the same contract as the platform backends.
///
/// Items live in a list rather than a map so a broken store (two items for
/// one key) can be reproduced in tests.
#[derive(Debug)]
pub struct MemoryVault {
    marker: String,
    state: Mutex<MemoryState>,
    open_sessions: AtomicUsize,
    sessions_opened: AtomicUsize,
    writes: AtomicUsize,
}

/// Exclusive scope over the store. Dropping it releases the lock and the
/// session count on every exit path.
struct Session<'a> {
    state: MutexGuard<'a, MemoryState>,
    open: &'a AtomicUsize,
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MemoryVault {
    pub fn new(marker: &str) -> Self {
        Self {
            marker: marker.to_string(),
            state: Mutex::new(MemoryState::default()),
            open_sessions: AtomicUsize::new(0),
            sessions_opened: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    fn open(&self) -> Result<Session<'_>, VaultError> {
        let state = self
            .state
            .lock()
            .map_err(|_| VaultError::Backend("memory vault lock poisoned".to_string()))?;
        self.open_sessions.fetch_add(1, Ordering::SeqCst);
        self.sessions_opened.fetch_add(1, Ordering::SeqCst);
        let session = Session {
            state,
            open: &self.open_sessions,
        };
        if let Some(reason) = &session.state.unavailable {
            return Err(VaultError::Backend(reason.clone()));
        }
        Ok(session)
    }

    fn matching<'s>(&self, state: &'s MemoryState, key: &str) -> Vec<(usize, &'s StoredItem)> {
        state
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.key == key && item.envelope.marker == self.marker)
            .collect()
    }

    fn single(&self, state: &MemoryState, key: &str) -> Result<usize, VaultError> {
        match self.matching(state, key).as_slice() {
            [] => Err(VaultError::NotFound(key.to_string())),
            [(index, _)] => Ok(*index),
            many => Err(VaultError::AmbiguousMatch {
                key: key.to_string(),
                count: many.len(),
            }),
        }
    }

    /// Stores an item without any duplicate check, as a corrupted or foreign
    /// backend might.
    #[cfg(test)]
    pub(crate) fn insert_raw(&self, marker: &str, label: &str, key: &str, payload: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.items.push(StoredItem {
                key: key.to_string(),
                envelope: RecordEnvelope::new(marker, label, payload),
            });
        }
    }

    /// Makes every following operation fail with a backend error.
    #[cfg(test)]
    pub(crate) fn set_unavailable(&self, reason: Option<&str>) {
        if let Ok(mut state) = self.state.lock() {
            state.unavailable = reason.map(str::to_string);
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Successful creates and deletes.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }

    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.load(Ordering::SeqCst)
    }
}

impl SecretVault for MemoryVault {
    fn create(&self, label: &str, key: &str, payload: &str) -> Result<(), VaultError> {
        let mut session = self.open()?;
        // Any item under this key blocks creation, ours or not.
        if session.state.items.iter().any(|item| item.key == key) {
            return Err(VaultError::DuplicateKey(key.to_string()));
        }
        session.state.items.push(StoredItem {
            key: key.to_string(),
            envelope: RecordEnvelope::new(&self.marker, label, payload),
        });
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<SecretRecord, VaultError> {
        let session = self.open()?;
        let index = self.single(&session.state, key)?;
        Ok(session.state.items[index].envelope.clone().into_record(key))
    }

    fn delete(&self, key: &str) -> Result<(), VaultError> {
        let mut session = self.open()?;
        let index = self.single(&session.state, key)?;
        session.state.items.remove(index);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
