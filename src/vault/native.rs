// src/vault/native.rs
use keyring::{Entry, Error as KeyringError};

use super::{RecordEnvelope, SecretRecord, SecretVault, VaultError};

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
compile_error!("no native secret store for this target (supported: macOS, Linux, Windows)");

/// Platform secret store: Keychain on macOS, Secret Service on Linux,
/// Credential Manager on Windows. Records are addressed by
/// (service, cluster endpoint); the service name doubles as access marker.
///
/// Every operation runs inside an [`UnlockScope`]. keyring unlocks the
/// Secret Service collection and items it touches but never locks them
/// again, so on Linux the scope locks the default collection when dropped.
#[derive(Debug, Clone)]
pub struct KeyringVault {
    service: String,
}

/// Puts the backend back in its locked state.
trait Relock {
    fn relock(&self);
}

/// Held for the duration of one vault operation; relocks on drop, whatever
/// the outcome of the operation.
struct UnlockScope<R: Relock> {
    backend: R,
}

impl<R: Relock> Drop for UnlockScope<R> {
    fn drop(&mut self) {
        self.backend.relock();
    }
}

#[cfg(target_os = "linux")]
mod platform {
    use dbus_secret_service::{EncryptionType, SecretService};

    use super::{Relock, UnlockScope};
    use crate::vault::VaultError;

    pub(super) struct SecretServiceLock {
        service: SecretService,
    }

    impl Relock for SecretServiceLock {
        fn relock(&self) {
            // Nothing to report to; a failed lock leaves the session as the
            // desktop keyring configured it.
            if let Ok(collection) = self.service.get_default_collection() {
                let _ = collection.lock();
            }
        }
    }

    pub(super) fn open_scope() -> Result<UnlockScope<SecretServiceLock>, VaultError> {
        let service = SecretService::connect(EncryptionType::Plain)
            .map_err(|e| VaultError::Backend(format!("cannot connect to Secret Service: {}", e)))?;
        Ok(UnlockScope {
            backend: SecretServiceLock { service },
        })
    }
}

#[cfg(not(target_os = "linux"))]
mod platform {
    use super::{Relock, UnlockScope};
    use crate::vault::VaultError;

    /// Keychain and Credential Manager do not hold an unlock per call.
    pub(super) struct NoRelock;

    impl Relock for NoRelock {
        fn relock(&self) {}
    }

    pub(super) fn open_scope() -> Result<UnlockScope<NoRelock>, VaultError> {
        Ok(UnlockScope { backend: NoRelock })
    }
}

impl KeyringVault {
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry, VaultError> {
        Entry::new(&self.service, key).map_err(|e| map_keyring_error(key, e))
    }

    fn read_owned(&self, entry: &Entry, key: &str) -> Result<RecordEnvelope, VaultError> {
        let raw = entry.get_password().map_err(|e| map_keyring_error(key, e))?;
        RecordEnvelope::parse_owned(&raw, &self.service)
            .ok_or_else(|| VaultError::NotFound(key.to_string()))
    }

    fn create_in_scope(&self, label: &str, key: &str, payload: &str) -> Result<(), VaultError> {
        let entry = self.entry(key)?;
        match entry.get_password() {
            Ok(_) => return Err(VaultError::DuplicateKey(key.to_string())),
            Err(KeyringError::NoEntry) => {}
            Err(e) => return Err(map_keyring_error(key, e)),
        }

        let envelope = RecordEnvelope::new(&self.service, label, payload);
        entry
            .set_password(&envelope.to_json()?)
            .map_err(|e| map_keyring_error(key, e))
    }

    fn delete_in_scope(&self, key: &str) -> Result<(), VaultError> {
        let entry = self.entry(key)?;
        self.read_owned(&entry, key)?;
        entry
            .delete_credential()
            .map_err(|e| map_keyring_error(key, e))
    }
}

/// Runs `operation` with `scope` alive; the scope is dropped after the
/// operation on success and on error alike.
fn scoped<R, T>(
    scope: UnlockScope<R>,
    operation: impl FnOnce() -> Result<T, VaultError>,
) -> Result<T, VaultError>
where
    R: Relock,
{
    let result = operation();
    drop(scope);
    result
}

impl SecretVault for KeyringVault {
    fn create(&self, label: &str, key: &str, payload: &str) -> Result<(), VaultError> {
        scoped(platform::open_scope()?, || self.create_in_scope(label, key, payload))
    }

    fn get(&self, key: &str) -> Result<SecretRecord, VaultError> {
        scoped(platform::open_scope()?, || {
            let entry = self.entry(key)?;
            Ok(self.read_owned(&entry, key)?.into_record(key))
        })
    }

    fn delete(&self, key: &str) -> Result<(), VaultError> {
        scoped(platform::open_scope()?, || self.delete_in_scope(key))
    }
}

fn map_keyring_error(key: &str, error: KeyringError) -> VaultError {
    match error {
        KeyringError::NoEntry => VaultError::NotFound(key.to_string()),
        KeyringError::Ambiguous(matches) => VaultError::AmbiguousMatch {
            key: key.to_string(),
            count: matches.len(),
        },
        other => VaultError::Backend(other.to_string()),
    }
}
