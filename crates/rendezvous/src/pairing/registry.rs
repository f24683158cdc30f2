//! Registry of live pairing codes.
//!
//! Holds the two directions of the code <-> connection mapping behind a
//! single lock so that every operation is observed whole. Nothing outside
//! this module touches the maps.

use std::collections::HashMap;

use rendezvous_protocol::{ConnectionId, PairingCode};
use tokio::sync::Mutex;

/// Outcome of [`ConnectionRegistry::claim`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// The code was live and has been consumed; carries its former owner.
    Claimed(ConnectionId),
    /// No live code matched.
    NotFound,
    /// The joiner owns the code. Nothing was removed.
    OwnedByJoiner,
}

#[derive(Debug, Default)]
struct RegistryState {
    /// code -> owner
    owners: HashMap<PairingCode, ConnectionId>,
    /// owner -> code
    codes: HashMap<ConnectionId, PairingCode>,
}

impl RegistryState {
    fn put(&mut self, code: PairingCode, identity: ConnectionId) {
        if let Some(previous) = self.codes.remove(&identity) {
            self.owners.remove(&previous);
        }
        if let Some(displaced) = self.owners.insert(code.clone(), identity.clone()) {
            self.codes.remove(&displaced);
        }
        self.codes.insert(identity, code);
        self.debug_check();
    }

    fn resolve(&self, code: &PairingCode) -> Option<ConnectionId> {
        self.owners.get(code).cloned()
    }

    fn consume(&mut self, code: &PairingCode) -> Option<ConnectionId> {
        let owner = self.owners.remove(code)?;
        self.purge(&owner);
        Some(owner)
    }

    fn purge(&mut self, identity: &ConnectionId) -> Option<PairingCode> {
        let code = self.codes.remove(identity);
        self.owners.retain(|_, owner| owner != identity);
        self.debug_check();
        code
    }

    fn debug_check(&self) {
        debug_assert_eq!(self.owners.len(), self.codes.len());
        debug_assert!(
            self.codes
                .iter()
                .all(|(identity, code)| self.owners.get(code) == Some(identity)),
            "reverse entry without matching forward entry"
        );
    }
}

/// Bidirectional code <-> connection mapping.
///
/// At most one code per connection and one connection per code.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    state: Mutex<RegistryState>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `code` as owned by `identity`.
    ///
    /// Any code `identity` held before is dropped, and if `code` belonged to
    /// another connection that connection loses it.
    pub async fn put(&self, code: PairingCode, identity: ConnectionId) {
        self.state.lock().await.put(code, identity);
    }

    /// Record `code` for `identity` unless another connection holds it.
    ///
    /// Returns `false` and leaves the registry untouched on collision.
    pub async fn try_put(&self, code: PairingCode, identity: ConnectionId) -> bool {
        let mut state = self.state.lock().await;
        match state.owners.get(&code) {
            Some(owner) if owner != &identity => false,
            _ => {
                state.put(code, identity);
                true
            }
        }
    }

    pub async fn resolve(&self, code: &PairingCode) -> Option<ConnectionId> {
        self.state.lock().await.resolve(code)
    }

    /// Code currently owned by `identity`, if any.
    pub async fn code_for(&self, identity: &ConnectionId) -> Option<PairingCode> {
        self.state.lock().await.codes.get(identity).cloned()
    }

    /// Look up and remove `code` together with every entry of its owner.
    pub async fn consume(&self, code: &PairingCode) -> Option<ConnectionId> {
        self.state.lock().await.consume(code)
    }

    /// Remove every entry referencing `identity`. Safe to repeat.
    pub async fn purge(&self, identity: &ConnectionId) -> Option<PairingCode> {
        self.state.lock().await.purge(identity)
    }

    /// Resolve and consume `code` on behalf of `joiner` in one step.
    ///
    /// Concurrent claims of the same code are serialized; exactly one of them
    /// sees [`Claim::Claimed`].
    pub async fn claim(&self, code: &PairingCode, joiner: &ConnectionId) -> Claim {
        let mut state = self.state.lock().await;
        match state.resolve(code) {
            None => Claim::NotFound,
            Some(owner) if &owner == joiner => Claim::OwnedByJoiner,
            Some(_) => match state.consume(code) {
                Some(owner) => Claim::Claimed(owner),
                None => Claim::NotFound,
            },
        }
    }

    /// Number of live codes.
    pub async fn len(&self) -> usize {
        self.state.lock().await.owners.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
