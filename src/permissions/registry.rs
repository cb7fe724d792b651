/*!
 * Permission Registry
 * Grants clients a consumable list of operations and spends it call by call
 */

use crate::core::config::RegistryConfig;
use crate::core::errors::{CallError, CallResult, DenialReason, SnapshotError};
use crate::core::types::{ClientId, OperationId};
use crate::monitoring::call_span;
use crate::permissions::audit::{EventLog, EventStats, RegistryEvent};
use crate::permissions::types::{
    CallGuard, GrantProvider, PermissionGrant, PermissionSystem, RegistrySnapshot,
};
use ahash::RandomState;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// Owns every client's grant
///
/// Each client's grant sits behind its own map entry lock, so a check and the
/// consumption it authorises happen as one step: two callers racing for the
/// last unit of a permission cannot both succeed.
pub struct PermissionRegistry {
    grants: DashMap<ClientId, PermissionGrant, RandomState>,
    events: EventLog,
    config: RegistryConfig,
}

impl PermissionRegistry {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        debug!(?config, "Initializing permission registry");
        Self {
            grants: DashMap::with_hasher(RandomState::new()),
            events: EventLog::from_config(&config),
            config,
        }
    }

    /// Rebuild a registry from persisted records
    pub fn from_snapshot(
        snapshot: RegistrySnapshot,
        config: RegistryConfig,
    ) -> Result<Self, SnapshotError> {
        let registry = Self::with_config(config);

        for record in snapshot.clients {
            let (client, grant) = PermissionGrant::from_record(record)?;
            match registry.grants.entry(client) {
                Entry::Occupied(_) => return Err(SnapshotError::DuplicateClient { client }),
                Entry::Vacant(slot) => {
                    slot.insert(grant);
                }
            }
        }

        info!(clients = registry.grants.len(), "Restored permission registry");
        Ok(registry)
    }

    /// Replace `client`'s grant with `operations`
    ///
    /// Whatever the client held before is discarded, consumed or not: the new
    /// grant starts at progress zero, or with every operation at its
    /// occurrence count in `operations`. Who may grant is up to the caller.
    pub fn grant(&self, client: ClientId, operations: impl Into<Vec<OperationId>>, sequence: bool) {
        let operations = operations.into();
        let grant = PermissionGrant::new(operations.clone(), sequence);
        let event = RegistryEvent::granted(client, operations, sequence);
        let calls = grant.allowed_calls().len();

        // The event is logged under the entry lock so the audit order of
        // concurrent grants matches the order they were stored in
        let replaced_unspent = match self.grants.entry(client) {
            Entry::Occupied(mut slot) => {
                let replaced = slot.insert(grant);
                self.events.log(event);
                !replaced.is_exhausted()
            }
            Entry::Vacant(slot) => {
                let _held = slot.insert(grant);
                self.events.log(event);
                false
            }
        };

        info!(
            client = %client,
            calls,
            sequence,
            replaced_unspent,
            "Granted call permissions"
        );
    }

    /// Calls that may still succeed for `operation`, see [`PermissionGrant::remaining`]
    pub fn remaining_calls(&self, client: ClientId, operation: OperationId) -> u32 {
        self.grants
            .get(&client)
            .map(|grant| grant.remaining(operation))
            .unwrap_or(0)
    }

    /// Sequence cursor; `None` in multiset mode or without a grant
    pub fn sequence_progress(&self, client: ClientId) -> Option<usize> {
        self.grants.get(&client).and_then(|grant| grant.progress())
    }

    /// True when no further call can succeed, including for unknown clients
    pub fn is_exhausted(&self, client: ClientId) -> bool {
        self.grants
            .get(&client)
            .map(|grant| grant.is_exhausted())
            .unwrap_or(true)
    }

    /// When the current grant was issued; `None` without a grant
    pub fn granted_at(&self, client: ClientId) -> Option<SystemTime> {
        self.grants.get(&client).map(|grant| grant.granted_at())
    }

    pub fn has_grant(&self, client: ClientId) -> bool {
        self.grants.contains_key(&client)
    }

    pub fn client_count(&self) -> usize {
        self.grants.len()
    }

    /// Copy of every client's record, ordered by client
    pub fn snapshot(&self) -> RegistrySnapshot {
        let mut clients: Vec<_> = self
            .grants
            .iter()
            .map(|entry| entry.value().to_record(*entry.key()))
            .collect();
        clients.sort_by_key(|record| record.client);
        RegistrySnapshot { clients }
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn event_stats(&self) -> EventStats {
        self.events.stats()
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Record a denial; only grant holders get per-client audit state
    fn deny(&self, client: ClientId, operation: OperationId, reason: DenialReason) -> CallError {
        warn!(client = %client, operation = %operation, %reason, "Call not allowed");
        let attributed = reason != DenialReason::NoGrant;
        match (self.config.audit_consumption, attributed) {
            (true, true) => self
                .events
                .log(RegistryEvent::denied(client, operation, reason)),
            (true, false) => self
                .events
                .log_unattributed(RegistryEvent::denied(client, operation, reason)),
            (false, true) => self.events.count_denial(client),
            (false, false) => self.events.count_unattributed_denial(),
        }
        CallError::not_allowed(client, operation, reason)
    }

    fn consumed(&self, client: ClientId, operation: OperationId) {
        debug!(client = %client, operation = %operation, "Call permission consumed");
        if self.config.audit_consumption {
            self.events.log(RegistryEvent::consumed(client, operation));
        }
    }
}

impl Default for PermissionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CallGuard for PermissionRegistry {
    fn check_and_consume(&self, client: ClientId, operation: OperationId) -> CallResult<()> {
        self.guarded::<(), CallError, _>(client, operation, || Ok(()))
    }

    fn guarded<T, E, F>(&self, client: ClientId, operation: OperationId, body: F) -> Result<T, E>
    where
        E: From<CallError>,
        F: FnOnce() -> Result<T, E>,
    {
        let _span = call_span(client, operation).entered();

        // Lookup never inserts: failed checks leave no trace in the map
        let Some(mut grant) = self.grants.get_mut(&client) else {
            return Err(self.deny(client, operation, DenialReason::NoGrant).into());
        };

        let slot = match grant.check(operation) {
            Ok(slot) => slot,
            Err(reason) => {
                drop(grant);
                return Err(self.deny(client, operation, reason).into());
            }
        };

        match body() {
            Ok(value) => {
                grant.commit(slot);
                drop(grant);
                self.consumed(client, operation);
                Ok(value)
            }
            Err(e) => {
                debug!(client = %client, operation = %operation, "Guarded operation failed, permission kept");
                Err(e)
            }
        }
    }
}

impl GrantProvider for PermissionRegistry {
    fn allowed_calls(&self, client: ClientId) -> Vec<OperationId> {
        self.grants
            .get(&client)
            .map(|grant| grant.allowed_calls().to_vec())
            .unwrap_or_default()
    }

    fn is_sequence(&self, client: ClientId) -> bool {
        self.grants
            .get(&client)
            .map(|grant| grant.is_sequence())
            .unwrap_or(false)
    }
}

impl PermissionSystem for PermissionRegistry {}
