/*!
 * Registry Audit Trail
 * Records grants, consumed calls and denials for inspection and export
 */

use crate::core::config::RegistryConfig;
use crate::core::errors::DenialReason;
use crate::core::types::{ClientId, OperationId};
use ahash::RandomState;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, TimestampSeconds};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

/// Audit event severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
    Info,
    Warning,
}

/// What happened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum EventKind {
    /// A new grant replaced whatever the client held before
    PermissionGranted {
        operations: Vec<OperationId>,
        sequence: bool,
    },
    CallConsumed {
        operation: OperationId,
    },
    CallDenied {
        operation: OperationId,
        reason: DenialReason,
    },
}

/// Registry audit event
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryEvent {
    pub client: ClientId,
    #[serde(flatten)]
    pub kind: EventKind,
    pub severity: AuditSeverity,
    #[serde_as(as = "TimestampSeconds<i64>")]
    pub logged_at: SystemTime,
}

impl RegistryEvent {
    pub fn new(client: ClientId, kind: EventKind) -> Self {
        let severity = match kind {
            EventKind::CallDenied { .. } => AuditSeverity::Warning,
            _ => AuditSeverity::Info,
        };

        Self {
            client,
            kind,
            severity,
            logged_at: SystemTime::now(),
        }
    }

    pub fn granted(client: ClientId, operations: Vec<OperationId>, sequence: bool) -> Self {
        Self::new(
            client,
            EventKind::PermissionGranted {
                operations,
                sequence,
            },
        )
    }

    pub fn consumed(client: ClientId, operation: OperationId) -> Self {
        Self::new(client, EventKind::CallConsumed { operation })
    }

    pub fn denied(client: ClientId, operation: OperationId, reason: DenialReason) -> Self {
        Self::new(client, EventKind::CallDenied { operation, reason })
    }

    pub fn is_grant(&self) -> bool {
        matches!(self.kind, EventKind::PermissionGranted { .. })
    }

    pub fn is_denial(&self) -> bool {
        matches!(self.kind, EventKind::CallDenied { .. })
    }
}

/// Bounded event log
///
/// Per-client state is only created through [`EventLog::log`] and
/// [`EventLog::count_denial`]; the registry calls those for grant holders
/// alone. Callers without a grant go through [`EventLog::log_unattributed`]
/// and [`EventLog::count_unattributed_denial`], which touch nothing keyed by
/// client, so unknown identities cannot grow the log past `max_events`.
pub struct EventLog {
    /// Global event log (ring buffer)
    events: RwLock<VecDeque<RegistryEvent>>,
    /// Per-client event logs
    client_events: DashMap<ClientId, VecDeque<RegistryEvent>, RandomState>,
    /// Denial counters, kept even when denials are not logged as events
    denial_counts: DashMap<ClientId, u64, RandomState>,
    /// Denials of callers that hold no grant
    unattributed_denials: AtomicU64,
    grants_logged: AtomicU64,
    consumed_logged: AtomicU64,
    max_events: usize,
    max_client_events: usize,
}

impl EventLog {
    pub fn new(max_events: usize, max_client_events: usize) -> Self {
        // A zero capacity would make every push evict itself
        let max_events = max_events.max(1);
        let max_client_events = max_client_events.max(1);

        Self {
            events: RwLock::new(VecDeque::with_capacity(max_events.min(1024))),
            client_events: DashMap::with_hasher(RandomState::new()),
            denial_counts: DashMap::with_hasher(RandomState::new()),
            unattributed_denials: AtomicU64::new(0),
            grants_logged: AtomicU64::new(0),
            consumed_logged: AtomicU64::new(0),
            max_events,
            max_client_events,
        }
    }

    pub fn from_config(config: &RegistryConfig) -> Self {
        Self::new(config.max_events, config.max_client_events)
    }

    /// Append an event to the global and per-client logs
    pub fn log(&self, event: RegistryEvent) {
        let client = event.client;
        if event.is_denial() {
            self.count_denial(client);
        } else {
            self.count_outcome(&event.kind);
        }
        self.push_global(event.clone());

        let mut entry = self
            .client_events
            .entry(client)
            .or_insert_with(VecDeque::new);
        if entry.len() >= self.max_client_events {
            entry.pop_front();
        }
        entry.push_back(event);
    }

    /// Append an event to the global log only
    pub fn log_unattributed(&self, event: RegistryEvent) {
        if event.is_denial() {
            self.count_unattributed_denial();
        } else {
            self.count_outcome(&event.kind);
        }
        self.push_global(event);
    }

    /// Bump the denial counter without recording an event
    pub fn count_denial(&self, client: ClientId) {
        self.denial_counts
            .entry(client)
            .and_modify(|count| *count += 1)
            .or_insert(1);
    }

    pub fn count_unattributed_denial(&self) {
        self.unattributed_denials.fetch_add(1, Ordering::Relaxed);
    }

    fn count_outcome(&self, kind: &EventKind) {
        match kind {
            EventKind::PermissionGranted { .. } => {
                self.grants_logged.fetch_add(1, Ordering::Relaxed);
            }
            EventKind::CallConsumed { .. } => {
                self.consumed_logged.fetch_add(1, Ordering::Relaxed);
            }
            EventKind::CallDenied { .. } => {}
        }
    }

    fn push_global(&self, event: RegistryEvent) {
        let mut events = self.events.write();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }

    /// Most recent events, newest first
    pub fn recent(&self, limit: usize) -> Vec<RegistryEvent> {
        let events = self.events.read();
        events.iter().rev().take(limit).cloned().collect()
    }

    /// Most recent events for a client, newest first
    pub fn for_client(&self, client: ClientId, limit: usize) -> Vec<RegistryEvent> {
        self.client_events
            .get(&client)
            .map(|entry| entry.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    /// Grant events still retained for a client, newest first
    pub fn grants_for(&self, client: ClientId) -> Vec<RegistryEvent> {
        self.client_events
            .get(&client)
            .map(|entry| entry.iter().rev().filter(|e| e.is_grant()).cloned().collect())
            .unwrap_or_default()
    }

    pub fn denial_count(&self, client: ClientId) -> u64 {
        self.denial_counts.get(&client).map(|e| *e).unwrap_or(0)
    }

    pub fn clients_with_denials(&self) -> Vec<(ClientId, u64)> {
        let mut clients: Vec<_> = self
            .denial_counts
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect();
        clients.sort();
        clients
    }

    /// Forget a client's per-client log and denial counter
    pub fn clear_client(&self, client: ClientId) {
        self.client_events.remove(&client);
        self.denial_counts.remove(&client);
    }

    pub fn clear_all(&self) {
        self.events.write().clear();
        self.client_events.clear();
        self.denial_counts.clear();
        self.unattributed_denials.store(0, Ordering::Relaxed);
        self.grants_logged.store(0, Ordering::Relaxed);
        self.consumed_logged.store(0, Ordering::Relaxed);
    }

    pub fn stats(&self) -> EventStats {
        let unattributed_denials = self.unattributed_denials.load(Ordering::Relaxed);
        EventStats {
            retained_events: self.events.read().len(),
            total_grants: self.grants_logged.load(Ordering::Relaxed),
            total_consumed: self.consumed_logged.load(Ordering::Relaxed),
            total_denials: self.denial_counts.iter().map(|e| *e.value()).sum::<u64>()
                + unattributed_denials,
            unattributed_denials,
            clients_tracked: self.client_events.len(),
        }
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::from_config(&RegistryConfig::default())
    }
}

/// Event log statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventStats {
    pub retained_events: usize,
    pub total_grants: u64,
    pub total_consumed: u64,
    pub total_denials: u64,
    pub unattributed_denials: u64,
    pub clients_tracked: usize,
}
