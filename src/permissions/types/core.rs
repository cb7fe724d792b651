/*!
 * Permission Types
 * Per-client grants and the two consumption policies
 */

use crate::core::errors::{DenialReason, SnapshotError};
use crate::core::types::{ClientId, OperationId};
use ahash::RandomState;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, TimestampSeconds};
use std::collections::{BTreeMap, HashMap};
use std::time::SystemTime;

/// Per-operation budget used by multiset grants
pub type RemainingCounts = HashMap<OperationId, u32, RandomState>;

/// How a grant is spent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumptionMode {
    /// Calls must follow the granted list exactly, one slot at a time
    Sequence { progress: usize },
    /// Calls may come in any order, budgeted per operation
    Multiset { remaining: RemainingCounts },
}

/// Unit of permission located by a successful check, spent by `commit`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    Position(usize),
    Budget(OperationId),
}

/// The permissions currently granted to one client
///
/// `allowed_calls` is kept verbatim for the lifetime of the grant. Only the
/// mode's cursor or counters change as calls are consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionGrant {
    allowed_calls: Vec<OperationId>,
    mode: ConsumptionMode,
    granted_at: SystemTime,
}

fn occurrence_counts(calls: &[OperationId]) -> RemainingCounts {
    let mut counts = RemainingCounts::with_hasher(RandomState::new());
    for op in calls {
        let count = counts.entry(*op).or_insert(0);
        *count = count.saturating_add(1);
    }
    counts
}

impl PermissionGrant {
    /// Fresh grant: progress at zero, or every operation at its full count
    pub fn new(allowed_calls: Vec<OperationId>, sequence: bool) -> Self {
        let mode = if sequence {
            ConsumptionMode::Sequence { progress: 0 }
        } else {
            ConsumptionMode::Multiset {
                remaining: occurrence_counts(&allowed_calls),
            }
        };
        Self {
            allowed_calls,
            mode,
            granted_at: SystemTime::now(),
        }
    }

    pub fn allowed_calls(&self) -> &[OperationId] {
        &self.allowed_calls
    }

    pub fn mode(&self) -> &ConsumptionMode {
        &self.mode
    }

    pub fn granted_at(&self) -> SystemTime {
        self.granted_at
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self.mode, ConsumptionMode::Sequence { .. })
    }

    /// Cursor into `allowed_calls`, sequence mode only
    pub fn progress(&self) -> Option<usize> {
        match self.mode {
            ConsumptionMode::Sequence { progress } => Some(progress),
            ConsumptionMode::Multiset { .. } => None,
        }
    }

    /// How many more times `operation` could still succeed
    ///
    /// In sequence mode this counts occurrences in the unconsumed suffix,
    /// which is an upper bound since order still applies.
    pub fn remaining(&self, operation: OperationId) -> u32 {
        match &self.mode {
            ConsumptionMode::Sequence { progress } => {
                let unconsumed = self.allowed_calls.get(*progress..).unwrap_or_default();
                unconsumed
                    .iter()
                    .filter(|op| **op == operation)
                    .count()
                    .try_into()
                    .unwrap_or(u32::MAX)
            }
            ConsumptionMode::Multiset { remaining } => {
                remaining.get(&operation).copied().unwrap_or(0)
            }
        }
    }

    /// True once every further call is bound to fail
    pub fn is_exhausted(&self) -> bool {
        match &self.mode {
            ConsumptionMode::Sequence { progress } => *progress >= self.allowed_calls.len(),
            ConsumptionMode::Multiset { remaining } => remaining.values().all(|n| *n == 0),
        }
    }

    /// Locate the unit of permission `operation` would spend, without spending it
    pub(crate) fn check(&self, operation: OperationId) -> Result<Slot, DenialReason> {
        match &self.mode {
            ConsumptionMode::Sequence { progress } => match self.allowed_calls.get(*progress) {
                None => Err(DenialReason::SequenceExhausted {
                    length: self.allowed_calls.len(),
                }),
                Some(expected) if *expected != operation => Err(DenialReason::OutOfOrder {
                    expected: *expected,
                    position: *progress,
                }),
                Some(_) => Ok(Slot::Position(*progress)),
            },
            ConsumptionMode::Multiset { remaining } => match remaining.get(&operation) {
                Some(n) if *n > 0 => Ok(Slot::Budget(operation)),
                _ => Err(DenialReason::BudgetExhausted),
            },
        }
    }

    /// Spend a slot returned by `check` on this same, unmodified grant
    pub(crate) fn commit(&mut self, slot: Slot) {
        match (&mut self.mode, slot) {
            (ConsumptionMode::Sequence { progress }, Slot::Position(position)) => {
                debug_assert_eq!(*progress, position);
                *progress = position + 1;
            }
            (ConsumptionMode::Multiset { remaining }, Slot::Budget(operation)) => {
                if let Some(n) = remaining.get_mut(&operation) {
                    *n = n.saturating_sub(1);
                }
            }
            _ => debug_assert!(false, "slot does not belong to this grant's mode"),
        }
    }

    /// Check and spend in one step
    pub fn try_consume(&mut self, operation: OperationId) -> Result<(), DenialReason> {
        let slot = self.check(operation)?;
        self.commit(slot);
        Ok(())
    }

    /// Persistable form of this grant
    pub fn to_record(&self, client: ClientId) -> ClientRecord {
        let (sequence_progress, remaining_counts) = match &self.mode {
            ConsumptionMode::Sequence { progress } => (*progress, BTreeMap::new()),
            ConsumptionMode::Multiset { remaining } => {
                (0, remaining.iter().map(|(op, n)| (*op, *n)).collect())
            }
        };

        ClientRecord {
            client,
            allowed_calls: self.allowed_calls.clone(),
            is_sequence: self.is_sequence(),
            sequence_progress,
            remaining_counts,
            granted_at: self.granted_at,
        }
    }

    /// Rebuild a grant from a persisted record, rejecting states that
    /// consumption could never have produced
    pub fn from_record(record: ClientRecord) -> Result<(ClientId, Self), SnapshotError> {
        let ClientRecord {
            client,
            allowed_calls,
            is_sequence,
            sequence_progress,
            remaining_counts,
            granted_at,
        } = record;

        let mode = if is_sequence {
            if !remaining_counts.is_empty() {
                return Err(SnapshotError::MixedMode { client });
            }
            if sequence_progress > allowed_calls.len() {
                return Err(SnapshotError::ProgressOutOfRange {
                    client,
                    progress: sequence_progress,
                    length: allowed_calls.len(),
                });
            }
            ConsumptionMode::Sequence {
                progress: sequence_progress,
            }
        } else {
            if sequence_progress != 0 {
                return Err(SnapshotError::MixedMode { client });
            }
            let granted = occurrence_counts(&allowed_calls);
            for (operation, remaining) in &remaining_counts {
                let limit = granted.get(operation).copied().unwrap_or(0);
                if *remaining > limit {
                    return Err(SnapshotError::CountOutOfRange {
                        client,
                        operation: *operation,
                        remaining: *remaining,
                        granted: limit,
                    });
                }
            }
            // Operations absent from the record have been fully spent
            let remaining = granted
                .keys()
                .map(|op| (*op, remaining_counts.get(op).copied().unwrap_or(0)))
                .collect::<RemainingCounts>();
            ConsumptionMode::Multiset { remaining }
        };

        Ok((
            client,
            Self {
                allowed_calls,
                mode,
                granted_at,
            },
        ))
    }
}

/// One persisted client entry: the granted list, the mode, and its progress
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRecord {
    pub client: ClientId,
    pub allowed_calls: Vec<OperationId>,
    pub is_sequence: bool,
    #[serde(default)]
    pub sequence_progress: usize,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub remaining_counts: BTreeMap<OperationId, u32>,
    #[serde_as(as = "TimestampSeconds<i64>")]
    pub granted_at: SystemTime,
}

/// Full registry state, ordered by client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub clients: Vec<ClientRecord>,
}
