//! Receiver contracts: collaborators that can veto a dispatch and that are
//! told about incoming and completed tasks.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::task::Task;
use crate::util::serde::PayloadKind;

/// Why a receiver refuses a dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockerKind {
    /// The vehicle pool is exhausted.
    NoVehicleAvailable,
    /// The receiver has no room for another task.
    ReceiverFull,
    /// Receiver-specific reason.
    Other(String),
}

/// A typed veto returned by [`TaskReceiver::can_accept_task`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blocker {
    /// Reason for the veto.
    pub kind: BlockerKind,
    /// Name of the receiver that raised it.
    pub source: String,
}

impl Blocker {
    /// Construct a blocker.
    pub fn new(kind: BlockerKind, source: impl Into<String>) -> Self {
        Self {
            kind,
            source: source.into(),
        }
    }
}

impl fmt::Display for Blocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:?}", self.source, self.kind)
    }
}

/// A collaborator that reacts to a task's lifecycle.
///
/// Receivers are shared between tasks, so every method takes `&self`;
/// implementations keep their own state behind interior mutability.
pub trait TaskReceiver: Send + Sync {
    /// Name used in logs and blockers.
    fn name(&self) -> &str;

    /// `None` if the receiver accepts `task` right now, otherwise the reason.
    fn can_accept_task(&self, task: &Task) -> Option<Blocker>;

    /// A vehicle has been sent for `task`.
    fn on_task_incoming(&self, task: &Task);

    /// `task` was completed and claimed.
    fn on_task_received(&self, task: &Task);

    /// `task` was torn down after `on_task_incoming` and will never arrive.
    fn on_task_cancelled(&self, _task: &Task) {}
}

/// Shared handle to a receiver.
pub type ReceiverHandle = Arc<dyn TaskReceiver>;

/// Receivers a task notifies, fixed at task setup.
pub type ReceiverList = Arc<[ReceiverHandle]>;

/// Wires receivers to tasks by payload kind.
///
/// `always` receivers come first for every task, then the receivers of each
/// payload kind the task carries, in the order the kinds are listed.
#[derive(Clone, Default)]
pub struct ReceiverRegistry {
    always: Vec<ReceiverHandle>,
    by_kind: Vec<(PayloadKind, ReceiverHandle)>,
}

impl ReceiverRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a receiver wired to every task.
    pub fn add_always(&mut self, receiver: ReceiverHandle) {
        self.always.push(receiver);
    }

    /// Add a receiver wired to tasks carrying `kind`.
    pub fn add_for_kind(&mut self, kind: PayloadKind, receiver: ReceiverHandle) {
        self.by_kind.push((kind, receiver));
    }

    /// Build the receiver list for a task with the given payload kinds.
    pub fn receivers_for(&self, kinds: &[PayloadKind]) -> ReceiverList {
        let mut list: Vec<ReceiverHandle> = self.always.clone();
        for kind in kinds {
            list.extend(
                self.by_kind
                    .iter()
                    .filter(|(k, _)| k == kind)
                    .map(|(_, r)| Arc::clone(r)),
            );
        }
        list.into()
    }
}

impl fmt::Debug for ReceiverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReceiverRegistry")
            .field("always", &self.always.iter().map(|r| r.name()).collect::<Vec<_>>())
            .field(
                "by_kind",
                &self
                    .by_kind
                    .iter()
                    .map(|(k, r)| (*k, r.name()))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Totals accumulated by a [`RewardLedger`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTotals {
    /// Currency granted.
    pub money: u64,
    /// Entities collected, in claim order.
    pub entities: Vec<String>,
    /// Tasks claimed.
    pub claimed: u64,
}

/// Receiver that grants currency and collects entities on claim.
#[derive(Debug, Default)]
pub struct RewardLedger {
    name: String,
    totals: Mutex<LedgerTotals>,
}

impl RewardLedger {
    /// Create an empty ledger.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            totals: Mutex::new(LedgerTotals::default()),
        }
    }

    /// Snapshot of the accumulated totals.
    pub fn totals(&self) -> LedgerTotals {
        self.totals.lock().clone()
    }
}

impl TaskReceiver for RewardLedger {
    fn name(&self) -> &str {
        &self.name
    }

    fn can_accept_task(&self, _task: &Task) -> Option<Blocker> {
        None
    }

    fn on_task_incoming(&self, _task: &Task) {}

    fn on_task_received(&self, task: &Task) {
        let payload = task.payload();
        let mut totals = self.totals.lock();
        if payload.has_kind(PayloadKind::Money) {
            totals.money += u64::from(payload.reward);
        }
        if payload.has_kind(PayloadKind::Entity) {
            if let Some(entity) = &payload.entity {
                totals.entities.push(entity.clone());
            }
        }
        totals.claimed += 1;
        debug!(task = task.id(), receiver = %self.name, money = totals.money, "reward granted");
    }
}

#[derive(Debug, Default)]
struct IntakeState {
    incoming: usize,
    held: usize,
}

/// Receiver with bounded room: tasks in flight plus tasks already received
/// may not exceed `capacity`.
#[derive(Debug)]
pub struct IntakeLimit {
    name: String,
    capacity: usize,
    state: Mutex<IntakeState>,
}

impl IntakeLimit {
    /// Create an intake with the given capacity.
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            capacity,
            state: Mutex::new(IntakeState::default()),
        }
    }

    /// Tasks in flight toward this receiver.
    pub fn incoming(&self) -> usize {
        self.state.lock().incoming
    }

    /// Tasks received and still held.
    pub fn held(&self) -> usize {
        self.state.lock().held
    }

    /// Free `count` held slots; returns how many were actually freed.
    pub fn discharge(&self, count: usize) -> usize {
        let mut state = self.state.lock();
        let freed = count.min(state.held);
        state.held -= freed;
        freed
    }
}

impl TaskReceiver for IntakeLimit {
    fn name(&self) -> &str {
        &self.name
    }

    fn can_accept_task(&self, _task: &Task) -> Option<Blocker> {
        let state = self.state.lock();
        (state.incoming + state.held >= self.capacity)
            .then(|| Blocker::new(BlockerKind::ReceiverFull, self.name.clone()))
    }

    fn on_task_incoming(&self, _task: &Task) {
        self.state.lock().incoming += 1;
    }

    fn on_task_received(&self, _task: &Task) {
        let mut state = self.state.lock();
        state.incoming = state.incoming.saturating_sub(1);
        state.held += 1;
    }

    fn on_task_cancelled(&self, task: &Task) {
        let mut state = self.state.lock();
        state.incoming = state.incoming.saturating_sub(1);
        debug!(task = task.id(), receiver = %self.name, incoming = state.incoming, "intake slot freed");
    }
}
