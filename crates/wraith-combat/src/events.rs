//! Event bus for combat notifications.
//!
//! The core publishes what happened; presentation layers (audio, UI, scene
//! sequencing) drain once per frame.

use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

use wraith_common::{EntityId, Vec3};

use crate::ability::AbilityKind;
use crate::enemy::EnemyAction;
use crate::player::PlayerStateId;

/// Why an ability stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndReason {
    /// Gauge could not cover the tick.
    Starved,
    /// Explicit cancel or state exit.
    Cancelled,
}

/// Events published by actors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    /// Player state changed.
    StateChanged {
        /// Actor
        actor: EntityId,
        /// Previous state
        from: PlayerStateId,
        /// New state
        to: PlayerStateId,
    },
    /// Ability began.
    AbilityStarted {
        /// Actor
        actor: EntityId,
        /// Ability
        kind: AbilityKind,
    },
    /// Ability stopped.
    AbilityEnded {
        /// Actor
        actor: EntityId,
        /// Ability
        kind: AbilityKind,
        /// Why it stopped
        reason: EndReason,
    },
    /// A hit was applied.
    HitLanded {
        /// Attacker
        instigator: EntityId,
        /// Victim
        target: EntityId,
        /// Damage applied
        amount: f32,
        /// Contact point
        hit_point: Vec3,
    },
    /// A hit was evaded in ghost mode.
    HitEvaded {
        /// Evading actor
        actor: EntityId,
        /// Attacker
        instigator: EntityId,
    },
    /// Actor died.
    Died {
        /// Actor
        actor: EntityId,
        /// Killing blow source
        instigator: EntityId,
    },
    /// Enemy picked its next action.
    EnemyDecided {
        /// Enemy
        actor: EntityId,
        /// Chosen action
        action: EnemyAction,
        /// Distance at decision time
        distance: f32,
    },
}

/// Event bus for broadcasting combat events.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: Sender<CombatEvent>,
    receiver: Receiver<CombatEvent>,
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Publishes an event. Dropped if the bus is full.
    pub fn publish(&self, event: CombatEvent) {
        let _ = self.sender.try_send(event);
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<CombatEvent> {
        self.receiver.try_iter().collect()
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Creates a new sender handle for publishing events.
    #[must_use]
    pub fn sender(&self) -> Sender<CombatEvent> {
        self.sender.clone()
    }
}
