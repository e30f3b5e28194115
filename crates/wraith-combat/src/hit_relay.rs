//! Weapon hit windows with per-target deduplication.
//!
//! A window is opened and closed explicitly by animation callbacks. Opening
//! clears the already-hit set; closing only marks the hitbox dead, so the set
//! survives until the next open. Dropped collisions are expected filter
//! outcomes and are only traced.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use wraith_common::{EntityId, Vec3};

use crate::damage::{resolve_damage, DamageInfo, DamageInputs};

/// A raw weapon collision reported by the physics layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// Entity whose collider was touched.
    pub target: EntityId,
    /// World-space contact point.
    pub hit_point: Vec3,
    /// Contact normal.
    pub hit_normal: Vec3,
}

impl Contact {
    /// Create a contact.
    #[must_use]
    pub const fn new(target: EntityId, hit_point: Vec3, hit_normal: Vec3) -> Self {
        Self {
            target,
            hit_point,
            hit_normal,
        }
    }
}

/// Scene hierarchy lookups needed to reject self-hits.
pub trait ActorHierarchy {
    /// Whether `candidate` is `ancestor` or lives under it.
    fn is_same_or_descendant(&self, candidate: EntityId, ancestor: EntityId) -> bool;
}

/// Flat hierarchy: every entity is its own root.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatHierarchy;

impl ActorHierarchy for FlatHierarchy {
    fn is_same_or_descendant(&self, candidate: EntityId, ancestor: EntityId) -> bool {
        candidate == ancestor
    }
}

/// Receives accepted hits (the target's damage-apply entry point).
pub trait DamageSink {
    /// Deliver one hit.
    fn deliver(&mut self, info: DamageInfo);
}

impl DamageSink for Vec<DamageInfo> {
    fn deliver(&mut self, info: DamageInfo) {
        self.push(info);
    }
}

/// What happened to a reported contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitOutcome {
    /// First contact with this target this window; damage delivered.
    Accepted(DamageInfo),
    /// Hitbox not live.
    NotLive,
    /// Target already hit this window.
    AlreadyHit,
    /// Target is the attacker or part of it.
    OwnHierarchy,
}

impl HitOutcome {
    /// Check if the contact produced damage.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

/// Per-weapon hit window state.
#[derive(Debug, Clone)]
pub struct HitRelay {
    owner: EntityId,
    live: bool,
    collision_enabled: bool,
    already_hit: AHashSet<EntityId>,
}

impl HitRelay {
    /// Create a closed relay for `owner`.
    #[must_use]
    pub fn new(owner: EntityId) -> Self {
        Self {
            owner,
            live: false,
            collision_enabled: true,
            already_hit: AHashSet::new(),
        }
    }

    /// Attacking entity.
    #[must_use]
    pub fn owner(&self) -> EntityId {
        self.owner
    }

    /// Check if the hitbox is live.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Check if attack collision is enabled at all.
    #[must_use]
    pub fn collision_enabled(&self) -> bool {
        self.collision_enabled
    }

    /// Enable or disable attack collision. Disabling also closes the window.
    pub fn set_collision_enabled(&mut self, enabled: bool) {
        self.collision_enabled = enabled;
        if !enabled {
            self.close_window();
        }
    }

    /// Open a window: clear the dedup set and go live.
    ///
    /// Ignored while collision is disabled.
    pub fn open_window(&mut self) {
        if !self.collision_enabled {
            trace!(owner = %self.owner, "hit window open ignored: collision disabled");
            return;
        }
        self.already_hit.clear();
        self.live = true;
        trace!(owner = %self.owner, "hit window opened");
    }

    /// Close the window. The dedup set is kept until the next open.
    pub fn close_window(&mut self) {
        if self.live {
            trace!(owner = %self.owner, hits = self.already_hit.len(), "hit window closed");
        }
        self.live = false;
    }

    /// Targets hit in the current (or last) window.
    #[must_use]
    pub fn hit_count(&self) -> usize {
        self.already_hit.len()
    }

    /// Check if `target` was hit in the current (or last) window.
    #[must_use]
    pub fn has_hit(&self, target: EntityId) -> bool {
        self.already_hit.contains(&target)
    }

    /// Filter a contact, resolve damage and deliver it.
    pub fn report(
        &mut self,
        contact: &Contact,
        hierarchy: &dyn ActorHierarchy,
        inputs: &DamageInputs,
        sink: &mut dyn DamageSink,
    ) -> HitOutcome {
        if !self.live {
            trace!(owner = %self.owner, target = %contact.target, "contact dropped: not live");
            return HitOutcome::NotLive;
        }
        if hierarchy.is_same_or_descendant(contact.target, self.owner) {
            trace!(owner = %self.owner, target = %contact.target, "contact dropped: own hierarchy");
            return HitOutcome::OwnHierarchy;
        }
        if !self.already_hit.insert(contact.target) {
            trace!(owner = %self.owner, target = %contact.target, "contact dropped: already hit");
            return HitOutcome::AlreadyHit;
        }

        let info = DamageInfo::new(
            resolve_damage(inputs),
            contact.hit_point,
            contact.hit_normal,
            self.owner,
            contact.target,
        );
        debug!(owner = %self.owner, target = %contact.target, amount = info.amount(), "hit accepted");
        sink.deliver(info);
        HitOutcome::Accepted(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ahash::AHashMap;

    struct Tree {
        parents: AHashMap<EntityId, EntityId>,
    }

    impl ActorHierarchy for Tree {
        fn is_same_or_descendant(&self, candidate: EntityId, ancestor: EntityId) -> bool {
            let mut current = Some(candidate);
            while let Some(id) = current {
                if id == ancestor {
                    return true;
                }
                current = self.parents.get(&id).copied();
            }
            false
        }
    }

    fn contact(target: u64) -> Contact {
        Contact::new(EntityId::from_raw(target), Vec3::ZERO, Vec3::Y)
    }

    #[test]
    fn test_duplicate_contact_yields_one_hit() {
        let mut relay = HitRelay::new(EntityId::from_raw(1));
        let mut sink = Vec::new();
        let inputs = DamageInputs::new(10.0);

        relay.open_window();
        let first = relay.report(&contact(2), &FlatHierarchy, &inputs, &mut sink);
        let second = relay.report(&contact(2), &FlatHierarchy, &inputs, &mut sink);

        assert!(first.is_accepted());
        assert_eq!(second, HitOutcome::AlreadyHit);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].amount(), 10.0);
        assert_eq!(sink[0].instigator(), EntityId::from_raw(1));
    }

    #[test]
    fn test_closed_window_drops_contacts() {
        let mut relay = HitRelay::new(EntityId::from_raw(1));
        let mut sink = Vec::new();
        let outcome = relay.report(&contact(2), &FlatHierarchy, &DamageInputs::new(1.0), &mut sink);
        assert_eq!(outcome, HitOutcome::NotLive);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_close_keeps_set_until_next_open() {
        let mut relay = HitRelay::new(EntityId::from_raw(1));
        let mut sink = Vec::new();
        let inputs = DamageInputs::new(1.0);

        relay.open_window();
        relay.report(&contact(2), &FlatHierarchy, &inputs, &mut sink);
        relay.close_window();
        assert!(relay.has_hit(EntityId::from_raw(2)));

        relay.open_window();
        assert_eq!(relay.hit_count(), 0);
        assert!(relay
            .report(&contact(2), &FlatHierarchy, &inputs, &mut sink)
            .is_accepted());
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn test_own_hierarchy_rejected() {
        let owner = EntityId::from_raw(1);
        let sword = EntityId::from_raw(10);
        let mut parents = AHashMap::new();
        parents.insert(sword, owner);
        let tree = Tree { parents };

        let mut relay = HitRelay::new(owner);
        let mut sink = Vec::new();
        relay.open_window();

        assert_eq!(
            relay.report(&contact(10), &tree, &DamageInputs::new(1.0), &mut sink),
            HitOutcome::OwnHierarchy
        );
        assert_eq!(
            relay.report(&contact(1), &tree, &DamageInputs::new(1.0), &mut sink),
            HitOutcome::OwnHierarchy
        );
        assert!(sink.is_empty());
    }

    #[test]
    fn test_disabled_collision_blocks_open() {
        let mut relay = HitRelay::new(EntityId::from_raw(1));
        relay.open_window();
        relay.set_collision_enabled(false);
        assert!(!relay.is_live());

        relay.open_window();
        assert!(!relay.is_live());

        relay.set_collision_enabled(true);
        relay.open_window();
        assert!(relay.is_live());
    }
}
