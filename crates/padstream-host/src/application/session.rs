//! Slot ownership: which client drives which virtual controller.
//!
//! The host exposes up to four virtual-controller slots (one in the classic
//! single-owner mode). Ownership is claimed implicitly: the first client
//! whose packet survives validation binds the lowest free slot, and keeps it
//! for as long as it keeps sending. There is no election and no negotiation
//! — once an owner has been silent strictly longer than the ownership
//! timeout its slot frees, and the next validated packet from any client
//! claims it.
//!
//! Transition guards are deterministic on purpose: a packet that lands
//! exactly on the timeout boundary still counts as the incumbent's
//! activity, so concurrent arrivals at the boundary cannot race the slot
//! away from a live owner.

use std::time::{Duration, Instant};

/// Upper bound on configurable slots.
pub const MAX_SLOTS: usize = 4;

/// Ownership parameters, fixed at startup.
#[derive(Debug, Clone)]
pub struct SessionPolicy {
    /// Silence after which a slot binding expires.
    pub ownership_timeout: Duration,
    /// Number of routing slots: 1 for single-owner, up to [`MAX_SLOTS`] for
    /// co-op.
    pub max_slots: usize,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            ownership_timeout: Duration::from_millis(500),
            max_slots: 1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SlotState {
    client_id: Option<u32>,
    bound_at: Instant,
    last_active: Instant,
}

/// Point-in-time view of one slot, for the status surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotSnapshot {
    pub index: usize,
    pub client_id: Option<u32>,
}

/// Routes validated packets to virtual-controller slots.
pub struct SessionManager {
    slots: Vec<SlotState>,
    timeout: Duration,
}

impl SessionManager {
    /// Creates a manager with `policy.max_slots` empty slots (clamped to
    /// `1..=MAX_SLOTS`).
    pub fn new(policy: &SessionPolicy, now: Instant) -> Self {
        let count = policy.max_slots.clamp(1, MAX_SLOTS);
        Self {
            slots: vec![
                SlotState {
                    client_id: None,
                    bound_at: now,
                    last_active: now,
                };
                count
            ],
            timeout: policy.ownership_timeout,
        }
    }

    /// Decides which slot a validated packet drives.
    ///
    /// A client already bound to a slot is always routed there and its
    /// activity refreshed, regardless of other traffic. An unbound client
    /// claims the lowest slot whose owner has expired or that was never
    /// bound. Returns `None` when every slot is held by an active owner;
    /// the packet is still accepted upstream, it just produces no sink
    /// write.
    pub fn route(&mut self, client_id: u32, now: Instant) -> Option<usize> {
        if let Some(index) = self.slot_of(client_id) {
            self.slots[index].last_active = now;
            return Some(index);
        }

        // Expire bindings whose owner has been silent strictly longer than
        // the timeout. `>` (not `>=`) keeps the incumbent at the exact
        // boundary.
        for slot in &mut self.slots {
            if slot.client_id.is_some()
                && now.saturating_duration_since(slot.last_active) > self.timeout
            {
                slot.client_id = None;
            }
        }

        let index = self.slots.iter().position(|s| s.client_id.is_none())?;
        self.slots[index] = SlotState {
            client_id: Some(client_id),
            bound_at: now,
            last_active: now,
        };
        Some(index)
    }

    /// The client currently bound to `slot`, if any.
    pub fn owner_of(&self, slot: usize) -> Option<u32> {
        self.slots.get(slot).and_then(|s| s.client_id)
    }

    /// The slot `client_id` is bound to, if any.
    pub fn slot_of(&self, client_id: u32) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.client_id == Some(client_id))
    }

    /// How long the owner of `slot` has held it.
    pub fn held_for(&self, slot: usize, now: Instant) -> Option<Duration> {
        let state = self.slots.get(slot)?;
        state.client_id?;
        Some(now.saturating_duration_since(state.bound_at))
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Current bindings for the status surface.
    pub fn snapshot(&self) -> Vec<SlotSnapshot> {
        self.slots
            .iter()
            .enumerate()
            .map(|(index, s)| SlotSnapshot {
                index,
                client_id: s.client_id,
            })
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn single_owner(now: Instant) -> SessionManager {
        SessionManager::new(&SessionPolicy::default(), now)
    }

    fn coop(now: Instant) -> SessionManager {
        SessionManager::new(
            &SessionPolicy {
                ownership_timeout: Duration::from_millis(500),
                max_slots: 4,
            },
            now,
        )
    }

    // ── Single-owner mode ─────────────────────────────────────────────────────

    #[test]
    fn test_first_client_claims_slot_zero() {
        let now = Instant::now();
        let mut mgr = single_owner(now);
        assert_eq!(mgr.route(1, now), Some(0));
        assert_eq!(mgr.owner_of(0), Some(1));
    }

    #[test]
    fn test_second_client_is_unrouted_while_owner_active() {
        let now = Instant::now();
        let mut mgr = single_owner(now);
        mgr.route(1, now);

        // B arrives 100ms later: A is still well within its window.
        let later = now + Duration::from_millis(100);
        assert_eq!(mgr.route(2, later), None);
        assert_eq!(mgr.owner_of(0), Some(1));
    }

    #[test]
    fn test_ownership_hands_over_after_timeout() {
        let now = Instant::now();
        let mut mgr = single_owner(now);
        mgr.route(1, now);

        // Strictly past the 500ms timeout the first valid packet from B
        // takes the slot.
        let after = now + Duration::from_millis(501);
        assert_eq!(mgr.route(2, after), Some(0));
        assert_eq!(mgr.owner_of(0), Some(2));
    }

    #[test]
    fn test_boundary_favors_incumbent() {
        let now = Instant::now();
        let mut mgr = single_owner(now);
        mgr.route(1, now);

        // Exactly at the boundary the incumbent keeps the slot.
        let boundary = now + Duration::from_millis(500);
        assert_eq!(mgr.route(2, boundary), None);
        assert_eq!(mgr.owner_of(0), Some(1));
    }

    #[test]
    fn test_owner_activity_resets_timeout_window() {
        let now = Instant::now();
        let mut mgr = single_owner(now);
        mgr.route(1, now);

        // A packet 0.4s in (0.1s before expiry) restarts A's window.
        let refresh = now + Duration::from_millis(400);
        assert_eq!(mgr.route(1, refresh), Some(0));

        // 0.9s after the start — but only 0.5s after the refresh — B still
        // cannot claim the slot.
        let later = now + Duration::from_millis(900);
        assert_eq!(mgr.route(2, later), None);

        // Strictly past the refreshed window it can.
        let expired = refresh + Duration::from_millis(501);
        assert_eq!(mgr.route(2, expired), Some(0));
    }

    #[test]
    fn test_silent_owner_reclaims_its_own_slot() {
        let now = Instant::now();
        let mut mgr = single_owner(now);
        mgr.route(1, now);

        // A goes silent past the timeout but nobody else claimed the slot;
        // A's next packet simply re-binds it.
        let back = now + Duration::from_secs(2);
        assert_eq!(mgr.route(1, back), Some(0));
    }

    // ── Co-op mode ────────────────────────────────────────────────────────────

    #[test]
    fn test_coop_assigns_lowest_free_slots_in_arrival_order() {
        let now = Instant::now();
        let mut mgr = coop(now);
        assert_eq!(mgr.route(10, now), Some(0));
        assert_eq!(mgr.route(20, now), Some(1));
        assert_eq!(mgr.route(30, now), Some(2));
        assert_eq!(mgr.route(40, now), Some(3));
    }

    #[test]
    fn test_coop_fifth_client_is_unrouted_until_a_slot_frees() {
        let now = Instant::now();
        let mut mgr = coop(now);
        for id in 1..=4 {
            mgr.route(id, now);
        }
        assert_eq!(mgr.route(5, now), None);

        // Client 2 goes silent; the waiting client inherits its slot.
        let later = now + Duration::from_millis(501);
        for id in [1, 3, 4] {
            mgr.route(id, later);
        }
        assert_eq!(mgr.route(5, later + Duration::from_millis(501)), Some(1));
    }

    #[test]
    fn test_coop_bindings_are_stable_under_interleaved_traffic() {
        let now = Instant::now();
        let mut mgr = coop(now);
        assert_eq!(mgr.route(10, now), Some(0));
        assert_eq!(mgr.route(20, now), Some(1));
        assert_eq!(mgr.route(30, now), Some(2));

        // 1000 interleaved packets, 10ms apart, must never move anyone.
        let mut t = now;
        for i in 0..1000u32 {
            t += Duration::from_millis(10);
            let (client_id, expected) = match i % 3 {
                0 => (10, 0),
                1 => (20, 1),
                _ => (30, 2),
            };
            assert_eq!(mgr.route(client_id, t), Some(expected));
        }
    }

    #[test]
    fn test_coop_client_never_moves_to_a_freed_lower_slot() {
        let now = Instant::now();
        let mut mgr = coop(now);
        mgr.route(10, now); // slot 0
        mgr.route(20, now); // slot 1

        // Slot 0's owner expires; client 20 keeps slot 1 anyway. The stale
        // binding lingers until another claim forces expiry.
        let later = now + Duration::from_millis(600);
        assert_eq!(mgr.route(20, later), Some(1));
        assert_eq!(mgr.owner_of(0), Some(10));

        // A new client takes the freed slot 0; 20 still has slot 1.
        assert_eq!(mgr.route(30, later), Some(0));
        assert_eq!(mgr.slot_of(20), Some(1));
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    #[test]
    fn test_snapshot_reflects_bindings() {
        let now = Instant::now();
        let mut mgr = coop(now);
        mgr.route(10, now);
        mgr.route(20, now);

        let snap = mgr.snapshot();
        assert_eq!(snap.len(), 4);
        assert_eq!(snap[0].client_id, Some(10));
        assert_eq!(snap[1].client_id, Some(20));
        assert_eq!(snap[2].client_id, None);
    }

    #[test]
    fn test_held_for_tracks_bind_time() {
        let now = Instant::now();
        let mut mgr = single_owner(now);
        mgr.route(1, now);
        let later = now + Duration::from_millis(250);
        assert_eq!(mgr.held_for(0, later), Some(Duration::from_millis(250)));
        assert_eq!(mgr.held_for(0, now), Some(Duration::ZERO));
    }

    #[test]
    fn test_slot_count_is_clamped() {
        let now = Instant::now();
        let mgr = SessionManager::new(
            &SessionPolicy {
                ownership_timeout: Duration::from_millis(500),
                max_slots: 99,
            },
            now,
        );
        assert_eq!(mgr.slot_count(), MAX_SLOTS);
    }
}
