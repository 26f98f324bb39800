//! Contact pair pooling and lifetime tracking
//!
//! A tracker keeps at most one live [`ContactPair`] per unordered pair of
//! endpoints. Pairs observed during a step are refreshed to the full
//! lifetime, pairs that were not observed lose the frame delta, and pairs
//! whose lifetime runs out are released back to the pool.

use super::body::BodyHandle;
use super::shape::ShapeHandle;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use tracing::trace;

/// Tolerance that absorbs rounding when a lifetime is consumed by a whole
/// number of frame deltas.
const LIFE_TIME_EPSILON: f32 = 1e-6;

/// Something a contact pair can connect
pub trait PairEndpoint: Copy + Eq + Hash + Debug {
    fn raw_id(&self) -> u64;
}

impl PairEndpoint for BodyHandle {
    fn raw_id(&self) -> u64 {
        self.id()
    }
}

impl PairEndpoint for ShapeHandle {
    fn raw_id(&self) -> u64 {
        self.id()
    }
}

/// Order independent key of a pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    low: u64,
    high: u64,
}

impl PairKey {
    pub fn new<E: PairEndpoint>(a: E, b: E) -> Self {
        let (a, b) = (a.raw_id(), b.raw_id());
        Self {
            low: a.min(b),
            high: a.max(b),
        }
    }

    pub fn contains<E: PairEndpoint>(&self, endpoint: E) -> bool {
        let id = endpoint.raw_id();
        self.low == id || self.high == id
    }
}

/// Live contact between two endpoints
#[derive(Debug, Clone, PartialEq)]
pub struct ContactPair<E> {
    /// Endpoints in first observation order
    pub a: E,
    pub b: E,
    /// Penetration depth of the first contact point of the latest observation
    pub depth: f32,
    /// Seconds left before the pair ends unless observed again
    pub life_time: f32,
    /// Depth of an observation staged during the current step
    pending: Option<f32>,
}

impl<E: PairEndpoint> ContactPair<E> {
    pub fn key(&self) -> PairKey {
        PairKey::new(self.a, self.b)
    }

    pub fn involves(&self, endpoint: E) -> bool {
        self.a == endpoint || self.b == endpoint
    }
}

/// Slot arena with a free list
#[derive(Debug)]
pub struct PairPool<E> {
    slots: Vec<Option<ContactPair<E>>>,
    free: Vec<usize>,
}

impl<E> Default for PairPool<E> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }
}

impl<E> PairPool<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `pair`, reusing a released slot when one is available
    pub fn obtain(&mut self, pair: ContactPair<E>) -> usize {
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(pair);
                index
            }
            None => {
                self.slots.push(Some(pair));
                self.slots.len() - 1
            }
        }
    }

    pub fn release(&mut self, index: usize) -> Option<ContactPair<E>> {
        let pair = self.slots.get_mut(index)?.take()?;
        self.free.push(index);
        Some(pair)
    }

    pub fn get(&self, index: usize) -> Option<&ContactPair<E>> {
        self.slots.get(index)?.as_ref()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ContactPair<E>> {
        self.slots.get_mut(index)?.as_mut()
    }

    /// Number of occupied slots
    pub fn in_use(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Number of slots ever allocated
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

/// Collision event produced by a tracker
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactEvent<E> {
    Begin { a: E, b: E, depth: f32 },
    End { a: E, b: E },
}

impl<E: Copy> ContactEvent<E> {
    pub fn endpoints(&self) -> (E, E) {
        match *self {
            ContactEvent::Begin { a, b, .. } | ContactEvent::End { a, b } => (a, b),
        }
    }

    pub fn map<T>(self, mut f: impl FnMut(E) -> T) -> ContactEvent<T> {
        match self {
            ContactEvent::Begin { a, b, depth } => ContactEvent::Begin {
                a: f(a),
                b: f(b),
                depth,
            },
            ContactEvent::End { a, b } => ContactEvent::End { a: f(a), b: f(b) },
        }
    }
}

/// Live set of contact pairs plus the pairs first observed in the current step
#[derive(Debug)]
pub struct ContactTracker<E> {
    pool: PairPool<E>,
    alive: HashMap<PairKey, usize>,
    fresh: HashMap<PairKey, usize>,
    fresh_order: Vec<PairKey>,
    max_life_time: f32,
}

impl<E: PairEndpoint> ContactTracker<E> {
    pub fn new(max_life_time: f32) -> Self {
        assert!(
            max_life_time >= 0.0 && max_life_time.is_finite(),
            "contact lifetime must not be negative, got {max_life_time}"
        );
        Self {
            pool: PairPool::new(),
            alive: HashMap::new(),
            fresh: HashMap::new(),
            fresh_order: Vec::new(),
            max_life_time,
        }
    }

    pub fn max_life_time(&self) -> f32 {
        self.max_life_time
    }

    /// Clear observations left over from an unfinished step
    pub fn begin_step(&mut self) {
        self.abandon_step();
    }

    /// Record an overlap between `a` and `b`. Only the first observation of
    /// a pair within one step is kept.
    pub fn observe(&mut self, a: E, b: E, depth: f32) {
        let key = PairKey::new(a, b);

        if let Some(&index) = self.alive.get(&key) {
            if let Some(pair) = self.pool.get_mut(index) {
                pair.pending.get_or_insert(depth);
            }
            return;
        }
        if self.fresh.contains_key(&key) {
            return;
        }

        let index = self.pool.obtain(ContactPair {
            a,
            b,
            depth,
            life_time: self.max_life_time,
            pending: None,
        });
        self.fresh.insert(key, index);
        self.fresh_order.push(key);
    }

    /// Age the pairs not observed this step, expire the ones out of time
    /// and promote the new ones.
    ///
    /// Returns the end events (in key order) followed by the begin events
    /// (in observation order). All pool bookkeeping is done on return.
    pub fn finish_step(&mut self, delta: f32) -> Vec<ContactEvent<E>> {
        let mut events = Vec::new();

        let mut keys: Vec<PairKey> = self.alive.keys().copied().collect();
        keys.sort_unstable();
        for key in keys {
            let Some(&index) = self.alive.get(&key) else {
                continue;
            };
            let Some(pair) = self.pool.get_mut(index) else {
                continue;
            };
            if let Some(depth) = pair.pending.take() {
                pair.depth = depth;
                pair.life_time = self.max_life_time;
                continue;
            }

            pair.life_time -= delta;
            let expired = pair.life_time < 0.0 || (delta > 0.0 && pair.life_time <= LIFE_TIME_EPSILON);
            if expired {
                self.alive.remove(&key);
                if let Some(pair) = self.pool.release(index) {
                    trace!(a = ?pair.a, b = ?pair.b, "Contact pair expired");
                    events.push(ContactEvent::End { a: pair.a, b: pair.b });
                }
            }
        }

        for key in self.fresh_order.drain(..) {
            let Some(index) = self.fresh.remove(&key) else {
                continue;
            };
            let Some(pair) = self.pool.get(index) else {
                continue;
            };
            trace!(a = ?pair.a, b = ?pair.b, depth = pair.depth, "Contact pair began");
            events.push(ContactEvent::Begin {
                a: pair.a,
                b: pair.b,
                depth: pair.depth,
            });
            self.alive.insert(key, index);
        }

        events
    }

    /// Drop the observations of an interrupted step. Live pairs keep the
    /// depth and lifetime they had before the step began.
    pub fn abandon_step(&mut self) {
        for key in self.fresh_order.drain(..) {
            if let Some(index) = self.fresh.remove(&key) {
                self.pool.release(index);
            }
        }
        self.fresh.clear();
        for &index in self.alive.values() {
            if let Some(pair) = self.pool.get_mut(index) {
                pair.pending = None;
            }
        }
    }

    /// Remove every pair involving `endpoint`, returning end events for the
    /// pairs that were live
    pub fn remove_endpoint(&mut self, endpoint: E) -> Vec<ContactEvent<E>> {
        let mut keys: Vec<PairKey> = self
            .alive
            .keys()
            .filter(|key| key.contains(endpoint))
            .copied()
            .collect();
        keys.sort_unstable();

        let mut events = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(index) = self.alive.remove(&key) {
                if let Some(pair) = self.pool.release(index) {
                    events.push(ContactEvent::End { a: pair.a, b: pair.b });
                }
            }
        }

        let pending: Vec<PairKey> = self
            .fresh_order
            .iter()
            .filter(|key| key.contains(endpoint))
            .copied()
            .collect();
        for key in pending {
            if let Some(index) = self.fresh.remove(&key) {
                self.pool.release(index);
            }
        }
        self.fresh_order.retain(|key| !key.contains(endpoint));

        events
    }

    /// Release every pair without producing events
    pub fn clear(&mut self) {
        self.alive.clear();
        self.fresh.clear();
        self.fresh_order.clear();
        self.pool = PairPool::new();
    }

    pub fn is_alive(&self, a: E, b: E) -> bool {
        self.alive.contains_key(&PairKey::new(a, b))
    }

    pub fn get(&self, a: E, b: E) -> Option<&ContactPair<E>> {
        let index = *self.alive.get(&PairKey::new(a, b))?;
        self.pool.get(index)
    }

    /// Live pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = &ContactPair<E>> + '_ {
        let mut entries: Vec<(PairKey, usize)> = self.alive.iter().map(|(k, i)| (*k, *i)).collect();
        entries.sort_unstable();
        entries.into_iter().filter_map(move |(_, index)| self.pool.get(index))
    }

    /// Number of live pairs
    pub fn len(&self) -> usize {
        self.alive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alive.is_empty()
    }

    pub fn pool(&self) -> &PairPool<E> {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f32 = 1.0 / 60.0;

    fn shapes(count: usize) -> Vec<ShapeHandle> {
        let mut world = hecs::World::new();
        (0..count).map(|_| ShapeHandle(world.spawn(()))).collect()
    }

    fn begins<E: Copy>(events: &[ContactEvent<E>]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, ContactEvent::Begin { .. }))
            .count()
    }

    fn ends<E: Copy>(events: &[ContactEvent<E>]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, ContactEvent::End { .. }))
            .count()
    }

    #[test]
    fn test_key_is_symmetric() {
        let s = shapes(2);
        assert_eq!(PairKey::new(s[0], s[1]), PairKey::new(s[1], s[0]));
    }

    #[test]
    fn test_pool_reuses_released_slots() {
        let s = shapes(2);
        let mut pool = PairPool::new();
        let pair = ContactPair {
            a: s[0],
            b: s[1],
            depth: 0.1,
            life_time: 0.1,
            pending: None,
        };

        let first = pool.obtain(pair.clone());
        assert_eq!(pool.in_use(), 1);
        assert!(pool.release(first).is_some());
        assert!(pool.release(first).is_none());
        assert_eq!(pool.in_use(), 0);

        let second = pool.obtain(pair);
        assert_eq!(first, second);
        assert_eq!(pool.capacity(), 1);
    }

    #[test]
    fn test_reversed_observation_is_one_pair() {
        let s = shapes(2);
        let mut tracker = ContactTracker::new(0.1);

        tracker.begin_step();
        tracker.observe(s[0], s[1], 0.2);
        tracker.observe(s[1], s[0], 0.5);
        let events = tracker.finish_step(FRAME);

        assert_eq!(events, vec![ContactEvent::Begin { a: s[0], b: s[1], depth: 0.2 }]);
        assert_eq!(tracker.len(), 1);
        assert!(tracker.is_alive(s[1], s[0]));
    }

    #[test]
    fn test_continuous_overlap_begins_once() {
        let s = shapes(2);
        let mut tracker = ContactTracker::new(0.1);
        let mut events = Vec::new();

        for _ in 0..30 {
            tracker.begin_step();
            tracker.observe(s[0], s[1], 0.1);
            events.extend(tracker.finish_step(FRAME));
        }
        assert_eq!(begins(&events), 1);
        assert_eq!(ends(&events), 0);
        assert_eq!(tracker.pool().in_use(), 1);
    }

    #[test]
    fn test_pair_ends_after_life_time() {
        let s = shapes(2);
        let mut tracker = ContactTracker::new(0.1);

        tracker.begin_step();
        tracker.observe(s[0], s[1], 0.1);
        tracker.finish_step(FRAME);

        // 0.1 s at 60 Hz is six frames without an observation
        for _ in 0..5 {
            tracker.begin_step();
            assert!(tracker.finish_step(FRAME).is_empty());
        }
        tracker.begin_step();
        let events = tracker.finish_step(FRAME);
        assert_eq!(events, vec![ContactEvent::End { a: s[0], b: s[1] }]);
        assert!(tracker.is_empty());
        assert_eq!(tracker.pool().in_use(), 0);
    }

    #[test]
    fn test_zero_delta_never_ages() {
        let s = shapes(2);
        let mut tracker = ContactTracker::new(0.1);

        tracker.begin_step();
        tracker.observe(s[0], s[1], 0.1);
        assert_eq!(begins(&tracker.finish_step(0.0)), 1);

        for _ in 0..100 {
            tracker.begin_step();
            assert!(tracker.finish_step(0.0).is_empty());
        }
        assert!(tracker.is_alive(s[0], s[1]));
    }

    #[test]
    fn test_refresh_restores_life_time() {
        let s = shapes(2);
        let mut tracker = ContactTracker::new(0.1);

        tracker.begin_step();
        tracker.observe(s[0], s[1], 0.1);
        tracker.finish_step(FRAME);
        for _ in 0..3 {
            tracker.begin_step();
            tracker.finish_step(FRAME);
        }
        assert!(tracker.get(s[0], s[1]).unwrap().life_time < 0.1);

        tracker.begin_step();
        tracker.observe(s[1], s[0], 0.3);
        assert!(tracker.finish_step(FRAME).is_empty());
        let pair = tracker.get(s[0], s[1]).unwrap();
        assert_eq!(pair.life_time, 0.1);
        assert_eq!(pair.depth, 0.3);
    }

    #[test]
    fn test_remove_endpoint_ends_its_pairs() {
        let s = shapes(3);
        let mut tracker = ContactTracker::new(0.1);

        tracker.begin_step();
        tracker.observe(s[0], s[1], 0.1);
        tracker.observe(s[1], s[2], 0.1);
        tracker.finish_step(FRAME);

        let events = tracker.remove_endpoint(s[1]);
        assert_eq!(ends(&events), 2);
        assert!(tracker.is_empty());
        assert_eq!(tracker.pool().in_use(), 0);
    }

    #[test]
    fn test_abandoned_step_returns_slots() {
        let s = shapes(2);
        let mut tracker = ContactTracker::new(0.1);

        tracker.begin_step();
        tracker.observe(s[0], s[1], 0.1);
        tracker.abandon_step();

        assert_eq!(tracker.pool().in_use(), 0);
        tracker.begin_step();
        assert!(tracker.finish_step(FRAME).is_empty());
    }

    #[test]
    fn test_abandoned_step_keeps_live_pairs_aging() {
        let s = shapes(2);
        let mut tracker = ContactTracker::new(0.1);

        tracker.begin_step();
        tracker.observe(s[0], s[1], 0.1);
        tracker.finish_step(FRAME);
        tracker.begin_step();
        tracker.finish_step(FRAME);
        let aged = tracker.get(s[0], s[1]).unwrap().life_time;
        assert!(aged < 0.1);

        // An interrupted step leaves the observed pair untouched
        tracker.begin_step();
        tracker.observe(s[0], s[1], 0.4);
        tracker.abandon_step();
        let pair = tracker.get(s[0], s[1]).unwrap();
        assert_eq!(pair.life_time, aged);
        assert_eq!(pair.depth, 0.1);

        // and the next step without an observation keeps aging it
        tracker.begin_step();
        tracker.finish_step(FRAME);
        assert!(tracker.get(s[0], s[1]).unwrap().life_time < aged);
    }
}
