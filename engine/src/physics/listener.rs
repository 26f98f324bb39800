//! Collision listeners and their dispatch

use super::body::BodyHandle;
use super::contact_pairs::ContactEvent;
use super::shape::ShapeHandle;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{error, trace};

/// Either side of a reported collision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactEndpoint {
    Body(BodyHandle),
    Shape(ShapeHandle),
}

impl From<BodyHandle> for ContactEndpoint {
    fn from(handle: BodyHandle) -> Self {
        ContactEndpoint::Body(handle)
    }
}

impl From<ShapeHandle> for ContactEndpoint {
    fn from(handle: ShapeHandle) -> Self {
        ContactEndpoint::Shape(handle)
    }
}

/// Receives collision begin and end notifications.
///
/// Body-level and shape-level pairs are reported through the same methods;
/// match on [`ContactEndpoint`] to tell them apart.
pub trait PhysicsWorldListener: Send + Sync {
    fn collision_begin(&self, _a: ContactEndpoint, _b: ContactEndpoint, _depth: f32) {}

    fn collision_end(&self, _a: ContactEndpoint, _b: ContactEndpoint) {}
}

/// Identifies a registered listener for removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type ListenerList = Vec<(ListenerId, Arc<dyn PhysicsWorldListener>)>;

/// Shared, ordered list of listeners.
///
/// Cloning yields another handle to the same list, so a listener holding a
/// clone can register or remove listeners from inside a callback.
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    listeners: Arc<RwLock<ListenerList>>,
    next_id: Arc<AtomicU64>,
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: Arc<dyn PhysicsWorldListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));
        id
    }

    /// Returns false when `id` was not registered
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.listeners.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    fn snapshot(&self) -> ListenerList {
        self.listeners.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Deliver `event` to every listener registered at call time, in
    /// registration order. A panicking listener is logged and skipped.
    pub fn dispatch<E: Into<ContactEndpoint> + Copy>(&self, event: ContactEvent<E>) {
        let event: ContactEvent<ContactEndpoint> = event.map(Into::into);
        let snapshot = self.snapshot();
        trace!(listeners = snapshot.len(), ?event, "Dispatching collision event");

        for (id, listener) in snapshot {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| match event {
                ContactEvent::Begin { a, b, depth } => listener.collision_begin(a, b, depth),
                ContactEvent::End { a, b } => listener.collision_end(a, b),
            }));
            if outcome.is_err() {
                error!(listener = ?id, ?event, "Physics world listener panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    impl PhysicsWorldListener for Recorder {
        fn collision_begin(&self, _a: ContactEndpoint, _b: ContactEndpoint, depth: f32) {
            self.calls.lock().unwrap().push(format!("begin {depth}"));
        }

        fn collision_end(&self, _a: ContactEndpoint, _b: ContactEndpoint) {
            self.calls.lock().unwrap().push("end".to_string());
        }
    }

    struct Panicking;

    impl PhysicsWorldListener for Panicking {
        fn collision_begin(&self, _a: ContactEndpoint, _b: ContactEndpoint, _depth: f32) {
            panic!("listener failure");
        }
    }

    /// Removes itself on the first callback
    struct OneShot {
        registry: ListenerRegistry,
        id: Mutex<Option<ListenerId>>,
        hits: AtomicU64,
    }

    impl PhysicsWorldListener for OneShot {
        fn collision_end(&self, _a: ContactEndpoint, _b: ContactEndpoint) {
            self.hits.fetch_add(1, Ordering::SeqCst);
            if let Some(id) = self.id.lock().unwrap().take() {
                self.registry.remove(id);
            }
        }
    }

    fn endpoints() -> (ShapeHandle, ShapeHandle) {
        let mut world = hecs::World::new();
        (ShapeHandle(world.spawn(())), ShapeHandle(world.spawn(())))
    }

    #[test]
    fn test_panicking_listener_does_not_stop_dispatch() {
        let (a, b) = endpoints();
        let registry = ListenerRegistry::new();
        let recorder = Arc::new(Recorder::default());
        registry.add(Arc::new(Panicking));
        registry.add(recorder.clone());

        registry.dispatch(ContactEvent::Begin { a, b, depth: 0.5 });
        assert_eq!(*recorder.calls.lock().unwrap(), vec!["begin 0.5".to_string()]);
    }

    #[test]
    fn test_listener_can_remove_itself() {
        let (a, b) = endpoints();
        let registry = ListenerRegistry::new();
        let one_shot = Arc::new(OneShot {
            registry: registry.clone(),
            id: Mutex::new(None),
            hits: AtomicU64::new(0),
        });
        let id = registry.add(one_shot.clone());
        *one_shot.id.lock().unwrap() = Some(id);

        registry.dispatch(ContactEvent::End { a, b });
        registry.dispatch(ContactEvent::End { a, b });
        assert_eq!(one_shot.hits.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_unknown_listener() {
        let registry = ListenerRegistry::new();
        let id = registry.add(Arc::new(Recorder::default()));
        assert!(registry.remove(id));
        assert!(!registry.remove(id));
    }
}
