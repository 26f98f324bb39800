//! Contact pair lifetime and listener dispatch through the physics world

use glam::Vec3;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use thelema::physics::{
    ContactEndpoint, ListenerId, ListenerRegistry, PhysicsError, PhysicsWorld,
    PhysicsWorldListener, ShapeHandle,
};

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Begin(ContactEndpoint, ContactEndpoint),
    End(ContactEndpoint, ContactEndpoint),
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

impl PhysicsWorldListener for Recorder {
    fn collision_begin(&self, a: ContactEndpoint, b: ContactEndpoint, _depth: f32) {
        self.events.lock().unwrap().push(Event::Begin(a, b));
    }

    fn collision_end(&self, a: ContactEndpoint, b: ContactEndpoint) {
        self.events.lock().unwrap().push(Event::End(a, b));
    }
}

/// Two free shapes overlapping at the origin
fn overlapping_pair(world: &mut PhysicsWorld) -> (ShapeHandle, ShapeHandle) {
    let a = world.sphere_shape(1.0);
    let b = world.sphere_shape(1.0);
    world.shape_mut(b).unwrap().set_position(1.5, 0.0, 0.0);
    (a, b)
}

fn separate(world: &mut PhysicsWorld, shape: ShapeHandle) {
    world.shape_mut(shape).unwrap().set_position(10.0, 0.0, 0.0);
}

/// Steps needed after separation until the end event fires
fn steps_until_end(delta: f32) -> usize {
    let mut world = PhysicsWorld::new();
    let recorder = Arc::new(Recorder::default());
    world.add_physics_world_listener(recorder.clone());
    let (_, b) = overlapping_pair(&mut world);

    world.step(delta).unwrap();
    assert_eq!(recorder.take().len(), 1);

    separate(&mut world, b);
    for step in 1..=100 {
        world.step(delta).unwrap();
        let events = recorder.take();
        if !events.is_empty() {
            assert!(matches!(events.as_slice(), [Event::End(_, _)]));
            return step;
        }
    }
    panic!("contact never ended");
}

#[test]
fn test_continuous_overlap_fires_one_begin() {
    let mut world = PhysicsWorld::new();
    let recorder = Arc::new(Recorder::default());
    world.add_physics_world_listener(recorder.clone());
    let (a, b) = overlapping_pair(&mut world);

    for _ in 0..120 {
        world.step(1.0 / 60.0).unwrap();
    }

    let events = recorder.take();
    assert_eq!(
        events,
        vec![Event::Begin(ContactEndpoint::Shape(a), ContactEndpoint::Shape(b))]
    );
    assert_eq!(world.shape_contacts().count(), 1);
}

#[test]
fn test_end_is_delayed_by_life_time() {
    // 0.1 s of life at each frame rate
    assert_eq!(steps_until_end(1.0 / 60.0), 6);
    assert_eq!(steps_until_end(0.03), 4);
    assert_eq!(steps_until_end(0.05), 2);
    assert_eq!(steps_until_end(0.2), 1);
}

#[test]
fn test_zero_delta_keeps_separated_pair_alive() {
    let mut world = PhysicsWorld::new();
    let recorder = Arc::new(Recorder::default());
    world.add_physics_world_listener(recorder.clone());
    let (a, b) = overlapping_pair(&mut world);

    world.step(0.0).unwrap();
    separate(&mut world, b);
    for _ in 0..50 {
        world.step(0.0).unwrap();
    }

    assert_eq!(recorder.take().len(), 1);
    assert!(world.is_shape_contact_exist(a, b));
}

#[test]
fn test_body_events_precede_shape_events() {
    let mut world = PhysicsWorld::new();
    let recorder = Arc::new(Recorder::default());
    world.add_physics_world_listener(recorder.clone());

    let (a, b) = overlapping_pair(&mut world);
    let body_a = world.rigid_body(Some(a), 0.0).unwrap();
    let body_b = world.rigid_body(Some(b), 0.0).unwrap();
    world.body_mut(body_b).unwrap().set_position(1.5, 0.0, 0.0);

    world.step(1.0 / 60.0).unwrap();
    assert_eq!(
        recorder.take(),
        vec![
            Event::Begin(ContactEndpoint::Body(body_a), ContactEndpoint::Body(body_b)),
            Event::Begin(ContactEndpoint::Shape(a), ContactEndpoint::Shape(b)),
        ]
    );
    assert!(world.is_contact_exist(body_b, body_a));

    world.body_mut(body_b).unwrap().set_position(10.0, 0.0, 0.0);
    for _ in 0..6 {
        world.step(1.0 / 60.0).unwrap();
    }
    assert_eq!(
        recorder.take(),
        vec![
            Event::End(ContactEndpoint::Body(body_a), ContactEndpoint::Body(body_b)),
            Event::End(ContactEndpoint::Shape(a), ContactEndpoint::Shape(b)),
        ]
    );
    assert!(!world.is_contact_exist(body_a, body_b));
}

struct Panicking {
    calls: AtomicUsize,
}

impl PhysicsWorldListener for Panicking {
    fn collision_begin(&self, _a: ContactEndpoint, _b: ContactEndpoint, _depth: f32) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        panic!("listener failure");
    }
}

#[test]
fn test_panicking_listener_keeps_bookkeeping_consistent() {
    let mut world = PhysicsWorld::new();
    let panicking = Arc::new(Panicking {
        calls: AtomicUsize::new(0),
    });
    let recorder = Arc::new(Recorder::default());
    world.add_physics_world_listener(panicking.clone());
    world.add_physics_world_listener(recorder.clone());
    let (a, b) = overlapping_pair(&mut world);

    world.step(1.0 / 60.0).unwrap();
    world.step(1.0 / 60.0).unwrap();

    assert_eq!(panicking.calls.load(Ordering::SeqCst), 1);
    assert_eq!(recorder.take().len(), 1);
    assert!(world.is_shape_contact_exist(a, b));
    assert_eq!(world.shape_contacts().count(), 1);
}

/// Removes itself and registers a replacement on its first begin
struct Handover {
    registry: ListenerRegistry,
    own_id: Mutex<Option<ListenerId>>,
    replacement: Arc<Recorder>,
}

impl PhysicsWorldListener for Handover {
    fn collision_begin(&self, _a: ContactEndpoint, _b: ContactEndpoint, _depth: f32) {
        if let Some(id) = self.own_id.lock().unwrap().take() {
            self.registry.remove(id);
            self.registry.add(self.replacement.clone());
        }
    }
}

#[test]
fn test_listener_may_change_listeners_during_dispatch() {
    let mut world = PhysicsWorld::new();
    let replacement = Arc::new(Recorder::default());
    let handover = Arc::new(Handover {
        registry: world.listeners(),
        own_id: Mutex::new(None),
        replacement: replacement.clone(),
    });
    let id = world.add_physics_world_listener(handover.clone());
    *handover.own_id.lock().unwrap() = Some(id);

    let (_, b) = overlapping_pair(&mut world);
    world.step(1.0 / 60.0).unwrap();
    // The snapshot taken for the begin excluded the replacement
    assert!(replacement.take().is_empty());

    separate(&mut world, b);
    for _ in 0..6 {
        world.step(1.0 / 60.0).unwrap();
    }
    assert!(matches!(replacement.take().as_slice(), [Event::End(_, _)]));
    assert!(!world.remove_physics_world_listener(id));
}

#[test]
fn test_solver_divergence_discards_pending_pairs() {
    let mut world = PhysicsWorld::new();
    let recorder = Arc::new(Recorder::default());
    world.add_physics_world_listener(recorder.clone());

    let (a, _) = overlapping_pair(&mut world);
    let body = world.rigid_body(Some(a), 1.0).unwrap();
    world
        .body_mut(body)
        .unwrap()
        .add_force(Vec3::new(f32::INFINITY, 0.0, 0.0));

    assert_eq!(world.step(1.0 / 60.0), Err(PhysicsError::SolverDiverged(body)));
    assert!(recorder.take().is_empty());
    assert_eq!(world.shape_contacts().count(), 0);
    assert_eq!(world.body(body).unwrap().position(), Vec3::ZERO);
}
