//! Physics world owning shapes, bodies, joints and contact tracking
//!
//! Shapes, bodies and ball joints live as components in a `hecs` registry;
//! handles wrap the registry entities. Every [`PhysicsWorld::step`] runs the
//! broad and narrow phase, builds transient contact joints, advances the
//! solver by the fixed `min_step`, and then ages the body-level and
//! shape-level contact pairs by the caller's frame delta.

use super::body::{BodyHandle, RigidBody};
use super::collision::broad_phase::{self, BroadPhaseEntry};
use super::collision::shapes::solid_sphere_inertia;
use super::collision::{self, ContactGeom, PosedShape, AABB};
use super::contact_pairs::{ContactEvent, ContactPair, ContactTracker};
use super::error::PhysicsError;
use super::height_field::{HeightField, HeightFieldParams, HeightProvider};
use super::joints::{BallJoint, ContactJoint, ContactSurface, JointGroup, JointHandle};
use super::listener::{ContactEndpoint, ListenerId, ListenerRegistry, PhysicsWorldListener};
use super::shape::{assert_positive, Shape, ShapeHandle, ShapeKind};
use super::solver::{QuickStepSolver, SolverBody};
use super::trimesh::TriMesh;
use crate::config::{ConfigError, PhysicsConfig};
use glam::Vec3;
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Contact point returned by [`PhysicsWorld::check_collision`]. The normal
/// points from the first shape towards the second.
pub type ContactInfo = ContactGeom;

/// Per-step copy of everything the collision pass needs from a shape
struct ShapeSnapshot {
    handle: ShapeHandle,
    body: Option<BodyHandle>,
    posed: PosedShape,
    aabb: Option<AABB>,
    /// Body friction when attached, shape friction otherwise
    friction: f32,
    /// Body influence flag when attached, shape flag otherwise
    influence: bool,
}

impl ShapeSnapshot {
    fn is_probe(&self) -> bool {
        matches!(self.posed.kind, ShapeKind::Ray { .. })
    }
}

/// Simulation world
pub struct PhysicsWorld {
    /// Contact joints of the current step, emptied after the solver ran
    contact_group: JointGroup,
    registry: hecs::World,
    solver: QuickStepSolver,
    config: PhysicsConfig,
    gravity: Vec3,
    body_contacts: ContactTracker<BodyHandle>,
    shape_contacts: ContactTracker<ShapeHandle>,
    listeners: ListenerRegistry,
}

impl PhysicsWorld {
    /// Create a world with the default configuration
    pub fn new() -> Self {
        Self::build(PhysicsConfig::default())
    }

    /// Create a world from a validated configuration
    pub fn with_config(config: PhysicsConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: PhysicsConfig) -> Self {
        info!(
            min_step = config.min_step,
            max_contacts = config.max_contacts,
            broad_phase = ?config.broad_phase,
            "Initializing physics world"
        );
        Self {
            contact_group: JointGroup::new(),
            registry: hecs::World::new(),
            solver: QuickStepSolver::new(&config),
            gravity: config.gravity,
            body_contacts: ContactTracker::new(config.contact_max_life_time),
            shape_contacts: ContactTracker::new(config.contact_max_life_time),
            listeners: ListenerRegistry::new(),
            config,
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn set_gravity(&mut self, x: f32, y: f32, z: f32) {
        self.gravity = Vec3::new(x, y, z);
        debug!("Physics gravity set to: {:?}", self.gravity);
    }

    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    fn spawn_shape(&mut self, kind: ShapeKind) -> ShapeHandle {
        let shape_type = kind.shape_type();
        let handle = ShapeHandle(
            self.registry
                .spawn((Shape::new(kind, self.config.default_friction),)),
        );
        trace!(shape = handle.id(), ?shape_type, "Created shape");
        handle
    }

    /// # Panics
    ///
    /// Panics on a non-positive radius.
    pub fn sphere_shape(&mut self, radius: f32) -> ShapeHandle {
        assert_positive("sphere radius", radius);
        self.spawn_shape(ShapeKind::Sphere { radius })
    }

    /// Box with full edge lengths along X, Y and Z
    ///
    /// # Panics
    ///
    /// Panics when any edge length is not positive.
    pub fn box_shape(&mut self, x_size: f32, y_size: f32, z_size: f32) -> ShapeHandle {
        assert_positive("box x size", x_size);
        assert_positive("box y size", y_size);
        assert_positive("box z size", z_size);
        self.spawn_shape(ShapeKind::Box {
            size: Vec3::new(x_size, y_size, z_size),
        })
    }

    /// Capsule along local Y; `length` excludes the caps
    pub fn capsule_shape(&mut self, radius: f32, length: f32) -> ShapeHandle {
        assert_positive("capsule radius", radius);
        assert_positive("capsule length", length);
        self.spawn_shape(ShapeKind::Capsule { radius, length })
    }

    /// Cylinder along local Y with full height `length`
    pub fn cylinder_shape(&mut self, radius: f32, length: f32) -> ShapeHandle {
        assert_positive("cylinder radius", radius);
        assert_positive("cylinder length", length);
        self.spawn_shape(ShapeKind::Cylinder { radius, length })
    }

    /// Triangle mesh from flat xyz vertex data and triangle indices
    ///
    /// # Panics
    ///
    /// Panics on malformed buffers, see [`TriMesh::new`].
    pub fn trimesh_shape(&mut self, vertices: &[f32], indices: &[u32]) -> ShapeHandle {
        let mesh = TriMesh::new(vertices, indices);
        self.spawn_shape(ShapeKind::Trimesh(Arc::new(mesh)))
    }

    /// Plane with normal +Y through the origin, see [`Shape::set_plane`]
    pub fn plane_shape(&mut self) -> ShapeHandle {
        self.spawn_shape(ShapeKind::Plane {
            normal: Vec3::Y,
            offset: 0.0,
        })
    }

    /// Ray of `length` along local +Z, starting at the shape position
    pub fn ray_shape(&mut self, length: f32) -> ShapeHandle {
        assert_positive("ray length", length);
        self.spawn_shape(ShapeKind::Ray {
            length,
            direction: Vec3::Z,
        })
    }

    /// Height field sampled from `provider`, flat at `offset` without one
    pub fn height_field(
        &mut self,
        params: HeightFieldParams,
        provider: Option<HeightProvider<'_>>,
    ) -> ShapeHandle {
        let field = HeightField::new(params, provider);
        self.spawn_shape(ShapeKind::HeightField(Arc::new(field)))
    }

    /// Create a body of `mass` with an optional shape. A mass of zero
    /// creates a static body.
    ///
    /// # Panics
    ///
    /// Panics on a negative or non-finite mass.
    pub fn rigid_body(
        &mut self,
        shape: Option<ShapeHandle>,
        mass: f32,
    ) -> Result<BodyHandle, PhysicsError> {
        assert!(
            mass >= 0.0 && mass.is_finite(),
            "body mass must not be negative, got {mass}"
        );
        if let Some(shape) = shape {
            self.shape(shape)?;
        }

        let mut body = RigidBody::new(
            mass,
            solid_sphere_inertia(mass, 1.0),
            self.config.default_friction,
        );
        body.is_static = mass == 0.0;
        let handle = BodyHandle(self.registry.spawn((body,)));
        trace!(body = handle.id(), mass, "Created rigid body");

        if shape.is_some() {
            self.set_body_shape(handle, shape)?;
        }
        Ok(handle)
    }

    pub fn shape(&self, handle: ShapeHandle) -> Result<hecs::Ref<'_, Shape>, PhysicsError> {
        self.registry
            .get::<&Shape>(handle.0)
            .map_err(|_| PhysicsError::UnknownShape(handle))
    }

    pub fn shape_mut(&mut self, handle: ShapeHandle) -> Result<&mut Shape, PhysicsError> {
        self.registry
            .query_one_mut::<&mut Shape>(handle.0)
            .map_err(|_| PhysicsError::UnknownShape(handle))
    }

    pub fn body(&self, handle: BodyHandle) -> Result<hecs::Ref<'_, RigidBody>, PhysicsError> {
        self.registry
            .get::<&RigidBody>(handle.0)
            .map_err(|_| PhysicsError::UnknownBody(handle))
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Result<&mut RigidBody, PhysicsError> {
        self.registry
            .query_one_mut::<&mut RigidBody>(handle.0)
            .map_err(|_| PhysicsError::UnknownBody(handle))
    }

    /// Attach `shape` to `body`, replacing the body's previous shape. A
    /// shape attached elsewhere is moved. Inertia is recomputed from the new
    /// shape.
    pub fn set_body_shape(
        &mut self,
        body: BodyHandle,
        shape: Option<ShapeHandle>,
    ) -> Result<(), PhysicsError> {
        let (previous, mass) = {
            let current = self.body(body)?;
            (current.shape, current.mass())
        };
        let new_owner = match shape {
            Some(handle) => self.shape(handle)?.body,
            None => None,
        };

        if let Some(previous) = previous {
            if let Ok(previous) = self.shape_mut(previous) {
                previous.body = None;
            }
        }
        if let Some(owner) = new_owner.filter(|owner| *owner != body) {
            if let Ok(owner) = self.body_mut(owner) {
                owner.shape = None;
            }
        }

        let inertia = match shape {
            Some(handle) => {
                let attached = self.shape_mut(handle)?;
                attached.body = Some(body);
                attached.kind().inertia(mass)
            }
            None => solid_sphere_inertia(mass, 1.0),
        };

        let target = self.body_mut(body)?;
        target.shape = shape;
        target.set_mass_properties(mass, inertia);
        Ok(())
    }

    /// # Panics
    ///
    /// Panics on a negative or non-finite mass.
    pub fn set_body_mass(&mut self, body: BodyHandle, mass: f32) -> Result<(), PhysicsError> {
        assert!(
            mass >= 0.0 && mass.is_finite(),
            "body mass must not be negative, got {mass}"
        );
        let shape = self.body(body)?.shape;
        let inertia = match shape {
            Some(shape) => self.shape(shape)?.kind().inertia(mass),
            None => solid_sphere_inertia(mass, 1.0),
        };
        self.body_mut(body)?.set_mass_properties(mass, inertia);
        Ok(())
    }

    /// Remove a shape, ending its live contact pairs
    pub fn destroy_shape(&mut self, handle: ShapeHandle) -> Result<(), PhysicsError> {
        let owner = self.shape(handle)?.body;
        if let Some(owner) = owner {
            if let Ok(owner) = self.body_mut(owner) {
                owner.shape = None;
            }
        }

        let events = self.shape_contacts.remove_endpoint(handle);
        let _ = self.registry.despawn(handle.0);
        trace!(shape = handle.id(), ended = events.len(), "Destroyed shape");
        self.dispatch(events);
        Ok(())
    }

    /// Remove a body, ending its live contact pairs. Its shape is detached
    /// and kept; joints referencing the body are removed.
    pub fn destroy_body(&mut self, handle: BodyHandle) -> Result<(), PhysicsError> {
        let shape = self.body(handle)?.shape;
        if let Some(shape) = shape {
            if let Ok(shape) = self.shape_mut(shape) {
                shape.body = None;
            }
        }

        let joints: Vec<hecs::Entity> = self
            .registry
            .query::<&BallJoint>()
            .iter()
            .filter(|(_, joint)| joint.references(handle))
            .map(|(entity, _)| entity)
            .collect();
        for joint in joints {
            let _ = self.registry.despawn(joint);
        }

        let events = self.body_contacts.remove_endpoint(handle);
        let _ = self.registry.despawn(handle.0);
        trace!(body = handle.id(), ended = events.len(), "Destroyed rigid body");
        self.dispatch(events);
        Ok(())
    }

    /// Connect `a` to `b` (or to the static world) at the world-space
    /// `anchor`. Connected bodies never collide with each other.
    pub fn ball_joint(
        &mut self,
        a: BodyHandle,
        b: Option<BodyHandle>,
        anchor: Vec3,
    ) -> Result<JointHandle, PhysicsError> {
        let local_anchor_a = {
            let body = self.body(a)?;
            body.rotation().conjugate() * (anchor - body.position())
        };
        let local_anchor_b = match b {
            Some(b) => {
                let body = self.body(b)?;
                body.rotation().conjugate() * (anchor - body.position())
            }
            None => anchor,
        };

        let joint = BallJoint {
            body_a: a,
            body_b: b,
            local_anchor_a,
            local_anchor_b,
        };
        Ok(JointHandle(self.registry.spawn((joint,))))
    }

    pub fn destroy_joint(&mut self, handle: JointHandle) -> Result<(), PhysicsError> {
        if self.registry.get::<&BallJoint>(handle.0).is_err() {
            return Err(PhysicsError::UnknownJoint(handle));
        }
        let _ = self.registry.despawn(handle.0);
        Ok(())
    }

    pub fn shape_count(&self) -> usize {
        self.registry.query::<&Shape>().iter().count()
    }

    pub fn body_count(&self) -> usize {
        self.registry.query::<&RigidBody>().iter().count()
    }

    fn posed(&self, handle: ShapeHandle) -> Result<PosedShape, PhysicsError> {
        let shape = self.shape(handle)?;
        let (position, rotation) = match shape.body.and_then(|body| self.body(body).ok()) {
            Some(body) => (body.position(), body.rotation()),
            None => (shape.position(), shape.rotation()),
        };
        Ok(PosedShape::new(shape.kind().clone(), position, rotation))
    }

    /// Collide two shapes immediately, bypassing contact tracking
    pub fn check_collision(
        &self,
        a: ShapeHandle,
        b: ShapeHandle,
    ) -> Result<Vec<ContactInfo>, PhysicsError> {
        let a = self.posed(a)?;
        let b = self.posed(b)?;
        Ok(collision::collide(&a, &b, self.config.max_contacts))
    }

    pub fn add_physics_world_listener(
        &mut self,
        listener: Arc<dyn PhysicsWorldListener>,
    ) -> ListenerId {
        self.listeners.add(listener)
    }

    /// Returns false when the listener was not registered
    pub fn remove_physics_world_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Shared handle to the listener list, usable from inside callbacks
    pub fn listeners(&self) -> ListenerRegistry {
        self.listeners.clone()
    }

    /// Whether the two bodies have a live contact pair
    pub fn is_contact_exist(&self, a: BodyHandle, b: BodyHandle) -> bool {
        self.body_contacts.is_alive(a, b)
    }

    /// Whether the two shapes have a live contact pair
    pub fn is_shape_contact_exist(&self, a: ShapeHandle, b: ShapeHandle) -> bool {
        self.shape_contacts.is_alive(a, b)
    }

    pub fn body_contacts(&self) -> impl Iterator<Item = &ContactPair<BodyHandle>> + '_ {
        self.body_contacts.iter()
    }

    pub fn shape_contacts(&self) -> impl Iterator<Item = &ContactPair<ShapeHandle>> + '_ {
        self.shape_contacts.iter()
    }

    /// Advance the simulation.
    ///
    /// The solver always integrates one fixed `min_step`; `delta` is the
    /// frame time and only ages contact pairs that were not observed in this
    /// step. Collision events are dispatched after all bookkeeping is done:
    /// body ends, body begins, shape ends, shape begins.
    ///
    /// # Panics
    ///
    /// Panics on a negative or non-finite delta.
    pub fn step(&mut self, delta: f32) -> Result<(), PhysicsError> {
        assert!(
            delta >= 0.0 && delta.is_finite(),
            "step delta must be finite and non-negative, got {delta}"
        );

        self.body_contacts.begin_step();
        self.shape_contacts.begin_step();
        self.sync_attached_shapes();

        let snapshots = self.snapshot_shapes();
        let ball_joints: Vec<BallJoint> = self
            .registry
            .query::<&BallJoint>()
            .iter()
            .map(|(_, joint)| *joint)
            .collect();

        let candidates: Vec<(usize, usize)> = self
            .candidate_pairs(&snapshots)
            .into_iter()
            .filter(|&(i, j)| match (snapshots[i].body, snapshots[j].body) {
                (Some(a), Some(b)) => !ball_joints.iter().any(|joint| joint.connects(a, b)),
                _ => true,
            })
            .collect();

        let max_contacts = self.config.max_contacts;
        let manifolds: Vec<(usize, usize, Vec<ContactGeom>)> = candidates
            .par_iter()
            .map(|&(i, j)| {
                let contacts = collision::collide(&snapshots[i].posed, &snapshots[j].posed, max_contacts);
                (i, j, contacts)
            })
            .filter(|(_, _, contacts)| !contacts.is_empty())
            .collect();

        for (i, j, contacts) in &manifolds {
            self.process_manifold(&snapshots[*i], &snapshots[*j], contacts);
        }

        debug!(
            shapes = snapshots.len(),
            candidates = candidates.len(),
            manifolds = manifolds.len(),
            joints = self.contact_group.len(),
            "Collision pass finished"
        );

        if let Err(err) = self.run_solver(&ball_joints) {
            self.contact_group.empty();
            self.body_contacts.abandon_step();
            self.shape_contacts.abandon_step();
            return Err(err);
        }
        self.contact_group.empty();

        let body_events = self.body_contacts.finish_step(delta);
        let shape_events = self.shape_contacts.finish_step(delta);
        debug!(
            body_pairs = self.body_contacts.len(),
            shape_pairs = self.shape_contacts.len(),
            body_events = body_events.len(),
            shape_events = shape_events.len(),
            "Contact pairs updated"
        );

        self.dispatch(body_events);
        self.dispatch(shape_events);
        Ok(())
    }

    /// Move attached shapes onto their bodies and refresh the body inertia
    /// from the current shape geometry
    fn sync_attached_shapes(&mut self) {
        let poses: HashMap<BodyHandle, _> = self
            .registry
            .query::<&RigidBody>()
            .iter()
            .map(|(entity, body)| {
                (BodyHandle(entity), (body.position(), body.rotation(), body.mass()))
            })
            .collect();

        let mut mass_properties = Vec::new();
        for (_, shape) in self.registry.query_mut::<&mut Shape>() {
            let Some(body) = shape.body else {
                continue;
            };
            if let Some(&(position, rotation, mass)) = poses.get(&body) {
                shape.position = position;
                shape.rotation = rotation;
                mass_properties.push((body, mass, shape.kind().inertia(mass)));
            }
        }
        for (body, mass, inertia) in mass_properties {
            if let Ok(body) = self.body_mut(body) {
                body.set_mass_properties(mass, inertia);
            }
        }
    }

    fn snapshot_shapes(&self) -> Vec<ShapeSnapshot> {
        let mut snapshots: Vec<ShapeSnapshot> = self
            .registry
            .query::<&Shape>()
            .iter()
            .map(|(entity, shape)| {
                let body = shape.body.and_then(|handle| self.body(handle).ok());
                let (friction, influence) = match &body {
                    Some(body) => (body.friction(), body.influence_other_bodies),
                    None => (shape.friction(), shape.influence_other_bodies()),
                };
                ShapeSnapshot {
                    handle: ShapeHandle(entity),
                    body: shape.body,
                    posed: PosedShape::new(shape.kind().clone(), shape.position, shape.rotation),
                    aabb: shape.kind().world_aabb(shape.position, shape.rotation),
                    friction,
                    influence,
                }
            })
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.handle.id());
        snapshots
    }

    /// Candidate pairs as indices into `snapshots`. Unbounded shapes are
    /// paired with every other shape.
    fn candidate_pairs(&self, snapshots: &[ShapeSnapshot]) -> Vec<(usize, usize)> {
        let mut bounded = Vec::new();
        let mut bounded_index = Vec::new();
        let mut unbounded = Vec::new();
        for (index, snapshot) in snapshots.iter().enumerate() {
            match snapshot.aabb {
                Some(aabb) => {
                    bounded.push(BroadPhaseEntry {
                        shape: snapshot.handle,
                        aabb,
                    });
                    bounded_index.push(index);
                }
                None => unbounded.push(index),
            }
        }

        let mut pairs: Vec<(usize, usize)> = broad_phase::candidate_pairs(self.config.broad_phase, &bounded)
            .into_iter()
            .map(|(i, j)| (bounded_index[i], bounded_index[j]))
            .collect();
        for &u in &unbounded {
            for other in 0..snapshots.len() {
                if other == u || (unbounded.contains(&other) && other < u) {
                    continue;
                }
                pairs.push((u.min(other), u.max(other)));
            }
        }

        // Shapes of the same body never collide
        pairs.retain(|&(i, j)| {
            !matches!((snapshots[i].body, snapshots[j].body), (Some(a), Some(b)) if a == b)
        });
        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }

    /// Create contact joints for one shape pair and record the pair
    fn process_manifold(&mut self, a: &ShapeSnapshot, b: &ShapeSnapshot, contacts: &[ContactGeom]) {
        let Some(first) = contacts.first() else {
            return;
        };

        // Rays are probes: reported but never pushing
        if !a.is_probe() && !b.is_probe() {
            let attachment = match (a.influence, b.influence) {
                (false, false) => None,
                (true, false) => Some((None, b.body)),
                (false, true) => Some((a.body, None)),
                (true, true) => Some((a.body, b.body)),
            };
            if let Some((body_a, body_b)) = attachment.filter(|(x, y)| x.is_some() || y.is_some()) {
                let surface = ContactSurface {
                    mu: a.friction.max(b.friction),
                    params: self.config.surface,
                };
                for contact in contacts {
                    self.contact_group.push(ContactJoint {
                        contact: *contact,
                        surface,
                        body_a,
                        body_b,
                    });
                }
            }
        }

        trace!(
            a = a.handle.id(),
            b = b.handle.id(),
            contacts = contacts.len(),
            depth = first.depth,
            "Shapes in contact"
        );
        self.shape_contacts.observe(a.handle, b.handle, first.depth);
        if let (Some(body_a), Some(body_b)) = (a.body, b.body) {
            self.body_contacts.observe(body_a, body_b, first.depth);
        }
    }

    fn run_solver(&mut self, ball_joints: &[BallJoint]) -> Result<(), PhysicsError> {
        let mut bodies: Vec<SolverBody> = self
            .registry
            .query::<&RigidBody>()
            .iter()
            .map(|(entity, body)| SolverBody::from_rigid_body(BodyHandle(entity), body))
            .collect();
        bodies.sort_by_key(|body| body.handle.id());
        let index: HashMap<BodyHandle, usize> = bodies
            .iter()
            .enumerate()
            .map(|(slot, body)| (body.handle, slot))
            .collect();

        self.solver.step(
            &mut bodies,
            &index,
            self.contact_group.joints(),
            ball_joints,
            self.gravity,
            self.config.min_step,
        )?;

        for solved in &bodies {
            if let Ok(body) = self.registry.query_one_mut::<&mut RigidBody>(solved.handle.0) {
                body.set_state(
                    solved.position,
                    solved.rotation,
                    solved.linear_velocity,
                    solved.angular_velocity,
                );
                body.clear_accumulators();
            }
        }
        Ok(())
    }

    fn dispatch<E>(&self, events: Vec<ContactEvent<E>>)
    where
        E: Into<ContactEndpoint> + Copy,
    {
        for event in events {
            self.listeners.dispatch(event);
        }
    }

    /// Tear the world down: contact joints first, then shapes, then bodies
    /// and joints
    pub fn destroy(self) {
        drop(self);
    }

    fn teardown(&mut self) {
        self.contact_group.empty();

        let shapes: Vec<hecs::Entity> = self
            .registry
            .query::<&Shape>()
            .iter()
            .map(|(entity, _)| entity)
            .collect();
        for entity in shapes {
            let _ = self.registry.despawn(entity);
        }
        self.registry.clear();

        self.body_contacts.clear();
        self.shape_contacts.clear();
        info!("Physics world destroyed");
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PhysicsWorld {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for PhysicsWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsWorld")
            .field("gravity", &self.gravity)
            .field("shapes", &self.shape_count())
            .field("bodies", &self.body_count())
            .field("body_contacts", &self.body_contacts.len())
            .field("shape_contacts", &self.shape_contacts.len())
            .finish()
    }
}
