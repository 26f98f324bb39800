//! Rigid body component

use super::shape::ShapeHandle;
use glam::{Mat3, Mat4, Quat, Vec3};
use hecs::Entity;

/// Opaque identifier of a rigid body inside a [`PhysicsWorld`](super::PhysicsWorld)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub(crate) Entity);

impl BodyHandle {
    /// Stable numeric id, unique among live shapes and bodies of one world
    pub fn id(&self) -> u64 {
        self.0.to_bits().get()
    }
}

/// Rigid body state.
///
/// Position and rotation are read and written directly by the solver;
/// changes made between steps take effect at the next step.
#[derive(Debug, Clone)]
pub struct RigidBody {
    mass: f32,
    inertia_local: Mat3,
    position: Vec3,
    rotation: Quat,
    linear_velocity: Vec3,
    angular_velocity: Vec3,
    force: Vec3,
    torque: Vec3,
    friction: f32,
    pub(crate) shape: Option<ShapeHandle>,
    /// Static bodies are never integrated and collide as immovable
    pub is_static: bool,
    pub is_gravity_enabled: bool,
    /// Whether contacts with this body push the other side
    pub influence_other_bodies: bool,
    /// Caller owned value, never read by the world
    pub user_data: u64,
}

impl RigidBody {
    pub(crate) fn new(mass: f32, inertia_local: Mat3, friction: f32) -> Self {
        Self {
            mass,
            inertia_local,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            force: Vec3::ZERO,
            torque: Vec3::ZERO,
            friction,
            shape: None,
            is_static: false,
            is_gravity_enabled: true,
            influence_other_bodies: true,
            user_data: 0,
        }
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub(crate) fn set_mass_properties(&mut self, mass: f32, inertia_local: Mat3) {
        self.mass = mass;
        self.inertia_local = inertia_local;
    }

    /// Inverse mass, zero for static and massless bodies
    pub fn inverse_mass(&self) -> f32 {
        if self.is_static || self.mass <= 0.0 {
            0.0
        } else {
            1.0 / self.mass
        }
    }

    /// Inertia tensor in body space
    pub fn inertia(&self) -> Mat3 {
        self.inertia_local
    }

    /// Inverse inertia tensor in world space, zero for immovable bodies
    pub fn inverse_inertia_world(&self) -> Mat3 {
        if self.inverse_mass() == 0.0 || self.inertia_local.determinant().abs() <= f32::EPSILON {
            return Mat3::ZERO;
        }
        let rotation = Mat3::from_quat(self.rotation);
        rotation * self.inertia_local.inverse() * rotation.transpose()
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.position = Vec3::new(x, y, z);
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation.normalize();
    }

    pub fn linear_velocity(&self) -> Vec3 {
        self.linear_velocity
    }

    pub fn set_linear_velocity(&mut self, velocity: Vec3) {
        self.linear_velocity = velocity;
    }

    pub fn angular_velocity(&self) -> Vec3 {
        self.angular_velocity
    }

    pub fn set_angular_velocity(&mut self, velocity: Vec3) {
        self.angular_velocity = velocity;
    }

    /// Accumulate a force applied at the center of mass for the next step
    pub fn add_force(&mut self, force: Vec3) {
        self.force += force;
    }

    /// Accumulate a torque for the next step
    pub fn add_torque(&mut self, torque: Vec3) {
        self.torque += torque;
    }

    pub fn force(&self) -> Vec3 {
        self.force
    }

    pub fn torque(&self) -> Vec3 {
        self.torque
    }

    pub(crate) fn clear_accumulators(&mut self) {
        self.force = Vec3::ZERO;
        self.torque = Vec3::ZERO;
    }

    pub(crate) fn set_state(
        &mut self,
        position: Vec3,
        rotation: Quat,
        linear_velocity: Vec3,
        angular_velocity: Vec3,
    ) {
        self.position = position;
        self.rotation = rotation;
        self.linear_velocity = linear_velocity;
        self.angular_velocity = angular_velocity;
    }

    /// Friction used for contacts of this body instead of its shape friction
    pub fn friction(&self) -> f32 {
        self.friction
    }

    /// # Panics
    ///
    /// Panics on negative or non-finite friction.
    pub fn set_friction(&mut self, friction: f32) {
        assert!(
            friction >= 0.0 && friction.is_finite(),
            "friction must not be negative, got {friction}"
        );
        self.friction = friction;
    }

    pub fn shape(&self) -> Option<ShapeHandle> {
        self.shape
    }

    /// Rotation and translation as a matrix
    pub fn world_transform(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position)
    }

    /// Write the world transform into `out` and return it
    pub fn get_world_transform<'a>(&self, out: &'a mut Mat4) -> &'a mut Mat4 {
        *out = self.world_transform();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_body_is_immovable() {
        let mut body = RigidBody::new(2.0, Mat3::IDENTITY, 1.0);
        assert_eq!(body.inverse_mass(), 0.5);

        body.is_static = true;
        assert_eq!(body.inverse_mass(), 0.0);
        assert_eq!(body.inverse_inertia_world(), Mat3::ZERO);
    }

    #[test]
    fn test_world_transform_matches_pose() {
        let mut body = RigidBody::new(1.0, Mat3::IDENTITY, 1.0);
        body.set_position(1.0, 2.0, 3.0);
        body.set_rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));

        let mut out = Mat4::IDENTITY;
        body.get_world_transform(&mut out);
        assert_eq!(out, body.world_transform());

        let moved = out.transform_point3(Vec3::X);
        assert!((moved - Vec3::new(1.0, 2.0, 2.0)).length() < 1e-5);
    }

    #[test]
    fn test_inverse_inertia_rotates_with_body() {
        let mut body = RigidBody::new(1.0, Mat3::from_diagonal(Vec3::new(1.0, 2.0, 4.0)), 1.0);
        body.set_rotation(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));

        let inv = body.inverse_inertia_world();
        // The local X axis now points along world Y
        assert!((inv.y_axis.y - 1.0).abs() < 1e-5);
        assert!((inv.x_axis.x - 0.5).abs() < 1e-5);
    }
}
