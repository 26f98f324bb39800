//! Contact joints and persistent joints between bodies

use super::body::BodyHandle;
use super::collision::ContactGeom;
use crate::config::SurfaceParams;
use glam::Vec3;
use hecs::Entity;

/// Opaque identifier of a persistent joint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JointHandle(pub(crate) Entity);

/// Surface of a single contact joint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactSurface {
    /// Friction coefficient along the first tangent (and the second unless
    /// `params.independent_mu2` is set)
    pub mu: f32,
    pub params: SurfaceParams,
}

/// Transient one-step constraint built from a contact point.
///
/// A missing body means the contact pushes against the static environment.
#[derive(Debug, Clone)]
pub struct ContactJoint {
    pub contact: ContactGeom,
    pub surface: ContactSurface,
    pub body_a: Option<BodyHandle>,
    pub body_b: Option<BodyHandle>,
}

/// Holds the contact joints created during one step
#[derive(Debug, Default)]
pub struct JointGroup {
    joints: Vec<ContactJoint>,
}

impl JointGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, joint: ContactJoint) {
        self.joints.push(joint);
    }

    pub fn joints(&self) -> &[ContactJoint] {
        &self.joints
    }

    /// Destroy every joint in the group
    pub fn empty(&mut self) {
        self.joints.clear();
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }
}

/// Ball and socket joint stored in the world registry.
/// Connected bodies never collide with each other.
#[derive(Debug, Clone, Copy)]
pub struct BallJoint {
    pub body_a: BodyHandle,
    pub body_b: Option<BodyHandle>,
    /// Anchor in body A space
    pub local_anchor_a: Vec3,
    /// Anchor in body B space, or in world space when B is absent
    pub local_anchor_b: Vec3,
}

impl BallJoint {
    pub fn connects(&self, a: BodyHandle, b: BodyHandle) -> bool {
        (self.body_a == a && self.body_b == Some(b)) || (self.body_a == b && self.body_b == Some(a))
    }

    pub fn references(&self, body: BodyHandle) -> bool {
        self.body_a == body || self.body_b == Some(body)
    }
}
