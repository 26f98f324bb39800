//! Sequential impulse solver for contact and ball joints

use super::body::{BodyHandle, RigidBody};
use super::collision::create_tangent_basis;
use super::error::PhysicsError;
use super::joints::{BallJoint, ContactJoint};
use crate::config::PhysicsConfig;
use glam::{Mat3, Quat, Vec3};
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::{error, trace};

/// Body state copied out of the registry for one solver step
#[derive(Debug, Clone)]
pub struct SolverBody {
    pub handle: BodyHandle,
    pub position: Vec3,
    pub rotation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub inv_mass: f32,
    pub inv_inertia_world: Mat3,
    pub force: Vec3,
    pub torque: Vec3,
    pub use_gravity: bool,
    pub is_static: bool,
}

impl SolverBody {
    pub fn from_rigid_body(handle: BodyHandle, body: &RigidBody) -> Self {
        Self {
            handle,
            position: body.position(),
            rotation: body.rotation(),
            linear_velocity: body.linear_velocity(),
            angular_velocity: body.angular_velocity(),
            inv_mass: body.inverse_mass(),
            inv_inertia_world: body.inverse_inertia_world(),
            force: body.force(),
            torque: body.torque(),
            use_gravity: body.is_gravity_enabled,
            is_static: body.is_static,
        }
    }

    /// Apply external forces and gravity to the velocities
    fn apply_external(&mut self, dt: f32, gravity: Vec3) {
        if self.is_static || self.inv_mass == 0.0 {
            return;
        }
        let external_acceleration = if self.use_gravity { gravity } else { Vec3::ZERO };
        self.linear_velocity += (external_acceleration + self.force * self.inv_mass) * dt;
        self.angular_velocity += self.inv_inertia_world * self.torque * dt;
    }

    /// Advance the pose by the solved velocities
    fn integrate(&mut self, dt: f32) {
        if self.is_static {
            return;
        }
        self.position += self.linear_velocity * dt;

        // Update rotation: q' = q + 0.5 * dt * ω * q
        let omega_quat = Quat::from_xyzw(
            self.angular_velocity.x,
            self.angular_velocity.y,
            self.angular_velocity.z,
            0.0,
        );
        let dq = (omega_quat * self.rotation) * (0.5 * dt);
        self.rotation = (self.rotation + dq).normalize();
    }

    fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.rotation.is_finite()
            && self.linear_velocity.is_finite()
            && self.angular_velocity.is_finite()
    }
}

fn skew(r: Vec3) -> Mat3 {
    Mat3::from_cols(
        Vec3::new(0.0, r.z, -r.y),
        Vec3::new(-r.z, 0.0, r.x),
        Vec3::new(r.y, -r.x, 0.0),
    )
}

/// Velocity of the point at offset `r` from the body center
fn point_velocity(bodies: &[SolverBody], index: Option<usize>, r: Vec3) -> Vec3 {
    index
        .map(|i| bodies[i].linear_velocity + bodies[i].angular_velocity.cross(r))
        .unwrap_or(Vec3::ZERO)
}

fn apply_impulse(bodies: &mut [SolverBody], index: Option<usize>, r: Vec3, impulse: Vec3) {
    if let Some(i) = index {
        let body = &mut bodies[i];
        body.linear_velocity += impulse * body.inv_mass;
        body.angular_velocity += body.inv_inertia_world * r.cross(impulse);
    }
}

/// Effective inverse mass of one side along `direction`
fn side_mass(bodies: &[SolverBody], index: Option<usize>, r: Vec3, direction: Vec3) -> f32 {
    index
        .map(|i| {
            let body = &bodies[i];
            let angular = (body.inv_inertia_world * r.cross(direction)).cross(r);
            body.inv_mass + direction.dot(angular)
        })
        .unwrap_or(0.0)
}

fn angular_velocity(bodies: &[SolverBody], index: Option<usize>) -> Vec3 {
    index.map(|i| bodies[i].angular_velocity).unwrap_or(Vec3::ZERO)
}

fn apply_angular_impulse(bodies: &mut [SolverBody], index: Option<usize>, impulse: Vec3) {
    if let Some(i) = index {
        let body = &mut bodies[i];
        body.angular_velocity += body.inv_inertia_world * impulse;
    }
}

/// Inverse rotational inertia of one side about `axis`
fn angular_mass(bodies: &[SolverBody], index: Option<usize>, axis: Vec3) -> f32 {
    index
        .map(|i| axis.dot(bodies[i].inv_inertia_world * axis))
        .unwrap_or(0.0)
}

fn resolve(index: &HashMap<BodyHandle, usize>, body: Option<BodyHandle>) -> Option<usize> {
    body.and_then(|handle| index.get(&handle).copied())
}

struct ContactRow {
    a: Option<usize>,
    b: Option<usize>,
    r_a: Vec3,
    r_b: Vec3,
    normal: Vec3,
    tangents: [Vec3; 2],
    normal_mass: f32,
    tangent_mass: [f32; 2],
    /// Constraint force mixing scaled to impulse units
    gamma: f32,
    target: f32,
    friction: [f32; 2],
    /// Rolling resistance torque per unit normal force
    rolling: f32,
    rolling_mass: [f32; 2],
    normal_impulse: f32,
    tangent_impulse: [f32; 2],
    rolling_impulse: [f32; 2],
}

struct BallRow {
    a: Option<usize>,
    b: Option<usize>,
    r_a: Vec3,
    r_b: Vec3,
    inverse_k: Mat3,
    bias: Vec3,
}

/// Iterative solver advancing bodies by a fixed step
#[derive(Debug, Clone)]
pub struct QuickStepSolver {
    iterations: u32,
    erp: f32,
    cfm: f32,
}

impl QuickStepSolver {
    pub fn new(config: &PhysicsConfig) -> Self {
        Self {
            iterations: config.solver_iterations,
            erp: config.erp,
            cfm: config.cfm,
        }
    }

    /// Advance `bodies` by `dt`. `index` maps body handles to slots in
    /// `bodies`; joints referencing unknown bodies act against the world.
    ///
    /// On error the body slice holds the diverged state and must not be
    /// written back.
    pub fn step(
        &self,
        bodies: &mut [SolverBody],
        index: &HashMap<BodyHandle, usize>,
        contacts: &[ContactJoint],
        ball_joints: &[BallJoint],
        gravity: Vec3,
        dt: f32,
    ) -> Result<(), PhysicsError> {
        bodies.par_iter_mut().for_each(|body| {
            body.apply_external(dt, gravity);
        });

        let mut contact_rows: Vec<ContactRow> = contacts
            .iter()
            .filter_map(|joint| self.contact_row(bodies, index, joint, dt))
            .collect();
        let ball_rows: Vec<BallRow> = ball_joints
            .iter()
            .filter_map(|joint| self.ball_row(bodies, index, joint, dt))
            .collect();

        trace!(
            contacts = contact_rows.len(),
            ball_joints = ball_rows.len(),
            iterations = self.iterations,
            "Solving constraints"
        );

        for _ in 0..self.iterations {
            for row in contact_rows.iter_mut() {
                Self::solve_contact(bodies, row);
            }
            for row in &ball_rows {
                Self::solve_ball(bodies, row);
            }
        }

        bodies.par_iter_mut().for_each(|body| {
            body.integrate(dt);
        });

        if let Some(body) = bodies.iter().find(|body| !body.is_finite()) {
            error!(body = ?body.handle, "Solver produced a non-finite body state");
            return Err(PhysicsError::SolverDiverged(body.handle));
        }
        Ok(())
    }

    fn contact_row(
        &self,
        bodies: &[SolverBody],
        index: &HashMap<BodyHandle, usize>,
        joint: &ContactJoint,
        dt: f32,
    ) -> Option<ContactRow> {
        let a = resolve(index, joint.body_a);
        let b = resolve(index, joint.body_b);
        if a.is_none() && b.is_none() {
            return None;
        }

        let contact = &joint.contact;
        let normal = contact.normal;
        let r_a = a.map(|i| contact.position - bodies[i].position).unwrap_or(Vec3::ZERO);
        let r_b = b.map(|i| contact.position - bodies[i].position).unwrap_or(Vec3::ZERO);

        let k_normal = side_mass(bodies, a, r_a, normal) + side_mass(bodies, b, r_b, normal);
        if k_normal <= f32::EPSILON {
            // Both sides immovable
            return None;
        }

        let (tangent, bitangent) = create_tangent_basis(normal);
        let tangents = [tangent, bitangent];
        let tangent_mass = tangents.map(|t| {
            let k = side_mass(bodies, a, r_a, t) + side_mass(bodies, b, r_b, t);
            if k > f32::EPSILON {
                1.0 / k
            } else {
                0.0
            }
        });

        let rolling_mass = tangents.map(|t| {
            let k = angular_mass(bodies, a, t) + angular_mass(bodies, b, t);
            if k > f32::EPSILON {
                1.0 / k
            } else {
                0.0
            }
        });

        let params = &joint.surface.params;
        let gamma = (params.soft_cfm + self.cfm) / dt;
        let relative = point_velocity(bodies, b, r_b) - point_velocity(bodies, a, r_a);
        let approach = relative.dot(normal);

        let mut target = self.erp * contact.depth / dt;
        if -approach > params.bounce_vel {
            target = target.max(-params.bounce * approach);
        }

        let mu2 = if params.independent_mu2 {
            params.mu2
        } else {
            joint.surface.mu
        };

        Some(ContactRow {
            a,
            b,
            r_a,
            r_b,
            normal,
            tangents,
            normal_mass: 1.0 / (k_normal + gamma),
            tangent_mass,
            gamma,
            target,
            friction: [joint.surface.mu, mu2],
            rolling: params.rolling_friction,
            rolling_mass,
            normal_impulse: 0.0,
            tangent_impulse: [0.0; 2],
            rolling_impulse: [0.0; 2],
        })
    }

    fn solve_contact(bodies: &mut [SolverBody], row: &mut ContactRow) {
        let relative = point_velocity(bodies, row.b, row.r_b) - point_velocity(bodies, row.a, row.r_a);
        let normal_velocity = relative.dot(row.normal);

        let delta = row.normal_mass * (row.target - normal_velocity - row.gamma * row.normal_impulse);
        let accumulated = (row.normal_impulse + delta).max(0.0);
        let applied = accumulated - row.normal_impulse;
        row.normal_impulse = accumulated;

        let impulse = row.normal * applied;
        apply_impulse(bodies, row.a, row.r_a, -impulse);
        apply_impulse(bodies, row.b, row.r_b, impulse);

        for axis in 0..2 {
            if row.tangent_mass[axis] == 0.0 {
                continue;
            }
            let tangent = row.tangents[axis];
            let relative = point_velocity(bodies, row.b, row.r_b) - point_velocity(bodies, row.a, row.r_a);
            let delta = -relative.dot(tangent) * row.tangent_mass[axis];

            let limit = row.friction[axis] * row.normal_impulse;
            let accumulated = (row.tangent_impulse[axis] + delta).clamp(-limit, limit);
            let applied = accumulated - row.tangent_impulse[axis];
            row.tangent_impulse[axis] = accumulated;

            let impulse = tangent * applied;
            apply_impulse(bodies, row.a, row.r_a, -impulse);
            apply_impulse(bodies, row.b, row.r_b, impulse);
        }

        // Rolling resistance about the tangent axes
        if row.rolling <= 0.0 {
            return;
        }
        for axis in 0..2 {
            if row.rolling_mass[axis] == 0.0 {
                continue;
            }
            let tangent = row.tangents[axis];
            let relative = angular_velocity(bodies, row.b) - angular_velocity(bodies, row.a);
            let delta = -relative.dot(tangent) * row.rolling_mass[axis];

            let limit = row.rolling * row.normal_impulse;
            let accumulated = (row.rolling_impulse[axis] + delta).clamp(-limit, limit);
            let applied = accumulated - row.rolling_impulse[axis];
            row.rolling_impulse[axis] = accumulated;

            let impulse = tangent * applied;
            apply_angular_impulse(bodies, row.a, -impulse);
            apply_angular_impulse(bodies, row.b, impulse);
        }
    }

    fn ball_row(
        &self,
        bodies: &[SolverBody],
        index: &HashMap<BodyHandle, usize>,
        joint: &BallJoint,
        dt: f32,
    ) -> Option<BallRow> {
        let a = resolve(index, Some(joint.body_a));
        let b = resolve(index, joint.body_b);

        let anchor_a = a
            .map(|i| bodies[i].position + bodies[i].rotation * joint.local_anchor_a)
            .unwrap_or(joint.local_anchor_a);
        let anchor_b = b
            .map(|i| bodies[i].position + bodies[i].rotation * joint.local_anchor_b)
            .unwrap_or(joint.local_anchor_b);
        let r_a = a.map(|i| anchor_a - bodies[i].position).unwrap_or(Vec3::ZERO);
        let r_b = b.map(|i| anchor_b - bodies[i].position).unwrap_or(Vec3::ZERO);

        let side = |slot: Option<usize>, r: Vec3| -> Mat3 {
            slot.map(|i| {
                let body = &bodies[i];
                let skew_r = skew(r);
                Mat3::from_diagonal(Vec3::splat(body.inv_mass)) - skew_r * body.inv_inertia_world * skew_r
            })
            .unwrap_or(Mat3::ZERO)
        };
        let k = side(a, r_a) + side(b, r_b);
        if k.determinant().abs() <= f32::EPSILON {
            // Both sides immovable
            return None;
        }
        let k = k + Mat3::from_diagonal(Vec3::splat(self.cfm / dt));

        Some(BallRow {
            a,
            b,
            r_a,
            r_b,
            inverse_k: k.inverse(),
            bias: (anchor_b - anchor_a) * (self.erp / dt),
        })
    }

    fn solve_ball(bodies: &mut [SolverBody], row: &BallRow) {
        let relative = point_velocity(bodies, row.b, row.r_b) - point_velocity(bodies, row.a, row.r_a);
        let impulse = row.inverse_k * (-(relative + row.bias));
        apply_impulse(bodies, row.a, row.r_a, -impulse);
        apply_impulse(bodies, row.b, row.r_b, impulse);
    }
}
