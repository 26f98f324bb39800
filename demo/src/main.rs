//! Headless falling sphere demonstration
//!
//! Drops a dynamic sphere onto three static spheres and logs every collision
//! event. An optional JSON physics config path can be passed as the first
//! argument.

use glam::{Mat4, Vec3};
use std::sync::Arc;
use thelema::prelude::*;
use tracing::{info, warn};

const STEPS: usize = 180;
const FRAME_DELTA: f32 = 1.0 / 60.0;

/// Logs collision events
struct CollisionLogger;

impl PhysicsWorldListener for CollisionLogger {
    fn collision_begin(&self, a: ContactEndpoint, b: ContactEndpoint, depth: f32) {
        info!("Collision begin: {:?} <-> {:?} (depth {:.4})", a, b, depth);
    }

    fn collision_end(&self, a: ContactEndpoint, b: ContactEndpoint) {
        info!("Collision end: {:?} <-> {:?}", a, b);
    }
}

fn static_sphere(
    world: &mut PhysicsWorld,
    position: Vec3,
) -> Result<BodyHandle, PhysicsError> {
    let shape = world.sphere_shape(1.0);
    let body = world.rigid_body(Some(shape), 1.0)?;
    let state = world.body_mut(body)?;
    state.set_position(position.x, position.y, position.z);
    state.is_static = true;
    state.is_gravity_enabled = false;
    Ok(body)
}

fn load_config() -> Result<PhysicsConfig, ConfigError> {
    match std::env::args().nth(1) {
        Some(path) => {
            info!("Loading physics config from {}", path);
            PhysicsConfig::from_file(path)
        }
        None => Ok(PhysicsConfig::default()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    thelema::init_logging();
    info!("Starting falling sphere demo");

    let mut world = PhysicsWorld::with_config(load_config()?)?;
    if world.gravity() == Vec3::ZERO {
        world.set_gravity(0.0, -2.0, 0.0);
    }
    world.add_physics_world_listener(Arc::new(CollisionLogger));

    for position in [
        Vec3::new(1.0, 0.0, 1.5),
        Vec3::new(-2.0, 0.0, 1.5),
        Vec3::new(0.0, 0.0, -1.5),
    ] {
        static_sphere(&mut world, position)?;
    }

    let shape = world.sphere_shape(1.0);
    let sphere = world.rigid_body(Some(shape), 1.0)?;
    world.body_mut(sphere)?.set_position(0.5, 3.0, 0.5);

    let mut transform = Mat4::IDENTITY;
    for step in 0..STEPS {
        if let Err(err) = world.step(FRAME_DELTA) {
            warn!("Physics step {} failed: {}", step, err);
            return Err(err.into());
        }
        if step % 30 == 0 {
            world.body(sphere)?.get_world_transform(&mut transform);
            info!("Step {}: sphere at {:?}", step, transform.w_axis.truncate());
        }
    }

    let position = world.body(sphere)?.position();
    info!("Final sphere position: {:?}", position);
    world.destroy();
    Ok(())
}
