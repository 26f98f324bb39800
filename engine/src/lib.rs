//! Thelema physics core
//!
//! This crate provides the physics world of the Thelema engine: collision
//! shapes, rigid bodies, a sequential impulse solver and exactly-once
//! collision begin/end notifications per contact pair.

pub mod config;
pub mod physics;

// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{BroadPhaseKind, ConfigError, PhysicsConfig, SurfaceParams};

    // Math types
    pub use glam::{Mat3, Mat4, Quat, Vec3};

    // Physics types
    pub use crate::physics::{
        BodyHandle, ContactEndpoint, ContactInfo, HeightFieldParams, ListenerId, PhysicsError,
        PhysicsWorld, PhysicsWorldListener, RigidBody, Shape, ShapeHandle, ShapeType,
    };
}

/// Initialize logging for the engine
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
