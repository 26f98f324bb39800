//! Configuration types for the physics world

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Errors that can occur while loading or validating a configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid physics config: {0}")]
    Invalid(String),
}

/// Broad phase algorithm used to find candidate shape pairs
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum BroadPhaseKind {
    /// Sort AABB endpoints along the axis with the highest variance
    #[default]
    SweepAndPrune,
    /// Bucket AABBs into a uniform grid of cubic cells
    SpatialHash { cell_size: f32 },
}

/// Surface parameters applied to every contact joint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceParams {
    /// Restitution, 0 is not bouncy and 1 is maximum bounciness
    pub bounce: f32,
    /// Minimum approach velocity needed before bounce is applied
    pub bounce_vel: f32,
    /// Constraint force mixing in the contact normal direction
    pub soft_cfm: f32,
    /// Friction coefficient along the second friction direction.
    /// Only used when `independent_mu2` is set, otherwise the shape friction applies to both.
    pub mu2: f32,
    /// Use `mu2` for the second friction direction
    pub independent_mu2: bool,
    /// Rolling resistance: the largest torque opposing rolling per unit of
    /// normal force, in length units. Zero lets bodies roll freely.
    pub rolling_friction: f32,
}

impl Default for SurfaceParams {
    fn default() -> Self {
        Self {
            bounce: 0.1,
            bounce_vel: 0.1,
            soft_cfm: 0.01,
            mu2: 0.0,
            independent_mu2: false,
            rolling_friction: 0.3,
        }
    }
}

/// Tunables of a physics world.
///
/// `min_step` is the fixed integration step. It does not depend on the frame
/// delta passed to `PhysicsWorld::step`; the delta only ages contact pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Initial gravity vector
    pub gravity: Vec3,
    /// Maximum number of contact points generated per shape pair
    pub max_contacts: usize,
    /// Seconds a contact pair stays alive after it was last observed
    pub contact_max_life_time: f32,
    /// Fixed solver step in seconds
    pub min_step: f32,
    /// Error reduction parameter
    pub erp: f32,
    /// Global constraint force mixing
    pub cfm: f32,
    /// Sequential impulse iterations per step
    pub solver_iterations: u32,
    /// Contact surface parameters
    pub surface: SurfaceParams,
    /// Friction assigned to newly created shapes and bodies
    pub default_friction: f32,
    /// Broad phase algorithm
    pub broad_phase: BroadPhaseKind,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::ZERO,
            max_contacts: 40,
            contact_max_life_time: 0.1,
            min_step: 0.02,
            erp: 0.2,
            cfm: 0.0001,
            solver_iterations: 20,
            surface: SurfaceParams::default(),
            default_friction: 1.0,
            broad_phase: BroadPhaseKind::default(),
        }
    }
}

impl PhysicsConfig {
    /// Parse a configuration from JSON. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: PhysicsConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!(path = ?path, "Loading physics config");
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Serialize to pretty printed JSON
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that every value is usable by the solver
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_contacts == 0 {
            return Err(ConfigError::Invalid(
                "max_contacts must be at least 1".to_string(),
            ));
        }
        if !(self.contact_max_life_time >= 0.0 && self.contact_max_life_time.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "contact_max_life_time must be a non-negative number, got {}",
                self.contact_max_life_time
            )));
        }
        if !(self.min_step > 0.0 && self.min_step.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "min_step must be positive, got {}",
                self.min_step
            )));
        }
        if !(0.0..=1.0).contains(&self.erp) {
            return Err(ConfigError::Invalid(format!(
                "erp must be within [0, 1], got {}",
                self.erp
            )));
        }
        if self.cfm < 0.0 || self.surface.soft_cfm < 0.0 {
            return Err(ConfigError::Invalid("cfm must not be negative".to_string()));
        }
        if !(self.surface.rolling_friction >= 0.0 && self.surface.rolling_friction.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "rolling_friction must be a non-negative number, got {}",
                self.surface.rolling_friction
            )));
        }
        if self.solver_iterations == 0 {
            return Err(ConfigError::Invalid(
                "solver_iterations must be at least 1".to_string(),
            ));
        }
        if self.default_friction < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "default_friction must not be negative, got {}",
                self.default_friction
            )));
        }
        if let BroadPhaseKind::SpatialHash { cell_size } = self.broad_phase {
            if !(cell_size > 0.0 && cell_size.is_finite()) {
                return Err(ConfigError::Invalid(format!(
                    "spatial hash cell_size must be positive, got {cell_size}"
                )));
            }
        }
        if !self.gravity.is_finite() {
            return Err(ConfigError::Invalid("gravity must be finite".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = PhysicsConfig::default();
        assert_eq!(config.max_contacts, 40);
        assert_eq!(config.contact_max_life_time, 0.1);
        assert_eq!(config.min_step, 0.02);
        assert_eq!(config.erp, 0.2);
        assert_eq!(config.cfm, 0.0001);
        assert_eq!(config.gravity, Vec3::ZERO);
        assert_eq!(config.broad_phase, BroadPhaseKind::SweepAndPrune);
        assert_eq!(config.surface.rolling_friction, 0.3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = PhysicsConfig::from_json_str(r#"{ "max_contacts": 8 }"#).unwrap();
        assert_eq!(config.max_contacts, 8);
        assert_eq!(config.min_step, 0.02);
        assert_eq!(config.surface, SurfaceParams::default());
    }

    #[test]
    fn test_rejects_zero_min_step() {
        let result = PhysicsConfig::from_json_str(r#"{ "min_step": 0.0 }"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_negative_rolling_friction() {
        let result = PhysicsConfig::from_json_str(r#"{ "surface": { "rolling_friction": -0.1 } }"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_spatial_hash_roundtrip_through_json() {
        let config = PhysicsConfig {
            broad_phase: BroadPhaseKind::SpatialHash { cell_size: 4.0 },
            ..Default::default()
        };
        let json = config.to_json_string().unwrap();
        let parsed = PhysicsConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed.broad_phase, config.broad_phase);
    }
}
