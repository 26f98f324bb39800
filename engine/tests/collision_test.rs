//! Immediate collision queries and broad phase selection through the world

use glam::{Quat, Vec3};
use thelema::config::{BroadPhaseKind, PhysicsConfig};
use thelema::physics::{HeightFieldParams, PhysicsWorld, ShapeHandle};

fn place(world: &mut PhysicsWorld, shape: ShapeHandle, x: f32, y: f32, z: f32) {
    world.shape_mut(shape).unwrap().set_position(x, y, z);
}

#[test]
fn test_box_resting_on_plane_has_four_contacts() {
    let mut world = PhysicsWorld::new();
    let ground = world.plane_shape();
    let crate_shape = world.box_shape(1.0, 1.0, 1.0);
    place(&mut world, crate_shape, 0.0, 0.45, 0.0);

    let contacts = world.check_collision(crate_shape, ground).unwrap();
    assert_eq!(contacts.len(), 4);
    for contact in &contacts {
        assert!((contact.depth - 0.05).abs() < 1e-4);
        // From the box towards the plane
        assert!(contact.normal.abs_diff_eq(Vec3::NEG_Y, 1e-5));
    }

    let reversed = world.check_collision(ground, crate_shape).unwrap();
    assert!(reversed[0].normal.abs_diff_eq(Vec3::Y, 1e-5));
}

#[test]
fn test_check_collision_respects_max_contacts() {
    let config = PhysicsConfig {
        max_contacts: 2,
        ..Default::default()
    };
    let mut world = PhysicsWorld::with_config(config).unwrap();
    let ground = world.plane_shape();
    let crate_shape = world.box_shape(1.0, 1.0, 1.0);
    place(&mut world, crate_shape, 0.0, 0.45, 0.0);

    assert_eq!(world.check_collision(crate_shape, ground).unwrap().len(), 2);
}

#[test]
fn test_separated_shapes_have_no_contacts() {
    let mut world = PhysicsWorld::new();
    let a = world.capsule_shape(0.5, 2.0);
    let b = world.cylinder_shape(0.5, 2.0);
    place(&mut world, b, 3.0, 0.0, 0.0);
    assert!(world.check_collision(a, b).unwrap().is_empty());

    place(&mut world, b, 0.8, 0.0, 0.0);
    assert!(!world.check_collision(a, b).unwrap().is_empty());
}

#[test]
fn test_attached_shape_uses_body_pose() {
    let mut world = PhysicsWorld::new();
    let ground = world.plane_shape();
    let ball = world.sphere_shape(0.5);
    let body = world.rigid_body(Some(ball), 1.0).unwrap();
    world.body_mut(body).unwrap().set_position(0.0, 0.25, 0.0);

    let contacts = world.check_collision(ball, ground).unwrap();
    assert_eq!(contacts.len(), 1);
    assert!((contacts[0].depth - 0.25).abs() < 1e-5);
}

#[test]
fn test_sphere_on_trimesh_ground() {
    let mut world = PhysicsWorld::new();
    #[rustfmt::skip]
    let vertices = [
        -5.0, 0.0, -5.0,
         5.0, 0.0, -5.0,
         5.0, 0.0,  5.0,
        -5.0, 0.0,  5.0,
    ];
    let ground = world.trimesh_shape(&vertices, &[0, 2, 1, 0, 3, 2]);
    let ball = world.sphere_shape(1.0);
    place(&mut world, ball, 1.0, 0.9, 1.0);

    let contacts = world.check_collision(ball, ground).unwrap();
    assert!(!contacts.is_empty());
    assert!((contacts[0].depth - 0.1).abs() < 1e-4);
}

#[test]
fn test_sphere_on_height_field() {
    let mut world = PhysicsWorld::new();
    let params = HeightFieldParams {
        width: 10.0,
        depth: 10.0,
        width_samples: 11,
        depth_samples: 11,
        ..Default::default()
    };
    let slope = |x: usize, _z: usize| x as f32 * 0.1;
    let terrain = world.height_field(params, Some(&slope));
    let ball = world.sphere_shape(0.5);

    // Height 0.5 in the middle of the field
    place(&mut world, ball, 0.0, 0.9, 0.0);
    let contacts = world.check_collision(ball, terrain).unwrap();
    assert!(!contacts.is_empty());

    place(&mut world, ball, 0.0, 3.0, 0.0);
    assert!(world.check_collision(ball, terrain).unwrap().is_empty());
}

#[test]
fn test_rotated_box_on_plane() {
    let mut world = PhysicsWorld::new();
    let ground = world.plane_shape();
    let crate_shape = world.box_shape(1.0, 1.0, 1.0);
    {
        let shape = world.shape_mut(crate_shape).unwrap();
        shape.set_position(0.0, 0.65, 0.0);
        shape.set_rotation(Quat::from_rotation_z(std::f32::consts::FRAC_PI_4));
    }

    // Resting on an edge: the two lowest corners touch
    let contacts = world.check_collision(crate_shape, ground).unwrap();
    assert_eq!(contacts.len(), 2);
}

#[test]
fn test_spatial_hash_world_reports_same_pairs() {
    let run = |broad_phase: BroadPhaseKind| {
        let config = PhysicsConfig {
            broad_phase,
            ..Default::default()
        };
        let mut world = PhysicsWorld::with_config(config).unwrap();
        let mut shapes = Vec::new();
        for i in 0..6 {
            let shape = world.sphere_shape(0.6);
            place(&mut world, shape, i as f32, 0.0, 0.0);
            shapes.push(shape);
        }
        world.step(1.0 / 60.0).unwrap();
        world
            .shape_contacts()
            .map(|pair| (pair.a.id(), pair.b.id()))
            .collect::<Vec<_>>()
    };

    let sweep = run(BroadPhaseKind::SweepAndPrune);
    let hash = run(BroadPhaseKind::SpatialHash { cell_size: 2.0 });
    assert_eq!(sweep.len(), 5);
    assert_eq!(sweep, hash);
}
