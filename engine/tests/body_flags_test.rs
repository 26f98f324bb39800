//! Body flags changed between steps apply from the next step on

use glam::Vec3;
use thelema::physics::{BodyHandle, PhysicsWorld};

const FRAME: f32 = 1.0 / 60.0;

fn velocity(world: &PhysicsWorld, body: BodyHandle) -> Vec3 {
    world.body(body).unwrap().linear_velocity()
}

fn position(world: &PhysicsWorld, body: BodyHandle) -> Vec3 {
    world.body(body).unwrap().position()
}

#[test]
fn test_gravity_toggle_applies_next_step() {
    let mut world = PhysicsWorld::new();
    world.set_gravity(0.0, -10.0, 0.0);
    let body = world.rigid_body(None, 1.0).unwrap();

    world.step(FRAME).unwrap();
    world.step(FRAME).unwrap();
    let falling = velocity(&world, body);
    assert!(falling.y < 0.0);

    // Coasts at the velocity it had when gravity went off
    world.body_mut(body).unwrap().is_gravity_enabled = false;
    let before = position(&world, body);
    for _ in 0..10 {
        world.step(FRAME).unwrap();
        assert_eq!(velocity(&world, body), falling);
    }
    assert!(position(&world, body).y < before.y);

    // At rest without gravity it stays put
    world.body_mut(body).unwrap().set_linear_velocity(Vec3::ZERO);
    let resting = position(&world, body);
    for _ in 0..10 {
        world.step(FRAME).unwrap();
    }
    assert_eq!(position(&world, body), resting);

    world.body_mut(body).unwrap().is_gravity_enabled = true;
    world.step(FRAME).unwrap();
    assert!(velocity(&world, body).y < 0.0);
    assert!(position(&world, body).y < resting.y);
}

#[test]
fn test_influence_toggle_applies_next_step() {
    let mut world = PhysicsWorld::new();
    let shape_a = world.sphere_shape(1.0);
    let shape_b = world.sphere_shape(1.0);
    let a = world.rigid_body(Some(shape_a), 1.0).unwrap();
    let b = world.rigid_body(Some(shape_b), 1.0).unwrap();
    world.body_mut(b).unwrap().set_position(1.5, 0.0, 0.0);
    world.body_mut(a).unwrap().influence_other_bodies = false;
    world.body_mut(b).unwrap().influence_other_bodies = false;

    // Neither side pushes
    world.step(FRAME).unwrap();
    assert!(world.is_contact_exist(a, b));
    assert_eq!(position(&world, a), Vec3::ZERO);
    assert_eq!(position(&world, b), Vec3::new(1.5, 0.0, 0.0));

    // a starts pushing b away
    world.body_mut(a).unwrap().influence_other_bodies = true;
    world.step(FRAME).unwrap();
    assert_eq!(position(&world, a), Vec3::ZERO);
    let pushed = position(&world, b);
    assert!(pushed.x > 1.5, "b stayed at {pushed:?}");
    assert!(velocity(&world, b).x > 0.0);

    // and stops again while the pair still overlaps
    world.body_mut(a).unwrap().influence_other_bodies = false;
    world.body_mut(b).unwrap().set_linear_velocity(Vec3::ZERO);
    world.step(FRAME).unwrap();
    assert!(world.is_contact_exist(a, b));
    assert_eq!(position(&world, b), pushed);
    assert_eq!(velocity(&world, b), Vec3::ZERO);
}
