use std::sync::{Arc, Mutex};
use std::thread;

use swarm_physics2d::{BodyBuilder, PhysicsWorld, Shape, Vec2, WorldConfig};

#[test]
fn test_physics_world_is_sync_and_send() {
    fn assert_sync_send<T: Sync + Send>() {}
    assert_sync_send::<PhysicsWorld>();
}

#[test]
fn test_shared_physics_world_across_threads() {
    let world = Arc::new(Mutex::new(PhysicsWorld::new()));
    {
        let mut world = world.lock().unwrap();
        world
            .add_body(BodyBuilder::dynamic(Shape::circle(4.0)))
            .expect("valid body");
    }

    let mut handles = vec![];
    for _ in 0..4 {
        let world_clone = Arc::clone(&world);
        let handle = thread::spawn(move || {
            let mut world = world_clone.lock().unwrap();
            world.simulate_step();
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(world.lock().unwrap().steps_simulated(), 4);
}

fn pile(parallel: bool) -> PhysicsWorld {
    let mut world = PhysicsWorld::with_config(WorldConfig {
        parallel,
        ..WorldConfig::default()
    })
    .expect("valid config");
    world
        .add_body(BodyBuilder::fixed(Shape::cuboid(Vec2::new(400.0, 20.0))).position(Vec2::new(0.0, 300.0)))
        .expect("floor");
    for i in 0..40 {
        let position = Vec2::new((i % 8) as f32 * 22.0 - 80.0, (i / 8) as f32 * -22.0);
        let shape = if i % 2 == 0 {
            Shape::circle(10.0)
        } else {
            Shape::cuboid(Vec2::splat(10.0))
        };
        world
            .add_body(BodyBuilder::dynamic(shape).position(position).restitution(0.2))
            .expect("valid body");
    }
    world
}

#[test]
fn parallel_narrow_phase_matches_sequential() {
    let mut sequential = pile(false);
    let mut parallel = pile(true);
    assert!(parallel.parallel_enabled());

    for _ in 0..90 {
        sequential.simulate_step();
        parallel.simulate_step();
        assert_eq!(sequential.collision_count(), parallel.collision_count());
    }

    for (a, b) in sequential.bodies().zip(parallel.bodies()) {
        assert_eq!(a.position(), b.position());
        assert_eq!(a.velocity, b.velocity);
    }
}
