use approx::assert_relative_eq;
use swarm_physics2d::*;

const FLOOR_TOP: f32 = 100.0;

fn add_floor(world: &mut PhysicsWorld) -> BodyHandle {
    world
        .add_body(
            BodyBuilder::fixed(Shape::cuboid(Vec2::new(500.0, 20.0)))
                .position(Vec2::new(0.0, FLOOR_TOP + 20.0)),
        )
        .expect("floor")
}

fn add_box(world: &mut PhysicsWorld, position: Vec2) -> BodyHandle {
    add_plank(world, 15.0, position)
}

fn add_plank(world: &mut PhysicsWorld, half_width: f32, position: Vec2) -> BodyHandle {
    world
        .add_body(
            BodyBuilder::dynamic(Shape::cuboid(Vec2::new(half_width, 15.0)))
                .position(position)
                .restitution(0.0),
        )
        .expect("box")
}

#[test]
fn bodies_fall_under_gravity() {
    let mut world = PhysicsWorld::new();
    let body = world
        .add_body(BodyBuilder::dynamic(Shape::circle(5.0)).position(Vec2::new(0.0, 10.0)))
        .expect("valid body");

    world.simulate_step();
    world.simulate_step();

    let body = world.body(body).expect("body should exist");
    assert!(body.position().y > 10.0, "body should start falling, y = {}", body.position().y);
    assert_relative_eq!(body.velocity.linear.y, 2.0 * 981.0 / 60.0, epsilon = 1e-2);
    assert!(body.previous_transform().position.y < body.position().y);
}

#[test]
fn box_comes_to_rest_on_the_floor() {
    let mut world = PhysicsWorld::new();
    let floor = add_floor(&mut world);
    let body = add_box(&mut world, Vec2::ZERO);

    let mut contact_step = None;
    for step in 0..120 {
        world.simulate_step();
        if world.collision_count() > 0 {
            contact_step = Some(step);
            break;
        }
    }
    assert!(contact_step.is_some(), "box never reached the floor");

    let state = world.body(body).expect("box");
    assert_relative_eq!(state.position().y + 15.0, FLOOR_TOP, epsilon = 0.1);
    assert!(state.velocity.linear.y.abs() < 1e-3, "vy = {}", state.velocity.linear.y);

    for _ in 0..60 {
        world.simulate_step();
        let state = world.body(body).expect("box");
        assert_relative_eq!(state.position().y + 15.0, FLOOR_TOP, epsilon = 0.5);
        assert!(state.velocity.linear.y < 981.0 / 60.0 + 1e-2);
    }

    let floor = world.body(floor).expect("floor");
    assert_eq!(floor.position(), Vec2::new(0.0, FLOOR_TOP + 20.0));
    assert_eq!(floor.velocity.linear, Vec2::ZERO);
}

#[test]
fn stacked_boxes_settle_in_order() {
    let mut world = PhysicsWorld::new();
    add_floor(&mut world);
    // Registered top-down.
    let top = add_plank(&mut world, 9.0, Vec2::new(0.0, -20.0));
    let middle = add_plank(&mut world, 12.0, Vec2::new(0.0, 20.0));
    let bottom = add_plank(&mut world, 15.0, Vec2::new(0.0, 60.0));

    for _ in 0..240 {
        world.simulate_step();
    }

    let y = |handle| world.body(handle).expect("box").position().y;
    assert!(y(bottom) + 15.0 <= FLOOR_TOP + 1.0);
    assert!(y(bottom) - y(middle) > 27.0);
    assert!(y(middle) - y(top) > 27.0);
    for handle in [top, middle, bottom] {
        let state = world.body(handle).expect("box");
        assert!(state.position().x.abs() < 0.5, "x drifted to {}", state.position().x);
        assert!(state.rotation().abs() < 1.0, "rotated to {}", state.rotation());
    }
}

#[test]
fn trigger_volume_is_passed_through() {
    let mut world = PhysicsWorld::with_config(WorldConfig::default().with_gravity(Vec2::ZERO))
        .expect("valid config");
    let trigger = world
        .add_body(BodyBuilder::trigger(Shape::cuboid(Vec2::splat(20.0))))
        .expect("trigger");
    let body = world
        .add_body(
            BodyBuilder::dynamic(Shape::circle(5.0))
                .position(Vec2::new(-50.0, 0.0))
                .velocity(Vec2::new(600.0, 0.0)),
        )
        .expect("body");

    let mut events = Vec::new();
    for _ in 0..20 {
        world.simulate_step();
        events.extend(world.drain_events());
        let state = world.body(body).expect("body");
        assert_eq!(state.position().y, 0.0);
        assert_eq!(state.velocity.linear, Vec2::new(600.0, 0.0));
    }

    assert_eq!(
        events,
        vec![
            PhysicsEvent::TriggerEnter { trigger, other: body },
            PhysicsEvent::TriggerExit { trigger, other: body },
        ]
    );
    assert_relative_eq!(world.body(body).expect("body").position().x, 150.0, epsilon = 1e-2);
}

#[test]
fn frame_driver_caps_catch_up_steps() {
    let mut world = PhysicsWorld::new();
    let ts = world.config().time_step;
    let body = world
        .add_body(BodyBuilder::dynamic(Shape::circle(5.0)))
        .expect("body");

    assert_eq!(world.step(50.0 * ts), 10);
    assert_eq!(world.steps_simulated(), 10);
    let vy = world.body(body).expect("body").velocity.linear.y;
    assert_relative_eq!(vy, 10.0 * 981.0 * ts, epsilon = 1e-2);

    // Excess time is dropped, not carried into the next frame.
    assert_eq!(world.step(0.0), 0);
    assert_eq!(world.steps_simulated(), 10);
}

#[test]
fn frame_driver_accumulates_partial_steps() {
    let mut world = PhysicsWorld::new();
    let ts = world.config().time_step;
    assert_eq!(world.step(ts * 0.5), 0);
    assert!(world.interpolation_alpha() > 0.4);
    assert_eq!(world.step(ts * 0.5), 1);

    world.set_simulation_enabled(false);
    assert_eq!(world.step(ts * 3.0), 0);
    assert_eq!(world.steps_simulated(), 1);
}

#[test]
fn fixed_rotation_body_never_spins() {
    let mut world = PhysicsWorld::new();
    add_floor(&mut world);
    let body = world
        .add_body(
            BodyBuilder::dynamic(Shape::cuboid(Vec2::new(20.0, 10.0)))
                .position(Vec2::new(0.0, 60.0))
                .rotation(30.0)
                .velocity(Vec2::new(50.0, 0.0))
                .angular_velocity(2.0)
                .fixed_rotation(true),
        )
        .expect("body");

    for _ in 0..90 {
        world.simulate_step();
        let state = world.body(body).expect("body");
        assert_eq!(state.rotation(), 30.0);
        assert_eq!(state.velocity.angular, 0.0);
    }
}

#[test]
fn profiler_reports_last_step() {
    let mut world = PhysicsWorld::new();
    add_floor(&mut world);
    add_box(&mut world, Vec2::new(0.0, 90.0));
    world.simulate_step();

    let profile = world.profiler();
    assert_eq!(profile.body_count, 2);
    assert_eq!(profile.collision_count, 1);
    assert_eq!(profile.collisions_started, 1);
    assert!(profile.total_step_time >= profile.detection_time);
}
