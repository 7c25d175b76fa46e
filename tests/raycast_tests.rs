use approx::assert_relative_eq;
use swarm_physics2d::{BodyBuilder, BodyHandle, PhysicsWorld, Ray, Shape, Vec2, WorldConfig};

fn world() -> PhysicsWorld {
    PhysicsWorld::with_config(WorldConfig::default().with_gravity(Vec2::ZERO)).expect("valid config")
}

fn add(world: &mut PhysicsWorld, builder: BodyBuilder) -> BodyHandle {
    world.add_body(builder).expect("valid body")
}

#[test]
fn raycast_hits_nearest_and_skips_triggers() {
    let mut world = world();
    let floor = add(
        &mut world,
        BodyBuilder::fixed(Shape::cuboid(Vec2::new(300.0, 10.0))).position(Vec2::new(0.0, 200.0)),
    );
    let ball = add(
        &mut world,
        BodyBuilder::dynamic(Shape::circle(8.0)).position(Vec2::new(0.0, 100.0)),
    );
    add(
        &mut world,
        BodyBuilder::trigger(Shape::circle(20.0)).position(Vec2::new(0.0, 40.0)),
    );

    let down = Ray::new(Vec2::ZERO, Vec2::new(0.0, 1.0));
    let hit = world.raycast(down, 500.0).expect("ball below the origin");
    assert_eq!(hit.body, ball);
    assert_relative_eq!(hit.distance, 92.0, epsilon = 1e-3);
    assert_relative_eq!(hit.point.y, 92.0, epsilon = 1e-3);
    assert_relative_eq!(hit.normal.y, -1.0, epsilon = 1e-4);

    world.remove_body(ball).expect("live ball");
    let hit = world.raycast(down, 500.0).expect("floor below the origin");
    assert_eq!(hit.body, floor);
    assert_relative_eq!(hit.point.y, 190.0, epsilon = 1e-3);

    assert!(world.raycast(down, 150.0).is_none());
    assert!(world.raycast(Ray::new(Vec2::ZERO, Vec2::new(0.0, -1.0)), 500.0).is_none());
}

#[test]
fn raycast_sees_bodies_moved_since_the_last_step() {
    let mut world = world();
    let target = add(&mut world, BodyBuilder::fixed(Shape::circle(10.0)));
    world.simulate_step();

    world.set_position(target, Vec2::new(300.0, 0.0)).expect("live body");
    let hit = world
        .raycast(Ray::new(Vec2::ZERO, Vec2::new(1.0, 0.0)), 1000.0)
        .expect("moved target");
    assert_eq!(hit.body, target);
    assert_relative_eq!(hit.distance, 290.0, epsilon = 1e-3);
}

#[test]
fn query_near_uses_exact_shapes() {
    let mut world = world();
    let close = add(
        &mut world,
        BodyBuilder::dynamic(Shape::circle(5.0)).position(Vec2::new(20.0, 0.0)),
    );
    // Bounding box reaches the query point, the circle itself does not.
    add(
        &mut world,
        BodyBuilder::dynamic(Shape::circle(10.0)).position(Vec2::new(30.0, 30.0)),
    );
    let trigger = add(
        &mut world,
        BodyBuilder::trigger(Shape::cuboid(Vec2::splat(5.0))).position(Vec2::new(-20.0, 0.0)),
    );

    let found = world.query_bodies_near(Vec2::ZERO, 30.0, false);
    assert_eq!(found, vec![close]);

    let mut found = world.query_bodies_near(Vec2::ZERO, 30.0, true);
    found.sort_by_key(|h| h.index());
    assert_eq!(found, vec![close, trigger]);

    assert!(world.query_bodies_near(Vec2::new(5000.0, 5000.0), 10.0, true).is_empty());
}

#[test]
fn large_query_collects_whole_cells() {
    let mut world = world();
    let handles: Vec<_> = (0..10)
        .map(|i| {
            add(
                &mut world,
                BodyBuilder::fixed(Shape::circle(4.0)).position(Vec2::new(i as f32 * 20.0 - 100.0, 10.0)),
            )
        })
        .collect();

    let mut found = world.query_bodies_near(Vec2::ZERO, 1000.0, false);
    found.sort_by_key(|h| h.index());
    assert_eq!(found, handles);
}

#[test]
fn point_inside_follows_the_current_transform() {
    let mut world = world();
    let body = add(
        &mut world,
        BodyBuilder::fixed(Shape::cuboid(Vec2::new(10.0, 5.0))),
    );
    assert!(world.is_point_inside(body, Vec2::new(9.0, 4.0)).expect("live body"));

    world.set_rotation(body, 90.0).expect("live body");
    assert!(!world.is_point_inside(body, Vec2::new(9.0, 4.0)).expect("live body"));
    assert!(world.is_point_inside(body, Vec2::new(4.0, 9.0)).expect("live body"));

    world.remove_body(body).expect("live body");
    assert!(world.is_point_inside(body, Vec2::ZERO).is_err());
}

#[test]
fn point_queries_handle_polygons_away_from_the_origin() {
    let mut world = world();
    let square = add(
        &mut world,
        BodyBuilder::fixed(Shape::polygon(vec![
            Vec2::new(10.0, 10.0),
            Vec2::new(12.0, 10.0),
            Vec2::new(12.0, 12.0),
            Vec2::new(10.0, 12.0),
        ])),
    );
    assert!(world.is_point_inside(square, Vec2::new(11.0, 11.0)).expect("live body"));
    assert!(!world.is_point_inside(square, Vec2::ZERO).expect("live body"));
    assert_eq!(world.body_at_point(Vec2::new(11.0, 11.0), false), Some(square));
    assert_eq!(world.body_at_point(Vec2::new(1.0, 1.0), false), None);

    let hit = world
        .raycast(Ray::new(Vec2::new(0.0, 11.0), Vec2::new(1.0, 0.0)), 100.0)
        .expect("square on the ray");
    assert_eq!(hit.body, square);
    assert_relative_eq!(hit.distance, 10.0, epsilon = 1e-3);
    assert_relative_eq!(hit.normal.x, -1.0, epsilon = 1e-4);
}

#[test]
fn body_at_point_skips_triggers_unless_asked() {
    let mut world = world();
    let trigger = add(
        &mut world,
        BodyBuilder::trigger(Shape::circle(5.0)).position(Vec2::new(40.0, 0.0)),
    );
    assert_eq!(world.body_at_point(Vec2::new(41.0, 0.0), false), None);
    assert_eq!(world.body_at_point(Vec2::new(41.0, 0.0), true), Some(trigger));

    world.set_position(trigger, Vec2::new(-40.0, 0.0)).expect("live trigger");
    assert_eq!(world.body_at_point(Vec2::new(-41.0, 0.0), true), Some(trigger));
}
