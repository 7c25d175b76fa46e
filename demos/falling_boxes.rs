use swarm_physics2d::*;

fn main() -> Result<()> {
    let mut world = PhysicsWorld::new();

    world.add_body(
        BodyBuilder::fixed(Shape::cuboid(Vec2::new(400.0, 20.0))).position(Vec2::new(0.0, 320.0)),
    )?;
    let sensor = world.add_body(
        BodyBuilder::trigger(Shape::cuboid(Vec2::new(60.0, 10.0))).position(Vec2::new(0.0, 200.0)),
    )?;

    for i in 0..6 {
        let builder = if i % 2 == 0 {
            BodyBuilder::dynamic(Shape::cuboid(Vec2::splat(15.0))).material(Material::wood())
        } else {
            BodyBuilder::dynamic(Shape::circle(12.0)).material(Material::rubber())
        };
        world.add_body(builder.position(Vec2::new(i as f32 * 8.0 - 20.0, i as f32 * -40.0)))?;
    }

    for frame in 0..180 {
        world.step(1.0 / 60.0);
        for event in world.drain_events() {
            if event.recipient() == sensor {
                println!("frame {frame}: {event:?}");
            }
        }
    }

    for body in world.bodies().filter(|b| b.is_dynamic()) {
        println!(
            "body {:?} at ({:.1}, {:.1}) rotated {:.1} deg",
            body.handle(),
            body.position().x,
            body.position().y,
            body.rotation()
        );
    }
    println!("Simulated {} steps, {} live collisions", world.steps_simulated(), world.collision_count());
    Ok(())
}
