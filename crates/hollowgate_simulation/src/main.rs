//! Headless demo: игрок закалывает зомби ножом.
//!
//! Запуск: cargo run -p hollowgate_simulation

use std::time::Duration;

use bevy::prelude::*;

use hollowgate_simulation::*;

const TICK: f64 = 1.0 / 60.0;

fn main() {
    let mut app = create_headless_app();
    app.finish();
    app.cleanup();

    let world = app.world_mut();

    // Зомби: тело само является damageable-поверхностью
    let zombie = world
        .spawn((
            Actor { faction_id: 2 },
            Health::new(30.0),
            Transform::from_xyz(0.0, 0.0, 1.5),
            DeferredActions::default(),
        ))
        .id();
    world.entity_mut(zombie).insert((
        Damageable::new(DamageableKind(1), zombie),
        DamageableCollider { radius: 0.5 },
    ));

    let player = world
        .spawn((
            Actor { faction_id: 1 },
            Health::new(100.0),
            Transform::from_xyz(0.0, 0.0, 0.0),
            DeferredActions::default(),
        ))
        .id();

    // Нож: melee-атака с коротким окном перед игроком
    let knife_type = AttackType::new(
        "knife",
        vec![AttackImpact::new(12.0, vec![DamageableKind(1)])],
    );
    let knife = world
        .spawn((
            MeleeAttack::new(knife_type, 0.2),
            AttackOwner { actor: player },
            HitBox::new(Vec3::new(0.0, 0.0, 1.0), Vec3::splat(0.8)),
        ))
        .id();

    // Машина игрока: idle ↔ attacking
    let mut builder = ActorStateMachine::builder();
    let idle = builder.reserve();
    let attacking = builder.reserve();
    builder.insert(
        idle,
        actor::IdleState::new(
            StateSpec::new().with_animation(AnimHandle::from_name("Idle")),
            idle,
            None,
        ),
    );
    builder.insert(
        attacking,
        actor::AttackingState::new(
            StateSpec::new().with_animation(AnimHandle::from_name("Slash")),
            0.6,
            knife,
            idle,
        ),
    );
    let machine = builder.build(idle);
    world.entity_mut(player).insert(machine);

    log_info("Demo started: player vs zombie");

    for tick in 0..600 {
        // Каждые 1.5 секунды — удар ножом
        if tick % 90 == 0 && tick > 0 {
            if let Some(mut machine) = app
                .world_mut()
                .entity_mut(player)
                .get_mut::<ActorStateMachine>()
            {
                machine.set_state(attacking);
            }
        }

        app.world_mut()
            .resource_mut::<Time<Fixed>>()
            .advance_by(Duration::from_secs_f64(TICK));
        app.world_mut().run_schedule(FixedUpdate);

        if tick % 60 == 0 {
            if let Some(health) = app.world().entity(zombie).get::<Health>() {
                log_info(&format!(
                    "t={:.1}s zombie hp {:.0}/{:.0}{}",
                    tick as f64 * TICK,
                    health.current(),
                    health.max(),
                    if health.is_dead() { " (dead)" } else { "" },
                ));
            }
        }

        if let Some(health) = app.world().entity(zombie).get::<Health>() {
            if health.is_dead() {
                log_info(&format!("Zombie down after {:.1}s", tick as f64 * TICK));
                break;
            }
        }
    }
}
