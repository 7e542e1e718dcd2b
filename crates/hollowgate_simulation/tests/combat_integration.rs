//! Combat integration tests
//!
//! Полный App (MinimalPlugins + SimulationPlugin), FixedUpdate
//! прогоняется вручную с детерминированным шагом 1/60 — никакого
//! wall-clock в тестах.

use std::time::Duration;

use bevy::prelude::*;

use hollowgate_simulation::*;

const TICK: f64 = 1.0 / 60.0;
const ZOMBIE_KIND: DamageableKind = DamageableKind(1);

fn create_combat_app() -> App {
    let mut app = create_headless_app();
    app.finish();
    app.cleanup();
    app
}

/// Helper: один детерминированный simulation tick
fn step(app: &mut App) {
    app.world_mut()
        .resource_mut::<Time<Fixed>>()
        .advance_by(Duration::from_secs_f64(TICK));
    app.world_mut().run_schedule(FixedUpdate);
}

fn steps(app: &mut App, count: usize) {
    for _ in 0..count {
        step(app);
    }
}

/// Helper: актор-мишень, тело = damageable-поверхность
fn spawn_target(app: &mut App, position: Vec3, hp: f32) -> Entity {
    let world = app.world_mut();
    let target = world
        .spawn((
            Actor { faction_id: 2 },
            Health::new(hp),
            Transform::from_translation(position),
            DeferredActions::default(),
        ))
        .id();
    world.entity_mut(target).insert((
        Damageable::new(ZOMBIE_KIND, target),
        DamageableCollider { radius: 0.5 },
    ));
    target
}

fn spawn_attacker(app: &mut App, position: Vec3) -> Entity {
    app.world_mut()
        .spawn((
            Actor { faction_id: 1 },
            Health::new(100.0),
            Transform::from_translation(position),
            DeferredActions::default(),
        ))
        .id()
}

fn hp(app: &App, entity: Entity) -> f32 {
    app.world().entity(entity).get::<Health>().unwrap().current()
}

#[test]
fn test_melee_hits_each_target_once_per_activation() {
    let mut app = create_combat_app();
    let attacker = spawn_attacker(&mut app, Vec3::ZERO);
    // Обе цели в hitbox'е перед атакующим (forward = -Z)
    let near = spawn_target(&mut app, Vec3::new(0.3, 0.0, -1.0), 30.0);
    let far = spawn_target(&mut app, Vec3::new(-0.3, 0.0, -1.2), 30.0);

    let knife = AttackType::new("knife", vec![AttackImpact::new(12.0, vec![ZOMBIE_KIND])]);
    let attack = app
        .world_mut()
        .spawn((
            MeleeAttack::new(knife, 0.2),
            AttackOwner { actor: attacker },
            HitBox::new(Vec3::new(0.0, 0.0, -1.0), Vec3::splat(0.8)),
        ))
        .id();

    app.world_mut().send_event(AttackTriggered { attack });
    // Окно 0.2s = 12 тиков; каждая цель страдает один раз
    steps(&mut app, 20);
    assert_eq!(hp(&app, near), 18.0);
    assert_eq!(hp(&app, far), 18.0);

    // Повторная активация бьёт снова
    app.world_mut().send_event(AttackTriggered { attack });
    steps(&mut app, 20);
    assert_eq!(hp(&app, near), 6.0);
    assert_eq!(hp(&app, far), 6.0);
}

#[test]
fn test_melee_does_not_hit_own_surfaces() {
    let mut app = create_combat_app();
    let attacker = spawn_attacker(&mut app, Vec3::ZERO);
    // Собственная damageable-поверхность атакующего внутри hitbox'а
    app.world_mut().entity_mut(attacker).insert((
        Damageable::new(ZOMBIE_KIND, attacker),
        DamageableCollider { radius: 0.5 },
    ));

    let knife = AttackType::new("knife", vec![AttackImpact::new(12.0, vec![ZOMBIE_KIND])]);
    let attack = app
        .world_mut()
        .spawn((
            MeleeAttack::new(knife, 0.2),
            AttackOwner { actor: attacker },
            HitBox::new(Vec3::ZERO, Vec3::splat(2.0)),
        ))
        .id();

    app.world_mut().send_event(AttackTriggered { attack });
    steps(&mut app, 20);
    assert_eq!(hp(&app, attacker), 100.0);
}

#[test]
fn test_overlap_rehits_at_damage_rate() {
    let mut app = create_combat_app();
    let attacker = spawn_attacker(&mut app, Vec3::ZERO);
    let victim = spawn_target(&mut app, Vec3::new(0.0, 0.0, -1.0), 100.0);

    let acid = AttackType::new("acid", vec![AttackImpact::new(5.0, vec![ZOMBIE_KIND])]);
    let attack = app
        .world_mut()
        .spawn((
            // damage_rate 0.095 → повторный удар каждые 6 тиков
            OverlapAttack::new(acid, 0.095, 1.0),
            AttackOwner { actor: attacker },
            HitBox::new(Vec3::new(0.0, 0.0, -1.0), Vec3::splat(1.0)),
        ))
        .id();

    app.world_mut().send_event(AttackTriggered { attack });
    // 30 тиков = 0.5s: удары на elapsed 0.0/0.1/0.2/0.3/0.4 → 5 попаданий
    steps(&mut app, 30);
    assert_eq!(hp(&app, victim), 75.0);

    // Окно закрывается на duration 1.0
    steps(&mut app, 60);
    let after_expiry = hp(&app, victim);
    steps(&mut app, 30);
    assert_eq!(hp(&app, victim), after_expiry);
    assert!(!app.world().resource::<Events<AttackEnded>>().is_empty());
}

#[test]
fn test_overlap_zero_duration_single_pulse() {
    let mut app = create_combat_app();
    let attacker = spawn_attacker(&mut app, Vec3::ZERO);
    let victim = spawn_target(&mut app, Vec3::new(0.0, 0.0, -1.0), 100.0);

    let burst = AttackType::new("burst", vec![AttackImpact::new(10.0, vec![ZOMBIE_KIND])]);
    let attack = app
        .world_mut()
        .spawn((
            OverlapAttack::new(burst, 0.05, 0.0),
            AttackOwner { actor: attacker },
            HitBox::new(Vec3::new(0.0, 0.0, -1.0), Vec3::splat(1.0)),
        ))
        .id();

    app.world_mut().send_event(AttackTriggered { attack });
    steps(&mut app, 30);
    assert_eq!(hp(&app, victim), 90.0);
}

#[test]
fn test_shot_penetration_nearest_first() {
    let mut app = create_combat_app();
    let shooter = spawn_attacker(&mut app, Vec3::ZERO);
    // Spawn в перемешанном порядке: сортировка по дистанции, не по id
    let far = spawn_target(&mut app, Vec3::new(0.0, 0.0, -8.0), 30.0);
    let near = spawn_target(&mut app, Vec3::new(0.0, 0.0, -3.0), 30.0);
    let mid = spawn_target(&mut app, Vec3::new(0.0, 0.0, -5.0), 30.0);

    let rifle = AttackType::new("rifle", vec![AttackImpact::new(10.0, vec![ZOMBIE_KIND])]);
    let attack = app
        .world_mut()
        .spawn((
            ShotAttack::new(rifle, 50.0).with_penetration(2),
            AttackOwner { actor: shooter },
        ))
        .id();

    app.world_mut().send_event(AttackTriggered { attack });
    steps(&mut app, 2);

    // Пробиты две ближайшие цели, дальняя не тронута
    assert_eq!(hp(&app, near), 20.0);
    assert_eq!(hp(&app, mid), 20.0);
    assert_eq!(hp(&app, far), 30.0);
}

#[test]
fn test_shot_empty_magazine_not_started() {
    let mut app = create_combat_app();
    let shooter = spawn_attacker(&mut app, Vec3::ZERO);
    let victim = spawn_target(&mut app, Vec3::new(0.0, 0.0, -3.0), 30.0);

    let pistol = AttackType::new("pistol", vec![AttackImpact::new(10.0, vec![ZOMBIE_KIND])]);
    let attack = app
        .world_mut()
        .spawn((
            ShotAttack::new(pistol, 50.0).with_rounds(1),
            AttackOwner { actor: shooter },
        ))
        .id();

    app.world_mut().send_event(AttackTriggered { attack });
    steps(&mut app, 2);
    assert_eq!(hp(&app, victim), 20.0);
    assert!(app.world().resource::<Events<AttackNotStarted>>().is_empty());

    // Магазин пуст: осечка вместо выстрела
    app.world_mut().send_event(AttackTriggered { attack });
    steps(&mut app, 2);
    assert_eq!(hp(&app, victim), 20.0);
    assert!(!app.world().resource::<Events<AttackNotStarted>>().is_empty());
}

#[test]
fn test_shell_kick_deferred_after_shot() {
    let mut app = create_combat_app();
    let shooter = spawn_attacker(&mut app, Vec3::ZERO);

    let shotgun = AttackType::new("shotgun", vec![AttackImpact::new(25.0, vec![ZOMBIE_KIND])]);
    let attack = app
        .world_mut()
        .spawn((
            ShotAttack::new(shotgun, 50.0).with_shell_kick(0.1),
            AttackOwner { actor: shooter },
        ))
        .id();

    app.world_mut().send_event(AttackTriggered { attack });
    steps(&mut app, 2);
    assert!(app.world().resource::<Events<ShellKicked>>().is_empty());

    // 0.1s = 6 тиков после выстрела
    steps(&mut app, 8);
    assert!(!app.world().resource::<Events<ShellKicked>>().is_empty());
}

#[test]
fn test_death_routes_to_dead_state() {
    let mut app = create_combat_app();
    let attacker = spawn_attacker(&mut app, Vec3::ZERO);
    let victim = spawn_target(&mut app, Vec3::new(0.0, 0.0, -1.0), 10.0);

    // Машина жертвы: idle + dead (по тегу)
    let mut builder = ActorStateMachine::builder();
    let idle = builder.reserve();
    builder.insert(
        idle,
        actor::IdleState::new(StateSpec::new(), idle, None),
    );
    builder.add(actor::DeadState::new(
        StateSpec::new().with_tag(actor::TAG_DEAD).skip_previous_exit(),
    ));
    app.world_mut().entity_mut(victim).insert(builder.build(idle));

    let axe = AttackType::new("axe", vec![AttackImpact::new(50.0, vec![ZOMBIE_KIND])]);
    let attack = app
        .world_mut()
        .spawn((
            MeleeAttack::new(axe, 0.2),
            AttackOwner { actor: attacker },
            HitBox::new(Vec3::new(0.0, 0.0, -1.0), Vec3::splat(1.0)),
        ))
        .id();

    steps(&mut app, 2); // машина вошла в idle
    app.world_mut().send_event(AttackTriggered { attack });
    steps(&mut app, 5);

    let machine = app
        .world()
        .entity(victim)
        .get::<ActorStateMachine>()
        .unwrap();
    assert_eq!(machine.current_name(), Some("Dead"));
    assert!(app.world().entity(victim).get::<Health>().unwrap().is_dead());
}

#[test]
fn test_knockback_effect_drives_state_machine() {
    let mut app = create_combat_app();
    let attacker = spawn_attacker(&mut app, Vec3::ZERO);
    let victim = spawn_target(&mut app, Vec3::new(0.0, 0.0, -1.0), 100.0);

    let mut builder = ActorStateMachine::builder();
    let idle = builder.reserve();
    builder.insert(idle, actor::IdleState::new(StateSpec::new(), idle, None));
    builder.add(actor::KnockbackState::new(
        StateSpec::new()
            .with_tag(actor::TAG_KNOCKBACK)
            .skip_previous_exit(),
        5.0,
        0.3,
        idle,
    ));
    app.world_mut().entity_mut(victim).insert(builder.build(idle));

    let bash = AttackType::new(
        "bash",
        vec![AttackImpact::new(5.0, vec![ZOMBIE_KIND]).with_post_effect(KnockbackEffect)],
    );
    let attack = app
        .world_mut()
        .spawn((
            MeleeAttack::new(bash, 0.1),
            AttackOwner { actor: attacker },
            HitBox::new(Vec3::new(0.0, 0.0, -1.0), Vec3::splat(1.0)),
        ))
        .id();

    steps(&mut app, 2);
    app.world_mut().send_event(AttackTriggered { attack });
    steps(&mut app, 3);

    let machine = app
        .world()
        .entity(victim)
        .get::<ActorStateMachine>()
        .unwrap();
    assert_eq!(machine.current_name(), Some("Knockback"));
    assert!(matches!(
        app.world().entity(victim).get::<MovementCommand>(),
        Some(MovementCommand::Impulse { .. })
    ));

    // Импульс затухает → возврат в idle
    steps(&mut app, 120);
    let machine = app
        .world()
        .entity(victim)
        .get::<ActorStateMachine>()
        .unwrap();
    assert_eq!(machine.current_name(), Some("Idle"));
}

#[test]
fn test_pause_freezes_combat_window() {
    let mut app = create_combat_app();
    let attacker = spawn_attacker(&mut app, Vec3::ZERO);
    let victim = spawn_target(&mut app, Vec3::new(0.0, 0.0, -1.0), 100.0);

    let acid = AttackType::new("acid", vec![AttackImpact::new(5.0, vec![ZOMBIE_KIND])]);
    let attack = app
        .world_mut()
        .spawn((
            OverlapAttack::new(acid, 0.095, 1.0),
            AttackOwner { actor: attacker },
            HitBox::new(Vec3::new(0.0, 0.0, -1.0), Vec3::splat(1.0)),
        ))
        .id();

    app.world_mut().send_event(AttackTriggered { attack });
    step(&mut app); // первый импульс
    assert_eq!(hp(&app, victim), 95.0);

    app.world_mut().resource_mut::<PauseController>().pause();
    steps(&mut app, 60);
    // На паузе окно заморожено, повторных ударов нет
    assert_eq!(hp(&app, victim), 95.0);

    app.world_mut().resource_mut::<PauseController>().resume();
    steps(&mut app, 10);
    assert!(hp(&app, victim) < 95.0);
}

#[test]
fn test_unscaled_continuation_fires_during_pause() {
    let mut app = create_combat_app();
    let attacker = spawn_attacker(&mut app, Vec3::ZERO);
    let victim = spawn_target(&mut app, Vec3::new(0.0, 0.0, -1.0), 100.0);

    let trap = AttackType::new("trap", vec![AttackImpact::new(10.0, vec![ZOMBIE_KIND])]);
    let attack = app
        .world_mut()
        .spawn((
            OverlapAttack::new(trap, 1.0, 0.0),
            AttackOwner { actor: attacker },
            HitBox::new(Vec3::new(0.0, 0.0, -1.0), Vec3::splat(1.0)),
        ))
        .id();

    app.world_mut().resource_mut::<PauseController>().pause();
    app.world_mut()
        .entity_mut(attacker)
        .get_mut::<DeferredActions>()
        .unwrap()
        .schedule(
            None,
            "trap",
            0.1,
            ClockKind::Unscaled,
            DeferredAction::TriggerAttack(attack),
        );

    // Unscaled таймер идёт и на паузе, но сама атака на паузе не тикает
    steps(&mut app, 30);
    assert_eq!(hp(&app, victim), 100.0);
    let world = app.world();
    assert!(world
        .entity(attacker)
        .get::<DeferredActions>()
        .unwrap()
        .is_empty());

    // Сняли паузу: событие уже в очереди, зона бьёт
    app.world_mut().resource_mut::<PauseController>().resume();
    steps(&mut app, 5);
    assert_eq!(hp(&app, victim), 90.0);
}
