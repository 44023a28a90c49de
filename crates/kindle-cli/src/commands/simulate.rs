//! Headless simulation command

use anyhow::{Context, Result};
use glam::Vec2;
use kindle_ecs::KindleWorld;
use kindle_particles::{EffectLibrary, ParticleConfig, ParticleSystem, SpriteAtlas};
use kindle_runtime::{run_frame, EventBus, GameClock, RuntimeSystem};
use std::cell::RefCell;
use std::rc::Rc;

pub struct SimulateArgs {
    pub file: String,
    pub effect: String,
    pub seconds: f64,
    pub frame_rate: u32,
    pub position: Vec2,
    pub angle: f32,
}

pub fn run(args: SimulateArgs) -> Result<()> {
    let source = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file))?;
    let library = EffectLibrary::from_toml_str(&source).context("Failed to parse effect file")?;
    let config = ParticleConfig::from_toml_str(&source).context("Invalid [particles] settings")?;
    let atlas = SpriteAtlas::from_toml_str(&source).context("Invalid [sprites] table")?;
    let effect = library.require(&args.effect)?;

    let events = Rc::new(RefCell::new(EventBus::new()));
    let mut clock = GameClock::with_step(config.fixed_timestep);
    let mut world = KindleWorld::new();
    let mut system = ParticleSystem::new(config)
        .with_sprites(atlas)
        .with_side_channel(Rc::clone(&events));

    system.initialize(&mut world)?;
    let handle = system.spawn_emitter(&mut world, &effect, args.position, args.angle);

    let frame_dt = 1.0 / f64::from(args.frame_rate.max(1));
    let mut peak = 0;
    let mut completed_at = None;
    let mut next_report = 0.0;

    println!("Simulating '{}' for {}s", effect.name, args.seconds);
    while clock.total_time < args.seconds {
        clock.advance(frame_dt);
        run_frame(&mut clock, &mut world, &mut system)?;

        let stats = system.stats(&world);
        peak = peak.max(stats.particles);
        if completed_at.is_none() && system.is_effect_complete(&world, handle) {
            completed_at = Some(clock.total_time);
        }
        if clock.total_time >= next_report {
            println!(
                "  t={:>6.2}s  emitters: {:<3} particles: {:<5} drawn: {}",
                clock.total_time,
                stats.emitters,
                stats.particles,
                system.instances().instances().len(),
            );
            next_report += 1.0;
        }
    }

    for event in events.borrow_mut().drain() {
        println!("  event: {event:?}");
    }
    println!("Peak particles: {peak}");
    match completed_at {
        Some(t) => println!("Effect complete at {t:.2}s"),
        None => println!("Effect still running"),
    }
    system.shutdown()?;
    Ok(())
}
