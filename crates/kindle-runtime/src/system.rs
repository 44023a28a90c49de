//! Systems driven by the game loop

use crate::clock::GameClock;
use kindle_core::Result;
use kindle_ecs::KindleWorld;

/// A system ticked by the game loop
///
/// `fixed_update` carries the simulation and runs once per accumulated fixed
/// step; `update` runs once per rendered frame.
pub trait RuntimeSystem {
    fn name(&self) -> &str;

    fn initialize(&mut self, _world: &mut KindleWorld) -> Result<()> {
        Ok(())
    }

    fn fixed_update(&mut self, world: &mut KindleWorld, dt: f64) -> Result<()>;

    fn update(&mut self, _world: &mut KindleWorld, _dt: f64) -> Result<()> {
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Run one frame: every fixed step the clock has accumulated, then `update` once.
/// Returns the number of fixed steps taken.
pub fn run_frame(
    clock: &mut GameClock,
    world: &mut KindleWorld,
    system: &mut dyn RuntimeSystem,
) -> Result<u32> {
    let mut steps = 0;
    while clock.should_fixed_update() {
        system.fixed_update(world, clock.fixed_timestep)?;
        clock.consume_fixed_step();
        steps += 1;
    }
    system.update(world, clock.delta_time)?;
    Ok(steps)
}
