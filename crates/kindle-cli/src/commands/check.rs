//! Effect file validation command

use anyhow::{bail, Context, Result};
use kindle_particles::{EffectFile, ParticleConfig};

pub fn run(file: &str) -> Result<()> {
    let source = std::fs::read_to_string(file).with_context(|| format!("Failed to read {file}"))?;
    let effects = EffectFile::from_toml_str(&source).context("Failed to parse effect file")?;
    ParticleConfig::from_toml_str(&source).context("Invalid [particles] settings")?;

    let mut problem_count = 0;
    for (name, definition) in &effects.effects {
        let problems = definition.problems();
        if problems.is_empty() {
            continue;
        }
        println!("{name}:");
        for (property, err) in &problems {
            println!("  {property}: {err}");
        }
        problem_count += problems.len();
    }

    if problem_count > 0 {
        bail!("{problem_count} problem(s) in {} effect(s)", effects.effects.len());
    }
    println!("{} effect(s) OK", effects.effects.len());
    Ok(())
}
