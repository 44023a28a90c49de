//! Effect listing command

use anyhow::{Context, Result};
use kindle_particles::EffectLibrary;

pub fn run(file: &str) -> Result<()> {
    let library = EffectLibrary::load(file).with_context(|| format!("Failed to load {file}"))?;

    if library.is_empty() {
        println!("No effects in {file}");
        return Ok(());
    }

    for name in library.names() {
        let effect = library.require(name)?;
        let duration = if effect.is_indefinite() {
            "indefinite".to_string()
        } else {
            let (lo, hi) = effect.system_duration.bounds();
            if lo == hi {
                format!("{hi}s")
            } else {
                format!("{lo}-{hi}s")
            }
        };
        println!(
            "{name:<24} duration: {duration:<12} fields: {:<3} image: {}",
            effect.fields.len(),
            effect.image.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}
