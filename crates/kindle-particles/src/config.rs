//! System-wide particle settings, read from a `[particles]` table

use kindle_core::{KindleError, Result};

/// Hard ceiling on simultaneously live particles
pub const MAX_PARTICLES_LIMIT: usize = 10000;

#[derive(Debug, Clone, PartialEq)]
pub struct ParticleConfig {
    /// Seed for the simulation RNG
    pub seed: u64,
    /// Spawns beyond this many live particles are dropped
    pub max_particles: usize,
    /// Seconds per simulation tick
    pub fixed_timestep: f64,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            seed: 0x4B49_4E44,
            max_particles: 2048,
            fixed_timestep: 0.01,
        }
    }
}

impl ParticleConfig {
    pub fn from_toml(table: &toml::value::Table) -> Result<Self> {
        let mut config = Self::default();

        if let Some(v) = table.get("seed") {
            config.seed = v
                .as_integer()
                .ok_or_else(|| KindleError::ConfigError("seed must be an integer".into()))?
                as u64;
        }
        if let Some(v) = table.get("max_particles") {
            let n = v.as_integer().unwrap_or(0).max(0) as usize;
            config.max_particles = n.min(MAX_PARTICLES_LIMIT);
        }
        if let Some(v) = table.get("fixed_timestep") {
            let step = toml_f64(v, config.fixed_timestep);
            if step <= 0.0 {
                return Err(KindleError::ConfigError(format!(
                    "fixed_timestep must be positive, got {step}"
                )));
            }
            config.fixed_timestep = step;
        }

        Ok(config)
    }

    /// Read the `[particles]` table of a document; other tables are ignored
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let doc: toml::value::Table = toml::from_str(source)?;
        match doc.get("particles") {
            Some(toml::Value::Table(table)) => Self::from_toml(table),
            Some(_) => Err(KindleError::ConfigError("[particles] must be a table".into())),
            None => Ok(Self::default()),
        }
    }
}

fn toml_f64(v: &toml::Value, default: f64) -> f64 {
    v.as_float()
        .or_else(|| v.as_integer().map(|i| i as f64))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_table_gives_defaults() {
        let config = ParticleConfig::from_toml_str("[effects.a]\nspawn_rate = 1").unwrap();
        assert_eq!(config, ParticleConfig::default());
    }

    #[test]
    fn reads_particles_table() {
        let config = ParticleConfig::from_toml_str(
            r#"
[particles]
seed = 42
max_particles = 500
fixed_timestep = 0.02
"#,
        )
        .unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.max_particles, 500);
        assert!((config.fixed_timestep - 0.02).abs() < 1e-12);
    }

    #[test]
    fn max_particles_is_clamped() {
        let config = ParticleConfig::from_toml_str("[particles]\nmax_particles = 999999").unwrap();
        assert_eq!(config.max_particles, MAX_PARTICLES_LIMIT);
    }

    #[test]
    fn integer_timestep_is_accepted() {
        let config = ParticleConfig::from_toml_str("[particles]\nfixed_timestep = 1").unwrap();
        assert_eq!(config.fixed_timestep, 1.0);
    }

    #[test]
    fn bad_values_are_errors() {
        assert!(ParticleConfig::from_toml_str("[particles]\nfixed_timestep = 0").is_err());
        assert!(ParticleConfig::from_toml_str("[particles]\nseed = \"x\"").is_err());
        assert!(ParticleConfig::from_toml_str("particles = 3").is_err());
    }
}
