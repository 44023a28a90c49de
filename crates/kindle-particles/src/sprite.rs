//! Sprite lookup
//!
//! Effects name their image; the host supplies a [`SpriteProvider`] that maps
//! the name to a sheet handle and its cell grid.

use kindle_core::{KindleError, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

/// A sprite sheet: an opaque handle plus its cell grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteSheet {
    pub handle: u32,
    pub columns: u32,
    pub rows: u32,
}

/// Resolves image names to sprite sheets
pub trait SpriteProvider {
    fn lookup(&self, image: &str) -> Option<SpriteSheet>;
}

/// In-memory name → sheet table
#[derive(Debug, Default, Clone)]
pub struct SpriteAtlas {
    sheets: HashMap<String, SpriteSheet>,
    next_handle: u32,
}

#[derive(Deserialize)]
struct SheetEntry {
    #[serde(default = "one")]
    columns: u32,
    #[serde(default = "one")]
    rows: u32,
}

fn one() -> u32 {
    1
}

#[derive(Deserialize, Default)]
struct AtlasFile {
    #[serde(default)]
    sprites: BTreeMap<String, SheetEntry>,
}

impl SpriteAtlas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sheet, assigning the next free handle
    pub fn insert(&mut self, name: impl Into<String>, columns: u32, rows: u32) -> SpriteSheet {
        let sheet = SpriteSheet {
            handle: self.next_handle,
            columns: columns.max(1),
            rows: rows.max(1),
        };
        self.next_handle += 1;
        self.sheets.insert(name.into(), sheet);
        sheet
    }

    /// Read `[sprites.<name>]` tables with `columns` and `rows`
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let file: AtlasFile = toml::from_str(source)?;
        let mut atlas = Self::new();
        for (name, entry) in file.sprites {
            if entry.columns == 0 || entry.rows == 0 {
                return Err(KindleError::ConfigError(format!(
                    "sprite '{name}' has an empty cell grid"
                )));
            }
            atlas.insert(name, entry.columns, entry.rows);
        }
        Ok(atlas)
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

impl SpriteProvider for SpriteAtlas {
    fn lookup(&self, image: &str) -> Option<SpriteSheet> {
        self.sheets.get(image).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_sequential() {
        let mut atlas = SpriteAtlas::new();
        let a = atlas.insert("dirt", 4, 1);
        let b = atlas.insert("spark", 1, 0);
        assert_eq!(a.handle, 0);
        assert_eq!(b.handle, 1);
        assert_eq!(b.rows, 1);
        assert_eq!(atlas.lookup("dirt"), Some(a));
        assert_eq!(atlas.lookup("smoke"), None);
    }

    #[test]
    fn load_from_toml() {
        let atlas = SpriteAtlas::from_toml_str(
            r#"
[sprites.dirt]
columns = 4

[sprites.puff]
columns = 3
rows = 2
"#,
        )
        .unwrap();
        assert_eq!(atlas.len(), 2);
        let puff = atlas.lookup("puff").unwrap();
        assert_eq!((puff.columns, puff.rows), (3, 2));
        assert_eq!(atlas.lookup("dirt").unwrap().rows, 1);
    }

    #[test]
    fn empty_grid_is_rejected() {
        assert!(SpriteAtlas::from_toml_str("[sprites.bad]\ncolumns = 0").is_err());
    }
}
