//! Instance packing for batched sprite draws

use crate::particle::Particle;
use bytemuck::{Pod, Zeroable};
use kindle_ecs::KindleWorld;

/// Per-particle instance data: 48 bytes, three rows of vec4.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct SpriteInstance {
    pub pos_scale_rot: [f32; 4], // xy = position, z = scale, w = rotation (degrees)
    pub color: [f32; 4],         // rgba, brightness and emitter alpha applied
    pub cell: [f32; 4],          // x = frame, y = row, z = columns, w = rows
}

impl SpriteInstance {
    /// `None` when the particle has nothing to draw
    pub fn from_particle(p: &Particle) -> Option<Self> {
        let sheet = p.sprite.sheet?;
        let color = p.tint();
        if color.a <= 0.0 {
            return None;
        }
        let pos = p.position();
        Some(Self {
            pos_scale_rot: [pos.x, pos.y, p.scale, p.rotation],
            color: color.to_array(),
            cell: [
                p.sprite.frame as f32,
                p.sprite.row as f32,
                sheet.columns as f32,
                sheet.rows as f32,
            ],
        })
    }
}

/// A run of instances that share one sprite sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteBatch {
    pub handle: u32,
    pub start: usize,
    pub count: usize,
}

/// Packed instances grouped by sheet
#[derive(Debug, Default)]
pub struct InstanceBuffer {
    instances: Vec<SpriteInstance>,
    batches: Vec<SpriteBatch>,
}

impl InstanceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repack from every live particle in `world`
    pub fn pack(&mut self, world: &KindleWorld) {
        self.instances.clear();
        self.batches.clear();

        let mut drawable: Vec<(u32, SpriteInstance)> = world
            .ids_with::<Particle>()
            .into_iter()
            .filter_map(|id| {
                let p = world.get::<Particle>(id)?;
                let handle = p.sprite.sheet?.handle;
                SpriteInstance::from_particle(&p).map(|inst| (handle, inst))
            })
            .collect();
        // Stable: creation order is kept within each sheet
        drawable.sort_by_key(|(handle, _)| *handle);

        for (handle, instance) in drawable {
            match self.batches.last_mut() {
                Some(batch) if batch.handle == handle => batch.count += 1,
                _ => self.batches.push(SpriteBatch {
                    handle,
                    start: self.instances.len(),
                    count: 1,
                }),
            }
            self.instances.push(instance);
        }
    }

    pub fn instances(&self) -> &[SpriteInstance] {
        &self.instances
    }

    pub fn batches(&self) -> &[SpriteBatch] {
        &self.batches
    }

    /// Raw bytes for upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }

    /// Instances of one batch
    pub fn batch_instances(&self, batch: &SpriteBatch) -> &[SpriteInstance] {
        &self.instances[batch.start..batch.start + batch.count]
    }
}
