//! KindleWorld - ECS world with stable IDs

use bimap::BiMap;
use kindle_core::{EntityId, IdAllocator, KindleError, Result};

/// The entity store for Kindle
///
/// Wraps hecs::World with:
/// - Stable EntityId mapping (IDs are never reused)
/// - Idempotent destruction
/// - Component-kind queries that yield the stable ID alongside the data
///
/// Every entity carries its own `EntityId` as a component, so queries can
/// ask for `&EntityId` to learn which entity a row belongs to.
pub struct KindleWorld {
    /// The underlying hecs world
    world: hecs::World,
    /// Bidirectional mapping: EntityId <-> hecs::Entity
    id_map: BiMap<EntityId, hecs::Entity>,
    /// Per-world ID source
    ids: IdAllocator,
}

impl Default for KindleWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl KindleWorld {
    /// Create a new empty world
    pub fn new() -> Self {
        Self {
            world: hecs::World::new(),
            id_map: BiMap::new(),
            ids: IdAllocator::new(),
        }
    }

    /// Create an entity with no components besides its ID
    pub fn spawn(&mut self) -> EntityId {
        let id = self.ids.allocate();
        let hecs_entity = self.world.spawn((id,));
        self.id_map.insert(id, hecs_entity);
        id
    }

    /// Create an entity and attach one component in a single step
    pub fn spawn_with<C: hecs::Component>(&mut self, component: C) -> EntityId {
        let id = self.ids.allocate();
        let hecs_entity = self.world.spawn((id, component));
        self.id_map.insert(id, hecs_entity);
        id
    }

    /// Despawn an entity
    pub fn despawn(&mut self, id: EntityId) -> Result<()> {
        let hecs_entity = self
            .id_map
            .get_by_left(&id)
            .copied()
            .ok_or_else(|| KindleError::EntityNotFound(id.to_string()))?;

        self.world
            .despawn(hecs_entity)
            .map_err(|_| KindleError::EntityNotFound(id.to_string()))?;

        self.id_map.remove_by_left(&id);
        Ok(())
    }

    /// Despawn an entity if it still exists. Returns whether anything was removed.
    pub fn despawn_if_present(&mut self, id: EntityId) -> bool {
        self.despawn(id).is_ok()
    }

    /// Attach (or replace) a component on an entity
    pub fn insert<C: hecs::Component>(&mut self, id: EntityId, component: C) -> Result<()> {
        let hecs_entity = self.resolve(id)?;
        self.world
            .insert_one(hecs_entity, component)
            .map_err(|_| KindleError::EntityNotFound(id.to_string()))
    }

    /// Detach a component from an entity, returning it
    pub fn remove<C: hecs::Component>(&mut self, id: EntityId) -> Result<C> {
        let hecs_entity = self.resolve(id)?;
        self.world
            .remove_one::<C>(hecs_entity)
            .map_err(|_| KindleError::ComponentNotFound(std::any::type_name::<C>().to_string()))
    }

    /// Borrow a component on an entity
    pub fn get<C: hecs::Component>(&self, id: EntityId) -> Option<hecs::Ref<'_, C>> {
        let hecs_entity = *self.id_map.get_by_left(&id)?;
        self.world.get::<&C>(hecs_entity).ok()
    }

    /// Mutably borrow a component on an entity
    pub fn get_mut<C: hecs::Component>(&mut self, id: EntityId) -> Option<hecs::RefMut<'_, C>> {
        let hecs_entity = *self.id_map.get_by_left(&id)?;
        self.world.get::<&mut C>(hecs_entity).ok()
    }

    /// Check if an entity carries a component of kind `C`
    pub fn has<C: hecs::Component>(&self, id: EntityId) -> bool {
        self.id_map
            .get_by_left(&id)
            .is_some_and(|entity| self.entity_has::<C>(*entity))
    }

    /// Query entities by component kinds
    pub fn query<Q: hecs::Query>(&self) -> hecs::QueryBorrow<'_, Q> {
        self.world.query::<Q>()
    }

    /// Query entities by component kinds with exclusive access
    pub fn query_mut<Q: hecs::Query>(&mut self) -> hecs::QueryMut<'_, Q> {
        self.world.query_mut::<Q>()
    }

    /// IDs of every entity carrying a component of kind `C`, in creation order
    pub fn ids_with<C: hecs::Component>(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self
            .id_map
            .iter()
            .filter(|(_, entity)| self.entity_has::<C>(**entity))
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Number of entities carrying a component of kind `C`
    pub fn count_with<C: hecs::Component>(&self) -> usize {
        self.id_map
            .right_values()
            .filter(|entity| self.entity_has::<C>(**entity))
            .count()
    }

    /// Check if an entity exists
    pub fn contains(&self, id: EntityId) -> bool {
        self.id_map.contains_left(&id)
    }

    /// Get number of entities
    pub fn entity_count(&self) -> usize {
        self.id_map.len()
    }

    /// Clear the world. Issued IDs are not reused afterwards.
    pub fn clear(&mut self) {
        self.world.clear();
        self.id_map.clear();
    }

    fn entity_has<C: hecs::Component>(&self, entity: hecs::Entity) -> bool {
        self.world
            .entity(entity)
            .map(|entity_ref| entity_ref.has::<C>())
            .unwrap_or(false)
    }

    fn resolve(&self, id: EntityId) -> Result<hecs::Entity> {
        self.id_map
            .get_by_left(&id)
            .copied()
            .ok_or_else(|| KindleError::EntityNotFound(id.to_string()))
    }
}
