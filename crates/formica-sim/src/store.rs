//! Entity store: hecs world plus id map, tag index and cell occupancy.
//!
//! Every structural change (spawn, despawn, move, retype) goes through
//! [`EntityStore`] so the tag sets and the occupancy grid are maintained
//! incrementally and never rebuilt by scanning the world.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use hecs::{Component, EntityBuilder, World};

use formica_core::components::{Body, Segments};
use formica_core::enums::{EntityKind, Tag};
use formica_core::types::{EntityId, GridBounds, GridPos};

/// `Tag -> ids`, iterated in id order.
#[derive(Debug, Default, Clone)]
pub struct TagIndex {
    sets: BTreeMap<Tag, BTreeSet<EntityId>>,
}

impl TagIndex {
    /// Returns true if the id was not already tagged.
    pub fn insert(&mut self, tag: Tag, id: EntityId) -> bool {
        self.sets.entry(tag).or_default().insert(id)
    }

    pub fn remove(&mut self, tag: Tag, id: EntityId) -> bool {
        self.sets.get_mut(&tag).is_some_and(|set| set.remove(&id))
    }

    pub fn contains(&self, tag: Tag, id: EntityId) -> bool {
        self.sets.get(&tag).is_some_and(|set| set.contains(&id))
    }

    /// Snapshot of the ids carrying `tag`.
    pub fn ids(&self, tag: Tag) -> Vec<EntityId> {
        self.sets
            .get(&tag)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn len(&self, tag: Tag) -> usize {
        self.sets.get(&tag).map_or(0, |set| set.len())
    }

    pub fn remove_all(&mut self, id: EntityId) {
        for set in self.sets.values_mut() {
            set.remove(&id);
        }
    }
}

pub struct EntityStore {
    world: World,
    ids: BTreeMap<EntityId, hecs::Entity>,
    tags: TagIndex,
    occupancy: HashMap<GridPos, Vec<EntityId>>,
    bounds: GridBounds,
    next_id: u32,
    /// Ids that joined the actor set since the last drain.
    new_actors: Vec<EntityId>,
    stale_tiles: BTreeSet<EntityId>,
}

impl EntityStore {
    pub fn new(bounds: GridBounds) -> Self {
        Self {
            world: World::new(),
            ids: BTreeMap::new(),
            tags: TagIndex::default(),
            occupancy: HashMap::new(),
            bounds,
            next_id: 1,
            new_actors: Vec::new(),
            stale_tiles: BTreeSet::new(),
        }
    }

    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn tags(&self) -> &TagIndex {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.ids.contains_key(&id)
    }

    /// All live ids in ascending order.
    pub fn ids(&self) -> Vec<EntityId> {
        self.ids.keys().copied().collect()
    }

    pub fn tagged(&self, tag: Tag) -> Vec<EntityId> {
        self.tags.ids(tag)
    }

    pub fn has_tag(&self, id: EntityId, tag: Tag) -> bool {
        self.tags.contains(tag, id)
    }

    /// Spawn a built entity. `builder` must contain a [`Body`].
    pub fn spawn(&mut self, mut builder: EntityBuilder, tags: &[Tag]) -> Option<EntityId> {
        let built = builder.build();
        let id = self.next_id;
        let entity = self.world.spawn(built);
        let body = self.world.get::<&mut Body>(entity).ok().map(|mut body| {
            body.id = EntityId(id);
            body.clone()
        });
        let Some(body) = body else {
            let _ = self.world.despawn(entity);
            return None;
        };
        self.next_id += 1;
        let id = EntityId(id);
        self.ids.insert(id, entity);
        for tag in tags {
            self.tags.insert(*tag, id);
        }
        for cell in footprint(&body, None) {
            self.occupy(cell, id);
        }
        self.mark_tiles_around(&body);
        Some(id)
    }

    /// Remove an entity and every index entry pointing at it.
    pub fn despawn(&mut self, id: EntityId) -> Option<Body> {
        let entity = self.ids.remove(&id)?;
        let body = self.world.get::<&Body>(entity).ok().map(|b| (*b).clone());
        let segments = self
            .world
            .get::<&Segments>(entity)
            .ok()
            .map(|s| s.cells.clone());
        if let Some(body) = &body {
            for cell in footprint(body, segments.as_deref()) {
                self.vacate(cell, id);
            }
            self.mark_tiles_around(body);
        }
        self.tags.remove_all(id);
        self.stale_tiles.remove(&id);
        let _ = self.world.despawn(entity);
        body
    }

    /// Read one component.
    pub fn get<T: Component + Clone>(&self, id: EntityId) -> Option<T> {
        let entity = *self.ids.get(&id)?;
        self.world.get::<&T>(entity).ok().map(|c| (*c).clone())
    }

    pub fn has<T: Component>(&self, id: EntityId) -> bool {
        self.ids
            .get(&id)
            .and_then(|e| self.world.entity(*e).ok())
            .is_some_and(|entity| entity.has::<T>())
    }

    /// Mutate one component in place.
    pub fn with_mut<T: Component, R>(&mut self, id: EntityId, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let entity = *self.ids.get(&id)?;
        self.world.query_one_mut::<&mut T>(entity).ok().map(f)
    }

    pub fn insert_component<T: Component>(&mut self, id: EntityId, component: T) -> bool {
        match self.ids.get(&id) {
            Some(entity) => self.world.insert_one(*entity, component).is_ok(),
            None => false,
        }
    }

    pub fn remove_component<T: Component>(&mut self, id: EntityId) -> Option<T> {
        let entity = *self.ids.get(&id)?;
        self.world.remove_one::<T>(entity).ok()
    }

    pub fn body(&self, id: EntityId) -> Option<Body> {
        self.get::<Body>(id)
    }

    pub fn kind(&self, id: EntityId) -> Option<EntityKind> {
        let entity = *self.ids.get(&id)?;
        self.world.get::<&Body>(entity).ok().map(|b| b.kind)
    }

    pub fn segments(&self, id: EntityId) -> Vec<GridPos> {
        self.get::<Segments>(id).map(|s| s.cells).unwrap_or_default()
    }

    /// Every cell an entity covers: its footprint plus attached segments.
    pub fn cells_of(&self, id: EntityId) -> Vec<GridPos> {
        match self.body(id) {
            Some(body) => {
                let segments = self.segments(id);
                footprint(&body, Some(&segments))
            }
            None => Vec::new(),
        }
    }

    /// Ids occupying `pos`.
    pub fn occupants(&self, pos: GridPos) -> &[EntityId] {
        self.occupancy.get(&pos).map_or(&[], |ids| ids.as_slice())
    }

    /// Occupied cells with their occupants.
    pub fn occupied_cells(&self) -> impl Iterator<Item = (GridPos, &[EntityId])> + '_ {
        self.occupancy
            .iter()
            .map(|(pos, ids)| (*pos, ids.as_slice()))
    }

    /// Move an entity's footprint to `to`, keeping the occupancy grid in sync.
    pub fn relocate(&mut self, id: EntityId, to: GridPos) -> bool {
        let Some(body) = self.body(id) else {
            return false;
        };
        if body.position == to {
            return true;
        }
        for cell in footprint(&body, None) {
            self.vacate(cell, id);
        }
        self.mark_tiles_around(&body);
        let moved = self.with_mut::<Body, _>(id, |b| {
            b.prev_position = b.position;
            b.position = to;
            b.clone()
        });
        if let Some(moved) = moved {
            for cell in footprint(&moved, None) {
                self.occupy(cell, id);
            }
            self.mark_tiles_around(&moved);
        }
        true
    }

    /// Change kind and footprint dimensions in place.
    pub fn reshape(&mut self, id: EntityId, kind: EntityKind, width: i32, height: i32) -> Option<Body> {
        let body = self.body(id)?;
        for cell in footprint(&body, None) {
            self.vacate(cell, id);
        }
        self.mark_tiles_around(&body);
        let reshaped = self.with_mut::<Body, _>(id, |b| {
            b.kind = kind;
            b.width = width;
            b.height = height;
            b.clone()
        })?;
        for cell in footprint(&reshaped, None) {
            self.occupy(cell, id);
        }
        self.mark_tiles_around(&reshaped);
        Some(reshaped)
    }

    /// Add several components at once.
    pub fn insert_bundle(&mut self, id: EntityId, builder: &mut EntityBuilder) -> bool {
        match self.ids.get(&id) {
            Some(entity) => self.world.insert(*entity, builder.build()).is_ok(),
            None => false,
        }
    }

    /// Attach a segment cell to an entity's body.
    pub fn attach_segment(&mut self, id: EntityId, cell: GridPos) -> bool {
        if !self.contains(id) {
            return false;
        }
        let updated = self.with_mut::<Segments, _>(id, |s| s.cells.push(cell));
        if updated.is_none() {
            self.insert_component(id, Segments { cells: vec![cell] });
        }
        self.occupy(cell, id);
        true
    }

    /// Replace an entity's tags (used by retyping).
    pub fn retag(&mut self, id: EntityId, old: &[Tag], new: &[Tag]) {
        for tag in old {
            if *tag != Tag::Actor {
                self.tags.remove(*tag, id);
            }
        }
        for tag in new {
            self.tags.insert(*tag, id);
        }
    }

    /// Add to the actor set; newly added actors are remembered for the
    /// running actor pass.
    pub fn mark_actor(&mut self, id: EntityId) {
        if self.tags.insert(Tag::Actor, id) {
            self.new_actors.push(id);
        }
    }

    pub fn unmark_actor(&mut self, id: EntityId) {
        self.tags.remove(Tag::Actor, id);
    }

    pub fn take_new_actors(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.new_actors)
    }

    pub fn take_stale_tiles(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.stale_tiles).into_iter().collect()
    }

    /// Flag the tiled entity at `body` and its tiled neighbours for a mask
    /// recompute.
    fn mark_tiles_around(&mut self, body: &Body) {
        let mut cells = vec![body.position];
        cells.extend(body.position.orthogonal_neighbors());
        for cell in cells {
            let ids: Vec<EntityId> = self.occupants(cell).to_vec();
            for other in ids {
                if self.tags.contains(Tag::Tiled, other) {
                    self.stale_tiles.insert(other);
                }
            }
        }
        if self.tags.contains(Tag::Tiled, body.id) {
            self.stale_tiles.insert(body.id);
        }
    }

    fn occupy(&mut self, cell: GridPos, id: EntityId) {
        let ids = self.occupancy.entry(cell).or_default();
        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    fn vacate(&mut self, cell: GridPos, id: EntityId) {
        if let Some(ids) = self.occupancy.get_mut(&cell) {
            ids.retain(|other| *other != id);
            if ids.is_empty() {
                self.occupancy.remove(&cell);
            }
        }
    }
}

/// Cells covered by a body's `width` x `height` footprint plus `segments`.
pub fn footprint(body: &Body, segments: Option<&[GridPos]>) -> Vec<GridPos> {
    let mut cells = Vec::with_capacity((body.width * body.height).max(1) as usize);
    for dx in 0..body.width.max(1) {
        for dy in 0..body.height.max(1) {
            cells.push(body.position.offset(dx, dy));
        }
    }
    if let Some(segments) = segments {
        cells.extend_from_slice(segments);
    }
    cells
}
