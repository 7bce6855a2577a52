//! World entity records and their owning store.
//!
//! Trees and loot live in generation-checked arenas, so a stale id held by the
//! inventory or the spatial index can never alias a newer entity. Structural
//! changes raise per-collection dirty flags that the frame consumes to decide
//! when to rebuild the spatial index.

use std::collections::HashMap;

use glam::Vec2;
use grove_core::math::Rect;
use grove_render::SpriteHandle;
use serde::Deserialize;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    pub struct TreeId;
    pub struct LootId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Player,
    Tree,
    Loot,
}

/// Shared shape of everything that is drawn: an optional sprite and a rect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawObject {
    pub sprite: Option<SpriteHandle>,
    rect: Rect,
}

impl DrawObject {
    pub fn new(rect: Rect) -> Self {
        if rect.width < 0.0 || rect.height < 0.0 {
            log::warn!(
                "Negative entity size {}x{} clamped to zero",
                rect.width,
                rect.height
            );
        }
        Self {
            sprite: None,
            rect: Rect::new(rect.x, rect.y, rect.width, rect.height),
        }
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn translate(&mut self, offset: Vec2) {
        self.rect = self.rect.translated(offset);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tree {
    pub object: DrawObject,
}

impl Tree {
    pub fn rect(&self) -> Rect {
        self.object.rect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Loot {
    pub object: DrawObject,
}

impl Loot {
    pub fn rect(&self) -> Rect {
        self.object.rect()
    }
}

#[derive(Default)]
pub struct EntityStore {
    trees: SlotMap<TreeId, Tree>,
    loot: SlotMap<LootId, Loot>,
    sprites: HashMap<EntityKind, SpriteHandle>,
    trees_dirty: bool,
    loot_dirty: bool,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Trees

    pub fn add_trees(&mut self, rects: impl IntoIterator<Item = Rect>) -> Vec<TreeId> {
        let sprite = self.sprite_for(EntityKind::Tree);
        let ids: Vec<TreeId> = rects
            .into_iter()
            .map(|rect| {
                let mut object = DrawObject::new(rect);
                object.sprite = sprite;
                self.trees.insert(Tree { object })
            })
            .collect();
        if !ids.is_empty() {
            self.trees_dirty = true;
        }
        ids
    }

    /// Replace every tree.
    pub fn set_trees(&mut self, rects: impl IntoIterator<Item = Rect>) -> Vec<TreeId> {
        self.clear_trees();
        self.add_trees(rects)
    }

    pub fn clear_trees(&mut self) {
        if !self.trees.is_empty() {
            self.trees.clear();
            self.trees_dirty = true;
        }
    }

    pub fn tree(&self, id: TreeId) -> Option<&Tree> {
        self.trees.get(id)
    }

    pub fn trees(&self) -> impl Iterator<Item = (TreeId, &Tree)> {
        self.trees.iter()
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    // Loot

    pub fn spawn_loot(&mut self, rect: Rect) -> LootId {
        let mut object = DrawObject::new(rect);
        object.sprite = self.sprite_for(EntityKind::Loot);
        self.loot_dirty = true;
        self.loot.insert(Loot { object })
    }

    pub fn add_loot(&mut self, rects: impl IntoIterator<Item = Rect>) -> Vec<LootId> {
        rects.into_iter().map(|rect| self.spawn_loot(rect)).collect()
    }

    /// Replace every loot item.
    pub fn set_loot(&mut self, rects: impl IntoIterator<Item = Rect>) -> Vec<LootId> {
        self.clear_loot();
        self.add_loot(rects)
    }

    pub fn clear_loot(&mut self) {
        if !self.loot.is_empty() {
            self.loot.clear();
            self.loot_dirty = true;
        }
    }

    pub fn remove_loot(&mut self, id: LootId) -> Option<Loot> {
        let removed = self.loot.remove(id);
        if removed.is_some() {
            self.loot_dirty = true;
        }
        removed
    }

    pub fn loot(&self, id: LootId) -> Option<&Loot> {
        self.loot.get(id)
    }

    pub fn loot_iter(&self) -> impl Iterator<Item = (LootId, &Loot)> {
        self.loot.iter()
    }

    pub fn loot_count(&self) -> usize {
        self.loot.len()
    }

    // Sprites

    /// Attach a loaded sprite to every current and future entity of `kind`.
    pub fn attach_sprite(&mut self, kind: EntityKind, sprite: SpriteHandle) {
        self.sprites.insert(kind, sprite);
        match kind {
            EntityKind::Tree => {
                for tree in self.trees.values_mut() {
                    tree.object.sprite = Some(sprite);
                }
            }
            EntityKind::Loot => {
                for loot in self.loot.values_mut() {
                    loot.object.sprite = Some(sprite);
                }
            }
            // the player is owned by its controller
            EntityKind::Player => {}
        }
    }

    pub fn sprite_for(&self, kind: EntityKind) -> Option<SpriteHandle> {
        self.sprites.get(&kind).copied()
    }

    // Dirty flags

    pub fn take_trees_dirty(&mut self) -> bool {
        std::mem::take(&mut self.trees_dirty)
    }

    pub fn take_loot_dirty(&mut self) -> bool {
        std::mem::take(&mut self.loot_dirty)
    }
}
