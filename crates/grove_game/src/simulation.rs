//! The owned aggregate the frame driver steps.
//!
//! One call to [`Simulation::frame`] runs the whole per-frame sequence in a
//! fixed order:
//!
//! 1. apply the latest surface resize and finished sprite loads
//! 2. map held keys to commands, apply one deferred gesture transition
//! 3. move the player, then let the camera follow
//! 4. rebuild dirty spatial indexes and query what the camera sees
//! 5. resolve pickups into the inventory and report obstacle contacts
//! 6. composite the visible drawables onto the sink
//!
//! Device input can arrive between frames through [`Simulation::key_down`],
//! [`Simulation::key_up`] and [`Simulation::pointer`]. After
//! [`Simulation::teardown`] every entry point is a no-op.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use glam::Vec2;
use grove_core::math::Rect;
use grove_core::{
    CommandMapper, EventDisposition, FrameClock, FrameTick, GestureRecognizer, GestureState,
    GestureTarget, InputState, Key, PointerEvent,
};
use grove_render::{
    Bounds, CameraController, Drawable, DrawableKind, RenderCompositor, RenderSink, RenderStats,
    ResizeNotifier, Surface, SurfaceMetrics,
};

use crate::assets::AssetLoader;
use crate::collision::{obstacle_contacts, pickup_hits};
use crate::config::SimConfig;
use crate::entities::{EntityKind, EntityStore, Loot, LootId, TreeId};
use crate::inventory::Inventory;
use crate::player::{PlayerController, PlayerTuning};
use crate::spatial::SpatialIndex;
use crate::world::WorldFile;

/// What the camera can be told to follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowKey {
    Player,
    Tree(TreeId),
    Loot(LootId),
}

/// Input for one scripted frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameInput {
    pub delta_ms: f64,
    pub held: Vec<Key>,
    pub pointer: Vec<PointerEvent>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub elapsed_ms: f64,
    pub player: Rect,
    pub camera: Vec2,
    pub visible_trees: usize,
    pub visible_loot: usize,
    pub picked_up: Vec<LootId>,
    pub obstacle_contacts: usize,
    pub gesture: GestureState,
    pub render: RenderStats,
}

pub struct Simulation {
    config: SimConfig,
    alive: Arc<AtomicBool>,
    input: InputState,
    mapper: CommandMapper,
    gesture: GestureRecognizer,
    store: EntityStore,
    player: PlayerController,
    camera: CameraController<FollowKey>,
    tree_index: SpatialIndex<TreeId>,
    loot_index: SpatialIndex<LootId>,
    inventory: Inventory<Loot>,
    compositor: RenderCompositor,
    surface: Surface,
    assets: AssetLoader,
    frame_count: u64,
}

impl Simulation {
    pub fn new(config: SimConfig, world: &WorldFile, metrics: SurfaceMetrics) -> Self {
        let alive = Arc::new(AtomicBool::new(true));

        let mut store = EntityStore::new();
        store.set_trees(world.trees.iter().map(|p| p.rect(config.tree_size)));
        store.set_loot(world.loot.iter().map(|p| p.rect(config.loot_size)));

        let player = PlayerController::new(
            Rect::new(
                world.player.x,
                world.player.y,
                config.player_size,
                config.player_size,
            ),
            PlayerTuning::from(&config),
        );

        let mut camera = CameraController::new(metrics.pixel_size.x, metrics.pixel_size.y)
            .with_tuning(config.follow_strength, config.min_zoom);
        camera.set_zoom(world.camera.zoom);
        camera.set_bounds(world.bounds.map(|b| Bounds {
            width: b.width,
            height: b.height,
        }));
        camera.set_follow_target(Some(FollowKey::Player));
        if !world.camera.follow {
            camera.disable_follow();
        }
        // start centered on the player instead of sliding in from the origin
        let start = camera.desired_position(player.rect());
        camera.set_position(start.x, start.y);
        camera.clamp_to_bounds();

        let mut gesture = GestureRecognizer::new(config.gesture_threshold, config.gesture_metric);
        gesture.attach_target(GestureTarget::element(client_rect(&metrics)));

        log::info!(
            "Simulation ready for world '{}': {} trees, {} loot",
            world.world_id,
            store.tree_count(),
            store.loot_count()
        );

        let mut sim = Self {
            tree_index: SpatialIndex::new(config.chunk_size),
            loot_index: SpatialIndex::new(config.chunk_size),
            inventory: Inventory::new(config.inventory_slots),
            assets: AssetLoader::new(Arc::clone(&alive)),
            surface: Surface::new(metrics),
            compositor: RenderCompositor::new(),
            mapper: CommandMapper::default(),
            input: InputState::new(),
            config,
            alive,
            gesture,
            store,
            player,
            camera,
            frame_count: 0,
        };
        for sprite in &world.sprites {
            if let Err(err) = sim.assets.request(sprite.kind, &sprite.path) {
                log::warn!("{err}");
            }
        }
        sim
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut EntityStore {
        &mut self.store
    }

    pub fn player(&self) -> &PlayerController {
        &self.player
    }

    pub fn camera(&self) -> &CameraController<FollowKey> {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraController<FollowKey> {
        &mut self.camera
    }

    pub fn gesture(&self) -> &GestureRecognizer {
        &self.gesture
    }

    pub fn inventory(&self) -> &Inventory<Loot> {
        &self.inventory
    }

    pub fn surface_metrics(&self) -> &SurfaceMetrics {
        self.surface.metrics()
    }

    pub fn resize_notifier(&self) -> ResizeNotifier {
        self.surface.notifier()
    }

    pub fn pending_assets(&self) -> usize {
        self.assets.pending()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn key_down(&mut self, key: Key) {
        if self.is_alive() {
            self.input.key_down(key);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        if self.is_alive() {
            self.input.key_up(key);
        }
    }

    pub fn set_held_keys(&mut self, keys: &[Key]) {
        if self.is_alive() {
            self.input.set_held(keys);
        }
    }

    pub fn pointer(&mut self, event: PointerEvent) -> EventDisposition {
        if !self.is_alive() {
            return EventDisposition::Ignored;
        }
        self.gesture.handle(event)
    }

    /// World position under the current gesture model, through the same
    /// transform the renderer uses.
    pub fn pointer_world_position(&self) -> Vec2 {
        self.camera
            .view_transform()
            .window_point_to_world(self.gesture.model().position, self.surface.metrics())
    }

    /// Apply a scripted frame's input, advance the clock and run the frame.
    pub fn step(
        &mut self,
        clock: &mut FrameClock,
        input: &FrameInput,
        sink: &mut dyn RenderSink,
    ) -> Option<FrameReport> {
        if !self.is_alive() {
            return None;
        }
        self.set_held_keys(&input.held);
        for event in &input.pointer {
            self.pointer(*event);
        }
        let tick = clock.advance(input.delta_ms);
        self.frame(tick, sink)
    }

    pub fn frame(&mut self, tick: FrameTick, sink: &mut dyn RenderSink) -> Option<FrameReport> {
        if !self.is_alive() {
            return None;
        }
        let delta_ms = tick.delta_ms as f32;

        if let Some(metrics) = self.surface.apply_pending() {
            self.camera.set_viewport(metrics.pixel_size.x, metrics.pixel_size.y);
            self.gesture.set_target_rect(client_rect(&metrics));
        }
        for sprite in self.assets.drain() {
            match sprite.kind {
                EntityKind::Player => self.player.set_sprite(sprite.handle),
                kind => self.store.attach_sprite(kind, sprite.handle),
            }
        }

        let commands = self.mapper.map(&self.input);
        self.gesture.tick();

        self.player.update(&commands, delta_ms);
        let store = &self.store;
        let player_rect = self.player.rect();
        self.camera.update(delta_ms, |key| match key {
            FollowKey::Player => Some(player_rect),
            FollowKey::Tree(id) => store.tree(id).map(|t| t.rect()),
            FollowKey::Loot(id) => store.loot(id).map(|l| l.rect()),
        });

        self.refresh_indexes();
        let visible = self.camera.visible_rect();
        let visible_trees = self.tree_index.query(visible);
        let visible_loot = self.loot_index.query(visible);

        let candidates = visible_loot
            .iter()
            .filter_map(|&id| self.store.loot(id).map(|l| (id, l.rect())));
        let hits = pickup_hits(self.config.pickup_policy, &player_rect, candidates);
        let store = &mut self.store;
        let mut picked_up = Vec::new();
        self.inventory.pickup(hits.into_iter().filter_map(|id| {
            let item = store.remove_loot(id)?;
            picked_up.push(id);
            Some(item)
        }));
        if !picked_up.is_empty() {
            log::info!(
                "Picked up {} loot ({}/{} slots used)",
                picked_up.len(),
                self.inventory.len(),
                self.inventory.capacity()
            );
        }

        let obstacles: Vec<(TreeId, Rect)> = visible_trees
            .iter()
            .filter_map(|&id| self.store.tree(id).map(|t| (id, t.rect())))
            .collect();
        let contacts = obstacle_contacts(&[(FollowKey::Player, player_rect)], &obstacles);
        for contact in &contacts {
            log::trace!(
                "Player overlaps tree {:?} by {:.1}",
                contact.obstacle,
                contact.overlap_area
            );
        }

        let render = self.composite(&obstacles, &visible_loot, sink);

        self.input.end_frame();
        self.frame_count += 1;

        Some(FrameReport {
            frame: self.frame_count,
            elapsed_ms: tick.elapsed_ms,
            player: player_rect,
            camera: self.camera.position(),
            visible_trees: visible_trees.len(),
            visible_loot: visible_loot.len(),
            picked_up,
            obstacle_contacts: contacts.len(),
            gesture: self.gesture.state(),
            render,
        })
    }

    /// Stop everything at once. Later frames, input and asset completions are
    /// discarded.
    pub fn teardown(&mut self) {
        if !self.alive.swap(false, Ordering::AcqRel) {
            return;
        }
        self.gesture.detach_target();
        self.input.release_all();
        self.input.end_frame();
        log::info!(
            "Simulation torn down after {} frames ({} sprite loads in flight)",
            self.frame_count,
            self.assets.pending()
        );
    }

    fn refresh_indexes(&mut self) {
        if self.store.take_trees_dirty() {
            self.tree_index
                .rebuild(self.store.trees().map(|(id, tree)| (id, tree.rect())));
        }
        if self.store.take_loot_dirty() {
            self.loot_index
                .rebuild(self.store.loot_iter().map(|(id, loot)| (id, loot.rect())));
        }
    }

    fn composite(
        &mut self,
        trees: &[(TreeId, Rect)],
        loot: &[LootId],
        sink: &mut dyn RenderSink,
    ) -> RenderStats {
        self.compositor.begin_frame();
        for &(id, rect) in trees {
            self.compositor.push(Drawable {
                kind: DrawableKind::Tree,
                sprite: self.store.tree(id).and_then(|t| t.object.sprite),
                rect,
            });
        }
        // picked-up loot is already gone from the store
        for &id in loot {
            if let Some(item) = self.store.loot(id) {
                self.compositor.push(Drawable {
                    kind: DrawableKind::Loot,
                    sprite: item.object.sprite,
                    rect: item.rect(),
                });
            }
        }
        let player = self.player.player();
        self.compositor.push(Drawable {
            kind: DrawableKind::Player {
                sway_angle: player.sway_angle,
            },
            sprite: player.object.sprite,
            rect: player.object.rect(),
        });

        let size = self.surface.metrics().pixel_size;
        self.compositor
            .render(sink, &self.camera.view_transform(), size.x, size.y)
    }
}

fn client_rect(metrics: &SurfaceMetrics) -> Rect {
    Rect::from_min_size(metrics.client_origin, metrics.client_size)
}

impl Drop for Simulation {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Placement, PlayerStart, WorldCamera};
    use grove_render::RecordingSink;

    fn metrics() -> SurfaceMetrics {
        SurfaceMetrics::new(Vec2::ZERO, Vec2::new(800.0, 600.0), 1.0)
    }

    fn world(loot: Vec<Placement>) -> WorldFile {
        WorldFile {
            version: "0.1".to_string(),
            world_id: "test".to_string(),
            bounds: None,
            player: PlayerStart { x: 0.0, y: 0.0 },
            camera: WorldCamera::default(),
            trees: vec![Placement {
                x: 300.0,
                y: 0.0,
                width: None,
                height: None,
            }],
            loot,
            sprites: Vec::new(),
        }
    }

    fn at(x: f32, y: f32) -> Placement {
        Placement {
            x,
            y,
            width: None,
            height: None,
        }
    }

    fn tick(delta_ms: f64) -> FrameTick {
        FrameTick {
            elapsed_ms: 0.0,
            delta_ms,
        }
    }

    #[test]
    fn loot_under_player_is_picked_up_once() {
        let mut sim = Simulation::new(SimConfig::default(), &world(vec![at(40.0, 40.0)]), metrics());
        let mut sink = RecordingSink::new();
        let report = sim.frame(tick(16.0), &mut sink).expect("frame runs");
        assert_eq!(report.picked_up.len(), 1);
        assert_eq!(sim.inventory().len(), 1);
        assert_eq!(sim.store().loot_count(), 0);

        let report = sim.frame(tick(16.0), &mut sink).expect("frame runs");
        assert!(report.picked_up.is_empty());
        assert_eq!(report.visible_loot, 0);
    }

    #[test]
    fn inventory_holds_the_removed_loot_records() {
        let mut sim = Simulation::new(SimConfig::default(), &world(vec![at(40.0, 40.0)]), metrics());
        let (_, expected) = sim
            .store()
            .loot_iter()
            .next()
            .map(|(id, loot)| (id, *loot))
            .expect("one loot");
        sim.frame(tick(16.0), &mut RecordingSink::new())
            .expect("frame runs");
        assert_eq!(sim.inventory().items(), &[expected]);
        assert_eq!(sim.inventory().items()[0].rect().min(), Vec2::new(40.0, 40.0));
    }

    #[test]
    fn full_inventory_leaves_loot_in_world() {
        let config = SimConfig {
            inventory_slots: 1,
            ..SimConfig::default()
        };
        let loot = vec![at(10.0, 10.0), at(20.0, 20.0)];
        let mut sim = Simulation::new(config, &world(loot), metrics());
        let report = sim
            .frame(tick(16.0), &mut RecordingSink::new())
            .expect("frame runs");
        assert_eq!(report.picked_up.len(), 1);
        assert_eq!(sim.store().loot_count(), 1);
    }

    #[test]
    fn held_keys_move_the_player() {
        let mut sim = Simulation::new(SimConfig::default(), &world(Vec::new()), metrics());
        sim.key_down(Key::D);
        let report = sim
            .frame(tick(100.0), &mut RecordingSink::new())
            .expect("frame runs");
        assert!((report.player.x - 30.0).abs() < 1e-3);
        sim.key_up(Key::D);
        let report = sim
            .frame(tick(100.0), &mut RecordingSink::new())
            .expect("frame runs");
        assert!((report.player.x - 30.0).abs() < 1e-3);
    }

    #[test]
    fn player_overlapping_tree_is_reported() {
        let mut w = world(Vec::new());
        w.player = PlayerStart { x: 250.0, y: 10.0 };
        let mut sim = Simulation::new(SimConfig::default(), &w, metrics());
        let report = sim
            .frame(tick(16.0), &mut RecordingSink::new())
            .expect("frame runs");
        assert_eq!(report.obstacle_contacts, 1);
    }

    #[test]
    fn resize_is_applied_before_drawing() {
        let mut sim = Simulation::new(SimConfig::default(), &world(Vec::new()), metrics());
        let notifier = sim.resize_notifier();
        assert!(notifier.notify(grove_render::ResizeEvent {
            client_origin: Vec2::ZERO,
            client_size: Vec2::new(1024.0, 768.0),
            device_pixel_ratio: 2.0,
        }));
        let mut sink = RecordingSink::new();
        sim.frame(tick(16.0), &mut sink).expect("frame runs");
        assert_eq!(sim.camera().state().viewport, Vec2::new(2048.0, 1536.0));
        assert_eq!(
            sink.commands.first(),
            Some(&grove_render::SinkCommand::Clear {
                width: 2048.0,
                height: 1536.0
            })
        );
    }

    #[test]
    fn entities_without_sprites_are_skipped() {
        let mut sim = Simulation::new(SimConfig::default(), &world(Vec::new()), metrics());
        let mut sink = RecordingSink::new();
        let report = sim.frame(tick(16.0), &mut sink).expect("frame runs");
        assert_eq!(report.render.drawn, 0);
        assert_eq!(report.render.skipped, 2);

        sim.store_mut()
            .attach_sprite(EntityKind::Tree, grove_render::SpriteHandle(1));
        sink.reset();
        let report = sim.frame(tick(16.0), &mut sink).expect("frame runs");
        assert_eq!(report.render.drawn, 1);
    }

    #[test]
    fn teardown_discards_everything_after() {
        let mut sim = Simulation::new(SimConfig::default(), &world(Vec::new()), metrics());
        sim.teardown();
        assert!(!sim.is_alive());
        assert!(!sim.gesture().has_target());
        assert_eq!(
            sim.pointer(PointerEvent::Down { x: 1.0, y: 1.0 }),
            EventDisposition::Ignored
        );
        sim.key_down(Key::D);
        assert!(sim.frame(tick(16.0), &mut RecordingSink::new()).is_none());
        assert_eq!(sim.frame_count(), 0);
    }

    #[test]
    fn gesture_click_resolves_over_frames() {
        let mut sim = Simulation::new(SimConfig::default(), &world(Vec::new()), metrics());
        let mut sink = RecordingSink::new();
        sim.pointer(PointerEvent::Down { x: 10.0, y: 10.0 });
        let report = sim.frame(tick(16.0), &mut sink).expect("frame runs");
        assert_eq!(report.gesture, GestureState::Hold);

        sim.pointer(PointerEvent::Up { x: 10.0, y: 10.0 });
        let report = sim.frame(tick(16.0), &mut sink).expect("frame runs");
        assert_eq!(report.gesture, GestureState::Click);
        let report = sim.frame(tick(16.0), &mut sink).expect("frame runs");
        assert_eq!(report.gesture, GestureState::Idle);
    }

    #[test]
    fn follow_target_can_be_a_loot_item() {
        let mut sim = Simulation::new(
            SimConfig::default(),
            &world(vec![at(3000.0, 3000.0)]),
            metrics(),
        );
        let (id, _) = sim.store().loot_iter().next().expect("one loot");
        sim.camera_mut().set_follow_target(Some(FollowKey::Loot(id)));
        let before = sim.camera().position();
        sim.frame(tick(100.0), &mut RecordingSink::new())
            .expect("frame runs");
        assert!(sim.camera().position().x > before.x);
    }

    #[test]
    fn pointer_maps_to_world_through_the_render_transform() {
        let surface = SurfaceMetrics::new(Vec2::new(10.0, 20.0), Vec2::new(800.0, 600.0), 2.0);
        let mut sim = Simulation::new(SimConfig::default(), &world(Vec::new()), surface);
        sim.camera_mut().disable_follow();
        sim.camera_mut().set_position(37.6, -12.4);
        sim.camera_mut().set_zoom(2.0);

        sim.pointer(PointerEvent::Down { x: 110.0, y: 70.0 });
        sim.frame(tick(16.0), &mut RecordingSink::new())
            .expect("frame runs");

        // window (110, 70) -> surface (200, 100) -> world (100, 50) + floor(origin)
        let world_point = sim.pointer_world_position();
        assert!((world_point - Vec2::new(137.0, 37.0)).length() < 1e-4);

        let back = sim
            .camera()
            .view_transform()
            .world_point_to_window(world_point, sim.surface_metrics());
        assert!((back - Vec2::new(110.0, 70.0)).length() < 1e-4);
    }
}
