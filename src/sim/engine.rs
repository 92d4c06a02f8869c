//! Simulation loop
//!
//! The host calls [`Engine::tick`] from its animation-frame callback. Each tick
//! clamps the frame delta, moves every monster, resolves avatar contact and
//! retires monsters whose destruction animation has finished.
//!
//! Events are queued rather than delivered mid-tick. A registered
//! [`EngineObserver`] receives them once the mutating call has finished; with
//! no observer they wait in the queue for [`Engine::drain_events`]. Observers
//! never get `&mut Engine`, so they cannot re-enter a tick.

use std::collections::VecDeque;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::factory::MonsterFactory;
use super::monster::Monster;
use super::question::Difficulty;
use crate::renderer::{self, Vertex};
use crate::settings::Settings;

/// Maximum queued events before the oldest are dropped
pub const EVENT_QUEUE_CAPACITY: usize = 256;

/// Salt mixed into the run seed for the engine's monster factory
const FACTORY_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Engine run state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineStatus {
    /// Not started, or stopped (monsters cleared)
    Stopped,
    /// Ticks advance the simulation
    Running,
    /// Ticks are ignored; all state is kept for resume
    Paused,
}

/// Something that happened inside the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineEvent {
    /// A monster touched the avatar and was removed
    MonsterReachedPlayer { id: u32, damage: u32 },
    /// A monster left the live set
    MonsterDestroyed { id: u32 },
    /// Live state changed
    StateUpdated,
}

/// Receiver for engine events. All methods default to no-ops.
pub trait EngineObserver {
    fn on_monster_reach_player(&mut self, _id: u32, _damage: u32) {}
    fn on_monster_destroyed(&mut self, _id: u32) {}
    fn on_state_update(&mut self, _state: &EngineSnapshot) {}
}

/// Read-only copy of the engine state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub status: EngineStatus,
    pub avatar_pos: Vec2,
    pub monsters: Vec<Monster>,
    /// Simulation clock (ms); only advances while running
    pub clock_ms: f64,
    /// Simulation clock at the most recent spawn
    pub last_spawn_at: Option<f64>,
    /// Host timestamp of the most recent tick
    pub last_tick_at: Option<f64>,
}

/// Owns the live monster list and advances it each tick
pub struct Engine {
    status: EngineStatus,
    avatar_pos: Vec2,
    avatar_radius: f32,
    max_frame_dt_ms: f32,
    destruction_animation_ms: f32,
    factory: MonsterFactory,
    /// Live monsters in insertion order
    monsters: Vec<Monster>,
    clock_ms: f64,
    last_spawn_at: Option<f64>,
    last_tick_at: Option<f64>,
    events: VecDeque<EngineEvent>,
    observer: Option<Box<dyn EngineObserver>>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("status", &self.status)
            .field("avatar_pos", &self.avatar_pos)
            .field("monsters", &self.monsters.len())
            .field("clock_ms", &self.clock_ms)
            .field("queued_events", &self.events.len())
            .field("observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Create a stopped engine with the avatar at the arena center.
    /// Invalid settings are replaced by the defaults.
    pub fn new(settings: &Settings) -> Self {
        let settings = &settings.clone().or_default();
        let factory = MonsterFactory::new(settings.seed ^ FACTORY_SEED_SALT, settings);
        Self {
            status: EngineStatus::Stopped,
            avatar_pos: factory.arena_center(),
            avatar_radius: settings.avatar_radius,
            max_frame_dt_ms: settings.max_frame_dt_ms,
            destruction_animation_ms: settings.destruction_animation_ms,
            factory,
            monsters: Vec::new(),
            clock_ms: 0.0,
            last_spawn_at: None,
            last_tick_at: None,
            events: VecDeque::new(),
            observer: None,
        }
    }

    // --- Lifecycle ---

    /// Begin (or resume) ticking
    pub fn start(&mut self) {
        if self.status == EngineStatus::Running {
            return;
        }
        log::info!("Engine {:?} -> Running", self.status);
        self.status = EngineStatus::Running;
        // First tick after (re)start measures from itself, not from the gap
        self.last_tick_at = None;
    }

    /// Stop ticking but keep every monster and timer for an exact resume
    pub fn pause(&mut self) {
        if self.status != EngineStatus::Running {
            return;
        }
        log::info!("Engine paused with {} monsters", self.monsters.len());
        self.status = EngineStatus::Paused;
        self.last_tick_at = None;
    }

    /// Stop and discard all monsters. Pending destruction animations are
    /// dropped without firing their destroyed events.
    pub fn stop(&mut self) {
        log::info!("Engine stopped, discarding {} monsters", self.monsters.len());
        self.status = EngineStatus::Stopped;
        self.monsters.clear();
        self.last_tick_at = None;
        self.push_event(EngineEvent::StateUpdated);
        self.flush();
    }

    pub fn status(&self) -> EngineStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == EngineStatus::Running
    }

    // --- Observation ---

    /// Register (or clear) the observer that receives events after each call
    pub fn set_observer(&mut self, observer: Option<Box<dyn EngineObserver>>) {
        self.observer = observer;
        self.flush();
    }

    /// Take all queued events. Only useful when no observer is registered.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        self.events.drain(..).collect()
    }

    /// Deliver queued events to an external observer
    pub fn dispatch(&mut self, observer: &mut dyn EngineObserver) {
        let events: Vec<EngineEvent> = self.events.drain(..).collect();
        self.deliver(events, observer);
    }

    fn deliver(&self, events: Vec<EngineEvent>, observer: &mut dyn EngineObserver) {
        for event in events {
            match event {
                EngineEvent::MonsterReachedPlayer { id, damage } => observer.on_monster_reach_player(id, damage),
                EngineEvent::MonsterDestroyed { id } => observer.on_monster_destroyed(id),
                EngineEvent::StateUpdated => observer.on_state_update(&self.snapshot()),
            }
        }
    }

    fn flush(&mut self) {
        if let Some(mut observer) = self.observer.take() {
            let events: Vec<EngineEvent> = self.events.drain(..).collect();
            self.deliver(events, observer.as_mut());
            self.observer = Some(observer);
        }
    }

    fn push_event(&mut self, event: EngineEvent) {
        if event == EngineEvent::StateUpdated && self.events.contains(&EngineEvent::StateUpdated) {
            return;
        }
        if self.events.len() >= EVENT_QUEUE_CAPACITY {
            if let Some(dropped) = self.events.pop_front() {
                log::warn!("Engine event queue full, dropping {dropped:?}");
            }
        }
        self.events.push_back(event);
    }

    // --- Tick ---

    /// Advance from a host timestamp (ms). Ignored unless running.
    pub fn tick(&mut self, now_ms: f64) {
        if self.status != EngineStatus::Running {
            return;
        }
        let dt = match self.last_tick_at {
            Some(last) => (now_ms - last).max(0.0) as f32,
            None => 0.0,
        };
        self.last_tick_at = Some(now_ms);
        self.advance(dt);
    }

    /// Advance by an explicit frame delta (ms). Ignored unless running.
    pub fn advance(&mut self, dt_ms: f32) {
        if self.status != EngineStatus::Running {
            return;
        }
        let max_dt = self.max_frame_dt_ms.max(0.0);
        if dt_ms > max_dt {
            log::warn!("Frame delta {dt_ms:.1}ms clamped to {max_dt:.1}ms");
        }
        let dt = dt_ms.clamp(0.0, max_dt);
        self.clock_ms += dt as f64;

        // Move everything before resolving any contact
        let avatar = self.avatar_pos;
        for monster in self.monsters.iter_mut().filter(|m| !m.is_destroying) {
            monster.update(dt, avatar);
        }

        let arrived: Vec<(u32, u32)> = self
            .monsters
            .iter()
            .filter(|m| !m.is_destroying && m.is_colliding_with(avatar, self.avatar_radius))
            .map(|m| (m.id, m.kind.contact_damage()))
            .collect();
        for (id, damage) in arrived {
            log::debug!("Monster {id} reached the player for {damage} damage");
            self.push_event(EngineEvent::MonsterReachedPlayer { id, damage });
            self.remove_now(id);
        }

        let now = self.clock_ms;
        let animation_ms = self.destruction_animation_ms;
        let finished: Vec<u32> = self
            .monsters
            .iter()
            .filter(|m| m.destruction_finished(now, animation_ms))
            .map(|m| m.id)
            .collect();
        for id in finished {
            self.remove_now(id);
        }

        self.push_event(EngineEvent::StateUpdated);
        self.flush();
    }

    // --- Monster operations ---

    /// Spawn a monster for the wave, optionally tagged with a question.
    /// Returns the new monster's id.
    pub fn spawn_monster(
        &mut self,
        wave: u32,
        difficulty: Difficulty,
        equation: Option<String>,
        answer: Option<i64>,
    ) -> u32 {
        let monster = self
            .factory
            .create_toward(wave, difficulty, self.avatar_pos)
            .with_question(equation, answer);
        let id = monster.id;
        log::debug!(
            "Spawned {} monster {id} at ({:.0}, {:.0}) hp={}",
            monster.kind.as_str(),
            monster.pos.x,
            monster.pos.y,
            monster.health
        );
        self.insert(monster);
        id
    }

    /// Insert a prebuilt monster. Rejects duplicate ids.
    pub fn add_monster(&mut self, monster: Monster) -> bool {
        if self.monsters.iter().any(|m| m.id == monster.id) {
            log::debug!("Ignoring duplicate monster id {}", monster.id);
            return false;
        }
        self.insert(monster);
        true
    }

    fn insert(&mut self, monster: Monster) {
        self.monsters.push(monster);
        self.last_spawn_at = Some(self.clock_ms);
        self.push_event(EngineEvent::StateUpdated);
        self.flush();
    }

    /// Destroy a monster. Animated destruction freezes it and removes it
    /// (firing the destroyed event) only once the animation has played out.
    /// Unknown ids and monsters already being destroyed are ignored.
    pub fn destroy_monster(&mut self, id: u32, animated: bool) -> bool {
        let now = self.clock_ms;
        let Some(monster) = self.monsters.iter_mut().find(|m| m.id == id) else {
            log::debug!("destroy_monster: unknown id {id}");
            return false;
        };
        if monster.is_destroying {
            return false;
        }
        if animated {
            monster.begin_destruction(now);
        } else {
            self.remove_now(id);
        }
        self.push_event(EngineEvent::StateUpdated);
        self.flush();
        true
    }

    /// Damage a monster; returns true if this killed it (animated destruction
    /// starts immediately)
    pub fn damage_monster(&mut self, id: u32, amount: u32) -> bool {
        let now = self.clock_ms;
        let Some(monster) = self.monsters.iter_mut().find(|m| m.id == id) else {
            log::debug!("damage_monster: unknown id {id}");
            return false;
        };
        let died = monster.take_damage(amount);
        if died {
            monster.begin_destruction(now);
        }
        self.push_event(EngineEvent::StateUpdated);
        self.flush();
        died
    }

    /// Drop every monster without destroyed events (wave reset)
    pub fn clear_monsters(&mut self) {
        if self.monsters.is_empty() {
            return;
        }
        log::debug!("Clearing {} monsters", self.monsters.len());
        self.monsters.clear();
        self.push_event(EngineEvent::StateUpdated);
        self.flush();
    }

    fn remove_now(&mut self, id: u32) {
        if let Some(idx) = self.monsters.iter().position(|m| m.id == id) {
            self.monsters.remove(idx);
            self.push_event(EngineEvent::MonsterDestroyed { id });
        }
    }

    // --- Queries ---

    /// Live monsters in insertion order
    pub fn monsters(&self) -> &[Monster] {
        &self.monsters
    }

    pub fn monster(&self, id: u32) -> Option<&Monster> {
        self.monsters.iter().find(|m| m.id == id)
    }

    /// Monsters that are still approaching (not being destroyed)
    pub fn active_count(&self) -> usize {
        self.monsters.iter().filter(|m| !m.is_destroying).count()
    }

    /// First approaching monster tagged with `answer`
    pub fn find_by_answer(&self, answer: i64) -> Option<u32> {
        self.monsters
            .iter()
            .find(|m| !m.is_destroying && m.answer == Some(answer))
            .map(|m| m.id)
    }

    pub fn avatar_pos(&self) -> Vec2 {
        self.avatar_pos
    }

    pub fn set_avatar_pos(&mut self, pos: Vec2) {
        self.avatar_pos = pos;
    }

    pub fn avatar_radius(&self) -> f32 {
        self.avatar_radius
    }

    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    pub fn destruction_animation_ms(&self) -> f32 {
        self.destruction_animation_ms
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            status: self.status,
            avatar_pos: self.avatar_pos,
            monsters: self.monsters.clone(),
            clock_ms: self.clock_ms,
            last_spawn_at: self.last_spawn_at,
            last_tick_at: self.last_tick_at,
        }
    }

    /// Triangle list for the current frame. Does not mutate the engine.
    pub fn render(&self) -> Vec<Vertex> {
        renderer::scene(
            &self.monsters,
            self.avatar_pos,
            self.avatar_radius,
            self.clock_ms,
            self.destruction_animation_ms,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FRAME_DT_MS;
    use crate::sim::monster::MonsterType;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn engine() -> Engine {
        let mut engine = Engine::new(&Settings::default());
        engine.start();
        engine
    }

    /// Basic monster sitting `offset` pixels right of the avatar, heading in
    fn monster_near(engine: &Engine, id: u32, offset: f32) -> Monster {
        let target = engine.avatar_pos();
        let spawn = target + Vec2::new(offset, 0.0);
        Monster::new(id, MonsterType::Basic, spawn, target, 2, offset / 5000.0)
    }

    #[test]
    fn test_spawn_notifies_state_update() {
        let mut engine = engine();
        let id = engine.spawn_monster(1, Difficulty::Easy, Some("1 + 1 = ?".into()), Some(2));
        assert_eq!(engine.drain_events(), vec![EngineEvent::StateUpdated]);
        let monster = engine.monster(id).expect("spawned");
        assert_eq!(monster.answer, Some(2));
        assert_eq!(monster.equation.as_deref(), Some("1 + 1 = ?"));
        assert_eq!(engine.find_by_answer(2), Some(id));
    }

    #[test]
    fn test_animated_destroy_waits_for_animation() {
        let mut engine = engine();
        let id = engine.spawn_monster(1, Difficulty::Easy, None, None);
        engine.drain_events();

        assert!(engine.destroy_monster(id, true));
        assert!(engine.monster(id).is_some(), "still visible during animation");
        assert!(!engine.destroy_monster(id, true), "second destroy is a no-op");

        for _ in 0..7 {
            engine.advance(100.0);
        }
        assert!(engine.monster(id).is_some());
        assert!(!engine.drain_events().contains(&EngineEvent::MonsterDestroyed { id }));

        engine.advance(100.0);
        assert!(engine.monster(id).is_none());
        assert!(engine.drain_events().contains(&EngineEvent::MonsterDestroyed { id }));
    }

    #[test]
    fn test_destroy_without_animation_is_immediate() {
        let mut engine = engine();
        let id = engine.spawn_monster(1, Difficulty::Easy, None, None);
        engine.drain_events();
        assert!(engine.destroy_monster(id, false));
        assert!(engine.monster(id).is_none());
        assert_eq!(
            engine.drain_events(),
            vec![EngineEvent::MonsterDestroyed { id }, EngineEvent::StateUpdated]
        );
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let mut engine = engine();
        assert!(!engine.destroy_monster(404, true));
        assert!(!engine.damage_monster(404, 1));
    }

    #[test]
    fn test_damage_kills_with_animation() {
        let mut engine = engine();
        let id = engine.spawn_monster(1, Difficulty::Easy, None, None);
        assert!(!engine.damage_monster(id, 1));
        assert!(engine.damage_monster(id, 1));
        let monster = engine.monster(id).expect("animating");
        assert!(monster.is_destroying);
        assert_eq!(monster.health, 0);
        assert!(!engine.damage_monster(id, 1));
    }

    #[test]
    fn test_reaching_player_deals_damage_and_removes() {
        let mut engine = engine();
        let id = engine.spawn_monster(1, Difficulty::Easy, None, None);
        engine.drain_events();

        let mut reached = None;
        let mut elapsed = 0.0;
        while reached.is_none() && elapsed < 6000.0 {
            engine.advance(FRAME_DT_MS);
            elapsed += FRAME_DT_MS;
            reached = engine.drain_events().into_iter().find_map(|e| match e {
                EngineEvent::MonsterReachedPlayer { id, damage } => Some((id, damage)),
                _ => None,
            });
        }
        assert_eq!(reached, Some((id, 1)));
        assert!(engine.monster(id).is_none());
        assert!(elapsed <= 5000.0 + FRAME_DT_MS);
    }

    #[test]
    fn test_simultaneous_arrivals_fire_in_insertion_order() {
        let mut engine = engine();
        let first = monster_near(&engine, 7, 50.0);
        let second = monster_near(&engine, 3, 45.0);
        assert!(engine.add_monster(first));
        assert!(engine.add_monster(second));
        engine.drain_events();

        engine.advance(50.0);
        let order: Vec<u32> = engine
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                EngineEvent::MonsterReachedPlayer { id, .. } => Some(id),
                _ => None,
            })
            .collect();
        assert_eq!(order, vec![7, 3]);
    }

    #[test]
    fn test_destroying_monster_does_not_hurt_player() {
        let mut engine = engine();
        assert!(engine.add_monster(monster_near(&engine, 1, 45.0)));
        engine.destroy_monster(1, true);
        engine.drain_events();
        engine.advance(50.0);
        assert!(!engine
            .drain_events()
            .iter()
            .any(|e| matches!(e, EngineEvent::MonsterReachedPlayer { .. })));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut engine = engine();
        assert!(engine.add_monster(monster_near(&engine, 1, 300.0)));
        assert!(!engine.add_monster(monster_near(&engine, 1, 200.0)));
        assert_eq!(engine.monsters().len(), 1);
    }

    #[test]
    fn test_large_frame_delta_is_clamped() {
        let mut engine = engine();
        let id = engine.spawn_monster(1, Difficulty::Easy, None, None);
        engine.tick(1000.0);
        engine.tick(61_000.0);
        assert_eq!(engine.clock_ms(), 100.0);
        let monster = engine.monster(id).expect("still flying");
        assert_eq!(monster.elapsed_ms, 100.0);
    }

    #[test]
    fn test_pause_preserves_state_and_skips_gap() {
        let mut engine = engine();
        let id = engine.spawn_monster(1, Difficulty::Easy, None, None);
        engine.tick(0.0);
        engine.tick(50.0);
        let before = engine.monster(id).map(|m| m.pos);

        engine.pause();
        engine.tick(80.0);
        engine.tick(5_000.0);
        assert_eq!(engine.monster(id).map(|m| m.pos), before);

        engine.start();
        engine.tick(10_000.0);
        assert_eq!(engine.monster(id).map(|m| m.pos), before, "resume tick has zero delta");
        engine.tick(10_016.0);
        assert_ne!(engine.monster(id).map(|m| m.pos), before);
    }

    #[test]
    fn test_stop_discards_pending_destruction() {
        let mut engine = engine();
        let id = engine.spawn_monster(1, Difficulty::Easy, None, None);
        engine.destroy_monster(id, true);
        engine.stop();
        engine.drain_events();
        assert!(engine.monsters().is_empty());

        engine.start();
        engine.advance(100.0);
        assert!(!engine.drain_events().contains(&EngineEvent::MonsterDestroyed { id }));
        assert_eq!(engine.status(), EngineStatus::Running);
    }

    #[test]
    fn test_ticks_ignored_when_stopped() {
        let mut engine = Engine::new(&Settings::default());
        engine.spawn_monster(1, Difficulty::Easy, None, None);
        engine.advance(16.0);
        assert_eq!(engine.clock_ms(), 0.0);
    }

    #[test]
    fn test_state_updates_are_coalesced() {
        let mut engine = engine();
        engine.spawn_monster(1, Difficulty::Easy, None, None);
        engine.spawn_monster(1, Difficulty::Easy, None, None);
        engine.advance(16.0);
        assert_eq!(engine.drain_events(), vec![EngineEvent::StateUpdated]);
    }

    #[derive(Default)]
    struct Recorder {
        reached: Vec<(u32, u32)>,
        destroyed: Vec<u32>,
        updates: usize,
        last_count: usize,
    }

    struct Shared(Rc<RefCell<Recorder>>);

    impl EngineObserver for Shared {
        fn on_monster_reach_player(&mut self, id: u32, damage: u32) {
            self.0.borrow_mut().reached.push((id, damage));
        }
        fn on_monster_destroyed(&mut self, id: u32) {
            self.0.borrow_mut().destroyed.push(id);
        }
        fn on_state_update(&mut self, state: &EngineSnapshot) {
            let mut r = self.0.borrow_mut();
            r.updates += 1;
            r.last_count = state.monsters.len();
        }
    }

    #[test]
    fn test_registered_observer_receives_events() {
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        let mut engine = engine();
        engine.set_observer(Some(Box::new(Shared(recorder.clone()))));

        engine.spawn_monster(1, Difficulty::Easy, None, None);
        assert_eq!(recorder.borrow().updates, 1);
        assert_eq!(recorder.borrow().last_count, 1);

        assert!(engine.add_monster(monster_near(&engine, 900, 45.0)));
        engine.advance(50.0);
        {
            let r = recorder.borrow();
            assert_eq!(r.reached, vec![(900, 1)]);
            assert_eq!(r.destroyed, vec![900]);
            assert_eq!(r.last_count, 1);
        }
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn test_invalid_settings_still_remove_destroyed_monsters() {
        let settings = Settings {
            max_frame_dt_ms: -10.0,
            ..Settings::default()
        };
        let mut engine = Engine::new(&settings);
        engine.start();
        let id = engine.spawn_monster(1, Difficulty::Easy, None, None);
        assert!(engine.destroy_monster(id, true));
        for _ in 0..1000 {
            engine.advance(16.0);
        }
        assert_eq!(engine.clock_ms(), 16_000.0);
        assert!(engine.monster(id).is_none());
    }

    #[test]
    fn test_monsters_chase_a_moving_avatar() {
        let mut engine = engine();
        let start = engine.avatar_pos();
        assert!(engine.add_monster(monster_near(&engine, 1, 200.0)));
        engine.advance(FRAME_DT_MS);

        let moved = start + Vec2::new(0.0, -100.0);
        engine.set_avatar_pos(moved);
        engine.advance(FRAME_DT_MS);

        let monster = engine.monster(1).expect("still flying");
        assert_eq!(monster.target_pos, moved);
        let leg = crate::distance(monster.spawn_pos, moved);
        let via = crate::distance(monster.spawn_pos, monster.pos) + crate::distance(monster.pos, moved);
        assert!((via - leg).abs() < 1e-3, "left the spawn-to-avatar segment");
        assert!(monster.progress() > 0.0);
    }

    #[test]
    fn test_render_does_not_mutate() {
        let mut engine = engine();
        engine.spawn_monster(1, Difficulty::Easy, None, None);
        engine.advance(500.0);
        let before = serde_json::to_string(&engine.snapshot()).expect("serialize");
        let vertices = engine.render();
        let again = engine.render();
        assert!(!vertices.is_empty());
        assert_eq!(vertices.len(), again.len());
        assert_eq!(serde_json::to_string(&engine.snapshot()).expect("serialize"), before);
    }
}
