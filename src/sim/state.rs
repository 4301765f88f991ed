//! Simulation manager and game phase
//!
//! The manager owns every entity, split into a movable and a fixed partition, together
//! with the kind registry and the seeded RNG. Loading a level builds a complete new
//! population first and only swaps it in once every object was built, so a bad level
//! leaves the running game untouched.

use std::collections::HashSet;

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::{Entity, ObjectId, ObjectIdPool, Prototype, Shape};
use super::field::Field;
use super::racket::Racket;
use super::registry::ClassRegistry;
use super::vector::Vector2;
use super::{ball, droplet, field, flicker, force_field, kinds, polygon, racket, splitter};
use crate::consts::BALL_REST_GAP;
use crate::error::ConfigError;
use crate::level::LevelConfig;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Ball rests on the paddle, waiting for launch
    Standby,
    /// Ball in play
    Playing,
    /// Ball slipped past the paddle
    GameOver,
    /// No two droplets share a group
    GameClear,
}

impl GamePhase {
    /// Only a reinitialize leaves these
    pub fn is_terminal(self) -> bool {
        matches!(self, GamePhase::GameOver | GamePhase::GameClear)
    }
}

/// Entities of one level plus the bookkeeping that goes with them
#[derive(Debug)]
pub(crate) struct World {
    pub(crate) ids: ObjectIdPool,
    pub(crate) fixed: Vec<Entity>,
    pub(crate) movable: Vec<Entity>,
    pub(crate) field: Option<ObjectId>,
    pub(crate) racket: Option<ObjectId>,
    pub(crate) ball: Option<ObjectId>,
    /// Physics randomness (droplet velocities, splitter bearings)
    pub(crate) rng: Pcg32,
    /// Render-only randomness (flicker jitter)
    pub(crate) effects_rng: Pcg32,
}

impl World {
    fn empty(seed: u64) -> Self {
        Self {
            ids: ObjectIdPool::new(),
            fixed: Vec::new(),
            movable: Vec::new(),
            field: None,
            racket: None,
            ball: None,
            rng: Pcg32::seed_from_u64(seed),
            effects_rng: Pcg32::seed_from_u64(seed.wrapping_add(1)),
        }
    }

    /// Build field, paddle and ball, then every classed object in list order
    fn build(registry: &mut ClassRegistry, level: &LevelConfig) -> Result<Self, ConfigError> {
        let mut world = Self::empty(level.seed);
        world.field = Some(world.attach(field::load(registry, &level.field)?));
        world.racket = Some(world.attach(racket::load(registry, &level.racket)?));
        world.ball = Some(world.attach(ball::load(registry, &level.ball)?));

        for (class, config) in level.classed_objects() {
            log::debug!("Building '{}' as '{}'", config.name, class);
            let proto = match class {
                kinds::DROPLET => droplet::load(registry, config, &mut world.rng)?,
                kinds::SPLITTER => splitter::load(registry, level, config, &mut world.rng)?,
                kinds::POLYGON => polygon::load(registry, config)?,
                kinds::FLICKER => flicker::load(registry, config)?,
                kinds::FORCE_FIELD => force_field::load(registry, config)?,
                other => {
                    return Err(ConfigError::UnknownClass {
                        object: config.name.clone(),
                        class: other.to_string(),
                    });
                }
            };
            world.attach(proto);
        }
        Ok(world)
    }

    /// Give a prototype an identity and add it to its partition
    pub(crate) fn attach(&mut self, proto: Prototype) -> ObjectId {
        let id = self.ids.acquire(&proto.name);
        let entity = Entity::new(id, proto);
        if entity.is_movable() {
            log::debug!("Attached '{}' to the movable set", entity.name());
            self.movable.push(entity);
        } else {
            log::debug!("Attached '{}' to the fixed set", entity.name());
            self.fixed.push(entity);
        }
        id
    }

    /// Drop dead movables and recycle their identities
    pub(crate) fn reap(&mut self) {
        let ids = &mut self.ids;
        let ball = &mut self.ball;
        self.movable.retain(|entity| {
            if entity.is_alive() {
                return true;
            }
            ids.release(entity.id());
            if *ball == Some(entity.id()) {
                *ball = None;
            }
            log::debug!("Freed '{}'", entity.name());
            false
        });
    }

    pub(crate) fn remove_ball(&mut self) {
        let Some(id) = self.ball.take() else {
            return;
        };
        if let Some(index) = self.movable.iter().position(|e| e.id() == id) {
            let entity = self.movable.remove(index);
            self.ids.release(id);
            log::debug!("Freed '{}'", entity.name());
        }
    }

    fn find(&self, id: ObjectId) -> Option<&Entity> {
        self.fixed.iter().chain(&self.movable).find(|e| e.id() == id)
    }

    fn find_mut(&mut self, id: ObjectId) -> Option<&mut Entity> {
        self.fixed
            .iter_mut()
            .chain(&mut self.movable)
            .find(|e| e.id() == id)
    }
}

/// Owner of the entities of one game session
#[derive(Debug)]
pub struct Manager {
    pub(crate) registry: ClassRegistry,
    level: LevelConfig,
    pub(crate) phase: GamePhase,
    pub(crate) world: World,
    pub(crate) time_ticks: u64,
}

impl Manager {
    /// Build a manager and populate it from `level`
    pub fn new(level: LevelConfig) -> Result<Self, ConfigError> {
        let mut registry = ClassRegistry::new();
        let world = World::build(&mut registry, &level)?;
        let mut manager = Self {
            registry,
            level,
            phase: GamePhase::Standby,
            world,
            time_ticks: 0,
        };
        manager.reset();
        Ok(manager)
    }

    /// Replace the current level. On error nothing changes.
    pub fn load_level(&mut self, level: LevelConfig) -> Result<(), ConfigError> {
        self.world = World::build(&mut self.registry, &level)?;
        self.level = level;
        self.reset();
        Ok(())
    }

    /// Rebuild the current level from scratch. On error nothing changes.
    pub fn reinitialize(&mut self) -> Result<(), ConfigError> {
        self.world = World::build(&mut self.registry, &self.level)?;
        self.reset();
        Ok(())
    }

    fn reset(&mut self) {
        self.phase = GamePhase::Standby;
        self.time_ticks = 0;
        match self.racket().map(|r| r.x) {
            Some(x) => self.move_paddle(x),
            None => log::error!("Level has no paddle"),
        }
        log::info!(
            "Level ready: {} fixed, {} movable",
            self.world.fixed.len(),
            self.world.movable.len()
        );
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    pub fn level(&self) -> &LevelConfig {
        &self.level
    }

    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    /// Whether `entity` is of kind `name` or a specialization of it
    pub fn is_a(&self, entity: &Entity, name: &str) -> bool {
        self.registry.is_a(entity.kind(), name)
    }

    pub fn field(&self) -> Option<&Field> {
        match self.world.field.and_then(|id| self.world.find(id)).map(|e| &e.shape) {
            Some(Shape::Field(field)) => Some(field),
            _ => None,
        }
    }

    pub fn racket(&self) -> Option<&Racket> {
        match self.world.racket.and_then(|id| self.world.find(id)).map(|e| &e.shape) {
            Some(Shape::Racket(racket)) => Some(racket),
            _ => None,
        }
    }

    pub fn ball(&self) -> Option<&Entity> {
        self.world.ball.and_then(|id| self.world.find(id))
    }

    /// Field width, 0.0 without a field
    pub fn width(&self) -> f64 {
        match self.field() {
            Some(field) => field.width(),
            None => {
                log::error!("width() without a field");
                0.0
            }
        }
    }

    /// Field height, 0.0 without a field
    pub fn height(&self) -> f64 {
        match self.field() {
            Some(field) => field.height(),
            None => {
                log::error!("height() without a field");
                0.0
            }
        }
    }

    pub fn fixed(&self) -> &[Entity] {
        &self.world.fixed
    }

    pub fn movable(&self) -> &[Entity] {
        &self.world.movable
    }

    /// Fixed entities first, then movables, in draw order
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.world.fixed.iter().chain(&self.world.movable)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Entity> {
        self.entities().find(|e| e.name() == name)
    }

    /// Number of live object identities
    pub fn object_count(&self) -> usize {
        self.world.ids.in_use()
    }

    /// Move the paddle (clamped to its range); the ball follows while in standby
    pub fn move_paddle(&mut self, x: f64) {
        let Some(entity) = self.world.racket.and_then(|id| self.world.find_mut(id)) else {
            log::error!("move_paddle() without a paddle");
            return;
        };
        let Shape::Racket(racket) = &mut entity.shape else {
            log::error!("Paddle handle points at '{}'", entity.name());
            return;
        };
        racket.move_to(x);
        entity.body.position.x = racket.x;
        let (x, y) = (racket.x, racket.y);

        if self.phase == GamePhase::Standby {
            match self.world.ball.and_then(|id| self.world.find_mut(id)) {
                Some(ball) => {
                    let lift = ball.body.radius + BALL_REST_GAP;
                    ball.body.position = Vector2::new(x, y - lift);
                }
                None => log::error!("move_paddle() in standby without a ball"),
            }
        }
    }

    /// Launch the ball; only effective in standby
    pub fn launch(&mut self) {
        if self.phase != GamePhase::Standby {
            log::warn!("launch() ignored in {:?}", self.phase);
            return;
        }
        let Some(entity) = self.world.ball.and_then(|id| self.world.find_mut(id)) else {
            log::error!("launch() without a ball");
            return;
        };
        match &entity.shape {
            Shape::Ball(state) => ball::launch(&mut entity.body, state),
            _ => {
                log::error!("Ball handle points at '{}'", entity.name());
                return;
            }
        }
        self.phase = GamePhase::Playing;
        log::info!("Ball launched");
    }

    /// Whether no two droplets share a group
    pub fn is_cleared(&self) -> bool {
        let mut groups = HashSet::new();
        self.world
            .movable
            .iter()
            .filter(|e| self.is_a(e, kinds::DROPLET))
            .filter_map(|e| e.shape.droplet())
            .all(|d| groups.insert(d.group))
    }

    /// Step render-only state: merge rings and flicker afterglow
    pub fn update_visuals(&mut self) {
        let World {
            fixed,
            movable,
            effects_rng,
            ..
        } = &mut self.world;
        for entity in fixed.iter_mut().chain(movable.iter_mut()) {
            match &mut entity.shape {
                Shape::Droplet(droplet) => droplet.update_effect(),
                Shape::Splitter(splitter) => splitter.droplet.update_effect(),
                Shape::Flicker(flicker) => flicker.update_effect(effects_rng),
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_level_population() {
        let manager = Manager::new(LevelConfig::demo()).unwrap();
        assert_eq!(manager.phase(), GamePhase::Standby);
        // field, racket, polygon, flicker, force field
        assert_eq!(manager.fixed().len(), 5);
        // ball, three droplets, splitter
        assert_eq!(manager.movable().len(), 5);
        assert_eq!(manager.object_count(), 10);
        assert_eq!(manager.width(), 480.0);
        assert_eq!(manager.height(), 640.0);
        let splitter = manager.find_by_name("blue-splitter").unwrap();
        assert!(manager.is_a(splitter, kinds::DROPLET));
        assert!(manager.find_by_name("blue-part-a").is_none());
    }

    #[test]
    fn test_ball_rests_on_paddle_center() {
        let manager = Manager::new(LevelConfig::demo()).unwrap();
        let ball = manager.ball().unwrap();
        assert_eq!(ball.position(), Vector2::new(240.0, 600.0 - 8.5));
        assert_eq!(manager.racket().unwrap().x, 240.0);
    }

    #[test]
    fn test_ball_follows_paddle_until_launch() {
        let mut manager = Manager::new(LevelConfig::demo()).unwrap();
        manager.move_paddle(100.0);
        assert_eq!(manager.ball().unwrap().position().x, 100.0);
        manager.move_paddle(-50.0);
        assert_eq!(manager.racket().unwrap().x, 40.0);

        manager.launch();
        assert_eq!(manager.phase(), GamePhase::Playing);
        assert_eq!(manager.ball().unwrap().velocity(), Vector2::new(0.0, -5.0));

        manager.move_paddle(300.0);
        assert_eq!(manager.ball().unwrap().position().x, 40.0);
        manager.launch();
        assert_eq!(manager.phase(), GamePhase::Playing);
    }

    #[test]
    fn test_unknown_class_leaves_state_intact() {
        let mut manager = Manager::new(LevelConfig::demo()).unwrap();
        manager.launch();
        let mut level = LevelConfig::demo();
        level.objects[0].class = Some("Teapot".to_string());
        assert!(matches!(
            manager.load_level(level),
            Err(ConfigError::UnknownClass { .. })
        ));
        assert_eq!(manager.phase(), GamePhase::Playing);
        assert_eq!(manager.movable().len(), 5);
        assert_eq!(manager.level().objects[0].class.as_deref(), Some("Droplet"));
    }

    #[test]
    fn test_reinitialize_returns_to_standby() {
        let mut manager = Manager::new(LevelConfig::demo()).unwrap();
        manager.launch();
        manager.reinitialize().unwrap();
        assert_eq!(manager.phase(), GamePhase::Standby);
        assert_eq!(manager.object_count(), 10);
        assert_eq!(manager.ball().unwrap().velocity(), Vector2::ZERO);
    }

    #[test]
    fn test_same_seed_same_droplets() {
        let a = Manager::new(LevelConfig::demo()).unwrap();
        let b = Manager::new(LevelConfig::demo()).unwrap();
        for (x, y) in a.movable().iter().zip(b.movable()) {
            assert_eq!(x.velocity(), y.velocity());
        }
    }

    #[test]
    fn test_demo_level_is_not_cleared() {
        let manager = Manager::new(LevelConfig::demo()).unwrap();
        assert!(!manager.is_cleared());
    }
}
