//! Kind registry and collision rule table
//!
//! Every collidable entity has a kind. A kind owns one bit (`mask`) and the union of
//! its own bit with all of its ancestors' bits (`flags`). A rule is registered between
//! two kinds and applies to any pair whose flags intersect the rule's masks, in either
//! order. When several rules apply, the one registered between the most derived kinds
//! (largest popcount of the two kinds' flags) wins; equal scores keep the rule that was
//! registered first.
//!
//! A kind may be named by a rule before it is registered itself. It then exists as a
//! placeholder with no bits, and registering it later fills in its bits in place so the
//! rules that already point at it start matching.

use std::cell::RefCell;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::consts::MAX_KINDS;

/// Bit set over kinds
pub type KindMask = u32;

/// Handle to a registered (or placeholder) kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KindId(usize);

impl KindId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Identifies the collision behavior a rule invokes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleId {
    /// Inelastic collision between two moving bodies
    GlobuleGlobule,
    /// Ball bouncing off a moving body
    BallGlobule,
    /// Same-group merge, otherwise inelastic collision
    DropletDroplet,
    /// Splitter releasing its parts when hit by the ball
    SplitterBall,
    /// Splitter merging with a droplet (and losing its splitting)
    SplitterDroplet,
    /// Body against the four field walls
    FieldGlobule,
    /// Ball against the field's left, right and top walls
    FieldBall,
    /// Ball against the paddle
    RacketBall,
    /// Body against a static convex polygon
    PolygonGlobule,
    /// Bounce pad kicking a body at its own speed
    FlickerGlobule,
    /// Bounce pad kicking the ball at the ball's speed
    FlickerBall,
    /// Radial push away from a force field center
    ForceFieldGlobule,
}

#[derive(Debug, Clone)]
struct KindInfo {
    name: String,
    mask: KindMask,
    flags: KindMask,
}

#[derive(Debug, Clone, Copy)]
struct Rule {
    first: KindId,
    second: KindId,
    /// `None` means the pair never collides
    action: Option<RuleId>,
}

/// Outcome of looking up the rule for a pair of kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Invoke `rule`; when `reversed` the arguments must be swapped
    Apply { rule: RuleId, reversed: bool },
    /// An explicit never-collide rule won
    Ignore,
    /// No rule covers this pair
    Unmatched,
}

/// Registry of kinds and rules, owned by one simulation
#[derive(Debug, Default)]
pub struct ClassRegistry {
    kinds: Vec<KindInfo>,
    rules: Vec<Rule>,
    /// Number of bits handed out so far
    bits_used: usize,
    resolved: RefCell<HashMap<(KindId, KindId), Resolution>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` as a kind specializing `parent` (if any).
    ///
    /// Returns the kind and whether this call performed the registration. A second call
    /// with the same name changes nothing and returns `false`; a placeholder created by
    /// `register_rule` is completed in place and returns `true`.
    ///
    /// # Panics
    ///
    /// When a 33rd kind needs a bit.
    pub fn register(&mut self, name: &str, parent: Option<KindId>) -> (KindId, bool) {
        let id = match self.find(name) {
            Some(id) if self.kinds[id.0].mask != 0 => return (id, false),
            Some(id) => {
                log::debug!("Completing forward-declared kind '{}'", name);
                id
            }
            None => {
                log::debug!("Registering kind '{}'", name);
                self.add_placeholder(name)
            }
        };

        if self.bits_used >= MAX_KINDS {
            log::error!("No kind bit left for '{}' ({} in use)", name, MAX_KINDS);
            panic!("kind registry exhausted: cannot register '{name}'");
        }
        let mask: KindMask = 1 << self.bits_used;
        self.bits_used += 1;

        let parent_flags = parent.map_or(0, |p| self.kinds[p.0].flags);
        let info = &mut self.kinds[id.0];
        info.mask = mask;
        info.flags = mask | parent_flags;
        log::debug!(
            "  kind '{}': mask = {:#034b}, flags = {:#034b}",
            info.name,
            info.mask,
            info.flags
        );

        self.resolved.borrow_mut().clear();
        (id, true)
    }

    /// Register a rule between `kind` and the kind called `other`.
    ///
    /// `other` is forward-declared if it doesn't exist yet. `None` registers an explicit
    /// never-collide rule.
    pub fn register_rule(&mut self, kind: KindId, other: &str, action: Option<RuleId>) {
        let other_id = match self.find(other) {
            Some(id) => id,
            None => self.add_placeholder(other),
        };
        self.rules.push(Rule {
            first: kind,
            second: other_id,
            action,
        });
        self.resolved.borrow_mut().clear();
        log::debug!(
            "Registered rule '{}' <=> '{}' ({:?})",
            self.kinds[kind.0].name,
            other,
            action
        );
    }

    /// Look up a kind by name
    pub fn find(&self, name: &str) -> Option<KindId> {
        self.kinds.iter().position(|k| k.name == name).map(KindId)
    }

    pub fn name(&self, kind: KindId) -> &str {
        &self.kinds[kind.0].name
    }

    pub fn mask(&self, kind: KindId) -> KindMask {
        self.kinds[kind.0].mask
    }

    pub fn flags(&self, kind: KindId) -> KindMask {
        self.kinds[kind.0].flags
    }

    /// Whether `kind` has been fully registered (not just forward-declared)
    pub fn is_registered(&self, kind: KindId) -> bool {
        self.kinds[kind.0].flags != 0
    }

    /// Whether `kind` is the kind called `name` or specializes it
    pub fn is_a(&self, kind: KindId, name: &str) -> bool {
        self.find(name)
            .is_some_and(|other| self.kinds[kind.0].flags & self.kinds[other.0].mask != 0)
    }

    pub fn kind_count(&self) -> usize {
        self.kinds.len()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Select the rule for a (self, other) pair of kinds
    pub fn resolve(&self, this: KindId, other: KindId) -> Resolution {
        if let Some(cached) = self.resolved.borrow().get(&(this, other)) {
            return *cached;
        }
        let resolution = self.scan(this, other);
        self.resolved.borrow_mut().insert((this, other), resolution);
        resolution
    }

    fn scan(&self, this: KindId, other: KindId) -> Resolution {
        let this_flags = self.kinds[this.0].flags;
        let other_flags = self.kinds[other.0].flags;

        let mut best: Option<(&Rule, bool)> = None;
        let mut best_score = 0;

        for rule in &self.rules {
            let first = &self.kinds[rule.first.0];
            let second = &self.kinds[rule.second.0];

            let reversed = if this_flags & first.mask != 0 && other_flags & second.mask != 0 {
                false
            } else if this_flags & second.mask != 0 && other_flags & first.mask != 0 {
                true
            } else {
                continue;
            };

            let score = first.flags.count_ones() + second.flags.count_ones();
            if score > best_score {
                best_score = score;
                best = Some((rule, reversed));
            }
        }

        match best {
            Some((rule, reversed)) => match rule.action {
                Some(rule) => Resolution::Apply { rule, reversed },
                None => Resolution::Ignore,
            },
            None => Resolution::Unmatched,
        }
    }

    fn add_placeholder(&mut self, name: &str) -> KindId {
        self.kinds.push(KindInfo {
            name: name.to_string(),
            mask: 0,
            flags: 0,
        });
        KindId(self.kinds.len() - 1)
    }
}
