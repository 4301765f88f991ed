//! Built-in kind lattice
//!
//! Each `ensure_*` registers its kind (parents first) and, only on the call that actually
//! registered it, the rules that kind contributes. Loaders call these for every object
//! they build, so rules are added once per kind no matter how many objects exist.
//!
//! ```text
//! Circle ─┬─ Globule ─┬─ Ball
//!         │           └─ Droplet ── Splitter
//!         ├─ Flicker
//!         └─ ForceField
//! Field   Racket   Polygon
//! ```

use super::registry::{ClassRegistry, KindId, RuleId};

pub const CIRCLE: &str = "Circle";
pub const GLOBULE: &str = "Globule";
pub const BALL: &str = "Ball";
pub const DROPLET: &str = "Droplet";
pub const SPLITTER: &str = "Splitter";
pub const FIELD: &str = "Field";
pub const RACKET: &str = "Racket";
pub const POLYGON: &str = "Polygon";
pub const FLICKER: &str = "Flicker";
pub const FORCE_FIELD: &str = "ForceField";

pub fn ensure_circle(reg: &mut ClassRegistry) -> KindId {
    reg.register(CIRCLE, None).0
}

pub fn ensure_globule(reg: &mut ClassRegistry) -> KindId {
    let parent = ensure_circle(reg);
    let (kind, fresh) = reg.register(GLOBULE, Some(parent));
    if fresh {
        reg.register_rule(kind, GLOBULE, Some(RuleId::GlobuleGlobule));
    }
    kind
}

pub fn ensure_ball(reg: &mut ClassRegistry) -> KindId {
    let parent = ensure_globule(reg);
    let (kind, fresh) = reg.register(BALL, Some(parent));
    if fresh {
        reg.register_rule(kind, GLOBULE, Some(RuleId::BallGlobule));
    }
    kind
}

pub fn ensure_droplet(reg: &mut ClassRegistry) -> KindId {
    let parent = ensure_globule(reg);
    let (kind, fresh) = reg.register(DROPLET, Some(parent));
    if fresh {
        reg.register_rule(kind, DROPLET, Some(RuleId::DropletDroplet));
    }
    kind
}

pub fn ensure_splitter(reg: &mut ClassRegistry) -> KindId {
    let parent = ensure_droplet(reg);
    let (kind, fresh) = reg.register(SPLITTER, Some(parent));
    if fresh {
        reg.register_rule(kind, BALL, Some(RuleId::SplitterBall));
        reg.register_rule(kind, DROPLET, Some(RuleId::SplitterDroplet));
    }
    kind
}

pub fn ensure_field(reg: &mut ClassRegistry) -> KindId {
    let (kind, fresh) = reg.register(FIELD, None);
    if fresh {
        reg.register_rule(kind, GLOBULE, Some(RuleId::FieldGlobule));
        reg.register_rule(kind, BALL, Some(RuleId::FieldBall));
    }
    kind
}

pub fn ensure_racket(reg: &mut ClassRegistry) -> KindId {
    let (kind, fresh) = reg.register(RACKET, None);
    if fresh {
        reg.register_rule(kind, GLOBULE, None);
        reg.register_rule(kind, BALL, Some(RuleId::RacketBall));
    }
    kind
}

pub fn ensure_polygon(reg: &mut ClassRegistry) -> KindId {
    let (kind, fresh) = reg.register(POLYGON, None);
    if fresh {
        reg.register_rule(kind, GLOBULE, Some(RuleId::PolygonGlobule));
    }
    kind
}

pub fn ensure_flicker(reg: &mut ClassRegistry) -> KindId {
    let parent = ensure_circle(reg);
    let (kind, fresh) = reg.register(FLICKER, Some(parent));
    if fresh {
        reg.register_rule(kind, GLOBULE, Some(RuleId::FlickerGlobule));
        reg.register_rule(kind, BALL, Some(RuleId::FlickerBall));
    }
    kind
}

pub fn ensure_force_field(reg: &mut ClassRegistry) -> KindId {
    let parent = ensure_circle(reg);
    let (kind, fresh) = reg.register(FORCE_FIELD, Some(parent));
    if fresh {
        reg.register_rule(kind, GLOBULE, Some(RuleId::ForceFieldGlobule));
    }
    kind
}
