//! Level description
//!
//! A level is a JSON document naming the field, paddle and ball plus an ordered list of
//! extra objects. Values are range checked when the manager builds entities from them.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// RGBA color handed through to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    #[serde(default = "opaque")]
    pub alpha: f64,
}

fn opaque() -> f64 {
    1.0
}

impl Default for Color {
    fn default() -> Self {
        Self {
            red: 0.0,
            green: 0.0,
            blue: 0.0,
            alpha: 1.0,
        }
    }
}

impl Color {
    pub const fn rgb(red: f64, green: f64, blue: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha: 1.0,
        }
    }
}

/// Playfield region
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldConfig {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub image: Option<String>,
}

/// Paddle travel range and size
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RacketConfig {
    pub x_min: f64,
    pub x_max: f64,
    pub y: f64,
    /// Full paddle width
    pub width: f64,
    #[serde(default)]
    pub image: Option<String>,
}

/// The player's ball
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BallConfig {
    pub radius: f64,
    pub speed: f64,
    /// Defaults to radius² when absent
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub image: Option<String>,
}

/// A named level object
///
/// Entries with a `class` are built in list order. Entries without one are only part
/// definitions that splitters reference by name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectConfig {
    pub name: String,
    pub class: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub radius: Option<f64>,
    pub restitution: Option<f64>,
    pub weight: Option<f64>,
    pub vx: Option<f64>,
    pub vy: Option<f64>,
    pub group: Option<f64>,
    pub bg_color: Option<Color>,
    pub line_color: Option<Color>,
    pub effect_color: Option<Color>,
    pub speed: Option<f64>,
    pub force: Option<f64>,
    pub points: Vec<f64>,
    pub show_outline: bool,
    pub parts: Vec<String>,
    pub image: Option<String>,
}

impl ObjectConfig {
    /// Start an entry with the given name and class
    pub fn named(name: &str, class: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            class: class.map(str::to_string),
            ..Default::default()
        }
    }

    /// Fetch a required numeric key, checking it lies in `[min, max]`
    pub fn number(
        &self,
        key: &'static str,
        value: Option<f64>,
        min: f64,
        max: f64,
    ) -> Result<f64, ConfigError> {
        let value = value.ok_or_else(|| ConfigError::MissingKey {
            object: self.name.clone(),
            key,
        })?;
        ranged(&self.name, key, value, min, max)
    }

    /// Fetch an optional numeric key, checking it lies in `[min, max]` when present
    pub fn optional_number(
        &self,
        key: &'static str,
        value: Option<f64>,
        min: f64,
        max: f64,
    ) -> Result<Option<f64>, ConfigError> {
        value
            .map(|v| ranged(&self.name, key, v, min, max))
            .transpose()
    }
}

/// Check `value` against an inclusive range
pub fn ranged(
    object: &str,
    key: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<f64, ConfigError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange {
            object: object.to_string(),
            key,
            value,
            min,
            max,
        })
    }
}

/// Complete level description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Seed for droplet velocities, splitter bearings and effects
    #[serde(default)]
    pub seed: u64,
    pub field: FieldConfig,
    pub racket: RacketConfig,
    pub ball: BallConfig,
    #[serde(default)]
    pub objects: Vec<ObjectConfig>,
}

impl LevelConfig {
    /// Parse a level from JSON
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a level file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let level = Self::from_json(&json)?;
        log::info!(
            "Loaded level {} ({} objects)",
            path.display(),
            level.objects.len()
        );
        Ok(level)
    }

    /// Serialize back to pretty JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Look up an object entry by name
    pub fn object(&self, name: &str) -> Option<&ObjectConfig> {
        self.objects.iter().find(|o| o.name == name)
    }

    /// Objects that are constructed directly (have a class)
    pub fn classed_objects(&self) -> impl Iterator<Item = (&str, &ObjectConfig)> {
        self.objects
            .iter()
            .filter_map(|o| o.class.as_deref().map(|class| (class, o)))
    }

    /// Built-in level used by the headless runner and tests
    pub fn demo() -> Self {
        let red = Color::rgb(0.9, 0.3, 0.3);
        let blue = Color::rgb(0.3, 0.4, 0.9);
        let droplet = |name: &str, class: Option<&str>, x: f64, y: f64, r: f64, group: f64, color: Color| {
            ObjectConfig {
                x: Some(x),
                y: Some(y),
                radius: Some(r),
                restitution: Some(0.8),
                group: Some(group),
                bg_color: Some(color),
                line_color: Some(Color::default()),
                effect_color: Some(color),
                ..ObjectConfig::named(name, class)
            }
        };

        let mut splitter = droplet("blue-splitter", Some("Splitter"), 360.0, 300.0, 20.0, 2.0, blue);
        splitter.parts = vec!["blue-part-a".to_string(), "blue-part-b".to_string()];

        Self {
            seed: 2011,
            field: FieldConfig {
                x: 0.0,
                y: 0.0,
                width: 480.0,
                height: 640.0,
                image: Some("field.png".to_string()),
            },
            racket: RacketConfig {
                x_min: 0.0,
                x_max: 480.0,
                y: 600.0,
                width: 80.0,
                image: Some("racket.png".to_string()),
            },
            ball: BallConfig {
                radius: 8.0,
                speed: 5.0,
                weight: None,
                image: Some("ball.png".to_string()),
            },
            objects: vec![
                droplet("red-1", Some("Droplet"), 120.0, 150.0, 12.0, 1.0, red),
                droplet("red-2", Some("Droplet"), 360.0, 150.0, 10.0, 1.0, red),
                droplet("blue-1", Some("Droplet"), 120.0, 300.0, 12.0, 2.0, blue),
                splitter,
                droplet("blue-part-a", None, 0.0, 0.0, 8.0, 2.0, blue),
                droplet("blue-part-b", None, 0.0, 0.0, 8.0, 2.0, blue),
                ObjectConfig {
                    x: Some(210.0),
                    y: Some(420.0),
                    points: vec![0.0, 0.0, 60.0, 0.0, 30.0, 40.0],
                    show_outline: true,
                    ..ObjectConfig::named("bumper", Some("Polygon"))
                },
                ObjectConfig {
                    x: Some(60.0),
                    y: Some(450.0),
                    radius: Some(15.0),
                    speed: Some(6.0),
                    image: Some("flicker.png".to_string()),
                    ..ObjectConfig::named("flicker", Some("Flicker"))
                },
                ObjectConfig {
                    x: Some(420.0),
                    y: Some(450.0),
                    radius: Some(40.0),
                    force: Some(0.5),
                    ..ObjectConfig::named("fountain", Some("ForceField"))
                },
            ],
        }
    }
}
