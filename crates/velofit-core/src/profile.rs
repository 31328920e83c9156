//! Riding styles and their ideal-range profiles.
//!
//! A [`ProfileTable`] maps every [`RidingStyle`] to a [`RangeProfile`]: per
//! angle, the ideal `{min, max}` in degrees and a relative scoring weight.
//! Tables are loaded from JSON shaped like
//!
//! ```json
//! {
//!   "version": 1,
//!   "road": { "knee_extension": { "min": 140, "max": 150, "weight": 30 } }
//! }
//! ```
//!
//! and validated in full at load time. The `version` key is optional. A key
//! repeated within one object is an error rather than last-one-wins.
//!
//! # Example
//!
//! ```rust
//! use velofit_core::profile::ProfileTable;
//! use velofit_core::frame::AngleKind;
//!
//! let table = ProfileTable::builtin().unwrap();
//! let road = table.for_style("road").unwrap();
//! let knee = road.range(AngleKind::KneeExtension).unwrap();
//! assert_eq!((knee.min(), knee.max()), (140.0, 150.0));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;
use std::str::FromStr;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, FitError, FitResult};
use crate::frame::AngleKind;

/// Schema version of the profile table format.
pub const PROFILE_SCHEMA_VERSION: u64 = 1;

const BUILTIN_PROFILES: &str = include_str!("../config/angle_ranges.json");

// =============================================================================
// RidingStyle
// =============================================================================

/// Supported riding styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum RidingStyle {
    /// Road cycling.
    #[default]
    #[serde(rename = "road")]
    Road,
    /// Time trial / triathlon.
    #[serde(rename = "time-trial", alias = "tt")]
    TimeTrial,
    /// Mountain biking.
    #[serde(rename = "mountain", alias = "mtb")]
    Mountain,
    /// Gravel riding.
    #[serde(rename = "gravel")]
    Gravel,
    /// Commuting / upright city riding.
    #[serde(rename = "commute")]
    Commute,
}

impl RidingStyle {
    /// All supported styles.
    pub const ALL: [Self; 5] = [
        Self::Road,
        Self::TimeTrial,
        Self::Mountain,
        Self::Gravel,
        Self::Commute,
    ];

    /// Canonical identifier.
    #[must_use]
    pub fn id(&self) -> &'static str {
        match self {
            Self::Road => "road",
            Self::TimeTrial => "time-trial",
            Self::Mountain => "mountain",
            Self::Gravel => "gravel",
            Self::Commute => "commute",
        }
    }

    /// Display name.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Road => "Road",
            Self::TimeTrial => "Time Trial / Triathlon",
            Self::Mountain => "Mountain Bike",
            Self::Gravel => "Gravel",
            Self::Commute => "Commute / City",
        }
    }
}

impl fmt::Display for RidingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for RidingStyle {
    type Err = FitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "road" => Ok(Self::Road),
            "time-trial" | "tt" => Ok(Self::TimeTrial),
            "mountain" | "mtb" => Ok(Self::Mountain),
            "gravel" => Ok(Self::Gravel),
            "commute" => Ok(Self::Commute),
            _ => Err(FitError::unknown_style(s)),
        }
    }
}

// =============================================================================
// AngleRange
// =============================================================================

/// Ideal range and weight for one angle.
///
/// `max > min`, both finite, and `weight >= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AngleRange {
    min: f64,
    max: f64,
    weight: f64,
}

impl AngleRange {
    /// Creates a validated range.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a value is not finite, `max <= min`, or
    /// the weight is negative.
    pub fn new(min: f64, max: f64, weight: f64) -> Result<Self, ConfigError> {
        Self::checked("(unnamed)", "(unnamed)", min, max, weight)
    }

    fn checked(style: &str, angle: &str, min: f64, max: f64, weight: f64) -> Result<Self, ConfigError> {
        for (name, v) in [("min", min), ("max", max), ("weight", weight)] {
            if !v.is_finite() {
                return Err(ConfigError::invalid_value(
                    format!("{style}.{angle}.{name}"),
                    format!("must be a finite number, got {v}"),
                ));
            }
        }
        if max <= min {
            return Err(ConfigError::InvalidRange {
                style: style.to_string(),
                angle: angle.to_string(),
                min,
                max,
            });
        }
        if weight < 0.0 {
            return Err(ConfigError::NegativeWeight {
                style: style.to_string(),
                angle: angle.to_string(),
                weight,
            });
        }
        Ok(Self { min, max, weight })
    }

    /// Lower bound in degrees.
    #[must_use]
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Upper bound in degrees.
    #[must_use]
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Relative scoring weight.
    #[must_use]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// `max − min`; always positive.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    /// Returns `true` if `value` lies within `[min, max]`.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

// =============================================================================
// RangeProfile
// =============================================================================

/// Ideal ranges for one riding style.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeProfile {
    style: RidingStyle,
    ranges: BTreeMap<AngleKind, AngleRange>,
}

impl RangeProfile {
    /// Creates a profile from already-validated ranges.
    #[must_use]
    pub fn new(style: RidingStyle, ranges: impl IntoIterator<Item = (AngleKind, AngleRange)>) -> Self {
        Self {
            style,
            ranges: ranges.into_iter().collect(),
        }
    }

    /// The riding style this profile describes.
    #[must_use]
    pub fn style(&self) -> RidingStyle {
        self.style
    }

    /// Range for one angle, if the profile scores it.
    #[must_use]
    pub fn range(&self, kind: AngleKind) -> Option<&AngleRange> {
        self.ranges.get(&kind)
    }

    /// Weight for one angle; 0 if the profile does not score it.
    #[must_use]
    pub fn weight(&self, kind: AngleKind) -> f64 {
        self.range(kind).map_or(0.0, AngleRange::weight)
    }

    /// All profiled angles in canonical order.
    pub fn ranges(&self) -> impl Iterator<Item = (AngleKind, &AngleRange)> {
        self.ranges.iter().map(|(k, r)| (*k, r))
    }

    /// Per-angle weights.
    #[must_use]
    pub fn weights(&self) -> BTreeMap<AngleKind, f64> {
        self.ranges.iter().map(|(k, r)| (*k, r.weight)).collect()
    }
}

// =============================================================================
// ProfileTable
// =============================================================================

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRange {
    min: f64,
    max: f64,
    weight: f64,
}

/// Object entries in document order. Repeated keys are kept so the loader
/// can reject them; `serde_json::Map` would silently keep the last one.
struct Entries<V>(Vec<(String, V)>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Entries<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
            type Value = Entries<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, V>()? {
                    entries.push(entry);
                }
                Ok(Entries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

/// Top-level document: the `version` values seen and the style objects.
#[derive(Default)]
struct RawTable {
    versions: Vec<serde_json::Value>,
    styles: Vec<(String, Entries<RawRange>)>,
}

impl<'de> Deserialize<'de> for RawTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RawTableVisitor;

        impl<'de> Visitor<'de> for RawTableVisitor {
            type Value = RawTable;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a profile table object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut table = RawTable::default();
                while let Some(key) = map.next_key::<String>()? {
                    if key == "version" {
                        table.versions.push(map.next_value()?);
                    } else {
                        let ranges = map.next_value::<Entries<RawRange>>()?;
                        table.styles.push((key, ranges));
                    }
                }
                Ok(table)
            }
        }

        deserializer.deserialize_map(RawTableVisitor)
    }
}

/// Validated lookup table from riding style to [`RangeProfile`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileTable {
    profiles: BTreeMap<RidingStyle, RangeProfile>,
}

impl ProfileTable {
    /// The table compiled into the crate.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] only if the embedded table is malformed.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json_str(BUILTIN_PROFILES)
    }

    /// Parses and validates a table from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for unknown styles or angles, unknown fields,
    /// non-numeric or non-finite bounds, `max <= min`, negative weights, an
    /// unsupported `version`, a key repeated within one object, or a missing
    /// style.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let raw: RawTable =
            serde_json::from_str(json).map_err(|source| ConfigError::Parse { source })?;

        if raw.versions.len() > 1 {
            return Err(ConfigError::invalid_value("version", "listed more than once"));
        }
        if let Some(version) = raw.versions.first() {
            if version.as_u64() != Some(PROFILE_SCHEMA_VERSION) {
                return Err(ConfigError::invalid_value(
                    "version",
                    format!("unsupported profile schema version {version}, expected {PROFILE_SCHEMA_VERSION}"),
                ));
            }
        }

        let mut profiles = BTreeMap::new();
        for (style_key, Entries(entries)) in raw.styles {
            let style: RidingStyle = style_key.parse().map_err(|_| {
                ConfigError::invalid_value(style_key.clone(), "unknown riding style")
            })?;

            let mut ranges = BTreeMap::new();
            for (angle_key, r) in entries {
                let kind: AngleKind = angle_key.parse().map_err(|_| {
                    ConfigError::invalid_value(format!("{style_key}.{angle_key}"), "unknown angle")
                })?;
                let range = AngleRange::checked(&style_key, &angle_key, r.min, r.max, r.weight)?;
                if ranges.insert(kind, range).is_some() {
                    return Err(ConfigError::invalid_value(
                        format!("{style_key}.{angle_key}"),
                        "angle listed more than once",
                    ));
                }
            }
            if profiles
                .insert(style, RangeProfile { style, ranges })
                .is_some()
            {
                return Err(ConfigError::invalid_value(
                    style_key,
                    "riding style listed more than once",
                ));
            }
        }

        for style in RidingStyle::ALL {
            if !profiles.contains_key(&style) {
                return Err(ConfigError::MissingStyle {
                    style: style.id().to_string(),
                });
            }
        }

        debug!(styles = profiles.len(), "Loaded range profiles");
        Ok(Self { profiles })
    }

    /// Reads and validates a table from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileRead`] if the file cannot be read, or any
    /// error of [`ProfileTable::from_json_str`].
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Profile for a style.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingStyle`] wrapped in [`FitError`]; cannot
    /// happen for a table built by this module.
    pub fn profile(&self, style: RidingStyle) -> FitResult<&RangeProfile> {
        self.profiles.get(&style).ok_or_else(|| {
            FitError::from(ConfigError::MissingStyle {
                style: style.id().to_string(),
            })
        })
    }

    /// Profile for a style identifier such as `"road"` or `"tt"`.
    ///
    /// # Errors
    ///
    /// Returns [`FitError::UnknownStyle`] for identifiers outside the
    /// supported set.
    pub fn for_style(&self, style_id: &str) -> FitResult<&RangeProfile> {
        let style: RidingStyle = style_id.parse()?;
        self.profile(style)
    }

    /// All profiles in style order.
    pub fn profiles(&self) -> impl Iterator<Item = &RangeProfile> {
        self.profiles.values()
    }
}

/// Looks up a built-in profile by style identifier.
///
/// # Errors
///
/// Returns [`FitError::UnknownStyle`] for identifiers outside the supported
/// set.
pub fn for_style(style_id: &str) -> FitResult<RangeProfile> {
    let table = ProfileTable::builtin()?;
    table.for_style(style_id).cloned()
}
