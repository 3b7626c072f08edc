use bevy_reflect::Reflect;
use serde::{Deserialize, Serialize};

use crate::core::{errors::BipedResult, naming::NamingPreset};

/// Construction parameters of a [`Biped`](super::Biped), usually stored as a `*.biped.ron` file.
///
/// ```ron
/// (
///     total_mass: 72.5,
///     naming: Custom((
///         character_name_prefix: "mixamorig:",
///     )),
/// )
/// ```
#[derive(Reflect, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BipedConfig {
    /// Total mass in kilograms, shared among the parts by anatomical proportion.
    pub total_mass: f32,
    /// Whether [`Biped::initialize`](super::Biped::initialize) distributes mass.
    pub auto_distribute_mass: bool,
    pub naming: NamingPreset,
}

impl Default for BipedConfig {
    fn default() -> Self {
        Self {
            total_mass: 80.,
            auto_distribute_mass: true,
            naming: NamingPreset::default(),
        }
    }
}

impl BipedConfig {
    pub fn from_ron(source: &str) -> BipedResult<Self> {
        Ok(ron::de::from_str(source)?)
    }

    pub fn to_ron(&self) -> BipedResult<String> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }
}
