use bevy_log::debug;
use bevy_reflect::Reflect;
use serde::{Deserialize, Serialize};

use crate::core::{
    errors::BipedResult,
    roles::Side,
    skeleton::{NodeId, SkeletonHierarchy},
};

/// Name tokens a rig uses for each anatomical role.
///
/// Full node names are built as `character_name_prefix + side prefix + token`, where the side
/// prefix is `center_prefix` for axial parts. Defaults match the HumanIK convention.
#[derive(Reflect, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConvention {
    pub character_name_prefix: String,
    pub center_prefix: String,
    pub left_prefix: String,
    pub right_prefix: String,
    pub head: String,
    pub neck: String,
    pub spine: String,
    pub pelvis: String,
    pub upper_leg: String,
    pub lower_leg: String,
    pub foot: String,
    /// Token of the toe itself, not the toe base.
    pub toe: String,
    pub collar: String,
    pub upper_arm: String,
    pub forearm: String,
    pub hand: String,
    /// Token of the finger used as the hand tip, not the finger base.
    pub hand_tip: String,
}

impl Default for NamingConvention {
    fn default() -> Self {
        Self::human_ik()
    }
}

impl NamingConvention {
    /// 3ds Max Biped names, e.g. `Bip01 L Thigh`.
    pub fn max(character_name_prefix: impl Into<String>) -> Self {
        Self {
            character_name_prefix: character_name_prefix.into(),
            center_prefix: "".into(),
            left_prefix: "L ".into(),
            right_prefix: "R ".into(),
            head: "Head".into(),
            neck: "Neck".into(),
            spine: "Spine".into(),
            pelvis: "Pelvis".into(),
            upper_leg: "Thigh".into(),
            lower_leg: "Calf".into(),
            foot: "Foot".into(),
            toe: "Toe".into(),
            collar: "Clavicle".into(),
            upper_arm: "UpperArm".into(),
            forearm: "Forearm".into(),
            hand: "Hand".into(),
            hand_tip: "Finger".into(),
        }
    }

    pub fn maya() -> Self {
        Self {
            character_name_prefix: "".into(),
            center_prefix: "Center".into(),
            left_prefix: "Left".into(),
            right_prefix: "Right".into(),
            head: "Head".into(),
            neck: "Neck".into(),
            spine: "Spine".into(),
            pelvis: "Root".into(),
            upper_leg: "Hip".into(),
            lower_leg: "Knee".into(),
            foot: "Foot".into(),
            toe: "Toe".into(),
            collar: "Collar".into(),
            upper_arm: "Shoulder".into(),
            forearm: "Elbow".into(),
            hand: "Hand".into(),
            hand_tip: "MiddleFinger".into(),
        }
    }

    pub fn human_ik() -> Self {
        Self {
            character_name_prefix: "".into(),
            center_prefix: "".into(),
            left_prefix: "Left".into(),
            right_prefix: "Right".into(),
            head: "Head".into(),
            neck: "Neck".into(),
            spine: "Spine".into(),
            pelvis: "Hips".into(),
            upper_leg: "UpLeg".into(),
            lower_leg: "Leg".into(),
            foot: "Foot".into(),
            toe: "FootMiddle".into(),
            collar: "Shoulder".into(),
            upper_arm: "Arm".into(),
            forearm: "ForeArm".into(),
            hand: "Hand".into(),
            hand_tip: "HandMiddle".into(),
        }
    }

    /// Full name of an axial node with the given token.
    pub fn center(&self, token: &str) -> String {
        format!("{}{}{}", self.character_name_prefix, self.center_prefix, token)
    }

    /// Full name of a lateral node with the given token.
    pub fn sided(&self, side: Side, token: &str) -> String {
        let side_prefix = match side {
            Side::Left => &self.left_prefix,
            Side::Right => &self.right_prefix,
        };
        format!("{}{}{}", self.character_name_prefix, side_prefix, token)
    }

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

/// Selects a [`NamingConvention`].
#[derive(Reflect, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NamingPreset {
    /// 3ds Max Biped. The character name prefix is detected from the skeleton.
    Max,
    Maya,
    HumanIk,
    Custom(NamingConvention),
}

impl Default for NamingPreset {
    fn default() -> Self {
        Self::HumanIk
    }
}

impl NamingPreset {
    /// The preset's convention without looking at a skeleton. [`NamingPreset::Max`] gets an
    /// empty character name prefix.
    pub fn convention(&self) -> NamingConvention {
        match self {
            NamingPreset::Max => NamingConvention::max(""),
            NamingPreset::Maya => NamingConvention::maya(),
            NamingPreset::HumanIk => NamingConvention::human_ik(),
            NamingPreset::Custom(convention) => convention.clone(),
        }
    }

    /// Produces the concrete convention for the hierarchy under `root`.
    pub fn resolve<S: SkeletonHierarchy + ?Sized>(
        &self,
        scene: &S,
        root: NodeId,
    ) -> NamingConvention {
        match self {
            NamingPreset::Max => {
                let pelvis = NamingConvention::max("").pelvis;
                let prefix = find_character_name_prefix(scene, root, &pelvis);
                debug!("Detected character name prefix {:?}", prefix);
                NamingConvention::max(prefix)
            }
            other => other.convention(),
        }
    }
}

/// Everything before `token` in the name of the first node under `root` whose name ends with
/// it. Empty if no such node exists.
pub fn find_character_name_prefix<S: SkeletonHierarchy + ?Sized>(
    scene: &S,
    root: NodeId,
    token: &str,
) -> String {
    scene
        .descendants(root)
        .into_iter()
        .filter_map(|node| scene.name(node))
        .find_map(|name| name.strip_suffix(token))
        .unwrap_or_default()
        .to_string()
}
