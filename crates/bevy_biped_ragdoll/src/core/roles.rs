use bevy_reflect::Reflect;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

impl Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Left => write!(f, "Left"),
            Side::Right => write!(f, "Right"),
        }
    }
}

/// Anatomical role a skeleton node can play in a biped.
///
/// `Neck` and `Spine` name whole chains; the individual segments are addressed by index in
/// [`BipedSlots`].
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Head,
    HeadTip,
    Neck,
    Spine,
    Pelvis,
    Collar(Side),
    UpperArm(Side),
    Forearm(Side),
    Hand(Side),
    HandTip(Side),
    Hip(Side),
    LowerLeg(Side),
    Foot(Side),
    Toe(Side),
    ToeTip(Side),
}

impl Role {
    /// Roles a biped must have before any automation or ragdoll operation can run, in the
    /// order they are reported when missing.
    pub const REQUIRED: [Role; 15] = [
        Role::Head,
        Role::Spine,
        Role::Pelvis,
        Role::UpperArm(Side::Left),
        Role::Forearm(Side::Left),
        Role::Hand(Side::Left),
        Role::UpperArm(Side::Right),
        Role::Forearm(Side::Right),
        Role::Hand(Side::Right),
        Role::Hip(Side::Left),
        Role::LowerLeg(Side::Left),
        Role::Foot(Side::Left),
        Role::Hip(Side::Right),
        Role::LowerLeg(Side::Right),
        Role::Foot(Side::Right),
    ];

    pub fn side(&self) -> Option<Side> {
        match self {
            Role::Collar(side)
            | Role::UpperArm(side)
            | Role::Forearm(side)
            | Role::Hand(side)
            | Role::HandTip(side)
            | Role::Hip(side)
            | Role::LowerLeg(side)
            | Role::Foot(side)
            | Role::Toe(side)
            | Role::ToeTip(side) => Some(*side),
            _ => None,
        }
    }

    fn base_name(&self) -> &'static str {
        match self {
            Role::Head => "Head",
            Role::HeadTip => "HeadTip",
            Role::Neck => "Neck",
            Role::Spine => "Spine",
            Role::Pelvis => "Pelvis",
            Role::Collar(_) => "Collar",
            Role::UpperArm(_) => "UpperArm",
            Role::Forearm(_) => "Forearm",
            Role::Hand(_) => "Hand",
            Role::HandTip(_) => "HandTip",
            Role::Hip(_) => "Hip",
            Role::LowerLeg(_) => "LowerLeg",
            Role::Foot(_) => "Foot",
            Role::Toe(_) => "Toe",
            Role::ToeTip(_) => "ToeTip",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.side() {
            Some(side) => write!(f, "{}{}", side, self.base_name()),
            None => write!(f, "{}", self.base_name()),
        }
    }
}

/// Per-side limb slots.
#[derive(Debug, Clone, PartialEq)]
pub struct SideSlots<T> {
    pub collar: Option<T>,
    pub upper_arm: Option<T>,
    pub forearm: Option<T>,
    pub hand: Option<T>,
    pub hand_tip: Option<T>,
    pub hip: Option<T>,
    pub lower_leg: Option<T>,
    pub foot: Option<T>,
    pub toe: Option<T>,
    pub toe_tip: Option<T>,
}

impl<T> Default for SideSlots<T> {
    fn default() -> Self {
        Self {
            collar: None,
            upper_arm: None,
            forearm: None,
            hand: None,
            hand_tip: None,
            hip: None,
            lower_leg: None,
            foot: None,
            toe: None,
            toe_tip: None,
        }
    }
}

impl<T> SideSlots<T> {
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> SideSlots<U> {
        SideSlots {
            collar: self.collar.map(&mut f),
            upper_arm: self.upper_arm.map(&mut f),
            forearm: self.forearm.map(&mut f),
            hand: self.hand.map(&mut f),
            hand_tip: self.hand_tip.map(&mut f),
            hip: self.hip.map(&mut f),
            lower_leg: self.lower_leg.map(&mut f),
            foot: self.foot.map(&mut f),
            toe: self.toe.map(&mut f),
            toe_tip: self.toe_tip.map(&mut f),
        }
    }
}

/// Every role slot of a biped, holding whatever `T` identifies a part.
#[derive(Debug, Clone, PartialEq)]
pub struct BipedSlots<T> {
    pub head: Option<T>,
    pub head_tip: Option<T>,
    /// Ordered from the segment nearest the spine to the one nearest the head.
    pub neck: Vec<T>,
    /// Ordered from the segment nearest the pelvis to the one nearest the neck.
    pub spine: Vec<T>,
    pub pelvis: Option<T>,
    pub left: SideSlots<T>,
    pub right: SideSlots<T>,
}

impl<T> Default for BipedSlots<T> {
    fn default() -> Self {
        Self {
            head: None,
            head_tip: None,
            neck: Vec::new(),
            spine: Vec::new(),
            pelvis: None,
            left: SideSlots::default(),
            right: SideSlots::default(),
        }
    }
}

impl<T> BipedSlots<T> {
    pub fn side(&self, side: Side) -> &SideSlots<T> {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn side_mut(&mut self, side: Side) -> &mut SideSlots<T> {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> BipedSlots<U> {
        BipedSlots {
            head: self.head.map(&mut f),
            head_tip: self.head_tip.map(&mut f),
            neck: self.neck.into_iter().map(&mut f).collect(),
            spine: self.spine.into_iter().map(&mut f).collect(),
            pelvis: self.pelvis.map(&mut f),
            left: self.left.map(&mut f),
            right: self.right.map(&mut f),
        }
    }
}

impl<T: Copy> BipedSlots<T> {
    /// Value held by a single-valued role. Chain roles return their first segment.
    pub fn get(&self, role: Role) -> Option<T> {
        match role {
            Role::Head => self.head,
            Role::HeadTip => self.head_tip,
            Role::Neck => self.neck.first().copied(),
            Role::Spine => self.spine.first().copied(),
            Role::Pelvis => self.pelvis,
            Role::Collar(side) => self.side(side).collar,
            Role::UpperArm(side) => self.side(side).upper_arm,
            Role::Forearm(side) => self.side(side).forearm,
            Role::Hand(side) => self.side(side).hand,
            Role::HandTip(side) => self.side(side).hand_tip,
            Role::Hip(side) => self.side(side).hip,
            Role::LowerLeg(side) => self.side(side).lower_leg,
            Role::Foot(side) => self.side(side).foot,
            Role::Toe(side) => self.side(side).toe,
            Role::ToeTip(side) => self.side(side).toe_tip,
        }
    }

    /// Roles from [`Role::REQUIRED`] that hold no value, in that order.
    pub fn missing_required(&self) -> Vec<Role> {
        Role::REQUIRED
            .into_iter()
            .filter(|role| self.get(*role).is_none())
            .collect()
    }
}
