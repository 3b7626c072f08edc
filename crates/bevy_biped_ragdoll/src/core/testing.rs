//! Rigs and recording backends shared by the unit tests.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU32, Ordering},
    },
};

use bevy_transform::components::Transform;

use crate::core::{
    animation::AnimationDriver,
    physics::{ColliderDesc, JointDesc, PhysicsBackend, PhysicsHandle, RigidBodyDesc},
    roles::Side,
    skeleton::{NodeId, Skeleton, SkeletonHierarchy},
};

struct LimbNames {
    collar: Option<String>,
    upper_arm: String,
    forearm: String,
    hand: String,
    fingers: Vec<String>,
    hip: String,
    lower_leg: String,
    foot: String,
    toe: Option<String>,
    toe_tip: Option<String>,
}

struct RigNames {
    root: String,
    pelvis: String,
    spine: Vec<String>,
    neck: Vec<String>,
    head: String,
    head_tip: Option<String>,
    left: LimbNames,
    right: LimbNames,
}

/// Builds a character standing in T-pose, facing `+Z`, with the pelvis one unit above the root
/// and every bone unrotated.
fn t_pose(names: RigNames) -> Skeleton {
    let mut skeleton = Skeleton::new();
    let root = skeleton.add_root(names.root, Transform::IDENTITY);
    let pelvis = skeleton.add_bone(root, names.pelvis, Transform::from_xyz(0., 1., 0.));

    let mut chest = pelvis;
    for spine in names.spine {
        chest = skeleton.add_bone(chest, spine, Transform::from_xyz(0., 0.12, 0.));
    }
    let mut neck = chest;
    for segment in names.neck {
        neck = skeleton.add_bone(neck, segment, Transform::from_xyz(0., 0.12, 0.));
    }
    let head = skeleton.add_bone(neck, names.head, Transform::from_xyz(0., 0.1, 0.));
    if let Some(head_tip) = names.head_tip {
        skeleton.add_bone(head, head_tip, Transform::from_xyz(0., 0.18, 0.));
    }

    for (side, limb) in [(Side::Left, names.left), (Side::Right, names.right)] {
        let s = match side {
            Side::Left => -1.,
            Side::Right => 1.,
        };

        let upper_arm = match limb.collar {
            Some(collar) => {
                let collar =
                    skeleton.add_bone(chest, collar, Transform::from_xyz(s * 0.05, 0.06, 0.));
                skeleton.add_bone(collar, limb.upper_arm, Transform::from_xyz(s * 0.12, 0., 0.))
            }
            None => {
                skeleton.add_bone(chest, limb.upper_arm, Transform::from_xyz(s * 0.17, 0.06, 0.))
            }
        };
        let forearm =
            skeleton.add_bone(upper_arm, limb.forearm, Transform::from_xyz(s * 0.28, 0., 0.));
        let hand = skeleton.add_bone(forearm, limb.hand, Transform::from_xyz(s * 0.25, 0., 0.));
        let spread = [0.04, 0.02, 0., -0.02, -0.04];
        for (finger, z) in limb.fingers.into_iter().zip(spread) {
            skeleton.add_bone(hand, finger, Transform::from_xyz(s * 0.09, 0., z));
        }

        let hip = skeleton.add_bone(pelvis, limb.hip, Transform::from_xyz(s * 0.1, -0.05, 0.));
        let lower_leg =
            skeleton.add_bone(hip, limb.lower_leg, Transform::from_xyz(0., -0.45, 0.));
        let foot = skeleton.add_bone(lower_leg, limb.foot, Transform::from_xyz(0., -0.42, 0.));
        if let Some(toe) = limb.toe {
            let toe = skeleton.add_bone(foot, toe, Transform::from_xyz(0., -0.05, 0.12));
            if let Some(toe_tip) = limb.toe_tip {
                skeleton.add_bone(toe, toe_tip, Transform::from_xyz(0., 0., 0.06));
            }
        }
    }

    skeleton
}

/// Full HumanIK rig, as exported by most motion capture tools.
pub fn human_ik_rig() -> Skeleton {
    t_pose(human_ik_rig_names())
}

fn human_ik_rig_names() -> RigNames {
    let limb = |side: &str| LimbNames {
        collar: Some(format!("{side}Shoulder")),
        upper_arm: format!("{side}Arm"),
        forearm: format!("{side}ForeArm"),
        hand: format!("{side}Hand"),
        fingers: ["Thumb1", "Index1", "Middle1", "Ring1", "Pinky1"]
            .iter()
            .map(|finger| format!("{side}Hand{finger}"))
            .collect(),
        hip: format!("{side}UpLeg"),
        lower_leg: format!("{side}Leg"),
        foot: format!("{side}Foot"),
        toe: Some(format!("{side}ToeBase")),
        toe_tip: Some(format!("{side}Toe_End")),
    };

    RigNames {
        root: "Reference".into(),
        pelvis: "Hips".into(),
        spine: vec!["Spine".into(), "Spine1".into(), "Spine2".into()],
        neck: vec!["Neck".into()],
        head: "Head".into(),
        head_tip: Some("HeadTop_End".into()),
        left: limb("Left"),
        right: limb("Right"),
    }
}

/// HumanIK rig whose neck has two segments.
pub fn two_neck_rig() -> Skeleton {
    let mut rig = human_ik_rig_names();
    rig.neck = vec!["Neck".into(), "Neck1".into()];
    t_pose(rig)
}

/// 3ds Max Biped rig named `Bip01`.
pub fn max_rig() -> Skeleton {
    let limb = |side: &str| LimbNames {
        collar: Some(format!("Bip01 {side} Clavicle")),
        upper_arm: format!("Bip01 {side} UpperArm"),
        forearm: format!("Bip01 {side} Forearm"),
        hand: format!("Bip01 {side} Hand"),
        fingers: (0..5).map(|i| format!("Bip01 {side} Finger{i}")).collect(),
        hip: format!("Bip01 {side} Thigh"),
        lower_leg: format!("Bip01 {side} Calf"),
        foot: format!("Bip01 {side} Foot"),
        toe: Some(format!("Bip01 {side} Toe0")),
        toe_tip: Some(format!("Bip01 {side} Toe0Nub")),
    };

    t_pose(RigNames {
        root: "Bip01".into(),
        pelvis: "Bip01 Pelvis".into(),
        spine: vec!["Bip01 Spine".into(), "Bip01 Spine1".into()],
        neck: vec!["Bip01 Neck".into()],
        head: "Bip01 Head".into(),
        head_tip: Some("Bip01 HeadNub".into()),
        left: limb("L"),
        right: limb("R"),
    })
}

/// Maya rig with only the mandatory bones.
pub fn maya_rig() -> Skeleton {
    let limb = |side: &str| LimbNames {
        collar: None,
        upper_arm: format!("{side}Shoulder"),
        forearm: format!("{side}Elbow"),
        hand: format!("{side}Hand"),
        fingers: Vec::new(),
        hip: format!("{side}Hip"),
        lower_leg: format!("{side}Knee"),
        foot: format!("{side}Foot"),
        toe: None,
        toe_tip: None,
    };

    t_pose(RigNames {
        root: "Character".into(),
        pelvis: "CenterRoot".into(),
        spine: vec!["CenterSpine".into()],
        neck: Vec::new(),
        head: "CenterHead".into(),
        head_tip: None,
        left: limb("Left"),
        right: limb("Right"),
    })
}

#[derive(Debug, Clone)]
pub struct RecordedBody {
    pub node: NodeId,
    pub desc: RigidBodyDesc,
    pub kinematic: bool,
}

#[derive(Debug, Clone)]
pub struct RecordedCollider {
    pub node: NodeId,
    pub desc: ColliderDesc,
}

#[derive(Debug, Clone)]
pub struct RecordedJoint {
    pub node: NodeId,
    pub body: PhysicsHandle,
    pub desc: JointDesc,
}

/// Physics backend keeping every live primitive in a map.
#[derive(Debug, Default)]
pub struct RecordingPhysics {
    next_id: u64,
    pub bodies: HashMap<PhysicsHandle, RecordedBody>,
    pub colliders: HashMap<PhysicsHandle, RecordedCollider>,
    pub joints: HashMap<PhysicsHandle, RecordedJoint>,
}

impl RecordingPhysics {
    fn next_handle(&mut self) -> PhysicsHandle {
        self.next_id += 1;
        PhysicsHandle::from_raw(self.next_id)
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty() && self.colliders.is_empty() && self.joints.is_empty()
    }
}

impl PhysicsBackend for RecordingPhysics {
    fn create_rigid_body(&mut self, node: NodeId, desc: &RigidBodyDesc) -> PhysicsHandle {
        let handle = self.next_handle();
        self.bodies.insert(
            handle,
            RecordedBody {
                node,
                desc: *desc,
                kinematic: false,
            },
        );
        handle
    }

    fn destroy_rigid_body(&mut self, body: PhysicsHandle) {
        assert!(self.bodies.remove(&body).is_some(), "Unknown body {body:?}");
    }

    fn set_kinematic(&mut self, body: PhysicsHandle, kinematic: bool) {
        if let Some(recorded) = self.bodies.get_mut(&body) {
            recorded.kinematic = kinematic;
        }
    }

    fn create_collider(&mut self, node: NodeId, desc: &ColliderDesc) -> PhysicsHandle {
        let handle = self.next_handle();
        self.colliders.insert(
            handle,
            RecordedCollider {
                node,
                desc: desc.clone(),
            },
        );
        handle
    }

    fn destroy_collider(&mut self, collider: PhysicsHandle) {
        assert!(
            self.colliders.remove(&collider).is_some(),
            "Unknown collider {collider:?}"
        );
    }

    fn create_joint(&mut self, node: NodeId, body: PhysicsHandle, desc: &JointDesc) -> PhysicsHandle {
        assert!(self.bodies.contains_key(&body), "Joint on unknown body");
        assert!(
            self.bodies.contains_key(&desc.connected_body),
            "Joint to unknown body"
        );
        let handle = self.next_handle();
        self.joints.insert(
            handle,
            RecordedJoint {
                node,
                body,
                desc: *desc,
            },
        );
        handle
    }

    fn destroy_joint(&mut self, joint: PhysicsHandle) {
        assert!(self.joints.remove(&joint).is_some(), "Unknown joint {joint:?}");
    }
}

/// Animation driver whose state can be watched from a clone.
#[derive(Debug, Clone)]
pub struct CountingAnimation {
    enabled: Arc<AtomicBool>,
    stops: Arc<AtomicU32>,
}

impl Default for CountingAnimation {
    fn default() -> Self {
        Self {
            enabled: Arc::new(AtomicBool::new(true)),
            stops: Arc::new(AtomicU32::new(0)),
        }
    }
}

impl CountingAnimation {
    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> u32 {
        self.stops.load(Ordering::SeqCst)
    }
}

impl AnimationDriver for CountingAnimation {
    fn stop(&mut self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    fn is_enabled(&self) -> bool {
        self.enabled()
    }
}

/// Scene in which one bone has been despawned from under the biped.
pub struct DespawnedBone<'a> {
    pub skeleton: &'a mut Skeleton,
    pub missing: NodeId,
}

impl SkeletonHierarchy for DespawnedBone<'_> {
    fn name(&self, node: NodeId) -> Option<&str> {
        self.skeleton.name(node)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.skeleton.parent(node)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.skeleton.children(node)
    }

    fn local_transform(&self, node: NodeId) -> Option<Transform> {
        if node == self.missing {
            return None;
        }
        self.skeleton.local_transform(node)
    }

    fn set_local_transform(&mut self, node: NodeId, transform: Transform) {
        if node != self.missing {
            self.skeleton.set_local_transform(node, transform);
        }
    }
}
