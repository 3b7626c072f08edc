//! Locates biped roles in a skeleton by node name.

use bevy_log::{debug, warn};

use crate::core::{
    naming::NamingConvention,
    roles::{BipedSlots, Side, SideSlots},
    skeleton::{NodeId, SkeletonHierarchy},
};

/// Maximum sideways offset from the sagittal plane for a head child to count as the head tip.
pub const HEAD_TIP_LATERAL_TOLERANCE: f32 = 0.01;

/// Whether `candidate` names the node `name`, either exactly or after a namespace separator
/// (`ns:Name`).
pub fn name_matches(candidate: &str, name: &str) -> bool {
    if candidate == name {
        return true;
    }
    match candidate.rfind(':') {
        Some(separator) => &candidate[separator + 1..] == name,
        None => false,
    }
}

fn strip_namespace(name: &str) -> &str {
    match name.rfind(':') {
        Some(separator) => &name[separator + 1..],
        None => name,
    }
}

pub struct RoleResolver<'a, S: SkeletonHierarchy + ?Sized> {
    scene: &'a S,
    root: NodeId,
    naming: &'a NamingConvention,
    hierarchy: Vec<NodeId>,
}

impl<'a, S: SkeletonHierarchy + ?Sized> RoleResolver<'a, S> {
    pub fn new(scene: &'a S, root: NodeId, naming: &'a NamingConvention) -> Self {
        Self {
            scene,
            root,
            naming,
            hierarchy: scene.descendants(root),
        }
    }

    /// Finds every role it can. Unresolved roles are left empty.
    pub fn resolve(&self) -> BipedSlots<NodeId> {
        let naming = self.naming;
        let mut slots = BipedSlots::default();

        slots.head = self.find_node(&naming.center(&naming.head));
        slots.pelvis = self.find_node(&naming.center(&naming.pelvis));
        if let Some(head) = slots.head {
            slots.neck = self.neck_chain(head);
            slots.spine = self.spine_chain(head, slots.neck.first().copied());
            slots.head_tip = self.head_tip(head);
        }

        for side in Side::BOTH {
            *slots.side_mut(side) = self.resolve_side(side);
        }

        slots
    }

    fn resolve_side(&self, side: Side) -> SideSlots<NodeId> {
        let naming = self.naming;
        let find = |token: &str| self.find_node(&naming.sided(side, token));

        let mut slots = SideSlots {
            collar: find(&naming.collar),
            upper_arm: find(&naming.upper_arm),
            forearm: find(&naming.forearm),
            hand: find(&naming.hand),
            hip: find(&naming.upper_leg),
            lower_leg: find(&naming.lower_leg),
            foot: find(&naming.foot),
            ..Default::default()
        };

        slots.hand_tip = slots
            .hand
            .and_then(|hand| self.limb_tip(hand, &naming.sided(side, &naming.hand_tip)));
        slots.toe = slots
            .foot
            .and_then(|foot| self.limb_tip(foot, &naming.sided(side, &naming.toe)));
        slots.toe_tip = slots
            .toe
            .and_then(|toe| self.scene.children(toe).first().copied());

        slots
    }

    /// First node under the root whose name matches `name`.
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.hierarchy.iter().copied().find(|node| {
            self.scene
                .name(*node)
                .is_some_and(|candidate| name_matches(candidate, name))
        })
    }

    fn name_contains(&self, node: NodeId, token: &str) -> bool {
        self.scene
            .name(node)
            .is_some_and(|name| name.contains(token))
    }

    /// Ancestors of the head whose names contain the neck token, ordered from the spine toward
    /// the head.
    fn neck_chain(&self, head: NodeId) -> Vec<NodeId> {
        let token = self.naming.center(&self.naming.neck);
        let mut chain = Vec::new();
        let mut current = self.scene.parent(head);
        while let Some(node) = current {
            if node == self.root || !self.name_contains(node, &token) {
                break;
            }
            chain.push(node);
            current = self.scene.parent(node);
        }
        chain.reverse();
        chain
    }

    /// Spine segments below the neck (or the head when there is no neck), ordered from the
    /// pelvis upward. Ancestors that don't carry the spine token are skipped until the first
    /// one that does.
    fn spine_chain(&self, head: NodeId, first_neck: Option<NodeId>) -> Vec<NodeId> {
        let token = self.naming.center(&self.naming.spine);
        let start = first_neck.unwrap_or(head);
        let mut current = self.scene.parent(start);

        while let Some(node) = current {
            if self.name_contains(node, &token) {
                break;
            }
            if node == self.root {
                return Vec::new();
            }
            current = self.scene.parent(node);
        }

        let mut chain = Vec::new();
        while let Some(node) = current {
            if !self.name_contains(node, &token) {
                break;
            }
            chain.push(node);
            if node == self.root {
                break;
            }
            current = self.scene.parent(node);
        }
        chain.reverse();
        chain
    }

    /// Picks the child of `parent` that ends the limb: a finger for hands, a toe for feet.
    fn limb_tip(&self, parent: NodeId, token: &str) -> Option<NodeId> {
        let children = self.scene.children(parent);
        if children.len() > 1 {
            let matching: Vec<NodeId> = children
                .iter()
                .copied()
                .filter(|child| self.name_contains(*child, token))
                .collect();

            if matching.len() == 1 {
                let unique = children.iter().copied().find(|child| {
                    self.scene
                        .name(*child)
                        .is_some_and(|name| strip_namespace(name).starts_with(token))
                });
                if unique.is_some() {
                    return unique;
                }
            } else {
                debug!(
                    "{} children of {:?} match {:?}, trying numbered digits",
                    matching.len(),
                    self.scene.name(parent),
                    token
                );
            }

            let numbered = format!("{}{}", token, children.len() / 2);
            if let Some(tip) = self.find_node(&numbered) {
                return Some(tip);
            }
            warn!(
                "Could not tell which child of {:?} is the limb tip, using the first one",
                self.scene.name(parent)
            );
        }

        children.first().copied()
    }

    /// Child of the head lying above it and close to the sagittal plane, preferring the highest.
    fn head_tip(&self, head: NodeId) -> Option<NodeId> {
        let to_root = self.scene.global_transform(self.root).affine().inverse();
        let head_position = to_root.transform_point3(self.scene.global_transform(head).translation());

        let mut best: Option<(NodeId, f32)> = None;
        for child in self.scene.children(head) {
            let position =
                to_root.transform_point3(self.scene.global_transform(child).translation());
            if position.y <= head_position.y || position.x.abs() >= HEAD_TIP_LATERAL_TOLERANCE {
                continue;
            }
            if best.is_none_or(|(_, height)| position.y > height) {
                best = Some((child, position.y));
            }
        }

        best.map(|(node, _)| node)
    }
}
