use super::{NodeId, SkeletonHierarchy};
use bevy_transform::components::Transform;
use std::{collections::HashMap, fmt::Debug};

#[derive(Clone)]
struct Bone {
    name: String,
    transform: Transform,
}

/// Self-contained transform hierarchy.
///
/// Useful for authoring rigs outside of a running world, and as the reference implementation
/// of [`SkeletonHierarchy`].
#[derive(Clone, Default)]
pub struct Skeleton {
    roots: Vec<NodeId>,
    bones: Vec<Bone>,
    children_map: HashMap<NodeId, Vec<NodeId>>,
    parent_map: HashMap<NodeId, NodeId>,
    skinned_mesh_max_height: Option<f32>,
}

impl Skeleton {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_bone(&mut self, name: impl Into<String>, transform: Transform) -> NodeId {
        let id = NodeId::from_raw(self.bones.len() as u64);
        self.bones.push(Bone {
            name: name.into(),
            transform,
        });
        self.children_map.insert(id, vec![]);
        id
    }

    pub fn add_root(&mut self, name: impl Into<String>, transform: Transform) -> NodeId {
        let id = self.push_bone(name, transform);
        self.roots.push(id);
        id
    }

    /// Adds a bone under `parent`. Bones added to a parent that doesn't exist become roots.
    pub fn add_bone(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        transform: Transform,
    ) -> NodeId {
        if !self.contains(parent) {
            return self.add_root(name, transform);
        }

        let id = self.push_bone(name, transform);
        if let Some(parent_children) = self.children_map.get_mut(&parent) {
            parent_children.push(id);
        }
        self.parent_map.insert(id, parent);
        id
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn set_skinned_mesh_max_height(&mut self, height: Option<f32>) {
        self.skinned_mesh_max_height = height;
    }

    /// First bone named exactly `name`, in insertion order.
    pub fn bone_by_name(&self, name: &str) -> Option<NodeId> {
        self.bones
            .iter()
            .position(|bone| bone.name == name)
            .map(|index| NodeId::from_raw(index as u64))
    }

    fn bone(&self, node: NodeId) -> Option<&Bone> {
        self.bones.get(node.raw() as usize)
    }

    fn indent(f: &mut std::fmt::Formatter<'_>, level: u32) -> std::fmt::Result {
        if level == 0 {
            return Ok(());
        }
        for _ in 0..(level - 1) {
            write!(f, "┃ ")?;
        }
        write!(f, "┣━")?;
        Ok(())
    }

    fn fmt_level(
        &self,
        f: &mut std::fmt::Formatter<'_>,
        level: u32,
        node: NodeId,
    ) -> std::fmt::Result {
        Self::indent(f, level)?;
        let name = self.name(node).unwrap_or("<unnamed>");
        writeln!(f, "🦴 {:?} [{:?}]", name, node)?;
        for child in self.children(node) {
            self.fmt_level(f, level + 1, child)?;
        }
        Ok(())
    }
}

impl SkeletonHierarchy for Skeleton {
    fn name(&self, node: NodeId) -> Option<&str> {
        self.bone(node).map(|bone| bone.name.as_str())
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.parent_map.get(&node).copied()
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.children_map.get(&node).cloned().unwrap_or_default()
    }

    fn local_transform(&self, node: NodeId) -> Option<Transform> {
        self.bone(node).map(|bone| bone.transform)
    }

    fn set_local_transform(&mut self, node: NodeId, transform: Transform) {
        if let Some(bone) = self.bones.get_mut(node.raw() as usize) {
            bone.transform = transform;
        }
    }

    fn skinned_mesh_max_height(&self) -> Option<f32> {
        self.skinned_mesh_max_height
    }
}

impl Debug for Skeleton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Skeleton hierarchy:")?;
        for root in &self.roots {
            self.fmt_level(f, 0, *root)?;
        }
        Ok(())
    }
}
