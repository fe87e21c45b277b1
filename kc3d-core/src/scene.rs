/// Scene graph holding the assembled product
///
/// Nodes own their meshes; everything else in the system (the part registry
/// in particular) refers to nodes by id only. Removing a subtree drops the
/// meshes it owns, which is the disposal contract for part replacement.
use nalgebra::Matrix4;
use slotmap::{new_key_type, SlotMap};

use crate::geometry::{Aabb, Mesh};
use crate::material::Material;
use crate::transform::{RotationState, Transform};

new_key_type! {
    /// Non-owning handle to a scene node.
    pub struct NodeId;
}

/// One node: optional mesh, a material, a local transform, and children.
#[derive(Debug)]
pub struct Node {
    pub name: Option<String>,
    pub mesh: Option<Mesh>,
    pub material: Material,
    pub position: nalgebra::Vector3<f32>,
    pub rotation: RotationState,
    pub scale: f32,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl Node {
    pub fn new() -> Self {
        Self {
            name: None,
            mesh: None,
            material: Material::default_part(),
            position: nalgebra::Vector3::zeros(),
            rotation: RotationState::zero(),
            scale: 1.0,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        let mut node = Self::new();
        node.name = Some(name.into());
        node
    }

    /// Local model matrix from this node's transform components.
    pub fn local_matrix(&self) -> Matrix4<f32> {
        Transform::model_matrix(&self.position, &self.rotation, self.scale)
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}

/// A drawable: a mesh with its world matrix and material, in traversal order.
pub struct DrawItem<'a> {
    pub mesh: &'a Mesh,
    pub material: &'a Material,
    pub world: Matrix4<f32>,
}

#[derive(Default)]
pub struct Scene {
    nodes: SlotMap<NodeId, Node>,
    roots: Vec<NodeId>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node at the root of the scene.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = self.nodes.insert(node);
        self.roots.push(id);
        id
    }

    /// Insert a node as a child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        node.parent = Some(parent);
        let id = self.nodes.insert(node);
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(id);
        }
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Remove a node and its whole subtree, dropping the owned meshes.
    pub fn remove_subtree(&mut self, id: NodeId) {
        let Some(node) = self.nodes.remove(id) else {
            return;
        };
        if let Some(parent) = node.parent {
            if let Some(p) = self.nodes.get_mut(parent) {
                p.children.retain(|c| *c != id);
            }
        }
        self.roots.retain(|r| *r != id);
        for child in node.children {
            self.remove_child_rec(child);
        }
    }

    fn remove_child_rec(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.remove(id) {
            for child in node.children {
                self.remove_child_rec(child);
            }
        }
    }

    /// Replace the material on a node and every descendant.
    ///
    /// Parts loaded from multi-body models are grouped under one node, so a
    /// swatch click recolors the whole group.
    pub fn set_material_subtree(&mut self, id: NodeId, material: &Material) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(current) {
                node.material = material.clone();
                stack.extend(node.children.iter().copied());
            }
        }
    }

    /// Flatten the scene into draw items with composed world matrices.
    pub fn draw_items(&self) -> Vec<DrawItem<'_>> {
        let mut items = Vec::new();
        for root in &self.roots {
            self.collect(*root, Matrix4::identity(), &mut items);
        }
        items
    }

    fn collect<'a>(
        &'a self,
        id: NodeId,
        parent_world: Matrix4<f32>,
        items: &mut Vec<DrawItem<'a>>,
    ) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        let world = parent_world * node.local_matrix();
        if let Some(mesh) = &node.mesh {
            items.push(DrawItem {
                mesh,
                material: &node.material,
                world,
            });
        }
        for child in &node.children {
            self.collect(*child, world, items);
        }
    }

    /// World-space bounds of a node's subtree, `None` if it has no geometry.
    pub fn world_bounds(&self, id: NodeId) -> Option<Aabb> {
        let parent_world = self
            .get(id)
            .and_then(|n| n.parent)
            .map(|p| self.world_matrix(p))
            .unwrap_or_else(Matrix4::identity);
        self.subtree_bounds(id, parent_world)
    }

    fn world_matrix(&self, id: NodeId) -> Matrix4<f32> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(c) = current {
            let Some(node) = self.nodes.get(c) else { break };
            chain.push(node.local_matrix());
            current = node.parent;
        }
        chain
            .into_iter()
            .rev()
            .fold(Matrix4::identity(), |acc, m| acc * m)
    }

    fn subtree_bounds(&self, id: NodeId, parent_world: Matrix4<f32>) -> Option<Aabb> {
        let node = self.nodes.get(id)?;
        let world = parent_world * node.local_matrix();
        let mut out = node
            .mesh
            .as_ref()
            .and_then(|m| m.bounds())
            .map(|b| b.transformed(&world));
        for child in &node.children {
            if let Some(b) = self.subtree_bounds(*child, world) {
                out = Some(match out {
                    Some(acc) => acc.union(&b),
                    None => b,
                });
            }
        }
        out
    }

    /// Bounds of everything in the scene, for camera framing.
    pub fn combined_bounds(&self) -> Option<Aabb> {
        let mut out: Option<Aabb> = None;
        for root in &self.roots {
            if let Some(b) = self.subtree_bounds(*root, Matrix4::identity()) {
                out = Some(match out {
                    Some(acc) => acc.union(&b),
                    None => b,
                });
            }
        }
        out
    }
}
