/// Part slots and the part registry
///
/// A slot is a named position in the product assembly holding zero or one
/// loaded mesh. The registry maps slot names to scene nodes; it never owns
/// the mesh itself.
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use nalgebra::Vector3;

use crate::placement::{keycap_offset, Placement, BOARD_DROP, LEGEND_RISE};
use crate::scene::NodeId;

/// Which customizable part a slot (and its swatch tray) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    Keycap,
    Text,
    SwitchBoard,
}

impl SlotKind {
    pub fn label(&self) -> &'static str {
        match self {
            SlotKind::Keycap => "keycap",
            SlotKind::Text => "text",
            SlotKind::SwitchBoard => "switch-board",
        }
    }
}

/// A named position in the assembly.
#[derive(Debug, Clone)]
pub struct PartSlot {
    pub name: String,
    pub kind: SlotKind,
    /// `None` models "no part in this slot"; the loader skips it.
    pub model_path: Option<PathBuf>,
    pub placement: Placement,
}

/// Model file holding the switch board variant for a given keycap count.
pub fn board_model_name(count: usize) -> String {
    format!("switch-board-{count}.stl")
}

/// Compute the active slot list for `count` keycap positions.
///
/// Each position gets a keycap slot and a legend-text slot riding above it;
/// one switch-board slot spans the row, its model file chosen by the count
/// rule. `board` set to `false` leaves the board slot empty (no variant
/// selected).
pub fn slot_layout(count: usize, model_dir: &Path, board: bool) -> Vec<PartSlot> {
    let mut slots = Vec::with_capacity(count * 2 + 1);

    for index in 0..count {
        let x = keycap_offset(index, count);
        slots.push(PartSlot {
            name: format!("keycap-{index}"),
            kind: SlotKind::Keycap,
            model_path: Some(model_dir.join("keycap.stl")),
            placement: Placement::at(Vector3::new(x, 0.0, 0.0)),
        });
        slots.push(PartSlot {
            name: format!("text-{index}"),
            kind: SlotKind::Text,
            model_path: Some(model_dir.join("text.stl")),
            placement: Placement::at(Vector3::new(x, 0.0, LEGEND_RISE)),
        });
    }

    slots.push(PartSlot {
        name: "switch-board".to_string(),
        kind: SlotKind::SwitchBoard,
        model_path: board.then(|| model_dir.join(board_model_name(count))),
        placement: Placement::at(Vector3::new(0.0, 0.0, -BOARD_DROP)),
    });

    slots
}

/// Lookup from part name to its currently loaded scene node.
///
/// Written only from the frame loop's load-absorption step; read at click
/// time. `get` on a slot whose load has not resolved returns `None` and the
/// caller no-ops.
#[derive(Debug, Default)]
pub struct PartRegistry {
    map: HashMap<String, NodeId>,
}

impl PartRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.map.get(name).copied()
    }

    /// Register a loaded part, returning the node it displaces, if any.
    pub fn insert(&mut self, name: impl Into<String>, node: NodeId) -> Option<NodeId> {
        self.map.insert(name.into(), node)
    }

    pub fn remove(&mut self, name: &str) -> Option<NodeId> {
        self.map.remove(name)
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::KEYCAP_PITCH;
    use slotmap::Key;

    #[test]
    fn layout_has_one_slot_pair_per_position_plus_board() {
        let slots = slot_layout(3, Path::new("models"), true);
        assert_eq!(slots.len(), 7);
        assert_eq!(
            slots.iter().filter(|s| s.kind == SlotKind::Keycap).count(),
            3
        );
        assert_eq!(slots.iter().filter(|s| s.kind == SlotKind::Text).count(), 3);
    }

    #[test]
    fn board_path_follows_count_rule() {
        let slots = slot_layout(4, Path::new("models"), true);
        let board = slots
            .iter()
            .find(|s| s.kind == SlotKind::SwitchBoard)
            .unwrap();
        assert_eq!(
            board.model_path.as_deref(),
            Some(Path::new("models/switch-board-4.stl"))
        );
    }

    #[test]
    fn boardless_layout_leaves_the_slot_empty() {
        let slots = slot_layout(2, Path::new("models"), false);
        let board = slots
            .iter()
            .find(|s| s.kind == SlotKind::SwitchBoard)
            .unwrap();
        assert!(board.model_path.is_none());
    }

    #[test]
    fn text_rides_above_its_keycap() {
        let slots = slot_layout(2, Path::new("models"), true);
        let cap = &slots[0];
        let text = &slots[1];
        assert_eq!(cap.placement.offset.x, text.placement.offset.x);
        assert!((text.placement.offset.z - LEGEND_RISE).abs() < 1e-6);
        assert!((cap.placement.offset.x + KEYCAP_PITCH / 2.0).abs() < 1e-6);
    }

    #[test]
    fn registry_reports_absent_slots_as_none() {
        let registry = PartRegistry::new();
        assert!(registry.get("keycap-0").is_none());
    }

    #[test]
    fn registry_insert_returns_displaced_node() {
        let mut registry = PartRegistry::new();
        let first = NodeId::null();
        assert!(registry.insert("keycap-0", first).is_none());
        assert_eq!(registry.insert("keycap-0", first), Some(first));
        assert_eq!(registry.len(), 1);
    }
}
