/// Asynchronous model loading
///
/// One worker thread per occupied slot reads and parses the STL file and
/// sends exactly one completion event. Workers never touch the scene or the
/// registry; the session drains the channel on the UI thread, which keeps
/// all shared-state writes serialized without locks. Loads are
/// fire-and-forget: nothing is retried and in-flight loads are not
/// cancelled.
use std::thread;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver};

use crate::error::{Error, Result};
use crate::geometry::Mesh;
use crate::parts::PartSlot;
use crate::stl;

/// Result of one slot's load.
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(Mesh),
    Failed(Error),
}

/// Completion event for one slot.
#[derive(Debug)]
pub struct LoadEvent {
    pub slot: String,
    pub outcome: LoadOutcome,
}

/// Handle to a batch of in-flight loads.
pub struct MeshLoader {
    rx: Receiver<LoadEvent>,
    pending: usize,
}

impl MeshLoader {
    /// Start one load per slot with a model path; empty slots are skipped.
    pub fn spawn(slots: &[PartSlot]) -> MeshLoader {
        let (tx, rx) = unbounded();
        let mut pending = 0;

        for slot in slots {
            let Some(path) = slot.model_path.clone() else {
                log::debug!("slot {}: no model selected, skipping", slot.name);
                continue;
            };
            pending += 1;
            let name = slot.name.clone();
            let tx = tx.clone();
            thread::spawn(move || {
                let outcome = match read_model(&path) {
                    Ok(mesh) => {
                        log::info!("slot {name}: loaded {} triangles", mesh.triangles.len());
                        LoadOutcome::Loaded(mesh)
                    }
                    Err(e) => {
                        log::warn!("slot {name}: load failed: {e}");
                        LoadOutcome::Failed(e)
                    }
                };
                // The receiver may be gone if the session ended mid-load.
                let _ = tx.send(LoadEvent {
                    slot: name,
                    outcome,
                });
            });
        }

        MeshLoader { rx, pending }
    }

    /// Loads not yet drained from the channel.
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn is_settled(&self) -> bool {
        self.pending == 0
    }

    /// Next completion, if one is ready. Never blocks the frame loop.
    pub fn try_next(&mut self) -> Option<LoadEvent> {
        match self.rx.try_recv() {
            Ok(event) => {
                self.pending -= 1;
                Some(event)
            }
            Err(_) => None,
        }
    }

    /// Wait for the next completion. Used by tests and batch tooling; the
    /// interactive frame loop uses `try_next`.
    pub fn next_timeout(&mut self, timeout: Duration) -> Option<LoadEvent> {
        if self.pending == 0 {
            return None;
        }
        match self.rx.recv_timeout(timeout) {
            Ok(event) => {
                self.pending -= 1;
                Some(event)
            }
            Err(_) => None,
        }
    }
}

fn read_model(path: &std::path::Path) -> Result<Mesh> {
    let data = std::fs::read(path)?;
    stl::parse_stl(&data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parts::{slot_layout, SlotKind};
    use crate::placement::Placement;
    use nalgebra::{Point3, Vector3};
    use std::path::PathBuf;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("kc3d-loader-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_cube(path: &std::path::Path) {
        let mesh = Mesh::cuboid(Point3::origin(), Vector3::new(2.0, 2.0, 2.0));
        std::fs::write(path, stl::write_binary_stl(&mesh)).unwrap();
    }

    #[test]
    fn loads_complete_with_mesh_payload() {
        let dir = scratch_dir("ok");
        write_cube(&dir.join("part.stl"));
        let slots = vec![PartSlot {
            name: "part".into(),
            kind: SlotKind::Keycap,
            model_path: Some(dir.join("part.stl")),
            placement: Placement::at(Vector3::zeros()),
        }];

        let mut loader = MeshLoader::spawn(&slots);
        let event = loader.next_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(event.slot, "part");
        assert!(matches!(event.outcome, LoadOutcome::Loaded(ref m) if m.triangles.len() == 12));
        assert!(loader.is_settled());
    }

    #[test]
    fn missing_file_reports_failure_event() {
        let dir = scratch_dir("missing");
        let slots = vec![PartSlot {
            name: "ghost".into(),
            kind: SlotKind::Text,
            model_path: Some(dir.join("nope.stl")),
            placement: Placement::at(Vector3::zeros()),
        }];

        let mut loader = MeshLoader::spawn(&slots);
        let event = loader.next_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(event.outcome, LoadOutcome::Failed(Error::Io(_))));
    }

    #[test]
    fn empty_slots_are_skipped() {
        let dir = scratch_dir("empty");
        write_cube(&dir.join("keycap.stl"));
        write_cube(&dir.join("text.stl"));

        // Boardless layout: 2 of the 3 slots have models.
        let slots = slot_layout(1, &dir, false);
        let loader = MeshLoader::spawn(&slots);
        assert_eq!(loader.pending(), 2);
    }
}
