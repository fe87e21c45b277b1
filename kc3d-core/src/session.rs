/// The configurator session: one viewer's worth of state
///
/// Owns the scene, the part registry, the catalog, the trays, and the
/// in-flight loader. All mutation funnels through here on the UI thread;
/// worker threads only ever hand meshes over the loader channel.
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::geometry::{Aabb, Mesh};
use crate::loader::{LoadEvent, LoadOutcome, MeshLoader};
use crate::material::{Material, TextureCache};
use crate::parts::{slot_layout, PartRegistry, PartSlot};
use crate::scene::{Node, Scene};
use crate::trays::{build_trays, Tray, TraySpec};

/// A load failure surfaced to the status line.
#[derive(Debug, Clone)]
pub struct SlotFailure {
    pub slot: String,
    pub reason: String,
}

/// What a swatch click reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickReport {
    /// Parts recolored.
    pub applied: usize,
    /// Parts whose load had not resolved yet (safe no-op).
    pub pending: usize,
}

pub struct Configurator {
    model_dir: PathBuf,
    catalog: Catalog,
    trays: Vec<Tray>,
    slots: Vec<PartSlot>,
    slot_count: usize,
    board: bool,
    scene: Scene,
    registry: PartRegistry,
    loader: Option<MeshLoader>,
    textures: TextureCache,
    failures: Vec<SlotFailure>,
}

impl Configurator {
    /// Build a session. Tray construction validates the catalog wiring and
    /// fails fast; no loads are started until `begin_loading`.
    pub fn new(
        model_dir: PathBuf,
        catalog: Catalog,
        tray_specs: &[TraySpec],
        slot_count: usize,
        board: bool,
    ) -> Result<Configurator> {
        let trays = build_trays(&catalog, tray_specs)?;
        let slots = slot_layout(slot_count, &model_dir, board);
        Ok(Configurator {
            model_dir,
            catalog,
            trays,
            slots,
            slot_count,
            board,
            scene: Scene::new(),
            registry: PartRegistry::new(),
            loader: None,
            textures: TextureCache::new(),
            failures: Vec::new(),
        })
    }

    /// Kick off one load per occupied slot.
    pub fn begin_loading(&mut self) {
        self.failures.clear();
        self.loader = Some(MeshLoader::spawn(&self.slots));
    }

    /// Drain ready load completions and assemble each finished part.
    /// Called once per frame from the UI thread; returns how many events
    /// were absorbed so the caller can redraw.
    pub fn absorb_loads(&mut self) -> usize {
        let Some(loader) = self.loader.as_mut() else {
            return 0;
        };
        let mut events = Vec::new();
        while let Some(event) = loader.try_next() {
            events.push(event);
        }
        let absorbed = events.len();
        for event in events {
            self.absorb_one(event);
        }
        absorbed
    }

    /// Block until every pending load is absorbed or the deadline passes.
    /// Used by tests and batch tooling; the frame loop uses `absorb_loads`.
    pub fn wait_for_loads(&mut self, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        let mut absorbed = 0;
        loop {
            let Some(loader) = self.loader.as_mut() else {
                return absorbed;
            };
            if loader.is_settled() {
                return absorbed;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return absorbed;
            }
            match loader.next_timeout(remaining) {
                Some(event) => {
                    self.absorb_one(event);
                    absorbed += 1;
                }
                None => return absorbed,
            }
        }
    }

    fn absorb_one(&mut self, event: LoadEvent) {
        let Some(slot) = self.slots.iter().find(|s| s.name == event.slot).cloned() else {
            // Slot count changed while this load was in flight.
            log::debug!("discarding stale load for retired slot {}", event.slot);
            return;
        };
        match event.outcome {
            LoadOutcome::Loaded(mesh) => self.install_part(&slot, mesh),
            LoadOutcome::Failed(error) => self.failures.push(SlotFailure {
                slot: event.slot,
                reason: error.to_string(),
            }),
        }
    }

    fn install_part(&mut self, slot: &PartSlot, mesh: Mesh) {
        let Some(bounds) = mesh.bounds() else {
            self.failures.push(SlotFailure {
                slot: slot.name.clone(),
                reason: "model has no triangles".into(),
            });
            return;
        };

        // A replacement load disposes the previous occupant first.
        if let Some(old) = self.registry.remove(&slot.name) {
            log::debug!("slot {}: replacing previous mesh", slot.name);
            self.scene.remove_subtree(old);
        }

        let mut node = Node::with_name(slot.name.clone());
        node.position = slot.placement.anchor(&bounds);
        node.rotation = slot.placement.rotation;
        node.scale = slot.placement.scale;
        node.mesh = Some(mesh);

        let id = self.scene.add_node(node);
        self.registry.insert(slot.name.clone(), id);
    }

    /// Apply the clicked swatch to every ready part of the tray's kind.
    ///
    /// Parts still loading are skipped with a diagnostic; the click never
    /// fails for an unpopulated slot. Errors are reserved for broken
    /// configuration (bad indices) or an undecodable texture.
    pub fn on_swatch_click(&mut self, tray_index: usize, swatch_key: usize) -> Result<ClickReport> {
        let tray_kind = match self.trays.get(tray_index) {
            Some(tray) => tray.kind,
            None => return Err(Error::UnknownTray(format!("#{tray_index}"))),
        };
        let def = self
            .catalog
            .get(swatch_key)
            .ok_or(Error::SwatchIndex {
                index: swatch_key,
                len: self.catalog.len(),
            })?
            .clone();
        let material = Material::from_definition(&def, &mut self.textures, &self.model_dir)?;

        let mut report = ClickReport {
            applied: 0,
            pending: 0,
        };
        for slot in self.slots.iter().filter(|s| s.kind == tray_kind) {
            match self.registry.get(&slot.name) {
                Some(node) => {
                    self.scene.set_material_subtree(node, &material);
                    report.applied += 1;
                }
                None if slot.model_path.is_some() => {
                    log::debug!("slot {}: not ready, swatch click skipped", slot.name);
                    report.pending += 1;
                }
                None => {}
            }
        }

        self.trays[tray_index].applied = Some(swatch_key);
        log::info!(
            "tray {}: applied swatch {} to {} part(s), {} pending",
            tray_index,
            swatch_key,
            report.applied,
            report.pending
        );
        Ok(report)
    }

    /// Rebuild the assembly for a new keycap count: previous part nodes are
    /// removed and disposed, the registry cleared, and loading restarted
    /// with the new slot list (board variant chosen by the count rule).
    pub fn on_slot_count_change(&mut self, new_count: usize) {
        if new_count == self.slot_count {
            return;
        }
        log::info!("slot count {} -> {}", self.slot_count, new_count);

        let retired: Vec<_> = self.registry.names().map(String::from).collect();
        for name in retired {
            if let Some(node) = self.registry.remove(&name) {
                self.scene.remove_subtree(node);
            }
        }
        self.registry.clear();

        self.slot_count = new_count;
        self.slots = slot_layout(new_count, &self.model_dir, self.board);
        self.begin_loading();
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn registry(&self) -> &PartRegistry {
        &self.registry
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn trays(&self) -> &[Tray] {
        &self.trays
    }

    pub fn slots(&self) -> &[PartSlot] {
        &self.slots
    }

    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    pub fn failures(&self) -> &[SlotFailure] {
        &self.failures
    }

    /// True while any spawned load has not been absorbed yet.
    pub fn loading(&self) -> bool {
        self.loader.as_ref().is_some_and(|l| !l.is_settled())
    }

    /// World bounds of the assembled product, for camera framing.
    pub fn product_bounds(&self) -> Option<Aabb> {
        self.scene.combined_bounds()
    }
}
