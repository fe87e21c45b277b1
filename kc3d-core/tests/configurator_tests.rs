//! Configurator Session Integration Tests
//!
//! Tests for:
//! - Load absorption: parts land on their placement offsets
//! - Click handling: before load (no-op), flat color, textured material
//! - Slot-count changes: rebuild, disposal, board variant rule
//! - Load failures surfaced per slot

use std::path::{Path, PathBuf};
use std::time::Duration;

use nalgebra::{Point3, Vector3};

use kc3d_core::catalog::Catalog;
use kc3d_core::geometry::Mesh;
use kc3d_core::parts::SlotKind;
use kc3d_core::session::Configurator;
use kc3d_core::stl::write_binary_stl;
use kc3d_core::trays::default_tray_specs;
use kc3d_core::Rgb;

const LOAD_TIMEOUT: Duration = Duration::from_secs(10);

fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("kc3d-session-{tag}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_stl(path: &Path, center: Point3<f32>, size: Vector3<f32>) {
    let mesh = Mesh::cuboid(center, size);
    std::fs::write(path, write_binary_stl(&mesh)).unwrap();
}

/// Model set with deliberately off-center geometry so the tests exercise
/// the recentering half of placement.
fn write_model_set(dir: &Path, board_counts: &[usize]) {
    write_stl(
        &dir.join("keycap.stl"),
        Point3::new(7.0, -3.0, 2.0),
        Vector3::new(18.0, 18.0, 8.0),
    );
    write_stl(
        &dir.join("text.stl"),
        Point3::new(-2.0, 5.0, 40.0),
        Vector3::new(12.0, 12.0, 1.0),
    );
    for count in board_counts {
        write_stl(
            &dir.join(format!("switch-board-{count}.stl")),
            Point3::origin(),
            Vector3::new(*count as f32 * 19.0, 22.0, 3.0),
        );
    }
}

fn two_color_catalog() -> Catalog {
    Catalog::from_toml("[[swatch]]\ncolor = \"ff0000\"\n\n[[swatch]]\ncolor = \"00ff00\"\n")
        .unwrap()
}

fn session(dir: &Path, count: usize, board: bool) -> Configurator {
    Configurator::new(
        dir.to_path_buf(),
        two_color_catalog(),
        &default_tray_specs(),
        count,
        board,
    )
    .unwrap()
}

// ============================================================================
// Load absorption & placement
// ============================================================================

#[test]
fn loaded_parts_land_on_their_placement_offsets() {
    let dir = scratch_dir("placement");
    write_model_set(&dir, &[2]);

    let mut cfg = session(&dir, 2, true);
    cfg.begin_loading();
    cfg.wait_for_loads(LOAD_TIMEOUT);

    assert!(!cfg.loading());
    assert!(cfg.failures().is_empty(), "{:?}", cfg.failures());
    assert_eq!(cfg.registry().len(), 5);

    for slot in cfg.slots().iter().filter(|s| s.model_path.is_some()) {
        let node = cfg
            .registry()
            .get(&slot.name)
            .unwrap_or_else(|| panic!("slot {} not registered", slot.name));
        let bounds = cfg.scene().world_bounds(node).unwrap();
        let center = bounds.center();
        let offset = slot.placement.offset;
        assert!(
            (center.coords - offset).norm() < 1e-3,
            "slot {}: center {center:?} vs offset {offset:?}",
            slot.name
        );
    }
}

#[test]
fn empty_board_slot_is_skipped_entirely() {
    let dir = scratch_dir("boardless");
    write_model_set(&dir, &[]);

    let mut cfg = session(&dir, 1, false);
    cfg.begin_loading();
    cfg.wait_for_loads(LOAD_TIMEOUT);

    assert!(cfg.failures().is_empty());
    assert_eq!(cfg.registry().len(), 2);
    assert!(cfg.registry().get("switch-board").is_none());
}

// ============================================================================
// Swatch clicks
// ============================================================================

#[test]
fn click_before_load_resolves_is_a_safe_noop() {
    let dir = scratch_dir("early-click");
    write_model_set(&dir, &[1]);

    let mut cfg = session(&dir, 1, true);
    // No begin_loading: every slot is still pending.
    let report = cfg.on_swatch_click(0, 1).unwrap();
    assert_eq!(report.applied, 0);
    assert_eq!(report.pending, 1);
    assert!(cfg.scene().is_empty());
}

#[test]
fn clicking_a_swatch_recolors_only_its_tray_part() {
    let dir = scratch_dir("click");
    write_model_set(&dir, &[1]);

    let mut cfg = session(&dir, 1, true);
    cfg.begin_loading();
    cfg.wait_for_loads(LOAD_TIMEOUT);

    // Tray 0 is the keycap tray; swatch key 1 is 00ff00.
    let report = cfg.on_swatch_click(0, 1).unwrap();
    assert_eq!(report.applied, 1);
    assert_eq!(report.pending, 0);

    let keycap = cfg.registry().get("keycap-0").unwrap();
    let text = cfg.registry().get("text-0").unwrap();
    assert_eq!(
        cfg.scene().get(keycap).unwrap().material.base,
        Rgb::from_u32(0x00ff00)
    );
    assert_eq!(cfg.scene().get(text).unwrap().material.base, Rgb::WHITE);

    assert_eq!(cfg.trays()[0].applied, Some(1));
    assert_eq!(cfg.trays()[1].applied, None);
}

#[test]
fn textured_swatch_builds_a_tiled_material() {
    let dir = scratch_dir("texture");
    write_model_set(&dir, &[1]);

    let mut img = image::RgbaImage::new(2, 2);
    for (_, _, px) in img.enumerate_pixels_mut() {
        *px = image::Rgba([10, 20, 30, 255]);
    }
    img.save(dir.join("speckle.png")).unwrap();

    let catalog = Catalog::from_toml(
        "[[swatch]]\ncolor = \"ffffff\"\ntexture = \"speckle.png\"\nrepeat = [3.0, 2.0, 1.0]\n",
    )
    .unwrap();
    let mut cfg = Configurator::new(
        dir.clone(),
        catalog,
        &default_tray_specs(),
        1,
        true,
    )
    .unwrap();
    cfg.begin_loading();
    cfg.wait_for_loads(LOAD_TIMEOUT);

    cfg.on_swatch_click(0, 0).unwrap();
    let keycap = cfg.registry().get("keycap-0").unwrap();
    let material = &cfg.scene().get(keycap).unwrap().material;
    let map = material.map.as_ref().expect("texture map applied");
    assert_eq!(map.repeat, [3.0, 2.0, 1.0]);

    // The legend tray was not clicked and keeps the flat default.
    let text = cfg.registry().get("text-0").unwrap();
    assert!(cfg.scene().get(text).unwrap().material.map.is_none());
}

// ============================================================================
// Slot-count changes
// ============================================================================

#[test]
fn slot_count_change_rebuilds_the_assembly() {
    let dir = scratch_dir("recount");
    write_model_set(&dir, &[1, 3]);

    let mut cfg = session(&dir, 3, true);
    cfg.begin_loading();
    cfg.wait_for_loads(LOAD_TIMEOUT);
    assert_eq!(cfg.registry().len(), 7);

    cfg.on_slot_count_change(1);
    cfg.wait_for_loads(LOAD_TIMEOUT);

    assert_eq!(cfg.slot_count(), 1);
    let keycap_slots: Vec<_> = cfg
        .slots()
        .iter()
        .filter(|s| s.kind == SlotKind::Keycap)
        .collect();
    assert_eq!(keycap_slots.len(), 1);

    // Retired positions are gone from registry and scene alike.
    assert!(cfg.registry().get("keycap-1").is_none());
    assert!(cfg.registry().get("keycap-2").is_none());
    assert_eq!(cfg.registry().len(), 3);
    assert_eq!(cfg.scene().draw_items().len(), 3);

    let board = cfg
        .slots()
        .iter()
        .find(|s| s.kind == SlotKind::SwitchBoard)
        .unwrap();
    assert_eq!(
        board.model_path.as_deref(),
        Some(dir.join("switch-board-1.stl").as_path())
    );
}

#[test]
fn unchanged_slot_count_is_a_noop() {
    let dir = scratch_dir("same-count");
    write_model_set(&dir, &[2]);

    let mut cfg = session(&dir, 2, true);
    cfg.begin_loading();
    cfg.wait_for_loads(LOAD_TIMEOUT);
    let before = cfg.registry().len();

    cfg.on_slot_count_change(2);
    assert!(!cfg.loading());
    assert_eq!(cfg.registry().len(), before);
}

// ============================================================================
// Load failures
// ============================================================================

#[test]
fn missing_model_surfaces_a_failure_and_keeps_the_slot_empty() {
    let dir = scratch_dir("missing-text");
    // keycap.stl only: text.stl and the board file are absent.
    write_stl(
        &dir.join("keycap.stl"),
        Point3::origin(),
        Vector3::new(18.0, 18.0, 8.0),
    );

    let mut cfg = session(&dir, 1, true);
    cfg.begin_loading();
    cfg.wait_for_loads(LOAD_TIMEOUT);

    assert_eq!(cfg.registry().len(), 1);
    assert!(cfg.registry().get("text-0").is_none());
    assert_eq!(cfg.failures().len(), 2);
    assert!(cfg.failures().iter().any(|f| f.slot == "text-0"));

    // Clicking the legend tray stays a no-op.
    let report = cfg.on_swatch_click(1, 0).unwrap();
    assert_eq!(report.applied, 0);
    assert_eq!(report.pending, 1);
}
