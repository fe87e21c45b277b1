/// Example: run the configurator on generated stand-in models
///
/// Writes simple cuboid stand-ins for the keycap, legend, and switch-board
/// models into a scratch directory and starts the viewer on them, so the
/// full click-to-recolor flow can be tried without any real STL files.
///
/// Usage: cargo run --example demo_models

use nalgebra::{Point3, Vector3};

use kc3d_core::stl::write_binary_stl;
use kc3d_core::{default_tray_specs, Catalog, Configurator, Mesh};
use kc3d_terminal::TerminalApp;

const SLOTS: usize = 2;

fn main() -> anyhow::Result<()> {
    let dir = std::env::temp_dir().join("kc3d-demo-models");
    std::fs::create_dir_all(&dir)?;

    let write = |name: &str, center: Point3<f32>, size: Vector3<f32>| -> anyhow::Result<()> {
        let mesh = Mesh::cuboid(center, size);
        std::fs::write(dir.join(name), write_binary_stl(&mesh))?;
        Ok(())
    };

    write(
        "keycap.stl",
        Point3::origin(),
        Vector3::new(18.0, 18.0, 8.0),
    )?;
    write("text.stl", Point3::origin(), Vector3::new(10.0, 10.0, 1.0))?;
    for count in 1..=9 {
        write(
            &format!("switch-board-{count}.stl"),
            Point3::origin(),
            Vector3::new(count as f32 * 19.0, 22.0, 3.0),
        )?;
    }

    println!("Stand-in models written to {}", dir.display());
    println!("Starting viewer (press Q to quit)...");
    std::thread::sleep(std::time::Duration::from_secs(1));

    let cfg = Configurator::new(dir, Catalog::builtin(), &default_tray_specs(), SLOTS, true)?;
    let mut app = TerminalApp::new(cfg, true)?;
    app.run()?;

    Ok(())
}
