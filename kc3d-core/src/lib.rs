/// KC3D Core Library - configurator state and 3D scene assembly
///
/// This library provides the renderer-independent half of the keycap
/// configurator: STL parsing, geometry and transforms, the color catalog,
/// part slots and placement rules, the scene graph, asynchronous model
/// loading, and the session object that wires them together.
pub mod camera;
pub mod catalog;
pub mod error;
pub mod geometry;
pub mod loader;
pub mod material;
pub mod parts;
pub mod placement;
pub mod scene;
pub mod session;
pub mod stl;
pub mod transform;
pub mod trays;

// Re-export commonly used types
pub use camera::{Camera, OrbitState, ProjectionMode};
pub use catalog::{Catalog, ColorDefinition, Rgb};
pub use error::{Error, Result};
pub use geometry::{Aabb, Mesh, Triangle, Vertex};
pub use loader::{LoadEvent, LoadOutcome, MeshLoader};
pub use material::{Material, TextureCache};
pub use parts::{board_model_name, slot_layout, PartRegistry, PartSlot, SlotKind};
pub use placement::{keycap_offset, Placement, KEYCAP_PITCH, LEGEND_RISE};
pub use scene::{DrawItem, Node, NodeId, Scene};
pub use session::{ClickReport, Configurator, SlotFailure};
pub use transform::{RotationState, Transform};
pub use trays::{build_trays, default_tray_specs, Swatch, Tray, TraySpec};
