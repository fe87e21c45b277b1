/// Swatch trays: one tray of catalog swatches per customizable part
///
/// Trays are built exactly once per viewer session, in catalog order
/// (insertion order is display order). Configuration problems such as a
/// preselected swatch outside the catalog fail here, at construction,
/// never at click time.
use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::parts::SlotKind;

/// A clickable cell tagged with its catalog index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swatch {
    pub key: usize,
}

/// A group of swatches bound to one part kind.
#[derive(Debug, Clone)]
pub struct Tray {
    pub label: String,
    pub kind: SlotKind,
    pub swatches: Vec<Swatch>,
    /// Catalog index last applied to this tray's part, for UI highlighting.
    pub applied: Option<usize>,
}

/// Declarative tray description consumed by `build_trays`.
#[derive(Debug, Clone)]
pub struct TraySpec {
    pub label: String,
    pub kind: SlotKind,
    /// Swatch to mark as applied at startup, validated against the catalog.
    pub initial: Option<usize>,
}

impl TraySpec {
    pub fn new(label: impl Into<String>, kind: SlotKind) -> Self {
        Self {
            label: label.into(),
            kind,
            initial: None,
        }
    }
}

/// The standard three trays of the product.
pub fn default_tray_specs() -> Vec<TraySpec> {
    vec![
        TraySpec::new("Keycap", SlotKind::Keycap),
        TraySpec::new("Legend", SlotKind::Text),
        TraySpec::new("Board", SlotKind::SwitchBoard),
    ]
}

/// Create one swatch per catalog entry per tray.
pub fn build_trays(catalog: &Catalog, specs: &[TraySpec]) -> Result<Vec<Tray>> {
    let mut trays = Vec::with_capacity(specs.len());
    for spec in specs {
        if let Some(initial) = spec.initial {
            if initial >= catalog.len() {
                return Err(Error::SwatchIndex {
                    index: initial,
                    len: catalog.len(),
                });
            }
        }
        trays.push(Tray {
            label: spec.label.clone(),
            kind: spec.kind,
            swatches: (0..catalog.len()).map(|key| Swatch { key }).collect(),
            applied: spec.initial,
        });
    }
    Ok(trays)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn two_color_catalog() -> Catalog {
        Catalog::from_toml(
            "[[swatch]]\ncolor = \"ff0000\"\n\n[[swatch]]\ncolor = \"00ff00\"\n",
        )
        .unwrap()
    }

    #[test]
    fn one_swatch_per_entry_per_tray_in_order() {
        let catalog = two_color_catalog();
        let trays = build_trays(&catalog, &default_tray_specs()).unwrap();

        assert_eq!(trays.len(), 3);
        for tray in &trays {
            assert_eq!(tray.swatches.len(), 2);
            for (position, swatch) in tray.swatches.iter().enumerate() {
                assert_eq!(swatch.key, position);
            }
        }
    }

    #[test]
    fn out_of_range_initial_swatch_fails_fast() {
        let catalog = two_color_catalog();
        let mut specs = default_tray_specs();
        specs[0].initial = Some(7);

        let err = build_trays(&catalog, &specs).unwrap_err();
        assert!(matches!(err, Error::SwatchIndex { index: 7, len: 2 }));
    }
}
