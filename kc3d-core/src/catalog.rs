/// Color catalog: the ordered list of swatch definitions
///
/// The catalog is deserialized once at startup from a TOML file of
/// `[[swatch]]` tables and validated eagerly; a malformed entry aborts
/// startup rather than surfacing on the first click.
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// An sRGB color parsed from a hex literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb {
        r: 0xff,
        g: 0xff,
        b: 0xff,
    };

    /// Parse `"rrggbb"` or `"#rrggbb"`.
    pub fn from_hex(literal: &str) -> Result<Rgb> {
        let digits = literal.strip_prefix('#').unwrap_or(literal);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::HexColor(literal.to_string()));
        }
        let value = u32::from_str_radix(digits, 16).map_err(|_| Error::HexColor(literal.into()))?;
        Ok(Rgb::from_u32(value))
    }

    pub fn from_u32(value: u32) -> Rgb {
        Rgb {
            r: ((value >> 16) & 0xff) as u8,
            g: ((value >> 8) & 0xff) as u8,
            b: (value & 0xff) as u8,
        }
    }

    pub fn as_u32(&self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Channels as 0..1 floats for shading math.
    pub fn to_f32(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}

/// One selectable swatch: a flat color or a tiled texture.
///
/// When both `color` and `texture` are present the texture drives the
/// surface and the color remains as the fallback tint.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorDefinition {
    pub label: Option<String>,
    pub color: Option<Rgb>,
    pub texture: Option<PathBuf>,
    pub repeat: [f32; 3],
    pub shininess: f32,
}

impl ColorDefinition {
    pub fn flat(color: Rgb) -> Self {
        Self {
            label: None,
            color: Some(color),
            texture: None,
            repeat: [1.0, 1.0, 1.0],
            shininess: DEFAULT_SHININESS,
        }
    }
}

/// Shininess used when a swatch does not specify one.
pub const DEFAULT_SHININESS: f32 = 30.0;

#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    swatch: Vec<RawSwatch>,
}

#[derive(Debug, Deserialize)]
struct RawSwatch {
    label: Option<String>,
    color: Option<String>,
    texture: Option<PathBuf>,
    repeat: Option<[f32; 3]>,
    shininess: Option<f32>,
}

/// The ordered, validated swatch list. Insertion order is display order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<ColorDefinition>,
}

impl Catalog {
    pub fn from_path(path: &Path) -> Result<Catalog> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Catalog> {
        let raw: RawCatalog = toml::from_str(text)?;
        let mut entries = Vec::with_capacity(raw.swatch.len());
        for (index, swatch) in raw.swatch.into_iter().enumerate() {
            entries.push(Self::validate(index, swatch)?);
        }
        Ok(Catalog { entries })
    }

    fn validate(index: usize, raw: RawSwatch) -> Result<ColorDefinition> {
        if raw.color.is_none() && raw.texture.is_none() {
            return Err(Error::CatalogEntry {
                index,
                reason: "needs a `color` or a `texture`".into(),
            });
        }
        let color = raw.color.as_deref().map(Rgb::from_hex).transpose()?;
        Ok(ColorDefinition {
            label: raw.label,
            color,
            texture: raw.texture,
            repeat: raw.repeat.unwrap_or([1.0, 1.0, 1.0]),
            shininess: raw.shininess.unwrap_or(DEFAULT_SHININESS),
        })
    }

    /// Fallback colorway used when no catalog file is given.
    pub fn builtin() -> Catalog {
        let named = |label: &str, hex: u32| ColorDefinition {
            label: Some(label.to_string()),
            color: Some(Rgb::from_u32(hex)),
            texture: None,
            repeat: [1.0, 1.0, 1.0],
            shininess: DEFAULT_SHININESS,
        };
        Catalog {
            entries: vec![
                named("bone", 0xf2efe9),
                named("graphite", 0x2b2b2b),
                named("signal red", 0xc62f38),
                named("cobalt", 0x3a6ea5),
                named("mustard", 0xe0a526),
                named("sage", 0x8ba888),
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ColorDefinition> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColorDefinition> {
        self.entries.iter()
    }
}
