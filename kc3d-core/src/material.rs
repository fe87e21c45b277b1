/// Part materials built from catalog definitions
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbaImage;
use nalgebra::Point3;

use crate::catalog::{ColorDefinition, Rgb};
use crate::error::{Error, Result};
use crate::placement::KEYCAP_PITCH;

/// Shininess of the neutral material parts wear until a swatch is clicked.
pub const DEFAULT_PART_SHININESS: f32 = 100.0;

/// A tiled texture map.
///
/// STL geometry carries no UV coordinates, so textures are projected
/// planarly: one repeat unit spans one keycap pitch in world space.
#[derive(Clone)]
pub struct TextureMap {
    pub image: Arc<RgbaImage>,
    pub repeat: [f32; 3],
}

impl fmt::Debug for TextureMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextureMap")
            .field("size", &(self.image.width(), self.image.height()))
            .field("repeat", &self.repeat)
            .finish()
    }
}

/// Surface appearance of one part subtree.
#[derive(Debug, Clone)]
pub struct Material {
    pub base: Rgb,
    pub map: Option<TextureMap>,
    pub shininess: f32,
}

impl Material {
    pub fn flat(base: Rgb, shininess: f32) -> Self {
        Self {
            base,
            map: None,
            shininess,
        }
    }

    /// Neutral white worn by every part until the user picks a swatch.
    pub fn default_part() -> Self {
        Self::flat(Rgb::WHITE, DEFAULT_PART_SHININESS)
    }

    /// Build a material from a catalog definition. A texture, when present,
    /// takes precedence over the flat color; the color remains as tint.
    pub fn from_definition(
        def: &ColorDefinition,
        textures: &mut TextureCache,
        base_dir: &Path,
    ) -> Result<Material> {
        let map = match &def.texture {
            Some(rel) => {
                let image = textures.load(&base_dir.join(rel))?;
                Some(TextureMap {
                    image,
                    repeat: def.repeat,
                })
            }
            None => None,
        };
        Ok(Material {
            base: def.color.unwrap_or(Rgb::WHITE),
            map,
            shininess: def.shininess,
        })
    }

    /// Surface color at a world-space point, before lighting.
    pub fn sample(&self, world: &Point3<f32>) -> Rgb {
        let Some(map) = &self.map else {
            return self.base;
        };

        let u = wrap(world.x / KEYCAP_PITCH * map.repeat[0]);
        let v = wrap(world.y / KEYCAP_PITCH * map.repeat[1]);
        let x = ((u * map.image.width() as f32) as u32).min(map.image.width() - 1);
        let y = ((v * map.image.height() as f32) as u32).min(map.image.height() - 1);
        let px = map.image.get_pixel(x, y).0;
        Rgb {
            r: px[0],
            g: px[1],
            b: px[2],
        }
    }
}

fn wrap(t: f32) -> f32 {
    t - t.floor()
}

/// Decoded texture images, keyed by path and shared between materials.
///
/// Textures are decoded on the first click that needs them and reused for
/// every later material swap in the session.
#[derive(Default)]
pub struct TextureCache {
    cache: HashMap<PathBuf, Arc<RgbaImage>>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, path: &Path) -> Result<Arc<RgbaImage>> {
        if let Some(hit) = self.cache.get(path) {
            return Ok(Arc::clone(hit));
        }
        let decoded = image::open(path)
            .map_err(|e| Error::Texture {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?
            .to_rgba8();
        let shared = Arc::new(decoded);
        self.cache.insert(path.to_path_buf(), Arc::clone(&shared));
        Ok(shared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn two_tone_map(repeat: [f32; 3]) -> Material {
        // Left half red, right half green.
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([0, 255, 0, 255]));
        Material {
            base: Rgb::WHITE,
            map: Some(TextureMap {
                image: Arc::new(img),
                repeat,
            }),
            shininess: 30.0,
        }
    }

    #[test]
    fn flat_material_samples_its_color() {
        let material = Material::flat(Rgb::from_u32(0x00ff00), 30.0);
        let sampled = material.sample(&Point3::new(3.0, -7.0, 1.0));
        assert_eq!(sampled, Rgb::from_u32(0x00ff00));
    }

    #[test]
    fn texture_tiles_with_repeat() {
        let material = two_tone_map([1.0, 1.0, 1.0]);

        // First quarter of a pitch lands in the left texel.
        let left = material.sample(&Point3::new(KEYCAP_PITCH * 0.25, 0.0, 0.0));
        assert_eq!(left, Rgb::from_u32(0xff0000));

        let right = material.sample(&Point3::new(KEYCAP_PITCH * 0.75, 0.0, 0.0));
        assert_eq!(right, Rgb::from_u32(0x00ff00));
    }

    #[test]
    fn doubled_repeat_halves_the_tile() {
        let material = two_tone_map([2.0, 1.0, 1.0]);

        // With repeat 2, half a pitch already wraps into a new tile.
        let sampled = material.sample(&Point3::new(KEYCAP_PITCH * 0.625, 0.0, 0.0));
        assert_eq!(sampled, Rgb::from_u32(0xff0000));
    }

    #[test]
    fn negative_coordinates_wrap() {
        let material = two_tone_map([1.0, 1.0, 1.0]);
        let sampled = material.sample(&Point3::new(-KEYCAP_PITCH * 0.25, 0.0, 0.0));
        assert_eq!(sampled, Rgb::from_u32(0x00ff00));
    }

    #[test]
    fn default_part_material_is_white() {
        let material = Material::default_part();
        assert_eq!(material.base, Rgb::WHITE);
        assert_eq!(material.shininess, DEFAULT_PART_SHININESS);
        assert!(material.map.is_none());
    }
}
