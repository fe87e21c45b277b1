/// Character rasterizer for terminal rendering
use crossterm::{
    cursor::MoveTo,
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::{Matrix4, Point3, Vector3};
use std::io::Write;

use kc3d_core::{Camera, Material, Mesh, Triangle};

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Fixed key light, roughly over the viewer's shoulder.
const LIGHT_DIR: (f32, f32, f32) = (0.35, 0.65, 0.65);

/// Hemisphere floor term: faces pointing down still get this much light.
const GROUND_LIGHT: f32 = 0.35;

/// Software rasterizer that draws shaded, per-material colored cells.
pub struct CellRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
    color_buffer: Vec<(u8, u8, u8)>,
}

impl CellRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
            color_buffer: vec![(0, 0, 0); size],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        let size = width * height;
        self.depth_buffer = vec![f32::INFINITY; size];
        self.char_buffer = vec![' '; size];
        self.color_buffer = vec![(0, 0, 0); size];
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
        self.color_buffer.fill((0, 0, 0));
    }

    /// Rasterize one mesh with its world transform and material.
    pub fn render_mesh(
        &mut self,
        mesh: &Mesh,
        world: &Matrix4<f32>,
        camera: &Camera,
        material: &Material,
    ) {
        let eye = camera.position;
        for triangle in &mesh.triangles {
            self.render_triangle(triangle, world, camera, material, &eye);
        }
    }

    fn render_triangle(
        &mut self,
        triangle: &Triangle,
        world: &Matrix4<f32>,
        camera: &Camera,
        material: &Material,
        eye: &Point3<f32>,
    ) {
        // Transform to world space once; the normal is rebuilt from the
        // transformed corners so rotation and scale shade correctly.
        let world_pos: [Point3<f32>; 3] = [
            world.transform_point(&triangle.vertices[0].position),
            world.transform_point(&triangle.vertices[1].position),
            world.transform_point(&triangle.vertices[2].position),
        ];
        let normal = (world_pos[1] - world_pos[0])
            .cross(&(world_pos[2] - world_pos[0]))
            .normalize();

        let mut screen = [(0.0f32, 0.0f32, 0.0f32); 3];
        for (slot, wp) in screen.iter_mut().zip(world_pos.iter()) {
            match camera.project_to_screen(wp, self.width as u32, self.height as u32) {
                Some(coords) => *slot = coords,
                None => return, // triangle clipped
            }
        }

        let centroid = Point3::from(
            (world_pos[0].coords + world_pos[1].coords + world_pos[2].coords) / 3.0,
        );
        let light = Vector3::new(LIGHT_DIR.0, LIGHT_DIR.1, LIGHT_DIR.2).normalize();
        let diffuse = normal.dot(&light).max(0.0);

        // Two-tone hemisphere fill so downward faces never go fully black.
        let hemi = GROUND_LIGHT + (1.0 - GROUND_LIGHT) * (normal.y + 1.0) * 0.5;
        let intensity = (hemi * (0.25 + 0.75 * diffuse)).clamp(0.0, 1.0);

        let view = (eye - centroid).normalize();
        let half = (light + view).normalize();
        let specular = normal.dot(&half).max(0.0).powf(material.shininess) * 0.6;

        let glyph_level = (intensity + specular).clamp(0.0, 1.0);
        let char_index = ((glyph_level * (LUMINOSITY_RAMP.len() - 1) as f32) as usize)
            .min(LUMINOSITY_RAMP.len() - 1);
        let glyph = LUMINOSITY_RAMP[char_index.max(1)]; // never shade a face as empty space

        self.rasterize_triangle(&screen, &world_pos, material, intensity, specular, glyph);
    }

    #[allow(clippy::too_many_arguments)]
    fn rasterize_triangle(
        &mut self,
        screen: &[(f32, f32, f32); 3],
        world_pos: &[Point3<f32>; 3],
        material: &Material,
        intensity: f32,
        specular: f32,
        glyph: char,
    ) {
        let (v0, v1, v2) = (screen[0], screen[1], screen[2]);

        // Bounding box, clipped to the viewport
        let min_x = (v0.0.min(v1.0).min(v2.0).floor() as i32).max(0);
        let max_x = (v0.0.max(v1.0).max(v2.0).ceil() as i32).min(self.width as i32 - 1);
        let min_y = (v0.1.min(v1.1).min(v2.1).floor() as i32).max(0);
        let max_y = (v0.1.max(v1.1).max(v2.1).ceil() as i32).min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                let Some((w0, w1, w2)) =
                    barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py))
                else {
                    continue;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                let idx = y as usize * self.width + x as usize;
                if depth >= self.depth_buffer[idx] {
                    continue;
                }

                let world_point = Point3::from(
                    world_pos[0].coords * w0
                        + world_pos[1].coords * w1
                        + world_pos[2].coords * w2,
                );
                let [r, g, b] = material.sample(&world_point).to_f32();
                let lit = |channel: f32| {
                    ((channel * intensity + specular).clamp(0.0, 1.0) * 255.0) as u8
                };

                self.depth_buffer[idx] = depth;
                self.char_buffer[idx] = glyph;
                self.color_buffer[idx] = (lit(r), lit(g), lit(b));
            }
        }
    }

    /// Fraction of cells covered by geometry, for the status line.
    pub fn coverage(&self) -> f32 {
        if self.char_buffer.is_empty() {
            return 0.0;
        }
        let filled = self.char_buffer.iter().filter(|c| **c != ' ').count();
        filled as f32 / self.char_buffer.len() as f32
    }

    /// Queue the frame, one explicitly positioned row at a time (raw mode
    /// gives no carriage return on newline).
    pub fn draw<W: Write>(&self, writer: &mut W, origin_row: u16) -> std::io::Result<()> {
        let mut last_color: Option<(u8, u8, u8)> = None;
        for y in 0..self.height {
            writer.queue(MoveTo(0, origin_row + y as u16))?;
            for x in 0..self.width {
                let idx = y * self.width + x;
                let c = self.char_buffer[idx];
                if c == ' ' {
                    writer.queue(Print(' '))?;
                    continue;
                }
                let color = self.color_buffer[idx];
                if last_color != Some(color) {
                    writer.queue(SetForegroundColor(Color::Rgb {
                        r: color.0,
                        g: color.1,
                        b: color.2,
                    }))?;
                    last_color = Some(color);
                }
                writer.queue(Print(c))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kc3d_core::Rgb;
    use nalgebra::Vector3;

    #[test]
    fn cube_in_front_of_camera_covers_cells() {
        let mut renderer = CellRenderer::new(60, 30);
        let camera = Camera::new(60, 30);
        let mesh = Mesh::cuboid(Point3::origin(), Vector3::new(8.0, 8.0, 8.0));
        let material = Material::flat(Rgb::from_u32(0xff0000), 30.0);

        renderer.render_mesh(&mesh, &Matrix4::identity(), &camera, &material);
        assert!(renderer.coverage() > 0.0);

        renderer.clear();
        assert_eq!(renderer.coverage(), 0.0);
    }

    #[test]
    fn nearer_surface_wins_the_depth_test() {
        let mut renderer = CellRenderer::new(40, 20);
        let camera = Camera::new(40, 20);

        let far = Mesh::cuboid(Point3::new(0.0, 0.0, -6.0), Vector3::new(6.0, 6.0, 1.0));
        let near = Mesh::cuboid(Point3::new(0.0, 0.0, 6.0), Vector3::new(6.0, 6.0, 1.0));
        let red = Material::flat(Rgb::from_u32(0xff0000), 30.0);
        let green = Material::flat(Rgb::from_u32(0x00ff00), 30.0);

        renderer.render_mesh(&far, &Matrix4::identity(), &camera, &red);
        renderer.render_mesh(&near, &Matrix4::identity(), &camera, &green);

        // Center cell: the near green slab must have overwritten the red one.
        let idx = 10 * 40 + 20;
        let (r, g, _) = renderer.color_buffer[idx];
        assert!(g > r);
    }

    #[test]
    fn degenerate_triangle_is_ignored() {
        assert!(barycentric((0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (1.0, 0.0)).is_none());
    }
}
