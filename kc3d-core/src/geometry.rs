/// Geometry primitives for the configurator
use nalgebra::{Matrix4, Point3, Vector3};

/// A 3D vertex with position and normal
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
}

impl Vertex {
    pub fn new(x: f32, y: f32, z: f32, nx: f32, ny: f32, nz: f32) -> Self {
        Self {
            position: Point3::new(x, y, z),
            normal: Vector3::new(nx, ny, nz),
        }
    }
}

/// A triangle face defined by three vertices
#[derive(Debug, Clone)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Calculate the face normal from the triangle's vertices
    pub fn calculate_normal(&self) -> Vector3<f32> {
        let v0 = self.vertices[0].position;
        let v1 = self.vertices[1].position;
        let v2 = self.vertices[2].position;

        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        edge1.cross(&edge2).normalize()
    }
}

/// Axis-aligned bounding box.
///
/// Placement rules re-center every loaded part by the negated center of its
/// local box before applying the slot offset, so the box is computed once per
/// load rather than per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    pub fn new(min: Point3<f32>, max: Point3<f32>) -> Self {
        Self { min, max }
    }

    /// Grow the box to enclose a point.
    pub fn expand(&mut self, p: &Point3<f32>) {
        for i in 0..3 {
            self.min[i] = self.min[i].min(p[i]);
            self.max[i] = self.max[i].max(p[i]);
        }
    }

    /// Merge two boxes into the smallest box enclosing both.
    pub fn union(&self, other: &Aabb) -> Aabb {
        let mut out = *self;
        out.expand(&other.min);
        out.expand(&other.max);
        out
    }

    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }

    /// The box enclosing this box's corners after a transform.
    pub fn transformed(&self, matrix: &Matrix4<f32>) -> Aabb {
        let mut out: Option<Aabb> = None;
        for xi in [self.min.x, self.max.x] {
            for yi in [self.min.y, self.max.y] {
                for zi in [self.min.z, self.max.z] {
                    let corner = matrix.transform_point(&Point3::new(xi, yi, zi));
                    match out.as_mut() {
                        Some(b) => b.expand(&corner),
                        None => out = Some(Aabb::new(corner, corner)),
                    }
                }
            }
        }
        out.unwrap()
    }
}

/// A triangle mesh as parsed from one model file
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            triangles: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Local bounding box, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<Aabb> {
        let mut out: Option<Aabb> = None;
        for triangle in &self.triangles {
            for vertex in &triangle.vertices {
                match out.as_mut() {
                    Some(b) => b.expand(&vertex.position),
                    None => out = Some(Aabb::new(vertex.position, vertex.position)),
                }
            }
        }
        out
    }

    /// An axis-aligned box mesh centered on `center`, used by tests and as a
    /// stand-in part while authoring catalogs without model files.
    pub fn cuboid(center: Point3<f32>, size: Vector3<f32>) -> Self {
        let hx = size.x / 2.0;
        let hy = size.y / 2.0;
        let hz = size.z / 2.0;
        let (cx, cy, cz) = (center.x, center.y, center.z);
        let mut mesh = Self::with_capacity(12);

        // One quad per face, split into two triangles.
        let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
            // +Z
            (
                [0.0, 0.0, 1.0],
                [
                    [-hx, -hy, hz],
                    [hx, -hy, hz],
                    [hx, hy, hz],
                    [-hx, hy, hz],
                ],
            ),
            // -Z
            (
                [0.0, 0.0, -1.0],
                [
                    [-hx, -hy, -hz],
                    [-hx, hy, -hz],
                    [hx, hy, -hz],
                    [hx, -hy, -hz],
                ],
            ),
            // +Y
            (
                [0.0, 1.0, 0.0],
                [
                    [-hx, hy, -hz],
                    [-hx, hy, hz],
                    [hx, hy, hz],
                    [hx, hy, -hz],
                ],
            ),
            // -Y
            (
                [0.0, -1.0, 0.0],
                [
                    [-hx, -hy, -hz],
                    [hx, -hy, -hz],
                    [hx, -hy, hz],
                    [-hx, -hy, hz],
                ],
            ),
            // +X
            (
                [1.0, 0.0, 0.0],
                [
                    [hx, -hy, -hz],
                    [hx, hy, -hz],
                    [hx, hy, hz],
                    [hx, -hy, hz],
                ],
            ),
            // -X
            (
                [-1.0, 0.0, 0.0],
                [
                    [-hx, -hy, -hz],
                    [-hx, -hy, hz],
                    [-hx, hy, hz],
                    [-hx, hy, -hz],
                ],
            ),
        ];

        for (n, quad) in &faces {
            let v = |p: &[f32; 3]| {
                Vertex::new(cx + p[0], cy + p[1], cz + p[2], n[0], n[1], n[2])
            };
            mesh.add_triangle(Triangle::new(v(&quad[0]), v(&quad[1]), v(&quad[2])));
            mesh.add_triangle(Triangle::new(v(&quad[0]), v(&quad[2]), v(&quad[3])));
        }

        mesh
    }
}
