//! Procedural prop meshes. No model files ship with the game; every shape
//! is generated here and colored per vertex.

use render_wgpu::{MeshData, MeshVertex};

use std::f32::consts::TAU;

struct MeshBuilder {
    vertices: Vec<MeshVertex>,
    indices: Vec<u32>,
}

impl MeshBuilder {
    fn new() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    fn vertex(&mut self, position: [f32; 3], normal: [f32; 3], color: [f32; 3]) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(MeshVertex {
            position,
            normal,
            color,
        });
        index
    }

    fn triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    fn quad(&mut self, a: u32, b: u32, c: u32, d: u32) {
        self.triangle(a, b, c);
        self.triangle(a, c, d);
    }

    fn build(self) -> MeshData {
        MeshData::new(self.vertices, self.indices).expect("prop mesh is well-formed")
    }
}

/// Flat ground square centered at the origin, facing up.
pub fn ground(half_extent: f32, color: [f32; 3]) -> MeshData {
    let mut builder = MeshBuilder::new();
    let up = [0.0, 1.0, 0.0];
    let a = builder.vertex([-half_extent, 0.0, -half_extent], up, color);
    let b = builder.vertex([half_extent, 0.0, -half_extent], up, color);
    let c = builder.vertex([half_extent, 0.0, half_extent], up, color);
    let d = builder.vertex([-half_extent, 0.0, half_extent], up, color);
    builder.quad(a, b, c, d);
    builder.build()
}

/// Axis-aligned box centered at the origin with per-face normals.
pub fn cuboid(half: [f32; 3], color: [f32; 3]) -> MeshData {
    let mut builder = MeshBuilder::new();
    let [hx, hy, hz] = half;
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        (
            [0.0, 0.0, 1.0],
            [
                [-hx, -hy, hz],
                [hx, -hy, hz],
                [hx, hy, hz],
                [-hx, hy, hz],
            ],
        ),
        (
            [0.0, 0.0, -1.0],
            [
                [hx, -hy, -hz],
                [-hx, -hy, -hz],
                [-hx, hy, -hz],
                [hx, hy, -hz],
            ],
        ),
        (
            [1.0, 0.0, 0.0],
            [
                [hx, -hy, hz],
                [hx, -hy, -hz],
                [hx, hy, -hz],
                [hx, hy, hz],
            ],
        ),
        (
            [-1.0, 0.0, 0.0],
            [
                [-hx, -hy, -hz],
                [-hx, -hy, hz],
                [-hx, hy, hz],
                [-hx, hy, -hz],
            ],
        ),
        (
            [0.0, 1.0, 0.0],
            [
                [-hx, hy, hz],
                [hx, hy, hz],
                [hx, hy, -hz],
                [-hx, hy, -hz],
            ],
        ),
        (
            [0.0, -1.0, 0.0],
            [
                [-hx, -hy, -hz],
                [hx, -hy, -hz],
                [hx, -hy, hz],
                [-hx, -hy, hz],
            ],
        ),
    ];
    for (normal, corners) in faces {
        let a = builder.vertex(corners[0], normal, color);
        let b = builder.vertex(corners[1], normal, color);
        let c = builder.vertex(corners[2], normal, color);
        let d = builder.vertex(corners[3], normal, color);
        builder.quad(a, b, c, d);
    }
    builder.build()
}

/// Lat-long sphere centered at the origin.
pub fn sphere(radius: f32, rings: u32, segments: u32, color: [f32; 3]) -> MeshData {
    lat_long_sphere(radius, rings, segments, false, |_| color)
}

/// Inward-facing dome with a vertical color gradient, drawn behind the
/// scene as the sky.
pub fn sky_dome(
    radius: f32,
    rings: u32,
    segments: u32,
    horizon: [f32; 3],
    zenith: [f32; 3],
) -> MeshData {
    lat_long_sphere(radius, rings, segments, true, |y| {
        let t = ((y / radius) + 1.0) * 0.5;
        [
            horizon[0] + (zenith[0] - horizon[0]) * t,
            horizon[1] + (zenith[1] - horizon[1]) * t,
            horizon[2] + (zenith[2] - horizon[2]) * t,
        ]
    })
}

fn lat_long_sphere(
    radius: f32,
    rings: u32,
    segments: u32,
    inward: bool,
    color_at: impl Fn(f32) -> [f32; 3],
) -> MeshData {
    let rings = rings.max(2);
    let segments = segments.max(3);
    let mut builder = MeshBuilder::new();
    for ring in 0..=rings {
        let theta = std::f32::consts::PI * ring as f32 / rings as f32;
        let y = theta.cos();
        let ring_radius = theta.sin();
        for segment in 0..=segments {
            let phi = TAU * segment as f32 / segments as f32;
            let direction = [ring_radius * phi.cos(), y, ring_radius * phi.sin()];
            let normal = if inward {
                [-direction[0], -direction[1], -direction[2]]
            } else {
                direction
            };
            let position = [
                direction[0] * radius,
                direction[1] * radius,
                direction[2] * radius,
            ];
            builder.vertex(position, normal, color_at(position[1]));
        }
    }
    let stride = segments + 1;
    for ring in 0..rings {
        for segment in 0..segments {
            let a = ring * stride + segment;
            let b = a + stride;
            if inward {
                builder.quad(a, a + 1, b + 1, b);
            } else {
                builder.quad(a, b, b + 1, a + 1);
            }
        }
    }
    builder.build()
}

/// Closed cylinder standing on the origin plane (base at y = 0).
pub fn cylinder(radius: f32, height: f32, segments: u32, color: [f32; 3]) -> MeshData {
    let segments = segments.max(3);
    let mut builder = MeshBuilder::new();
    for segment in 0..=segments {
        let phi = TAU * segment as f32 / segments as f32;
        let normal = [phi.cos(), 0.0, phi.sin()];
        let x = radius * normal[0];
        let z = radius * normal[2];
        builder.vertex([x, 0.0, z], normal, color);
        builder.vertex([x, height, z], normal, color);
    }
    for segment in 0..segments {
        let a = segment * 2;
        builder.quad(a, a + 2, a + 3, a + 1);
    }
    let bottom_center = builder.vertex([0.0, 0.0, 0.0], [0.0, -1.0, 0.0], color);
    let top_center = builder.vertex([0.0, height, 0.0], [0.0, 1.0, 0.0], color);
    for segment in 0..segments {
        let phi_a = TAU * segment as f32 / segments as f32;
        let phi_b = TAU * (segment + 1) as f32 / segments as f32;
        let bottom_a = builder.vertex(
            [radius * phi_a.cos(), 0.0, radius * phi_a.sin()],
            [0.0, -1.0, 0.0],
            color,
        );
        let bottom_b = builder.vertex(
            [radius * phi_b.cos(), 0.0, radius * phi_b.sin()],
            [0.0, -1.0, 0.0],
            color,
        );
        builder.triangle(bottom_center, bottom_b, bottom_a);
        let top_a = builder.vertex(
            [radius * phi_a.cos(), height, radius * phi_a.sin()],
            [0.0, 1.0, 0.0],
            color,
        );
        let top_b = builder.vertex(
            [radius * phi_b.cos(), height, radius * phi_b.sin()],
            [0.0, 1.0, 0.0],
            color,
        );
        builder.triangle(top_center, top_a, top_b);
    }
    builder.build()
}

/// Cone standing on the origin plane, apex up.
pub fn cone(radius: f32, height: f32, segments: u32, color: [f32; 3]) -> MeshData {
    let segments = segments.max(3);
    let mut builder = MeshBuilder::new();
    let apex = builder.vertex([0.0, height, 0.0], [0.0, 1.0, 0.0], color);
    let base_center = builder.vertex([0.0, 0.0, 0.0], [0.0, -1.0, 0.0], color);
    for segment in 0..segments {
        let phi_a = TAU * segment as f32 / segments as f32;
        let phi_b = TAU * (segment + 1) as f32 / segments as f32;
        let side = |phi: f32, builder: &mut MeshBuilder| {
            let normal = [phi.cos(), radius / height.max(f32::EPSILON), phi.sin()];
            builder.vertex([radius * phi.cos(), 0.0, radius * phi.sin()], normal, color)
        };
        let a = side(phi_a, &mut builder);
        let b = side(phi_b, &mut builder);
        builder.triangle(apex, b, a);
        let base_a = builder.vertex(
            [radius * phi_a.cos(), 0.0, radius * phi_a.sin()],
            [0.0, -1.0, 0.0],
            color,
        );
        let base_b = builder.vertex(
            [radius * phi_b.cos(), 0.0, radius * phi_b.sin()],
            [0.0, -1.0, 0.0],
            color,
        );
        builder.triangle(base_center, base_b, base_a);
    }
    builder.build()
}

/// Open-ended wall ring used for the perimeter (unit radius and height,
/// scaled by the model matrix).
pub fn wall_ring(segments: u32, color: [f32; 3]) -> MeshData {
    let segments = segments.max(3);
    let mut builder = MeshBuilder::new();
    for segment in 0..=segments {
        let phi = TAU * segment as f32 / segments as f32;
        // Faces inward toward the player.
        let normal = [-phi.cos(), 0.0, -phi.sin()];
        builder.vertex([phi.cos(), -1.0, phi.sin()], normal, color);
        builder.vertex([phi.cos(), 1.0, phi.sin()], normal, color);
    }
    for segment in 0..segments {
        let a = segment * 2;
        builder.quad(a, a + 1, a + 3, a + 2);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_shapes_pass_mesh_validation() {
        // MeshData::new runs index validation, so construction is the test.
        let white = [1.0, 1.0, 1.0];
        assert!(!ground(400.0, white).indices.is_empty());
        assert!(!cuboid([1.0, 2.0, 3.0], white).indices.is_empty());
        assert!(!sphere(5.0, 8, 12, white).indices.is_empty());
        assert!(!sky_dome(4000.0, 8, 12, white, white).indices.is_empty());
        assert!(!cylinder(2.0, 10.0, 12, white).indices.is_empty());
        assert!(!cone(6.0, 12.0, 12, white).indices.is_empty());
        assert!(!wall_ring(24, white).indices.is_empty());
    }

    #[test]
    fn sphere_vertices_sit_on_the_radius() {
        let mesh = sphere(7.0, 6, 9, [1.0, 0.0, 0.0]);
        for vertex in &mesh.vertices {
            let [x, y, z] = vertex.position;
            let distance = (x * x + y * y + z * z).sqrt();
            assert!((distance - 7.0).abs() < 1.0e-3);
        }
    }

    #[test]
    fn sky_dome_normals_point_inward() {
        let mesh = sky_dome(100.0, 4, 6, [0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        for vertex in &mesh.vertices {
            let [x, y, z] = vertex.position;
            let [nx, ny, nz] = vertex.normal;
            let dot = x * nx + y * ny + z * nz;
            assert!(dot <= 1.0e-3);
        }
    }
}
