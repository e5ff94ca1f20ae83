//! wgpu renderer: lit vertex-color meshes plus a background sky dome.
//!
//! Draw submission is immediate-mode per frame: the shell queues a sky dome
//! and a list of (mesh, model matrix) pairs, and `render` packs one dynamic
//! uniform slot per draw. The sky pass runs with depth writes disabled and a
//! relaxed depth compare so the dome always sits behind the scene.
#![forbid(unsafe_code)]

use std::borrow::Cow;
use std::fmt;

use winit::dpi::PhysicalSize;

const DRAW_UNIFORM_SIZE: u64 = 256;
const MAX_DRAWS: u64 = 256;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

#[derive(Debug)]
pub enum RenderInitError {
    Surface(wgpu::CreateSurfaceError),
    NoAdapter,
    RequestDevice(wgpu::RequestDeviceError),
}

impl fmt::Display for RenderInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderInitError::Surface(err) => write!(f, "surface creation failed: {}", err),
            RenderInitError::NoAdapter => write!(f, "no compatible gpu adapter"),
            RenderInitError::RequestDevice(err) => write!(f, "device request failed: {}", err),
        }
    }
}

impl std::error::Error for RenderInitError {}

#[derive(Debug)]
pub enum RenderError {
    Surface(wgpu::SurfaceError),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Surface(err) => write!(f, "surface frame unavailable: {}", err),
        }
    }
}

impl std::error::Error for RenderError {}

impl From<wgpu::SurfaceError> for RenderError {
    fn from(err: wgpu::SurfaceError) -> Self {
        RenderError::Surface(err)
    }
}

#[derive(Debug)]
pub enum MeshError {
    EmptyMesh,
    IndexOutOfBounds { index: u32, vertex_count: u32 },
    SizeOverflow,
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeshError::EmptyMesh => write!(f, "mesh has no vertices or indices"),
            MeshError::IndexOutOfBounds {
                index,
                vertex_count,
            } => write!(
                f,
                "mesh index out of bounds: {} (vertex count {})",
                index, vertex_count
            ),
            MeshError::SizeOverflow => write!(f, "mesh size overflow"),
        }
    }
}

impl std::error::Error for MeshError {}

#[derive(Debug, Clone, Copy)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
}

#[derive(Debug, Clone)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Result<Self, MeshError> {
        if vertices.is_empty() || indices.is_empty() {
            return Err(MeshError::EmptyMesh);
        }
        let vertex_count = u32::try_from(vertices.len()).map_err(|_| MeshError::SizeOverflow)?;
        for &index in &indices {
            if index >= vertex_count {
                return Err(MeshError::IndexOutOfBounds {
                    index,
                    vertex_count,
                });
            }
        }
        Ok(Self { vertices, indices })
    }
}

/// Handle into the renderer's mesh registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeshId(u32);

/// Per-frame lighting: sun position drives the lambert term, ambient is the
/// day-night blend.
#[derive(Clone, Copy, Debug)]
pub struct LightParams {
    pub sun_position: [f32; 3],
    pub light_color: [f32; 3],
    pub view_position: [f32; 3],
    pub ambient: [f32; 3],
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

struct DrawCommand {
    mesh: MeshId,
    model: [[f32; 4]; 4],
}

pub struct Renderer<'window> {
    surface: wgpu::Surface<'window>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    clear_color: wgpu::Color,
    scene_pipeline: wgpu::RenderPipeline,
    sky_pipeline: wgpu::RenderPipeline,
    draw_uniforms: wgpu::Buffer,
    draw_bind_group: wgpu::BindGroup,
    depth_view: wgpu::TextureView,
    meshes: Vec<GpuMesh>,
    view_proj: [[f32; 4]; 4],
    light: LightParams,
    sky: Option<DrawCommand>,
    draws: Vec<DrawCommand>,
}

impl<'window> Renderer<'window> {
    pub fn new(window: &'window winit::window::Window, vsync: bool) -> Result<Self, RenderInitError> {
        pollster::block_on(Self::new_async(window, vsync))
    }

    async fn new_async(
        window: &'window winit::window::Window,
        vsync: bool,
    ) -> Result<Self, RenderInitError> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .map_err(RenderInitError::Surface)?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderInitError::NoAdapter)?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("castaway.device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                },
                None,
            )
            .await
            .map_err(RenderInitError::RequestDevice)?;
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .first()
            .copied()
            .unwrap_or(wgpu::TextureFormat::Bgra8UnormSrgb);
        let present_mode = if vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("castaway.scene.shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(SCENE_SHADER)),
        });

        let draw_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("castaway.scene.draw_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(DRAW_UNIFORM_SIZE),
                },
                count: None,
            }],
        });

        let draw_uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("castaway.scene.draw_uniforms"),
            size: DRAW_UNIFORM_SIZE * MAX_DRAWS,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let draw_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("castaway.scene.draw_bind_group"),
            layout: &draw_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &draw_uniforms,
                    offset: 0,
                    size: wgpu::BufferSize::new(DRAW_UNIFORM_SIZE),
                }),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("castaway.scene.pipeline_layout"),
            bind_group_layouts: &[&draw_layout],
            push_constant_ranges: &[],
        });

        let scene_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            config.format,
            "fs_lit",
            true,
        );
        let sky_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            config.format,
            "fs_sky",
            false,
        );

        let depth_view = create_depth_view(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            clear_color: wgpu::Color {
                r: 0.2,
                g: 0.8,
                b: 1.0,
                a: 1.0,
            },
            scene_pipeline,
            sky_pipeline,
            draw_uniforms,
            draw_bind_group,
            depth_view,
            meshes: Vec::new(),
            view_proj: identity_matrix(),
            light: LightParams {
                sun_position: [0.0, 200.0, 0.0],
                light_color: [1.0, 1.0, 1.0],
                view_position: [0.0, 0.0, 0.0],
                ambient: [1.0, 1.0, 1.0],
            },
            sky: None,
            draws: Vec::new(),
        })
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth_view(&self.device, &self.config);
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }

    pub fn set_clear_color(&mut self, r: f64, g: f64, b: f64) {
        self.clear_color = wgpu::Color { r, g, b, a: 1.0 };
    }

    pub fn upload_mesh(&mut self, mesh: &MeshData) -> Result<MeshId, MeshError> {
        use wgpu::util::DeviceExt;

        let vertex_bytes = mesh_vertex_bytes(&mesh.vertices);
        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("castaway.mesh.vertex_buffer"),
                contents: &vertex_bytes,
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_bytes = mesh_index_bytes(&mesh.indices);
        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("castaway.mesh.index_buffer"),
                contents: &index_bytes,
                usage: wgpu::BufferUsages::INDEX,
            });
        let index_count = u32::try_from(mesh.indices.len()).map_err(|_| MeshError::SizeOverflow)?;
        let id = u32::try_from(self.meshes.len()).map_err(|_| MeshError::SizeOverflow)?;
        self.meshes.push(GpuMesh {
            vertex_buffer,
            index_buffer,
            index_count,
        });
        Ok(MeshId(id))
    }

    /// Resets the frame's draw list and records the shared camera and light
    /// state the queued draws will use.
    pub fn begin_frame(&mut self, view_proj: [[f32; 4]; 4], light: LightParams) {
        self.view_proj = view_proj;
        self.light = light;
        self.sky = None;
        self.draws.clear();
    }

    /// Queues the background dome. Drawn first, behind everything.
    pub fn draw_sky(&mut self, mesh: MeshId, model: [[f32; 4]; 4]) {
        self.sky = Some(DrawCommand { mesh, model });
    }

    pub fn draw(&mut self, mesh: MeshId, model: [[f32; 4]; 4]) {
        if self.draws.len() as u64 >= MAX_DRAWS - 1 {
            eprintln!(
                "draw list full at {} commands, dropping draw",
                self.draws.len()
            );
            return;
        }
        self.draws.push(DrawCommand { mesh, model });
    }

    pub fn render(&mut self) -> Result<(), RenderError> {
        // Slot 0 belongs to the sky; scene draws start at 1.
        if let Some(sky) = &self.sky {
            let bytes = pack_draw_uniform(self.view_proj, sky.model, &self.light);
            self.queue.write_buffer(&self.draw_uniforms, 0, &bytes);
        }
        for (index, draw) in self.draws.iter().enumerate() {
            let bytes = pack_draw_uniform(self.view_proj, draw.model, &self.light);
            let offset = (index as u64 + 1) * DRAW_UNIFORM_SIZE;
            self.queue.write_buffer(&self.draw_uniforms, offset, &bytes);
        }

        let frame = self.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("castaway.render.encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("castaway.render.pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(sky) = &self.sky {
                if let Some(mesh) = self.meshes.get(sky.mesh.0 as usize) {
                    pass.set_pipeline(&self.sky_pipeline);
                    pass.set_bind_group(0, &self.draw_bind_group, &[0]);
                    pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..mesh.index_count, 0, 0..1);
                }
            }

            pass.set_pipeline(&self.scene_pipeline);
            for (index, draw) in self.draws.iter().enumerate() {
                let Some(mesh) = self.meshes.get(draw.mesh.0 as usize) else {
                    continue;
                };
                let offset = ((index as u64 + 1) * DRAW_UNIFORM_SIZE) as u32;
                pass.set_bind_group(0, &self.draw_bind_group, &[offset]);
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }
        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    fragment_entry: &str,
    depth_write: bool,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("castaway.scene.pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: "vs_main",
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: 36,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[
                    wgpu::VertexAttribute {
                        offset: 0,
                        shader_location: 0,
                        format: wgpu::VertexFormat::Float32x3,
                    },
                    wgpu::VertexAttribute {
                        offset: 12,
                        shader_location: 1,
                        format: wgpu::VertexFormat::Float32x3,
                    },
                    wgpu::VertexAttribute {
                        offset: 24,
                        shader_location: 2,
                        format: wgpu::VertexFormat::Float32x3,
                    },
                ],
            }],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: fragment_entry,
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: depth_write,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    })
}

fn create_depth_view(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("castaway.depth"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn identity_matrix() -> [[f32; 4]; 4] {
    [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

fn mat4_mul(a: [[f32; 4]; 4], b: [[f32; 4]; 4]) -> [[f32; 4]; 4] {
    let mut out = [[0.0f32; 4]; 4];
    for col in 0..4 {
        for row in 0..4 {
            out[col][row] = a[0][row] * b[col][0]
                + a[1][row] * b[col][1]
                + a[2][row] * b[col][2]
                + a[3][row] * b[col][3];
        }
    }
    out
}

fn pack_draw_uniform(
    view_proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    light: &LightParams,
) -> Vec<u8> {
    let mvp = mat4_mul(view_proj, model);
    let mut bytes = Vec::with_capacity(DRAW_UNIFORM_SIZE as usize);
    for matrix in [mvp, model] {
        for column in matrix {
            for value in column {
                bytes.extend_from_slice(&value.to_le_bytes());
            }
        }
    }
    for vec3 in [
        light.sun_position,
        light.light_color,
        light.view_position,
        light.ambient,
    ] {
        for value in vec3 {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        bytes.extend_from_slice(&0.0f32.to_le_bytes());
    }
    bytes.resize(DRAW_UNIFORM_SIZE as usize, 0);
    bytes
}

fn mesh_vertex_bytes(vertices: &[MeshVertex]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vertices.len() * 36);
    for vertex in vertices {
        for value in vertex
            .position
            .iter()
            .chain(vertex.normal.iter())
            .chain(vertex.color.iter())
        {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
    }
    bytes
}

fn mesh_index_bytes(indices: &[u32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(indices.len() * 4);
    for index in indices {
        bytes.extend_from_slice(&index.to_le_bytes());
    }
    bytes
}

const SCENE_SHADER: &str = r#"
struct DrawData {
    mvp: mat4x4<f32>,
    model: mat4x4<f32>,
    sun_position: vec4<f32>,
    light_color: vec4<f32>,
    view_position: vec4<f32>,
    ambient: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> draw: DrawData;

struct VertexOut {
    @builtin(position) position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec3<f32>,
}

@vertex
fn vs_main(
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec3<f32>,
) -> VertexOut {
    var out: VertexOut;
    out.position = draw.mvp * vec4<f32>(position, 1.0);
    out.world_position = (draw.model * vec4<f32>(position, 1.0)).xyz;
    // Assumes near-uniform scale; good enough for prop meshes.
    out.normal = normalize((draw.model * vec4<f32>(normal, 0.0)).xyz);
    out.color = color;
    return out;
}

@fragment
fn fs_lit(in: VertexOut) -> @location(0) vec4<f32> {
    let to_light = normalize(draw.sun_position.xyz - in.world_position);
    let diffuse = max(dot(normalize(in.normal), to_light), 0.0);
    let lit = in.color * (draw.ambient.rgb + draw.light_color.rgb * diffuse);
    return vec4<f32>(clamp(lit, vec3<f32>(0.0), vec3<f32>(1.0)), 1.0);
}

@fragment
fn fs_sky(in: VertexOut) -> @location(0) vec4<f32> {
    return vec4<f32>(in.color * draw.ambient.rgb, 1.0);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> (Vec<MeshVertex>, Vec<u32>) {
        let vertex = |x: f32, y: f32| MeshVertex {
            position: [x, y, 0.0],
            normal: [0.0, 0.0, 1.0],
            color: [1.0, 1.0, 1.0],
        };
        (
            vec![vertex(0.0, 0.0), vertex(1.0, 0.0), vertex(0.0, 1.0)],
            vec![0, 1, 2],
        )
    }

    #[test]
    fn mesh_data_accepts_a_valid_mesh() {
        let (vertices, indices) = triangle();
        assert!(MeshData::new(vertices, indices).is_ok());
    }

    #[test]
    fn mesh_data_rejects_out_of_range_indices() {
        let (vertices, _) = triangle();
        let result = MeshData::new(vertices, vec![0, 1, 9]);
        assert!(matches!(
            result,
            Err(MeshError::IndexOutOfBounds { index: 9, .. })
        ));
    }

    #[test]
    fn mesh_data_rejects_empty_meshes() {
        assert!(matches!(
            MeshData::new(Vec::new(), Vec::new()),
            Err(MeshError::EmptyMesh)
        ));
    }

    #[test]
    fn draw_uniform_packs_to_the_dynamic_slot_size() {
        let light = LightParams {
            sun_position: [1.0, 2.0, 3.0],
            light_color: [1.0, 1.0, 1.0],
            view_position: [0.0, 0.0, 0.0],
            ambient: [0.5, 0.5, 0.5],
        };
        let bytes = pack_draw_uniform(identity_matrix(), identity_matrix(), &light);
        assert_eq!(bytes.len(), DRAW_UNIFORM_SIZE as usize);
    }

    #[test]
    fn mat4_mul_identity_is_identity() {
        let m = [
            [1.0, 2.0, 3.0, 4.0],
            [5.0, 6.0, 7.0, 8.0],
            [9.0, 10.0, 11.0, 12.0],
            [13.0, 14.0, 15.0, 16.0],
        ];
        assert_eq!(mat4_mul(identity_matrix(), m), m);
        assert_eq!(mat4_mul(m, identity_matrix()), m);
    }

    #[test]
    fn vertex_packing_uses_a_36_byte_stride() {
        let (vertices, _) = triangle();
        let bytes = mesh_vertex_bytes(&vertices);
        assert_eq!(bytes.len(), vertices.len() * 36);
    }
}
