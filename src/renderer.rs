//! A minimal wgpu renderer: every live actor as a filled circle in its
//! color, plus an optional debug overlay of each zombie's remaining path
//! as a line strip (§6 "per-frame image... disks... plus optional line
//! segments from the zombie's position along its current path").
//!
//! Grounded on the teacher's `wgpu/render.rs::State` (surface/adapter/device
//! setup, `Vertex`/instance-buffer/`CameraUniform` shapes, the
//! `create_buffer_init` + `render_pass` draw loop) — generalized from a
//! perspective 3D scene with a textured quad mesh down to an orthographic
//! top-down view over `MapData`'s pixel coordinates, one instanced circle
//! mesh, and a plain line-list pass for the path overlay. Since this domain
//! is flat and actors never rotate, the instance payload is `(translation,
//! scale, color)` rather than the teacher's per-instance `mat4x4` — there
//! is nothing here for a rotation matrix to do.

use std::iter;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use cgmath::Matrix4;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::actors::ActorState;
use geometry::Position;

const CIRCLE_SIDES: u16 = 16;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct Vertex {
    position: [f32; 2],
}

impl Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            }],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct CircleInstance {
    translation: [f32; 2],
    scale: f32,
    color: [f32; 3],
}

impl CircleInstance {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<CircleInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct LineVertex {
    position: [f32; 2],
    color: [f32; 3],
}

impl LineVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<LineVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    /// Orthographic projection mapping `[0, map_width] x [0, map_height]`
    /// world pixels onto clip space, Y flipped so map-down is screen-down.
    fn for_map(map_width: f32, map_height: f32) -> CameraUniform {
        let proj: Matrix4<f32> = cgmath::ortho(0.0, map_width, map_height, 0.0, -1.0, 1.0);
        CameraUniform {
            view_proj: proj.into(),
        }
    }
}

/// Returns a unit circle's vertices (radius 1, centered at the origin) as a
/// triangle fan, and the index buffer reproducing it as triangles.
fn unit_circle_mesh(sides: u16) -> (Vec<Vertex>, Vec<u16>) {
    let mut vertices = Vec::with_capacity(sides as usize);
    for i in 0..sides {
        let theta = 2.0 * std::f32::consts::PI * (i as f32) / (sides as f32);
        vertices.push(Vertex {
            position: [theta.cos(), theta.sin()],
        });
    }
    let mut indices = Vec::with_capacity((sides as usize - 2) * 3);
    for i in 1..(sides - 1) {
        indices.push(0u16);
        indices.push(i);
        indices.push(i + 1);
    }
    (vertices, indices)
}

/// One actor's render payload: world position, color, and disk radius.
pub struct ActorSprite {
    pub position: Position,
    pub color: cgmath::Vector3<f32>,
    pub radius: f32,
}

impl ActorSprite {
    pub fn from_state(state: &ActorState, radius: f32) -> ActorSprite {
        ActorSprite {
            position: state.position,
            color: state.color,
            radius,
        }
    }
}

/// A zombie's remaining path, rendered as a line strip from its current
/// position through every unconsumed waypoint.
pub struct PathOverlay {
    pub points: Vec<Position>,
    pub color: cgmath::Vector3<f32>,
}

pub struct Renderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    surface_configured: bool,

    circle_pipeline: wgpu::RenderPipeline,
    circle_vertex_buffer: wgpu::Buffer,
    circle_index_buffer: wgpu::Buffer,
    circle_index_count: u32,
    circle_instance_buffer: wgpu::Buffer,
    circle_instance_capacity: usize,

    line_pipeline: wgpu::RenderPipeline,
    line_vertex_buffer: wgpu::Buffer,
    line_vertex_capacity: usize,
    line_vertex_count: u32,

    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,

    window: Arc<Window>,
}

impl Renderer {
    pub async fn new(window: Arc<Window>, map_width: u32, map_height: u32) -> anyhow::Result<Renderer> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("no compatible wgpu adapter found"))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let camera_uniform = CameraUniform::for_map(map_width as f32, map_height as f32);
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("camera bind group layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera bind group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("arena shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("arena pipeline layout"),
            bind_group_layouts: &[&camera_bind_group_layout],
            push_constant_ranges: &[],
        });

        let circle_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("circle pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::desc(), CircleInstance::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let line_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("line pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_line"),
                buffers: &[LineVertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_line"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let (circle_vertices, circle_indices) = unit_circle_mesh(CIRCLE_SIDES);
        let circle_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("circle vertex buffer"),
            contents: bytemuck::cast_slice(&circle_vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let circle_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("circle index buffer"),
            contents: bytemuck::cast_slice(&circle_indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let circle_index_count = circle_indices.len() as u32;

        let circle_instance_capacity = 64;
        let circle_instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("circle instance buffer"),
            size: (circle_instance_capacity * std::mem::size_of::<CircleInstance>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let line_vertex_capacity = 512;
        let line_vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("line vertex buffer"),
            size: (line_vertex_capacity * std::mem::size_of::<LineVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(Renderer {
            surface,
            device,
            queue,
            config,
            surface_configured: false,
            circle_pipeline,
            circle_vertex_buffer,
            circle_index_buffer,
            circle_index_count,
            circle_instance_buffer,
            circle_instance_capacity,
            line_pipeline,
            line_vertex_buffer,
            line_vertex_capacity,
            line_vertex_count: 0,
            camera_buffer,
            camera_bind_group,
            window,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.surface_configured = true;
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
    }

    fn ensure_circle_capacity(&mut self, needed: usize) {
        if needed <= self.circle_instance_capacity {
            return;
        }
        self.circle_instance_capacity = needed.next_power_of_two();
        self.circle_instance_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("circle instance buffer"),
            size: (self.circle_instance_capacity * std::mem::size_of::<CircleInstance>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
    }

    fn ensure_line_capacity(&mut self, needed: usize) {
        if needed <= self.line_vertex_capacity {
            return;
        }
        self.line_vertex_capacity = needed.next_power_of_two();
        self.line_vertex_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("line vertex buffer"),
            size: (self.line_vertex_capacity * std::mem::size_of::<LineVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
    }

    /// Renders one frame: a filled disk per sprite, then a line strip per
    /// path overlay.
    pub fn render(&mut self, sprites: &[ActorSprite], overlays: &[PathOverlay]) -> Result<(), wgpu::SurfaceError> {
        if !self.surface_configured {
            return Ok(());
        }

        let circle_instances: Vec<CircleInstance> = sprites
            .iter()
            .map(|s| CircleInstance {
                translation: [s.position.x, s.position.y],
                scale: s.radius,
                color: s.color.into(),
            })
            .collect();
        self.ensure_circle_capacity(circle_instances.len().max(1));
        self.queue
            .write_buffer(&self.circle_instance_buffer, 0, bytemuck::cast_slice(&circle_instances));

        let mut line_vertices = Vec::new();
        for overlay in overlays {
            let color: [f32; 3] = overlay.color.into();
            for window in overlay.points.windows(2) {
                line_vertices.push(LineVertex { position: [window[0].x, window[0].y], color });
                line_vertices.push(LineVertex { position: [window[1].x, window[1].y], color });
            }
        }
        self.ensure_line_capacity(line_vertices.len().max(1));
        self.queue
            .write_buffer(&self.line_vertex_buffer, 0, bytemuck::cast_slice(&line_vertices));
        self.line_vertex_count = line_vertices.len() as u32;

        let output = self.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("render encoder") });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("arena render pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r: 1.0, g: 1.0, b: 1.0, a: 1.0 }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            pass.set_bind_group(0, &self.camera_bind_group, &[]);

            if !circle_instances.is_empty() {
                pass.set_pipeline(&self.circle_pipeline);
                pass.set_vertex_buffer(0, self.circle_vertex_buffer.slice(..));
                pass.set_vertex_buffer(1, self.circle_instance_buffer.slice(..));
                pass.set_index_buffer(self.circle_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                pass.draw_indexed(0..self.circle_index_count, 0, 0..circle_instances.len() as u32);
            }

            if self.line_vertex_count > 0 {
                pass.set_pipeline(&self.line_pipeline);
                pass.set_vertex_buffer(0, self.line_vertex_buffer.slice(..));
                pass.draw(0..self.line_vertex_count, 0..1);
            }
        }

        self.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_unit_circle_mesh_has_one_vertex_per_side() {
        let (vertices, indices) = unit_circle_mesh(8);
        assert_eq!(vertices.len(), 8);
        assert_eq!(indices.len(), (8 - 2) * 3);
        // Every vertex sits on the unit circle.
        for v in &vertices {
            let r = (v.position[0] * v.position[0] + v.position[1] * v.position[1]).sqrt();
            assert!((r - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_camera_uniform_maps_map_corners_into_clip_space() {
        let uniform = CameraUniform::for_map(600.0, 400.0);
        let m = Matrix4::from(uniform.view_proj);
        let top_left = m * cgmath::Vector4::new(0.0, 0.0, 0.0, 1.0);
        let bottom_right = m * cgmath::Vector4::new(600.0, 400.0, 0.0, 1.0);
        assert!((top_left.x - (-1.0)).abs() < 1e-4);
        assert!((top_left.y - 1.0).abs() < 1e-4);
        assert!((bottom_right.x - 1.0).abs() < 1e-4);
        assert!((bottom_right.y - (-1.0)).abs() < 1e-4);
    }

    #[test]
    fn test_actor_sprite_from_state_copies_position_and_color() {
        use crate::actors::PLAYER_COLOR;
        let state = ActorState::new(PLAYER_COLOR, Position::new(5.0, 6.0), 100);
        let sprite = ActorSprite::from_state(&state, 6.0);
        assert_eq!(sprite.position, Position::new(5.0, 6.0));
        assert_eq!(sprite.color, PLAYER_COLOR);
        assert_eq!(sprite.radius, 6.0);
    }
}
