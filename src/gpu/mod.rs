//! The wgpu renderer.
//!
//! Each frame goes through three stages:
//!
//! 1. **Scene pass** into an offscreen HDR target: fullscreen backdrops
//!    (cloud, ray-traced scene), then line segments, then point sprites.
//! 2. **Grading pass**: the offscreen target is color graded onto the
//!    swapchain surface.
//! 3. Present.
//!
//! Instance and vertex buffers grow on demand and are reused across frames.

mod fullscreen;
mod post_process;
pub mod shaders;

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use winit::window::Window;

use crate::camera::Camera;
use crate::effects::raytrace::RayScene;
use crate::effects::volumetric::Cloud;
use crate::error::RenderError;
use crate::renderer::Renderer;
use crate::scene::{DrawList, LineVertex, PointInstance};
use crate::visuals::ColorGrading;

pub use fullscreen::{FullscreenPipeline, PassKind};
pub use post_process::{GradingPass, SCENE_FORMAT};

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.05,
    a: 1.0,
};

/// Camera data shared by every pipeline at bind group 0.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct CameraUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub position: [f32; 3],
    pub aspect: f32,
    pub forward: [f32; 3],
    pub tan_half_fov: f32,
    pub right: [f32; 3],
    pub _pad0: f32,
    pub up: [f32; 3],
    pub _pad1: f32,
}

impl CameraUniforms {
    /// Same basis as [`Camera::ray`], so GPU and CPU rays agree.
    pub fn new(camera: &Camera, aspect: f32) -> Self {
        let position = camera.position();
        let forward = (camera.target - position).normalize();
        let right = forward.cross(Vec3::Y).normalize();
        let up = right.cross(forward);
        Self {
            view_proj: camera.view_proj(aspect).to_cols_array_2d(),
            position: position.to_array(),
            aspect,
            forward: forward.to_array(),
            tan_half_fov: (camera.fov_y * 0.5).tan(),
            right: right.to_array(),
            _pad0: 0.0,
            up: up.to_array(),
            _pad1: 0.0,
        }
    }
}

/// A vertex/instance buffer that grows to fit whatever is written.
struct DynamicBuffer {
    label: &'static str,
    usage: wgpu::BufferUsages,
    buffer: wgpu::Buffer,
    capacity: u64,
}

impl DynamicBuffer {
    const MIN_CAPACITY: u64 = 4096;

    fn new(device: &wgpu::Device, label: &'static str, usage: wgpu::BufferUsages) -> Self {
        let usage = usage | wgpu::BufferUsages::COPY_DST;
        Self {
            label,
            usage,
            buffer: create_buffer(device, label, usage, Self::MIN_CAPACITY),
            capacity: Self::MIN_CAPACITY,
        }
    }

    fn write(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, bytes: &[u8]) {
        let len = bytes.len() as u64;
        if len > self.capacity {
            self.capacity = len.next_power_of_two();
            self.buffer = create_buffer(device, self.label, self.usage, self.capacity);
            log::debug!("{} grown to {} bytes", self.label, self.capacity);
        }
        if len > 0 {
            queue.write_buffer(&self.buffer, 0, bytes);
        }
    }
}

fn create_buffer(device: &wgpu::Device, label: &str, usage: wgpu::BufferUsages, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage,
        mapped_at_creation: false,
    })
}

/// Draws [`DrawList`]s into a window with wgpu.
pub struct GpuRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,

    point_pipeline: wgpu::RenderPipeline,
    point_buffer: DynamicBuffer,
    line_pipeline: wgpu::RenderPipeline,
    line_buffer: DynamicBuffer,

    volumetric: FullscreenPipeline,
    raytrace: FullscreenPipeline,
    grading: GradingPass,
}

impl GpuRenderer {
    /// Create a renderer for `window`.
    pub async fn new(window: Arc<Window>, vsync: bool, grading: &ColorGrading) -> Result<Self, RenderError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;
        log::info!("using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        // Shaders already tone map and gamma correct, so skip sRGB encoding
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(RenderError::NoAdapter)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let camera = CameraUniforms::new(&Camera::new(), config.width as f32 / config.height as f32);
        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Buffer"),
            size: std::mem::size_of::<CameraUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(&camera_buffer, 0, bytemuck::bytes_of(&camera));

        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Camera Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let point_pipeline = create_geometry_pipeline(
            &device,
            "Point",
            shaders::POINTS,
            &camera_layout,
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<PointInstance>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &wgpu::vertex_attr_array![
                    0 => Float32x3, // position
                    1 => Float32,   // size
                    2 => Float32x4, // color
                ],
            },
            wgpu::PrimitiveTopology::TriangleList,
            false,
        );

        let line_pipeline = create_geometry_pipeline(
            &device,
            "Line",
            shaders::LINES,
            &camera_layout,
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<LineVertex>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &wgpu::vertex_attr_array![
                    0 => Float32x3, // position
                    1 => Float32x4, // color
                ],
            },
            wgpu::PrimitiveTopology::LineList,
            true,
        );

        let volumetric = FullscreenPipeline::new(
            &device,
            "Volumetric",
            shaders::VOLUMETRIC,
            bytemuck::bytes_of(&Cloud::default().uniforms()),
            &camera_layout,
            SCENE_FORMAT,
        );
        let raytrace = FullscreenPipeline::new(
            &device,
            "Ray Trace",
            shaders::RAYTRACE,
            bytemuck::bytes_of(&RayScene::default().uniforms(0.0)),
            &camera_layout,
            SCENE_FORMAT,
        );

        let grading = GradingPass::new(&device, grading, config.width, config.height, surface_format);

        let point_buffer = DynamicBuffer::new(&device, "Point Instance Buffer", wgpu::BufferUsages::VERTEX);
        let line_buffer = DynamicBuffer::new(&device, "Line Vertex Buffer", wgpu::BufferUsages::VERTEX);

        log::info!(
            "renderer ready: {}x{} {:?}",
            config.width,
            config.height,
            config.format
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            camera_buffer,
            camera_bind_group,
            point_pipeline,
            point_buffer,
            line_pipeline,
            line_buffer,
            volumetric,
            raytrace,
            grading,
        })
    }

    /// Surface size in pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Replace the final grading settings.
    pub fn set_grading(&mut self, grading: &ColorGrading) {
        self.grading.set_grading(&self.queue, grading);
    }

    fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }

    fn pipeline_for(&self, kind: PassKind) -> &FullscreenPipeline {
        match kind {
            PassKind::Volumetric => &self.volumetric,
            PassKind::RayTraced => &self.raytrace,
        }
    }
}

impl Renderer for GpuRenderer {
    fn render(&mut self, frame: &DrawList, camera: &Camera) -> Result<(), RenderError> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("surface lost, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("surface timeout, skipping frame");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let camera = CameraUniforms::new(camera, self.aspect());
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&camera));

        self.point_buffer
            .write(&self.device, &self.queue, bytemuck::cast_slice(&frame.points));
        self.line_buffer
            .write(&self.device, &self.queue, bytemuck::cast_slice(&frame.lines));

        // Only one pass of each kind can be live; the last one wins
        for pass in &frame.passes {
            self.pipeline_for(PassKind::of(pass))
                .update(&self.queue, fullscreen::uniform_bytes(pass));
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.grading.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.grading.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);

            for pass in &frame.passes {
                self.pipeline_for(PassKind::of(pass)).draw(&mut render_pass);
            }

            if !frame.lines.is_empty() {
                render_pass.set_pipeline(&self.line_pipeline);
                render_pass.set_vertex_buffer(0, self.line_buffer.buffer.slice(..));
                render_pass.draw(0..frame.lines.len() as u32, 0..1);
            }

            if !frame.points.is_empty() {
                render_pass.set_pipeline(&self.point_pipeline);
                render_pass.set_vertex_buffer(0, self.point_buffer.buffer.slice(..));
                render_pass.draw(0..6, 0..frame.points.len() as u32);
            }
        }

        self.grading.draw(&mut encoder, &view);

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.grading.resize(&self.device, width, height);
    }
}

fn create_geometry_pipeline(
    device: &wgpu::Device,
    label: &str,
    source: &str,
    camera_layout: &wgpu::BindGroupLayout,
    buffer: wgpu::VertexBufferLayout<'_>,
    topology: wgpu::PrimitiveTopology,
    depth_write: bool,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&format!("{} Shader", label)),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{} Pipeline Layout", label)),
        bind_group_layouts: &[camera_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("{} Pipeline", label)),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[buffer],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: SCENE_FORMAT,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: depth_write,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_uniform_layout() {
        assert_eq!(std::mem::size_of::<CameraUniforms>(), 128);
    }

    #[test]
    fn test_camera_uniforms_match_cpu_ray() {
        let camera = Camera::new();
        let aspect = 16.0 / 9.0;
        let u = CameraUniforms::new(&camera, aspect);

        let (origin, dir) = camera.ray(0.5, -0.25, aspect);
        let h = u.tan_half_fov;
        let gpu_dir = (Vec3::from_array(u.forward)
            + Vec3::from_array(u.right) * 0.5 * h * aspect
            + Vec3::from_array(u.up) * -0.25 * h)
            .normalize();

        assert!((Vec3::from_array(u.position) - origin).length() < 1e-5);
        assert!((gpu_dir - dir).length() < 1e-5);
    }
}
