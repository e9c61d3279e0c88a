//! Fullscreen shading passes.
//!
//! Each pass is a fullscreen triangle whose fragment shader reconstructs the
//! camera ray per pixel and shades it: ray marching for the cloud, ray
//! tracing for the sphere scene. The pass owns a uniform buffer that the
//! effect's per-frame uniforms are copied into.

use wgpu::util::DeviceExt;

use crate::scene::FullscreenPass;

/// Which shader a [`FullscreenPipeline`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    Volumetric,
    RayTraced,
}

impl PassKind {
    pub fn of(pass: &FullscreenPass) -> Self {
        match pass {
            FullscreenPass::Volumetric(_) => PassKind::Volumetric,
            FullscreenPass::RayTraced(_) => PassKind::RayTraced,
        }
    }
}

/// Raw uniform bytes of a pass.
pub fn uniform_bytes(pass: &FullscreenPass) -> &[u8] {
    match pass {
        FullscreenPass::Volumetric(u) => bytemuck::bytes_of(u),
        FullscreenPass::RayTraced(u) => bytemuck::bytes_of(u),
    }
}

/// GPU state for one fullscreen pass.
pub struct FullscreenPipeline {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    params_buffer: wgpu::Buffer,
}

impl FullscreenPipeline {
    /// Build a pass. `camera_layout` is bind group 0; the pass uniforms are
    /// bind group 1 and start out as `initial`.
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        source: &str,
        initial: &[u8],
        camera_layout: &wgpu::BindGroupLayout,
        target_format: wgpu::TextureFormat,
    ) -> Self {
        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Params Buffer", label)),
            contents: initial,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{} Bind Group Layout", label)),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} Bind Group", label)),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: params_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{} Shader", label)),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{} Pipeline Layout", label)),
            bind_group_layouts: &[camera_layout, &bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("{} Pipeline", label)),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            // Backdrop: drawn before geometry, never tested against depth
            depth_stencil: Some(wgpu::DepthStencilState {
                format: super::DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            bind_group,
            params_buffer,
        }
    }

    /// Copy this frame's uniforms.
    pub fn update(&self, queue: &wgpu::Queue, bytes: &[u8]) {
        queue.write_buffer(&self.params_buffer, 0, bytes);
    }

    /// Record the draw. Expects the camera bind group at slot 0.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(1, &self.bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::raytrace::RayScene;
    use crate::effects::volumetric::Cloud;

    #[test]
    fn test_uniform_bytes_match_layouts() {
        let v = FullscreenPass::Volumetric(Cloud::default().uniforms());
        let r = FullscreenPass::RayTraced(RayScene::default().uniforms(0.0));
        assert_eq!(uniform_bytes(&v).len(), 80);
        assert_eq!(uniform_bytes(&r).len(), 224);
        assert_eq!(PassKind::of(&v), PassKind::Volumetric);
        assert_eq!(PassKind::of(&r), PassKind::RayTraced);
    }
}
