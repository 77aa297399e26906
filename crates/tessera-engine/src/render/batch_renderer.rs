use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, Result};

use crate::batch::{PassId, RenderMode, Segment, SegmentBuffer, ShaderId, TextureId};
use crate::render::RenderCtx;
use crate::vertex::{VertexRecord, RECORD_SIZE};

impl RenderMode {
    /// wgpu topology for this mode.
    ///
    /// wgpu has no line-loop primitive; `LineLoop` draws as a line strip and
    /// the submitter appends the wrap index to close the loop.
    pub fn topology(self) -> wgpu::PrimitiveTopology {
        match self {
            RenderMode::Points => wgpu::PrimitiveTopology::PointList,
            RenderMode::Lines => wgpu::PrimitiveTopology::LineList,
            RenderMode::LineLoop => wgpu::PrimitiveTopology::LineStrip,
            RenderMode::Triangles => wgpu::PrimitiveTopology::TriangleList,
        }
    }
}

/// Issues draw calls for uploaded segment buffers.
///
/// The vertex and index buffers are replaced wholesale on every
/// [`upload`](Self::upload) (capacity grows, contents never patched
/// incrementally). Pipelines and texture bind groups are registered against
/// the opaque handles carried by segments; a segment whose handle has no
/// registration is skipped with a one-time warning. Drawing a pass with no
/// segments is a no-op.
///
/// Registered pipelines must follow the stock bind layout: viewport uniform
/// at group 0, texture + sampler at group 1 (see `shaders/batch.wgsl`).
#[derive(Default)]
pub struct BatchRenderer {
    vbo: Option<wgpu::Buffer>,
    vbo_capacity: u64,
    ibo: Option<wgpu::Buffer>,
    ibo_capacity: u64,

    passes: BTreeMap<PassId, Vec<Segment>>,

    pipelines: HashMap<(ShaderId, RenderMode), wgpu::RenderPipeline>,
    textures: HashMap<TextureId, wgpu::BindGroup>,

    viewport_bgl: Option<wgpu::BindGroupLayout>,
    texture_bgl: Option<wgpu::BindGroupLayout>,
    viewport_ubo: Option<wgpu::Buffer>,
    viewport_bind_group: Option<wgpu::BindGroup>,
    default_texture: Option<wgpu::BindGroup>,
    sampler: Option<wgpu::Sampler>,

    warned_missing_pipeline: bool,
    warned_missing_texture: bool,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct ViewportUniform {
    size: [f32; 2],
    _pad: [f32; 2], // 16-byte alignment
}

impl BatchRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads a segment buffer, replacing previous contents.
    pub fn upload(&mut self, ctx: &RenderCtx<'_>, buffer: &SegmentBuffer) -> Result<()> {
        anyhow::ensure!(
            buffer.vertex_data().len() % RECORD_SIZE == 0,
            "vertex data is not a whole number of records"
        );

        self.ensure_bindings(ctx);
        self.write_viewport_uniform(ctx);

        self.passes = buffer
            .passes()
            .map(|pass| (pass, buffer.segments(pass).to_vec()))
            .collect();

        if buffer.vertex_count() > 0 {
            self.ensure_vbo_capacity(ctx, buffer.vertex_data().len() as u64);
            let vbo = self
                .vbo
                .as_ref()
                .context("vertex buffer missing after capacity check")?;
            ctx.queue.write_buffer(vbo, 0, buffer.vertex_data());
        }

        if buffer.index_count() > 0 {
            // write_buffer needs a 4-byte-aligned size; an odd index count is
            // padded with one trailing index that no segment references.
            let mut indices = buffer.indices();
            let padded: Vec<u16>;
            if indices.len() % 2 != 0 {
                let mut v = indices.to_vec();
                v.push(0);
                padded = v;
                indices = &padded;
            }
            let bytes: &[u8] = bytemuck::cast_slice(indices);
            self.ensure_ibo_capacity(ctx, bytes.len() as u64);
            let ibo = self
                .ibo
                .as_ref()
                .context("index buffer missing after capacity check")?;
            ctx.queue.write_buffer(ibo, 0, bytes);
        }

        Ok(())
    }

    /// Draws every segment of `pass`, in upload order.
    ///
    /// Segment order is authoritative: it was produced state-minimizing (or
    /// depth-ordered) by the aggregator and is never reordered here.
    pub fn draw_pass(&mut self, rpass: &mut wgpu::RenderPass<'_>, pass: PassId) {
        let Some(segments) = self.passes.get(&pass) else { return };
        let (Some(vbo), Some(ibo)) = (self.vbo.as_ref(), self.ibo.as_ref()) else {
            return;
        };
        let Some(viewport_bg) = self.viewport_bind_group.as_ref() else { return };

        rpass.set_vertex_buffer(0, vbo.slice(..));
        rpass.set_index_buffer(ibo.slice(..), wgpu::IndexFormat::Uint16);
        rpass.set_bind_group(0, viewport_bg, &[]);

        let mut warned_pipeline = self.warned_missing_pipeline;
        let mut warned_texture = self.warned_missing_texture;

        for seg in segments {
            let Some(pipeline) = self.pipelines.get(&(seg.shader, seg.mode)) else {
                if !warned_pipeline {
                    log::warn!(
                        "no pipeline registered for shader {:?} mode {:?}; segment skipped",
                        seg.shader,
                        seg.mode
                    );
                    warned_pipeline = true;
                }
                continue;
            };

            let texture_bg = match seg.texture {
                Some(id) => match self.textures.get(&id) {
                    Some(bg) => bg,
                    None => {
                        if !warned_texture {
                            log::warn!("no texture registered for {:?}; segment skipped", id);
                            warned_texture = true;
                        }
                        continue;
                    }
                },
                None => match self.default_texture.as_ref() {
                    Some(bg) => bg,
                    None => continue,
                },
            };

            rpass.set_pipeline(pipeline);
            rpass.set_bind_group(1, texture_bg, &[]);
            rpass.draw_indexed(
                seg.index_offset..seg.index_offset + seg.index_count,
                0,
                0..1,
            );
        }

        self.warned_missing_pipeline = warned_pipeline;
        self.warned_missing_texture = warned_texture;
    }

    /// Maps an opaque shader handle (for one render mode) to a pipeline.
    pub fn register_pipeline(
        &mut self,
        shader: ShaderId,
        mode: RenderMode,
        pipeline: wgpu::RenderPipeline,
    ) {
        self.pipelines.insert((shader, mode), pipeline);
    }

    /// Builds and registers the stock pipeline for `(shader, mode)`.
    pub fn register_stock_pipeline(
        &mut self,
        ctx: &RenderCtx<'_>,
        shader: ShaderId,
        mode: RenderMode,
    ) {
        let pipeline = self.create_stock_pipeline(ctx, mode);
        self.register_pipeline(shader, mode, pipeline);
    }

    /// Maps an opaque texture handle to a view, sampled with the shared
    /// sampler.
    pub fn register_texture(
        &mut self,
        ctx: &RenderCtx<'_>,
        id: TextureId,
        view: &wgpu::TextureView,
    ) {
        self.ensure_bindings(ctx);
        let Some(bgl) = self.texture_bgl.as_ref() else { return };
        let Some(sampler) = self.sampler.as_ref() else { return };

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tessera texture bind group"),
            layout: bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });
        self.textures.insert(id, bind_group);
    }

    /// Builds the stock pipeline for the vertex-record layout.
    pub fn create_stock_pipeline(
        &mut self,
        ctx: &RenderCtx<'_>,
        mode: RenderMode,
    ) -> wgpu::RenderPipeline {
        self.ensure_bindings(ctx);

        let shader_src = include_str!("shaders/batch.wgsl");
        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("tessera batch shader"),
            source: wgpu::ShaderSource::Wgsl(shader_src.into()),
        });

        let layouts: Vec<&wgpu::BindGroupLayout> = self
            .viewport_bgl
            .iter()
            .chain(self.texture_bgl.iter())
            .collect();
        let pipeline_layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("tessera batch pipeline layout"),
                bind_group_layouts: &layouts,
                immediate_size: 0,
            });

        let topology = mode.topology();
        let strip_index_format = match topology {
            wgpu::PrimitiveTopology::LineStrip | wgpu::PrimitiveTopology::TriangleStrip => {
                Some(wgpu::IndexFormat::Uint16)
            }
            _ => None,
        };

        ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("tessera batch pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[VertexRecord::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: Some(alpha_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology,
                strip_index_format,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),

            multiview_mask: None,
            cache: None,
        })
    }

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>) {
        if self.viewport_bind_group.is_some() && self.default_texture.is_some() {
            return;
        }

        let viewport_bgl = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("tessera viewport bgl"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: Some(viewport_ubo_min_binding_size()),
                    },
                    count: None,
                }],
            });

        let texture_bgl = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("tessera texture bgl"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let viewport_ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tessera viewport ubo"),
            size: std::mem::size_of::<ViewportUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let viewport_bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tessera viewport bind group"),
            layout: &viewport_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: viewport_ubo.as_entire_binding(),
            }],
        });

        let sampler = ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("tessera batch sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        // 1x1 white texture backing untextured segments, so the stock
        // bind layout holds for every draw.
        let white = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("tessera white texture"),
            size: wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        ctx.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &white,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &[255u8; 4],
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4),
                rows_per_image: None,
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        let white_view = white.create_view(&wgpu::TextureViewDescriptor::default());
        let default_texture = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tessera default texture bind group"),
            layout: &texture_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&white_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        self.viewport_bgl = Some(viewport_bgl);
        self.texture_bgl = Some(texture_bgl);
        self.viewport_ubo = Some(viewport_ubo);
        self.viewport_bind_group = Some(viewport_bind_group);
        self.sampler = Some(sampler);
        self.default_texture = Some(default_texture);
    }

    fn write_viewport_uniform(&mut self, ctx: &RenderCtx<'_>) {
        let Some(ubo) = self.viewport_ubo.as_ref() else { return };
        let u = ViewportUniform {
            size: [ctx.viewport.x.max(1.0), ctx.viewport.y.max(1.0)],
            _pad: [0.0; 2],
        };
        ctx.queue.write_buffer(ubo, 0, bytemuck::bytes_of(&u));
    }

    fn ensure_vbo_capacity(&mut self, ctx: &RenderCtx<'_>, required: u64) {
        if required <= self.vbo_capacity && self.vbo.is_some() {
            return;
        }
        let new_cap = required.next_power_of_two().max(64 * RECORD_SIZE as u64);
        self.vbo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tessera batch vbo"),
            size: new_cap,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.vbo_capacity = new_cap;
    }

    fn ensure_ibo_capacity(&mut self, ctx: &RenderCtx<'_>, required: u64) {
        if required <= self.ibo_capacity && self.ibo.is_some() {
            return;
        }
        let new_cap = required.next_power_of_two().max(256);
        self.ibo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tessera batch ibo"),
            size: new_cap,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.ibo_capacity = new_cap;
    }
}

fn alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

/// Minimum binding size for the viewport uniform buffer.
///
/// `ViewportUniform` is 16 bytes so the size is always non-zero;
/// centralising this avoids `.unwrap()` at the pipeline-creation site.
fn viewport_ubo_min_binding_size() -> std::num::NonZeroU64 {
    std::num::NonZeroU64::new(std::mem::size_of::<ViewportUniform>() as u64)
        .expect("ViewportUniform has non-zero size by construction")
}
