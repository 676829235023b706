use crate::render::device::ObjectBlock;
use crate::render::renderer2d::Renderer2DVertex;
use crate::render::renderer3d::MeshVertex;
use crate::render::uniforms::scene_block_layout;

use super::TEXTURE_SLOTS;

const COMMON_WGSL: &str = include_str!("shaders/common.wgsl");
const QUAD_WGSL: &str = include_str!("shaders/quad2d.wgsl");
const MESH_WGSL: &str = include_str!("shaders/mesh3d.wgsl");

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Layouts and pipelines for one surface format.
pub(super) struct Pipelines {
    pub format: wgpu::TextureFormat,
    pub scene_bgl: wgpu::BindGroupLayout,
    pub textures_bgl: wgpu::BindGroupLayout,
    pub object_bgl: wgpu::BindGroupLayout,
    pub quads: wgpu::RenderPipeline,
    pub meshes: wgpu::RenderPipeline,
}

impl Pipelines {
    pub(super) fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let scene_bgl = dynamic_uniform_bgl(
            device,
            "lumen scene bgl",
            scene_block_layout().stride() as u64,
        );
        let object_bgl = dynamic_uniform_bgl(
            device,
            "lumen object bgl",
            std::mem::size_of::<ObjectBlock>() as u64,
        );
        let textures_bgl = textures_bgl(device);

        let quad_attrs = Renderer2DVertex::buffer_layout();
        let quad_attr_list = quad_attrs.wgpu_attributes(0);
        let quad_buffers = [wgpu::VertexBufferLayout {
            array_stride: quad_attrs.stride() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &quad_attr_list,
        }];

        let mesh_attrs = MeshVertex::buffer_layout();
        let mesh_attr_list = mesh_attrs.wgpu_attributes(0);
        let mesh_buffers = [wgpu::VertexBufferLayout {
            array_stride: mesh_attrs.stride() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &mesh_attr_list,
        }];

        let quads = create_pipeline(
            device,
            PipelineDesc {
                label: "lumen quad2d",
                source: format!("{COMMON_WGSL}\n{QUAD_WGSL}"),
                bind_group_layouts: &[&scene_bgl, &textures_bgl],
                buffers: &quad_buffers,
                format,
                blend: wgpu::BlendState::ALPHA_BLENDING,
                cull_mode: None,
                depth: wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: false,
                    depth_compare: wgpu::CompareFunction::Always,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                },
            },
        );

        let meshes = create_pipeline(
            device,
            PipelineDesc {
                label: "lumen mesh3d",
                source: format!("{COMMON_WGSL}\n{MESH_WGSL}"),
                bind_group_layouts: &[&scene_bgl, &textures_bgl, &object_bgl],
                buffers: &mesh_buffers,
                format,
                blend: wgpu::BlendState::ALPHA_BLENDING,
                cull_mode: Some(wgpu::Face::Back),
                depth: wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                },
            },
        );

        log::debug!("lumen pipelines created for {format:?}");
        Self { format, scene_bgl, textures_bgl, object_bgl, quads, meshes }
    }
}

struct PipelineDesc<'a> {
    label: &'static str,
    source: String,
    bind_group_layouts: &'a [&'a wgpu::BindGroupLayout],
    buffers: &'a [wgpu::VertexBufferLayout<'a>],
    format: wgpu::TextureFormat,
    blend: wgpu::BlendState,
    cull_mode: Option<wgpu::Face>,
    depth: wgpu::DepthStencilState,
}

fn create_pipeline(device: &wgpu::Device, desc: PipelineDesc<'_>) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(desc.label),
        source: wgpu::ShaderSource::Wgsl(desc.source.into()),
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(desc.label),
        bind_group_layouts: desc.bind_group_layouts,
        immediate_size: 0,
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(desc.label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: desc.buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: desc.format,
                blend: Some(desc.blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: desc.cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(desc.depth),
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

fn dynamic_uniform_bgl(device: &wgpu::Device, label: &str, size: u64) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: wgpu::BufferSize::new(size),
            },
            count: None,
        }],
    })
}

fn textures_bgl(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let mut entries: Vec<wgpu::BindGroupLayoutEntry> = (0..TEXTURE_SLOTS)
        .map(|slot| wgpu::BindGroupLayoutEntry {
            binding: slot,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        })
        .collect();
    entries.push(wgpu::BindGroupLayoutEntry {
        binding: TEXTURE_SLOTS,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    });

    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("lumen texture slots bgl"),
        entries: &entries,
    })
}
