use std::collections::BTreeMap;

use bytemuck::{Pod, Zeroable};

use super::{CompiledStage, PipelineError, StageKind, ValidatedStage};

/// Vertex buffer layouts of the program: none. Every vertex attribute is
/// derived from `@builtin(vertex_index)`.
pub const VERTEX_BUFFERS: &[wgpu::VertexBufferLayout<'static>] = &[];

/// Topology the program is linked for.
pub const TOPOLOGY: wgpu::PrimitiveTopology = wgpu::PrimitiveTopology::TriangleStrip;

/// Fragment-stage uniform: framebuffer size in physical pixels.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct FramebufferUniform {
    pub size: [f32; 2],
    pub _pad: [f32; 2], // 16-byte alignment
}

impl FramebufferUniform {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: [width.max(1) as f32, height.max(1) as f32],
            _pad: [0.0; 2],
        }
    }
}

/// The linked program: both stages joined into one render pipeline.
#[derive(Debug)]
pub struct ShaderProgram {
    pub pipeline: wgpu::RenderPipeline,
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub target_format: wgpu::TextureFormat,
}

/// `@location` slots an entry point consumes (fragment) or produces (vertex),
/// with the type at each slot.
fn location_slots(
    stage: &ValidatedStage,
) -> Result<BTreeMap<u32, naga::TypeInner>, PipelineError> {
    let module = &stage.module;
    let entry = stage
        .entry()
        .ok_or(PipelineError::MissingEntryPoint { kind: stage.kind })?;

    let mut slots = BTreeMap::new();
    let mut collect = |ty: naga::Handle<naga::Type>, binding: Option<&naga::Binding>| {
        match binding {
            Some(naga::Binding::Location { location, .. }) => {
                slots.insert(*location, module.types[ty].inner.clone());
            }
            Some(naga::Binding::BuiltIn(_)) => {}
            None => {
                if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                    for member in members {
                        if let Some(naga::Binding::Location { location, .. }) = &member.binding {
                            slots.insert(*location, module.types[member.ty].inner.clone());
                        }
                    }
                }
            }
        }
    };

    match stage.kind {
        StageKind::Vertex => {
            if let Some(result) = &entry.function.result {
                collect(result.ty, result.binding.as_ref());
            }
        }
        StageKind::Fragment => {
            for arg in &entry.function.arguments {
                collect(arg.ty, arg.binding.as_ref());
            }
        }
    }

    Ok(slots)
}

/// Checks that the stages fit together: right kinds, and every location the
/// fragment stage reads is written by the vertex stage with the same type.
///
/// Extra vertex outputs are allowed.
pub fn check_interface(
    vertex: &ValidatedStage,
    fragment: &ValidatedStage,
) -> Result<(), PipelineError> {
    if vertex.kind != StageKind::Vertex {
        return Err(PipelineError::link(format!(
            "expected a vertex stage, got a {} stage",
            vertex.kind
        )));
    }
    if fragment.kind != StageKind::Fragment {
        return Err(PipelineError::link(format!(
            "expected a fragment stage, got a {} stage",
            fragment.kind
        )));
    }

    let outputs = location_slots(vertex)?;
    let inputs = location_slots(fragment)?;

    for (location, ty) in &inputs {
        match outputs.get(location) {
            None => {
                return Err(PipelineError::link(format!(
                    "fragment input @location({location}) is not written by the vertex stage"
                )));
            }
            Some(out) if out != ty => {
                return Err(PipelineError::link(format!(
                    "@location({location}) type mismatch: vertex writes {out:?}, fragment reads {ty:?}"
                )));
            }
            Some(_) => {}
        }
    }

    Ok(())
}

/// Links two compiled stages into a render pipeline targeting `format`.
pub fn link_program(
    device: &wgpu::Device,
    vertex: &CompiledStage,
    fragment: &CompiledStage,
    format: wgpu::TextureFormat,
) -> Result<ShaderProgram, PipelineError> {
    check_interface(&vertex.stage, &fragment.stage)?;

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("bufferless bgl"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(
                    std::mem::size_of::<FramebufferUniform>() as u64,
                ),
            },
            count: None,
        }],
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("bufferless pipeline layout"),
        bind_group_layouts: &[&bind_group_layout],
        immediate_size: 0,
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("bufferless pipeline"),
        layout: Some(&pipeline_layout),

        vertex: wgpu::VertexState {
            module: &vertex.shader,
            entry_point: Some(vertex.entry_point()),
            compilation_options: Default::default(),
            buffers: VERTEX_BUFFERS,
        },

        fragment: Some(wgpu::FragmentState {
            module: &fragment.shader,
            entry_point: Some(fragment.entry_point()),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),

        primitive: wgpu::PrimitiveState {
            topology: TOPOLOGY,
            strip_index_format: None,
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
    });

    log::debug!("linked program for {format:?}");
    Ok(ShaderProgram {
        pipeline,
        bind_group_layout,
        target_format: format,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{validate_stage, FRAGMENT_SOURCE, VERTEX_SOURCE};

    fn builtin() -> (ValidatedStage, ValidatedStage) {
        (
            validate_stage(StageKind::Vertex, VERTEX_SOURCE).unwrap(),
            validate_stage(StageKind::Fragment, FRAGMENT_SOURCE).unwrap(),
        )
    }

    #[test]
    fn builtin_stages_link() {
        let (vs, fs) = builtin();
        check_interface(&vs, &fs).unwrap();
    }

    #[test]
    fn program_binds_no_vertex_buffers() {
        assert!(VERTEX_BUFFERS.is_empty());
        assert_eq!(TOPOLOGY, wgpu::PrimitiveTopology::TriangleStrip);
    }

    #[test]
    fn swapped_stages_fail_to_link() {
        let (vs, fs) = builtin();
        let err = check_interface(&fs, &vs).unwrap_err();
        assert!(matches!(err, PipelineError::Link { .. }));
    }

    #[test]
    fn unwritten_fragment_input_fails_to_link() {
        let (vs, _) = builtin();
        let fs = validate_stage(
            StageKind::Fragment,
            r#"
                @fragment
                fn fs_main(@location(3) @interpolate(flat) id: u32) -> @location(0) vec4<f32> {
                    return vec4<f32>(f32(id));
                }
            "#,
        )
        .unwrap();

        let err = check_interface(&vs, &fs).unwrap_err();
        assert!(err.to_string().contains("@location(3)"), "{err}");
    }

    #[test]
    fn mismatched_location_type_fails_to_link() {
        let (vs, _) = builtin();
        let fs = validate_stage(
            StageKind::Fragment,
            r#"
                @fragment
                fn fs_main(@location(0) tint: vec2<f32>) -> @location(0) vec4<f32> {
                    return vec4<f32>(tint, 0.0, 1.0);
                }
            "#,
        )
        .unwrap();

        let err = check_interface(&vs, &fs).unwrap_err();
        assert!(err.to_string().contains("type mismatch"), "{err}");
    }

    #[test]
    fn fragment_with_no_inputs_links() {
        let (vs, _) = builtin();
        let fs = validate_stage(
            StageKind::Fragment,
            "@fragment fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }",
        )
        .unwrap();
        check_interface(&vs, &fs).unwrap();
    }

    #[test]
    fn uniform_is_sixteen_bytes() {
        assert_eq!(std::mem::size_of::<FramebufferUniform>(), 16);
        assert_eq!(FramebufferUniform::new(800, 600).size, [800.0, 600.0]);
        assert_eq!(FramebufferUniform::new(0, 0).size, [1.0, 1.0]);
    }
}
