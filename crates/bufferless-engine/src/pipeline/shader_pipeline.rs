use super::{
    compile_stage, link_program, CompiledStage, PipelineError, ShaderProgram, StageKind,
    FRAGMENT_SOURCE, VERTEX_SOURCE,
};

enum PipelineState {
    Linked {
        vertex: CompiledStage,
        fragment: CompiledStage,
        program: ShaderProgram,
    },
    Released,
}

/// Owner of the vertex stage, fragment stage and linked program.
///
/// Created linked and current. [`release`](Self::release) frees all three;
/// after that every accessor returns [`PipelineError::Released`]. Dropping the
/// pipeline releases it too, so there is one teardown path no matter how the
/// owner exits.
pub struct ShaderPipeline {
    state: PipelineState,
    current: bool,
}

impl ShaderPipeline {
    /// Compiles and links the built-in stages for `format`.
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Result<Self, PipelineError> {
        Self::from_sources(device, VERTEX_SOURCE, FRAGMENT_SOURCE, format)
    }

    pub fn from_sources(
        device: &wgpu::Device,
        vertex_source: &str,
        fragment_source: &str,
        format: wgpu::TextureFormat,
    ) -> Result<Self, PipelineError> {
        let vertex = compile_stage(device, StageKind::Vertex, vertex_source)?;
        let fragment = compile_stage(device, StageKind::Fragment, fragment_source)?;
        let program = link_program(device, &vertex, &fragment, format)?;

        log::info!("shader pipeline ready ({format:?})");
        Ok(Self {
            state: PipelineState::Linked {
                vertex,
                fragment,
                program,
            },
            current: true,
        })
    }

    pub fn is_released(&self) -> bool {
        matches!(self.state, PipelineState::Released)
    }

    /// Whether this program is the one subsequent draws use.
    pub fn is_current(&self) -> bool {
        self.current
    }

    pub fn program(&self) -> Result<&ShaderProgram, PipelineError> {
        match &self.state {
            PipelineState::Linked { program, .. } => Ok(program),
            PipelineState::Released => Err(PipelineError::Released),
        }
    }

    pub fn stage(&self, kind: StageKind) -> Result<&CompiledStage, PipelineError> {
        match (&self.state, kind) {
            (PipelineState::Linked { vertex, .. }, StageKind::Vertex) => Ok(vertex),
            (PipelineState::Linked { fragment, .. }, StageKind::Fragment) => Ok(fragment),
            (PipelineState::Released, _) => Err(PipelineError::Released),
        }
    }

    /// Makes the program current on `pass`.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) -> Result<(), PipelineError> {
        let program = self.program()?;
        pass.set_pipeline(&program.pipeline);
        Ok(())
    }

    /// Frees the program and both stages.
    ///
    /// Returns `true` if anything was freed; a second call is a no-op.
    pub fn release(&mut self) -> bool {
        match std::mem::replace(&mut self.state, PipelineState::Released) {
            PipelineState::Linked {
                vertex,
                fragment,
                program,
            } => {
                self.current = false;
                drop(program);
                drop(vertex);
                drop(fragment);
                log::info!("shader pipeline released");
                true
            }
            PipelineState::Released => false,
        }
    }
}

impl Drop for ShaderPipeline {
    fn drop(&mut self) {
        self.release();
    }
}
