use std::fmt;

use super::PipelineError;

/// Which pipeline point a stage runs at.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum StageKind {
    Vertex,
    Fragment,
}

impl StageKind {
    pub(crate) fn naga_stage(self) -> naga::ShaderStage {
        match self {
            Self::Vertex => naga::ShaderStage::Vertex,
            Self::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        })
    }
}

/// WGSL that passed the front-end: parsed, validated, entry point located.
///
/// Holding one of these means the stage compiled; there is no "failed"
/// variant to check later.
#[derive(Debug, Clone)]
pub struct ValidatedStage {
    pub kind: StageKind,
    /// The WGSL text; this is what the backend module is built from.
    pub source: String,
    pub entry_point: String,
    pub module: naga::Module,
}

impl ValidatedStage {
    /// Entry point this stage will run.
    pub(crate) fn entry(&self) -> Option<&naga::EntryPoint> {
        self.module
            .entry_points
            .iter()
            .find(|ep| ep.name == self.entry_point)
    }
}

/// A validated stage plus the backend shader module built from it.
#[derive(Debug)]
pub struct CompiledStage {
    pub stage: ValidatedStage,
    pub shader: wgpu::ShaderModule,
}

impl CompiledStage {
    pub fn kind(&self) -> StageKind {
        self.stage.kind
    }

    pub fn entry_point(&self) -> &str {
        &self.stage.entry_point
    }
}

/// Parses and validates `source` as a `kind` stage.
///
/// Errors carry the front-end diagnostic with the offending source excerpt,
/// ready to print.
pub fn validate_stage(kind: StageKind, source: &str) -> Result<ValidatedStage, PipelineError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|err| PipelineError::Compile {
        kind,
        diagnostic: err.emit_to_string(source),
    })?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    );
    validator
        .validate(&module)
        .map_err(|err| PipelineError::Compile {
            kind,
            diagnostic: err.emit_to_string(source),
        })?;

    let entry_point = module
        .entry_points
        .iter()
        .find(|ep| ep.stage == kind.naga_stage())
        .map(|ep| ep.name.clone())
        .ok_or(PipelineError::MissingEntryPoint { kind })?;

    Ok(ValidatedStage {
        kind,
        source: source.to_string(),
        entry_point,
        module,
    })
}

/// Compiles one stage: validates the WGSL, then creates the backend module.
///
/// Validation happens up front so a bad shader becomes a `PipelineError`
/// instead of a device error raised somewhere inside wgpu.
pub fn compile_stage(
    device: &wgpu::Device,
    kind: StageKind,
    source: &str,
) -> Result<CompiledStage, PipelineError> {
    let stage = validate_stage(kind, source)?;

    let label = format!("bufferless {kind} stage");
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&label),
        source: wgpu::ShaderSource::Wgsl(stage.source.as_str().into()),
    });

    log::debug!("compiled {kind} stage (entry point `{}`)", stage.entry_point);
    Ok(CompiledStage { stage, shader })
}
