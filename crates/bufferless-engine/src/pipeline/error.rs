use std::fmt;

use super::StageKind;

/// Failure while building or using the shader pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// WGSL did not parse or validate. `diagnostic` is the front-end's
    /// rendered report, source excerpt included.
    Compile { kind: StageKind, diagnostic: String },

    /// The module compiled but has no entry point for the requested stage.
    MissingEntryPoint { kind: StageKind },

    /// The two stages do not agree on their shared interface.
    Link { message: String },

    /// The program was linked for a different colour format than the
    /// target it is asked to draw into.
    FormatMismatch {
        linked: wgpu::TextureFormat,
        target: wgpu::TextureFormat,
    },

    /// The pipeline objects were already released.
    Released,
}

impl PipelineError {
    pub(crate) fn link(message: impl Into<String>) -> Self {
        Self::Link { message: message.into() }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compile { kind, diagnostic } => {
                write!(f, "{kind} stage failed to compile:\n{diagnostic}")
            }
            Self::MissingEntryPoint { kind } => {
                write!(f, "{kind} stage source has no {kind} entry point")
            }
            Self::Link { message } => write!(f, "program failed to link: {message}"),
            Self::FormatMismatch { linked, target } => {
                write!(f, "program linked for {linked:?} cannot draw into a {target:?} target")
            }
            Self::Released => f.write_str("shader pipeline used after release"),
        }
    }
}

impl std::error::Error for PipelineError {}
