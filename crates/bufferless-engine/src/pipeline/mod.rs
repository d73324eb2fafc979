//! Buffer-free shader pipeline.
//!
//! Two WGSL stages are compiled, checked against each other and linked into
//! one render pipeline that draws with no vertex or index buffer: positions
//! come from `@builtin(vertex_index)` and colours from the primitive counter
//! and fragment position.
//!
//! Stages:
//! - [`validate_stage`] parses + validates WGSL (no device needed)
//! - [`compile_stage`] additionally creates the backend shader module
//! - [`link_program`] checks the stage interface and builds the pipeline
//! - [`ShaderPipeline`] owns all three objects until [`ShaderPipeline::release`]

mod error;
mod program;
pub mod reference;
mod shader_pipeline;
mod stage;

pub use error::PipelineError;
pub use program::{check_interface, link_program, FramebufferUniform, ShaderProgram, TOPOLOGY, VERTEX_BUFFERS};
pub use shader_pipeline::ShaderPipeline;
pub use stage::{compile_stage, validate_stage, CompiledStage, StageKind, ValidatedStage};

/// Built-in vertex stage: corner positions from the vertex index.
pub const VERTEX_SOURCE: &str = include_str!("shaders/vertex.wgsl");

/// Built-in fragment stage: green from the primitive, blue bands from y.
pub const FRAGMENT_SOURCE: &str = include_str!("shaders/fragment.wgsl");
