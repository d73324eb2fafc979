//! CPU mirror of the shader math.
//!
//! These functions compute exactly what `vertex.wgsl` and `fragment.wgsl` do
//! so the formulas can be checked without a GPU.

/// Height of one blue ramp, in pixels.
pub const BAND_HEIGHT: f32 = 50.0;

/// Blue increment per pixel inside a band.
pub const BAND_STEP: f32 = 0.02;

/// Clip-space position of strip vertex `vertex_index`.
pub fn corner_position(vertex_index: u32) -> [f32; 4] {
    [
        (vertex_index % 2) as f32,
        ((vertex_index / 2) % 2) as f32,
        0.0,
        1.0,
    ]
}

/// Output colour for a fragment of triangle `primitive_index` whose
/// window-space y, measured from the bottom edge, is `frag_y`.
pub fn fragment_color(primitive_index: u32, frag_y: f32) -> [f32; 4] {
    [0.0, primitive_index as f32, band_intensity(frag_y), 1.0]
}

/// `(frag_y mod 50) * 0.02`, with GLSL `mod` semantics (floored).
pub fn band_intensity(frag_y: f32) -> f32 {
    let band = frag_y - BAND_HEIGHT * (frag_y / BAND_HEIGHT).floor();
    band * BAND_STEP
}

/// Number of triangles a strip of `vertex_count` vertices produces.
pub fn strip_triangle_count(vertex_count: u32) -> u32 {
    vertex_count.saturating_sub(2)
}

/// Vertex indices of each triangle in a strip, in submission order.
///
/// The first index of each triple is the provoking vertex, which is what a
/// flat-interpolated output carries to the fragment stage.
pub fn strip_triangles(vertex_count: u32) -> impl Iterator<Item = [u32; 3]> {
    (0..strip_triangle_count(vertex_count)).map(|i| [i, i + 1, i + 2])
}
