//! Frame rendering.
//!
//! Convention:
//! - the frame is cleared first (see [`RenderTarget::clear`])
//! - renderers then load the attachment and draw on top

mod bufferless;
mod ctx;

pub use bufferless::{BufferlessRenderer, DrawCall, CLEAR_GREY};
pub use ctx::{RenderCtx, RenderTarget};
