// Backend module - OpenGL abstraction layer
//
// Design: one wrapper per GL object, created with its final data and
// released on drop. All GL access goes through the `Driver` trait.

pub mod buffer;
pub mod device;
pub mod driver;
pub mod error;
pub mod geometry;
pub mod handle;
pub mod layout;
pub mod renderer;
pub mod shader;
pub mod texture;
pub mod vertex_array;

#[cfg(test)]
pub(crate) mod recording;

pub use buffer::{IndexBuffer, VertexBuffer};
pub use device::GlDevice;
pub use driver::{BufferTarget, Driver, ShaderStage, SharedDriver};
pub use error::RenderError;
pub use geometry::GeometryBuffers;
pub use handle::GpuHandle;
pub use layout::{ComponentType, LayoutElement, VertexLayout};
pub use renderer::FrameRenderer;
pub use shader::{ShaderProgram, ShaderSource};
pub use texture::Texture2D;
pub use vertex_array::VertexArray;
