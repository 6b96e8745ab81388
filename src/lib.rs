// =============================================================================
// GL HARNESS - Minimal OpenGL rendering wrappers
// =============================================================================
//
// RAII wrappers over the OpenGL objects a first renderer needs:
//
// ┌─────────────────────────────────────────────────────────────────┐
// │  FrameRenderer (clear, draw)                                    │
// │    ├── ShaderProgram (parse, compile, link, uniform cache)      │
// │    ├── GeometryBuffers                                          │
// │    │     ├── VertexArray + VertexLayout (attribute slots)       │
// │    │     ├── VertexBuffer                                       │
// │    │     └── IndexBuffer                                        │
// │    └── Texture2D                                                │
// │          └── Driver trait ── GlDevice (glow)                    │
// └─────────────────────────────────────────────────────────────────┘
//
// Every wrapper owns exactly one GL object and deletes it on drop. Wrappers
// hold an `Rc` to the driver, so they stay on the context's thread.
//
// =============================================================================

pub mod backend;
pub mod config;
pub mod watcher;

pub use backend::{
    ComponentType, Driver, FrameRenderer, GeometryBuffers, GlDevice, GpuHandle, RenderError,
    ShaderProgram, ShaderSource, SharedDriver, Texture2D, VertexLayout,
};
