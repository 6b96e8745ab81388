// Driver boundary - the GL entry points the wrappers are allowed to use
//
// Every wrapper in this crate talks to the GPU through this trait and never
// through `glow` directly. `GlDevice` is the real implementation; the unit
// tests use a recording implementation that keeps a log of the calls.
//
// All "bind" style methods mutate global driver state. Nothing here remembers
// what is currently bound, so callers must bind right before use.

use std::fmt;
use std::rc::Rc;

use super::error::Result;
use super::layout::ComponentType;
use super::GpuHandle;

/// Shared driver reference held by every wrapper.
///
/// `Rc` keeps wrappers on the thread that owns the GL context.
pub type SharedDriver = Rc<dyn Driver>;

/// Buffer binding points used by the harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// `GL_ARRAY_BUFFER` - vertex data
    Array,
    /// `GL_ELEMENT_ARRAY_BUFFER` - index data
    ElementArray,
}

impl BufferTarget {
    pub const fn gl_enum(self) -> u32 {
        match self {
            BufferTarget::Array => glow::ARRAY_BUFFER,
            BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
        }
    }
}

/// One half of a shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub const fn gl_enum(self) -> u32 {
        match self {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Uniform location returned when the driver does not know the name.
pub const UNKNOWN_UNIFORM: i32 = -1;

pub trait Driver {
    // ─────────────────────────────────────────────────────────────────────────
    // BUFFERS
    // ─────────────────────────────────────────────────────────────────────────
    fn create_buffer(&self) -> Result<GpuHandle>;
    /// Binding `GpuHandle::INVALID` unbinds the target.
    fn bind_buffer(&self, target: BufferTarget, buffer: GpuHandle);
    /// Uploads to the buffer currently bound at `target` (`STATIC_DRAW`).
    fn buffer_data(&self, target: BufferTarget, data: &[u8]);
    fn delete_buffer(&self, buffer: GpuHandle);

    // ─────────────────────────────────────────────────────────────────────────
    // VERTEX ARRAYS
    // ─────────────────────────────────────────────────────────────────────────
    fn create_vertex_array(&self) -> Result<GpuHandle>;
    fn bind_vertex_array(&self, vertex_array: GpuHandle);
    fn delete_vertex_array(&self, vertex_array: GpuHandle);
    fn enable_vertex_attrib_array(&self, slot: u32);
    fn vertex_attrib_pointer(
        &self,
        slot: u32,
        count: u32,
        ty: ComponentType,
        normalized: bool,
        stride: u32,
        offset: u32,
    );

    // ─────────────────────────────────────────────────────────────────────────
    // SHADERS
    // ─────────────────────────────────────────────────────────────────────────
    fn create_shader(&self, stage: ShaderStage) -> Result<GpuHandle>;
    fn shader_source(&self, shader: GpuHandle, source: &str);
    fn compile_shader(&self, shader: GpuHandle);
    fn shader_compile_status(&self, shader: GpuHandle) -> bool;
    fn shader_info_log(&self, shader: GpuHandle) -> String;
    fn delete_shader(&self, shader: GpuHandle);

    // ─────────────────────────────────────────────────────────────────────────
    // PROGRAMS
    // ─────────────────────────────────────────────────────────────────────────
    fn create_program(&self) -> Result<GpuHandle>;
    fn attach_shader(&self, program: GpuHandle, shader: GpuHandle);
    fn link_program(&self, program: GpuHandle);
    fn program_link_status(&self, program: GpuHandle) -> bool;
    fn validate_program(&self, program: GpuHandle);
    fn program_validate_status(&self, program: GpuHandle) -> bool;
    fn program_info_log(&self, program: GpuHandle) -> String;
    /// Using `GpuHandle::INVALID` deactivates any program.
    fn use_program(&self, program: GpuHandle);
    fn delete_program(&self, program: GpuHandle);

    // ─────────────────────────────────────────────────────────────────────────
    // UNIFORMS
    // ─────────────────────────────────────────────────────────────────────────
    /// Returns `UNKNOWN_UNIFORM` (-1) when the program has no such uniform.
    fn uniform_location(&self, program: GpuHandle, name: &str) -> i32;
    fn uniform_1_i32(&self, location: i32, value: i32);
    fn uniform_1_f32(&self, location: i32, value: f32);
    fn uniform_4_f32(&self, location: i32, value: [f32; 4]);
    /// Column-major 4x4 matrix.
    fn uniform_matrix_4_f32(&self, location: i32, value: &[f32; 16]);

    // ─────────────────────────────────────────────────────────────────────────
    // TEXTURES
    // ─────────────────────────────────────────────────────────────────────────
    fn create_texture(&self) -> Result<GpuHandle>;
    /// Selects texture unit `GL_TEXTURE0 + slot`.
    fn active_texture(&self, slot: u32);
    fn bind_texture_2d(&self, texture: GpuHandle);
    fn tex_parameter_2d(&self, parameter: u32, value: i32);
    /// Uploads level 0 of the bound 2D texture as `RGBA8`.
    fn tex_image_2d_rgba8(&self, width: u32, height: u32, pixels: &[u8]);
    fn delete_texture(&self, texture: GpuHandle);

    // ─────────────────────────────────────────────────────────────────────────
    // FRAME
    // ─────────────────────────────────────────────────────────────────────────
    fn clear_color(&self, rgba: [f32; 4]);
    fn clear(&self, mask: u32);
    fn viewport(&self, width: u32, height: u32);
    fn draw_elements(&self, mode: u32, count: u32, index_type: u32, offset: u32);
}
