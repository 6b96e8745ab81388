// OpenGL device - the production `Driver`
//
// Responsibilities:
// - Own the loaded `glow` function table for the current context
// - Translate `GpuHandle`s to glow's native object types
// - Optionally check `glGetError` around every call and log failures
//
// glow has no wrappers for glValidateProgram or glGetProgramiv, so those two
// entry points are resolved through the same loader as the rest of the table.

use std::ffi::{c_void, CStr};

use glow::HasContext;

use super::driver::{BufferTarget, Driver, ShaderStage, UNKNOWN_UNIFORM};
use super::error::{RenderError, Result};
use super::layout::ComponentType;
use super::GpuHandle;

/// Runs a GL call, draining and logging driver errors around it when error
/// checking is enabled.
///
/// Mirrors the classic `GLCall(x)` macro: clear pending errors, run the call,
/// then report every error the call produced with its text and location.
macro_rules! gl_call {
    ($self:ident, $call:expr) => {{
        if $self.check_errors {
            $self.clear_errors();
        }
        // Safety: `GlDevice::from_loader` requires a current context for its lifetime.
        #[allow(unused_unsafe)]
        let result = unsafe { $call };
        if $self.check_errors {
            $self.log_errors(stringify!($call), file!(), line!());
        }
        result
    }};
}

type ValidateProgramFn = unsafe extern "system" fn(program: u32);
type GetProgramivFn = unsafe extern "system" fn(program: u32, pname: u32, params: *mut i32);

/// Program entry points missing from glow's `HasContext`.
struct ProgramValidation {
    validate_program: Option<ValidateProgramFn>,
    get_programiv: Option<GetProgramivFn>,
}

impl ProgramValidation {
    /// # Safety
    /// Non-null pointers returned by `loader` must be the GL functions named.
    unsafe fn load<F>(loader: &mut F) -> Self
    where
        F: FnMut(&CStr) -> *const c_void,
    {
        let validate = loader(c"glValidateProgram");
        let get_programiv = loader(c"glGetProgramiv");
        Self {
            validate_program: (!validate.is_null())
                .then(|| std::mem::transmute::<*const c_void, ValidateProgramFn>(validate)),
            get_programiv: (!get_programiv.is_null())
                .then(|| std::mem::transmute::<*const c_void, GetProgramivFn>(get_programiv)),
        }
    }

    fn is_available(&self) -> bool {
        self.validate_program.is_some() && self.get_programiv.is_some()
    }

    /// # Safety
    /// The context the functions were loaded from must be current.
    unsafe fn validate(&self, program: u32) {
        if let Some(validate) = self.validate_program {
            validate(program);
        }
    }

    /// Reads `VALIDATE_STATUS`. Without the entry points there is nothing to
    /// report, so the program counts as valid.
    ///
    /// # Safety
    /// The context the functions were loaded from must be current.
    unsafe fn status(&self, program: u32) -> bool {
        match self.get_programiv {
            Some(get_programiv) => {
                let mut status = 0;
                get_programiv(program, glow::VALIDATE_STATUS, &mut status);
                status != 0
            }
            None => true,
        }
    }
}

pub struct GlDevice {
    gl: glow::Context,
    validation: ProgramValidation,
    check_errors: bool,
}

impl GlDevice {
    /// Load the GL function table through `loader`.
    ///
    /// # Safety
    /// The GL context `loader` resolves symbols for must be current on the
    /// calling thread for as long as this device (and every wrapper using it)
    /// lives.
    pub unsafe fn from_loader<F>(mut loader: F, check_errors: bool) -> Self
    where
        F: FnMut(&CStr) -> *const c_void,
    {
        let gl = glow::Context::from_loader_function_cstr(&mut loader);
        let validation = ProgramValidation::load(&mut loader);

        log::info!("OpenGL version: {}", gl.get_parameter_string(glow::VERSION));
        log::info!(
            "GLSL version: {}",
            gl.get_parameter_string(glow::SHADING_LANGUAGE_VERSION)
        );
        log::info!("Renderer: {}", gl.get_parameter_string(glow::RENDERER));
        log::debug!("Driver error checking: {}", check_errors);
        if !validation.is_available() {
            log::warn!("glValidateProgram/glGetProgramiv not found, program validation disabled");
        }

        Self {
            gl,
            validation,
            check_errors,
        }
    }

    fn clear_errors(&self) {
        // Safety: see `new`.
        unsafe { while self.gl.get_error() != glow::NO_ERROR {} }
    }

    fn log_errors(&self, call: &str, file: &str, line: u32) {
        loop {
            // Safety: see `new`.
            let error = unsafe { self.gl.get_error() };
            if error == glow::NO_ERROR {
                break;
            }
            log::error!("[OpenGL Error] ({:#06x}): {} {}:{}", error, call, file, line);
        }
    }
}

fn allocation(kind: &'static str) -> impl FnOnce(String) -> RenderError {
    move |message| RenderError::Allocation { kind, message }
}

fn buffer(handle: GpuHandle) -> Option<glow::NativeBuffer> {
    handle.non_zero().map(glow::NativeBuffer)
}

fn vertex_array(handle: GpuHandle) -> Option<glow::NativeVertexArray> {
    handle.non_zero().map(glow::NativeVertexArray)
}

fn shader(handle: GpuHandle) -> Option<glow::NativeShader> {
    handle.non_zero().map(glow::NativeShader)
}

fn program(handle: GpuHandle) -> Option<glow::NativeProgram> {
    handle.non_zero().map(glow::NativeProgram)
}

fn texture(handle: GpuHandle) -> Option<glow::NativeTexture> {
    handle.non_zero().map(glow::NativeTexture)
}

fn uniform(location: i32) -> Option<glow::NativeUniformLocation> {
    u32::try_from(location).ok().map(glow::NativeUniformLocation)
}

impl Driver for GlDevice {
    // ─────────────────────────────────────────────────────────────────────────
    // BUFFERS
    // ─────────────────────────────────────────────────────────────────────────
    fn create_buffer(&self) -> Result<GpuHandle> {
        gl_call!(self, self.gl.create_buffer())
            .map(|b| GpuHandle::from(b.0))
            .map_err(allocation("buffer"))
    }

    fn bind_buffer(&self, target: BufferTarget, handle: GpuHandle) {
        gl_call!(self, self.gl.bind_buffer(target.gl_enum(), buffer(handle)));
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8]) {
        gl_call!(
            self,
            self.gl
                .buffer_data_u8_slice(target.gl_enum(), data, glow::STATIC_DRAW)
        );
    }

    fn delete_buffer(&self, handle: GpuHandle) {
        if let Some(b) = buffer(handle) {
            gl_call!(self, self.gl.delete_buffer(b));
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // VERTEX ARRAYS
    // ─────────────────────────────────────────────────────────────────────────
    fn create_vertex_array(&self) -> Result<GpuHandle> {
        gl_call!(self, self.gl.create_vertex_array())
            .map(|v| GpuHandle::from(v.0))
            .map_err(allocation("vertex array"))
    }

    fn bind_vertex_array(&self, handle: GpuHandle) {
        gl_call!(self, self.gl.bind_vertex_array(vertex_array(handle)));
    }

    fn delete_vertex_array(&self, handle: GpuHandle) {
        if let Some(v) = vertex_array(handle) {
            gl_call!(self, self.gl.delete_vertex_array(v));
        }
    }

    fn enable_vertex_attrib_array(&self, slot: u32) {
        gl_call!(self, self.gl.enable_vertex_attrib_array(slot));
    }

    fn vertex_attrib_pointer(
        &self,
        slot: u32,
        count: u32,
        ty: ComponentType,
        normalized: bool,
        stride: u32,
        offset: u32,
    ) {
        gl_call!(
            self,
            self.gl.vertex_attrib_pointer_f32(
                slot,
                count as i32,
                ty.gl_enum(),
                normalized,
                stride as i32,
                offset as i32,
            )
        );
    }

    // ─────────────────────────────────────────────────────────────────────────
    // SHADERS
    // ─────────────────────────────────────────────────────────────────────────
    fn create_shader(&self, stage: ShaderStage) -> Result<GpuHandle> {
        gl_call!(self, self.gl.create_shader(stage.gl_enum()))
            .map(|s| GpuHandle::from(s.0))
            .map_err(allocation("shader"))
    }

    fn shader_source(&self, handle: GpuHandle, source: &str) {
        if let Some(s) = shader(handle) {
            gl_call!(self, self.gl.shader_source(s, source));
        }
    }

    fn compile_shader(&self, handle: GpuHandle) {
        if let Some(s) = shader(handle) {
            gl_call!(self, self.gl.compile_shader(s));
        }
    }

    fn shader_compile_status(&self, handle: GpuHandle) -> bool {
        match shader(handle) {
            Some(s) => gl_call!(self, self.gl.get_shader_compile_status(s)),
            None => false,
        }
    }

    fn shader_info_log(&self, handle: GpuHandle) -> String {
        match shader(handle) {
            Some(s) => gl_call!(self, self.gl.get_shader_info_log(s)),
            None => String::new(),
        }
    }

    fn delete_shader(&self, handle: GpuHandle) {
        if let Some(s) = shader(handle) {
            gl_call!(self, self.gl.delete_shader(s));
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // PROGRAMS
    // ─────────────────────────────────────────────────────────────────────────
    fn create_program(&self) -> Result<GpuHandle> {
        gl_call!(self, self.gl.create_program())
            .map(|p| GpuHandle::from(p.0))
            .map_err(allocation("program"))
    }

    fn attach_shader(&self, program_handle: GpuHandle, shader_handle: GpuHandle) {
        if let (Some(p), Some(s)) = (program(program_handle), shader(shader_handle)) {
            gl_call!(self, self.gl.attach_shader(p, s));
        }
    }

    fn link_program(&self, handle: GpuHandle) {
        if let Some(p) = program(handle) {
            gl_call!(self, self.gl.link_program(p));
        }
    }

    fn program_link_status(&self, handle: GpuHandle) -> bool {
        match program(handle) {
            Some(p) => gl_call!(self, self.gl.get_program_link_status(p)),
            None => false,
        }
    }

    fn validate_program(&self, handle: GpuHandle) {
        if handle.is_valid() {
            gl_call!(self, self.validation.validate(handle.raw()));
        }
    }

    fn program_validate_status(&self, handle: GpuHandle) -> bool {
        handle.is_valid() && gl_call!(self, self.validation.status(handle.raw()))
    }

    fn program_info_log(&self, handle: GpuHandle) -> String {
        match program(handle) {
            Some(p) => gl_call!(self, self.gl.get_program_info_log(p)),
            None => String::new(),
        }
    }

    fn use_program(&self, handle: GpuHandle) {
        gl_call!(self, self.gl.use_program(program(handle)));
    }

    fn delete_program(&self, handle: GpuHandle) {
        if let Some(p) = program(handle) {
            gl_call!(self, self.gl.delete_program(p));
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // UNIFORMS
    // ─────────────────────────────────────────────────────────────────────────
    fn uniform_location(&self, handle: GpuHandle, name: &str) -> i32 {
        let Some(p) = program(handle) else {
            return UNKNOWN_UNIFORM;
        };
        gl_call!(self, self.gl.get_uniform_location(p, name))
            .map_or(UNKNOWN_UNIFORM, |location| location.0 as i32)
    }

    fn uniform_1_i32(&self, location: i32, value: i32) {
        gl_call!(self, self.gl.uniform_1_i32(uniform(location).as_ref(), value));
    }

    fn uniform_1_f32(&self, location: i32, value: f32) {
        gl_call!(self, self.gl.uniform_1_f32(uniform(location).as_ref(), value));
    }

    fn uniform_4_f32(&self, location: i32, [x, y, z, w]: [f32; 4]) {
        gl_call!(
            self,
            self.gl.uniform_4_f32(uniform(location).as_ref(), x, y, z, w)
        );
    }

    fn uniform_matrix_4_f32(&self, location: i32, value: &[f32; 16]) {
        gl_call!(
            self,
            self.gl
                .uniform_matrix_4_f32_slice(uniform(location).as_ref(), false, value)
        );
    }

    // ─────────────────────────────────────────────────────────────────────────
    // TEXTURES
    // ─────────────────────────────────────────────────────────────────────────
    fn create_texture(&self) -> Result<GpuHandle> {
        gl_call!(self, self.gl.create_texture())
            .map(|t| GpuHandle::from(t.0))
            .map_err(allocation("texture"))
    }

    fn active_texture(&self, slot: u32) {
        gl_call!(self, self.gl.active_texture(glow::TEXTURE0 + slot));
    }

    fn bind_texture_2d(&self, handle: GpuHandle) {
        gl_call!(self, self.gl.bind_texture(glow::TEXTURE_2D, texture(handle)));
    }

    fn tex_parameter_2d(&self, parameter: u32, value: i32) {
        gl_call!(
            self,
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, parameter, value)
        );
    }

    fn tex_image_2d_rgba8(&self, width: u32, height: u32, pixels: &[u8]) {
        let pixels = (!pixels.is_empty()).then_some(pixels);
        gl_call!(
            self,
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA8 as i32,
                width as i32,
                height as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                pixels,
            )
        );
    }

    fn delete_texture(&self, handle: GpuHandle) {
        if let Some(t) = texture(handle) {
            gl_call!(self, self.gl.delete_texture(t));
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // FRAME
    // ─────────────────────────────────────────────────────────────────────────
    fn clear_color(&self, [r, g, b, a]: [f32; 4]) {
        gl_call!(self, self.gl.clear_color(r, g, b, a));
    }

    fn clear(&self, mask: u32) {
        gl_call!(self, self.gl.clear(mask));
    }

    fn viewport(&self, width: u32, height: u32) {
        gl_call!(self, self.gl.viewport(0, 0, width as i32, height as i32));
    }

    fn draw_elements(&self, mode: u32, count: u32, index_type: u32, offset: u32) {
        gl_call!(
            self,
            self.gl
                .draw_elements(mode, count as i32, index_type, offset as i32)
        );
    }
}
