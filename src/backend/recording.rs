// Recording driver for unit tests
//
// Implements `Driver` without a GL context. Every call is appended to a log
// that tests inspect. Handles are handed out from a counter starting at 1.
// Compile and link failures and known uniforms can be scripted per test.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use super::driver::{BufferTarget, Driver, SharedDriver, ShaderStage, UNKNOWN_UNIFORM};
use super::error::{RenderError, Result};
use super::layout::ComponentType;
use super::GpuHandle;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateBuffer(GpuHandle),
    BindBuffer(BufferTarget, GpuHandle),
    BufferData(BufferTarget, Vec<u8>),
    DeleteBuffer(GpuHandle),

    CreateVertexArray(GpuHandle),
    BindVertexArray(GpuHandle),
    DeleteVertexArray(GpuHandle),
    EnableVertexAttribArray(u32),
    VertexAttribPointer {
        slot: u32,
        count: u32,
        ty: ComponentType,
        normalized: bool,
        stride: u32,
        offset: u32,
    },

    CreateShader(ShaderStage, GpuHandle),
    ShaderSource(GpuHandle, String),
    CompileShader(GpuHandle),
    DeleteShader(GpuHandle),

    CreateProgram(GpuHandle),
    AttachShader(GpuHandle, GpuHandle),
    LinkProgram(GpuHandle),
    ValidateProgram(GpuHandle),
    UseProgram(GpuHandle),
    DeleteProgram(GpuHandle),

    UniformLocation(GpuHandle, String),
    Uniform1i(i32, i32),
    Uniform1f(i32, f32),
    Uniform4f(i32, [f32; 4]),
    UniformMat4(i32, [f32; 16]),

    CreateTexture(GpuHandle),
    ActiveTexture(u32),
    BindTexture2d(GpuHandle),
    TexParameter(u32, i32),
    TexImage2d {
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    },
    DeleteTexture(GpuHandle),

    ClearColor([f32; 4]),
    Clear(u32),
    Viewport(u32, u32),
    DrawElements {
        mode: u32,
        count: u32,
        index_type: u32,
        offset: u32,
    },
}

#[derive(Default)]
pub struct RecordingDriver {
    calls: RefCell<Vec<Call>>,
    next_handle: Cell<u32>,
    stages: RefCell<HashMap<GpuHandle, ShaderStage>>,
    failing_stage: Cell<Option<ShaderStage>>,
    link_fails: Cell<bool>,
    program_allocation_fails: Cell<bool>,
    validate_fails: Cell<bool>,
    uniforms: RefCell<HashMap<String, i32>>,
}

impl RecordingDriver {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// A driver whose programs expose the given uniforms.
    pub fn with_uniforms(uniforms: &[(&str, i32)]) -> Rc<Self> {
        let driver = Self::new();
        driver.uniforms.borrow_mut().extend(
            uniforms
                .iter()
                .map(|(name, location)| (name.to_string(), *location)),
        );
        driver
    }

    pub fn shared(self: &Rc<Self>) -> SharedDriver {
        self.clone()
    }

    pub fn fail_compile(&self, stage: ShaderStage) {
        self.failing_stage.set(Some(stage));
    }

    pub fn fail_link(&self) {
        self.link_fails.set(true);
    }

    pub fn fail_program_allocation(&self) {
        self.program_allocation_fails.set(true);
    }

    pub fn fail_validate(&self) {
        self.validate_fails.set(true);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|call| predicate(call)).count()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn allocate(&self) -> GpuHandle {
        let next = self.next_handle.get() + 1;
        self.next_handle.set(next);
        GpuHandle::new(next)
    }
}

impl Driver for RecordingDriver {
    fn create_buffer(&self) -> Result<GpuHandle> {
        let handle = self.allocate();
        self.record(Call::CreateBuffer(handle));
        Ok(handle)
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: GpuHandle) {
        self.record(Call::BindBuffer(target, buffer));
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8]) {
        self.record(Call::BufferData(target, data.to_vec()));
    }

    fn delete_buffer(&self, buffer: GpuHandle) {
        self.record(Call::DeleteBuffer(buffer));
    }

    fn create_vertex_array(&self) -> Result<GpuHandle> {
        let handle = self.allocate();
        self.record(Call::CreateVertexArray(handle));
        Ok(handle)
    }

    fn bind_vertex_array(&self, vertex_array: GpuHandle) {
        self.record(Call::BindVertexArray(vertex_array));
    }

    fn delete_vertex_array(&self, vertex_array: GpuHandle) {
        self.record(Call::DeleteVertexArray(vertex_array));
    }

    fn enable_vertex_attrib_array(&self, slot: u32) {
        self.record(Call::EnableVertexAttribArray(slot));
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
        self.record(Call::VertexAttribPointer {
            slot,
            count,
            ty,
            normalized,
            stride,
            offset,
        });
    }

    fn create_shader(&self, stage: ShaderStage) -> Result<GpuHandle> {
        let handle = self.allocate();
        self.stages.borrow_mut().insert(handle, stage);
        self.record(Call::CreateShader(stage, handle));
        Ok(handle)
    }

    fn shader_source(&self, shader: GpuHandle, source: &str) {
        self.record(Call::ShaderSource(shader, source.to_string()));
    }

    fn compile_shader(&self, shader: GpuHandle) {
        self.record(Call::CompileShader(shader));
    }

    fn shader_compile_status(&self, shader: GpuHandle) -> bool {
        let stage = self.stages.borrow().get(&shader).copied();
        stage.is_some() && stage != self.failing_stage.get()
    }

    fn shader_info_log(&self, shader: GpuHandle) -> String {
        format!("0:1(1): error: shader {shader} rejected")
    }

    fn delete_shader(&self, shader: GpuHandle) {
        self.record(Call::DeleteShader(shader));
    }

    fn create_program(&self) -> Result<GpuHandle> {
        if self.program_allocation_fails.get() {
            return Err(RenderError::Allocation {
                kind: "program",
                message: "out of program names".to_string(),
            });
        }
        let handle = self.allocate();
        self.record(Call::CreateProgram(handle));
        Ok(handle)
    }

    fn attach_shader(&self, program: GpuHandle, shader: GpuHandle) {
        self.record(Call::AttachShader(program, shader));
    }

    fn link_program(&self, program: GpuHandle) {
        self.record(Call::LinkProgram(program));
    }

    fn program_link_status(&self, _program: GpuHandle) -> bool {
        !self.link_fails.get()
    }

    fn validate_program(&self, program: GpuHandle) {
        self.record(Call::ValidateProgram(program));
    }

    fn program_validate_status(&self, _program: GpuHandle) -> bool {
        !self.validate_fails.get()
    }

    fn program_info_log(&self, _program: GpuHandle) -> String {
        "error: vertex output not consumed".to_string()
    }

    fn use_program(&self, program: GpuHandle) {
        self.record(Call::UseProgram(program));
    }

    fn delete_program(&self, program: GpuHandle) {
        self.record(Call::DeleteProgram(program));
    }

    fn uniform_location(&self, program: GpuHandle, name: &str) -> i32 {
        self.record(Call::UniformLocation(program, name.to_string()));
        self.uniforms
            .borrow()
            .get(name)
            .copied()
            .unwrap_or(UNKNOWN_UNIFORM)
    }

    fn uniform_1_i32(&self, location: i32, value: i32) {
        self.record(Call::Uniform1i(location, value));
    }

    fn uniform_1_f32(&self, location: i32, value: f32) {
        self.record(Call::Uniform1f(location, value));
    }

    fn uniform_4_f32(&self, location: i32, value: [f32; 4]) {
        self.record(Call::Uniform4f(location, value));
    }

    fn uniform_matrix_4_f32(&self, location: i32, value: &[f32; 16]) {
        self.record(Call::UniformMat4(location, *value));
    }

    fn create_texture(&self) -> Result<GpuHandle> {
        let handle = self.allocate();
        self.record(Call::CreateTexture(handle));
        Ok(handle)
    }

    fn active_texture(&self, slot: u32) {
        self.record(Call::ActiveTexture(slot));
    }

    fn bind_texture_2d(&self, texture: GpuHandle) {
        self.record(Call::BindTexture2d(texture));
    }

    fn tex_parameter_2d(&self, parameter: u32, value: i32) {
        self.record(Call::TexParameter(parameter, value));
    }

    fn tex_image_2d_rgba8(&self, width: u32, height: u32, pixels: &[u8]) {
        self.record(Call::TexImage2d {
            width,
            height,
            pixels: pixels.to_vec(),
        });
    }

    fn delete_texture(&self, texture: GpuHandle) {
        self.record(Call::DeleteTexture(texture));
    }

    fn clear_color(&self, rgba: [f32; 4]) {
        self.record(Call::ClearColor(rgba));
    }

    fn clear(&self, mask: u32) {
        self.record(Call::Clear(mask));
    }

    fn viewport(&self, width: u32, height: u32) {
        self.record(Call::Viewport(width, height));
    }

    fn draw_elements(&self, mode: u32, count: u32, index_type: u32, offset: u32) {
        self.record(Call::DrawElements {
            mode,
            count,
            index_type,
            offset,
        });
    }
}
