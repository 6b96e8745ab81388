// Shader programs - source splitting, compilation, linking, uniforms
//
// A shader file holds both stages, separated by marker lines:
//
//     #shader vertex
//     ...GLSL...
//     #shader fragment
//     ...GLSL...
//
// The program caches uniform locations by name. A name the program does not
// know is cached as -1 after one warning, and writes to it are skipped.

use std::collections::HashMap;
use std::path::Path;

use super::driver::{SharedDriver, ShaderStage, UNKNOWN_UNIFORM};
use super::error::{RenderError, Result};
use super::GpuHandle;

/// Token that marks a section switch line.
pub const SECTION_MARKER: &str = "#shader";

/// Vertex and fragment sources split out of one shader file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderSource {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSource {
    /// Split `text` into its two sections.
    ///
    /// - A line containing `#shader` switches sections and is dropped.
    ///   `vertex` is checked before `fragment`; a marker naming neither keeps
    ///   the current section active.
    /// - Lines before the first recognized marker are dropped.
    /// - Every other line is appended to the active section with a `\n`.
    ///   Only the `\n` terminator is consumed, so a CRLF line keeps its `\r`.
    pub fn parse(text: &str) -> Self {
        let mut source = Self::default();
        let mut active: Option<ShaderStage> = None;

        for line in text.split_inclusive('\n') {
            let line = line.strip_suffix('\n').unwrap_or(line);

            if line.contains(SECTION_MARKER) {
                if line.contains("vertex") {
                    active = Some(ShaderStage::Vertex);
                } else if line.contains("fragment") {
                    active = Some(ShaderStage::Fragment);
                } else {
                    log::warn!("Unrecognized shader section marker: {:?}", line.trim());
                }
                continue;
            }

            let section = match active {
                Some(ShaderStage::Vertex) => &mut source.vertex,
                Some(ShaderStage::Fragment) => &mut source.fragment,
                None => continue,
            };
            section.push_str(line);
            section.push('\n');
        }

        source
    }

    /// Read and split a shader file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| RenderError::ShaderRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    pub fn stage(&self, stage: ShaderStage) -> &str {
        match stage {
            ShaderStage::Vertex => &self.vertex,
            ShaderStage::Fragment => &self.fragment,
        }
    }
}

/// Compile one stage.
///
/// On failure the driver log is written to the error log, the shader object
/// is deleted and `GpuHandle::INVALID` is returned. Callers must check for
/// the sentinel before linking.
pub fn compile_stage(driver: &SharedDriver, stage: ShaderStage, source: &str) -> GpuHandle {
    let shader = match driver.create_shader(stage) {
        Ok(shader) => shader,
        Err(e) => {
            log::error!("{}", e);
            return GpuHandle::INVALID;
        }
    };

    driver.shader_source(shader, source);
    driver.compile_shader(shader);

    if !driver.shader_compile_status(shader) {
        let log = driver.shader_info_log(shader);
        log::error!("Failed to compile the {} shader", stage);
        log::error!("{}", log.trim_end());

        driver.delete_shader(shader);
        return GpuHandle::INVALID;
    }

    shader
}

/// Link two compiled stages into a program.
///
/// The stage objects are deleted afterwards; the driver keeps the linked
/// copy. A failed link deletes the program and returns `RenderError::Link`.
/// A failed validation is only logged, since it depends on the bound state
/// at the time of the call.
pub fn link_program(driver: &SharedDriver, vertex: GpuHandle, fragment: GpuHandle) -> Result<GpuHandle> {
    let program = match driver.create_program() {
        Ok(program) => program,
        Err(e) => {
            driver.delete_shader(vertex);
            driver.delete_shader(fragment);
            return Err(e);
        }
    };

    driver.attach_shader(program, vertex);
    driver.attach_shader(program, fragment);
    driver.link_program(program);
    driver.validate_program(program);

    driver.delete_shader(vertex);
    driver.delete_shader(fragment);

    if !driver.program_link_status(program) {
        let log = driver.program_info_log(program);
        driver.delete_program(program);
        return Err(RenderError::Link {
            log: log.trim_end().to_string(),
        });
    }

    if !driver.program_validate_status(program) {
        log::warn!(
            "Shader program {} failed validation: {}",
            program,
            driver.program_info_log(program).trim_end()
        );
    }

    Ok(program)
}

/// A linked shader program with a uniform location cache.
pub struct ShaderProgram {
    driver: SharedDriver,
    handle: GpuHandle,
    uniform_cache: HashMap<String, i32>,
}

impl ShaderProgram {
    /// Read, compile and link a dual-section shader file.
    pub fn from_file(driver: SharedDriver, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = ShaderSource::from_path(path)?;
        let program = Self::from_source(driver, &source)?;
        log::info!("Loaded shader program {} from {:?}", program.handle, path);
        Ok(program)
    }

    pub fn from_source(driver: SharedDriver, source: &ShaderSource) -> Result<Self> {
        let vertex = compile_stage(&driver, ShaderStage::Vertex, &source.vertex);
        let fragment = compile_stage(&driver, ShaderStage::Fragment, &source.fragment);

        // Refuse to link with a missing stage; release whichever compiled
        let failed = match (vertex.is_valid(), fragment.is_valid()) {
            (true, true) => None,
            (false, _) => Some(ShaderStage::Vertex),
            (true, false) => Some(ShaderStage::Fragment),
        };
        if let Some(stage) = failed {
            driver.delete_shader(vertex);
            driver.delete_shader(fragment);
            return Err(RenderError::Compile { stage });
        }

        let handle = link_program(&driver, vertex, fragment)?;

        Ok(Self {
            driver,
            handle,
            uniform_cache: HashMap::new(),
        })
    }

    /// Make this the active program.
    pub fn bind(&self) {
        self.driver.use_program(self.handle);
    }

    pub fn unbind(&self) {
        self.driver.use_program(GpuHandle::INVALID);
    }

    pub fn handle(&self) -> GpuHandle {
        self.handle
    }

    /// Look up a uniform location, querying the driver only on the first
    /// request for `name`. Unknown names return -1.
    pub fn uniform_location(&mut self, name: &str) -> i32 {
        if let Some(&location) = self.uniform_cache.get(name) {
            return location;
        }

        let location = self.driver.uniform_location(self.handle, name);
        if location == UNKNOWN_UNIFORM {
            log::warn!("Uniform {:?} doesn't exist in program {}", name, self.handle);
        }

        self.uniform_cache.insert(name.to_string(), location);
        location
    }

    // ─────────────────────────────────────────────────────────────────────────
    // UNIFORM SETTERS
    // ─────────────────────────────────────────────────────────────────────────
    // Each setter writes to the currently bound program, so call `bind` first.

    pub fn set_uniform_1i(&mut self, name: &str, value: i32) {
        if let Some(location) = self.known_location(name) {
            self.driver.uniform_1_i32(location, value);
        }
    }

    pub fn set_uniform_1f(&mut self, name: &str, value: f32) {
        if let Some(location) = self.known_location(name) {
            self.driver.uniform_1_f32(location, value);
        }
    }

    pub fn set_uniform_4f(&mut self, name: &str, v0: f32, v1: f32, v2: f32, v3: f32) {
        if let Some(location) = self.known_location(name) {
            self.driver.uniform_4_f32(location, [v0, v1, v2, v3]);
        }
    }

    pub fn set_uniform_mat4(&mut self, name: &str, matrix: &glam::Mat4) {
        if let Some(location) = self.known_location(name) {
            self.driver.uniform_matrix_4_f32(location, &matrix.to_cols_array());
        }
    }

    fn known_location(&mut self, name: &str) -> Option<i32> {
        let location = self.uniform_location(name);
        (location != UNKNOWN_UNIFORM).then_some(location)
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        self.driver.delete_program(self.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::recording::{Call, RecordingDriver};

    const BASIC: &str = "\
#shader vertex
#version 330 core
layout(location = 0) in vec4 position;
void main() { gl_Position = position; }
#shader fragment
#version 330 core
uniform vec4 u_Color;
out vec4 color;
void main() { color = u_Color; }
";

    // ─────────────────────────────────────────────────────────────────────────
    // PARSING
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn parse_splits_sections_and_drops_markers() {
        let source = ShaderSource::parse(BASIC);

        assert_eq!(
            source.vertex,
            "#version 330 core\n\
             layout(location = 0) in vec4 position;\n\
             void main() { gl_Position = position; }\n"
        );
        assert_eq!(
            source.fragment,
            "#version 330 core\n\
             uniform vec4 u_Color;\n\
             out vec4 color;\n\
             void main() { color = u_Color; }\n"
        );
    }

    #[test]
    fn parse_keeps_every_non_marker_line() {
        let source = ShaderSource::parse(BASIC);
        let expected: Vec<&str> = BASIC.lines().filter(|l| !l.contains(SECTION_MARKER)).collect();
        let rebuilt: Vec<&str> = source.vertex.lines().chain(source.fragment.lines()).collect();
        assert_eq!(rebuilt, expected);
    }

    #[test]
    fn parse_keeps_carriage_returns_of_crlf_lines() {
        let source = ShaderSource::parse("#shader vertex\r\nA\r\nB\r\n#shader fragment\r\nC");
        assert_eq!(source.vertex, "A\r\nB\r\n");
        assert_eq!(source.fragment, "C\n");
    }

    #[test]
    fn parse_without_markers_is_empty() {
        let source = ShaderSource::parse("void main() {}\nint x;\n");
        assert_eq!(source, ShaderSource::default());
    }

    #[test]
    fn lines_before_the_first_marker_are_dropped() {
        let source = ShaderSource::parse("// header\n#shader fragment\nA\n");
        assert_eq!(source.vertex, "");
        assert_eq!(source.fragment, "A\n");
    }

    #[test]
    fn unknown_marker_keeps_the_active_section() {
        let text = "#shader vertex\nA\n#shader geometry\nB\n#shader fragment\nC\n";
        let source = ShaderSource::parse(text);
        assert_eq!(source.vertex, "A\nB\n");
        assert_eq!(source.fragment, "C\n");
    }

    #[test]
    fn unknown_marker_before_any_section_selects_nothing() {
        let source = ShaderSource::parse("#shader compute\nA\n");
        assert_eq!(source, ShaderSource::default());
    }

    #[test]
    fn sections_may_repeat() {
        let text = "#shader vertex\nA\n#shader fragment\nB\n#shader vertex\nC\n";
        let source = ShaderSource::parse(text);
        assert_eq!(source.stage(ShaderStage::Vertex), "A\nC\n");
        assert_eq!(source.stage(ShaderStage::Fragment), "B\n");
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let path = std::env::temp_dir().join("gl-harness-missing.shader");
        let err = ShaderSource::from_path(&path).unwrap_err();
        assert!(matches!(err, RenderError::ShaderRead { .. }));
    }

    #[test]
    fn from_path_reads_the_file() {
        let path = std::env::temp_dir().join(format!("gl-harness-{}.shader", std::process::id()));
        std::fs::write(&path, BASIC).unwrap();

        let source = ShaderSource::from_path(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(source, ShaderSource::parse(BASIC));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // COMPILE & LINK
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn compile_failure_returns_sentinel_and_deletes_shader() {
        let driver = RecordingDriver::new();
        driver.fail_compile(ShaderStage::Fragment);
        let shared = driver.shared();

        let handle = compile_stage(&shared, ShaderStage::Fragment, "broken");

        assert_eq!(handle, GpuHandle::INVALID);
        let created = driver.calls().into_iter().find_map(|call| match call {
            Call::CreateShader(ShaderStage::Fragment, h) => Some(h),
            _ => None,
        });
        let created = created.unwrap();
        assert!(driver.calls().contains(&Call::DeleteShader(created)));
    }

    #[test]
    fn program_links_and_releases_stages() {
        let driver = RecordingDriver::new();
        let program = ShaderProgram::from_source(driver.shared(), &ShaderSource::parse(BASIC)).unwrap();

        let calls = driver.calls();
        let stages: Vec<GpuHandle> = calls
            .iter()
            .filter_map(|call| match call {
                Call::CreateShader(_, h) => Some(*h),
                _ => None,
            })
            .collect();
        assert_eq!(stages.len(), 2);

        let handle = program.handle();
        for stage in &stages {
            assert!(calls.contains(&Call::AttachShader(handle, *stage)));
            assert!(calls.contains(&Call::DeleteShader(*stage)));
        }
        assert!(calls.contains(&Call::LinkProgram(handle)));
        assert!(calls.contains(&Call::ValidateProgram(handle)));
    }

    #[test]
    fn compile_failure_aborts_before_linking() {
        let driver = RecordingDriver::new();
        driver.fail_compile(ShaderStage::Vertex);

        let result = ShaderProgram::from_source(driver.shared(), &ShaderSource::parse(BASIC));

        assert!(matches!(
            result,
            Err(RenderError::Compile {
                stage: ShaderStage::Vertex
            })
        ));
        assert_eq!(driver.count(|call| matches!(call, Call::CreateProgram(_))), 0);

        // The fragment stage compiled; it must be released, not leaked
        let calls = driver.calls();
        let fragment = calls
            .iter()
            .position(|call| matches!(call, Call::CreateShader(ShaderStage::Fragment, _)))
            .unwrap();
        let Call::CreateShader(_, handle) = calls[fragment] else {
            unreachable!()
        };
        assert!(calls[fragment..].contains(&Call::DeleteShader(handle)));
    }

    #[test]
    fn program_allocation_failure_releases_both_stages() {
        let driver = RecordingDriver::new();
        driver.fail_program_allocation();

        let result = ShaderProgram::from_source(driver.shared(), &ShaderSource::parse(BASIC));

        assert!(matches!(
            result,
            Err(RenderError::Allocation { kind: "program", .. })
        ));
        let created: Vec<GpuHandle> = driver
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::CreateShader(_, handle) => Some(handle),
                _ => None,
            })
            .collect();
        assert_eq!(created.len(), 2);
        for handle in created {
            assert_eq!(driver.count(|call| *call == Call::DeleteShader(handle)), 1);
        }
    }

    #[test]
    fn link_failure_is_an_error() {
        let driver = RecordingDriver::new();
        driver.fail_link();

        let result = ShaderProgram::from_source(driver.shared(), &ShaderSource::parse(BASIC));

        let Err(RenderError::Link { log }) = result else {
            panic!("expected a link error");
        };
        assert!(log.contains("not consumed"));
        assert_eq!(driver.count(|call| matches!(call, Call::DeleteProgram(_))), 1);
    }

    #[test]
    fn validation_failure_still_yields_a_program() {
        let driver = RecordingDriver::new();
        driver.fail_validate();
        assert!(ShaderProgram::from_source(driver.shared(), &ShaderSource::parse(BASIC)).is_ok());
    }

    #[test]
    fn missing_shader_file_surfaces_read_error() {
        let driver = RecordingDriver::new();
        let path = std::env::temp_dir().join("gl-harness-does-not-exist.shader");
        let result = ShaderProgram::from_file(driver.shared(), path);
        assert!(matches!(result, Err(RenderError::ShaderRead { .. })));
        assert!(driver.calls().is_empty());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // UNIFORMS
    // ─────────────────────────────────────────────────────────────────────────

    fn program_with(uniforms: &[(&str, i32)]) -> (std::rc::Rc<RecordingDriver>, ShaderProgram) {
        let driver = RecordingDriver::with_uniforms(uniforms);
        let program = ShaderProgram::from_source(driver.shared(), &ShaderSource::parse(BASIC)).unwrap();
        driver.clear_calls();
        (driver, program)
    }

    fn lookups(driver: &RecordingDriver) -> usize {
        driver.count(|call| matches!(call, Call::UniformLocation(..)))
    }

    #[test]
    fn uniform_location_is_cached() {
        let (driver, mut program) = program_with(&[("u_Color", 3)]);

        assert_eq!(program.uniform_location("u_Color"), 3);
        assert_eq!(program.uniform_location("u_Color"), 3);
        assert_eq!(lookups(&driver), 1);
    }

    #[test]
    fn missing_uniform_is_cached_and_writes_are_skipped() {
        let (driver, mut program) = program_with(&[]);

        assert_eq!(program.uniform_location("u_Missing"), UNKNOWN_UNIFORM);
        program.set_uniform_1f("u_Missing", 1.0);
        program.set_uniform_4f("u_Missing", 1.0, 0.0, 0.0, 1.0);

        assert_eq!(lookups(&driver), 1);
        assert_eq!(driver.calls().len(), 1);
    }

    #[test]
    fn setters_write_to_the_resolved_location() {
        let (driver, mut program) = program_with(&[("u_Texture", 0), ("u_Color", 1), ("u_Time", 2), ("u_MVP", 5)]);

        program.set_uniform_1i("u_Texture", 0);
        program.set_uniform_4f("u_Color", 0.8, 0.3, 0.8, 1.0);
        program.set_uniform_1f("u_Time", 0.5);
        let mvp = glam::Mat4::from_translation(glam::Vec3::new(1.0, 2.0, 3.0));
        program.set_uniform_mat4("u_MVP", &mvp);

        let writes: Vec<Call> = driver
            .calls()
            .into_iter()
            .filter(|call| !matches!(call, Call::UniformLocation(..)))
            .collect();
        assert_eq!(
            writes,
            vec![
                Call::Uniform1i(0, 0),
                Call::Uniform4f(1, [0.8, 0.3, 0.8, 1.0]),
                Call::Uniform1f(2, 0.5),
                Call::UniformMat4(5, mvp.to_cols_array()),
            ]
        );
    }

    #[test]
    fn bind_and_unbind_switch_the_active_program() {
        let (driver, program) = program_with(&[]);
        program.bind();
        program.unbind();
        assert_eq!(
            driver.calls(),
            vec![
                Call::UseProgram(program.handle()),
                Call::UseProgram(GpuHandle::INVALID),
            ]
        );
    }

    #[test]
    fn drop_deletes_program() {
        let (driver, program) = program_with(&[]);
        let handle = program.handle();
        drop(program);
        assert_eq!(driver.calls(), vec![Call::DeleteProgram(handle)]);
    }
}
