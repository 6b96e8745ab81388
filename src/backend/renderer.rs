// Frame renderer - clear and indexed draw calls
//
// Holds no bind state of its own. Every draw binds the program, the vertex
// array and the index buffer again, because any other code may have changed
// the driver's current bindings in between.

use super::driver::SharedDriver;
use super::geometry::GeometryBuffers;
use super::shader::ShaderProgram;

pub struct FrameRenderer {
    driver: SharedDriver,
}

impl FrameRenderer {
    pub fn new(driver: SharedDriver) -> Self {
        Self { driver }
    }

    /// Clear the color buffer (no depth or stencil).
    pub fn clear(&self) {
        self.driver.clear(glow::COLOR_BUFFER_BIT);
    }

    pub fn set_clear_color(&self, rgba: [f32; 4]) {
        self.driver.clear_color(rgba);
    }

    pub fn set_viewport(&self, width: u32, height: u32) {
        self.driver.viewport(width, height);
    }

    /// Draw `index_count` indices of `geometry` as triangles with `program`.
    ///
    /// Counts beyond the index buffer's size are clamped.
    pub fn draw(&self, geometry: &GeometryBuffers, index_count: u32, program: &ShaderProgram) {
        let available = geometry.index_count();
        let count = if index_count > available {
            log::warn!(
                "Draw requested {} indices but the index buffer holds {}",
                index_count,
                available
            );
            available
        } else {
            index_count
        };

        program.bind();
        geometry.vertex_array().bind();
        geometry.index_buffer().bind();

        self.driver
            .draw_elements(glow::TRIANGLES, count, glow::UNSIGNED_INT, 0);
    }
}
