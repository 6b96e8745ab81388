// Vertex array object - binds a vertex layout to a vertex buffer
//
// The VAO records which buffer feeds each attribute slot and how to read it.
// Slot numbers come from the layout's element order, so the shader's
// `layout(location = N)` declarations must follow the same order.

use super::buffer::VertexBuffer;
use super::driver::SharedDriver;
use super::error::Result;
use super::layout::VertexLayout;
use super::GpuHandle;

pub struct VertexArray {
    driver: SharedDriver,
    handle: GpuHandle,
}

impl VertexArray {
    pub fn new(driver: SharedDriver) -> Result<Self> {
        let handle = driver.create_vertex_array()?;
        Ok(Self { driver, handle })
    }

    /// Describe `layout` for the data in `buffer`.
    ///
    /// Binds this VAO and the buffer, then enables one attribute slot per
    /// layout element with its running byte offset.
    pub fn add_buffer(&self, buffer: &VertexBuffer, layout: &VertexLayout) {
        self.bind();
        buffer.bind();

        let stride = layout.stride();
        for (slot, offset, element) in layout.attributes() {
            self.driver.enable_vertex_attrib_array(slot);
            self.driver.vertex_attrib_pointer(
                slot,
                element.count,
                element.ty,
                element.normalized,
                stride,
                offset,
            );
        }

        log::debug!(
            "Vertex array {}: {} attribute(s), stride {} bytes",
            self.handle,
            layout.elements().len(),
            stride
        );
    }

    pub fn bind(&self) {
        self.driver.bind_vertex_array(self.handle);
    }

    pub fn unbind(&self) {
        self.driver.bind_vertex_array(GpuHandle::INVALID);
    }

    pub fn handle(&self) -> GpuHandle {
        self.handle
    }
}

impl Drop for VertexArray {
    fn drop(&mut self) {
        self.driver.delete_vertex_array(self.handle);
    }
}
