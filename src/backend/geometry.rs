// Geometry buffers - vertex data, index data and the VAO that ties them
//
// Created once with final data. Dropping releases the VAO and both buffers.

use super::buffer::{IndexBuffer, VertexBuffer};
use super::driver::SharedDriver;
use super::error::Result;
use super::layout::VertexLayout;
use super::vertex_array::VertexArray;

pub struct GeometryBuffers {
    // Drop order: VAO first, then the buffers it references
    vertex_array: VertexArray,
    vertex_buffer: VertexBuffer,
    index_buffer: IndexBuffer,
}

impl GeometryBuffers {
    /// Upload `vertices` (raw interleaved bytes) and `indices`.
    pub fn new(driver: SharedDriver, vertices: &[u8], indices: &[u32]) -> Result<Self> {
        let vertex_array = VertexArray::new(driver.clone())?;
        // Core profiles need a bound VAO to hold the element buffer binding
        vertex_array.bind();
        let vertex_buffer = VertexBuffer::new(driver.clone(), vertices)?;
        let index_buffer = IndexBuffer::new(driver, indices)?;

        Ok(Self {
            vertex_array,
            vertex_buffer,
            index_buffer,
        })
    }

    pub fn from_slices<T: bytemuck::Pod>(
        driver: SharedDriver,
        vertices: &[T],
        indices: &[u32],
    ) -> Result<Self> {
        Self::new(driver, bytemuck::cast_slice(vertices), indices)
    }

    /// Describe the vertex buffer's layout to the driver.
    ///
    /// `layout.stride()` must equal the real per-vertex size of the data.
    pub fn attach(&self, layout: &VertexLayout) {
        if layout.stride() > 0 && self.vertex_buffer.size() % layout.stride() as usize != 0 {
            log::warn!(
                "Vertex data ({} bytes) is not a multiple of the layout stride ({} bytes)",
                self.vertex_buffer.size(),
                layout.stride()
            );
        }
        self.vertex_array.add_buffer(&self.vertex_buffer, layout);
    }

    pub fn vertex_array(&self) -> &VertexArray {
        &self.vertex_array
    }

    pub fn vertex_buffer(&self) -> &VertexBuffer {
        &self.vertex_buffer
    }

    pub fn index_buffer(&self) -> &IndexBuffer {
        &self.index_buffer
    }

    pub fn index_count(&self) -> u32 {
        self.index_buffer.count()
    }
}
