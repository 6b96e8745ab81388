// Buffer wrappers for vertex and index data
//
// Each wrapper creates one GL buffer, uploads its data once with STATIC_DRAW
// and deletes the buffer on drop. There are no partial or streaming updates.

use super::driver::{BufferTarget, SharedDriver};
use super::error::Result;
use super::GpuHandle;

/// Vertex data uploaded to an `ARRAY_BUFFER`.
pub struct VertexBuffer {
    driver: SharedDriver,
    handle: GpuHandle,
    size: usize,
}

impl VertexBuffer {
    /// Create a buffer and upload exactly `data`.
    pub fn new(driver: SharedDriver, data: &[u8]) -> Result<Self> {
        let handle = upload(&driver, BufferTarget::Array, data)?;
        log::debug!("Created vertex buffer {} ({} bytes)", handle, data.len());

        Ok(Self {
            driver,
            handle,
            size: data.len(),
        })
    }

    /// Create a buffer from typed vertices (any `Pod` vertex struct or floats).
    pub fn from_slice<T: bytemuck::Pod>(driver: SharedDriver, vertices: &[T]) -> Result<Self> {
        Self::new(driver, bytemuck::cast_slice(vertices))
    }

    pub fn bind(&self) {
        self.driver.bind_buffer(BufferTarget::Array, self.handle);
    }

    pub fn unbind(&self) {
        self.driver.bind_buffer(BufferTarget::Array, GpuHandle::INVALID);
    }

    pub fn handle(&self) -> GpuHandle {
        self.handle
    }

    /// Uploaded size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }
}

impl Drop for VertexBuffer {
    fn drop(&mut self) {
        self.driver.delete_buffer(self.handle);
    }
}

/// `u32` indices uploaded to an `ELEMENT_ARRAY_BUFFER`.
pub struct IndexBuffer {
    driver: SharedDriver,
    handle: GpuHandle,
    count: u32,
}

impl IndexBuffer {
    pub fn new(driver: SharedDriver, indices: &[u32]) -> Result<Self> {
        let handle = upload(&driver, BufferTarget::ElementArray, bytemuck::cast_slice(indices))?;
        log::debug!("Created index buffer {} ({} indices)", handle, indices.len());

        Ok(Self {
            driver,
            handle,
            count: indices.len() as u32,
        })
    }

    pub fn bind(&self) {
        self.driver.bind_buffer(BufferTarget::ElementArray, self.handle);
    }

    pub fn unbind(&self) {
        self.driver
            .bind_buffer(BufferTarget::ElementArray, GpuHandle::INVALID);
    }

    pub fn handle(&self) -> GpuHandle {
        self.handle
    }

    /// Number of indices, not bytes.
    pub fn count(&self) -> u32 {
        self.count
    }
}

impl Drop for IndexBuffer {
    fn drop(&mut self) {
        self.driver.delete_buffer(self.handle);
    }
}

/// Create a buffer, bind it at `target` and fill it with `data`.
fn upload(driver: &SharedDriver, target: BufferTarget, data: &[u8]) -> Result<GpuHandle> {
    let handle = driver.create_buffer()?;
    driver.bind_buffer(target, handle);
    driver.buffer_data(target, data);
    Ok(handle)
}
