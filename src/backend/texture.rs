// 2D textures
//
// Images are decoded on the CPU, flipped vertically (GL's texture origin is
// bottom-left, image files start at the top), forced to RGBA8 and uploaded
// once. The decoded pixels are dropped as soon as the upload returns.

use std::path::Path;

use image::DynamicImage;

use super::driver::SharedDriver;
use super::error::{RenderError, Result};
use super::GpuHandle;

/// Number of texture units the harness addresses (`GL_TEXTURE0..GL_TEXTURE31`).
pub const TEXTURE_SLOTS: u32 = 32;

pub struct Texture2D {
    driver: SharedDriver,
    handle: GpuHandle,
    width: u32,
    height: u32,
}

impl Texture2D {
    /// Decode an image file and upload it.
    pub fn load(driver: SharedDriver, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|source| RenderError::TextureDecode {
            path: path.to_path_buf(),
            source,
        })?;

        let texture = Self::from_image(driver, image)?;
        log::info!(
            "Loaded texture {} from {:?} ({}x{})",
            texture.handle,
            path,
            texture.width,
            texture.height
        );
        Ok(texture)
    }

    /// Upload an already decoded image.
    pub fn from_image(driver: SharedDriver, image: DynamicImage) -> Result<Self> {
        let pixels = image.flipv().into_rgba8();
        let (width, height) = pixels.dimensions();

        let handle = driver.create_texture()?;
        driver.bind_texture_2d(handle);

        driver.tex_parameter_2d(glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
        driver.tex_parameter_2d(glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
        driver.tex_parameter_2d(glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
        driver.tex_parameter_2d(glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);

        driver.tex_image_2d_rgba8(width, height, pixels.as_raw());
        driver.bind_texture_2d(GpuHandle::INVALID);

        // The CPU copy is no longer needed once the driver has it
        drop(pixels);

        Ok(Self {
            driver,
            handle,
            width,
            height,
        })
    }

    /// Bind to texture unit `slot` (0..32).
    pub fn bind(&self, slot: u32) -> Result<()> {
        if slot >= TEXTURE_SLOTS {
            return Err(RenderError::TextureSlot { slot });
        }
        self.driver.active_texture(slot);
        self.driver.bind_texture_2d(self.handle);
        Ok(())
    }

    pub fn unbind(&self) {
        self.driver.bind_texture_2d(GpuHandle::INVALID);
    }

    pub fn handle(&self) -> GpuHandle {
        self.handle
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl Drop for Texture2D {
    fn drop(&mut self) {
        self.driver.delete_texture(self.handle);
    }
}
