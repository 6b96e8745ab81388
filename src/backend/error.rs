// Error types for the GL wrappers
//
// Library code returns `Result<T, RenderError>`. The demo binary wraps these
// in `anyhow` with extra context at each call site.

use std::path::PathBuf;
use thiserror::Error;

use super::driver::ShaderStage;

#[derive(Error, Debug)]
pub enum RenderError {
    /// The shader source file could not be read.
    #[error("Failed to read shader source {path:?}: {source}")]
    ShaderRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A shader stage failed to compile. The driver log has already been
    /// written to the error log.
    #[error("Failed to compile the {stage} shader")]
    Compile { stage: ShaderStage },

    /// The program failed to link.
    #[error("Failed to link shader program: {log}")]
    Link { log: String },

    /// The driver refused to create an object.
    #[error("Failed to create {kind}: {message}")]
    Allocation { kind: &'static str, message: String },

    /// The texture image could not be opened or decoded.
    #[error("Failed to decode texture {path:?}: {source}")]
    TextureDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Texture units are numbered 0..32.
    #[error("Texture slot {slot} is out of range (0..32)")]
    TextureSlot { slot: u32 },
}

pub type Result<T, E = RenderError> = std::result::Result<T, E>;
