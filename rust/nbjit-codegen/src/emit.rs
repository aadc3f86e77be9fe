//! Object file emission.
//!
//! Converts a finished Cranelift object module into native object bytes.

use std::path::Path;

use cranelift_object::ObjectModule;
use thiserror::Error;

/// Errors that can occur during code generation.
#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("target error: {0}")]
    TargetError(String),

    #[error("lowering error: {0}")]
    LoweringError(String),

    #[error("emission error: {0}")]
    EmissionError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Finish the module and return the raw object file bytes.
pub fn emit_object(module: ObjectModule) -> Result<Vec<u8>, CodegenError> {
    let product = module.finish();
    let bytes = product
        .emit()
        .map_err(|e| CodegenError::EmissionError(format!("failed to emit object file: {e}")))?;
    Ok(bytes)
}

/// Finish the module and write the object file to disk.
pub fn emit_to_file(module: ObjectModule, path: &Path) -> Result<(), CodegenError> {
    let bytes = emit_object(module)?;
    std::fs::write(path, &bytes)?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "wrote object file");
    Ok(())
}
