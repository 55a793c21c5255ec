//! Recoverable codegen errors.
//!
//! Only failures caused by the environment or by LLVM itself end up here.
//! Invariant violations inside the backend go through [`crate::ice`].

use std::fmt;
use std::path::Path;

/// Error type for finishing and writing out a module.
#[derive(Debug, Clone)]
pub enum CodegenError {
    /// `Module::verify` rejected the generated IR.
    Verification { module: String, message: String },
    /// Failed to write textual IR.
    IrEmission { path: String, message: String },
}

impl CodegenError {
    pub(crate) fn ir_emission(path: &Path, message: impl Into<String>) -> Self {
        Self::IrEmission {
            path: path.to_string_lossy().into_owned(),
            message: message.into(),
        }
    }
}

impl fmt::Display for CodegenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verification { module, message } => {
                write!(f, "module '{module}' failed verification: {message}")
            }
            Self::IrEmission { path, message } => {
                write!(f, "failed to emit LLVM IR file '{path}': {message}")
            }
        }
    }
}

impl std::error::Error for CodegenError {}
