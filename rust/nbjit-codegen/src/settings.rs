//! Compilation settings shared by the object and JIT backends.

use cranelift_codegen::settings::{self, Configurable};

use crate::emit::CodegenError;
use crate::ffi::CallingConvention;

/// Optimisation level for generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptLevel {
    /// No optimisation (fastest compile, slowest code).
    None,
    /// Optimise for execution speed.
    #[default]
    Speed,
    /// Optimise for both speed and code size.
    SpeedAndSize,
}

impl OptLevel {
    /// Value of Cranelift's `opt_level` flag.
    pub fn as_flag(self) -> &'static str {
        match self {
            OptLevel::None => "none",
            OptLevel::Speed => "speed",
            OptLevel::SpeedAndSize => "speed_and_size",
        }
    }
}

/// Settings controlling how generated code is compiled and how it calls the
/// runtime entry points.
#[derive(Debug, Clone, Default)]
pub struct CodegenSettings {
    pub opt_level: OptLevel,
    /// Optional target triple (e.g. `"x86_64-unknown-linux-gnu"`) for object
    /// emission. If `None`, the host platform is used. The JIT always targets
    /// the host.
    pub target: Option<String>,
    /// Convention used for calls into the runtime entry points.
    pub calling_convention: CallingConvention,
}

impl CodegenSettings {
    /// Cranelift shared flags for these settings. `jit` selects the flags
    /// an in-process module needs (non-PIC, absolute libcalls).
    pub(crate) fn flags(&self, jit: bool) -> Result<settings::Flags, CodegenError> {
        let mut flag_builder = settings::builder();
        let set = |b: &mut settings::Builder, name: &str, value: &str| {
            b.set(name, value).map_err(|e| {
                CodegenError::TargetError(format!("failed to set {name}={value}: {e}"))
            })
        };
        set(&mut flag_builder, "opt_level", self.opt_level.as_flag())?;
        if jit {
            set(&mut flag_builder, "use_colocated_libcalls", "false")?;
            set(&mut flag_builder, "is_pic", "false")?;
        }
        Ok(settings::Flags::new(flag_builder))
    }
}
