//! Ahead-of-time compilation context: ISA lookup and object module creation.
//!
//! Object files produced here reference the runtime entry points as undefined
//! symbols, resolved when the host links against `nbjit-rt`.

use std::sync::Arc;

use cranelift_codegen::isa::{self, CallConv, TargetIsa};
use cranelift_object::{ObjectBuilder, ObjectModule};
use target_lexicon::Triple;

use crate::emit::CodegenError;
use crate::settings::CodegenSettings;

/// Holds the Cranelift compilation state for a single object-emission session.
pub struct CodegenContext {
    pub isa: Arc<dyn TargetIsa>,
    pub module: ObjectModule,
    call_conv: CallConv,
}

impl CodegenContext {
    /// Create a context for `settings.target`, or the host if unset.
    pub fn new(settings: &CodegenSettings) -> Result<Self, CodegenError> {
        let triple = match &settings.target {
            Some(t) => t
                .parse::<Triple>()
                .map_err(|e| CodegenError::TargetError(format!("invalid target triple: {e}")))?,
            None => Triple::host(),
        };

        let isa_builder = isa::lookup(triple.clone())
            .map_err(|e| CodegenError::TargetError(format!("unsupported target {triple}: {e}")))?;
        let isa = isa_builder
            .finish(settings.flags(false)?)
            .map_err(|e| CodegenError::TargetError(format!("failed to build ISA: {e}")))?;

        let obj_builder = ObjectBuilder::new(
            isa.clone(),
            "nbjit_module",
            cranelift_module::default_libcall_names(),
        )
        .map_err(|e| CodegenError::TargetError(format!("failed to create ObjectBuilder: {e}")))?;

        let call_conv = settings.calling_convention.to_call_conv(&triple);
        Ok(Self {
            isa,
            module: ObjectModule::new(obj_builder),
            call_conv,
        })
    }

    /// Return the pointer type for the current target (e.g. I64 on 64-bit).
    pub fn pointer_type(&self) -> cranelift_codegen::ir::Type {
        self.isa.pointer_type()
    }

    /// Convention used for calls into the runtime entry points.
    pub fn call_conv(&self) -> CallConv {
        self.call_conv
    }
}
