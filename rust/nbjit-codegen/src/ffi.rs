//! C calling-convention bridge to the runtime entry points.
//!
//! Each runtime slot is exported by `nbjit-rt` as a plain C function
//! (`nbjit_box_int64`, ...). Generated code calls them like any other
//! imported C symbol: [`declare_runtime_imports`] registers all eight with
//! `Linkage::Import` in a Cranelift module, [`RuntimeImports::declare_in_func`]
//! makes them callable from one function, and [`RuntimeCalls::emit`] emits the
//! call instruction.
//!
//! Type lowering:
//!
//! | ABI type  | Cranelift type |
//! |-----------|----------------|
//! | `Handle`  | pointer        |
//! | `CStr`    | pointer        |
//! | `I64`     | `i64`          |
//! | `F64`     | `f64`          |
//! | `Void`    | no return      |

use cranelift_codegen::ir::types;
use cranelift_codegen::ir::{
    AbiParam, FuncRef, Function, InstBuilder, Signature, Type as ClifType, Value,
};
use cranelift_codegen::isa::CallConv;
use cranelift_frontend::FunctionBuilder;
use cranelift_module::{FuncId, Linkage, Module};
use nbjit_rt::{AbiType, Slot};
use strum::{EnumCount, IntoEnumIterator};
use target_lexicon::Triple;

use crate::emit::CodegenError;

/// Calling convention selector for runtime calls.
///
/// Maps to Cranelift's [`CallConv`] variants that correspond to real platform
/// ABIs. The `Auto` variant picks the right convention for the target triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallingConvention {
    /// Platform-default C calling convention for the target.
    #[default]
    Auto,
    /// System V AMD64 ABI (Linux, FreeBSD, macOS x86_64).
    SystemV,
    /// Windows x64 calling convention.
    WindowsFastcall,
    /// Apple ARM64 calling convention (macOS/iOS arm64).
    AppleAarch64,
}

impl CallingConvention {
    pub fn to_call_conv(self, triple: &Triple) -> CallConv {
        match self {
            CallingConvention::Auto => CallConv::triple_default(triple),
            CallingConvention::SystemV => CallConv::SystemV,
            CallingConvention::WindowsFastcall => CallConv::WindowsFastcall,
            CallingConvention::AppleAarch64 => CallConv::AppleAarch64,
        }
    }
}

/// Cranelift type of an ABI type, or `None` for `Void`.
pub fn lower_abi_type(ty: AbiType, pointer_type: ClifType) -> Option<ClifType> {
    match ty {
        AbiType::Handle | AbiType::CStr => Some(pointer_type),
        AbiType::I64 => Some(types::I64),
        AbiType::F64 => Some(types::F64),
        AbiType::Void => None,
    }
}

/// Description of an imported C function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternFunction {
    /// Symbol name as exported by the runtime library.
    pub name: String,
    pub param_types: Vec<AbiType>,
    pub return_type: AbiType,
}

impl ExternFunction {
    pub fn new(name: impl Into<String>, param_types: Vec<AbiType>, return_type: AbiType) -> Self {
        Self {
            name: name.into(),
            param_types,
            return_type,
        }
    }

    /// The exported entry point of a runtime slot.
    pub fn for_slot(slot: Slot) -> Self {
        let sig = slot.signature();
        Self::new(slot.symbol(), sig.params.to_vec(), sig.ret)
    }

    pub fn build_signature(&self, call_conv: CallConv, pointer_type: ClifType) -> Signature {
        let mut sig = Signature::new(call_conv);
        for param in &self.param_types {
            if let Some(ty) = lower_abi_type(*param, pointer_type) {
                sig.params.push(AbiParam::new(ty));
            }
        }
        if let Some(ty) = lower_abi_type(self.return_type, pointer_type) {
            sig.returns.push(AbiParam::new(ty));
        }
        sig
    }
}

/// Declare an imported function in any Cranelift module.
pub fn declare_extern<M: Module>(
    module: &mut M,
    call_conv: CallConv,
    ext_fn: &ExternFunction,
) -> Result<FuncId, CodegenError> {
    let pointer_type = module.isa().pointer_type();
    let sig = ext_fn.build_signature(call_conv, pointer_type);
    module
        .declare_function(&ext_fn.name, Linkage::Import, &sig)
        .map_err(|e| {
            CodegenError::LoweringError(format!(
                "failed to declare extern function '{}': {e}",
                ext_fn.name
            ))
        })
}

/// Module-level ids of the eight runtime entry points, indexed by slot.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeImports {
    ids: [FuncId; Slot::COUNT],
}

/// Declare every runtime entry point as an import.
pub fn declare_runtime_imports<M: Module>(
    module: &mut M,
    call_conv: CallConv,
) -> Result<RuntimeImports, CodegenError> {
    let mut ids = Vec::with_capacity(Slot::COUNT);
    for slot in Slot::iter() {
        ids.push(declare_extern(module, call_conv, &ExternFunction::for_slot(slot))?);
    }
    let ids: [FuncId; Slot::COUNT] = ids
        .try_into()
        .map_err(|_| CodegenError::LoweringError("runtime slot count mismatch".into()))?;
    Ok(RuntimeImports { ids })
}

impl RuntimeImports {
    pub fn func_id(&self, slot: Slot) -> FuncId {
        self.ids[slot.index()]
    }

    /// Import every entry point into `func`. Must be called before a
    /// `FunctionBuilder` takes the function.
    pub fn declare_in_func<M: Module>(&self, module: &mut M, func: &mut Function) -> RuntimeCalls {
        let refs = Slot::iter()
            .map(|slot| module.declare_func_in_func(self.func_id(slot), func))
            .collect();
        RuntimeCalls { refs }
    }
}

/// Function-local references to the runtime entry points.
#[derive(Debug, Clone)]
pub struct RuntimeCalls {
    refs: Vec<FuncRef>,
}

impl RuntimeCalls {
    pub fn func_ref(&self, slot: Slot) -> FuncRef {
        self.refs[slot.index()]
    }

    /// Emit a call to `slot`'s entry point.
    ///
    /// Returns the result value, or `None` for `dict_setindex`.
    pub fn emit(
        &self,
        builder: &mut FunctionBuilder,
        slot: Slot,
        args: &[Value],
    ) -> Result<Option<Value>, CodegenError> {
        let sig = slot.signature();
        if args.len() != sig.params.len() {
            return Err(CodegenError::LoweringError(format!(
                "{} expects {} argument(s), got {}",
                slot.symbol(),
                sig.params.len(),
                args.len()
            )));
        }
        let call = builder.ins().call(self.func_ref(slot), args);
        Ok(builder.inst_results(call).first().copied())
    }
}
