//! In-process JIT whose generated code calls the runtime entry points.
//!
//! The JIT module's symbol table maps every `nbjit_*` import to the stub
//! compiled into this process, so calls from generated code land in the
//! process-wide binding table exactly like calls from linked native code.
//! The host must still install its bindings with `nbjit_init_runtime` before
//! running anything that reaches a stub.

use std::collections::HashMap;

use cranelift_codegen::ir::{AbiParam, Function, InstBuilder, UserFuncName, Value};
use cranelift_codegen::isa::CallConv;
use cranelift_frontend::{FunctionBuilder, FunctionBuilderContext};
use cranelift_jit::{JITBuilder, JITModule};
use cranelift_module::{FuncId, Linkage, Module};
use nbjit_rt::AbiType;
use thiserror::Error;

use crate::emit::CodegenError;
use crate::ffi::{declare_runtime_imports, lower_abi_type, RuntimeCalls, RuntimeImports};
use crate::settings::CodegenSettings;

/// Errors specific to JIT compilation.
#[derive(Debug, Error)]
pub enum JitError {
    #[error("JIT compile error: {0}")]
    CompileError(#[from] CodegenError),

    #[error("function not found: {0}")]
    FunctionNotFound(String),

    #[error("function not finalized: {0}")]
    NotFinalized(String),

    #[error("JIT module error: {0}")]
    ModuleError(String),
}

struct DefinedFunction {
    id: FuncId,
    finalized: bool,
}

/// A JIT module with the runtime entry points pre-declared.
pub struct RuntimeJit {
    module: JITModule,
    imports: RuntimeImports,
    call_conv: CallConv,
    functions: HashMap<String, DefinedFunction>,
}

impl RuntimeJit {
    pub fn new(settings: &CodegenSettings) -> Result<Self, JitError> {
        let isa_builder = cranelift_native::builder()
            .map_err(|e| JitError::ModuleError(format!("host ISA unavailable: {e}")))?;
        let isa = isa_builder
            .finish(settings.flags(true)?)
            .map_err(|e| JitError::ModuleError(format!("failed to build ISA: {e}")))?;
        let call_conv = settings
            .calling_convention
            .to_call_conv(isa.triple());

        let mut builder = JITBuilder::with_isa(isa, cranelift_module::default_libcall_names());
        for (slot, addr) in nbjit_rt::abi::stub_addresses() {
            tracing::debug!(symbol = slot.symbol(), "registering runtime stub");
            builder.symbol(slot.symbol(), addr);
        }

        let mut module = JITModule::new(builder);
        let imports = declare_runtime_imports(&mut module, call_conv)?;

        Ok(Self {
            module,
            imports,
            call_conv,
            functions: HashMap::new(),
        })
    }

    pub fn imports(&self) -> &RuntimeImports {
        &self.imports
    }

    /// Define an exported function. `body` receives the builder positioned in
    /// the entry block, the entry-block parameters and the runtime call table,
    /// and returns the value to return (`None` for `AbiType::Void`) from the
    /// block it leaves the builder in. Blocks it creates are sealed here.
    pub fn define_function<F>(
        &mut self,
        name: &str,
        params: &[AbiType],
        ret: AbiType,
        body: F,
    ) -> Result<FuncId, JitError>
    where
        F: FnOnce(
            &mut FunctionBuilder,
            &[Value],
            &RuntimeCalls,
        ) -> Result<Option<Value>, CodegenError>,
    {
        let pointer_type = self.module.isa().pointer_type();
        let mut sig = self.module.make_signature();
        sig.call_conv = self.call_conv;
        for param in params {
            let ty = lower_abi_type(*param, pointer_type).ok_or_else(|| {
                CodegenError::LoweringError(format!("{name}: void is not a parameter type"))
            })?;
            sig.params.push(AbiParam::new(ty));
        }
        if let Some(ty) = lower_abi_type(ret, pointer_type) {
            sig.returns.push(AbiParam::new(ty));
        }

        let mut func = Function::with_name_signature(UserFuncName::default(), sig);
        let calls = self.imports.declare_in_func(&mut self.module, &mut func);

        let mut fb_ctx = FunctionBuilderContext::new();
        {
            let mut builder = FunctionBuilder::new(&mut func, &mut fb_ctx);
            let entry = builder.create_block();
            builder.append_block_params_for_function_params(entry);
            builder.switch_to_block(entry);
            builder.seal_block(entry);
            let args = builder.block_params(entry).to_vec();

            let result = body(&mut builder, &args, &calls)?;
            match (result, ret) {
                (None, AbiType::Void) => {
                    builder.ins().return_(&[]);
                }
                (Some(v), ret) if ret != AbiType::Void => {
                    builder.ins().return_(&[v]);
                }
                _ => {
                    return Err(CodegenError::LoweringError(format!(
                        "{name}: body result does not match return type {ret:?}"
                    ))
                    .into());
                }
            }
            builder.seal_all_blocks();
            builder.finalize();
        }

        // Declared only once the body built, so a failed definition leaves
        // the name free.
        let id = self
            .module
            .declare_function(name, Linkage::Export, &func.signature)
            .map_err(|e| {
                CodegenError::LoweringError(format!("declare_function({name}): {e}"))
            })?;
        func.name = UserFuncName::user(0, id.as_u32());

        let mut ctx = cranelift_codegen::Context::for_function(func);
        self.module
            .define_function(id, &mut ctx)
            .map_err(|e| CodegenError::LoweringError(format!("define_function({name}): {e}")))?;

        self.functions
            .insert(name.to_string(), DefinedFunction { id, finalized: false });
        Ok(id)
    }

    /// Make every defined function executable.
    pub fn finalize(&mut self) -> Result<(), JitError> {
        self.module
            .finalize_definitions()
            .map_err(|e| JitError::ModuleError(format!("finalize_definitions failed: {e}")))?;
        for f in self.functions.values_mut() {
            f.finalized = true;
        }
        tracing::debug!(functions = self.functions.len(), "JIT module finalized");
        Ok(())
    }

    /// Entry address of a finalized function. Callers transmute it to the
    /// `extern "C"` type matching the signature it was defined with.
    pub fn function_ptr(&self, name: &str) -> Result<*const u8, JitError> {
        let f = self
            .functions
            .get(name)
            .ok_or_else(|| JitError::FunctionNotFound(name.to_string()))?;
        if !f.finalized {
            return Err(JitError::NotFinalized(name.to_string()));
        }
        Ok(self.module.get_finalized_function(f.id))
    }
}
