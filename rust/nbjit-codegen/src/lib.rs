//! Cranelift side of the nbjit runtime bindings.
//!
//! Generated code reaches the host runtime only through the `nbjit_*` entry
//! points exported by `nbjit-rt`. This crate describes those entry points to
//! Cranelift, declares them as imports in object and JIT modules, and emits
//! calls to them.

pub mod context;
pub mod emit;
pub mod ffi;
pub mod jit;
pub mod settings;

pub use emit::CodegenError;
pub use ffi::{
    declare_runtime_imports, CallingConvention, ExternFunction, RuntimeCalls, RuntimeImports,
};
pub use jit::{JitError, RuntimeJit};
pub use settings::{CodegenSettings, OptLevel};
