//! Exported C entry points.
//!
//! The host calls `nbjit_init_runtime` once during startup; native code calls
//! the eight forwarding stubs. A forwarding stub reached before installation
//! is a fatal contract violation and aborts the process: its callers rely on
//! the returned handle being valid, so there is no sentinel to return.

use std::ffi::{c_char, c_int};

use crate::bindings::{
    BoxFloat64Fn, BoxInt64Fn, DictGetIndexFn, DictNewFn, DictSetIndexFn, RawBindings,
    SymbolFromTextFn, UnboxFloat64Fn, UnboxInt64Fn,
};
use crate::error::BindingError;
use crate::handle::Handle;
use crate::slot::Slot;
use crate::table::GLOBAL;

#[cold]
#[inline(never)]
fn fatal(err: BindingError) -> ! {
    tracing::error!(slot = %err.slot(), symbol = err.slot().symbol(), "{err}");
    eprintln!("nbjit: fatal: {err}");
    std::process::abort()
}

#[inline]
fn or_abort<T>(result: Result<T, BindingError>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => fatal(err),
    }
}

/// Install the host's implementations.
///
/// Returns 0 on success. If an entry is null nothing is installed and the
/// return value is 1 + the zero-based position of the first null argument.
///
/// # Safety
///
/// Each non-null entry must have the C signature of its slot and be callable
/// until the process exits or the bindings are replaced.
#[allow(clippy::too_many_arguments)]
#[no_mangle]
pub unsafe extern "C" fn nbjit_init_runtime(
    dict_new: Option<DictNewFn>,
    dict_getindex: Option<DictGetIndexFn>,
    dict_setindex_bang: Option<DictSetIndexFn>,
    symbol_from_cstr: Option<SymbolFromTextFn>,
    box_int64: Option<BoxInt64Fn>,
    box_float64: Option<BoxFloat64Fn>,
    unbox_int64: Option<UnboxInt64Fn>,
    unbox_float64: Option<UnboxFloat64Fn>,
) -> c_int {
    let raw = RawBindings {
        dict_new,
        dict_getindex,
        dict_setindex: dict_setindex_bang,
        symbol_from_text: symbol_from_cstr,
        box_int64,
        box_float64,
        unbox_int64,
        unbox_float64,
    };
    match GLOBAL.install_raw(raw) {
        Ok(_) => 0,
        Err(err) => 1 + err.slot().index() as c_int,
    }
}

#[no_mangle]
pub extern "C" fn nbjit_runtime_is_initialized() -> bool {
    GLOBAL.is_initialized()
}

/// # Safety
///
/// Forwarded to the host implementation; its contract applies.
#[no_mangle]
pub unsafe extern "C" fn nbjit_dict_new() -> Handle {
    or_abort(GLOBAL.create_dictionary())
}

/// # Safety
///
/// Forwarded to the host implementation; its contract applies.
#[no_mangle]
pub unsafe extern "C" fn nbjit_dict_getindex(dict: Handle, key: Handle) -> Handle {
    or_abort(GLOBAL.dictionary_get(dict, key))
}

/// # Safety
///
/// Forwarded to the host implementation; its contract applies.
#[no_mangle]
pub unsafe extern "C" fn nbjit_dict_setindex_bang(dict: Handle, value: Handle, key: Handle) {
    or_abort(GLOBAL.dictionary_set(dict, value, key))
}

/// # Safety
///
/// `text` is forwarded as-is; the host implementation decides what it must
/// point to (normally a NUL-terminated string).
#[no_mangle]
pub unsafe extern "C" fn nbjit_symbol_from_cstr(text: *const c_char) -> Handle {
    or_abort(GLOBAL.intern_symbol(text))
}

/// # Safety
///
/// Forwarded to the host implementation; its contract applies.
#[no_mangle]
pub unsafe extern "C" fn nbjit_box_int64(value: i64) -> Handle {
    or_abort(GLOBAL.box_integer(value))
}

/// # Safety
///
/// Forwarded to the host implementation; its contract applies.
#[no_mangle]
pub unsafe extern "C" fn nbjit_box_float64(value: f64) -> Handle {
    or_abort(GLOBAL.box_float(value))
}

/// # Safety
///
/// Forwarded to the host implementation; its contract applies.
#[no_mangle]
pub unsafe extern "C" fn nbjit_unbox_int64(boxed: Handle) -> i64 {
    or_abort(GLOBAL.unbox_integer(boxed))
}

/// # Safety
///
/// Forwarded to the host implementation; its contract applies.
#[no_mangle]
pub unsafe extern "C" fn nbjit_unbox_float64(boxed: Handle) -> f64 {
    or_abort(GLOBAL.unbox_float(boxed))
}

/// Addresses of the exported forwarding stubs, in slot order. Lets an
/// in-process JIT resolve the stub symbols without going through the
/// dynamic linker.
pub fn stub_addresses() -> [(Slot, *const u8); 8] {
    [
        (Slot::DictNew, nbjit_dict_new as *const u8),
        (Slot::DictGetIndex, nbjit_dict_getindex as *const u8),
        (Slot::DictSetIndex, nbjit_dict_setindex_bang as *const u8),
        (Slot::SymbolFromText, nbjit_symbol_from_cstr as *const u8),
        (Slot::BoxInt64, nbjit_box_int64 as *const u8),
        (Slot::BoxFloat64, nbjit_box_float64 as *const u8),
        (Slot::UnboxInt64, nbjit_unbox_int64 as *const u8),
        (Slot::UnboxFloat64, nbjit_unbox_float64 as *const u8),
    ]
}
