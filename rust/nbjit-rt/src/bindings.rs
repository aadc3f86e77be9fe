//! Host-supplied implementations of the runtime slots.
//!
//! [`RawBindings`] mirrors the argument list of `nbjit_init_runtime`: eight
//! nullable C function pointers, each typed with the exact signature of its
//! slot. [`RuntimeBindings`] is the validated form the table publishes; it
//! can only be built once every entry is present.

use std::ffi::c_char;

use strum::IntoEnumIterator;

use crate::error::BindingError;
use crate::handle::Handle;
use crate::slot::Slot;

pub type DictNewFn = unsafe extern "C" fn() -> Handle;
pub type DictGetIndexFn = unsafe extern "C" fn(dict: Handle, key: Handle) -> Handle;
pub type DictSetIndexFn = unsafe extern "C" fn(dict: Handle, value: Handle, key: Handle);
pub type SymbolFromTextFn = unsafe extern "C" fn(text: *const c_char) -> Handle;
pub type BoxInt64Fn = unsafe extern "C" fn(value: i64) -> Handle;
pub type BoxFloat64Fn = unsafe extern "C" fn(value: f64) -> Handle;
pub type UnboxInt64Fn = unsafe extern "C" fn(boxed: Handle) -> i64;
pub type UnboxFloat64Fn = unsafe extern "C" fn(boxed: Handle) -> f64;

/// Entries exactly as the host hands them over. `None` is a null pointer.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawBindings {
    pub dict_new: Option<DictNewFn>,
    pub dict_getindex: Option<DictGetIndexFn>,
    pub dict_setindex: Option<DictSetIndexFn>,
    pub symbol_from_text: Option<SymbolFromTextFn>,
    pub box_int64: Option<BoxInt64Fn>,
    pub box_float64: Option<BoxFloat64Fn>,
    pub unbox_int64: Option<UnboxInt64Fn>,
    pub unbox_float64: Option<UnboxFloat64Fn>,
}

impl RawBindings {
    /// First slot (in table order) whose entry is null.
    pub fn first_missing(&self) -> Option<Slot> {
        let present = [
            self.dict_new.is_some(),
            self.dict_getindex.is_some(),
            self.dict_setindex.is_some(),
            self.symbol_from_text.is_some(),
            self.box_int64.is_some(),
            self.box_float64.is_some(),
            self.unbox_int64.is_some(),
            self.unbox_float64.is_some(),
        ];
        Slot::iter().find(|slot| !present[slot.index()])
    }
}

/// A complete, validated set of slot implementations.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeBindings {
    pub(crate) dict_new: DictNewFn,
    pub(crate) dict_getindex: DictGetIndexFn,
    pub(crate) dict_setindex: DictSetIndexFn,
    pub(crate) symbol_from_text: SymbolFromTextFn,
    pub(crate) box_int64: BoxInt64Fn,
    pub(crate) box_float64: BoxFloat64Fn,
    pub(crate) unbox_int64: UnboxInt64Fn,
    pub(crate) unbox_float64: UnboxFloat64Fn,
}

impl RuntimeBindings {
    /// Validate host entries.
    ///
    /// # Safety
    ///
    /// Every entry must be safe to call with any argument values of its
    /// signature for as long as the bindings stay installed. Handles and text
    /// pointers are forwarded untouched, so their validity is the host's
    /// contract with its own callers.
    pub unsafe fn from_raw(raw: RawBindings) -> Result<Self, BindingError> {
        let missing = |slot| BindingError::NullEntry { slot };
        Ok(Self {
            dict_new: raw.dict_new.ok_or_else(|| missing(Slot::DictNew))?,
            dict_getindex: raw.dict_getindex.ok_or_else(|| missing(Slot::DictGetIndex))?,
            dict_setindex: raw.dict_setindex.ok_or_else(|| missing(Slot::DictSetIndex))?,
            symbol_from_text: raw
                .symbol_from_text
                .ok_or_else(|| missing(Slot::SymbolFromText))?,
            box_int64: raw.box_int64.ok_or_else(|| missing(Slot::BoxInt64))?,
            box_float64: raw.box_float64.ok_or_else(|| missing(Slot::BoxFloat64))?,
            unbox_int64: raw.unbox_int64.ok_or_else(|| missing(Slot::UnboxInt64))?,
            unbox_float64: raw.unbox_float64.ok_or_else(|| missing(Slot::UnboxFloat64))?,
        })
    }

    /// Entry address of a slot's implementation.
    pub fn entry_addr(&self, slot: Slot) -> usize {
        match slot {
            Slot::DictNew => self.dict_new as usize,
            Slot::DictGetIndex => self.dict_getindex as usize,
            Slot::DictSetIndex => self.dict_setindex as usize,
            Slot::SymbolFromText => self.symbol_from_text as usize,
            Slot::BoxInt64 => self.box_int64 as usize,
            Slot::BoxFloat64 => self.box_float64 as usize,
            Slot::UnboxInt64 => self.unbox_int64 as usize,
            Slot::UnboxFloat64 => self.unbox_float64 as usize,
        }
    }
}

impl From<RuntimeBindings> for RawBindings {
    fn from(b: RuntimeBindings) -> Self {
        RawBindings {
            dict_new: Some(b.dict_new),
            dict_getindex: Some(b.dict_getindex),
            dict_setindex: Some(b.dict_setindex),
            symbol_from_text: Some(b.symbol_from_text),
            box_int64: Some(b.box_int64),
            box_float64: Some(b.box_float64),
            unbox_int64: Some(b.unbox_int64),
            unbox_float64: Some(b.unbox_float64),
        }
    }
}
