//! The binding table: one published snapshot of [`RuntimeBindings`].
//!
//! Installation builds an immutable snapshot on the heap and publishes it
//! with a single atomic swap. Forwarding calls do one acquire load and call
//! through the snapshot they loaded, so a call racing with re-installation
//! sees either the old or the new bindings, never a mix.
//!
//! Superseded snapshots are parked on a retired list and only freed when the
//! table itself is dropped. The process-wide table is a `static`, so its
//! snapshots live until exit.

use std::ffi::c_char;
use std::ptr;
use std::sync::atomic::{AtomicPtr, AtomicU64, Ordering};
use std::sync::Mutex;

use crate::bindings::{RawBindings, RuntimeBindings};
use crate::error::BindingError;
use crate::handle::Handle;
use crate::slot::Slot;

pub struct BindingTable {
    current: AtomicPtr<RuntimeBindings>,
    generation: AtomicU64,
    retired: Mutex<Vec<Box<RuntimeBindings>>>,
}

impl BindingTable {
    /// An empty, uninitialized table.
    pub const fn new() -> Self {
        Self {
            current: AtomicPtr::new(ptr::null_mut()),
            generation: AtomicU64::new(0),
            retired: Mutex::new(Vec::new()),
        }
    }

    /// Publish a complete set of bindings, replacing any previous installation.
    /// Returns the new generation (1 for the first installation).
    ///
    /// Each superseded snapshot is kept until the table is dropped, so every
    /// re-installation on the process-wide table holds on to one more
    /// snapshot for the life of the process.
    pub fn install(&self, bindings: RuntimeBindings) -> u64 {
        let fresh = Box::into_raw(Box::new(bindings));
        let previous = self.current.swap(fresh, Ordering::AcqRel);
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        if previous.is_null() {
            tracing::info!(generation, "runtime bindings installed");
        } else {
            // SAFETY: `previous` came from Box::into_raw in an earlier install
            // and was just unlinked, so this is its only owner. It is parked,
            // not freed, because readers may still be calling through it.
            let previous = unsafe { Box::from_raw(previous) };
            self.retire(previous);
            tracing::info!(generation, "runtime bindings replaced");
        }
        generation
    }

    /// Validate host entries and publish them. Null entries leave the current
    /// installation untouched.
    ///
    /// # Safety
    ///
    /// Same contract as [`RuntimeBindings::from_raw`].
    pub unsafe fn install_raw(&self, raw: RawBindings) -> Result<u64, BindingError> {
        match RuntimeBindings::from_raw(raw) {
            Ok(bindings) => Ok(self.install(bindings)),
            Err(err) => {
                tracing::warn!(slot = %err.slot(), "rejected runtime bindings: {err}");
                Err(err)
            }
        }
    }

    fn retire(&self, snapshot: Box<RuntimeBindings>) {
        let mut retired = match self.retired.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        retired.push(snapshot);
    }

    pub fn is_initialized(&self) -> bool {
        !self.current.load(Ordering::Acquire).is_null()
    }

    /// Number of successful installations so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// The currently published snapshot, or the uninitialized-binding fault
    /// for `slot`.
    pub fn snapshot(&self, slot: Slot) -> Result<&RuntimeBindings, BindingError> {
        let current = self.current.load(Ordering::Acquire);
        // SAFETY: non-null pointers in `current` come from Box::into_raw and
        // are never freed while `self` is alive (see `retire`).
        unsafe { current.as_ref() }.ok_or(BindingError::Uninitialized { slot })
    }

    pub fn create_dictionary(&self) -> Result<Handle, BindingError> {
        let b = self.snapshot(Slot::DictNew)?;
        // SAFETY: installer guaranteed the entry is callable (from_raw contract).
        Ok(unsafe { (b.dict_new)() })
    }

    pub fn dictionary_get(&self, dict: Handle, key: Handle) -> Result<Handle, BindingError> {
        let b = self.snapshot(Slot::DictGetIndex)?;
        // SAFETY: see create_dictionary.
        Ok(unsafe { (b.dict_getindex)(dict, key) })
    }

    /// Store `value` under `key`. Argument order follows the host's
    /// `setindex!(dict, value, key)`.
    pub fn dictionary_set(
        &self,
        dict: Handle,
        value: Handle,
        key: Handle,
    ) -> Result<(), BindingError> {
        let b = self.snapshot(Slot::DictSetIndex)?;
        // SAFETY: see create_dictionary.
        unsafe { (b.dict_setindex)(dict, value, key) };
        Ok(())
    }

    /// Forward a NUL-terminated string pointer. The text is not read here.
    pub fn intern_symbol(&self, text: *const c_char) -> Result<Handle, BindingError> {
        let b = self.snapshot(Slot::SymbolFromText)?;
        // SAFETY: see create_dictionary.
        Ok(unsafe { (b.symbol_from_text)(text) })
    }

    pub fn box_integer(&self, value: i64) -> Result<Handle, BindingError> {
        let b = self.snapshot(Slot::BoxInt64)?;
        // SAFETY: see create_dictionary.
        Ok(unsafe { (b.box_int64)(value) })
    }

    pub fn box_float(&self, value: f64) -> Result<Handle, BindingError> {
        let b = self.snapshot(Slot::BoxFloat64)?;
        // SAFETY: see create_dictionary.
        Ok(unsafe { (b.box_float64)(value) })
    }

    pub fn unbox_integer(&self, boxed: Handle) -> Result<i64, BindingError> {
        let b = self.snapshot(Slot::UnboxInt64)?;
        // SAFETY: see create_dictionary.
        Ok(unsafe { (b.unbox_int64)(boxed) })
    }

    pub fn unbox_float(&self, boxed: Handle) -> Result<f64, BindingError> {
        let b = self.snapshot(Slot::UnboxFloat64)?;
        // SAFETY: see create_dictionary.
        Ok(unsafe { (b.unbox_float64)(boxed) })
    }
}

impl Default for BindingTable {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BindingTable {
    fn drop(&mut self) {
        let current = *self.current.get_mut();
        if !current.is_null() {
            // SAFETY: exclusive access; no reader can hold the snapshot.
            drop(unsafe { Box::from_raw(current) });
        }
    }
}

/// The table behind the exported C entry points.
pub static GLOBAL: BindingTable = BindingTable::new();
