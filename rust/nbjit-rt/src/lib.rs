//! nbjit runtime bindings.
//!
//! A fixed C surface (`nbjit_dict_new`, `nbjit_box_int64`, ...) for native
//! code compiled by the host runtime. None of the entry points implement
//! anything: each forwards to a function the host installs at startup with
//! `nbjit_init_runtime`. Handles are opaque and owned by the host.
//!
//! Rust callers can use [`BindingTable`] directly; forwarding through a table
//! returns [`BindingError::Uninitialized`] instead of aborting.

pub mod abi;
pub mod bindings;
pub mod error;
pub mod handle;
pub mod slot;
pub mod table;

pub use bindings::{RawBindings, RuntimeBindings};
pub use error::BindingError;
pub use handle::Handle;
pub use slot::{AbiSignature, AbiType, Slot, INIT_SYMBOL};
pub use table::{BindingTable, GLOBAL};
