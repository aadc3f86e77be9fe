//! Static description of the eight runtime slots and their C signatures.
//!
//! Code generators use these descriptors to declare the exported entry
//! points; the binding table uses them to name slots in diagnostics.

use strum::{Display, EnumCount, EnumIter, IntoStaticStr};

/// One entry of the runtime binding table, in table order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumCount, EnumIter, IntoStaticStr,
)]
pub enum Slot {
    #[strum(serialize = "dict_new")]
    DictNew,
    #[strum(serialize = "dict_getindex")]
    DictGetIndex,
    #[strum(serialize = "dict_setindex")]
    DictSetIndex,
    #[strum(serialize = "symbol_from_text")]
    SymbolFromText,
    #[strum(serialize = "box_int64")]
    BoxInt64,
    #[strum(serialize = "box_float64")]
    BoxFloat64,
    #[strum(serialize = "unbox_int64")]
    UnboxInt64,
    #[strum(serialize = "unbox_float64")]
    UnboxFloat64,
}

/// ABI-level type of a parameter or return value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbiType {
    /// Opaque host handle (`void *`).
    Handle,
    /// NUL-terminated text (`const char *`).
    CStr,
    /// `int64_t`
    I64,
    /// `double`
    F64,
    /// No value. Only valid as a return type.
    Void,
}

impl AbiType {
    /// True for types that travel as a target pointer.
    pub fn is_pointer(self) -> bool {
        matches!(self, AbiType::Handle | AbiType::CStr)
    }
}

/// C signature of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbiSignature {
    pub params: &'static [AbiType],
    pub ret: AbiType,
}

impl Slot {
    /// Position of the slot in the table and in `nbjit_init_runtime`'s
    /// argument list.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Exported C symbol of the forwarding entry point.
    pub fn symbol(self) -> &'static str {
        match self {
            Slot::DictNew => "nbjit_dict_new",
            Slot::DictGetIndex => "nbjit_dict_getindex",
            Slot::DictSetIndex => "nbjit_dict_setindex_bang",
            Slot::SymbolFromText => "nbjit_symbol_from_cstr",
            Slot::BoxInt64 => "nbjit_box_int64",
            Slot::BoxFloat64 => "nbjit_box_float64",
            Slot::UnboxInt64 => "nbjit_unbox_int64",
            Slot::UnboxFloat64 => "nbjit_unbox_float64",
        }
    }

    pub fn signature(self) -> AbiSignature {
        use AbiType::*;
        let (params, ret): (&'static [AbiType], AbiType) = match self {
            Slot::DictNew => (&[], Handle),
            Slot::DictGetIndex => (&[Handle, Handle], Handle),
            // dict, value, key
            Slot::DictSetIndex => (&[Handle, Handle, Handle], Void),
            Slot::SymbolFromText => (&[CStr], Handle),
            Slot::BoxInt64 => (&[I64], Handle),
            Slot::BoxFloat64 => (&[F64], Handle),
            Slot::UnboxInt64 => (&[Handle], I64),
            Slot::UnboxFloat64 => (&[Handle], F64),
        };
        AbiSignature { params, ret }
    }
}

/// Symbol of the initializer entry point.
pub const INIT_SYMBOL: &str = "nbjit_init_runtime";
