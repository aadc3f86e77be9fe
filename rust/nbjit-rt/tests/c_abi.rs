//! The exported C surface backed by the process-wide table.
//!
//! The global table can only move forward, so the lifecycle is checked in a
//! single test. The abort path runs in a child process.

use std::ffi::c_char;
use std::process::Command;

use nbjit_rt::abi::*;
use nbjit_rt::{Handle, Slot, GLOBAL};
use strum::IntoEnumIterator;

const ABORT_CHILD_ENV: &str = "NBJIT_ABORT_CHILD";

unsafe extern "C" fn dict_new() -> Handle {
    Handle::from_addr(0x100)
}
unsafe extern "C" fn dict_new_v2() -> Handle {
    Handle::from_addr(0x200)
}
unsafe extern "C" fn dict_getindex(dict: Handle, key: Handle) -> Handle {
    Handle::from_addr(dict.addr() ^ key.addr())
}
unsafe extern "C" fn dict_setindex(_: Handle, _: Handle, _: Handle) {}
unsafe extern "C" fn symbol(text: *const c_char) -> Handle {
    Handle::from_raw(text as *mut _)
}
unsafe extern "C" fn box_int64(v: i64) -> Handle {
    Handle::from_addr(!(v as usize))
}
unsafe extern "C" fn box_float64(v: f64) -> Handle {
    Handle::from_addr(v.to_bits() as usize)
}
unsafe extern "C" fn unbox_int64(h: Handle) -> i64 {
    !h.addr() as i64
}
unsafe extern "C" fn unbox_float64(h: Handle) -> f64 {
    f64::from_bits(h.addr() as u64)
}

#[test]
fn exported_surface_lifecycle() {
    unsafe {
        assert!(!nbjit_runtime_is_initialized());

        // A null entry is rejected and nothing is installed.
        let status = nbjit_init_runtime(
            Some(dict_new),
            Some(dict_getindex),
            Some(dict_setindex),
            None,
            Some(box_int64),
            Some(box_float64),
            Some(unbox_int64),
            Some(unbox_float64),
        );
        assert_eq!(status, 1 + Slot::SymbolFromText.index() as i32);
        assert!(!nbjit_runtime_is_initialized());

        let status = nbjit_init_runtime(
            Some(dict_new),
            Some(dict_getindex),
            Some(dict_setindex),
            Some(symbol),
            Some(box_int64),
            Some(box_float64),
            Some(unbox_int64),
            Some(unbox_float64),
        );
        assert_eq!(status, 0);
        assert!(nbjit_runtime_is_initialized());
        assert_eq!(GLOBAL.generation(), 1);

        let dict = nbjit_dict_new();
        assert_eq!(dict, Handle::from_addr(0x100));
        assert_eq!(
            nbjit_dict_getindex(dict, Handle::from_addr(0x1)),
            Handle::from_addr(0x101)
        );
        nbjit_dict_setindex_bang(dict, Handle::from_addr(2), Handle::from_addr(3));

        let text = c"hello";
        assert_eq!(
            nbjit_symbol_from_cstr(text.as_ptr()).as_ptr() as *const c_char,
            text.as_ptr()
        );

        for v in [i64::MIN, -1, 0, 42, i64::MAX] {
            assert_eq!(nbjit_unbox_int64(nbjit_box_int64(v)), v);
        }
        assert_eq!(nbjit_unbox_float64(nbjit_box_float64(-3.25)), -3.25);

        let status = nbjit_init_runtime(
            Some(dict_new_v2),
            Some(dict_getindex),
            Some(dict_setindex),
            Some(symbol),
            Some(box_int64),
            Some(box_float64),
            Some(unbox_int64),
            Some(unbox_float64),
        );
        assert_eq!(status, 0);
        assert_eq!(GLOBAL.generation(), 2);
        assert_eq!(nbjit_dict_new(), Handle::from_addr(0x200));
    }
}

#[test]
fn stub_addresses_cover_every_slot() {
    let stubs = stub_addresses();
    for (i, (slot, addr)) in stubs.iter().enumerate() {
        assert_eq!(slot.index(), i);
        assert!(!addr.is_null());
    }
    assert_eq!(stubs[Slot::BoxInt64.index()].1, nbjit_box_int64 as *const u8);
}

/// Call the exported stub for `slot` with throwaway arguments.
unsafe fn call_stub(slot: Slot) {
    let h = Handle::from_addr(1);
    match slot {
        Slot::DictNew => {
            let _ = nbjit_dict_new();
        }
        Slot::DictGetIndex => {
            let _ = nbjit_dict_getindex(h, h);
        }
        Slot::DictSetIndex => nbjit_dict_setindex_bang(h, h, h),
        Slot::SymbolFromText => {
            let _ = nbjit_symbol_from_cstr(c"x".as_ptr());
        }
        Slot::BoxInt64 => {
            let _ = nbjit_box_int64(7);
        }
        Slot::BoxFloat64 => {
            let _ = nbjit_box_float64(0.5);
        }
        Slot::UnboxInt64 => {
            let _ = nbjit_unbox_int64(h);
        }
        Slot::UnboxFloat64 => {
            let _ = nbjit_unbox_float64(h);
        }
    }
}

#[test]
#[ignore = "spawned by every_uninitialized_stub_aborts_process"]
fn abort_child_calls_unbound_stub() {
    let Some(name) = std::env::var_os(ABORT_CHILD_ENV) else {
        return;
    };
    let slot = Slot::iter()
        .find(|slot| name == slot.to_string().as_str())
        .expect("slot name in environment");
    unsafe { call_stub(slot) };
    unreachable!("unbound stub {slot} returned");
}

#[test]
fn every_uninitialized_stub_aborts_process() {
    let exe = std::env::current_exe().expect("test binary path");
    for slot in Slot::iter() {
        let output = Command::new(&exe)
            .args(["abort_child_calls_unbound_stub", "--exact", "--ignored", "--nocapture"])
            .env(ABORT_CHILD_ENV, slot.to_string())
            .output()
            .expect("spawn child test");

        assert!(!output.status.success(), "{slot}: child exited cleanly");
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            assert_eq!(output.status.signal(), Some(6), "{slot}: expected SIGABRT");
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(
            stderr.contains(slot.symbol()) && stderr.contains("nbjit_init_runtime"),
            "{slot}: stderr: {stderr}"
        );
    }
}
