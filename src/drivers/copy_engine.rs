//! Memory-to-memory copy engine for window snapshots.
//!
//! On target this drives the GDMA through `esp_async_memcpy`.  The
//! engine is installed when a snapshot starts and uninstalled once the
//! result has been read, mirroring an enable/disable of a DMA channel.
//! The completion ISR only raises [`Event::CopyComplete`]: no float math,
//! no logging, nothing else runs in interrupt context.
//!
//! On host builds the copy happens synchronously in `start_copy` and the
//! completion event is raised immediately.

use crate::app::ports::CopyEnginePort;
use crate::config::WINDOW_LEN;
use crate::error::CopyError;
use crate::events::{Event, push_event};
use crate::sensors::co::RawSample;

/// `ESP_ERR_INVALID_SIZE`; returned when the source is wider than the
/// destination buffer.
const ERR_INVALID_SIZE: i32 = 0x104;

/// DMA-reachable destination buffer.
#[repr(C, align(4))]
struct SnapshotBuf([RawSample; WINDOW_LEN]);

#[cfg(target_os = "espidf")]
mod hw {
    use super::*;
    use esp_idf_svc::sys::*;
    use log::{debug, error};

    static mut SNAPSHOT: SnapshotBuf = SnapshotBuf([0; WINDOW_LEN]);

    /// GDMA completion callback, runs in ISR context.
    unsafe extern "C" fn copy_done_isr(
        _handle: async_memcpy_handle_t,
        _event: *mut async_memcpy_event_t,
        _arg: *mut core::ffi::c_void,
    ) -> bool {
        push_event(Event::CopyComplete);
        false
    }

    pub struct CopyEngine {
        handle: async_memcpy_handle_t,
    }

    impl CopyEngine {
        pub fn new() -> Self {
            Self {
                handle: core::ptr::null_mut(),
            }
        }

        fn install(&mut self) -> Result<(), CopyError> {
            if !self.handle.is_null() {
                return Ok(());
            }
            let cfg = async_memcpy_config_t {
                backlog: 1,
                ..Default::default()
            };
            // SAFETY: `handle` is owned by this engine and only touched from
            // the dispatcher.
            let ret = unsafe { esp_async_memcpy_install(&cfg, &mut self.handle) };
            if ret != ESP_OK as i32 {
                self.handle = core::ptr::null_mut();
                return Err(CopyError::StartFailed(ret));
            }
            Ok(())
        }
    }

    impl CopyEnginePort for CopyEngine {
        fn start_copy(&mut self, src: &[RawSample]) -> Result<(), CopyError> {
            if src.len() > WINDOW_LEN {
                return Err(CopyError::StartFailed(ERR_INVALID_SIZE));
            }
            self.install()?;
            // SAFETY: SNAPSHOT is only written by the DMA between here and the
            // completion event, and only read by `read_copy` after it.  The
            // source is the pipeline's window, which stays in place for the
            // whole run of the event loop.
            let ret = unsafe {
                esp_async_memcpy(
                    self.handle,
                    (&raw mut SNAPSHOT).cast(),
                    src.as_ptr() as *mut core::ffi::c_void,
                    core::mem::size_of_val(src),
                    Some(copy_done_isr),
                    core::ptr::null_mut(),
                )
            };
            if ret != ESP_OK as i32 {
                error!("copy_engine: transfer start failed (rc={})", ret);
                return Err(CopyError::StartFailed(ret));
            }
            debug!("copy_engine: {} samples queued", src.len());
            Ok(())
        }

        fn read_copy(&mut self, dst: &mut [RawSample]) {
            let n = dst.len().min(WINDOW_LEN);
            // SAFETY: called after CopyComplete; the DMA no longer writes.
            let snapshot = unsafe { &(*(&raw const SNAPSHOT)).0 };
            dst[..n].copy_from_slice(&snapshot[..n]);
        }

        fn disable_copy(&mut self) {
            if self.handle.is_null() {
                return;
            }
            // SAFETY: no transfer is in flight once the result was read.
            let ret = unsafe { esp_async_memcpy_uninstall(self.handle) };
            if ret != ESP_OK as i32 {
                error!("copy_engine: uninstall failed (rc={})", ret);
            }
            self.handle = core::ptr::null_mut();
        }
    }
}

#[cfg(target_os = "espidf")]
pub use hw::CopyEngine;

// ── Host simulation ───────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
pub struct CopyEngine {
    snapshot: SnapshotBuf,
    enabled: bool,
}

#[cfg(not(target_os = "espidf"))]
impl CopyEngine {
    pub fn new() -> Self {
        Self {
            snapshot: SnapshotBuf([0; WINDOW_LEN]),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[cfg(not(target_os = "espidf"))]
impl CopyEnginePort for CopyEngine {
    fn start_copy(&mut self, src: &[RawSample]) -> Result<(), CopyError> {
        if src.len() > WINDOW_LEN {
            return Err(CopyError::StartFailed(ERR_INVALID_SIZE));
        }
        self.enabled = true;
        self.snapshot.0[..src.len()].copy_from_slice(src);
        push_event(Event::CopyComplete);
        Ok(())
    }

    fn read_copy(&mut self, dst: &mut [RawSample]) {
        let n = dst.len().min(WINDOW_LEN);
        dst[..n].copy_from_slice(&self.snapshot.0[..n]);
    }

    fn disable_copy(&mut self) {
        self.enabled = false;
    }
}

impl Default for CopyEngine {
    fn default() -> Self {
        Self::new()
    }
}
