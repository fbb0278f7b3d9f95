//! Kernel backend selection.
//!
//! Layer orchestration is always single-threaded. What can run in parallel
//! is the arithmetic underneath it: element-wise maps, matrix products and
//! reductions in [`crate::ops`]. This module picks how those kernels run.
//!
//! # Supported Backends
//!
//! - `Serial`: plain loops on the calling thread (default).
//! - `Parallel`: the same loops split across the `rayon` thread pool.
//!
//! Both backends reduce every output element in the same order, so switching
//! between them never changes a result, only how fast it arrives.
//!
//! The backend is stored globally using an `AtomicU8`, so it can be flipped
//! at runtime without threading a handle through every layer.

use core::convert::TryFrom;
use core::sync::atomic::{AtomicU8, Ordering};

/// Enumeration of supported kernel backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Backend {
    /// Single-threaded loops (default).
    #[default]
    Serial = 0,
    /// Data-parallel loops on the `rayon` global pool.
    Parallel = 1,
}

impl TryFrom<u8> for Backend {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Serial),
            1 => Ok(Self::Parallel),
            _ => Err(()),
        }
    }
}

/// Internal global state for the active backend.
///
/// Relaxed ordering is enough: the value is a hint for how to schedule
/// work, and both backends compute identical results.
static GLOBAL_DEFAULT_BACKEND: AtomicU8 = AtomicU8::new(Backend::Serial as u8);

/// Sets the backend used by every subsequent kernel call.
///
/// # Example
/// ```
/// use mlp_layers::backend::{get_backend, set_backend, Backend};
/// set_backend(Backend::Parallel);
/// assert_eq!(get_backend(), Backend::Parallel);
/// set_backend(Backend::Serial);
/// ```
pub fn set_backend(b: Backend) {
    log::debug!("kernel backend set to {b:?}");
    GLOBAL_DEFAULT_BACKEND.store(b as u8, Ordering::Relaxed);
}

/// Returns the currently active kernel backend.
///
/// If the stored value is invalid, defaults to [`Backend::Serial`].
#[must_use]
pub fn get_backend() -> Backend {
    Backend::try_from(GLOBAL_DEFAULT_BACKEND.load(Ordering::Relaxed)).unwrap_or_default()
}
