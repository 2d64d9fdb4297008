//! Scoped overrides of `STEPCALL_*` environment variables.
//!
//! `std::env::set_var` and `remove_var` are `unsafe` in Rust 2024 because they
//! mutate process-global state. [`ScopedEnv`] holds a global lock for its
//! whole lifetime and restores every touched variable on drop, so tests that
//! read configuration from the environment never observe each other.
//!
//! # Examples
//!
//! ```rust,ignore
//! use test_support::ScopedEnv;
//!
//! let env = ScopedEnv::new().set("STEPCALL_LOCALE", "de-DE");
//! assert_eq!(std::env::var("STEPCALL_LOCALE").ok().as_deref(), Some("de-DE"));
//! drop(env);
//! ```

use std::ffi::OsString;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Holds the environment lock and the values to restore.
pub struct ScopedEnv {
    saved: Vec<(String, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl fmt::Debug for ScopedEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedEnv")
            .field("saved", &self.saved)
            .finish_non_exhaustive()
    }
}

impl Default for ScopedEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopedEnv {
    /// Acquire the global environment lock.
    #[must_use]
    pub fn new() -> Self {
        let guard = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        Self {
            saved: Vec::new(),
            _guard: guard,
        }
    }

    /// Set `name` to `value` until the scope ends.
    #[must_use]
    pub fn set(mut self, name: &str, value: &str) -> Self {
        self.remember(name);
        // SAFETY: the held lock serialises environment mutation.
        unsafe { std::env::set_var(name, value) };
        self
    }

    /// Remove `name` until the scope ends.
    #[must_use]
    pub fn remove(mut self, name: &str) -> Self {
        self.remember(name);
        // SAFETY: the held lock serialises environment mutation.
        unsafe { std::env::remove_var(name) };
        self
    }

    fn remember(&mut self, name: &str) {
        if self.saved.iter().all(|(saved, _)| saved != name) {
            self.saved.push((name.to_owned(), std::env::var_os(name)));
        }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (name, previous) in self.saved.drain(..).rev() {
            // SAFETY: the lock is still held while values are restored.
            unsafe {
                match previous {
                    Some(value) => std::env::set_var(&name, value),
                    None => std::env::remove_var(&name),
                }
            }
        }
    }
}
