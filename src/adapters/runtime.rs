// SPDX-License-Identifier: MIT OR Apache-2.0

//! Blocking bridge for the async remote clients.
//!
//! The stores are synchronous while the etcd and Redis clients are async. All
//! remote calls run on one shared runtime so that connections created by one
//! call stay usable from the next.

use once_cell::sync::Lazy;
use std::future::Future;

/// Shared runtime for remote adapters, created on first use.
static REMOTE_RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Runtime::new().expect("Failed to create runtime for remote adapters")
});

/// Runs `future` to completion on the shared runtime.
///
/// When called from inside another runtime, the future is driven from a
/// scoped helper thread so the caller's executor is never blocked re-entrantly.
pub(crate) fn block_on<F>(future: F) -> F::Output
where
    F: Future + Send,
    F::Output: Send,
{
    if tokio::runtime::Handle::try_current().is_ok() {
        std::thread::scope(|scope| {
            scope
                .spawn(|| REMOTE_RUNTIME.block_on(future))
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
        })
    } else {
        REMOTE_RUNTIME.block_on(future)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_on_outside_runtime() {
        assert_eq!(block_on(async { 40 + 2 }), 42);
    }

    #[test]
    fn test_block_on_inside_runtime() {
        let outer = tokio::runtime::Runtime::new().unwrap();
        let value = outer.block_on(async { block_on(async { "inner" }) });
        assert_eq!(value, "inner");
    }
}
