//! # Cache an arbitrary async function by derived key.
//!
//! [`CachedFn`] wraps a fallible async function together with a key function
//! over its arguments, so every call site gets coalescing and TTL caching
//! without threading keys around by hand.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use jobwatch::{CacheConfig, CachedFn, CallError, RequestCache};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let cache = Arc::new(RequestCache::new(CacheConfig::default()));
//! let signed_url = CachedFn::new(
//!     cache,
//!     |path: &String| format!("signed-url:{path}"),
//!     |path: String| async move { Ok::<_, CallError>(format!("https://cdn/{path}?sig=x")) },
//! );
//!
//! let url = signed_url.call("clips/7.mp4".to_string()).await.unwrap();
//! assert!(url.contains("clips/7.mp4"));
//! # }
//! ```

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::cache::cache::RequestCache;
use crate::error::CallError;

/// An async function with caching and coalescing applied per derived key.
///
/// Concurrent calls whose arguments derive the same key share one underlying
/// execution, exactly like [`RequestCache::fetch`].
pub struct CachedFn<A, V, K, F> {
    cache: Arc<RequestCache<V>>,
    key_fn: K,
    op: F,
    _args: PhantomData<fn(A)>,
}

impl<A, V, K, F, Fut> CachedFn<A, V, K, F>
where
    V: Clone + Send + 'static,
    K: Fn(&A) -> String,
    F: Fn(A) -> Fut,
    Fut: Future<Output = Result<V, CallError>>,
{
    /// Wraps `op` so results are cached under `key_fn(&args)`.
    pub fn new(cache: Arc<RequestCache<V>>, key_fn: K, op: F) -> Self {
        Self {
            cache,
            key_fn,
            op,
            _args: PhantomData,
        }
    }

    /// Calls the wrapped function through the cache.
    pub async fn call(&self, args: A) -> Result<V, CallError> {
        let key = (self.key_fn)(&args);
        self.cache.fetch(&key, || (self.op)(args)).await
    }

    /// The underlying cache (for invalidation or stats).
    pub fn cache(&self) -> &RequestCache<V> {
        &self.cache
    }
}
