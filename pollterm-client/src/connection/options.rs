//! Runtime transport toggles

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use pollterm_protocol::Method;

/// Transport options shared between the UI and the polling channel
///
/// The UI flips the toggles; the channel reads them each time it builds a
/// request, so a change applies from the next request on. Clones share
/// state.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    inner: Arc<Toggles>,
}

#[derive(Debug)]
struct Toggles {
    use_get: AtomicBool,
    color_enabled: AtomicBool,
    cache_bust: bool,
}

impl TransportConfig {
    pub fn new(method: Method, color_enabled: bool, cache_bust: bool) -> Self {
        Self {
            inner: Arc::new(Toggles {
                use_get: AtomicBool::new(method == Method::Get),
                color_enabled: AtomicBool::new(color_enabled),
                cache_bust,
            }),
        }
    }

    pub fn method(&self) -> Method {
        if self.inner.use_get.load(Ordering::Relaxed) {
            Method::Get
        } else {
            Method::Post
        }
    }

    pub fn color_enabled(&self) -> bool {
        self.inner.color_enabled.load(Ordering::Relaxed)
    }

    pub fn cache_bust(&self) -> bool {
        self.inner.cache_bust
    }

    /// Switch between GET and POST, returning the new method
    pub fn toggle_get(&self) -> Method {
        let was_get = self.inner.use_get.fetch_xor(true, Ordering::Relaxed);
        if was_get {
            Method::Post
        } else {
            Method::Get
        }
    }

    /// Flip colour mode, returning the new setting
    pub fn toggle_color(&self) -> bool {
        !self.inner.color_enabled.fetch_xor(true, Ordering::Relaxed)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::new(Method::default(), true, true)
    }
}
