use std::sync::atomic::{AtomicU64, Ordering};

use triomphe::Arc;

/// The maximum body size of one request, shared by the decoder and the body.
///
/// The decoder reads the limit every time it needs it, so a raise made by the
/// handler while the body is streaming applies to the bytes not decoded yet.
#[derive(Debug, Clone)]
pub struct BodyLimit {
    max_size: Arc<AtomicU64>,
}

impl BodyLimit {
    pub fn new(max_size: u64) -> Self {
        Self { max_size: Arc::new(AtomicU64::new(max_size)) }
    }

    #[inline]
    pub fn get(&self) -> u64 {
        self.max_size.load(Ordering::Acquire)
    }

    /// Raises the limit to `size`, a smaller value than the current limit is ignored.
    pub fn raise(&self, size: u64) {
        self.max_size.fetch_max(size, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raise_is_shared() {
        let limit = BodyLimit::new(10);
        let shared = limit.clone();

        shared.raise(100);
        assert_eq!(limit.get(), 100);

        shared.raise(50);
        assert_eq!(limit.get(), 100);
    }
}
