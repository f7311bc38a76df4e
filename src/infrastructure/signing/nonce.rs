use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Monotonic nonce generator: wall-clock milliseconds, bumped by one whenever
/// the clock has not advanced past the previous value.
///
/// Share one instance (behind an `Arc`) across every adapter that signs with the
/// same credentials.
#[derive(Debug, Default)]
pub struct NonceSource {
    last: AtomicI64,
}

impl NonceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let mut current = self.last.load(Ordering::Acquire);
        loop {
            let candidate = now.max(current + 1);
            match self.last.compare_exchange_weak(
                current,
                candidate,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return candidate,
                Err(actual) => current = actual,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_strictly_increasing() {
        let source = NonceSource::new();
        let mut previous = source.next();
        for _ in 0..1000 {
            let next = source.next();
            assert!(next > previous);
            previous = next;
        }
    }

    #[test]
    fn test_unique_across_threads() {
        let source = Arc::new(NonceSource::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let source = source.clone();
                std::thread::spawn(move || (0..250).map(|_| source.next()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for nonce in handle.join().unwrap() {
                assert!(seen.insert(nonce), "duplicate nonce {nonce}");
            }
        }
        assert_eq!(seen.len(), 1000);
    }
}
