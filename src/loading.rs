use std::sync::atomic::{AtomicUsize, Ordering};

/// LoadingFlag
///
/// UI-facing "busy" indicator. Counts in-flight operations so overlapping calls
/// keep the flag raised until the last one finishes.
#[derive(Debug, Default)]
pub struct LoadingFlag {
    in_flight: AtomicUsize,
}

impl LoadingFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Raises the flag until the returned guard is dropped, including on early `?` returns.
    pub fn begin(&self) -> LoadingGuard<'_> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        LoadingGuard { flag: self }
    }
}

pub struct LoadingGuard<'a> {
    flag: &'a LoadingFlag,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.flag.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
