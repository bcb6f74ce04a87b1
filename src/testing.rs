use std::cell::Cell;

thread_local! {
    /// Whether the last accessor call was served from a cache.
    static LAST_WAS_HIT: Cell<bool> = const { Cell::new(false) };
    /// How many accessor calls were served from a cache on this thread.
    static HITS: Cell<usize> = const { Cell::new(0) };
    /// How many accessor calls invoked a generator on this thread.
    static MISSES: Cell<usize> = const { Cell::new(0) };
}

/// Whether the last accessor call on this thread was a cache hit.
pub fn last_was_hit() -> bool {
    LAST_WAS_HIT.with(|cell| cell.get())
}

/// The number of cache hits observed on this thread.
pub fn hits() -> usize {
    HITS.with(|cell| cell.get())
}

/// The number of cache misses observed on this thread.
pub fn misses() -> usize {
    MISSES.with(|cell| cell.get())
}

/// Reset this thread's hit and miss counters.
pub fn reset() {
    LAST_WAS_HIT.with(|cell| cell.set(false));
    HITS.with(|cell| cell.set(0));
    MISSES.with(|cell| cell.set(0));
}

/// Marks the last call as a cache hit.
pub(crate) fn register_hit() {
    LAST_WAS_HIT.with(|cell| cell.set(true));
    HITS.with(|cell| cell.set(cell.get() + 1));
}

/// Marks the last call as a cache miss.
pub(crate) fn register_miss() {
    LAST_WAS_HIT.with(|cell| cell.set(false));
    MISSES.with(|cell| cell.set(cell.get() + 1));
}
