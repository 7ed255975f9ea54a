//! Stable store-to-worker assignment.
//!
//! The hash must agree across every process in the cluster, so it is defined
//! here rather than taken from `std::hash`.

/// 31-polynomial hash over UTF-16 code units with wrapping `i32` arithmetic.
pub fn stable_hash(name: &str) -> i32 {
    name.encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

/// Worker index owning `name` among `workers` workers; 0 when there are none.
pub fn partition(name: &str, workers: usize) -> usize {
    if workers == 0 {
        return 0;
    }
    // unsigned_abs keeps i32::MIN in range
    stable_hash(name).unsigned_abs() as usize % workers
}

/// Replica for a primary: the next worker, wrapping around.
pub fn replica(primary: usize, workers: usize) -> usize {
    if workers == 0 {
        0
    } else {
        (primary + 1) % workers
    }
}
