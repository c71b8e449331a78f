//! Banker's algorithm safety check
//!
//! A state is safe when some ordering exists in which every process can
//! obtain its remaining need from what is available, finish, and hand its
//! allocation back. Both functions here are pure and total.

use dlsim_types::ResourceVector;

/// Returns true iff every process can finish from this state
///
/// `allocation[p]` is what process `p` holds now and `need[p]` is what it
/// may still ask for (`max_demand[p] - allocation[p]`). Inputs whose
/// lengths disagree are treated as unsafe.
#[must_use]
pub fn is_safe(
    available: &ResourceVector,
    allocation: &[ResourceVector],
    need: &[ResourceVector],
) -> bool {
    safe_sequence(available, allocation, need).is_some()
}

/// Completion order demonstrated by the safety scan, if one exists
///
/// The scan always picks the lowest-indexed eligible process, so the order
/// is deterministic. The choice never changes whether a sequence exists.
#[must_use]
pub fn safe_sequence(
    available: &ResourceVector,
    allocation: &[ResourceVector],
    need: &[ResourceVector],
) -> Option<Vec<usize>> {
    if allocation.len() != need.len() {
        return None;
    }

    let mut work = available.clone();
    let mut finished = vec![false; need.len()];
    let mut order = Vec::with_capacity(need.len());

    'scan: loop {
        for p in 0..need.len() {
            if finished[p] || !need[p].fits_within(&work) {
                continue;
            }
            // p can run to completion and return everything it holds.
            work = work.checked_add(&allocation[p])?;
            finished[p] = true;
            order.push(p);
            continue 'scan;
        }
        break;
    }

    let safe = finished.iter().all(|&f| f);
    if !safe {
        tracing::trace!(
            completed = order.len(),
            processes = need.len(),
            "no safe sequence"
        );
    }
    safe.then_some(order)
}
