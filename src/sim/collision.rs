//! Circle-vs-circle collision detection
//!
//! Every entity is a circle. Groups are tested against each other with a
//! plain O(n·m) sweep; arcade entity counts are small enough that a spatial
//! grid would cost more than it saves.

use super::state::Body;

/// Indices of two overlapping entities, one from each group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitPair {
    /// Index into the first group
    pub a: usize,
    /// Index into the second group
    pub b: usize,
}

/// Check if two bodies overlap (touching counts)
///
/// Symmetric in its arguments. Radii must be positive.
#[inline]
pub fn overlaps(a: &Body, b: &Body) -> bool {
    debug_assert!(a.radius > 0.0, "collision radius must be positive, got {}", a.radius);
    debug_assert!(b.radius > 0.0, "collision radius must be positive, got {}", b.radius);
    let reach = a.radius + b.radius;
    a.pos.distance_squared(b.pos) <= reach * reach
}

/// Report every overlapping pair between two groups
///
/// Pairs come back in `group_a`-major order. Dead bodies are skipped and no
/// entity is ever tested against its own group.
pub fn find_hits<A, B>(group_a: &[A], group_b: &[B]) -> Vec<HitPair>
where
    A: AsRef<Body>,
    B: AsRef<Body>,
{
    let mut hits = Vec::new();
    for (ia, a) in group_a.iter().enumerate() {
        let a = a.as_ref();
        if !a.alive {
            continue;
        }
        for (ib, b) in group_b.iter().enumerate() {
            let b = b.as_ref();
            if b.alive && overlaps(a, b) {
                hits.push(HitPair { a: ia, b: ib });
            }
        }
    }
    hits
}
