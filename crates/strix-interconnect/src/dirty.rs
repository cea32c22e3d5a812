//! Register dirty tracking.
//!
//! One [`DirtyManager`] exists per GPU channel and is mutated only by that
//! channel's processing thread. The decoder calls [`DirtyManager::mark_dirty`]
//! for every method write; derived-state consumers register a named
//! [`BindingHandle`] over the register range they depend on and poll it with
//! [`DirtyManager::check_and_clear`] before each draw.
//!
//! Each binding owns its observation bitmap (one bit per register in its
//! range), and the manager keeps a per-register index of interested
//! bindings. A write therefore stays dirty until every interested binding
//! has observed it, and overlapping handles (a combined "all vertex
//! buffers" handle next to per-slot handles) never interfere: clearing one
//! binding's view of a range leaves every other binding's view intact.

use tracing::debug;

/// Immutable descriptor for one registered consumer binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BindingHandle {
    index: u16,
    offset: u32,
    count: u32,
}

impl BindingHandle {
    /// First method offset covered by this binding.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Number of methods covered by this binding.
    pub fn count(&self) -> u32 {
        self.count
    }
}

struct BindingState {
    name: &'static str,
    offset: usize,
    count: usize,
    /// One bit per method in `[offset, offset + count)`; unused high bits in
    /// the last word stay zero.
    bits: Box<[u64]>,
}

impl BindingState {
    fn any_set(&self) -> bool {
        self.bits.iter().any(|w| *w != 0)
    }

    fn clear(&mut self) {
        self.bits.fill(0);
    }

    fn set_all(&mut self) {
        self.bits.fill(u64::MAX);
        let tail = self.count % 64;
        if tail != 0 {
            if let Some(last) = self.bits.last_mut() {
                *last = (1u64 << tail) - 1;
            }
        }
    }
}

/// Per-channel dirty table over the engine's method address space.
pub struct DirtyManager {
    method_count: usize,
    /// For each method, the bindings whose range covers it.
    interest: Vec<Vec<u16>>,
    bindings: Vec<BindingState>,
}

impl DirtyManager {
    pub fn new(method_count: usize) -> Self {
        Self {
            method_count,
            interest: vec![Vec::new(); method_count],
            bindings: Vec::new(),
        }
    }

    pub fn method_count(&self) -> usize {
        self.method_count
    }

    /// Register a named binding over `[offset, offset + count)`.
    ///
    /// Called once at init per piece of derived state. The range must lie
    /// within the method space and be non-empty.
    pub fn register(&mut self, name: &'static str, offset: u32, count: u32) -> BindingHandle {
        let start = offset as usize;
        let end = start
            .checked_add(count as usize)
            .expect("binding range overflows");
        assert!(count > 0, "binding {name:?} covers no registers");
        assert!(
            end <= self.method_count,
            "binding {name:?} exceeds method space: offset={offset} count={count}"
        );
        assert!(self.bindings.len() < u16::MAX as usize);

        let index = self.bindings.len() as u16;
        let words = (count as usize).div_ceil(64);
        self.bindings.push(BindingState {
            name,
            offset: start,
            count: count as usize,
            bits: vec![0u64; words].into_boxed_slice(),
        });
        for method in start..end {
            self.interest[method].push(index);
        }

        debug!(name, offset, count, "registered dirty binding");
        BindingHandle {
            index,
            offset,
            count,
        }
    }

    /// Mark `[offset, offset + count)` dirty for every interested binding.
    ///
    /// Side-effect only; ranges outside the method space are clamped.
    pub fn mark_dirty(&mut self, offset: u32, count: u32) {
        let start = (offset as usize).min(self.method_count);
        let end = (offset as usize)
            .saturating_add(count as usize)
            .min(self.method_count);

        let interest = &self.interest;
        let bindings = &mut self.bindings;
        for method in start..end {
            for &index in &interest[method] {
                let binding = &mut bindings[index as usize];
                let bit = method - binding.offset;
                binding.bits[bit / 64] |= 1u64 << (bit % 64);
            }
        }
    }

    /// Returns whether any register in the handle's range was written since
    /// this binding last observed it, clearing the binding's view of the
    /// range when so.
    pub fn check_and_clear(&mut self, handle: BindingHandle) -> bool {
        let binding = &mut self.bindings[handle.index as usize];
        let dirty = binding.any_set();
        if dirty {
            binding.clear();
        }
        dirty
    }

    /// Diagnostic name the binding was registered under.
    pub fn binding_name(&self, handle: BindingHandle) -> &'static str {
        self.bindings[handle.index as usize].name
    }

    /// Drop all recorded dirtiness. Used on channel reset.
    pub fn clear(&mut self) {
        for binding in &mut self.bindings {
            binding.clear();
        }
    }

    /// Mark every registered binding fully dirty, forcing each to recompute
    /// on its next check. Used after events that invalidate all derived
    /// state (e.g. host device recovery).
    pub fn mark_all_dirty(&mut self) {
        for binding in &mut self.bindings {
            binding.set_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> DirtyManager {
        DirtyManager::new(0x200)
    }

    #[test]
    fn write_then_check_then_recheck() {
        let mut dirty = manager();
        let handle = dirty.register("scissor", 100, 4);

        dirty.mark_dirty(100, 4);
        assert!(dirty.check_and_clear(handle));
        assert!(!dirty.check_and_clear(handle));
    }

    #[test]
    fn partial_overlap_marks_binding() {
        let mut dirty = manager();
        let handle = dirty.register("viewport", 0x40, 8);

        // Write straddles the end of the binding's range.
        dirty.mark_dirty(0x46, 8);
        assert!(dirty.check_and_clear(handle));

        // Write entirely outside it.
        dirty.mark_dirty(0x48, 8);
        assert!(!dirty.check_and_clear(handle));
    }

    #[test]
    fn disjoint_handles_observe_independently() {
        let mut dirty = manager();
        let a = dirty.register("a", 0x10, 4);
        let b = dirty.register("b", 0x20, 4);

        dirty.mark_dirty(0x10, 1);
        dirty.mark_dirty(0x20, 1);

        // Order among handles does not matter, and clearing one never
        // affects the other.
        assert!(dirty.check_and_clear(b));
        assert!(dirty.check_and_clear(a));
        assert!(!dirty.check_and_clear(a));
        assert!(!dirty.check_and_clear(b));
    }

    #[test]
    fn overlapping_handles_do_not_interfere() {
        let mut dirty = manager();
        let all = dirty.register("all_vertex_buffers", 0x100, 64);
        let slot0 = dirty.register("vertex_buffer_0", 0x100, 4);

        dirty.mark_dirty(0x101, 1);

        assert!(dirty.check_and_clear(slot0));
        // The combined handle still sees the same write.
        assert!(dirty.check_and_clear(all));
        assert!(!dirty.check_and_clear(slot0));
        assert!(!dirty.check_and_clear(all));
    }

    #[test]
    fn each_binding_observes_once_per_write() {
        let mut dirty = manager();
        let handle = dirty.register("blend", 0x80, 2);

        dirty.mark_dirty(0x80, 1);
        dirty.mark_dirty(0x81, 1);
        assert!(dirty.check_and_clear(handle));
        assert!(!dirty.check_and_clear(handle));

        dirty.mark_dirty(0x80, 1);
        assert!(dirty.check_and_clear(handle));
    }

    #[test]
    fn out_of_range_marks_are_clamped() {
        let mut dirty = manager();
        let handle = dirty.register("tail", 0x1fc, 4);

        dirty.mark_dirty(0x1fe, 0x100);
        assert!(dirty.check_and_clear(handle));
    }

    #[test]
    fn clear_drops_pending_dirtiness() {
        let mut dirty = manager();
        let handle = dirty.register("x", 0, 16);

        dirty.mark_dirty(0, 16);
        dirty.clear();
        assert!(!dirty.check_and_clear(handle));
    }

    #[test]
    fn mark_all_dirty_hits_every_binding() {
        let mut dirty = manager();
        let a = dirty.register("a", 0, 3);
        let b = dirty.register("b", 0x100, 100);

        dirty.mark_all_dirty();
        assert!(dirty.check_and_clear(a));
        assert!(dirty.check_and_clear(b));
        assert!(!dirty.check_and_clear(b));
    }

    #[test]
    fn binding_name_round_trips() {
        let mut dirty = manager();
        let handle = dirty.register("depth_bias", 0x30, 3);
        assert_eq!(dirty.binding_name(handle), "depth_bias");
        assert_eq!(handle.offset(), 0x30);
        assert_eq!(handle.count(), 3);
    }

    #[test]
    #[should_panic(expected = "exceeds method space")]
    fn registration_out_of_bounds_panics() {
        let mut dirty = manager();
        dirty.register("bad", 0x1ff, 2);
    }
}
