//! Column width tracking.
//!
//! Each column keeps a multiset of the widths of every cell currently in
//! it, so the column's calculated width — the widest entry — survives
//! arbitrary inserts and removals without rescanning the column. Inserts
//! and removals are O(log n); peeking the maximum is O(log n) at worst.
//!
//! [`SyncAxis`] extends the same idea across widget instances: several
//! lists (or a table and its header) publish their per-column widths into
//! one shared axis, and the widest published width per column wins for
//! everyone.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

/// A multiset of cell widths for one column.
#[derive(Debug, Default, Clone)]
pub(crate) struct ColumnWidthSet {
    /// Width -> number of cells currently at that width.
    widths: BTreeMap<u32, usize>,
    len: usize,
}

impl ColumnWidthSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one cell at `width`.
    pub fn insert(&mut self, width: u32) {
        *self.widths.entry(width).or_insert(0) += 1;
        self.len += 1;
    }

    /// Remove one cell previously recorded at `width`.
    ///
    /// # Panics
    ///
    /// Panics if no cell at that width is recorded; unbalanced width
    /// tracking is an internal consistency defect.
    pub fn remove(&mut self, width: u32) {
        let count = self
            .widths
            .get_mut(&width)
            .unwrap_or_else(|| panic!("column width {width} removed but never recorded"));
        *count -= 1;
        if *count == 0 {
            self.widths.remove(&width);
        }
        self.len -= 1;
    }

    /// The widest recorded cell, or `None` for an empty column.
    pub fn widest(&self) -> Option<u32> {
        self.widths.keys().next_back().copied()
    }

    /// Number of cells recorded.
    pub fn len(&self) -> usize {
        self.len
    }
}

new_key_type! {
    /// Identity of one participant in a [`SyncAxis`].
    struct AxisParticipantId;
}

#[derive(Default)]
struct SyncAxisData {
    /// Per-participant published column widths.
    published: SlotMap<AxisParticipantId, Vec<u32>>,
}

/// A shared column-width negotiation object.
///
/// Cloning shares the axis; the data lives as long as any clone or
/// member does. Lists that should align columns are created over the
/// same axis.
#[derive(Clone, Default)]
pub struct SyncAxis {
    inner: Arc<Mutex<SyncAxisData>>,
}

impl SyncAxis {
    /// Create a new, empty axis.
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the axis. The returned membership publishes this instance's
    /// widths and leaves the negotiation when dropped.
    pub fn join(&self) -> SyncAxisMember {
        let id = self.inner.lock().published.insert(Vec::new());
        SyncAxisMember {
            axis: self.clone(),
            id,
        }
    }

    /// Number of live participants.
    pub fn participants(&self) -> usize {
        self.inner.lock().published.len()
    }

    fn negotiated(&self) -> Vec<u32> {
        let data = self.inner.lock();
        let columns = data
            .published
            .values()
            .map(Vec::len)
            .max()
            .unwrap_or(0);
        let mut widths = vec![0u32; columns];
        for published in data.published.values() {
            for (column, width) in published.iter().enumerate() {
                if *width > widths[column] {
                    widths[column] = *width;
                }
            }
        }
        widths
    }
}

impl std::fmt::Debug for SyncAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncAxis")
            .field("participants", &self.participants())
            .finish()
    }
}

/// One list instance's membership in a [`SyncAxis`].
pub struct SyncAxisMember {
    axis: SyncAxis,
    id: AxisParticipantId,
}

impl SyncAxisMember {
    /// Publish this instance's calculated column widths.
    pub fn publish(&self, widths: &[u32]) {
        if let Some(slot) = self.axis.inner.lock().published.get_mut(self.id) {
            slot.clear();
            slot.extend_from_slice(widths);
        }
    }

    /// The negotiated widths: the per-column maximum over all live
    /// participants.
    pub fn negotiated(&self) -> Vec<u32> {
        self.axis.negotiated()
    }
}

impl Drop for SyncAxisMember {
    fn drop(&mut self) {
        self.axis.inner.lock().published.remove(self.id);
    }
}

impl std::fmt::Debug for SyncAxisMember {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncAxisMember").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widest_tracks_inserts_and_removals() {
        let mut set = ColumnWidthSet::new();
        assert_eq!(set.widest(), None);

        set.insert(40);
        set.insert(100);
        set.insert(40);
        assert_eq!(set.widest(), Some(100));
        assert_eq!(set.len(), 3);

        // Removing the widest exposes the next-widest, never a stale value.
        set.remove(100);
        assert_eq!(set.widest(), Some(40));

        set.remove(40);
        set.remove(40);
        assert_eq!(set.widest(), None);
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn test_duplicate_widths_counted() {
        let mut set = ColumnWidthSet::new();
        set.insert(25);
        set.insert(25);
        set.remove(25);
        assert_eq!(set.widest(), Some(25));
    }

    #[test]
    #[should_panic(expected = "never recorded")]
    fn test_unbalanced_remove_panics() {
        let mut set = ColumnWidthSet::new();
        set.insert(10);
        set.remove(11);
    }

    #[test]
    fn test_axis_negotiates_per_column_maximum() {
        let axis = SyncAxis::new();
        let a = axis.join();
        let b = axis.join();

        a.publish(&[50, 10]);
        b.publish(&[20, 80, 5]);

        assert_eq!(a.negotiated(), vec![50, 80, 5]);
        assert_eq!(b.negotiated(), vec![50, 80, 5]);
    }

    #[test]
    fn test_axis_member_leaves_on_drop() {
        let axis = SyncAxis::new();
        let a = axis.join();
        {
            let b = axis.join();
            b.publish(&[999]);
            assert_eq!(a.negotiated(), vec![999]);
        }
        assert_eq!(axis.participants(), 1);
        assert_eq!(a.negotiated(), Vec::<u32>::new());
    }
}
