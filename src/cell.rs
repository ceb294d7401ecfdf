//! Cells and the structural algorithms that split, merge and route items through them.
//!
//! A cell is either a leaf holding a list of [`Entry`]s or a branch holding 27 child slots that cut the cell into a
//! regular 3x3x3 grid. Every routing decision goes through [`Cell::child_index`]; add, remove, move and contains must
//! agree on it or items become unreachable.

use crate::allocator::{CellAllocator, CellPtr, ChildPointers, EMPTY_CELL_PTR};
use crate::{ChildGridShape, ChildIndex, GRID_FACTOR};

use glam::Vec3;
use ndshape::ConstShape;
use std::mem;

/// An item together with the position it was inserted at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Entry<T> {
    pub item: T,
    pub position: Vec3,
}

impl<T> Entry<T> {
    #[inline]
    pub fn new(item: T, position: Vec3) -> Self {
        Self { item, position }
    }

    #[inline]
    fn matches(&self, item: &T, position: Vec3) -> bool
    where
        T: PartialEq,
    {
        self.position == position && self.item == *item
    }
}

/// One axis-aligned region `[start, end)` of a [`Tree`](crate::Tree).
///
/// The two split planes per axis cut the cell into its 3x3x3 child grid. Child boxes are taken directly from
/// `[start, splits[0], splits[1], end]`, so neighbouring children share their boundary values bit for bit and the grid
/// always tiles the cell exactly.
#[derive(Clone, Debug)]
pub struct Cell<T> {
    pub(crate) start: Vec3,
    pub(crate) end: Vec3,
    pub(crate) splits: [Vec3; 2],
    /// Only populated for leaves.
    pub(crate) items: Vec<Entry<T>>,
    /// Only populated for branches.
    pub(crate) children: Option<Box<ChildPointers>>,
    /// Items in the whole subtree, not just this cell.
    pub(crate) total_item_count: usize,
}

/// Split planes at one and two thirds of `[start, end)`, kept ordered and inside the region.
#[inline]
pub(crate) fn grid_splits(start: Vec3, end: Vec3) -> [Vec3; 2] {
    let third = (end - start) / GRID_FACTOR as f32;
    let lo = (start + third).clamp(start, end);
    let hi = (start + third * 2.0).clamp(lo, end);
    [lo, hi]
}

#[inline]
fn grid_axis(value: f32, lo: f32, hi: f32) -> u32 {
    if value < lo {
        0
    } else if value < hi {
        1
    } else {
        2
    }
}

impl<T> Cell<T> {
    #[inline]
    pub fn start(&self) -> Vec3 {
        self.start
    }

    #[inline]
    pub fn end(&self) -> Vec3 {
        self.end
    }

    #[inline]
    pub fn size(&self) -> Vec3 {
        self.end - self.start
    }

    /// `[start, split_lo, split_hi, end]`; child `i` on an axis covers `[boundaries[i], boundaries[i + 1])`.
    #[inline]
    pub fn boundaries(&self) -> [Vec3; 4] {
        [self.start, self.splits[0], self.splits[1], self.end]
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Items stored directly in this cell. Always empty for branches.
    #[inline]
    pub fn items(&self) -> &[Entry<T>] {
        &self.items
    }

    #[inline]
    pub fn child_pointers(&self) -> Option<&ChildPointers> {
        self.children.as_deref()
    }

    #[inline]
    pub fn total_item_count(&self) -> usize {
        self.total_item_count
    }

    /// Half-open containment test against `[start, end)`.
    #[inline]
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.start).all() && point.cmplt(self.end).all()
    }

    /// The slot of the child whose region holds `position`.
    ///
    /// Compares against the same split planes that bound the child boxes. Positions outside the cell land in the
    /// nearest border slot.
    #[inline]
    pub fn child_index(&self, position: Vec3) -> ChildIndex {
        let [lo, hi] = self.splits;
        ChildGridShape::linearize([
            grid_axis(position.x, lo.x, hi.x),
            grid_axis(position.y, lo.y, hi.y),
            grid_axis(position.z, lo.z, hi.z),
        ]) as ChildIndex
    }

    /// `(start, end)` of the child at `child_index`.
    #[inline]
    pub fn child_bounds(&self, child_index: ChildIndex) -> (Vec3, Vec3) {
        let [x, y, z] = ChildGridShape::delinearize(child_index as u32).map(|i| i as usize);
        let b = self.boundaries();
        (
            Vec3::new(b[x].x, b[y].y, b[z].z),
            Vec3::new(b[x + 1].x, b[y + 1].y, b[z + 1].z),
        )
    }

    /// `(start, end)` of the middle child slot.
    #[inline]
    pub fn central_region(&self) -> (Vec3, Vec3) {
        (self.splits[0], self.splits[1])
    }
}

impl<T> CellAllocator<T> {
    /// Adds `entry` to the subtree at `ptr`, which sits at `depth` (root = 1).
    pub fn add_item(&mut self, ptr: CellPtr, entry: Entry<T>, depth: u32) {
        let limits = *self.limits();
        let cell = self.cell_mut(ptr);
        cell.total_item_count += 1;
        if cell.is_leaf() {
            cell.items.push(entry);
            if cell.items.len() >= limits.subdivide_threshold && depth < limits.max_depth {
                self.subdivide(ptr, depth);
            }
        } else {
            let child_index = cell.child_index(entry.position);
            let child = self.get_or_alloc_child(ptr, child_index);
            self.add_item(child, entry, depth + 1);
        }
    }

    /// Removes the entry matching `(item, position)` from the subtree at `ptr` and returns it.
    ///
    /// Branches whose subtree falls under the merge threshold collapse into a leaf on the way back up, and children left
    /// empty are released.
    pub fn take_item(&mut self, ptr: CellPtr, item: &T, position: Vec3) -> Option<Entry<T>>
    where
        T: PartialEq,
    {
        let cell = self.cell_mut(ptr);
        let Some(children) = cell.children.as_deref() else {
            let found = cell.items.iter().position(|e| e.matches(item, position))?;
            cell.total_item_count -= 1;
            return Some(cell.items.remove(found));
        };

        let child_index = cell.child_index(position);
        let child = children[child_index as usize];
        if child == EMPTY_CELL_PTR {
            return None;
        }
        let entry = self.take_item(child, item, position)?;

        let merge_threshold = self.limits().merge_threshold;
        let cell = self.cell_mut(ptr);
        cell.total_item_count -= 1;
        if cell.total_item_count < merge_threshold {
            self.merge(ptr);
        } else if self.cell(child).total_item_count == 0 {
            self.unlink_child(ptr, child_index as usize);
            self.release_cell(child);
        }
        Some(entry)
    }

    /// Returns true iff an entry matching `(item, position)` was removed.
    #[inline]
    pub fn remove_item(&mut self, ptr: CellPtr, item: &T, position: Vec3) -> bool
    where
        T: PartialEq,
    {
        self.take_item(ptr, item, position).is_some()
    }

    /// Moves the entry matching `(item, from)` to `to`. Returns false if there is no such entry.
    ///
    /// While `from` and `to` route to the same child the move recurses; in a shared leaf the position is overwritten in
    /// place. Otherwise the entry is taken out and re-added from this cell.
    pub fn move_item(&mut self, ptr: CellPtr, item: &T, from: Vec3, to: Vec3, depth: u32) -> bool
    where
        T: PartialEq,
    {
        let cell = self.cell_mut(ptr);
        let Some(children) = cell.children.as_deref() else {
            return match cell.items.iter_mut().find(|e| e.matches(item, from)) {
                Some(entry) => {
                    entry.position = to;
                    true
                }
                None => false,
            };
        };

        let from_index = cell.child_index(from);
        if from_index == cell.child_index(to) {
            let child = children[from_index as usize];
            return child != EMPTY_CELL_PTR && self.move_item(child, item, from, to, depth + 1);
        }

        match self.take_item(ptr, item, from) {
            Some(mut entry) => {
                entry.position = to;
                self.add_item(ptr, entry, depth);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, ptr: CellPtr, item: &T, position: Vec3) -> bool
    where
        T: PartialEq,
    {
        let cell = self.cell(ptr);
        match cell.children.as_deref() {
            None => cell.items.iter().any(|e| e.matches(item, position)),
            Some(children) => {
                let child = children[cell.child_index(position) as usize];
                child != EMPTY_CELL_PTR && self.contains(child, item, position)
            }
        }
    }

    /// Number of cells in the subtree at `ptr`, including itself.
    pub fn cell_count(&self, ptr: CellPtr) -> usize {
        1 + self
            .live_children(ptr)
            .map(|child| self.cell_count(child))
            .sum::<usize>()
    }

    /// Number of levels in the subtree at `ptr`. A leaf has depth 1.
    pub fn depth(&self, ptr: CellPtr) -> u32 {
        1 + self
            .live_children(ptr)
            .map(|child| self.depth(child))
            .max()
            .unwrap_or(0)
    }

    fn live_children(&self, ptr: CellPtr) -> impl Iterator<Item = CellPtr> + '_ {
        self.cell(ptr)
            .child_pointers()
            .into_iter()
            .flatten()
            .copied()
            .filter(|&child| child != EMPTY_CELL_PTR)
    }

    fn get_or_alloc_child(&mut self, parent: CellPtr, child_index: ChildIndex) -> CellPtr {
        let cell = self.cell(parent);
        let children = cell
            .child_pointers()
            .unwrap_or_else(|| panic!("Tried to route into leaf cell {:?}", parent));
        let existing = children[child_index as usize];
        if existing != EMPTY_CELL_PTR {
            return existing;
        }

        let (start, end) = cell.child_bounds(child_index);
        let child = self.alloc_cell(start, end, false);
        self.set_child_pointer(parent, child_index as usize, child);
        child
    }

    /// Turns the leaf at `ptr` into a branch and pushes its items one level down.
    fn subdivide(&mut self, ptr: CellPtr, depth: u32) {
        let children = self.alloc_children();
        let cell = self.cell_mut(ptr);
        debug_assert!(cell.is_leaf());
        cell.children = Some(children);
        let mut items = mem::take(&mut cell.items);
        tracing::trace!(
            start = ?cell.start,
            end = ?cell.end,
            items = items.len(),
            depth,
            "subdividing cell"
        );

        for entry in items.drain(..) {
            let child_index = self.cell(ptr).child_index(entry.position);
            let child = self.get_or_alloc_child(ptr, child_index);
            // The parent total already counts these items.
            self.add_item(child, entry, depth + 1);
        }
        self.recycle_items(items);
    }

    /// Collapses the branch at `ptr` back into a leaf holding every item of its subtree.
    fn merge(&mut self, ptr: CellPtr) {
        let children = self
            .cell_mut(ptr)
            .children
            .take()
            .unwrap_or_else(|| panic!("Tried to merge leaf cell {:?}", ptr));

        let mut items = mem::take(&mut self.cell_mut(ptr).items);
        for &child in children.iter() {
            if child != EMPTY_CELL_PTR {
                self.drain_into(child, &mut items);
            }
        }
        self.recycle_children(children);

        let cell = self.cell_mut(ptr);
        debug_assert_eq!(items.len(), cell.total_item_count);
        tracing::trace!(
            start = ?cell.start,
            end = ?cell.end,
            items = items.len(),
            "merging cell"
        );
        cell.items = items;
    }

    /// Moves every item of the subtree at `ptr` into `out` and releases the subtree.
    fn drain_into(&mut self, ptr: CellPtr, out: &mut Vec<Entry<T>>) {
        let mut items = mem::take(&mut self.cell_mut(ptr).items);
        out.append(&mut items);
        self.cell_mut(ptr).items = items;

        if let Some(children) = self.cell_mut(ptr).children.take() {
            for &child in children.iter() {
                if child != EMPTY_CELL_PTR {
                    self.drain_into(child, out);
                }
            }
            self.recycle_children(children);
        }
        self.release_cell(ptr);
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
