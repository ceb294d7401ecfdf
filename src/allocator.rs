use crate::cell::{grid_splits, Cell, Entry};
use crate::config::CellLimits;
use crate::CHILDREN;

use glam::Vec3;
use slab::Slab;

/// Points to a cell owned by a [`CellAllocator`].
pub type CellPtr = u32;

/// A [`CellPtr`] that doesn't point to anything. Used for empty child slots.
pub const EMPTY_CELL_PTR: CellPtr = CellPtr::MAX;

/// One slot per child of a 3x3x3 branch. Some may be [`EMPTY_CELL_PTR`].
pub type ChildPointers = [CellPtr; CHILDREN];

/// Allocates and recycles cells for one [`Tree`](crate::Tree).
///
/// Cells live in a slab and are addressed by [`CellPtr`]; freed slab slots are reused by the next allocation. On top of
/// that, the item buffers of released cells and the child arrays of collapsed branches are kept in capped free-lists so
/// that subdivide/merge churn does not hit the global allocator. Anything beyond the caps in [`CellLimits`] is dropped.
#[derive(Clone, Debug)]
pub struct CellAllocator<T> {
    cells: Slab<Cell<T>>,
    spare_children: Vec<Box<ChildPointers>>,
    spare_items: Vec<Vec<Entry<T>>>,
    limits: CellLimits,
}

impl<T> Default for CellAllocator<T> {
    fn default() -> Self {
        Self::new(CellLimits::default())
    }
}

impl<T> CellAllocator<T> {
    pub fn new(limits: CellLimits) -> Self {
        Self {
            cells: Default::default(),
            spare_children: Default::default(),
            spare_items: Default::default(),
            limits,
        }
    }

    #[inline]
    pub fn limits(&self) -> &CellLimits {
        &self.limits
    }

    pub(crate) fn set_limits(&mut self, limits: CellLimits) {
        self.limits = limits;
        self.spare_items.truncate(limits.max_pooled_cells);
        self.spare_children.truncate(limits.max_pooled_child_arrays);
    }

    /// Number of live cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of item buffers waiting for reuse.
    #[inline]
    pub fn pooled_cells(&self) -> usize {
        self.spare_items.len()
    }

    /// Number of child arrays waiting for reuse.
    #[inline]
    pub fn pooled_child_arrays(&self) -> usize {
        self.spare_children.len()
    }

    /// Creates a cell covering `[start, end)` with evenly spaced split planes. With `with_children` the cell starts out
    /// as an empty branch.
    pub fn alloc_cell(&mut self, start: Vec3, end: Vec3, with_children: bool) -> CellPtr {
        let items = self.alloc_items();
        let children = with_children.then(|| self.alloc_children());
        let ptr = self.cells.insert(Cell {
            start,
            end,
            splits: grid_splits(start, end),
            items,
            children,
            total_item_count: 0,
        });
        debug_assert!(ptr < EMPTY_CELL_PTR as usize);
        ptr as CellPtr
    }

    /// Releases `ptr` and every descendant. Items still stored in the subtree are dropped.
    pub fn release_cell(&mut self, ptr: CellPtr) {
        let Cell {
            items, children, ..
        } = self.cells.remove(ptr as usize);
        self.recycle_items(items);
        if let Some(children) = children {
            for &child in children.iter() {
                if child != EMPTY_CELL_PTR {
                    self.release_cell(child);
                }
            }
            self.recycle_children(children);
        }
    }

    /// Drops every cell while keeping the pools warm.
    pub fn clear(&mut self) {
        let cells = std::mem::take(&mut self.cells);
        for (_, cell) in cells {
            self.recycle_items(cell.items);
            if let Some(children) = cell.children {
                self.recycle_children(children);
            }
        }
    }

    #[inline]
    pub fn contains_cell(&self, ptr: CellPtr) -> bool {
        self.cells.contains(ptr as usize)
    }

    #[inline]
    pub fn get(&self, ptr: CellPtr) -> Option<&Cell<T>> {
        self.cells.get(ptr as usize)
    }

    /// # Panics
    ///
    /// If `ptr` is not a live cell.
    #[inline]
    pub fn cell(&self, ptr: CellPtr) -> &Cell<T> {
        &self.cells[ptr as usize]
    }

    #[inline]
    pub(crate) fn cell_mut(&mut self, ptr: CellPtr) -> &mut Cell<T> {
        &mut self.cells[ptr as usize]
    }

    #[inline]
    pub(crate) fn children_mut_or_panic(&mut self, ptr: CellPtr) -> &mut ChildPointers {
        self.cell_mut(ptr)
            .children
            .as_deref_mut()
            .unwrap_or_else(|| panic!("Tried to access children of leaf cell {:?}", ptr))
    }

    #[inline]
    pub(crate) fn set_child_pointer(&mut self, parent: CellPtr, child_index: usize, child: CellPtr) {
        self.children_mut_or_panic(parent)[child_index] = child;
    }

    #[inline]
    pub(crate) fn unlink_child(&mut self, parent: CellPtr, child_index: usize) {
        self.set_child_pointer(parent, child_index, EMPTY_CELL_PTR)
    }

    pub(crate) fn alloc_children(&mut self) -> Box<ChildPointers> {
        match self.spare_children.pop() {
            Some(mut children) => {
                children.fill(EMPTY_CELL_PTR);
                children
            }
            None => Box::new([EMPTY_CELL_PTR; CHILDREN]),
        }
    }

    pub(crate) fn recycle_children(&mut self, children: Box<ChildPointers>) {
        if self.spare_children.len() < self.limits.max_pooled_child_arrays {
            self.spare_children.push(children);
        }
    }

    pub(crate) fn alloc_items(&mut self) -> Vec<Entry<T>> {
        self.spare_items.pop().unwrap_or_default()
    }

    pub(crate) fn recycle_items(&mut self, mut items: Vec<Entry<T>>) {
        // Buffers that never allocated are not worth keeping.
        if items.capacity() > 0 && self.spare_items.len() < self.limits.max_pooled_cells {
            items.clear();
            self.spare_items.push(items);
        }
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
