use crate::allocator::{CellAllocator, CellPtr, EMPTY_CELL_PTR};
use crate::cell::{grid_splits, Cell, Entry};
use crate::cursor::{Entries, Iter};
use crate::shape::Everywhere;
use crate::{TreeConfig, TreeError, CENTER_CHILD};

use glam::Vec3;
use smallvec::SmallVec;

/// A dynamic set of `(item, position)` pairs, indexed for sphere, box and shape casts.
///
/// The root cell always covers every stored position. Adding a point outside the root grows the root by a factor of 3
/// around its center until the point fits; removing items shrinks it back towards the initial region, never below it.
///
/// An item may be stored at several positions at once. Removing or moving it always names the exact position it was
/// added at.
#[derive(Clone, Debug)]
pub struct Tree<T> {
    allocator: CellAllocator<T>,
    root: CellPtr,
    config: TreeConfig,
    /// Root regions `(start, end)` the root has grown out of, innermost first. Empty while the root covers the initial
    /// region. The last entry is always the root's central region.
    grown_from: SmallVec<[(Vec3, Vec3); 8]>,
}

impl<T> Tree<T> {
    /// A tree whose root starts out as `[initial_offset, initial_offset + initial_size)`, with default thresholds.
    ///
    /// # Panics
    ///
    /// If the region is not finite or `initial_size` is not positive on every axis.
    pub fn new(initial_offset: Vec3, initial_size: Vec3) -> Self {
        Self::with_config(TreeConfig::new(initial_offset, initial_size))
            .unwrap_or_else(|e| panic!("Tried to create a tree with {e}"))
    }

    pub fn with_config(config: TreeConfig) -> Result<Self, TreeError> {
        Self::with_allocator(config, CellAllocator::default())
    }

    /// Builds the tree on top of an existing allocator so its pools can be reused. Cells still in the allocator are
    /// dropped.
    pub fn with_allocator(config: TreeConfig, mut allocator: CellAllocator<T>) -> Result<Self, TreeError> {
        config.validate()?;
        allocator.clear();
        allocator.set_limits(config.cell_limits());
        let root = allocator.alloc_cell(config.initial_offset, config.initial_end(), false);
        Ok(Self {
            allocator,
            root,
            config,
            grown_from: SmallVec::new(),
        })
    }

    /// Drops every item and hands back the allocator with its pools intact.
    pub fn into_allocator(mut self) -> CellAllocator<T> {
        self.allocator.clear();
        self.allocator
    }

    #[inline]
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    #[inline]
    pub fn allocator(&self) -> &CellAllocator<T> {
        &self.allocator
    }

    #[inline]
    pub fn root_ptr(&self) -> CellPtr {
        self.root
    }

    #[inline]
    pub fn root(&self) -> &Cell<T> {
        self.allocator.cell(self.root)
    }

    #[inline]
    pub fn root_start(&self) -> Vec3 {
        self.root().start()
    }

    #[inline]
    pub fn root_size(&self) -> Vec3 {
        self.root().size()
    }

    #[inline]
    pub fn root_end(&self) -> Vec3 {
        self.root().end()
    }

    /// Number of stored `(item, position)` pairs.
    #[inline]
    pub fn count(&self) -> usize {
        self.root().total_item_count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Levels below and including the root. A lone root cell has depth 1.
    pub fn depth(&self) -> u32 {
        self.allocator.depth(self.root)
    }

    pub fn total_cell_count(&self) -> usize {
        self.allocator.cell_count(self.root)
    }

    /// Stores `item` at `position`, growing the root until it covers `position`.
    ///
    /// # Panics
    ///
    /// If `position` is not finite.
    pub fn add(&mut self, item: T, position: Vec3) {
        self.grow_to_fit(position);
        self.allocator.add_item(self.root, Entry::new(item, position), 1);
    }

    /// Removes the pair `(item, position)`. Returns false if it isn't stored.
    pub fn remove(&mut self, item: &T, position: Vec3) -> bool
    where
        T: PartialEq,
    {
        self.take(item, position).is_some()
    }

    /// Removes the pair `(item, position)` and returns the stored item.
    pub fn take(&mut self, item: &T, position: Vec3) -> Option<T>
    where
        T: PartialEq,
    {
        let entry = self.allocator.take_item(self.root, item, position)?;
        self.shrink_to_fit();
        Some(entry.item)
    }

    /// Moves the pair `(item, from)` to `to`. Returns false if `(item, from)` isn't stored.
    ///
    /// # Panics
    ///
    /// If `to` is not finite.
    pub fn move_item(&mut self, item: &T, from: Vec3, to: Vec3) -> bool
    where
        T: PartialEq,
    {
        self.grow_to_fit(to);
        let moved = self.allocator.move_item(self.root, item, from, to, 1);
        self.shrink_to_fit();
        moved
    }

    pub fn contains(&self, item: &T, position: Vec3) -> bool
    where
        T: PartialEq,
    {
        self.allocator.contains(self.root, item, position)
    }

    /// Drops every item and resets the root to the initial region.
    pub fn clear(&mut self) {
        self.allocator.clear();
        self.root = self
            .allocator
            .alloc_cell(self.config.initial_offset, self.config.initial_end(), false);
        self.grown_from.clear();
    }

    /// Every stored item in depth-first order.
    #[inline]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self, Everywhere)
    }

    /// Every stored [`Entry`] in depth-first order.
    #[inline]
    pub fn entries(&self) -> Entries<'_, T> {
        Entries::new(self)
    }

    /// Visit the root and all descendant cells in depth-first order, along with their depth (root = 1).
    ///
    /// If `visitor` returns [`VisitCommand::SkipDescendants`], children of that cell will not be visited.
    pub fn visit_cells(&self, mut visitor: impl FnMut(&Cell<T>, u32) -> VisitCommand) {
        let mut stack = SmallVec::<[(CellPtr, u32); 32]>::new();
        stack.push((self.root, 1));
        while let Some((ptr, depth)) = stack.pop() {
            let cell = self.allocator.cell(ptr);
            if let VisitCommand::Continue = visitor(cell, depth) {
                if let Some(children) = cell.child_pointers() {
                    // Reversed so that children pop in slot order.
                    for &child in children.iter().rev() {
                        if child != EMPTY_CELL_PTR {
                            stack.push((child, depth + 1));
                        }
                    }
                }
            }
        }
    }

    fn grow_to_fit(&mut self, position: Vec3) {
        assert!(
            position.is_finite(),
            "Tried to insert non-finite position {position}"
        );
        while !self.root().contains_point(position) {
            self.grow();
        }
    }

    fn shrink_to_fit(&mut self) {
        while self.can_shrink() {
            self.shrink();
        }
    }

    /// Triples the root around its center. The old root region becomes the exact central slot of the new root.
    fn grow(&mut self) {
        let root = self.root();
        let (start, end) = (root.start(), root.end());
        let size = end - start;
        let (new_start, new_end) = (start - size, end + size);
        assert!(
            new_start.is_finite() && new_end.is_finite(),
            "Tree bounds overflowed while growing to [{new_start}, {new_end})"
        );
        assert!(
            (new_end - new_start).cmpgt(size).all(),
            "Tree bounds stopped growing at [{start}, {end})"
        );

        if root.is_leaf() {
            let root = self.allocator.cell_mut(self.root);
            root.start = new_start;
            root.end = new_end;
            root.splits = [start, end];
        } else {
            let total_item_count = root.total_item_count();
            let new_root = self.allocator.alloc_cell(new_start, new_end, true);
            let cell = self.allocator.cell_mut(new_root);
            cell.splits = [start, end];
            cell.total_item_count = total_item_count;
            self.allocator
                .set_child_pointer(new_root, CENTER_CHILD as usize, self.root);
            self.root = new_root;
        }
        self.grown_from.push((start, end));
        tracing::debug!(
            start = ?new_start,
            end = ?new_end,
            growth = self.grown_from.len(),
            "grew tree root"
        );
    }

    /// Split planes a root covering `[start, end)` gets when `grown_from` is the growth history below it.
    fn root_splits(grown_from: &[(Vec3, Vec3)], start: Vec3, end: Vec3) -> [Vec3; 2] {
        match grown_from.last() {
            Some(&(inner_start, inner_end)) => [inner_start, inner_end],
            None => grid_splits(start, end),
        }
    }

    /// True if the root is larger than the initial region and everything stored fits in its middle slot.
    fn can_shrink(&self) -> bool {
        let Some((&(start, end), below)) = self.grown_from.split_last() else {
            return false;
        };
        let root = self.root();
        match root.child_pointers() {
            None => root
                .items()
                .iter()
                .all(|e| e.position.cmpge(start).all() && e.position.cmplt(end).all()),
            Some(children) => {
                let only_center = children
                    .iter()
                    .enumerate()
                    .all(|(i, &child)| i == CENTER_CHILD as usize || child == EMPTY_CELL_PTR);
                let center = children[CENTER_CHILD as usize];
                // A branch can only become the root if its split planes line up with the next smaller region.
                only_center
                    && (center == EMPTY_CELL_PTR || {
                        let center = self.allocator.cell(center);
                        center.is_leaf() || center.splits == Self::root_splits(below, start, end)
                    })
            }
        }
    }

    /// Replaces the root with its middle slot.
    fn shrink(&mut self) {
        let Some((start, end)) = self.grown_from.pop() else {
            return;
        };
        let splits = Self::root_splits(&self.grown_from, start, end);

        if self.root().is_leaf() {
            let root = self.allocator.cell_mut(self.root);
            root.start = start;
            root.end = end;
            root.splits = splits;
        } else {
            let center = self
                .root()
                .child_pointers()
                .map_or(EMPTY_CELL_PTR, |children| children[CENTER_CHILD as usize]);
            let old_root = self.root;
            self.root = if center == EMPTY_CELL_PTR {
                self.allocator.alloc_cell(start, end, false)
            } else {
                self.allocator.unlink_child(old_root, CENTER_CHILD as usize);
                center
            };
            self.allocator.release_cell(old_root);

            let root = self.allocator.cell_mut(self.root);
            debug_assert_eq!((root.start, root.end), (start, end));
            if root.is_leaf() {
                root.splits = splits;
            }
        }
        tracing::debug!(
            start = ?start,
            end = ?end,
            growth = self.grown_from.len(),
            "shrank tree root"
        );
    }
}

impl<'t, T> IntoIterator for &'t Tree<T> {
    type Item = &'t T;
    type IntoIter = Iter<'t, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VisitCommand {
    Continue,
    SkipDescendants,
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
