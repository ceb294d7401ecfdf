//! Restartable depth-first cursors over a [`Tree`].
//!
//! A [`Cursor`] pairs a [`Shape`] with a [`Walk`] strategy. [`Inclusion`] yields the items inside the shape and prunes
//! cells that miss it; [`Exclusion`] yields the items outside the shape and prunes cells swallowed by it. Both walk the
//! same fixed-capacity frame stack, so a cursor can be restarted with new parameters any number of times without
//! allocating.

use crate::allocator::{CellPtr, EMPTY_CELL_PTR};
use crate::cell::Entry;
use crate::shape::{Aabb, Everywhere, Shape, Sphere};
use crate::{Tree, CHILDREN};

use glam::Vec3;
use smallvec::SmallVec;
use std::iter::FusedIterator;
use std::marker::PhantomData;

/// Frames kept inline by a [`Cursor`]. The depth cap keeps real trees far below this.
pub const MAX_FRAMES: usize = 64;

/// Decides which cells a [`Cursor`] enters and which items it yields.
pub trait Walk {
    /// Returns `Some(fully_inside)` if the cell `[min, max]` should be entered, where `fully_inside` lets every point in
    /// it be accepted without testing. `parent_fully_inside` is the parent frame's flag (false for the root).
    fn enter_cell<S: Shape>(shape: &S, min: Vec3, max: Vec3, parent_fully_inside: bool) -> Option<bool>;

    fn accept_point<S: Shape>(shape: &S, point: Vec3, fully_inside: bool) -> bool;
}

/// Yields items inside the shape.
#[derive(Clone, Copy, Debug, Default)]
pub struct Inclusion;

impl Walk for Inclusion {
    #[inline]
    fn enter_cell<S: Shape>(shape: &S, min: Vec3, max: Vec3, parent_fully_inside: bool) -> Option<bool> {
        if parent_fully_inside {
            Some(true)
        } else if shape.intersects_aabb(min, max) {
            Some(shape.contains_aabb(min, max))
        } else {
            None
        }
    }

    #[inline]
    fn accept_point<S: Shape>(shape: &S, point: Vec3, fully_inside: bool) -> bool {
        fully_inside || shape.contains_point(point)
    }
}

/// Yields items outside the shape.
#[derive(Clone, Copy, Debug, Default)]
pub struct Exclusion;

impl Walk for Exclusion {
    #[inline]
    fn enter_cell<S: Shape>(shape: &S, min: Vec3, max: Vec3, _parent_fully_inside: bool) -> Option<bool> {
        shape.is_aabb_not_fully_inside(min, max).then_some(false)
    }

    #[inline]
    fn accept_point<S: Shape>(shape: &S, point: Vec3, _fully_inside: bool) -> bool {
        shape.is_point_outside(point)
    }
}

#[derive(Clone, Copy, Debug)]
struct Frame {
    cell: CellPtr,
    /// Next child slot for branches, next item for leaves.
    next: usize,
    fully_inside: bool,
}

/// A pull-based cast over a [`Tree`].
///
/// The cursor borrows the tree, so the tree can't be restructured underneath it.
pub struct Cursor<'t, T, S, W = Inclusion> {
    tree: &'t Tree<T>,
    shape: S,
    stack: SmallVec<[Frame; MAX_FRAMES]>,
    current: Option<&'t Entry<T>>,
    walk: PhantomData<W>,
}

pub type InclusionCursor<'t, T, S> = Cursor<'t, T, S, Inclusion>;
pub type ExclusionCursor<'t, T, S> = Cursor<'t, T, S, Exclusion>;

pub type SphereCast<'t, T> = Cursor<'t, T, Sphere, Inclusion>;
pub type AabbCast<'t, T> = Cursor<'t, T, Aabb, Inclusion>;
pub type ShapeCast<'t, T, S> = Cursor<'t, T, S, Inclusion>;
pub type InverseSphereCast<'t, T> = Cursor<'t, T, Sphere, Exclusion>;
pub type InverseAabbCast<'t, T> = Cursor<'t, T, Aabb, Exclusion>;
pub type InverseShapeCast<'t, T, S> = Cursor<'t, T, S, Exclusion>;

/// Every item of a tree in depth-first order.
pub type Iter<'t, T> = Cursor<'t, T, Everywhere, Inclusion>;

impl<'t, T, S, W> Cursor<'t, T, S, W>
where
    S: Shape,
    W: Walk,
{
    pub fn new(tree: &'t Tree<T>, shape: S) -> Self {
        let mut cursor = Self {
            tree,
            shape,
            stack: SmallVec::new(),
            current: None,
            walk: PhantomData,
        };
        cursor.reset();
        cursor
    }

    /// Starts over with a new shape, reusing the frame stack.
    pub fn restart(&mut self, shape: S) {
        self.shape = shape;
        self.reset();
    }

    /// Starts over with the current shape.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.current = None;

        let root_ptr = self.tree.root_ptr();
        let root = self.tree.allocator().cell(root_ptr);
        if let Some(fully_inside) = W::enter_cell(&self.shape, root.start(), root.end(), false) {
            self.stack.push(Frame {
                cell: root_ptr,
                next: 0,
                fully_inside,
            });
        }
    }

    #[inline]
    pub fn shape(&self) -> &S {
        &self.shape
    }

    #[inline]
    pub fn tree(&self) -> &'t Tree<T> {
        self.tree
    }

    /// The entry most recently yielded by [`advance`](Self::advance).
    #[inline]
    pub fn current(&self) -> Option<&'t Entry<T>> {
        self.current
    }

    /// Steps to the next accepted item. Returns `None` once the walk is exhausted, until the next restart.
    pub fn advance(&mut self) -> Option<&'t T> {
        let cells = self.tree.allocator();

        while let Some(frame) = self.stack.last_mut() {
            let cell = cells.cell(frame.cell);
            match cell.child_pointers() {
                None => {
                    while let Some(entry) = cell.items().get(frame.next) {
                        frame.next += 1;
                        if W::accept_point(&self.shape, entry.position, frame.fully_inside) {
                            self.current = Some(entry);
                            return Some(&entry.item);
                        }
                    }
                    self.stack.pop();
                }
                Some(children) => {
                    let mut descend = None;
                    while frame.next < CHILDREN {
                        let child_ptr = children[frame.next];
                        frame.next += 1;
                        if child_ptr == EMPTY_CELL_PTR {
                            continue;
                        }
                        let child = cells.cell(child_ptr);
                        if let Some(fully_inside) =
                            W::enter_cell(&self.shape, child.start(), child.end(), frame.fully_inside)
                        {
                            descend = Some(Frame {
                                cell: child_ptr,
                                next: 0,
                                fully_inside,
                            });
                            break;
                        }
                    }
                    match descend {
                        Some(child_frame) => self.stack.push(child_frame),
                        None => {
                            self.stack.pop();
                        }
                    }
                }
            }
        }

        self.current = None;
        None
    }
}

impl<'t, T, S, W> Iterator for Cursor<'t, T, S, W>
where
    S: Shape,
    W: Walk,
{
    type Item = &'t T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.advance()
    }
}

impl<'t, T, S, W> FusedIterator for Cursor<'t, T, S, W>
where
    S: Shape,
    W: Walk,
{
}

/// Every [`Entry`] of a tree in depth-first order.
pub struct Entries<'t, T> {
    cursor: Iter<'t, T>,
}

impl<'t, T> Entries<'t, T> {
    pub(crate) fn new(tree: &'t Tree<T>) -> Self {
        Self {
            cursor: Cursor::new(tree, Everywhere),
        }
    }
}

impl<'t, T> Iterator for Entries<'t, T> {
    type Item = &'t Entry<T>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.advance()?;
        self.cursor.current()
    }
}

impl<'t, T> FusedIterator for Entries<'t, T> {}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
