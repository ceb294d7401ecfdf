//! Adaptive point trees for sphere, box and shape casts.
//!
//! Store any type at [`Vec3`](glam::Vec3) positions in a [`Tree`](crate::Tree). Every cell of the tree divides its region
//! into a 3x3x3 grid, so a branch has up to [`CHILDREN`](crate::CHILDREN) children. Leaves split once they collect
//! [`subdivide_threshold`](crate::TreeConfig::subdivide_threshold) items and branches collapse again once their subtree
//! drops below [`merge_threshold`](crate::TreeConfig::merge_threshold). The root grows to cover any position you add and
//! shrinks back when the outliers are removed.
//!
//! Casts are pull-based [`Cursor`](crate::Cursor)s: [`Inclusion`](crate::Inclusion) cursors yield the items inside a
//! [`Shape`](crate::Shape), [`Exclusion`](crate::Exclusion) cursors yield the items outside it. A cursor can be restarted
//! with new parameters without allocating.
//!
//! # Performance
//!
//! This structure is optimized for frequent small casts over a set of points that moves around. Cells live in a slab
//! addressed by [`CellPtr`](crate::CellPtr), and the item buffers and child arrays of released cells are pooled by the
//! [`CellAllocator`](crate::CellAllocator), so steady-state churn does not touch the global allocator. Cells that are
//! fully inside a cast shape are enumerated without testing a single point.
//!
//! - add/remove/move: O(depth + subdivide_threshold)
//! - cast: O(visited cells + items in visited leaves)
//! - memory usage per cell:
//!   - **leaf**: `size_of::<Cell<T>>() + items * size_of::<Entry<T>>()` bytes
//!   - **branch**: `size_of::<Cell<T>>() + CHILDREN * 4` bytes

mod allocator;
mod cell;
mod config;
mod cursor;
mod error;
mod query;
mod shape;
mod tree;

pub use allocator::{CellAllocator, CellPtr, ChildPointers, EMPTY_CELL_PTR};
pub use cell::*;
pub use config::*;
pub use cursor::*;
pub use error::*;
pub use query::*;
pub use shape::*;
pub use tree::*;

pub use glam;

/// A linear index of a cell relative to its parent, `x + 3 * y + 9 * z`.
pub type ChildIndex = u8;

/// Cells per axis that a branch divides its region into.
pub const GRID_FACTOR: u32 = 3;

/// Child slots of a branch.
pub const CHILDREN: usize = 27;

/// The slot at grid coordinates `(1, 1, 1)`.
pub const CENTER_CHILD: ChildIndex = 13;

/// Maps between child grid coordinates and [`ChildIndex`].
pub type ChildGridShape = ndshape::ConstShape3u32<3, 3, 3>;
