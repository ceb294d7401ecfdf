//! Tree configuration: the initial region, split/merge thresholds and pool caps.

use crate::TreeError;

use glam::Vec3;

/// Configuration for a [`Tree`](crate::Tree).
///
/// The gap between `subdivide_threshold` and `merge_threshold` is what keeps a cell from splitting and merging on every
/// other insert/remove near the boundary, so `merge_threshold` must stay below `subdivide_threshold`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TreeConfig {
    /// Minimum corner of the smallest region the root will ever cover.
    pub initial_offset: Vec3,

    /// Size of the smallest region the root will ever cover. The root grows from here and never shrinks below it.
    pub initial_size: Vec3,

    /// A leaf with at least this many items splits into 27 children.
    pub subdivide_threshold: usize,

    /// A branch whose subtree holds fewer than this many items collapses back into a leaf.
    pub merge_threshold: usize,

    /// Leaves at this depth (root = 1) never split, whatever their item count.
    pub max_depth: u32,

    /// Item buffers of released cells kept for reuse.
    pub max_pooled_cells: usize,

    /// Child arrays kept for reuse.
    pub max_pooled_child_arrays: usize,
}

impl TreeConfig {
    pub const DEFAULT_SUBDIVIDE_THRESHOLD: usize = 128;
    pub const DEFAULT_MERGE_THRESHOLD: usize = 52;
    pub const DEFAULT_MAX_DEPTH: u32 = 16;
    pub const DEFAULT_MAX_POOLED_CELLS: usize = 1024;
    pub const DEFAULT_MAX_POOLED_CHILD_ARRAYS: usize = 128;

    /// Default thresholds with an initial region of `size` centered on the origin.
    pub fn centered(size: Vec3) -> Self {
        Self::new(size * -0.5, size)
    }

    /// Default thresholds with an initial region `[offset, offset + size)`.
    pub fn new(initial_offset: Vec3, initial_size: Vec3) -> Self {
        Self {
            initial_offset,
            initial_size,
            ..Default::default()
        }
    }

    /// Maximum corner (exclusive) of the initial region.
    #[inline]
    pub fn initial_end(&self) -> Vec3 {
        self.initial_offset + self.initial_size
    }

    pub fn with_subdivide_threshold(mut self, threshold: usize) -> Self {
        self.subdivide_threshold = threshold;
        self
    }

    pub fn with_merge_threshold(mut self, threshold: usize) -> Self {
        self.merge_threshold = threshold;
        self
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_pool_limits(mut self, max_pooled_cells: usize, max_pooled_child_arrays: usize) -> Self {
        self.max_pooled_cells = max_pooled_cells;
        self.max_pooled_child_arrays = max_pooled_child_arrays;
        self
    }

    /// Checks that a tree built from this config can hold items.
    pub fn validate(&self) -> Result<(), TreeError> {
        if !self.initial_offset.is_finite() || !self.initial_size.is_finite() {
            return Err(TreeError::InvalidConfig("initial region must be finite"));
        }
        if self.initial_size.cmple(Vec3::ZERO).any() {
            return Err(TreeError::InvalidConfig("initial size must be positive on every axis"));
        }
        if self.initial_end().cmple(self.initial_offset).any() {
            return Err(TreeError::InvalidConfig("initial size vanishes next to the initial offset"));
        }
        if self.subdivide_threshold == 0 {
            return Err(TreeError::InvalidConfig("subdivide threshold must be at least 1"));
        }
        if self.merge_threshold >= self.subdivide_threshold {
            return Err(TreeError::InvalidConfig(
                "merge threshold must be below the subdivide threshold",
            ));
        }
        if self.max_depth == 0 {
            return Err(TreeError::InvalidConfig("max depth must be at least 1"));
        }
        Ok(())
    }

    pub(crate) fn cell_limits(&self) -> CellLimits {
        CellLimits {
            subdivide_threshold: self.subdivide_threshold,
            merge_threshold: self.merge_threshold,
            max_depth: self.max_depth,
            max_pooled_cells: self.max_pooled_cells,
            max_pooled_child_arrays: self.max_pooled_child_arrays,
        }
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            initial_offset: Vec3::splat(-0.5),
            initial_size: Vec3::ONE,
            subdivide_threshold: Self::DEFAULT_SUBDIVIDE_THRESHOLD,
            merge_threshold: Self::DEFAULT_MERGE_THRESHOLD,
            max_depth: Self::DEFAULT_MAX_DEPTH,
            max_pooled_cells: Self::DEFAULT_MAX_POOLED_CELLS,
            max_pooled_child_arrays: Self::DEFAULT_MAX_POOLED_CHILD_ARRAYS,
        }
    }
}

/// The part of [`TreeConfig`] the cell allocator needs while restructuring.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CellLimits {
    pub subdivide_threshold: usize,
    pub merge_threshold: usize,
    pub max_depth: u32,
    pub max_pooled_cells: usize,
    pub max_pooled_child_arrays: usize,
}

impl Default for CellLimits {
    fn default() -> Self {
        TreeConfig::default().cell_limits()
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_thresholds() {
        let config = TreeConfig::default();
        assert_eq!(config.subdivide_threshold, 128);
        assert_eq!(config.merge_threshold, 52);
        assert_eq!(config.max_depth, 16);
        assert_eq!(config.max_pooled_cells, 1024);
        assert_eq!(config.max_pooled_child_arrays, 128);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn centered_region() {
        let config = TreeConfig::centered(Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(config.initial_offset, Vec3::new(-1.0, -2.0, -3.0));
        assert_eq!(config.initial_size, Vec3::new(2.0, 4.0, 6.0));
    }

    #[test]
    fn rejects_bad_configs() {
        let flat = TreeConfig::centered(Vec3::new(1.0, 0.0, 1.0));
        assert!(matches!(flat.validate(), Err(TreeError::InvalidConfig(_))));

        let infinite = TreeConfig::new(Vec3::splat(f32::NEG_INFINITY), Vec3::ONE);
        assert!(matches!(infinite.validate(), Err(TreeError::InvalidConfig(_))));

        let no_hysteresis = TreeConfig::default()
            .with_subdivide_threshold(10)
            .with_merge_threshold(10);
        assert!(matches!(no_hysteresis.validate(), Err(TreeError::InvalidConfig(_))));

        let lost_in_rounding = TreeConfig::new(Vec3::splat(1.0e9), Vec3::ONE);
        assert!(matches!(lost_in_rounding.validate(), Err(TreeError::InvalidConfig(_))));

        let no_depth = TreeConfig::default().with_max_depth(0);
        assert!(matches!(no_depth.validate(), Err(TreeError::InvalidConfig(_))));
    }
}
