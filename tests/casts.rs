use point_octree::glam::Vec3;
use point_octree::{Aabb, Shape, Sphere, Tree, TreeConfig, VisitCommand};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SIZES: [usize; 5] = [0, 1, 10, 250, 1000];

fn random_point(rng: &mut StdRng, extent: f32) -> Vec3 {
    Vec3::new(
        rng.random_range(-extent..extent),
        rng.random_range(-extent..extent),
        rng.random_range(-extent..extent),
    )
}

fn random_in(rng: &mut StdRng, min: Vec3, max: Vec3) -> Vec3 {
    Vec3::new(
        rng.random_range(min.x..max.x),
        rng.random_range(min.y..max.y),
        rng.random_range(min.z..max.z),
    )
}

/// Adds a point on the faces and split planes of every cell currently in the tree.
fn add_boundary_points(tree: &mut Tree<usize>, points: &mut Vec<Vec3>) {
    let mut on_boundaries = Vec::new();
    tree.visit_cells(|cell, _| {
        let [start, lo, hi, _] = cell.boundaries();
        on_boundaries.extend([start, lo, hi, Vec3::new(lo.x, hi.y, start.z)]);
        VisitCommand::Continue
    });
    for p in on_boundaries {
        tree.add(points.len(), p);
        points.push(p);
    }
}

/// A tree over an uneven random region, holding points on cell boundaries both before and after the root has grown
/// several times.
fn uneven_tree(rng: &mut StdRng) -> (Tree<usize>, Vec<Vec3>) {
    let offset = random_point(rng, 3.0);
    let size = random_in(rng, Vec3::splat(0.1), Vec3::splat(3.0));
    let config = TreeConfig::new(offset, size)
        .with_subdivide_threshold(4)
        .with_merge_threshold(2);
    let mut tree = Tree::with_config(config).unwrap();

    let mut points = Vec::new();
    for _ in 0..40 {
        let p = random_in(rng, offset, offset + size);
        tree.add(points.len(), p);
        points.push(p);
    }
    add_boundary_points(&mut tree, &mut points);
    for _ in 0..10 {
        let p = random_point(rng, 40.0);
        tree.add(points.len(), p);
        points.push(p);
    }
    add_boundary_points(&mut tree, &mut points);
    (tree, points)
}

/// A tree of `n` points spread well past the initial region, so the root has to grow.
fn random_tree(rng: &mut StdRng, n: usize) -> (Tree<usize>, Vec<Vec3>) {
    let config = TreeConfig::centered(Vec3::splat(4.0))
        .with_subdivide_threshold(16)
        .with_merge_threshold(6);
    let mut tree = Tree::with_config(config).unwrap();
    let points: Vec<Vec3> = (0..n).map(|_| random_point(rng, 50.0)).collect();
    for (i, &p) in points.iter().enumerate() {
        tree.add(i, p);
    }
    (tree, points)
}

fn sorted<'a>(items: impl Iterator<Item = &'a usize>) -> Vec<usize> {
    let mut items: Vec<usize> = items.copied().collect();
    items.sort_unstable();
    items
}

fn brute_force(points: &[Vec3], keep: impl Fn(Vec3) -> bool) -> Vec<usize> {
    points
        .iter()
        .enumerate()
        .filter(|(_, p)| keep(**p))
        .map(|(i, _)| i)
        .collect()
}

fn random_aabb(rng: &mut StdRng) -> (Vec3, Vec3) {
    let a = random_point(rng, 60.0);
    let b = random_point(rng, 60.0);
    (a.min(b), a.max(b))
}

#[test]
fn sphere_cast_matches_brute_force() {
    let mut rng = StdRng::seed_from_u64(1);
    for n in SIZES {
        let (tree, points) = random_tree(&mut rng, n);
        assert_eq!(tree.count(), n);

        for _ in 0..20 {
            let center = random_point(&mut rng, 60.0);
            let radius = rng.random_range(0.0..40.0);
            let sphere = Sphere::new(center, radius);

            let found = sorted(tree.sphere_cast(center, radius).unwrap());
            assert_eq!(found, brute_force(&points, |p| sphere.contains_point(p)), "n = {n}");

            let outside = sorted(tree.inverse_sphere_cast(center, radius).unwrap());
            assert_eq!(outside, brute_force(&points, |p| !sphere.contains_point(p)), "n = {n}");
        }
    }
}

#[test]
fn aabb_cast_matches_brute_force() {
    let mut rng = StdRng::seed_from_u64(2);
    for n in SIZES {
        let (tree, points) = random_tree(&mut rng, n);

        for _ in 0..20 {
            let (min, max) = random_aabb(&mut rng);
            let aabb = Aabb::new(min, max);

            let found = sorted(tree.aabb_cast(min, max).unwrap());
            assert_eq!(found, brute_force(&points, |p| aabb.contains_point(p)), "n = {n}");

            let outside = sorted(tree.inverse_aabb_cast(min, max).unwrap());
            assert_eq!(outside, brute_force(&points, |p| aabb.is_point_outside(p)), "n = {n}");
        }
    }
}

#[test]
fn inclusion_and_exclusion_partition_the_tree() {
    let mut rng = StdRng::seed_from_u64(3);
    let (tree, _) = random_tree(&mut rng, 1000);

    let sphere = Sphere::new(Vec3::new(5.0, -3.0, 10.0), 25.0);
    let mut all: Vec<usize> = tree.shape_cast(sphere).copied().collect();
    all.extend(tree.inverse_shape_cast(sphere).copied());
    all.sort_unstable();
    assert_eq!(all, (0..1000).collect::<Vec<_>>());
}

#[test]
fn add_then_remove_everything() {
    let mut rng = StdRng::seed_from_u64(4);
    let (mut tree, points) = random_tree(&mut rng, 1000);
    assert!(tree.depth() > 1);

    for (i, &p) in points.iter().enumerate() {
        assert!(tree.contains(&i, p));
    }
    for (i, &p) in points.iter().enumerate().rev() {
        assert!(tree.remove(&i, p));
        assert_eq!(tree.count(), i);
    }

    assert!(tree.is_empty());
    assert_eq!(tree.total_cell_count(), 1);
    assert_eq!(tree.root_start(), tree.config().initial_offset);
    assert_eq!(tree.root_size(), tree.config().initial_size);
}

#[test]
fn moved_items_are_found_at_their_new_position() {
    let mut rng = StdRng::seed_from_u64(5);
    let (mut tree, mut points) = random_tree(&mut rng, 250);

    for _ in 0..3 {
        for (i, p) in points.iter_mut().enumerate() {
            // Small steps mostly stay in the same cell, big ones cross the tree.
            let step = if i % 4 == 0 { 30.0 } else { 1.0 };
            let to = *p + random_point(&mut rng, step);
            assert!(tree.move_item(&i, *p, to));
            *p = to;
        }

        assert_eq!(tree.count(), points.len());
        for (i, &p) in points.iter().enumerate() {
            assert!(tree.contains(&i, p));
            assert!(tree.root().contains_point(p));
            let hit: Vec<_> = tree.sphere_cast(p, 0.0).unwrap().copied().collect();
            assert!(hit.contains(&i));
        }
    }
}

#[test]
fn uneven_regions_keep_boundary_points_reachable() {
    let mut rng = StdRng::seed_from_u64(6);
    for _ in 0..10 {
        let (mut tree, points) = uneven_tree(&mut rng);
        let config = tree.config().clone();
        assert_eq!(tree.count(), points.len());

        for (i, &p) in points.iter().enumerate() {
            assert!(tree.contains(&i, p), "item {i} at {p} unreachable");
            let found = sorted(tree.aabb_cast(p, p).unwrap());
            assert_eq!(found, brute_force(&points, |q| q == p), "point cast at {p}");
        }

        for _ in 0..20 {
            let center = random_point(&mut rng, 45.0);
            let radius = rng.random_range(0.0..30.0);
            let sphere = Sphere::new(center, radius);
            let found = sorted(tree.sphere_cast(center, radius).unwrap());
            assert_eq!(found, brute_force(&points, |p| sphere.contains_point(p)));

            let (min, max) = random_aabb(&mut rng);
            let aabb = Aabb::new(min, max);
            let outside = sorted(tree.inverse_aabb_cast(min, max).unwrap());
            assert_eq!(outside, brute_force(&points, |p| aabb.is_point_outside(p)));
        }

        for (i, &p) in points.iter().enumerate() {
            assert!(tree.remove(&i, p), "item {i} at {p} not removable");
        }
        assert!(tree.is_empty());
        assert_eq!(tree.total_cell_count(), 1);
        assert_eq!(tree.root_start(), config.initial_offset);
        assert_eq!(tree.root_end(), config.initial_end());
    }
}

#[test]
fn growth_keeps_earlier_items_in_place() {
    let config = TreeConfig::new(Vec3::new(0.1, -0.7, 0.33), Vec3::new(0.7, 0.3, 1.1))
        .with_subdivide_threshold(4)
        .with_merge_threshold(2);
    let mut tree = Tree::with_config(config.clone()).unwrap();
    let points = [
        config.initial_offset,
        config.initial_offset + config.initial_size * (1.0 / 3.0),
        config.initial_offset + config.initial_size * (2.0 / 3.0),
        config.initial_offset + config.initial_size * 0.999,
        Vec3::new(0.1, -0.6, 1.0),
    ];
    for (i, &p) in points.iter().enumerate() {
        tree.add(i, p);
    }
    assert!(!tree.root().is_leaf());

    tree.add(points.len(), Vec3::new(-30.0, 12.0, 7.5));
    for (i, &p) in points.iter().enumerate() {
        assert!(tree.contains(&i, p));
    }
    let mut entries: Vec<_> = tree.entries().map(|e| (e.item, e.position)).collect();
    entries.sort_unstable_by_key(|&(item, _)| item);
    assert_eq!(&entries[..points.len()], &points.iter().copied().enumerate().collect::<Vec<_>>()[..]);
}

#[test]
fn growth_is_idempotent() {
    let mut tree = Tree::<u32>::with_config(TreeConfig::centered(Vec3::ONE)).unwrap();
    let far = Vec3::new(100.0, -20.0, 3.0);

    tree.add(0, far);
    let (start, size) = (tree.root_start(), tree.root_size());
    tree.add(1, far);
    tree.add(2, far * 0.5);

    assert_eq!(tree.root_start(), start);
    assert_eq!(tree.root_size(), size);
    assert!(tree.root().contains_point(far));
}

#[test]
fn dense_cluster_respects_depth_limit() {
    let config = TreeConfig::centered(Vec3::splat(10.0))
        .with_subdivide_threshold(4)
        .with_merge_threshold(1)
        .with_max_depth(5);
    let mut tree = Tree::with_config(config).unwrap();
    for i in 0..200 {
        tree.add(i, Vec3::splat(1.0));
    }

    assert_eq!(tree.depth(), 5);
    assert_eq!(tree.aabb_cast(Vec3::ONE, Vec3::ONE).unwrap().count(), 200);
    assert_eq!(tree.sphere_cast(Vec3::ZERO, 1.0).unwrap().count(), 0);
}
