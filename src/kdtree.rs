//! 3-D k-d tree over RGB points for nearest-palette-entry lookup.
//!
//! Nodes live in a flat arena and refer to each other by index. Queries return
//! the index of the closest point in the slice the tree was built from; among
//! points at equal distance the lowest index wins, so results match a linear
//! scan exactly.

use std::cmp::Ordering;

type NodeId = usize;

#[derive(Debug, Clone)]
struct Node {
    /// Index into `KdTree::points`
    point: usize,
    axis: usize,
    left: Option<NodeId>,
    right: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub struct KdTree {
    points: Vec<[f32; 3]>,
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl KdTree {
    pub fn build(points: &[[f32; 3]]) -> Self {
        let mut nodes = Vec::with_capacity(points.len());
        let mut order: Vec<usize> = (0..points.len()).collect();
        let root = build_range(&mut nodes, points, &mut order, 0);
        Self {
            points: points.to_vec(),
            nodes,
            root,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Index of the point closest to `target`, or `None` for an empty tree.
    ///
    /// Always a valid index into the build slice, even when distances are NaN.
    pub fn nearest(&self, target: [f32; 3]) -> Option<usize> {
        let root = self.root?;
        let first = self.nodes[root].point;
        let mut best = (distance_sq(self.points[first], target), first);
        self.search(root, target, &mut best);
        Some(best.1)
    }

    fn search(&self, id: NodeId, target: [f32; 3], best: &mut (f32, usize)) {
        let node = &self.nodes[id];
        let p = self.points[node.point];
        let d = distance_sq(p, target);
        let closer = match d.total_cmp(&best.0) {
            Ordering::Less => true,
            Ordering::Equal => node.point < best.1,
            Ordering::Greater => false,
        };
        if closer {
            *best = (d, node.point);
        }

        let diff = target[node.axis] - p[node.axis];
        let (near, far) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(n) = near {
            self.search(n, target, best);
        }
        // Equal-distance points on the far side can still win the index tie-break.
        // A NaN on either side of the comparison means no pruning.
        if let Some(f) = far {
            if (diff * diff).partial_cmp(&best.0) != Some(Ordering::Greater) {
                self.search(f, target, best);
            }
        }
    }
}

fn build_range(nodes: &mut Vec<Node>, points: &[[f32; 3]], order: &mut [usize], depth: usize) -> Option<NodeId> {
    if order.is_empty() {
        return None;
    }
    let axis = depth % 3;
    order.sort_by(|&a, &b| points[a][axis].total_cmp(&points[b][axis]).then(a.cmp(&b)));
    let median = order.len() / 2;

    let id = nodes.len();
    nodes.push(Node {
        point: order[median],
        axis,
        left: None,
        right: None,
    });

    let (lower, rest) = order.split_at_mut(median);
    let upper = &mut rest[1..];
    let left = build_range(nodes, points, lower, depth + 1);
    let right = build_range(nodes, points, upper, depth + 1);
    nodes[id].left = left;
    nodes[id].right = right;
    Some(id)
}

#[inline]
pub fn distance_sq(a: [f32; 3], b: [f32; 3]) -> f32 {
    let dr = a[0] - b[0];
    let dg = a[1] - b[1];
    let db = a[2] - b[2];
    dr * dr + dg * dg + db * db
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn brute_force(points: &[[f32; 3]], target: [f32; 3]) -> usize {
        let mut best = 0;
        let mut best_d = f32::INFINITY;
        for (i, &p) in points.iter().enumerate() {
            let d = distance_sq(p, target);
            if d < best_d {
                best_d = d;
                best = i;
            }
        }
        best
    }

    #[test]
    fn test_empty_tree() {
        let tree = KdTree::build(&[]);
        assert!(tree.is_empty());
        assert_eq!(tree.nearest([0.5, 0.5, 0.5]), None);
    }

    #[test]
    fn test_single_point() {
        let tree = KdTree::build(&[[0.2, 0.4, 0.6]]);
        assert_eq!(tree.nearest([1.0, 1.0, 1.0]), Some(0));
    }

    #[test]
    fn test_primary_colors() {
        let points = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 1.0, 1.0],
        ];
        let tree = KdTree::build(&points);
        assert_eq!(tree.nearest([0.9, 0.1, 0.1]), Some(1));
        assert_eq!(tree.nearest([0.1, 0.8, 0.2]), Some(2));
        assert_eq!(tree.nearest([0.1, 0.1, 0.7]), Some(3));
        assert_eq!(tree.nearest([0.8, 0.9, 0.9]), Some(4));
        assert_eq!(tree.nearest([0.05, 0.05, 0.05]), Some(0));
    }

    #[test]
    fn test_duplicate_points_resolve_to_lowest_index() {
        let points = [[0.5, 0.5, 0.5], [0.1, 0.1, 0.1], [0.5, 0.5, 0.5], [0.5, 0.5, 0.5]];
        let tree = KdTree::build(&points);
        assert_eq!(tree.nearest([0.5, 0.5, 0.5]), Some(0));
        assert_eq!(tree.nearest([0.6, 0.6, 0.6]), Some(0));
    }

    #[test]
    fn test_nan_distances_return_valid_index() {
        let points = [[0.1, 0.2, 0.3], [0.9, 0.8, 0.7], [0.5, 0.5, 0.5]];
        let tree = KdTree::build(&points);
        let index = tree.nearest([f32::NAN, 0.0, 0.0]).unwrap();
        assert!(index < points.len());
        assert_eq!(tree.nearest([f32::NAN; 3]), Some(index));
    }

    #[test]
    fn test_nan_point_never_beats_finite_point() {
        let points = [[f32::NAN, 0.0, 0.0], [0.0, 0.0, 0.0], [1.0, 1.0, 1.0]];
        let tree = KdTree::build(&points);
        assert_eq!(tree.nearest([0.1, 0.1, 0.1]), Some(1));
        assert_eq!(tree.nearest([0.9, 0.9, 0.9]), Some(2));
    }

    proptest! {
        #[test]
        fn prop_matches_linear_scan(
            points in prop::collection::vec(prop::array::uniform3(0u8..=16), 1..64),
            target in prop::array::uniform3(0u8..=16),
        ) {
            // Coarse grid values force plenty of distance ties
            let points: Vec<[f32; 3]> = points
                .iter()
                .map(|p| [p[0] as f32 / 16.0, p[1] as f32 / 16.0, p[2] as f32 / 16.0])
                .collect();
            let target = [target[0] as f32 / 16.0, target[1] as f32 / 16.0, target[2] as f32 / 16.0];
            let tree = KdTree::build(&points);
            prop_assert_eq!(tree.nearest(target), Some(brute_force(&points, target)));
        }
    }
}
