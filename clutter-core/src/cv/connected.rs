// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use std::cmp::Ordering;
use std::collections::HashMap;

/// A union-find structure for finding and merging connected components
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    /// Initialize a new union-find object with `n` elements in `n` sets
    pub fn new(n: usize) -> Self {
        UnionFind {
            parent: (0..n).collect(),
            rank: vec![1; n],
        }
    }

    /// Find the root of the set containing `x`
    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        // Path compression
        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }

        root
    }

    /// Merge sets containing `x` and `y`
    pub fn union(&mut self, x: usize, y: usize) {
        let root_x = self.find(x);
        let root_y = self.find(y);

        if root_x != root_y {
            match self.rank[root_x].cmp(&self.rank[root_y]) {
                Ordering::Greater => self.parent[root_y] = root_x,
                Ordering::Less => self.parent[root_x] = root_y,
                Ordering::Equal => {
                    self.parent[root_y] = root_x;
                    self.rank[root_x] += 1;
                }
            }
        }
    }
}

/// Two-pass 8-connected component labeling of non-zero pixels
///
/// Labels are consecutive, starting at 1 in raster order of each
/// component's first pixel. Background stays 0.
///
/// # Arguments
///
/// * `width` - Width of buffer
/// * `height` - Height of buffer
/// * `buffer` - A row-major buffer where non-zero values are foreground
///
/// # Examples
///
/// ```
/// use clutter_core::cv::connected_components;
///
/// let buffer: Vec<u32> = vec![1, 1, 0, 0, 0, 0, 1, 0, 1];
/// let labels = connected_components(3, 3, &buffer);
/// assert_eq!(labels, [1, 1, 0, 0, 0, 0, 2, 0, 3]);
///
/// let buffer: Vec<u32> = vec![1, 0, 0, 0, 1, 0, 0, 0, 1];
/// let labels = connected_components(3, 3, &buffer);
/// assert_eq!(labels, [1, 0, 0, 0, 1, 0, 0, 0, 1]);
/// ```
pub fn connected_components(width: u32, height: u32, buffer: &[u32]) -> Vec<u32> {
    let width = width as usize;
    let height = height as usize;

    let mut labels = vec![0usize; width * height];
    let mut uf = UnionFind::new(width * height + 1);
    let mut next_label = 1;

    // Provisional labels (1st pass)
    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            if buffer[idx] == 0 {
                continue;
            }

            let mut neighbors = [0usize; 4];
            let mut n = 0;

            let mut visit = |neighbor: usize| {
                if labels[neighbor] > 0 {
                    neighbors[n] = labels[neighbor];
                    n += 1;
                }
            };

            if x > 0 {
                visit(idx - 1);
            }

            if y > 0 {
                visit(idx - width);

                if x > 0 {
                    visit(idx - width - 1);
                }

                if x + 1 < width {
                    visit(idx - width + 1);
                }
            }

            if n == 0 {
                labels[idx] = next_label;
                next_label += 1;
                continue;
            }

            let min_label = *neighbors[..n].iter().min().unwrap_or(&0);
            labels[idx] = min_label;

            for &label in &neighbors[..n] {
                uf.union(min_label, label);
            }
        }
    }

    // Resolve equivalences and compact labels (2nd pass)
    let mut compact: HashMap<usize, u32> = HashMap::new();

    labels
        .into_iter()
        .map(|label| {
            if label == 0 {
                return 0;
            }

            let root = uf.find(label);
            let next = compact.len() as u32 + 1;
            *compact.entry(root).or_insert(next)
        })
        .collect()
}
