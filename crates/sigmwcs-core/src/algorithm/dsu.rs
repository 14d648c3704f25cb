// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! # Disjoint Sets
//!
//! A growable union-find forest with path compression and union by size.
//! It backs every "merge these two things and remember it" relation in the
//! solver, most notably the absorption of graph units by reduction passes,
//! where merge chains can become arbitrarily deep.
//!
//! ## Usage
//!
//! ```rust
//! use sigmwcs_core::algorithm::dsu::DisjointSets;
//!
//! let mut sets = DisjointSets::new(4);
//! sets.union(0, 1);
//! sets.union(2, 3);
//! assert!(sets.same_set(0, 1));
//! assert!(!sets.same_set(1, 2));
//! assert_eq!(sets.set_size(3), 2);
//! ```

/// A disjoint-set forest over the elements `0..len()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisjointSets {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl DisjointSets {
    /// Creates `n` singleton sets.
    #[inline]
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    /// Creates an empty forest with room for `capacity` elements.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            parent: Vec::with_capacity(capacity),
            size: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    /// Returns `true` if the forest holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Adds a new singleton set and returns its element.
    #[inline]
    pub fn push(&mut self) -> usize {
        let element = self.parent.len();
        self.parent.push(element);
        self.size.push(1);
        element
    }

    /// Returns the representative of the set containing `element`,
    /// compressing the path on the way.
    ///
    /// # Panics
    ///
    /// Panics if `element` is out of bounds.
    pub fn find(&mut self, element: usize) -> usize {
        assert!(
            element < self.parent.len(),
            "called `DisjointSets::find` with element out of bounds: the len is {} but the element is {}",
            self.parent.len(),
            element
        );

        let mut root = element;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        let mut current = element;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }

    /// Returns the representative of the set containing `element` without
    /// compressing paths.
    pub fn find_immutable(&self, element: usize) -> usize {
        assert!(
            element < self.parent.len(),
            "called `DisjointSets::find_immutable` with element out of bounds: the len is {} but the element is {}",
            self.parent.len(),
            element
        );

        let mut root = element;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        root
    }

    /// Merges the sets containing `a` and `b` and returns the representative
    /// of the merged set. The larger set keeps its representative.
    pub fn union(&mut self, a: usize, b: usize) -> usize {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return root_a;
        }

        let (large, small) = if self.size[root_a] >= self.size[root_b] {
            (root_a, root_b)
        } else {
            (root_b, root_a)
        };
        self.parent[small] = large;
        self.size[large] += self.size[small];
        large
    }

    /// Returns `true` if `a` and `b` belong to the same set.
    #[inline]
    pub fn same_set(&mut self, a: usize, b: usize) -> bool {
        self.find(a) == self.find(b)
    }

    /// Returns the size of the set containing `element`.
    #[inline]
    pub fn set_size(&mut self, element: usize) -> usize {
        let root = self.find(element);
        self.size[root]
    }
}

impl std::fmt::Display for DisjointSets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let roots = (0..self.parent.len())
            .filter(|&i| self.parent[i] == i)
            .count();
        write!(f, "DisjointSets(elements: {}, sets: {})", self.len(), roots)
    }
}
