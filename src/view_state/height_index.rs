//! HeightIndex - O(log n) prefix sums and lower_bound via Fenwick tree
//!
//! Provides efficient operations for computing cumulative heights and finding
//! item indices by vertical offset (scroll position).
//!
//! # Complexity
//!
//! - `set`: O(log n)
//! - `prefix_sum`: O(log n)
//! - `lower_bound`: O(log² n)
//! - `push`: O(log n), amortized O(1) extra when the tree grows
//! - `insert` / `remove` / `truncate` at `i`: O(n - i), only nodes at or
//!   after `i` are repaired
//! - `total`: O(1)
//! - `len`: O(1)

/// Fenwick tree of item heights plus the raw heights it was built from.
///
/// The raw heights let structural edits repair the tree from the edit point
/// without re-deriving each height from prefix sums.
#[derive(Debug, Clone, Default)]
pub struct HeightIndex {
    /// Fenwick tree backing storage (0-indexed API over `fenwick::array`).
    /// May be longer than `heights`; the slack holds zero heights.
    tree: Vec<i64>,
    /// Height of each item.
    heights: Vec<u16>,
    /// Sum of `heights`.
    total: usize,
}

impl HeightIndex {
    /// Creates a new HeightIndex with the given initial capacity.
    ///
    /// # Examples
    ///
    /// ```
    /// # use chatlayout::view_state::height_index::HeightIndex;
    /// let index = HeightIndex::new(100);
    /// assert_eq!(index.len(), 0);
    /// assert_eq!(index.total(), 0);
    /// ```
    pub fn new(capacity: usize) -> Self {
        Self {
            tree: vec![0; capacity],
            heights: Vec::with_capacity(capacity),
            total: 0,
        }
    }

    /// Builds an index from a sequence of heights.
    ///
    /// ```
    /// # use chatlayout::view_state::height_index::HeightIndex;
    /// let index = HeightIndex::from_heights([3, 4, 5]);
    /// assert_eq!(index.total(), 12);
    /// ```
    pub fn from_heights(heights: impl IntoIterator<Item = u16>) -> Self {
        let heights: Vec<u16> = heights.into_iter().collect();
        let mut index = Self {
            tree: vec![0; heights.len()],
            total: heights.iter().map(|&h| usize::from(h)).sum(),
            heights,
        };
        index.repair_from(0);
        index
    }

    /// Sets the height at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use chatlayout::view_state::height_index::HeightIndex;
    /// let mut index = HeightIndex::new(10);
    /// index.push(5);
    /// index.set(0, 10);
    /// assert_eq!(index.prefix_sum(0), 10);
    /// ```
    pub fn set(&mut self, index: usize, height: u16) {
        assert!(
            index < self.len(),
            "index {} out of bounds (len: {})",
            index,
            self.len()
        );

        let current = self.heights[index];
        if current == height {
            return;
        }
        self.heights[index] = height;
        self.total = self.total - usize::from(current) + usize::from(height);
        let delta = i64::from(height) - i64::from(current);
        fenwick::array::update(&mut self.tree, index, delta);
    }

    /// Returns the cumulative height up to and including the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use chatlayout::view_state::height_index::HeightIndex;
    /// let index = HeightIndex::from_heights([3, 4, 5]);
    /// assert_eq!(index.prefix_sum(0), 3);
    /// assert_eq!(index.prefix_sum(1), 7);
    /// assert_eq!(index.prefix_sum(2), 12);
    /// ```
    pub fn prefix_sum(&self, index: usize) -> usize {
        assert!(
            index < self.len(),
            "index {} out of bounds (len: {})",
            index,
            self.len()
        );

        let sum = fenwick::array::prefix_sum(&self.tree, index);
        usize::try_from(sum).unwrap_or(0)
    }

    /// Vertical offset of the top edge of `index`: the sum of all heights
    /// before it. `offset_of(len())` equals `total()`.
    ///
    /// ```
    /// # use chatlayout::view_state::height_index::HeightIndex;
    /// let index = HeightIndex::from_heights([3, 4, 5]);
    /// assert_eq!(index.offset_of(0), 0);
    /// assert_eq!(index.offset_of(2), 7);
    /// assert_eq!(index.offset_of(3), 12);
    /// ```
    pub fn offset_of(&self, index: usize) -> usize {
        match index {
            0 => 0,
            i if i >= self.len() => self.total,
            i => self.prefix_sum(i - 1),
        }
    }

    /// Binary search for the first index where `prefix_sum(index) > value`.
    ///
    /// Returns the index of the item containing the given vertical offset.
    ///
    /// # Returns
    ///
    /// - `Some(index)` if there exists an index where `prefix_sum(index) > value`
    /// - `None` if `value >= total()` or the index is empty
    ///
    /// # Examples
    ///
    /// ```
    /// # use chatlayout::view_state::height_index::HeightIndex;
    /// let index = HeightIndex::from_heights([10, 20, 15]);
    /// assert_eq!(index.lower_bound(0), Some(0));
    /// assert_eq!(index.lower_bound(10), Some(1));
    /// assert_eq!(index.lower_bound(30), Some(2));
    /// assert_eq!(index.lower_bound(100), None);
    /// ```
    pub fn lower_bound(&self, value: usize) -> Option<usize> {
        if value >= self.total {
            return None;
        }

        // Item i covers [prefix_sum(i-1), prefix_sum(i))
        let mut left = 0;
        let mut right = self.len();

        while left < right {
            let mid = left + (right - left) / 2;
            if self.prefix_sum(mid) > value {
                right = mid;
            } else {
                left = mid + 1;
            }
        }

        (left < self.len()).then_some(left)
    }

    /// Returns the total cumulative height of all items.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Returns the number of items in the index.
    pub fn len(&self) -> usize {
        self.heights.len()
    }

    /// Returns true if the index contains no items.
    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    /// Appends an item with the given height.
    ///
    /// ```
    /// # use chatlayout::view_state::height_index::HeightIndex;
    /// let mut index = HeightIndex::new(1);
    /// index.push(5);
    /// index.push(3);
    /// index.push(2);
    /// assert_eq!(index.len(), 3);
    /// assert_eq!(index.prefix_sum(2), 10);
    /// ```
    pub fn push(&mut self, height: u16) {
        self.heights.push(height);
        self.total += usize::from(height);
        let idx = self.heights.len() - 1;

        if idx >= self.tree.len() {
            self.grow_and_repair(idx);
            return;
        }
        fenwick::array::update(&mut self.tree, idx, i64::from(height));
    }

    /// Inserts an item at `index`, shifting later items down.
    ///
    /// # Panics
    ///
    /// Panics if `index > len()`.
    ///
    /// ```
    /// # use chatlayout::view_state::height_index::HeightIndex;
    /// let mut index = HeightIndex::from_heights([3, 4, 5]);
    /// index.insert(1, 10);
    /// assert_eq!(index.offset_of(2), 13);
    /// ```
    pub fn insert(&mut self, index: usize, height: u16) {
        if index == self.len() {
            self.push(height);
            return;
        }
        self.heights.insert(index, height);
        self.total += usize::from(height);
        if self.heights.len() > self.tree.len() {
            self.grow_and_repair(index);
        } else {
            self.repair_from(index);
        }
    }

    /// Removes the item at `index`, returning its height.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn remove(&mut self, index: usize) -> u16 {
        let height = self.heights.remove(index);
        self.total -= usize::from(height);
        self.repair_from(index);
        height
    }

    /// Drops every item from `len` onwards.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len() {
            return;
        }
        let dropped: usize = self.heights[len..].iter().map(|&h| usize::from(h)).sum();
        self.heights.truncate(len);
        self.total -= dropped;
        self.repair_from(len);
    }

    fn grow_and_repair(&mut self, first: usize) {
        let old_len = self.tree.len();
        let new_len = (old_len.max(1) * 2).max(self.heights.len());
        self.tree.resize(new_len, 0);
        self.repair_from(first.min(old_len));
    }

    /// Recomputes every node at or after `first`.
    ///
    /// Node `j` covers heights `[j & (j + 1), j]`, so nodes before `first`
    /// never include a shifted height. Each node is its own height plus its
    /// children, which all sit below it and are repaired first.
    fn repair_from(&mut self, first: usize) {
        for j in first..self.tree.len() {
            let start = j & (j + 1);
            let mut sum = self.heights.get(j).map_or(0, |&h| i64::from(h));
            let mut child = j.wrapping_sub(1);
            while j > start && child >= start && child != usize::MAX {
                sum += self.tree[child];
                child = (child & (child + 1)).wrapping_sub(1);
            }
            self.tree[j] = sum;
        }
    }
}
