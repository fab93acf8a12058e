//! Toroidal doubly-linked sparse matrix for Knuth's Algorithm X ("Dancing Links").
//!
//! The classic presentation of DLX links nodes together with raw pointers in four
//! directions. Here the nodes live in a single arena (`Vec<Node>`) and links are indices into
//! that arena, which keeps the whole matrix one contiguous allocation and sidesteps the
//! `Rc<RefCell<_>>` tangle a pointer-based port would otherwise need.
//!
//! A [`Matrix`] has one root (index 0), a left/right ring of column headers, and a up/down ring
//! of row headers. Each column header additionally anchors an up/down ring of data nodes (the
//! cells of that column); each row header anchors a left/right ring of data nodes (the cells of
//! that row). A node is its own row header iff `node.row == node`'s id, and its own column
//! header iff `node.col == node`'s id — the same trick the row/column headers use to mark
//! themselves as ring sentinels.

use std::fmt;

/// Index into the node arena. Not exposed as a raw integer so callers can't construct one out of
/// thin air, but cheap enough to copy freely.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn idx(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Every matrix has exactly one root, created at index 0.
pub const ROOT: NodeId = NodeId(0);

pub type ColumnId = NodeId;
pub type RowId = NodeId;

#[derive(Clone)]
struct Node {
    left: NodeId,
    right: NodeId,
    up: NodeId,
    down: NodeId,
    row: NodeId,
    col: NodeId,
    count: usize,
}

impl Node {
    fn sentinel(id: NodeId) -> Self {
        Node {
            left: id,
            right: id,
            up: id,
            down: id,
            row: id,
            col: id,
            count: 0,
        }
    }
}

/// A toroidal exact-cover matrix whose rows carry an opaque, caller-defined symbol.
///
/// `Sym` is typically a small enum identifying what a row means in the caller's domain
/// (`schedule-solver` uses `Arrangement(..)` / `Vacation(..)`, see its `model` module).
pub struct Matrix<Sym> {
    nodes: Vec<Node>,
    symbols: Vec<Option<Sym>>,
}

impl<Sym> Default for Matrix<Sym> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Sym> Matrix<Sym> {
    pub fn new() -> Self {
        Matrix {
            nodes: vec![Node::sentinel(ROOT)],
            symbols: vec![None],
        }
    }

    fn alloc(&mut self) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::sentinel(id));
        self.symbols.push(None);
        id
    }

    fn link_lr(&mut self, id: NodeId, anchor: NodeId) {
        let anchor_left = self.nodes[anchor.idx()].left;
        self.nodes[id.idx()].left = anchor_left;
        self.nodes[id.idx()].right = anchor;
        self.nodes[anchor_left.idx()].right = id;
        self.nodes[anchor.idx()].left = id;
    }

    fn link_ud(&mut self, id: NodeId, anchor: NodeId) {
        let anchor_up = self.nodes[anchor.idx()].up;
        self.nodes[id.idx()].up = anchor_up;
        self.nodes[id.idx()].down = anchor;
        self.nodes[anchor_up.idx()].down = id;
        self.nodes[anchor.idx()].up = id;
    }

    fn unlink_lr(&mut self, id: NodeId) {
        let (l, r) = (self.nodes[id.idx()].left, self.nodes[id.idx()].right);
        self.nodes[l.idx()].right = r;
        self.nodes[r.idx()].left = l;
    }

    fn relink_lr(&mut self, id: NodeId) {
        let (l, r) = (self.nodes[id.idx()].left, self.nodes[id.idx()].right);
        self.nodes[l.idx()].right = id;
        self.nodes[r.idx()].left = id;
    }

    fn unlink_ud(&mut self, id: NodeId) {
        let (u, d) = (self.nodes[id.idx()].up, self.nodes[id.idx()].down);
        self.nodes[u.idx()].down = d;
        self.nodes[d.idx()].up = u;
        let col = self.nodes[id.idx()].col;
        self.nodes[col.idx()].count -= 1;
    }

    fn relink_ud(&mut self, id: NodeId) {
        let (u, d) = (self.nodes[id.idx()].up, self.nodes[id.idx()].down);
        self.nodes[u.idx()].down = id;
        self.nodes[d.idx()].up = id;
        let col = self.nodes[id.idx()].col;
        self.nodes[col.idx()].count += 1;
    }

    /// Appends a new column header to the root's left/right ring.
    pub fn create_column(&mut self) -> ColumnId {
        let id = self.alloc();
        self.link_lr(id, ROOT);
        id
    }

    /// Appends a new row header to the root's up/down ring, tagged with its symbol.
    pub fn create_row(&mut self, symbol: Sym) -> RowId {
        let id = self.alloc();
        self.link_ud(id, ROOT);
        self.symbols[id.idx()] = Some(symbol);
        id
    }

    /// Inserts a data node at the intersection of `row` and `col`, incrementing `col`'s count.
    pub fn add_node(&mut self, row: RowId, col: ColumnId) -> NodeId {
        let id = self.alloc();
        self.nodes[id.idx()].row = row;
        self.nodes[id.idx()].col = col;
        self.link_lr(id, row);
        self.link_ud(id, col);
        self.nodes[col.idx()].count += 1;
        id
    }

    /// All other nodes sharing `anchor`'s column ring, in down-then-wrap order. Walks the ring
    /// lazily, one `down` link at a time -- nothing is collected up front. Only sound where the
    /// ring isn't mutated mid-walk, since the returned iterator borrows `self`; `cover`/`uncover`
    /// and the solver's search loop mutate the matrix as they go and use `down`/`up`/`right`/
    /// `left` directly instead (see below).
    pub fn iter_col(&self, anchor: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut cur = anchor;
        std::iter::from_fn(move || {
            let n = self.nodes[cur.idx()].down;
            if n == anchor {
                None
            } else {
                cur = n;
                Some(n)
            }
        })
    }

    /// All other nodes sharing `anchor`'s row ring, in right-then-wrap order. Same laziness and
    /// caveats as `iter_col`.
    pub fn iter_row(&self, anchor: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut cur = anchor;
        std::iter::from_fn(move || {
            let n = self.nodes[cur.idx()].right;
            if n == anchor {
                None
            } else {
                cur = n;
                Some(n)
            }
        })
    }

    /// All live column headers, left-to-right off the root.
    pub fn columns(&self) -> Vec<ColumnId> {
        self.iter_row(ROOT).collect()
    }

    pub fn count(&self, col: ColumnId) -> usize {
        self.nodes[col.idx()].count
    }

    /// The node directly below `id` in its column's up/down ring (may be the column header
    /// itself, if `id` is the ring's last data node).
    pub fn down(&self, id: NodeId) -> NodeId {
        self.nodes[id.idx()].down
    }

    /// The node directly above `id` in its column's up/down ring.
    pub fn up(&self, id: NodeId) -> NodeId {
        self.nodes[id.idx()].up
    }

    /// The node directly to the right of `id` in its row's left/right ring.
    pub fn right(&self, id: NodeId) -> NodeId {
        self.nodes[id.idx()].right
    }

    /// The node directly to the left of `id` in its row's left/right ring.
    pub fn left(&self, id: NodeId) -> NodeId {
        self.nodes[id.idx()].left
    }

    /// True for the sentinel node of a row ring — the row header appearing as a member of its
    /// own left/right ring, not a real data cell.
    pub fn is_row_header(&self, id: NodeId) -> bool {
        self.nodes[id.idx()].row == id
    }

    pub fn col_of(&self, id: NodeId) -> ColumnId {
        self.nodes[id.idx()].col
    }

    pub fn row_of(&self, id: NodeId) -> RowId {
        self.nodes[id.idx()].row
    }

    pub fn symbol(&self, row: RowId) -> &Sym {
        self.symbols[row.idx()]
            .as_ref()
            .expect("NodeId does not reference a row header")
    }

    /// All columns are covered: the root's right ring is empty.
    pub fn is_solved(&self) -> bool {
        self.nodes[ROOT.idx()].right == ROOT
    }

    /// The column with the fewest live data nodes, ties broken by left-to-right order. This is
    /// Knuth's "S" heuristic; picking the most-constrained column first is what makes the search
    /// tractable in practice.
    pub fn select_column(&self) -> Option<ColumnId> {
        self.columns().into_iter().min_by_key(|c| self.count(*c))
    }

    /// Unlinks `col` from the root ring, then unlinks every row that has a cell in `col` from all
    /// of that row's *other* columns. `uncover` is the exact inverse, run in reverse order.
    ///
    /// Walks both rings by chasing `down`/`right` links one node at a time rather than through
    /// `iter_col`/`iter_row`, because those borrow `self` for the walk's lifetime and this method
    /// needs `&mut self` (via `unlink_ud`) in the middle of the walk. Each `next` pointer is read
    /// into a local before any unlinking happens in that iteration, same as `cover_col`/`hide_row`
    /// in a classic arena-of-indices DLX port.
    pub fn cover(&mut self, col: ColumnId) {
        self.unlink_lr(col);
        let mut r = self.down(col);
        while r != col {
            let next_r = self.down(r);
            let mut n = self.right(r);
            while n != r {
                let next_n = self.right(n);
                if !self.is_row_header(n) {
                    self.unlink_ud(n);
                }
                n = next_n;
            }
            r = next_r;
        }
    }

    pub fn uncover(&mut self, col: ColumnId) {
        let mut r = self.up(col);
        while r != col {
            let next_r = self.up(r);
            let mut n = self.left(r);
            while n != r {
                let next_n = self.left(n);
                if !self.is_row_header(n) {
                    self.relink_ud(n);
                }
                n = next_n;
            }
            r = next_r;
        }
        self.relink_lr(col);
    }

    /// Number of nodes allocated so far (root + columns + rows + data cells). Used for sizing
    /// logs, not correctness.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Walks every reachable node and asserts the toroidal pointer identities hold. Used by
    /// tests, not by the solver — a production build never calls this on a hot path.
    #[doc(hidden)]
    pub fn check_toroidal_integrity(&self) {
        for (i, node) in self.nodes.iter().enumerate() {
            let id = NodeId(i as u32);
            assert_eq!(self.nodes[node.left.idx()].right, id, "left.right != self at {id:?}");
            assert_eq!(self.nodes[node.right.idx()].left, id, "right.left != self at {id:?}");
            assert_eq!(self.nodes[node.up.idx()].down, id, "up.down != self at {id:?}");
            assert_eq!(self.nodes[node.down.idx()].up, id, "down.up != self at {id:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Builds a small dense matrix: `rows` rows, each covering every one of `cols` columns, plus
    /// one row per column covering only that column (so the matrix is always solvable and every
    /// column always has at least one live node).
    fn build_dense(rows: usize, cols: usize) -> (Matrix<(usize, usize)>, Vec<ColumnId>) {
        let mut m = Matrix::new();
        let col_ids: Vec<ColumnId> = (0..cols).map(|_| m.create_column()).collect();
        for r in 0..rows {
            let row_id = m.create_row((r, usize::MAX));
            for &c in &col_ids {
                m.add_node(row_id, c);
            }
        }
        for (c_idx, &c) in col_ids.iter().enumerate() {
            let row_id = m.create_row((usize::MAX, c_idx));
            m.add_node(row_id, c);
        }
        (m, col_ids)
    }

    #[test]
    fn new_matrix_is_solved() {
        let m: Matrix<()> = Matrix::new();
        assert!(m.is_solved());
    }

    #[test]
    fn create_column_appears_in_root_ring() {
        let mut m: Matrix<()> = Matrix::new();
        let a = m.create_column();
        let b = m.create_column();
        assert_eq!(m.columns(), vec![a, b]);
        assert!(!m.is_solved());
    }

    #[test]
    fn add_node_increments_column_count() {
        let mut m: Matrix<&str> = Matrix::new();
        let col = m.create_column();
        assert_eq!(m.count(col), 0);
        let row = m.create_row("only-row");
        m.add_node(row, col);
        assert_eq!(m.count(col), 1);
    }

    #[test]
    fn cover_removes_column_and_conflicting_rows() {
        let (mut m, cols) = build_dense(3, 2);
        let before = m.columns();
        m.cover(cols[0]);
        assert_eq!(m.columns(), vec![cols[1]]);
        m.check_toroidal_integrity();
        m.uncover(cols[0]);
        assert_eq!(m.columns(), before);
    }

    #[test]
    fn cover_then_uncover_restores_row_ring_membership() {
        let (mut m, cols) = build_dense(4, 3);
        let rows_in_col1_before: Vec<NodeId> = m.iter_col(cols[1]).collect();
        m.cover(cols[0]);
        m.uncover(cols[0]);
        let rows_in_col1_after: Vec<NodeId> = m.iter_col(cols[1]).collect();
        assert_eq!(rows_in_col1_before, rows_in_col1_after);
    }

    proptest! {
        /// Toroidal integrity: after any sequence of balanced cover/uncover calls, every node's
        /// four links point back at a consistent ring.
        #[test]
        fn toroidal_integrity_after_random_cover_uncover(
            rows in 1usize..8,
            cols in 1usize..6,
            picks in proptest::collection::vec(0usize..6, 0..10),
        ) {
            let (mut m, col_ids) = build_dense(rows, cols);
            m.check_toroidal_integrity();
            let mut stack = Vec::new();
            for p in picks {
                if p < col_ids.len() && m.columns().contains(&col_ids[p]) {
                    m.cover(col_ids[p]);
                    m.check_toroidal_integrity();
                    stack.push(col_ids[p]);
                }
            }
            while let Some(c) = stack.pop() {
                m.uncover(c);
                m.check_toroidal_integrity();
            }
        }

        /// cover/uncover symmetry: uncovering a freshly-covered column restores the exact set of
        /// live columns and the exact membership of every surviving column's row ring.
        #[test]
        fn cover_uncover_is_symmetric(rows in 1usize..6, cols in 2usize..5, which in 0usize..5) {
            let (mut m, col_ids) = build_dense(rows, cols);
            let which = which % col_ids.len();
            let target = col_ids[which];

            let columns_before = m.columns();
            let other_memberships_before: Vec<Vec<NodeId>> = col_ids
                .iter()
                .filter(|c| **c != target)
                .map(|c| m.iter_col(*c).collect())
                .collect();

            m.cover(target);
            m.uncover(target);

            let columns_after = m.columns();
            let other_memberships_after: Vec<Vec<NodeId>> = col_ids
                .iter()
                .filter(|c| **c != target)
                .map(|c| m.iter_col(*c).collect())
                .collect();

            prop_assert_eq!(columns_before, columns_after);
            prop_assert_eq!(other_memberships_before, other_memberships_after);
        }
    }
}
