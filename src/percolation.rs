use crate::union_find::WeightedQuickUnion;
use thiserror::Error;

/// Index of the virtual site every open top-row site is joined to
const TOP: usize = 0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PercolationError {
    #[error("{what} must be greater than 0, got {value}")]
    InvalidArgument { what: &'static str, value: usize },
    #[error("grid size {n} is too large: {n}x{n} sites do not fit in memory")]
    TooLarge { n: usize },
    #[error("site ({row}, {col}) is outside the {n}x{n} grid")]
    OutOfRange { row: usize, col: usize, n: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Site {
    Blocked,
    Open,
}

/// How a site should be drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteView {
    Blocked,
    Open,
    /// Open and connected to the top
    Full,
}

/// n-by-n percolation grid.
///
/// Fullness is answered structurally by the union-find (membership in the
/// top node's set). Percolation is answered by a bottom flag carried on each
/// set's representative, so there is no virtual bottom node and therefore
/// no backwash.
#[derive(Debug, Clone)]
pub struct Percolation {
    n: usize,
    /// Index 0 is the virtual top, sites follow in row-major order from 1
    sites: Vec<Site>,
    /// Only meaningful at current representatives
    connected_to_bottom: Vec<bool>,
    uf: WeightedQuickUnion,
    open_sites: usize,
}

impl Percolation {
    /// Create an n-by-n grid with every site blocked
    pub fn new(n: usize) -> Result<Self, PercolationError> {
        if n == 0 {
            return Err(PercolationError::InvalidArgument {
                what: "grid size",
                value: n,
            });
        }
        let slots = n
            .checked_mul(n)
            .and_then(|sq| sq.checked_add(1))
            .ok_or(PercolationError::TooLarge { n })?;

        let mut sites = vec![Site::Blocked; slots];
        sites[TOP] = Site::Open;

        // Bottom-row slots start flagged. They are only read once they are a
        // representative, which requires the site to have been opened.
        let mut connected_to_bottom = vec![false; slots];
        for flag in &mut connected_to_bottom[slots - n..] {
            *flag = true;
        }

        Ok(Self {
            n,
            sites,
            connected_to_bottom,
            uf: WeightedQuickUnion::new(slots),
            open_sites: 0,
        })
    }

    pub fn size(&self) -> usize {
        self.n
    }

    /// Number of open sites, not counting the virtual top
    pub fn number_of_open_sites(&self) -> usize {
        self.open_sites
    }

    /// Open site (row, col) if it is not open already
    pub fn open(&mut self, row: usize, col: usize) -> Result<(), PercolationError> {
        let idx = self.index(row, col)?;
        if self.sites[idx] == Site::Open {
            return Ok(());
        }

        self.sites[idx] = Site::Open;
        self.open_sites += 1;

        if row == 1 {
            self.union(idx, TOP);
        }
        if row > 1 {
            self.connect_if_open(idx, row - 1, col);
        }
        if row < self.n {
            self.connect_if_open(idx, row + 1, col);
        }
        if col > 1 {
            self.connect_if_open(idx, row, col - 1);
        }
        if col < self.n {
            self.connect_if_open(idx, row, col + 1);
        }

        Ok(())
    }

    pub fn is_open(&self, row: usize, col: usize) -> Result<bool, PercolationError> {
        let idx = self.index(row, col)?;
        Ok(self.sites[idx] == Site::Open)
    }

    /// Is site (row, col) connected to the top through open sites?
    pub fn is_full(&mut self, row: usize, col: usize) -> Result<bool, PercolationError> {
        let idx = self.index(row, col)?;
        Ok(self.uf.connected(idx, TOP))
    }

    /// Does an open path join the top row to the bottom row?
    pub fn percolates(&mut self) -> bool {
        let root = self.uf.find(TOP);
        self.connected_to_bottom[root]
    }

    /// Classify site (row, col) for rendering
    pub fn site(&mut self, row: usize, col: usize) -> Result<SiteView, PercolationError> {
        if !self.is_open(row, col)? {
            return Ok(SiteView::Blocked);
        }
        Ok(if self.is_full(row, col)? {
            SiteView::Full
        } else {
            SiteView::Open
        })
    }

    /// Every site in row-major order, top-left first
    pub fn snapshot(&mut self) -> Result<Vec<SiteView>, PercolationError> {
        let n = self.n;
        (1..=n)
            .flat_map(|row| (1..=n).map(move |col| (row, col)))
            .map(|(row, col)| self.site(row, col))
            .collect()
    }

    fn index(&self, row: usize, col: usize) -> Result<usize, PercolationError> {
        if row < 1 || col < 1 || row > self.n || col > self.n {
            return Err(PercolationError::OutOfRange { row, col, n: self.n });
        }
        Ok((row - 1) * self.n + col)
    }

    /// Neighbour coordinates are already known to be on the grid
    fn connect_if_open(&mut self, idx: usize, row: usize, col: usize) {
        let neighbour = (row - 1) * self.n + col;
        if self.sites[neighbour] == Site::Open {
            self.union(idx, neighbour);
        }
    }

    /// Both arguments must be open; blocked slots never enter the forest.
    fn union(&mut self, p: usize, q: usize) {
        let p_root = self.uf.find(p);
        let q_root = self.uf.find(q);

        // Written to both old roots so the flag survives whichever one wins
        let bottom = self.connected_to_bottom[p_root] || self.connected_to_bottom[q_root];
        self.connected_to_bottom[p_root] = bottom;
        self.connected_to_bottom[q_root] = bottom;

        self.uf.union(p_root, q_root);
    }
}
