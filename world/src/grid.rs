//! Authoritative cell state and the offset-hexagon neighbor topology.

use std::collections::BTreeMap;

use marble_smash_core::{GridCoord, Level, LockedCell, MarbleColor};

/// Relative neighbor offsets for cells on even rows.
const EVEN_ROW_OFFSETS: [GridCoord; 6] = [
    GridCoord::new(-1, 0),
    GridCoord::new(1, 0),
    GridCoord::new(0, 1),
    GridCoord::new(-1, 1),
    GridCoord::new(0, -1),
    GridCoord::new(-1, -1),
];

/// Relative neighbor offsets for cells on odd rows.
const ODD_ROW_OFFSETS: [GridCoord; 6] = [
    GridCoord::new(-1, 0),
    GridCoord::new(1, 0),
    GridCoord::new(1, 1),
    GridCoord::new(0, 1),
    GridCoord::new(1, -1),
    GridCoord::new(0, -1),
];

/// State of a single grid position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridCell {
    coord: GridCoord,
    occupant: Option<MarbleColor>,
    locked: bool,
    unlock_threshold: u32,
    enabled: bool,
}

impl GridCell {
    fn new(coord: GridCoord) -> Self {
        Self {
            coord,
            occupant: None,
            locked: false,
            unlock_threshold: 0,
            enabled: true,
        }
    }

    /// Coordinate of the cell.
    #[must_use]
    pub const fn coord(&self) -> GridCoord {
        self.coord
    }

    /// Color of the marble resting on the cell, if any.
    #[must_use]
    pub const fn occupant_color(&self) -> Option<MarbleColor> {
        self.occupant
    }

    /// Reports whether the cell is waiting for a score threshold.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.locked
    }

    /// Score that unlocks the cell. Meaningless once unlocked.
    #[must_use]
    pub const fn unlock_threshold(&self) -> u32 {
        self.unlock_threshold
    }

    /// Reports whether the cell is part of the grid at all.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Reports whether the cell holds a marble.
    #[must_use]
    pub const fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    /// Enabled, unlocked and empty.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.enabled && !self.locked && self.occupant.is_none()
    }
}

/// Dense hexagonal grid of cells in offset coordinates.
///
/// The coordinate set is fixed at construction. Disabled cells stay in the
/// backing storage but are invisible to every query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridModel {
    columns: u32,
    rows: u32,
    cells: Vec<GridCell>,
}

impl GridModel {
    /// Creates a fully enabled, unlocked and empty grid.
    #[must_use]
    pub fn new(columns: u32, rows: u32) -> Self {
        Self::with_disabled(columns, rows, std::iter::empty())
    }

    /// Creates an empty grid with the provided cells removed.
    ///
    /// Coordinates outside the rectangle are ignored.
    #[must_use]
    pub fn with_disabled(
        columns: u32,
        rows: u32,
        disabled: impl IntoIterator<Item = GridCoord>,
    ) -> Self {
        let mut cells = Vec::with_capacity(columns as usize * rows as usize);
        for row in 0..rows {
            for column in 0..columns {
                cells.push(GridCell::new(GridCoord::new(column as i32, row as i32)));
            }
        }

        let mut grid = Self {
            columns,
            rows,
            cells,
        };
        for coord in disabled {
            if let Some(index) = grid.index(coord) {
                grid.cells[index].enabled = false;
            }
        }
        grid
    }

    /// Builds the grid described by a validated level, locks included.
    #[must_use]
    pub fn from_level(level: &Level) -> Self {
        let mut grid = Self::with_disabled(
            level.columns(),
            level.rows(),
            level.disabled().iter().copied(),
        );
        for locked in level.locked() {
            grid.lock(locked.cell, locked.threshold);
        }
        grid
    }

    /// Number of columns spanned by the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows spanned by the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Reports whether the coordinate names an enabled cell.
    #[must_use]
    pub fn contains(&self, coord: GridCoord) -> bool {
        self.cell(coord).is_some()
    }

    /// Looks up an enabled cell.
    #[must_use]
    pub fn cell(&self, coord: GridCoord) -> Option<&GridCell> {
        self.index(coord)
            .map(|index| &self.cells[index])
            .filter(|cell| cell.enabled)
    }

    /// Iterates over every enabled cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &GridCell> {
        self.cells.iter().filter(|cell| cell.enabled)
    }

    /// Coordinates of every available cell in row-major order.
    pub fn available_cells(&self) -> impl Iterator<Item = GridCoord> + '_ {
        self.cells()
            .filter(|cell| cell.is_available())
            .map(GridCell::coord)
    }

    /// Enabled cells adjacent to `coord`; at most six.
    pub fn neighbors(&self, coord: GridCoord) -> impl Iterator<Item = GridCoord> + '_ {
        let offsets = if coord.is_even_row() {
            &EVEN_ROW_OFFSETS
        } else {
            &ODD_ROW_OFFSETS
        };
        offsets
            .iter()
            .filter_map(move |offset| coord.checked_add(*offset))
            .filter(|candidate| self.contains(*candidate))
    }

    /// Reports whether a marble could be dropped on the cell.
    #[must_use]
    pub fn is_available(&self, coord: GridCoord) -> bool {
        self.cell(coord).map_or(false, GridCell::is_available)
    }

    /// Color of the marble on the cell, if the cell exists and is occupied.
    #[must_use]
    pub fn occupant_color(&self, coord: GridCoord) -> Option<MarbleColor> {
        self.cell(coord).and_then(GridCell::occupant_color)
    }

    /// Locks an empty cell until the score reaches `threshold`.
    ///
    /// # Panics
    ///
    /// Panics when the cell is absent or occupied.
    pub fn lock(&mut self, coord: GridCoord, threshold: u32) {
        let cell = self.cell_mut(coord);
        assert!(
            cell.occupant.is_none(),
            "cannot lock occupied cell {coord}"
        );
        cell.locked = true;
        cell.unlock_threshold = threshold;
    }

    /// Unlocks the cell, returning whether it was locked before.
    pub fn unlock(&mut self, coord: GridCoord) -> bool {
        match self.index(coord) {
            Some(index) if self.cells[index].enabled && self.cells[index].locked => {
                self.cells[index].locked = false;
                true
            }
            _ => false,
        }
    }

    /// Places a marble on the cell.
    ///
    /// # Panics
    ///
    /// Panics when the cell is absent, locked or already occupied.
    pub fn occupy(&mut self, coord: GridCoord, color: MarbleColor) {
        let cell = self.cell_mut(coord);
        assert!(!cell.locked, "cannot occupy locked cell {coord}");
        assert!(
            cell.occupant.is_none(),
            "cannot occupy cell {coord}: already holds a marble"
        );
        cell.occupant = Some(color);
    }

    /// Removes the marble from the cell and returns its color.
    ///
    /// # Panics
    ///
    /// Panics when the cell is absent or empty.
    pub fn vacate(&mut self, coord: GridCoord) -> MarbleColor {
        let cell = self.cell_mut(coord);
        match cell.occupant.take() {
            Some(color) => color,
            None => panic!("cannot vacate cell {coord}: it holds no marble"),
        }
    }

    /// Number of enabled cells holding a marble.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.cells().filter(|cell| cell.is_occupied()).count()
    }

    /// Number of enabled cells that are not locked.
    #[must_use]
    pub fn unlocked_count(&self) -> usize {
        self.cells().filter(|cell| !cell.locked).count()
    }

    /// Share of unlocked cells that hold a marble, in `0.0..=1.0`.
    #[must_use]
    pub fn fill_ratio(&self) -> f64 {
        let unlocked = self.unlocked_count();
        if unlocked == 0 {
            return 1.0;
        }
        self.occupied_count() as f64 / unlocked as f64
    }

    /// Locked cells in row-major order.
    #[must_use]
    pub fn locked_cells(&self) -> Vec<LockedCell> {
        self.cells()
            .filter(|cell| cell.locked)
            .map(|cell| LockedCell {
                cell: cell.coord,
                threshold: cell.unlock_threshold,
            })
            .collect()
    }

    /// Number of marbles of each color currently on the grid.
    #[must_use]
    pub fn color_counts(&self) -> BTreeMap<MarbleColor, usize> {
        let mut counts = BTreeMap::new();
        for color in self.cells().filter_map(GridCell::occupant_color) {
            *counts.entry(color).or_insert(0) += 1;
        }
        counts
    }

    /// Adjacent pairs of occupied cells sharing a color, each pair listed once.
    #[must_use]
    pub fn same_color_links(&self) -> Vec<(GridCoord, GridCoord)> {
        let mut links = Vec::new();
        for cell in self.cells() {
            let Some(color) = cell.occupant else {
                continue;
            };
            for neighbor in self.neighbors(cell.coord) {
                if neighbor > cell.coord && self.occupant_color(neighbor) == Some(color) {
                    links.push((cell.coord, neighbor));
                }
            }
        }
        links
    }

    fn cell_mut(&mut self, coord: GridCoord) -> &mut GridCell {
        let index = self
            .index(coord)
            .filter(|index| self.cells[*index].enabled);
        match index {
            Some(index) => &mut self.cells[index],
            None => panic!("cell {coord} is not part of the grid"),
        }
    }

    fn index(&self, coord: GridCoord) -> Option<usize> {
        let column = u32::try_from(coord.column()).ok()?;
        let row = u32::try_from(coord.row()).ok()?;
        if column >= self.columns || row >= self.rows {
            return None;
        }
        let width = usize::try_from(self.columns).ok()?;
        let row = usize::try_from(row).ok()?;
        let column = usize::try_from(column).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }
}
