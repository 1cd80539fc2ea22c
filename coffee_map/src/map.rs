// Static map definition: grid size, cell kinds and plot groupings.
//
// Cells are stored row-major in a flat `Vec<CellKind>`, index
// `row * width + col`, like any dense grid. Everything derived from the
// layout (plot count, per-cell wall masks) is computed once in `new()` and
// never changes afterwards; a definition is immutable once built.
//
// Wall masks describe plot borders for clients: bit set = wall on that side.
// A plot cell has a wall wherever its neighbour is off-grid or is not a cell
// of the same plot. Sea and forest cells carry fixed sentinel values instead.
//
// On disk a map is a plain PPM (`P3`) image: sea `0 0 max`, forest
// `0 max 0`, plot `p p p`. JSON (`{width, height, cells}`) is accepted too.
// Both paths go through the same validation as `new()`.
//
// See also: `board.rs` for the per-match mutable state built on top of this.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MapError;
use crate::types::{CellIndex, CellKind, PlotId, RenderMode};

/// Maximum number of cells in one plot.
pub const MAX_PLOT_SIZE: usize = 6;

/// Columns are addressed by a single uppercase letter.
pub const MAX_WIDTH: u32 = 26;

/// Tallest grid accepted from a file or the generator.
pub const MAX_HEIGHT: u32 = 1_000;

pub const WALL_NORTH: u8 = 1;
pub const WALL_WEST: u8 = 1 << 1;
pub const WALL_SOUTH: u8 = 1 << 2;
pub const WALL_EAST: u8 = 1 << 3;
pub const FOREST_MASK: u8 = 1 << 5;
pub const SEA_MASK: u8 = 1 << 6;

/// Immutable grid shared by every match played on it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MapLayout", into = "MapLayout")]
pub struct MapDefinition {
    width: u32,
    height: u32,
    cells: Vec<CellKind>,
    plot_count: usize,
    walls: Vec<u8>,
}

/// Serialized shape of a map; derived data is rebuilt on load.
#[derive(Serialize, Deserialize)]
struct MapLayout {
    width: u32,
    height: u32,
    cells: Vec<CellKind>,
}

impl TryFrom<MapLayout> for MapDefinition {
    type Error = MapError;

    fn try_from(layout: MapLayout) -> Result<Self, Self::Error> {
        MapDefinition::new(layout.width, layout.height, layout.cells)
    }
}

impl From<MapDefinition> for MapLayout {
    fn from(map: MapDefinition) -> Self {
        MapLayout {
            width: map.width,
            height: map.height,
            cells: map.cells,
        }
    }
}

impl MapDefinition {
    /// Validate a layout and build the definition.
    pub fn new(width: u32, height: u32, cells: Vec<CellKind>) -> Result<Self, MapError> {
        check_dimensions(width, height)?;
        let expected = width as usize * height as usize;
        if cells.len() != expected {
            return Err(MapError::CellCountMismatch {
                expected,
                actual: cells.len(),
            });
        }

        let plots = group_plots(&cells)?;
        for (plot, members) in &plots {
            if members.len() > MAX_PLOT_SIZE {
                return Err(MapError::PlotTooLarge {
                    plot: plot.0,
                    size: members.len(),
                    max: MAX_PLOT_SIZE,
                });
            }
            if !is_contiguous(width as usize, &cells, *plot, members) {
                return Err(MapError::PlotNotContiguous { plot: plot.0 });
            }
        }

        let walls = compute_walls(width as usize, height as usize, &cells);
        Ok(Self {
            width,
            height,
            cells,
            plot_count: plots.len(),
            walls,
        })
    }

    /// Parse a plain PPM (`P3`) image. `#` starts a comment that runs to the
    /// end of the line.
    pub fn from_ppm(text: &str) -> Result<Self, MapError> {
        let mut tokens = text
            .lines()
            .map(|line| line.split('#').next().unwrap_or_default())
            .flat_map(str::split_whitespace);

        let magic = tokens.next().ok_or(MapError::PpmTruncated("header"))?;
        if magic != "P3" {
            return Err(MapError::PpmMagic(magic.to_string()));
        }
        let mut number = |what: &'static str| -> Result<u32, MapError> {
            let token = tokens.next().ok_or(MapError::PpmTruncated(what))?;
            token
                .parse::<u32>()
                .map_err(|_| MapError::PpmNumber(token.to_string()))
        };

        let width = number("width")?;
        let height = number("height")?;
        let max = number("max value")?;
        if max == 0 || max > u32::from(u16::MAX) {
            return Err(MapError::PpmMaxValue(max));
        }
        // Before sizing the cell buffer from the header.
        check_dimensions(width, height)?;

        let area = width as usize * height as usize;
        let mut cells = Vec::with_capacity(area);
        for index in 0..area {
            let r = number("pixel data")?;
            let g = number("pixel data")?;
            let b = number("pixel data")?;
            let kind = match (r, g, b) {
                (0, 0, v) if v == max => CellKind::Sea,
                (0, v, 0) if v == max => CellKind::Forest,
                (p, q, s) if p == q && q == s && (1..=max).contains(&p) => {
                    // `max` fits in u16, so `p` does too.
                    CellKind::Plot(PlotId(u16::try_from(p).unwrap_or(u16::MAX)))
                }
                _ => return Err(MapError::PpmColor { index, r, g, b }),
            };
            cells.push(kind);
        }
        if let Some(extra) = tokens.next() {
            return Err(MapError::PpmTrailing(extra.to_string()));
        }

        Self::new(width, height, cells)
    }

    /// Write the map as a plain PPM image, one grid row per line. The max
    /// value is the highest plot id (at least 1).
    pub fn to_ppm(&self) -> String {
        let max = self
            .cells
            .iter()
            .filter_map(|c| c.plot())
            .map(|p| u32::from(p.0))
            .max()
            .unwrap_or(1);
        let mut out = format!("P3\n{} {}\n{}\n", self.width, self.height, max);
        for row in self.cells.chunks(self.width as usize) {
            let line: Vec<String> = row
                .iter()
                .map(|cell| match cell {
                    CellKind::Sea => format!("0 0 {max}"),
                    CellKind::Forest => format!("0 {max} 0"),
                    CellKind::Plot(p) => format!("{0} {0} {0}", p.0),
                })
                .collect();
            out.push_str(&line.join(" "));
            out.push('\n');
        }
        out
    }

    /// Parse the JSON form `{ "width", "height", "cells" }`.
    pub fn from_json(text: &str) -> Result<Self, MapError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn area(&self) -> usize {
        self.cells.len()
    }

    /// Number of distinct plots on the map.
    pub fn plot_count(&self) -> usize {
        self.plot_count
    }

    /// Kind of the cell at `index`. Panics on an out-of-range index.
    pub fn cell(&self, index: CellIndex) -> CellKind {
        self.cells[index]
    }

    /// Flat index of `(row, col)`, or `None` outside the grid.
    pub fn index_of(&self, row: usize, col: usize) -> Option<CellIndex> {
        (row < self.height as usize && col < self.width as usize)
            .then_some(row * self.width as usize + col)
    }

    /// `(row, col)` of a flat index.
    pub fn coords(&self, index: CellIndex) -> (usize, usize) {
        let w = self.width as usize;
        (index / w, index % w)
    }

    /// All plot cells with their plot, in index order.
    pub fn plot_cells(&self) -> impl Iterator<Item = (CellIndex, PlotId)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.plot().map(|p| (i, p)))
    }

    /// Wall mask of one cell (see the `WALL_*`, `FOREST_MASK`, `SEA_MASK`
    /// constants).
    pub fn wall_mask(&self, index: CellIndex) -> u8 {
        self.walls[index]
    }

    /// Encode the wall masks for transmission to a client.
    pub fn encode(&self, mode: RenderMode) -> String {
        let rows = self.walls.chunks(self.width as usize).map(|row| match mode {
            RenderMode::Verbose => row
                .iter()
                .map(u8::to_string)
                .collect::<Vec<_>>()
                .join(":"),
            RenderMode::Compact => row.iter().map(|&m| compact_char(m)).collect(),
        });
        rows.collect::<Vec<_>>().join("|")
    }
}

impl fmt::Display for MapDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode(RenderMode::Verbose))
    }
}

/// Compact alphabet: masks 0..=15 map to `a`..=`p`, forest to `F`, sea to `M`.
fn compact_char(mask: u8) -> char {
    match mask {
        SEA_MASK => 'M',
        FOREST_MASK => 'F',
        m => char::from(b'a' + (m & 0x0f)),
    }
}

/// Grid size limits shared by every constructor.
pub(crate) fn check_dimensions(width: u32, height: u32) -> Result<(), MapError> {
    if width == 0 || height == 0 {
        return Err(MapError::EmptyGrid { width, height });
    }
    if width > MAX_WIDTH {
        return Err(MapError::TooWide {
            width,
            max: MAX_WIDTH,
        });
    }
    if height > MAX_HEIGHT {
        return Err(MapError::TooTall {
            height,
            max: MAX_HEIGHT,
        });
    }
    Ok(())
}

fn group_plots(cells: &[CellKind]) -> Result<BTreeMap<PlotId, Vec<CellIndex>>, MapError> {
    let mut plots: BTreeMap<PlotId, Vec<CellIndex>> = BTreeMap::new();
    for (index, cell) in cells.iter().enumerate() {
        if let CellKind::Plot(plot) = *cell {
            if plot.0 == 0 {
                return Err(MapError::ZeroPlotId { index });
            }
            plots.entry(plot).or_default().push(index);
        }
    }
    Ok(plots)
}

/// Flood fill over 4-neighbours of the same plot, starting from the first
/// member.
fn is_contiguous(width: usize, cells: &[CellKind], plot: PlotId, members: &[CellIndex]) -> bool {
    let Some(&start) = members.first() else {
        return true;
    };
    let mut seen = vec![start];
    let mut stack = vec![start];
    while let Some(i) = stack.pop() {
        let (row, col) = (i / width, i % width);
        let neighbours = [
            row.checked_sub(1).map(|r| r * width + col),
            (col > 0).then(|| i - 1),
            Some(i + width).filter(|&n| n < cells.len()),
            (col + 1 < width).then(|| i + 1),
        ];
        for n in neighbours.into_iter().flatten() {
            if cells[n] == CellKind::Plot(plot) && !seen.contains(&n) {
                seen.push(n);
                stack.push(n);
            }
        }
    }
    seen.len() == members.len()
}

fn compute_walls(width: usize, height: usize, cells: &[CellKind]) -> Vec<u8> {
    let same_plot = |row: Option<usize>, col: Option<usize>, plot: PlotId| match (row, col) {
        (Some(r), Some(c)) if r < height && c < width => cells[r * width + c] == CellKind::Plot(plot),
        _ => false,
    };
    cells
        .iter()
        .enumerate()
        .map(|(i, cell)| match *cell {
            CellKind::Sea => SEA_MASK,
            CellKind::Forest => FOREST_MASK,
            CellKind::Plot(plot) => {
                let (row, col) = (i / width, i % width);
                let mut mask = 0;
                if !same_plot(row.checked_sub(1), Some(col), plot) {
                    mask |= WALL_NORTH;
                }
                if !same_plot(Some(row), col.checked_sub(1), plot) {
                    mask |= WALL_WEST;
                }
                if !same_plot(Some(row + 1), Some(col), plot) {
                    mask |= WALL_SOUTH;
                }
                if !same_plot(Some(row), Some(col + 1), plot) {
                    mask |= WALL_EAST;
                }
                mask
            }
        })
        .collect()
}
