// Seeded random map generator.
//
// Cells are drawn in row-major order from weighted sea/forest/plot odds. A
// new plot cell first tries to join the plot of its west neighbour, then of
// its north neighbour, as long as that plot is still below `MAX_PLOT_SIZE`.
// Failing that it opens a fresh plot while `max_plots` allows; once the plot
// budget is spent, further plot draws become forest. Since a cell only ever
// joins a plot it touches, every generated plot is contiguous and the
// result always passes `MapDefinition::new` validation.
//
// Output is a pure function of `(params, seed)`.

use std::collections::BTreeMap;

use coffee_prng::MapRng;

use crate::error::MapError;
use crate::map::{MAX_PLOT_SIZE, MapDefinition, check_dimensions};
use crate::types::{CellKind, PlotId};

/// Knobs for `generate_map`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerateParams {
    pub width: u32,
    pub height: u32,
    pub sea_weight: u32,
    pub forest_weight: u32,
    pub plot_weight: u32,
    pub max_plots: u16,
}

impl Default for GenerateParams {
    fn default() -> Self {
        Self {
            width: 10,
            height: 10,
            sea_weight: 40,
            forest_weight: 30,
            plot_weight: 100,
            max_plots: 17,
        }
    }
}

/// Build a random map from `seed`.
pub fn generate_map(params: &GenerateParams, seed: u64) -> Result<MapDefinition, MapError> {
    let weights = [params.sea_weight, params.forest_weight, params.plot_weight];
    if weights.iter().all(|&w| w == 0) {
        return Err(MapError::NoCellWeights);
    }

    check_dimensions(params.width, params.height)?;

    let mut rng = MapRng::new(seed);
    let width = params.width as usize;
    let area = width * params.height as usize;
    let mut cells: Vec<CellKind> = Vec::with_capacity(area);
    let mut sizes: BTreeMap<PlotId, usize> = BTreeMap::new();
    let mut next_plot: u32 = 1;

    for i in 0..area {
        let kind = match rng.weighted_index(&weights) {
            0 => CellKind::Sea,
            1 => CellKind::Forest,
            _ => {
                let west = (i % width > 0).then(|| i - 1);
                let north = i.checked_sub(width);
                let joined = [west, north].into_iter().flatten().find_map(|n| {
                    let plot = cells[n].plot()?;
                    (sizes[&plot] < MAX_PLOT_SIZE).then_some(plot)
                });
                let plot = joined.or_else(|| {
                    let fresh = u16::try_from(next_plot)
                        .ok()
                        .filter(|&p| p <= params.max_plots)?;
                    next_plot += 1;
                    Some(PlotId(fresh))
                });
                plot.map_or(CellKind::Forest, CellKind::Plot)
            }
        };
        if let CellKind::Plot(plot) = kind {
            *sizes.entry(plot).or_default() += 1;
        }
        cells.push(kind);
    }

    MapDefinition::new(params.width, params.height, cells)
}
