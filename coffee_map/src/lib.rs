// coffee_map: the grid a Coffee match is played on.
//
// Two layers with very different lifetimes:
// - `MapDefinition` is built once per process (from a PPM or JSON file, or
//   from the generator) and shared read-only behind an `Arc` by every match.
// - `MatchBoard` is created per match and owns the only mutable state: which
//   plot cells are claimed, by whom, and the cached set of legal moves.
//
// Module overview:
// - `types.rs`:    `PlotId`, `CellKind`, `Side`, `RenderMode`, `CellIndex`.
// - `map.rs`:      `MapDefinition`: validation, wall masks, verbose/compact
//                  encodings, PPM and JSON (de)serialization.
// - `board.rs`:    `MatchBoard`: claim rule, lazily recomputed legal set,
//                  diagnostic rendering.
// - `generate.rs`: Seeded random map generator (emits valid definitions).
// - `error.rs`:    `MapError`.
//
// No networking and no clocks in here; `coffee_lobby` drives a `MatchBoard`
// from its session state machine.

pub mod board;
pub mod error;
pub mod generate;
pub mod map;
pub mod types;

pub use board::{LastMove, MatchBoard, legal_moves_after};
pub use error::MapError;
pub use generate::{GenerateParams, generate_map};
pub use map::{MAX_HEIGHT, MAX_PLOT_SIZE, MAX_WIDTH, MapDefinition};
pub use types::{CellIndex, CellKind, PlotId, RenderMode, Side};
