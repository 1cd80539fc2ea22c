// Errors raised while building a `MapDefinition`.
//
// Every variant is a construction-time failure: a map either validates
// completely or is not built at all.

/// Why a map definition was rejected.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("map must be at least 1x1, got {width}x{height}")]
    EmptyGrid { width: u32, height: u32 },

    #[error("map is {width} columns wide, at most {max} can be addressed")]
    TooWide { width: u32, max: u32 },

    #[error("map is {height} rows tall, at most {max} are supported")]
    TooTall { height: u32, max: u32 },

    #[error("expected {expected} cells for the declared size, got {actual}")]
    CellCountMismatch { expected: usize, actual: usize },

    #[error("cell {index} uses plot id 0")]
    ZeroPlotId { index: usize },

    #[error("plot {plot} has {size} cells (max {max})")]
    PlotTooLarge { plot: u16, size: usize, max: usize },

    #[error("plot {plot} is split into disconnected pieces")]
    PlotNotContiguous { plot: u16 },

    #[error("not a plain PPM file: expected magic 'P3', found '{0}'")]
    PpmMagic(String),

    #[error("PPM data ends early: missing {0}")]
    PpmTruncated(&'static str),

    #[error("invalid number in PPM data: '{0}'")]
    PpmNumber(String),

    #[error("PPM max value {0} is out of range 1..=65535")]
    PpmMaxValue(u32),

    #[error("cell {index} has unrecognized colour {r} {g} {b}")]
    PpmColor { index: usize, r: u32, g: u32, b: u32 },

    #[error("unexpected trailing PPM data: '{0}'")]
    PpmTrailing(String),

    #[error("all generator cell weights are zero")]
    NoCellWeights,

    #[error("invalid JSON map: {0}")]
    Json(#[from] serde_json::Error),
}
