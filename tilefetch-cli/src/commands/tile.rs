//! Tile command - download one tile or a rectangular range of tiles.

use std::ops::RangeInclusive;
use std::path::PathBuf;
use tilefetch::queue::TileCoord;

use super::common::{wait_and_report, CommonArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Highest zoom level whose tile indices fit comfortably in `u32`.
pub const MAX_ZOOM: u8 = 30;

/// Arguments for the tile command.
pub struct TileArgs {
    pub server: String,
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
    pub x_end: Option<u32>,
    pub y_end: Option<u32>,
    pub dir: PathBuf,
    pub ext: String,
}

impl TileArgs {
    /// Every tile in the requested range, row by row.
    pub fn tiles(&self) -> Result<Vec<TileCoord>, CliError> {
        if self.zoom > MAX_ZOOM {
            return Err(CliError::InvalidArgument(format!(
                "zoom {} is above the maximum of {}",
                self.zoom, MAX_ZOOM
            )));
        }

        let columns = axis_range("x", self.x, self.x_end, self.zoom)?;
        let rows = axis_range("y", self.y, self.y_end, self.zoom)?;

        Ok(rows
            .flat_map(|y| columns.clone().map(move |x| TileCoord::new(x, y, self.zoom)))
            .collect())
    }
}

fn axis_range(
    axis: &str,
    start: u32,
    end: Option<u32>,
    zoom: u8,
) -> Result<RangeInclusive<u32>, CliError> {
    let end = end.unwrap_or(start);
    if end < start {
        return Err(CliError::InvalidArgument(format!(
            "{axis} range {start}..={end} is empty"
        )));
    }

    let limit = 1u64 << zoom;
    if u64::from(end) >= limit {
        return Err(CliError::InvalidArgument(format!(
            "{axis} = {end} is outside zoom {zoom} (max {})",
            limit - 1
        )));
    }
    Ok(start..=end)
}

/// Run the tile command.
pub fn run(args: TileArgs, common: &CommonArgs) -> Result<(), CliError> {
    let tiles = args.tiles()?;

    let runner = CliRunner::new(common)?;
    runner.log_startup("tile");
    let manager = runner.create_manager(runner.download_config(common, tiles.len()))?;
    let mut events = manager.subscribe();

    println!("Requesting {} tile(s) from {}", tiles.len(), args.server);
    println!("  Zoom: {}", args.zoom);
    println!("  Directory: {}", args.dir.display());
    println!();

    for tile in tiles {
        manager.request_tile(&args.server, tile, &args.dir, &args.ext);
    }

    wait_and_report(&manager, &mut events, common)
}
