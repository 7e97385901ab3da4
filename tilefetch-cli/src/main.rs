//! tilefetch CLI - Command-line interface
//!
//! Queues tiles or files with the tilefetch download manager, waits for the
//! queue to drain and reports what happened.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::common::CommonArgs;
use commands::file::FileArgs;
use commands::tile::TileArgs;

#[derive(Parser)]
#[command(name = "tilefetch")]
#[command(version = tilefetch::VERSION)]
#[command(about = "Download map tiles and files in the background", long_about = None)]
struct Cli {
    /// Config file to use instead of ~/.tilefetch/config.ini
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Maximum concurrent transfers (overrides config)
    #[arg(long, global = true)]
    max_transfers: Option<usize>,

    /// Seconds to wait for the queue to drain
    #[arg(long, global = true, default_value = "60")]
    wait: u64,

    /// Run transfers on this thread instead of the background worker
    #[arg(long, global = true)]
    foreground: bool,

    /// Also print log output to stdout
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download a tile, or a rectangular range of tiles at one zoom level
    Tile {
        /// Tile server base URL (tiles are fetched from {server}/{z}/{x}/{y}.{ext})
        #[arg(long)]
        server: String,

        /// Zoom level
        #[arg(long)]
        zoom: u8,

        /// Tile column (first column of the range)
        #[arg(long)]
        x: u32,

        /// Tile row (first row of the range)
        #[arg(long)]
        y: u32,

        /// Last column of the range (inclusive)
        #[arg(long)]
        x_end: Option<u32>,

        /// Last row of the range (inclusive)
        #[arg(long)]
        y_end: Option<u32>,

        /// Base directory; tiles are stored as {dir}/{z}/{x}/{y}.{ext}
        #[arg(long)]
        dir: PathBuf,

        /// Tile file extension
        #[arg(long, default_value = "png")]
        ext: String,
    },

    /// Download a single file
    File {
        /// Source URL
        #[arg(long)]
        url: String,

        /// Local output path
        #[arg(long)]
        output: PathBuf,

        /// Maximum age in seconds of an existing copy (0 = always download, negative = never expires)
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        expiry: i64,
    },
}

fn main() {
    let cli = Cli::parse();

    let common = CommonArgs {
        config_path: cli.config,
        max_transfers: cli.max_transfers,
        wait_secs: cli.wait,
        foreground: cli.foreground,
        verbose: cli.verbose,
    };

    let result = match cli.command {
        Commands::Tile {
            server,
            zoom,
            x,
            y,
            x_end,
            y_end,
            dir,
            ext,
        } => commands::tile::run(
            TileArgs {
                server,
                zoom,
                x,
                y,
                x_end,
                y_end,
                dir,
                ext,
            },
            &common,
        ),
        Commands::File {
            url,
            output,
            expiry,
        } => commands::file::run(
            FileArgs {
                url,
                output,
                expiry,
            },
            &common,
        ),
    };

    if let Err(e) = result {
        e.exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_tile_range_arguments() {
        let cli = Cli::try_parse_from([
            "tilefetch",
            "--max-transfers",
            "4",
            "tile",
            "--server",
            "https://tile.example.org",
            "--zoom",
            "10",
            "--x",
            "20",
            "--y",
            "5",
            "--x-end",
            "21",
            "--dir",
            "tiles",
        ])
        .unwrap();

        assert_eq!(cli.max_transfers, Some(4));
        match cli.command {
            Commands::Tile {
                zoom, x_end, y_end, ext, ..
            } => {
                assert_eq!(zoom, 10);
                assert_eq!(x_end, Some(21));
                assert_eq!(y_end, None);
                assert_eq!(ext, "png");
            }
            Commands::File { .. } => panic!("expected tile command"),
        }
    }

    #[test]
    fn test_file_accepts_negative_expiry() {
        let cli = Cli::try_parse_from([
            "tilefetch",
            "file",
            "--url",
            "https://example.org/a.json",
            "--output",
            "a.json",
            "--expiry",
            "-1",
            "--foreground",
        ])
        .unwrap();

        assert!(cli.foreground);
        match cli.command {
            Commands::File { expiry, .. } => assert_eq!(expiry, -1),
            Commands::Tile { .. } => panic!("expected file command"),
        }
    }
}
