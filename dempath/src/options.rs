use anyhow::{anyhow, Error as AnyError};
use clap::{Args, Parser, Subcommand};
use geo::geometry::Coord;
use std::{path::PathBuf, str::FromStr};

/// Query elevation profiles and pyramid tiles from raw DEM tiles.
#[derive(Parser, Debug)]
pub struct Cli {
    /// Directory containing raw `<lat>_<lon>` elevation tiles.
    #[arg(short, long)]
    pub tile_dir: PathBuf,

    /// Memory-map tile files instead of decoding them into memory.
    #[arg(long, default_value_t = false)]
    pub memmap: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Clone, Debug, Copy)]
pub struct LatLon(pub Coord<f64>);

impl FromStr for LatLon {
    type Err = AnyError;
    fn from_str(s: &str) -> Result<Self, AnyError> {
        let idx = s.find(',').ok_or_else(|| anyhow!("not a valid lat,lon pair"))?;
        let (lat_str, lon_str) = {
            let (lat_str, lon_str) = s.split_at(idx);
            (lat_str, &lon_str[1..])
        };
        let lat = f64::from_str(lat_str)?;
        let lon = f64::from_str(lon_str)?;
        Ok(Self(Coord { y: lat, x: lon }))
    }
}

#[derive(Debug, Clone, Args)]
pub struct ProfileArgs {
    /// Start "lat,lon".
    #[arg(long)]
    pub start: LatLon,

    /// Destination "lat,lon".
    #[arg(long)]
    pub dest: LatLon,

    /// Maximum distance between samples, in meters.
    #[arg(long, default_value_t = 60.0)]
    pub step_m: f64,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print profile samples to stdout as CSV.
    Csv(ProfileArgs),

    /// Print profile samples to stdout as JSON.
    Json(ProfileArgs),

    /// Plot the profile in the terminal.
    Plot(ProfileArgs),

    /// Report coverage statistics for a rendered pyramid tile.
    Tile {
        /// Zoom level.
        zoom: u32,
        /// Tile column.
        x: u32,
        /// Tile row.
        y: u32,
    },
}
