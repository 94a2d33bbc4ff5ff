mod options;

use anyhow::Error as AnyError;
use clap::Parser;
use geo::geometry::Coord;
use options::{Cli, Command as CliCmd, ProfileArgs};
use relief::{Profile, RasterStore, Renderer, StoreMode, TileCoord};
use serde::Serialize;
use std::io::Write;
use textplots::{Chart, Plot, Shape};

fn main() -> Result<(), AnyError> {
    env_logger::init();

    let Cli {
        tile_dir,
        memmap,
        cmd,
    } = Cli::parse();

    let mode = if memmap {
        StoreMode::MemMap
    } else {
        StoreMode::InMem
    };
    let store = RasterStore::new(tile_dir, mode)?;

    match cmd {
        CliCmd::Csv(args) => print_csv(&build_profile(&store, &args)?),
        CliCmd::Json(args) => print_json(&build_profile(&store, &args)?),
        CliCmd::Plot(args) => {
            plot_ascii(&build_profile(&store, &args)?);
            Ok(())
        }
        CliCmd::Tile { zoom, x, y } => print_tile_report(&store, zoom, x, y),
    }
}

fn build_profile(store: &RasterStore, args: &ProfileArgs) -> Result<Profile, AnyError> {
    let profile = Profile::builder()
        .start(args.start.0)
        .end(args.dest.0)
        .step_size_m(args.step_m)
        .build(store)?;
    Ok(profile)
}

fn print_csv(profile: &Profile) -> Result<(), AnyError> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "Latitude,Longitude,Elevation")?;
    for sample in &profile.samples {
        let (lat, lon) = (sample.lat, sample.lon);
        match sample.elevation {
            Some(elevation) => writeln!(stdout, "{lat},{lon},{elevation}")?,
            None => writeln!(stdout, "{lat},{lon},")?,
        }
    }
    Ok(())
}

fn print_json(profile: &Profile) -> Result<(), AnyError> {
    #[derive(Serialize)]
    struct JsonEntry {
        location: [f64; 2],
        elevation: Option<i16>,
    }

    #[derive(Serialize)]
    struct JsonProfile {
        total_m: f64,
        step_m: f64,
        points: Vec<JsonEntry>,
    }

    let reshaped = JsonProfile {
        total_m: profile.distance_m,
        step_m: profile.step_m,
        points: profile
            .samples
            .iter()
            .map(|sample| JsonEntry {
                location: [sample.lon, sample.lat],
                elevation: sample.elevation,
            })
            .collect(),
    };
    let json = serde_json::to_string(&reshaped)?;
    println!("{json}");
    Ok(())
}

fn plot_ascii(profile: &Profile) {
    #[allow(clippy::cast_precision_loss)]
    let plot_data: Vec<(f32, f32)> = profile
        .samples
        .iter()
        .enumerate()
        .map(|(idx, sample)| (idx as f32, f32::from(sample.elevation.unwrap_or(0))))
        .collect();
    #[allow(clippy::cast_precision_loss)]
    Chart::new(300, 150, 0.0, plot_data.len() as f32)
        .lineplot(&Shape::Lines(&plot_data))
        .display();
}

fn print_tile_report(store: &RasterStore, zoom: u32, x: u32, y: u32) -> Result<(), AnyError> {
    let tile = TileCoord::new(zoom, x, y);
    let (lon_min, lat_min, lon_max, lat_max) = tile.bounds();
    let center = Coord {
        x: (lon_min + lon_max) / 2.0,
        y: (lat_min + lat_max) / 2.0,
    };

    let raster = store.get(center)?;
    let image = Renderer::default().render(&raster, tile);

    println!(
        "tile {tile}: {valid}/{total} valid pixels",
        valid = image.valid_count(),
        total = image.pixels.len(),
    );
    if let Some((min, max)) = image.value_range() {
        println!("elevation range: {min:.1}..{max:.1} m");
    }
    Ok(())
}
