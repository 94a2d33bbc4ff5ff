mod error;
mod math;
mod profile;
mod render;
mod store;

pub use crate::{
    error::ReliefError,
    profile::{ElevationSample, Profile, ProfileBuilder},
    render::{render_tile, RenderOptions, Renderer, TileCoord, TileImage},
    store::{RasterStore, StoreMode},
};
