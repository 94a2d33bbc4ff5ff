use byteorder::{ByteOrder, LittleEndian as LE};
use criterion::{criterion_group, criterion_main, Criterion};
use geo::geometry::Coord;
use relief::{Profile, RasterStore, Renderer, StoreMode, TileCoord};
use std::io::Write;
use tessadem::{cols_for_lat, GridSpec, Raster, TileKey, ROWS};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

fn write_constant_tile(dir: &std::path::Path, name: &str, cols: usize, value: i16) {
    let samples = vec![value; ROWS * cols];
    let mut bytes = vec![0u8; samples.len() * 2];
    LE::write_i16_into(&samples, &mut bytes);
    let mut file = std::fs::File::create(dir.join(name)).unwrap();
    file.write_all(&bytes).unwrap();
}

fn profile(c: &mut Criterion) {
    let mut group = c.benchmark_group("Profile");

    let dir = tempfile::tempdir().unwrap();
    write_constant_tile(dir.path(), "80_10", 720, 1903);
    let store = RasterStore::new(dir.path().to_owned(), StoreMode::MemMap).unwrap();

    let start = Coord { x: 10.2, y: 80.2 };
    let end = Coord { x: 10.8, y: 80.8 };

    group.bench_with_input("short", &(store, start, end), |b, (store, start, end)| {
        b.iter(|| {
            Profile::builder()
                .start(*start)
                .end(*end)
                .step_size_m(60.0)
                .build(store)
                .unwrap()
        })
    });
}

fn render(c: &mut Criterion) {
    let mut group = c.benchmark_group("Render");

    let key = TileKey::new(42, 45);
    let cols = cols_for_lat(42);
    let raster =
        Raster::from_samples(key, GridSpec::default(), cols, vec![100; ROWS * cols]).unwrap();
    let tile = TileCoord::containing(Coord { x: 45.5, y: 42.5 }, 12);
    let renderer = Renderer::default();

    group.bench_with_input("interior", &(raster, tile), |b, (raster, tile)| {
        b.iter(|| renderer.render(raster, *tile))
    });
}

criterion_group!(benches, profile, render);
criterion_main!(benches);
