//! Contrast limited adaptive histogram equalisation
//!
//! The plane is split into a `tile_grid × tile_grid` layout. Each tile gets an
//! equalisation table built from its clipped histogram, and every pixel blends
//! the tables of the four nearest tile centres bilinearly. Tiles that run past
//! the border sample the plane by reflection.

use image::{GrayImage, Luma};

const BINS: usize = 256;

/// Equalise `luma` with the given clip limit and grid
pub fn equalize(luma: &GrayImage, clip_limit: f64, tile_grid: u32) -> GrayImage {
    let (width, height) = luma.dimensions();
    if width == 0 || height == 0 {
        return luma.clone();
    }

    let tiles_x = tile_grid.clamp(1, width);
    let tiles_y = tile_grid.clamp(1, height);
    let tile_w = width.div_ceil(tiles_x);
    let tile_h = height.div_ceil(tiles_y);

    let mut tables = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            tables.push(tile_table(luma, tx * tile_w, ty * tile_h, tile_w, tile_h, clip_limit));
        }
    }

    let table = |tx: u32, ty: u32| &tables[(ty * tiles_x + tx) as usize];

    GrayImage::from_fn(width, height, |x, y| {
        let value = luma.get_pixel(x, y)[0] as usize;
        let (tx1, tx2, xa) = neighbours(x, tile_w, tiles_x);
        let (ty1, ty2, ya) = neighbours(y, tile_h, tiles_y);

        let top = table(tx1, ty1)[value] * (1.0 - xa) + table(tx2, ty1)[value] * xa;
        let bottom = table(tx1, ty2)[value] * (1.0 - xa) + table(tx2, ty2)[value] * xa;
        let blended = top * (1.0 - ya) + bottom * ya;

        Luma([blended.round().clamp(0.0, 255.0) as u8])
    })
}

/// Equalisation table of one tile
fn tile_table(luma: &GrayImage, x0: u32, y0: u32, tile_w: u32, tile_h: u32, clip_limit: f64) -> [f32; BINS] {
    let (width, height) = luma.dimensions();
    let mut hist = [0u32; BINS];
    for y in y0..y0 + tile_h {
        for x in x0..x0 + tile_w {
            let pixel = luma.get_pixel(reflect(x, width), reflect(y, height))[0];
            hist[pixel as usize] += 1;
        }
    }

    let area = tile_w * tile_h;
    if clip_limit > 0.0 {
        let limit = ((clip_limit * f64::from(area) / BINS as f64) as u32).max(1);
        clip_histogram(&mut hist, limit);
    }

    let scale = 255.0 / area as f32;
    let mut table = [0f32; BINS];
    let mut sum = 0u32;
    for (bin, count) in hist.iter().enumerate() {
        sum += count;
        table[bin] = (sum as f32 * scale).round().min(255.0);
    }
    table
}

/// Cap every bin at `limit` and spread the excess evenly
fn clip_histogram(hist: &mut [u32; BINS], limit: u32) {
    let mut excess = 0u32;
    for count in hist.iter_mut() {
        if *count > limit {
            excess += *count - limit;
            *count = limit;
        }
    }

    let batch = excess / BINS as u32;
    let residual = (excess % BINS as u32) as usize;
    for count in hist.iter_mut() {
        *count += batch;
    }
    if residual > 0 {
        let step = (BINS / residual).max(1);
        for count in hist.iter_mut().step_by(step).take(residual) {
            *count += 1;
        }
    }
}

/// Nearest tile centres around `pos` and the blend weight of the second
fn neighbours(pos: u32, tile: u32, tiles: u32) -> (u32, u32, f32) {
    let grid_pos = pos as f32 / tile as f32 - 0.5;
    let first = grid_pos.floor();
    let weight = grid_pos - first;
    let last = tiles as i64 - 1;
    let t1 = (first as i64).clamp(0, last) as u32;
    let t2 = (first as i64 + 1).clamp(0, last) as u32;
    (t1, t2, weight)
}

/// Border reflection that does not repeat the edge pixel (`dcb|abcd|cba`)
fn reflect(pos: u32, len: u32) -> u32 {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len - 1);
    let pos = pos % period;
    if pos < len { pos } else { period - pos }
}
