// src/indicators/support_resistance.rs
use crate::imaging::{probabilistic_hough, GrayImage, HoughParams, LineSegment};
use crate::indicators::peaks::find_peaks;
use crate::indicators::{PRICE_MAX, PRICE_MIN};
use crate::types::{round2, SupportResistance};
use rand::Rng;

const HOUGH_THRESHOLD: u32 = 50;
const MAX_LINE_GAP: i64 = 20;
const MAX_Y_DEVIATION: i64 = 10;
const MIN_LEVEL_SPACING: i64 = 20;
const PEAK_HEIGHT_RATIO: f64 = 0.3;
const PEAK_DISTANCE_RATIO: f64 = 0.05;
const LEVELS_PER_SIDE: usize = 2;

/// Midpoint rows of near-horizontal segments, ascending, keeping a row only
/// when it sits more than 20px below the previously kept one.
pub fn horizontal_levels(segments: &[LineSegment]) -> Vec<i64> {
    let mut rows: Vec<i64> = segments
        .iter()
        .filter(|s| s.dy().abs() < MAX_Y_DEVIATION)
        .map(|s| (s.y1 + s.y2).div_euclid(2))
        .collect();
    rows.sort_unstable();

    let mut kept: Vec<i64> = Vec::with_capacity(rows.len());
    for row in rows {
        match kept.last() {
            Some(&last) if row - last <= MIN_LEVEL_SPACING => {}
            _ => kept.push(row),
        }
    }
    kept
}

/// Rows with dense edge content, used when no horizontal line is found.
pub fn edge_density_rows(edges: &GrayImage) -> Vec<i64> {
    let sums = edges.row_sums();
    let max = sums.iter().copied().fold(0.0, f64::max);
    let distance = edges.height() as f64 * PEAK_DISTANCE_RATIO;
    find_peaks(&sums, max * PEAK_HEIGHT_RATIO, distance)
        .into_iter()
        .map(|y| y as i64)
        .collect()
}

pub fn row_to_price(y: i64, height: usize) -> f64 {
    let normalized = 1.0 - y as f64 / height as f64;
    round2(PRICE_MIN + normalized * (PRICE_MAX - PRICE_MIN))
}

/// Turn candidate rows into two support and two resistance levels. Rows are
/// walked bottom-up and dealt alternately to resistance and support; missing
/// levels are drawn from the lower or upper 30% of the price range.
pub fn levels_from_rows<R: Rng + ?Sized>(rows: &[i64], height: usize, rng: &mut R) -> SupportResistance {
    let mut rows = rows.to_vec();
    rows.sort_unstable_by(|a, b| b.cmp(a));

    let mut support = Vec::new();
    let mut resistance = Vec::new();
    for (i, &y) in rows.iter().enumerate() {
        let price = row_to_price(y, height);
        if i % 2 == 0 {
            resistance.push(price);
        } else {
            support.push(price);
        }
    }

    let span = PRICE_MAX - PRICE_MIN;
    while support.len() < LEVELS_PER_SIDE {
        support.push(round2(PRICE_MIN + rng.gen_range(0.0..0.3) * span));
    }
    while resistance.len() < LEVELS_PER_SIDE {
        resistance.push(round2(PRICE_MIN + rng.gen_range(0.7..1.0) * span));
    }

    support.sort_by(|a, b| a.total_cmp(b));
    resistance.sort_by(|a, b| b.total_cmp(a));
    support.truncate(LEVELS_PER_SIDE);
    resistance.truncate(LEVELS_PER_SIDE);
    SupportResistance { support, resistance }
}

pub fn extract_support_resistance<R: Rng + ?Sized>(edges: &GrayImage, rng: &mut R) -> SupportResistance {
    let min_length = (edges.width() / 5) as f64;
    let segments = probabilistic_hough(
        edges,
        &HoughParams::new(HOUGH_THRESHOLD, min_length, MAX_LINE_GAP),
    );
    let mut rows = horizontal_levels(&segments);
    if rows.is_empty() {
        rows = edge_density_rows(edges);
        log::debug!("No horizontal lines, using {} edge density peaks", rows.len());
    } else {
        log::debug!("Horizontal levels at rows {:?}", rows);
    }
    levels_from_rows(&rows, edges.height(), rng)
}
