// src/indicators/peaks.rs

/// Local maxima of `values` with a minimum height and a minimum index
/// distance between kept peaks.
///
/// Flat plateaus report their middle index (rounded down). The first and last
/// samples are never peaks. When two peaks are closer than `distance`, the
/// taller one wins; equal heights keep the right-most.
pub fn find_peaks(values: &[f64], min_height: f64, distance: f64) -> Vec<usize> {
    let candidates: Vec<usize> = local_maxima(values)
        .into_iter()
        .filter(|&i| values[i] >= min_height)
        .collect();
    select_by_distance(&candidates, values, distance.max(1.0).ceil() as usize)
}

fn local_maxima(values: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if values.len() < 3 {
        return peaks;
    }
    let last = values.len() - 1;
    let mut i = 1;
    while i < last {
        if values[i - 1] < values[i] {
            let mut ahead = i + 1;
            while ahead < last && values[ahead] == values[i] {
                ahead += 1;
            }
            if values[ahead] < values[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
                continue;
            }
        }
        i += 1;
    }
    peaks
}

fn select_by_distance(peaks: &[usize], values: &[f64], distance: usize) -> Vec<usize> {
    if distance <= 1 || peaks.len() < 2 {
        return peaks.to_vec();
    }
    let mut order: Vec<usize> = (0..peaks.len()).collect();
    order.sort_by(|&a, &b| {
        values[peaks[a]]
            .partial_cmp(&values[peaks[b]])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = vec![true; peaks.len()];
    for &j in order.iter().rev() {
        if !keep[j] {
            continue;
        }
        let mut k = j;
        while k > 0 && peaks[j] - peaks[k - 1] < distance {
            keep[k - 1] = false;
            k -= 1;
        }
        let mut k = j + 1;
        while k < peaks.len() && peaks[k] - peaks[j] < distance {
            keep[k] = false;
            k += 1;
        }
    }

    peaks
        .iter()
        .zip(keep)
        .filter_map(|(&p, kept)| kept.then_some(p))
        .collect()
}
