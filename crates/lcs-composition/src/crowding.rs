//! Crowding distance over a Pareto front

use ndarray::{Array1, ArrayView2, Axis};

/// Crowding distance of every row of an `(N x M)` objective matrix
///
/// Per objective, the rows are sorted and the two extremes get an infinite
/// distance while interior rows accumulate the normalized gap between their
/// neighbours. An objective with zero range contributes nothing. Fronts of at
/// most two members are all assigned 1.
pub fn crowding_distances(objectives: ArrayView2<'_, f64>) -> Array1<f64> {
    let n = objectives.nrows();
    if n <= 2 {
        return Array1::ones(n);
    }

    let mut distances = Array1::<f64>::zeros(n);
    for column in objectives.axis_iter(Axis(1)) {
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| column[a].total_cmp(&column[b]));

        let min = column[order[0]];
        let max = column[order[n - 1]];
        let range = max - min;
        if range == 0.0 || !range.is_finite() {
            continue;
        }

        distances[order[0]] = f64::INFINITY;
        distances[order[n - 1]] = f64::INFINITY;
        for window in order.windows(3) {
            let (prev, current, next) = (window[0], window[1], window[2]);
            distances[current] += (column[next] - column[prev]) / range;
        }
    }
    distances
}
