// Small numeric helpers for feature formulas. All return 0 on empty input.

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// `numerator / denominator`, or 0 when the denominator is 0
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Index of the largest bin, lowest index on ties; 0 for an all-zero histogram
pub fn argmax(histogram: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in histogram.iter().enumerate() {
        if v > histogram[best] {
            best = i;
        }
    }
    best
}

pub fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(0.0, f64::max)
}

pub fn count_nonzero(histogram: &[f64]) -> f64 {
    histogram.iter().filter(|&&v| v > 0.0).count() as f64
}

/// Largest and second largest bins
pub fn top_two(histogram: &[f64]) -> (f64, f64) {
    let mut first = 0.0;
    let mut second = 0.0;
    for &v in histogram {
        if v > first {
            second = first;
            first = v;
        } else if v > second {
            second = v;
        }
    }
    (first, second)
}
