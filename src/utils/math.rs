use std::cmp::Ordering;

pub fn median(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let size = sorted.len();
    if size % 2 == 0 {
        Some((sorted[size / 2 - 1] + sorted[size / 2]) / 2.0)
    } else {
        Some(sorted[size / 2])
    }
}

/// Sum of natural logs; zero or negative probabilities contribute `-inf`.
pub fn log_sum<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    values
        .into_iter()
        .map(|v| if v > 0.0 { v.ln() } else { f64::NEG_INFINITY })
        .sum()
}
