use super::types::PERIODS_PER_YEAR;

pub fn growth_series(initial_value: f64, annual_rate: f64, horizon: u32) -> Vec<f64> {
    if horizon == 0 {
        return vec![initial_value];
    }
    let factor = 1.0 + annual_rate / PERIODS_PER_YEAR as f64;
    (0..=horizon)
        .map(|k| initial_value * factor.powf(k as f64))
        .collect()
}
