use super::types::{PERIODS_PER_YEAR, ProjectionMethod};

pub fn accumulation_series(
    initial_lump: f64,
    contribution: f64,
    annual_return: f64,
    horizon: u32,
    method: ProjectionMethod,
) -> Vec<f64> {
    let r = annual_return / PERIODS_PER_YEAR as f64;
    match method {
        ProjectionMethod::ClosedForm => (0..=horizon)
            .map(|k| closed_form_balance(initial_lump, contribution, r, k))
            .collect(),
        ProjectionMethod::Iterative => {
            let mut balance = initial_lump;
            let mut balances = Vec::with_capacity(horizon as usize + 1);
            balances.push(balance);
            for _ in 1..=horizon {
                balance = balance * (1.0 + r) + contribution;
                balances.push(balance);
            }
            balances
        }
    }
}

fn closed_form_balance(initial_lump: f64, contribution: f64, r: f64, k: u32) -> f64 {
    if r == 0.0 {
        return initial_lump + contribution * k as f64;
    }
    let growth = (1.0 + r).powf(k as f64);
    initial_lump * growth + contribution * (growth - 1.0) / r
}
