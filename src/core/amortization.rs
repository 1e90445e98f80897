use log::trace;

use super::types::{LoanTerms, ProjectionMethod};

pub fn periodic_payment(terms: &LoanTerms) -> f64 {
    if terms.principal <= 0.0 {
        return 0.0;
    }

    let n = terms.scheduled_periods();
    if n == 0 {
        return terms.principal;
    }

    let r = terms.periodic_rate();
    if r == 0.0 {
        return terms.principal / n as f64;
    }

    let growth = (1.0 + r).powf(n as f64);
    if !growth.is_finite() {
        return terms.principal * r;
    }
    terms.principal * r * growth / (growth - 1.0)
}

pub fn amortization_schedule(
    terms: &LoanTerms,
    extra_principal: f64,
    horizon: u32,
    method: ProjectionMethod,
) -> Vec<f64> {
    let len = horizon as usize + 1;
    if terms.principal <= 0.0 {
        return vec![0.0; len];
    }

    let payment = periodic_payment(terms);
    let extra = extra_principal.max(0.0);
    trace!(
        "amortizing principal={} rate={} term={}y payment={payment:.2} extra={extra} horizon={horizon} method={method:?}",
        terms.principal, terms.annual_rate, terms.term_years
    );

    match method {
        ProjectionMethod::ClosedForm => closed_form_schedule(terms, payment, extra, horizon),
        ProjectionMethod::Iterative => iterative_schedule(terms, payment, extra, horizon),
    }
}

fn iterative_schedule(terms: &LoanTerms, payment: f64, extra: f64, horizon: u32) -> Vec<f64> {
    let n = terms.scheduled_periods();
    let r = terms.periodic_rate();
    let mut balance = terms.principal;
    let mut balances = Vec::with_capacity(horizon as usize + 1);
    balances.push(balance);

    for k in 1..=horizon {
        if k > n {
            balance = 0.0;
        } else if balance > 0.0 {
            let interest = balance * r;
            let principal_portion = ((payment - interest).max(0.0) + extra).min(balance);
            balance -= principal_portion;
        }
        balances.push(balance);
    }

    balances
}

fn closed_form_schedule(terms: &LoanTerms, payment: f64, extra: f64, horizon: u32) -> Vec<f64> {
    let n = terms.scheduled_periods();
    let r = terms.periodic_rate();
    let outflow = payment + extra;

    let mut paid_off = false;
    (0..=horizon)
        .map(|k| {
            if paid_off || k > n {
                return 0.0;
            }
            let balance = closed_form_balance(terms.principal, r, outflow, k).max(0.0);
            if balance == 0.0 {
                paid_off = true;
            }
            balance
        })
        .collect()
}

// Valid while the installment covers interest, which holds along any path at or
// below the native amortization curve.
fn closed_form_balance(principal: f64, r: f64, outflow: f64, k: u32) -> f64 {
    if r == 0.0 {
        return principal - outflow * k as f64;
    }
    let growth = (1.0 + r).powf(k as f64);
    principal * growth - outflow * (growth - 1.0) / r
}
