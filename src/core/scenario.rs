use log::debug;

use super::accumulation::accumulation_series;
use super::amortization::{amortization_schedule, periodic_payment};
use super::growth::growth_series;
use super::types::{
    Comparison, GrowthComponent, InvestmentComponent, LoanComponent, NamedSeries,
    PERIODS_PER_YEAR, Projection, ProjectionInputs, ProjectionMethod, Scenario, ScenarioSpec,
    ScenarioSummary,
};

pub const KEEP_AND_FINANCE: &str = "keep-and-finance";
pub const SELL_AND_INVEST: &str = "sell-and-invest";

const DISPLAY_PADDING: f64 = 1.05;

pub fn project(inputs: &ProjectionInputs) -> Projection {
    let specs = [keep_and_finance_spec(inputs), sell_and_invest_spec(inputs)];
    let comparison = compose(&specs, inputs.horizon_periods(), inputs.method);
    Projection {
        monthly_payment: periodic_payment(&inputs.loan),
        initial_lump: sale_proceeds(inputs),
        method: inputs.method,
        comparison,
    }
}

pub fn keep_and_finance_spec(inputs: &ProjectionInputs) -> ScenarioSpec {
    ScenarioSpec {
        name: KEEP_AND_FINANCE.to_string(),
        assets: vec![
            GrowthComponent {
                name: "retained-property".to_string(),
                initial_value: inputs.retained_property_value,
                annual_rate: inputs.property_growth,
            },
            GrowthComponent {
                name: "home".to_string(),
                initial_value: inputs.home_value,
                annual_rate: inputs.property_growth,
            },
        ],
        loan: Some(LoanComponent {
            name: "mortgage".to_string(),
            terms: inputs.loan,
            extra_principal: inputs.extra_principal_monthly,
        }),
        investment: None,
    }
}

pub fn sell_and_invest_spec(inputs: &ProjectionInputs) -> ScenarioSpec {
    ScenarioSpec {
        name: SELL_AND_INVEST.to_string(),
        assets: vec![GrowthComponent {
            name: "home".to_string(),
            initial_value: inputs.home_value,
            annual_rate: inputs.property_growth,
        }],
        loan: None,
        investment: Some(InvestmentComponent {
            name: "equity".to_string(),
            initial_lump: sale_proceeds(inputs),
            contribution: inputs.monthly_contribution,
            annual_return: inputs.equity_return,
        }),
    }
}

pub fn sale_proceeds(inputs: &ProjectionInputs) -> f64 {
    (inputs.retained_property_value - inputs.loan.principal).max(0.0)
}

pub fn compose(specs: &[ScenarioSpec], horizon: u32, method: ProjectionMethod) -> Comparison {
    let scenarios = specs
        .iter()
        .map(|spec| evaluate_spec(spec, horizon, method))
        .collect::<Vec<_>>();
    let display_max = display_max(&scenarios);
    debug!(
        "composed {} scenarios over {horizon} periods, display max {display_max:.2}",
        scenarios.len()
    );

    Comparison {
        periods_per_year: PERIODS_PER_YEAR,
        horizon_periods: horizon,
        years: (0..=horizon)
            .map(|k| k as f64 / PERIODS_PER_YEAR as f64)
            .collect(),
        scenarios,
        display_max,
    }
}

fn evaluate_spec(spec: &ScenarioSpec, horizon: u32, method: ProjectionMethod) -> Scenario {
    let len = horizon as usize + 1;
    let mut components = Vec::with_capacity(spec.assets.len() + 1);

    for asset in &spec.assets {
        components.push(NamedSeries {
            name: asset.name.clone(),
            values: growth_series(asset.initial_value, asset.annual_rate, horizon),
        });
    }
    if let Some(investment) = &spec.investment {
        components.push(NamedSeries {
            name: investment.name.clone(),
            values: accumulation_series(
                investment.initial_lump,
                investment.contribution,
                investment.annual_return,
                horizon,
                method,
            ),
        });
    }

    let mut total_assets = vec![0.0; len];
    for component in &components {
        for (total, value) in total_assets.iter_mut().zip(&component.values) {
            *total += value;
        }
    }

    let debt = spec.loan.as_ref().map(|loan| NamedSeries {
        name: loan.name.clone(),
        values: amortization_schedule(&loan.terms, loan.extra_principal, horizon, method),
    });

    let summary = summarize(&total_assets, debt.as_ref().map(|d| d.values.as_slice()));
    Scenario {
        name: spec.name.clone(),
        components,
        total_assets,
        debt,
        summary,
    }
}

fn summarize(total_assets: &[f64], debt: Option<&[f64]>) -> ScenarioSummary {
    let final_assets = total_assets.last().copied().unwrap_or(0.0);
    let final_debt = debt.and_then(|d| d.last().copied()).unwrap_or(0.0);
    let payoff_period = debt.and_then(|d| d.iter().position(|b| *b <= 0.0).map(|k| k as u32));

    ScenarioSummary {
        final_assets,
        final_debt,
        final_net_worth: final_assets - final_debt,
        payoff_period,
    }
}

pub fn display_max(scenarios: &[Scenario]) -> f64 {
    let peak = scenarios
        .iter()
        .flat_map(Scenario::series)
        .flat_map(|series| series.iter().copied())
        .fold(f64::NEG_INFINITY, f64::max);
    if peak > 0.0 {
        DISPLAY_PADDING * peak
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::LoanTerms;
    use proptest::prelude::{prop_assert, proptest};

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn sample_inputs() -> ProjectionInputs {
        ProjectionInputs {
            horizon_years: 15,
            property_growth: 0.03,
            retained_property_value: 1_900_000.0,
            home_value: 2_300_000.0,
            loan: LoanTerms {
                principal: 1_700_000.0,
                annual_rate: 0.04,
                term_years: 25,
            },
            monthly_rent: 4_500.0,
            extra_principal_monthly: 4_500.0,
            equity_return: 0.065,
            monthly_contribution: 7_000.0,
            method: ProjectionMethod::ClosedForm,
        }
    }

    fn scenario<'a>(projection: &'a Projection, name: &str) -> &'a Scenario {
        projection
            .comparison
            .scenarios
            .iter()
            .find(|s| s.name == name)
            .expect("scenario present")
    }

    fn component<'a>(scenario: &'a Scenario, name: &str) -> &'a [f64] {
        &scenario
            .components
            .iter()
            .find(|c| c.name == name)
            .expect("component present")
            .values
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(32))]

        #[test]
        fn prop_every_series_shares_the_axis_and_fits_under_display_max(
            horizon_years in 1u32..51,
            growth_bp in 0u32..2000,
            retained in 0u32..4_000_000,
            home in 0u32..4_000_000,
            principal in 0u32..3_000_000,
            rate_bp in 0u32..3000,
            term_years in 1u32..41,
            extra in 0u32..10_000,
            equity_bp in 0u32..5000,
            contribution in 0u32..20_000
        ) {
            let inputs = ProjectionInputs {
                horizon_years,
                property_growth: growth_bp as f64 / 10_000.0,
                retained_property_value: retained as f64,
                home_value: home as f64,
                loan: LoanTerms {
                    principal: principal as f64,
                    annual_rate: rate_bp as f64 / 10_000.0,
                    term_years,
                },
                monthly_rent: extra as f64,
                extra_principal_monthly: extra as f64,
                equity_return: equity_bp as f64 / 10_000.0,
                monthly_contribution: contribution as f64,
                method: ProjectionMethod::ClosedForm,
            };
            let projection = project(&inputs);
            let comparison = &projection.comparison;
            let len = horizon_years as usize * 12 + 1;
            prop_assert!(comparison.years.len() == len);
            prop_assert!(comparison.display_max > 0.0);
            for scenario in &comparison.scenarios {
                for series in scenario.series() {
                    prop_assert!(series.len() == len);
                    let peak = series.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                    prop_assert!(comparison.display_max >= 1.05 * peak);
                }
            }
            prop_assert!(projection.initial_lump >= 0.0);
        }
    }

    #[test]
    fn horizon_periods_saturate_for_huge_horizons() {
        let mut inputs = sample_inputs();
        inputs.horizon_years = u32::MAX;
        assert_eq!(inputs.horizon_periods(), u32::MAX);
    }

    #[test]
    fn sale_proceeds_are_net_of_payoff_and_never_negative() {
        let mut inputs = sample_inputs();
        assert_eq!(sale_proceeds(&inputs), 200_000.0);
        inputs.retained_property_value = 1_000_000.0;
        assert_eq!(sale_proceeds(&inputs), 0.0);
    }

    #[test]
    fn display_max_defaults_to_one_when_everything_is_zero() {
        let mut inputs = sample_inputs();
        inputs.retained_property_value = 0.0;
        inputs.home_value = 0.0;
        inputs.loan.principal = 0.0;
        inputs.monthly_contribution = 0.0;
        let projection = project(&inputs);
        assert_eq!(projection.comparison.display_max, 1.0);
        assert_eq!(projection.monthly_payment, 0.0);
    }

    #[test]
    fn display_max_pads_the_largest_series() {
        let projection = project(&sample_inputs());
        let keep = scenario(&projection, KEEP_AND_FINANCE);
        let peak = keep.total_assets[180];
        assert_approx_tol(projection.comparison.display_max, 1.05 * peak, 1e-6);
    }

    #[test]
    fn keep_and_finance_sums_both_properties_and_carries_accelerated_debt() {
        let inputs = sample_inputs();
        let projection = project(&inputs);
        let keep = scenario(&projection, KEEP_AND_FINANCE);

        assert_eq!(keep.components.len(), 2);
        assert_approx_tol(keep.total_assets[0], 4_200_000.0, 1e-6);
        assert_approx_tol(keep.total_assets[180], 2_978_120.28 + 3_605_092.97, 0.05);

        let debt = keep.debt.as_ref().expect("debt present");
        assert_eq!(debt.name, "mortgage");
        let debt = &debt.values;
        assert_eq!(debt.len(), 181);
        assert_eq!(debt[0], 1_700_000.0);
        assert_eq!(debt[180], 0.0);
        assert_eq!(keep.summary.payoff_period, Some(164));
        assert_eq!(keep.summary.final_debt, 0.0);
        assert_approx_tol(keep.summary.final_net_worth, keep.summary.final_assets, 1e-9);
    }

    #[test]
    fn sell_and_invest_seeds_equity_with_sale_proceeds_and_keeps_home() {
        let projection = project(&sample_inputs());
        let sell = scenario(&projection, SELL_AND_INVEST);

        assert!(sell.debt.is_none());
        assert_eq!(sell.summary.payoff_period, None);
        assert_eq!(projection.initial_lump, 200_000.0);

        let equity = component(sell, "equity");
        let home = component(sell, "home");
        assert_eq!(equity[0], 200_000.0);
        assert_approx_tol(equity[180], 2_653_653.53, 0.01);
        for k in 0..sell.total_assets.len() {
            assert_approx_tol(sell.total_assets[k], equity[k] + home[k], 1e-6);
        }
    }

    #[test]
    fn reports_native_term_monthly_payment() {
        let projection = project(&sample_inputs());
        assert_approx_tol(projection.monthly_payment, 8_973.226, 0.01);
    }

    #[test]
    fn methods_produce_matching_projections() {
        let mut inputs = sample_inputs();
        let closed = project(&inputs);
        inputs.method = ProjectionMethod::Iterative;
        let iterative = project(&inputs);

        assert_approx_tol(
            closed.comparison.display_max,
            iterative.comparison.display_max,
            1e-3,
        );
        for (a, b) in closed
            .comparison
            .scenarios
            .iter()
            .zip(&iterative.comparison.scenarios)
        {
            for (sa, sb) in a.series().zip(b.series()) {
                for (x, y) in sa.iter().zip(sb) {
                    assert_approx_tol(*x, *y, 1e-6 * x.abs().max(1.0));
                }
            }
        }
    }

    #[test]
    fn compose_accepts_arbitrary_declarative_specs() {
        let spec = ScenarioSpec {
            name: "cash-only".to_string(),
            assets: Vec::new(),
            loan: None,
            investment: Some(InvestmentComponent {
                name: "savings".to_string(),
                initial_lump: 1_000.0,
                contribution: 100.0,
                annual_return: 0.0,
            }),
        };
        let comparison = compose(&[spec], 12, ProjectionMethod::Iterative);
        let only = &comparison.scenarios[0];
        assert_eq!(only.total_assets[12], 2_200.0);
        assert_eq!(comparison.years[12], 1.0);
        assert_approx_tol(comparison.display_max, 2_310.0, 1e-9);
    }

    #[test]
    fn scenario_without_components_has_flat_zero_assets() {
        let spec = ScenarioSpec {
            name: "empty".to_string(),
            assets: Vec::new(),
            loan: None,
            investment: None,
        };
        let comparison = compose(&[spec], 6, ProjectionMethod::ClosedForm);
        assert_eq!(comparison.scenarios[0].total_assets, vec![0.0; 7]);
        assert_eq!(comparison.display_max, 1.0);
    }
}
