mod accumulation;
mod amortization;
mod growth;
mod scenario;
mod types;

pub use accumulation::accumulation_series;
pub use amortization::{amortization_schedule, periodic_payment};
pub use growth::growth_series;
pub use scenario::{
    KEEP_AND_FINANCE, SELL_AND_INVEST, compose, display_max, keep_and_finance_spec, project,
    sale_proceeds, sell_and_invest_spec,
};
pub use types::{
    Comparison, GrowthComponent, InvestmentComponent, LoanComponent, LoanTerms, NamedSeries,
    PERIODS_PER_YEAR, Projection, ProjectionInputs, ProjectionMethod, Scenario, ScenarioSpec,
    ScenarioSummary,
};
