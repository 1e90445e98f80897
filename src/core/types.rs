use serde::Serialize;

pub const PERIODS_PER_YEAR: u32 = 12;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectionMethod {
    #[default]
    ClosedForm,
    Iterative,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LoanTerms {
    pub principal: f64,
    pub annual_rate: f64,
    pub term_years: u32,
}

impl LoanTerms {
    pub fn periodic_rate(&self) -> f64 {
        self.annual_rate / PERIODS_PER_YEAR as f64
    }

    pub fn scheduled_periods(&self) -> u32 {
        self.term_years.saturating_mul(PERIODS_PER_YEAR)
    }
}

#[derive(Debug, Clone)]
pub struct ProjectionInputs {
    pub horizon_years: u32,
    pub property_growth: f64,
    pub retained_property_value: f64,
    pub home_value: f64,
    pub loan: LoanTerms,
    pub monthly_rent: f64,
    pub extra_principal_monthly: f64,
    pub equity_return: f64,
    pub monthly_contribution: f64,
    pub method: ProjectionMethod,
}

impl ProjectionInputs {
    pub fn horizon_periods(&self) -> u32 {
        self.horizon_years.saturating_mul(PERIODS_PER_YEAR)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GrowthComponent {
    pub name: String,
    pub initial_value: f64,
    pub annual_rate: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoanComponent {
    pub name: String,
    pub terms: LoanTerms,
    pub extra_principal: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvestmentComponent {
    pub name: String,
    pub initial_lump: f64,
    pub contribution: f64,
    pub annual_return: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioSpec {
    pub name: String,
    pub assets: Vec<GrowthComponent>,
    pub loan: Option<LoanComponent>,
    pub investment: Option<InvestmentComponent>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedSeries {
    pub name: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioSummary {
    pub final_assets: f64,
    pub final_debt: f64,
    pub final_net_worth: f64,
    pub payoff_period: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub name: String,
    pub components: Vec<NamedSeries>,
    pub total_assets: Vec<f64>,
    pub debt: Option<NamedSeries>,
    pub summary: ScenarioSummary,
}

impl Scenario {
    pub fn series(&self) -> impl Iterator<Item = &[f64]> {
        self.components
            .iter()
            .map(|c| c.values.as_slice())
            .chain(std::iter::once(self.total_assets.as_slice()))
            .chain(self.debt.as_ref().map(|d| d.values.as_slice()))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub periods_per_year: u32,
    pub horizon_periods: u32,
    pub years: Vec<f64>,
    pub scenarios: Vec<Scenario>,
    pub display_max: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub monthly_payment: f64,
    pub initial_lump: f64,
    pub method: ProjectionMethod,
    #[serde(flatten)]
    pub comparison: Comparison,
}
