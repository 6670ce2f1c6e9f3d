//! The named electrical quantities and their evaluation against a view.
//!
//! [`Metric`] is the closed set of quantities the timeline and reporting
//! layers can ask for. Evaluation delegates to the corresponding
//! [`IndividualView`] accessor, so the formulas live in one place.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MetricError, MetricResult};
use crate::view::IndividualView;

/// Round to 3 decimal places, matching the precision the derived
/// quantities are reported at.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// A computable electrical quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Metric {
    /// Stored `Potência_Aparente`, in VA.
    ApparentPower,
    /// `apparent × demand_factor`.
    Demand,
    /// `|apparent| × power_factor`.
    ActivePower,
    /// `sqrt(apparent² − active²)`.
    ReactivePower,
    /// `|demand| / usage_priority`, 0 without a usage priority.
    Rdp,
    /// `|apparent × demand_factor| / generation_priority`, 0 without a
    /// generation priority.
    Der,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::ApparentPower,
        Metric::Demand,
        Metric::ActivePower,
        Metric::ReactivePower,
        Metric::Rdp,
        Metric::Der,
    ];

    /// Evaluate this metric against one individual.
    ///
    /// Only `ReactivePower` can fail (inconsistent power triangle); the
    /// other quantities are total over the defaults.
    pub fn evaluate(self, view: &IndividualView<'_>) -> MetricResult<f64> {
        Ok(match self {
            Metric::ApparentPower => view.apparent_power() as f64,
            Metric::Demand => view.demand(),
            Metric::ActivePower => view.active_power(),
            Metric::ReactivePower => view.reactive_power()?,
            Metric::Rdp => view.rdp(),
            Metric::Der => view.der(),
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::ApparentPower => "apparent-power",
            Metric::Demand => "demand",
            Metric::ActivePower => "active-power",
            Metric::ReactivePower => "reactive-power",
            Metric::Rdp => "rdp",
            Metric::Der => "der",
        }
    }
}

/// Sum a metric over a flattened list of views, rounded to 3 decimals.
///
/// Aggregation over a subtree is `summation(&view.descendants()?, metric)`.
pub fn summation(views: &[IndividualView<'_>], metric: Metric) -> MetricResult<f64> {
    let mut total = 0.0;
    for view in views {
        total += metric.evaluate(view)?;
    }
    Ok(round3(total))
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = MetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept both kebab-case and snake_case spellings.
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "apparent-power" => Ok(Metric::ApparentPower),
            "demand" => Ok(Metric::Demand),
            "active-power" => Ok(Metric::ActivePower),
            "reactive-power" => Ok(Metric::ReactivePower),
            "rdp" => Ok(Metric::Rdp),
            "der" => Ok(Metric::Der),
            _ => Err(MetricError::UnknownMetric {
                value: s.to_string(),
            }),
        }
    }
}
