use garde::Validate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Integration approach used by the bank sessions being mined.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, EnumString, Display, PartialEq, Eq)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum Approach {
    Redirect,
    Embedded,
}

/// Which API method family to restrict the mined sessions to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, EnumString, Display, PartialEq, Eq)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum MethodType {
    All,
    GetAccounts,
    GetTransactions,
}

/// Output format of the rendered graph.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, EnumString, Display, PartialEq, Eq, Default)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Dot,
    Svg,
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid request parameters: {0}")]
pub struct ParamsError(String);

/// Filter selection attached to a job submission.
///
/// Every field is optional and only the fields that are set end up in the
/// query string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct RequestParameters {
    /// `approach`: restrict to sessions of one integration approach.
    #[garde(skip)]
    pub approach: Option<Approach>,

    /// `method_type`: restrict to one API method family.
    #[garde(skip)]
    pub method_type: Option<MethodType>,

    /// `bank`: restrict to sessions against one bank.
    #[garde(length(min = 1, max = 100))]
    pub bank: Option<String>,

    /// `error_type`: restrict to sessions that hit one error.
    #[garde(length(min = 1, max = 100))]
    pub error_type: Option<String>,

    /// `threshold`: dependency threshold (graph depth) for heuristic nets.
    #[garde(range(min = 0.0, max = 1.0))]
    pub threshold: Option<f64>,

    /// `format`: graph output format.
    #[garde(skip)]
    pub format: Option<OutputFormat>,

    /// `force`: re-download logs that were already retrieved (log refresh only).
    #[garde(skip)]
    pub force: Option<bool>,
}

impl RequestParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameters for a graph request: DOT output unless overridden.
    pub fn graph(approach: Approach) -> Self {
        Self {
            approach: Some(approach),
            format: Some(OutputFormat::Dot),
            ..Self::default()
        }
    }

    pub fn with_approach(mut self, approach: Approach) -> Self {
        self.approach = Some(approach);
        self
    }

    pub fn with_method_type(mut self, method_type: MethodType) -> Self {
        self.method_type = Some(method_type);
        self
    }

    pub fn with_bank(mut self, bank: impl Into<String>) -> Self {
        self.bank = Some(bank.into());
        self
    }

    pub fn with_error_type(mut self, error_type: impl Into<String>) -> Self {
        self.error_type = Some(error_type.into());
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = Some(force);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Validate and render into query pairs, in a fixed key order.
    pub fn to_query(&self) -> Result<Vec<(String, String)>, ParamsError> {
        self.validate().map_err(|report| ParamsError(report.to_string()))?;
        // Range checks pass NaN through
        if let Some(threshold) = self.threshold.filter(|t| !t.is_finite()) {
            return Err(ParamsError(format!(
                "threshold: {} is not a finite number",
                threshold
            )));
        }

        let mut query = Vec::new();
        if let Some(approach) = self.approach {
            query.push(("approach".to_string(), approach.to_string()));
        }
        if let Some(method_type) = self.method_type {
            query.push(("method_type".to_string(), method_type.to_string()));
        }
        if let Some(bank) = &self.bank {
            query.push(("bank".to_string(), bank.clone()));
        }
        if let Some(error_type) = &self.error_type {
            query.push(("error_type".to_string(), error_type.clone()));
        }
        if let Some(threshold) = self.threshold {
            query.push(("threshold".to_string(), threshold.to_string()));
        }
        if let Some(format) = self.format {
            query.push(("format".to_string(), format.to_string()));
        }
        if let Some(force) = self.force {
            query.push(("force".to_string(), force.to_string()));
        }
        Ok(query)
    }
}
