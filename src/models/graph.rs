use std::collections::BTreeMap;

use base64::Engine;
use serde::{Deserialize, Serialize};

/// Session counts per category, as reported by the backend.
pub type CategoryCounts = BTreeMap<String, u64>;

/// Finished graph job: the rendered graph plus the statistics of the mined
/// sessions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GraphResult {
    /// Data-URL carrying the graph description.
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<GraphMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_sessions: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GraphMetadata {
    #[serde(default)]
    pub banks: CategoryCounts,
    #[serde(default)]
    pub methods: CategoryCounts,
    #[serde(default)]
    pub errors: CategoryCounts,
}

/// One bar of a bar chart.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryAmount {
    pub category: String,
    pub amount: u64,
}

/// Share of sessions that ended with a given error.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorShare {
    pub item: String,
    pub count: u64,
    /// Percentage of all sessions, two decimals.
    pub pct: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Graph image is not a data URL")]
    NotDataUrl,

    #[error("Graph image payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Graph description is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl GraphResult {
    /// Decode the graph description text embedded in `image`.
    ///
    /// The text is handed over as-is; a malformed graph only shows up when it
    /// is rendered.
    pub fn dot_source(&self) -> Result<String, DecodeError> {
        let rest = self
            .image
            .strip_prefix("data:")
            .ok_or(DecodeError::NotDataUrl)?;
        let (header, data) = rest.split_once(',').ok_or(DecodeError::NotDataUrl)?;

        if header.split(';').any(|part| part.eq_ignore_ascii_case("base64")) {
            let bytes = base64::engine::general_purpose::STANDARD.decode(data.trim())?;
            Ok(String::from_utf8(bytes)?)
        } else {
            Ok(data.to_string())
        }
    }

    pub fn bank_series(&self) -> Vec<CategoryAmount> {
        self.metadata
            .as_ref()
            .map(|m| chart_series(&m.banks))
            .unwrap_or_default()
    }

    pub fn method_series(&self) -> Vec<CategoryAmount> {
        self.metadata
            .as_ref()
            .map(|m| chart_series(&m.methods))
            .unwrap_or_default()
    }

    pub fn error_breakdown(&self) -> Vec<ErrorShare> {
        match &self.metadata {
            Some(m) => error_breakdown(&m.errors, self.number_of_sessions.unwrap_or(0)),
            None => Vec::new(),
        }
    }
}

/// Reshape counts into chart bars, ordered by category name.
pub fn chart_series(counts: &CategoryCounts) -> Vec<CategoryAmount> {
    counts
        .iter()
        .map(|(category, amount)| CategoryAmount {
            category: category.clone(),
            amount: *amount,
        })
        .collect()
}

/// Percentage of sessions per error, most frequent first.
///
/// Equal counts are ordered by name. With zero sessions every share is
/// reported as `0.00`.
pub fn error_breakdown(errors: &CategoryCounts, number_of_sessions: u64) -> Vec<ErrorShare> {
    let mut shares: Vec<ErrorShare> = errors
        .iter()
        .map(|(item, count)| {
            let pct = if number_of_sessions == 0 {
                0.0
            } else {
                *count as f64 / number_of_sessions as f64 * 100.0
            };
            ErrorShare {
                item: item.clone(),
                count: *count,
                pct: format!("{:.2}", pct),
            }
        })
        .collect();

    // BTreeMap iteration is already name-ordered and sort_by is stable.
    shares.sort_by(|a, b| b.count.cmp(&a.count));
    shares
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(pairs: &[(&str, u64)]) -> CategoryCounts {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_error_percentages() {
        let shares = error_breakdown(&counts(&[("E2", 1), ("E1", 3)]), 4);
        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].item, "E1");
        assert_eq!(shares[0].pct, "75.00");
        assert_eq!(shares[1].item, "E2");
        assert_eq!(shares[1].pct, "25.00");
    }

    #[test]
    fn test_error_percentages_zero_sessions() {
        let shares = error_breakdown(&counts(&[("TIMEOUT", 2)]), 0);
        assert_eq!(shares[0].pct, "0.00");
    }

    #[test]
    fn test_error_ties_ordered_by_name() {
        let shares = error_breakdown(&counts(&[("b", 2), ("a", 2), ("c", 5)]), 9);
        let items: Vec<&str> = shares.iter().map(|s| s.item.as_str()).collect();
        assert_eq!(items, vec!["c", "a", "b"]);
        assert_eq!(shares[0].pct, "55.56");
    }

    #[test]
    fn test_chart_series_ordered_by_category() {
        let series = chart_series(&counts(&[("Sparkasse", 12), ("Commerzbank", 7)]));
        assert_eq!(
            series,
            vec![
                CategoryAmount { category: "Commerzbank".to_string(), amount: 7 },
                CategoryAmount { category: "Sparkasse".to_string(), amount: 12 },
            ]
        );
    }

    #[test]
    fn test_dot_source_base64() {
        let result = GraphResult {
            image: "data:text/vnd.graphviz;charset=utf-8;base64,ZGlncmFwaCB7IGEgLT4gYiB9"
                .to_string(),
            metadata: None,
            number_of_sessions: None,
        };
        assert_eq!(result.dot_source().unwrap(), "digraph { a -> b }");
    }

    #[test]
    fn test_dot_source_plain() {
        let result = GraphResult {
            image: "data:text/plain,digraph{}".to_string(),
            metadata: None,
            number_of_sessions: None,
        };
        assert_eq!(result.dot_source().unwrap(), "digraph{}");
    }

    #[test]
    fn test_dot_source_rejects_non_data_url() {
        let result = GraphResult {
            image: "https://example.com/graph.svg".to_string(),
            metadata: None,
            number_of_sessions: None,
        };
        assert!(matches!(result.dot_source(), Err(DecodeError::NotDataUrl)));
    }

    #[test]
    fn test_dot_source_bad_base64() {
        let result = GraphResult {
            image: "data:text/plain;base64,***".to_string(),
            metadata: None,
            number_of_sessions: None,
        };
        assert!(matches!(result.dot_source(), Err(DecodeError::Base64(_))));
    }

    #[test]
    fn test_payload_wire_shape() {
        let result: GraphResult = serde_json::from_str(
            r#"{
                "image": "data:text/plain;base64,QQ==",
                "metadata": {
                    "banks": {"Commerzbank": 6, "Sparkasse": 4},
                    "methods": {"get_accounts": 10},
                    "errors": {"E1": 3, "E2": 1}
                },
                "numberOfSessions": 10
            }"#,
        )
        .unwrap();

        assert_eq!(result.dot_source().unwrap(), "A");
        assert_eq!(result.number_of_sessions, Some(10));
        assert_eq!(result.bank_series().len(), 2);
        assert_eq!(result.method_series()[0].amount, 10);

        let errors = result.error_breakdown();
        assert_eq!(errors[0].pct, "30.00");
        assert_eq!(errors[1].pct, "10.00");
    }

    #[test]
    fn test_payload_without_metadata() {
        let result: GraphResult = serde_json::from_str(r#"{"image": "data:,x"}"#).unwrap();
        assert!(result.bank_series().is_empty());
        assert!(result.error_breakdown().is_empty());
    }
}
