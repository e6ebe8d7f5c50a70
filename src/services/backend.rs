//! Process Mining Backend API
//!
//! Typed wrappers for the backend's job routes. Every route answers with a
//! job handle and is driven to completion by the [`PollFetchClient`].

use std::collections::BTreeMap;

use serde::de::IgnoredAny;
use tokio_util::sync::CancellationToken;

use crate::models::graph::{CategoryCounts, GraphResult};
use crate::models::params::{Approach, OutputFormat, RequestParameters};
use crate::services::error::FetchError;
use crate::services::poll_fetch::PollFetchClient;

/// Job routes, relative to the backend base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routes {
    pub directly_follows_graph: String,
    pub heuristic_net: String,
    pub method_count: String,
    pub approach_count: String,
    pub refresh_logs: String,
}

impl Default for Routes {
    fn default() -> Self {
        Self {
            directly_follows_graph: "graphs/dfg/get".to_string(),
            heuristic_net: "graphs/hn/get".to_string(),
            method_count: "metadata/method/count".to_string(),
            approach_count: "metadata/approaches/count".to_string(),
            refresh_logs: "logs/refresh".to_string(),
        }
    }
}

/// Method-type session counts, keyed by approach.
pub type MethodCounts = BTreeMap<String, CategoryCounts>;

#[derive(Clone)]
pub struct ProcessMiningApi {
    client: PollFetchClient,
    routes: Routes,
}

impl ProcessMiningApi {
    pub fn new(client: PollFetchClient) -> Self {
        Self::with_routes(client, Routes::default())
    }

    pub fn with_routes(client: PollFetchClient, routes: Routes) -> Self {
        Self { client, routes }
    }

    pub fn client(&self) -> &PollFetchClient {
        &self.client
    }

    /// Graph for the full filter selection. Requests DOT output unless the
    /// parameters name another format.
    pub async fn graph(
        &self,
        params: &RequestParameters,
        cancel: &CancellationToken,
    ) -> Result<GraphResult, FetchError> {
        let mut params = params.clone();
        params.format.get_or_insert(OutputFormat::Dot);

        self.client
            .request_data(&self.routes.heuristic_net, &params, cancel)
            .await
    }

    pub async fn directly_follows_graph(
        &self,
        approach: Approach,
        cancel: &CancellationToken,
    ) -> Result<GraphResult, FetchError> {
        let params = RequestParameters::new().with_approach(approach);
        self.client
            .request_data(&self.routes.directly_follows_graph, &params, cancel)
            .await
    }

    pub async fn heuristic_net(
        &self,
        approach: Approach,
        threshold: f64,
        cancel: &CancellationToken,
    ) -> Result<GraphResult, FetchError> {
        let params = RequestParameters::graph(approach).with_threshold(threshold);
        self.client
            .request_data(&self.routes.heuristic_net, &params, cancel)
            .await
    }

    pub async fn method_type_counts(
        &self,
        cancel: &CancellationToken,
    ) -> Result<MethodCounts, FetchError> {
        self.client
            .request_data(&self.routes.method_count, &RequestParameters::new(), cancel)
            .await
    }

    /// Number of sessions per approach present in the mined data.
    pub async fn approach_counts(
        &self,
        cancel: &CancellationToken,
    ) -> Result<CategoryCounts, FetchError> {
        self.client
            .request_data(&self.routes.approach_count, &RequestParameters::new(), cancel)
            .await
    }

    /// Trigger log retrieval on the backend. The result carries no data.
    pub async fn refresh_logs(
        &self,
        force: bool,
        cancel: &CancellationToken,
    ) -> Result<(), FetchError> {
        let params = RequestParameters::new().with_force(force);
        let _: IgnoredAny = self
            .client
            .request_data(&self.routes.refresh_logs, &params, cancel)
            .await?;
        tracing::info!(force = force, "Log refresh completed");
        Ok(())
    }
}
