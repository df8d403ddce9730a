use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use ureq::Agent;

use crate::error::ExecError;

pub const SERPER_ENDPOINT: &str = "https://google.serper.dev/search";

/// One organic search result.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub snippet: String,
}

#[derive(Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SearchHit>,
}

/// Web search through the Serper API.
#[derive(Debug, Clone)]
pub struct SearchClient {
    api_key: String,
    endpoint: String,
    timeout: Duration,
    max_hits: usize,
}

impl SearchClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: SERPER_ENDPOINT.to_string(),
            timeout: Duration::from_secs(10),
            max_hits: 5,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn search(&self, query: &str) -> Result<Vec<SearchHit>, ExecError> {
        let config = Agent::config_builder()
            .timeout_global(Some(self.timeout))
            .build();
        let agent: Agent = config.into();

        let response: SerperResponse = agent
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .send_json(json!({ "q": query, "num": self.max_hits }))?
            .body_mut()
            .read_json()?;

        Ok(response.organic.into_iter().take(self.max_hits).collect())
    }
}

/// Render hits as a numbered plain-text list.
pub fn format_hits(hits: &[SearchHit]) -> String {
    hits.iter()
        .enumerate()
        .map(|(i, h)| format!("{}. {} ({})\n   {}", i + 1, h.title, h.link, h.snippet))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Turn an experiment description into a short search query: its first
/// non-empty line, cut at 120 characters.
pub fn query_for(experiment: &str) -> Option<String> {
    let line = experiment.lines().map(str::trim).find(|l| !l.is_empty())?;
    let line = line.trim_end_matches(':');
    Some(line.chars().take(120).collect())
}
