//! Tools the recommendation agent can call
//!
//! Every tool answers with a JSON string that is handed back to the model
//! verbatim. Failures a model can recover from (no results, a search
//! backend being down) are reported inside that JSON rather than as errors.

use async_trait::async_trait;
use domain_events::{EventRepository, EventService, EventType, ScoredEvent};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

use crate::error::{AssistantError, AssistantResult};
use crate::model::ToolDefinition;

pub const EVENT_LOOKUP: &str = "event_lookup";
pub const INTERNET_SEARCH: &str = "internet_search";

const DEFAULT_LOOKUP_LIMIT: usize = 10;
const DUCKDUCKGO_URL: &str = "https://api.duckduckgo.com";
const MAX_WEB_RESULTS: usize = 8;

/// A capability the agent can invoke by name
#[async_trait]
pub trait AssistantTool: Send + Sync {
    fn name(&self) -> &str;

    /// Tells the model when to reach for this tool
    fn description(&self) -> &str;

    /// JSON schema of the arguments object
    fn parameters_schema(&self) -> Value;

    async fn execute(&self, arguments: Value) -> AssistantResult<String>;
}

pub struct ToolRegistry {
    tools: Vec<Box<dyn AssistantTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    pub fn register<T: AssistantTool + 'static>(&mut self, tool: T) {
        self.tools.push(Box::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<&dyn AssistantTool> {
        self.tools.iter().find(|t| t.name() == name).map(|t| t.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters_schema(),
            })
            .collect()
    }

    pub async fn execute(&self, name: &str, arguments: Value) -> AssistantResult<String> {
        let tool = self
            .get(name)
            .ok_or_else(|| AssistantError::Tool(format!("Tool not found: {name}")))?;

        tool.execute(arguments).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Event lookup
// =============================================================================

/// Semantic search over stored events
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventSearch: Send + Sync {
    async fn search_events(&self, query: &str, limit: usize) -> AssistantResult<Vec<ScoredEvent>>;
}

#[async_trait]
impl<R: EventRepository + 'static> EventSearch for EventService<R> {
    async fn search_events(&self, query: &str, limit: usize) -> AssistantResult<Vec<ScoredEvent>> {
        self.search(query, limit)
            .await
            .map_err(|e| AssistantError::Tool(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
pub struct EventLookupInput {
    pub query: String,
    #[serde(default)]
    pub n: Option<usize>,
}

/// One database hit as the model sees it
#[derive(Debug, Serialize)]
struct EventHit {
    name: String,
    description: String,
    summary: String,
    date: String,
    price: f64,
    event_type: EventType,
    event_link: Option<String>,
    similarity_score: f64,
    source: &'static str,
}

impl From<ScoredEvent> for EventHit {
    fn from(hit: ScoredEvent) -> Self {
        let event = hit.event;
        Self {
            name: event.name,
            description: event.description,
            summary: event.summary,
            date: event.date.to_rfc3339(),
            price: event.price,
            event_type: event.event_type,
            event_link: event.event_link,
            similarity_score: hit.score,
            source: "database",
        }
    }
}

pub struct EventLookupTool {
    events: Arc<dyn EventSearch>,
}

impl EventLookupTool {
    pub fn new(events: Arc<dyn EventSearch>) -> Self {
        Self { events }
    }
}

#[async_trait]
impl AssistantTool for EventLookupTool {
    fn name(&self) -> &str {
        EVENT_LOOKUP
    }

    fn description(&self) -> &str {
        "Searches for events in the database matching user criteria. If no results found, suggests using internet search."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query for finding events"
                },
                "n": {
                    "type": "integer",
                    "description": "The number of results to return",
                    "default": DEFAULT_LOOKUP_LIMIT
                }
            },
            "required": ["query"]
        })
    }

    #[instrument(skip_all)]
    async fn execute(&self, arguments: Value) -> AssistantResult<String> {
        let input: EventLookupInput = serde_json::from_value(arguments)
            .map_err(|e| AssistantError::Tool(format!("invalid arguments: {e}")))?;
        let limit = input.n.filter(|n| *n > 0).unwrap_or(DEFAULT_LOOKUP_LIMIT);

        let output = match self.events.search_events(&input.query, limit).await {
            Ok(hits) if hits.is_empty() => {
                tracing::info!(query = %input.query, "No database matches");
                json!({
                    "status": "no_results",
                    "message": "No matching events found in database. Switching to internet search.",
                    "shouldUseInternetSearch": true,
                })
            }
            Ok(hits) => {
                tracing::info!(query = %input.query, count = hits.len(), "Database matches");
                let results: Vec<EventHit> = hits.into_iter().map(EventHit::from).collect();
                json!({
                    "status": "success",
                    "count": results.len(),
                    "results": results,
                    "shouldUseInternetSearch": false,
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, "Event lookup failed");
                json!({
                    "status": "error",
                    "message": "An error occurred while searching for events.",
                    "error": e.to_string(),
                    "shouldUseInternetSearch": true,
                })
            }
        };
        Ok(output.to_string())
    }
}

// =============================================================================
// Internet search
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct InternetSearchInput {
    pub query: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct WebResult {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstantAnswer {
    #[serde(default)]
    heading: String,
    #[serde(default)]
    abstract_text: String,
    #[serde(default, rename = "AbstractURL")]
    abstract_url: String,
    #[serde(default)]
    related_topics: Vec<RelatedTopic>,
}

/// Either a plain topic or a named group of topics
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RelatedTopic {
    Topic {
        #[serde(rename = "Text")]
        text: String,
        #[serde(rename = "FirstURL")]
        first_url: String,
    },
    Group {
        #[serde(rename = "Topics")]
        topics: Vec<RelatedTopic>,
    },
}

impl InstantAnswer {
    fn into_results(self, limit: usize) -> Vec<WebResult> {
        let mut results = Vec::new();
        if !self.abstract_text.is_empty() {
            results.push(WebResult {
                title: self.heading,
                link: self.abstract_url,
                snippet: self.abstract_text,
            });
        }
        flatten_topics(self.related_topics, &mut results);
        results.truncate(limit);
        results
    }
}

fn flatten_topics(topics: Vec<RelatedTopic>, out: &mut Vec<WebResult>) {
    for topic in topics {
        match topic {
            RelatedTopic::Topic { text, first_url } => {
                // DuckDuckGo prefixes the snippet with the page title
                let title = text.split(" - ").next().unwrap_or(&text).to_string();
                out.push(WebResult {
                    title,
                    link: first_url,
                    snippet: text,
                });
            }
            RelatedTopic::Group { topics } => flatten_topics(topics, out),
        }
    }
}

/// Web search through the DuckDuckGo instant answer API
pub struct InternetSearchTool {
    client: Client,
    base_url: String,
}

impl InternetSearchTool {
    pub fn new() -> AssistantResult<Self> {
        Self::with_base_url(DUCKDUCKGO_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> AssistantResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| AssistantError::Internal(format!("http client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn search(&self, query: &str) -> AssistantResult<Vec<WebResult>> {
        let response = self
            .client
            .get(format!("{}/", self.base_url))
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await
            .map_err(|e| AssistantError::Tool(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssistantError::Tool(format!("search returned {status}")));
        }

        let answer: InstantAnswer = response
            .json()
            .await
            .map_err(|e| AssistantError::Tool(format!("unexpected search response: {e}")))?;
        Ok(answer.into_results(MAX_WEB_RESULTS))
    }
}

#[async_trait]
impl AssistantTool for InternetSearchTool {
    fn name(&self) -> &str {
        INTERNET_SEARCH
    }

    fn description(&self) -> &str {
        "Performs a web search using DuckDuckGo to retrieve relevant event's information from the internet."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query for the internet search."
                }
            },
            "required": ["query"]
        })
    }

    #[instrument(skip_all)]
    async fn execute(&self, arguments: Value) -> AssistantResult<String> {
        let input: InternetSearchInput = serde_json::from_value(arguments)
            .map_err(|e| AssistantError::Tool(format!("invalid arguments: {e}")))?;

        let output = match self.search(&input.query).await {
            Ok(results) => json!({
                "status": if results.is_empty() { "no_results" } else { "success" },
                "count": results.len(),
                "results": results,
            }),
            Err(e) => {
                tracing::warn!(error = %e, "Internet search failed");
                json!({
                    "status": "error",
                    "message": "An error occurred while searching the internet.",
                    "error": e.to_string(),
                })
            }
        };
        Ok(output.to_string())
    }
}
