use std::time::Duration;

use color_eyre::eyre::{Result, WrapErr};
use reqwest::Client;
use serde_json::{Value, json};

use super::types::Candidate;
use crate::ports::youtube::SearchProvider;

const SEARCH_ENDPOINT: &str = "https://www.youtube.com/youtubei/v1/search?prettyPrint=false";
const CLIENT_NAME: &str = "WEB";
const CLIENT_VERSION: &str = "2.20250101.00.00";
/// Search filter restricting results to videos.
const VIDEOS_ONLY_PARAMS: &str = "EgIQAQ==";

/// Searches YouTube through the same JSON endpoint the web client uses.
pub struct YoutubeSearchAdapter {
    client: Client,
    timeout: Duration,
}

impl Default for YoutubeSearchAdapter {
    fn default() -> Self {
        Self {
            client: Client::new(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl YoutubeSearchAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SearchProvider for YoutubeSearchAdapter {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Candidate>> {
        tracing::debug!("Searching YouTube for '{}' (limit {})", query, limit);

        let body = json!({
            "context": {
                "client": {
                    "clientName": CLIENT_NAME,
                    "clientVersion": CLIENT_VERSION,
                    "hl": "en",
                    "gl": "US",
                }
            },
            "query": query,
            "params": VIDEOS_ONLY_PARAMS,
        });

        let response: Value = self
            .client
            .post(SEARCH_ENDPOINT)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .wrap_err_with(|| format!("Failed to send YouTube search request for '{}'", query))?
            .error_for_status()
            .wrap_err("YouTube search request was rejected")?
            .json()
            .await
            .wrap_err("Failed to parse YouTube search response")?;

        let candidates = parse_search_response(&response, limit);
        tracing::debug!(
            "YouTube search for '{}' returned {} results",
            query,
            candidates.len()
        );
        Ok(candidates)
    }
}

/// Pull video results out of a search response, in document order.
///
/// The response nests `videoRenderer` objects several levels deep inside
/// section and shelf renderers whose layout changes over time, so the whole
/// document is walked rather than following a fixed path.
pub fn parse_search_response(response: &Value, limit: usize) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    let mut stack = vec![response];

    while let Some(node) = stack.pop() {
        if candidates.len() >= limit {
            break;
        }
        match node {
            Value::Object(map) => {
                if let Some(renderer) = map.get("videoRenderer") {
                    if let Some(candidate) = parse_video_renderer(renderer) {
                        candidates.push(candidate);
                    }
                    continue;
                }
                // Reverse so that the first child is popped first.
                stack.extend(map.values().rev());
            }
            Value::Array(items) => stack.extend(items.iter().rev()),
            _ => {}
        }
    }

    candidates
}

fn parse_video_renderer(renderer: &Value) -> Option<Candidate> {
    let id = renderer.get("videoId")?.as_str()?.to_string();
    let title = text_of(renderer.get("title")?)?;

    let channel_name = ["ownerText", "longBylineText", "shortBylineText"]
        .iter()
        .find_map(|key| renderer.get(*key).and_then(text_of));

    let duration_text = renderer.get("lengthText").and_then(text_of);

    let description_snippet = renderer
        .pointer("/detailedMetadataSnippets/0/snippetText")
        .or_else(|| renderer.get("descriptionSnippet"))
        .and_then(text_of);

    let thumbnail_url = renderer
        .pointer("/thumbnail/thumbnails/0/url")
        .and_then(Value::as_str)
        .map(str::to_string);

    Some(Candidate {
        id,
        title,
        channel_name,
        duration_text,
        description_snippet,
        thumbnail_url,
    })
}

/// Text fields come either as `{"simpleText": ".."}` or as `{"runs": [{"text": ".."}, ..]}`.
fn text_of(value: &Value) -> Option<String> {
    if let Some(text) = value.get("simpleText").and_then(Value::as_str) {
        return Some(text.to_string());
    }
    let runs = value.get("runs")?.as_array()?;
    let text: String = runs
        .iter()
        .filter_map(|run| run.get("text").and_then(Value::as_str))
        .collect();
    (!text.is_empty()).then_some(text)
}
