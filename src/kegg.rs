use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::debug;

use crate::config::KeggSettings;
use crate::domain::{KoId, PathwayId};
use crate::error::Ko2PathwayError;

/// Remote KO -> pathway lookups against the KEGG REST API.
pub trait KeggClient {
    /// Reference pathway maps linked to `ko`. An unknown KO yields an empty list.
    fn link_pathways(&self, ko: &KoId) -> Result<Vec<PathwayId>, Ko2PathwayError>;
    /// Human-readable title of a pathway map.
    fn pathway_description(&self, pathway: &PathwayId) -> Result<String, Ko2PathwayError>;
}

impl<K: KeggClient + ?Sized> KeggClient for &K {
    fn link_pathways(&self, ko: &KoId) -> Result<Vec<PathwayId>, Ko2PathwayError> {
        (**self).link_pathways(ko)
    }

    fn pathway_description(&self, pathway: &PathwayId) -> Result<String, Ko2PathwayError> {
        (**self).pathway_description(pathway)
    }
}

pub struct KeggHttpClient {
    client: Client,
    base_url: String,
    request_delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl KeggHttpClient {
    pub fn new(settings: &KeggSettings) -> Result<Self, Ko2PathwayError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("ko2pathway/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| Ko2PathwayError::KeggHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(settings.timeout)
            .build()
            .map_err(|err| Ko2PathwayError::KeggHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: settings.base_url.clone(),
            request_delay: settings.request_delay,
            last_request: Mutex::new(None),
        })
    }

    fn throttle(&self) {
        let mut last = match self.last_request.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.request_delay {
                thread::sleep(self.request_delay - elapsed);
            }
        }
        *last = Some(Instant::now());
    }

    /// `Ok(None)` on 404, which KEGG uses for "no such entry".
    fn get_text(&self, path: &str) -> Result<Option<String>, Ko2PathwayError> {
        self.throttle();
        let url = format!("{}/{}", self.base_url, path);
        debug!(%url, "kegg.request");
        let start = Instant::now();
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|err| Ko2PathwayError::KeggHttp(err.to_string()))?;
        let status = response.status();
        debug!(%url, status = status.as_u16(), latency_ms = start.elapsed().as_millis() as u64, "kegg.response");
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let message = response
                .text()
                .unwrap_or_else(|_| "KEGG request failed".to_string());
            return Err(Ko2PathwayError::KeggStatus {
                status: status.as_u16(),
                message,
            });
        }
        let body = response
            .text()
            .map_err(|err| Ko2PathwayError::KeggHttp(err.to_string()))?;
        Ok(Some(body))
    }
}

impl KeggClient for KeggHttpClient {
    fn link_pathways(&self, ko: &KoId) -> Result<Vec<PathwayId>, Ko2PathwayError> {
        let body = self.get_text(&format!("link/pathway/{}", ko.as_str()))?;
        Ok(body.map(|text| parse_link_pathways(&text)).unwrap_or_default())
    }

    fn pathway_description(&self, pathway: &PathwayId) -> Result<String, Ko2PathwayError> {
        let body = self
            .get_text(&format!("list/{}", pathway.as_str()))?
            .ok_or_else(|| Ko2PathwayError::KeggResponse(format!("no entry for {pathway}")))?;
        parse_pathway_description(&body)
    }
}

/// Parses `link/pathway` output, keeping reference `map` pathways in first-seen order.
pub fn parse_link_pathways(text: &str) -> Vec<PathwayId> {
    let mut pathways: Vec<PathwayId> = Vec::new();
    for line in text.lines() {
        let Some((_, target)) = line.split_once('\t') else {
            continue;
        };
        if let Ok(id) = target.parse::<PathwayId>() {
            if !pathways.contains(&id) {
                pathways.push(id);
            }
        }
    }
    pathways
}

/// Parses `list/<pathway>` output: the title is the second field of the first line.
pub fn parse_pathway_description(text: &str) -> Result<String, Ko2PathwayError> {
    let line = text
        .lines()
        .find(|line| !line.trim().is_empty())
        .ok_or_else(|| Ko2PathwayError::KeggResponse("empty pathway listing".to_string()))?;
    let description = line
        .split('\t')
        .nth(1)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| Ko2PathwayError::KeggResponse(format!("malformed listing: {line}")))?;
    Ok(description.to_string())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn link_keeps_map_pathways_only() {
        let text = "ko:K00001\tpath:map00010\nko:K00001\tpath:ko00010\nko:K00001\tpath:map00071\nko:K00001\tpath:map00010\n";
        let ids: Vec<String> = parse_link_pathways(text)
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(ids, vec!["map00010", "map00071"]);
    }

    #[test]
    fn link_tolerates_garbage() {
        assert!(parse_link_pathways("").is_empty());
        assert!(parse_link_pathways("<html>oops</html>").is_empty());
    }

    #[test]
    fn description_from_first_line() {
        let text = "path:map00010\tGlycolysis / Gluconeogenesis\n";
        assert_eq!(
            parse_pathway_description(text).unwrap(),
            "Glycolysis / Gluconeogenesis"
        );
    }

    #[test]
    fn description_missing_field() {
        assert_matches!(
            parse_pathway_description("map00010\n"),
            Err(Ko2PathwayError::KeggResponse(_))
        );
        assert_matches!(
            parse_pathway_description("\n"),
            Err(Ko2PathwayError::KeggResponse(_))
        );
    }
}
