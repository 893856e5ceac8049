//! Web crawler for attack surface discovery
//!
//! Depth-first, same-origin, bounded by depth and by the scan deadline.
//! Redirects are not followed by the HTTP client: a same-origin `Location`
//! is queued at the current depth, anything else is dropped. Forms whose
//! action leaves the target origin are not recorded. Pages are parsed with
//! `scraper`; the parsed document never lives across an await point.

use crate::client::{ClientConfig, ClientError, HttpClient};
use crate::ScanConfig;
use scraper::{Html, Selector};
use std::collections::HashSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;
use webprobe_core::{AttackSurface, Form, FormInput, FormMethod, Target};

/// Links and forms extracted from one page
#[derive(Debug, Default)]
struct PageContent {
    links: Vec<String>,
    forms: Vec<Form>,
}

/// Web crawler
pub struct Crawler<'a> {
    client: &'a HttpClient,
}

impl<'a> Crawler<'a> {
    /// Create a new crawler. `client` should not follow redirects, or a
    /// same-origin link could land the crawl on another host.
    pub fn new(client: &'a HttpClient) -> Self {
        Self { client }
    }

    /// Crawl from the target down to `max_depth` link hops.
    ///
    /// Fetch failures are skipped. The deadline is checked before every
    /// fetch; once it has passed the surface gathered so far is returned.
    pub async fn crawl(&self, target: &Target, max_depth: u32, deadline: Instant) -> AttackSurface {
        let mut surface = AttackSurface::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut stack: Vec<(String, u32)> = vec![(normalize_url(target.as_str()), 0)];

        while let Some((url, depth)) = stack.pop() {
            if Instant::now() >= deadline {
                info!("Crawl deadline reached after {} pages", surface.urls.len());
                break;
            }

            if depth > max_depth || !visited.insert(url.clone()) {
                continue;
            }

            debug!("Crawling: {} (depth {})", url, depth);
            let response = match self.client.get(&url).await {
                Ok(r) => r,
                Err(ClientError::Timeout(s)) => {
                    warn!("Timed out fetching {} after {}s", url, s);
                    continue;
                }
                Err(e) => {
                    debug!("Failed to fetch {}: {}", url, e);
                    continue;
                }
            };
            surface.add_url(url.clone());

            let Ok(page_url) = Url::parse(&url) else {
                continue;
            };

            if response.is_redirect() {
                if let Some(next) = response
                    .header("location")
                    .and_then(|location| resolve_url(location, &page_url))
                {
                    let next = normalize_url(&next);
                    match Url::parse(&next) {
                        Ok(parsed) if target.is_same_origin(&parsed) => {
                            if !visited.contains(&next) {
                                stack.push((next, depth));
                            }
                        }
                        _ => debug!("Not following off-origin redirect {} -> {}", url, next),
                    }
                }
                continue;
            }

            let content = parse_page(&response.body, &page_url);
            for form in content.forms {
                match Url::parse(&form.action) {
                    Ok(action) if target.is_same_origin(&action) => surface.add_form(form),
                    _ => debug!("Skipping off-origin form action {}", form.action),
                }
            }

            if depth + 1 > max_depth {
                continue;
            }
            // Reverse so the first link in the document is crawled first
            for link in content.links.into_iter().rev() {
                let Ok(parsed) = Url::parse(&link) else {
                    continue;
                };
                if target.is_same_origin(&parsed) && !visited.contains(&link) {
                    stack.push((link, depth + 1));
                }
            }
        }

        debug!(
            "Crawl finished: {} urls, {} forms",
            surface.urls.len(),
            surface.forms.len()
        );
        surface
    }
}

/// Build a non-redirecting client from `config` and crawl the target.
///
/// The only error is failing to construct the HTTP client.
pub async fn discover(
    target: &Target,
    max_depth: u32,
    deadline: Instant,
    config: &ScanConfig,
) -> Result<AttackSurface, ClientError> {
    let client = HttpClient::new(&ClientConfig::from(config).no_redirects())?;
    Ok(Crawler::new(&client).crawl(target, max_depth, deadline).await)
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn parse_page(html: &str, page_url: &Url) -> PageContent {
    let document = Html::parse_document(html);
    PageContent {
        links: extract_links(&document, page_url),
        forms: extract_forms(&document, page_url),
    }
}

/// Extract `<a href>` targets in document order
fn extract_links(document: &Html, page_url: &Url) -> Vec<String> {
    let Some(anchor) = selector("a[href]") else {
        return Vec::new();
    };
    document
        .select(&anchor)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| resolve_url(href, page_url))
        .map(|u| normalize_url(&u))
        .collect()
}

/// Extract forms with their `input` and `textarea` fields
fn extract_forms(document: &Html, page_url: &Url) -> Vec<Form> {
    let (Some(form_sel), Some(input_sel)) = (selector("form"), selector("input, textarea"))
    else {
        return Vec::new();
    };

    document
        .select(&form_sel)
        .map(|form| {
            let action = form
                .value()
                .attr("action")
                .filter(|a| !a.trim().is_empty())
                .and_then(|a| page_url.join(a.trim()).ok())
                .map(|u| u.to_string())
                .unwrap_or_else(|| page_url.to_string());
            let method = FormMethod::parse(form.value().attr("method").unwrap_or("get"));

            let inputs = form
                .select(&input_sel)
                .filter_map(|input| {
                    let name = input.value().attr("name")?.trim();
                    if name.is_empty() {
                        return None;
                    }
                    let input_type = input
                        .value()
                        .attr("type")
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .unwrap_or("text");
                    Some(FormInput::new(name, input_type.to_ascii_lowercase()))
                })
                .collect();

            Form {
                action,
                method,
                inputs,
                found_on: page_url.to_string(),
            }
        })
        .collect()
}

/// Normalize URL for comparison
pub(crate) fn normalize_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => url.to_string(),
    }
}

/// Resolve relative URL to absolute
fn resolve_url(href: &str, base: &Url) -> Option<String> {
    let href = href.trim();
    let lower = href.to_ascii_lowercase();

    if lower.starts_with("javascript:")
        || lower.starts_with("data:")
        || lower.starts_with("mailto:")
        || href.starts_with('#')
        || href.is_empty()
    {
        return None;
    }

    base.join(href).ok().map(|u| u.to_string())
}
