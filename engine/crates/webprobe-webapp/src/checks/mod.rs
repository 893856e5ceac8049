//! Rule-based vulnerability detectors
//!
//! Every detector owns its static rule tables and a [`ClientConfig`]; a
//! fresh [`HttpClient`] is built per run. Injection-style detectors share
//! the [`InjectionPoint`] plumbing below.

pub mod cookies;
pub mod cors;
pub mod directory;
pub mod disclosure;
pub mod sqli;
pub mod xss;

pub use cookies::CookieSecurityDetector;
pub use cors::CorsMisconfigurationDetector;
pub use directory::DirectoryExposureDetector;
pub use disclosure::InformationDisclosureDetector;
pub use sqli::SqlInjectionDetector;
pub use xss::XssReflectionDetector;

use crate::client::{ClientError, HttpClient, HttpResponse};
use crate::headers::SecurityHeadersDetector;
use crate::ScanConfig;
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;
use webprobe_core::{AttackSurface, Detector, Form, FormMethod, Target};

/// Maximum distinct URLs whose query parameters are tested
pub const MAX_QUERY_URLS: usize = 10;

/// Only the first forms of a crawl are tested
pub const MAX_FORMS: usize = 5;

/// The built-in detectors in their fixed execution order
pub fn default_detectors(config: &ScanConfig) -> Vec<Arc<dyn Detector>> {
    vec![
        Arc::new(SecurityHeadersDetector::new(config)),
        Arc::new(CookieSecurityDetector::new(config)),
        Arc::new(CorsMisconfigurationDetector::new(config)),
        Arc::new(DirectoryExposureDetector::new(config)),
        Arc::new(InformationDisclosureDetector::new(config)),
        Arc::new(SqlInjectionDetector::new(config)),
        Arc::new(XssReflectionDetector::new(config)),
    ]
}

/// A single input that user-controlled data can reach
#[derive(Debug, Clone, PartialEq)]
pub enum InjectionPoint {
    /// A query-string parameter of a GET URL
    Query { url: Url, param: String },
    /// A named field of a discovered form
    FormField { form: Form, field: String },
}

impl InjectionPoint {
    /// Parameter or field name under test
    pub fn name(&self) -> &str {
        match self {
            InjectionPoint::Query { param, .. } => param,
            InjectionPoint::FormField { field, .. } => field,
        }
    }

    /// URL the probe is sent to (without the injected value)
    pub fn endpoint(&self) -> String {
        match self {
            InjectionPoint::Query { url, .. } => {
                let mut base = url.clone();
                base.set_query(None);
                base.to_string()
            }
            InjectionPoint::FormField { form, .. } => form.action.clone(),
        }
    }

    pub fn method(&self) -> FormMethod {
        match self {
            InjectionPoint::Query { .. } => FormMethod::Get,
            InjectionPoint::FormField { form, .. } => form.method,
        }
    }

    /// `"query parameter"` or `"form field"`
    pub fn kind(&self) -> &'static str {
        match self {
            InjectionPoint::Query { .. } => "query parameter",
            InjectionPoint::FormField { .. } => "form field",
        }
    }

    /// Value the input carries when it is not being attacked
    pub fn original_value(&self) -> String {
        match self {
            InjectionPoint::Query { url, param } => url
                .query_pairs()
                .find(|(k, _)| k == param.as_str())
                .map(|(_, v)| v.into_owned())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "1".to_string()),
            InjectionPoint::FormField { form, field } => form
                .inputs
                .iter()
                .find(|i| &i.name == field)
                .map(|i| i.benign_value().to_string())
                .unwrap_or_else(|| "test".to_string()),
        }
    }

    /// Submit `value` through this input. Every other parameter keeps its
    /// original or benign value.
    pub async fn send(
        &self,
        client: &HttpClient,
        value: &str,
    ) -> Result<HttpResponse, ClientError> {
        match self {
            InjectionPoint::Query { url, param } => {
                client.get(self.with_query_value(url, param, value).as_str()).await
            }
            InjectionPoint::FormField { form, field } => {
                let body: Vec<(String, String)> = form
                    .inputs
                    .iter()
                    .map(|input| {
                        let v = if &input.name == field {
                            value.to_string()
                        } else {
                            input.benign_value().to_string()
                        };
                        (input.name.clone(), v)
                    })
                    .collect();

                match form.method {
                    FormMethod::Post => client.post_form(&form.action, &body).await,
                    FormMethod::Get => match Url::parse(&form.action) {
                        Ok(mut action) => {
                            action.query_pairs_mut().clear().extend_pairs(&body);
                            client.get(action.as_str()).await
                        }
                        Err(_) => client.get(&form.action).await,
                    },
                }
            }
        }
    }

    fn with_query_value(&self, url: &Url, param: &str, value: &str) -> Url {
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| {
                if k == param {
                    (k.into_owned(), value.to_string())
                } else {
                    (k.into_owned(), v.into_owned())
                }
            })
            .collect();
        let mut rebuilt = url.clone();
        rebuilt.query_pairs_mut().clear().extend_pairs(&pairs);
        rebuilt
    }
}

/// Gather injection points from the target URL, discovered URLs with a
/// query string, and the first [`MAX_FORMS`] forms.
///
/// Only URLs and form actions on the target's origin are used.
///
/// URLs are deduplicated by path plus parameter names and capped at
/// [`MAX_QUERY_URLS`]. At most `fields_per_form` fields of each form are
/// used.
pub fn collect_injection_points(
    target: &Target,
    surface: &AttackSurface,
    fields_per_form: usize,
) -> Vec<InjectionPoint> {
    let mut points = Vec::new();
    let mut signatures: HashSet<String> = HashSet::new();

    let candidates = std::iter::once(target.as_str()).chain(surface.urls_with_query());
    for raw in candidates {
        if signatures.len() >= MAX_QUERY_URLS {
            break;
        }
        let Ok(url) = Url::parse(raw) else {
            continue;
        };
        if !target.is_same_origin(&url) {
            continue;
        }
        let mut names: Vec<String> = url.query_pairs().map(|(k, _)| k.into_owned()).collect();
        if names.is_empty() {
            continue;
        }
        names.sort();
        names.dedup();
        let signature = format!(
            "{}{}?{}",
            url.origin().ascii_serialization(),
            url.path(),
            names.join("&")
        );
        if !signatures.insert(signature) {
            continue;
        }
        for param in names {
            points.push(InjectionPoint::Query {
                url: url.clone(),
                param,
            });
        }
    }

    let in_scope = surface.forms.iter().filter(|form| {
        Url::parse(&form.action)
            .map(|action| target.is_same_origin(&action))
            .unwrap_or(false)
    });
    for form in in_scope.take(MAX_FORMS) {
        for input in form.injectable_inputs().take(fields_per_form) {
            points.push(InjectionPoint::FormField {
                form: form.clone(),
                field: input.name.clone(),
            });
        }
    }

    points
}

/// Case-insensitive substring test
pub(crate) fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// First `max` characters of `s`, on a char boundary
pub(crate) fn snippet(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn target(s: &str) -> Target {
        Target::unchecked(Url::parse(s).unwrap())
    }

    #[test]
    fn test_query_points_deduplicated() {
        let mut surface = AttackSurface::new();
        surface.add_url("https://example.com/item?id=1");
        surface.add_url("https://example.com/item?id=2");
        surface.add_url("https://example.com/search?q=a&page=2");
        surface.add_url("https://example.com/about");

        let points = collect_injection_points(&target("https://example.com/"), &surface, 3);
        let names: Vec<_> = points.iter().map(|p| (p.endpoint(), p.name().to_string())).collect();
        assert_eq!(
            names,
            vec![
                ("https://example.com/item".to_string(), "id".to_string()),
                ("https://example.com/search".to_string(), "page".to_string()),
                ("https://example.com/search".to_string(), "q".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_url_cap() {
        let mut surface = AttackSurface::new();
        for i in 0..20 {
            surface.add_url(format!("https://example.com/p{}?x=1", i));
        }
        let points = collect_injection_points(&target("https://example.com/"), &surface, 3);
        assert_eq!(points.len(), MAX_QUERY_URLS);
    }

    #[test]
    fn test_form_points_limited() {
        let mut surface = AttackSurface::new();
        for i in 0..7 {
            surface.add_form(
                Form::new(format!("https://example.com/f{}", i), FormMethod::Post)
                    .with_input("a", "text")
                    .with_input("go", "submit")
                    .with_input("b", "email")
                    .with_input("c", "text")
                    .with_input("d", "search"),
            );
        }
        let points = collect_injection_points(&target("https://example.com/"), &surface, 3);
        assert_eq!(points.len(), MAX_FORMS * 3);
        assert!(points.iter().all(|p| p.name() != "go" && p.name() != "d"));
    }

    #[test]
    fn test_off_origin_inputs_skipped() {
        let mut surface = AttackSurface::new();
        surface.add_url("https://other.example/item?id=1");
        surface.add_url("https://example.com/item?id=1");
        surface.add_form(
            Form::new("http://10.0.0.5/collect", FormMethod::Post).with_input("q", "text"),
        );
        surface.add_form(
            Form::new("https://example.com/comment", FormMethod::Post).with_input("body", "text"),
        );

        let points = collect_injection_points(&target("https://example.com/"), &surface, 3);
        let endpoints: Vec<String> = points.iter().map(|p| p.endpoint()).collect();
        assert_eq!(
            endpoints,
            vec![
                "https://example.com/item".to_string(),
                "https://example.com/comment".to_string(),
            ]
        );
    }

    #[test]
    fn test_original_values() {
        let url = Url::parse("https://example.com/item?id=42&empty=").unwrap();
        let id = InjectionPoint::Query {
            url: url.clone(),
            param: "id".into(),
        };
        assert_eq!(id.original_value(), "42");
        let empty = InjectionPoint::Query {
            url,
            param: "empty".into(),
        };
        assert_eq!(empty.original_value(), "1");

        let form = Form::new("https://example.com/s", FormMethod::Get).with_input("mail", "email");
        let field = InjectionPoint::FormField {
            form,
            field: "mail".into(),
        };
        assert_eq!(field.original_value(), "test@example.com");
        assert_eq!(field.kind(), "form field");
    }

    #[test]
    fn test_with_query_value_keeps_others() {
        let url = Url::parse("https://example.com/s?q=a&page=2").unwrap();
        let point = InjectionPoint::Query {
            url: url.clone(),
            param: "q".into(),
        };
        let rebuilt = point.with_query_value(&url, "q", "<x>");
        assert_eq!(rebuilt.as_str(), "https://example.com/s?q=%3Cx%3E&page=2");
    }

    #[test]
    fn test_default_detector_order() {
        let ids: Vec<String> = default_detectors(&ScanConfig::default())
            .iter()
            .map(|d| d.id().to_string())
            .collect();
        assert_eq!(
            ids,
            vec![
                "security-headers",
                "cookie-security",
                "cors-misconfiguration",
                "directory-exposure",
                "information-disclosure",
                "sql-injection",
                "xss-reflection",
            ]
        );
    }
}
