//! Attack surface discovered by crawling a target

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Pages and forms reachable from the target.
///
/// Built once by the crawler and then shared read-only between detectors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackSurface {
    /// Successfully fetched same-origin URLs
    pub urls: BTreeSet<String>,
    /// Forms in discovery order
    pub forms: Vec<Form>,
}

impl AttackSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_url(&mut self, url: impl Into<String>) -> bool {
        self.urls.insert(url.into())
    }

    pub fn add_form(&mut self, form: Form) {
        self.forms.push(form);
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty() && self.forms.is_empty()
    }

    /// Discovered URLs carrying a query string
    pub fn urls_with_query(&self) -> impl Iterator<Item = &str> {
        self.urls
            .iter()
            .map(String::as_str)
            .filter(|u| u.contains('?'))
    }
}

/// HTTP method declared on a form
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FormMethod {
    #[default]
    Get,
    Post,
}

impl FormMethod {
    /// Anything other than a case-insensitive `post` is treated as GET
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("post") {
            FormMethod::Post
        } else {
            FormMethod::Get
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FormMethod::Get => "GET",
            FormMethod::Post => "POST",
        }
    }
}

/// One input of a form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormInput {
    pub name: String,
    #[serde(rename = "type")]
    pub input_type: String,
}

impl FormInput {
    pub fn new(name: impl Into<String>, input_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input_type: input_type.into(),
        }
    }

    /// Inputs that do not carry free text (buttons, uploads, toggles)
    pub fn is_injectable(&self) -> bool {
        !matches!(
            self.input_type.to_ascii_lowercase().as_str(),
            "submit" | "button" | "image" | "file" | "reset" | "checkbox" | "radio"
        )
    }

    /// Harmless value to submit when this input is not under test
    pub fn benign_value(&self) -> &'static str {
        match self.input_type.to_ascii_lowercase().as_str() {
            "email" => "test@example.com",
            "number" | "range" => "1",
            "url" => "https://example.com",
            "password" => "password",
            _ => "test",
        }
    }
}

/// A form found on a crawled page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form {
    /// Absolute submission URL
    pub action: String,
    pub method: FormMethod,
    pub inputs: Vec<FormInput>,
    /// Page the form was found on
    #[serde(default)]
    pub found_on: String,
}

impl Form {
    pub fn new(action: impl Into<String>, method: FormMethod) -> Self {
        Self {
            action: action.into(),
            method,
            inputs: Vec::new(),
            found_on: String::new(),
        }
    }

    pub fn with_input(mut self, name: impl Into<String>, input_type: impl Into<String>) -> Self {
        self.inputs.push(FormInput::new(name, input_type));
        self
    }

    pub fn with_found_on(mut self, page: impl Into<String>) -> Self {
        self.found_on = page.into();
        self
    }

    pub fn injectable_inputs(&self) -> impl Iterator<Item = &FormInput> {
        self.inputs.iter().filter(|i| i.is_injectable())
    }
}
