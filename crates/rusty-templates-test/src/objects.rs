//! A sample host object.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rusty_templates_core::error::HostError;
use rusty_templates_core::value::{Attribute, HostObject, Value};

/// A blog article exposed to templates.
///
/// | attribute   | kind                                       |
/// |-------------|--------------------------------------------|
/// | `title`     | value                                      |
/// | `tags`      | value (list)                               |
/// | `summary`   | method, counts its calls                   |
/// | `author`    | method that always fails                   |
#[derive(Debug, Clone)]
pub struct Article {
    title: String,
    tags: Vec<String>,
    summary_calls: Arc<AtomicUsize>,
}

impl Article {
    /// Creates an article.
    pub fn new(title: impl Into<String>, tags: &[&str]) -> Self {
        Self {
            title: title.into(),
            tags: tags.iter().map(ToString::to_string).collect(),
            summary_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// How many times `summary` has been resolved.
    pub fn summary_calls(&self) -> usize {
        self.summary_calls.load(Ordering::SeqCst)
    }

    /// Wraps the article in a [`Value`].
    pub fn into_value(self) -> Value {
        Value::object(self)
    }
}

impl HostObject for Article {
    fn type_name(&self) -> &str {
        "Article"
    }

    fn get_attribute(&self, name: &str) -> Option<Attribute> {
        match name {
            "title" => Some(Attribute::Value(Value::from(self.title.as_str()))),
            "tags" => Some(Attribute::Value(Value::List(
                self.tags.iter().map(|tag| Value::from(tag.as_str())).collect(),
            ))),
            "summary" => {
                let calls = Arc::clone(&self.summary_calls);
                let title = self.title.clone();
                Some(Attribute::method(move || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Value::from(format!("About {title}")))
                }))
            }
            "author" => Some(Attribute::method(|| {
                Err(HostError::msg("author is not loaded"))
            })),
            _ => None,
        }
    }

    fn repr(&self) -> String {
        format!("<Article: {}>", self.title)
    }

    fn to_display_string(&self) -> String {
        self.title.clone()
    }
}
