//! User-facing notifications ("toasts").
//!
//! Notifications are fire-and-forget: the caller never learns whether or
//! how a message was shown. The HTTP layer collects them in [`Toasts`] and
//! renders them either straight into an HTMX fragment or, after a redirect,
//! from the session.

use serde::{Deserialize, Serialize};

/// Sink for success and failure messages shown to the visitor.
pub trait Notifier: Send {
    /// Show a success message.
    fn success(&mut self, message: &str);

    /// Show a failure message.
    fn error(&mut self, message: &str);
}

/// Severity of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastLevel {
    Success,
    Error,
}

impl ToastLevel {
    /// Bootstrap background class for the toast.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self {
            Self::Success => "text-bg-success",
            Self::Error => "text-bg-danger",
        }
    }
}

/// A single notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

/// Notifications collected during a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Toasts(Vec<Toast>);

impl Toasts {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Toast> {
        self.0.iter()
    }

    fn push(&mut self, level: ToastLevel, message: &str) {
        self.0.push(Toast {
            level,
            message: message.to_string(),
        });
    }
}

impl Notifier for Toasts {
    fn success(&mut self, message: &str) {
        self.push(ToastLevel::Success, message);
    }

    fn error(&mut self, message: &str) {
        self.push(ToastLevel::Error, message);
    }
}

impl<'a> IntoIterator for &'a Toasts {
    type Item = &'a Toast;
    type IntoIter = std::slice::Iter<'a, Toast>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
