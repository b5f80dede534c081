//! # User Feedback
//!
//! The UI seam used by the auth flow: loading overlay, snackbars, a
//! confirm dialog and navigation. A desktop or web shell implements
//! [`Feedback`]; headless use falls back to [`TracingFeedback`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Snackbar colour/intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnackbarKind {
    Success,
    Info,
    Warning,
    Error,
}

/// Transient notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snackbar {
    pub kind: SnackbarKind,
    pub title: String,
    pub message: String,
    pub button_text: Option<String>,
}

/// Two-button modal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialog {
    pub title: String,
    pub content: String,
    pub confirm_text: String,
    pub back_text: String,
}

/// Which dialog button the user pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogChoice {
    Confirm,
    Back,
}

/// Route change request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Navigation {
    pub path: String,
    /// Full page load instead of an in-app route change.
    pub external: bool,
}

impl Navigation {
    pub fn to(path: impl Into<String>) -> Self {
        Navigation {
            path: path.into(),
            external: false,
        }
    }

    pub fn external(path: impl Into<String>) -> Self {
        Navigation {
            path: path.into(),
            external: true,
        }
    }
}

/// Presentation callbacks.
#[async_trait]
pub trait Feedback: Send + Sync {
    fn show_loading(&self);

    fn hide_loading(&self);

    fn snackbar(&self, snackbar: Snackbar);

    /// Shows the dialog and resolves once a button is pressed.
    async fn dialog(&self, dialog: Dialog) -> DialogChoice;

    fn navigate(&self, navigation: Navigation);
}

/// Headless feedback that only logs. Dialogs resolve to
/// [`DialogChoice::Back`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingFeedback;

#[async_trait]
impl Feedback for TracingFeedback {
    fn show_loading(&self) {}

    fn hide_loading(&self) {}

    fn snackbar(&self, snackbar: Snackbar) {
        info!(kind = ?snackbar.kind, title = %snackbar.title, "{}", snackbar.message);
    }

    async fn dialog(&self, dialog: Dialog) -> DialogChoice {
        info!(title = %dialog.title, "{}", dialog.content);
        DialogChoice::Back
    }

    fn navigate(&self, navigation: Navigation) {
        info!(path = %navigation.path, external = navigation.external, "Navigate");
    }
}
