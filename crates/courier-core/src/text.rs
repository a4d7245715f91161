//! User-facing message resolution
//!
//! The engine never builds message text itself: it hands a message key and a
//! small variable set to a [`TextResolver`] and stores whatever comes back in
//! `body.message`.

use crate::catalog::ErrorCode;
use std::collections::HashMap;

/// Variable holding the catalog name of the error
pub const VAR_ERROR: &str = "error";

/// Variable holding the application title
pub const VAR_APP_TITLE: &str = "application-title";

/// Resolves a message key into display text
pub trait TextResolver: Send + Sync {
    fn resolve(&self, key: &str, variables: &HashMap<&'static str, String>) -> String;
}

/// Message table with `{variable}` placeholders
#[derive(Debug, Clone)]
pub struct CatalogText {
    messages: HashMap<String, String>,
    fallback: String,
}

impl CatalogText {
    /// Empty table; every key resolves to the fallback
    pub fn empty() -> Self {
        Self {
            messages: HashMap::new(),
            fallback: "{application-title} could not complete the request ({error}).".to_string(),
        }
    }

    /// Table with an English message for every catalog code
    pub fn english() -> Self {
        let mut text = Self::empty();
        for code in ErrorCode::ALL {
            if let Some(message) = english_message(code) {
                text.messages.insert(code.message_key(), message.to_string());
            }
        }
        text
    }

    pub fn with_message(mut self, key: impl Into<String>, template: impl Into<String>) -> Self {
        self.messages.insert(key.into(), template.into());
        self
    }

    pub fn with_fallback(mut self, template: impl Into<String>) -> Self {
        self.fallback = template.into();
        self
    }
}

impl Default for CatalogText {
    fn default() -> Self {
        Self::english()
    }
}

impl TextResolver for CatalogText {
    fn resolve(&self, key: &str, variables: &HashMap<&'static str, String>) -> String {
        let template = self.messages.get(key).unwrap_or(&self.fallback);
        variables
            .iter()
            .fold(template.clone(), |text, (name, value)| {
                text.replace(&format!("{{{}}}", name), value)
            })
    }
}

fn english_message(code: ErrorCode) -> Option<&'static str> {
    let message = match code {
        ErrorCode::None => return None,
        ErrorCode::Unknown => "{application-title} ran into an unexpected problem.",
        ErrorCode::LocalAlgo => "{application-title} ran into an internal problem.",
        ErrorCode::LocalUse => "{application-title} could not address the remote service.",
        ErrorCode::LocalConfiguration => "{application-title} is not configured for this request.",
        ErrorCode::HostUnavailable => "The remote service could not be reached.",
        ErrorCode::ServiceUnavailable => "The remote service is temporarily unavailable.",
        ErrorCode::Timeout => "The remote service did not answer in time.",
        ErrorCode::TimeoutPropagated => "The remote service timed out waiting on another service.",
        ErrorCode::ResponseNone => "The remote service returned no data.",
        ErrorCode::TooManyRedirects => "The remote service redirected too many times.",
        ErrorCode::Remote => "The remote service failed to process the request.",
        ErrorCode::RemotePropagated => "A service behind the remote service failed.",
        ErrorCode::MalignStatusUnexpected => "The remote service failed in an unexpected way.",
        ErrorCode::EndpointNotFound => "The requested remote endpoint does not exist.",
        ErrorCode::ResourceNotFound => "The requested item was not found.",
        ErrorCode::Unauthenticated => "The remote service did not accept our credentials.",
        ErrorCode::Unauthorized => "Access to this item is not allowed.",
        ErrorCode::RemoteValidationBad => "The remote service rejected the request.",
        ErrorCode::RemoteValidationFailed => "The remote service could not accept the submitted data.",
        ErrorCode::RemoteConflict => "The request conflicts with the current state of the item.",
        ErrorCode::ResponseType => "The remote service answered in an unexpected format.",
        ErrorCode::ResponseFormat => "The remote service answered with unreadable data.",
        ErrorCode::BenignStatusUnexpected => "The remote service answered unexpectedly.",
        ErrorCode::HeaderMissing => "The remote service answer was incomplete.",
        ErrorCode::ResponseValidation => "The remote service answer did not match what {application-title} expects.",
    };
    Some(message)
}

/// Variable set passed to the resolver for a classified error
pub fn error_variables(code: ErrorCode, app_title: &str) -> HashMap<&'static str, String> {
    HashMap::from([
        (VAR_ERROR, code.name().to_string()),
        (VAR_APP_TITLE, app_title.to_string()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_covers_every_error_code() {
        let text = CatalogText::english();
        for code in ErrorCode::ALL.into_iter().filter(|c| !c.is_none()) {
            let message = text.resolve(&code.message_key(), &error_variables(code, "Shop"));
            assert!(!message.contains('{'), "unresolved placeholder in {message}");
            assert!(!message.is_empty());
        }
    }

    #[test]
    fn test_substitution() {
        let text = CatalogText::english();
        let message = text.resolve("error.local-configuration", &error_variables(ErrorCode::LocalConfiguration, "Shop"));
        assert_eq!(message, "Shop is not configured for this request.");
    }

    #[test]
    fn test_unknown_key_uses_fallback() {
        let text = CatalogText::empty();
        let message = text.resolve("error.nope", &error_variables(ErrorCode::Remote, "Shop"));
        assert_eq!(message, "Shop could not complete the request (remote).");
    }

    #[test]
    fn test_overrides() {
        let text = CatalogText::english().with_message("error.remote", "Upstream broke: {error}");
        let message = text.resolve("error.remote", &error_variables(ErrorCode::Remote, "Shop"));
        assert_eq!(message, "Upstream broke: remote");
    }
}
