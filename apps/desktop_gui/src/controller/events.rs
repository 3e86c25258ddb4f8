//! UI/backend events and error modeling for desktop GUI controller.

pub enum UiEvent {
    Info(String),
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Join,
    General,
}

pub fn classify_join_failure(message: &str) -> String {
    let lower = message.to_ascii_lowercase();
    if lower.contains("backend worker startup failure")
        || lower.contains("failed to build backend runtime")
    {
        "Backend worker startup failure; verify local app environment and retry.".to_string()
    } else if lower.contains("cannot connect to server") {
        message.to_string()
    } else if lower.contains("failed to connect")
        || lower.contains("connection refused")
        || lower.contains("dns")
        || lower.contains("timed out")
    {
        "Server unreachable; check the API URL and retry.".to_string()
    } else {
        format!("Join error: {message}")
    }
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("username")
            || message_lower.contains("invalid")
            || message_lower.contains("malformed")
            || message_lower.contains("must not be blank")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("timeout")
            || message_lower.contains("timed out")
            || message_lower.contains("connect")
            || message_lower.contains("network")
            || message_lower.contains("unavailable")
            || message_lower.contains("disconnect")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    /// Short prefix shown ahead of the message.
    pub fn headline(&self) -> &'static str {
        match self.category {
            UiErrorCategory::Transport => "Connection problem",
            UiErrorCategory::Validation => "Check your input",
            UiErrorCategory::Unknown => "Something went wrong",
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_backend_command_processor_disconnect_as_transport_error() {
        let err = UiError::from_message(
            UiErrorContext::General,
            "Backend command processor disconnected (possible startup/runtime failure)",
        );
        assert_eq!(err.category(), UiErrorCategory::Transport);
        assert_eq!(err.headline(), "Connection problem");
    }

    #[test]
    fn classifies_username_problems_as_validation() {
        let err = UiError::from_message(UiErrorContext::Join, "username must not be blank");
        assert_eq!(err.category(), UiErrorCategory::Validation);
        assert_eq!(err.context(), UiErrorContext::Join);
        assert_eq!(err.headline(), "Check your input");
    }

    #[test]
    fn join_failures_keep_the_server_hint() {
        let hint = "Cannot connect to server. Ensure backend is running at http://localhost:8099/api.";
        assert_eq!(classify_join_failure(hint), hint);
        assert_eq!(
            classify_join_failure("error sending request: connection refused"),
            "Server unreachable; check the API URL and retry."
        );
        assert_eq!(
            classify_join_failure("backend worker startup failure: no runtime"),
            "Backend worker startup failure; verify local app environment and retry."
        );
        assert_eq!(classify_join_failure("boom"), "Join error: boom");
    }
}
