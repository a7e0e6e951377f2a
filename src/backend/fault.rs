//! Backend fault translation and classification.
//!
//! Every daemon call returns `Result<_, BackendFault>`. Transport errors are
//! converted at the adapter boundary, and [`classify`] maps any fault onto the
//! closed set of process-level dispositions in [`FaultKind`].

use std::fmt;

/// Prefix GLib-style bus errors carry in their textual form.
const GDBUS_ERROR_PREFIX: &str = "GDBus.Error:";

/// What: Failure raised by a backend call.
///
/// Inputs:
/// - Produced by the bus adapter or by reply decoding.
///
/// Output:
/// - Passed to [`classify`] before it reaches the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendFault {
    /// A structured fault raised by the daemon or the bus.
    #[error("{name}: {message}")]
    Remote {
        /// Fully qualified fault name, e.g. `org.baseurl.DnfSystem.LockedError`.
        name: String,
        /// Human readable detail.
        message: String,
    },
    /// Transport failure whose text did not carry a structured fault name.
    #[error("{0}")]
    Transport(String),
    /// The daemon replied with something that could not be decoded.
    #[error("malformed reply from {call}: {detail}")]
    Malformed {
        /// Daemon method.
        call: &'static str,
        /// Decoder message.
        detail: String,
    },
}

impl BackendFault {
    /// What: Build a fault from the textual form of a transport error.
    ///
    /// Inputs:
    /// - `text`: Error text, e.g. `GDBus.Error:org.baseurl.DnfSystem.LockedError: busy`.
    ///
    /// Output:
    /// - [`BackendFault::Remote`] when a fault name can be extracted, otherwise
    ///   [`BackendFault::Transport`] with the text verbatim.
    #[must_use]
    pub fn from_transport_text(text: &str) -> Self {
        match parse_fault_text(text) {
            Some((name, message)) => Self::Remote {
                name: name.to_string(),
                message: message.to_string(),
            },
            None => Self::Transport(text.to_string()),
        }
    }

    /// Short fault name (last dotted segment), empty when unknown.
    #[must_use]
    pub fn short_name(&self) -> &str {
        match self {
            Self::Remote { name, .. } => name.rsplit('.').next().unwrap_or_default(),
            Self::Transport(_) | Self::Malformed { .. } => "",
        }
    }
}

/// What: Extract `(fault name, message)` from a bus error's text.
///
/// Inputs:
/// - `text`: Either `GDBus.Error:<name>: <message>` or `<name>: <message>`.
///
/// Output:
/// - `Some((name, message))` when `<name>` is a dotted identifier, `None` otherwise.
///
/// Details:
/// - Anything before `GDBus.Error:` is ignored.
/// - The name must contain at least one `.` so plain `Error: ...` texts are not
///   mistaken for structured faults.
#[must_use]
pub fn parse_fault_text(text: &str) -> Option<(&str, &str)> {
    let rest = text
        .find(GDBUS_ERROR_PREFIX)
        .map_or(text, |i| &text[i + GDBUS_ERROR_PREFIX.len()..])
        .trim_start();
    let (name, message) = match rest.split_once(": ") {
        Some((n, m)) => (n, m),
        None => (rest.strip_suffix(':').unwrap_or(rest), ""),
    };
    let valid = name.contains('.')
        && !name.starts_with('.')
        && !name.ends_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    valid.then(|| (name, message.trim_end()))
}

/// Process-level disposition of a classified fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Another process holds the daemon lock.
    Locked,
    /// The daemon did not answer.
    NoReply,
    /// Authorization was refused.
    AccessDenied,
    /// Unspecified daemon failure.
    Fatal,
    /// Anything else; the message is shown verbatim.
    Other,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Locked => "LockedError",
            Self::NoReply => "NoReply",
            Self::AccessDenied => "AccessDeniedError",
            Self::Fatal => "FatalError",
            Self::Other => "Other",
        })
    }
}

/// A fault mapped to its disposition and user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedFault {
    /// Disposition.
    pub kind: FaultKind,
    /// Message shown before the process exits.
    pub message: String,
}

/// What: Map a backend fault onto a disposition and user message.
///
/// Inputs:
/// - `fault`: Any [`BackendFault`].
///
/// Output:
/// - [`ClassifiedFault`]; unknown faults keep their own message (or the whole
///   error text when no message was extracted).
#[must_use]
pub fn classify(fault: &BackendFault) -> ClassifiedFault {
    let (kind, message) = match fault.short_name() {
        "LockedError" => (
            FaultKind::Locked,
            "DNF is locked by another process.\n\nYum Extender will exit".to_string(),
        ),
        "NoReply" => (
            FaultKind::NoReply,
            "DNF D-Bus backend is not responding.\n\nYum Extender will exit".to_string(),
        ),
        "AccessDeniedError" => (
            FaultKind::AccessDenied,
            "Root backend was not authorized and can't continue".to_string(),
        ),
        "FatalError" => (FaultKind::Fatal, "Fatal error in yumex backend".to_string()),
        _ => {
            let message = match fault {
                BackendFault::Remote { message, .. } if !message.is_empty() => message.clone(),
                other => other.to_string(),
            };
            (FaultKind::Other, message)
        }
    };
    tracing::debug!(kind = %kind, fault = %fault, "[Fault] classified backend fault");
    ClassifiedFault { kind, message }
}
