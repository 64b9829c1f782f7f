//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use arbor_config::ConfigError;
use arbor_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const BUSY: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Remote ───────────────────────────────────────────────────────
    #[error("Could not reach the tree service")]
    #[diagnostic(
        code(arbor::unavailable),
        help(
            "{reason}\n\
             Check the URL and that the service is up.\n\
             For self-signed certificates use --insecure (-k) or set ca_cert in your profile."
        )
    )]
    Unavailable { reason: String },

    #[error("The tree service rejected the request: {message}")]
    #[diagnostic(
        code(arbor::rejected),
        help("Reload with `arbor show` and retry against the current tree.")
    )]
    Rejected { message: String },

    #[error("The tree service sent a response arbor could not read")]
    #[diagnostic(code(arbor::malformed), help("{message}"))]
    Malformed { message: String },

    #[error("Another tree operation is still in flight")]
    #[diagnostic(
        code(arbor::busy),
        help("Retry once it finishes, or pass --queue to wait for it.")
    )]
    Busy,

    // ── Nodes ────────────────────────────────────────────────────────
    #[error("Node '{id}' not found")]
    #[diagnostic(
        code(arbor::not_found),
        help("Run: arbor show --output table to see node ids")
    )]
    NotFound { id: String },

    #[error("{message}")]
    #[diagnostic(code(arbor::precondition))]
    Precondition { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(arbor::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(arbor::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: arbor config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No tree service configured")]
    #[diagnostic(
        code(arbor::no_config),
        help(
            "Pass --url and --tree, or create a profile with: arbor config init\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(arbor::config))]
    Config(Box<ConfigError>),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(arbor::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(arbor::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(arbor::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to render TOML: {0}")]
    #[diagnostic(code(arbor::toml))]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Unavailable { .. } => exit_code::CONNECTION,
            Self::Rejected { .. } => exit_code::CONFLICT,
            Self::Busy => exit_code::BUSY,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Precondition { .. }
            | Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::RemoteUnavailable { reason } => CliError::Unavailable { reason },
            CoreError::RemoteRejected { message, status } => CliError::Rejected {
                message: match status {
                    Some(status) if !message.contains(&status.to_string()) => {
                        format!("{message} (HTTP {status})")
                    }
                    _ => message,
                },
            },
            CoreError::RemoteMalformed { message } => CliError::Malformed { message },
            CoreError::Busy => CliError::Busy,
            CoreError::NodeNotFound { id } => CliError::NotFound { id: id.to_string() },
            CoreError::Precondition { message } => CliError::Precondition { message },
            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "name".into(),
                reason: message,
            },
            CoreError::Config { message } => CliError::Validation {
                field: "connection settings".into(),
                reason: message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoProfile { profile } => CliError::ProfileNotFound {
                name: profile,
                available: "(none)".into(),
            },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config(Box::new(other)),
        }
    }
}
