use homecooked_core::retry::{is_transient_status, looks_rate_limited};

/// Failures the pipeline needs to classify, as opposed to plain context errors.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("GraphQL error: {0}")]
    GraphQl(String),

    #[error("Invalid output: {0}")]
    Validation(String),

    #[error("{0} environment variable not set")]
    MissingEnv(String),
}

impl Error {
    /// Whether retrying the call that produced this error may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http { status, body } => is_transient_status(*status) || looks_rate_limited(body),
            Error::GraphQl(message) => looks_rate_limited(message),
            Error::Validation(_) | Error::MissingEnv(_) => false,
        }
    }
}

/// Default transient classifier for `eyre` reports.
///
/// Typed errors decide for themselves. Anything else (transport errors,
/// provider SDK errors) is transient only when its message reads like rate
/// limiting.
pub fn is_transient(report: &color_eyre::eyre::Report) -> bool {
    match report.downcast_ref::<Error>() {
        Some(error) => error.is_transient(),
        None => looks_rate_limited(&format!("{report:#}")),
    }
}

/// Read a required credential from the environment.
pub fn require_env(name: &str) -> Result<String, Error> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::MissingEnv(name.to_string()))
}
