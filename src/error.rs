//! Unified error type.

/// The error type returned by mono's fallible operations.
///
/// Application-level outcomes (404, 405, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// failures the error-handling stage deals with: handler errors, panics,
/// mapping and template failures, and transport problems.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {0}")]
    Config(String),

    #[error("invalid route `{path}`: {message}")]
    Route { path: String, message: String },

    #[error("templates are not configured, pass a template folder to the builder")]
    TemplatesNotConfigured,

    #[error("template: {0}")]
    Template(#[from] minijinja::Error),

    #[error("no instance of `{0}` registered in the container")]
    NotRegistered(&'static str),

    #[error("mapping errors on {type_name}: {message}")]
    Mapping { type_name: &'static str, message: String },

    #[error("request reached the handler stage without a matched route")]
    MissingRoute,

    #[error("middleware called next past the end of the pipeline")]
    PipelineExhausted,

    #[error("handler panicked: {0}")]
    Panic(String),

    #[error(transparent)]
    Handler(#[from] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl Error {
    /// Wraps any application error so handlers can return it with `?`.
    pub fn handler(err: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>) -> Self {
        Self::Handler(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_errors_display_transparently() {
        let err = Error::handler("developer error");
        assert_eq!(err.to_string(), "developer error");
    }

    #[test]
    fn mapping_error_names_the_target_type() {
        let err = Error::Mapping { type_name: "Book", message: "missing field `title`".into() };
        assert_eq!(err.to_string(), "mapping errors on Book: missing field `title`");
    }
}
