use std::{fmt, io};
use std::panic::Location;
use std::error::Error as StdError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// An error with a human-readable detail, optional context lines, and an
/// optional chain of errors that caused it.
#[derive(Debug)]
pub struct Error {
    detail: Box<dyn ErrorDetail>,
    prev: Option<Box<Error>>,
    location: &'static Location<'static>,
}

pub trait ErrorDetail: fmt::Display + fmt::Debug + Send + Sync {
    fn context(&self) -> Vec<(Option<String>, String)> { vec![] }

    fn invalid_argument(&self) -> Option<&InvalidArgument> { None }
}

/// A template-facing argument did not have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidArgument {
    /// Where in the argument the problem was found, i.e, `links[1].uri`.
    pub argument: String,
    pub expected: &'static str,
    pub found: String,
}

impl InvalidArgument {
    pub fn new<A, F>(argument: A, expected: &'static str, found: F) -> Self
        where A: Into<String>, F: fmt::Display
    {
        InvalidArgument { argument: argument.into(), expected, found: found.to_string() }
    }
}

impl fmt::Display for InvalidArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid argument `{}`: expected {}, found {}",
            self.argument, self.expected, self.found)
    }
}

impl StdError for InvalidArgument { }

impl ErrorDetail for InvalidArgument {
    fn invalid_argument(&self) -> Option<&InvalidArgument> {
        Some(self)
    }
}

impl Error {
    #[track_caller]
    pub fn from_std<E>(error: E) -> Self
        where E: StdError + Send + Sync + 'static
    {
        Error::from(Box::new(error) as Box<dyn StdError + Send + Sync>)
    }

    /// Places `self` at the end of `other`'s cause chain and returns `other`.
    pub fn chain(self, mut other: Error) -> Self {
        fn _chain(error: Error, behind: &mut Error) {
            match behind.prev.as_mut() {
                Some(prev) => _chain(error, prev),
                None => behind.prev = Some(Box::new(error)),
            }
        }

        _chain(self, &mut other);
        other
    }

    /// The first `InvalidArgument` in this error or any error it chains,
    /// including the sources of chained standard errors.
    pub fn invalid_argument(&self) -> Option<&InvalidArgument> {
        self.detail.invalid_argument()
            .or_else(|| self.prev.as_ref()?.invalid_argument())
    }
}

/// The first `InvalidArgument` among `error` and its sources.
pub(crate) fn source_invalid_argument<'a>(
    error: &'a (dyn StdError + 'static)
) -> Option<&'a InvalidArgument> {
    let mut error = Some(error);
    while let Some(e) = error {
        if let Some(invalid) = e.downcast_ref::<InvalidArgument>() {
            return Some(invalid);
        }

        error = e.source();
    }

    None
}

impl ErrorDetail for &(dyn StdError + Send + Sync) {
    fn context(&self) -> Vec<(Option<String>, String)> {
        let mut ctxt = vec![];
        let mut error = self.source();
        while let Some(e) = error {
            ctxt.push((None, e.to_string()));
            error = e.source();
        }

        ctxt
    }
}

impl ErrorDetail for Box<dyn StdError + Send + Sync> {
    fn context(&self) -> Vec<(Option<String>, String)> {
        let error: &(dyn StdError + Send + Sync) = &**self;
        error.context()
    }

    fn invalid_argument(&self) -> Option<&InvalidArgument> {
        source_invalid_argument(&**self)
    }
}

macro_rules! impl_error_detail_with_std_error {
    ($T:ty) => {
        impl $crate::error::ErrorDetail for $T {
            fn context(&self) -> Vec<(Option<String>, String)> {
                let error: &(dyn std::error::Error + Send + Sync) = self;
                error.context()
            }

            fn invalid_argument(&self) -> Option<&$crate::error::InvalidArgument> {
                $crate::error::source_invalid_argument(self)
            }
        }
    }
}

pub(crate) use impl_error_detail_with_std_error;

impl_error_detail_with_std_error!(io::Error);
impl_error_detail_with_std_error!(toml::de::Error);
impl_error_detail_with_std_error!(serde_json::Error);

impl ErrorDetail for String { }
impl ErrorDetail for &'static str { }

impl<T: ErrorDetail + 'static> From<T> for Error {
    #[track_caller]
    fn from(detail: T) -> Self {
        Error {
            detail: Box::new(detail),
            prev: None,
            location: Location::caller(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn nested(f: &mut fmt::Formatter<'_>, depth: usize, e: &Error) -> fmt::Result {
            let indent = " ".repeat(depth * 4);
            let newline = format!("\n{indent}");

            writeln!(f, "{indent}{}", e.detail.to_string().replace('\n', &newline))?;
            for (key, value) in e.detail.context() {
                let value = value.replace('\n', &newline);
                match key {
                    Some(key) => writeln!(f, "{indent}{key}: {value}")?,
                    None => writeln!(f, "{indent}{value}")?,
                }
            }

            if std::env::var_os("RUST_BACKTRACE").is_some() {
                writeln!(f, "{indent}[{}]", e.location)?;
            }

            match &e.prev {
                Some(prev) => nested(f, depth + 1, prev),
                None => Ok(()),
            }
        }

        nested(f, 0, self)
    }
}

/// An ad-hoc error detail, usually built with [`error!`](crate::error!).
#[derive(Debug)]
pub struct Makeshift {
    pub message: String,
    pub parameters: Vec<(Option<String>, String)>,
}

impl fmt::Display for Makeshift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.message.fmt(f)
    }
}

impl ErrorDetail for Makeshift {
    fn context(&self) -> Vec<(Option<String>, String)> {
        self.parameters.clone()
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! err {
    ($($token:tt)*) => (Err($crate::error!($($token)*)));
}

/// Builds an [`Error`](crate::error::Error) from a message followed by
/// context: either `"key" => value` pairs or bare values.
///
/// ```rust
/// let e = stache::error!("failed to read page", "path" => "docs/index.md");
/// assert!(e.to_string().contains("path: docs/index.md"));
/// ```
#[doc(hidden)]
#[macro_export]
macro_rules! error {
    (@param $v:ident $key:expr => $value:expr $(, $($rest:tt)*)?) => {
        $v.push((Some($key.to_string()), $value.to_string()));
        $crate::error!(@param $v $($($rest)*)?);
    };

    (@param $v:ident $value:expr $(, $($rest:tt)*)?) => {
        $v.push((None, $value.to_string()));
        $crate::error!(@param $v $($($rest)*)?);
    };

    (@param $v:ident) => { };

    ($msg:expr, $($rest:tt)*) => (
        $crate::error::Error::from($crate::error::Makeshift {
            message: $msg.to_string(),
            parameters: {
                #[allow(unused_mut)]
                let mut v: Vec<(Option<String>, String)> = Vec::new();
                $crate::error!(@param v $($rest)*);
                v
            },
        })
    );

    ($msg:expr) => ($crate::error!($msg, ));
}

pub trait Chainable<T> {
    fn chain(self, other: impl Into<Error>) -> Result<T>;

    fn chain_with<F, E>(self, f: F) -> Result<T>
        where F: FnOnce() -> E, E: Into<Error>;
}

impl<T, E: Into<Error>> Chainable<T> for Result<T, E> {
    #[track_caller]
    fn chain(self, other: impl Into<Error>) -> Result<T> {
        self.map_err(|e| e.into().chain(other.into()))
    }

    #[track_caller]
    fn chain_with<F, Err>(self, f: F) -> Result<T>
        where F: FnOnce() -> Err, Err: Into<Error>,
    {
        self.map_err(|e| e.into().chain(f().into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chained_errors_render_outermost_first() {
        let inner: Result<()> = err!("file missing", "path" => "a/b.md");
        let error = inner.chain(error!("include failed")).unwrap_err();
        let rendered = error.to_string();

        let outer = rendered.find("include failed").unwrap();
        let cause = rendered.find("file missing").unwrap();
        assert!(outer < cause);
        assert!(rendered.contains("    path: a/b.md"));
    }

    #[test]
    fn invalid_argument_is_found_through_chain() {
        let bad = InvalidArgument::new("links", "a sequence", "string");
        let error = Error::from(bad.clone()).chain(error!("`child_links` failed"));
        assert_eq!(error.invalid_argument(), Some(&bad));
        assert!(error!("unrelated").invalid_argument().is_none());
    }

    #[test]
    fn invalid_argument_is_found_in_std_sources() {
        #[derive(Debug)]
        struct Render(InvalidArgument);

        impl fmt::Display for Render {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "render failed")
            }
        }

        impl StdError for Render {
            fn source(&self) -> Option<&(dyn StdError + 'static)> {
                Some(&self.0)
            }
        }

        let bad = InvalidArgument::new("links[0].uri", "a string", "number");
        let error = Error::from_std(Render(bad.clone())).chain(error!("failed to render template"));
        assert_eq!(error.invalid_argument(), Some(&bad));
    }

    #[test]
    fn bare_messages_have_no_context() {
        let error = error!("plain");
        assert!(error.to_string().starts_with("plain\n"));
        assert!(error.detail.context().is_empty());

        let error = error!("trailing",);
        assert!(error.detail.context().is_empty());
    }
}
