use std::{fmt::Display, rc::Rc};

use thiserror::Error;

/// Upper bound on the number of rendered diagnostics returned by
/// [`ErrorHandler::all_errors`].
pub const MAX_REPORTED_ERRORS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lexical,
    Syntax,
    Semantic,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Lexical => write!(f, "lexical"),
            ErrorKind::Syntax => write!(f, "syntax"),
            ErrorKind::Semantic => write!(f, "semantic"),
        }
    }
}

/// A 1-based line/column pair inside a named source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub line: u32,
    pub col: u32,
    pub file: Rc<String>,
}

impl Location {
    pub fn new(line: u32, col: u32, file: Rc<String>) -> Self {
        Location { line, col, file }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.col)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    internal_error: ErrorImpl,
    location: Location,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, location: Location) -> Self {
        Error {
            internal_error: error_impl,
            location,
        }
    }

    pub fn get_location(&self) -> &Location {
        &self.location
    }

    pub fn get_internal_error(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_kind(&self) -> ErrorKind {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => ErrorKind::Lexical,
            ErrorImpl::UnexpectedToken { .. }
            | ErrorImpl::UnexpectedTokenDetailed { .. }
            | ErrorImpl::NumberParseError { .. } => ErrorKind::Syntax,
            ErrorImpl::ScopecheckFailed { .. }
            | ErrorImpl::VariableAlreadyDeclared { .. }
            | ErrorImpl::TypeInferenceFailed { .. } => ErrorKind::Semantic,
        }
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedTokenDetailed { .. } => "UnexpectedTokenDetailed",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::ScopecheckFailed { .. } => "ScopecheckFailed",
            ErrorImpl::VariableAlreadyDeclared { .. } => "VariableAlreadyDeclared",
            ErrorImpl::TypeInferenceFailed { .. } => "TypeInferenceFailed",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => ErrorTip::None,
            ErrorImpl::UnexpectedToken { token } => ErrorTip::Suggestion(format!(
                "Unexpected token: `{}`, did you miss a semicolon?",
                token
            )),
            ErrorImpl::UnexpectedTokenDetailed { token, message } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`, {}", token, message))
            }
            ErrorImpl::NumberParseError { token } => ErrorTip::Suggestion(format!(
                "Invalid number: `{}`, is it above the integer limit?",
                token
            )),
            ErrorImpl::ScopecheckFailed { identifier } => ErrorTip::Suggestion(format!(
                "`{}` is not declared in this scope or any enclosing one",
                identifier
            )),
            ErrorImpl::VariableAlreadyDeclared { variable } => ErrorTip::Suggestion(format!(
                "`{}` is already declared in this scope, rename one of them",
                variable
            )),
            ErrorImpl::TypeInferenceFailed { left, right } => ErrorTip::Suggestion(format!(
                "`{}` and `{}` cannot be the same type",
                left, right
            )),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} error [{}]: {}",
            self.location,
            self.get_kind(),
            self.get_error_name(),
            self.internal_error
        )
    }
}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("unrecognised token: {token:?}")]
    UnrecognisedToken { token: String },
    #[error("unexpected token: {token:?}")]
    UnexpectedToken { token: String },
    #[error("unexpected token ({message}): {token:?}")]
    UnexpectedTokenDetailed { token: String, message: String },
    #[error("error parsing number: {token:?}")]
    NumberParseError { token: String },
    #[error("undeclared identifier {identifier:?}")]
    ScopecheckFailed { identifier: String },
    #[error("{variable:?} already declared in this scope")]
    VariableAlreadyDeclared { variable: String },
    #[error("cannot unify {left} with {right}")]
    TypeInferenceFailed { left: String, right: String },
}

/// Accumulating diagnostic sink shared by every compilation stage.
///
/// Stages report into the handler and keep going; callers check
/// [`ErrorHandler::is_empty`] before trusting a stage's output.
#[derive(Debug, Clone)]
pub struct ErrorHandler {
    errors: Vec<Error>,
    max_reported: usize,
}

impl Default for ErrorHandler {
    fn default() -> Self {
        ErrorHandler::new()
    }
}

impl ErrorHandler {
    pub fn new() -> Self {
        ErrorHandler::with_limit(MAX_REPORTED_ERRORS)
    }

    pub fn with_limit(max_reported: usize) -> Self {
        ErrorHandler {
            errors: vec![],
            max_reported,
        }
    }

    pub fn add(&mut self, error_impl: ErrorImpl, location: Location) {
        self.push(Error::new(error_impl, location));
    }

    pub fn push(&mut self, error: Error) {
        tracing::debug!(code = error.get_error_name(), "{}", error);
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// The errors that fit under the reporting limit.
    pub fn reported(&self) -> &[Error] {
        &self.errors[..self.errors.len().min(self.max_reported)]
    }

    pub fn omitted(&self) -> usize {
        self.errors.len().saturating_sub(self.max_reported)
    }

    /// Renders at most `max_reported` errors, followed by a summary line
    /// when some were left out.
    pub fn all_errors(&self) -> Vec<String> {
        let mut rendered = self
            .errors
            .iter()
            .take(self.max_reported)
            .map(|error| error.to_string())
            .collect::<Vec<String>>();

        if self.errors.len() > self.max_reported {
            rendered.push(format!(
                "... and {} more errors",
                self.errors.len() - self.max_reported
            ));
        }

        rendered
    }
}
