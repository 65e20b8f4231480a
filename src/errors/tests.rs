//! Unit tests for error handling.
//!
//! This module contains tests for error types and the error sink.

use crate::errors::errors::{Error, ErrorHandler, ErrorImpl, ErrorKind, ErrorTip, Location};
use std::rc::Rc;

fn location(line: u32, col: u32) -> Location {
    Location::new(line, col, Rc::new("test.lang".to_string()))
}

#[test]
fn test_error_creation() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "@".to_string(),
        },
        location(1, 10),
    );

    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert_eq!(error.get_kind(), ErrorKind::Lexical);
}

#[test]
fn test_error_location() {
    let error = Error::new(
        ErrorImpl::UnexpectedToken {
            token: "identifier".to_string(),
        },
        location(3, 42),
    );

    assert_eq!(error.get_location().line, 3);
    assert_eq!(error.get_location().col, 42);
    assert_eq!(error.get_kind(), ErrorKind::Syntax);
}

#[test]
fn test_scopecheck_error_renders_identifier_and_location() {
    let error = Error::new(
        ErrorImpl::ScopecheckFailed {
            identifier: "c".to_string(),
        },
        location(2, 11),
    );

    assert_eq!(error.get_kind(), ErrorKind::Semantic);
    assert_eq!(
        error.to_string(),
        "test.lang:2:11: semantic error [ScopecheckFailed]: undeclared identifier \"c\""
    );
}

#[test]
fn test_type_inference_error_names_both_types() {
    let error = Error::new(
        ErrorImpl::TypeInferenceFailed {
            left: "bool".to_string(),
            right: "int".to_string(),
        },
        location(1, 1),
    );

    let rendered = error.to_string();
    assert!(rendered.contains("bool"));
    assert!(rendered.contains("int"));
    assert_eq!(error.get_error_name(), "TypeInferenceFailed");
}

#[test]
fn test_variable_already_declared_error() {
    let error = Error::new(
        ErrorImpl::VariableAlreadyDeclared {
            variable: "x".to_string(),
        },
        location(1, 1),
    );

    assert_eq!(error.get_error_name(), "VariableAlreadyDeclared");
    assert_eq!(error.get_kind(), ErrorKind::Semantic);
}

#[test]
fn test_error_tip_none() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "@".to_string(),
        },
        location(1, 1),
    );

    assert!(matches!(error.get_tip(), ErrorTip::None));
}

#[test]
fn test_error_tip_suggestion() {
    let error = Error::new(
        ErrorImpl::UnexpectedToken {
            token: "}".to_string(),
        },
        location(1, 1),
    );

    match error.get_tip() {
        ErrorTip::Suggestion(_) => (),
        _ => panic!("Expected suggestion tip"),
    }
}

#[test]
fn test_error_tip_display() {
    let tip = ErrorTip::Suggestion("Try this instead".to_string());
    assert_eq!(tip.to_string(), "Try this instead");

    let tip = ErrorTip::None;
    assert_eq!(tip.to_string(), "");
}

#[test]
fn test_handler_starts_empty() {
    let handler = ErrorHandler::new();
    assert!(handler.is_empty());
    assert_eq!(handler.len(), 0);
    assert!(handler.all_errors().is_empty());
}

#[test]
fn test_handler_accumulates_in_order() {
    let mut handler = ErrorHandler::new();
    handler.add(
        ErrorImpl::ScopecheckFailed {
            identifier: "a".to_string(),
        },
        location(1, 1),
    );
    handler.add(
        ErrorImpl::ScopecheckFailed {
            identifier: "b".to_string(),
        },
        location(2, 1),
    );

    assert!(!handler.is_empty());
    let rendered = handler.all_errors();
    assert_eq!(rendered.len(), 2);
    assert!(rendered[0].contains("\"a\""));
    assert!(rendered[1].contains("\"b\""));
}

#[test]
fn test_handler_truncates_rendered_errors() {
    let mut handler = ErrorHandler::with_limit(3);
    for i in 0..5 {
        handler.add(
            ErrorImpl::ScopecheckFailed {
                identifier: format!("v{}", i),
            },
            location(i + 1, 1),
        );
    }

    assert_eq!(handler.len(), 5);
    let rendered = handler.all_errors();
    assert_eq!(rendered.len(), 4);
    assert_eq!(rendered[3], "... and 2 more errors");
    assert_eq!(handler.reported().len(), 3);
    assert_eq!(handler.omitted(), 2);
}
