use std::{collections::HashSet, rc::Rc};

use pretty_assertions::assert_eq;

use crate::{
    ast::{
        ast::{Ast, NodeId, Tag},
        visitor::walk,
    },
    errors::errors::{ErrorHandler, ErrorImpl},
    lexer::lexer::tokenize,
    parser::parser::parse,
    scope_resolver::{
        qualified_names::{QualifiedName, QualifiedNameTable},
        scope_resolver::{resolve_scopes, ScopeResolver, ScopeStack},
    },
};

fn parse_source(source: &str) -> Ast {
    let tokens = tokenize(source.to_string(), None).expect("source should lex");
    parse(tokens, source.to_string(), Rc::new("shell".to_string())).expect("source should parse")
}

fn resolve(source: &str) -> (Ast, QualifiedNameTable, ErrorHandler) {
    let ast = parse_source(source);
    let mut errors = ErrorHandler::new();
    let names = resolve_scopes(&ast, &mut errors);
    (ast, names, errors)
}

/// Identifier nodes with the given lexeme, in source order.
fn identifiers(ast: &Ast, lexeme: &str) -> Vec<NodeId> {
    let mut found = (0..ast.len())
        .map(|index| NodeId(index as u32))
        .filter(|node| ast.tag(*node) == Tag::Identifier && ast.token_text(*node) == lexeme)
        .collect::<Vec<NodeId>>();
    found.sort_by_key(|node| ast.node(*node).main_token.0);
    found
}

#[test]
fn test_qualified_name_format() {
    assert_eq!(
        QualifiedName::new(&[NodeId(0), NodeId(4)], "a", NodeId(7)).as_str(),
        "0::4::a#7"
    );
    assert_eq!(QualifiedName::new(&[], "a", NodeId(7)).to_string(), "a#7");
}

#[test]
fn test_names_carry_their_scope_path() {
    let (_, names, errors) = resolve("const a = 1\n{ const b = a }");

    assert!(errors.is_empty());
    let rendered = names
        .all_declaration_nodes()
        .iter()
        .map(|node| names.node_to_name(*node).map(|name| name.to_string()))
        .collect::<Vec<Option<String>>>();
    assert_eq!(
        rendered,
        vec![Some("0::a#1".to_string()), Some("0::9::b#5".to_string())]
    );
}

#[test]
fn test_usage_shares_declaration_name() {
    let (ast, names, errors) = resolve("const a = 1\nconst b = a + a");

    assert!(errors.is_empty());
    let occurrences = identifiers(&ast, "a");
    assert_eq!(occurrences.len(), 3);

    let declared = names.node_to_name(occurrences[0]);
    assert!(declared.is_some());
    for usage in &occurrences[1..] {
        assert_eq!(names.node_to_name(*usage), declared);
        assert_eq!(names.declaration_of(*usage), Some(occurrences[0]));
    }
    assert_eq!(names.usages().len(), 2);
}

#[test]
fn test_shadowing_picks_innermost_declaration() {
    let (ast, names, errors) = resolve("const a = 1\n{\nconst a = 2\nconst b = a\n}\nconst c = a");

    assert!(errors.is_empty(), "{:?}", errors.all_errors());
    let occurrences = identifiers(&ast, "a");
    let (outer, inner, inner_use, outer_use) =
        (occurrences[0], occurrences[1], occurrences[2], occurrences[3]);

    assert_ne!(names.node_to_name(outer), names.node_to_name(inner));
    assert_eq!(names.declaration_of(inner_use), Some(inner));
    assert_eq!(names.declaration_of(outer_use), Some(outer));
}

#[test]
fn test_qualified_names_are_unique() {
    let (_, names, _) = resolve(
        "const a = 1\n{ const a = 2 }\n{ const a = 3\n{ const a = 4 } }\nfn f(a) { const b = a }",
    );

    let unique = names
        .all_declaration_nodes()
        .iter()
        .filter_map(|node| names.node_to_name(*node))
        .collect::<HashSet<&QualifiedName>>();
    assert_eq!(unique.len(), names.all_declaration_nodes().len());
    assert_eq!(unique.len(), 7);
}

#[test]
fn test_unresolved_identifier_reports_location() {
    let (_, _, errors) = resolve("const a = 1\nconst b = a + c");

    assert_eq!(errors.len(), 1);
    let error = &errors.errors()[0];
    assert_eq!(
        error.get_internal_error(),
        &ErrorImpl::ScopecheckFailed {
            identifier: "c".to_string()
        }
    );
    assert_eq!(error.get_location().line, 2);
    assert_eq!(error.get_location().col, 15);
}

#[test]
fn test_names_do_not_leak_out_of_blocks() {
    let (_, _, errors) = resolve("{ const a = 1 }\nconst b = a");

    assert_eq!(errors.len(), 1);
    assert_eq!(errors.errors()[0].get_error_name(), "ScopecheckFailed");
}

#[test]
fn test_use_before_declaration_fails() {
    let (_, _, errors) = resolve("const b = a\nconst a = 1");

    assert_eq!(errors.len(), 1);
}

#[test]
fn test_redeclaration_in_same_scope() {
    let (_, _, errors) = resolve("const a = 1\nvar a = 2");

    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors.errors()[0].get_internal_error(),
        &ErrorImpl::VariableAlreadyDeclared {
            variable: "a".to_string()
        }
    );
    assert_eq!(errors.errors()[0].get_location().line, 2);
}

#[test]
fn test_function_name_visible_to_body_and_callers() {
    let (ast, names, errors) = resolve("fn f(n) { return f(n) }\nconst r = f(1)");

    assert!(errors.is_empty(), "{:?}", errors.all_errors());
    let occurrences = identifiers(&ast, "f");
    assert_eq!(occurrences.len(), 3);
    for usage in &occurrences[1..] {
        assert_eq!(names.declaration_of(*usage), Some(occurrences[0]));
    }
}

#[test]
fn test_parameters_are_local_to_the_function() {
    let (_, _, errors) = resolve("fn f(x) { return x }\nconst y = x");

    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors.errors()[0].get_internal_error(),
        &ErrorImpl::ScopecheckFailed {
            identifier: "x".to_string()
        }
    );
}

#[test]
fn test_scopes_are_balanced_after_walk() {
    let ast = parse_source("const a = 1\n{ { const b = a } }\nfn f(x) { { return x } }");
    let mut errors = ErrorHandler::new();
    let mut resolver = ScopeResolver::new(&mut errors);

    walk(&ast, &mut resolver);

    let scopes = resolver.scope_stack();
    assert!(scopes.is_balanced());
    assert_eq!(scopes.depth(), 0);
    assert_eq!(scopes.visible_len(), 0);
    // Six scope anchors plus a, b, f and x.
    assert_eq!(scopes.declarations().len(), 10);
    assert_eq!(resolver.usages().len(), 2);
}

#[test]
fn test_scope_stack_truncates_on_exit() {
    let mut scopes = ScopeStack::new();
    let root = scopes.enter_scope(NodeId(0), 1, 1);
    let a = scopes.declare(NodeId(1), 1, 7);

    let block = scopes.enter_scope(NodeId(2), 2, 1);
    let b = scopes.declare(NodeId(3), 2, 9);
    assert_eq!(scopes.visible_len(), 2);
    assert_eq!(scopes.declaration(b).depth, 2);
    assert_eq!(scopes.scope_path(b), vec![NodeId(0), NodeId(2)]);
    assert_eq!(scopes.declaration(block).parent, Some(root));
    assert_eq!(scopes.lookup_current_scope(|decl| decl.node == NodeId(1)), None);

    scopes.exit_scope();
    assert_eq!(scopes.visible_len(), 1);
    assert_eq!(scopes.lookup(|decl| decl.node == NodeId(3)), None);
    assert_eq!(scopes.lookup(|decl| decl.node == NodeId(1)), Some(a));
    assert!(!scopes.is_balanced());

    scopes.exit_scope();
    assert!(scopes.is_balanced());
    assert_eq!(scopes.declarations().len(), 4);
}
