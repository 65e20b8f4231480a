use pretty_assertions::assert_eq;

use crate::{
    analyze,
    ast::ast::{NodeId, Tag},
    errors::errors::{ErrorHandler, ErrorImpl},
    type_checker::{
        type_checker::{TypeChecker, UnifyError},
        types::{BaseType, Kind, TypeId, TypeTerm},
    },
    scope_resolver::qualified_names::QualifiedNameTable,
    Analysis,
};

fn run(source: &str) -> (Analysis, ErrorHandler) {
    let mut errors = ErrorHandler::new();
    let analysis = analyze(source.to_string(), None, &mut errors).expect("source should parse");
    (analysis, errors)
}

/// Declaration node of the first binding called `lexeme`.
fn declaration(analysis: &Analysis, lexeme: &str) -> NodeId {
    *analysis
        .names
        .all_declaration_nodes()
        .iter()
        .find(|node| analysis.ast.token_text(**node) == lexeme)
        .unwrap_or_else(|| panic!("no declaration named {lexeme}"))
}

fn type_of(analysis: &Analysis, lexeme: &str) -> String {
    let node = declaration(analysis, lexeme);
    analysis.types.render_node(node).expect("declaration has a type")
}

fn type_errors(errors: &ErrorHandler) -> Vec<(String, String)> {
    errors
        .errors()
        .iter()
        .filter_map(|error| match error.get_internal_error() {
            ErrorImpl::TypeInferenceFailed { left, right } => Some((left.clone(), right.clone())),
            _ => None,
        })
        .collect()
}

#[test]
fn test_arithmetic_on_literals_is_int() {
    let (analysis, errors) = run("const a = 5 + 2");

    assert!(errors.is_empty());
    assert_eq!(type_of(&analysis, "a"), "int");
}

#[test]
fn test_literal_types() {
    let (analysis, errors) = run("const i = 1\nconst f = 1.5\nconst s = \"hi\"\nconst b = true");

    assert!(errors.is_empty());
    assert_eq!(type_of(&analysis, "i"), "int");
    assert_eq!(type_of(&analysis, "f"), "float");
    assert_eq!(type_of(&analysis, "s"), "string");
    assert_eq!(type_of(&analysis, "b"), "bool");
}

#[test]
fn test_assignment_in_nested_block_agrees() {
    let (analysis, errors) = run("const a = 5 + 2; { a = 8 + 3 + 9 }");

    assert!(errors.is_empty(), "{:?}", errors.all_errors());
    assert_eq!(type_of(&analysis, "a"), "int");
}

#[test]
fn test_assignment_of_wrong_type_fails() {
    let (_, errors) = run("var a = 1\na = \"text\"");

    assert_eq!(
        type_errors(&errors),
        vec![("int".to_string(), "string".to_string())]
    );
}

#[test]
fn test_comparison_result_used_as_int_fails() {
    let (_, errors) = run("var x = true\nvar y = false\nconst a = (x == y) + 1");

    let failures = type_errors(&errors);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0], ("bool".to_string(), "int".to_string()));
    assert_eq!(
        errors.errors()[0].get_location().line,
        3,
        "reported on the line of the addition"
    );
}

#[test]
fn test_mixed_arithmetic_fails_but_inference_continues() {
    let (analysis, errors) = run("const a = 1 + 2.5\nconst b = \"x\"");

    assert_eq!(errors.len(), 1);
    assert_eq!(type_of(&analysis, "b"), "string");
}

#[test]
fn test_logical_operators_are_bool() {
    let (analysis, errors) = run("const a = true && !false\nconst b = a || false");

    assert!(errors.is_empty(), "{:?}", errors.all_errors());
    assert_eq!(type_of(&analysis, "a"), "bool");
    assert_eq!(type_of(&analysis, "b"), "bool");
}

#[test]
fn test_negation_requires_int() {
    let (analysis, errors) = run("var n = 3\nconst m = -n");
    assert!(errors.is_empty());
    assert_eq!(type_of(&analysis, "m"), "int");

    let (_, errors) = run("const m = -\"text\"");
    assert_eq!(
        type_errors(&errors),
        vec![("string".to_string(), "int".to_string())]
    );
}

#[test]
fn test_function_signature_is_inferred() {
    let (analysis, errors) = run("fn inc(x) { return x + 1 }\nconst r = inc(2)");

    assert!(errors.is_empty(), "{:?}", errors.all_errors());
    assert_eq!(type_of(&analysis, "inc"), "(FN int int)");
    assert_eq!(type_of(&analysis, "r"), "int");
}

#[test]
fn test_call_with_wrong_argument_type_fails() {
    let (_, errors) = run("fn inc(x) { return x + 1 }\nconst r = inc(\"no\")");

    let failures = type_errors(&errors);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "(FN int int)");
    assert!(failures[0].1.starts_with("(FN string 't"), "{}", failures[0].1);
}

#[test]
fn test_call_arity_mismatch_fails() {
    let (_, errors) = run("fn two(a, b) { return a }\nconst r = two(1)");

    assert_eq!(type_errors(&errors).len(), 1);
}

#[test]
fn test_recursive_function() {
    let (analysis, errors) = run("fn count(n) { return count(n - 1) + 1 }");

    assert!(errors.is_empty(), "{:?}", errors.all_errors());
    assert_eq!(type_of(&analysis, "count"), "(FN int int)");
}

#[test]
fn test_polymorphic_identity_stays_generic() {
    let (analysis, errors) = run("fn id(x) { return x }");

    assert!(errors.is_empty());
    let rendered = type_of(&analysis, "id");
    let vars = rendered
        .trim_start_matches("(FN ")
        .trim_end_matches(')')
        .split(' ')
        .collect::<Vec<&str>>();
    assert_eq!(vars.len(), 2);
    assert!(vars[0].starts_with("'t"));
    assert_eq!(vars[0], vars[1], "parameter and result are the same variable");
}

#[test]
fn test_pointers() {
    let (analysis, errors) = run("var a = 5\nconst p = &a\nconst b = *p");

    assert!(errors.is_empty(), "{:?}", errors.all_errors());
    assert_eq!(type_of(&analysis, "p"), "(^ int)");
    assert_eq!(type_of(&analysis, "b"), "int");
}

#[test]
fn test_deref_of_non_pointer_fails() {
    let (_, errors) = run("var a = 5\nconst b = *a");

    let failures = type_errors(&errors);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "int");
    assert!(failures[0].1.starts_with("(^ 't"));
}

#[test]
fn test_self_referential_pointer_fails_occurs_check() {
    let (_, errors) = run("fn f(x) { x = &x }");

    assert_eq!(type_errors(&errors).len(), 1);
}

#[test]
fn test_every_occurrence_shares_the_declaration_type() {
    let (analysis, errors) = run("var a = 1\na = a + 1\nconst b = a");

    assert!(errors.is_empty());
    let decl = declaration(&analysis, "a");
    let expected = analysis.types.node_to_type(decl);
    for (usage, declared) in analysis.names.usages() {
        if *declared == decl {
            assert_eq!(analysis.types.node_to_type(*usage), expected);
        }
    }
}

#[test]
fn test_name_types_match_declaration_types() {
    let (analysis, _) = run("const a = 1\n{ const a = \"inner\" }");

    for node in analysis.names.all_declaration_nodes() {
        let name = analysis.names.node_to_name(*node).expect("declared name");
        assert_eq!(
            analysis.types.type_of_name(name),
            analysis.types.node_to_type(*node)
        );
    }
}

#[test]
fn test_canonicalization_is_idempotent() {
    let (analysis, _) = run(
        "fn inc(x) { return x + 1 }\nvar a = inc(2)\nconst p = &a\nconst ok = *p == 3\nconst bad = 1 + true",
    );

    let types = &analysis.types;
    for index in 0..types.repository().len() {
        let id = TypeId(index as u32);
        let canonical = types.canonical(id);
        assert_eq!(types.canonical(canonical), canonical);
        assert_eq!(types.repository().term(id), types.repository().term(canonical));
        for subtype in types.repository().subtypes(canonical) {
            assert_eq!(types.canonical(subtype), subtype);
        }
    }
}

#[test]
fn test_expression_nodes_are_typed() {
    let (analysis, _) = run("const a = 1 + 2");

    for index in 0..analysis.ast.len() {
        let node = NodeId(index as u32);
        match analysis.ast.tag(node) {
            Tag::Expression | Tag::Add | Tag::IntLiteral | Tag::Identifier => {
                assert_eq!(analysis.types.render_node(node).as_deref(), Some("int"))
            }
            _ => assert_eq!(analysis.types.node_to_type(node), None),
        }
    }
}

#[test]
fn test_unify_directly() {
    let names = QualifiedNameTable::new();
    let mut errors = ErrorHandler::new();
    let mut checker = TypeChecker::new(&names, &mut errors);

    let var = checker.fresh(None);
    let int = checker.base(BaseType::Int);
    let float = checker.base(BaseType::Float);
    assert_eq!(checker.unify(var, int), Ok(()));
    assert_eq!(checker.find(var), checker.find(int));
    assert_eq!(checker.unify(var, float), Err(UnifyError::Mismatch));

    let inner = checker.fresh(None);
    let pointer = checker.pointer(inner);
    assert_eq!(checker.repository().kind(pointer), Kind::Pointer);
    assert_eq!(checker.unify(inner, pointer), Err(UnifyError::Occurs));

    let one = checker.function(&[int]);
    let two = checker.function(&[int, int]);
    assert_eq!(checker.unify(one, two), Err(UnifyError::Arity));

    assert_eq!(checker.render(pointer), format!("(^ 't{})", inner.0));
    assert_eq!(checker.repository().term(int), TypeTerm::Base(BaseType::Int));
}

#[test]
fn test_string_arithmetic_is_accepted() {
    let (analysis, errors) = run("const s = \"a\" + \"b\"");

    assert!(errors.is_empty());
    assert_eq!(type_of(&analysis, "s"), "string");
}

#[test]
fn test_relational_operands_are_unified_with_bool() {
    let (_, errors) = run("const a = 1 < 2");

    assert_eq!(
        type_errors(&errors),
        vec![("int".to_string(), "bool".to_string())]
    );
}
