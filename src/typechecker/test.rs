use super::*;
use crate::ast::{Expression, TypeAliases};
use crate::augmenter::augment;
use crate::lexer::lex;
use crate::parser::parse;
use crate::stdlib::{io, standard_library};
use crate::{t_boolean, t_fn, t_integer, t_prim, t_string};

// Parses `input` and checks it together with the standard library.
fn check(input: &str) -> Result<(), TypeCheckError> {
    let augmented = augment(input).expect("test input should augment");
    let program = parse(lex(&augmented).expect("test input should lex")).expect("should parse");
    let mut table = standard_library(io::discard());
    table.extend(program.definitions);
    check_types(&table, &program.type_aliases)
}

fn aliases(entries: &[(&str, &[&str])]) -> TypeAliases {
    entries
        .iter()
        .map(|(name, options)| {
            (
                name.to_string(),
                options.iter().map(|o| o.to_string()).collect(),
            )
        })
        .collect()
}

#[test]
fn test_accepts_hello_world() {
    assert_eq!(check("main:None = printLine \"Hello, world!\""), Ok(()));
}

#[test]
fn test_accepts_nested_builtin_calls() {
    let source = "main:None = printLine (concat \"The answer is: \" (intToStr (plus 40 2)))";
    assert_eq!(check(source), Ok(()));
}

#[test]
fn test_rejects_literal_of_wrong_type() {
    let err = check("foo:Integer = \"hi\"").unwrap_err();
    assert_eq!(err.definition, "foo");
    assert_eq!(
        err.kind,
        TypeErrorKind::Mismatch {
            expected: t_integer!(),
            found: t_string!(),
        }
    );
}

#[test]
fn test_rejects_argument_of_wrong_type() {
    let err = check("foo:Integer = plus 1 true").unwrap_err();
    assert_eq!(
        err.kind,
        TypeErrorKind::Argument {
            callee: "plus".to_string(),
            position: 2,
            expected: t_integer!(),
            found: t_boolean!(),
        }
    );
}

#[test]
fn test_rejects_under_application() {
    let err = check("foo:Integer = plus 1").unwrap_err();
    assert_eq!(
        err.kind,
        TypeErrorKind::Arity {
            callee: "plus".to_string(),
            expected: 2,
            given: 1,
        }
    );
}

#[test]
fn test_rejects_call_result_of_wrong_type() {
    let err = check("foo:String = plus 1 2").unwrap_err();
    assert!(matches!(err.kind, TypeErrorKind::Mismatch { .. }));
}

#[test]
fn test_rejects_mismatched_parameter_in_body() {
    let err = check("f:Integer s:String = plus s 1").unwrap_err();
    assert_eq!(err.definition, "f");
    assert!(matches!(
        err.kind,
        TypeErrorKind::Argument { position: 1, .. }
    ));
}

#[test]
fn test_rejects_wrong_return_type() {
    let err = check("f:String n:Integer = plus n 1").unwrap_err();
    assert_eq!(
        err.kind,
        TypeErrorKind::Mismatch {
            expected: t_string!(),
            found: t_integer!(),
        }
    );
}

#[test]
fn test_accepts_higher_order_functions() {
    let source = "\
apply:Integer f:(Integer -> Integer) v:Integer = f v
square:Integer x:Integer = multiply x x
nine:Integer = apply square 3";
    assert_eq!(check(source), Ok(()));
}

#[test]
fn test_rejects_function_of_wrong_shape() {
    let source = "\
apply:Integer f:(Integer -> Integer) v:Integer = f v
nine:Integer = apply plus 3";
    let err = check(source).unwrap_err();
    assert_eq!(err.definition, "nine");
    assert!(matches!(
        err.kind,
        TypeErrorKind::Argument { position: 1, .. }
    ));
}

#[test]
fn test_accepts_union_values() {
    let source = "\
Foo := union Boolean | Integer
f:Foo = 42
main:Boolean = equal f 42";
    assert_eq!(check(source), Ok(()));
}

#[test]
fn test_unions_with_different_options_do_not_unify() {
    let source = "\
A := union Integer | Boolean
B := union Integer | String
id:A x:A = x
b:B = 1
c:A = id b";
    let err = check(source).unwrap_err();
    assert_eq!(err.definition, "c");
}

#[test]
fn test_unions_with_the_same_options_unify() {
    let source = "\
A := union Integer | Boolean
B := union Boolean | Integer
id:A x:A = x
b:B = true
c:A = id b";
    assert_eq!(check(source), Ok(()));
}

#[test]
fn test_same_type_rules() {
    let table = aliases(&[
        ("IntOrBool", &["Integer", "Boolean"]),
        ("BoolOrInt", &["Boolean", "Integer"]),
        ("IntOrString", &["Integer", "String"]),
        ("JustInt", &["Integer"]),
    ]);
    let same = |a: &str, b: &str| same_type(&table, &t_prim!(a), &t_prim!(b));

    assert!(same("Integer", "Integer"));
    assert!(!same("Integer", "String"));
    assert!(same("Integer", "IntOrBool"));
    assert!(same("IntOrBool", "Boolean"));
    assert!(!same("String", "IntOrBool"));
    assert!(same("IntOrBool", "BoolOrInt"));
    assert!(!same("IntOrBool", "IntOrString"));
    assert!(same("JustInt", "Integer"));
    assert!(same(
        "JustInt",
        "IntOrBool"
    ));
}

#[test]
fn test_same_type_on_functions() {
    let table = aliases(&[("IntOrBool", &["Integer", "Boolean"])]);
    assert!(same_type(
        &table,
        &t_fn!([t_prim!("IntOrBool")] -> t_integer!()),
        &t_fn!([t_integer!()] -> t_integer!()),
    ));
    assert!(!same_type(
        &table,
        &t_fn!([t_integer!()] -> t_integer!()),
        &t_fn!([t_integer!(), t_integer!()] -> t_integer!()),
    ));
    assert!(!same_type(&table, &t_fn!([] -> t_integer!()), &t_integer!()));
}

#[test]
fn test_if_else() {
    assert_eq!(check("x:Integer = ifElse (less 1 2) 1 2"), Ok(()));

    let err = check("x:Integer = ifElse 1 1 2").unwrap_err();
    assert_eq!(err.kind, TypeErrorKind::Condition(t_integer!()));

    let err = check("x:Integer = ifElse true 1 \"a\"").unwrap_err();
    assert_eq!(
        err.kind,
        TypeErrorKind::BranchMismatch {
            then_type: t_integer!(),
            else_type: t_string!(),
        }
    );

    let err = check("x:Integer = ifElse true 1").unwrap_err();
    assert!(matches!(err.kind, TypeErrorKind::Arity { expected: 3, given: 2, .. }));
}

#[test]
fn test_if_else_condition_must_be_exactly_boolean() {
    let source = "\
Flag := union Boolean | Integer
flag:Flag = true
x:Integer = ifElse flag 1 2";
    let err = check(source).unwrap_err();
    assert_eq!(err.definition, "x");
    assert_eq!(err.kind, TypeErrorKind::Condition(t_prim!("Flag")));
}

#[test]
fn test_recursive_function() {
    let source = "\
fib:Integer n:Integer = ifElse (less n 2) n (plus (fib (minus n 1)) (fib (minus n 2)))
main:None = printLine (intToStr (fib 10))";
    assert_eq!(check(source), Ok(()));
}

#[test]
fn test_unknown_name() {
    let err = check("x:Integer = nope").unwrap_err();
    assert_eq!(err.kind, TypeErrorKind::UnknownName("nope".to_string()));
}

#[test]
fn test_not_a_function() {
    let err = check("x:Integer = 1\ny:Integer = x 2").unwrap_err();
    assert_eq!(
        err.kind,
        TypeErrorKind::NotAFunction {
            callee: "x".to_string(),
            found: t_integer!(),
        }
    );
}

#[test]
fn test_nested_definitions_see_parameters() {
    let source = "\
outer:Integer x:Integer = inner
    inner:Integer = plus x 1";
    assert_eq!(check(source), Ok(()));
}

#[test]
fn test_nested_errors_name_the_inner_definition() {
    let source = "\
outer:Integer x:Integer = inner
    inner:Integer = plus x \"a\"";
    let err = check(source).unwrap_err();
    assert_eq!(err.definition, "outer.inner");
}

#[test]
fn test_nested_definition_shadows_global() {
    let source = "\
value:String = \"global\"
outer:Integer = value
    value:Integer = 1";
    assert_eq!(check(source), Ok(()));
}

#[test]
fn test_qualified_name() {
    let source = "\
outer:Integer = 1
    inner:String = \"s\"
reached:String = outer.inner";
    assert_eq!(check(source), Ok(()));
}

#[test]
fn test_function_locals_are_not_reachable_by_qualified_name() {
    let source = "\
outer:Integer x:Integer = inner
    inner:Integer = plus x 1
main:None = printLine (intToStr outer.inner)";
    let err = check(source).unwrap_err();
    assert_eq!(err.definition, "main");
    assert_eq!(
        err.kind,
        TypeErrorKind::UnknownName("outer.inner".to_string())
    );
}

#[test]
fn test_struct_constructor_and_accessors() {
    let source = "\
Foo := struct x:Integer y:Boolean
foo:Foo = Foo 42 true
b:Boolean = Foo.y foo";
    assert_eq!(check(source), Ok(()));

    let err = check(&format!("{source}\nbad:Integer = Foo.y foo")).unwrap_err();
    assert_eq!(err.definition, "bad");
}

#[test]
fn test_malformed_signatures() {
    let no_aliases = TypeAliases::new();
    let mut table = Definitions::new();
    table.insert(
        "f".to_string(),
        Definition::CompoundFunction {
            type_sig: t_integer!(),
            parameters: vec!["x".to_string()],
            body: Expression::variable("x"),
            sub_definitions: Definitions::new(),
        },
    );
    let err = check_types(&table, &no_aliases).unwrap_err();
    assert_eq!(err.kind, TypeErrorKind::MalformedSignature(t_integer!()));

    table.insert(
        "f".to_string(),
        Definition::CompoundFunction {
            type_sig: t_fn!([t_integer!(), t_integer!()] -> t_integer!()),
            parameters: vec!["x".to_string()],
            body: Expression::variable("x"),
            sub_definitions: Definitions::new(),
        },
    );
    let err = check_types(&table, &no_aliases).unwrap_err();
    assert_eq!(
        err.kind,
        TypeErrorKind::ParameterCount {
            signature: 2,
            parameters: 1,
        }
    );
}
