use super::*;
use crate::{t_boolean, t_fn, t_integer, t_prim, t_string};

#[test]
fn test_type_signature_display() {
    assert_eq!(t_integer!().to_string(), "Integer");
    assert_eq!(
        t_fn!([t_integer!(), t_boolean!()] -> t_string!()).to_string(),
        "(Integer, Boolean -> String)"
    );
    assert_eq!(
        t_fn!([t_fn!([t_integer!()] -> t_integer!())] -> t_integer!()).to_string(),
        "((Integer -> Integer) -> Integer)"
    );
    assert_eq!(
        TypeSignature::Sum {
            options: vec![t_integer!(), t_prim!("Foo")]
        }
        .to_string(),
        "union Integer | Foo"
    );
    assert_eq!(
        TypeSignature::Struct {
            fields: vec![("x".to_string(), t_integer!())]
        }
        .to_string(),
        "struct x:Integer"
    );
}

#[test]
fn test_expression_display() {
    let call = Expression::call(
        Expression::variable("plus"),
        vec![Expression::integer(1), Expression::string("a\"b")],
    );
    assert_eq!(call.to_string(), "(plus 1 \"a\\\"b\")");
    assert_eq!(Expression::none().to_string(), "none");
    assert_eq!(Expression::boolean(false).to_string(), "false");
}

#[test]
fn test_normal_forms() {
    assert!(Expression::integer(1).is_normal_form());
    assert!(!Expression::variable("x").is_normal_form());
    assert!(!Expression::call(Expression::variable("f"), vec![]).is_normal_form());
}

#[test]
fn test_record_fields() {
    let record = Record {
        type_name: "Point".to_string(),
        fields: vec![
            ("x".to_string(), Expression::integer(1)),
            ("y".to_string(), Expression::integer(2)),
        ],
    };
    assert_eq!(record.field("y"), Some(&Expression::integer(2)));
    assert_eq!(record.field("z"), None);
}

#[test]
fn test_definitions_flatten_into_bindings() {
    let mut inner = Definitions::new();
    inner.insert(
        "helper".to_string(),
        Definition::Constant {
            type_sig: t_integer!(),
            expression: Expression::integer(3),
            sub_definitions: Definitions::new(),
        },
    );

    let mut definitions = Definitions::new();
    definitions.insert(
        "plain".to_string(),
        Definition::Constant {
            type_sig: t_integer!(),
            expression: Expression::integer(1),
            sub_definitions: Definitions::new(),
        },
    );
    definitions.insert(
        "scoped".to_string(),
        Definition::Constant {
            type_sig: t_integer!(),
            expression: Expression::variable("helper"),
            sub_definitions: inner.clone(),
        },
    );
    definitions.insert(
        "function".to_string(),
        Definition::CompoundFunction {
            type_sig: t_fn!([t_integer!()] -> t_integer!()),
            parameters: vec!["x".to_string()],
            body: Expression::variable("x"),
            sub_definitions: inner,
        },
    );

    let bindings = flatten(&definitions);
    assert_eq!(bindings["plain"], Expression::integer(1));
    let Expression::Scope { locals, body } = &bindings["scoped"] else {
        panic!("a constant with nested definitions should become a scope");
    };
    assert_eq!(**body, Expression::variable("helper"));
    assert_eq!(locals["helper"], Expression::integer(3));
    let Expression::Function(lambda) = &bindings["function"] else {
        panic!("a compound function should become a lambda");
    };
    assert_eq!(lambda.parameters, vec!["x".to_string()]);
    assert!(lambda.locals.contains_key("helper"));
}

#[test]
fn test_primitive_closures_compare_by_implementation() {
    let implementation: NativeFn = Arc::new(|_: &[Expression]| -> Result<Expression, EvalError> {
        Ok(Expression::none())
    });
    let definition = Definition::PrimitiveFunction {
        type_sig: t_fn!([t_integer!()] -> t_integer!()),
        parameters: vec!["x".to_string()],
        implementation,
    };
    assert_eq!(
        definition.to_expression("f"),
        definition.to_expression("f")
    );
    assert_eq!(definition.to_expression("f").to_string(), "<builtin f/1>");

    let other = Definition::PrimitiveFunction {
        type_sig: t_fn!([t_integer!()] -> t_integer!()),
        parameters: vec!["x".to_string()],
        implementation: Arc::new(|_: &[Expression]| -> Result<Expression, EvalError> {
            Ok(Expression::none())
        }),
    };
    assert_ne!(definition.to_expression("f"), other.to_expression("f"));
}
