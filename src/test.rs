use std::sync::{Arc, Mutex};

use super::*;
use crate::interpreter::{base_environment, evaluate};
use crate::typechecker::TypeErrorKind;

const ANSWER: &str = r#"
main:None = printLine message
message:String = concat "Hello, world!" (concat "\n" answerSentence)
answerSentence:String = tellFact "answer" theAnswer
theAnswer:String = ifElse true fourtyTwoRepr "No."
tellFact:String name:String value:String = concat "The " (concat name (concat " is: " value))
fourtyTwoRepr:String = intToStr fourtyTwo
fourtyTwo:Integer = plus fourteen (plus 15 thirteen)
thirteen:Integer = divide (plus (modulo 29 19) (plus (fib 8) sixty)) 7
fib:Integer n:Integer = ifElse (less n 2) n (plus (fib (minus n 1)) (fib (minus n 2)))
sixty:Integer = plus (multiply 10 (TwoDigitNumber.tens weirdSixty)) (TwoDigitNumber.ones weirdSixty)
TwoDigitNumber := struct tens:Integer ones:Integer
weirdSixty:TwoDigitNumber = TwoDigitNumber 6 0
fourteen:Integer = sum (map oneTwoThree square)
oneTwoThree:IntList = IntListElem 1 (IntListElem 2 (IntListElem 3 none))
IntListElem := struct head:Integer tail:IntList
IntList := union None | IntListElem
sum:Integer xs:IntList = foldr plus 0 xs
map:IntList xs:IntList f:(Integer -> Integer) = ifElse (equal xs none) none (IntListElem (f (IntListElem.head xs)) (map (IntListElem.tail xs) f))
foldr:Integer f:(Integer, Integer -> Integer) acc:Integer xs:IntList = ifElse (equal xs none) acc (f (IntListElem.head xs) (foldr f acc (IntListElem.tail xs)))
square:Integer x:Integer = multiply x x"#;

fn capture() -> (Arc<Mutex<Vec<u8>>>, Output) {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let output: Output = buffer.clone();
    (buffer, output)
}

fn printed(buffer: &Mutex<Vec<u8>>) -> String {
    String::from_utf8(buffer.lock().unwrap().clone()).unwrap()
}

#[test]
fn test_end_to_end_message() {
    let program = compile(ANSWER).unwrap();
    let environment = base_environment(&standard_library(io::discard()), &program.definitions);
    let message = evaluate(&environment, &compile_expression("message").unwrap());
    assert_eq!(
        message,
        Ok(Expression::string("Hello, world!\nThe answer is: 42"))
    );
}

#[test]
fn test_end_to_end_run() {
    let (buffer, output) = capture();
    let options = Options {
        check_types: false,
        ..Options::default()
    };
    assert_eq!(run(ANSWER, &options, output), Ok(Expression::none()));
    assert_eq!(printed(&buffer), "Hello, world!\nThe answer is: 42\n");
}

#[test]
fn test_checked_hello_world() {
    let (buffer, output) = capture();
    let source = "\
# prints a greeting
main:None = printLine greeting
    greeting:String = concat \"Hello, \" name
        name:String = \"world!\"";
    assert_eq!(
        run(source, &Options::default(), output),
        Ok(Expression::none())
    );
    assert_eq!(printed(&buffer), "Hello, world!\n");
}

#[test]
fn test_type_errors_stop_the_run() {
    let (buffer, output) = capture();
    let source = "\
main:None = printLine (intToStr answer)
answer:Integer = \"forty-two\"";
    let err = run(source, &Options::default(), output).unwrap_err();
    assert!(matches!(
        err,
        Error::Type(TypeCheckError {
            kind: TypeErrorKind::Mismatch { .. },
            ..
        })
    ));
    assert!(printed(&buffer).is_empty());
}

#[test]
fn test_errors_from_every_stage() {
    let run_unchecked = |source: &str| {
        let options = Options {
            check_types: false,
            ..Options::default()
        };
        run(source, &options, io::discard())
    };

    assert!(matches!(run_unchecked("a\n\tb"), Err(Error::Augment(_))));
    assert!(matches!(run_unchecked("a:Integer = @"), Err(Error::Lex(_))));
    assert!(matches!(run_unchecked("a:Integer ="), Err(Error::Parse(_))));
    assert!(matches!(
        run_unchecked("main:None = printLine (intToStr (divide 1 0))"),
        Err(Error::Eval(EvalError::DynamicKind { .. }))
    ));
    assert_eq!(
        run_unchecked("a:Integer = 1"),
        Err(Error::Eval(EvalError::MissingMain))
    );
}

#[test]
fn test_recursion_limit_is_configurable() {
    let source = "\
spin:Integer n:Integer = spin n
main:None = printLine (intToStr (spin 1))";
    let options = Options {
        check_types: true,
        max_depth: 100,
    };
    assert_eq!(
        run(source, &options, io::discard()),
        Err(Error::Eval(EvalError::RecursionLimitExceeded(100)))
    );
}

#[test]
fn test_default_options_stop_runaway_recursion() {
    let source = "\
spin:Integer n:Integer = spin n
main:None = printLine (intToStr (spin 1))";
    assert_eq!(
        run(source, &Options::default(), io::discard()),
        Err(Error::Eval(EvalError::RecursionLimitExceeded(
            DEFAULT_MAX_DEPTH
        )))
    );
}

#[test]
fn test_checked_programs_do_not_reach_into_functions() {
    let source = "\
outer:Integer x:Integer = inner
    inner:Integer = plus x 1
main:None = printLine (intToStr outer.inner)";
    let err = run(source, &Options::default(), io::discard()).unwrap_err();
    assert!(matches!(
        err,
        Error::Type(TypeCheckError {
            kind: TypeErrorKind::UnknownName(_),
            ..
        })
    ));
}

#[test]
fn test_check_reports_the_failing_definition() {
    let program = compile("foo:Integer = plus 1").unwrap();
    let Err(Error::Type(err)) = check(&program) else {
        panic!("under-application should not type check");
    };
    assert_eq!(err.definition, "foo");
}

#[test]
fn test_span_errors_have_reports() {
    let err = compile("a:Integer = @").unwrap_err();
    assert!(err.report("test.bd").is_some());
    let err = compile("a:Integer =").unwrap_err();
    assert!(err.report("test.bd").is_some());
    let err = compile("a\n   b").unwrap_err();
    assert!(err.report("test.bd").is_none());
}
