use nishimia::{Environment, Object, RuntimeError, eval, parse};
use pretty_assertions::assert_eq;

fn run(source: &str) -> Result<Object, RuntimeError> {
    let (program, errors) = parse(source);
    assert!(errors.is_empty(), "syntax errors in {source:?}: {errors:?}");
    eval(&program, &Environment::new())
}

fn assert_value(source: &str, expected: Object) {
    match run(source) {
        Ok(value) => assert_eq!(value, expected, "{source}"),
        Err(e) => panic!("{source:?} failed: {e}"),
    }
}

fn assert_integer(source: &str, expected: i64) {
    assert_value(source, Object::Integer(expected));
}

fn assert_boolean(source: &str, expected: bool) {
    assert_value(source, Object::Boolean(expected));
}

fn assert_error(source: &str) -> RuntimeError {
    match run(source) {
        Ok(value) => panic!("{source:?} succeeded with {value} but was expected to fail"),
        Err(e) => e,
    }
}

#[test]
fn integer_arithmetic_follows_precedence() {
    let cases = [
        ("10;", 10),
        ("-526;", -526),
        ("+7", 7),
        ("1 + 2 * 3", 7),
        ("(1 + 2) * 3", 9),
        ("2 * 2 * 2 * 2 * 2", 32),
        ("5 + 5 + 5 + 5 - 10", 10),
        ("-50 + 100 + -50", 0),
        ("20 + 2 * -10", 0),
        ("50 / 2 * 2 + 10", 60),
        ("3 * (3 * 3) + 10", 37),
        ("(5 + 10 * 2 + 15 / 3) * 2 + -10", 50),
        ("7 / 2", 3),
        ("-7 / 2", -3),
    ];
    for (source, expected) in cases {
        assert_integer(source, expected);
    }
}

#[test]
fn boolean_expressions() {
    let cases = [
        ("true;", true),
        ("1 < 5;", true),
        ("4 >= 5;", false),
        ("2*2 <= 50;", true),
        ("1 == 1;", true),
        ("1 != 1;", false),
        ("false && false;", false),
        ("false || true;", true),
        ("(true && false) != true;", true),
        ("true == true", true),
        ("!true", false),
        ("!!false", false),
        ("!(if false { 1 })", true),
    ];
    for (source, expected) in cases {
        assert_boolean(source, expected);
    }
}

#[test]
fn boolean_operators_reject_integers() {
    assert_eq!(
        assert_error("1 && true"),
        RuntimeError::TypeMismatch {
            left: "1".into(),
            operator: nishimia::ast::InfixOperator::And,
            right: "true".into(),
            left_type: "INTEGER",
            right_type: "BOOLEAN",
        }
    );
    assert_eq!(
        assert_error("1 || 2").to_string(),
        "invalid operation: 1 || 2 (operator \"||\" not defined on INTEGER)"
    );
    assert_eq!(
        assert_error("true + false").to_string(),
        "invalid operation: true + false (operator \"+\" not defined on BOOLEAN)"
    );
    assert!(matches!(
        assert_error("true < false"),
        RuntimeError::UnknownInfixOperator { .. }
    ));
}

#[test]
fn both_sides_of_logic_operators_are_evaluated() {
    assert!(matches!(
        assert_error("false && missing"),
        RuntimeError::UnknownIdentifier { name } if name == "missing"
    ));
}

#[test]
fn prefix_operators_check_operand_types() {
    let error = assert_error("-true").to_string();
    assert!(error.contains('-') && error.contains("BOOLEAN"), "{error}");
    assert_eq!(
        assert_error("!1").to_string(),
        "invalid operation: !1 (operator \"!\" not defined on INTEGER)"
    );
    assert!(matches!(
        assert_error("+\"a\""),
        RuntimeError::UnknownPrefixOperator {
            operand_type: "STRING",
            ..
        }
    ));
}

#[test]
fn if_requires_a_boolean_condition() {
    assert_eq!(
        assert_error("if (1) { 10 }"),
        RuntimeError::NonBooleanCondition {
            value: "1".into(),
            value_type: "INTEGER",
        }
    );
    assert_integer("if (1 < 2) { 10 } else { 20 }", 10);
    assert_integer("if (1 > 2) { 10 } else { 20 }", 20);
    assert_value("if (1 > 2) { 10 }", Object::Null);
    assert_value("if true { }", Object::Null);
}

#[test]
fn return_unwinds_to_the_top() {
    let cases = [
        ("return 10;", 10),
        ("return 10; 9;", 10),
        ("9; return 2 * 5; 9;", 10),
        ("if (10 > 1) { if (10 > 1) { return 10; } return 1; }", 10),
    ];
    for (source, expected) in cases {
        assert_integer(source, expected);
    }
}

#[test]
fn var_statements_bind_and_produce_null() {
    assert_integer("var a = 5; a;", 5);
    assert_integer("var a = 5 * 5; a;", 25);
    assert_integer("var a = 5; var b = a; var c = a + b + 5; c;", 15);
    assert_value("var a = 5;", Object::Null);
}

#[test]
fn redeclaring_in_the_same_scope_fails() {
    assert_eq!(
        assert_error("var a = 5; var a = 6;"),
        RuntimeError::AlreadyDefined { name: "a".into() }
    );
    assert_eq!(
        assert_error("var f = func(x, x) { return x; }; f(1, 2);"),
        RuntimeError::AlreadyDefined { name: "x".into() }
    );
}

#[test]
fn failed_var_does_not_bind() {
    let env = Environment::new();
    let (program, _) = parse("var a = missing;");
    assert!(eval(&program, &env).is_err());
    assert!(!env.is_defined_locally("a"));

    let (program, _) = parse("var a = 1; a");
    assert_eq!(eval(&program, &env), Ok(Object::Integer(1)));
}

#[test]
fn parameters_shadow_outer_bindings() {
    assert_integer(
        "var x = 10; var f = func(x) { return x * 2; }; var y = f(3); x + y;",
        16,
    );
}

#[test]
fn unknown_identifiers_fail() {
    assert_eq!(
        assert_error("foobar"),
        RuntimeError::UnknownIdentifier {
            name: "foobar".into()
        }
    );
}

#[test]
fn functions_return_only_explicitly() {
    assert_integer("var identity = func(x) { return x; }; identity(5);", 5);
    assert_integer("var double = func(x) { return x * 2; }; double(5);", 10);
    assert_integer("var add = func(x, y) { return x + y; }; add(5 + 5, add(5, 5));", 20);
    assert_integer("func(x) { return x; }(5)", 5);
    assert_value("var noop = func(x) { x; }; noop(5);", Object::Null);
    assert_value("func() { }()", Object::Null);
}

#[test]
fn function_values_print_their_source() {
    assert_eq!(
        run("func(x) { return x + 2; };")
            .expect("function literal")
            .to_string(),
        "func(x) { return (x + 2); }"
    );
}

#[test]
fn return_inside_nested_blocks_stops_at_the_call() {
    assert_integer(
        "var f = func(n) { if (n > 0) { if (true) { return 1; } } return 0; }; f(5) + f(-5) * 10;",
        1,
    );
}

#[test]
fn closures_capture_their_defining_environment() {
    assert_integer(
        "var x = 2;
         var newAdder = func(x) { return func(y) { return x + y; }; };
         var addTwo = newAdder(2);
         addTwo(2);",
        4,
    );
    assert_integer(
        "var newAdder = func(x) { return func(y) { return x + y; }; };
         var addTen = newAdder(10);
         var x = 1000;
         addTen(1);",
        11,
    );
}

#[test]
fn closures_do_not_see_the_callers_scope() {
    assert_eq!(
        assert_error(
            "var peek = func() { return hidden; };
             var wrapper = func(hidden) { return peek(); };
             wrapper(1);"
        ),
        RuntimeError::UnknownIdentifier {
            name: "hidden".into()
        }
    );
}

#[test]
fn recursion_works_through_the_captured_scope() {
    assert_integer(
        "var fib = func(n) { if (n < 2) { return n; } return fib(n - 1) + fib(n - 2); }; fib(15);",
        610,
    );
}

#[test]
fn arity_is_enforced() {
    let two = "var add = func(a, b) { return a + b; };";
    assert_eq!(
        assert_error(&format!("{two} add(1);")),
        RuntimeError::ArityMismatch {
            expected: 2,
            got: 1
        }
    );
    let error = assert_error(&format!("{two} add(1, 2, 3);")).to_string();
    assert!(error.contains('2') && error.contains('3'), "{error}");
}

#[test]
fn arguments_are_checked_before_they_run() {
    assert!(matches!(
        assert_error("var f = func(a) { return a; }; f(missing, 1);"),
        RuntimeError::ArityMismatch { .. }
    ));
    assert!(matches!(
        assert_error("var f = func(a) { return a; }; f(missing);"),
        RuntimeError::UnknownIdentifier { .. }
    ));
}

#[test]
fn only_functions_are_callable() {
    assert_eq!(
        assert_error("5(1)"),
        RuntimeError::NotCallable {
            value: "5".into(),
            value_type: "INTEGER",
        }
    );
}

#[test]
fn string_concatenation() {
    assert_value(
        r#""Hello" + " " + "World!""#,
        Object::String("Hello World!".into()),
    );
    assert_value(
        r#""say \"hi\"""#,
        Object::String("say \"hi\"".into()),
    );
    assert!(matches!(
        assert_error(r#""a" - "b""#),
        RuntimeError::UnknownInfixOperator {
            operand_type: "STRING",
            ..
        }
    ));
    assert!(matches!(
        assert_error(r#""a" == "a""#),
        RuntimeError::UnknownInfixOperator { .. }
    ));
    assert!(matches!(
        assert_error(r#""a" + 1"#),
        RuntimeError::TypeMismatch {
            left_type: "STRING",
            right_type: "INTEGER",
            ..
        }
    ));
}

#[test]
fn integer_edge_cases() {
    assert_eq!(
        assert_error("10 / (5 - 5)"),
        RuntimeError::DivisionByZero { left: 10 }
    );
    assert!(matches!(
        assert_error("9223372036854775807 + 1"),
        RuntimeError::IntegerOverflow { .. }
    ));
    assert!(matches!(
        assert_error("(-9223372036854775807 - 1) / -1"),
        RuntimeError::IntegerOverflow { .. }
    ));
    assert!(matches!(
        assert_error("-(-9223372036854775807 - 1)"),
        RuntimeError::IntegerOverflow { .. }
    ));
}

#[test]
fn array_literals_and_indexing() {
    let array = run("[1, 2 * 2, 3 + 3]").expect("array literal");
    assert_eq!(array.to_string(), "[1, 4, 6]");

    let cases = [
        ("[1, 2, 3][0]", 1),
        ("[1, 2, 3][1 * 2]", 3),
        ("var i = 0; [1][i];", 1),
        ("var myArray = [1, 2, 3]; myArray[0] + myArray[1] + myArray[2];", 6),
        ("[[1, 2], [3, 4]][1][0]", 3),
    ];
    for (source, expected) in cases {
        assert_integer(source, expected);
    }
}

#[test]
fn array_index_is_bounds_checked() {
    assert_eq!(
        assert_error("[1, 2, 3][5]"),
        RuntimeError::IndexOutOfRange {
            index: 5,
            length: 3
        }
    );
    let error = assert_error("[1, 2, 3][5]").to_string();
    assert!(error.contains('5') && error.contains('3'), "{error}");
    assert_eq!(
        assert_error("[1, 2, 3][-1]"),
        RuntimeError::IndexOutOfRange {
            index: -1,
            length: 3
        }
    );
    assert_eq!(
        assert_error("[1][true]"),
        RuntimeError::IndexNotSupported {
            collection_type: "ARRAY",
            index_type: "BOOLEAN",
        }
    );
    assert!(matches!(
        assert_error("5[0]"),
        RuntimeError::IndexNotSupported { .. }
    ));
}

#[test]
fn array_items_short_circuit() {
    assert!(matches!(
        assert_error("[1, missing, 1 / 0]"),
        RuntimeError::UnknownIdentifier { .. }
    ));
}

#[test]
fn hash_literals_and_lookup() {
    assert_integer(r#"{"age": 10}["age"]"#, 10);
    assert_integer(r#"var key = "a"; {"a" + "b": 5}[key + "b"]"#, 5);
    assert_integer("{1: 10, true: 20}[1]", 10);
    assert_integer("{1: 10, true: 20}[true]", 20);
    assert_integer("{false: 1, 0: 2}[0]", 2);
    assert_integer(r#"{"x": 1, "x": 2}["x"]"#, 2);
    assert_eq!(
        run(r#"{"one": 1}"#).expect("hash literal").to_string(),
        "{one: 1}"
    );
}

#[test]
fn hash_lookup_errors() {
    assert_eq!(
        assert_error(r#"{"age": 10}["name"]"#),
        RuntimeError::MissingKey {
            key: "name".into()
        }
    );
    assert_eq!(
        assert_error("{[1]: 2}"),
        RuntimeError::UnhashableKey { key_type: "ARRAY" }
    );
    assert_eq!(
        assert_error(r#"{"a": 1}[func(x) { return x; }]"#),
        RuntimeError::UnhashableKey {
            key_type: "FUNCTION"
        }
    );
}

#[test]
fn builtins_resolve_when_no_binding_exists() {
    assert_integer(r#"len("four")"#, 4);
    assert_integer(r#"len("")"#, 0);
    assert_integer(r#"len("héllo")"#, 6);
    assert_integer("len([1, 2, 3])", 3);
    assert_integer(r#"len({"a": 1})"#, 1);
    assert_integer("first([7, 8])", 7);
    assert_integer("last([7, 8])", 8);
    assert_integer("len(rest([7, 8, 9]))", 2);
    assert_integer("var a = [1]; var b = push(a, 2); len(a) * 10 + len(b)", 12);
    assert_integer("var len = func(x) { return 42; }; len(\"abc\")", 42);
    assert_eq!(
        assert_error("len(1)"),
        RuntimeError::BuiltinArgumentType {
            name: "len",
            got: "INTEGER"
        }
    );
    assert_eq!(
        assert_error(r#"len("one", "two")"#),
        RuntimeError::BuiltinArgumentCount {
            name: "len",
            expected: 1,
            got: 2
        }
    );
}

#[test]
fn errors_stop_the_program() {
    let env = Environment::new();
    let (program, _) = parse("var a = 1; var b = a + true; var c = 3;");
    assert!(matches!(
        eval(&program, &env),
        Err(RuntimeError::TypeMismatch { .. })
    ));
    assert!(env.is_defined_locally("a"));
    assert!(!env.is_defined_locally("b"));
    assert!(!env.is_defined_locally("c"));
}

#[test]
fn errors_pass_through_function_calls() {
    assert_eq!(
        assert_error("var f = func() { var x = 1 / 0; return 1; }; f() + 1;"),
        RuntimeError::DivisionByZero { left: 1 }
    );
}

#[test]
fn nested_null_prints_in_upper_case() {
    assert_eq!(
        run("[if false { 1 }, 2]").expect("array literal").to_string(),
        "[NULL, 2]"
    );
}
