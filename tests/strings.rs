use wisp::interpreter::Interpreter;
use wisp::value::Value;

#[test]
fn string_concatenation_and_equality() {
    let mut interpreter = Interpreter::new();
    let errors = wisp::run(
        &mut interpreter,
        "let s := \"ab\" + \"cd\"; print s; if (s == \"abcd\") print 1; else print 0;",
    )
    .unwrap();
    assert!(errors.is_empty());
    assert!(matches!(interpreter.lookup("s"), Some(Value::String(v)) if v == "abcd"));
}
