use wisp::interpreter::Interpreter;
use wisp::value::Value;

#[test]
fn block_shadowing_does_not_leak_outward() {
    let mut interpreter = Interpreter::new();
    let errors = wisp::run(
        &mut interpreter,
        "let x := 10; { let x := 1; print x; }; print x;",
    )
    .unwrap();
    assert!(errors.is_empty());
    // the outer x is unchanged by the shadowed inner binding
    assert!(matches!(interpreter.lookup("x"), Some(Value::Int(10))));
    assert_eq!(interpreter.scope_depth(), 1);
}
