use wisp::interpreter::Interpreter;
use wisp::value::Value;

#[test]
fn operator_precedence_matches_product_over_sum() {
    let mut interpreter = Interpreter::new();
    let errors = wisp::run(&mut interpreter, "let x := 2 + 3 * 4; print x;").unwrap();
    assert!(errors.is_empty());
    assert!(matches!(interpreter.lookup("x"), Some(Value::Int(14))));
}
