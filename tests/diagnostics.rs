use wisp::interpreter::Interpreter;
use wisp::PipelineError;

#[test]
fn empty_source_parses_to_no_statements_and_prints_nothing() {
    let stmts = wisp::parse_source("   // just whitespace and a comment\n").unwrap();
    assert!(stmts.is_empty());
}

#[test]
fn lexer_error_reports_first_offending_offset() {
    let err = wisp::parse_source("let x := 1; @").unwrap_err();
    let PipelineError::Lex(e) = err else {
        panic!("expected a lex error");
    };
    assert_eq!(e.offset, 12);
}

#[test]
fn parser_errors_suppress_evaluation_of_the_whole_batch() {
    let mut interpreter = Interpreter::new();
    let err = wisp::run(&mut interpreter, "let x 1;").unwrap_err();
    assert!(matches!(err, PipelineError::Parse(_)));
    assert!(interpreter.lookup("x").is_none());
}

#[test]
fn runtime_error_in_one_statement_does_not_stop_the_batch() {
    let mut interpreter = Interpreter::new();
    let errors = wisp::run(&mut interpreter, "missing := 1; let y := 2;").unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "Symbol does not exist error");
    assert!(interpreter.lookup("y").is_some());
}

#[test]
fn integer_division_by_zero_is_a_runtime_error() {
    let mut interpreter = Interpreter::new();
    let errors = wisp::run(&mut interpreter, "let x := 1 / 0;").unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "Division by zero");
}
