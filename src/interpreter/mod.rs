//! Tree-walking evaluator.
//!
//! Drives the scope stack and the function table. Non-local `Return` is
//! threaded through a `Flow` result rather than unwound with a native
//! exception (the original throws a `shared_ptr<Value>` that every enclosing
//! block's visitor catches just long enough to pop its own scope and
//! rethrow) — `Flow::Return` propagates the same way, and every scope that
//! was pushed still gets popped on the way out.

use std::collections::HashMap;
use std::io::{self, Write};

use log::{debug, trace};

use crate::ast::{Expr, Stmt, UnaryOp};
use crate::error::RuntimeError;
use crate::scope::ScopeManager;
use crate::value::Value;

#[derive(Clone)]
struct Function {
    params: Vec<String>,
    body: Stmt,
}

/// The result of evaluating one statement: either it ran to completion, or
/// it's a `Return` that must keep propagating until a call frame consumes it.
enum Flow {
    Normal(Value),
    Return(Value),
}

pub struct Interpreter {
    scopes: ScopeManager,
    functions: HashMap<String, Function>,
    call_depth: u32,
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            scopes: ScopeManager::new(),
            functions: HashMap::new(),
            call_depth: 0,
        }
    }

    /// Scope depth, exposed for the (Scope balance) invariant in tests: it
    /// must equal the post-construction depth after every top-level
    /// statement.
    pub fn scope_depth(&self) -> usize {
        self.scopes.depth()
    }

    /// Looks up a variable visible at the current scope depth and returns
    /// its dereferenced value. Mainly useful for embedding and tests; the
    /// language itself only ever exposes bindings through `print`.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.scopes.get_variable(name).map(|cell| cell.borrow().deref())
    }

    /// Evaluates one already-parsed top-level statement. A runtime error
    /// here short-circuits only this statement — callers decide whether to
    /// keep evaluating the rest of the batch.
    pub fn eval_top_level(&mut self, stmt: &Stmt) -> Result<(), RuntimeError> {
        self.eval_stmt(stmt)?;
        Ok(())
    }

    fn eval_stmt(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        match stmt {
            Stmt::Expr(expr, _) => {
                self.eval_expr(expr)?;
                Ok(Flow::Normal(Value::Void))
            }
            Stmt::Let(name, expr, _) => {
                let value = self.eval_expr(expr)?.deref();
                trace!("let {name} := {value}");
                self.scopes.add_variable(name.clone(), value);
                Ok(Flow::Normal(Value::Void))
            }
            Stmt::Assignment(name, expr, _) => {
                let value = self.eval_expr(expr)?.deref();
                self.scopes.assign(name, value)?;
                Ok(Flow::Normal(Value::Void))
            }
            Stmt::If(cond, then_branch, else_branch, _) => {
                if self.eval_expr(cond)?.is_truthy()? {
                    self.eval_stmt(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.eval_stmt(else_branch)
                } else {
                    Ok(Flow::Normal(Value::Void))
                }
            }
            Stmt::While(cond, body, _) => {
                while self.eval_expr(cond)?.is_truthy()? {
                    if let Flow::Return(value) = self.eval_stmt(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal(Value::Void))
            }
            Stmt::Print(expr, _) => {
                let repr = self.eval_expr(expr)?.display_repr()?;
                println!(">> {repr}");
                io::stdout().flush().ok();
                Ok(Flow::Normal(Value::Void))
            }
            Stmt::Block(stmts, _) => {
                self.scopes.push_scope();
                let result = self.eval_block(stmts);
                self.scopes.pop_scope();
                result
            }
            Stmt::Function(name, params, body, _) => {
                debug!("defining function {name}/{}", params.len());
                self.functions.insert(
                    name.clone(),
                    Function {
                        params: params.clone(),
                        body: (**body).clone(),
                    },
                );
                Ok(Flow::Normal(Value::Void))
            }
            Stmt::Return(expr, _) => {
                if self.call_depth == 0 {
                    return Err(RuntimeError::new("Cannot return outside function"));
                }
                let value = match expr {
                    Some(expr) => self.eval_expr(expr)?.deref(),
                    None => Value::Void,
                };
                Ok(Flow::Return(value))
            }
        }
    }

    fn eval_block(&mut self, stmts: &[Stmt]) -> Result<Flow, RuntimeError> {
        for stmt in stmts {
            if let Flow::Return(value) = self.eval_stmt(stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal(Value::Void))
    }

    fn eval_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Identifier(name) => {
                let cell = self
                    .scopes
                    .get_variable(name)
                    .ok_or_else(|| RuntimeError::new("Symbol does not exist error"))?;
                Ok(Value::Reference(cell))
            }
            Expr::Unary(UnaryOp::Neg, operand) => self.eval_expr(operand)?.negate(),
            Expr::Binary(op, lhs, rhs) => {
                let lhs = self.eval_expr(lhs)?;
                let rhs = self.eval_expr(rhs)?;
                Value::binary(*op, &lhs, &rhs)
            }
            Expr::Cast(target, expr) => self.eval_expr(expr)?.cast(*target),
            Expr::Input => {
                print!("Input: ");
                io::stdout().flush().ok();
                let mut line = String::new();
                io::stdin()
                    .read_line(&mut line)
                    .map_err(|e| RuntimeError::new(format!("Failed to read input: {e}")))?;
                let line = line.trim_end_matches(['\n', '\r']).to_string();
                Ok(Value::String(line))
            }
            Expr::Call(name, arg_exprs) => self.eval_call(name, arg_exprs),
        }
    }

    fn eval_call(&mut self, name: &str, arg_exprs: &[Expr]) -> Result<Value, RuntimeError> {
        let function = self
            .functions
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::new("Function does not exist"))?;

        if function.params.len() != arg_exprs.len() {
            return Err(RuntimeError::new(
                "Incorrect number of arguments in function call",
            ));
        }

        // Evaluate every actual, fully dereferenced, before binding any
        // parameter — otherwise `f(x + 1, x)` could observe the new value of
        // `x` from the first argument while evaluating the second.
        let mut actuals = Vec::with_capacity(arg_exprs.len());
        for arg in arg_exprs {
            actuals.push(self.eval_expr(arg)?.deref());
        }

        self.scopes.push_scope();
        self.call_depth += 1;
        for (param, value) in function.params.iter().zip(actuals) {
            self.scopes.add_variable(param.clone(), value);
        }

        let result = self.eval_stmt(&function.body);

        self.call_depth -= 1;
        self.scopes.pop_scope();

        match result? {
            Flow::Return(value) => Ok(value),
            Flow::Normal(_) => Ok(Value::Void),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn run(src: &str) -> Interpreter {
        let tokens = Lexer::tokenize(src).expect("lex");
        let stmts = Parser::parse(&tokens).expect("parse");
        let mut interpreter = Interpreter::new();
        for stmt in &stmts {
            interpreter.eval_top_level(stmt).expect("eval");
        }
        interpreter
    }

    #[test]
    fn scope_balance_holds_after_evaluation() {
        let interpreter = run("let x := 1; { let y := 2; };");
        assert_eq!(interpreter.scope_depth(), 1);
    }

    #[test]
    fn let_in_block_is_invisible_outside() {
        let mut interpreter = Interpreter::new();
        let tokens = Lexer::tokenize("let x := 10; { let x := 1; }; x := 99;").unwrap();
        let stmts = Parser::parse(&tokens).unwrap();
        for stmt in &stmts {
            interpreter.eval_top_level(stmt).unwrap();
        }
        // the block's x never leaked out, so this assigns the outer x
        assert_eq!(interpreter.scope_depth(), 1);
    }

    #[test]
    fn call_isolation_hides_function_locals_from_caller() {
        let tokens = Lexer::tokenize("fn f() { let secret := 1; }; f(); secret := 2;").unwrap();
        let stmts = Parser::parse(&tokens).unwrap();
        let mut interpreter = Interpreter::new();
        interpreter.eval_top_level(&stmts[0]).unwrap();
        interpreter.eval_top_level(&stmts[1]).unwrap();
        let err = interpreter.eval_top_level(&stmts[2]).unwrap_err();
        assert_eq!(err.message, "Symbol does not exist error");
    }

    #[test]
    fn return_outside_function_errors() {
        let tokens = Lexer::tokenize("ret 1;").unwrap();
        let stmts = Parser::parse(&tokens).unwrap();
        let mut interpreter = Interpreter::new();
        let err = interpreter.eval_top_level(&stmts[0]).unwrap_err();
        assert_eq!(err.message, "Cannot return outside function");
    }

    #[test]
    fn recursive_function_call_works() {
        let tokens = Lexer::tokenize(
            "fn fact(n) { if (n <= 1) ret 1; else ret n * fact(n - 1); }; let r := fact(5);",
        )
        .unwrap();
        let stmts = Parser::parse(&tokens).unwrap();
        let mut interpreter = Interpreter::new();
        for stmt in &stmts {
            interpreter.eval_top_level(stmt).unwrap();
        }
        let r = interpreter.scopes.get_variable("r").unwrap();
        assert!(matches!(&*r.borrow(), Value::Int(120)));
    }

    #[test]
    fn function_redefinition_overwrites() {
        let tokens = Lexer::tokenize(
            "fn f() { ret 1; }; fn f() { ret 2; }; let r := f();",
        )
        .unwrap();
        let stmts = Parser::parse(&tokens).unwrap();
        let mut interpreter = Interpreter::new();
        for stmt in &stmts {
            interpreter.eval_top_level(stmt).unwrap();
        }
        let r = interpreter.scopes.get_variable("r").unwrap();
        assert!(matches!(&*r.borrow(), Value::Int(2)));
    }

    #[test]
    fn arity_mismatch_errors() {
        let tokens = Lexer::tokenize("fn f(a) { ret a; }; f();").unwrap();
        let stmts = Parser::parse(&tokens).unwrap();
        let mut interpreter = Interpreter::new();
        interpreter.eval_top_level(&stmts[0]).unwrap();
        let err = interpreter.eval_top_level(&stmts[1]).unwrap_err();
        assert_eq!(err.message, "Incorrect number of arguments in function call");
    }

    #[test]
    fn argument_evaluation_order_is_left_to_right_and_pre_bound() {
        let tokens = Lexer::tokenize(
            "fn f(a, b) { ret a * 100 + b; }; let x := 1; let r := f(x + 1, x);",
        )
        .unwrap();
        let stmts = Parser::parse(&tokens).unwrap();
        let mut interpreter = Interpreter::new();
        for stmt in &stmts {
            interpreter.eval_top_level(stmt).unwrap();
        }
        // second actual `x` must see the *original* x (1), not x+1 from the
        // first actual having already been bound to parameter `a`.
        let r = interpreter.scopes.get_variable("r").unwrap();
        assert!(matches!(&*r.borrow(), Value::Int(201)));
    }

    #[test]
    fn while_false_runs_zero_iterations() {
        let tokens = Lexer::tokenize("let i := 0; while (1 < 0) { i := i + 1; };").unwrap();
        let stmts = Parser::parse(&tokens).unwrap();
        let mut interpreter = Interpreter::new();
        for stmt in &stmts {
            interpreter.eval_top_level(stmt).unwrap();
        }
        let i = interpreter.scopes.get_variable("i").unwrap();
        assert!(matches!(&*i.borrow(), Value::Int(0)));
    }

    #[test]
    fn assignment_preserves_cell_identity() {
        let tokens = Lexer::tokenize("let x := 1; x := 2;").unwrap();
        let stmts = Parser::parse(&tokens).unwrap();
        let mut interpreter = Interpreter::new();
        let before = {
            interpreter.eval_top_level(&stmts[0]).unwrap();
            interpreter.scopes.get_variable("x").unwrap()
        };
        interpreter.eval_top_level(&stmts[1]).unwrap();
        let after = interpreter.scopes.get_variable("x").unwrap();
        assert!(std::rc::Rc::ptr_eq(&before, &after));
    }
}
