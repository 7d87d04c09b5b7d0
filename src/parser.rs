//! Recursive-descent parser with a backtracking "try" primitive.
//!
//! Backtracking is just cursor save/restore around a sub-parse — the same
//! shape as the teacher's `Comb::Either` (`src/parser/combinators.rs`): run
//! the left alternative, and if it fails, rewind the cursor and run the
//! right one instead of threading a lookahead buffer.

use log::trace;

use crate::ast::{Expr, Stmt, UnaryOp};
use crate::error::ParseError;
use crate::token::{Literal, Offset, Token, TokenKind};
use crate::value::{BinaryOp, CastTarget, Value};

pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    diagnostics: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            diagnostics: Vec::new(),
        }
    }

    pub fn parse(tokens: &'a [Token]) -> Result<Vec<Stmt>, Vec<ParseError>> {
        Self::new(tokens).run()
    }

    fn run(mut self) -> Result<Vec<Stmt>, Vec<ParseError>> {
        let mut stmts = Vec::new();
        while !self.at_eof() {
            match self.parse_top_level() {
                Ok(stmt) => {
                    // A compound statement (block/if/while/function) may have
                    // already consumed its own trailing ';' while parsing a
                    // leaf branch (e.g. the ';' between an if's then-branch
                    // and "else"); only complain when one never showed up and
                    // there's more source left to separate from.
                    if !self.skip_terminator() && !self.at_eof() {
                        let offset = self.peek_offset();
                        self.diagnostics
                            .push(ParseError { message: "Expected ';'".into(), offset });
                        self.resync();
                    }
                    stmts.push(stmt);
                }
                Err(e) => {
                    self.diagnostics.push(e);
                    self.resync();
                }
            }
        }

        trace!(
            "parsed {} top-level statements, {} diagnostics",
            stmts.len(),
            self.diagnostics.len()
        );

        if self.diagnostics.is_empty() {
            Ok(stmts)
        } else {
            Err(self.diagnostics)
        }
    }

    fn resync(&mut self) {
        while !self.at_eof() && !self.check_special(";") {
            self.pos += 1;
        }
        if self.check_special(";") {
            self.pos += 1;
        }
    }

    // --- cursor / lookahead ---------------------------------------------

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_ahead(&self, n: usize) -> &Token {
        &self.tokens[(self.pos + n).min(self.tokens.len() - 1)]
    }

    fn peek_offset(&self) -> Offset {
        self.peek().offset
    }

    fn at_eof(&self) -> bool {
        self.peek().is_kind(TokenKind::Eof)
    }

    fn check_special(&self, lexeme: &str) -> bool {
        self.peek().is(TokenKind::Special, lexeme)
    }

    fn check_keyword(&self, lexeme: &str) -> bool {
        self.peek().is(TokenKind::Keyword, lexeme)
    }

    fn check_kind(&self, kind: TokenKind) -> bool {
        self.peek().is_kind(kind)
    }

    fn get_index(&self) -> usize {
        self.pos
    }

    fn set_index(&mut self, index: usize) {
        self.pos = index;
    }

    /// Speculatively runs `f`; on failure the cursor is restored as if it
    /// had never been called.
    fn try_parse<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, ParseError>) -> Option<T> {
        let save = self.get_index();
        match f(self) {
            Ok(value) => Some(value),
            Err(_) => {
                self.set_index(save);
                None
            }
        }
    }

    fn error_here(&self, message: &str) -> ParseError {
        ParseError {
            message: message.into(),
            offset: self.peek_offset(),
        }
    }

    /// Consumes a trailing ';' if one is present. Statement terminators are
    /// only ever mandatory in list contexts (program/block); this is used at
    /// those list boundaries, where an already-consumed terminator (e.g. the
    /// one between an if's then-branch and "else") is fine to just skip.
    fn skip_terminator(&mut self) -> bool {
        self.match_special(";")
    }

    /// Consumes the ';' between an if's then-branch and "else", if and only
    /// if "else" actually follows it. A bare (non-block) then-branch inside a
    /// block/program list is itself followed by that list's own mandatory
    /// separator, so this must never swallow a terminator that belongs to
    /// the enclosing list instead.
    fn skip_terminator_before_else(&mut self) -> bool {
        if self.check_special(";") && self.peek_ahead(1).is(TokenKind::Keyword, "else") {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn match_special(&mut self, lexeme: &str) -> bool {
        if self.check_special(lexeme) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn match_keyword(&mut self, lexeme: &str) -> bool {
        if self.check_keyword(lexeme) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn match_operator_one_of(&mut self, options: &[&str]) -> Option<String> {
        if self.peek().is_kind(TokenKind::Operator) && options.contains(&self.peek().lexeme.as_str()) {
            let lexeme = self.peek().lexeme.clone();
            self.pos += 1;
            Some(lexeme)
        } else {
            None
        }
    }

    fn expect_special(&mut self, lexeme: &str) -> Result<Offset, ParseError> {
        if self.check_special(lexeme) {
            let offset = self.peek_offset();
            self.pos += 1;
            Ok(offset)
        } else {
            Err(self.error_here(&format!("Expected '{lexeme}'")))
        }
    }

    fn expect_keyword(&mut self, lexeme: &str) -> Result<Offset, ParseError> {
        if self.check_keyword(lexeme) {
            let offset = self.peek_offset();
            self.pos += 1;
            Ok(offset)
        } else {
            Err(self.error_here(&format!("Expected '{lexeme}'")))
        }
    }

    fn expect_operator(&mut self, lexeme: &str) -> Result<Offset, ParseError> {
        if self.peek().is(TokenKind::Operator, lexeme) {
            let offset = self.peek_offset();
            self.pos += 1;
            Ok(offset)
        } else {
            Err(self.error_here(&format!("Expected '{lexeme}'")))
        }
    }

    fn expect_identifier(&mut self) -> Result<String, ParseError> {
        if self.check_kind(TokenKind::Identifier) {
            let name = self.peek().lexeme.clone();
            self.pos += 1;
            Ok(name)
        } else {
            Err(self.error_here("Expected identifier"))
        }
    }

    fn expect_type(&mut self) -> Result<CastTarget, ParseError> {
        if self.check_kind(TokenKind::Type) {
            let target = CastTarget::from_type_name(&self.peek().lexeme)
                .expect("lexer only emits TokenKind::Type for known type names");
            self.pos += 1;
            Ok(target)
        } else {
            Err(self.error_here("Expected type"))
        }
    }

    // --- grammar -----------------------------------------------------------

    fn parse_top_level(&mut self) -> Result<Stmt, ParseError> {
        if self.check_keyword("fn") {
            self.parse_function_def()
        } else {
            self.parse_stmt()
        }
    }

    fn parse_function_def(&mut self) -> Result<Stmt, ParseError> {
        let offset = self.expect_keyword("fn")?;
        let name = self.expect_identifier()?;
        self.expect_special("(")?;
        let mut args = Vec::new();
        if !self.check_special(")") {
            args.push(self.expect_identifier()?);
            while self.match_special(",") {
                args.push(self.expect_identifier()?);
            }
        }
        self.expect_special(")")?;
        let body = self.parse_block()?;
        Ok(Stmt::Function(name, args, Box::new(body), offset))
    }

    fn parse_block(&mut self) -> Result<Stmt, ParseError> {
        let offset = self.expect_special("{")?;
        let mut stmts = Vec::new();
        while !self.check_special("}") {
            if self.at_eof() {
                return Err(self.error_here("Expected '}'"));
            }
            let stmt = self.parse_stmt()?;
            self.expect_special(";")?;
            stmts.push(stmt);
        }
        self.expect_special("}")?;
        Ok(Stmt::Block(stmts, offset))
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        if self.check_special("{") {
            return self.parse_block();
        }
        if self.check_keyword("print") {
            return self.parse_print();
        }
        if self.check_keyword("ret") {
            return self.parse_return();
        }
        if self.check_keyword("let") {
            return self.parse_let();
        }
        if self.check_keyword("if") {
            return self.parse_if();
        }
        if self.check_keyword("while") {
            return self.parse_while();
        }
        if let Some(stmt) = self.try_parse(Self::parse_assignment) {
            return Ok(stmt);
        }

        let offset = self.peek_offset();
        let expr = self.parse_expr()?;
        Ok(Stmt::Expr(expr, offset))
    }

    fn parse_assignment(&mut self) -> Result<Stmt, ParseError> {
        let offset = self.peek_offset();
        let name = self.expect_identifier()?;
        self.expect_operator(":=")?;
        let expr = self.parse_expr()?;
        Ok(Stmt::Assignment(name, expr, offset))
    }

    fn parse_let(&mut self) -> Result<Stmt, ParseError> {
        let offset = self.expect_keyword("let")?;
        let name = self.expect_identifier()?;
        self.expect_operator(":=")?;
        let expr = self.parse_expr()?;
        Ok(Stmt::Let(name, expr, offset))
    }

    fn parse_print(&mut self) -> Result<Stmt, ParseError> {
        let offset = self.expect_keyword("print")?;
        let expr = self.parse_expr()?;
        Ok(Stmt::Print(expr, offset))
    }

    fn parse_return(&mut self) -> Result<Stmt, ParseError> {
        let offset = self.expect_keyword("ret")?;
        let expr = self.try_parse(Self::parse_expr);
        Ok(Stmt::Return(expr, offset))
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let offset = self.expect_keyword("if")?;
        self.expect_special("(")?;
        let cond = self.parse_expr()?;
        self.expect_special(")")?;
        let then_stmt = self.parse_stmt()?;
        self.skip_terminator_before_else();
        let else_stmt = if self.match_keyword("else") {
            let stmt = self.parse_stmt()?;
            Some(Box::new(stmt))
        } else {
            None
        };
        Ok(Stmt::If(cond, Box::new(then_stmt), else_stmt, offset))
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        let offset = self.expect_keyword("while")?;
        self.expect_special("(")?;
        let cond = self.parse_expr()?;
        self.expect_special(")")?;
        let body = self.parse_stmt()?;
        Ok(Stmt::While(cond, Box::new(body), offset))
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_logic()
    }

    fn parse_logic(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.parse_comparison()?;
        if let Some(op) = self.match_operator_one_of(&["&&", "||"]) {
            let rhs = self.parse_logic()?;
            let op = if op == "&&" { BinaryOp::And } else { BinaryOp::Or };
            return Ok(Expr::Binary(op, Box::new(lhs), Box::new(rhs)));
        }
        Ok(lhs)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.parse_sum()?;
        if let Some(op) = self.match_operator_one_of(&[">", "<", "==", ">=", "<="]) {
            let rhs = self.parse_comparison()?;
            let op = match op.as_str() {
                ">" => BinaryOp::Gt,
                "<" => BinaryOp::Lt,
                "==" => BinaryOp::Eq,
                ">=" => BinaryOp::Geq,
                "<=" => BinaryOp::Leq,
                _ => unreachable!(),
            };
            return Ok(Expr::Binary(op, Box::new(lhs), Box::new(rhs)));
        }
        Ok(lhs)
    }

    fn parse_sum(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.parse_product()?;
        if let Some(op) = self.match_operator_one_of(&["+", "-"]) {
            let rhs = self.parse_sum()?;
            let op = if op == "+" { BinaryOp::Add } else { BinaryOp::Sub };
            return Ok(Expr::Binary(op, Box::new(lhs), Box::new(rhs)));
        }
        Ok(lhs)
    }

    fn parse_product(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.parse_unary()?;
        if let Some(op) = self.match_operator_one_of(&["*", "/"]) {
            let rhs = self.parse_product()?;
            let op = if op == "*" { BinaryOp::Mul } else { BinaryOp::Div };
            return Ok(Expr::Binary(op, Box::new(lhs), Box::new(rhs)));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if self.match_operator_one_of(&["-"]).is_some() {
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary(UnaryOp::Neg, Box::new(operand)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        // `(TYPE)` only ever begins a cast, so a `TYPE` token lets us commit
        // without backtracking; everything else still needs a trial parse
        // since `(` also opens a parenthesized expression.
        if let Some(expr) = self.try_parse(Self::parse_cast) {
            return Ok(expr);
        }
        if self.check_kind(TokenKind::Literal) {
            return self.parse_literal();
        }
        if self.match_keyword("input") {
            return Ok(Expr::Input);
        }
        if let Some(call) = self.try_parse(Self::parse_call) {
            return Ok(call);
        }
        if self.check_kind(TokenKind::Identifier) {
            let name = self.expect_identifier()?;
            return Ok(Expr::Identifier(name));
        }
        if self.match_special("(") {
            let expr = self.parse_expr()?;
            self.expect_special(")")?;
            return Ok(expr);
        }
        Err(self.error_here("Expected expression"))
    }

    fn parse_cast(&mut self) -> Result<Expr, ParseError> {
        self.expect_special("(")?;
        let target = self.expect_type()?;
        self.expect_special(")")?;
        let expr = self.parse_primary()?;
        Ok(Expr::Cast(target, Box::new(expr)))
    }

    fn parse_call(&mut self) -> Result<Expr, ParseError> {
        let name = self.expect_identifier()?;
        self.expect_special("(")?;
        let mut args = Vec::new();
        if !self.check_special(")") {
            args.push(self.parse_expr()?);
            while self.match_special(",") {
                args.push(self.parse_expr()?);
            }
        }
        self.expect_special(")")?;
        Ok(Expr::Call(name, args))
    }

    fn parse_literal(&mut self) -> Result<Expr, ParseError> {
        let token = self.peek().clone();
        let value = match token.literal {
            Some(Literal::Integer(n)) => Value::Int(n),
            Some(Literal::Float(f)) => Value::Float(f),
            Some(Literal::Char(c)) => Value::Char(c),
            Some(Literal::Str(s)) => Value::String(s),
            None => return Err(self.error_here("Expected literal")),
        };
        self.pos += 1;
        Ok(Expr::Literal(value))
    }
}
