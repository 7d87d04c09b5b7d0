//! Scope manager: a stack of name→cell mappings with lexical lookup.

use std::collections::HashMap;

use crate::error::RuntimeError;
use crate::value::{new_cell, Cell, Value};

pub struct ScopeManager {
    scopes: Vec<HashMap<String, Cell>>,
}

impl ScopeManager {
    /// Constructs the manager with exactly one global scope, per spec.md
    /// §4.4 ("the evaluator constructs a global scope at initialization").
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Binds `name` in the innermost scope. Shadows, never updates, an outer
    /// binding of the same name.
    pub fn add_variable(&mut self, name: impl Into<String>, value: Value) {
        let cell = new_cell(value);
        self.scopes
            .last_mut()
            .expect("at least one scope is always present")
            .insert(name.into(), cell);
    }

    /// Innermost-first lookup. Returns a clone of the cell handle, not a
    /// copy of its contents.
    pub fn get_variable(&self, name: &str) -> Option<Cell> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).cloned())
    }

    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), RuntimeError> {
        match self.get_variable(name) {
            Some(cell) => {
                *cell.borrow_mut() = value;
                Ok(())
            }
            None => Err(RuntimeError::new("Symbol does not exist error")),
        }
    }
}

impl Default for ScopeManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_scope_shadows_outer() {
        let mut scopes = ScopeManager::new();
        scopes.add_variable("x", Value::Int(10));
        scopes.push_scope();
        scopes.add_variable("x", Value::Int(1));
        let inner = scopes.get_variable("x").unwrap();
        assert!(matches!(&*inner.borrow(), Value::Int(1)));
        scopes.pop_scope();
        let outer = scopes.get_variable("x").unwrap();
        assert!(matches!(&*outer.borrow(), Value::Int(10)));
    }

    #[test]
    fn assignment_mutates_existing_cell_without_rebinding() {
        let mut scopes = ScopeManager::new();
        scopes.add_variable("x", Value::Int(1));
        let before = scopes.get_variable("x").unwrap();
        scopes.assign("x", Value::Int(2)).unwrap();
        let after = scopes.get_variable("x").unwrap();
        assert!(std::rc::Rc::ptr_eq(&before, &after));
        assert!(matches!(&*after.borrow(), Value::Int(2)));
    }

    #[test]
    fn assignment_to_unknown_name_errors() {
        let mut scopes = ScopeManager::new();
        let err = scopes.assign("missing", Value::Int(1)).unwrap_err();
        assert_eq!(err.message, "Symbol does not exist error");
    }

    #[test]
    fn scope_balance_after_push_pop() {
        let mut scopes = ScopeManager::new();
        let base = scopes.depth();
        scopes.push_scope();
        scopes.push_scope();
        scopes.pop_scope();
        scopes.pop_scope();
        assert_eq!(scopes.depth(), base);
    }
}
