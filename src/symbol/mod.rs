//==================================================
// File: symbol/mod.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Variable store and function table
// Objective: Track live variables by owning scope level and registered functions
//==================================================

use std::collections::BTreeMap;

use crate::interpreter::errors::ScriptError;
use crate::value::Value;

#[derive(Clone, Debug, PartialEq)]
pub struct Variable {
    pub name: String,
    /// `None` until an initialiser or assignment succeeds.
    pub value: Option<Value>,
    pub scope_level: usize,
}

impl Variable {
    pub fn new(name: impl Into<String>, scope_level: usize) -> Self {
        Self {
            name: name.into(),
            value: None,
            scope_level,
        }
    }
}

/// Flat store: at most one live variable per name, regardless of scope.
#[derive(Clone, Debug, Default)]
pub struct VariableStore {
    variables: BTreeMap<String, Variable>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.variables.get(name).and_then(|var| var.value.as_ref())
    }

    pub fn declare(&mut self, name: &str, scope_level: usize) -> Result<(), ScriptError> {
        if self.variables.contains_key(name) {
            return Err(ScriptError::name(format!(
                "Cannot redeclare variable '{name}'. A variable with that name already exists."
            )));
        }
        self.variables
            .insert(name.to_string(), Variable::new(name, scope_level));
        Ok(())
    }

    /// Replaces the value in place; the owning scope level is untouched.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), ScriptError> {
        match self.variables.get_mut(name) {
            Some(var) => {
                var.value = Some(value);
                Ok(())
            }
            None => Err(ScriptError::name(format!(
                "Variable '{name}' used before declaration."
            ))),
        }
    }

    /// Removes every variable created at `level` or deeper and returns how many went.
    pub fn evict_from(&mut self, level: usize) -> usize {
        let before = self.variables.len();
        self.variables.retain(|_, var| var.scope_level < level);
        before - self.variables.len()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub parameters: Vec<String>,
    /// Line number of the header; the body starts on the next line.
    pub body_start_line: usize,
}

#[derive(Clone, Debug, Default)]
pub struct FunctionTable {
    functions: BTreeMap<String, Function>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a function. The first definition of a name wins.
    pub fn register(&mut self, function: Function) -> Result<(), ScriptError> {
        if let Some(existing) = self.functions.get(&function.name) {
            return Err(ScriptError::name(format!(
                "Function '{}' is already defined on line {}",
                existing.name, existing.body_start_line
            )));
        }
        self.functions.insert(function.name.clone(), function);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
