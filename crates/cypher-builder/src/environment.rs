//! Naming authority for one render pass.
//!
//! The environment maps variable and parameter identities to textual names
//! and accumulates parameter values. Names are allocated on first
//! declaration, so they depend only on the order in which clauses introduce
//! identities: rendering the same tree twice yields the same text.

use crate::error::{RenderError, RenderResult};
use crate::render::RenderOptions;
use crate::variable::{Param, Variable};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::trace;

/// Per-render naming state.
#[derive(Debug)]
pub struct Environment {
    names: HashMap<Variable, String>,
    taken: HashSet<String>,
    generated: HashSet<String>,
    bound: HashSet<Variable>,
    next_variable: usize,
    param_names: HashMap<Param, String>,
    params: HashMap<String, Value>,
    next_param: usize,
    options: RenderOptions,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new(RenderOptions::default())
    }
}

impl Environment {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            names: HashMap::new(),
            taken: HashSet::new(),
            generated: HashSet::new(),
            bound: HashSet::new(),
            next_variable: 0,
            param_names: HashMap::new(),
            params: HashMap::new(),
            next_param: 0,
            options,
        }
    }

    /// Treat `variables` as introduced by an enclosing query
    pub fn with_bound<I>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = Variable>,
    {
        self.bound.extend(variables);
        self
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Name for a variable in a binding position, allocating one if needed.
    ///
    /// Fails with [`RenderError::NameCollision`] when a named variable uses a
    /// name this pass already generated.
    pub fn declare(&mut self, variable: &Variable) -> RenderResult<String> {
        if let Some(name) = variable.name() {
            if self.generated.contains(name) {
                return Err(RenderError::NameCollision {
                    name: name.to_string(),
                });
            }
            self.taken.insert(name.to_string());
            return Ok(name.to_string());
        }
        if let Some(name) = self.names.get(variable) {
            return Ok(name.clone());
        }

        let name = loop {
            let candidate = format!("{}{}", variable.prefix(), self.next_variable);
            self.next_variable += 1;
            if !self.taken.contains(&candidate) {
                break candidate;
            }
        };
        trace!(name = %name, "allocated variable name");

        self.taken.insert(name.clone());
        self.generated.insert(name.clone());
        self.names.insert(variable.clone(), name.clone());
        Ok(name)
    }

    /// Name for a variable in a reference position.
    ///
    /// Fails with [`RenderError::UnboundReference`] when no clause has
    /// introduced the variable yet.
    pub fn resolve(&mut self, variable: &Variable) -> RenderResult<String> {
        if variable.name().is_some() || self.bound.contains(variable) {
            return self.declare(variable);
        }
        self.names
            .get(variable)
            .cloned()
            .ok_or_else(|| RenderError::UnboundReference {
                prefix: variable.prefix().to_string(),
            })
    }

    /// Whether a variable already has a name in this pass
    pub fn is_declared(&self, variable: &Variable) -> bool {
        variable.name().is_some() || self.names.contains_key(variable)
    }

    /// Register a parameter and return its name (without the `$`)
    pub fn param(&mut self, param: &Param) -> RenderResult<String> {
        if let Some(name) = self.param_names.get(param) {
            return Ok(name.clone());
        }

        let name = match param.name() {
            Some(name) => {
                self.bind_param(name, param.value().clone())?;
                name.to_string()
            }
            None => loop {
                let candidate = format!("{}{}", param.prefix(), self.next_param);
                self.next_param += 1;
                if !self.params.contains_key(&candidate) {
                    self.params.insert(candidate.clone(), param.value().clone());
                    break candidate;
                }
            },
        };

        self.param_names.insert(param.clone(), name.clone());
        Ok(name)
    }

    /// Bind a value under a fixed parameter name.
    ///
    /// Rebinding the same name to an equal value is allowed; a different
    /// value is a [`RenderError::ParamCollision`].
    pub fn bind_param(&mut self, name: &str, value: Value) -> RenderResult<()> {
        match self.params.get(name) {
            Some(existing) if *existing != value => Err(RenderError::ParamCollision {
                name: name.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                self.params.insert(name.to_string(), value);
                Ok(())
            }
        }
    }

    pub fn params(&self) -> &HashMap<String, Value> {
        &self.params
    }

    pub fn into_params(self) -> HashMap<String, Value> {
        self.params
    }
}
