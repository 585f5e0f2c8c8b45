//! Lexical scopes and symbols.
//!
//! Scopes and symbols live in a single [`ScopeTable`] arena and refer to one
//! another through [`ScopeId`] and [`SymbolId`] handles. Forwarding a `var`
//! declared in a nested block to its function-level binding is an index
//! indirection stored in [`Symbol::resolved`].
//!
//! ## Structure
//!
//! - [`ScopeTable`] - arena owning every scope and symbol of one parse
//! - [`Scope`] - a binding region with its flags and ordered symbols
//! - [`Symbol`] - a named binding and its resolution state
//!
//! ## Usage
//!
//! ```rust
//! use spacey_frontend::scope::{ScopeKind, ScopeTable, SymbolKind};
//!
//! let mut table = ScopeTable::new();
//! let program = table.create_scope(None, ScopeKind::Program);
//! let block = table.create_scope(Some(program), ScopeKind::Block);
//!
//! let x = table.get_or_add_symbol(block, "x");
//! table.declare_hoisted_local(x);
//!
//! let resolved = table.resolve(x);
//! assert_eq!(table.symbol(resolved).scope, program);
//! assert_eq!(table.symbol(resolved).kind, SymbolKind::Local);
//! ```

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::ir::{FunctionId, NodeId};

/// Name of the implicit arguments object.
const ARGUMENTS: &str = "arguments";

/// Handle to a [`Scope`] in a [`ScopeTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(usize);

impl ScopeId {
    /// Position of the scope in creation order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Handle to a [`Symbol`] in a [`ScopeTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(usize);

impl SymbolId {
    /// Position of the symbol in creation order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// What kind of syntax introduced a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// The outermost scope of a script.
    Program,
    /// A function expression, getter or setter.
    Function,
    /// A named function declaration.
    FunctionDeclaration,
    /// A non-function region such as a catch clause.
    Block,
}

/// Facts collected about a scope while its body is parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScopeFlags {
    /// Code in this scope follows strict-mode rules.
    pub is_strict: bool,
    /// Contains a loop statement.
    pub has_loop: bool,
    /// Contains a call or `new`.
    pub has_call: bool,
    /// Contains a direct `eval` call.
    pub has_eval: bool,
    /// Refers to `this`.
    pub has_this_symbol: bool,
    /// Declares a local not captured by nested functions.
    pub has_local_symbol: bool,
    /// Declares a local captured by a nested function.
    pub has_closed_on_symbol: bool,
    /// Uses the `arguments` object.
    pub has_arguments_symbol: bool,
    /// Refers to a local of an enclosing function.
    pub has_parent_local_symbol: bool,
}

/// How a symbol is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// Not yet resolved.
    Unknown,
    /// Declared in its own function and used only there.
    Local,
    /// Declared in its own function and captured by a nested function.
    ClosedOnLocal,
    /// Declared in an enclosing function.
    ParentLocal,
    /// Bound on the global object.
    Global,
    /// The function's `arguments` object.
    Arguments,
    /// Compiler-introduced binding with no source name.
    HiddenLocal,
    /// Stands in for a symbol of an enclosing scope in the same function.
    OuterDuplicate,
}

/// A named binding.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    /// Source name.
    pub name: String,
    /// Binding kind.
    pub kind: SymbolKind,
    /// Scope the symbol was created in.
    pub scope: ScopeId,
    /// Insertion index within the owning scope.
    pub index: usize,
    /// Declaration order among the function's formal parameters.
    pub parameter_index: Option<usize>,
    /// Canonical symbol this one forwards to.
    pub resolved: Option<SymbolId>,
}

/// One lexical binding region.
#[derive(Debug, Clone)]
pub struct Scope {
    /// Syntax that introduced the scope.
    pub kind: ScopeKind,
    /// Enclosing scope, `None` for the outermost.
    pub parent: Option<ScopeId>,
    /// Scopes nested directly in this one, in creation order.
    pub inner_scopes: Vec<ScopeId>,
    /// Collected facts.
    pub flags: ScopeFlags,
    /// Functions defined directly in this function scope.
    pub sub_functions: Vec<FunctionId>,
    /// `Call` and `New` nodes created while this scope was current.
    pub invocations: Vec<NodeId>,
    /// `Return` statements created while this scope was current.
    pub returns: Vec<NodeId>,
    /// The function whose body this scope is, once built.
    pub function: Option<FunctionId>,
    symbols: Vec<SymbolId>,
    names: FxHashMap<String, SymbolId>,
}

impl Scope {
    fn new(kind: ScopeKind, parent: Option<ScopeId>, is_strict: bool) -> Self {
        Self {
            kind,
            parent,
            inner_scopes: Vec::new(),
            flags: ScopeFlags {
                is_strict,
                ..ScopeFlags::default()
            },
            sub_functions: Vec::new(),
            invocations: Vec::new(),
            returns: Vec::new(),
            function: None,
            symbols: Vec::new(),
            names: FxHashMap::default(),
        }
    }

    /// Returns true for program, function and function-declaration scopes.
    pub fn is_function(&self) -> bool {
        !matches!(self.kind, ScopeKind::Block)
    }

    /// Returns true for the outermost scope of a script.
    pub fn is_program(&self) -> bool {
        matches!(self.kind, ScopeKind::Program)
    }

    /// Returns true for the scope of a named function declaration.
    pub fn is_function_declaration(&self) -> bool {
        matches!(self.kind, ScopeKind::FunctionDeclaration)
    }

    /// Symbols in insertion order.
    pub fn symbols(&self) -> &[SymbolId] {
        &self.symbols
    }
}

/// Arena of every scope and symbol created during one parse.
#[derive(Debug, Clone, Default)]
pub struct ScopeTable {
    scopes: Vec<Scope>,
    symbols: Vec<Symbol>,
}

impl ScopeTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scope nested in `parent`.
    ///
    /// The new scope inherits strictness from its parent and is appended to
    /// the parent's inner scopes.
    pub fn create_scope(&mut self, parent: Option<ScopeId>, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        let is_strict = parent.is_some_and(|p| self.scopes[p.0].flags.is_strict);
        self.scopes.push(Scope::new(kind, parent, is_strict));
        if let Some(parent) = parent {
            self.scopes[parent.0].inner_scopes.push(id);
        }
        trace!(scope = id.0, ?kind, ?parent, "created scope");
        id
    }

    /// Returns the scope behind `id`.
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    /// Returns the scope behind `id` mutably.
    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.0]
    }

    /// Returns the symbol behind `id`.
    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0]
    }

    /// Returns the symbol behind `id` mutably.
    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0]
    }

    /// Iterates scopes in creation order. Parents always precede children.
    pub fn scopes(&self) -> impl Iterator<Item = (ScopeId, &Scope)> {
        self.scopes.iter().enumerate().map(|(i, s)| (ScopeId(i), s))
    }

    /// Number of scopes created.
    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    /// Number of symbols created.
    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    /// Looks up `name` in `scope` only.
    pub fn get_symbol(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        self.scopes[scope.0].names.get(name).copied()
    }

    /// Adds a new symbol to `scope`.
    ///
    /// # Panics
    ///
    /// Panics if `scope` already has a symbol with this name.
    pub fn add_symbol(&mut self, scope: ScopeId, name: &str) -> SymbolId {
        let owner = &mut self.scopes[scope.0];
        assert!(
            !owner.names.contains_key(name),
            "symbol {name} already exists in scope {}",
            scope.0
        );

        let id = SymbolId(self.symbols.len());
        owner.names.insert(name.to_string(), id);
        owner.symbols.push(id);
        let index = owner.symbols.len() - 1;

        self.symbols.push(Symbol {
            name: name.to_string(),
            kind: SymbolKind::Unknown,
            scope,
            index,
            parameter_index: None,
            resolved: None,
        });
        id
    }

    /// Returns the symbol named `name` in `scope`, creating it on first use.
    pub fn get_or_add_symbol(&mut self, scope: ScopeId, name: &str) -> SymbolId {
        match self.get_symbol(scope, name) {
            Some(id) => id,
            None => self.add_symbol(scope, name),
        }
    }

    /// Nearest function-like scope enclosing `scope`, including itself.
    pub fn function_scope_of(&self, scope: ScopeId) -> ScopeId {
        let mut current = scope;
        while !self.scopes[current.0].is_function() {
            match self.scopes[current.0].parent {
                Some(parent) => current = parent,
                None => break,
            }
        }
        current
    }

    /// Binds `symbol` as a local of its nearest function scope.
    ///
    /// A symbol created in a block scope becomes an `OuterDuplicate` that
    /// forwards to a `Local` symbol of the same name in the function scope.
    pub fn declare_hoisted_local(&mut self, symbol: SymbolId) {
        let scope = self.symbols[symbol.0].scope;
        if self.scopes[scope.0].is_function() {
            self.symbols[symbol.0].kind = SymbolKind::Local;
            return;
        }

        let target = self.function_scope_of(scope);
        let name = self.symbols[symbol.0].name.clone();
        let resolved = self.get_or_add_symbol(target, &name);
        self.symbols[resolved.0].kind = SymbolKind::Local;

        let duplicate = &mut self.symbols[symbol.0];
        duplicate.kind = SymbolKind::OuterDuplicate;
        duplicate.resolved = Some(resolved);
        trace!(name = %name, from = scope.0, to = target.0, "hoisted local");
    }

    /// Follows `OuterDuplicate` forwarding to the canonical symbol.
    pub fn resolve(&self, symbol: SymbolId) -> SymbolId {
        let mut current = symbol;
        while let Symbol {
            kind: SymbolKind::OuterDuplicate,
            resolved: Some(next),
            ..
        } = self.symbols[current.0]
        {
            current = next;
        }
        current
    }

    /// Resolves every symbol still of kind `Unknown`.
    ///
    /// Scopes are visited in creation order so enclosing scopes are settled
    /// before the scopes nested in them.
    pub fn resolve_free_symbols(&mut self) {
        self.propagate_eval();

        for scope_index in 0..self.scopes.len() {
            let scope = ScopeId(scope_index);

            let needs_arguments = {
                let s = &self.scopes[scope_index];
                s.is_function() && !s.is_program() && s.flags.has_eval
            };
            if needs_arguments {
                let arguments = self.get_or_add_symbol(scope, ARGUMENTS);
                self.symbols[arguments.0].kind = SymbolKind::Arguments;
                self.scopes[scope_index].flags.has_arguments_symbol = true;
            }

            // Symbols may be appended to this scope while resolving.
            let mut i = 0;
            while i < self.scopes[scope_index].symbols.len() {
                let symbol = self.scopes[scope_index].symbols[i];
                self.resolve_symbol(symbol);
                i += 1;
            }
        }
    }

    fn propagate_eval(&mut self) {
        // Children come after parents, so walk backwards to bubble up.
        for index in (0..self.scopes.len()).rev() {
            let scope = &self.scopes[index];
            if scope.is_function() || !scope.flags.has_eval {
                continue;
            }
            if let Some(parent) = scope.parent {
                self.scopes[parent.0].flags.has_eval = true;
            }
        }
    }

    fn resolve_symbol(&mut self, symbol: SymbolId) {
        let scope = self.symbols[symbol.0].scope;

        if self.symbols[symbol.0].name == ARGUMENTS && !self.scopes[scope.0].is_program() {
            let function_scope = self.function_scope_of(scope);
            if !self.scopes[function_scope.0].is_program() {
                let arguments = self.get_or_add_symbol(function_scope, ARGUMENTS);
                self.scopes[function_scope.0].flags.has_arguments_symbol = true;
                self.symbols[arguments.0].kind = SymbolKind::Arguments;
                if arguments != symbol {
                    let s = &mut self.symbols[symbol.0];
                    s.kind = SymbolKind::OuterDuplicate;
                    s.resolved = Some(arguments);
                }
                return;
            }
        }

        let kind = self.symbols[symbol.0].kind;
        match kind {
            SymbolKind::Local => {
                if self.scopes[scope.0].flags.has_eval {
                    self.symbols[symbol.0].kind = SymbolKind::ClosedOnLocal;
                    self.scopes[scope.0].flags.has_closed_on_symbol = true;
                } else {
                    self.scopes[scope.0].flags.has_local_symbol = true;
                }
            }
            SymbolKind::ClosedOnLocal => {
                self.scopes[scope.0].flags.has_closed_on_symbol = true;
            }
            SymbolKind::Unknown => {
                let s = &self.scopes[scope.0];
                if s.flags.has_eval && s.is_function() {
                    return;
                }
                self.resolve_outward(symbol);
            }
            SymbolKind::ParentLocal
            | SymbolKind::Global
            | SymbolKind::Arguments
            | SymbolKind::HiddenLocal
            | SymbolKind::OuterDuplicate => {}
        }
    }

    fn resolve_outward(&mut self, symbol: SymbolId) {
        let scope = self.symbols[symbol.0].scope;
        let name = self.symbols[symbol.0].name.clone();
        let own_function = self.function_scope_of(scope);

        let mut outer = self.scopes[scope.0].parent;
        while let Some(outer_scope) = outer {
            let Some(found) = self.get_symbol(outer_scope, &name) else {
                let o = &self.scopes[outer_scope.0];
                if o.flags.has_eval && o.is_function() {
                    // An eval may still introduce the binding at runtime.
                    return;
                }
                outer = o.parent;
                continue;
            };

            if self.function_scope_of(outer_scope) == own_function {
                let target = match self.symbols[found.0] {
                    Symbol {
                        kind: SymbolKind::OuterDuplicate,
                        resolved: Some(next),
                        ..
                    } => next,
                    _ => found,
                };
                let s = &mut self.symbols[symbol.0];
                s.kind = SymbolKind::OuterDuplicate;
                s.resolved = Some(target);
                return;
            }

            // A block-scope duplicate stands for its canonical symbol.
            let found = self.resolve(found);
            let found_kind = self.symbols[found.0].kind;
            match found_kind {
                SymbolKind::Local | SymbolKind::ClosedOnLocal => {
                    let owner = self.symbols[found.0].scope;
                    let kind = if self.scopes[owner.0].is_program() {
                        SymbolKind::Global
                    } else {
                        SymbolKind::ParentLocal
                    };
                    let s = &mut self.symbols[symbol.0];
                    s.kind = kind;
                    s.resolved = Some(found);
                    self.scopes[scope.0].flags.has_parent_local_symbol = true;

                    self.symbols[found.0].kind = SymbolKind::ClosedOnLocal;
                    self.scopes[owner.0].flags.has_closed_on_symbol = true;
                }
                SymbolKind::ParentLocal | SymbolKind::Global => {
                    let resolved = self.symbols[found.0].resolved;
                    let s = &mut self.symbols[symbol.0];
                    s.kind = found_kind;
                    s.resolved = resolved;
                    if found_kind == SymbolKind::ParentLocal {
                        self.scopes[scope.0].flags.has_parent_local_symbol = true;
                    }
                }
                SymbolKind::Unknown if self.scopes[outer_scope.0].flags.has_eval => return,
                SymbolKind::Arguments => {
                    let s = &mut self.symbols[symbol.0];
                    s.kind = SymbolKind::ParentLocal;
                    s.resolved = Some(found);
                    self.scopes[scope.0].flags.has_parent_local_symbol = true;
                }
                _ => break,
            }
            return;
        }

        self.symbols[symbol.0].kind = SymbolKind::Global;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program_with_function() -> (ScopeTable, ScopeId, ScopeId) {
        let mut table = ScopeTable::new();
        let program = table.create_scope(None, ScopeKind::Program);
        let function = table.create_scope(Some(program), ScopeKind::Function);
        (table, program, function)
    }

    #[test]
    fn test_get_or_add_symbol_is_idempotent() {
        let mut table = ScopeTable::new();
        let scope = table.create_scope(None, ScopeKind::Program);
        let a = table.get_or_add_symbol(scope, "a");
        let b = table.get_or_add_symbol(scope, "b");
        assert_eq!(table.get_or_add_symbol(scope, "a"), a);
        assert_eq!(table.symbol(a).index, 0);
        assert_eq!(table.symbol(b).index, 1);
        assert_eq!(table.scope(scope).symbols(), &[a, b]);
    }

    #[test]
    #[should_panic(expected = "already exists")]
    fn test_add_duplicate_symbol_panics() {
        let mut table = ScopeTable::new();
        let scope = table.create_scope(None, ScopeKind::Program);
        table.add_symbol(scope, "a");
        table.add_symbol(scope, "a");
    }

    #[test]
    fn test_strictness_is_inherited() {
        let mut table = ScopeTable::new();
        let program = table.create_scope(None, ScopeKind::Program);
        table.scope_mut(program).flags.is_strict = true;
        let inner = table.create_scope(Some(program), ScopeKind::Function);
        assert!(table.scope(inner).flags.is_strict);
        assert_eq!(table.scope(program).inner_scopes, vec![inner]);
    }

    #[test]
    fn test_hoisting_through_nested_blocks() {
        let (mut table, _, function) = program_with_function();
        let catch = table.create_scope(Some(function), ScopeKind::Block);
        let nested = table.create_scope(Some(catch), ScopeKind::Block);

        let x = table.get_or_add_symbol(nested, "x");
        table.declare_hoisted_local(x);

        assert_eq!(table.symbol(x).kind, SymbolKind::OuterDuplicate);
        let resolved = table.resolve(x);
        assert_eq!(table.symbol(resolved).scope, function);
        assert_eq!(table.symbol(resolved).kind, SymbolKind::Local);
        assert!(table.get_symbol(catch, "x").is_none());
    }

    #[test]
    fn test_declaring_in_function_scope_is_local() {
        let (mut table, _, function) = program_with_function();
        let x = table.get_or_add_symbol(function, "x");
        table.declare_hoisted_local(x);
        assert_eq!(table.symbol(x).kind, SymbolKind::Local);
        assert_eq!(table.resolve(x), x);
    }

    #[test]
    fn test_free_symbol_of_parent_function() {
        let (mut table, _, outer) = program_with_function();
        let inner = table.create_scope(Some(outer), ScopeKind::Function);

        let declared = table.get_or_add_symbol(outer, "v");
        table.declare_hoisted_local(declared);
        let used = table.get_or_add_symbol(inner, "v");

        table.resolve_free_symbols();

        assert_eq!(table.symbol(used).kind, SymbolKind::ParentLocal);
        assert_eq!(table.symbol(used).resolved, Some(declared));
        assert_eq!(table.symbol(declared).kind, SymbolKind::ClosedOnLocal);
        assert!(table.scope(inner).flags.has_parent_local_symbol);
        assert!(table.scope(outer).flags.has_closed_on_symbol);
    }

    #[test]
    fn test_free_symbol_of_program_is_global() {
        let (mut table, program, function) = program_with_function();
        let declared = table.get_or_add_symbol(program, "g");
        table.declare_hoisted_local(declared);
        let used = table.get_or_add_symbol(function, "g");
        let undeclared = table.get_or_add_symbol(function, "print");

        table.resolve_free_symbols();

        assert_eq!(table.symbol(used).kind, SymbolKind::Global);
        assert_eq!(table.symbol(undeclared).kind, SymbolKind::Global);
        assert_eq!(table.symbol(undeclared).resolved, None);
    }

    #[test]
    fn test_catch_block_reference_forwards_to_function_local() {
        let (mut table, _, function) = program_with_function();
        let catch = table.create_scope(Some(function), ScopeKind::Block);
        let declared = table.get_or_add_symbol(function, "n");
        table.declare_hoisted_local(declared);
        let used = table.get_or_add_symbol(catch, "n");

        table.resolve_free_symbols();

        assert_eq!(table.symbol(used).kind, SymbolKind::OuterDuplicate);
        assert_eq!(table.resolve(used), declared);
    }

    #[test]
    fn test_closure_in_catch_captures_function_local() {
        let (mut table, _, function) = program_with_function();
        let catch = table.create_scope(Some(function), ScopeKind::Block);
        let closure = table.create_scope(Some(catch), ScopeKind::Function);
        let declared = table.get_or_add_symbol(function, "x");
        table.declare_hoisted_local(declared);
        let in_catch = table.get_or_add_symbol(catch, "x");
        let in_closure = table.get_or_add_symbol(closure, "x");

        table.resolve_free_symbols();

        assert_eq!(table.symbol(in_catch).kind, SymbolKind::OuterDuplicate);
        assert_eq!(table.symbol(in_closure).kind, SymbolKind::ParentLocal);
        assert_eq!(table.symbol(in_closure).resolved, Some(declared));
        assert_eq!(table.symbol(declared).kind, SymbolKind::ClosedOnLocal);
        assert!(table.scope(function).flags.has_closed_on_symbol);
        assert!(table.scope(closure).flags.has_parent_local_symbol);
    }

    #[test]
    fn test_closure_in_program_block_sees_global() {
        let mut table = ScopeTable::new();
        let program = table.create_scope(None, ScopeKind::Program);
        let block = table.create_scope(Some(program), ScopeKind::Block);
        let closure = table.create_scope(Some(block), ScopeKind::Function);
        let declared = table.get_or_add_symbol(program, "g");
        table.declare_hoisted_local(declared);
        table.get_or_add_symbol(block, "g");
        let in_closure = table.get_or_add_symbol(closure, "g");

        table.resolve_free_symbols();

        assert_eq!(table.symbol(in_closure).kind, SymbolKind::Global);
        assert_eq!(table.symbol(in_closure).resolved, Some(declared));
    }

    #[test]
    fn test_arguments_in_function() {
        let (mut table, _, function) = program_with_function();
        let catch = table.create_scope(Some(function), ScopeKind::Block);
        let used = table.get_or_add_symbol(catch, "arguments");

        table.resolve_free_symbols();

        let arguments = table.resolve(used);
        assert_eq!(table.symbol(arguments).scope, function);
        assert_eq!(table.symbol(arguments).kind, SymbolKind::Arguments);
        assert!(table.scope(function).flags.has_arguments_symbol);
    }

    #[test]
    fn test_eval_stops_resolution() {
        let (mut table, _, outer) = program_with_function();
        table.scope_mut(outer).flags.has_eval = true;
        let inner = table.create_scope(Some(outer), ScopeKind::Function);
        let used = table.get_or_add_symbol(inner, "maybe");

        table.resolve_free_symbols();

        assert_eq!(table.symbol(used).kind, SymbolKind::Unknown);
        assert!(table.get_symbol(outer, "arguments").is_some());
    }

    #[test]
    fn test_eval_in_catch_marks_function() {
        let (mut table, _, function) = program_with_function();
        let catch = table.create_scope(Some(function), ScopeKind::Block);
        table.scope_mut(catch).flags.has_eval = true;

        table.resolve_free_symbols();

        assert!(table.scope(function).flags.has_eval);
    }
}
