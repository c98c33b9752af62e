//! Lexical scopes and name bindings shared by both extraction passes.

use ckgraph::identity::{file_id, member_id, scoped_id};
use ckgraph::NodeType;
use std::collections::{HashMap, HashSet};

/// Index of the module scope in every [`ScopeTree`]
pub const MODULE_SCOPE: usize = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Module,
    Class,
    Function,
    Method,
}

impl ScopeKind {
    pub fn is_callable(self) -> bool {
        matches!(self, ScopeKind::Function | ScopeKind::Method)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScopeKind::Module => "module",
            ScopeKind::Class => "class",
            ScopeKind::Function => "function",
            ScopeKind::Method => "method",
        }
    }
}

/// What a name refers to inside one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// A node emitted in this fragment
    Local(String),
    /// A function parameter; its value is unknown statically
    Parameter,
    /// `import a.b` or `import a.b as c`; `path` is the module's file
    Module { dotted: String, path: String },
    /// `from m import n`; `target` is the scoped id the name would have in `m`
    Imported { target: String },
}

#[derive(Debug, Clone)]
pub struct Scope {
    /// Node id of the scope owner (`File:path` for the module)
    pub id: String,
    pub kind: ScopeKind,
    pub parent: Option<usize>,
    symbols: HashMap<String, Binding>,
    globals: HashSet<String>,
}

/// Arena of nested scopes for one file.
#[derive(Debug, Clone)]
pub struct ScopeTree {
    file_path: String,
    scopes: Vec<Scope>,
}

impl ScopeTree {
    pub fn new(file_path: &str) -> Self {
        Self {
            file_path: file_path.to_string(),
            scopes: vec![Scope {
                id: file_id(NodeType::File, file_path),
                kind: ScopeKind::Module,
                parent: None,
                symbols: HashMap::new(),
                globals: HashSet::new(),
            }],
        }
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn push(&mut self, parent: usize, id: String, kind: ScopeKind) -> usize {
        self.scopes.push(Scope {
            id,
            kind,
            parent: Some(parent),
            symbols: HashMap::new(),
            globals: HashSet::new(),
        });
        self.scopes.len() - 1
    }

    pub fn kind(&self, scope: usize) -> ScopeKind {
        self.scopes[scope].kind
    }

    pub fn id(&self, scope: usize) -> &str {
        &self.scopes[scope].id
    }

    /// Id a declaration named `name` gets inside `scope`
    pub fn child_id(&self, scope: usize, name: &str) -> String {
        let owner = &self.scopes[scope];
        match owner.kind {
            ScopeKind::Module => scoped_id(&self.file_path, name),
            _ => member_id(&owner.id, name),
        }
    }

    pub fn bind(&mut self, scope: usize, name: impl Into<String>, binding: Binding) {
        self.scopes[scope].symbols.insert(name.into(), binding);
    }

    /// Record a `global` / `nonlocal` declaration
    pub fn declare_global(&mut self, scope: usize, name: impl Into<String>) {
        self.scopes[scope].globals.insert(name.into());
    }

    pub fn is_global(&self, scope: usize, name: &str) -> bool {
        self.scopes[scope].globals.contains(name)
    }

    /// Resolve `name` as seen from `scope`.
    ///
    /// Enclosing class bodies are skipped, so methods do not see class
    /// attributes by bare name. Names declared `global` go straight to the
    /// module scope.
    pub fn lookup(&self, scope: usize, name: &str) -> Option<&Binding> {
        if self.is_global(scope, name) {
            return self.scopes[MODULE_SCOPE].symbols.get(name);
        }

        let mut current = Some(scope);
        while let Some(index) = current {
            let candidate = &self.scopes[index];
            if index == scope || candidate.kind != ScopeKind::Class {
                if let Some(binding) = candidate.symbols.get(name) {
                    return Some(binding);
                }
            }
            current = candidate.parent;
        }
        None
    }

    /// Id of the class a method belongs to
    pub fn enclosing_class(&self, scope: usize) -> Option<&str> {
        let mut current = Some(scope);
        while let Some(index) = current {
            let candidate = &self.scopes[index];
            if candidate.kind == ScopeKind::Class {
                return Some(&candidate.id);
            }
            current = candidate.parent;
        }
        None
    }
}
