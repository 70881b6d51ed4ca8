use crate::ir::TypeRef;
use std::collections::{HashMap, HashSet};

lazy_static::lazy_static! {
    /// Names that resolve without any declaration in the generated module.
    pub static ref JS_GLOBALS: HashSet<&'static str> = {
        let mut s = HashSet::new();
        s.insert("Math");
        s.insert("console");
        s.insert("JSON");
        s.insert("Date");
        s.insert("String");
        s.insert("Number");
        s.insert("Boolean");
        s.insert("Array");
        s.insert("Object");
        s.insert("Promise");
        s.insert("Map");
        s.insert("Set");
        s.insert("Symbol");
        s.insert("Error");
        s.insert("TypeError");
        s.insert("RangeError");
        s.insert("undefined");
        s.insert("NaN");
        s.insert("Infinity");
        s.insert("parseInt");
        s.insert("parseFloat");
        s.insert("isNaN");
        s.insert("setTimeout");
        s.insert("clearTimeout");
        s.insert("setInterval");
        s.insert("clearInterval");
        s.insert("window");
        s.insert("document");
        s.insert("globalThis");
        s
    };

    /// Lowercase functions exported by the FlutterJS runtime packages. These
    /// are the only lowercase names the import resolver will import.
    pub static ref RUNTIME_LOWERCASE_EXPORTS: HashSet<&'static str> = {
        let mut s = HashSet::new();
        s.insert("runApp");
        s.insert("print");
        s.insert("debugPrint");
        s.insert("showDialog");
        s.insert("showModalBottomSheet");
        s.insert("showSnackBar");
        s.insert("identical");
        s.insert("jsonEncode");
        s.insert("jsonDecode");
        s.insert("max");
        s.insert("min");
        s.insert("sqrt");
        s.insert("pow");
        s.insert("kDebugMode");
        s.insert("kReleaseMode");
        s
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Module,
    Class,
    Function,
    Block,
    Loop,
    Catch,
    Lambda,
}

/// What the resolver knows about one declared name.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableInfo {
    pub name: String,
    pub ty: Option<TypeRef>,
    pub is_field: bool,
    pub is_final: bool,
    pub is_parameter: bool,
    pub is_static: bool,
    /// Declaring class for fields.
    pub owner: Option<String>,
}

impl VariableInfo {
    pub fn local(name: &str, ty: Option<TypeRef>, is_final: bool) -> Self {
        VariableInfo {
            name: name.to_string(),
            ty,
            is_field: false,
            is_final,
            is_parameter: false,
            is_static: false,
            owner: None,
        }
    }

    pub fn parameter(name: &str, ty: Option<TypeRef>) -> Self {
        VariableInfo {
            is_parameter: true,
            ..VariableInfo::local(name, ty, false)
        }
    }

    pub fn field(name: &str, owner: &str, ty: Option<TypeRef>, is_final: bool) -> Self {
        VariableInfo {
            is_field: true,
            owner: Some(owner.to_string()),
            ..VariableInfo::local(name, ty, is_final)
        }
    }

    pub fn static_field(name: &str, owner: &str, ty: Option<TypeRef>) -> Self {
        VariableInfo {
            is_static: true,
            ..VariableInfo::field(name, owner, ty, false)
        }
    }
}

#[derive(Debug)]
struct Scope {
    name: String,
    kind: ScopeKind,
    variables: HashMap<String, VariableInfo>,
}

/// Lexical scope chain for one file.
///
/// Frames form a stack: the parent of a frame is the frame below it, so a
/// parent always outlives its children. Lookups walk from the innermost frame
/// outwards and return the nearest declaration.
#[derive(Debug)]
pub struct ScopeResolver {
    frames: Vec<Scope>,
}

impl Default for ScopeResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeResolver {
    pub fn new() -> Self {
        ScopeResolver {
            frames: vec![Scope {
                name: "module".to_string(),
                kind: ScopeKind::Module,
                variables: HashMap::new(),
            }],
        }
    }

    pub fn push_scope(&mut self, name: &str, kind: ScopeKind) {
        self.frames.push(Scope {
            name: name.to_string(),
            kind,
            variables: HashMap::new(),
        });
    }

    /// Pops the innermost frame. The module frame is never popped.
    pub fn pop_scope(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        } else {
            tracing::warn!("pop_scope called on the module scope");
        }
    }

    /// Number of frames above the module frame.
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    /// Drops frames until `depth` frames remain above the module frame.
    pub fn truncate(&mut self, depth: usize) {
        self.frames.truncate(depth + 1);
    }

    pub fn current_scope_name(&self) -> &str {
        self.frames
            .last()
            .map(|s| s.name.as_str())
            .unwrap_or("module")
    }

    pub fn add_variable(&mut self, info: VariableInfo) {
        if let Some(frame) = self.frames.last_mut() {
            frame.variables.insert(info.name.clone(), info);
        }
    }

    pub fn declare_local(&mut self, name: &str, ty: Option<TypeRef>, is_final: bool) {
        self.add_variable(VariableInfo::local(name, ty, is_final));
    }

    pub fn declare_parameter(&mut self, name: &str, ty: Option<TypeRef>) {
        self.add_variable(VariableInfo::parameter(name, ty));
    }

    pub fn resolve_variable(&self, name: &str) -> Option<&VariableInfo> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.variables.get(name))
    }

    /// True when the nearest declaration of `name` is in the module frame.
    pub fn resolves_to_module(&self, name: &str) -> bool {
        self.frames
            .iter()
            .rposition(|frame| frame.variables.contains_key(name))
            == Some(0)
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.resolve_variable(name).is_some()
    }

    /// `"this."` for instance fields, `"<Owner>."` for statics, `""` otherwise.
    ///
    /// A local or parameter shadowing a field wins because it sits in a nearer
    /// frame.
    pub fn get_prefix_for_variable(&self, name: &str) -> String {
        match self.resolve_variable(name) {
            Some(info) if info.is_field && info.is_static => match &info.owner {
                Some(owner) => format!("{}.", owner),
                None => String::new(),
            },
            Some(info) if info.is_field => "this.".to_string(),
            _ => String::new(),
        }
    }

    /// Name of the innermost enclosing class frame.
    pub fn enclosing_class(&self) -> Option<&str> {
        self.frames
            .iter()
            .rev()
            .find(|f| f.kind == ScopeKind::Class)
            .map(|f| f.name.as_str())
    }

    pub fn in_kind(&self, kind: ScopeKind) -> bool {
        self.frames.iter().any(|f| f.kind == kind)
    }
}

pub fn is_js_global(name: &str) -> bool {
    JS_GLOBALS.contains(name)
}

pub fn is_runtime_export(name: &str) -> bool {
    RUNTIME_LOWERCASE_EXPORTS.contains(name)
}
