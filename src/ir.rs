//! Program IR consumed by the code generator.
//!
//! These types mirror the object graph produced by the Dart front-end. They are
//! read-only inputs: the generator never mutates a `DartFile` while emitting it.
//! Expression and statement hierarchies are closed enums, so every emitter has
//! to handle every variant explicitly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ═══════════════════════════════════════════════════════════════════════════════
// SOURCE LOCATIONS & TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

/// A reference to a named type, e.g. `State<Counter>` or `List<int>?`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TypeRef {
    pub name: String,
    #[serde(default)]
    pub type_args: Vec<TypeRef>,
    #[serde(default)]
    pub nullable: bool,
    /// Library the type was declared in, when the front-end resolved it.
    #[serde(default)]
    pub library_uri: Option<String>,
}

impl TypeRef {
    pub fn named(name: &str) -> Self {
        TypeRef {
            name: name.to_string(),
            type_args: vec![],
            nullable: false,
            library_uri: None,
        }
    }

    pub fn generic(name: &str, args: Vec<TypeRef>) -> Self {
        TypeRef {
            type_args: args,
            ..TypeRef::named(name)
        }
    }

    /// Display form including type arguments, e.g. `State<Counter>`.
    pub fn display_name(&self) -> String {
        let mut out = self.name.clone();
        if !self.type_args.is_empty() {
            let args: Vec<String> = self.type_args.iter().map(|t| t.display_name()).collect();
            out.push('<');
            out.push_str(&args.join(", "));
            out.push('>');
        }
        if self.nullable {
            out.push('?');
        }
        out
    }

    /// Bare class name without a library prefix (`material.Colors` -> `Colors`).
    pub fn base_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROGRAM UNIT
// ═══════════════════════════════════════════════════════════════════════════════

/// One Dart compilation unit.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DartFile {
    /// Path relative to the package root, e.g. `lib/src/counter.dart`.
    pub file_path: String,
    #[serde(default)]
    pub package_name: Option<String>,
    #[serde(default)]
    pub classes: Vec<ClassDecl>,
    #[serde(default)]
    pub functions: Vec<FunctionDecl>,
    #[serde(default)]
    pub variables: Vec<VariableDecl>,
    #[serde(default)]
    pub enums: Vec<EnumDecl>,
    #[serde(default)]
    pub imports: Vec<ImportDirective>,
    #[serde(default)]
    pub exports: Vec<ExportDirective>,
    #[serde(default)]
    pub typedefs: Vec<String>,
}

impl DartFile {
    pub fn new(file_path: &str) -> Self {
        DartFile {
            file_path: file_path.to_string(),
            ..DartFile::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
            && self.functions.is_empty()
            && self.variables.is_empty()
            && self.enums.is_empty()
            && self.exports.is_empty()
    }

    pub fn find_class(&self, name: &str) -> Option<&ClassDecl> {
        self.classes.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportDirective {
    pub uri: String,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub show: Vec<String>,
    #[serde(default)]
    pub hide: Vec<String>,
    #[serde(default)]
    pub is_deferred: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDirective {
    pub uri: String,
    #[serde(default)]
    pub show: Vec<String>,
    #[serde(default)]
    pub hide: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumDecl {
    pub name: String,
    pub values: Vec<String>,
    #[serde(default)]
    pub location: SourceLocation,
}

/// Top-level variable declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableDecl {
    pub name: String,
    #[serde(default)]
    pub ty: Option<TypeRef>,
    #[serde(default)]
    pub initializer: Option<ExpressionIR>,
    #[serde(default)]
    pub is_final: bool,
    #[serde(default)]
    pub is_const: bool,
    #[serde(default)]
    pub location: SourceLocation,
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLASSES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDecl {
    pub name: String,
    #[serde(default)]
    pub superclass: Option<TypeRef>,
    #[serde(default)]
    pub interfaces: Vec<TypeRef>,
    #[serde(default)]
    pub mixins: Vec<TypeRef>,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    #[serde(default)]
    pub static_fields: Vec<FieldDecl>,
    #[serde(default)]
    pub constructors: Vec<ConstructorDecl>,
    #[serde(default)]
    pub methods: Vec<FunctionDecl>,
    /// Free-form front-end flags such as `isAbstract` or `isExtensionType`.
    #[serde(default)]
    pub metadata: BTreeMap<String, bool>,
    #[serde(default)]
    pub location: SourceLocation,
}

impl ClassDecl {
    pub fn new(name: &str) -> Self {
        ClassDecl {
            name: name.to_string(),
            superclass: None,
            interfaces: vec![],
            mixins: vec![],
            fields: vec![],
            static_fields: vec![],
            constructors: vec![],
            methods: vec![],
            metadata: BTreeMap::new(),
            location: SourceLocation::default(),
        }
    }

    pub fn extending(name: &str, superclass: TypeRef) -> Self {
        ClassDecl {
            superclass: Some(superclass),
            ..ClassDecl::new(name)
        }
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.metadata.get(flag).copied().unwrap_or(false)
    }

    pub fn find_method(&self, name: &str) -> Option<&FunctionDecl> {
        self.methods
            .iter()
            .find(|m| m.name == name && !m.is_getter && !m.is_setter)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDecl {
    pub name: String,
    #[serde(default)]
    pub ty: Option<TypeRef>,
    #[serde(default)]
    pub initializer: Option<ExpressionIR>,
    #[serde(default)]
    pub is_final: bool,
    #[serde(default)]
    pub is_late: bool,
    /// Read by `build` and mutated through `setState` (classified by the front-end).
    #[serde(default)]
    pub is_reactive: bool,
    /// Owns a resource that must be released in `dispose`.
    #[serde(default)]
    pub is_disposable: bool,
}

impl FieldDecl {
    pub fn new(name: &str, initializer: Option<ExpressionIR>) -> Self {
        FieldDecl {
            name: name.to_string(),
            ty: None,
            initializer,
            is_final: false,
            is_late: false,
            is_reactive: false,
            is_disposable: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructorDecl {
    /// `None` for the unnamed constructor.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub params: Vec<Parameter>,
    /// Initializer list entries (`: _x = x`).
    #[serde(default)]
    pub initializers: Vec<FieldInitializer>,
    #[serde(default)]
    pub super_args: Vec<ExpressionIR>,
    #[serde(default)]
    pub super_named_args: Vec<NamedArgument>,
    #[serde(default)]
    pub body: Option<Vec<StatementIR>>,
    #[serde(default)]
    pub is_const: bool,
    #[serde(default)]
    pub is_factory: bool,
}

impl ConstructorDecl {
    pub fn unnamed(params: Vec<Parameter>) -> Self {
        ConstructorDecl {
            name: None,
            params,
            initializers: vec![],
            super_args: vec![],
            super_named_args: vec![],
            body: None,
            is_const: false,
            is_factory: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldInitializer {
    pub field: String,
    pub value: ExpressionIR,
}

// ═══════════════════════════════════════════════════════════════════════════════
// FUNCTIONS & PARAMETERS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ParameterKind {
    #[default]
    Positional,
    OptionalPositional,
    Named,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    #[serde(default)]
    pub ty: Option<TypeRef>,
    #[serde(default)]
    pub default_value: Option<ExpressionIR>,
    #[serde(default)]
    pub kind: ParameterKind,
    #[serde(default)]
    pub required: bool,
    /// `this.name` constructor parameter.
    #[serde(default)]
    pub is_field_formal: bool,
}

impl Parameter {
    pub fn positional(name: &str) -> Self {
        Parameter {
            name: name.to_string(),
            ty: None,
            default_value: None,
            kind: ParameterKind::Positional,
            required: true,
            is_field_formal: false,
        }
    }

    pub fn named(name: &str) -> Self {
        Parameter {
            kind: ParameterKind::Named,
            required: false,
            ..Parameter::positional(name)
        }
    }

    pub fn field_formal(name: &str, kind: ParameterKind) -> Self {
        Parameter {
            kind,
            is_field_formal: true,
            ..Parameter::positional(name)
        }
    }
}

/// Function, method, getter or setter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDecl {
    pub name: String,
    #[serde(default)]
    pub params: Vec<Parameter>,
    #[serde(default)]
    pub return_type: Option<TypeRef>,
    /// `None` for abstract or external declarations.
    #[serde(default)]
    pub body: Option<Vec<StatementIR>>,
    #[serde(default)]
    pub is_async: bool,
    #[serde(default)]
    pub is_getter: bool,
    #[serde(default)]
    pub is_setter: bool,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_operator: bool,
    #[serde(default)]
    pub location: SourceLocation,
}

impl FunctionDecl {
    pub fn new(name: &str, params: Vec<Parameter>, body: Vec<StatementIR>) -> Self {
        FunctionDecl {
            name: name.to_string(),
            params,
            return_type: None,
            body: Some(body),
            is_async: false,
            is_getter: false,
            is_setter: false,
            is_static: false,
            is_operator: false,
            location: SourceLocation::default(),
        }
    }

    pub fn getter(name: &str, body: Vec<StatementIR>) -> Self {
        FunctionDecl {
            is_getter: true,
            ..FunctionDecl::new(name, vec![], body)
        }
    }

    pub fn setter(name: &str, param: &str, body: Vec<StatementIR>) -> Self {
        FunctionDecl {
            is_setter: true,
            ..FunctionDecl::new(name, vec![Parameter::positional(param)], body)
        }
    }

    pub fn is_accessor(&self) -> bool {
        self.is_getter || self.is_setter
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXPRESSIONS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    /// Dart `~/`.
    IntDiv,
    Mod,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    And,
    Or,
    /// Dart `??`.
    IfNull,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    UShr,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
    /// Dart postfix `!`.
    NullAssert,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    IntDivAssign,
    ModAssign,
    IfNullAssign,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedArgument {
    pub name: String,
    pub value: ExpressionIR,
}

impl NamedArgument {
    pub fn new(name: &str, value: ExpressionIR) -> Self {
        NamedArgument {
            name: name.to_string(),
            value,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapEntryIR {
    pub key: ExpressionIR,
    pub value: ExpressionIR,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum InterpolationPart {
    Text { value: String },
    Expression { expression: ExpressionIR },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum LambdaBody {
    Expression { expression: Box<ExpressionIR> },
    Block { statements: Vec<StatementIR> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ExpressionIR {
    StringLiteral {
        value: String,
    },
    IntLiteral {
        value: i64,
    },
    DoubleLiteral {
        value: f64,
    },
    BoolLiteral {
        value: bool,
    },
    NullLiteral,
    Identifier {
        name: String,
    },
    This,
    Super,
    Binary {
        op: BinaryOp,
        left: Box<ExpressionIR>,
        right: Box<ExpressionIR>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<ExpressionIR>,
    },
    Assignment {
        op: AssignOp,
        target: Box<ExpressionIR>,
        value: Box<ExpressionIR>,
    },
    /// Method or function call. `target == None` is an unqualified call.
    MethodCall {
        #[serde(default)]
        target: Option<Box<ExpressionIR>>,
        method: String,
        #[serde(default)]
        args: Vec<ExpressionIR>,
        #[serde(default)]
        named_args: Vec<NamedArgument>,
        #[serde(default)]
        null_aware: bool,
    },
    InstanceCreation {
        ty: TypeRef,
        #[serde(default)]
        constructor: Option<String>,
        #[serde(default)]
        args: Vec<ExpressionIR>,
        #[serde(default)]
        named_args: Vec<NamedArgument>,
        #[serde(default)]
        is_const: bool,
    },
    PropertyAccess {
        target: Box<ExpressionIR>,
        property: String,
        #[serde(default)]
        null_aware: bool,
    },
    /// `null_aware` is set when the target is statically nullable.
    IndexAccess {
        target: Box<ExpressionIR>,
        index: Box<ExpressionIR>,
        #[serde(default)]
        null_aware: bool,
    },
    Conditional {
        condition: Box<ExpressionIR>,
        then_value: Box<ExpressionIR>,
        else_value: Box<ExpressionIR>,
    },
    ListLiteral {
        elements: Vec<ExpressionIR>,
        #[serde(default)]
        is_const: bool,
    },
    MapLiteral {
        entries: Vec<MapEntryIR>,
        #[serde(default)]
        is_const: bool,
    },
    SetLiteral {
        elements: Vec<ExpressionIR>,
        #[serde(default)]
        is_const: bool,
    },
    Lambda {
        params: Vec<Parameter>,
        body: LambdaBody,
        #[serde(default)]
        is_async: bool,
    },
    /// `target..a()..b = 1`; sections use `CascadeReceiver` for the implicit target.
    Cascade {
        target: Box<ExpressionIR>,
        sections: Vec<ExpressionIR>,
    },
    CascadeReceiver,
    Await {
        expression: Box<ExpressionIR>,
    },
    StringInterpolation {
        parts: Vec<InterpolationPart>,
    },
    TypeCheck {
        expression: Box<ExpressionIR>,
        ty: TypeRef,
        #[serde(default)]
        negated: bool,
    },
    TypeCast {
        expression: Box<ExpressionIR>,
        ty: TypeRef,
    },
    /// A front-end node the generator has no lowering for.
    Unsupported {
        node_kind: String,
    },
}

impl ExpressionIR {
    pub fn string(value: &str) -> Self {
        ExpressionIR::StringLiteral {
            value: value.to_string(),
        }
    }

    pub fn int(value: i64) -> Self {
        ExpressionIR::IntLiteral { value }
    }

    pub fn boolean(value: bool) -> Self {
        ExpressionIR::BoolLiteral { value }
    }

    pub fn ident(name: &str) -> Self {
        ExpressionIR::Identifier {
            name: name.to_string(),
        }
    }

    pub fn binary(op: BinaryOp, left: ExpressionIR, right: ExpressionIR) -> Self {
        ExpressionIR::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn assign(target: ExpressionIR, value: ExpressionIR) -> Self {
        ExpressionIR::Assignment {
            op: AssignOp::Assign,
            target: Box::new(target),
            value: Box::new(value),
        }
    }

    pub fn property(target: ExpressionIR, property: &str) -> Self {
        ExpressionIR::PropertyAccess {
            target: Box::new(target),
            property: property.to_string(),
            null_aware: false,
        }
    }

    /// Unqualified call, e.g. `Text("hi")` or `setState(...)`.
    pub fn call(method: &str, args: Vec<ExpressionIR>, named_args: Vec<NamedArgument>) -> Self {
        ExpressionIR::MethodCall {
            target: None,
            method: method.to_string(),
            args,
            named_args,
            null_aware: false,
        }
    }

    pub fn method_call(target: ExpressionIR, method: &str, args: Vec<ExpressionIR>) -> Self {
        ExpressionIR::MethodCall {
            target: Some(Box::new(target)),
            method: method.to_string(),
            args,
            named_args: vec![],
            null_aware: false,
        }
    }

    pub fn new_instance(
        ty: &str,
        args: Vec<ExpressionIR>,
        named_args: Vec<NamedArgument>,
    ) -> Self {
        ExpressionIR::InstanceCreation {
            ty: TypeRef::named(ty),
            constructor: None,
            args,
            named_args,
            is_const: false,
        }
    }

    pub fn lambda(params: Vec<Parameter>, statements: Vec<StatementIR>) -> Self {
        ExpressionIR::Lambda {
            params,
            body: LambdaBody::Block { statements },
            is_async: false,
        }
    }

    /// Variant name used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ExpressionIR::StringLiteral { .. } => "string-literal",
            ExpressionIR::IntLiteral { .. } => "int-literal",
            ExpressionIR::DoubleLiteral { .. } => "double-literal",
            ExpressionIR::BoolLiteral { .. } => "bool-literal",
            ExpressionIR::NullLiteral => "null-literal",
            ExpressionIR::Identifier { .. } => "identifier",
            ExpressionIR::This => "this",
            ExpressionIR::Super => "super",
            ExpressionIR::Binary { .. } => "binary",
            ExpressionIR::Unary { .. } => "unary",
            ExpressionIR::Assignment { .. } => "assignment",
            ExpressionIR::MethodCall { .. } => "method-call",
            ExpressionIR::InstanceCreation { .. } => "instance-creation",
            ExpressionIR::PropertyAccess { .. } => "property-access",
            ExpressionIR::IndexAccess { .. } => "index-access",
            ExpressionIR::Conditional { .. } => "conditional",
            ExpressionIR::ListLiteral { .. } => "list-literal",
            ExpressionIR::MapLiteral { .. } => "map-literal",
            ExpressionIR::SetLiteral { .. } => "set-literal",
            ExpressionIR::Lambda { .. } => "lambda",
            ExpressionIR::Cascade { .. } => "cascade",
            ExpressionIR::CascadeReceiver => "cascade-receiver",
            ExpressionIR::Await { .. } => "await",
            ExpressionIR::StringInterpolation { .. } => "string-interpolation",
            ExpressionIR::TypeCheck { .. } => "type-check",
            ExpressionIR::TypeCast { .. } => "type-cast",
            ExpressionIR::Unsupported { .. } => "unsupported",
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATEMENTS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchCase {
    pub patterns: Vec<ExpressionIR>,
    pub body: Vec<StatementIR>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatchClause {
    /// `on T` type; `None` catches everything.
    #[serde(default)]
    pub exception_type: Option<TypeRef>,
    #[serde(default)]
    pub exception_param: Option<String>,
    #[serde(default)]
    pub stack_trace_param: Option<String>,
    pub body: Vec<StatementIR>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum StatementIR {
    Expression {
        expression: ExpressionIR,
    },
    VariableDeclaration {
        name: String,
        #[serde(default)]
        ty: Option<TypeRef>,
        #[serde(default)]
        initializer: Option<ExpressionIR>,
        #[serde(default)]
        is_final: bool,
        #[serde(default)]
        is_const: bool,
    },
    If {
        condition: ExpressionIR,
        then_branch: Vec<StatementIR>,
        #[serde(default)]
        else_branch: Option<Vec<StatementIR>>,
    },
    For {
        #[serde(default)]
        init: Option<Box<StatementIR>>,
        #[serde(default)]
        condition: Option<ExpressionIR>,
        #[serde(default)]
        updaters: Vec<ExpressionIR>,
        body: Vec<StatementIR>,
    },
    ForEach {
        variable: String,
        #[serde(default)]
        variable_type: Option<TypeRef>,
        iterable: ExpressionIR,
        body: Vec<StatementIR>,
        #[serde(default)]
        is_final: bool,
        #[serde(default)]
        is_await: bool,
    },
    While {
        condition: ExpressionIR,
        body: Vec<StatementIR>,
    },
    DoWhile {
        body: Vec<StatementIR>,
        condition: ExpressionIR,
    },
    Switch {
        subject: ExpressionIR,
        cases: Vec<SwitchCase>,
        #[serde(default)]
        default: Option<Vec<StatementIR>>,
    },
    Try {
        body: Vec<StatementIR>,
        #[serde(default)]
        catches: Vec<CatchClause>,
        #[serde(default)]
        finally: Option<Vec<StatementIR>>,
    },
    Return {
        #[serde(default)]
        value: Option<ExpressionIR>,
    },
    Break {
        #[serde(default)]
        label: Option<String>,
    },
    Continue {
        #[serde(default)]
        label: Option<String>,
    },
    Throw {
        expression: ExpressionIR,
    },
    Rethrow,
    Block {
        statements: Vec<StatementIR>,
    },
    FunctionDeclaration {
        function: FunctionDecl,
    },
    Unsupported {
        node_kind: String,
    },
}

impl StatementIR {
    pub fn expr(expression: ExpressionIR) -> Self {
        StatementIR::Expression { expression }
    }

    pub fn ret(value: ExpressionIR) -> Self {
        StatementIR::Return { value: Some(value) }
    }

    pub fn var(name: &str, initializer: ExpressionIR, is_final: bool) -> Self {
        StatementIR::VariableDeclaration {
            name: name.to_string(),
            ty: None,
            initializer: Some(initializer),
            is_final,
            is_const: false,
        }
    }

    /// `super.<method>(...)` call statement, if this is one.
    pub fn super_call_name(&self) -> Option<&str> {
        match self {
            StatementIR::Expression {
                expression:
                    ExpressionIR::MethodCall {
                        target: Some(target),
                        method,
                        ..
                    },
            } if matches!(target.as_ref(), ExpressionIR::Super) => Some(method.as_str()),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            StatementIR::Expression { .. } => "expression",
            StatementIR::VariableDeclaration { .. } => "variable-declaration",
            StatementIR::If { .. } => "if",
            StatementIR::For { .. } => "for",
            StatementIR::ForEach { .. } => "for-each",
            StatementIR::While { .. } => "while",
            StatementIR::DoWhile { .. } => "do-while",
            StatementIR::Switch { .. } => "switch",
            StatementIR::Try { .. } => "try",
            StatementIR::Return { .. } => "return",
            StatementIR::Break { .. } => "break",
            StatementIR::Continue { .. } => "continue",
            StatementIR::Throw { .. } => "throw",
            StatementIR::Rethrow => "rethrow",
            StatementIR::Block { .. } => "block",
            StatementIR::FunctionDeclaration { .. } => "function-declaration",
            StatementIR::Unsupported { .. } => "unsupported",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_display_name() {
        let ty = TypeRef::generic("State", vec![TypeRef::named("Counter")]);
        assert_eq!(ty.display_name(), "State<Counter>");
        let mut nullable = TypeRef::named("String");
        nullable.nullable = true;
        assert_eq!(nullable.display_name(), "String?");
        assert_eq!(TypeRef::named("material.Colors").base_name(), "Colors");
    }

    #[test]
    fn test_expression_json_shape() {
        let json = r#"{
            "type": "method-call",
            "method": "Text",
            "args": [{ "type": "string-literal", "value": "hi" }]
        }"#;
        let expr: ExpressionIR = serde_json::from_str(json).expect("Should deserialize");
        match expr {
            ExpressionIR::MethodCall {
                target,
                method,
                args,
                named_args,
                ..
            } => {
                assert!(target.is_none());
                assert_eq!(method, "Text");
                assert_eq!(args.len(), 1);
                assert!(named_args.is_empty());
            }
            other => panic!("Expected method call, got {}", other.kind_name()),
        }
    }

    #[test]
    fn test_super_call_detection() {
        let stmt = StatementIR::expr(ExpressionIR::method_call(
            ExpressionIR::Super,
            "initState",
            vec![],
        ));
        assert_eq!(stmt.super_call_name(), Some("initState"));
        let other = StatementIR::expr(ExpressionIR::call("initState", vec![], vec![]));
        assert_eq!(other.super_call_name(), None);
    }
}
