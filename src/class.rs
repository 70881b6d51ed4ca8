//! Class, constructor and method emission.

use crate::analyze::effective_base;
use crate::context::{ClassContext, EmitContext};
use crate::diagnostics::{Diagnostic, Severity, FJS_METHOD_FAILED};
use crate::error::{panic_message, EmitError, EmitResult};
use crate::expression::{emit_arguments, emit_expression, emit_params};
use crate::ir::{
    BinaryOp, ClassDecl, ConstructorDecl, EnumDecl, ExpressionIR, FieldDecl, FunctionDecl,
    Parameter, ParameterKind, StatementIR,
};
use crate::js;
use crate::registry::inherited_members;
use crate::scope::{ScopeKind, VariableInfo};
use crate::statement::{emit_statements, emit_statements_block};
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};

/// `operator` methods and their JavaScript names.
pub fn operator_method_name(op: &str, param_count: usize) -> Option<&'static str> {
    Some(match (op, param_count) {
        ("==", _) => "equals",
        ("+", _) => "add",
        ("-", 0) | ("unary-", _) => "negate",
        ("-", _) => "subtract",
        ("*", _) => "multiply",
        ("/", _) => "divide",
        ("[]", _) => "get",
        ("[]=", _) => "set",
        ("<", _) => "lessThan",
        (">", _) => "greaterThan",
        ("<=", _) => "lessOrEqual",
        (">=", _) => "greaterOrEqual",
        ("%", _) => "modulo",
        ("~/", _) => "intDivide",
        _ => return None,
    })
}

/// Emitted name of a member.
pub fn member_name(method: &FunctionDecl) -> EmitResult<String> {
    if method.is_operator {
        return operator_method_name(&method.name, method.params.len())
            .map(|s| s.to_string())
            .ok_or_else(|| EmitError::UnsupportedOperator(method.name.clone()));
    }
    if js::is_valid_member(&method.name) {
        Ok(method.name.clone())
    } else {
        Err(EmitError::InvalidIdentifier(method.name.clone()))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ACCESSOR MERGE
// ═══════════════════════════════════════════════════════════════════════════════

/// Parameter of a merged accessor. The setter's own parameter name is bound
/// only inside the setter branch so the getter still sees same-named fields.
pub const ACCESSOR_VALUE: &str = "__value";

/// Folds a getter/setter pair into one function of an optional value:
///
/// ```text
/// x(__value) {
///   if (__value !== undefined) { const v = __value; <setter body>; return __value; }
///   else { <getter body> }
/// }
/// ```
pub fn merge_accessor(getter: &FunctionDecl, setter: &FunctionDecl) -> EmitResult<FunctionDecl> {
    let [param] = setter.params.as_slice() else {
        return Err(EmitError::MalformedAccessor {
            name: setter.name.clone(),
            reason: format!("setter takes {} parameters, expected 1", setter.params.len()),
        });
    };

    let mut set_body = Vec::new();
    if param.name != ACCESSOR_VALUE {
        set_body.push(StatementIR::VariableDeclaration {
            name: param.name.clone(),
            ty: param.ty.clone(),
            initializer: Some(ExpressionIR::ident(ACCESSOR_VALUE)),
            is_final: true,
            is_const: false,
        });
    }
    set_body.extend(setter.body.clone().unwrap_or_default());
    set_body.push(StatementIR::ret(ExpressionIR::ident(ACCESSOR_VALUE)));
    let get_body = getter.body.clone().unwrap_or_default();

    let mut unified = Parameter::positional(ACCESSOR_VALUE);
    unified.kind = ParameterKind::OptionalPositional;
    unified.ty = param.ty.clone();

    Ok(FunctionDecl {
        name: getter.name.clone(),
        params: vec![unified],
        return_type: getter.return_type.clone(),
        body: Some(vec![StatementIR::If {
            condition: ExpressionIR::binary(
                BinaryOp::NotEq,
                ExpressionIR::ident(ACCESSOR_VALUE),
                ExpressionIR::ident("undefined"),
            ),
            then_branch: set_body,
            else_branch: Some(get_body),
        }]),
        is_async: false,
        is_getter: false,
        is_setter: false,
        is_static: getter.is_static,
        is_operator: false,
        location: getter.location,
    })
}

/// Declarations in source order with getter/setter pairs merged at the
/// position of the first half.
pub fn merge_accessors(methods: &[FunctionDecl]) -> Vec<EmitResult<FunctionDecl>> {
    let mut out = Vec::new();
    let mut done = HashSet::new();
    for method in methods {
        // Static accessors stay native `static get`/`static set`.
        if !method.is_accessor() || method.is_static {
            out.push(Ok(method.clone()));
            continue;
        }
        if !done.insert((method.name.clone(), method.is_static)) {
            continue;
        }
        let partner = methods.iter().find(|m| {
            m.name == method.name
                && m.is_static == method.is_static
                && m.is_getter != method.is_getter
                && m.is_accessor()
        });
        match partner {
            Some(other) => {
                let (getter, setter) = if method.is_getter { (method, other) } else { (other, method) };
                out.push(merge_accessor(getter, setter));
            }
            None => out.push(Ok(method.clone())),
        }
    }
    out
}

/// Names of getter/setter pairs that merge into callables.
pub fn paired_accessors(methods: &[FunctionDecl]) -> HashSet<String> {
    methods
        .iter()
        .filter(|m| m.is_getter && !m.is_static)
        .filter(|g| methods.iter().any(|s| s.is_setter && !s.is_static && s.name == g.name))
        .map(|g| g.name.clone())
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLASS SCOPE
// ═══════════════════════════════════════════════════════════════════════════════

pub fn class_context(class: &ClassDecl) -> ClassContext {
    ClassContext {
        name: class.name.clone(),
        methods: class
            .methods
            .iter()
            .filter(|m| !m.is_static && !m.is_accessor() && !m.is_operator)
            .map(|m| m.name.clone())
            .collect(),
        accessors: paired_accessors(&class.methods),
    }
}

/// Registers own and inherited members in the current (class) frame.
pub fn declare_members(ctx: &mut EmitContext, class: &ClassDecl, base: &str) {
    // Inherited first so own declarations overwrite them.
    let mut seen = HashSet::new();
    let mut chain = Vec::new();
    let mut current = class.superclass.as_ref().map(|t| t.base_name().to_string());
    while let Some(name) = current {
        if !seen.insert(name.clone()) {
            break;
        }
        match ctx.class_index.get(&name) {
            Some(summary) => {
                chain.push((name.clone(), summary.clone()));
                current = summary.superclass.clone();
            }
            None => current = None,
        }
    }
    let root = chain
        .last()
        .and_then(|(_, s)| s.superclass.clone())
        .unwrap_or_else(|| base.to_string());
    for member in inherited_members(&root) {
        ctx.scope.add_variable(VariableInfo::field(member, &class.name, None, false));
    }
    for (owner, summary) in chain.iter().rev() {
        for member in &summary.members {
            ctx.scope.add_variable(VariableInfo::field(member, owner, None, false));
        }
        for member in &summary.static_members {
            ctx.scope.add_variable(VariableInfo::static_field(member, owner, None));
        }
    }

    for field in &class.fields {
        ctx.scope.add_variable(VariableInfo::field(&field.name, &class.name, field.ty.clone(), field.is_final));
    }
    for field in &class.static_fields {
        ctx.scope.add_variable(VariableInfo::static_field(&field.name, &class.name, field.ty.clone()));
    }
    for method in class.methods.iter().filter(|m| !m.is_operator) {
        let info = if method.is_static {
            VariableInfo::static_field(&method.name, &class.name, None)
        } else {
            VariableInfo::field(&method.name, &class.name, None, true)
        };
        ctx.scope.add_variable(info);
    }
}

/// Runs `f` inside the class frame with members declared, one level in.
pub fn in_class_body<T>(
    ctx: &mut EmitContext,
    class: &ClassDecl,
    base: &str,
    f: impl FnOnce(&mut EmitContext) -> T,
) -> T {
    let class_ctx = class_context(class);
    ctx.scoped(&class.name, ScopeKind::Class, |ctx| {
        declare_members(ctx, class, base);
        ctx.with_class(class_ctx, |ctx| ctx.indented(f))
    })
}

pub fn resolve_base(ctx: &EmitContext, class: &ClassDecl) -> String {
    effective_base(
        class.superclass.as_ref().map(|t| t.base_name()),
        &ctx.class_index,
        ctx.registry,
        ctx.symbols,
    )
}

/// `extends` target text, routed through the lazy proxy when needed.
fn base_reference(ctx: &EmitContext, base: &str) -> String {
    if ctx.lazy_symbols.contains(base) {
        format!("__lazyImports.{}", base)
    } else {
        base.to_string()
    }
}

pub fn wrap_class(ctx: &EmitContext, class: &ClassDecl, base: &str, members: Vec<String>) -> String {
    let header = format!("{}class {} extends {} {{", ctx.pad(), class.name, base_reference(ctx, base));
    let members: Vec<String> = members.into_iter().filter(|m| !m.is_empty()).collect();
    if members.is_empty() {
        return format!("{}\n{}}}", header, ctx.pad());
    }
    format!("{}\n{}\n{}}}", header, members.join("\n\n"), ctx.pad())
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLASS
// ═══════════════════════════════════════════════════════════════════════════════

/// Plain (non-state) class. Stateful widgets get a `createState` that
/// constructs the paired state class.
pub fn emit_class(ctx: &mut EmitContext, class: &ClassDecl, state_class: Option<&str>) -> String {
    let base = resolve_base(ctx, class);
    let members = in_class_body(ctx, class, &base, |ctx| {
        let mut members = emit_static_fields(ctx, class);
        members.extend(emit_constructors(ctx, class));
        if base == "StatefulWidget" {
            if let Some(state) = state_class {
                members.push(emit_create_state(ctx, state));
            }
        }
        for method in merge_accessors(&class.methods) {
            if base == "StatefulWidget" && state_class.is_some() {
                if let Ok(m) = &method {
                    if m.name == "createState" {
                        continue;
                    }
                }
            }
            members.push(emit_member_isolated(ctx, &class.name, method));
        }
        members
    });
    wrap_class(ctx, class, &base, members)
}

fn emit_create_state(ctx: &EmitContext, state: &str) -> String {
    let pad = ctx.pad();
    format!(
        "{}createState() {{\n{}{}return new {}();\n{}}}",
        pad,
        pad,
        js::INDENT,
        state,
        pad
    )
}

pub fn emit_static_fields(ctx: &mut EmitContext, class: &ClassDecl) -> Vec<String> {
    if class.static_fields.is_empty() {
        return vec![];
    }
    let pad = ctx.pad();
    let lines: Vec<String> = class
        .static_fields
        .iter()
        .map(|field| {
            let value = ctx.with_member(&field.name, |ctx| {
                field
                    .initializer
                    .as_ref()
                    .map(|e| emit_expression(ctx, e))
                    .unwrap_or_else(|| "null".to_string())
            });
            format!("{}static {} = {};", pad, field.name, value)
        })
        .collect();
    vec![lines.join("\n")]
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONSTRUCTORS
// ═══════════════════════════════════════════════════════════════════════════════

pub fn emit_constructors(ctx: &mut EmitContext, class: &ClassDecl) -> Vec<String> {
    let unnamed = class.constructors.iter().find(|c| c.name.is_none());
    let mut out = vec![match unnamed {
        Some(ctor) if ctor.is_factory => emit_factory_constructor(ctx, ctor),
        Some(ctor) => emit_generative(ctx, class, Some(ctor), "constructor"),
        None => emit_generative(ctx, class, None, "constructor"),
    }];
    for ctor in class.constructors.iter().filter(|c| c.name.is_some()) {
        let name = ctor.name.clone().unwrap_or_default();
        if ctor.is_factory {
            out.push(emit_static_factory(ctx, &name, ctor));
        } else {
            out.push(emit_named_constructor(ctx, class, &name, ctor));
        }
    }
    out
}

fn field_initializers(ctx: &mut EmitContext, fields: &[FieldDecl]) -> Vec<String> {
    fields
        .iter()
        .map(|f| {
            let value = f
                .initializer
                .as_ref()
                .map(|e| emit_expression(ctx, e))
                .unwrap_or_else(|| "null".to_string());
            format!("{}this.{} = {};", ctx.pad(), f.name, value)
        })
        .collect()
}

/// Field formals, initializer list, then the body; at the current indent.
fn constructor_tail(ctx: &mut EmitContext, ctor: &ConstructorDecl, receiver: &str) -> Vec<String> {
    let pad = ctx.pad();
    let mut lines = Vec::new();
    for p in ctor.params.iter().filter(|p| p.is_field_formal) {
        lines.push(format!("{}{}.{} = {};", pad, receiver, p.name, p.name));
    }
    for init in &ctor.initializers {
        let value = emit_expression(ctx, &init.value);
        lines.push(format!("{}{}.{} = {};", pad, receiver, init.field, value));
    }
    if let Some(body) = &ctor.body {
        if !body.is_empty() {
            lines.push(emit_statements(ctx, body));
        }
    }
    lines
}

fn block(pad: &str, header: &str, lines: Vec<String>) -> String {
    if lines.is_empty() {
        format!("{}{} {{}}", pad, header)
    } else {
        format!("{}{} {{\n{}\n{}}}", pad, header, lines.join("\n"), pad)
    }
}

/// `constructor(...)`: super call, field initializers, then the source
/// constructor's own work.
fn emit_generative(ctx: &mut EmitContext, class: &ClassDecl, ctor: Option<&ConstructorDecl>, name: &str) -> String {
    let pad = ctx.pad();
    ctx.with_member(name, |ctx| {
        ctx.scoped(name, ScopeKind::Function, |ctx| {
            // Field initializers run before any parameter is in scope.
            let fields = ctx.indented(|ctx| field_initializers(ctx, &class.fields));
            let params = ctor.map(|c| emit_params(ctx, &c.params)).unwrap_or_default();
            let mut lines = Vec::new();
            ctx.indented(|ctx| {
                if ctx.options.call_super_constructor {
                    let args = ctor
                        .map(|c| emit_arguments(ctx, &c.super_args, &c.super_named_args))
                        .unwrap_or_default();
                    lines.push(format!("{}super({});", ctx.pad(), args));
                }
                lines.extend(fields);
                if let Some(ctor) = ctor {
                    lines.extend(constructor_tail(ctx, ctor, "this"));
                }
            });
            block(&pad, &format!("constructor({})", params), lines)
        })
    })
}

/// Unnamed factory: a constructor returning the produced object.
fn emit_factory_constructor(ctx: &mut EmitContext, ctor: &ConstructorDecl) -> String {
    let pad = ctx.pad();
    ctx.with_member("constructor", |ctx| {
        ctx.scoped("constructor", ScopeKind::Function, |ctx| {
            let params = emit_params(ctx, &ctor.params);
            let body = emit_statements_block(ctx, ctor.body.as_deref().unwrap_or(&[]));
            format!("{}constructor({}) {}", pad, params, body)
        })
    })
}

fn emit_static_factory(ctx: &mut EmitContext, name: &str, ctor: &ConstructorDecl) -> String {
    let pad = ctx.pad();
    ctx.with_member(name, |ctx| {
        ctx.scoped(name, ScopeKind::Function, |ctx| {
            let params = emit_params(ctx, &ctor.params);
            let body = emit_statements_block(ctx, ctor.body.as_deref().unwrap_or(&[]));
            format!("{}static {}({}) {}", pad, name, params, body)
        })
    })
}

/// `Foo.bar(...)`: a static creator plus a `$bar` instance initializer.
///
/// The instance already ran the unnamed constructor chain, so `: super(...)`
/// arguments re-run the base constructor against the subclass and copy the
/// resulting own fields onto `this`.
fn emit_named_constructor(ctx: &mut EmitContext, class: &ClassDecl, name: &str, ctor: &ConstructorDecl) -> String {
    let pad = ctx.pad();
    let base = base_reference(ctx, &resolve_base(ctx, class));
    let inner = format!("{}{}", pad, js::INDENT);
    let creator = format!(
        "{}static {}(...args) {{\n{}const __self = new {}();\n{}__self.${}(...args);\n{}return __self;\n{}}}",
        pad, name, inner, class.name, inner, name, inner, pad
    );
    let initializer_name = format!("${}", name);
    let initializer = ctx.with_member(name, |ctx| {
        ctx.scoped(&initializer_name, ScopeKind::Function, |ctx| {
            let params = emit_params(ctx, &ctor.params);
            let lines = ctx.indented(|ctx| {
                let mut lines = Vec::new();
                let has_super_args = !ctor.super_args.is_empty() || !ctor.super_named_args.is_empty();
                if has_super_args && ctx.options.call_super_constructor {
                    let args = emit_arguments(ctx, &ctor.super_args, &ctor.super_named_args);
                    lines.push(format!(
                        "{}Object.assign(this, Reflect.construct({}, [{}], this.constructor));",
                        ctx.pad(),
                        base,
                        args
                    ));
                }
                lines.extend(constructor_tail(ctx, ctor, "this"));
                lines
            });
            block(&pad, &format!("{}({})", initializer_name, params), lines)
        })
    });
    format!("{}\n\n{}", creator, initializer)
}

// ═══════════════════════════════════════════════════════════════════════════════
// METHODS
// ═══════════════════════════════════════════════════════════════════════════════

/// One method at the current indent. Abstract methods throw when called.
pub fn emit_method(ctx: &mut EmitContext, class_name: &str, method: &FunctionDecl) -> EmitResult<String> {
    let name = member_name(method)?;
    if method.is_setter && method.params.len() != 1 {
        return Err(EmitError::MalformedAccessor {
            name: method.name.clone(),
            reason: format!("setter takes {} parameters, expected 1", method.params.len()),
        });
    }
    let pad = ctx.pad();
    let mut header = String::new();
    if method.is_static {
        header.push_str("static ");
    }
    if method.is_async {
        header.push_str("async ");
    }
    if method.is_getter {
        header.push_str("get ");
    } else if method.is_setter {
        header.push_str("set ");
    }
    header.push_str(&name);

    Ok(ctx.with_member(&method.name, |ctx| {
        ctx.scoped(&method.name, ScopeKind::Function, |ctx| {
            ctx.with_async(method.is_async, |ctx| {
                let params = emit_params(ctx, &method.params);
                let body = match &method.body {
                    Some(body) => emit_statements_block(ctx, body),
                    None => {
                        let inner = format!("{}{}", pad, js::INDENT);
                        format!(
                            "{{\n{}throw new Error({});\n{}}}",
                            inner,
                            js::quote(&format!("{}.{} is abstract", class_name, method.name)),
                            pad
                        )
                    }
                };
                format!("{}{}({}) {}", pad, header, params, body)
            })
        })
    }))
}

/// Emits one member; a conversion error or panic yields a marked stub.
pub fn emit_member_isolated(ctx: &mut EmitContext, class_name: &str, method: EmitResult<FunctionDecl>) -> String {
    let method = match method {
        Ok(m) => m,
        Err(err) => {
            let member = match &err {
                EmitError::MalformedAccessor { name, .. } => name.clone(),
                _ => "accessor".to_string(),
            };
            return failed_stub(ctx, class_name, &member, &err.to_string());
        }
    };
    let checkpoint = ctx.checkpoint();
    let result = panic::catch_unwind(AssertUnwindSafe(|| emit_method(ctx, class_name, &method)));
    match result {
        Ok(Ok(text)) => text,
        Ok(Err(err)) => failed_stub(ctx, class_name, &method.name, &err.to_string()),
        Err(payload) => {
            ctx.restore(checkpoint);
            let message = panic_message(payload.as_ref());
            failed_stub(ctx, class_name, &method.name, &message)
        }
    }
}

fn failed_stub(ctx: &mut EmitContext, class_name: &str, member: &str, reason: &str) -> String {
    ctx.report(
        Diagnostic::new(
            FJS_METHOD_FAILED,
            Severity::Warning,
            &format!("Could not generate `{}.{}`: {}", class_name, member, reason),
        )
        .with_node(&format!("{}.{}", class_name, member)),
    );
    let pad = ctx.pad();
    let inner = format!("{}{}", pad, js::INDENT);
    let stub_name = if js::is_valid_member(member) {
        member.to_string()
    } else {
        format!("__failed_{}", js::sanitize_ident(&member.replace(|c: char| !c.is_ascii_alphanumeric(), "_")))
    };
    format!(
        "{}{}() {{\n{}/* GENERATION FAILED: {} */\n{}throw new Error({});\n{}}}",
        pad,
        stub_name,
        inner,
        reason.replace("*/", "* /"),
        inner,
        js::quote(&format!("{}.{} failed to generate", class_name, member)),
        pad
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// TOP-LEVEL DECLARATIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Top-level function. Getters and setters become plain callables.
pub fn emit_function(ctx: &mut EmitContext, function: &FunctionDecl) -> String {
    let prefix = if function.is_async { "async " } else { "" };
    ctx.with_member(&function.name, |ctx| {
        ctx.scoped(&function.name, ScopeKind::Function, |ctx| {
            ctx.with_async(function.is_async, |ctx| {
                let params = emit_params(ctx, &function.params);
                let body = emit_statements_block(ctx, function.body.as_deref().unwrap_or(&[]));
                format!("{}function {}({}) {}", prefix, function.name, params, body)
            })
        })
    })
}

/// Merges top-level accessor pairs, then emits each function.
pub fn emit_functions(ctx: &mut EmitContext, functions: &[FunctionDecl]) -> Vec<String> {
    merge_accessors(functions)
        .into_iter()
        .map(|f| match f {
            Ok(f) => emit_function(ctx, &f),
            Err(err) => {
                ctx.report(Diagnostic::new(FJS_METHOD_FAILED, Severity::Warning, &err.to_string()));
                format!("/* GENERATION FAILED: {} */", err.to_string().replace("*/", "* /"))
            }
        })
        .collect()
}

/// Enum as a frozen class of named, indexed instances.
pub fn emit_enum(decl: &EnumDecl) -> String {
    let i1 = js::indent(1);
    let i2 = js::indent(2);
    let mut lines = vec![format!("class {} {{", decl.name)];
    for (index, value) in decl.values.iter().enumerate() {
        lines.push(format!(
            "{}static {} = Object.freeze(new {}({}, {}));",
            i1,
            value,
            decl.name,
            js::quote(value),
            index
        ));
    }
    let refs: Vec<String> = decl.values.iter().map(|v| format!("{}.{}", decl.name, v)).collect();
    lines.push(format!("{}static values = Object.freeze([{}]);", i1, refs.join(", ")));
    lines.push(String::new());
    lines.push(format!("{}constructor(name, index) {{", i1));
    lines.push(format!("{}this.name = name;", i2));
    lines.push(format!("{}this.index = index;", i2));
    lines.push(format!("{}}}", i1));
    lines.push(String::new());
    lines.push(format!("{}toString() {{", i1));
    lines.push(format!("{}return `{}.${{this.name}}`;", i2, decl.name));
    lines.push(format!("{}}}", i1));
    lines.push("}".to_string());
    lines.push(format!("Object.freeze({});", decl.name));
    lines.join("\n")
}
