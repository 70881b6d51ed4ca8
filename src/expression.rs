//! Expression lowering.
//!
//! Emission is fail-soft: a node that cannot be lowered produces a marked
//! placeholder and a diagnostic instead of an error, so one bad node never
//! aborts the surrounding class.

use crate::context::EmitContext;
use crate::diagnostics::{
    Diagnostic, Severity, FJS_AWAIT_OUTSIDE_ASYNC, FJS_UNRESOLVED_IDENTIFIER,
    FJS_UNSUPPORTED_EXPRESSION,
};
use crate::ir::{
    AssignOp, BinaryOp, ExpressionIR, InterpolationPart, LambdaBody, MapEntryIR, NamedArgument,
    Parameter, ParameterKind, TypeRef, UnaryOp,
};
use crate::js;
use crate::scope::{is_js_global, is_runtime_export, ScopeKind};
use crate::statement;
use crate::widget;

/// Dart core types tested by `__isType` through a type tag string.
pub const CORE_TYPE_TAGS: &[&str] = &[
    "int", "double", "num", "String", "bool", "dynamic", "Object", "List", "Map", "Function",
    "Null", "Iterable",
];

pub fn binary_operator(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div | BinaryOp::IntDiv => "/",
        BinaryOp::Mod => "%",
        BinaryOp::Eq => "===",
        BinaryOp::NotEq => "!==",
        BinaryOp::Lt => "<",
        BinaryOp::Gt => ">",
        BinaryOp::LtEq => "<=",
        BinaryOp::GtEq => ">=",
        BinaryOp::And => "&&",
        BinaryOp::Or => "||",
        BinaryOp::IfNull => "??",
        BinaryOp::BitAnd => "&",
        BinaryOp::BitOr => "|",
        BinaryOp::BitXor => "^",
        BinaryOp::Shl => "<<",
        BinaryOp::Shr => ">>",
        BinaryOp::UShr => ">>>",
    }
}

fn assign_operator(op: AssignOp) -> &'static str {
    match op {
        AssignOp::Assign => "=",
        AssignOp::AddAssign => "+=",
        AssignOp::SubAssign => "-=",
        AssignOp::MulAssign => "*=",
        AssignOp::DivAssign => "/=",
        AssignOp::ModAssign => "%=",
        AssignOp::IfNullAssign => "??=",
        AssignOp::IntDivAssign => "/=",
    }
}

pub fn emit_expression(ctx: &mut EmitContext, expr: &ExpressionIR) -> String {
    match expr {
        ExpressionIR::StringLiteral { value } => js::quote(value),
        ExpressionIR::IntLiteral { value } => value.to_string(),
        ExpressionIR::DoubleLiteral { value } => js::format_float(*value),
        ExpressionIR::BoolLiteral { value } => value.to_string(),
        ExpressionIR::NullLiteral => "null".to_string(),
        ExpressionIR::Identifier { name } => emit_identifier(ctx, name),
        ExpressionIR::This => "this".to_string(),
        ExpressionIR::Super => "super".to_string(),
        ExpressionIR::Binary { op, left, right } => emit_binary(ctx, *op, left, right),
        ExpressionIR::Unary { op, operand } => emit_unary(ctx, *op, operand),
        ExpressionIR::Assignment { op, target, value } => emit_assignment(ctx, *op, target, value),
        ExpressionIR::MethodCall {
            target,
            method,
            args,
            named_args,
            null_aware,
        } => emit_method_call(ctx, target.as_deref(), method, args, named_args, *null_aware),
        ExpressionIR::InstanceCreation {
            ty,
            constructor,
            args,
            named_args,
            ..
        } => emit_instance_creation(ctx, ty, constructor.as_deref(), args, named_args),
        ExpressionIR::PropertyAccess {
            target,
            property,
            null_aware,
        } => emit_property_access(ctx, target, property, *null_aware),
        ExpressionIR::IndexAccess {
            target,
            index,
            null_aware,
        } => {
            let t = emit_operand(ctx, target);
            let i = emit_expression(ctx, index);
            if *null_aware {
                format!("{}?.[{}]", t, i)
            } else {
                format!("{}[{}]", t, i)
            }
        }
        ExpressionIR::Conditional {
            condition,
            then_value,
            else_value,
        } => {
            let c = emit_expression(ctx, condition);
            let t = emit_expression(ctx, then_value);
            let e = emit_expression(ctx, else_value);
            format!("({}) ? ({}) : ({})", c, t, e)
        }
        ExpressionIR::ListLiteral { elements, is_const } => {
            let items = emit_list(ctx, elements);
            if *is_const {
                format!("Object.freeze([{}])", items)
            } else {
                format!("[{}]", items)
            }
        }
        ExpressionIR::MapLiteral { entries, is_const } => {
            let record = emit_map_entries(ctx, entries);
            if *is_const {
                format!("Object.freeze({})", record)
            } else {
                record
            }
        }
        ExpressionIR::SetLiteral { elements, .. } => {
            format!("new Set([{}])", emit_list(ctx, elements))
        }
        ExpressionIR::Lambda {
            params,
            body,
            is_async,
        } => emit_lambda(ctx, params, body, *is_async),
        ExpressionIR::Cascade { target, sections } => emit_cascade(ctx, target, sections),
        ExpressionIR::CascadeReceiver => {
            let current = ctx.current_cascade().map(|s| s.to_string());
            match current {
                Some(name) => name,
                None => unsupported(ctx, "cascade receiver outside cascade"),
            }
        }
        ExpressionIR::Await { expression } => {
            let inner = emit_operand(ctx, expression);
            if ctx.is_async() {
                format!("await {}", inner)
            } else {
                ctx.report(
                    Diagnostic::new(
                        FJS_AWAIT_OUTSIDE_ASYNC,
                        Severity::Warning,
                        "`await` used outside an async function; emitted without await",
                    )
                    .with_suggestion("Mark the enclosing function `async`."),
                );
                inner
            }
        }
        ExpressionIR::StringInterpolation { parts } => {
            let mut out = String::from("`");
            for part in parts {
                match part {
                    InterpolationPart::Text { value } => out.push_str(&js::escape_template(value)),
                    InterpolationPart::Expression { expression } => {
                        out.push_str("${");
                        out.push_str(&emit_expression(ctx, expression));
                        out.push('}');
                    }
                }
            }
            out.push('`');
            out
        }
        ExpressionIR::TypeCheck {
            expression,
            ty,
            negated,
        } => {
            let value = emit_expression(ctx, expression);
            let check = format!("__isType({}, {})", value, type_tag(ctx, ty));
            if *negated {
                format!("!{}", check)
            } else {
                check
            }
        }
        // Casts are erased.
        ExpressionIR::TypeCast { expression, .. } => emit_expression(ctx, expression),
        ExpressionIR::Unsupported { node_kind } => unsupported(ctx, node_kind),
    }
}

/// Placeholder for nodes with no lowering.
pub fn unsupported(ctx: &mut EmitContext, what: &str) -> String {
    ctx.report(Diagnostic::new(
        FJS_UNSUPPORTED_EXPRESSION,
        Severity::Error,
        &format!("Unsupported expression: {}", what),
    ));
    format!("undefined /* FJS: unsupported expression {} */", what.replace("*/", "* /"))
}

/// Second argument of `__isType`: a tag string for core types, the class otherwise.
pub fn type_tag(ctx: &mut EmitContext, ty: &TypeRef) -> String {
    let name = ty.base_name();
    if CORE_TYPE_TAGS.contains(&name) {
        js::quote(name)
    } else {
        emit_identifier(ctx, name)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// IDENTIFIERS
// ═══════════════════════════════════════════════════════════════════════════════

pub fn emit_identifier(ctx: &mut EmitContext, name: &str) -> String {
    if let Some(info) = ctx.scope.resolve_variable(name) {
        let prefix = ctx.scope.get_prefix_for_variable(name);
        let is_instance_field = info.is_field && !info.is_static;
        if is_instance_field && ctx.is_accessor(name) {
            return format!("this.{}()", name);
        }
        if !info.is_field && is_module_accessor(ctx, name) {
            return format!("{}()", name);
        }
        return format!("{}{}", prefix, name);
    }
    if ctx.lazy_symbols.contains(name) {
        return format!("__lazyImports.{}", name);
    }
    let capitalized = name.starts_with(|c: char| c.is_ascii_uppercase());
    if capitalized
        || is_js_global(name)
        || is_runtime_export(name)
        || ctx.import_prefixes.contains(name)
        || ctx.symbols.contains(name)
        || name.starts_with("__")
    {
        return name.to_string();
    }
    ctx.report(
        Diagnostic::new(
            FJS_UNRESOLVED_IDENTIFIER,
            Severity::Error,
            &format!("Unresolved identifier `{}`", name),
        )
        .with_suggestion("Declare it, import it, or add it to the global symbol table."),
    );
    format!("{} /* unresolved */", name)
}

// ═══════════════════════════════════════════════════════════════════════════════
// OPERATORS
// ═══════════════════════════════════════════════════════════════════════════════

fn needs_parens(expr: &ExpressionIR) -> bool {
    matches!(
        expr,
        ExpressionIR::Binary { .. }
            | ExpressionIR::Conditional { .. }
            | ExpressionIR::Assignment { .. }
            | ExpressionIR::Lambda { .. }
            | ExpressionIR::Await { .. }
            | ExpressionIR::TypeCheck { negated: true, .. }
    )
}

/// Emits a sub-expression, parenthesized when it would bind loosely.
pub fn emit_operand(ctx: &mut EmitContext, expr: &ExpressionIR) -> String {
    let text = emit_expression(ctx, expr);
    if needs_parens(expr) {
        format!("({})", text)
    } else {
        text
    }
}

fn emit_binary(ctx: &mut EmitContext, op: BinaryOp, left: &ExpressionIR, right: &ExpressionIR) -> String {
    let l = emit_operand(ctx, left);
    let r = emit_operand(ctx, right);
    if op == BinaryOp::IntDiv {
        return format!("Math.floor({} / {})", l, r);
    }
    format!("{} {} {}", l, binary_operator(op), r)
}

fn emit_unary(ctx: &mut EmitContext, op: UnaryOp, operand: &ExpressionIR) -> String {
    if op == UnaryOp::NullAssert {
        return format!("__nonNull({})", emit_expression(ctx, operand));
    }
    let o = emit_operand(ctx, operand);
    match op {
        // `--1` would lex as a decrement.
        UnaryOp::Neg if o.starts_with('-') => format!("-({})", o),
        UnaryOp::Neg => format!("-{}", o),
        UnaryOp::Not => format!("!{}", o),
        UnaryOp::BitNot => format!("~{}", o),
        UnaryOp::PreIncrement => format!("++{}", o),
        UnaryOp::PreDecrement => format!("--{}", o),
        UnaryOp::PostIncrement => format!("{}++", o),
        UnaryOp::PostDecrement => format!("{}--", o),
        UnaryOp::NullAssert => o,
    }
}

/// Callee of the merged accessor an assignment target writes, if any.
fn accessor_target(ctx: &EmitContext, target: &ExpressionIR) -> Option<String> {
    match target {
        ExpressionIR::Identifier { name } => {
            let info = ctx.scope.resolve_variable(name)?;
            if info.is_field && !info.is_static && ctx.is_accessor(name) {
                Some(format!("this.{}", name))
            } else if !info.is_field && is_module_accessor(ctx, name) {
                Some(name.clone())
            } else {
                None
            }
        }
        ExpressionIR::PropertyAccess {
            target, property, ..
        } if matches!(target.as_ref(), ExpressionIR::This) && ctx.is_accessor(property) => {
            Some(format!("this.{}", property))
        }
        _ => None,
    }
}

fn is_module_accessor(ctx: &EmitContext, name: &str) -> bool {
    ctx.module_accessors.contains(name) && ctx.scope.resolves_to_module(name)
}

fn emit_assignment(ctx: &mut EmitContext, op: AssignOp, target: &ExpressionIR, value: &ExpressionIR) -> String {
    if let Some(callee) = accessor_target(ctx, target) {
        let v = emit_expression(ctx, value);
        let current = format!("{}()", callee);
        let next = match op {
            AssignOp::Assign => v,
            AssignOp::IntDivAssign => format!("Math.floor({} / ({}))", current, v),
            other => {
                let bin = assign_operator(other).trim_end_matches('=');
                format!("{} {} ({})", current, bin, v)
            }
        };
        return format!("{}({})", callee, next);
    }
    let t = emit_expression(ctx, target);
    let v = emit_expression(ctx, value);
    if op == AssignOp::IntDivAssign {
        return format!("{} = Math.floor({} / ({}))", t, t, v);
    }
    format!("{} {} {}", t, assign_operator(op), v)
}

// ═══════════════════════════════════════════════════════════════════════════════
// CALLS
// ═══════════════════════════════════════════════════════════════════════════════

/// Positional arguments followed by one record of named arguments.
pub fn emit_arguments(ctx: &mut EmitContext, args: &[ExpressionIR], named: &[NamedArgument]) -> String {
    let mut parts: Vec<String> = args.iter().map(|a| emit_expression(ctx, a)).collect();
    if !named.is_empty() {
        let fields: Vec<String> = named
            .iter()
            .map(|n| format!("{}: {}", js::property_key(&n.name), emit_expression(ctx, &n.value)))
            .collect();
        parts.push(format!("{{ {} }}", fields.join(", ")));
    }
    parts.join(", ")
}

fn is_widget_name(ctx: &EmitContext, name: &str) -> bool {
    ctx.registry.is_widget(name) || ctx.widget_classes.contains(name)
}

fn emit_method_call(
    ctx: &mut EmitContext,
    target: Option<&ExpressionIR>,
    method: &str,
    args: &[ExpressionIR],
    named: &[NamedArgument],
    null_aware: bool,
) -> String {
    let Some(target) = target else {
        return emit_unqualified_call(ctx, method, args, named);
    };

    // `Widget.named(...)` constructors on registry widgets.
    if let ExpressionIR::Identifier { name } = target {
        if is_widget_name(ctx, name) && ctx.scope.resolve_variable(name).is_none() {
            return widget::emit_widget(ctx, name, Some(method), args, named);
        }
    }

    let t = match target {
        ExpressionIR::Super => "super".to_string(),
        other => emit_operand(ctx, other),
    };
    let call_args = emit_arguments(ctx, args, named);
    let dot = if null_aware { "?." } else { "." };
    if js::is_valid_member(method) {
        format!("{}{}{}({})", t, dot, method, call_args)
    } else {
        let access = if null_aware { "?.[" } else { "[" };
        format!("{}{}{}]({})", t, access, js::quote(method), call_args)
    }
}

fn emit_unqualified_call(ctx: &mut EmitContext, method: &str, args: &[ExpressionIR], named: &[NamedArgument]) -> String {
    if method == "setState" && ctx.scope.resolve_variable("setState").map_or(true, |v| v.is_field) {
        return emit_set_state(ctx, args);
    }

    if is_widget_name(ctx, method) && ctx.scope.resolve_variable(method).is_none() {
        return widget::emit_widget(ctx, method, None, args, named);
    }

    let call_args = emit_arguments(ctx, args, named);

    if ctx.scope.resolve_variable(method).is_some() {
        let callee = emit_identifier(ctx, method);
        return format!("{}({})", callee, call_args);
    }

    if method.starts_with(|c: char| c.is_ascii_uppercase()) {
        let class = emit_identifier(ctx, method);
        return format!("new {}({})", class, call_args);
    }

    let callee = emit_identifier(ctx, method);
    format!("{}({})", callee, call_args)
}

/// `setState(fn)` becomes a reactive update on the state instance.
fn emit_set_state(ctx: &mut EmitContext, args: &[ExpressionIR]) -> String {
    match args.first() {
        None => "this.setState(() => {})".to_string(),
        Some(arg) => format!("this.setState({})", emit_expression(ctx, arg)),
    }
}

fn emit_instance_creation(
    ctx: &mut EmitContext,
    ty: &TypeRef,
    constructor: Option<&str>,
    args: &[ExpressionIR],
    named: &[NamedArgument],
) -> String {
    let name = ty.base_name().to_string();
    if is_widget_name(ctx, &name) {
        return widget::emit_widget(ctx, &name, constructor, args, named);
    }
    let class = emit_identifier(ctx, &name);
    let call_args = emit_arguments(ctx, args, named);
    match constructor {
        Some(ctor) => format!("{}.{}({})", class, ctor, call_args),
        None => format!("new {}({})", class, call_args),
    }
}

fn emit_property_access(ctx: &mut EmitContext, target: &ExpressionIR, property: &str, null_aware: bool) -> String {
    if matches!(target, ExpressionIR::This) && ctx.is_accessor(property) {
        return format!("this.{}()", property);
    }
    let t = emit_operand(ctx, target);
    if js::is_valid_member(property) {
        format!("{}{}{}", t, if null_aware { "?." } else { "." }, property)
    } else {
        format!("{}{}{}]", t, if null_aware { "?.[" } else { "[" }, js::quote(property))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COLLECTIONS
// ═══════════════════════════════════════════════════════════════════════════════

fn emit_list(ctx: &mut EmitContext, elements: &[ExpressionIR]) -> String {
    elements
        .iter()
        .map(|e| emit_expression(ctx, e))
        .collect::<Vec<_>>()
        .join(", ")
}

fn emit_map_entries(ctx: &mut EmitContext, entries: &[MapEntryIR]) -> String {
    if entries.is_empty() {
        return "{}".to_string();
    }
    let fields: Vec<String> = entries
        .iter()
        .map(|entry| {
            let key = match &entry.key {
                ExpressionIR::StringLiteral { value } => js::quote(value),
                ExpressionIR::IntLiteral { value } => value.to_string(),
                other => format!("[{}]", emit_expression(ctx, other)),
            };
            format!("{}: {}", key, emit_expression(ctx, &entry.value))
        })
        .collect();
    format!("{{ {} }}", fields.join(", "))
}

// ═══════════════════════════════════════════════════════════════════════════════
// FUNCTIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Parameter list text. Named parameters collapse into one destructured record.
/// Declares every parameter in the current scope.
pub fn emit_params(ctx: &mut EmitContext, params: &[Parameter]) -> String {
    let mut parts = Vec::new();
    let mut named = Vec::new();
    for p in params {
        let default = p.default_value.as_ref().map(|d| emit_expression(ctx, d));
        let text = match default {
            Some(d) => format!("{} = {}", p.name, d),
            None => p.name.clone(),
        };
        if p.kind == ParameterKind::Named {
            named.push(text);
        } else {
            parts.push(text);
        }
    }
    if !named.is_empty() {
        parts.push(format!("{{ {} }} = {{}}", named.join(", ")));
    }
    for p in params {
        ctx.scope.declare_parameter(&p.name, p.ty.clone());
    }
    parts.join(", ")
}

fn emit_lambda(ctx: &mut EmitContext, params: &[Parameter], body: &LambdaBody, is_async: bool) -> String {
    let prefix = if is_async { "async " } else { "" };
    ctx.scoped("lambda", ScopeKind::Lambda, |ctx| {
        ctx.with_async(is_async, |ctx| {
            let p = emit_params(ctx, params);
            match body {
                LambdaBody::Expression { expression } => {
                    let text = emit_expression(ctx, expression);
                    // An object literal body would parse as a block.
                    if text.starts_with('{') {
                        format!("{}({}) => ({})", prefix, p, text)
                    } else {
                        format!("{}({}) => {}", prefix, p, text)
                    }
                }
                LambdaBody::Block { statements } => {
                    let block = statement::emit_body(ctx, statements);
                    format!("{}({}) => {}", prefix, p, block)
                }
            }
        })
    })
}

/// `target..a()..b = 1` as an immediately-invoked arrow over a synthetic receiver.
fn emit_cascade(ctx: &mut EmitContext, target: &ExpressionIR, sections: &[ExpressionIR]) -> String {
    let receiver = emit_expression(ctx, target);
    let name = ctx.push_cascade();
    let mut body: Vec<String> = sections
        .iter()
        .map(|s| format!("{};", emit_expression(ctx, s)))
        .collect();
    ctx.pop_cascade();
    body.push(format!("return {};", name));
    format!("(({}) => {{ {} }})({})", name, body.join(" "), receiver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imports::GlobalSymbolTable;
    use crate::options::GenerateOptions;
    use crate::registry::WidgetRegistry;
    use crate::scope::VariableInfo;

    fn with_ctx<T>(f: impl FnOnce(&mut EmitContext) -> T) -> T {
        let symbols = GlobalSymbolTable::default();
        let options = GenerateOptions::default();
        let mut ctx = EmitContext::new(WidgetRegistry::builtin(), &symbols, &options, "lib/main.dart");
        f(&mut ctx)
    }

    #[test]
    fn test_int_division_floors() {
        with_ctx(|ctx| {
            ctx.scope.declare_local("a", None, false);
            ctx.scope.declare_local("b", None, false);
            let e = ExpressionIR::binary(BinaryOp::IntDiv, ExpressionIR::ident("a"), ExpressionIR::ident("b"));
            assert_eq!(emit_expression(ctx, &e), "Math.floor(a / b)");
        });
    }

    #[test]
    fn test_negation_of_negative_is_not_decrement() {
        with_ctx(|ctx| {
            ctx.scope.declare_local("n", None, false);
            let neg = |e| ExpressionIR::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(e),
            };
            assert_eq!(emit_expression(ctx, &neg(ExpressionIR::int(-1))), "-(-1)");
            assert_eq!(emit_expression(ctx, &neg(neg(ExpressionIR::ident("n")))), "-(-n)");
            assert_eq!(emit_expression(ctx, &neg(ExpressionIR::int(1))), "-1");
        });
    }

    #[test]
    fn test_nested_binary_parenthesized() {
        with_ctx(|ctx| {
            let e = ExpressionIR::binary(
                BinaryOp::Mul,
                ExpressionIR::binary(BinaryOp::Add, ExpressionIR::int(1), ExpressionIR::int(2)),
                ExpressionIR::int(3),
            );
            assert_eq!(emit_expression(ctx, &e), "(1 + 2) * 3");
        });
    }

    #[test]
    fn test_string_escaping() {
        with_ctx(|ctx| {
            let e = ExpressionIR::string("say \"hi\"\n");
            assert_eq!(emit_expression(ctx, &e), "\"say \\\"hi\\\"\\n\"");
        });
    }

    #[test]
    fn test_nullable_index_is_short_circuiting() {
        with_ctx(|ctx| {
            ctx.scope.declare_local("items", None, false);
            let e = ExpressionIR::IndexAccess {
                target: Box::new(ExpressionIR::ident("items")),
                index: Box::new(ExpressionIR::int(0)),
                null_aware: true,
            };
            assert_eq!(emit_expression(ctx, &e), "items?.[0]");
        });
    }

    #[test]
    fn test_conditional_fully_parenthesized() {
        with_ctx(|ctx| {
            let e = ExpressionIR::Conditional {
                condition: Box::new(ExpressionIR::boolean(true)),
                then_value: Box::new(ExpressionIR::int(1)),
                else_value: Box::new(ExpressionIR::int(2)),
            };
            assert_eq!(emit_expression(ctx, &e), "(true) ? (1) : (2)");
        });
    }

    #[test]
    fn test_await_outside_async_degrades() {
        with_ctx(|ctx| {
            ctx.scope.declare_local("future", None, false);
            let e = ExpressionIR::Await {
                expression: Box::new(ExpressionIR::ident("future")),
            };
            assert_eq!(emit_expression(ctx, &e), "future");
            assert_eq!(ctx.diagnostics.items()[0].code, FJS_AWAIT_OUTSIDE_ASYNC);

            let inside = ctx.with_async(true, |ctx| emit_expression(ctx, &e));
            assert_eq!(inside, "await future");
        });
    }

    #[test]
    fn test_unresolved_identifier_marked() {
        with_ctx(|ctx| {
            let out = emit_expression(ctx, &ExpressionIR::ident("ghost"));
            assert_eq!(out, "ghost /* unresolved */");
            assert_eq!(ctx.diagnostics.items()[0].code, FJS_UNRESOLVED_IDENTIFIER);
            assert_eq!(ctx.diagnostics.items()[0].severity, Severity::Error);
        });
    }

    #[test]
    fn test_field_gets_this_prefix() {
        with_ctx(|ctx| {
            ctx.scope.push_scope("Counter", ScopeKind::Class);
            ctx.scope.add_variable(VariableInfo::field("count", "Counter", None, false));
            let e = ExpressionIR::assign(
                ExpressionIR::ident("count"),
                ExpressionIR::binary(BinaryOp::Add, ExpressionIR::ident("count"), ExpressionIR::int(1)),
            );
            assert_eq!(emit_expression(ctx, &e), "this.count = this.count + 1");
        });
    }

    #[test]
    fn test_set_state_wraps_callback() {
        with_ctx(|ctx| {
            let e = ExpressionIR::call(
                "setState",
                vec![ExpressionIR::lambda(vec![], vec![])],
                vec![],
            );
            assert_eq!(emit_expression(ctx, &e), "this.setState(() => {})");
        });
    }

    #[test]
    fn test_interpolation_becomes_template() {
        with_ctx(|ctx| {
            ctx.scope.declare_local("name", None, true);
            let e = ExpressionIR::StringInterpolation {
                parts: vec![
                    InterpolationPart::Text { value: "Hello, ".to_string() },
                    InterpolationPart::Expression { expression: ExpressionIR::ident("name") },
                    InterpolationPart::Text { value: "!".to_string() },
                ],
            };
            assert_eq!(emit_expression(ctx, &e), "`Hello, ${name}!`");
        });
    }

    #[test]
    fn test_collections() {
        with_ctx(|ctx| {
            let list = ExpressionIR::ListLiteral {
                elements: vec![ExpressionIR::int(1), ExpressionIR::int(2)],
                is_const: true,
            };
            assert_eq!(emit_expression(ctx, &list), "Object.freeze([1, 2])");
            let set = ExpressionIR::SetLiteral {
                elements: vec![ExpressionIR::string("a")],
                is_const: false,
            };
            assert_eq!(emit_expression(ctx, &set), "new Set([\"a\"])");
            let map = ExpressionIR::MapLiteral {
                entries: vec![MapEntryIR {
                    key: ExpressionIR::string("k"),
                    value: ExpressionIR::boolean(false),
                }],
                is_const: false,
            };
            assert_eq!(emit_expression(ctx, &map), "{ \"k\": false }");
        });
    }

    #[test]
    fn test_cascade_uses_per_file_receiver() {
        with_ctx(|ctx| {
            ctx.scope.declare_local("list", None, false);
            let e = ExpressionIR::Cascade {
                target: Box::new(ExpressionIR::ident("list")),
                sections: vec![ExpressionIR::method_call(
                    ExpressionIR::CascadeReceiver,
                    "add",
                    vec![ExpressionIR::int(1)],
                )],
            };
            assert_eq!(
                emit_expression(ctx, &e),
                "((__cascade0) => { __cascade0.add(1); return __cascade0; })(list)"
            );
            let again = emit_expression(ctx, &e);
            assert!(again.contains("__cascade1"));
        });
    }

    #[test]
    fn test_unsupported_is_placeholder() {
        with_ctx(|ctx| {
            let out = emit_expression(ctx, &ExpressionIR::Unsupported { node_kind: "pattern-match".to_string() });
            assert_eq!(out, "undefined /* FJS: unsupported expression pattern-match */");
            assert_eq!(ctx.diagnostics.items()[0].code, FJS_UNSUPPORTED_EXPRESSION);
        });
    }

    #[test]
    fn test_type_check_uses_helper() {
        with_ctx(|ctx| {
            ctx.scope.declare_local("v", None, false);
            let e = ExpressionIR::TypeCheck {
                expression: Box::new(ExpressionIR::ident("v")),
                ty: TypeRef::named("String"),
                negated: true,
            };
            assert_eq!(emit_expression(ctx, &e), "!__isType(v, \"String\")");
        });
    }

    #[test]
    fn test_capitalized_call_is_construction() {
        with_ctx(|ctx| {
            let e = ExpressionIR::call("Point", vec![ExpressionIR::int(1), ExpressionIR::int(2)], vec![]);
            assert_eq!(emit_expression(ctx, &e), "new Point(1, 2)");
        });
    }
}
