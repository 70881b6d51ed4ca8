//! StatefulWidget + State pairs.
//!
//! The widget half goes through the plain class emitter with a synthesized
//! `createState`. The state half is laid out in a fixed member order:
//! the reactive field list, constructor, lifecycle hooks, the `setState`
//! wrapper, custom methods, and `build` last.
//!
//! Reactive fields (read by `build`, mutated through `setState`) are
//! initialized ahead of the plain members and listed in a frozen
//! `reactiveFields` static that the runtime uses to track rebuild inputs.

use crate::class::{
    emit_constructors, emit_member_isolated, emit_static_fields, in_class_body, merge_accessors,
    resolve_base, wrap_class,
};
use crate::context::EmitContext;
use crate::diagnostics::{
    Diagnostic, Severity, FJS_MISSING_BUILD, FJS_STATE_NAMING, FJS_STATE_NO_SUPERCLASS,
};
use crate::ir::{ClassDecl, DartFile, ExpressionIR, FunctionDecl, StatementIR};
use crate::js;

const LIFECYCLE: &[&str] = &["initState", "didUpdateWidget", "didChangeDependencies", "dispose"];

/// Finds the state class a StatefulWidget creates.
///
/// `createState` naming a local class wins; otherwise `_<Widget>State`, then
/// any local class extending `State<Widget>`.
pub fn find_state_class<'u>(unit: &'u DartFile, widget: &ClassDecl) -> Option<&'u ClassDecl> {
    let created = widget
        .find_method("createState")
        .and_then(|m| m.body.as_ref())
        .and_then(|body| body.iter().find_map(created_class_name));
    if let Some(class) = created.and_then(|name| unit.find_class(name)) {
        return Some(class);
    }
    let conventional = format!("_{}State", widget.name);
    if let Some(class) = unit.find_class(&conventional) {
        return Some(class);
    }
    unit.classes.iter().find(|c| {
        c.superclass.as_ref().map_or(false, |s| {
            s.base_name() == "State" && s.type_args.first().map(|a| a.base_name()) == Some(widget.name.as_str())
        })
    })
}

fn created_class_name(stmt: &StatementIR) -> Option<&str> {
    match stmt {
        StatementIR::Return { value: Some(expr) } => match expr {
            ExpressionIR::InstanceCreation { ty, .. } => Some(ty.base_name()),
            ExpressionIR::MethodCall {
                target: None,
                method,
                ..
            } => Some(method.as_str()),
            _ => None,
        },
        _ => None,
    }
}

pub fn is_stateful_widget(class: &ClassDecl) -> bool {
    class
        .superclass
        .as_ref()
        .map_or(false, |s| s.base_name() == "StatefulWidget")
}

/// Non-fatal structural checks on a pair.
pub fn validate_pair(ctx: &mut EmitContext, widget: &ClassDecl, state: &ClassDecl) {
    if state.find_method("build").is_none() {
        ctx.report(
            Diagnostic::new(
                FJS_MISSING_BUILD,
                Severity::Error,
                &format!("State class `{}` has no build method", state.name),
            )
            .with_node(&state.name)
            .with_suggestion("Add `Widget build(BuildContext context)` to the state class."),
        );
    }
    let expected = format!("_{}State", widget.name);
    if state.name != expected {
        ctx.report(
            Diagnostic::new(
                FJS_STATE_NAMING,
                Severity::Warning,
                &format!("State class `{}` does not follow the `{}` convention", state.name, expected),
            )
            .with_node(&state.name),
        );
    }
    if state.superclass.is_none() {
        ctx.report(
            Diagnostic::new(
                FJS_STATE_NO_SUPERCLASS,
                Severity::Warning,
                &format!("State class `{}` declares no superclass", state.name),
            )
            .with_node(&state.name)
            .with_suggestion(&format!("Extend `State<{}>`.", widget.name)),
        );
    }
}

/// Widget class followed by its state class.
pub fn emit_stateful_pair(ctx: &mut EmitContext, widget: &ClassDecl, state: &ClassDecl) -> String {
    validate_pair(ctx, widget, state);
    let widget_js = crate::class::emit_class(ctx, widget, Some(&state.name));
    let state_js = emit_state_class(ctx, state);
    format!("{}\n\n{}", widget_js, state_js)
}

fn without_super_call(body: &[StatementIR], method: &str) -> Vec<StatementIR> {
    body.iter()
        .filter(|s| s.super_call_name() != Some(method))
        .cloned()
        .collect()
}

fn super_call(method: &str, args: Vec<ExpressionIR>) -> StatementIR {
    StatementIR::expr(ExpressionIR::method_call(ExpressionIR::Super, method, args))
}

/// Lifecycle hook with the super call moved to its fixed position.
fn lifecycle_hook(ctx: &EmitContext, source: &FunctionDecl, super_last: bool) -> FunctionDecl {
    let body = without_super_call(source.body.as_deref().unwrap_or(&[]), &source.name);
    let args: Vec<ExpressionIR> = source
        .params
        .iter()
        .map(|p| ExpressionIR::ident(&p.name))
        .collect();
    let mut hook = source.clone();
    let mut statements = Vec::new();
    let call_super = ctx.options.call_super_lifecycle;
    if call_super && !super_last {
        statements.push(super_call(&source.name, args.clone()));
    }
    statements.extend(body);
    if call_super && super_last {
        statements.push(super_call(&source.name, args));
    }
    hook.body = Some(statements);
    hook
}

/// `dispose` releasing every disposable field before the source body.
fn dispose_hook(ctx: &EmitContext, state: &ClassDecl) -> Option<FunctionDecl> {
    let source = state.find_method("dispose");
    let disposable: Vec<&str> = state
        .fields
        .iter()
        .filter(|f| f.is_disposable)
        .map(|f| f.name.as_str())
        .collect();
    if source.is_none() && disposable.is_empty() {
        return None;
    }
    let base = source
        .cloned()
        .unwrap_or_else(|| FunctionDecl::new("dispose", vec![], vec![]));
    let mut hook = lifecycle_hook(ctx, &base, true);
    let mut statements: Vec<StatementIR> = disposable
        .iter()
        .map(|field| {
            StatementIR::expr(ExpressionIR::MethodCall {
                target: Some(Box::new(ExpressionIR::property(ExpressionIR::This, field))),
                method: "dispose".to_string(),
                args: vec![],
                named_args: vec![],
                null_aware: true,
            })
        })
        .collect();
    statements.extend(hook.body.take().unwrap_or_default());
    hook.body = Some(statements);
    Some(hook)
}

fn set_state_wrapper(ctx: &EmitContext) -> String {
    let p0 = ctx.pad();
    let p1 = format!("{}{}", p0, js::INDENT);
    let p2 = format!("{}{}", p1, js::INDENT);
    [
        format!("{}setState(updater) {{", p0),
        format!("{}if (typeof updater === \"function\") {{", p1),
        format!("{}updater.call(this);", p2),
        format!("{}}} else if (updater) {{", p1),
        format!("{}Object.assign(this, updater);", p2),
        format!("{}}}", p1),
        format!("{}super.setState(() => {{}});", p1),
        format!("{}}}", p0),
    ]
    .join("\n")
}

/// Copy of `state` with reactive fields first, source order kept within
/// each group.
fn reactive_first(state: &ClassDecl) -> ClassDecl {
    let mut ordered = state.clone();
    ordered.fields.sort_by_key(|f| !f.is_reactive);
    ordered
}

fn reactive_fields_member(ctx: &EmitContext, state: &ClassDecl) -> Option<String> {
    let names: Vec<String> = state
        .fields
        .iter()
        .filter(|f| f.is_reactive)
        .map(|f| js::quote(&f.name))
        .collect();
    if names.is_empty() {
        return None;
    }
    Some(format!(
        "{}static reactiveFields = Object.freeze([{}]);",
        ctx.pad(),
        names.join(", ")
    ))
}

pub fn emit_state_class(ctx: &mut EmitContext, state: &ClassDecl) -> String {
    let state = &reactive_first(state);
    let mut base = resolve_base(ctx, state);
    if state.superclass.is_none() {
        base = "State".to_string();
    }
    let members = in_class_body(ctx, state, &base, |ctx| {
        let mut members = emit_static_fields(ctx, state);
        members.extend(reactive_fields_member(ctx, state));
        members.extend(emit_constructors(ctx, state));

        for hook in ["initState", "didUpdateWidget", "didChangeDependencies"] {
            if let Some(source) = state.find_method(hook) {
                let emitted = lifecycle_hook(ctx, source, false);
                members.push(emit_member_isolated(ctx, &state.name, Ok(emitted)));
            }
        }
        if let Some(dispose) = dispose_hook(ctx, state) {
            members.push(emit_member_isolated(ctx, &state.name, Ok(dispose)));
        }
        members.push(set_state_wrapper(ctx));

        let mut build = None;
        for method in merge_accessors(&state.methods) {
            let (is_build, is_handled) = match &method {
                Ok(m) if !m.is_accessor() => (
                    m.name == "build",
                    LIFECYCLE.contains(&m.name.as_str()) || m.name == "setState",
                ),
                _ => (false, false),
            };
            if is_build {
                build = Some(method);
            } else if !is_handled {
                members.push(emit_member_isolated(ctx, &state.name, method));
            }
        }
        if let Some(build) = build {
            members.push(emit_member_isolated(ctx, &state.name, build));
        }
        members
    });
    wrap_class(ctx, state, &base, members)
}
