//! Widget instantiation.
//!
//! Registry widgets are checked against their stability tag and property
//! schema, and each property value goes through its typed converter. Names
//! outside the registry are user-defined widgets and are emitted verbatim.

use crate::context::EmitContext;
use crate::diagnostics::{
    Diagnostic, Severity, FJS_CUSTOM_WIDGET, FJS_DEPRECATED_PROPERTY, FJS_DEPRECATED_WIDGET,
    FJS_DEV_WIDGET, FJS_MISSING_REQUIRED_PROPERTY, FJS_UNKNOWN_PROPERTY, FJS_UNSTABLE_WIDGET,
};
use crate::expression::emit_expression;
use crate::ir::{ExpressionIR, NamedArgument};
use crate::js;
use crate::registry::{PropertyType, Stability, WidgetEntry};
use crate::values::convert_value;

pub fn emit_widget(
    ctx: &mut EmitContext,
    name: &str,
    constructor: Option<&str>,
    args: &[ExpressionIR],
    named: &[NamedArgument],
) -> String {
    let registry = ctx.registry;
    match registry.get(name) {
        Some(entry) => emit_registered(ctx, entry, constructor, args, named),
        None => emit_custom(ctx, name, constructor, args, named),
    }
}

fn callee(class: &str, constructor: Option<&str>) -> String {
    match constructor {
        Some(ctor) => format!("{}.{}", class, ctor),
        None => format!("new {}", class),
    }
}

fn emit_custom(
    ctx: &mut EmitContext,
    name: &str,
    constructor: Option<&str>,
    args: &[ExpressionIR],
    named: &[NamedArgument],
) -> String {
    ctx.report(Diagnostic::new(
        FJS_CUSTOM_WIDGET,
        Severity::Info,
        &format!("`{}` is not in the widget registry; treated as custom widget", name),
    ));
    let class = if ctx.lazy_symbols.contains(name) {
        format!("__lazyImports.{}", name)
    } else {
        name.to_string()
    };
    let positional: Vec<String> = args.iter().map(|a| emit_expression(ctx, a)).collect();
    let props: Vec<(String, String)> = named
        .iter()
        .map(|n| (n.name.clone(), ctx.indented(|ctx| emit_expression(ctx, &n.value))))
        .collect();
    format!("{}({})", callee(&class, constructor), render_args(ctx, positional, props))
}

fn check_stability(ctx: &mut EmitContext, entry: &WidgetEntry) {
    let since = entry.since.as_deref().unwrap_or("unknown");
    match entry.stability {
        Stability::Stable => {}
        Stability::Deprecated => {
            let severity = if ctx.options.strict {
                Severity::Fatal
            } else {
                Severity::Error
            };
            let mut d = Diagnostic::new(
                FJS_DEPRECATED_WIDGET,
                severity,
                &format!("`{}` is deprecated since {}", entry.name, since),
            );
            if let Some(replacement) = &entry.replacement {
                d = d.with_suggestion(&format!("Use `{}` instead.", replacement));
            }
            ctx.report(d);
        }
        Stability::Beta | Stability::Alpha => {
            let tag = if entry.stability == Stability::Beta { "beta" } else { "alpha" };
            let mut message = format!("`{}` is {} (since {})", entry.name, tag, since);
            if !entry.limitations.is_empty() {
                message.push_str(&format!("; limitations: {}", entry.limitations.join("; ")));
            }
            ctx.report(Diagnostic::new(FJS_UNSTABLE_WIDGET, Severity::Warning, &message));
        }
        Stability::Dev => {
            ctx.report(
                Diagnostic::new(
                    FJS_DEV_WIDGET,
                    Severity::Error,
                    &format!("`{}` is a development-only widget", entry.name),
                )
                .with_suggestion("Remove it before shipping."),
            );
        }
    }
}

fn emit_registered(
    ctx: &mut EmitContext,
    entry: &WidgetEntry,
    constructor: Option<&str>,
    args: &[ExpressionIR],
    named: &[NamedArgument],
) -> String {
    check_stability(ctx, entry);

    let mut positional = Vec::with_capacity(args.len());
    for (i, arg) in args.iter().enumerate() {
        let ty = entry
            .positional
            .get(i)
            .map(|p| p.ty)
            .unwrap_or(PropertyType::Passthrough);
        positional.push(convert_value(ctx, ty, arg));
    }

    let mut props = Vec::with_capacity(named.len());
    for arg in named {
        let ty = match entry.property(&arg.name) {
            None => {
                if ctx.options.strict {
                    ctx.report(Diagnostic::new(
                        FJS_UNKNOWN_PROPERTY,
                        Severity::Warning,
                        &format!("`{}` has no property `{}`", entry.name, arg.name),
                    ));
                }
                PropertyType::Passthrough
            }
            Some(schema) => {
                if schema.deprecated {
                    let mut d = Diagnostic::new(
                        FJS_DEPRECATED_PROPERTY,
                        Severity::Warning,
                        &format!("`{}.{}` is deprecated", entry.name, arg.name),
                    );
                    if let Some(replacement) = &schema.replacement {
                        d = d.with_suggestion(&format!("Use `{}` instead.", replacement));
                    }
                    ctx.report(d);
                }
                schema.ty
            }
        };
        let value = ctx.indented(|ctx| convert_value(ctx, ty, &arg.value));
        props.push((arg.name.clone(), value));
    }

    // Named constructors (`ListView.builder`) have their own signatures.
    if constructor.is_none() {
        for (i, schema) in entry.positional.iter().enumerate() {
            let supplied = i < args.len() || named.iter().any(|n| n.name == schema.name);
            if schema.required && !supplied {
                report_missing(ctx, entry, &schema.name);
            }
        }
        for schema in entry.required_properties() {
            if !named.iter().any(|n| n.name == schema.name) {
                report_missing(ctx, entry, &schema.name);
            }
        }
    }

    let class = callee(&entry.runtime_class, constructor);
    format!("{}({})", class, render_args(ctx, positional, props))
}

fn report_missing(ctx: &mut EmitContext, entry: &WidgetEntry, property: &str) {
    ctx.report(Diagnostic::new(
        FJS_MISSING_REQUIRED_PROPERTY,
        Severity::Error,
        &format!("`{}` requires property `{}`", entry.name, property),
    ));
}

/// Positional values, then the property record, one property per line when
/// pretty-printing.
fn render_args(ctx: &EmitContext, mut positional: Vec<String>, props: Vec<(String, String)>) -> String {
    if !props.is_empty() {
        let record = if ctx.options.pretty_print {
            let inner = js::indent(ctx.indent_level() + 1);
            let lines: Vec<String> = props
                .iter()
                .map(|(k, v)| format!("{}{}: {},", inner, js::property_key(k), v))
                .collect();
            format!("{{\n{}\n{}}}", lines.join("\n"), ctx.pad())
        } else {
            let fields: Vec<String> = props
                .iter()
                .map(|(k, v)| format!("{}: {}", js::property_key(k), v))
                .collect();
            format!("{{ {} }}", fields.join(", "))
        };
        positional.push(record);
    }
    positional.join(", ")
}
