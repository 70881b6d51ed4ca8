//! Typed converters for widget property values.
//!
//! Literal Flutter value objects (colours, insets, alignments, ...) lower to
//! the plain records and strings the runtime consumes. Anything that is not a
//! recognisable literal is passed through the expression emitter unchanged.

use crate::context::EmitContext;
use crate::expression::emit_expression;
use crate::ir::{ExpressionIR, NamedArgument};
use crate::js;
use crate::registry::PropertyType;
use std::collections::HashMap;

lazy_static::lazy_static! {
    static ref ALIGNMENTS: HashMap<&'static str, (i8, i8)> = {
        let mut m = HashMap::new();
        m.insert("topLeft", (-1, -1));
        m.insert("topCenter", (0, -1));
        m.insert("topRight", (1, -1));
        m.insert("centerLeft", (-1, 0));
        m.insert("center", (0, 0));
        m.insert("centerRight", (1, 0));
        m.insert("bottomLeft", (-1, 1));
        m.insert("bottomCenter", (0, 1));
        m.insert("bottomRight", (1, 1));
        m
    };

    static ref CURVES: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("linear", "linear");
        m.insert("ease", "ease");
        m.insert("easeIn", "ease-in");
        m.insert("easeOut", "ease-out");
        m.insert("easeInOut", "ease-in-out");
        m.insert("fastOutSlowIn", "cubic-bezier(0.4, 0.0, 0.2, 1.0)");
        m.insert("decelerate", "cubic-bezier(0.0, 0.0, 0.2, 1.0)");
        m
    };

    static ref DURATION_UNITS_MS: Vec<(&'static str, f64)> = vec![
        ("days", 86_400_000.0),
        ("hours", 3_600_000.0),
        ("minutes", 60_000.0),
        ("seconds", 1_000.0),
        ("milliseconds", 1.0),
        ("microseconds", 0.001),
    ];
}

pub fn convert_value(ctx: &mut EmitContext, ty: PropertyType, expr: &ExpressionIR) -> String {
    let converted = match ty {
        PropertyType::Color => convert_color(expr),
        PropertyType::EdgeInsets => convert_edge_insets(ctx, expr),
        PropertyType::Alignment => convert_alignment(ctx, expr),
        PropertyType::TextStyle => convert_text_style(ctx, expr),
        PropertyType::Duration => convert_duration(ctx, expr),
        PropertyType::Curve => convert_curve(expr),
        PropertyType::Callback => convert_callback(ctx, expr),
        PropertyType::Passthrough => None,
    };
    match converted {
        Some(text) => text,
        None => emit_expression(ctx, expr),
    }
}

/// A call on a type, in either IR shape: `EdgeInsets.all(8)` as a method call
/// on an identifier, or as an instance creation with a named constructor.
struct StaticCall<'e> {
    class: &'e str,
    member: Option<&'e str>,
    args: &'e [ExpressionIR],
    named: &'e [NamedArgument],
}

fn as_static_call(expr: &ExpressionIR) -> Option<StaticCall<'_>> {
    match expr {
        ExpressionIR::MethodCall {
            target: Some(target),
            method,
            args,
            named_args,
            ..
        } => match target.as_ref() {
            ExpressionIR::Identifier { name } => Some(StaticCall {
                class: name,
                member: Some(method.as_str()),
                args,
                named: named_args,
            }),
            _ => None,
        },
        ExpressionIR::MethodCall {
            target: None,
            method,
            args,
            named_args,
            ..
        } => Some(StaticCall {
            class: method,
            member: None,
            args,
            named: named_args,
        }),
        ExpressionIR::InstanceCreation {
            ty,
            constructor,
            args,
            named_args,
            ..
        } => Some(StaticCall {
            class: ty.base_name(),
            member: constructor.as_deref(),
            args,
            named: named_args,
        }),
        _ => None,
    }
}

/// `Type.member` constant access.
fn as_static_constant(expr: &ExpressionIR) -> Option<(&str, &str)> {
    match expr {
        ExpressionIR::PropertyAccess {
            target, property, ..
        } => match target.as_ref() {
            ExpressionIR::Identifier { name } => Some((name.as_str(), property.as_str())),
            _ => None,
        },
        _ => None,
    }
}

fn int_literal(expr: &ExpressionIR) -> Option<i64> {
    match expr {
        ExpressionIR::IntLiteral { value } => Some(*value),
        _ => None,
    }
}

fn number_literal(expr: &ExpressionIR) -> Option<f64> {
    match expr {
        ExpressionIR::IntLiteral { value } => Some(*value as f64),
        ExpressionIR::DoubleLiteral { value } => Some(*value),
        _ => None,
    }
}

fn named<'e>(named: &'e [NamedArgument], name: &str) -> Option<&'e ExpressionIR> {
    named.iter().find(|n| n.name == name).map(|n| &n.value)
}

fn format_alpha(alpha: f64) -> String {
    let rounded = (alpha * 1000.0).round() / 1000.0;
    format!("{}", rounded)
}

/// CSS colour string from ARGB components.
pub fn css_color(a: u8, r: u8, g: u8, b: u8) -> String {
    if a == 0xFF {
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    } else {
        format!("rgba({}, {}, {}, {})", r, g, b, format_alpha(a as f64 / 255.0))
    }
}

fn convert_color(expr: &ExpressionIR) -> Option<String> {
    let call = as_static_call(expr)?;
    if call.class != "Color" {
        return None;
    }
    let css = match (call.member, call.args) {
        (None, [value]) => {
            let v = int_literal(value)?;
            let a = ((v >> 24) & 0xFF) as u8;
            let r = ((v >> 16) & 0xFF) as u8;
            let g = ((v >> 8) & 0xFF) as u8;
            let b = (v & 0xFF) as u8;
            css_color(a, r, g, b)
        }
        (Some("fromARGB"), [a, r, g, b]) => css_color(
            int_literal(a)? as u8,
            int_literal(r)? as u8,
            int_literal(g)? as u8,
            int_literal(b)? as u8,
        ),
        (Some("fromRGBO"), [r, g, b, o]) => {
            let opacity = number_literal(o)?;
            format!(
                "rgba({}, {}, {}, {})",
                int_literal(r)?,
                int_literal(g)?,
                int_literal(b)?,
                format_alpha(opacity)
            )
        }
        _ => return None,
    };
    Some(js::quote(&css))
}

fn sides_record(top: String, right: String, bottom: String, left: String) -> String {
    format!(
        "{{ top: {}, right: {}, bottom: {}, left: {} }}",
        top, right, bottom, left
    )
}

fn convert_edge_insets(ctx: &mut EmitContext, expr: &ExpressionIR) -> Option<String> {
    if let Some(("EdgeInsets", "zero")) = as_static_constant(expr) {
        return Some(sides_record("0".into(), "0".into(), "0".into(), "0".into()));
    }
    let call = as_static_call(expr)?;
    if call.class != "EdgeInsets" {
        return None;
    }
    let mut side = |value: Option<&ExpressionIR>| -> String {
        match value {
            Some(v) => emit_expression(ctx, v),
            None => "0".to_string(),
        }
    };
    match (call.member, call.args) {
        (Some("all"), [value]) => {
            let v = side(Some(value));
            Some(sides_record(v.clone(), v.clone(), v.clone(), v))
        }
        (Some("symmetric"), []) => {
            let vertical = side(named(call.named, "vertical"));
            let horizontal = side(named(call.named, "horizontal"));
            Some(sides_record(vertical.clone(), horizontal.clone(), vertical, horizontal))
        }
        (Some("only"), []) => {
            let top = side(named(call.named, "top"));
            let right = side(named(call.named, "right"));
            let bottom = side(named(call.named, "bottom"));
            let left = side(named(call.named, "left"));
            Some(sides_record(top, right, bottom, left))
        }
        (Some("fromLTRB"), [l, t, r, b]) => {
            let left = side(Some(l));
            let top = side(Some(t));
            let right = side(Some(r));
            let bottom = side(Some(b));
            Some(sides_record(top, right, bottom, left))
        }
        _ => None,
    }
}

fn convert_alignment(ctx: &mut EmitContext, expr: &ExpressionIR) -> Option<String> {
    if let Some(("Alignment", member)) = as_static_constant(expr) {
        let (x, y) = ALIGNMENTS.get(member)?;
        return Some(format!("{{ x: {}, y: {} }}", x, y));
    }
    let call = as_static_call(expr)?;
    match (call.class, call.member, call.args) {
        ("Alignment", None, [x, y]) => {
            let x = emit_expression(ctx, x);
            let y = emit_expression(ctx, y);
            Some(format!("{{ x: {}, y: {} }}", x, y))
        }
        _ => None,
    }
}

fn font_weight(expr: &ExpressionIR) -> Option<String> {
    match as_static_constant(expr)? {
        ("FontWeight", "bold") => Some("bold".to_string()),
        ("FontWeight", "normal") => Some("normal".to_string()),
        ("FontWeight", w) if w.starts_with('w') && w[1..].parse::<u16>().is_ok() => {
            Some(w[1..].to_string())
        }
        _ => None,
    }
}

fn convert_text_style(ctx: &mut EmitContext, expr: &ExpressionIR) -> Option<String> {
    let call = as_static_call(expr)?;
    if call.class != "TextStyle" || call.member.is_some() || !call.args.is_empty() {
        return None;
    }
    let mut fields = Vec::new();
    for arg in call.named {
        let value = match arg.name.as_str() {
            "color" | "backgroundColor" => convert_value(ctx, PropertyType::Color, &arg.value),
            "fontWeight" => match font_weight(&arg.value) {
                Some(w) => js::quote(&w),
                None => emit_expression(ctx, &arg.value),
            },
            "fontStyle" => match as_static_constant(&arg.value) {
                Some(("FontStyle", style)) => js::quote(style),
                _ => emit_expression(ctx, &arg.value),
            },
            _ => emit_expression(ctx, &arg.value),
        };
        fields.push(format!("{}: {}", js::property_key(&arg.name), value));
    }
    if fields.is_empty() {
        return Some("{}".to_string());
    }
    Some(format!("{{ {} }}", fields.join(", ")))
}

fn convert_duration(ctx: &mut EmitContext, expr: &ExpressionIR) -> Option<String> {
    let call = as_static_call(expr)?;
    if call.class != "Duration" || call.member.is_some() {
        return None;
    }
    let mut total = 0.0;
    let mut dynamic_terms = Vec::new();
    for (unit, factor) in DURATION_UNITS_MS.iter() {
        let Some(value) = named(call.named, unit) else {
            continue;
        };
        match number_literal(value) {
            Some(n) => total += n * factor,
            None => {
                let text = crate::expression::emit_operand(ctx, value);
                dynamic_terms.push(format!("{} * {}", text, factor));
            }
        }
    }
    let literal = if total.fract() == 0.0 {
        format!("{}", total as i64)
    } else {
        format!("{}", total)
    };
    if dynamic_terms.is_empty() {
        Some(literal)
    } else {
        if total != 0.0 {
            dynamic_terms.push(literal);
        }
        Some(format!("({})", dynamic_terms.join(" + ")))
    }
}

fn convert_curve(expr: &ExpressionIR) -> Option<String> {
    match as_static_constant(expr)? {
        ("Curves", name) => CURVES.get(name).map(|css| js::quote(css)),
        _ => None,
    }
}

/// Method references are bound to the instance; closures keep lexical `this`.
fn convert_callback(ctx: &mut EmitContext, expr: &ExpressionIR) -> Option<String> {
    match expr {
        ExpressionIR::Identifier { name } if ctx.is_class_method(name) => {
            let shadowed = ctx
                .scope
                .resolve_variable(name)
                .map_or(false, |v| !v.is_field);
            if shadowed {
                None
            } else {
                Some(format!("this.{}.bind(this)", name))
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ClassContext;
    use crate::imports::GlobalSymbolTable;
    use crate::options::GenerateOptions;
    use crate::registry::WidgetRegistry;
    use crate::scope::{ScopeKind, VariableInfo};

    fn with_ctx<T>(f: impl FnOnce(&mut EmitContext) -> T) -> T {
        let symbols = GlobalSymbolTable::default();
        let options = GenerateOptions::default();
        let mut ctx = EmitContext::new(WidgetRegistry::builtin(), &symbols, &options, "lib/main.dart");
        f(&mut ctx)
    }

    fn static_call(class: &str, member: &str, args: Vec<ExpressionIR>, named: Vec<NamedArgument>) -> ExpressionIR {
        ExpressionIR::MethodCall {
            target: Some(Box::new(ExpressionIR::ident(class))),
            method: member.to_string(),
            args,
            named_args: named,
            null_aware: false,
        }
    }

    #[test]
    fn test_color_literal() {
        with_ctx(|ctx| {
            let opaque = ExpressionIR::call("Color", vec![ExpressionIR::int(0xFF2196F3)], vec![]);
            assert_eq!(convert_value(ctx, PropertyType::Color, &opaque), "\"#2196f3\"");
            let argb = static_call(
                "Color",
                "fromARGB",
                vec![ExpressionIR::int(128), ExpressionIR::int(255), ExpressionIR::int(0), ExpressionIR::int(0)],
                vec![],
            );
            assert_eq!(convert_value(ctx, PropertyType::Color, &argb), "\"rgba(255, 0, 0, 0.502)\"");
        });
    }

    #[test]
    fn test_color_constant_passes_through() {
        with_ctx(|ctx| {
            let red = ExpressionIR::property(ExpressionIR::ident("Colors"), "red");
            assert_eq!(convert_value(ctx, PropertyType::Color, &red), "Colors.red");
        });
    }

    #[test]
    fn test_edge_insets_forms() {
        with_ctx(|ctx| {
            let all = static_call("EdgeInsets", "all", vec![ExpressionIR::int(8)], vec![]);
            assert_eq!(
                convert_value(ctx, PropertyType::EdgeInsets, &all),
                "{ top: 8, right: 8, bottom: 8, left: 8 }"
            );
            let sym = static_call(
                "EdgeInsets",
                "symmetric",
                vec![],
                vec![NamedArgument::new("horizontal", ExpressionIR::int(16))],
            );
            assert_eq!(
                convert_value(ctx, PropertyType::EdgeInsets, &sym),
                "{ top: 0, right: 16, bottom: 0, left: 16 }"
            );
            let ltrb = static_call(
                "EdgeInsets",
                "fromLTRB",
                vec![ExpressionIR::int(1), ExpressionIR::int(2), ExpressionIR::int(3), ExpressionIR::int(4)],
                vec![],
            );
            assert_eq!(
                convert_value(ctx, PropertyType::EdgeInsets, &ltrb),
                "{ top: 2, right: 3, bottom: 4, left: 1 }"
            );
        });
    }

    #[test]
    fn test_alignment_and_curve() {
        with_ctx(|ctx| {
            let a = ExpressionIR::property(ExpressionIR::ident("Alignment"), "bottomRight");
            assert_eq!(convert_value(ctx, PropertyType::Alignment, &a), "{ x: 1, y: 1 }");
            let c = ExpressionIR::property(ExpressionIR::ident("Curves"), "easeInOut");
            assert_eq!(convert_value(ctx, PropertyType::Curve, &c), "\"ease-in-out\"");
        });
    }

    #[test]
    fn test_duration_milliseconds() {
        with_ctx(|ctx| {
            let d = ExpressionIR::call(
                "Duration",
                vec![],
                vec![
                    NamedArgument::new("seconds", ExpressionIR::int(1)),
                    NamedArgument::new("milliseconds", ExpressionIR::int(500)),
                ],
            );
            assert_eq!(convert_value(ctx, PropertyType::Duration, &d), "1500");
        });
    }

    #[test]
    fn test_text_style_record() {
        with_ctx(|ctx| {
            let style = ExpressionIR::call(
                "TextStyle",
                vec![],
                vec![
                    NamedArgument::new("fontSize", ExpressionIR::int(18)),
                    NamedArgument::new(
                        "fontWeight",
                        ExpressionIR::property(ExpressionIR::ident("FontWeight"), "w600"),
                    ),
                ],
            );
            assert_eq!(
                convert_value(ctx, PropertyType::TextStyle, &style),
                "{ fontSize: 18, fontWeight: \"600\" }"
            );
        });
    }

    #[test]
    fn test_method_callback_is_bound() {
        with_ctx(|ctx| {
            let mut class = ClassContext::default();
            class.name = "_CounterState".to_string();
            class.methods.insert("increment".to_string());
            ctx.scope.push_scope("_CounterState", ScopeKind::Class);
            ctx.scope
                .add_variable(VariableInfo::field("increment", "_CounterState", None, true));
            let out = ctx.with_class(class, |ctx| {
                convert_value(ctx, PropertyType::Callback, &ExpressionIR::ident("increment"))
            });
            assert_eq!(out, "this.increment.bind(this)");
        });
    }
}
