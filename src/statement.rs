//! Statement lowering.
//!
//! Every function here returns text whose lines are already indented to the
//! context's current level, without a trailing newline.

use crate::context::EmitContext;
use crate::diagnostics::{
    Diagnostic, Severity, FJS_AWAIT_OUTSIDE_ASYNC, FJS_EMPTY_SWITCH_CASE, FJS_UNSUPPORTED_STATEMENT,
};
use crate::expression::{emit_expression, emit_params, type_tag};
use crate::ir::{CatchClause, ExpressionIR, FunctionDecl, StatementIR, SwitchCase, TypeRef};
use crate::scope::ScopeKind;

pub fn emit_statement(ctx: &mut EmitContext, stmt: &StatementIR) -> String {
    let pad = ctx.pad();
    match stmt {
        StatementIR::Expression { expression } => {
            format!("{}{};", pad, emit_expression(ctx, expression))
        }
        StatementIR::VariableDeclaration {
            name,
            ty,
            initializer,
            is_final,
            is_const,
        } => {
            let init = initializer.as_ref().map(|e| emit_expression(ctx, e));
            // Registered after the initializer so it cannot see itself.
            ctx.scope.declare_local(name, ty.clone(), *is_final || *is_const);
            let keyword = if (*is_final || *is_const) && init.is_some() {
                "const"
            } else {
                "let"
            };
            let annotation = type_comment(ctx, ty.as_ref());
            match init {
                Some(value) => format!("{}{} {}{} = {};", pad, keyword, name, annotation, value),
                None => format!("{}{} {}{};", pad, keyword, name, annotation),
            }
        }
        StatementIR::If {
            condition,
            then_branch,
            else_branch,
        } => {
            let cond = emit_expression(ctx, condition);
            let mut out = format!("{}if ({}) {}", pad, cond, emit_body(ctx, then_branch));
            if let Some(else_branch) = else_branch {
                // Collapse `else { if ... }` into `else if`.
                if let [nested @ StatementIR::If { .. }] = else_branch.as_slice() {
                    let nested = ctx.scoped("else", ScopeKind::Block, |ctx| emit_statement(ctx, nested));
                    out.push_str(" else ");
                    out.push_str(nested.trim_start());
                } else {
                    out.push_str(" else ");
                    out.push_str(&emit_body(ctx, else_branch));
                }
            }
            out
        }
        StatementIR::For {
            init,
            condition,
            updaters,
            body,
        } => ctx.scoped("for", ScopeKind::Loop, |ctx| {
            let init = init.as_deref().map(|s| emit_for_init(ctx, s)).unwrap_or_default();
            let cond = condition.as_ref().map(|c| emit_expression(ctx, c)).unwrap_or_default();
            let updates: Vec<String> = updaters.iter().map(|u| emit_expression(ctx, u)).collect();
            let block = emit_body(ctx, body);
            format!("{}for ({}; {}; {}) {}", pad, init, cond, updates.join(", "), block)
        }),
        StatementIR::ForEach {
            variable,
            variable_type,
            iterable,
            body,
            is_final,
            is_await,
        } => {
            // The iterable is evaluated in the enclosing scope.
            let source = emit_expression(ctx, iterable);
            let mut header = "for";
            if *is_await {
                if ctx.is_async() {
                    header = "for await";
                } else {
                    ctx.report(Diagnostic::new(
                        FJS_AWAIT_OUTSIDE_ASYNC,
                        Severity::Warning,
                        "`await for` used outside an async function; emitted as a plain loop",
                    ));
                }
            }
            ctx.scoped(variable, ScopeKind::Loop, |ctx| {
                ctx.scope.declare_local(variable, variable_type.clone(), *is_final);
                let keyword = if *is_final { "const" } else { "let" };
                let block = emit_statements_block(ctx, body);
                format!("{}{} ({} {} of {}) {}", pad, header, keyword, variable, source, block)
            })
        }
        StatementIR::While { condition, body } => {
            let cond = emit_expression(ctx, condition);
            format!("{}while ({}) {}", pad, cond, emit_body(ctx, body))
        }
        StatementIR::DoWhile { body, condition } => {
            let block = emit_body(ctx, body);
            let cond = emit_expression(ctx, condition);
            format!("{}do {} while ({});", pad, block, cond)
        }
        StatementIR::Switch {
            subject,
            cases,
            default,
        } => emit_switch(ctx, subject, cases, default.as_deref()),
        StatementIR::Try {
            body,
            catches,
            finally,
        } => emit_try(ctx, body, catches, finally.as_deref()),
        StatementIR::Return { value } => match value {
            Some(v) => format!("{}return {};", pad, emit_expression(ctx, v)),
            None => format!("{}return;", pad),
        },
        StatementIR::Break { label } => match label {
            Some(l) => format!("{}break {};", pad, l),
            None => format!("{}break;", pad),
        },
        StatementIR::Continue { label } => match label {
            Some(l) => format!("{}continue {};", pad, l),
            None => format!("{}continue;", pad),
        },
        StatementIR::Throw { expression } => {
            format!("{}throw {};", pad, emit_expression(ctx, expression))
        }
        StatementIR::Rethrow => {
            let current = ctx.current_catch().map(|s| s.to_string());
            match current {
                Some(name) => format!("{}throw {};", pad, name),
                None => unsupported(ctx, "rethrow outside catch"),
            }
        }
        StatementIR::Block { statements } => format!("{}{}", pad, emit_body(ctx, statements)),
        StatementIR::FunctionDeclaration { function } => {
            // Declared first so the body may recurse.
            ctx.scope.declare_local(&function.name, None, true);
            emit_local_function(ctx, function)
        }
        StatementIR::Unsupported { node_kind } => unsupported(ctx, node_kind),
    }
}

fn unsupported(ctx: &mut EmitContext, what: &str) -> String {
    ctx.report(Diagnostic::new(
        FJS_UNSUPPORTED_STATEMENT,
        Severity::Error,
        &format!("Unsupported statement: {}", what),
    ));
    format!("{}/* FJS: unsupported statement {} */", ctx.pad(), what.replace("*/", "* /"))
}

fn type_comment(ctx: &EmitContext, ty: Option<&TypeRef>) -> String {
    match ty {
        Some(t) if ctx.options.emit_type_comments => format!(" /* {} */", t.display_name()),
        _ => String::new(),
    }
}

fn emit_for_init(ctx: &mut EmitContext, stmt: &StatementIR) -> String {
    match stmt {
        StatementIR::VariableDeclaration {
            name,
            ty,
            initializer,
            ..
        } => {
            let init = initializer.as_ref().map(|e| emit_expression(ctx, e));
            ctx.scope.declare_local(name, ty.clone(), false);
            match init {
                Some(v) => format!("let {} = {}", name, v),
                None => format!("let {}", name),
            }
        }
        StatementIR::Expression { expression } => emit_expression(ctx, expression),
        other => {
            let text = emit_statement(ctx, other);
            text.trim().trim_end_matches(';').to_string()
        }
    }
}

/// `{ ... }` for a nested statement list, in its own block scope.
pub fn emit_body(ctx: &mut EmitContext, statements: &[StatementIR]) -> String {
    ctx.scoped("block", ScopeKind::Block, |ctx| emit_statements_block(ctx, statements))
}

/// `{ ... }` for a statement list in the current scope.
pub fn emit_statements_block(ctx: &mut EmitContext, statements: &[StatementIR]) -> String {
    if statements.is_empty() {
        return "{}".to_string();
    }
    let inner = ctx.indented(|ctx| emit_statements(ctx, statements));
    format!("{{\n{}\n{}}}", inner, ctx.pad())
}

/// Statements one per line at the current indentation.
pub fn emit_statements(ctx: &mut EmitContext, statements: &[StatementIR]) -> String {
    statements
        .iter()
        .map(|s| emit_statement(ctx, s))
        .collect::<Vec<_>>()
        .join("\n")
}

fn emit_local_function(ctx: &mut EmitContext, function: &FunctionDecl) -> String {
    let pad = ctx.pad();
    let prefix = if function.is_async { "async " } else { "" };
    ctx.scoped(&function.name, ScopeKind::Function, |ctx| {
        ctx.with_async(function.is_async, |ctx| {
            let params = emit_params(ctx, &function.params);
            let body = emit_statements_block(ctx, function.body.as_deref().unwrap_or(&[]));
            format!("{}{}function {}({}) {}", pad, prefix, function.name, params, body)
        })
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// SWITCH
// ═══════════════════════════════════════════════════════════════════════════════

fn emit_switch(
    ctx: &mut EmitContext,
    subject: &ExpressionIR,
    cases: &[SwitchCase],
    default: Option<&[StatementIR]>,
) -> String {
    let pad = ctx.pad();
    let subject = emit_expression(ctx, subject);
    let mut lines = vec![format!("{}switch ({}) {{", pad, subject)];
    ctx.indented(|ctx| {
        let case_pad = ctx.pad();
        for case in cases {
            // No label can select the body; report it instead of dropping it silently.
            if case.patterns.is_empty() {
                ctx.report(Diagnostic::new(
                    FJS_EMPTY_SWITCH_CASE,
                    Severity::Warning,
                    &format!(
                        "switch case without patterns skipped ({} statement(s) unreachable)",
                        case.body.len()
                    ),
                ));
                continue;
            }
            let labels: Vec<String> = case
                .patterns
                .iter()
                .map(|p| format!("case {}:", emit_expression(ctx, p)))
                .collect();
            for label in &labels[..labels.len() - 1] {
                lines.push(format!("{}{}", case_pad, label));
            }
            let mut body = case.body.clone();
            body.push(StatementIR::Break { label: None });
            let block = emit_body(ctx, &body);
            lines.push(format!("{}{} {}", case_pad, labels[labels.len() - 1], block));
        }
        if let Some(default) = default {
            let block = emit_body(ctx, default);
            lines.push(format!("{}default: {}", case_pad, block));
        }
    });
    lines.push(format!("{}}}", pad));
    lines.join("\n")
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRY / CATCH
// ═══════════════════════════════════════════════════════════════════════════════

fn emit_try(
    ctx: &mut EmitContext,
    body: &[StatementIR],
    catches: &[CatchClause],
    finally: Option<&[StatementIR]>,
) -> String {
    let pad = ctx.pad();
    let mut out = format!("{}try {}", pad, emit_body(ctx, body));

    if !catches.is_empty() {
        let var = ctx.push_catch();
        let handler = ctx.scoped("catch", ScopeKind::Catch, |ctx| {
            ctx.scope.declare_local(&var, None, true);
            emit_catch_chain(ctx, &var, catches)
        });
        ctx.pop_catch();
        out.push_str(&format!(" catch ({}) {}", var, handler));
    }

    if let Some(finally) = finally {
        out.push_str(&format!(" finally {}", emit_body(ctx, finally)));
    } else if catches.is_empty() {
        // `try` needs a handler; an empty finally keeps it well-formed.
        out.push_str(" finally {}");
    }
    out
}

/// Binds a clause's parameters to the shared catch variable, then its body.
fn emit_clause_body(ctx: &mut EmitContext, var: &str, clause: &CatchClause) -> String {
    ctx.scoped("clause", ScopeKind::Block, |ctx| {
        let mut prologue = Vec::new();
        if let Some(param) = &clause.exception_param {
            if param != var {
                prologue.push(StatementIR::var(param, ExpressionIR::ident(var), true));
            }
        }
        if let Some(stack) = &clause.stack_trace_param {
            prologue.push(StatementIR::var(
                stack,
                ExpressionIR::PropertyAccess {
                    target: Box::new(ExpressionIR::ident(var)),
                    property: "stack".to_string(),
                    null_aware: true,
                },
                true,
            ));
        }
        prologue.extend(clause.body.iter().cloned());
        emit_statements_block(ctx, &prologue)
    })
}

/// Typed clauses become an if/else-if chain over `__isType`; without an
/// untyped clause the error is rethrown.
fn emit_catch_chain(ctx: &mut EmitContext, var: &str, catches: &[CatchClause]) -> String {
    if let [single] = catches {
        if single.exception_type.is_none() {
            return emit_clause_body(ctx, var, single);
        }
    }

    let inner = ctx.indented(|ctx| {
        let pad = ctx.pad();
        let mut chain = String::new();
        let mut has_fallback = false;
        for (i, clause) in catches.iter().enumerate() {
            let keyword = if i == 0 { "if" } else { " else if" };
            match &clause.exception_type {
                Some(ty) => {
                    let test = format!("__isType({}, {})", var, type_tag(ctx, ty));
                    let body = emit_clause_body(ctx, var, clause);
                    if i == 0 {
                        chain.push_str(&pad);
                    }
                    chain.push_str(&format!("{} ({}) {}", keyword, test, body));
                }
                None => {
                    let body = emit_clause_body(ctx, var, clause);
                    if i == 0 {
                        chain.push_str(&pad);
                        chain.push_str(&body);
                    } else {
                        chain.push_str(&format!(" else {}", body));
                    }
                    has_fallback = true;
                    break;
                }
            }
        }
        if !has_fallback {
            let rethrow = ctx.indented(|ctx| format!("{}throw {};", ctx.pad(), var));
            chain.push_str(&format!(" else {{\n{}\n{}}}", rethrow, pad));
        }
        chain
    });
    format!("{{\n{}\n{}}}", inner, ctx.pad())
}
