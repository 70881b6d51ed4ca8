use crate::ir::{
    ClassDecl, ConstructorDecl, DartFile, ExpressionIR, FieldDecl, FunctionDecl, InterpolationPart,
    LambdaBody, Parameter, StatementIR, TypeRef,
};

/// Read-only traversal over a program unit.
///
/// Rules:
/// 1. Traversal order is fixed: declarations in source order, children left to right.
/// 2. Implementers override `visit_*` methods to add behavior.
/// 3. Implementers call the matching `walk_*` function to keep descending.
pub trait IrVisitor {
    fn visit_unit(&mut self, unit: &DartFile) {
        walk_unit(self, unit);
    }

    fn visit_class(&mut self, class: &ClassDecl) {
        walk_class(self, class);
    }

    fn visit_field(&mut self, field: &FieldDecl) {
        walk_field(self, field);
    }

    fn visit_constructor(&mut self, ctor: &ConstructorDecl) {
        walk_constructor(self, ctor);
    }

    fn visit_function(&mut self, function: &FunctionDecl) {
        walk_function(self, function);
    }

    fn visit_parameter(&mut self, param: &Parameter) {
        walk_parameter(self, param);
    }

    fn visit_statement(&mut self, stmt: &StatementIR) {
        walk_statement(self, stmt);
    }

    fn visit_expression(&mut self, expr: &ExpressionIR) {
        walk_expression(self, expr);
    }

    fn visit_type(&mut self, _ty: &TypeRef) {
        // Leaf
    }
}

pub fn walk_unit<V: IrVisitor + ?Sized>(visitor: &mut V, unit: &DartFile) {
    for variable in &unit.variables {
        if let Some(ty) = &variable.ty {
            visitor.visit_type(ty);
        }
        if let Some(init) = &variable.initializer {
            visitor.visit_expression(init);
        }
    }
    for class in &unit.classes {
        visitor.visit_class(class);
    }
    for function in &unit.functions {
        visitor.visit_function(function);
    }
}

pub fn walk_class<V: IrVisitor + ?Sized>(visitor: &mut V, class: &ClassDecl) {
    for ty in class
        .superclass
        .iter()
        .chain(class.interfaces.iter())
        .chain(class.mixins.iter())
    {
        visitor.visit_type(ty);
    }
    for field in class.fields.iter().chain(class.static_fields.iter()) {
        visitor.visit_field(field);
    }
    for ctor in &class.constructors {
        visitor.visit_constructor(ctor);
    }
    for method in &class.methods {
        visitor.visit_function(method);
    }
}

pub fn walk_field<V: IrVisitor + ?Sized>(visitor: &mut V, field: &FieldDecl) {
    if let Some(ty) = &field.ty {
        visitor.visit_type(ty);
    }
    if let Some(init) = &field.initializer {
        visitor.visit_expression(init);
    }
}

pub fn walk_constructor<V: IrVisitor + ?Sized>(visitor: &mut V, ctor: &ConstructorDecl) {
    for param in &ctor.params {
        visitor.visit_parameter(param);
    }
    for init in &ctor.initializers {
        visitor.visit_expression(&init.value);
    }
    for arg in &ctor.super_args {
        visitor.visit_expression(arg);
    }
    for arg in &ctor.super_named_args {
        visitor.visit_expression(&arg.value);
    }
    if let Some(body) = &ctor.body {
        walk_statements(visitor, body);
    }
}

pub fn walk_function<V: IrVisitor + ?Sized>(visitor: &mut V, function: &FunctionDecl) {
    for param in &function.params {
        visitor.visit_parameter(param);
    }
    if let Some(ty) = &function.return_type {
        visitor.visit_type(ty);
    }
    if let Some(body) = &function.body {
        walk_statements(visitor, body);
    }
}

pub fn walk_parameter<V: IrVisitor + ?Sized>(visitor: &mut V, param: &Parameter) {
    if let Some(ty) = &param.ty {
        visitor.visit_type(ty);
    }
    if let Some(default) = &param.default_value {
        visitor.visit_expression(default);
    }
}

pub fn walk_statements<V: IrVisitor + ?Sized>(visitor: &mut V, statements: &[StatementIR]) {
    for stmt in statements {
        visitor.visit_statement(stmt);
    }
}

pub fn walk_statement<V: IrVisitor + ?Sized>(visitor: &mut V, stmt: &StatementIR) {
    match stmt {
        StatementIR::Expression { expression } | StatementIR::Throw { expression } => {
            visitor.visit_expression(expression)
        }
        StatementIR::VariableDeclaration {
            ty, initializer, ..
        } => {
            if let Some(ty) = ty {
                visitor.visit_type(ty);
            }
            if let Some(init) = initializer {
                visitor.visit_expression(init);
            }
        }
        StatementIR::If {
            condition,
            then_branch,
            else_branch,
        } => {
            visitor.visit_expression(condition);
            walk_statements(visitor, then_branch);
            if let Some(else_branch) = else_branch {
                walk_statements(visitor, else_branch);
            }
        }
        StatementIR::For {
            init,
            condition,
            updaters,
            body,
        } => {
            if let Some(init) = init {
                visitor.visit_statement(init);
            }
            if let Some(condition) = condition {
                visitor.visit_expression(condition);
            }
            for u in updaters {
                visitor.visit_expression(u);
            }
            walk_statements(visitor, body);
        }
        StatementIR::ForEach {
            variable_type,
            iterable,
            body,
            ..
        } => {
            if let Some(ty) = variable_type {
                visitor.visit_type(ty);
            }
            visitor.visit_expression(iterable);
            walk_statements(visitor, body);
        }
        StatementIR::While { condition, body } | StatementIR::DoWhile { body, condition } => {
            visitor.visit_expression(condition);
            walk_statements(visitor, body);
        }
        StatementIR::Switch {
            subject,
            cases,
            default,
        } => {
            visitor.visit_expression(subject);
            for case in cases {
                for pattern in &case.patterns {
                    visitor.visit_expression(pattern);
                }
                walk_statements(visitor, &case.body);
            }
            if let Some(default) = default {
                walk_statements(visitor, default);
            }
        }
        StatementIR::Try {
            body,
            catches,
            finally,
        } => {
            walk_statements(visitor, body);
            for clause in catches {
                if let Some(ty) = &clause.exception_type {
                    visitor.visit_type(ty);
                }
                walk_statements(visitor, &clause.body);
            }
            if let Some(finally) = finally {
                walk_statements(visitor, finally);
            }
        }
        StatementIR::Return { value } => {
            if let Some(v) = value {
                visitor.visit_expression(v);
            }
        }
        StatementIR::Block { statements } => walk_statements(visitor, statements),
        StatementIR::FunctionDeclaration { function } => visitor.visit_function(function),
        StatementIR::Break { .. }
        | StatementIR::Continue { .. }
        | StatementIR::Rethrow
        | StatementIR::Unsupported { .. } => {}
    }
}

pub fn walk_expression<V: IrVisitor + ?Sized>(visitor: &mut V, expr: &ExpressionIR) {
    match expr {
        ExpressionIR::Binary { left, right, .. } => {
            visitor.visit_expression(left);
            visitor.visit_expression(right);
        }
        ExpressionIR::Unary { operand, .. } => visitor.visit_expression(operand),
        ExpressionIR::Assignment { target, value, .. } => {
            visitor.visit_expression(target);
            visitor.visit_expression(value);
        }
        ExpressionIR::MethodCall {
            target,
            args,
            named_args,
            ..
        } => {
            if let Some(target) = target {
                visitor.visit_expression(target);
            }
            for a in args {
                visitor.visit_expression(a);
            }
            for n in named_args {
                visitor.visit_expression(&n.value);
            }
        }
        ExpressionIR::InstanceCreation {
            ty,
            args,
            named_args,
            ..
        } => {
            visitor.visit_type(ty);
            for a in args {
                visitor.visit_expression(a);
            }
            for n in named_args {
                visitor.visit_expression(&n.value);
            }
        }
        ExpressionIR::PropertyAccess { target, .. } => visitor.visit_expression(target),
        ExpressionIR::IndexAccess { target, index, .. } => {
            visitor.visit_expression(target);
            visitor.visit_expression(index);
        }
        ExpressionIR::Conditional {
            condition,
            then_value,
            else_value,
        } => {
            visitor.visit_expression(condition);
            visitor.visit_expression(then_value);
            visitor.visit_expression(else_value);
        }
        ExpressionIR::ListLiteral { elements, .. } | ExpressionIR::SetLiteral { elements, .. } => {
            for e in elements {
                visitor.visit_expression(e);
            }
        }
        ExpressionIR::MapLiteral { entries, .. } => {
            for entry in entries {
                visitor.visit_expression(&entry.key);
                visitor.visit_expression(&entry.value);
            }
        }
        ExpressionIR::Lambda { params, body, .. } => {
            for p in params {
                visitor.visit_parameter(p);
            }
            match body {
                LambdaBody::Expression { expression } => visitor.visit_expression(expression),
                LambdaBody::Block { statements } => walk_statements(visitor, statements),
            }
        }
        ExpressionIR::Cascade { target, sections } => {
            visitor.visit_expression(target);
            for s in sections {
                visitor.visit_expression(s);
            }
        }
        ExpressionIR::Await { expression } => visitor.visit_expression(expression),
        ExpressionIR::StringInterpolation { parts } => {
            for part in parts {
                if let InterpolationPart::Expression { expression } = part {
                    visitor.visit_expression(expression);
                }
            }
        }
        ExpressionIR::TypeCheck { expression, ty, .. }
        | ExpressionIR::TypeCast { expression, ty } => {
            visitor.visit_expression(expression);
            visitor.visit_type(ty);
        }
        ExpressionIR::StringLiteral { .. }
        | ExpressionIR::IntLiteral { .. }
        | ExpressionIR::DoubleLiteral { .. }
        | ExpressionIR::BoolLiteral { .. }
        | ExpressionIR::NullLiteral
        | ExpressionIR::Identifier { .. }
        | ExpressionIR::This
        | ExpressionIR::Super
        | ExpressionIR::CascadeReceiver
        | ExpressionIR::Unsupported { .. } => {}
    }
}
