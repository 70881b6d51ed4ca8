//! Analysis phase: everything the emitters need to know about a unit before
//! the first line of output is produced.

use crate::context::ClassSummary;
use crate::expression::CORE_TYPE_TAGS;
use crate::ir::{ClassDecl, DartFile, ExpressionIR, Parameter, StatementIR, UnaryOp};
use crate::imports::GlobalSymbolTable;
use crate::registry::{is_framework_base, WidgetRegistry, DEFAULT_BASE_CLASS};
use crate::visitor::{self, IrVisitor};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Runtime helper functions injected into a generated file on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Helper {
    IsType,
    NonNull,
}

impl Helper {
    pub fn name(&self) -> &'static str {
        match self {
            Helper::IsType => "__isType",
            Helper::NonNull => "__nonNull",
        }
    }

    pub fn source(&self) -> &'static str {
        match self {
            Helper::IsType => IS_TYPE_HELPER,
            Helper::NonNull => NON_NULL_HELPER,
        }
    }
}

const IS_TYPE_HELPER: &str = r#"function __isType(value, type) {
  switch (type) {
    case "int":
      return Number.isInteger(value);
    case "double":
    case "num":
      return typeof value === "number";
    case "String":
      return typeof value === "string";
    case "bool":
      return typeof value === "boolean";
    case "dynamic":
    case "Object":
      return value !== null && value !== undefined;
    case "List":
      return Array.isArray(value);
    case "Map":
      return value instanceof Map || (typeof value === "object" && value !== null && !Array.isArray(value));
    case "Function":
      return typeof value === "function";
    case "Null":
      return value === null || value === undefined;
    case "Iterable":
      return value !== null && value !== undefined && typeof value[Symbol.iterator] === "function";
    default:
      return typeof type === "function" && value instanceof type;
  }
}"#;

const NON_NULL_HELPER: &str = r#"function __nonNull(value) {
  if (value === null || value === undefined) {
    throw new TypeError("Null check operator used on a null value");
  }
  return value;
}"#;

/// Accumulated facts about one unit. Built once, read-only afterwards.
#[derive(Debug, Default)]
pub struct UnitAnalysis {
    /// Names referenced where a runtime value is needed.
    pub used_symbols: BTreeSet<String>,
    /// Types referenced at runtime (construction, type tests, catch clauses).
    pub used_types: BTreeSet<String>,
    pub used_widgets: BTreeSet<String>,
    pub helpers: BTreeSet<Helper>,
    /// Every name declared anywhere in the unit.
    pub local_names: HashSet<String>,
    pub widget_classes: HashSet<String>,
    pub class_index: HashMap<String, ClassSummary>,
    pub module_accessors: HashSet<String>,
    /// Top-level declarations visible to other modules.
    pub public_names: BTreeSet<String>,
}

pub fn analyze(unit: &DartFile, registry: &WidgetRegistry, symbols: &GlobalSymbolTable) -> UnitAnalysis {
    let mut analyzer = Analyzer {
        registry,
        symbols,
        out: UnitAnalysis::default(),
    };
    analyzer.declare_top_level(unit);
    analyzer.visit_unit(unit);

    let mut out = analyzer.out;
    out.widget_classes = unit
        .classes
        .iter()
        .filter(|c| is_widget_class(&c.name, &out.class_index, registry))
        .map(|c| c.name.clone())
        .collect();
    out
}

/// Whether a local class reaches a widget base through its superclass chain.
pub fn is_widget_class(
    name: &str,
    index: &HashMap<String, ClassSummary>,
    registry: &WidgetRegistry,
) -> bool {
    let mut seen = HashSet::new();
    let mut current = name.to_string();
    while seen.insert(current.clone()) {
        let Some(summary) = index.get(&current) else {
            return false;
        };
        match &summary.superclass {
            Some(sup) if matches!(sup.as_str(), "StatelessWidget" | "StatefulWidget" | "Widget") => {
                return true
            }
            Some(sup) if registry.is_widget(sup) => return true,
            Some(sup) => current = sup.clone(),
            None => return false,
        }
    }
    false
}

fn summarize(class: &ClassDecl) -> ClassSummary {
    let members = class
        .fields
        .iter()
        .map(|f| f.name.clone())
        .chain(
            class
                .methods
                .iter()
                .filter(|m| !m.is_static && !m.is_operator)
                .map(|m| m.name.clone()),
        )
        .collect();
    let static_members = class
        .static_fields
        .iter()
        .map(|f| f.name.clone())
        .chain(class.methods.iter().filter(|m| m.is_static).map(|m| m.name.clone()))
        .collect();
    ClassSummary {
        superclass: class.superclass.as_ref().map(|t| t.base_name().to_string()),
        members,
        static_members,
    }
}

/// Superclass emitted after `extends`: a framework base, a class of this
/// unit, or a known external class. Anything else falls back to `Widget`.
pub fn effective_base(
    superclass: Option<&str>,
    local_classes: &HashMap<String, ClassSummary>,
    registry: &WidgetRegistry,
    symbols: &GlobalSymbolTable,
) -> String {
    match superclass {
        Some(name)
            if is_framework_base(name)
                || local_classes.contains_key(name)
                || registry.module_for(name).is_some()
                || symbols.contains(name) =>
        {
            name.to_string()
        }
        _ => DEFAULT_BASE_CLASS.to_string(),
    }
}

struct Analyzer<'r> {
    registry: &'r WidgetRegistry,
    symbols: &'r GlobalSymbolTable,
    out: UnitAnalysis,
}

impl<'r> Analyzer<'r> {
    fn declare_top_level(&mut self, unit: &DartFile) {
        let names = unit
            .classes
            .iter()
            .map(|c| &c.name)
            .chain(unit.functions.iter().map(|f| &f.name))
            .chain(unit.variables.iter().map(|v| &v.name))
            .chain(unit.enums.iter().map(|e| &e.name));
        for name in names {
            self.out.local_names.insert(name.clone());
            if !name.starts_with('_') {
                self.out.public_names.insert(name.clone());
            }
        }
        for typedef in &unit.typedefs {
            self.out.local_names.insert(typedef.clone());
        }
        for function in &unit.functions {
            if function.is_accessor() {
                self.out.module_accessors.insert(function.name.clone());
            }
        }
        for class in &unit.classes {
            self.out.class_index.insert(class.name.clone(), summarize(class));
        }
    }

    fn use_symbol(&mut self, name: &str) {
        self.out.used_symbols.insert(name.to_string());
        if self.registry.is_widget(name) {
            self.out.used_widgets.insert(name.to_string());
        }
    }

    fn use_type(&mut self, name: &str) {
        if CORE_TYPE_TAGS.contains(&name) {
            return;
        }
        self.out.used_types.insert(name.to_string());
        self.use_symbol(name);
    }
}

impl<'r> IrVisitor for Analyzer<'r> {
    fn visit_class(&mut self, class: &ClassDecl) {
        let base = effective_base(
            class.superclass.as_ref().map(|t| t.base_name()),
            &self.out.class_index,
            self.registry,
            self.symbols,
        );
        self.use_type(&base);
        for field in class.fields.iter().chain(class.static_fields.iter()) {
            self.out.local_names.insert(field.name.clone());
        }
        for method in &class.methods {
            self.out.local_names.insert(method.name.clone());
        }
        visitor::walk_class(self, class);
    }

    fn visit_parameter(&mut self, param: &Parameter) {
        self.out.local_names.insert(param.name.clone());
        visitor::walk_parameter(self, param);
    }

    fn visit_statement(&mut self, stmt: &StatementIR) {
        match stmt {
            StatementIR::VariableDeclaration { name, .. } => {
                self.out.local_names.insert(name.clone());
            }
            StatementIR::ForEach { variable, .. } => {
                self.out.local_names.insert(variable.clone());
            }
            StatementIR::FunctionDeclaration { function } => {
                self.out.local_names.insert(function.name.clone());
            }
            StatementIR::Try { catches, .. } => {
                for clause in catches {
                    if let Some(ty) = &clause.exception_type {
                        self.out.helpers.insert(Helper::IsType);
                        self.use_type(ty.base_name());
                    }
                    for param in clause.exception_param.iter().chain(clause.stack_trace_param.iter()) {
                        self.out.local_names.insert(param.clone());
                    }
                }
            }
            _ => {}
        }
        visitor::walk_statement(self, stmt);
    }

    fn visit_expression(&mut self, expr: &ExpressionIR) {
        match expr {
            ExpressionIR::Identifier { name } => self.use_symbol(name),
            ExpressionIR::MethodCall {
                target: None,
                method,
                ..
            } => self.use_symbol(method),
            ExpressionIR::InstanceCreation { ty, .. } => self.use_type(ty.base_name()),
            ExpressionIR::TypeCheck { ty, .. } => {
                self.out.helpers.insert(Helper::IsType);
                self.use_type(ty.base_name());
            }
            ExpressionIR::Unary {
                op: UnaryOp::NullAssert,
                ..
            } => {
                self.out.helpers.insert(Helper::NonNull);
            }
            _ => {}
        }
        visitor::walk_expression(self, expr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{CatchClause, FunctionDecl, TypeRef};

    #[test]
    fn test_collects_widgets_and_locals() {
        let mut unit = DartFile::new("lib/main.dart");
        let mut class = ClassDecl::extending("Greeting", TypeRef::named("StatelessWidget"));
        class.methods.push(FunctionDecl::new(
            "build",
            vec![Parameter::positional("context")],
            vec![StatementIR::ret(ExpressionIR::call(
                "Text",
                vec![ExpressionIR::string("hi")],
                vec![],
            ))],
        ));
        unit.classes.push(class);

        let a = analyze(&unit, WidgetRegistry::builtin(), &GlobalSymbolTable::default());
        assert!(a.used_widgets.contains("Text"));
        assert!(a.used_symbols.contains("StatelessWidget"));
        assert!(a.local_names.contains("context"));
        assert!(a.local_names.contains("Greeting"));
        assert!(a.widget_classes.contains("Greeting"));
        assert!(a.public_names.contains("Greeting"));
        assert!(a.helpers.is_empty());
    }

    #[test]
    fn test_helpers_detected() {
        let mut unit = DartFile::new("lib/main.dart");
        unit.functions.push(FunctionDecl::new(
            "parse",
            vec![Parameter::positional("v")],
            vec![StatementIR::Try {
                body: vec![StatementIR::expr(ExpressionIR::Unary {
                    op: UnaryOp::NullAssert,
                    operand: Box::new(ExpressionIR::ident("v")),
                })],
                catches: vec![CatchClause {
                    exception_type: Some(TypeRef::named("FormatException")),
                    exception_param: Some("e".to_string()),
                    stack_trace_param: None,
                    body: vec![],
                }],
                finally: None,
            }],
        ));
        let a = analyze(&unit, WidgetRegistry::builtin(), &GlobalSymbolTable::default());
        let helpers: Vec<Helper> = a.helpers.iter().copied().collect();
        assert_eq!(helpers, vec![Helper::IsType, Helper::NonNull]);
        assert!(a.local_names.contains("e"));
    }

    #[test]
    fn test_widget_class_through_local_chain() {
        let mut unit = DartFile::new("lib/main.dart");
        unit.classes.push(ClassDecl::extending("Base", TypeRef::named("StatefulWidget")));
        unit.classes.push(ClassDecl::extending("Derived", TypeRef::named("Base")));
        unit.classes.push(ClassDecl::new("Plain"));
        let a = analyze(&unit, WidgetRegistry::builtin(), &GlobalSymbolTable::default());
        assert!(a.widget_classes.contains("Derived"));
        assert!(!a.widget_classes.contains("Plain"));
        // Absent superclass falls back to the generic widget base.
        assert!(a.used_symbols.contains("Widget"));
    }

    #[test]
    fn test_top_level_accessors_recorded() {
        let mut unit = DartFile::new("lib/main.dart");
        unit.functions.push(FunctionDecl::getter("version", vec![]));
        unit.functions.push(FunctionDecl::new("_hidden", vec![], vec![]));
        let a = analyze(&unit, WidgetRegistry::builtin(), &GlobalSymbolTable::default());
        assert!(a.module_accessors.contains("version"));
        assert!(!a.public_names.contains("_hidden"));
    }
}
