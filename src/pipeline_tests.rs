//! End-to-end runs of `CodeGenerator` over small program units.

#[cfg(test)]
mod tests {
    use crate::diagnostics::{
        Severity, FJS_ERROR_THRESHOLD, FJS_MISSING_BUILD, FJS_UNRESOLVED_IDENTIFIER,
    };
    use crate::ir::{
        ClassDecl, DartFile, ExpressionIR, FieldDecl, FunctionDecl, Parameter, StatementIR,
        TypeRef, VariableDecl,
    };
    use crate::options::GenerateOptions;
    use crate::pipeline::{CodeGenerator, GenerationResult};

    fn generate(unit: &DartFile) -> GenerationResult {
        CodeGenerator::new(GenerateOptions::default()).generate(unit)
    }

    fn code(result: &GenerationResult) -> &str {
        result.code.as_deref().expect("generation produced no code")
    }

    fn build_method(widget: ExpressionIR) -> FunctionDecl {
        FunctionDecl::new(
            "build",
            vec![Parameter::positional("context")],
            vec![StatementIR::ret(widget)],
        )
    }

    fn print(arg: ExpressionIR) -> StatementIR {
        StatementIR::expr(ExpressionIR::call("print", vec![arg], vec![]))
    }

    fn variable(name: &str, initializer: Option<ExpressionIR>, is_final: bool) -> VariableDecl {
        VariableDecl {
            name: name.to_string(),
            ty: None,
            initializer,
            is_final,
            is_const: false,
            location: Default::default(),
        }
    }

    #[test]
    fn test_stateless_widget_generates_cleanly() {
        let mut class = ClassDecl::extending("Foo", TypeRef::named("StatelessWidget"));
        class.methods.push(build_method(ExpressionIR::call(
            "Text",
            vec![ExpressionIR::string("hi")],
            vec![],
        )));
        let mut unit = DartFile::new("lib/foo.dart");
        unit.classes.push(class);

        let result = generate(&unit);
        assert!(result.success, "{:?}", result.issues);
        assert_eq!(result.errors().count(), 0, "{:?}", result.issues);
        let js = code(&result);
        assert!(js.starts_with("// Generated by flutterjs-codegen from lib/foo.dart"));
        assert!(js.contains("class Foo extends StatelessWidget {"));
        assert!(js.contains("return new Text(\"hi\");"));
        assert!(js.contains("export { Foo };"));
        assert!(result.statistics.validated);
        assert!(!result.statistics.has_critical_issues);
        assert_eq!(result.statistics.classes, 1);
        assert!(result.statistics.used_widgets.contains(&"Text".to_string()));
    }

    #[test]
    fn test_state_without_build_reports_one_error() {
        let mut widget = ClassDecl::extending("Counter", TypeRef::named("StatefulWidget"));
        widget.methods.push(FunctionDecl::new(
            "createState",
            vec![],
            vec![StatementIR::ret(ExpressionIR::call("_CounterState", vec![], vec![]))],
        ));
        let state = ClassDecl::extending(
            "_CounterState",
            TypeRef::generic("State", vec![TypeRef::named("Counter")]),
        );
        let mut unit = DartFile::new("lib/counter.dart");
        unit.classes.push(widget);
        unit.classes.push(state);

        let result = generate(&unit);
        let errors: Vec<_> = result.errors().collect();
        assert_eq!(errors.len(), 1, "{:?}", result.issues);
        assert_eq!(errors[0].code, FJS_MISSING_BUILD);
        assert!(errors[0].message.contains("build"));
        assert!(result.success);
    }

    #[test]
    fn test_loop_variable_does_not_leak() {
        let mut class = ClassDecl::new("Bag");
        class.fields.push(FieldDecl::new("item", None));
        class.fields.push(FieldDecl::new(
            "items",
            Some(ExpressionIR::ListLiteral {
                elements: vec![],
                is_const: false,
            }),
        ));
        class.methods.push(FunctionDecl::new(
            "dump",
            vec![],
            vec![
                StatementIR::ForEach {
                    variable: "item".to_string(),
                    variable_type: None,
                    iterable: ExpressionIR::ident("items"),
                    body: vec![print(ExpressionIR::ident("item"))],
                    is_final: true,
                    is_await: false,
                },
                print(ExpressionIR::ident("item")),
            ],
        ));
        let mut unit = DartFile::new("lib/bag.dart");
        unit.classes.push(class);

        let result = generate(&unit);
        let js = code(&result);
        let header = js.find("for (const item of this.items) {").expect("loop header");
        let inner = js.find("print(item);").expect("loop body");
        let after = js.find("print(this.item);").expect("statement after loop");
        assert!(header < inner && inner < after);
        assert_eq!(result.errors().count(), 0, "{:?}", result.issues);
    }

    #[test]
    fn test_superclass_emitted_first() {
        let mut unit = DartFile::new("lib/shapes.dart");
        unit.classes.push(ClassDecl::extending("B", TypeRef::named("A")));
        unit.classes.push(ClassDecl::new("A"));

        let result = generate(&unit);
        let js = code(&result);
        let a = js.find("class A extends").expect("class A");
        let b = js.find("class B extends A {").expect("class B");
        assert!(a < b);
    }

    #[test]
    fn test_top_level_declarations_in_section_order() {
        let mut unit = DartFile::new("lib/config.dart");
        unit.variables.push(variable("limit", Some(ExpressionIR::int(10)), true));
        unit.variables.push(variable("counter", None, false));
        unit.functions.push(FunctionDecl::new(
            "describe",
            vec![],
            vec![StatementIR::ret(ExpressionIR::ident("limit"))],
        ));
        unit.classes.push(ClassDecl::new("Settings"));

        let result = generate(&unit);
        let js = code(&result);
        let limit = js.find("const limit = 10;").expect("final variable");
        let counter = js.find("let counter;").expect("mutable variable");
        let class = js.find("class Settings").expect("class");
        let function = js.find("function describe() {").expect("function");
        let exports = js.find("export {").expect("exports");
        assert!(limit < counter && counter < class && class < function && function < exports);
        assert!(js.contains("return limit;"));
        assert!(js.ends_with('\n'));
    }

    #[test]
    fn test_unresolved_identifier_is_an_error() {
        let mut unit = DartFile::new("lib/oops.dart");
        unit.functions.push(FunctionDecl::new(
            "oops",
            vec![],
            vec![StatementIR::ret(ExpressionIR::ident("missing"))],
        ));

        let result = generate(&unit);
        assert!(code(&result).contains("missing /* unresolved */"));
        assert!(result
            .issues
            .iter()
            .any(|d| d.code == FJS_UNRESOLVED_IDENTIFIER && d.severity == Severity::Error));
    }

    #[test]
    fn test_error_threshold_marks_run_unsuccessful() {
        let mut unit = DartFile::new("lib/oops.dart");
        unit.functions.push(FunctionDecl::new(
            "oops",
            vec![],
            vec![
                print(ExpressionIR::ident("first")),
                print(ExpressionIR::ident("second")),
            ],
        ));
        let options = GenerateOptions {
            max_errors: Some(1),
            ..GenerateOptions::default()
        };

        let result = CodeGenerator::new(options).generate(&unit);
        assert!(!result.success);
        assert!(result.code.is_some());
        assert_eq!(result.error.as_deref(), Some("error threshold exceeded"));
        assert!(result.issues.iter().any(|d| d.code == FJS_ERROR_THRESHOLD));

        let lenient = CodeGenerator::new(GenerateOptions::default()).generate(&unit);
        assert!(lenient.success);
    }

    #[test]
    fn test_json_unit_round_trips_through_generator() {
        let json = r#"{
            "filePath": "lib/hello.dart",
            "functions": [{
                "name": "hello",
                "body": [{ "type": "return", "value": { "type": "string-literal", "value": "hi" } }]
            }]
        }"#;
        let result = CodeGenerator::new(GenerateOptions::default()).generate_json(json);
        assert!(result.success, "{:?}", result.issues);
        assert!(code(&result).contains("function hello() {\n  return \"hi\";\n}"));
        assert_eq!(result.statistics.functions, 1);
    }

    #[test]
    fn test_optimized_run_records_report() {
        let mut unit = DartFile::new("lib/config.dart");
        unit.variables.push(variable("limit", Some(ExpressionIR::int(10)), true));
        unit.functions.push(FunctionDecl::new(
            "twice",
            vec![Parameter::positional("n")],
            vec![StatementIR::ret(ExpressionIR::binary(
                crate::ir::BinaryOp::Mul,
                ExpressionIR::ident("n"),
                ExpressionIR::int(2),
            ))],
        ));
        let options = GenerateOptions::default().with_optimization(2);

        let result = CodeGenerator::new(options).generate(&unit);
        assert!(result.success, "{:?}", result.issues);
        let report = result.statistics.optimization.as_ref().expect("optimization report");
        assert_eq!(report.level, 2);
        assert!(report.comments_removed >= 1);
        let js = code(&result);
        assert!(js.starts_with("// Optimized (level 2)"));
        assert!(!js.contains("// Generated by"));
        assert!(js.contains("return n * 2;"));
    }
}
