//! Class-level emission: constructors, accessors, operators, enums and
//! StatefulWidget/State pairs, checked through full generation runs.

#[cfg(test)]
mod tests {
    use crate::diagnostics::{
        Severity, FJS_METHOD_FAILED, FJS_MISSING_BUILD, FJS_STATE_NAMING,
        FJS_UNSUPPORTED_EXPRESSION,
    };
    use crate::ir::{
        ClassDecl, ConstructorDecl, DartFile, EnumDecl, ExpressionIR, FieldDecl,
        FieldInitializer, FunctionDecl, Parameter, ParameterKind, StatementIR, TypeRef,
    };
    use crate::options::GenerateOptions;
    use crate::pipeline::{CodeGenerator, GenerationResult};

    fn generate(unit: &DartFile) -> GenerationResult {
        let options = GenerateOptions {
            validate: false,
            ..GenerateOptions::default()
        };
        CodeGenerator::new(options).generate(unit)
    }

    fn code(result: &GenerationResult) -> &str {
        result.code.as_deref().expect("generation produced no code")
    }

    fn position(haystack: &str, needle: &str) -> usize {
        haystack
            .find(needle)
            .unwrap_or_else(|| panic!("`{}` not found in:\n{}", needle, haystack))
    }

    fn build_method(widget: ExpressionIR) -> FunctionDecl {
        FunctionDecl::new(
            "build",
            vec![Parameter::positional("context")],
            vec![StatementIR::ret(widget)],
        )
    }

    fn text(value: &str) -> ExpressionIR {
        ExpressionIR::call("Text", vec![ExpressionIR::string(value)], vec![])
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // CONSTRUCTORS
    // ═══════════════════════════════════════════════════════════════════════════════

    fn point_class() -> ClassDecl {
        let mut class = ClassDecl::new("Point");
        class.fields.push(FieldDecl::new("x", None));
        class.fields.push(FieldDecl::new("y", None));
        class.constructors.push(ConstructorDecl::unnamed(vec![
            Parameter::field_formal("x", ParameterKind::Positional),
            Parameter::field_formal("y", ParameterKind::Positional),
        ]));

        let mut origin = ConstructorDecl::unnamed(vec![]);
        origin.name = Some("origin".to_string());
        origin.initializers = vec![
            FieldInitializer {
                field: "x".to_string(),
                value: ExpressionIR::int(0),
            },
            FieldInitializer {
                field: "y".to_string(),
                value: ExpressionIR::int(0),
            },
        ];
        class.constructors.push(origin);

        let mut from_json = ConstructorDecl::unnamed(vec![Parameter::positional("json")]);
        from_json.name = Some("fromJson".to_string());
        from_json.is_factory = true;
        from_json.body = Some(vec![StatementIR::ret(ExpressionIR::new_instance(
            "Point",
            vec![ExpressionIR::int(1), ExpressionIR::int(2)],
            vec![],
        ))]);
        class.constructors.push(from_json);
        class
    }

    #[test]
    fn test_field_formals_assign_after_super() {
        let mut unit = DartFile::new("lib/point.dart");
        unit.classes.push(point_class());
        let result = generate(&unit);
        let js = code(&result);

        let ctor = position(js, "constructor(x, y) {");
        let sup = position(js, "super();");
        let assign = position(js, "this.x = x;");
        assert!(ctor < sup && sup < assign);
        assert!(js.contains("this.y = y;"));
    }

    #[test]
    fn test_named_constructor_has_creator_and_initializer() {
        let mut unit = DartFile::new("lib/point.dart");
        unit.classes.push(point_class());
        let result = generate(&unit);
        let js = code(&result);

        assert!(js.contains("static origin(...args) {"));
        assert!(js.contains("const __self = new Point();"));
        assert!(js.contains("__self.$origin(...args);"));
        assert!(js.contains("$origin() {"));
        assert!(js.contains("this.x = 0;"));
    }

    #[test]
    fn test_named_constructor_forwards_super_arguments() {
        let base = ClassDecl::new("Shape");
        let mut class = ClassDecl::extending("Square", TypeRef::named("Shape"));
        let mut sized = ConstructorDecl::unnamed(vec![Parameter::positional("side")]);
        sized.name = Some("sized".to_string());
        sized.super_args = vec![ExpressionIR::ident("side")];
        sized.super_named_args = vec![crate::ir::NamedArgument::new("sides", ExpressionIR::int(4))];
        class.constructors.push(sized);
        let mut unit = DartFile::new("lib/square.dart");
        unit.classes.push(class);
        unit.classes.push(base);

        let result = generate(&unit);
        let js = code(&result);
        let init = position(js, "$sized(side) {");
        let sup = position(
            js,
            "Object.assign(this, Reflect.construct(Shape, [side, { sides: 4 }], this.constructor));",
        );
        assert!(init < sup);
        assert_eq!(result.errors().count(), 0, "{:?}", result.issues);
    }

    #[test]
    fn test_named_factory_is_static() {
        let mut unit = DartFile::new("lib/point.dart");
        unit.classes.push(point_class());
        let result = generate(&unit);
        let js = code(&result);

        assert!(js.contains("static fromJson(json) {"));
        assert!(js.contains("return new Point(1, 2);"));
        assert!(!js.contains("$fromJson"));
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // ACCESSORS & OPERATORS
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_getter_setter_pair_merges_into_one_callable() {
        let mut class = ClassDecl::new("Thermometer");
        class.fields.push(FieldDecl::new("_celsius", Some(ExpressionIR::int(0))));
        class.methods.push(FunctionDecl::getter(
            "celsius",
            vec![StatementIR::ret(ExpressionIR::ident("_celsius"))],
        ));
        class.methods.push(FunctionDecl::setter(
            "celsius",
            "value",
            vec![StatementIR::expr(ExpressionIR::assign(
                ExpressionIR::ident("_celsius"),
                ExpressionIR::ident("value"),
            ))],
        ));
        class.methods.push(FunctionDecl::new(
            "reset",
            vec![],
            vec![StatementIR::expr(ExpressionIR::assign(
                ExpressionIR::ident("celsius"),
                ExpressionIR::int(0),
            ))],
        ));
        let mut unit = DartFile::new("lib/thermometer.dart");
        unit.classes.push(class);

        let result = generate(&unit);
        let js = code(&result);
        assert!(js.contains("celsius(__value) {"));
        assert!(js.contains("__value !== undefined"));
        assert!(js.contains("const value = __value;"));
        assert!(js.contains("this._celsius = value;"));
        assert!(js.contains("return __value;"));
        assert!(js.contains("return this._celsius;"));
        assert!(js.contains("this.celsius(0)"));
        assert!(!js.contains("get celsius"));
        assert!(!js.contains("set celsius"));
        assert_eq!(result.errors().count(), 0, "{:?}", result.issues);
    }

    #[test]
    fn test_getter_reads_field_named_like_setter_parameter() {
        let mut class = ClassDecl::new("Box");
        class.fields.push(FieldDecl::new("value", None));
        class.methods.push(FunctionDecl::getter(
            "label",
            vec![StatementIR::ret(ExpressionIR::ident("value"))],
        ));
        class.methods.push(FunctionDecl::setter(
            "label",
            "value",
            vec![StatementIR::expr(ExpressionIR::call(
                "print",
                vec![ExpressionIR::ident("value")],
                vec![],
            ))],
        ));
        let mut unit = DartFile::new("lib/box.dart");
        unit.classes.push(class);

        let result = generate(&unit);
        let js = code(&result);
        let setter = position(js, "const value = __value;");
        let print = position(js, "print(value);");
        let getter = position(js, "return this.value;");
        assert!(setter < print && print < getter);
        assert!(!js.contains("label(value)"));
        assert_eq!(result.errors().count(), 0, "{:?}", result.issues);
    }

    #[test]
    fn test_lone_getter_stays_native() {
        let mut class = ClassDecl::new("Circle");
        class.fields.push(FieldDecl::new("radius", Some(ExpressionIR::int(1))));
        class.methods.push(FunctionDecl::getter(
            "diameter",
            vec![StatementIR::ret(ExpressionIR::ident("radius"))],
        ));
        let mut unit = DartFile::new("lib/circle.dart");
        unit.classes.push(class);

        let result = generate(&unit);
        assert!(code(&result).contains("get diameter() {"));
        assert!(code(&result).contains("return this.radius;"));
    }

    #[test]
    fn test_equality_operator_becomes_equals() {
        let mut equals = FunctionDecl::new(
            "==",
            vec![Parameter::positional("other")],
            vec![StatementIR::ret(ExpressionIR::boolean(true))],
        );
        equals.is_operator = true;
        let mut class = ClassDecl::new("Money");
        class.methods.push(equals);
        let mut unit = DartFile::new("lib/money.dart");
        unit.classes.push(class);

        let result = generate(&unit);
        assert!(code(&result).contains("equals(other) {"));
    }

    #[test]
    fn test_unmapped_operator_fails_only_its_method() {
        let mut xor = FunctionDecl::new(
            "^",
            vec![Parameter::positional("other")],
            vec![StatementIR::ret(ExpressionIR::ident("other"))],
        );
        xor.is_operator = true;
        let mut class = ClassDecl::new("Bits");
        class.methods.push(xor);
        class.methods.push(FunctionDecl::new(
            "describe",
            vec![],
            vec![StatementIR::ret(ExpressionIR::string("bits"))],
        ));
        let mut unit = DartFile::new("lib/bits.dart");
        unit.classes.push(class);

        let result = generate(&unit);
        let js = code(&result);
        assert!(result.success);
        assert!(js.contains("GENERATION FAILED"));
        assert!(js.contains("describe() {"));
        assert!(js.contains("return \"bits\";"));
        let failed: Vec<_> = result
            .issues
            .iter()
            .filter(|d| d.code == FJS_METHOD_FAILED)
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].severity, Severity::Warning);
    }

    #[test]
    fn test_unsupported_expression_keeps_class() {
        let mut class = ClassDecl::extending("Broken", TypeRef::named("StatelessWidget"));
        class.methods.push(build_method(ExpressionIR::Unsupported {
            node_kind: "pattern-match".to_string(),
        }));
        let mut unit = DartFile::new("lib/broken.dart");
        unit.classes.push(class);

        let result = generate(&unit);
        let js = code(&result);
        assert!(js.contains("class Broken extends StatelessWidget {"));
        assert!(js.contains("FJS: unsupported expression pattern-match"));
        assert!(result
            .issues
            .iter()
            .any(|d| d.code == FJS_UNSUPPORTED_EXPRESSION && d.severity == Severity::Error));
    }

    #[test]
    fn test_parameter_shadows_field() {
        let mut class = ClassDecl::new("Greeter");
        class.fields.push(FieldDecl::new("name", Some(ExpressionIR::string("world"))));
        class.methods.push(FunctionDecl::new(
            "greet",
            vec![Parameter::positional("name")],
            vec![StatementIR::ret(ExpressionIR::ident("name"))],
        ));
        class.methods.push(FunctionDecl::new(
            "own",
            vec![],
            vec![StatementIR::ret(ExpressionIR::ident("name"))],
        ));
        let mut unit = DartFile::new("lib/greeter.dart");
        unit.classes.push(class);

        let result = generate(&unit);
        let js = code(&result);
        let greet = position(js, "greet(name) {");
        let own = position(js, "own() {");
        assert!(js[greet..own].contains("return name;"));
        assert!(js[own..].contains("return this.name;"));
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // ENUMS
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_enum_is_frozen_class() {
        let mut unit = DartFile::new("lib/mode.dart");
        unit.enums.push(EnumDecl {
            name: "Mode".to_string(),
            values: vec!["light".to_string(), "dark".to_string()],
            location: Default::default(),
        });
        let result = generate(&unit);
        let js = code(&result);
        assert!(js.contains("class Mode {"));
        assert!(js.contains("static light = Object.freeze(new Mode(\"light\", 0));"));
        assert!(js.contains("static dark = Object.freeze(new Mode(\"dark\", 1));"));
        assert!(js.contains("static values = Object.freeze([Mode.light, Mode.dark]);"));
        assert!(js.contains("Object.freeze(Mode);"));
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // STATEFUL PAIRS
    // ═══════════════════════════════════════════════════════════════════════════════

    fn counter_unit(state_name: &str, state_methods: Vec<FunctionDecl>) -> DartFile {
        let mut widget = ClassDecl::extending("Counter", TypeRef::named("StatefulWidget"));
        widget.fields.push(FieldDecl::new("title", None));
        widget.methods.push(FunctionDecl::new(
            "createState",
            vec![],
            vec![StatementIR::ret(ExpressionIR::call(state_name, vec![], vec![]))],
        ));

        let mut state = ClassDecl::extending(
            state_name,
            TypeRef::generic("State", vec![TypeRef::named("Counter")]),
        );
        state.fields.push(FieldDecl::new("count", Some(ExpressionIR::int(0))));
        state.methods = state_methods;

        let mut unit = DartFile::new("lib/counter.dart");
        // State first: ordering must still put the widget ahead of it.
        unit.classes.push(state);
        unit.classes.push(widget);
        unit
    }

    fn init_state_with_super() -> FunctionDecl {
        FunctionDecl::new(
            "initState",
            vec![],
            vec![
                StatementIR::expr(ExpressionIR::assign(
                    ExpressionIR::ident("count"),
                    ExpressionIR::int(1),
                )),
                StatementIR::expr(ExpressionIR::method_call(ExpressionIR::Super, "initState", vec![])),
            ],
        )
    }

    #[test]
    fn test_stateful_pair_layout() {
        let unit = counter_unit(
            "_CounterState",
            vec![
                build_method(ExpressionIR::call(
                    "Text",
                    vec![ExpressionIR::property(ExpressionIR::ident("widget"), "title")],
                    vec![],
                )),
                init_state_with_super(),
            ],
        );
        let result = generate(&unit);
        let js = code(&result);

        let widget = position(js, "class Counter extends StatefulWidget {");
        let create = position(js, "return new _CounterState();");
        let state = position(js, "class _CounterState extends State {");
        assert!(widget < create && create < state);

        // initState: super call first, then the body.
        let super_init = position(js, "super.initState();");
        let body = position(js, "this.count = 1;");
        assert!(state < super_init && super_init < body);

        // setState wrapper before build, build last.
        let wrapper = position(js, "setState(updater) {");
        let build = position(js, "build(context) {");
        assert!(body < wrapper && wrapper < build);
        assert!(js.contains("new Text(this.widget.title)"));
        assert_eq!(js.matches("super.initState();").count(), 1);
        assert!(!result.issues.iter().any(|d| d.code == FJS_MISSING_BUILD));
    }

    #[test]
    fn test_dispose_releases_fields_before_super() {
        let mut unit = counter_unit("_CounterState", vec![build_method(text("0"))]);
        let state = unit
            .classes
            .iter_mut()
            .find(|c| c.name == "_CounterState")
            .expect("state class");
        let mut controller = FieldDecl::new("controller", None);
        controller.is_disposable = true;
        state.fields.push(controller);

        let result = generate(&unit);
        let js = code(&result);
        let release = position(js, "this.controller?.dispose();");
        let sup = position(js, "super.dispose();");
        assert!(release < sup);
    }

    fn state_with_cache(count_reactive: bool) -> String {
        let mut unit = counter_unit("_CounterState", vec![build_method(text("0"))]);
        let state = unit
            .classes
            .iter_mut()
            .find(|c| c.name == "_CounterState")
            .expect("state class");
        state.fields.insert(0, FieldDecl::new("_cache", None));
        state.fields[1].is_reactive = count_reactive;
        let js = code(&generate(&unit)).to_string();
        let start = position(&js, "class _CounterState");
        js[start..].to_string()
    }

    #[test]
    fn test_reactive_fields_are_listed_and_initialized_first() {
        let reactive = state_with_cache(true);
        let plain = state_with_cache(false);
        assert_ne!(reactive, plain);

        let list = position(&reactive, "static reactiveFields = Object.freeze([\"count\"]);");
        let ctor = position(&reactive, "constructor() {");
        let count = position(&reactive, "this.count = 0;");
        let cache = position(&reactive, "this._cache = null;");
        assert!(list < ctor && ctor < count && count < cache);

        assert!(!plain.contains("reactiveFields"));
        assert!(position(&plain, "this._cache = null;") < position(&plain, "this.count = 0;"));
    }

    #[test]
    fn test_pair_checks_are_reported() {
        let unit = counter_unit("CounterLogic", vec![]);
        let result = generate(&unit);
        assert!(result.success);
        let missing: Vec<_> = result
            .issues
            .iter()
            .filter(|d| d.code == FJS_MISSING_BUILD)
            .collect();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].severity, Severity::Error);
        assert!(result.issues.iter().any(|d| d.code == FJS_STATE_NAMING));
        assert!(code(&result).contains("return new CounterLogic();"));
    }
}
