use jrewrite_syntax::{
    parse_java, DeclarationKind, MemberDecl, ModifierKeyword, TypeKind,
};
use pretty_assertions::assert_eq;

const TEST_CLASS: &str = r#"package com.example.tests;

import org.junit.Before;
import org.junit.Test;
import static org.junit.Assert.*;
import java.util.*;

/** Exercises the parser. */
@RunWith(Suite.class)
public class ExampleTest {
    private static final String NAME = "{not a brace}";
    private final List<Map<String, Integer>> counts = new ArrayList<>();

    public ExampleTest() {
        super();
    }

    @Before
    public void initialize() {
        counts.clear();
    }

    @Ignore("not ready yet")
    @Test(timeout = 10)
    public void something() throws Exception {
        Runnable r = () -> { };
    }

    static class Helper {
        @org.junit.After void cleanup() {}
    }
}
"#;

#[test]
fn parses_package_imports_and_declarations() {
    let unit = parse_java(TEST_CLASS).expect("should parse");

    assert_eq!(unit.package.as_ref().map(|p| p.name.as_str()), Some("com.example.tests"));

    let imports: Vec<String> = unit.imports.iter().map(|i| i.render()).collect();
    assert_eq!(
        imports,
        vec![
            "import org.junit.Before;",
            "import org.junit.Test;",
            "import static org.junit.Assert.*;",
            "import java.util.*;",
        ]
    );
    assert!(unit.imports[2].is_static && unit.imports[2].is_wildcard);

    assert_eq!(unit.types.len(), 1);
    let ty = &unit.types[0];
    assert_eq!(ty.kind, TypeKind::Class);
    assert_eq!(ty.name, "ExampleTest");
    assert_eq!(ty.annotations[0].name, "RunWith");
    assert_eq!(ty.annotations[0].arguments.as_deref(), Some("Suite.class"));

    let initialize = ty.method("initialize").expect("initialize");
    assert_eq!(initialize.annotation_names(), vec!["Before"]);
    assert!(initialize.has_modifier(ModifierKeyword::Public));
    assert_eq!(initialize.signature, "void initialize()");

    let something = ty.method("something").expect("something");
    assert_eq!(something.annotation_names(), vec!["Ignore", "Test"]);
    assert_eq!(something.annotations[0].string_argument().as_deref(), Some("not ready yet"));
    assert_eq!(something.annotations[1].arguments.as_deref(), Some("timeout = 10"));
    assert_eq!(something.signature, "void something() throws Exception");

    let ctor = ty.method("ExampleTest").expect("constructor");
    assert!(ctor.is_constructor);

    let fields: Vec<&str> = ty
        .members
        .iter()
        .filter_map(|m| match m {
            MemberDecl::Field(f) => Some(f.name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(fields, vec!["NAME", "counts"]);
}

#[test]
fn declarations_walk_nested_types_with_dotted_locations() {
    let unit = parse_java(TEST_CLASS).expect("should parse");
    let locations: Vec<(DeclarationKind, String)> = unit
        .declarations()
        .into_iter()
        .map(|d| (d.kind, d.location))
        .collect();

    assert_eq!(
        locations,
        vec![
            (DeclarationKind::Type(TypeKind::Class), "ExampleTest".to_string()),
            (DeclarationKind::Field, "ExampleTest.NAME".to_string()),
            (DeclarationKind::Field, "ExampleTest.counts".to_string()),
            (DeclarationKind::Constructor, "ExampleTest.ExampleTest".to_string()),
            (DeclarationKind::Method, "ExampleTest.initialize".to_string()),
            (DeclarationKind::Method, "ExampleTest.something".to_string()),
            (DeclarationKind::Type(TypeKind::Class), "ExampleTest.Helper".to_string()),
            (DeclarationKind::Method, "ExampleTest.Helper.cleanup".to_string()),
        ]
    );

    let cleanup = unit
        .declarations()
        .into_iter()
        .find(|d| d.name == "cleanup")
        .expect("cleanup");
    assert!(cleanup.annotations[0].is_qualified());
    assert_eq!(cleanup.annotations[0].simple_name(), "After");
    assert_eq!(unit.declared_type_names(), vec!["ExampleTest", "Helper"]);
}

#[test]
fn parses_enums_records_interfaces_and_annotation_types() {
    let text = r#"
enum Color {
    @Deprecated RED("r"), GREEN("g") { }, BLUE;
    private final String code;
    Color() { this("?"); }
    Color(String code) { this.code = code; }
}

record Point(int x, int y) {
    Point {
        if (x < 0) throw new IllegalArgumentException();
    }
    static <T extends Comparable<T>> T max(T a, T b) { return a; }
}

interface Named {
    String name();
    default String greeting() { return "hi " + name(); }
}

@interface Marker {
    String value() default "x";
    int[] sizes() default {1, 2};
}

sealed interface Shape permits Square {}
non-sealed class Square implements Shape {}
"#;
    let unit = parse_java(text).expect("should parse");
    let kinds: Vec<(TypeKind, &str)> = unit.types.iter().map(|t| (t.kind, t.name.as_str())).collect();
    assert_eq!(
        kinds,
        vec![
            (TypeKind::Enum, "Color"),
            (TypeKind::Record, "Point"),
            (TypeKind::Interface, "Named"),
            (TypeKind::Annotation, "Marker"),
            (TypeKind::Interface, "Shape"),
            (TypeKind::Class, "Square"),
        ]
    );

    let color = &unit.types[0];
    assert_eq!(color.methods().filter(|m| m.is_constructor).count(), 2);

    let point = &unit.types[1];
    let compact = point.method("Point").expect("compact constructor");
    assert!(compact.is_constructor);
    assert_eq!(compact.signature, "Point");
    assert_eq!(
        point.method("max").map(|m| m.signature.as_str()),
        Some("<T extends Comparable<T>> T max(T a, T b)")
    );

    let named = &unit.types[2];
    assert!(!named.method("name").expect("name").has_body);
    assert!(named
        .method("greeting")
        .expect("greeting")
        .has_modifier(ModifierKeyword::Default));

    let marker = &unit.types[3];
    assert_eq!(marker.methods().count(), 2);
    assert!(marker.methods().all(|m| !m.has_body));

    assert_eq!(unit.types[4].modifiers[0].keyword, ModifierKeyword::Sealed);
    assert_eq!(unit.types[5].modifiers[0].keyword, ModifierKeyword::NonSealed);
}

#[test]
fn contextual_keywords_can_name_fields() {
    let unit = parse_java("class A { boolean sealed; Record record; }").expect("should parse");
    let names: Vec<String> = unit.declarations().into_iter().map(|d| d.location).collect();
    assert_eq!(names, vec!["A", "A.sealed", "A.record"]);
}

#[test]
fn unbalanced_class_body_is_an_error() {
    let text = "class A {\n    void m() {\n}\n";
    let err = parse_java(text).expect_err("missing brace");
    assert_eq!(err.message, "unexpected end of input");
    assert_eq!(err.line_col(text).line, 3);
}

#[test]
fn unterminated_literal_reports_its_position() {
    let text = "class A {\n    String s = \"oops;\n}\n";
    let err = parse_java(text).expect_err("unterminated literal");
    assert_eq!(err.message, "unterminated string literal");
    let pos = err.line_col(text);
    assert_eq!((pos.line, pos.col), (1, 15));
}

#[test]
fn module_declarations_are_rejected() {
    let err = parse_java("module com.example { requires java.base; }").expect_err("module");
    assert_eq!(err.message, "module declarations are not supported");
}

#[test]
fn unit_serializes_without_source_text() {
    let unit = parse_java("import org.junit.Test;\nclass A { @Test void t() {} }\n").expect("should parse");
    let json = serde_json::to_value(&unit).expect("serialize");
    assert_eq!(json["imports"][0]["path"], "org.junit.Test");
    assert_eq!(json["types"][0]["members"][0]["kind"], "method");
    assert_eq!(json["types"][0]["members"][0]["annotations"][0]["name"], "Test");
    assert!(json.get("source").is_none());
}

#[test]
fn annotations_outside_declaration_headers_are_recorded() {
    let text = r#"import org.junit.Ignore;

enum Mode {
    @Ignore FAST,
    SLOW
}

class A {
    Object o = new Object() {
        @org.junit.Before public void x() {}
    };

    @Deprecated
    void run(@Nullable String s) {
        Runnable r = new Runnable() { @Override public void run() {} };
    }

    @interface Marker {}
}
"#;
    let unit = parse_java(text).expect("should parse");

    let names: Vec<&str> = unit
        .unmodelled_annotations()
        .iter()
        .map(|a| a.name.as_str())
        .collect();
    assert_eq!(names, vec!["Ignore", "org.junit.Before", "Nullable", "Override"]);

    let first = &unit.unmodelled_annotations()[0];
    assert_eq!((first.position.line, first.position.col), (3, 4));
    assert_eq!(&text[first.range], "@Ignore");
}

#[test]
fn header_annotations_are_not_unmodelled() {
    let unit = parse_java("@RunWith(Suite.class) class A { @Test(expected = X.class) void t() {} }")
        .expect("should parse");
    assert!(unit.unmodelled_annotations().is_empty());
}
