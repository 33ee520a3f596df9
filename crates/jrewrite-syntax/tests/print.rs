use jrewrite_syntax::{
    parse_java, print_java, render_outline, Annotation, CompilationUnit, ImportDecl, MemberDecl,
    MethodDecl, ModifierKeyword, PackageDecl, PrintError, TypeDecl, TypeKind,
};
use pretty_assertions::assert_eq;

fn method_mut<'a>(unit: &'a mut CompilationUnit, name: &str) -> &'a mut MethodDecl {
    unit.types[0]
        .members
        .iter_mut()
        .find_map(|m| match m {
            MemberDecl::Method(method) if method.name == name => Some(method),
            _ => None,
        })
        .expect("method exists")
}

#[test]
fn untouched_unit_prints_byte_for_byte() {
    let text = "// License header\r\npackage p;\r\n\r\nimport a.B;\r\n\r\npublic  class A {\r\n    @B   /* odd */ public void m( ) { }\r\n}\r\n";
    let unit = parse_java(text).expect("should parse");
    assert_eq!(print_java(&unit).expect("print"), text);
}

#[test]
fn renamed_annotation_and_dropped_modifier_are_spliced() {
    let text = "class A {\n    @Before public void initialize() {}\n}\n";
    let mut unit = parse_java(text).expect("should parse");

    let method = method_mut(&mut unit, "initialize");
    method.annotations[0].name = "BeforeEach".to_string();
    method.modifiers.retain(|m| m.keyword != ModifierKeyword::Public);

    assert_eq!(
        print_java(&unit).expect("print"),
        "class A {\n    @BeforeEach void initialize() {}\n}\n"
    );
}

#[test]
fn removed_annotation_on_its_own_line_takes_the_line() {
    let text = "class A {\n    @Test\n    @RepeatedTest(3)\n    void m() {}\n}\n";
    let mut unit = parse_java(text).expect("should parse");
    method_mut(&mut unit, "m").annotations.remove(0);

    assert_eq!(
        print_java(&unit).expect("print"),
        "class A {\n    @RepeatedTest(3)\n    void m() {}\n}\n"
    );
}

#[test]
fn added_annotation_and_modifier_go_before_the_signature() {
    let text = "class A {\n    @Test\n    void m() {}\n}\n";
    let mut unit = parse_java(text).expect("should parse");
    let method = method_mut(&mut unit, "m");
    method.annotations.push(Annotation::with_arguments("Disabled", "\"later\""));
    method.modifiers.push(jrewrite_syntax::Modifier::new(ModifierKeyword::Public));

    assert_eq!(
        print_java(&unit).expect("print"),
        "class A {\n    @Test\n    @Disabled(\"later\") public void m() {}\n}\n"
    );
}

#[test]
fn changed_arguments_are_rewritten() {
    let text = "class A { @Ignore(\"x\") void m() {} @Test void n() {} }";
    let mut unit = parse_java(text).expect("should parse");
    method_mut(&mut unit, "m").annotations[0].arguments = None;
    method_mut(&mut unit, "n").annotations[0].arguments = Some("timeout = 5".to_string());

    assert_eq!(
        print_java(&unit).expect("print"),
        "class A { @Ignore void m() {} @Test(timeout = 5) void n() {} }"
    );
}

#[test]
fn replacement_import_takes_the_slot_of_the_removed_one() {
    let text = "import org.junit.BeforeClass;\nclass C { @BeforeClass void init(){} }";
    let mut unit = parse_java(text).expect("should parse");
    unit.imports.clear();
    unit.imports.push(ImportDecl::single("org.junit.jupiter.api.BeforeAll"));
    method_mut(&mut unit, "init").annotations[0].name = "BeforeAll".to_string();

    assert_eq!(
        print_java(&unit).expect("print"),
        "import org.junit.jupiter.api.BeforeAll;\nclass C { @BeforeAll void init(){} }"
    );
}

#[test]
fn replacement_import_keeps_blank_lines_between_groups() {
    let text = "package p;\n\nimport static org.junit.Assert.assertTrue;\n\nimport org.junit.Before;\n\npublic class T {}\n";
    let mut unit = parse_java(text).expect("should parse");
    unit.imports[1] = ImportDecl::single("org.junit.jupiter.api.BeforeEach");

    assert_eq!(
        print_java(&unit).expect("print"),
        "package p;\n\nimport static org.junit.Assert.assertTrue;\n\nimport org.junit.jupiter.api.BeforeEach;\n\npublic class T {}\n"
    );

    let text = "package p;\n\nimport org.junit.Before;\n\nimport java.util.List;\n\nclass T {}\n";
    let mut unit = parse_java(text).expect("should parse");
    unit.imports[0] = ImportDecl::single("org.junit.jupiter.api.BeforeEach");

    assert_eq!(
        print_java(&unit).expect("print"),
        "package p;\n\nimport org.junit.jupiter.api.BeforeEach;\n\nimport java.util.List;\n\nclass T {}\n"
    );
}

#[test]
fn inserted_imports_use_the_file_line_endings() {
    let text = "import a.A;\r\nimport b.B;\r\nclass X {}\r\n";
    let mut unit = parse_java(text).expect("should parse");
    unit.imports.push(ImportDecl::single("c.C"));
    assert_eq!(
        print_java(&unit).expect("print"),
        "import a.A;\r\nimport b.B;\r\nimport c.C;\r\nclass X {}\r\n"
    );

    let text = "package p;\r\n\r\nclass X {}\r\n";
    let mut unit = parse_java(text).expect("should parse");
    unit.imports.push(ImportDecl::single("t.T"));
    unit.imports.push(ImportDecl::single("u.U"));
    assert_eq!(
        print_java(&unit).expect("print"),
        "package p;\r\n\r\nimport t.T;\r\nimport u.U;\r\n\r\nclass X {}\r\n"
    );
}

#[test]
fn new_imports_follow_their_retained_neighbours() {
    let text = "package p;\n\nimport a.A;\nimport b.B;\nimport c.C;\n\nclass X {}\n";
    let mut unit = parse_java(text).expect("should parse");
    unit.imports.remove(1);
    unit.imports.insert(1, ImportDecl::single("b.Bee"));
    unit.imports.insert(0, ImportDecl::single("z.First"));

    assert_eq!(
        print_java(&unit).expect("print"),
        "package p;\n\nimport z.First;\nimport a.A;\nimport b.Bee;\nimport c.C;\n\nclass X {}\n"
    );
}

#[test]
fn first_import_goes_after_the_package() {
    let text = "package p;\n\nclass X {}\n";
    let mut unit = parse_java(text).expect("should parse");
    unit.imports.push(ImportDecl::single("org.junit.jupiter.api.Test"));

    assert_eq!(
        print_java(&unit).expect("print"),
        "package p;\n\nimport org.junit.jupiter.api.Test;\n\nclass X {}\n"
    );
}

#[test]
fn declarations_added_after_parsing_cannot_be_spliced() {
    let mut unit = parse_java("class A {}").expect("should parse");
    unit.types[0].members.push(MemberDecl::Method(MethodDecl::new("added")));

    let err = print_java(&unit).expect_err("no source position");
    assert!(matches!(err, PrintError::Unplaceable { ref location, .. } if location == "A.added"));
}

#[test]
fn built_units_render_as_outline() {
    let mut ty = TypeDecl::new(TypeKind::Class, "ExampleTest");
    ty.members.push(MemberDecl::Method(
        MethodDecl::new("initialize").with_annotation(Annotation::marker("BeforeEach")),
    ));
    ty.members.push(MemberDecl::Method(
        MethodDecl::new("something")
            .with_annotation(Annotation::with_arguments("Disabled", "\"not ready yet\""))
            .with_annotation(Annotation::marker("Test"))
            .with_modifier(ModifierKeyword::Public),
    ));
    let unit = CompilationUnit::new(
        Some(PackageDecl {
            name: "com.example".to_string(),
            range: None,
        }),
        vec![
            ImportDecl::single("org.junit.jupiter.api.BeforeEach"),
            ImportDecl::single("org.junit.jupiter.api.Disabled"),
        ],
        vec![ty],
    );

    insta::assert_snapshot!(print_java(&unit).expect("print"), @r###"
    package com.example;

    import org.junit.jupiter.api.BeforeEach;
    import org.junit.jupiter.api.Disabled;

    class ExampleTest {
        @BeforeEach void initialize() {}
        @Disabled("not ready yet") @Test public void something() {}
    }
    "###);
    assert_eq!(render_outline(&unit), print_java(&unit).expect("print"));
}
