use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

const LEGACY_TEST: &str = r#"package com.example;

import org.junit.Before;
import org.junit.Ignore;
import org.junit.Test;

public class ExampleTest {
    @Before
    public void setUp() {
    }

    @Ignore("not ready yet") @Test
    public void pending() {
    }
}
"#;

const MIGRATED_TEST: &str = r#"package com.example;

import org.junit.jupiter.api.BeforeEach;
import org.junit.jupiter.api.Disabled;
import org.junit.Test;

public class ExampleTest {
    @BeforeEach
    void setUp() {
    }

    @Disabled("not ready yet") @Test
    public void pending() {
    }
}
"#;

fn jrewrite(dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("jrewrite"));
    cmd.current_dir(dir.path())
        .env_remove("JREWRITE_CONFIG_PATH")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_mentions_commands() {
    let temp = TempDir::new().unwrap();
    jrewrite(&temp).arg("--help").assert().success().stdout(
        predicate::str::contains("rewrite")
            .and(predicate::str::contains("rules"))
            .and(predicate::str::contains("parse")),
    );
}

#[test]
fn rewrite_updates_files_in_place() {
    let temp = TempDir::new().unwrap();
    let file = temp.child("src/test/java/com/example/ExampleTest.java");
    file.write_str(LEGACY_TEST).unwrap();
    temp.child("src/test/java/com/example/notes.txt")
        .write_str("@Before")
        .unwrap();

    jrewrite(&temp)
        .arg("rewrite")
        .arg("src")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("rewrote src/test/java/com/example/ExampleTest.java")
                .and(predicate::str::contains("junit5.update-annotations: 1 changed, 0 failed, 1 total")),
        );

    file.assert(MIGRATED_TEST);
    temp.child("src/test/java/com/example/notes.txt")
        .assert("@Before");

    // A second run has nothing left to do.
    jrewrite(&temp)
        .arg("rewrite")
        .arg("--check")
        .arg("src")
        .assert()
        .success();
}

#[test]
fn check_reports_pending_changes_without_writing() {
    let temp = TempDir::new().unwrap();
    let file = temp.child("ExampleTest.java");
    file.write_str(LEGACY_TEST).unwrap();

    jrewrite(&temp)
        .args(["rewrite", "--check", "--diff", "ExampleTest.java"])
        .assert()
        .code(1)
        .stdout(
            predicate::str::contains("would rewrite ExampleTest.java")
                .and(predicate::str::contains("-    @Before\n"))
                .and(predicate::str::contains("+    @BeforeEach\n"))
                .and(predicate::str::contains("+++ b/ExampleTest.java")),
        );

    file.assert(LEGACY_TEST);
}

#[test]
fn json_output_lists_changes_per_file() {
    let temp = TempDir::new().unwrap();
    temp.child("ExampleTest.java").write_str(LEGACY_TEST).unwrap();
    temp.child("Broken.java").write_str("class Broken {").unwrap();

    let output = jrewrite(&temp)
        .args(["rewrite", "--json", "."])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let v: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(v["recipe"], "junit5.update-annotations");
    assert_eq!(v["changed"], 1);
    assert_eq!(v["failed"], 1);

    let files = v["files"].as_array().unwrap();
    let broken = files
        .iter()
        .find(|f| f["path"].as_str().unwrap().ends_with("Broken.java"))
        .unwrap();
    assert_eq!(broken["status"], "failed");
    assert!(broken["error"]
        .as_str()
        .unwrap()
        .contains("unexpected end of input"));

    let example = files
        .iter()
        .find(|f| f["path"].as_str().unwrap().ends_with("ExampleTest.java"))
        .unwrap();
    assert_eq!(example["status"], "changed");
    let kinds: Vec<&str> = example["changes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["kind"].as_str().unwrap())
        .collect();
    assert_eq!(
        kinds,
        vec![
            "annotation_renamed",
            "modifier_removed",
            "annotation_renamed",
            "import_removed",
            "import_removed",
            "import_added",
            "import_added",
        ]
    );
}

#[test]
fn rules_prints_the_effective_table() {
    let temp = TempDir::new().unwrap();
    let output = jrewrite(&temp).arg("rules").output().unwrap();
    assert!(output.status.success());

    insta::assert_snapshot!(String::from_utf8_lossy(&output.stdout), @r###"
    @org.junit.Before -> @org.junit.jupiter.api.BeforeEach (force_package_private)
    @org.junit.After -> @org.junit.jupiter.api.AfterEach (force_package_private)
    @org.junit.BeforeClass -> @org.junit.jupiter.api.BeforeAll (force_package_private)
    @org.junit.AfterClass -> @org.junit.jupiter.api.AfterAll (force_package_private)
    @org.junit.Ignore -> @org.junit.jupiter.api.Disabled (none)
    "###);
}

#[test]
fn config_file_adds_rules_and_selects_the_recipe() {
    let temp = TempDir::new().unwrap();
    temp.child("jrewrite.toml")
        .write_str(
            r#"
[recipe]
name = "junit5.migration"
disabled_rules = ["org.junit.Ignore"]

[[recipe.extra_rules]]
source = "com.acme.Slow"
target = "org.junit.jupiter.api.Tag"
"#,
        )
        .unwrap();
    temp.child("A.java")
        .write_str("import com.acme.Slow;\nimport org.junit.Ignore;\nclass A { @Slow(\"db\") @Ignore void a() {} }\n")
        .unwrap();

    let output = jrewrite(&temp).args(["rules", "--json"]).output().unwrap();
    let rules: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let sources: Vec<&str> = rules
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["source"].as_str().unwrap())
        .collect();
    assert_eq!(
        sources,
        vec![
            "org.junit.Before",
            "org.junit.After",
            "org.junit.BeforeClass",
            "org.junit.AfterClass",
            "com.acme.Slow",
        ]
    );

    jrewrite(&temp)
        .args(["rewrite", "A.java"])
        .assert()
        .success()
        .stdout(predicate::str::contains("junit5.migration"));
    temp.child("A.java").assert(
        "import org.junit.jupiter.api.Tag;\nimport org.junit.Ignore;\nclass A { @Tag(\"db\") @Ignore void a() {} }\n",
    );
}

#[test]
fn explicit_config_flag_is_used() {
    let temp = TempDir::new().unwrap();
    temp.child("conf/custom.toml")
        .write_str("[recipe]\nname = \"junit5.remove-duplicate-test-templates\"\n")
        .unwrap();
    temp.child("A.java")
        .write_str("import org.junit.Before;\nclass A { @Before void a() {} }\n")
        .unwrap();

    jrewrite(&temp)
        .args(["--config", "conf/custom.toml", "rewrite", "--check", "A.java"])
        .assert()
        .success()
        .stdout(predicate::str::contains("junit5.remove-duplicate-test-templates: 0 would change"));
}

#[test]
fn unknown_recipe_is_fatal() {
    let temp = TempDir::new().unwrap();
    temp.child("A.java").write_str("class A {}").unwrap();

    jrewrite(&temp)
        .args(["rewrite", "--recipe", "junit6.everything", "A.java"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown recipe `junit6.everything`"));
}

#[test]
fn missing_path_is_fatal() {
    let temp = TempDir::new().unwrap();
    jrewrite(&temp)
        .args(["rewrite", "does-not-exist"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no such file or directory"));
}

#[test]
fn parse_reports_structure_and_errors() {
    let temp = TempDir::new().unwrap();
    temp.child("A.java")
        .write_str("import org.junit.Test;\nclass A {\n    @Test public void t() { }\n}\n")
        .unwrap();
    temp.child("Bad.java").write_str("class Bad {\n    String s = \"x;\n}\n").unwrap();

    jrewrite(&temp)
        .args(["parse", "A.java"])
        .assert()
        .success()
        .stdout("import org.junit.Test;\n\nclass A {\n    @Test public void t() {}\n}\n");

    let output = jrewrite(&temp).args(["parse", "--json", "A.java"]).output().unwrap();
    let v: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(v["types"][0]["name"], "A");

    jrewrite(&temp)
        .args(["parse", "Bad.java"])
        .assert()
        .code(1)
        .stdout("Bad.java:2:16: error: unterminated string literal\n");
}
