//! End-to-end passes over scratch source trees.

use std::fs;
use std::path::Path;

use ormhelper_compiler::schema::MigrationStrategy;
use ormhelper_compiler::{Compiler, CompilerConfig, CompilerError};
use tempfile::TempDir;

const RUNTIME_IMPORT: &str = r#"import { DatabaseTable, DatabaseField, Helper, OnUpgrade, SQLiteDatabase, ConnectionSource } from "@ormhelper/runtime";
"#;

fn write_source(root: &Path, name: &str, body: &str) {
    let path = root.join("src").join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, format!("{}{}", RUNTIME_IMPORT, body)).unwrap();
}

fn compiler(root: &Path) -> Compiler {
    Compiler::new(CompilerConfig {
        source_dir: root.join("src"),
        out_dir: root.join("generated"),
        ..Default::default()
    })
}

fn read_output(root: &Path, file: &str) -> String {
    fs::read_to_string(root.join("generated").join(file)).unwrap()
}

#[test]
fn test_drop_and_recreate_helper() {
    let dir = TempDir::new().unwrap();
    write_source(
        dir.path(),
        "question.ts",
        r#"
@DatabaseTable()
export class Question {
  @DatabaseField({ generatedId: true })
  id: number;
}
"#,
    );
    write_source(
        dir.path(),
        "customer.ts",
        r#"
import { Question } from "./question";

@Helper({ name: "customer", version: 3, tables: [Question], dropOnUpgrade: true })
export class Customer {
  @OnUpgrade({ toVersion: 3 })
  ignored(database: SQLiteDatabase, connectionSource: ConnectionSource): void {}
}
"#,
    );

    let result = compiler(dir.path()).generate().unwrap();
    assert_eq!(result.helpers, 1);
    assert_eq!(result.tables, 1);
    assert_eq!(result.written.len(), 1);
    assert_eq!(result.write_failures, 0);

    let content = read_output(dir.path(), "CustomerDatabaseHelper.ts");
    assert!(content.contains("import { Question } from \"../src/question\";\n"));
    assert!(content.contains(concat!(
        "oldVersion: number, newVersion: number): void {\n",
        "    this.dropTables(database, connectionSource);\n",
        "    this.onCreate(database, connectionSource);\n",
        "  }\n",
    )));
    assert!(!content.contains("ignored"));
}

#[test]
fn test_inherited_identifier_is_wrapped() {
    let dir = TempDir::new().unwrap();
    write_source(
        dir.path(),
        "base.ts",
        r#"
export abstract class Entity {
  @DatabaseField({ generatedId: true })
  id: number;
}
"#,
    );
    write_source(
        dir.path(),
        "models/question.ts",
        r#"
import { Entity } from "../base";

@DatabaseTable()
export class Question extends Entity {
  @DatabaseField()
  text: string;
}

@Helper({ name: "quiz", tables: [Question] })
export class Quiz {}
"#,
    );

    compiler(dir.path()).generate().unwrap();

    let content = read_output(dir.path(), "QuizDatabaseHelper.ts");
    assert!(content.contains("import { Question } from \"../src/models/question\";\n"));
    assert!(content.contains("  private mQuestionDao: Dao<Question, Number> | null = null;\n"));
    assert!(content.contains("  getQuestionDao(): Dao<Question, Number> {\n"));
}

#[test]
fn test_rerun_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    write_source(
        dir.path(),
        "db.ts",
        r#"
@DatabaseTable()
export class Question {
  @DatabaseField({ id: true })
  key: string;
}

@Helper({ name: "my_database", version: 4, tables: [Question], withConfigUtil: true })
export class MyDatabase {
  @OnUpgrade({ fromVersion: 1, toVersion: 3 })
  oneToThree(database: SQLiteDatabase, connectionSource: ConnectionSource): void {}

  @OnUpgrade({ toVersion: 4 })
  toFour(database: SQLiteDatabase, connectionSource: ConnectionSource): void {}
}
"#,
    );

    let compiler = compiler(dir.path());
    compiler.generate().unwrap();
    let helper = read_output(dir.path(), "MydatabaseDatabaseHelper.ts");
    let util = read_output(dir.path(), "MydatabaseDatabaseConfigUtil.ts");

    compiler.generate().unwrap();
    assert_eq!(read_output(dir.path(), "MydatabaseDatabaseHelper.ts"), helper);
    assert_eq!(read_output(dir.path(), "MydatabaseDatabaseConfigUtil.ts"), util);
    assert!(helper.contains("Dao<Question, string>"));
}

#[test]
fn test_failing_helper_does_not_block_others() {
    let dir = TempDir::new().unwrap();
    write_source(
        dir.path(),
        "db.ts",
        r#"
@DatabaseTable()
export class Question {
  @DatabaseField({ generatedId: true })
  id: number;
}

@DatabaseTable()
export class Draft {
  @DatabaseField()
  text: string;
}

@Helper({ name: "good", tables: [Question] })
export class Good {}

@Helper({ name: "bad", tables: [Draft] })
export class Bad {}
"#,
    );

    let err = compiler(dir.path()).generate().unwrap_err();
    match err {
        CompilerError::GenerationFailed { count, .. } => assert_eq!(count, 1),
        other => panic!("unexpected error: {other}"),
    }

    assert!(dir.path().join("generated/GoodDatabaseHelper.ts").exists());
    assert!(!dir.path().join("generated/BadDatabaseHelper.ts").exists());
}

#[test]
fn test_check_writes_nothing() {
    let dir = TempDir::new().unwrap();
    write_source(
        dir.path(),
        "db.ts",
        r#"
@DatabaseTable()
export class Question {
  @DatabaseField({ generatedId: true })
  id: number;
}

@Helper({ name: "db", tables: [Question] })
export class Db {}
"#,
    );

    let result = compiler(dir.path()).check().unwrap();
    assert_eq!(result.helpers, 1);
    assert!(result.written.is_empty());
    assert!(!dir.path().join("generated").exists());
}

#[test]
fn test_plan_with_simulation() {
    let dir = TempDir::new().unwrap();
    write_source(
        dir.path(),
        "db.ts",
        r#"
@DatabaseTable()
export class Question {
  @DatabaseField({ generatedId: true })
  id: number;
}

@Helper({ name: "my_database", version: 6, tables: [Question] })
export class MyDatabase {
  @OnUpgrade({ toVersion: 4 }) toFour(database: SQLiteDatabase, connectionSource: ConnectionSource) {}
  @OnUpgrade({ toVersion: 5 }) toFive(database: SQLiteDatabase, connectionSource: ConnectionSource) {}
  @OnUpgrade({ toVersion: 6 }) toSix(database: SQLiteDatabase, connectionSource: ConnectionSource) {}
  @OnUpgrade({ fromVersion: 1, toVersion: 3 }) oneToThree(database: SQLiteDatabase, connectionSource: ConnectionSource) {}
  @OnUpgrade({ fromVersion: 2, toVersion: 3 }) twoToThree(database: SQLiteDatabase, connectionSource: ConnectionSource) {}
}
"#,
    );

    let plans = compiler(dir.path()).plan(Some("MyDatabase"), Some(2)).unwrap();
    assert_eq!(plans.len(), 1);

    let plan = &plans[0];
    let MigrationStrategy::Upgrade(upgrade) = &plan.migration else {
        panic!("expected an upgrade plan");
    };
    let order: Vec<&str> = upgrade.steps.iter().map(|s| s.routine.as_str()).collect();
    assert_eq!(order, vec!["oneToThree", "twoToThree", "toFour", "toFive", "toSix"]);

    let simulation = plan.simulation.as_ref().unwrap();
    let fired: Vec<&str> = simulation.fired.iter().map(|s| s.routine.as_str()).collect();
    assert_eq!(fired, vec!["twoToThree", "toFour", "toFive", "toSix"]);
    assert_eq!(simulation.final_version, 6);
    assert!(simulation.reaches_target);

    let json = serde_json::to_value(plan).unwrap();
    assert_eq!(json["helper"], "my_database");
    assert_eq!(json["migration"]["strategy"], "upgrade");
}

#[test]
fn test_plan_unknown_helper() {
    let dir = TempDir::new().unwrap();
    write_source(dir.path(), "db.ts", "export class Nothing {}\n");

    let err = compiler(dir.path()).plan(Some("missing"), None).unwrap_err();
    assert!(matches!(err, CompilerError::UnknownHelper { .. }));
}

const QUESTION_TABLE: &str = r#"
@DatabaseTable()
export class Question {
  @DatabaseField({ generatedId: true })
  id: number;
}
"#;

#[test]
fn test_unwritable_out_dir_counts_every_file() {
    let dir = TempDir::new().unwrap();
    write_source(
        dir.path(),
        "db.ts",
        &format!(
            "{}{}",
            QUESTION_TABLE,
            r#"
@Helper({ name: "customer", tables: [Question], withConfigUtil: true })
export class Customer {}
"#
        ),
    );
    fs::write(dir.path().join("generated"), "not a directory").unwrap();

    let result = compiler(dir.path()).generate().unwrap();
    assert_eq!(result.helpers, 1);
    assert_eq!(result.write_failures, 2);
    assert!(result.written.is_empty());
    assert!(dir.path().join("generated").is_file());
}

#[test]
fn test_blocked_file_does_not_stop_other_writes() {
    let dir = TempDir::new().unwrap();
    write_source(
        dir.path(),
        "db.ts",
        &format!(
            "{}{}",
            QUESTION_TABLE,
            r#"
@Helper({ name: "customer", tables: [Question] })
export class Customer {}

@Helper({ name: "other", tables: [Question] })
export class Other {}
"#
        ),
    );
    fs::create_dir_all(dir.path().join("generated/CustomerDatabaseHelper.ts")).unwrap();

    let result = compiler(dir.path()).generate().unwrap();
    assert_eq!(result.helpers, 2);
    assert_eq!(result.write_failures, 1);

    let names: Vec<String> = result
        .written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["OtherDatabaseHelper.ts"]);
    assert!(read_output(dir.path(), "OtherDatabaseHelper.ts").contains("class OtherDatabaseHelper"));
    assert!(dir.path().join("generated/CustomerDatabaseHelper.ts").is_dir());
}
