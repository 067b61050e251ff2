//! Debug script to see what the parser produces for a file.
//!
//! Usage: `debug_parse [file.ts]`; without an argument a built-in sample is parsed.

use std::path::{Path, PathBuf};

use ormhelper_compiler::frontend::typescript::parser::TypeScriptParser;
use ormhelper_compiler::frontend::typescript::to_ir::to_ir;
use ormhelper_compiler::ir::Declaration;

const SAMPLE: &str = r#"
import { DatabaseTable, DatabaseField, Helper, OnUpgrade, SQLiteDatabase, ConnectionSource } from "@ormhelper/runtime";

@DatabaseTable()
export class Question {
  @DatabaseField({ generatedId: true })
  id: number;
}

@Helper({ name: "customer", version: 2, tables: [Question] })
export class Customer {
  @OnUpgrade({ fromVersion: 1, toVersion: 2 })
  addAnswers(database: SQLiteDatabase, connectionSource: ConnectionSource): void {}
}
"#;

fn main() {
    let (path, source) = match std::env::args().nth(1) {
        Some(arg) => {
            let path = PathBuf::from(arg);
            match std::fs::read_to_string(&path) {
                Ok(source) => (path, source),
                Err(e) => {
                    eprintln!("Error: {}: {}", path.display(), e);
                    std::process::exit(1);
                }
            }
        }
        None => (PathBuf::from("/sample/sample.ts"), SAMPLE.to_string()),
    };

    let mut parser = match TypeScriptParser::new() {
        Ok(parser) => parser,
        Err(e) => {
            eprintln!("Error: {:?}", e);
            std::process::exit(1);
        }
    };

    let parsed = match parser.parse(&source, &path) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("Error: {:?}", e);
            std::process::exit(1);
        }
    };

    println!("Parsed file: {:?}", parsed.path);
    println!("\nImports:");
    for import in &parsed.imports {
        println!("  {:?}", import);
    }
    println!("\nClasses:");
    for class in &parsed.classes {
        println!("  {} (exported: {}, extends: {:?})", class.name, class.exported, class.superclass);
        for decorator in &class.decorators {
            println!("    @{} {:?}", decorator.name, decorator.arguments);
        }
    }

    let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    match to_ir(&[parsed], dir) {
        Ok(program) => {
            println!("\nDeclarations:");
            for declaration in &program.declarations {
                match declaration {
                    Declaration::Table(id) => println!("  table {}", program.class(*id).name),
                    Declaration::Helper(helper) => {
                        println!("  helper {}", program.class(helper.class).name)
                    }
                    Declaration::UpgradeRoutine(routine) => println!("  upgrade {}", routine.method),
                }
            }
        }
        Err(e) => eprintln!("Error: {:?}", e),
    }
}
