use std::{fs, path::Path, process::Command};

use gdbc_common::{BreakpointLocation, CollectionPlan, IndexStyle, Shape, VariableDeclaration};
use gdbc_engine::{collect_with_gdb, ExportConfig, Exporter, GdbConfig};
use tempfile::TempDir;
use tracing::info;

// The breakpoint sits on the `printf` line.
const COUNTER_C: &str = r#"#include <stdio.h>
int main(void) {
    int res[3] = {0, 0, 0};
    for (int i = 0; i < 3; i++) {
        res[1] = i * 10;
        res[2] = i * 10 + 1;
        printf("%d\n", i);
    }
    return 0;
}
"#;

fn compile(dir: &Path) -> std::path::PathBuf {
    let source = dir.join("counter.c");
    let binary = dir.join("counter");
    fs::write(&source, COUNTER_C).unwrap();

    let status =
        Command::new("cc").args(["-g", "-O0", "-o"]).arg(&binary).arg(&source).status().unwrap();
    assert!(status.success(), "failed to compile {}", source.display());
    binary
}

#[test]
#[ignore = "requires gdb and a C compiler"]
fn test_collect_with_gdb() {
    gdbc_common::logging::ensure_test_logging(None);
    info!("Running test");
    let dir = TempDir::new().unwrap();
    let binary = compile(dir.path());

    let plan = CollectionPlan::new(BreakpointLocation::FileLine {
        file: "counter.c".into(),
        line: 7,
    })
    .with_variable(VariableDeclaration::new("i", "int", Shape::Scalar))
    .with_variable(VariableDeclaration::new("res", "int", Shape::Vector(2)));
    let config = GdbConfig::new(&binary).with_index_style(IndexStyle::C);
    let exporter = Exporter::new(ExportConfig::default().with_output_dir(dir.path()));

    let report = collect_with_gdb(&config, &plan, &exporter).unwrap();
    assert_eq!(report.rounds, 3);
    assert_eq!(
        fs::read_to_string(dir.path().join("i_gdbc.csv")).unwrap(),
        "# breakpoint hit,i\r\n0,0\r\n1,1\r\n2,2\r\n"
    );
    // C subscripts are rendered verbatim, so elements 1 and 2 of `res` are read.
    assert_eq!(
        fs::read_to_string(dir.path().join("res_gdbc.csv")).unwrap(),
        "# breakpoint hit,res[0],res[1]\r\n0,0,1\r\n1,10,11\r\n2,20,21\r\n"
    );
}

#[test]
#[ignore = "requires gdb and a C compiler"]
fn test_unknown_symbol_is_an_evaluation_error() {
    gdbc_common::logging::ensure_test_logging(None);
    info!("Running test");
    let dir = TempDir::new().unwrap();
    let binary = compile(dir.path());

    let plan = CollectionPlan::new(BreakpointLocation::Function("main".to_string()))
        .with_variable(VariableDeclaration::new("does_not_exist", "int", Shape::Scalar));
    let config = GdbConfig::new(&binary).with_index_style(IndexStyle::C);
    let exporter = Exporter::new(ExportConfig::default().with_output_dir(dir.path()));

    let err = collect_with_gdb(&config, &plan, &exporter).unwrap_err();
    assert!(matches!(
        err,
        gdbc_engine::CollectError::Debugger(gdbc_engine::DebuggerError::Evaluation { .. })
    ));
}
