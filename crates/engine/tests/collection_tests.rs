use std::fs;

use gdbc_common::{CollectionPlan, Shape, VariableDeclaration};
use gdbc_engine::{
    run_collection, CollectError, Collector, CollectorState, ExportConfig, Exporter,
    ReplayDebugger, ReplayScript, TypedVariable, VariableRegistry,
};
use tempfile::TempDir;
use tracing::info;

const SCRIPT: &str = r#"{
    "stops": [
        { "i": "0", "x": "0.5", "res[1]": "10", "res[2]": "20" },
        { "i": "1", "x": "1.5", "res[1]": "11", "res[2]": "21" },
        { "i": "2", "x": "2.5", "res[1]": "12", "res[2]": "22" }
    ]
}"#;

const PLAN: &str = r#"{
    "breakpoint": "loop.f90:12",
    "variables": [
        { "name": "i", "type": "int" },
        { "name": "x", "kind": "float", "shape": "scalar" },
        { "name": "res", "kind": "int", "shape": { "vector": 2 } }
    ]
}"#;

fn exporter(dir: &TempDir) -> Exporter {
    Exporter::new(ExportConfig::default().with_output_dir(dir.path()))
}

#[test]
fn test_collect_and_export() {
    gdbc_common::logging::ensure_test_logging(None);
    info!("Running test");
    let dir = TempDir::new().unwrap();
    let plan: CollectionPlan = serde_json::from_str(PLAN).unwrap();
    let debugger = ReplayDebugger::new(ReplayScript::from_json(SCRIPT).unwrap());

    let report = run_collection(debugger, &plan, &exporter(&dir)).unwrap();
    assert_eq!(report.rounds, 3);
    assert_eq!(
        report.files,
        vec![
            dir.path().join("i_gdbc.csv"),
            dir.path().join("x_gdbc.csv"),
            dir.path().join("res_gdbc.csv"),
        ]
    );

    assert_eq!(
        fs::read_to_string(dir.path().join("i_gdbc.csv")).unwrap(),
        "# breakpoint hit,i\r\n0,0\r\n1,1\r\n2,2\r\n"
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("x_gdbc.csv")).unwrap(),
        "# breakpoint hit,x\r\n0,0.5\r\n1,1.5\r\n2,2.5\r\n"
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("res_gdbc.csv")).unwrap(),
        "# breakpoint hit,res[0],res[1]\r\n0,10,20\r\n1,11,21\r\n2,12,22\r\n"
    );
}

#[test]
fn test_export_is_idempotent() {
    gdbc_common::logging::ensure_test_logging(None);
    info!("Running test");
    let dir = TempDir::new().unwrap();
    let plan: CollectionPlan = serde_json::from_str(PLAN).unwrap();
    let debugger = ReplayDebugger::new(ReplayScript::from_json(SCRIPT).unwrap());
    let exporter = exporter(&dir);

    let report = run_collection(debugger, &plan, &exporter).unwrap();
    let first: Vec<Vec<u8>> = report.files.iter().map(|p| fs::read(p).unwrap()).collect();

    let again = exporter.export(&report.registry).unwrap();
    assert_eq!(again, report.files);
    let second: Vec<Vec<u8>> = again.iter().map(|p| fs::read(p).unwrap()).collect();
    assert_eq!(first, second);
}

#[test]
fn test_unsupported_shape_keeps_earlier_files() {
    gdbc_common::logging::ensure_test_logging(None);
    info!("Running test");
    let dir = TempDir::new().unwrap();
    let declarations = [
        VariableDeclaration::new("i", "int", Shape::Scalar),
        VariableDeclaration::with_dimensions("m", "float", &[3, 2]),
    ];

    let mut collector = Collector::new(
        ReplayDebugger::new(ReplayScript::from_json(SCRIPT).unwrap()),
        VariableRegistry::from_declarations(&declarations[..1]).unwrap(),
    )
    .with_breakpoint(12);
    collector.collect().unwrap();
    assert_eq!(collector.state(), CollectorState::Stopped);

    let mut registry = collector.into_registry();
    registry.insert(TypedVariable::from_declaration(&declarations[1]).unwrap()).unwrap();

    let err = exporter(&dir).export(&registry).unwrap_err();
    assert!(matches!(err, CollectError::UnsupportedShape { ref name, .. } if name == "m"));
    assert_eq!(
        fs::read_to_string(dir.path().join("i_gdbc.csv")).unwrap(),
        "# breakpoint hit,i\r\n0,0\r\n1,1\r\n2,2\r\n"
    );
    assert!(!dir.path().join("m_gdbc.csv").exists());
}

#[test]
fn test_immediate_exit_exports_headers_only() {
    gdbc_common::logging::ensure_test_logging(None);
    info!("Running test");
    let dir = TempDir::new().unwrap();
    let plan: CollectionPlan = serde_json::from_str(PLAN).unwrap();

    let report =
        run_collection(ReplayDebugger::new(ReplayScript::default()), &plan, &exporter(&dir))
            .unwrap();
    assert_eq!(report.rounds, 0);
    assert_eq!(
        fs::read_to_string(dir.path().join("res_gdbc.csv")).unwrap(),
        "# breakpoint hit,res[0],res[1]\r\n"
    );
}

#[test]
fn test_unsupported_type_fails_before_running() {
    gdbc_common::logging::ensure_test_logging(None);
    info!("Running test");
    let dir = TempDir::new().unwrap();
    let plan = CollectionPlan::new(12)
        .with_variable(VariableDeclaration::new("name", "character", Shape::Scalar));
    let debugger = ReplayDebugger::new(ReplayScript::from_json(SCRIPT).unwrap());

    let err = run_collection(debugger, &plan, &exporter(&dir)).unwrap_err();
    assert!(matches!(err, CollectError::UnsupportedType(_)));
}
