use gc_compliance::{KeyedResults, ResultValue};
use gc_config::Config;
use gc_core::Curve;
use gc_results::*;

fn temp_store(name: &str) -> ResultStore {
    let dir = std::env::temp_dir().join(format!("gc_results_{}_{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    ResultStore::new(dir).unwrap()
}

fn results() -> KeyedResults {
    let mut r = KeyedResults::new();
    r.insert(
        "before_me_BusPDR_BUS_Voltage_value".into(),
        ResultValue::Number(0.012),
    );
    r.insert(
        "before_me_BusPDR_BUS_Voltage_check".into(),
        ResultValue::Bool(true),
    );
    r.insert(
        "before_mxe_BusPDR_BUS_Voltage_position".into(),
        ResultValue::Position([0.25, 0.97]),
    );
    r.insert("compliance".into(), ResultValue::Bool(true));
    r
}

#[test]
fn save_and_load_run() {
    let store = temp_store("save_load");
    let task = TaskKey::new("Producer", "SM2", "Fault_Bolted", "OC1");
    let run_id = compute_run_id(&task, &Config::default(), "v1");
    let manifest = RunManifest::new(
        run_id.clone(),
        task,
        RunStatus::Completed { compliance: true },
        "v1",
    );

    store.save_run(&manifest, &results()).unwrap();
    assert!(store.has_run(&run_id));

    let record = store.load_run(&run_id).unwrap();
    assert_eq!(record.manifest, manifest);
    assert_eq!(record.results, results());
}

#[test]
fn missing_run_is_reported() {
    let store = temp_store("missing");
    assert!(matches!(
        store.load_manifest("nope"),
        Err(ResultsError::RunNotFound { .. })
    ));
}

#[test]
fn list_and_delete_runs() {
    let store = temp_store("list");
    for (sheet, oc) in [("SM2", "OC2"), ("SM2", "OC1"), ("SM3", "OC1")] {
        let task = TaskKey::new("Producer", sheet, "Fault_Bolted", oc);
        let run_id = compute_run_id(&task, &Config::default(), "v1");
        let manifest = RunManifest::new(run_id, task, RunStatus::MissingCurves { code: 1 }, "v1");
        store.save_run(&manifest, &KeyedResults::new()).unwrap();
    }

    let all = store.list_runs().unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].task.operating_condition, "OC1");
    assert_eq!(all[0].task.test_sheet, "SM2");

    let sm2 = store.list_for_test_sheet("SM2").unwrap();
    assert_eq!(sm2.len(), 2);

    store.delete_run(&sm2[0].run_id).unwrap();
    assert_eq!(store.list_runs().unwrap().len(), 2);
}

#[test]
fn curve_dump_lands_in_run_dir() {
    let store = temp_store("dump");
    let curve =
        Curve::from_columns(vec![0.0, 0.01], [("BusPDR_BUS_Voltage", vec![1.0, 0.9])]).unwrap();
    let name = store.dump_curve("run1", "calculated_filtered", &curve).unwrap();
    let text = std::fs::read_to_string(store.root_dir().join("run1").join(&name)).unwrap();
    assert!(text.starts_with("time;BusPDR_BUS_Voltage\n"));
    assert_eq!(text.lines().count(), 3);
}
