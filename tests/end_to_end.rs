//! Whole pipeline for one instance: data file on disk, solver run, parsed
//! solution, ledger row and solution dump.

#![cfg(unix)]

mod common;

use circbench::engine::data_file::parse_data_file;
use circbench::ledger::{read_instances, read_results};
use circbench::{
    CampaignDriver, CampaignMode, Ledger, OutcomeKind, ProblemInstance, Schedule, ShutdownSignal,
    SolutionDumper, run_campaign,
};
use tempfile::TempDir;

use common::{SOLVING_STUB, stub_config, write_stub};

const TWO_CIRCLES: &str = r#"
sleep 0.1
echo "Solving circle coverage"
echo "SOLUTION_DATA = {'num_circles': 2, 'circles': [(0, 0), (10, 10)], 'radius': 5.0, 'min_coverage': 2}"
"#;

fn ten_points() -> ProblemInstance {
    let xs = vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
    let ys = vec![0.0, 2.0, 1.0, 3.0, 2.0, 4.0, 3.0, 5.0, 4.0, 6.0];
    ProblemInstance::new("ten", xs, ys, 5.0, 1.5, 2, 7).unwrap()
}

#[tokio::test]
async fn test_single_instance_end_to_end() {
    let dir = TempDir::new().unwrap();
    let script = write_stub(dir.path(), TWO_CIRCLES);
    let config = stub_config(dir.path(), &script, &["Teste1"]);
    let instance = ten_points();

    let ledger = Ledger::open(&config.ledger_dir()).unwrap();
    let sink = SolutionDumper::new(config.solutions_dir());
    let mut driver =
        CampaignDriver::new(config.clone(), ledger, sink, ShutdownSignal::new()).unwrap();
    let summary = driver
        .run(Schedule::instances(vec![instance.clone()]))
        .await
        .unwrap();
    assert_eq!(summary.count(OutcomeKind::Success), 1);

    // The solver saw exactly this instance.
    let text = std::fs::read_to_string(config.data_file_path()).unwrap();
    let contents = parse_data_file(&text).unwrap();
    assert!(contents.describes(&instance));
    assert_eq!(contents.n, 10);
    assert_eq!(contents.min_coverage, 2);

    let records = read_results(&config.ledger_dir()).unwrap();
    assert_eq!(records.len(), 1);
    let row = &records[0];
    assert_eq!(row.instance_id, "ten");
    assert_eq!(row.outcome, OutcomeKind::Success);
    assert_eq!(row.num_circles, Some(2));
    assert_eq!(row.artifact, "ten/Teste1_r1");
    assert!(row.elapsed_secs >= 0.1);

    let dump = config.solutions_dir().join(&row.artifact);
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dump.join("solution.json")).unwrap())
            .unwrap();
    assert_eq!(json["num_circles"], 2);
    assert_eq!(json["circles"][1][0], 10.0);
    assert_eq!(json["radius"], 5.0);
    assert_eq!(json["min_coverage"], 2);
    assert_eq!(json["num_points"], 10);
    assert!(dump.join("solution.txt").is_file());

    let registered = read_instances(&config.ledger_dir()).unwrap();
    assert_eq!(registered.len(), 1);
    assert_eq!(registered[0].n, 10);
}

#[tokio::test]
async fn test_open_campaign_stops_at_max_instances() {
    let dir = TempDir::new().unwrap();
    let script = write_stub(dir.path(), SOLVING_STUB);
    let mut config = stub_config(dir.path(), &script, &["Teste1", "Teste2"]);
    config.campaign.mode = CampaignMode::Open;
    config.campaign.max_instances = Some(2);

    let summary = run_campaign(config.clone(), ShutdownSignal::new()).await.unwrap();
    assert_eq!(summary.executed(), 4);
    assert!(!summary.interrupted);

    let ids: Vec<String> = read_instances(&config.ledger_dir())
        .unwrap()
        .into_iter()
        .map(|i| i.instance_id)
        .collect();
    assert_eq!(ids, vec!["inst_000001", "inst_000002"]);

    // Raising the cap resumes at position 3 and regenerates nothing.
    config.campaign.max_instances = Some(3);
    let summary = run_campaign(config.clone(), ShutdownSignal::new()).await.unwrap();
    assert_eq!(summary.skipped, 4);
    assert_eq!(summary.executed(), 2);
    assert_eq!(read_results(&config.ledger_dir()).unwrap().len(), 6);
}
