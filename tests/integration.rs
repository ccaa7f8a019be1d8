//! End-to-end integration tests for the diagnet engine.
//!
//! These tests load a knowledge base from disk and run requests through
//! the full pipeline: access check, seeding, propagation with gates,
//! reduction, refinement, and answer assembly.

use std::path::Path;

use diagnet::engine::{Engine, EngineConfig};
use diagnet::error::{AccessError, DiagError, EngineError, KbError};
use diagnet::network::{NodeId, NodeKind};
use diagnet::solve::{KbId, Observation, Question, Request, UserId};

const RESPIRATORY: &str = r#"
[knowledge_base]
id = 1
name = "Respiratory"
description = "Common respiratory complaints"

[[attributes]]
id = 1
name = "temperature"
value_area = "34:43"

[[attributes]]
id = 2
name = "cough"
value_area = "[none,dry,wet]"

[[attributes]]
id = 3
name = "rash"
value_area = "[yes,no]"

[[attributes]]
id = 4
name = "sore throat"
value_area = "[yes,no]"

[[sections]]
id = 1
name = "symptoms"

[[sections.nodes]]
id = 10
name = "Fever"
kind = "feature"
attribute = 1
condition = "38:43"

[[sections.nodes]]
id = 11
name = "Cough"
kind = "feature"
attribute = 2
condition = "[dry,wet]"

[[sections.nodes]]
id = 12
name = "Rash"
kind = "feature"
attribute = 3
condition = "yes"

[[sections.nodes]]
id = 13
name = "Sore throat"
kind = "feature"
attribute = 4
condition = "yes"

[[sections]]
id = 2
name = "patterns"

[[sections.nodes]]
id = 30
name = "fever and cough"
kind = "and"

[[sections.nodes]]
id = 31
name = "throat or cough"
kind = "or"

[[sections]]
id = 3
name = "diagnoses"

[[sections.nodes]]
id = 20
name = "Flu"
kind = "hypothesis"

[[sections.nodes]]
id = 21
name = "Cold"
kind = "hypothesis"

[[sections.nodes]]
id = 22
name = "Measles"
kind = "hypothesis"

[[sections.nodes]]
id = 23
name = "Allergy"
kind = "hypothesis"

[[sections.nodes]]
id = 24
name = "Bronchitis"
kind = "hypothesis"

[[connections]]
source = 10
target = 30
kind = "supports"

[[connections]]
source = 11
target = 30
kind = "supports"

[[connections]]
source = 13
target = 31
kind = "supports"

[[connections]]
source = 11
target = 31
kind = "supports"

[[connections]]
source = 30
target = 20
kind = "requires"

[[connections]]
source = 31
target = 21
kind = "supports"

[[connections]]
source = 12
target = 22
kind = "supports"

[[connections]]
source = 22
target = 10
kind = "requires"

[[connections]]
source = 11
target = 23
kind = "supports"

[[connections]]
source = 10
target = 23
kind = "excludes"

[[connections]]
source = 11
target = 24
kind = "supports"

[[connections]]
source = 20
target = 13
kind = "supports"

[[connections]]
source = 21
target = 10
kind = "supports"

[[grants]]
user_id = 7
level = "read"
"#;

const DOCTOR: UserId = UserId(7);
const RESP: KbId = KbId(1);

fn id(raw: u64) -> NodeId {
    NodeId::new(raw).unwrap()
}

fn engine_in(dir: &Path) -> Engine {
    std::fs::write(dir.join("respiratory.toml"), RESPIRATORY).unwrap();
    Engine::new(EngineConfig {
        kb_dir: Some(dir.to_path_buf()),
        ..Default::default()
    })
    .unwrap()
}

fn fever_and_cough() -> Request {
    Request::new(DOCTOR, RESP)
        .observe(id(10), "39")
        .observe(id(11), "dry")
}

#[test]
fn engine_discovers_knowledge_bases_and_skips_broken_files() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("broken.toml"), "[knowledge_base\n").unwrap();
    let engine = engine_in(dir.path());

    assert_eq!(engine.knowledge_bases(), vec![RESP]);
    let info = engine.info(RESP).unwrap();
    assert_eq!(info.name, "Respiratory");
    assert_eq!(info.sections, 3);
    assert_eq!(info.features, 4);
    assert_eq!(info.gates, 2);
    assert_eq!(info.hypotheses, 5);
    assert_eq!(info.connections, 13);
    assert_eq!((info.supports, info.requires, info.excludes), (10, 2, 1));
}

#[test]
fn fever_and_cough_end_to_end() {
    let dir = tempfile::TempDir::new().unwrap();
    let engine = engine_in(dir.path());

    let answer = engine.solve(&fever_and_cough()).unwrap();

    // Allergy is excluded by fever; Measles never activates.
    assert_eq!(answer.hypothesis_names(), vec!["Flu", "Cold", "Bronchitis"]);

    let flu = &answer.hypotheses[0];
    assert!(flu.confirmed);
    assert_eq!(flu.kind, NodeKind::Hypothesis);
    let flu_args: Vec<u64> = flu.arguments.iter().map(|a| a.id).collect();
    assert_eq!(flu_args, vec![10, 11]);

    let cold = &answer.hypotheses[1];
    assert!(!cold.confirmed);
    assert_eq!(cold.arguments.iter().map(|a| a.id).collect::<Vec<_>>(), vec![11]);

    let asked: Vec<NodeId> = answer.questions.iter().map(|q| q.feature_id).collect();
    assert_eq!(asked, vec![id(13)]);
}

#[test]
fn differentiation_keeps_most_specific() {
    let dir = tempfile::TempDir::new().unwrap();
    let engine = engine_in(dir.path());

    let answer = engine.solve(&fever_and_cough().with_differentiation()).unwrap();
    assert_eq!(answer.hypothesis_names(), vec!["Flu"]);
}

#[test]
fn minimization_drops_redundant_hypothesis() {
    let dir = tempfile::TempDir::new().unwrap();
    let engine = engine_in(dir.path());

    // Cold and Bronchitis both rest on {cough}; the lower id goes first.
    let answer = engine.solve(&fever_and_cough().with_minimization()).unwrap();
    assert_eq!(answer.hypothesis_names(), vec!["Flu", "Bronchitis"]);
}

#[test]
fn missing_required_feature_removes_hypothesis() {
    let dir = tempfile::TempDir::new().unwrap();
    let engine = engine_in(dir.path());

    let with_fever = Request::new(DOCTOR, RESP)
        .observe(id(12), "yes")
        .observe(id(10), "38.5");
    // "38.5" is not an integer, so the fever observation is inactive.
    assert!(engine.solve(&with_fever).unwrap().hypotheses.is_empty());

    let unobserved = Request::new(DOCTOR, RESP).observe(id(12), "yes");
    assert_eq!(engine.solve(&unobserved).unwrap().hypothesis_names(), vec!["Measles"]);
}

#[test]
fn clarifier_drives_further_rounds() {
    let dir = tempfile::TempDir::new().unwrap();
    let engine = engine_in(dir.path());

    let mut asked = Vec::new();
    let mut clarifier = |questions: &[Question]| -> Vec<Observation> {
        questions
            .iter()
            .map(|q| {
                asked.push(q.name.clone());
                let value = if q.feature_id == id(10) { "40" } else { "no" };
                Observation::new(q.feature_id, value)
            })
            .collect()
    };

    let request = Request::new(DOCTOR, RESP).observe(id(11), "wet");
    let answer = engine.solve_with(&request, &mut clarifier).unwrap();

    assert_eq!(asked, vec!["Fever".to_string(), "Sore throat".to_string()]);
    assert_eq!(answer.hypothesis_names(), vec!["Flu", "Cold", "Bronchitis"]);
    assert!(answer.questions.is_empty());
    assert!(answer.rounds >= 3);
}

#[test]
fn cough_alone_keeps_allergy() {
    let dir = tempfile::TempDir::new().unwrap();
    let engine = engine_in(dir.path());

    let request = Request::new(DOCTOR, RESP).observe(id(11), "dry");
    let answer = engine.solve(&request).unwrap();
    assert_eq!(answer.hypothesis_names(), vec!["Cold", "Allergy", "Bronchitis"]);
}

#[test]
fn access_is_enforced() {
    let dir = tempfile::TempDir::new().unwrap();
    let engine = engine_in(dir.path());

    let request = Request::new(UserId(8), RESP).observe(id(10), "39");
    let err = engine.solve(&request).unwrap_err();
    assert!(matches!(
        err,
        DiagError::Access(AccessError::Forbidden { user_id: 8, kb_id: 1 })
    ));
}

#[test]
fn unknown_knowledge_base_is_reported() {
    let dir = tempfile::TempDir::new().unwrap();
    let engine = engine_in(dir.path());

    let err = engine.solve(&Request::new(DOCTOR, KbId(5))).unwrap_err();
    assert!(matches!(err, DiagError::Engine(EngineError::KbNotFound { kb_id: 5 })));
}

#[test]
fn missing_kb_dir_is_invalid_config() {
    let dir = tempfile::TempDir::new().unwrap();
    let err = Engine::new(EngineConfig {
        kb_dir: Some(dir.path().join("absent")),
        ..Default::default()
    })
    .unwrap_err();
    assert!(matches!(err, DiagError::Engine(EngineError::InvalidConfig { .. })));
}

#[test]
fn load_file_reports_assembly_errors() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, RESPIRATORY.replace("target = 24", "target = 99")).unwrap();

    let engine = Engine::new(EngineConfig::default()).unwrap();
    let err = engine.load_file(&path).unwrap_err();
    assert!(matches!(err, DiagError::Kb(KbError::Network(_))));
    assert!(engine.knowledge_bases().is_empty());
}

#[test]
fn json_request_round_trips_through_engine() {
    let dir = tempfile::TempDir::new().unwrap();
    let engine = engine_in(dir.path());

    let request: Request = serde_json::from_str(
        r#"{
            "user_id": 7,
            "kb_id": 1,
            "observations": [
                {"feature_id": 10, "value": "39"},
                {"feature_id": 11, "value": "dry"}
            ],
            "differentiate": true
        }"#,
    )
    .unwrap();
    assert!(!request.minimize);

    let answer = engine.solve(&request).unwrap();
    let json = serde_json::to_value(&answer).unwrap();
    assert_eq!(json["kb_id"], 1);
    assert_eq!(json["hypotheses"][0]["name"], "Flu");
    assert_eq!(json["hypotheses"][0]["confirmed"], true);
    assert_eq!(json["hypotheses"][0]["arguments"][1]["name"], "Cough");
}

#[test]
fn batch_requests_run_in_parallel_and_keep_order() {
    let dir = tempfile::TempDir::new().unwrap();
    let engine = engine_in(dir.path());

    let requests: Vec<Request> = (0..32)
        .map(|i| {
            if i % 2 == 0 {
                fever_and_cough().with_differentiation()
            } else {
                Request::new(DOCTOR, RESP).observe(id(12), "yes")
            }
        })
        .collect();

    let answers = engine.solve_batch(&requests);
    assert_eq!(answers.len(), 32);
    for (i, answer) in answers.into_iter().enumerate() {
        let names = answer.unwrap().hypothesis_names().join(",");
        let expected = if i % 2 == 0 { "Flu" } else { "Measles" };
        assert_eq!(names, expected);
    }
}
