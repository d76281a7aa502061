use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;

use running_order::schedule::annealing::AnnealingRun;
use running_order::schedule::{
    collision_details, count_collisions, plan, run_many, ActivityIndex, Constraints,
    ExhaustiveSolver, FixedPosition, ScheduleProblem, SolveOutcome, SolveRequest, StepOutcome,
    Strategy,
};
use running_order::SolverConfig;

fn request(pairs: &[(&str, &[&str])]) -> SolveRequest {
    let activities = pairs.iter().map(|(n, _)| n.to_string()).collect();
    let participants: HashMap<String, Vec<String>> = pairs
        .iter()
        .map(|(n, ms)| (n.to_string(), ms.iter().map(|m| m.to_string()).collect()))
        .collect();
    SolveRequest::new(activities, participants)
}

fn index(request: &SolveRequest) -> ActivityIndex {
    ActivityIndex::new(&request.activities, &request.participants).unwrap()
}

/// Eight dances for a small recital; each rehearsal group links two of them.
fn recital() -> SolveRequest {
    request(&[
        ("Opening", &["ana", "ben", "cy"]),
        ("Tango", &["ana", "dee"]),
        ("Hip Hop", &["eve", "fin"]),
        ("Ballet", &["ben", "gus"]),
        ("Jazz", &["dee", "eve"]),
        ("Tap", &["gus", "hal"]),
        ("Lyrical", &["fin", "ivy"]),
        ("Finale", &["cy", "hal", "ivy"]),
    ])
}

#[test]
fn test_exhaustive_finds_perfect_recital_order() {
    let request = recital();
    let problem = ScheduleProblem::unconstrained(index(&request)).unwrap();
    let result = ExhaustiveSolver::new(&problem).solve().unwrap();

    assert_eq!(result.permutations_checked, 40_320);
    assert_eq!(result.min_cost, 0);
    assert!(!result.schedules.is_empty());
    for schedule in &result.schedules {
        assert_eq!(count_collisions(schedule, problem.index()), 0);
    }
}

#[test]
fn test_orchestrated_annealing_reaches_zero() {
    let request = recital();
    let problem = ScheduleProblem::unconstrained(index(&request)).unwrap();
    let config = SolverConfig::default().with_random_seed(2024);
    let results = run_many(&problem, &config).unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results.iter().map(|r| r.cost).min(), Some(0));
}

#[test]
fn test_exhaustive_bounds_annealing() {
    let request = request(&[
        ("A", &["m1", "m2"]),
        ("B", &["m2", "m3"]),
        ("C", &["m3", "m1"]),
        ("D", &["m1", "m4"]),
        ("E", &["m4", "m2"]),
        ("F", &["m3", "m4"]),
    ]);
    let problem = ScheduleProblem::unconstrained(index(&request)).unwrap();
    let exact = ExhaustiveSolver::new(&problem).solve().unwrap();

    for seed in 0..10 {
        let config = SolverConfig::default().with_random_seed(seed);
        for result in run_many(&problem, &config).unwrap() {
            assert!(exact.min_cost <= result.cost);
        }
    }
}

#[test]
fn test_triangle_scenario() {
    let mut request = request(&[("A", &["m1", "m2"]), ("B", &["m2", "m3"]), ("C", &["m1", "m3"])]);
    request.strategy = Strategy::Exhaustive;
    match plan(&request, &SolverConfig::default()).unwrap() {
        SolveOutcome::Exhaustive { min_cost, schedules, .. } => {
            assert_eq!(min_cost, 2);
            assert_eq!(schedules.len(), 6);
        }
        other => panic!("expected exhaustive outcome, got {:?}", other),
    }
}

#[test]
fn test_forced_bookend_scenario() {
    let mut request = request(&[("A", &["m1"]), ("B", &["m2"]), ("C", &["m1"])]);
    request.constraints.start_activity = Some("A".into());
    request.constraints.end_activity = Some("C".into());
    request.tuning.seed = Some(1);

    match plan(&request, &SolverConfig::default()).unwrap() {
        SolveOutcome::Annealing { results } => {
            for result in results {
                assert_eq!(result.schedule, vec!["A", "B", "C"]);
                assert_eq!(result.cost, 0);
                assert!(result.collisions.is_empty());
            }
        }
        other => panic!("expected annealing outcome, got {:?}", other),
    }
}

#[test]
fn test_constraints_hold_for_every_accepted_state() {
    let request = recital();
    let constraints = Constraints {
        start_activity: Some("Opening".into()),
        end_activity: Some("Finale".into()),
        fixed_positions: vec![FixedPosition::new("Jazz", 3)],
        ..Default::default()
    };
    let problem = ScheduleProblem::new(index(&request), &constraints).unwrap();
    let opening = problem.index().id_of("Opening").unwrap();
    let finale = problem.index().id_of("Finale").unwrap();
    let jazz = problem.index().id_of("Jazz").unwrap();

    for seed in 0..5 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut run = AnnealingRun::start(&problem, &SolverConfig::default(), &mut rng).unwrap();
        loop {
            let outcome = run.step(&mut rng);
            let current = run.current();
            assert_eq!(current[0], opening);
            assert_eq!(current[2], jazz);
            assert_eq!(current[7], finale);
            if let StepOutcome::Finished(_) = outcome {
                break;
            }
        }
        let best = run.finish();
        assert_eq!(best.schedule[0], opening);
        assert_eq!(best.schedule[2], jazz);
        assert_eq!(best.schedule[7], finale);
        assert_eq!(best.cost, collision_details(&best.schedule, problem.index()).len());
    }
}

#[test]
fn test_csv_to_report_round() {
    let csv = "\
Dance,Members
Opening,\"ana, ben\"
Tango,ben
Jazz,cy
NOT Included,
Encore,ana
";
    let table =
        running_order::parser::read_activities(csv.as_bytes(), &Default::default()).unwrap();
    let mut request = table.into_request();
    request.strategy = Strategy::Auto;

    let outcome = plan(&request, &SolverConfig::default()).unwrap();
    let report = running_order::display::render_outcome(&outcome);
    assert!(report.contains("Minimum cost found: 0"));
    assert!(!report.contains("Encore"));
}
