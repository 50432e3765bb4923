use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::fs;

use trainload::{
    batch, input, norms, pmc, readiness, resample, zones, AthleteProfile, BiomotorTestResult,
    EngineConfig, Rpe, Session, Sex, TestCategory,
};

// Integration tests that exercise complete workflows through the public API

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn session(day: NaiveDate, rpe: i64, minutes: Decimal) -> Session {
    Session::new(day, Rpe::new(rpe).unwrap(), minutes).unwrap()
}

/// Repeating weekly micro-cycle with two rest days
fn training_block(start: NaiveDate, weeks: usize) -> Vec<Session> {
    let week = [
        Some((8, dec!(75))),
        Some((3, dec!(45))),
        None,
        Some((6, dec!(60))),
        Some((8, dec!(60))),
        Some((5, dec!(120))),
        None,
    ];

    start
        .iter_days()
        .take(weeks * 7)
        .zip(week.iter().cycle())
        .filter_map(|(day, plan)| plan.map(|(rpe, minutes)| session(day, rpe, minutes)))
        .collect()
}

#[test]
fn test_session_file_to_training_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions.csv");
    fs::write(
        &path,
        "date,rpe,duration_minutes,program\n\
         2024-09-03,5,60,competition\n\
         2024-09-01,8,90,gpp\n\
         2024-09-03,2,30,\n",
    )
    .unwrap();

    let sessions = input::read_sessions(&path).unwrap();
    let states = pmc::PmcCalculator::new().analyze_sessions(&sessions).unwrap();

    assert_eq!(states.len(), 3);
    assert_eq!(states[0].date, date(2024, 9, 1));
    assert_eq!(states[0].load, dec!(150));
    assert_eq!(states[1].load, Decimal::ZERO);
    // 60 + 30 × 30/60
    assert_eq!(states[2].load, dec!(75));
}

#[test]
fn test_training_block_metrics() {
    let calculator = pmc::PmcCalculator::new();
    let sessions = training_block(date(2024, 1, 1), 8);

    let states = calculator.analyze_sessions(&sessions).unwrap();

    assert_eq!(states.first().unwrap().date, date(2024, 1, 1));
    for state in &states {
        assert_eq!(state.ctl - state.atl, state.tsb);
        assert!(state.tsb_percent.abs() <= dec!(40));
        assert_eq!(
            state.form_zone,
            zones::FormZone::from_tsb_percent(state.tsb_percent)
        );
        assert_eq!(state.acwr_zone, zones::AcwrZone::from_acwr(state.acwr));
    }

    // Steady weekly structure keeps the workload ratio near 1 once the chronic window fills
    let settled = &states[34..];
    assert!(settled
        .iter()
        .all(|s| s.acwr > dec!(0.8) && s.acwr < dec!(1.5)));

    let distribution = zones::zone_distribution(&states);
    let total: usize = zones::FormZone::all()
        .iter()
        .map(|z| distribution.form_days(*z))
        .sum();
    assert_eq!(total, states.len());

    let trends = calculator.analyze_trends(&states).unwrap();
    assert_eq!(trends.ctl_trend, pmc::TrendDirection::Increasing);
}

#[test]
fn test_taper_raises_form() {
    let calculator = pmc::PmcCalculator::new();
    let sessions = training_block(date(2024, 1, 1), 8);
    let last_session = sessions.last().unwrap().date();

    let before = calculator
        .latest_state(&sessions, last_session)
        .unwrap()
        .unwrap();
    let after = calculator
        .latest_state(&sessions, last_session + chrono::Days::new(10))
        .unwrap()
        .unwrap();

    assert!(after.tsb > before.tsb);
    assert!(after.atl < before.atl);
    assert_eq!(after.load, Decimal::ZERO);
}

#[test]
fn test_resampling_is_idempotent_on_real_block() {
    let sessions = training_block(date(2024, 1, 1), 4);
    let once = resample::resample(&sessions, None).unwrap();
    let twice = resample::resample(once.days(), None).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_readiness_scenario() {
    let record = trainload::ReadinessRecord::new(date(2024, 5, 1), 60, dec!(50)).unwrap();

    let metrics = readiness::ReadinessEstimator::new()
        .estimate(&record, None)
        .unwrap();

    assert_eq!(metrics.vo2max, dec!(49.725));
    assert_eq!(metrics.power, dec!(125));
    assert_eq!(metrics.readiness_score, dec!(100));
}

#[test]
fn test_norm_table_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("norms.toml");
    fs::write(
        &path,
        r#"
version = "test-1"

[[norms]]
test_id = "cmj"
sex = "male"
age_bracket = "young_adult"
cut_points = [30, 38, 45, 52]

[[norms]]
test_id = "sprint_10m"
sex = "male"
age_bracket = "young_adult"
cut_points = [1.7, 1.8, 1.9, 2.0]
higher_is_better = false
"#,
    )
    .unwrap();

    let table = norms::NormTable::load_from_file(&path).unwrap();
    let athlete = AthleteProfile {
        id: "a7".to_string(),
        birth_date: Some(date(2006, 3, 15)),
        sex: Sex::Male,
        body_mass_kg: Some(dec!(78)),
    };

    // Eighteenth birthday on the evaluation date
    let jump = BiomotorTestResult {
        category: TestCategory::Power,
        test_id: "cmj".to_string(),
        raw_value: dec!(47),
        body_weight_at_test: None,
    };
    let evaluation = table.evaluate(&jump, &athlete, date(2024, 3, 15)).unwrap();
    assert_eq!(evaluation.age_bracket, norms::AgeBracket::YoungAdult);
    assert_eq!(evaluation.tier, norms::Tier::Good);

    let sprint = BiomotorTestResult {
        category: TestCategory::Speed,
        test_id: "sprint_10m".to_string(),
        raw_value: dec!(1.65),
        body_weight_at_test: None,
    };
    let evaluation = table.evaluate(&sprint, &athlete, date(2024, 6, 1)).unwrap();
    assert_eq!(evaluation.tier, norms::Tier::VeryGood);

    // The day before the eighteenth birthday there are no youth norms
    assert!(table.evaluate(&jump, &athlete, date(2024, 3, 14)).is_err());
}

#[test]
fn test_batch_from_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("athletes.json");
    fs::write(
        &path,
        r#"[
  {
    "athlete_id": "steady",
    "birth_date": "1995-06-01",
    "sessions": [
      {"date": "2024-01-01", "rpe": 5, "duration_minutes": 60},
      {"date": "2024-01-02", "rpe": 6, "duration_minutes": 45}
    ],
    "readiness": [
      {"date": "2024-01-02", "resting_heart_rate": 55, "vertical_jump_cm": 48}
    ]
  },
  {
    "athlete_id": "typo",
    "sessions": [
      {"date": "2024-01-01", "rpe": 15, "duration_minutes": 60}
    ]
  },
  {
    "athlete_id": "negative-hr",
    "readiness": [
      {"date": "2024-01-02", "resting_heart_rate": -5, "vertical_jump_cm": 48}
    ]
  },
  {
    "athlete_id": "endless",
    "sessions": [
      {"date": "2024-01-01", "rpe": 10, "duration_minutes": "1000000000000000000000000000"}
    ]
  }
]"#,
    )
    .unwrap();

    let athletes = input::read_athletes(&path).unwrap();
    let summary = batch::BatchAnalyzer::new()
        .analyze_entries(&athletes)
        .unwrap();

    assert_eq!(summary.total_athletes, 4);
    assert_eq!(summary.failed_athletes, 3);

    let steady = summary.outcome("steady").unwrap().result.as_ref().unwrap();
    assert_eq!(steady.states.len(), 2);
    let readiness = steady.readiness.as_ref().unwrap();
    assert_eq!(readiness.record_count, 1);

    for athlete_id in ["typo", "negative-hr", "endless"] {
        assert!(!summary.outcome(athlete_id).unwrap().is_success());
    }
}

#[test]
fn test_config_drives_engine() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    let mut config = EngineConfig::default();
    config.pmc.atl_time_constant = 5;
    config.save_to_file(&path).unwrap();

    let loaded = EngineConfig::load_from_file(&path).unwrap();
    let calculator = pmc::PmcCalculator::with_config(loaded.pmc.clone());
    let sessions = vec![session(date(2024, 1, 1), 5, dec!(60))];

    let custom = &calculator.analyze_sessions(&sessions).unwrap()[0];
    let default = &pmc::PmcCalculator::new().analyze_sessions(&sessions).unwrap()[0];

    assert!(custom.atl > default.atl);
    assert_eq!(custom.ctl, default.ctl);
}
