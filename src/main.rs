use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use rust_decimal::Decimal;
use serde_json::json;
use std::path::PathBuf;
use tabled::{settings::Style, Table, Tabled};
use tracing::info;

use trainload::input::{read_athletes, read_sessions};
use trainload::logging::init_logging;
use trainload::{
    AthleteProfile, BatchAnalyzer, BiomotorTestResult, CalculationError, EngineConfig,
    FormZone, NormTable, PmcCalculator, ReadinessEstimator, ReadinessRecord, Sex, TestCategory,
    Tier, TrainLoadError, TrainingState,
};

/// trainload - Training Load Analytics
///
/// Computes fitness, fatigue, form and workload ratio from session RPE,
/// readiness estimates from morning measurements, and norm-referenced tiers
/// for biomotor test results.
#[derive(Parser)]
#[command(name = "trainload")]
#[command(version)]
#[command(about = "Training Load Analytics CLI", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Daily training state from a session log
    Analyze {
        /// Session file (.json or .csv)
        #[arg(short, long)]
        file: PathBuf,

        /// Date range start (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Date range end (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Include trend analysis
        #[arg(long)]
        trends: bool,

        #[arg(short = 'o', long, value_enum, default_value = "table")]
        output: OutputFormat,
    },

    /// Readiness estimates for one morning reading
    Readiness {
        /// Resting heart rate (bpm)
        #[arg(long)]
        rhr: u16,

        /// Vertical jump height (cm)
        #[arg(long)]
        vertical_jump: Decimal,

        /// Body mass (kg), enables the Sayers peak power estimate
        #[arg(long)]
        body_mass: Option<Decimal>,

        #[arg(long)]
        birth_date: Option<NaiveDate>,

        /// Reading date (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(short = 'o', long, value_enum, default_value = "table")]
        output: OutputFormat,
    },

    /// Classify one test result against a norm table
    Classify {
        /// Test identifier as used in the norm table
        #[arg(short, long)]
        test: String,

        /// Raw test value
        #[arg(long)]
        value: Decimal,

        #[arg(long)]
        category: TestCategory,

        #[arg(long)]
        sex: Sex,

        #[arg(long)]
        birth_date: NaiveDate,

        /// Body weight at test time (kg), for body-weight-relative tests
        #[arg(long)]
        body_weight: Option<Decimal>,

        /// Evaluation date (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Norm table (TOML); overrides the configured table
        #[arg(short, long)]
        norms: Option<PathBuf>,

        #[arg(short = 'o', long, value_enum, default_value = "table")]
        output: OutputFormat,
    },

    /// Analyze many athletes in parallel from a JSON file
    Batch {
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short = 'o', long, value_enum, default_value = "table")]
        output: OutputFormat,
    },

    /// Show the effective configuration
    Config {
        /// Write a default configuration file if none exists
        #[arg(long)]
        init: bool,
    },
}

#[derive(Tabled)]
struct StateRow {
    #[tabled(rename = "Date")]
    date: NaiveDate,
    #[tabled(rename = "Load")]
    load: Decimal,
    #[tabled(rename = "CTL")]
    ctl: Decimal,
    #[tabled(rename = "ATL")]
    atl: Decimal,
    #[tabled(rename = "TSB")]
    tsb: Decimal,
    #[tabled(rename = "TSB %")]
    tsb_percent: Decimal,
    #[tabled(rename = "ACWR")]
    acwr: Decimal,
    #[tabled(rename = "Form")]
    form: &'static str,
    #[tabled(rename = "Risk")]
    risk: &'static str,
}

impl From<&TrainingState> for StateRow {
    fn from(state: &TrainingState) -> Self {
        StateRow {
            date: state.date,
            load: state.load.round_dp(1),
            ctl: state.ctl.round_dp(1),
            atl: state.atl.round_dp(1),
            tsb: state.tsb.round_dp(1),
            tsb_percent: state.tsb_percent.round_dp(1),
            acwr: state.acwr.round_dp(2),
            form: state.form_zone.label(),
            risk: state.acwr_zone.label(),
        }
    }
}

#[derive(Tabled)]
struct BatchRow {
    #[tabled(rename = "Athlete")]
    athlete: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Days")]
    days: usize,
    #[tabled(rename = "CTL")]
    ctl: String,
    #[tabled(rename = "TSB %")]
    tsb_percent: String,
    #[tabled(rename = "ACWR")]
    acwr: String,
    #[tabled(rename = "Readiness")]
    readiness: String,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        let message = match e.downcast_ref::<TrainLoadError>() {
            Some(err) => err.user_message(),
            None => format!("{:#}", e),
        };
        eprintln!("{} {}", "error:".red().bold(), message);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => EngineConfig::load_from_file(path)?,
        None => EngineConfig::load_or_default()?,
    };

    let mut log_config = config.logging.clone();
    log_config.level = log_config.level.raised_by(cli.verbose);
    init_logging(&log_config)?;

    match cli.command {
        Commands::Analyze {
            file,
            from,
            to,
            trends,
            output,
        } => analyze(&config, &file, from, to, trends, output),

        Commands::Readiness {
            rhr,
            vertical_jump,
            body_mass,
            birth_date,
            date,
            output,
        } => {
            let mut record =
                ReadinessRecord::new(date.unwrap_or_else(today), rhr, vertical_jump)?;
            if let Some(mass) = body_mass {
                record = record.with_body_mass(mass)?;
            }

            let estimator = ReadinessEstimator::with_config(config.readiness.clone());
            let metrics = estimator.estimate(&record, birth_date)?;

            match output {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&metrics)?),
                OutputFormat::Table => {
                    println!("{}", format!("Readiness for {}", metrics.date).cyan().bold());
                    println!("  Readiness score: {}", metrics.readiness_score.round_dp(1));
                    println!(
                        "  VO2max:          {} ml/kg/min (age {}{})",
                        metrics.vo2max.round_dp(1),
                        metrics.age_used,
                        if metrics.age_assumed { ", assumed" } else { "" }
                    );
                    println!("  Jump power:      {}", metrics.power.round_dp(1));
                    if let Some(peak) = metrics.peak_power {
                        println!("  Peak power:      {} W (Sayers)", peak.round_dp(0));
                    }
                }
            }
            Ok(())
        }

        Commands::Classify {
            test,
            value,
            category,
            sex,
            birth_date,
            body_weight,
            date,
            norms,
            output,
        } => {
            let norms_path = norms.or_else(|| config.norm_table.clone()).context(
                "No norm table given; pass --norms or set norm_table in the configuration",
            )?;
            let table = NormTable::load_from_file(&norms_path)?;

            let athlete = AthleteProfile {
                id: "cli".to_string(),
                birth_date: Some(birth_date),
                sex,
                body_mass_kg: body_weight,
            };
            let result = BiomotorTestResult {
                category,
                test_id: test,
                raw_value: value,
                body_weight_at_test: body_weight,
            };
            let evaluation = table.evaluate(&result, &athlete, date.unwrap_or_else(today))?;

            match output {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&evaluation)?)
                }
                OutputFormat::Table => {
                    println!(
                        "{} {} ({}, {}): {}",
                        "Test".bold(),
                        evaluation.test_id,
                        sex,
                        evaluation.age_bracket,
                        colorize_tier(evaluation.tier)
                    );
                    if evaluation.evaluated_value != evaluation.raw_value {
                        println!(
                            "  Relative value: {} per kg",
                            evaluation.evaluated_value.round_dp(2)
                        );
                    }
                    println!("  Norm table version: {}", table.version().dimmed());
                }
            }
            Ok(())
        }

        Commands::Batch { file, output } => batch(&config, &file, output),

        Commands::Config { init } => {
            let path = cli
                .config
                .clone()
                .unwrap_or_else(EngineConfig::default_config_path);

            if init {
                if path.exists() {
                    println!("Configuration already exists at {}", path.display());
                } else {
                    EngineConfig::default().save_to_file(&path)?;
                    println!(
                        "{}",
                        format!("✓ Wrote default configuration to {}", path.display()).green()
                    );
                }
                return Ok(());
            }

            println!("{}", format!("# {}", path.display()).dimmed());
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn analyze(
    config: &EngineConfig,
    file: &std::path::Path,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    trends: bool,
    output: OutputFormat,
) -> Result<()> {
    let sessions = read_sessions(file)?;
    let calculator = PmcCalculator::with_config(config.pmc.clone());

    let first = sessions.iter().map(|s| s.date()).min();
    let last = sessions.iter().map(|s| s.date()).max();

    let states = match (from.or(first), to.or(last)) {
        (Some(start), Some(end)) if from.is_some() || to.is_some() => {
            calculator.series_between(&sessions, start, end)?
        }
        _ => calculator.analyze_sessions(&sessions)?,
    };
    info!(sessions = sessions.len(), days = states.len(), "Analyzed session log");

    if output == OutputFormat::Json {
        let trend_analysis = if trends {
            calculator.analyze_trends(&states).ok()
        } else {
            None
        };
        let document = json!({
            "states": states,
            "trends": trend_analysis,
        });
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    let Some(latest) = states.last() else {
        println!("{}", "No sessions in the selected range".yellow());
        return Ok(());
    };

    println!("{}", "Training Load".cyan().bold());
    let rows: Vec<StateRow> = states.iter().map(StateRow::from).collect();
    println!("{}", Table::new(rows).with(Style::rounded()));

    println!();
    println!(
        "{} {} on {}",
        "Form:".bold(),
        colorize_form(latest.form_zone),
        latest.date
    );
    println!("  {}", latest.form_zone.description());
    for recommendation in calculator.generate_recommendations(latest) {
        println!("  • {}", recommendation);
    }

    if trends {
        println!();
        match calculator.analyze_trends(&states) {
            Ok(t) => {
                println!("{}", "Trends".cyan().bold());
                println!("  CTL: {:?}", t.ctl_trend);
                println!("  ATL: {:?}", t.atl_trend);
                println!("  TSB: {:?}", t.tsb_trend);
                println!("  Average weekly ramp: {}", t.avg_weekly_ramp.round_dp(1));
                println!("  High ACWR days: {}", t.high_acwr_days);
            }
            Err(TrainLoadError::Calculation(e @ CalculationError::InsufficientData { .. })) => {
                println!("{}", e.to_string().yellow());
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

fn batch(config: &EngineConfig, file: &std::path::Path, output: OutputFormat) -> Result<()> {
    let athletes = read_athletes(file)?;
    let analyzer = BatchAnalyzer::with_config(
        config.batch.clone(),
        PmcCalculator::with_config(config.pmc.clone()),
        ReadinessEstimator::with_config(config.readiness.clone()),
    );
    let summary = analyzer.analyze_entries(&athletes)?;

    if output == OutputFormat::Json {
        let outcomes: Vec<serde_json::Value> = summary
            .outcomes
            .iter()
            .map(|outcome| match &outcome.result {
                Ok(report) => json!({ "athlete_id": outcome.athlete_id, "report": report }),
                Err(e) => json!({ "athlete_id": outcome.athlete_id, "error": e.to_string() }),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
        return Ok(());
    }

    let dash = || "-".to_string();
    let rows: Vec<BatchRow> = summary
        .outcomes
        .iter()
        .map(|outcome| match &outcome.result {
            Ok(report) => BatchRow {
                athlete: outcome.athlete_id.clone(),
                status: "ok".to_string(),
                days: report.states.len(),
                ctl: report
                    .latest
                    .as_ref()
                    .map_or_else(dash, |s| s.ctl.round_dp(1).to_string()),
                tsb_percent: report
                    .latest
                    .as_ref()
                    .map_or_else(dash, |s| s.tsb_percent.round_dp(1).to_string()),
                acwr: report
                    .latest
                    .as_ref()
                    .map_or_else(dash, |s| s.acwr.round_dp(2).to_string()),
                readiness: report.readiness.as_ref().map_or_else(dash, |r| {
                    r.readiness_score.current.round_dp(1).to_string()
                }),
            },
            Err(e) => BatchRow {
                athlete: outcome.athlete_id.clone(),
                status: e.user_message(),
                days: 0,
                ctl: dash(),
                tsb_percent: dash(),
                acwr: dash(),
                readiness: dash(),
            },
        })
        .collect();

    println!("{}", Table::new(rows).with(Style::rounded()));
    let footer = summary.to_string_pretty();
    if summary.is_fully_successful() {
        println!("{}", footer.green());
    } else {
        println!("{}", footer.yellow());
    }

    Ok(())
}

fn colorize_form(zone: FormZone) -> ColoredString {
    match zone {
        FormZone::HighRisk => zone.label().red().bold(),
        FormZone::OptimalTraining => zone.label().green(),
        FormZone::GreyZone => zone.label().white(),
        FormZone::Fresh => zone.label().cyan(),
        FormZone::Transition => zone.label().yellow(),
    }
}

fn colorize_tier(tier: Tier) -> ColoredString {
    match tier {
        Tier::VeryGood => tier.label().green().bold(),
        Tier::Good => tier.label().green(),
        Tier::Fair => tier.label().yellow(),
        Tier::Low => tier.label().red(),
        Tier::VeryLow => tier.label().red().bold(),
    }
}
