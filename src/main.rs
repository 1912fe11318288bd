use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use heart_risk::{
    config::Config,
    features::{
        ChestPain, PatientInput, RestingEcg, Sex, StSlope, Thalassemia, YesNo, FEATURE_NAMES,
    },
    parse,
    pipeline::{accuracy, Action, Interaction, Outcome, RiskService},
    report,
};
use log::{info, LevelFilter};

#[derive(Debug, Parser)]
#[command(
    name = "heart-risk",
    version,
    about = "Screens heart attack risk from a short health questionnaire",
    after_help = "Artifacts are read from --model/--scaler, then HEART_RISK_MODEL/\
HEART_RISK_SCALER, then ./Logistics_Model.json and ./normlz.json."
)]
struct Cli {
    /// Increase verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the logistic regression model (JSON)
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// Path to the fitted standard scaler (JSON)
    #[arg(long, global = true)]
    scaler: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Encode and scale the form without predicting
    Encode(FormArgs),
    /// Encode, scale and predict the risk
    Predict(FormArgs),
    /// Score a CSV of encoded rows, with an optional target column
    Batch {
        /// CSV file with a header row
        path: PathBuf,
    },
}

#[derive(Debug, Args)]
struct FormArgs {
    /// Age in years (20-100)
    #[arg(long, default_value_t = 45)]
    age: u8,

    #[arg(long, value_enum, default_value_t = Sex::Male)]
    sex: Sex,

    #[arg(long, value_enum, default_value_t = ChestPain::TypicalAngina)]
    chest_pain: ChestPain,

    /// Resting blood pressure in mm Hg (90-200)
    #[arg(long, default_value_t = 120)]
    resting_bp: u16,

    /// Cholesterol in mg/dl (100-400)
    #[arg(long, default_value_t = 200)]
    cholesterol: u16,

    /// Fasting blood sugar above 120 mg/dl
    #[arg(long, value_enum, default_value_t = YesNo::No)]
    fasting_blood_sugar: YesNo,

    #[arg(long, value_enum, default_value_t = RestingEcg::Normal)]
    resting_ecg: RestingEcg,

    /// Maximum heart rate achieved (60-220)
    #[arg(long, default_value_t = 150)]
    max_heart_rate: u16,

    #[arg(long, value_enum, default_value_t = YesNo::No)]
    exercise_angina: YesNo,

    /// ST depression induced by exercise (0.0-6.0, step 0.1)
    #[arg(long, default_value_t = 1.0)]
    oldpeak: f64,

    /// Slope of the peak exercise ST segment
    #[arg(long, value_enum, default_value_t = StSlope::Upsloping)]
    slope: StSlope,

    /// Major vessels colored by fluoroscopy (0-3)
    #[arg(long, default_value_t = 0)]
    vessels: u8,

    #[arg(long, value_enum, default_value_t = Thalassemia::Normal)]
    thalassemia: Thalassemia,
}

impl From<FormArgs> for PatientInput {
    fn from(args: FormArgs) -> Self {
        Self {
            age: args.age,
            sex: args.sex,
            chest_pain: args.chest_pain,
            resting_bp: args.resting_bp,
            cholesterol: args.cholesterol,
            fasting_blood_sugar: args.fasting_blood_sugar,
            resting_ecg: args.resting_ecg,
            max_heart_rate: args.max_heart_rate,
            exercise_angina: args.exercise_angina,
            oldpeak: args.oldpeak,
            slope: args.slope,
            vessels: args.vessels,
            thalassemia: args.thalassemia,
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn read_form(args: FormArgs) -> anyhow::Result<PatientInput> {
    let input = PatientInput::from(args);
    input.validate().context("invalid form input")?;
    Ok(input)
}

fn exit_code(interaction: &Interaction) -> ExitCode {
    match interaction.outcome {
        Outcome::Halted | Outcome::PredictionFailed => ExitCode::FAILURE,
        Outcome::Pending | Outcome::Assessed(_) => ExitCode::SUCCESS,
    }
}

fn encode(service: &RiskService, input: &PatientInput) -> ExitCode {
    let interaction = service.assess(input, Action::Preview);

    for notice in &interaction.notices {
        println!("{notice}");
    }

    for (name, label) in input.selections() {
        println!("{name:<10} {label}");
    }
    println!();

    println!("{:<10} {:>10} {:>10}", "feature", "raw", "scaled");
    for (index, (name, raw)) in FEATURE_NAMES.iter().zip(interaction.features).enumerate() {
        match interaction.scaled.as_ref().and_then(|s| s.get(index)) {
            Some(scaled) => println!("{name:<10} {raw:>10.2} {scaled:>10.4}"),
            None => println!("{name:<10} {raw:>10.2} {:>10}", "-"),
        }
    }

    exit_code(&interaction)
}

fn predict(service: &RiskService, input: &PatientInput) -> anyhow::Result<ExitCode> {
    let interaction = service.assess(input, Action::Predict);
    print!("{}", report::render(&interaction)?);
    Ok(exit_code(&interaction))
}

fn batch(service: &RiskService, path: &Path) -> anyhow::Result<ExitCode> {
    let records = parse::parse(path).with_context(|| format!("reading {}", path.display()))?;
    info!("scoring {} record(s) from {}", records.len(), path.display());

    let results = service.score_records(&records);

    let mut failures = 0;
    for (index, result) in results.iter().enumerate() {
        let row = index + 1;
        match result {
            Ok(assessment) => println!(
                "row {row}: {} ({:.2}%)",
                assessment.level.label(),
                assessment.probability * 100.0
            ),
            Err(err) => {
                failures += 1;
                println!("row {row}: error: {err}");
            }
        }
    }

    if let Some(accuracy) = accuracy(&records, &results) {
        println!("accuracy: {accuracy:.3}%");
    }

    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::resolve(cli.model, cli.scaler);
    let service = RiskService::load(&config).context("loading model artifacts")?;

    match cli.command {
        Command::Encode(args) => Ok(encode(&service, &read_form(args)?)),
        Command::Predict(args) => predict(&service, &read_form(args)?),
        Command::Batch { path } => batch(&service, &path),
    }
}
