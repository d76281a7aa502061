use std::path::Path;

use tracing_subscriber::EnvFilter;

use running_order::display::{print_outcome, render_conflicts, write_outcome_to_file};
use running_order::parser::{load_activities, TableOptions};
use running_order::schedule::{plan, ActivityIndex, FixedPosition, Section, Strategy};
use running_order::{web, ScheduleError, SolverConfig};

const DEFAULT_CONFIG_PATH: &str = "solver.toml";

const USAGE: &str = "\
usage:
  running-order web [port]
  running-order <activities.csv> [--start NAME] [--end NAME] [--fix NAME=POSITION]...
                [--prefer Start|Middle|End=NAME]... [--exhaustive | --auto] [--allow-large]
                [--seed N] [--config FILE] [--output FILE]";

#[derive(Debug, Default)]
struct CliOptions {
    csv_path: String,
    start: Option<String>,
    end: Option<String>,
    fixed: Vec<(String, usize)>,
    preferred: Vec<(Section, String)>,
    strategy: Strategy,
    allow_large: bool,
    seed: Option<u64>,
    config_path: Option<String>,
    output: Option<String>,
}

fn parse_section(name: &str) -> Option<Section> {
    Section::ALL
        .into_iter()
        .find(|s| s.to_string().eq_ignore_ascii_case(name.trim()))
}

fn parse_cli(args: &[String]) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("{} needs a value", flag))
        };
        match arg.as_str() {
            "--start" => options.start = Some(value("--start")?),
            "--end" => options.end = Some(value("--end")?),
            "--fix" => {
                let raw = value("--fix")?;
                let (name, position) = raw
                    .rsplit_once('=')
                    .ok_or_else(|| format!("--fix expects NAME=POSITION, got '{}'", raw))?;
                let position = position
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid position in '{}'", raw))?;
                options.fixed.push((name.to_string(), position));
            }
            "--prefer" => {
                let raw = value("--prefer")?;
                let (section, name) = raw
                    .split_once('=')
                    .ok_or_else(|| format!("--prefer expects SECTION=NAME, got '{}'", raw))?;
                let section =
                    parse_section(section).ok_or_else(|| format!("unknown section '{}'", section))?;
                options.preferred.push((section, name.to_string()));
            }
            "--exhaustive" => options.strategy = Strategy::Exhaustive,
            "--auto" => options.strategy = Strategy::Auto,
            "--allow-large" => options.allow_large = true,
            "--seed" => {
                let seed = value("--seed")?;
                options.seed = Some(seed.parse().map_err(|_| format!("invalid seed '{}'", seed))?);
            }
            "--config" => options.config_path = Some(value("--config")?),
            "--output" => options.output = Some(value("--output")?),
            other if other.starts_with("--") => return Err(format!("unknown option '{}'", other)),
            path if options.csv_path.is_empty() => options.csv_path = path.to_string(),
            extra => return Err(format!("unexpected argument '{}'", extra)),
        }
    }
    if options.csv_path.is_empty() {
        return Err("missing CSV path".to_string());
    }
    Ok(options)
}

fn load_config(path: Option<&str>) -> Result<SolverConfig, ScheduleError> {
    match path {
        Some(path) => Ok(SolverConfig::load(path)?),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            Ok(SolverConfig::load(DEFAULT_CONFIG_PATH)?)
        }
        None => Ok(SolverConfig::default()),
    }
}

/// Matches a name typed on the command line against the table, ignoring case.
fn canonical(index: &ActivityIndex, name: &str) -> Result<String, ScheduleError> {
    index.find_ignore_case(name).map(str::to_string).ok_or_else(|| {
        ScheduleError::Configuration(format!("'{}' is not in the list of activities", name))
    })
}

fn run_cli(options: CliOptions) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(options.config_path.as_deref())?;
    if let Some(seed) = options.seed {
        config = config.with_random_seed(seed);
    }

    println!("Loading activities from {}...", options.csv_path);
    let table = load_activities(&options.csv_path, &TableOptions::default())?;
    println!("Loaded {} activities", table.len());
    for activity in &table.activities {
        println!("- {}", activity);
    }

    let index = ActivityIndex::new(&table.activities, &table.participants)?;
    print!("\n{}", render_conflicts(&index));
    let mut request = table.into_request();
    request.strategy = options.strategy;
    request.allow_large_exhaustive = options.allow_large;
    if let Some(name) = &options.start {
        request.constraints.start_activity = Some(canonical(&index, name)?);
    }
    if let Some(name) = &options.end {
        request.constraints.end_activity = Some(canonical(&index, name)?);
    }
    for (name, position) in &options.fixed {
        request
            .constraints
            .fixed_positions
            .push(FixedPosition::new(canonical(&index, name)?, *position));
    }
    for (section, name) in &options.preferred {
        let name = canonical(&index, name)?;
        let prefs = &mut request.constraints.preferences;
        match section {
            Section::Start => prefs.start.push(name),
            Section::Middle => prefs.middle.push(name),
            Section::End => prefs.end.push(name),
        }
    }

    let outcome = match plan(&request, &config) {
        Err(err @ ScheduleError::ExhaustionBudgetExceeded { .. }) => {
            eprintln!(
                "Re-run with --allow-large to search anyway, \
                 or use --auto to fall back to annealing."
            );
            return Err(err.into());
        }
        other => other?,
    };

    print_outcome(&outcome);
    if let Some(output) = &options.output {
        write_outcome_to_file(&outcome, output)?;
        println!("\nReport saved to {}", output);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.first().map(String::as_str) == Some("web") {
        let port = args
            .get(1)
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(8080);
        let config = load_config(std::env::var("RUNNING_ORDER_CONFIG").ok().as_deref())?;
        println!("Access the scheduler at http://localhost:{}", port);
        web::start_server(port, config).await?;
        return Ok(());
    }

    let options = match parse_cli(&args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{}\n{}", message, USAGE);
            std::process::exit(2);
        }
    };

    // Exhaustive search can run for a long time; keep it off the async runtime.
    tokio::task::spawn_blocking(move || run_cli(options).map_err(|e| e.to_string()))
        .await?
        .map_err(Into::into)
}
