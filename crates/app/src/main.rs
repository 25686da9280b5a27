use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use chrono::{Days, Months, NaiveDate};
use clap::Parser;
use outlay_import::StatementReader;
use outlay_report::{render, Config, ConfigError, Report, Ruleset};

const CONFIG_FILE_NAME: &str = ".outlay.yaml";

/// Expense report generator for semicolon-delimited bank statement exports.
///
/// Reads a CSV file or stdin, classifies outgoing payments against the
/// configured rules and prints an aggregated report.
#[derive(Parser, Debug)]
#[command(name = "outlay", version, about)]
struct Cli {
    /// Statement CSV to read; stdin when omitted.
    input: Option<PathBuf>,

    /// Config file (default is .outlay.yaml in cwd or home).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Skip payments before given date (YYYY-MM-DD).
    #[arg(long)]
    from_date: Option<NaiveDate>,

    /// Skip payments after given date (YYYY-MM-DD).
    #[arg(long)]
    to_date: Option<NaiveDate>,

    /// Include payments for given month only (YYYY-MM).
    #[arg(short, long, conflicts_with_all = ["from_date", "to_date"])]
    month: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let ruleset = load_config(cli.config.as_deref())?;
    let mut report = Report::new(&ruleset);
    if let Some((from, to)) = date_range(&cli)? {
        report = report.with_from_date(from).with_to_date(to);
    }

    let input = open_input(cli.input.as_deref())?;
    report.scan(StatementReader::new(input)?)?;

    if report.data().count() == 0 {
        eprintln!("Nothing found for given dates.");
        return Ok(());
    }

    let stdout = io::stdout();
    render::write_report(&mut stdout.lock(), report.data())?;
    Ok(())
}

/// An explicit path must load; otherwise the config is searched in the
/// current directory, then in the home directory.
fn load_config(explicit: Option<&Path>) -> anyhow::Result<Ruleset> {
    if let Some(path) = explicit {
        return Ok(Config::load(path)?);
    }

    let mut candidates = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(dirs) = directories::UserDirs::new() {
        candidates.push(dirs.home_dir().join(CONFIG_FILE_NAME));
    }

    for path in &candidates {
        match Config::load(path) {
            Ok(ruleset) => {
                tracing::debug!(path = %path.display(), "loaded config");
                return Ok(ruleset);
            }
            Err(ConfigError::Open { ref source, .. })
                if source.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
    }
    bail!("{CONFIG_FILE_NAME:?} not found")
}

/// Expands `--month` into an inclusive first-to-last-day range; otherwise
/// passes the explicit bounds through.
fn date_range(cli: &Cli) -> anyhow::Result<Option<(NaiveDate, NaiveDate)>> {
    let Some(month) = &cli.month else {
        return Ok(match (cli.from_date, cli.to_date) {
            (None, None) => None,
            (from, to) => Some((
                from.unwrap_or(NaiveDate::MIN),
                to.unwrap_or(NaiveDate::MAX),
            )),
        });
    };

    let first = NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d")
        .with_context(|| format!("bad month {month:?}, expected YYYY-MM"))?;
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|d| d.checked_sub_days(Days::new(1)))
        .ok_or_else(|| anyhow!("month {month:?} out of range"))?;
    Ok(Some((first, last)))
}

fn open_input(path: Option<&Path>) -> anyhow::Result<Box<dyn Read>> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("open statement {:?}", path.display()))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(io::stdin())),
    }
}
