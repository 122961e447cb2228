//! Command line front end
//!
//! Commands:
//! - tidyblocks run --program <prog.json> --data <name=path.json>...
//! - tidyblocks check --program <prog.json>
//! - tidyblocks init-config [--force]

use crate::config::{OutputFormat, Settings};
use crate::pipeline::{ChannelSinks, Datasets, Program, Scheduler, SinkMessage};
use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};

/// tidyblocks - run table pipelines over JSON datasets
#[derive(Parser, Debug)]
#[command(name = "tidyblocks")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to settings file (defaults to the platform data directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a program and print everything it displays
    Run {
        /// Path to the program JSON
        #[arg(long)]
        program: PathBuf,

        /// Dataset as name=path.json (a JSON array of records); repeatable
        #[arg(long = "data", value_parser = parse_dataset)]
        data: Vec<DatasetArg>,

        /// Override the output format from settings
        #[arg(long, value_enum)]
        output: Option<OutputFormat>,
    },

    /// Parse a program and list its pipelines
    Check {
        /// Path to the program JSON
        #[arg(long)]
        program: PathBuf,
    },

    /// Write a settings file with default values
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// A `--data name=path` argument
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetArg {
    pub name: String,
    pub path: PathBuf,
}

fn parse_dataset(arg: &str) -> std::result::Result<DatasetArg, String> {
    match arg.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => Ok(DatasetArg {
            name: name.to_string(),
            path: PathBuf::from(path),
        }),
        _ => Err(format!("expected name=path, got '{}'", arg)),
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Settings from `--config`, or from the default location if present.
    ///
    /// An explicit `--config` that can't be read is an error; the default
    /// location silently falls back to defaults.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        match &self.config {
            Some(path) => Ok(Settings::load(path)?),
            None => Ok(Settings::default_path()
                .map(|p| Settings::load_or_default(&p))
                .unwrap_or_default()),
        }
    }
}

/// Execute a parsed command, writing results to `out`.
pub fn execute(cli: &Cli, settings: &Settings, out: &mut dyn Write) -> anyhow::Result<()> {
    match &cli.command {
        Command::Run {
            program,
            data,
            output,
        } => run(program, data, output.unwrap_or(settings.output), settings, out),
        Command::Check { program } => check(program, out),
        Command::InitConfig { force } => {
            let path = match &cli.config {
                Some(path) => path.clone(),
                None => Settings::default_path()
                    .context("Could not determine the settings directory")?,
            };
            init_config(&path, *force, out)
        }
    }
}

fn init_config(path: &Path, force: bool, out: &mut dyn Write) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    Settings::default().save(path)?;
    writeln!(out, "Wrote default settings to {}", path.display())?;
    Ok(())
}

fn read_program(path: &Path) -> anyhow::Result<Program> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read program {}", path.display()))?;
    Program::from_json(&json).with_context(|| format!("Invalid program {}", path.display()))
}

fn run(
    program_path: &Path,
    data: &[DatasetArg],
    format: OutputFormat,
    settings: &Settings,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let mut datasets = Datasets::new();
    for arg in data {
        datasets.load_json_file(&arg.name, &arg.path)?;
    }

    let mut scheduler = Scheduler::from_settings(settings).with_datasets(datasets);
    let (mut sinks, rx) = ChannelSinks::new();
    let result = scheduler.run(|| read_program(program_path).map_err(program_error), &mut sinks);

    // Display whatever ran before a failure, in the order it was shown
    for message in ChannelSinks::drain(&rx) {
        render(&message, format, out)?;
    }

    let report = result?;
    if report.stalled > 0 {
        bail!(
            "{} pipeline(s) never ran because their dependencies were not published",
            report.stalled
        );
    }
    Ok(())
}

fn program_error(err: anyhow::Error) -> crate::error::TidyError {
    crate::error::TidyError::Program(format!("{:#}", err))
}

fn render(message: &SinkMessage, format: OutputFormat, out: &mut dyn Write) -> anyhow::Result<()> {
    match (message, format) {
        (SinkMessage::Table(table), OutputFormat::Json) => {
            writeln!(out, "{}", serde_json::to_string(&table.to_json())?)?
        }
        (SinkMessage::Table(table), OutputFormat::Pretty) => write!(out, "{}", table)?,
        (SinkMessage::Plot(spec), OutputFormat::Json) => {
            writeln!(out, "{}", serde_json::to_string(spec)?)?
        }
        (SinkMessage::Plot(spec), OutputFormat::Pretty) => {
            writeln!(out, "{}", serde_json::to_string_pretty(spec)?)?
        }
        // Errors are returned to the caller and reported once there
        (SinkMessage::Error(_), _) => {}
    }
    Ok(())
}

fn check(program_path: &Path, out: &mut dyn Write) -> anyhow::Result<()> {
    let program = read_program(program_path)?;
    writeln!(out, "{} pipeline(s)", program.len())?;
    for (i, pipeline) in program.pipelines.iter().enumerate() {
        let steps: Vec<&str> = pipeline.steps.iter().map(|s| s.name()).collect();
        let depends = if pipeline.depends_on.is_empty() {
            "-".to_string()
        } else {
            pipeline.depends_on.join(", ")
        };
        let columns = pipeline.columns_read();
        let reads = if columns.is_empty() {
            "-".to_string()
        } else {
            columns.join(", ")
        };
        let target = match pipeline.publishes() {
            Some(name) => format!("publishes {}", name),
            None if pipeline.is_terminated() => "displays".to_string(),
            None => "displays (default)".to_string(),
        };
        writeln!(
            out,
            "  [{}] depends on: {}; steps: {}; reads: {}; {}",
            i,
            depends,
            steps.join(" > "),
            reads,
            target
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    const PROGRAM: &str = r#"{"pipelines": [
        {"steps": [
            {"kind": "load", "dataset": "nums"},
            {"kind": "summarize", "aggregate": "sum", "column": "n"}
        ]}
    ]}"#;

    #[test]
    fn test_parse_dataset() {
        assert_eq!(
            parse_dataset("nums=data/n.json").unwrap(),
            DatasetArg {
                name: "nums".to_string(),
                path: PathBuf::from("data/n.json")
            }
        );
        assert!(parse_dataset("nums").is_err());
        assert!(parse_dataset("=x.json").is_err());
    }

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::try_parse_from([
            "tidyblocks",
            "run",
            "--program",
            "p.json",
            "--data",
            "a=a.json",
            "--data",
            "b=b.json",
            "--output",
            "pretty",
        ])
        .unwrap();
        match cli.command {
            Command::Run { data, output, .. } => {
                assert_eq!(data.len(), 2);
                assert_eq!(output, Some(OutputFormat::Pretty));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_run_prints_displayed_tables() {
        let dir = tempfile::tempdir().unwrap();
        let program = write_file(dir.path(), "p.json", PROGRAM);
        let data = write_file(dir.path(), "n.json", r#"[{"n": 1}, {"n": 2}]"#);

        let mut out = Vec::new();
        run(
            &program,
            &[DatasetArg {
                name: "nums".to_string(),
                path: data,
            }],
            OutputFormat::Json,
            &Settings::default(),
            &mut out,
        )
        .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "[{\"n\":3.0}]\n");
    }

    #[test]
    fn test_run_fails_on_missing_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let program = write_file(dir.path(), "p.json", PROGRAM);

        let mut out = Vec::new();
        let err = run(&program, &[], OutputFormat::Json, &Settings::default(), &mut out)
            .unwrap_err();
        assert!(err.to_string().contains("No dataset named nums"));
        assert!(out.is_empty());
    }

    #[test]
    fn test_init_config_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");

        let mut out = Vec::new();
        init_config(&path, false, &mut out).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), Settings::default());
        assert!(init_config(&path, false, &mut out).is_err());
        init_config(&path, true, &mut out).unwrap();
    }

    #[test]
    fn test_check_lists_pipelines() {
        let dir = tempfile::tempdir().unwrap();
        let program = write_file(dir.path(), "p.json", PROGRAM);

        let mut out = Vec::new();
        check(&program, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("1 pipeline(s)\n"));
        assert!(text.contains("steps: load > summarize; reads: n; displays (default)"));
    }
}
