// config.rs
// CLI flags layered over PROJGRAPH_* env vars (.env is loaded first)

use crate::error::{PipelineError, Result};
use crate::graph::GroupBy;
use crate::pipeline::layout::{LayoutConfig, DEFAULT_ITERATIONS, DEFAULT_SEED};
use crate::pipeline::PipelineConfig;
use chrono::NaiveDateTime;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Format of `--now` / `PROJGRAPH_NOW`.
pub const NOW_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Build people x projects graph documents from a project snapshot
#[derive(Parser, Debug, Clone)]
#[command(name = "projgraph", version)]
#[command(about = "Build people x projects graph documents from a project snapshot")]
pub struct Cli {
    /// Project records JSON file, or `-` for stdin
    #[arg(long, short = 'i', env = "PROJGRAPH_INPUT")]
    pub input: String,

    /// Interests JSON file (label -> interests)
    #[arg(long, env = "PROJGRAPH_INTERESTS")]
    pub interests: Option<PathBuf>,

    /// Directory the documents are written to
    #[arg(long, short = 'o', env = "PROJGRAPH_OUTPUT_DIR", default_value = "output")]
    pub output_dir: PathBuf,

    /// File name prefix: `<prefix>_<group>_graph.json`
    #[arg(long, env = "PROJGRAPH_OUTPUT_PREFIX", default_value = "miem")]
    pub output_prefix: String,

    /// Groupings to build, comma separated (id, typeDesc, projectIndustryLabel)
    #[arg(
        long,
        short = 'g',
        env = "PROJGRAPH_GROUP_BY",
        value_delimiter = ',',
        default_value = "projectIndustryLabel"
    )]
    pub group_by: Vec<String>,

    /// Fixed reference time, e.g. 2024-01-11T12:00:00 (defaults to now)
    #[arg(long, env = "PROJGRAPH_NOW")]
    pub now: Option<String>,

    /// Layout iterations
    #[arg(long, env = "PROJGRAPH_ITERATIONS", default_value_t = DEFAULT_ITERATIONS)]
    pub iterations: usize,

    /// Layout seed
    #[arg(long, env = "PROJGRAPH_SEED", default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Give up after this many seconds; nothing is written on timeout
    #[arg(long, env = "PROJGRAPH_DEADLINE_SECS")]
    pub deadline_secs: Option<u64>,

    /// Emit JSON log lines
    #[arg(long, env = "PROJGRAPH_LOG_JSON")]
    pub log_json: bool,
}

/// Validated run configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub input: String,
    pub interests: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub output_prefix: String,
    pub groupings: Vec<GroupBy>,
    pub pipeline: PipelineConfig,
    pub deadline: Option<Duration>,
    pub log_json: bool,
}

impl AppConfig {
    /// `<output_dir>/<prefix>_<group>_graph.json`
    pub fn output_path(&self, group_by: GroupBy) -> PathBuf {
        output_path(&self.output_dir, &self.output_prefix, group_by)
    }
}

pub fn output_path(dir: &Path, prefix: &str, group_by: GroupBy) -> PathBuf {
    dir.join(format!("{prefix}_{group_by}_graph.json"))
}

impl TryFrom<Cli> for AppConfig {
    type Error = PipelineError;

    fn try_from(cli: Cli) -> Result<Self> {
        let mut groupings = Vec::new();
        for raw in cli.group_by.iter().filter(|g| !g.trim().is_empty()) {
            let group_by: GroupBy = raw.parse().map_err(PipelineError::InvalidConfig)?;
            if !groupings.contains(&group_by) {
                groupings.push(group_by);
            }
        }
        let Some(&first) = groupings.first() else {
            return Err(PipelineError::InvalidConfig("no grouping selected".into()));
        };

        let now = cli
            .now
            .as_deref()
            .map(|raw| {
                NaiveDateTime::parse_from_str(raw, NOW_FORMAT).map_err(|e| {
                    PipelineError::InvalidConfig(format!("now {raw:?} does not match {NOW_FORMAT}: {e}"))
                })
            })
            .transpose()?;

        if cli.output_prefix.contains(&['/', '\\'][..]) {
            return Err(PipelineError::InvalidConfig(format!(
                "output prefix {:?} must not contain path separators",
                cli.output_prefix
            )));
        }

        Ok(Self {
            input: cli.input,
            interests: cli.interests,
            output_dir: cli.output_dir,
            output_prefix: cli.output_prefix,
            groupings,
            pipeline: PipelineConfig {
                group_by: first,
                layout: LayoutConfig {
                    iterations: cli.iterations,
                    seed: cli.seed,
                    start_temperature: None,
                },
                now,
            },
            deadline: cli.deadline_secs.map(Duration::from_secs),
            log_json: cli.log_json,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Result<AppConfig> {
        let mut argv = vec!["projgraph"];
        argv.extend_from_slice(args);
        AppConfig::try_from(Cli::try_parse_from(argv).unwrap())
    }

    #[test]
    fn defaults() {
        let config = parse(&["--input", "projects.json"]).unwrap();
        assert_eq!(config.groupings, vec![GroupBy::IndustryLabel]);
        assert_eq!(config.pipeline.layout, LayoutConfig::default());
        assert_eq!(config.pipeline.now, None);
        assert_eq!(config.deadline, None);
        assert_eq!(
            config.output_path(GroupBy::IndustryLabel),
            PathBuf::from("output/miem_projectIndustryLabel_graph.json")
        );
    }

    #[test]
    fn several_groupings_are_deduplicated_in_order() {
        let config = parse(&["-i", "-", "--group-by", "typeDesc,id,type"]).unwrap();
        assert_eq!(config.groupings, vec![GroupBy::TypeDescription, GroupBy::ProjectId]);
        assert_eq!(config.pipeline.group_by, GroupBy::TypeDescription);
    }

    #[test]
    fn fixed_clock_and_layout_overrides() {
        let config = parse(&[
            "-i",
            "p.json",
            "--now",
            "2024-01-11T12:00:00",
            "--iterations",
            "50",
            "--seed",
            "3",
            "--deadline-secs",
            "30",
        ])
        .unwrap();
        assert_eq!(
            config.pipeline.now,
            NaiveDate::from_ymd_opt(2024, 1, 11).and_then(|d| d.and_hms_opt(12, 0, 0))
        );
        assert_eq!(config.pipeline.layout.iterations, 50);
        assert_eq!(config.pipeline.layout.seed, 3);
        assert_eq!(config.deadline, Some(Duration::from_secs(30)));
    }

    #[test]
    fn bad_values_are_config_errors() {
        let cases: [&[&str]; 3] = [
            &["-i", "p.json", "--group-by", "colour"],
            &["-i", "p.json", "--now", "11.01.2024"],
            &["-i", "p.json", "--output-prefix", "../up"],
        ];
        for args in cases {
            let err = parse(args).unwrap_err();
            assert!(matches!(err, PipelineError::InvalidConfig(_)), "{err}");
        }
    }
}
