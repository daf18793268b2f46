//! Parsed diagnostics requests.

use serde::Serialize;
use std::str::FromStr;

use super::CommandError;
use crate::monitor::MonitorMode;
use crate::utils::config::MAX_RANKING_K;

/// One diagnostics request with its optional arguments still unresolved.
///
/// `None` means "use the configured default"; defaults are applied at
/// execution time so the same request works under any config.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    RankByAverage(RankArgs),
    RankByLongest(RankArgs),
    RankByLoad {
        category: String,
        k: Option<usize>,
    },
    AnalyzeSchedulingSpread {
        horizon_secs: Option<f64>,
        bucket_width_secs: Option<f64>,
        sync_threshold_secs: Option<f64>,
    },
    BaselineSet,
    BaselineCompare,
    LeakCheck,
    MemoryStats,
    Collect {
        generation: Option<u32>,
    },
    StartMonitor(MonitorMode),
    StopMonitor(MonitorMode),
    ResetMonitor,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RankArgs {
    pub min_events_five_minutes: Option<u64>,
    pub min_events_one_hour: Option<u64>,
    pub k: Option<usize>,
}

/// Usage line of one operation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CommandUsage {
    pub name: &'static str,
    pub args: &'static str,
    pub summary: &'static str,
}

pub const COMMANDS: &[CommandUsage] = &[
    CommandUsage {
        name: "rank-by-average",
        args: "[min_events_5m] [min_events_1h] [k=10]",
        summary: "Entities with the highest average event duration",
    },
    CommandUsage {
        name: "rank-by-longest",
        args: "[min_events_5m] [min_events_1h] [k=10]",
        summary: "Entities with the longest single event",
    },
    CommandUsage {
        name: "rank-by-load",
        args: "<category> [k=5]",
        summary: "Entities with the most members in a category, with admission delay",
    },
    CommandUsage {
        name: "analyze-scheduling-spread",
        args: "[horizon=1.0] [bucket_width=0.05] [sync_threshold=0.1]",
        summary: "Histogram of time until each entity's next tick",
    },
    CommandUsage {
        name: "baseline-set",
        args: "",
        summary: "Force a full collection and record live memory for this session",
    },
    CommandUsage {
        name: "baseline-compare",
        args: "",
        summary: "Memory growth since this session's baseline",
    },
    CommandUsage {
        name: "leak-check",
        args: "",
        summary: "Force a full collection and report retained memory and counters",
    },
    CommandUsage {
        name: "memory-stats",
        args: "",
        summary: "Process and heap statistics",
    },
    CommandUsage {
        name: "collect",
        args: "[generation]",
        summary: "Run one blocking collection",
    },
    CommandUsage {
        name: "start-monitor",
        args: "<normal|cumulative>",
        summary: "Start the sampling monitor",
    },
    CommandUsage {
        name: "stop-monitor",
        args: "<normal|cumulative>",
        summary: "Stop the sampling monitor",
    },
    CommandUsage {
        name: "reset-monitor",
        args: "",
        summary: "Discard all monitor samples",
    },
    CommandUsage {
        name: "help",
        args: "",
        summary: "List operations",
    },
];

impl Command {
    /// Parse an operation name and its string arguments
    ///
    /// **Public** - used by the dispatcher and the CLI
    ///
    /// # Errors
    /// * `CommandError::UnknownCommand` - Operation name not recognised
    /// * `CommandError::MissingArgument` / `TooManyArguments` - Wrong arity
    /// * `CommandError::InvalidArgument` - A value does not parse or is out of range
    pub fn parse(op: &str, args: &[&str]) -> Result<Self, CommandError> {
        let op = op.to_ascii_lowercase();
        let command = match op.as_str() {
            "rank-by-average" => Command::RankByAverage(parse_rank_args("rank-by-average", args)?),
            "rank-by-longest" => Command::RankByLongest(parse_rank_args("rank-by-longest", args)?),
            "rank-by-load" => {
                max_args("rank-by-load", args, 2)?;
                let category = args.first().ok_or(CommandError::MissingArgument {
                    command: "rank-by-load",
                    arg: "category",
                })?;
                Command::RankByLoad {
                    category: category.to_string(),
                    k: args.get(1).map(|v| parse_k(v)).transpose()?,
                }
            }
            "analyze-scheduling-spread" => {
                max_args("analyze-scheduling-spread", args, 3)?;
                Command::AnalyzeSchedulingSpread {
                    horizon_secs: opt_seconds("horizon", args.first())?,
                    bucket_width_secs: opt_seconds("bucket_width", args.get(1))?,
                    sync_threshold_secs: opt_seconds("sync_threshold", args.get(2))?,
                }
            }
            "baseline-set" => no_args("baseline-set", args, Command::BaselineSet)?,
            "baseline-compare" => no_args("baseline-compare", args, Command::BaselineCompare)?,
            "leak-check" => no_args("leak-check", args, Command::LeakCheck)?,
            "memory-stats" => no_args("memory-stats", args, Command::MemoryStats)?,
            "collect" => {
                max_args("collect", args, 1)?;
                Command::Collect {
                    generation: args
                        .first()
                        .map(|v| parse_number::<u32>("generation", v))
                        .transpose()?,
                }
            }
            "start-monitor" => Command::StartMonitor(parse_mode("start-monitor", args)?),
            "stop-monitor" => Command::StopMonitor(parse_mode("stop-monitor", args)?),
            "reset-monitor" => no_args("reset-monitor", args, Command::ResetMonitor)?,
            "help" => no_args("help", args, Command::Help)?,
            _ => return Err(CommandError::UnknownCommand(op)),
        };
        Ok(command)
    }
}

fn parse_rank_args(command: &'static str, args: &[&str]) -> Result<RankArgs, CommandError> {
    max_args(command, args, 3)?;
    Ok(RankArgs {
        min_events_five_minutes: args
            .first()
            .map(|v| parse_number::<u64>("min_events_5m", v))
            .transpose()?,
        min_events_one_hour: args
            .get(1)
            .map(|v| parse_number::<u64>("min_events_1h", v))
            .transpose()?,
        k: args.get(2).map(|v| parse_k(v)).transpose()?,
    })
}

fn parse_mode(command: &'static str, args: &[&str]) -> Result<MonitorMode, CommandError> {
    max_args(command, args, 1)?;
    let mode = args.first().ok_or(CommandError::MissingArgument {
        command,
        arg: "normal|cumulative",
    })?;
    Ok(mode.parse()?)
}

fn no_args(command: &'static str, args: &[&str], parsed: Command) -> Result<Command, CommandError> {
    max_args(command, args, 0)?;
    Ok(parsed)
}

fn max_args(command: &'static str, args: &[&str], max: usize) -> Result<(), CommandError> {
    if args.len() > max {
        return Err(CommandError::TooManyArguments { command, max });
    }
    Ok(())
}

fn parse_number<T>(name: &'static str, value: &str) -> Result<T, CommandError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| CommandError::InvalidArgument {
        name,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Result count, `1..=MAX_RANKING_K`
fn parse_k(value: &str) -> Result<usize, CommandError> {
    let k: usize = parse_number("k", value)?;
    if k == 0 || k > MAX_RANKING_K {
        return Err(CommandError::InvalidArgument {
            name: "k",
            value: value.to_string(),
            reason: format!("must be between 1 and {}", MAX_RANKING_K),
        });
    }
    Ok(k)
}

fn opt_seconds(name: &'static str, value: Option<&&str>) -> Result<Option<f64>, CommandError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let secs: f64 = parse_number(name, value)?;
    if !secs.is_finite() {
        return Err(CommandError::InvalidArgument {
            name,
            value: value.to_string(),
            reason: "must be a finite number of seconds".to_string(),
        });
    }
    Ok(Some(secs))
}
