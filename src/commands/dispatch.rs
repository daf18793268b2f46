//! Request execution and one-message responses.

use log::debug;
use serde::Serialize;

use super::models::{Command, CommandUsage, RankArgs, COMMANDS};
use super::utils::render_help;
use super::CommandError;
use crate::config::RankingConfig;
use crate::engine::{
    BaselineSetReport, DiagnosticsEngine, LoadReport, RankingReport, SpreadReport,
};
use crate::memory::{
    CollectionReport, GrowthComparison, LeakCheckReport, MemoryStatsReport, SessionId,
};
use crate::monitor::MonitorStatus;
use crate::ranking::RankMetric;
use crate::report;
use crate::spread::SpreadParams;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HelpReport {
    pub commands: Vec<CommandUsage>,
}

/// Result of one successful request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "report", rename_all = "snake_case")]
pub enum CommandOutput {
    Ranking(RankingReport),
    Load(LoadReport),
    Spread(SpreadReport),
    BaselineSet(BaselineSetReport),
    Comparison(GrowthComparison),
    LeakCheck(LeakCheckReport),
    MemoryStats(MemoryStatsReport),
    Collection(CollectionReport),
    Monitor(MonitorStatus),
    Help(HelpReport),
}

impl CommandOutput {
    /// Human-readable text of the report
    pub fn render(&self) -> String {
        match self {
            CommandOutput::Ranking(r) => report::render_ranking(r),
            CommandOutput::Load(r) => report::render_load(r),
            CommandOutput::Spread(r) => report::render_spread(r),
            CommandOutput::BaselineSet(r) => report::render_baseline_set(r),
            CommandOutput::Comparison(r) => report::render_comparison(r),
            CommandOutput::LeakCheck(r) => report::render_leak_check(r),
            CommandOutput::MemoryStats(r) => report::render_memory_stats(r),
            CommandOutput::Collection(r) => report::render_collection(r),
            CommandOutput::Monitor(r) => report::render_monitor(r),
            CommandOutput::Help(_) => render_help(),
        }
    }
}

/// Execute a parsed request against the engine
///
/// **Public** - main entry point for hosts that parse requests themselves
///
/// # Arguments
/// * `engine` - Diagnostics context
/// * `session` - Requesting session; scopes baseline-set and baseline-compare
/// * `command` - Parsed request
///
/// # Errors
/// Any error of the underlying operation, wrapped in `CommandError`
pub fn execute(
    engine: &DiagnosticsEngine,
    session: &SessionId,
    command: &Command,
) -> Result<CommandOutput, CommandError> {
    debug!("Executing {:?} for session {}", command, session);

    let output = match command {
        Command::RankByAverage(args) => rank(engine, RankMetric::Average, args)?,
        Command::RankByLongest(args) => rank(engine, RankMetric::Longest, args)?,
        Command::RankByLoad { category, k } => {
            let k = k.unwrap_or(engine.config().load.default_k);
            CommandOutput::Load(engine.rank_by_load(category, k)?)
        }
        Command::AnalyzeSchedulingSpread {
            horizon_secs,
            bucket_width_secs,
            sync_threshold_secs,
        } => {
            let defaults = engine.config().spread;
            let params = SpreadParams {
                horizon_secs: horizon_secs.unwrap_or(defaults.horizon_secs),
                bucket_width_secs: bucket_width_secs.unwrap_or(defaults.bucket_width_secs),
                sync_threshold_secs: sync_threshold_secs.unwrap_or(defaults.sync_threshold_secs),
            };
            CommandOutput::Spread(engine.scheduling_spread(params)?)
        }
        Command::BaselineSet => CommandOutput::BaselineSet(engine.set_baseline(session)?),
        Command::BaselineCompare => CommandOutput::Comparison(engine.compare(session)?),
        Command::LeakCheck => CommandOutput::LeakCheck(engine.leak_check()?),
        Command::MemoryStats => CommandOutput::MemoryStats(engine.memory_stats()),
        Command::Collect { generation } => CommandOutput::Collection(engine.collect(*generation)?),
        Command::StartMonitor(mode) => CommandOutput::Monitor(engine.monitor().start(*mode)?),
        Command::StopMonitor(mode) => CommandOutput::Monitor(engine.monitor().stop(*mode)?),
        Command::ResetMonitor => CommandOutput::Monitor(engine.monitor().reset()?),
        Command::Help => CommandOutput::Help(HelpReport {
            commands: COMMANDS.to_vec(),
        }),
    };
    Ok(output)
}

fn rank(
    engine: &DiagnosticsEngine,
    metric: RankMetric,
    args: &RankArgs,
) -> Result<CommandOutput, CommandError> {
    let defaults = &engine.config().ranking;
    let ranking = RankingConfig {
        min_events_five_minutes: args
            .min_events_five_minutes
            .unwrap_or(defaults.min_events_five_minutes),
        min_events_one_hour: args
            .min_events_one_hour
            .unwrap_or(defaults.min_events_one_hour),
        default_k: args.k.unwrap_or(defaults.default_k),
    };
    Ok(CommandOutput::Ranking(engine.rank(
        metric,
        ranking.windows(),
        ranking.default_k,
    )?))
}

/// Parse and execute one whitespace-separated request line
pub fn run_line(
    engine: &DiagnosticsEngine,
    session: &SessionId,
    line: &str,
) -> Result<CommandOutput, CommandError> {
    let mut words = line.split_whitespace();
    let op = words.next().ok_or(CommandError::Empty)?;
    let args: Vec<&str> = words.collect();
    let command = Command::parse(op, &args)?;
    execute(engine, session, &command)
}

/// Run one request line and return the single message shown to the caller:
/// the rendered report, or one `error:` line
pub fn respond(engine: &DiagnosticsEngine, session: &SessionId, line: &str) -> String {
    match run_line(engine, session, line) {
        Ok(output) => output.render(),
        Err(e) => format!("error: {}", e),
    }
}
