use super::render_header;
use crate::monitor::{MonitorAction, MonitorStatus};

pub fn render_monitor(status: &MonitorStatus) -> String {
    let mut out = render_header("🎛️ ", "Sampling Monitor");
    let line = match (status.action, status.mode) {
        (MonitorAction::Started, Some(mode)) => format!("Started {} monitor", mode),
        (MonitorAction::Stopped, Some(mode)) => format!("Stopped {} monitor", mode),
        (MonitorAction::Reset, _) => "Discarded all samples".to_string(),
        (_, None) => "No change".to_string(),
    };
    out.push_str(&line);
    out.push('\n');

    let running: Vec<&str> = status.running.iter().map(|m| m.as_str()).collect();
    if running.is_empty() {
        out.push_str("Running: none\n");
    } else {
        out.push_str(&format!("Running: {}\n", running.join(", ")));
    }
    out
}
