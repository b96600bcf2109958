//! Terminal output: fixed-width dashboard, node table, command menu

use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::io::Write;

use crate::config::{AGENT_SERVICE, RUNTIME_SERVICE, STORAGE_AGENT_SERVICE};
use crate::models::NodeRecord;
use crate::summary::DashboardRow;

/// Where frames are drawn
pub trait Screen: Send {
    fn clear(&mut self);
    fn show(&mut self, text: &str);
}

/// ANSI terminal on stdout
#[derive(Debug, Default)]
pub struct Terminal;

impl Screen for Terminal {
    fn clear(&mut self) {
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(b"\x1B[2J\x1B[1;1H");
        let _ = stdout.flush();
    }

    fn show(&mut self, text: &str) {
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }
}

pub const MENU: [(&str, char); 5] = [
    ("Node List", 'n'),
    ("Save Current PODs", 's'),
    ("View PODs Differences", 'v'),
    ("Check Storage Class", 'c'),
    ("Exit", 'q'),
];

fn row(out: &mut String, cells: [&str; 3]) {
    let _ = writeln!(out, "{:<20} {:<15} {:<15}", cells[0], cells[1], cells[2]);
}

/// Summary table followed by the command menu
pub fn render_dashboard(rows: &[DashboardRow], collected_at: DateTime<Local>) -> String {
    let mut out = String::new();
    row(&mut out, ["Service", "READY", "UP-TO-DATE"]);

    for entry in rows {
        match entry {
            Some([service, ready, up_to_date]) => row(&mut out, [service, ready, up_to_date]),
            None => out.push_str("Error\n"),
        }
    }

    let _ = write!(out, "\nLast refresh: {}\n\n", collected_at.format("%Y-%m-%d %H:%M:%S"));
    out.push_str(&render_menu());
    out
}

pub fn render_menu() -> String {
    let mut out = String::new();
    for (label, key) in MENU {
        let _ = writeln!(out, "{}: {}", label, key);
    }
    out
}

/// Numbered per-node listing
pub fn render_node_table(records: &[NodeRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<5} {:<40} {:<10} {:<10} {:<20} {:<20}",
        "No.", "Node Name", "Status", AGENT_SERVICE, RUNTIME_SERVICE, STORAGE_AGENT_SERVICE
    );

    for (idx, node) in records.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:<5} {:<40} {:<10} {:<10} {:<20} {:<20}",
            idx + 1,
            node.name,
            node.readiness,
            node.agent_state,
            node.runtime_state,
            node.storage_agent_state
        );
    }
    out
}
