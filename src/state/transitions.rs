//! Human- and machine-readable description of the transition table.
//!
//! The driver does not read this; `updata graph` renders it, and the scenario
//! tests check every transition the driver takes against it.

use std::fmt::Write;

/// One row of the state table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionDoc {
    pub from: &'static str,
    pub action: &'static str,
    /// Next state or exit on success, `None` when the action cannot fail.
    pub on_success: Option<&'static str>,
    pub on_failure: Option<&'static str>,
}

const fn row(
    from: &'static str,
    action: &'static str,
    on_success: Option<&'static str>,
    on_failure: Option<&'static str>,
) -> TransitionDoc {
    TransitionDoc {
        from,
        action,
        on_success,
        on_failure,
    }
}

pub const TRANSITIONS: &[TransitionDoc] = &[
    row("init", "mark attempt started", Some("U"), None),
    row(
        "U",
        "run executor in install-only mode, stderr into install-failure",
        Some("US"),
        Some("UF"),
    ),
    row(
        "U",
        "retry failed: flag install-failure-repeated and sync, then record exit code",
        None,
        Some("RF"),
    ),
    row("R", "log resuming to retry, clear reboot markers", Some("U"), None),
    row("US", "mark reboot-phase-started", Some("UR"), None),
    row(
        "UR",
        "run executor in reboot-only mode, stderr into reboot-stderr-capture",
        Some("exit 0"),
        Some("URF"),
    ),
    row("C", "mark update-finished", Some("exit 0"), None),
    row("URF", "log reboot failure", None, Some("exit 20/21")),
    row("UF", "log install failure, mark reboot-phase-started", Some("FR"), None),
    row("RF", "log install failure, give up", None, Some("exit 11/12")),
    row(
        "FR",
        "run executor in reboot-only mode; on failure mark reboot-failure, then install-failure-repeated",
        Some("exit 0"),
        Some("FRF"),
    ),
    row(
        "FRF",
        "mark install-failure-repeated, log reboot failure",
        None,
        Some("exit 20/21"),
    ),
    row("done", "nothing", Some("exit 0"), None),
    row("BadState", "log bad state", None, Some("exit 7")),
];

/// Whether the table documents a live transition from one state to another.
pub fn documents(from: &str, to: &str) -> bool {
    TRANSITIONS
        .iter()
        .any(|t| t.from == from && (t.on_success == Some(to) || t.on_failure == Some(to)))
}

/// Graphviz rendering of the table.
pub fn render_dot() -> String {
    let mut out = String::from("digraph update {\n    rankdir=LR;\n");
    for t in TRANSITIONS {
        if let Some(to) = t.on_success {
            let _ = writeln!(out, "    \"{}\" -> \"{}\" [label=\"ok\"];", t.from, to);
        }
        if let Some(to) = t.on_failure {
            let _ = writeln!(
                out,
                "    \"{}\" -> \"{}\" [label=\"fail\", style=dashed];",
                t.from, to
            );
        }
    }
    for (state, entry) in [("C", "UR"), ("R", "FR")] {
        let _ = writeln!(
            out,
            "    \"{entry}\" -> \"{state}\" [label=\"after restart\", style=dotted];"
        );
    }
    out.push_str("}\n");
    out
}

/// Markdown state table.
pub fn render_markdown() -> String {
    let mut out = String::from("| State | Action | On success | On failure |\n|---|---|---|---|\n");
    for t in TRANSITIONS {
        let _ = writeln!(
            out,
            "| `{}` | {} | {} | {} |",
            t.from,
            t.action,
            t.on_success.unwrap_or("-"),
            t.on_failure.unwrap_or("-")
        );
    }
    out
}
