//! Parser for progress marker lines emitted by the external letter scripts.
//!
//! The generator and merger processes write free-text log lines instrumented
//! with ad-hoc markers (`[PROGRESS]`, `[STAGE]`, emoji-tagged status lines).
//! [`parse_line`] translates one line into a bounded progress update, or
//! `None` when the line carries no progress information. It never fails:
//! malformed input is simply not a progress marker.
//!
//! The patterns form an ordered decision list; the first match wins. A line
//! that is a single JSON object with a numeric `progress` field is accepted
//! ahead of the text patterns, so instrumented scripts can migrate to a
//! structured protocol without a server change.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde_json::{json, Value};

/// One parsed progress update.
///
/// `progress == None` means "do not move the progress bar" — the line still
/// carries details (per-record success/skip markers feed statistics only).
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub progress: Option<u8>,
    pub message: Option<String>,
    pub details: Value,
}

static ROW_PROGRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[PROGRESS\]\s+Processing row (\d+) of (\d+) \((\d+\.?\d*)%\)")
        .expect("row progress regex")
});

static STAGE_START: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"\[STAGE\]\s+Starting (\w+) letters? processing")
        .case_insensitive(true)
        .build()
        .expect("stage start regex")
});

static CATEGORY_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"📋 Processing (.+): (\d+) records").expect("category regex"));

static TOTAL_RECORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"📊 Total records to process: (\d+)").expect("total regex"));

static EXECUTING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"🔄 Executing (\w+\.py)").expect("executing regex"));

static SCRIPT_DONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"✅ (\w+\.py) completed successfully").expect("done regex"));

static LETTERS_GENERATED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Letters generated: (\d+)").expect("generated regex"));

static RECORD_SUCCESS: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"✅.*generated")
        .case_insensitive(true)
        .build()
        .expect("record success regex")
});

static RECORD_SKIP: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"⚠️.*skipp")
        .case_insensitive(true)
        .build()
        .expect("record skip regex")
});

/// Clamp a reported row percentage into the band reserved for row progress.
///
/// Values below 15 would make the bar jump backwards past the setup markers;
/// values above 90 would collide with the completion band.
fn clamp_row_percent(pct: f64) -> u8 {
    pct.clamp(15.0, 90.0).round() as u8
}

/// Parse one output line into a progress update.
pub fn parse_line(line: &str) -> Option<ProgressUpdate> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    // Structured protocol: one JSON object per line with a numeric progress.
    if trimmed.starts_with('{') {
        if let Some(update) = parse_json_line(trimmed) {
            return Some(update);
        }
    }

    if let Some(caps) = ROW_PROGRESS.captures(trimmed) {
        let current: u64 = caps[1].parse().ok()?;
        let total: u64 = caps[2].parse().ok()?;
        let percentage: f64 = caps[3].parse().ok()?;
        return Some(ProgressUpdate {
            progress: Some(clamp_row_percent(percentage)),
            message: Some(format!(
                "Processing {current}/{total} records ({}%)",
                &caps[3]
            )),
            details: json!({
                "current": current,
                "total": total,
                "percentage": percentage,
            }),
        });
    }

    if let Some(caps) = STAGE_START.captures(trimmed) {
        let stage = &caps[1];
        return Some(ProgressUpdate {
            progress: Some(20),
            message: Some(format!("Starting {stage} letters processing...")),
            details: json!({ "stage": stage }),
        });
    }

    if let Some(caps) = CATEGORY_COUNT.captures(trimmed) {
        let stage = &caps[1];
        let count: u64 = caps[2].parse().ok()?;
        return Some(ProgressUpdate {
            progress: Some(25),
            message: Some(format!("Processing {stage}: {count} records")),
            details: json!({ "stage": stage, "count": count }),
        });
    }

    if let Some(caps) = TOTAL_RECORDS.captures(trimmed) {
        let total: u64 = caps[1].parse().ok()?;
        return Some(ProgressUpdate {
            progress: Some(12),
            message: Some(format!("Found {total} total records to process")),
            details: json!({ "totalRecords": total }),
        });
    }

    if let Some(caps) = EXECUTING.captures(trimmed) {
        let script = &caps[1];
        return Some(ProgressUpdate {
            progress: Some(30),
            message: Some(format!("Executing {script}...")),
            details: json!({ "script": script }),
        });
    }

    if let Some(caps) = SCRIPT_DONE.captures(trimmed) {
        let script = &caps[1];
        return Some(ProgressUpdate {
            progress: Some(80),
            message: Some(format!("{script} completed successfully")),
            details: json!({ "script": script, "status": "completed" }),
        });
    }

    if let Some(caps) = LETTERS_GENERATED.captures(trimmed) {
        let count: u64 = caps[1].parse().ok()?;
        return Some(ProgressUpdate {
            progress: Some(85),
            message: Some(format!("Generated {count} letters")),
            details: json!({ "generated": count }),
        });
    }

    // Per-record markers feed statistics only; they never move the bar.
    let record_type = if RECORD_SUCCESS.is_match(trimmed) {
        Some("success")
    } else if RECORD_SKIP.is_match(trimmed) {
        Some("skip")
    } else {
        None
    };
    if let Some(kind) = record_type {
        return Some(ProgressUpdate {
            progress: None,
            message: None,
            details: json!({ "type": kind, "message": trimmed }),
        });
    }

    None
}

/// Accept a structured `{"progress": N, ...}` line.
fn parse_json_line(trimmed: &str) -> Option<ProgressUpdate> {
    let value: Value = serde_json::from_str(trimmed).ok()?;
    let obj = value.as_object()?;
    let progress = obj.get("progress")?.as_f64()?;
    Some(ProgressUpdate {
        progress: Some(progress.clamp(0.0, 100.0).round() as u8),
        message: obj
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_owned),
        details: obj.get("details").cloned().unwrap_or(Value::Null),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn row_line(pct: &str) -> String {
        format!("[PROGRESS] Processing row 3 of 10 ({pct}%)")
    }

    #[test]
    fn row_progress_clamps_to_band() {
        for (reported, expected) in [("0", 15), ("15", 15), ("50", 50), ("90", 90), ("100", 90)] {
            let update = parse_line(&row_line(reported)).unwrap();
            assert_eq!(update.progress, Some(expected), "reported {reported}%");
        }
    }

    #[test]
    fn row_progress_carries_counts() {
        let update = parse_line("[PROGRESS] Processing row 42 of 120 (35.0%)").unwrap();
        assert_eq!(update.progress, Some(35));
        assert_eq!(
            update.message.as_deref(),
            Some("Processing 42/120 records (35.0%)")
        );
        assert_eq!(update.details["current"], 42);
        assert_eq!(update.details["total"], 120);
    }

    #[test]
    fn stage_start_is_case_insensitive() {
        let update = parse_line("[STAGE] starting MED letter processing").unwrap();
        assert_eq!(update.progress, Some(20));
        assert_eq!(update.details["stage"], "MED");
    }

    #[test]
    fn setup_markers_report_fixed_progress() {
        let update = parse_line("📋 Processing L1: 37 records").unwrap();
        assert_eq!(update.progress, Some(25));
        assert_eq!(update.details["count"], 37);

        let update = parse_line("📊 Total records to process: 204").unwrap();
        assert_eq!(update.progress, Some(12));
        assert_eq!(update.details["totalRecords"], 204);

        let update = parse_line("🔄 Executing L2.py...").unwrap();
        assert_eq!(update.progress, Some(30));
        assert_eq!(update.details["script"], "L2.py");

        let update = parse_line("✅ L2.py completed successfully").unwrap();
        assert_eq!(update.progress, Some(80));
        assert_eq!(update.details["status"], "completed");

        let update = parse_line("Letters generated: 198").unwrap();
        assert_eq!(update.progress, Some(85));
        assert_eq!(update.details["generated"], 198);
    }

    #[test]
    fn record_markers_do_not_move_the_bar() {
        let update = parse_line("✅ Letter generated for POL-1234").unwrap();
        assert_eq!(update.progress, None);
        assert_eq!(update.details["type"], "success");

        let update = parse_line("⚠️ Row 18 skipped: missing address").unwrap();
        assert_eq!(update.progress, None);
        assert_eq!(update.details["type"], "skip");
        assert!(update.details["message"]
            .as_str()
            .unwrap()
            .contains("skipped"));
    }

    #[test]
    fn json_lines_are_accepted_and_clamped() {
        let update =
            parse_line(r#"{"progress": 140, "message": "merging", "details": {"file": 3}}"#)
                .unwrap();
        assert_eq!(update.progress, Some(100));
        assert_eq!(update.message.as_deref(), Some("merging"));
        assert_eq!(update.details["file"], 3);

        // JSON without a numeric progress falls through to "not a marker".
        assert_eq!(parse_line(r#"{"note": "hello"}"#), None);
    }

    #[test]
    fn unrecognised_lines_yield_none_without_panicking() {
        let junk = [
            "",
            "   ",
            "plain log output",
            "Processing row 3 of 10",
            "[PROGRESS] Processing row x of y (z%)",
            "🚀 NICL Recovery Action Processor Started",
            "{not json",
            "\u{0000}\u{0007}control\u{001b}[0m",
            "🎉🎉🎉",
            "=============",
        ];
        for line in junk {
            assert_eq!(parse_line(line), None, "line {line:?}");
        }
    }
}
