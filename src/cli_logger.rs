use anyhow::Result;
use qprof::{RunSummary, StatementList};
use serde::Serialize;

pub struct CliLogger {
    json: bool,
    no_color: bool,
}

impl CliLogger {
    pub fn new(json: bool, no_color: bool) -> Self {
        Self { json, no_color }
    }

    pub fn print_serialized<T: Serialize>(&self, value: &T) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(value)?);
            return Ok(());
        }
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    pub fn print_run_summary(&self, summary: &RunSummary) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(summary)?);
            return Ok(());
        }

        let status = if summary.failed == 0 {
            self.style("OK", "32;1")
        } else {
            self.style("PARTIAL", "33;1")
        };

        let mut out = String::new();
        out.push_str(&format!("{} {}\n", self.style("qprof", "36;1"), status));
        out.push_str(&format!("{} {}\n", self.style("run", "90"), summary.run_id));
        out.push_str(&format!(
            "{} {}ms\n",
            self.style("duration", "90"),
            summary.duration_ms
        ));
        out.push_str(&format!(
            "{} total={} profiled={} failed={}\n",
            self.style("statements", "90"),
            summary.statements,
            summary.profiled,
            summary.failed
        ));
        if let Some(path) = &summary.report_path {
            out.push_str(&format!("{} {}\n", self.style("report", "90"), path));
        }

        if !summary.failures.is_empty() {
            out.push_str(&format!("{}\n", self.style("failures", "33;1")));
            for failure in &summary.failures {
                out.push_str(&format!(
                    "  - [{}] {}: {}\n",
                    failure.kind, failure.statement, failure.message
                ));
            }
        }

        println!("{}", out.trim_end());
        Ok(())
    }

    pub fn print_statements(&self, list: &StatementList) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(list)?);
            return Ok(());
        }

        let mut out = String::new();
        out.push_str(&format!(
            "{} {} ({} statements)\n",
            self.style("file", "90"),
            list.path,
            list.count
        ));
        for (idx, statement) in list.statements.iter().enumerate() {
            out.push_str(&format!(
                "{} {statement}\n",
                self.style(&format!("{:>3}.", idx + 1), "37;1")
            ));
        }
        println!("{}", out.trim_end());
        Ok(())
    }

    pub fn print_error(&self, msg: &str) {
        if self.json {
            let out = serde_json::json!({
                "status": "error",
                "code": "error",
                "message": msg,
            });
            println!("{out}");
            return;
        }
        eprintln!("{} {msg}", self.style("error", "31;1"));
    }

    fn style(&self, text: &str, ansi: &str) -> String {
        if self.no_color {
            return text.to_string();
        }
        format!("\x1b[{ansi}m{text}\x1b[0m")
    }
}
