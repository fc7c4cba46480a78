//! Output rendering and formatting

use crate::error::CliError;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, ContentArrangement, Table};
use serde_json::json;
use stagehook_hooks::{HookRegistry, PipelineReport};
use stagehook_types::Stage;
use std::io;

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
}

impl OutputRenderer {
    /// Create new output renderer
    pub fn new(json_output: bool) -> Self {
        Self { json_output }
    }

    /// Render the pre-actions registered per stage
    pub fn render_hooks(&self, registry: &HookRegistry, only: Option<Stage>) -> io::Result<()> {
        let stages: Vec<Stage> = match only {
            Some(stage) => vec![stage],
            None => Stage::ALL.to_vec(),
        };

        if self.json_output {
            let value: serde_json::Value = stages
                .iter()
                .map(|stage| {
                    let names: Vec<&str> =
                        registry.actions(*stage).iter().map(|a| a.name()).collect();
                    (stage.to_string(), json!(names))
                })
                .collect::<serde_json::Map<_, _>>()
                .into();
            return print_json(&value);
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("Stage").add_attribute(Attribute::Bold),
                Cell::new("#").add_attribute(Attribute::Bold),
                Cell::new("Pre-action").add_attribute(Attribute::Bold),
            ]);

        for stage in stages {
            let actions = registry.actions(stage);
            if actions.is_empty() {
                table.add_row(vec![Cell::new(stage), Cell::new("-"), Cell::new("(none)")]);
            }
            for (index, action) in actions.iter().enumerate() {
                table.add_row(vec![
                    Cell::new(stage),
                    Cell::new(index + 1),
                    Cell::new(action.name()),
                ]);
            }
        }

        println!("{table}");
        Ok(())
    }

    /// Render the known stage names
    pub fn render_stages(&self) -> io::Result<()> {
        if self.json_output {
            let value = json!(Stage::ALL
                .iter()
                .map(|stage| json!({ "name": stage.as_str(), "description": stage.description() }))
                .collect::<Vec<_>>());
            return print_json(&value);
        }

        for stage in Stage::ALL {
            println!("{:<28} {}", stage.as_str(), stage.description());
        }
        Ok(())
    }

    /// Render the outcome of a successful run
    pub fn render_report(&self, report: &PipelineReport) -> io::Result<()> {
        if self.json_output {
            let value = json!({
                "success": true,
                "duration_ms": u64::try_from(report.duration.as_millis()).unwrap_or(u64::MAX),
                "stages": report.stages.iter().map(|stage| json!({
                    "stage": stage.stage.as_str(),
                    "pre_actions": stage.pre_actions,
                    "ran_main": stage.ran_main,
                    "duration_ms": u64::try_from(stage.duration.as_millis()).unwrap_or(u64::MAX),
                })).collect::<Vec<_>>(),
            });
            return print_json(&value);
        }

        println!(
            "[OK] {} stage(s) completed in {:.1}s",
            report.stages.len(),
            report.duration.as_secs_f64()
        );
        Ok(())
    }

    /// Render a failed command: a JSON object on stdout, or a message on stderr
    pub fn render_error(&self, error: &CliError) -> io::Result<()> {
        if self.json_output {
            return print_json(&json!({ "success": false, "error": error.failure() }));
        }

        eprintln!("Error: {error}");
        Ok(())
    }
}

fn print_json(value: &serde_json::Value) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    println!("{json}");
    Ok(())
}
