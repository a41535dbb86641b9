//! Output Formatting
//!
//! Human-readable listing of the available tasks and targets (`blackbench info`).

use blackbench_core::{Registry, Target};
use std::fmt::Write;

/// Format the registry contents for terminal display
pub fn format_info(registry: &Registry) -> String {
    let mut output = String::new();

    output.push_str("Tasks:\n");
    let width = registry
        .tasks()
        .iter()
        .map(|t| t.name().len())
        .max()
        .unwrap_or(0);
    for task in registry.tasks() {
        let kind = if task.is_format() { " [format]" } else { "" };
        let _ = writeln!(
            output,
            "  {:<width$}  {}{}",
            task.name(),
            task.description(),
            kind,
            width = width
        );
    }
    output.push('\n');

    output.push_str("Normal targets:\n");
    push_targets(&mut output, &registry.normal_targets());
    output.push('\n');

    output.push_str("Micro targets:\n");
    push_targets(&mut output, &registry.micro_targets());

    output
}

fn push_targets(output: &mut String, targets: &[&Target]) {
    if targets.is_empty() {
        output.push_str("  (none)\n");
        return;
    }
    let width = targets.iter().map(|t| t.name().len()).max().unwrap_or(0);
    for (i, target) in targets.iter().enumerate() {
        if target.description().is_empty() {
            let _ = writeln!(output, "  {}. {}", i + 1, target.name());
        } else {
            let _ = writeln!(
                output,
                "  {}. {:<width$}  {}",
                i + 1,
                target.name(),
                target.description(),
                width = width
            );
        }
    }
}
