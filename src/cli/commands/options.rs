//! `options`: prints the action menu for each attack phase.

use std::fmt::Write as _;

use serde::Serialize;

use crate::cli::args::{OptionsArgs, OutputFormat};
use crate::config::ConfigLoader;
use crate::error::AttacklineError;
use crate::game::{ActionConfig, OptionSelector, Phase};

#[derive(Debug, Serialize)]
struct PhaseOptions {
    phase: u8,
    label: String,
    options: Vec<ActionConfig>,
}

/// Prints the option table.
///
/// # Errors
///
/// Returns a config error if `--config` names an invalid file.
pub fn run(args: &OptionsArgs) -> Result<(), AttacklineError> {
    let config = ConfigLoader::new().load(args.config.as_deref())?;
    let selector = OptionSelector::new(config.catalog());
    let table = collect(&selector, args.phase);

    match args.format {
        OutputFormat::Human => print!("{}", render(&table)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&table)?),
    }
    Ok(())
}

fn collect(selector: &OptionSelector, only: Option<u8>) -> Vec<PhaseOptions> {
    (Phase::INITIAL.get()..=Phase::FINAL.get())
        .filter(|p| only.is_none_or(|o| o == *p))
        .filter_map(Phase::new)
        .map(|phase| PhaseOptions {
            phase: phase.get(),
            label: phase.label(),
            options: selector.options_for(phase.get()),
        })
        .collect()
}

/// Formats one menu line, e.g. `  1. Ground Pass (Easy)  30s  [LOW]`.
#[must_use]
pub fn menu_line(index: usize, action: &ActionConfig) -> String {
    let mut line = format!(
        "  {index}. {:<24} {:>3}s",
        action.to_string(),
        action.time_budget().as_secs()
    );
    if let Some(risk) = action.risk() {
        let _ = write!(line, "  [{risk}]");
    }
    if action.is_special() {
        line.push_str("  *");
    }
    line
}

fn render(table: &[PhaseOptions]) -> String {
    let mut out = String::new();
    for entry in table {
        let _ = writeln!(out, "{}", entry.label);
        for (i, action) in entry.options.iter().enumerate() {
            let _ = writeln!(out, "{}", menu_line(i + 1, action));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_phases_by_default() {
        let table = collect(&OptionSelector::default(), None);
        let counts: Vec<_> = table.iter().map(|t| t.options.len()).collect();
        assert_eq!(counts, vec![3, 3, 2, 1]);
    }

    #[test]
    fn single_phase() {
        let table = collect(&OptionSelector::default(), Some(4));
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].label, "Phase 4: Final Strike");
    }

    #[test]
    fn rendered_menu_shows_budgets_and_risk() {
        let text = render(&collect(&OptionSelector::default(), Some(1)));
        assert!(text.starts_with("Phase 1: Initiation\n"));
        assert!(text.contains("1. Ground Pass (Easy)"));
        assert!(text.contains("30s  [LOW]"));
        assert!(text.contains("10s  [HIGH]"));
    }

    #[test]
    fn json_uses_wire_names() {
        let json = serde_json::to_value(collect(&OptionSelector::default(), Some(4))).unwrap();
        let shot = &json[0]["options"][0];
        assert_eq!(shot["kind"], "shoot");
        assert_eq!(shot["isSpecial"], true);
        assert_eq!(shot["timeLimit"], 30);
    }
}
