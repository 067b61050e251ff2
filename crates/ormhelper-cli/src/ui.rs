//! ormhelper CLI UI primitives.

use std::path::Path;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use ormhelper_compiler::schema::{FromVersion, MigrationStrategy};
use ormhelper_compiler::HelperPlan;

/// Terminal color palette
pub mod colors {
    use console::Color;

    pub const CYAN: Color = Color::Color256(51);
    pub const MAGENTA: Color = Color::Color256(201);
    pub const VIOLET: Color = Color::Color256(135);
    pub const GREEN: Color = Color::Color256(82);
    pub const DIM: Color = Color::Color256(240);
}

pub mod symbols {
    pub const DIAMOND: &str = "\u{25C6}"; // ◆
    pub const DIAMOND_OUTLINE: &str = "\u{25C7}"; // ◇
    pub const TARGET_FILLED: &str = "\u{25C9}"; // ◉
    pub const TARGET_EMPTY: &str = "\u{25CE}"; // ◎
    pub const TRIANGLE: &str = "\u{25B8}"; // ▸
    pub const DOT: &str = "\u{00B7}"; // ·
    pub const ARROW: &str = "\u{2500}\u{25B8}"; // ─▸
}

/// Create a clickable file link (OSC 8 hyperlink)
pub fn file_link(path: &Path) -> String {
    let display = path.display().to_string();
    format!("\x1b]8;;file://{}\x07{}\x1b]8;;\x07", display, display)
}

/// Print a success message
pub fn success(msg: &str) {
    println!("  {} {}", style(symbols::TARGET_FILLED).fg(colors::GREEN), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    println!(
        "  {} {}",
        style(symbols::DIAMOND).fg(colors::MAGENTA),
        style(msg).fg(colors::MAGENTA)
    );
}

/// Print an info message
pub fn info(msg: &str) {
    println!("  {} {}", style(symbols::DIAMOND_OUTLINE).fg(colors::CYAN), msg);
}

/// Print a dim/secondary message
pub fn dim(msg: &str) {
    println!("  {}", style(msg).fg(colors::DIM));
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let spinner_style = ProgressStyle::default_spinner()
        .tick_chars("\u{25CE}\u{25C9}\u{25CE}\u{25C9}") // ◎◉◎◉
        .template("  {spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(spinner_style);
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(150));
    pb
}

/// Print a box header
pub fn box_header(title: &str) {
    let title_padded = format!(" {} ", title);
    let dashes = header_dashes(&title_padded);

    println!(
        "  {}{}{}{}",
        style("\u{256D}\u{2500}").fg(colors::CYAN), // ╭─
        style(title_padded).fg(colors::CYAN).bold(),
        style("\u{2500}".repeat(dashes)).fg(colors::CYAN),
        style("\u{256E}").fg(colors::CYAN) // ╮
    );
}

/// Rule length after a padded title; long titles get none.
fn header_dashes(title_padded: &str) -> usize {
    let width: usize = 55;
    width.saturating_sub(title_padded.chars().count() + 4)
}

/// Print a box line
pub fn box_line(content: &str) {
    let width: usize = 53;
    let content_len = console::measure_text_width(content);
    let padding = width.saturating_sub(content_len);
    println!(
        "  {} {}{}{}",
        style("\u{2502}").fg(colors::CYAN), // │
        content,
        " ".repeat(padding),
        style("\u{2502}").fg(colors::CYAN)
    );
}

/// Print a box footer
pub fn box_footer() {
    let width: usize = 55;
    println!(
        "  {}{}{}",
        style("\u{2570}").fg(colors::CYAN), // ╰
        style("\u{2500}".repeat(width - 2)).fg(colors::CYAN),
        style("\u{256F}").fg(colors::CYAN) // ╯
    );
}

/// Print one generated file
pub fn generated_line(path: &Path) {
    let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    println!(
        "  {}   {}   {}",
        style(symbols::TRIANGLE).fg(colors::CYAN),
        style(name).bold(),
        style(file_link(path)).dim()
    );
}

/// Print timing information
pub fn timing(label: &str, duration_ms: u128) {
    println!(
        "  {} {} in {}ms",
        style(symbols::DIAMOND_OUTLINE).fg(colors::CYAN),
        label,
        duration_ms
    );
}

/// Print the error header for failed passes
pub fn failed_header() {
    println!();
    println!(
        "  {} {}",
        style(symbols::DIAMOND).fg(colors::MAGENTA).bold(),
        style("Generation failed.").fg(colors::MAGENTA).bold()
    );
    println!();
}

pub fn looking_good() {
    println!(
        "  {} {}",
        style(symbols::TARGET_FILLED).fg(colors::GREEN),
        style("Looking good.").bold()
    );
}

/// Print the upgrade dispatch of one helper
pub fn plan_box(plan: &HelperPlan) {
    box_header(&format!("{} v{}", plan.helper, plan.version));
    box_line("");
    match &plan.migration {
        MigrationStrategy::DropAndRecreate => {
            box_line(&format!(
                "{} drop every table, then create again",
                style(symbols::TARGET_EMPTY).fg(colors::VIOLET)
            ));
        }
        MigrationStrategy::Upgrade(upgrade) if upgrade.is_empty() => {
            box_line(&style("no upgrade routines").dim().to_string());
        }
        MigrationStrategy::Upgrade(upgrade) => {
            for planned in &upgrade.steps {
                box_line(&format!(
                    "{} {:<12} {} {}",
                    style(symbols::TRIANGLE).fg(colors::CYAN),
                    guard(planned.step.from, planned.step.to),
                    style(symbols::ARROW).dim(),
                    planned.routine
                ));
            }
        }
    }

    if let Some(simulation) = &plan.simulation {
        box_line("");
        let fired: Vec<&str> = simulation.fired.iter().map(|s| s.routine.as_str()).collect();
        box_line(&format!(
            "from v{} {} {}",
            simulation.start,
            style(symbols::ARROW).dim(),
            if fired.is_empty() { "nothing runs".to_string() } else { fired.join(", ") }
        ));
        let outcome = if simulation.reaches_target {
            style(format!("{} ends at v{}", symbols::TARGET_FILLED, simulation.final_version)).fg(colors::GREEN)
        } else {
            style(format!(
                "{} ends at v{}, short of v{}",
                symbols::DIAMOND,
                simulation.final_version,
                plan.version
            ))
            .fg(colors::MAGENTA)
        };
        box_line(&outcome.to_string());
    }

    box_line("");
    box_footer();
}

/// The generated guard for a step, e.g. `v == 2` or `v <= 4`.
fn guard(from: FromVersion, to: u32) -> String {
    match from {
        FromVersion::Unset => format!("v <= {}", to),
        FromVersion::Exact(from) => format!("v == {}", from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_text() {
        assert_eq!(guard(FromVersion::Unset, 4), "v <= 4");
        assert_eq!(guard(FromVersion::Exact(2), 3), "v == 2");
    }

    #[test]
    fn test_header_dashes() {
        assert_eq!(header_dashes(" GENERATED "), 40);
        let long = format!(" {} ", "customer_database ".repeat(4));
        assert_eq!(header_dashes(&long), 0);
        box_header(&"x".repeat(80));
    }

    #[test]
    fn test_file_link_format() {
        let link = file_link(Path::new("/tmp/CustomerDatabaseHelper.ts"));
        assert!(link.contains("CustomerDatabaseHelper.ts"));
        assert!(link.contains("\x1b]8;;"));
    }
}
