//! Human-readable validation summary tables.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use panel_validate::{Level, ValidationReport};

pub fn print_validation_summary(name: &str, report: &ValidationReport, verbose_checks: bool) {
    println!("Dataset: {name}");

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Level"),
        header_cell("Status"),
        header_cell("Failures"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);

    for level in [
        Level::Structural,
        Level::Basic,
        Level::QcReady,
        Level::FullyAnnotated,
    ] {
        let passed = report.passes(level);
        table.add_row(vec![
            Cell::new(level.as_str()),
            status_cell(passed),
            Cell::new(report.failures(level).len()),
        ]);
    }
    println!("{table}");

    if verbose_checks {
        let mut checks = Table::new();
        checks.set_header(vec![
            header_cell("Check"),
            header_cell("Outcome"),
            header_cell("Detail"),
        ]);
        apply_table_style(&mut checks);
        for check in &report.checks {
            checks.add_row(vec![
                Cell::new(&check.name),
                status_cell(check.passed),
                Cell::new(check.detail.as_deref().unwrap_or("")),
            ]);
        }
        println!("{checks}");
    } else {
        for level in [
            Level::Structural,
            Level::Basic,
            Level::QcReady,
            Level::FullyAnnotated,
        ] {
            for failure in report.failures(level) {
                eprintln!("- [{}] {failure}", level.as_str());
            }
        }
    }
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn header_cell(text: &str) -> Cell {
    Cell::new(text).add_attribute(Attribute::Bold)
}

fn status_cell(passed: bool) -> Cell {
    if passed {
        Cell::new("pass").fg(Color::Green)
    } else {
        Cell::new("FAIL").fg(Color::Red)
    }
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}
