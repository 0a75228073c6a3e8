use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use epi_model::{CanonicalRegion, MergedSeriesRow};
use epi_report::{ComparisonReport, SideSummary};
use epi_store::LoadSummary;

pub fn print_load_summary(summary: &LoadSummary) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Table"), header_cell("Rows")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    let reference = [
        ("regions", summary.regions),
        ("provinces", summary.provinces),
        ("diseases", summary.diseases),
        ("fact table mappings", summary.mappings),
    ];
    for (label, rows) in reference {
        table.add_row(vec![dim_cell(label), Cell::new(rows)]);
    }
    let mut total_cases = 0usize;
    for (fact_table, rows) in &summary.cases {
        total_cases += rows;
        table.add_row(vec![
            Cell::new(fact_table.key())
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(rows),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL CASES")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(total_cases).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
}

pub fn print_regions(regions: &[CanonicalRegion]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Order"),
        header_cell("Region"),
        header_cell("Name"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 1, CellAlignment::Right);
    for region in regions {
        table.add_row(vec![
            Cell::new(region.display_order),
            Cell::new(region.region_id),
            Cell::new(&region.name_th),
        ]);
    }
    println!("{table}");
}

/// Two-column key/value listing used by `resolve` and `locate`.
pub fn print_pairs(rows: &[(&str, Option<String>)]) {
    let mut table = Table::new();
    apply_table_style(&mut table);
    for (key, value) in rows {
        let value = match value {
            Some(value) => Cell::new(value),
            None => dim_cell("(none)"),
        };
        table.add_row(vec![header_cell(key), value]);
    }
    println!("{table}");
}

pub fn print_comparison(report: &ComparisonReport) {
    println!(
        "Range: {} .. {}  Measure: {}  Disease: {}  Table: {}",
        report.range.start,
        report.range.end,
        report.measure,
        report.disease_code.as_deref().unwrap_or("(all)"),
        report.table
    );
    print_totals(&report.main, &report.compare);
    print_series("Age", &report.age, &report.main.label, &report.compare.label);
    print_series(
        "Gender",
        &report.gender,
        &report.main.label,
        &report.compare.label,
    );
    print_series(
        "Month",
        &report.trend,
        &report.main.label,
        &report.compare.label,
    );
}

fn print_totals(main: &SideSummary, compare: &SideSummary) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Area"),
        header_cell("Patients"),
        header_cell("Deaths"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    for side in [main, compare] {
        let label = if side.resolved {
            Cell::new(&side.label)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold)
        } else {
            Cell::new(&side.label).fg(Color::Yellow)
        };
        table.add_row(vec![
            label,
            Cell::new(side.totals.patients),
            count_cell(side.totals.deaths, Color::Red),
        ]);
    }
    println!("{table}");
}

fn print_series(title: &str, rows: &[MergedSeriesRow], main: &str, compare: &str) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell(title),
        header_cell(main),
        header_cell(compare),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    for row in rows {
        table.add_row(vec![
            Cell::new(&row.category),
            value_cell(row.main_value),
            value_cell(row.compare_value),
        ]);
    }
    println!("{table}");
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(100);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(100);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn value_cell(value: f64) -> Cell {
    if value == 0.0 {
        dim_cell(0)
    } else {
        Cell::new(value)
    }
}

fn count_cell(count: u64, color: Color) -> Cell {
    if count == 0 {
        dim_cell(0)
    } else {
        Cell::new(count).fg(color)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
