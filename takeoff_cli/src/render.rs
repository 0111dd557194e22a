//! Plain-text rendering of a calc run and its bill of quantities.

use std::fmt::Write;

use takeoff_core::classification::{BoqReport, GroupEntries, SummaryRow};
use takeoff_core::run::CalcRun;
use takeoff_core::takeoff::TakeoffLine;
use takeoff_core::units::format_fixed;

const QTY_DECIMALS: u32 = 3;

fn dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

fn write_row(out: &mut String, row: &SummaryRow) {
    let _ = writeln!(
        out,
        "    {:<12} {:<40} {:<10} {:<8} {:>14} {}",
        dash(row.dpwh_item_number.as_deref()),
        dash(row.description.as_deref()),
        dash(row.template_id.as_deref()),
        dash(row.level_id.as_deref()),
        format_fixed(row.quantity, QTY_DECIMALS),
        row.unit,
    );
}

fn write_line(out: &mut String, line: &TakeoffLine, formulas: bool) {
    let _ = writeln!(
        out,
        "    {:<12} {:<16} {:<28} {:>14} {}",
        dash(line.dpwh_item_number.as_deref()),
        line.source_element_id,
        line.resource_key,
        format_fixed(line.quantity, QTY_DECIMALS),
        line.unit,
    );
    if formulas {
        let _ = writeln!(out, "        {}", line.formula_text);
        for text in line.assumption_texts() {
            let _ = writeln!(out, "        - {}", text);
        }
    }
}

/// Render the report grouped by Part and subcategory, followed by run totals
/// and catalog warnings.
pub fn render_text(run: &CalcRun, report: &BoqReport, formulas: bool) -> String {
    let mut out = String::new();
    let meta = &run.meta;
    let _ = writeln!(out, "BILL OF QUANTITIES: {} ({})", meta.project_name, meta.project_code);
    let _ = writeln!(out, "Calculated {} by engine {}", meta.calculated_at.format("%Y-%m-%d %H:%M UTC"), meta.engine_version);

    for part in &report.parts {
        let _ = writeln!(out);
        let _ = writeln!(out, "{} - {}", part.label, part.title);
        for group in &part.subcategories {
            let _ = writeln!(out, "  {}", group.name);
            match &group.entries {
                GroupEntries::Rows(rows) => rows.iter().for_each(|row| write_row(&mut out, row)),
                GroupEntries::Lines(lines) => lines.iter().for_each(|line| write_line(&mut out, line, formulas)),
            }
        }
    }

    let summary = &run.summary;
    let _ = writeln!(out);
    let _ = writeln!(out, "SUMMARY");
    let _ = writeln!(out, "  Concrete   {:>14} m³", format_fixed(summary.total_concrete_m3, QTY_DECIMALS));
    let _ = writeln!(out, "  Formwork   {:>14} m²", format_fixed(summary.total_formwork_m2, QTY_DECIMALS));
    let _ = writeln!(out, "  Rebar      {:>14} kg", format_fixed(summary.total_rebar_kg, QTY_DECIMALS));
    let _ = writeln!(out, "  Earthwork  {:>14} m³", format_fixed(summary.total_excavation_m3, QTY_DECIMALS));
    for (category, area) in &summary.finish_area_by_category {
        let _ = writeln!(out, "  {:<10} {:>14}", category, format_fixed(*area, QTY_DECIMALS));
    }
    let _ = writeln!(out, "  {} line(s), {} structural element(s)", summary.line_count, summary.element_count);

    if !run.warnings.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "WARNINGS");
        for warning in &run.warnings {
            let _ = writeln!(out, "  {}", warning);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use takeoff_core::catalog::InMemoryCatalog;
    use takeoff_core::classification::ReportView;
    use takeoff_core::file_io::parse_snapshot;
    use takeoff_core::run::run_calculation;
    use takeoff_core::trace::NOOP_TRACE;

    fn sample_run() -> CalcRun {
        let snapshot = parse_snapshot(
            r#"{
                "meta": { "version": "0.1.0", "project_name": "Shed", "project_code": "S-1",
                          "created": "2024-05-01T08:00:00Z", "modified": "2024-05-01T08:00:00Z" },
                "excavation_items": [{
                    "id": "EX-1", "name": "Pit",
                    "method": { "method": "rectangular", "length_m": 2, "width_m": 2, "depth_m": 1.5 }
                }]
            }"#,
        )
        .unwrap();
        run_calculation(&snapshot, &InMemoryCatalog::dpwh_defaults(), &NOOP_TRACE).unwrap()
    }

    #[test]
    fn test_summarized_text() {
        let run = sample_run();
        let report = run.report(ReportView::Summarized, &InMemoryCatalog::dpwh_defaults());
        let text = render_text(&run, &report, false);

        assert!(text.starts_with("BILL OF QUANTITIES: Shed (S-1)"));
        assert!(text.contains("PART C - Earthwork"));
        assert!(text.contains("Structure Excavation, Common Soil"));
        assert!(text.contains("6.000 m³"));
        assert!(!text.contains("WARNINGS"));
    }

    #[test]
    fn test_detailed_text_with_formulas() {
        let run = sample_run();
        let report = run.report(ReportView::Detailed, &InMemoryCatalog::new());
        let text = render_text(&run, &report, true);

        assert!(text.contains("EX-1"));
        assert!(text.contains(&run.lines[0].formula_text));
    }

    #[test]
    fn test_warnings_listed() {
        let mut run = sample_run();
        run.warnings.push("Pay item '999' is not in the catalog".into());
        let report = run.report(ReportView::Summarized, &InMemoryCatalog::new());
        let text = render_text(&run, &report, false);
        assert!(text.contains("WARNINGS\n  Pay item '999' is not in the catalog"));
    }
}
