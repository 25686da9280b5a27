use std::io::{self, Write};

use crate::aggregate::{ReportData, SectionTotals};

/// Writes the whole report as plain text: a two-line summary, then one
/// block per section with its items indented underneath.
pub fn write_report<W: Write>(out: &mut W, data: &ReportData) -> io::Result<()> {
    if data.is_empty() {
        return writeln!(out, "No payments.");
    }

    // Both dates are set whenever any record was counted.
    let (Some(begin), Some(end)) = (data.begin(), data.end()) else {
        return writeln!(out, "No payments.");
    };
    writeln!(
        out,
        "Expenses {} to {} ({} months)",
        begin.format("%Y-%m-%d"),
        end.format("%Y-%m-%d"),
        data.months_between(),
    )?;

    write!(out, "Total: {} payments, {}", data.count(), data.money())?;
    if let Some(avg) = data.per_month() {
        write!(out, ", {avg}/month")?;
    }
    writeln!(out)?;

    for section in data.sorted_sections() {
        writeln!(out)?;
        write_section(out, section)?;
    }
    Ok(())
}

fn write_section<W: Write>(out: &mut W, section: &SectionTotals) -> io::Result<()> {
    write!(
        out,
        "{}: {} ({} payments",
        section.name(),
        section.money(),
        section.count(),
    )?;
    if !section.skip_per_month() {
        if let Some(avg) = section.per_month() {
            write!(out, ", {avg}/month")?;
        }
    }
    writeln!(out, ")")?;

    for item in section.sorted_items() {
        write!(
            out,
            "  {}: {} ({} payments",
            item.name(),
            item.money(),
            item.count(),
        )?;
        if !section.skip_per_month() {
            if let Some(avg) = item.per_month() {
                write!(out, ", {avg}/month")?;
            }
        }
        writeln!(out, ")")?;
    }
    Ok(())
}
