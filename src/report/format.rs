//! Terminal table formatting.
//!
//! We keep formatting code in one place so:
//! - the aggregation code stays clean and testable
//! - output changes are localized (important for future snapshot tests)
//!
//! All numbers arrive pre-rounded from the aggregation engine; this module
//! only aligns and labels them.

use crate::analytics::indexes::YearOverYearTable;
use crate::analytics::joins::DamImSpreadRow;
use crate::analytics::regulation::MonthlyRegulationRow;
use crate::analytics::rollup::MonthlyPriceRow;
use crate::analytics::spark::MonthlySparkRow;
use crate::analytics::threshold::NegativeMonthRow;
use crate::app::pipeline::RunOutput;
use crate::data::LoadReport;
use crate::domain::RunConfig;

/// Format the run header: window, filters, and the stats-card summary.
pub fn format_run_summary(output: &RunOutput, config: &RunConfig) -> String {
    let mut out = String::new();
    let unit = config.currency.label();

    out.push_str("=== ote - OTE Market Analytics ===\n");
    out.push_str(&format!("Currency: {unit}\n"));
    match output.data.date_span() {
        Some((first, last)) => out.push_str(&format!("Window: {first} .. {last}\n")),
        None => out.push_str("Window: (empty)\n"),
    }
    out.push_str(&format!("Threshold: {:.2} {unit}/MWh\n", config.threshold));
    out.push_str(&format!(
        "Spark policy: {}h charging, {:.0}% boiler, adder {:.2} {unit}/MWh\n",
        config.policy.charging_hours,
        config.policy.boiler_efficiency * 100.0,
        config.policy.retail_adder,
    ));

    out.push_str("\nDay-ahead price summary:\n");
    match &output.derived.summary {
        Some(s) => {
            out.push_str(&format!(
                "- mean {:.2} | median {:.2} | min {:.2} | max {:.2} {unit}/MWh\n",
                s.mean, s.median, s.min, s.max
            ));
            out.push_str(&format!(
                "- {} of {} hours below threshold ({:.1}%)\n",
                s.hours_below, s.hours, s.pct_below
            ));
            out.push_str(&format!(
                "- {} negative-price hours across {} days\n",
                s.negative_hours, s.distinct_dates
            ));
        }
        None => out.push_str("- no priced hours in window\n"),
    }

    out
}

/// Format the monthly min/avg/max/volatility table.
pub fn format_monthly_table(monthly: &[MonthlyPriceRow], config: &RunConfig) -> String {
    let mut out = String::new();
    out.push_str(&format!("Monthly day-ahead prices ({}/MWh):\n", config.currency.label()));
    out.push_str(&format!(
        "{:<8} {:>10} {:>10} {:>10} {:>10} {:>7}\n",
        "month", "min", "avg", "max", "vol", "hours"
    ));
    out.push_str(&format!(
        "{:-<8} {:-<10} {:-<10} {:-<10} {:-<10} {:-<7}\n",
        "", "", "", "", "", ""
    ));
    for row in monthly {
        out.push_str(&format!(
            "{:<8} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>7}\n",
            row.month, row.min, row.avg, row.max, row.volatility, row.hours
        ));
    }
    out
}

/// Format the monthly spark-spread table.
pub fn format_spark_table(monthly: &[MonthlySparkRow], config: &RunConfig) -> String {
    let mut out = String::new();
    let unit = config.currency.label();
    out.push_str(&format!(
        "Monthly spark spread, {}h smart charging vs gas ({unit}/MWh):\n",
        config.policy.charging_hours
    ));
    out.push_str(&format!(
        "{:<8} {:>10} {:>10} {:>10} {:>10} {:>5}\n",
        "month", "gas_heat", "smart", "all_day", "spread", "days"
    ));
    out.push_str(&format!(
        "{:-<8} {:-<10} {:-<10} {:-<10} {:-<10} {:-<5}\n",
        "", "", "", "", "", ""
    ));
    for row in monthly {
        out.push_str(&format!(
            "{:<8} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>5}\n",
            row.month, row.gas_heat_cost, row.smart_charge_cost, row.all_day_cost, row.spark_spread, row.days
        ));
    }
    out
}

/// Format the monthly regulation-energy revenue table.
pub fn format_regulation_table(monthly: &[MonthlyRegulationRow], config: &RunConfig) -> String {
    let mut out = String::new();
    let unit = config.currency.label();
    out.push_str(&format!("Monthly negative regulation energy ({unit}):\n"));
    out.push_str(&format!(
        "{:<8} {:>12} {:>12} {:>12} {:>12} {:>10}\n",
        "month", "volume_mwh", "revenue", "expense", "net", "avg_price"
    ));
    out.push_str(&format!(
        "{:-<8} {:-<12} {:-<12} {:-<12} {:-<12} {:-<10}\n",
        "", "", "", "", "", ""
    ));
    for row in monthly {
        out.push_str(&format!(
            "{:<8} {:>12.2} {:>12.2} {:>12.2} {:>12.2} {:>10.2}\n",
            row.month, row.volume, row.revenue, row.expense, row.net_revenue, row.avg_price
        ));
    }
    out
}

/// Format the per-month negative-price hour counts.
pub fn format_negative_table(months: &[NegativeMonthRow]) -> String {
    let mut out = String::new();
    out.push_str("Negative-price hours by month:\n");
    if months.iter().all(|m| m.count == 0) {
        out.push_str("- none in window\n");
        return out;
    }
    out.push_str(&format!("{:<8} {:>9} {:>7}\n", "month", "negative", "hours"));
    out.push_str(&format!("{:-<8} {:-<9} {:-<7}\n", "", "", ""));
    for row in months {
        out.push_str(&format!(
            "{:<8} {:>9} {:>7}\n",
            row.month, row.count, row.total_hours
        ));
    }
    out
}

/// Format the year-over-year pivot: one row per month-of-year, one column per
/// year, `-` marking months with no data.
pub fn format_year_over_year_table(table: &YearOverYearTable, config: &RunConfig) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Year-over-year monthly averages ({}/MWh):\n",
        config.currency.label()
    ));
    if table.years.is_empty() {
        out.push_str("- no priced hours in window\n");
        return out;
    }

    out.push_str(&format!("{:<6}", "month"));
    for year in &table.years {
        out.push_str(&format!(" {year:>9}"));
    }
    out.push('\n');

    for row in &table.rows {
        out.push_str(&format!("{:<6}", format!("{:02}", row.month_of_year)));
        for cell in &row.by_year {
            match cell {
                Some(v) => out.push_str(&format!(" {v:>9.2}")),
                None => out.push_str(&format!(" {:>9}", "-")),
            }
        }
        out.push('\n');
    }
    out
}

/// Format the day-ahead vs intraday comparison.
///
/// The daily rows go to the CSV export; the terminal report keeps a compact
/// summary over the joined days.
pub fn format_dam_im_table(rows: &[DamImSpreadRow], config: &RunConfig) -> String {
    use crate::analytics::{mean, round2};

    let mut out = String::new();
    let unit = config.currency.label();
    out.push_str("Day-ahead vs intraday:\n");
    if rows.is_empty() {
        out.push_str("- no days covered by both datasets\n");
        return out;
    }

    let dam = mean(&rows.iter().map(|r| r.dam_avg).collect::<Vec<_>>()).unwrap_or(0.0);
    let im = mean(&rows.iter().map(|r| r.im_avg).collect::<Vec<_>>()).unwrap_or(0.0);
    let spread = mean(&rows.iter().map(|r| r.spread).collect::<Vec<_>>()).unwrap_or(0.0);
    let im_higher = rows.iter().filter(|r| r.spread > 0.0).count();

    out.push_str(&format!(
        "- {} joined days | DAM avg {:.2} | IM avg {:.2} | spread avg {:.2} {unit}/MWh\n",
        rows.len(),
        round2(dam),
        round2(im),
        round2(spread),
    ));
    out.push_str(&format!(
        "- intraday above day-ahead on {} of {} days\n",
        im_higher,
        rows.len()
    ));
    out
}

/// Format the ingest counters footer.
pub fn format_load_report(report: &LoadReport) -> String {
    if report.datasets.is_empty() {
        return "Source: synthetic sample data\n".to_string();
    }
    let mut out = String::new();
    out.push_str("Ingest:\n");
    for ds in &report.datasets {
        out.push_str(&format!(
            "- {:<18} {} rows read, {} used, {} dropped\n",
            ds.file, ds.rows_read, ds.rows_used, ds.rows_dropped
        ));
    }
    out
}
