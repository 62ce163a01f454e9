//! Export derived series to CSV.
//!
//! The exports are meant to be easy to consume in spreadsheets or downstream
//! scripts. All values are already rounded by the aggregation engine.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::analytics::joins::DamImSpreadRow;
use crate::analytics::regulation::MonthlyRegulationRow;
use crate::analytics::rollup::{DailyPriceRow, HeatmapRow, MonthlyPriceRow, WeekdaySplitRow};
use crate::analytics::series::CumulativeRow;
use crate::analytics::spark::DailySparkRow;
use crate::analytics::threshold::ThresholdDayRow;
use crate::error::AppError;

fn create(path: &Path) -> Result<File, AppError> {
    File::create(path)
        .map_err(|e| AppError::runtime(format!("Failed to create export CSV '{}': {e}", path.display())))
}

fn write_line(file: &mut File, line: &str) -> Result<(), AppError> {
    writeln!(file, "{line}").map_err(|e| AppError::runtime(format!("Failed to write export CSV row: {e}")))
}

/// Write the per-day price stats with their moving average.
pub fn write_daily_csv(path: &Path, daily: &[DailyPriceRow], ma: &[f64]) -> Result<(), AppError> {
    let mut file = create(path)?;
    write_line(&mut file, "date,min,avg,max,avg_ma7,hours")?;
    for (row, ma_value) in daily.iter().zip(ma) {
        write_line(
            &mut file,
            &format!(
                "{},{:.2},{:.2},{:.2},{:.2},{}",
                row.date, row.min, row.avg, row.max, ma_value, row.hours
            ),
        )?;
    }
    Ok(())
}

/// Write the monthly price stats.
pub fn write_monthly_csv(path: &Path, monthly: &[MonthlyPriceRow]) -> Result<(), AppError> {
    let mut file = create(path)?;
    write_line(&mut file, "month,min,avg,max,volatility,hours")?;
    for row in monthly {
        write_line(
            &mut file,
            &format!(
                "{},{:.2},{:.2},{:.2},{:.2},{}",
                row.month, row.min, row.avg, row.max, row.volatility, row.hours
            ),
        )?;
    }
    Ok(())
}

/// Write the daily spark-spread comparison.
pub fn write_spark_csv(path: &Path, daily: &[DailySparkRow]) -> Result<(), AppError> {
    let mut file = create(path)?;
    write_line(
        &mut file,
        "date,gas_heat_cost,smart_charge_cost,all_day_cost,spark_spread",
    )?;
    for row in daily {
        write_line(
            &mut file,
            &format!(
                "{},{:.2},{:.2},{:.2},{:.2}",
                row.date, row.gas_heat_cost, row.smart_charge_cost, row.all_day_cost, row.spark_spread
            ),
        )?;
    }
    Ok(())
}

/// Write the monthly regulation-energy revenue rollup.
pub fn write_regulation_csv(path: &Path, monthly: &[MonthlyRegulationRow]) -> Result<(), AppError> {
    let mut file = create(path)?;
    write_line(&mut file, "month,volume_mwh,revenue,expense,net_revenue,avg_price")?;
    for row in monthly {
        write_line(
            &mut file,
            &format!(
                "{},{:.2},{:.2},{:.2},{:.2},{:.2}",
                row.month, row.volume, row.revenue, row.expense, row.net_revenue, row.avg_price
            ),
        )?;
    }
    Ok(())
}

/// Write the weekday vs weekend hour-of-day profile.
pub fn write_weekday_csv(path: &Path, rows: &[WeekdaySplitRow]) -> Result<(), AppError> {
    let mut file = create(path)?;
    write_line(&mut file, "hour,weekday_avg,weekend_avg")?;
    for row in rows {
        write_line(
            &mut file,
            &format!("{},{:.2},{:.2}", row.hour, row.weekday_avg, row.weekend_avg),
        )?;
    }
    Ok(())
}

/// Write the month × hour mean-price matrix.
///
/// Hours with no data stay empty cells, so spreadsheets can tell "no data"
/// apart from a genuine zero price.
pub fn write_heatmap_csv(path: &Path, rows: &[HeatmapRow]) -> Result<(), AppError> {
    let mut file = create(path)?;
    let mut header = String::from("month");
    for hour in 1..=24 {
        header.push_str(&format!(",h{hour}"));
    }
    write_line(&mut file, &header)?;

    for row in rows {
        let mut line = row.month.clone();
        for cell in &row.by_hour {
            match cell {
                Some(v) => line.push_str(&format!(",{v:.2}")),
                None => line.push(','),
            }
        }
        write_line(&mut file, &line)?;
    }
    Ok(())
}

/// Write the per-day cheap-hour occupancy counts.
pub fn write_threshold_csv(path: &Path, rows: &[ThresholdDayRow]) -> Result<(), AppError> {
    let mut file = create(path)?;
    write_line(&mut file, "date,hours_below,total_hours")?;
    for row in rows {
        write_line(&mut file, &format!("{},{},{}", row.date, row.count, row.total_hours))?;
    }
    Ok(())
}

/// Write the cumulative spark-spread savings series.
pub fn write_savings_csv(path: &Path, rows: &[CumulativeRow]) -> Result<(), AppError> {
    let mut file = create(path)?;
    write_line(&mut file, "date,daily,cumulative")?;
    for row in rows {
        write_line(&mut file, &format!("{},{:.2},{:.2}", row.date, row.daily, row.cumulative))?;
    }
    Ok(())
}

/// Write the DAM vs IM daily spread.
pub fn write_dam_im_csv(path: &Path, rows: &[DamImSpreadRow]) -> Result<(), AppError> {
    let mut file = create(path)?;
    write_line(&mut file, "date,dam_avg,im_avg,spread")?;
    for row in rows {
        write_line(
            &mut file,
            &format!("{},{:.2},{:.2},{:.2}", row.date, row.dam_avg, row.im_avg, row.spread),
        )?;
    }
    Ok(())
}
