//! Formatted terminal output for the `report` front-end.

mod format;

pub use format::{
    format_dam_im_table, format_load_report, format_monthly_table, format_negative_table,
    format_regulation_table, format_run_summary, format_spark_table, format_year_over_year_table,
};
