use super::open_db;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::queries::{list_kpis, list_rollups};
use crate::errors::AppResult;
use crate::export::ExportLogic;
use crate::export::logic::ExportKind;
use crate::models::owner::Owner;
use crate::ui::messages::info;
use crate::utils::colors::{RESET, color_for_slippage};
use crate::utils::date::{format_day, parse_day};
use crate::utils::table::{Table, opt_cell};
use crate::utils::time::format_minutes;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Report {
        owner,
        from,
        to,
        rollups,
        format,
        file,
        force,
    } = cmd
    {
        let owner = Owner::parse(owner)?;
        let from = format_day(&parse_day(from)?);
        let to = format_day(&parse_day(to)?);
        let mut pool = open_db(cfg)?;

        let kind = if *rollups {
            ExportKind::Rollups
        } else {
            ExportKind::Kpis
        };

        if let Some(file) = file {
            ExportLogic::export(&mut pool, &owner, &from, &to, kind, *format, file, *force)?;
            return Ok(());
        }

        let table = match kind {
            ExportKind::Kpis => {
                let mut t = Table::new([
                    "day", "job", "paid", "drive", "ot", "labour", "revenue", "cogs", "margin%",
                    "ar", "ap", "holdback", "slippage",
                ]);
                for k in list_kpis(&pool.conn, &owner, &from, &to)? {
                    let slippage = match k.slippage {
                        Some(s) => format!("{}{:.2}{}", color_for_slippage(s), s, RESET),
                        None => opt_cell::<f64>(None),
                    };
                    t.add_row(vec![
                        k.day,
                        k.job_ref.to_string(),
                        opt_cell(k.paid_minutes.map(format_minutes)),
                        opt_cell(k.drive_minutes.map(format_minutes)),
                        opt_cell(k.ot_minutes.map(format_minutes)),
                        opt_cell(k.labour_cost.map(|v| format!("{v:.2}"))),
                        opt_cell(k.revenue.map(|v| format!("{v:.2}"))),
                        opt_cell(k.cogs.map(|v| format!("{v:.2}"))),
                        opt_cell(k.gross_margin_pct.map(|v| format!("{v:.2}"))),
                        opt_cell(k.ar_total.map(|v| format!("{v:.2}"))),
                        opt_cell(k.ap_total.map(|v| format!("{v:.2}"))),
                        opt_cell(k.holdback_amount.map(|v| format!("{v:.2}"))),
                        slippage,
                    ]);
                }
                t
            }
            ExportKind::Rollups => {
                let mut t = Table::new(["day", "employee", "job", "shift", "break", "drive", "paid"]);
                for r in list_rollups(&pool.conn, &owner, &from, &to)? {
                    t.add_row(vec![
                        r.day,
                        r.employee_name,
                        r.job_ref.to_string(),
                        format_minutes(r.shift_minutes),
                        format_minutes(r.break_minutes),
                        format_minutes(r.drive_minutes),
                        format_minutes(r.paid_minutes),
                    ]);
                }
                t
            }
        };

        if table.is_empty() {
            info(format!("No rows for {owner} between {from} and {to}"));
        } else {
            print!("{}", table.render());
        }
    }

    Ok(())
}
