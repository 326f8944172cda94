mod db;
mod fetch;
mod listing;
mod parser;

use std::time::Instant;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "agt_notices", about = "AGT pipeline critical notice scraper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the notice list, interpret each notice, store results
    Scrape {
        /// Max notices to fetch (default: all listed)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Re-run restriction table parsing over stored Capacity Constraint notices
    Reparse {
        /// Max notices to re-parse (default: all stored)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Show scraping statistics
    Stats,
    /// Interpreted notices table
    Overview {
        /// Filter by type ("Capacity Constraint", "Operational Flow Order", "Other")
        #[arg(short, long)]
        r#type: Option<String>,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
    /// Parsed restriction rows for one notice
    Restrictions {
        /// Notice number
        number: String,
    },
    /// Dump notices and restrictions as JSON
    Export {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Scrape { limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let client = fetch::client()?;
            let mut refs = fetch::fetch_notice_list(&client).await?;
            if let Some(n) = limit {
                refs.truncate(n);
            }
            if refs.is_empty() {
                println!("No notices listed.");
                return Ok(());
            }
            println!("Scraping {} notices (streaming to DB)...", refs.len());
            let stats = fetch::scrape_notices_streaming(&conn, &client, refs).await?;
            println!(
                "Done: {} new, {} duplicates, {} errors, {} restriction rows.",
                stats.new, stats.duplicates, stats.errors, stats.restriction_rows
            );
            Ok(())
        }
        Commands::Reparse { limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let notices = db::fetch_capacity_notices(&conn, limit)?;
            if notices.is_empty() {
                println!("No stored Capacity Constraint notices. Run 'scrape' first.");
                return Ok(());
            }
            println!("Re-parsing restrictions for {} notices...", notices.len());
            let (parsed, rows) = reparse_restrictions(&conn, &notices)?;
            println!(
                "Parsed restriction tables for {}/{} notices ({} rows).",
                parsed,
                notices.len(),
                rows
            );
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Notices:      {}", s.total);
            println!("  Capacity:   {}", s.capacity);
            println!("  OFO:        {}", s.ofo);
            println!("  Other:      {}", s.other);
            println!("Restrictions: {}", s.restrictions);
            Ok(())
        }
        Commands::Overview { r#type, limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let rows = db::fetch_overview(&conn, r#type.as_deref(), limit)?;
            if rows.is_empty() {
                println!("No notices found.");
                return Ok(());
            }
            print_overview(r#type.as_deref(), &rows);
            Ok(())
        }
        Commands::Restrictions { number } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let rows = db::fetch_restrictions(&conn, &number)?;
            if rows.is_empty() {
                println!("No restriction rows for notice {}.", number);
                return Ok(());
            }
            print_restrictions(&number, &rows);
            Ok(())
        }
        Commands::Export { output } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let dump = serde_json::json!({
                "notices": db::fetch_all_notices(&conn)?,
                "restrictions": db::fetch_all_restrictions(&conn)?,
            });
            let json = serde_json::to_string_pretty(&dump)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("Exported to {}", path);
                }
                None => println!("{}", json),
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

/// Clear and rebuild the restrictions table from stored notice bodies.
/// Interpretation is pure, so the per-notice parses run on the rayon pool.
fn reparse_restrictions(
    conn: &rusqlite::Connection,
    notices: &[(String, String)],
) -> anyhow::Result<(usize, usize)> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(notices.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    db::clear_restrictions(conn)?;

    let mut parsed = 0usize;
    let mut total_rows = 0usize;

    for chunk in notices.chunks(500) {
        let results: Vec<_> = chunk
            .par_iter()
            .map(|(number, body)| {
                let block = parser::table::restriction_block(body);
                (number.as_str(), parser::table::parse_table(&block))
            })
            .collect();

        for (number, rows) in results {
            if !rows.is_empty() {
                parsed += 1;
                total_rows += rows.len();
                db::insert_restrictions(conn, number, &rows)?;
            }
            pb.inc(1);
        }
    }

    pb.finish_and_clear();
    Ok((parsed, total_rows))
}

fn print_overview(notice_type: Option<&str>, rows: &[db::OverviewRow]) {
    // Column set follows the selected category, like the original report view
    match notice_type {
        Some("Operational Flow Order") => {
            println!(
                "{:>3} | {:<10} | {:<8} | {:<32} | {:<24} | {:<26} | {:<26} | {:<6}",
                "#", "Date", "Number", "Subject", "Gas Day", "OFO Start", "OFO End", "Lifted"
            );
            println!("{}", "-".repeat(152));
            for (i, r) in rows.iter().enumerate() {
                println!(
                    "{:>3} | {:<10} | {:<8} | {:<32} | {:<24} | {:<26} | {:<26} | {:<6}",
                    i + 1,
                    r.date,
                    r.notice_number,
                    truncate(&r.subject, 32),
                    truncate(&r.gas_day, 24),
                    truncate(&r.ofo_start, 26),
                    truncate(&r.ofo_end, 26),
                    if r.ofo_lifted { "yes" } else { "" },
                );
            }
        }
        Some("Capacity Constraint") => {
            println!(
                "{:>3} | {:<10} | {:<8} | {:<40} | {:<24} | {:<10}",
                "#", "Date", "Number", "Subject", "Gas Day", "No-Notice"
            );
            println!("{}", "-".repeat(110));
            for (i, r) in rows.iter().enumerate() {
                println!(
                    "{:>3} | {:<10} | {:<8} | {:<40} | {:<24} | {:<10}",
                    i + 1,
                    r.date,
                    r.notice_number,
                    truncate(&r.subject, 40),
                    truncate(&r.gas_day, 24),
                    r.no_notice_pct,
                );
            }
        }
        _ => {
            println!(
                "{:>3} | {:<22} | {:<10} | {:<8} | {:<40} | {:<20}",
                "#", "Type", "Date", "Number", "Subject", "Gas Day"
            );
            println!("{}", "-".repeat(120));
            for (i, r) in rows.iter().enumerate() {
                println!(
                    "{:>3} | {:<22} | {:<10} | {:<8} | {:<40} | {:<20}",
                    i + 1,
                    r.notice_type,
                    r.date,
                    r.notice_number,
                    truncate(&r.subject, 40),
                    truncate(&r.gas_day, 20),
                );
            }
        }
    }
    println!("\n{} notices", rows.len());
}

fn print_restrictions(number: &str, rows: &[parser::table::RestrictionRow]) {
    println!("Restrictions for notice {}:", number);
    println!(
        "{:<36} | {:<9} | {}",
        "Location",
        "Scheduled",
        parser::table::TIER_SCHEMA
            .iter()
            .map(|t| format!("{:>5}", t))
            .collect::<Vec<_>>()
            .join(" ")
    );
    println!("{}", "-".repeat(100));
    for r in rows {
        println!(
            "{:<36} | {:<9} | {}",
            truncate(&r.location, 36),
            r.scheduled.as_deref().unwrap_or(""),
            r.priorities
                .iter()
                .map(|p| format!("{:>5}", p))
                .collect::<Vec<_>>()
                .join(" ")
        );
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
