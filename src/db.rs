use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::parser::table::RestrictionRow;

const DB_PATH: &str = "data/notices.sqlite";

pub fn connect() -> Result<Connection> {
    if let Some(dir) = std::path::Path::new(DB_PATH).parent() {
        std::fs::create_dir_all(dir)?;
    }
    let conn = Connection::open(DB_PATH)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS notices (
            id                INTEGER PRIMARY KEY,
            type              TEXT NOT NULL,
            date              TEXT,
            notice_number     TEXT,
            subject           TEXT,
            detail_link       TEXT,
            full_notice       TEXT,
            gas_day           TEXT,
            no_notice_pct     TEXT,
            ofo_start         TEXT,
            ofo_end           TEXT,
            ofo_lifted        BOOLEAN NOT NULL DEFAULT 0,
            ofo_lift_ref_date TEXT,
            url_hash          TEXT UNIQUE,
            scraped_at        TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_notices_type ON notices(type);
        CREATE INDEX IF NOT EXISTS idx_notices_number ON notices(notice_number);

        CREATE TABLE IF NOT EXISTS restrictions (
            id            INTEGER PRIMARY KEY,
            notice_number TEXT NOT NULL,
            location      TEXT NOT NULL,
            scheduled     TEXT,
            ao            TEXT,
            it            TEXT,
            p3b           TEXT,
            p3a           TEXT,
            p2c           TEXT,
            p2b           TEXT,
            p2a           TEXT,
            p1            TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_restrictions_notice ON restrictions(notice_number);
        ",
    )?;
    Ok(())
}

/// SHA-256 of the detail link, the dedup key for re-scrapes.
pub fn hash_url(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Flat persistence shape of one interpreted notice. Category-irrelevant
/// columns are NULL; the typed view lives in `parser::NoticeFacts`.
#[derive(Debug, Clone, Serialize)]
pub struct NoticeRow {
    pub notice_type: String,
    pub date: String,
    pub notice_number: String,
    pub subject: String,
    pub detail_link: Option<String>,
    pub full_notice: Option<String>,
    pub gas_day: Option<String>,
    pub no_notice_pct: Option<String>,
    pub ofo_start: Option<String>,
    pub ofo_end: Option<String>,
    pub ofo_lifted: bool,
    pub ofo_lift_ref_date: Option<String>,
}

/// Insert one notice; returns false when the url_hash already exists.
pub fn insert_notice(conn: &Connection, row: &NoticeRow) -> Result<bool> {
    let url_hash = row.detail_link.as_deref().map(hash_url);
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO notices (
            type, date, notice_number, subject, detail_link, full_notice,
            gas_day, no_notice_pct, ofo_start, ofo_end, ofo_lifted,
            ofo_lift_ref_date, url_hash
         ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13)",
        rusqlite::params![
            row.notice_type,
            row.date,
            row.notice_number,
            row.subject,
            row.detail_link,
            row.full_notice,
            row.gas_day,
            row.no_notice_pct,
            row.ofo_start,
            row.ofo_end,
            row.ofo_lifted,
            row.ofo_lift_ref_date,
            url_hash,
        ],
    )?;
    Ok(inserted > 0)
}

pub fn insert_restrictions(
    conn: &Connection,
    notice_number: &str,
    rows: &[RestrictionRow],
) -> Result<()> {
    if rows.is_empty() {
        return Ok(());
    }
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO restrictions (
                notice_number, location, scheduled,
                ao, it, p3b, p3a, p2c, p2b, p2a, p1
             ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11)",
        )?;
        for r in rows {
            let p = &r.priorities;
            stmt.execute(rusqlite::params![
                notice_number, r.location, r.scheduled,
                p[0], p[1], p[2], p[3], p[4], p[5], p[6], p[7],
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

pub fn clear_restrictions(conn: &Connection) -> Result<()> {
    conn.execute("DELETE FROM restrictions", [])?;
    Ok(())
}

/// Stored Capacity Constraint notices, for the reparse pass.
pub fn fetch_capacity_notices(
    conn: &Connection,
    limit: Option<usize>,
) -> Result<Vec<(String, String)>> {
    let sql = format!(
        "SELECT notice_number, full_notice
         FROM notices
         WHERE LOWER(TRIM(type)) = 'capacity constraint'
           AND full_notice IS NOT NULL
         ORDER BY id{}",
        match limit {
            Some(n) => format!(" LIMIT {}", n),
            None => String::new(),
        }
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Overview ──

pub struct OverviewRow {
    pub notice_type: String,
    pub date: String,
    pub notice_number: String,
    pub subject: String,
    pub gas_day: String,
    pub no_notice_pct: String,
    pub ofo_start: String,
    pub ofo_end: String,
    pub ofo_lifted: bool,
}

pub fn fetch_overview(
    conn: &Connection,
    notice_type: Option<&str>,
    limit: usize,
) -> Result<Vec<OverviewRow>> {
    let where_clause = match notice_type {
        Some(_) => " WHERE type = ?1",
        None => "",
    };
    let sql = format!(
        "SELECT type, COALESCE(date,''), COALESCE(notice_number,''),
                COALESCE(subject,''), COALESCE(gas_day,''),
                COALESCE(no_notice_pct,''), COALESCE(ofo_start,''),
                COALESCE(ofo_end,''), ofo_lifted
         FROM notices{}
         ORDER BY date DESC, id DESC
         LIMIT {}",
        where_clause, limit
    );

    let mut stmt = conn.prepare(&sql)?;
    let map_row = |row: &rusqlite::Row| {
        Ok(OverviewRow {
            notice_type: row.get(0)?,
            date: row.get(1)?,
            notice_number: row.get(2)?,
            subject: row.get(3)?,
            gas_day: row.get(4)?,
            no_notice_pct: row.get(5)?,
            ofo_start: row.get(6)?,
            ofo_end: row.get(7)?,
            ofo_lifted: row.get(8)?,
        })
    };
    let rows = match notice_type {
        Some(t) => stmt
            .query_map(rusqlite::params![t], map_row)?
            .collect::<Result<Vec<_>, _>>()?,
        None => stmt
            .query_map([], map_row)?
            .collect::<Result<Vec<_>, _>>()?,
    };
    Ok(rows)
}

/// Restriction rows for one notice, in insertion order.
pub fn fetch_restrictions(conn: &Connection, notice_number: &str) -> Result<Vec<RestrictionRow>> {
    let mut stmt = conn.prepare(
        "SELECT location, scheduled, ao, it, p3b, p3a, p2c, p2b, p2a, p1
         FROM restrictions WHERE notice_number = ?1 ORDER BY id",
    )?;
    let rows = stmt
        .query_map(rusqlite::params![notice_number], |row| {
            Ok(RestrictionRow {
                location: row.get(0)?,
                scheduled: row.get(1)?,
                priorities: [
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                    row.get(8)?,
                    row.get(9)?,
                ],
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Export ──

#[derive(Serialize)]
pub struct ExportRestriction {
    pub notice_number: String,
    pub location: String,
    pub scheduled: Option<String>,
    pub priorities: [String; 8],
}

pub fn fetch_all_notices(conn: &Connection) -> Result<Vec<NoticeRow>> {
    let mut stmt = conn.prepare(
        "SELECT type, COALESCE(date,''), COALESCE(notice_number,''),
                COALESCE(subject,''), detail_link, full_notice, gas_day,
                no_notice_pct, ofo_start, ofo_end, ofo_lifted, ofo_lift_ref_date
         FROM notices ORDER BY id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(NoticeRow {
                notice_type: row.get(0)?,
                date: row.get(1)?,
                notice_number: row.get(2)?,
                subject: row.get(3)?,
                detail_link: row.get(4)?,
                full_notice: row.get(5)?,
                gas_day: row.get(6)?,
                no_notice_pct: row.get(7)?,
                ofo_start: row.get(8)?,
                ofo_end: row.get(9)?,
                ofo_lifted: row.get(10)?,
                ofo_lift_ref_date: row.get(11)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn fetch_all_restrictions(conn: &Connection) -> Result<Vec<ExportRestriction>> {
    let mut stmt = conn.prepare(
        "SELECT notice_number, location, scheduled, ao, it, p3b, p3a, p2c, p2b, p2a, p1
         FROM restrictions ORDER BY id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ExportRestriction {
                notice_number: row.get(0)?,
                location: row.get(1)?,
                scheduled: row.get(2)?,
                priorities: [
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                    row.get(8)?,
                    row.get(9)?,
                    row.get(10)?,
                ],
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub total: usize,
    pub capacity: usize,
    pub ofo: usize,
    pub other: usize,
    pub restrictions: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let total: usize = conn.query_row("SELECT COUNT(*) FROM notices", [], |r| r.get(0))?;
    let capacity: usize = conn.query_row(
        "SELECT COUNT(*) FROM notices WHERE type = 'Capacity Constraint'",
        [],
        |r| r.get(0),
    )?;
    let ofo: usize = conn.query_row(
        "SELECT COUNT(*) FROM notices WHERE type = 'Operational Flow Order'",
        [],
        |r| r.get(0),
    )?;
    let restrictions: usize =
        conn.query_row("SELECT COUNT(*) FROM restrictions", [], |r| r.get(0))?;
    Ok(Stats {
        total,
        capacity,
        ofo,
        other: total - capacity - ofo,
        restrictions,
    })
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn sample_row(link: &str) -> NoticeRow {
        NoticeRow {
            notice_type: "Capacity Constraint".into(),
            date: "07/03/2024".into(),
            notice_number: "12345".into(),
            subject: "AGT Capacity Constraint".into(),
            detail_link: Some(link.into()),
            full_notice: Some("For Gas Day July 4, 2024".into()),
            gas_day: Some("July 4, 2024".into()),
            no_notice_pct: Some("85%".into()),
            ofo_start: None,
            ofo_end: None,
            ofo_lifted: false,
            ofo_lift_ref_date: None,
        }
    }

    #[test]
    fn duplicate_links_deduped_by_hash() {
        let conn = test_conn();
        let row = sample_row("https://example.com/detail?id=1");
        assert!(insert_notice(&conn, &row).unwrap());
        assert!(!insert_notice(&conn, &row).unwrap());
        let stats = get_stats(&conn).unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.capacity, 1);
    }

    #[test]
    fn restrictions_round_trip() {
        let conn = test_conn();
        let rows = vec![RestrictionRow {
            location: "Algonquin Citygate".into(),
            scheduled: Some("Yes".into()),
            priorities: [
                "50%".into(),
                "40%".into(),
                "30%".into(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
            ],
        }];
        insert_restrictions(&conn, "12345", &rows).unwrap();
        let back = fetch_restrictions(&conn, "12345").unwrap();
        assert_eq!(back, rows);
        clear_restrictions(&conn).unwrap();
        assert!(fetch_restrictions(&conn, "12345").unwrap().is_empty());
    }
}
