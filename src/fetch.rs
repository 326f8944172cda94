use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use rusqlite::Connection;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::db::{self, NoticeRow};
use crate::listing::{self, NoticeRef};
use crate::parser::{self, NoticeCategory, NoticeFacts};

pub const BASE_URL: &str = "https://infopost.enbridge.com/infopost/";
const LIST_PAGE: &str = "NoticesList.asp";
const PIPELINE: &str = "AG";
const NOTICE_TYPE: &str = "CRI"; // critical notices

const CONCURRENCY: usize = 8;
const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF_MS: u64 = 2000;

pub fn client() -> Result<Client> {
    // The infopost server rejects requests without a browser user agent
    let client = Client::builder()
        .user_agent("Mozilla/5.0")
        .timeout(Duration::from_secs(30))
        .build()?;
    Ok(client)
}

/// Fetch and parse the critical notices list.
pub async fn fetch_notice_list(client: &Client) -> Result<Vec<NoticeRef>> {
    let url = format!("{}{}", BASE_URL, LIST_PAGE);
    info!("Fetching notice list: {}", url);
    let html = client
        .get(&url)
        .query(&[("pipe", PIPELINE), ("type", NOTICE_TYPE)])
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let refs = listing::parse_notice_list(&html, BASE_URL);
    info!("Notices in list: {}", refs.len());
    Ok(refs)
}

struct FetchedNotice {
    notice: NoticeRef,
    body: Option<String>,
    error: Option<String>,
}

pub struct ScrapeStats {
    pub total: usize,
    pub new: usize,
    pub duplicates: usize,
    pub errors: usize,
    pub restriction_rows: usize,
}

/// Fetch detail pages concurrently, interpret each notice as it arrives,
/// and stream the results into the DB.
pub async fn scrape_notices_streaming(
    conn: &Connection,
    client: &Client,
    refs: Vec<NoticeRef>,
) -> Result<ScrapeStats> {
    let total = refs.len();
    let semaphore = Arc::new(Semaphore::new(CONCURRENCY));

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    // Channel: workers send fetched notices, main loop interprets and saves
    let (tx, mut rx) = tokio::sync::mpsc::channel::<FetchedNotice>(CONCURRENCY * 2);

    for notice in refs {
        let client = client.clone();
        let sem = Arc::clone(&semaphore);
        let tx = tx.clone();

        tokio::spawn(async move {
            let _permit = sem.acquire().await.unwrap();
            let fetched = fetch_detail_with_retry(&client, notice).await;
            let _ = tx.send(fetched).await;
        });
    }

    // Drop our copy of tx so rx closes when all spawned tasks finish
    drop(tx);

    let mut stats = ScrapeStats {
        total,
        new: 0,
        duplicates: 0,
        errors: 0,
        restriction_rows: 0,
    };

    while let Some(fetched) = rx.recv().await {
        if fetched.error.is_some() {
            stats.errors += 1;
        }
        save_one(conn, &fetched, &mut stats)?;
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!(
        "Scraped {} notices ({} new, {} duplicates, {} errors)",
        stats.total, stats.new, stats.duplicates, stats.errors
    );

    Ok(stats)
}

fn save_one(conn: &Connection, fetched: &FetchedNotice, stats: &mut ScrapeStats) -> Result<()> {
    let n = &fetched.notice;
    let body = fetched.body.as_deref().unwrap_or("");
    let facts = parser::interpret_raw(body, &n.raw_type, Some(&n.date));
    let category = facts.category();

    let mut row = NoticeRow {
        notice_type: category.as_str().to_string(),
        date: n.date.clone(),
        notice_number: n.number.clone(),
        subject: n.subject.clone(),
        detail_link: n.detail_link.clone(),
        full_notice: fetched.body.clone(),
        gas_day: None,
        no_notice_pct: None,
        ofo_start: None,
        ofo_end: None,
        ofo_lifted: false,
        ofo_lift_ref_date: None,
    };

    let restrictions = match facts {
        NoticeFacts::Ofo(f) => {
            row.gas_day = f.gas_day;
            row.ofo_start = f.ofo_start;
            row.ofo_end = f.ofo_end;
            row.ofo_lifted = f.is_lifted;
            row.ofo_lift_ref_date = f.lift_reference_date;
            Vec::new()
        }
        NoticeFacts::Capacity(f) => {
            row.gas_day = f.gas_day;
            row.no_notice_pct = f.no_notice_pct;
            f.restrictions
        }
        NoticeFacts::Other => Vec::new(),
    };

    if category == NoticeCategory::CapacityConstraint && restrictions.is_empty() {
        warn!("No restrictions parsed: {}", n.subject);
    }

    if db::insert_notice(conn, &row)? {
        stats.new += 1;
        stats.restriction_rows += restrictions.len();
        db::insert_restrictions(conn, &n.number, &restrictions)?;
    } else {
        stats.duplicates += 1;
    }

    Ok(())
}

async fn fetch_detail_with_retry(client: &Client, notice: NoticeRef) -> FetchedNotice {
    let Some(link) = notice.detail_link.clone() else {
        return FetchedNotice {
            notice,
            body: None,
            error: Some("no detail link".to_string()),
        };
    };

    let mut last_error = None;
    for attempt in 0..=MAX_RETRIES {
        match fetch_detail(client, &link).await {
            Ok(body) => {
                return FetchedNotice {
                    notice,
                    body,
                    error: None,
                }
            }
            Err(e) => {
                let retryable = e
                    .downcast_ref::<reqwest::Error>()
                    .and_then(|e| e.status())
                    .map(|s| s.as_u16() == 429 || s.is_server_error())
                    .unwrap_or(false);
                if !retryable || attempt == MAX_RETRIES {
                    last_error = Some(e.to_string());
                    break;
                }
                let backoff = Duration::from_millis(BASE_BACKOFF_MS * 2u64.pow(attempt));
                warn!(
                    "Retrying {} (attempt {}/{}), backing off {:.1}s",
                    notice.number,
                    attempt + 1,
                    MAX_RETRIES,
                    backoff.as_secs_f64()
                );
                tokio::time::sleep(backoff).await;
            }
        }
    }

    FetchedNotice {
        notice,
        body: None,
        error: last_error,
    }
}

async fn fetch_detail(client: &Client, url: &str) -> Result<Option<String>> {
    let html = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    Ok(listing::notice_body_text(&html))
}
