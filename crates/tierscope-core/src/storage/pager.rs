//! Paginated range scans over a capped storage query

use alloc::vec::Vec;

use log::debug;

use super::{Reading, ReadingStore, StoreError, TimeRange};

/// Fetch every reading of `range`, one capped page at a time
///
/// Each page resumes at the timestamp of the previous page's last reading.
/// Readings sharing that timestamp which were already collected are skipped,
/// so duplicate timestamps come back exactly once each.
pub fn scan_range<S>(
    store: &S,
    sensor_id: &str,
    tier: u32,
    range: TimeRange,
    page_size: usize,
) -> Result<Vec<Reading>, StoreError>
where
    S: ReadingStore + ?Sized,
{
    let page_size = page_size.max(1);
    let mut readings = Vec::new();
    let mut cursor = range.start;
    let mut already_seen = 0usize;
    let mut pages = 0usize;

    loop {
        let request = page_size + already_seen;
        let page = store.query_range(sensor_id, tier, TimeRange::new(cursor, range.end), request)?;
        pages += 1;

        let fetched = page.len();
        if fetched > already_seen {
            readings.extend_from_slice(&page[already_seen..]);
        }

        if fetched < request {
            break;
        }

        // Full page: more may follow at or after the last timestamp
        let last = page[fetched - 1].timestamp;
        already_seen = page.iter().rev().take_while(|r| r.timestamp == last).count();
        cursor = last;
    }

    if pages > 1 {
        debug!(
            " Scanned {} tier {} {} in {} pages ({} readings)",
            sensor_id,
            tier,
            range,
            pages,
            readings.len()
        );
    }
    Ok(readings)
}
