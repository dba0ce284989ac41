//! Date extraction (spec §4.3.7, testable property §8.11). Collects
//! candidates from meta tags, `<time datetime>`, embedded structured-data
//! blocks, and a URL date; buckets them by whether they are clearly a
//! "published" or "modified" signal or merely neutral; and falls back to
//! scanning body text for a date pattern near a cue word when nothing
//! structured is found. Grounded on
//! `rootsignal-archive::services::page::extract_published_date`'s
//! regex-over-meta-tags approach, generalized to the bucketing and
//! text-inference rules the spec adds.

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
    Published,
    Modified,
    Neutral,
}

struct DateCandidate {
    at: DateTime<Utc>,
    bucket: Bucket,
}

/// Meta `property`/`name` keys mapped to their bucket (spec §4.3.7 closed key list).
const META_KEYS: &[(&str, Bucket)] = &[
    ("article:published_time", Bucket::Published),
    ("article:modified_time", Bucket::Modified),
    ("datepublished", Bucket::Published),
    ("dc.date.issued", Bucket::Published),
    ("publishdate", Bucket::Published),
    ("publish_date", Bucket::Published),
    ("pubdate", Bucket::Published),
    ("updated", Bucket::Modified),
    ("lastmod", Bucket::Modified),
    ("date", Bucket::Neutral),
];

/// JSON-LD / embedded structured-data keys mapped to their bucket.
const STRUCTURED_KEYS: &[(&str, Bucket)] = &[
    ("datePublished", Bucket::Published),
    ("dateCreated", Bucket::Published),
    ("uploadDate", Bucket::Published),
    ("dateModified", Bucket::Modified),
];

fn min_date() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap().and_utc()
}

fn max_date() -> DateTime<Utc> {
    Utc::now() + chrono::Duration::days(2)
}

fn plausible(dt: DateTime<Utc>) -> bool {
    dt >= min_date() && dt <= max_date()
}

/// Parse a date string trying RFC3339, naive datetime, date-only, and US
/// "Month D, YYYY" forms, matching the teacher's `parse_date`.
pub fn parse_date_str(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%B %d, %Y") {
        return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    None
}

fn meta_candidates(html: &str) -> Vec<DateCandidate> {
    let mut out = Vec::new();
    for (key, bucket) in META_KEYS {
        let pattern_prop = format!(r#"(?i)<meta[^>]*(?:property|name)\s*=\s*["']{key}["'][^>]*content\s*=\s*["']([^"']+)["']"#);
        let pattern_rev = format!(r#"(?i)<meta[^>]*content\s*=\s*["']([^"']+)["'][^>]*(?:property|name)\s*=\s*["']{key}["']"#);
        for pattern in [pattern_prop, pattern_rev] {
            let Ok(re) = Regex::new(&pattern) else { continue };
            if let Some(cap) = re.captures(html) {
                if let Some(dt) = parse_date_str(&cap[1]) {
                    if plausible(dt) {
                        out.push(DateCandidate { at: dt, bucket: *bucket });
                    }
                }
            }
        }
    }
    out
}

fn time_element_candidates(html: &str) -> Vec<DateCandidate> {
    let Ok(re) = Regex::new(r#"(?i)<time[^>]*datetime\s*=\s*["']([^"']+)["']"#) else { return Vec::new() };
    re.captures_iter(html)
        .filter_map(|cap| parse_date_str(&cap[1]))
        .filter(|dt| plausible(*dt))
        .map(|at| DateCandidate { at, bucket: Bucket::Neutral })
        .collect()
}

fn structured_data_candidates(html: &str) -> Vec<DateCandidate> {
    let Ok(script_re) = Regex::new(r#"(?si)<script[^>]*type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for cap in script_re.captures_iter(html) {
        let Ok(value) = serde_json::from_str::<serde_json::Value>(&cap[1]) else { continue };
        collect_structured_dates(&value, &mut out);
    }
    out
}

fn collect_structured_dates(value: &serde_json::Value, out: &mut Vec<DateCandidate>) {
    for (key, bucket) in STRUCTURED_KEYS {
        if let Some(s) = value.get(key).and_then(|v| v.as_str()) {
            if let Some(dt) = parse_date_str(s) {
                if plausible(dt) {
                    out.push(DateCandidate { at: dt, bucket: *bucket });
                }
            }
        }
    }
    if let Some(graph) = value.get("@graph").and_then(|v| v.as_array()) {
        for item in graph {
            collect_structured_dates(item, out);
        }
    }
}

fn url_date_candidate(url: &str) -> Option<DateCandidate> {
    let re_path = Regex::new(r"/(\d{4})/(\d{2})/(\d{2})/").ok()?;
    let re_dash = Regex::new(r"(\d{4})-(\d{2})-(\d{2})").ok()?;

    let cap = re_path.captures(url).or_else(|| re_dash.captures(url))?;
    let year: i32 = cap[1].parse().ok()?;
    let month: u32 = cap[2].parse().ok()?;
    let day: u32 = cap[3].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let dt = date.and_hms_opt(0, 0, 0)?.and_utc();
    plausible(dt).then_some(DateCandidate { at: dt, bucket: Bucket::Neutral })
}

/// Resolved published/modified dates from structured sources (spec §4.3.7
/// bucketing rule: `published = latest(published) ?? latest(neutral)`,
/// `modified = latest(modified) ?? latest(all)`).
pub struct ResolvedDates {
    pub published_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
}

fn latest(candidates: impl Iterator<Item = DateTime<Utc>>) -> Option<DateTime<Utc>> {
    candidates.max()
}

/// Extract structured dates (steps (i)-(iv) of spec §4.3.7); falls back to
/// [`infer_date_from_text`] only when the caller finds no structured date.
pub fn extract_structured_dates(html: &str, request_url: &str) -> ResolvedDates {
    let mut candidates = Vec::new();
    candidates.extend(meta_candidates(html));
    candidates.extend(time_element_candidates(html));
    candidates.extend(structured_data_candidates(html));
    candidates.extend(url_date_candidate(request_url));

    let published: Vec<DateTime<Utc>> = candidates.iter().filter(|c| c.bucket == Bucket::Published).map(|c| c.at).collect();
    let modified: Vec<DateTime<Utc>> = candidates.iter().filter(|c| c.bucket == Bucket::Modified).map(|c| c.at).collect();
    let neutral: Vec<DateTime<Utc>> = candidates.iter().filter(|c| c.bucket == Bucket::Neutral).map(|c| c.at).collect();
    let all: Vec<DateTime<Utc>> = candidates.iter().map(|c| c.at).collect();

    let published_at = latest(published.into_iter()).or_else(|| latest(neutral.into_iter()));
    let modified_at = latest(modified.into_iter()).or_else(|| latest(all.into_iter()));

    ResolvedDates { published_at, modified_at }
}

const MONTHS: &[&str] = &[
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december",
];

fn month_index(name: &str) -> Option<u32> {
    MONTHS.iter().position(|m| *m == name.to_lowercase()).map(|i| i as u32 + 1)
}

struct TextMatch {
    at: DateTime<Utc>,
    offset: usize,
}

fn find_iso_dates(text: &str) -> Vec<TextMatch> {
    let Ok(re) = Regex::new(r"20\d{2}-\d{2}-\d{2}") else { return Vec::new() };
    re.find_iter(text)
        .filter_map(|m| parse_date_str(m.as_str()).map(|at| TextMatch { at, offset: m.start() }))
        .collect()
}

fn find_month_name_dates(text: &str) -> Vec<TextMatch> {
    let Ok(re) = Regex::new(r"(?i)(January|February|March|April|May|June|July|August|September|October|November|December)\s+(\d{1,2}),?\s+(20\d{2})") else {
        return Vec::new();
    };
    re.captures_iter(text)
        .filter_map(|cap| {
            let month = month_index(&cap[1])?;
            let day: u32 = cap[2].parse().ok()?;
            let year: i32 = cap[3].parse().ok()?;
            let date = NaiveDate::from_ymd_opt(year, month, day)?;
            let at = date.and_hms_opt(0, 0, 0)?.and_utc();
            let offset = cap.get(0)?.start();
            Some(TextMatch { at, offset })
        })
        .collect()
}

const CUE_WORDS: &[&str] = &["published", "posted", "updated", "date"];

/// Score a text date match by proximity to a cue word, position in the
/// document, and recency (spec §4.3.7 text-inference scoring).
fn score_match(text: &str, m: &TextMatch) -> f64 {
    let window_before = text.get(m.offset.saturating_sub(80)..m.offset).unwrap_or("").to_lowercase();
    let window_after = text.get(m.offset..(m.offset + 60).min(text.len())).unwrap_or("").to_lowercase();

    let mut score = 0.0;
    if CUE_WORDS.iter().any(|w| window_before.contains(w) || window_after.contains(w)) {
        score += 0.5;
    }
    if m.offset < 1200 {
        score += 0.25;
    }
    let two_years_ago = Utc::now() - chrono::Duration::days(365 * 2);
    if m.at >= two_years_ago && m.at <= max_date() {
        score += 0.25;
    }
    score
}

const TEXT_SCAN_LEN: usize = 5000;
const TEXT_SCORE_THRESHOLD: f64 = 0.65;

/// Infer a date from body text (spec §4.3.7 last resort) when no
/// structured date was found: scan the first 5000 characters for an ISO or
/// "Month D, YYYY" pattern, score each match, and accept the best if its
/// score clears the threshold.
pub fn infer_date_from_text(body: &str) -> Option<DateTime<Utc>> {
    let scan = body.get(..TEXT_SCAN_LEN.min(body.len())).unwrap_or(body);

    let mut matches = find_iso_dates(scan);
    matches.extend(find_month_name_dates(scan));
    matches.retain(|m| plausible(m.at));

    matches
        .iter()
        .map(|m| (score_match(scan, m), m.at))
        .filter(|(score, _)| *score >= TEXT_SCORE_THRESHOLD)
        .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap())
        .map(|(_, at)| at)
}
