use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::io::Write;

/// One finished session on the leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub name: String,
    pub score: i64,
    /// Average reaction time in seconds; absent when nothing was pressed
    #[serde(rename = "avg_rt")]
    pub avg_latency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub played_at: Option<DateTime<Local>>,
}

impl RankingEntry {
    pub fn new(name: impl Into<String>, score: i64, avg_latency: Option<f64>) -> Self {
        Self {
            name: name.into(),
            score,
            avg_latency,
            played_at: None,
        }
    }

    pub fn played_at(mut self, at: DateTime<Local>) -> Self {
        self.played_at = Some(at);
        self
    }
}

/// Higher score first, then faster average; entries without an average
/// trail every timed entry with the same score.
pub fn rank_order(a: &RankingEntry, b: &RankingEntry) -> Ordering {
    b.score.cmp(&a.score).then_with(|| {
        a.avg_latency
            .unwrap_or(f64::INFINITY)
            .total_cmp(&b.avg_latency.unwrap_or(f64::INFINITY))
    })
}

const CSV_HEADER: [&str; 5] = ["rank", "name", "score", "avg_rt", "played_at"];

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    rank: usize,
    name: &'a str,
    score: i64,
    avg_rt: Option<String>,
    played_at: Option<String>,
}

/// Ordered leaderboard holding at most one entry per player name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankingLedger {
    entries: Vec<RankingEntry>,
}

impl RankingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from stored entries: later duplicates of a name are dropped and
    /// the result is sorted.
    pub fn from_entries(entries: impl IntoIterator<Item = RankingEntry>) -> Self {
        let mut ledger = Self::new();
        for entry in entries {
            ledger.insert(entry);
        }
        ledger
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Returns false when `name` already has an entry; the first write wins.
    pub fn record(&mut self, name: &str, score: i64, avg_latency: Option<f64>) -> bool {
        self.insert(RankingEntry::new(name, score, avg_latency).played_at(Local::now()))
    }

    pub fn insert(&mut self, entry: RankingEntry) -> bool {
        if self.contains(&entry.name) {
            return false;
        }
        self.entries.push(entry);
        self.sort();
        true
    }

    /// Stable, so entries that compare equal keep their insertion order
    pub fn sort(&mut self) {
        self.entries.sort_by(rank_order);
    }

    pub fn top(&self, n: usize) -> &[RankingEntry] {
        &self.entries[..n.min(self.entries.len())]
    }

    pub fn entries(&self) -> &[RankingEntry] {
        &self.entries
    }

    /// 1-based position of `name`, if present
    pub fn rank_of(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name).map(|i| i + 1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        // header written by hand so an empty ledger still exports one
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        wtr.write_record(CSV_HEADER)?;
        for (i, entry) in self.entries.iter().enumerate() {
            wtr.serialize(CsvRow {
                rank: i + 1,
                name: &entry.name,
                score: entry.score,
                avg_rt: entry.avg_latency.map(|v| format!("{v:.3}")),
                played_at: entry.played_at.map(|t| t.to_rfc3339()),
            })?;
        }
        wtr.flush()?;
        Ok(())
    }
}
