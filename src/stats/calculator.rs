//! Notification Statistics Module
//! Computes the dashboard aggregates from cleaned notification records.

use crate::data::NotificationRecord;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use statrs::statistics::Statistics;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// Label used for rows whose connection type is missing.
pub const UNKNOWN_LABEL: &str = "unknown";

/// How many entries each ranked aggregate keeps.
#[derive(Debug, Clone)]
pub struct SummaryOptions {
    pub top_apps: usize,
    pub top_engaging_apps: usize,
    pub top_priority_combinations: usize,
    pub sample_size: usize,
    pub sample_seed: Option<u64>,
    /// Offset the sample times are shown in, matching the hour-of-day column.
    pub utc_offset: FixedOffset,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            top_apps: 10,
            top_engaging_apps: 5,
            top_priority_combinations: 11,
            sample_size: 20,
            sample_seed: None,
            utc_offset: Utc.fix(),
        }
    }
}

/// A label with its number of notifications.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
}

/// A label with its share of the non-missing rows (0.0 to 1.0).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Proportion {
    pub label: String,
    pub share: f64,
}

/// Mean user actions triggered by an application's notifications.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppEngagement {
    pub app_name: String,
    pub mean_actions: f64,
}

/// Number of notifications an application sent at one positive priority.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityCount {
    pub app_name: String,
    pub priority: i64,
    pub count: usize,
}

/// Hour of day with the most notifications.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakHour {
    pub hour: u32,
    pub count: usize,
}

impl PeakHour {
    pub fn label(&self) -> String {
        format!("{}:00H", self.hour)
    }
}

/// First and last notification and the time between them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionSpan {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub days: i64,
    pub hours: i64,
    pub total_hours: i64,
}

impl CollectionSpan {
    pub fn label(&self) -> String {
        format!("{} Dys {} Hrs", self.days, self.hours)
    }
}

/// One row of the random sample table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleRow {
    pub app_name: Option<String>,
    pub post_time: DateTime<FixedOffset>,
    pub title: Option<String>,
    pub priority: Option<i64>,
}

impl SampleRow {
    fn in_offset(record: &NotificationRecord, offset: &FixedOffset) -> Self {
        Self {
            app_name: record.app_name.clone(),
            post_time: record.post_time.with_timezone(offset),
            title: record.title.clone(),
            priority: record.priority,
        }
    }
}

/// Everything the dashboard shows, computed once per load.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub total_notifications: usize,
    pub distinct_apps: usize,
    pub collection_span: Option<CollectionSpan>,
    pub top_app: Option<CategoryCount>,
    pub peak_hour: Option<PeakHour>,
    pub most_frequent_title: Option<String>,
    pub top_apps: Vec<CategoryCount>,
    pub hourly_counts: Vec<usize>,
    pub connection_types: Vec<CategoryCount>,
    pub local_only_share: Vec<Proportion>,
    pub top_engaging_apps: Vec<AppEngagement>,
    pub high_priority: Vec<PriorityCount>,
    pub high_priority_total: usize,
    pub sample: Vec<SampleRow>,
}

impl DashboardSummary {
    pub fn compute(records: &[NotificationRecord], options: &SummaryOptions) -> Self {
        let mut top_engaging_apps = StatsCalculator::mean_actions_per_app(records);
        top_engaging_apps.truncate(options.top_engaging_apps);

        let high_priority_all = StatsCalculator::high_priority_counts(records);
        let high_priority_total = high_priority_all.iter().map(|p| p.count).sum();
        let mut high_priority = high_priority_all;
        high_priority.truncate(options.top_priority_combinations);

        Self {
            total_notifications: records.len(),
            distinct_apps: StatsCalculator::distinct_apps(records),
            collection_span: StatsCalculator::collection_span(records),
            top_app: StatsCalculator::top_apps(records, 1).into_iter().next(),
            peak_hour: StatsCalculator::peak_hour(records),
            most_frequent_title: StatsCalculator::most_frequent_title(records),
            top_apps: StatsCalculator::top_apps(records, options.top_apps),
            hourly_counts: StatsCalculator::hourly_counts(records),
            connection_types: StatsCalculator::connection_type_counts(records),
            local_only_share: StatsCalculator::local_only_proportions(records),
            top_engaging_apps,
            high_priority,
            high_priority_total,
            sample: StatsCalculator::sample_rows(
                records,
                options.sample_size,
                options.sample_seed,
                &options.utc_offset,
            ),
        }
    }
}

/// Handles the aggregate calculations. Every function is pure over the records.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Count occurrences, most frequent first. Equal counts keep the order in
    /// which values first appeared.
    pub fn value_counts<K, I>(values: I) -> Vec<(K, usize)>
    where
        K: Eq + Hash + Clone,
        I: IntoIterator<Item = K>,
    {
        let mut index: HashMap<K, usize> = HashMap::new();
        let mut counts: Vec<(K, usize)> = Vec::new();

        for value in values {
            match index.get(&value) {
                Some(&i) => counts[i].1 += 1,
                None => {
                    index.insert(value.clone(), counts.len());
                    counts.push((value, 1));
                }
            }
        }

        // Stable sort keeps first-seen order among ties
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
    }

    /// Number of distinct application names, ignoring missing names.
    pub fn distinct_apps(records: &[NotificationRecord]) -> usize {
        records
            .iter()
            .filter_map(|r| r.app_name.as_deref())
            .collect::<std::collections::HashSet<_>>()
            .len()
    }

    /// Span between the earliest and latest post time.
    pub fn collection_span(records: &[NotificationRecord]) -> Option<CollectionSpan> {
        let start = records.iter().map(|r| r.post_time).min()?;
        let end = records.iter().map(|r| r.post_time).max()?;

        let elapsed = end - start;
        let days = elapsed.num_days();
        let hours = (elapsed.num_seconds() - days * 86_400) / 3_600;

        Some(CollectionSpan {
            start,
            end,
            days,
            hours,
            total_hours: days * 24 + hours,
        })
    }

    /// Applications ranked by notification volume.
    pub fn top_apps(records: &[NotificationRecord], n: usize) -> Vec<CategoryCount> {
        Self::value_counts(records.iter().filter_map(|r| r.app_name.as_deref()))
            .into_iter()
            .take(n)
            .map(|(label, count)| CategoryCount {
                label: label.to_string(),
                count,
            })
            .collect()
    }

    /// Notifications per hour of day, index 0 to 23.
    pub fn hourly_counts(records: &[NotificationRecord]) -> Vec<usize> {
        let mut counts = vec![0usize; 24];
        for record in records {
            if let Some(slot) = counts.get_mut(record.time_in_hours as usize) {
                *slot += 1;
            }
        }
        counts
    }

    /// Most frequent hour of day.
    pub fn peak_hour(records: &[NotificationRecord]) -> Option<PeakHour> {
        Self::value_counts(records.iter().map(|r| r.time_in_hours))
            .into_iter()
            .next()
            .map(|(hour, count)| PeakHour { hour, count })
    }

    /// Mode of the titles. Among equally frequent titles the smallest wins.
    pub fn most_frequent_title(records: &[NotificationRecord]) -> Option<String> {
        let counts = Self::value_counts(records.iter().filter_map(|r| r.title.as_deref()));
        let best = counts.first()?.1;
        counts
            .iter()
            .filter(|(_, count)| *count == best)
            .map(|(title, _)| *title)
            .min()
            .map(str::to_string)
    }

    /// Notifications per connection type, keys ascending.
    pub fn connection_type_counts(records: &[NotificationRecord]) -> Vec<CategoryCount> {
        let mut groups: BTreeMap<&str, usize> = BTreeMap::new();
        for record in records {
            let key = record.connection_type.as_deref().unwrap_or(UNKNOWN_LABEL);
            *groups.entry(key).or_default() += 1;
        }

        groups
            .into_iter()
            .map(|(label, count)| CategoryCount {
                label: label.to_string(),
                count,
            })
            .collect()
    }

    /// Share of local-only vs push notifications among rows that carry the flag.
    pub fn local_only_proportions(records: &[NotificationRecord]) -> Vec<Proportion> {
        let flags: Vec<bool> = records.iter().filter_map(|r| r.is_local_only).collect();
        if flags.is_empty() {
            return Vec::new();
        }

        let total = flags.len() as f64;
        let mut shares: Vec<Proportion> = Self::value_counts(flags)
            .into_iter()
            .map(|(flag, count)| Proportion {
                label: flag.to_string(),
                share: count as f64 / total,
            })
            .collect();

        shares.sort_by(|a, b| {
            b.share
                .partial_cmp(&a.share)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.label.cmp(&b.label))
        });
        shares
    }

    /// Turn counts into shares of their total, keeping order.
    pub fn shares_from_counts(counts: &[CategoryCount]) -> Vec<Proportion> {
        let total: usize = counts.iter().map(|c| c.count).sum();
        if total == 0 {
            return Vec::new();
        }
        counts
            .iter()
            .map(|c| Proportion {
                label: c.label.clone(),
                share: c.count as f64 / total as f64,
            })
            .collect()
    }

    /// Mean action count per application, rounded to two decimals, highest
    /// first. Rows without an action count are skipped.
    pub fn mean_actions_per_app(records: &[NotificationRecord]) -> Vec<AppEngagement> {
        let mut per_app: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for record in records {
            if let (Some(app), Some(actions)) = (record.app_name.as_deref(), record.action_count) {
                per_app.entry(app).or_default().push(actions as f64);
            }
        }

        let mut engagement: Vec<AppEngagement> = per_app
            .into_iter()
            .map(|(app, values)| AppEngagement {
                app_name: app.to_string(),
                mean_actions: round2(values.iter().mean()),
            })
            .collect();

        // BTreeMap order is by name, so the stable sort breaks ties by name
        engagement.sort_by(|a, b| {
            b.mean_actions
                .partial_cmp(&a.mean_actions)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        engagement
    }

    /// Rows with priority above zero, counted per (application, priority).
    pub fn high_priority_counts(records: &[NotificationRecord]) -> Vec<PriorityCount> {
        let mut groups: BTreeMap<(&str, i64), usize> = BTreeMap::new();
        for record in records {
            if let (Some(app), Some(priority)) = (record.app_name.as_deref(), record.priority) {
                if priority > 0 {
                    *groups.entry((app, priority)).or_default() += 1;
                }
            }
        }

        let mut counts: Vec<PriorityCount> = groups
            .into_iter()
            .map(|((app, priority), count)| PriorityCount {
                app_name: app.to_string(),
                priority,
                count,
            })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        counts
    }

    /// Random rows for the sample table, post times in `offset`. Returns every
    /// row, shuffled, when there are fewer rows than requested.
    pub fn sample_rows(
        records: &[NotificationRecord],
        size: usize,
        seed: Option<u64>,
        offset: &FixedOffset,
    ) -> Vec<SampleRow> {
        let amount = size.min(records.len());
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        rand::seq::index::sample(&mut rng, records.len(), amount)
            .into_iter()
            .map(|i| SampleRow::in_offset(&records[i], offset))
            .collect()
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
