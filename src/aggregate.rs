use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::datetime::date_key;
use crate::summary_entry::SummaryEntry;

/// プロジェクト内のタスクごとの集計結果。
#[derive(Clone, Debug, PartialEq)]
pub struct TaskBucket {
    pub name: String,
    pub total: Duration,
}

/// プロジェクトごとの集計結果。`total`は`tasks`の合計と一致する。
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectBucket {
    pub name: String,
    pub total: Duration,
    pub tasks: Vec<TaskBucket>,
}

/// プロジェクトに関係なくタスク名で集計した結果。
#[derive(Clone, Debug, PartialEq)]
pub struct TaskSummary {
    pub name: String,
    pub total: Duration,
    pub first_start: DateTime<Utc>,
}

/// 日付ごと(日毎集計でない場合は全体)の集計結果。
#[derive(Clone, Debug, PartialEq)]
pub struct Bucket {
    /// `YYYY-MM-DD`形式の日付。日毎集計でない場合は空文字。
    pub date: String,
    pub projects: Vec<ProjectBucket>,
    pub tasks: Vec<TaskSummary>,
}

#[derive(Default)]
struct DateGroup {
    projects: HashMap<String, HashMap<String, Duration>>,
    tasks: HashMap<String, (Duration, DateTime<Utc>)>,
}

/// エントリーを日付、プロジェクト、タスクごとに集計する。
///
/// 並び順は次の通り。
///
/// - 日付: 昇順
/// - プロジェクト: 合計時間の降順、同じ場合は名前の昇順
/// - プロジェクト内のタスク: 名前の昇順
/// - タスク集計: 最初の開始時刻の昇順、同じ場合は名前の昇順
///
/// # Arguments
///
/// * `entries` - 集計対象のエントリー
/// * `daily` - 日付ごとに集計するかどうか
/// * `tz` - 日付を決めるタイムゾーン
pub fn aggregate<Tz: TimeZone>(entries: &[SummaryEntry], daily: bool, tz: &Tz) -> Vec<Bucket> {
    let grouped: BTreeMap<String, DateGroup> =
        entries
            .iter()
            .fold(BTreeMap::new(), |mut accumulate, entry| {
                let key = if daily {
                    date_key(&entry.start.with_timezone(tz).date_naive())
                } else {
                    String::new()
                };
                let group = accumulate.entry(key).or_insert_with(DateGroup::default);

                let task_total = group
                    .projects
                    .entry(entry.project.clone())
                    .or_default()
                    .entry(entry.task.clone())
                    .or_insert_with(Duration::zero);
                *task_total = *task_total + entry.duration;

                group
                    .tasks
                    .entry(entry.task.clone())
                    .and_modify(|(total, first_start)| {
                        *total = *total + entry.duration;
                        if entry.start < *first_start {
                            *first_start = entry.start;
                        }
                    })
                    .or_insert((entry.duration, entry.start));

                accumulate
            });

    grouped
        .into_iter()
        .map(|(date, group)| group.into_bucket(date))
        .collect()
}

impl DateGroup {
    fn into_bucket(self, date: String) -> Bucket {
        let mut projects: Vec<ProjectBucket> = self
            .projects
            .into_iter()
            .map(|(name, tasks)| {
                let mut tasks: Vec<TaskBucket> = tasks
                    .into_iter()
                    .map(|(name, total)| TaskBucket { name, total })
                    .collect();
                tasks.sort_by(|a, b| a.name.cmp(&b.name));
                let total = tasks
                    .iter()
                    .fold(Duration::zero(), |acc, task| acc + task.total);

                ProjectBucket { name, total, tasks }
            })
            .collect();
        projects.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));

        let mut tasks: Vec<TaskSummary> = self
            .tasks
            .into_iter()
            .map(|(name, (total, first_start))| TaskSummary {
                name,
                total,
                first_start,
            })
            .collect();
        tasks.sort_by(|a, b| {
            a.first_start
                .cmp(&b.first_start)
                .then_with(|| a.name.cmp(&b.name))
        });

        Bucket {
            date,
            projects,
            tasks,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};

    use super::{aggregate, Bucket};
    use crate::datetime::date_key;
    use crate::summary_entry::SummaryEntry;

    fn entry(project: &str, task: &str, start: DateTime<Utc>, minutes: i64) -> SummaryEntry {
        SummaryEntry {
            project: project.to_string(),
            task: task.to_string(),
            start,
            duration: Duration::minutes(minutes),
        }
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, day, hour, 0, 0).unwrap()
    }

    fn sum<I: Iterator<Item = Duration>>(durations: I) -> Duration {
        durations.fold(Duration::zero(), |acc, d| acc + d)
    }

    /// バケットの合計時間が、そのバケットに含まれる入力の作業時間の合計と一致することを確認する。
    ///
    /// 日付が空のバケットは全ての入力を含む。
    fn assert_totals_consistent<Tz: TimeZone>(
        bucket: &Bucket,
        entries: &[SummaryEntry],
        tz: &Tz,
    ) {
        let input_sum = sum(
            entries
                .iter()
                .filter(|e| {
                    bucket.date.is_empty()
                        || date_key(&e.start.with_timezone(tz).date_naive()) == bucket.date
                })
                .map(|e| e.duration),
        );
        let project_sum = sum(bucket.projects.iter().map(|p| p.total));
        let task_sum = sum(bucket.tasks.iter().map(|t| t.total));
        assert_eq!(project_sum, input_sum);
        assert_eq!(task_sum, input_sum);
        for project in &bucket.projects {
            assert_eq!(project.total, sum(project.tasks.iter().map(|t| t.total)));
        }
    }

    #[test]
    fn test_empty() {
        assert!(aggregate(&[], true, &Utc).is_empty());
        assert!(aggregate(&[], false, &Utc).is_empty());
    }

    /// 日毎集計でない場合は、日付が空の1つのバケットになることを確認する。
    #[test]
    fn test_single_bucket() {
        let entries = [
            entry("Alpha", "Design", at(10, 9), 90),
            entry("Alpha", "Build", at(10, 11), 30),
            entry("No Project", "No Description", at(10, 12), 60),
            entry("Alpha", "Design", at(11, 9), 30),
        ];

        let buckets = aggregate(&entries, false, &Utc);

        assert_eq!(buckets.len(), 1);
        let bucket = &buckets[0];
        assert_eq!(bucket.date, "");
        assert_eq!(bucket.projects[0].name, "Alpha");
        assert_eq!(bucket.projects[0].total, Duration::minutes(150));
        let task_names: Vec<_> = bucket.projects[0].tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(task_names, vec!["Build", "Design"]);
        assert_eq!(bucket.projects[1].name, "No Project");
        let summary_names: Vec<_> = bucket.tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(summary_names, vec!["Design", "Build", "No Description"]);
        assert_eq!(bucket.tasks[0].total, Duration::minutes(120));
        assert_eq!(bucket.tasks[0].first_start, at(10, 9));
        assert_totals_consistent(bucket, &entries, &Utc);
    }

    /// 日付はタイムゾーンで決まり、昇順に並ぶことを確認する。
    #[test]
    fn test_daily_buckets() {
        let jst = FixedOffset::east_opt(9 * 3600).unwrap();
        let entries = [
            // JSTの2026-01-11 01:00
            entry("Alpha", "Build", at(10, 16), 30),
            // JSTの2026-01-10 18:00
            entry("Alpha", "Design", at(10, 9), 90),
        ];

        let buckets = aggregate(&entries, true, &jst);

        let dates: Vec<_> = buckets.iter().map(|b| b.date.as_str()).collect();
        assert_eq!(dates, vec!["2026-01-10", "2026-01-11"]);
        assert_eq!(buckets[0].projects[0].tasks[0].name, "Design");
        assert_eq!(buckets[1].projects[0].tasks[0].name, "Build");
        assert_eq!(buckets[0].projects[0].total, Duration::minutes(90));
        for bucket in &buckets {
            assert_totals_consistent(bucket, &entries, &jst);
        }
    }

    /// プロジェクトは合計時間の降順、同じ場合は名前の昇順となることを確認する。
    #[test]
    fn test_project_order() {
        let entries = [
            entry("Charlie", "a", at(10, 9), 30),
            entry("Bravo", "a", at(10, 10), 60),
            entry("Alpha", "b", at(10, 11), 30),
            entry("Delta", "c", at(10, 12), 10),
        ];

        let buckets = aggregate(&entries, false, &Utc);

        let names: Vec<_> = buckets[0].projects.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Bravo", "Alpha", "Charlie", "Delta"]);
        assert_totals_consistent(&buckets[0], &entries, &Utc);
    }

    /// 同じ開始時刻のタスクは名前の昇順となることを確認する。
    #[test]
    fn test_task_summary_tie_break() {
        let entries = [
            entry("Alpha", "zeta", at(10, 9), 30),
            entry("Beta", "alpha", at(10, 9), 30),
            entry("Alpha", "early", at(10, 8), 5),
        ];

        let buckets = aggregate(&entries, false, &Utc);

        let names: Vec<_> = buckets[0].tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["early", "alpha", "zeta"]);
        assert_totals_consistent(&buckets[0], &entries, &Utc);
    }

    /// 同じタスク名は異なるプロジェクトでもタスク集計では1つにまとめることを確認する。
    #[test]
    fn test_task_summary_merges_projects() {
        let entries = [
            entry("Alpha", "Review", at(10, 10), 30),
            entry("Beta", "Review", at(10, 9), 15),
        ];

        let buckets = aggregate(&entries, false, &Utc);

        assert_eq!(buckets[0].tasks.len(), 1);
        assert_eq!(buckets[0].tasks[0].total, Duration::minutes(45));
        assert_eq!(buckets[0].tasks[0].first_start, at(10, 9));
        assert_eq!(buckets[0].projects.len(), 2);
        assert_totals_consistent(&buckets[0], &entries, &Utc);
    }

    /// 日毎に分割したエントリーの合計が、各日のバケットの合計と一致することを確認する。
    #[test]
    fn test_daily_totals_match_split_entries() {
        let entries = crate::day_split::split_entries_by_day(
            &[
                entry("Alpha", "Design", at(10, 22), 180),
                entry("Beta", "Review", at(11, 9), 45),
            ],
            &Utc,
        );

        let buckets = aggregate(&entries, true, &Utc);

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].projects[0].total, Duration::minutes(120));
        assert_eq!(buckets[1].tasks.len(), 2);
        for bucket in &buckets {
            assert_totals_consistent(bucket, &entries, &Utc);
        }
    }
}
