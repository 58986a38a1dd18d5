use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

/// 日付キーおよび見出しに利用する日付の書式。
const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

#[cfg(not(test))]
/// 現在のUTC時間を取得する。
pub fn now() -> DateTime<Utc> {
    Utc::now()
}


#[cfg(test)]
pub use mock_datetime::now;

/// 指定したタイムゾーンでの日付の00:00:00を返す。
///
/// 夏時間の切り替えで00:00:00が存在しない場合は、その日の最初に存在する時刻を利用する。
/// 00:00:00が2回ある場合は早い方を利用する。
///
/// # Arguments
///
/// * `tz` - 日の境界を決めるタイムゾーン
/// * `date` - 対象の日付
pub fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Tz> {
    let midnight = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| {
            tz.from_local_datetime(&(midnight + Duration::hours(1)))
                .earliest()
        })
        .unwrap_or_else(|| tz.from_utc_datetime(&midnight))
}

/// `YYYY-M-D`または`YYYY-MM-DD`形式の日付をパースする。
///
/// 年は4桁、月と日は1桁または2桁の数字のみを受け付ける。
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let fields: Vec<&str> = s.split('-').collect();
    let valid = match fields.as_slice() {
        [year, month, day] => {
            is_digits(year, 4, 4) && is_digits(month, 1, 2) && is_digits(day, 1, 2)
        }
        _ => false,
    };
    if !valid {
        return None;
    }

    NaiveDate::parse_from_str(s, DATE_KEY_FORMAT).ok()
}

fn is_digits(s: &str, min_len: usize, max_len: usize) -> bool {
    (min_len..=max_len).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
}

/// 集計キーおよび見出しに利用する`YYYY-MM-DD`形式の文字列を返す。
pub fn date_key(date: &NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}
