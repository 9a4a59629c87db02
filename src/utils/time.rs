use chrono::{DateTime, FixedOffset, Local};

pub fn time_now() -> String {
    let now = Local::now();
    let now: DateTime<FixedOffset> = now.with_timezone(now.offset());
    now.to_rfc3339()
}
