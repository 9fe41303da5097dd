use chrono::Local;
use num_format::{CustomFormat, Grouping, ToFormattedString};

pub(super) fn format_count(count: u64) -> String {
    let fmt = CustomFormat::builder()
        .grouping(Grouping::Standard)
        .separator("_")
        .build()
        .unwrap();
    count.to_formatted_string(&fmt)
}

pub(super) fn local_time() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
}
