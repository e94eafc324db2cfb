use time::format_description::{self, BorrowedFormatItem};
use time::OffsetDateTime;

/// Export `var` to the crate, formatted from the build clock unless the
/// environment pins it (reproducible builds).
fn stamp(var: &str, now: OffsetDateTime, pattern: &str) {
    println!("cargo:rerun-if-env-changed={}", var);
    let value = std::env::var(var).unwrap_or_else(|_| {
        format_description::parse_borrowed::<2>(pattern)
            .ok()
            .and_then(|items: Vec<BorrowedFormatItem<'_>>| now.format(&items).ok())
            .unwrap_or_else(|| "unknown".to_string())
    });
    println!("cargo:rustc-env={}={}", var, value);
}

fn main() {
    let now = OffsetDateTime::now_utc();
    stamp("RUNVAULT_BUILD_DATE", now, "[year]-[month]-[day]");
    stamp("RUNVAULT_BUILD_TIME", now, "[hour]:[minute]:[second] UTC");
}
