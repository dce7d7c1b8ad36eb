use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

/// Stderr log level for a `-v` count: warn, info, debug, then trace.
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Install the stderr logger. A logger that is already set is left alone.
pub fn init(verbosity: u8) {
    let config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .build();
    let _ = TermLogger::init(
        level_for(verbosity),
        config,
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
}

/// Append a parse record to ~/.local/share/cmdseq/parses.log.
/// Best-effort: failures are silently ignored.
pub fn log_record(command: &str, sequence: &[String]) {
    let Some(path) = record_path() else {
        return;
    };
    if let Some(dir) = path.parent() {
        let _ = std::fs::create_dir_all(dir);
    }
    if let Ok(mut file) = OpenOptions::new().append(true).create(true).open(&path) {
        let _ = writeln!(file, "{}", format_record(&timestamp_now(), command, sequence));
    }
}

fn record_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(Path::new(&home).join(".local/share/cmdseq/parses.log"))
}

/// One tab-separated line: timestamp, command (first 200 chars, on one
/// line), comma-joined sequence.
fn format_record(ts: &str, command: &str, sequence: &[String]) -> String {
    let cmd_truncated: String = command
        .chars()
        .take(200)
        .map(|c| if matches!(c, '\n' | '\t') { ' ' } else { c })
        .collect();
    format!("{ts}\t{cmd_truncated}\t{}", sequence.join(","))
}

fn timestamp_now() -> String {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs());
    format_timestamp(secs)
}

/// RFC 3339 UTC timestamp, second precision.
fn format_timestamp(epoch_secs: u64) -> String {
    let (year, month, day) = civil_date(epoch_secs / 86_400);
    let secs_of_day = epoch_secs % 86_400;
    format!(
        "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}Z",
        secs_of_day / 3600,
        secs_of_day / 60 % 60,
        secs_of_day % 60
    )
}

/// Days since 1970-01-01 to (year, month, day), Hinnant's civil_from_days.
fn civil_date(days: u64) -> (u64, u64, u64) {
    let shifted = days + 719_468;
    let era = shifted / 146_097;
    let day_of_era = shifted - era * 146_097;
    let year_of_era =
        (day_of_era - day_of_era / 1460 + day_of_era / 36_524 - day_of_era / 146_096) / 365;
    let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
    let mp = (5 * day_of_year + 2) / 153;
    let day = day_of_year - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = year_of_era + era * 400 + u64::from(month <= 2);
    (year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(level_for(0), LevelFilter::Warn);
        assert_eq!(level_for(2), LevelFilter::Debug);
        assert_eq!(level_for(9), LevelFilter::Trace);
    }

    #[test]
    fn civil_dates() {
        assert_eq!(civil_date(0), (1970, 1, 1));
        assert_eq!(civil_date(19723), (2024, 1, 1));
        assert_eq!(civil_date(19782), (2024, 2, 29));
    }

    #[test]
    fn timestamp_format() {
        assert_eq!(format_timestamp(0), "1970-01-01T00:00:00Z");
        assert_eq!(format_timestamp(19782 * 86_400 + 3661), "2024-02-29T01:01:01Z");
    }

    #[test]
    fn record_is_one_line() {
        let line = format_record(
            "2024-01-01T00:00:00Z",
            "cat <<EOF\nx\tEOF",
            &["cat".to_string(), "ls".to_string()],
        );
        assert_eq!(line, "2024-01-01T00:00:00Z\tcat <<EOF x EOF\tcat,ls");
    }

    #[test]
    fn record_truncates_command() {
        let long = "x".repeat(500);
        let line = format_record("ts", &long, &[]);
        assert_eq!(line.len(), "ts\t".len() + 200 + "\t".len());
    }

    #[test]
    fn timestamp_shape() {
        let ts = timestamp_now();
        assert_eq!(ts.len(), 20);
        assert!(ts.ends_with('Z'));
    }
}
