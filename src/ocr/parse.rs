//! Parsers for numeric OCR output

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use super::Lang;

static DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)").expect("digit pattern is valid"));

static COUNTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)/(\d+)").expect("counter pattern is valid"));

static DURATION_EN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<prefix>.*?)((?P<days>\d{1,2})\s*d\s*)?((?P<hours>\d{1,2})\s*h\s*)?((?P<minutes>\d{1,2})\s*m\s*)?((?P<seconds>\d{1,2})\s*s)?(?P<suffix>[^dhms]*?)$",
    )
    .expect("duration pattern is valid")
});

static DURATION_CN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<prefix>.*?)((?P<days>\d{1,2})\s*天\s*)?((?P<hours>\d{1,2})\s*小时\s*)?((?P<minutes>\d{1,2})\s*分钟\s*)?((?P<seconds>\d{1,2})\s*秒)?(?P<suffix>[^天时钟秒]*?)$",
    )
    .expect("duration pattern is valid")
});

/// First number in the text, 0 if there is none
pub fn parse_digit(text: &str) -> u32 {
    DIGIT
        .captures(text)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(0)
}

/// Counter such as `14/15`, returned as `(current, remaining, total)`.
/// All zeros if the text holds no counter.
pub fn parse_counter(text: &str) -> (u32, u32, u32) {
    let Some(captures) = COUNTER.captures(text) else {
        return (0, 0, 0);
    };
    let current: u32 = captures[1].parse().unwrap_or(0);
    let total: u32 = captures[2].parse().unwrap_or(0);
    (current, total.saturating_sub(current), total)
}

/// Countdown such as `18d 2h 13m 30s` or `2小时13分钟`.
/// Zero if nothing could be read.
pub fn parse_duration(text: &str, lang: Lang) -> Duration {
    let text = text
        .trim_matches(|c| matches!(c, '.' | ',' | '。' | '，'))
        .replace("Oh", "0h")
        .replace("oh", "0h");

    let regex = match lang {
        Lang::Cn | Lang::Cht => &*DURATION_CN,
        Lang::En | Lang::Jp => &*DURATION_EN,
    };
    let Some(captures) = regex.captures(&text) else {
        return Duration::ZERO;
    };

    let field = |name: &str| -> u64 {
        captures
            .name(name)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };

    Duration::from_secs(
        field("days") * 86_400 + field("hours") * 3600 + field("minutes") * 60 + field("seconds"),
    )
}
