//! Timing probe for standalone subtitle files.
//!
//! A WebVTT or TTML file becomes a single-chunk text stream, so only the
//! span from the first cue's start to the last cue's end matters.

use ismforge_common::formats::MediaFormat;
use ismforge_common::language::{self, UNDETERMINED};
use ismforge_common::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

const BOM: char = '\u{feff}';
const DEFAULT_FRAME_RATE: u32 = 30;
const DEFAULT_TICK_RATE: u32 = 1;

/// Timing summary of one subtitle file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubtitleInfo {
    pub name: String,
    /// Start of the first cue.
    pub start: Duration,
    /// From the first cue's start to the last cue's end.
    pub duration: Duration,
    pub bit_rate: u64,
    /// ISO 639-2/T code found in the file name.
    pub language: Option<String>,
}

impl SubtitleInfo {
    /// FourCC announced for this file, by extension.
    pub fn four_cc(&self) -> Option<&'static str> {
        MediaFormat::from_name(&self.name).and_then(|f| f.subtitle_four_cc())
    }
}

/// Probe a subtitle file's timing and bitrate.
pub fn probe_subtitle(name: &str, data: &[u8]) -> Result<SubtitleInfo> {
    let text = std::str::from_utf8(data)
        .map_err(|e| Error::invalid_input(format!("{} is not UTF-8: {}", name, e)))?;
    let text = text.strip_prefix(BOM).unwrap_or(text);

    let (start, end) = if text.starts_with("WEBVTT") {
        webvtt_span(text)?
    } else if text.starts_with("<?xml") {
        ttml_span(text)?
    } else {
        return Err(Error::invalid_input(format!(
            "{} has no WebVTT or TTML signature",
            name
        )));
    };

    let duration = end.checked_sub(start).unwrap_or_default();
    if duration.is_zero() {
        return Err(Error::invalid_input(format!("{} has an empty cue span", name)));
    }

    let chars = text.chars().count() as u128;
    let bit_rate = chars * 8 * 1_000_000_000 / duration.as_nanos();

    let language = match language::language_from_filename(name) {
        UNDETERMINED => None,
        code => Some(code.to_string()),
    };

    debug!(
        "Subtitle {}: start {:?}, duration {:?}, {} bps",
        name, start, duration, bit_rate
    );

    Ok(SubtitleInfo {
        name: name.to_string(),
        start,
        duration,
        bit_rate: bit_rate.min(u64::MAX as u128) as u64,
        language,
    })
}

// ===== WebVTT =====

fn webvtt_span(text: &str) -> Result<(Duration, Duration)> {
    let mut first = None;
    let mut last_end = None;

    for line in text.lines() {
        let Some((from, to)) = line.split_once("-->") else {
            continue;
        };
        // cue settings may follow the end timestamp
        let to = to.split_whitespace().next().unwrap_or_default();
        let start = parse_vtt_timestamp(from.trim())?;
        let end = parse_vtt_timestamp(to)?;

        first.get_or_insert(start);
        last_end = Some(end);
    }

    match (first, last_end) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err(Error::invalid_input("WebVTT file has no cues")),
    }
}

/// `hh:mm:ss.ttt` or `mm:ss.ttt`.
fn parse_vtt_timestamp(value: &str) -> Result<Duration> {
    let invalid = || Error::invalid_input(format!("invalid WebVTT timestamp: {:?}", value));

    let (clock, millis) = value.split_once('.').ok_or_else(invalid)?;
    if millis.len() != 3 {
        return Err(invalid());
    }
    let millis = parse_digits(millis).ok_or_else(invalid)?;

    let parts = clock
        .split(':')
        .map(parse_digits)
        .collect::<Option<Vec<_>>>()
        .ok_or_else(invalid)?;
    let (hours, minutes, seconds) = match parts[..] {
        [h, m, s] => (h, m, s),
        [m, s] => (0, m, s),
        _ => return Err(invalid()),
    };
    if minutes > 59 || seconds > 59 {
        return Err(invalid());
    }

    Ok(Duration::from_millis(
        ((hours * 60 + minutes) * 60 + seconds) * 1000 + millis,
    ))
}

// ===== TTML =====

#[derive(Debug, Clone, Copy)]
struct TimeBase {
    frame_rate: u32,
    tick_rate: u32,
}

impl Default for TimeBase {
    fn default() -> Self {
        Self {
            frame_rate: DEFAULT_FRAME_RATE,
            tick_rate: DEFAULT_TICK_RATE,
        }
    }
}

fn ttml_span(text: &str) -> Result<(Duration, Duration)> {
    let mut reader = Reader::from_str(text);
    let mut base = TimeBase::default();
    let mut first = None;
    let mut last_end = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| Error::invalid_input(format!("TTML parse error: {}", e)))?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => match e.local_name().as_ref() {
                b"tt" => base = time_base(e)?,
                b"p" => {
                    let (begin, end) = paragraph_timing(e, base)?;
                    first.get_or_insert(begin);
                    last_end = Some(end);
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    match (first, last_end) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err(Error::invalid_input("TTML document has no timed paragraphs")),
    }
}

fn attributes(e: &BytesStart<'_>) -> Result<Vec<(Vec<u8>, String)>> {
    e.attributes()
        .map(|attr| {
            let attr = attr.map_err(|err| Error::invalid_input(err.to_string()))?;
            let value = attr
                .unescape_value()
                .map_err(|err| Error::invalid_input(err.to_string()))?;
            Ok((attr.key.local_name().as_ref().to_vec(), value.into_owned()))
        })
        .collect()
}

fn time_base(tt: &BytesStart<'_>) -> Result<TimeBase> {
    let mut base = TimeBase::default();
    for (key, value) in attributes(tt)? {
        let rate = || {
            value
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|&r| r > 0)
                .ok_or_else(|| Error::invalid_input(format!("invalid TTML rate: {:?}", value)))
        };
        match key.as_slice() {
            b"frameRate" => base.frame_rate = rate()?,
            b"tickRate" => base.tick_rate = rate()?,
            _ => {}
        }
    }
    Ok(base)
}

/// Begin and end of a `p` element. A missing end falls back to `begin + dur`.
fn paragraph_timing(p: &BytesStart<'_>, base: TimeBase) -> Result<(Duration, Duration)> {
    let mut begin = None;
    let mut end = None;
    let mut dur = None;
    for (key, value) in attributes(p)? {
        match key.as_slice() {
            b"begin" => begin = Some(parse_time_expression(&value, base)?),
            b"end" => end = Some(parse_time_expression(&value, base)?),
            b"dur" => dur = Some(parse_time_expression(&value, base)?),
            _ => {}
        }
    }

    let begin = begin.unwrap_or_default();
    let end = match (end, dur) {
        (Some(end), _) => end,
        (None, Some(dur)) => begin + dur,
        (None, None) => return Err(Error::invalid_input("TTML paragraph has no end time")),
    };
    Ok((begin, end))
}

/// TTML clock time (`hh:mm:ss.fff`, `hh:mm:ss:ff`) or offset time (`12.5s`, `300f`, ...).
fn parse_time_expression(value: &str, base: TimeBase) -> Result<Duration> {
    let value = value.trim();
    let invalid = || Error::invalid_input(format!("invalid TTML time expression: {:?}", value));

    if value.contains(':') {
        let parts: Vec<&str> = value.split(':').collect();
        let (hours, minutes, seconds, frames) = match parts[..] {
            [h, m, s] => (h, m, s, None),
            [h, m, s, f] => (h, m, s, Some(f)),
            _ => return Err(invalid()),
        };
        let hours = parse_digits(hours).ok_or_else(invalid)?;
        let minutes = parse_digits(minutes).ok_or_else(invalid)?;
        let seconds = parse_decimal(seconds).ok_or_else(invalid)?;
        let frames = match frames {
            Some(f) => parse_decimal(f).ok_or_else(invalid)? / base.frame_rate,
            None => Duration::ZERO,
        };
        return Ok(Duration::from_secs((hours * 60 + minutes) * 60) + seconds + frames);
    }

    let split = value
        .find(|c: char| c.is_ascii_alphabetic())
        .ok_or_else(invalid)?;
    let (number, unit) = value.split_at(split);
    let count = parse_decimal(number).ok_or_else(invalid)?;
    let scaled = match unit {
        "h" => count.checked_mul(3600),
        "m" => count.checked_mul(60),
        "s" => Some(count),
        "ms" => Some(count / 1000),
        "f" => Some(count / base.frame_rate),
        "t" => Some(count / base.tick_rate),
        _ => None,
    };
    scaled.ok_or_else(invalid)
}

fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Non-negative decimal number read as a count of seconds, exact to the nanosecond.
fn parse_decimal(s: &str) -> Option<Duration> {
    let (whole, fraction) = s.split_once('.').unwrap_or((s, ""));
    let whole = parse_digits(whole)?;
    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let nanos = fraction
        .bytes()
        .chain(std::iter::repeat(b'0'))
        .take(9)
        .fold(0u32, |acc, b| acc * 10 + (b - b'0') as u32);
    Some(Duration::new(whole, nanos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const VTT: &str = "WEBVTT\n\n\
        1\n00:00:01.000 --> 00:00:04.000\nHello\n\n\
        2\n00:00:05.500 --> 00:00:09.000 align:start position:10%\nWorld\n";

    #[test]
    fn test_webvtt() {
        let info = probe_subtitle("movie_eng.vtt", VTT.as_bytes()).unwrap();
        assert_eq!(info.start, Duration::from_secs(1));
        assert_eq!(info.duration, Duration::from_secs(8));
        assert_eq!(info.bit_rate, VTT.len() as u64 * 8 / 8);
        assert_eq!(info.language.as_deref(), Some("eng"));
        assert_eq!(info.four_cc(), Some("WVTT"));
    }

    #[test]
    fn test_webvtt_bom_and_short_timestamps() {
        let body = "WEBVTT\n\n00:02.000 --> 00:04.000\nhi\n";
        let data = format!("\u{feff}{}", body);
        let info = probe_subtitle("subs.vtt", data.as_bytes()).unwrap();
        assert_eq!(info.start, Duration::from_secs(2));
        assert_eq!(info.duration, Duration::from_secs(2));
        // the BOM is not counted
        assert_eq!(info.bit_rate, body.chars().count() as u64 * 8 / 2);
        assert_eq!(info.language, None);
    }

    #[test]
    fn test_ttml_clock_times() {
        let ttml = r#"<?xml version="1.0" encoding="UTF-8"?>
<tt xmlns="http://www.w3.org/ns/ttml" xml:lang="de">
  <body><div>
    <p begin="00:00:02.500" end="00:00:04.000">Eins</p>
    <p begin="00:00:05.000" dur="00:00:03.000">Zwei</p>
  </div></body>
</tt>"#;
        let info = probe_subtitle("film_ger.ttml", ttml.as_bytes()).unwrap();
        assert_eq!(info.start, Duration::from_millis(2500));
        assert_eq!(info.duration, Duration::from_millis(5500));
        assert_eq!(info.language.as_deref(), Some("deu"));
        assert_eq!(info.four_cc(), Some("TTML"));
    }

    #[test]
    fn test_ttml_frames_and_ticks() {
        let ttml = r#"<?xml version="1.0"?>
<tt xmlns="http://www.w3.org/ns/ttml" xmlns:ttp="http://www.w3.org/ns/ttml#parameter"
    ttp:frameRate="25" ttp:tickRate="10000000">
  <body><div>
    <p begin="00:00:01:05" end="20000000t">a</p>
    <p begin="75f" end="4.5s">b</p>
  </div></body>
</tt>"#;
        let info = probe_subtitle("x.ttml", ttml.as_bytes()).unwrap();
        assert_eq!(info.start, Duration::from_millis(1200));
        assert_eq!(info.duration, Duration::from_millis(3300));
    }

    #[test]
    fn test_time_expressions() {
        let base = TimeBase::default();
        assert_eq!(parse_time_expression("1.5h", base).unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_time_expression("2m", base).unwrap(), Duration::from_secs(120));
        assert_eq!(parse_time_expression("250ms", base).unwrap(), Duration::from_millis(250));
        assert_eq!(parse_time_expression("15f", base).unwrap(), Duration::from_millis(500));
        assert_eq!(parse_time_expression("3t", base).unwrap(), Duration::from_secs(3));
        assert!(parse_time_expression("3x", base).is_err());
        assert!(parse_time_expression("1:2", base).is_err());
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert_matches!(
            probe_subtitle("a.srt", b"1\n00:00:01,000 --> 00:00:02,000\nhi\n"),
            Err(Error::InvalidInput(_))
        );
    }

    #[test]
    fn test_rejects_empty_span() {
        assert_matches!(
            probe_subtitle("a.vtt", b"WEBVTT\n\n00:00:01.000 --> 00:00:01.000\nhi\n"),
            Err(Error::InvalidInput(_))
        );
        assert_matches!(
            probe_subtitle("a.vtt", b"WEBVTT\n"),
            Err(Error::InvalidInput(_))
        );
    }
}
