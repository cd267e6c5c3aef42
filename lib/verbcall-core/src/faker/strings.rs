use std::net::{Ipv4Addr, Ipv6Addr};

use fake::Fake;
use fake::faker::internet::en::SafeEmail;
use fake::faker::lorem::en::{Word, Words};
use jiff::Timestamp;
use jiff::tz::TimeZone;
use rand::Rng;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

/// 2000-01-01T00:00:00Z
const MIN_TIMESTAMP: i64 = 946_684_800;
/// 2030-01-01T00:00:00Z
const MAX_TIMESTAMP: i64 = 1_893_456_000;

/// Generates a string for a `string` schema.
///
/// `format` wins over everything else, then `pattern`, then length bounds.
pub(super) fn fake_string<R>(rng: &mut R, schema: &Value) -> String
where
    R: Rng + ?Sized,
{
    if let Some(value) = schema
        .get("format")
        .and_then(Value::as_str)
        .and_then(|format| fake_format(rng, format))
    {
        return value;
    }

    let min_length = usize_keyword(schema, "minLength").unwrap_or(0);
    let max_length = usize_keyword(schema, "maxLength");

    if let Some(pattern) = schema.get("pattern").and_then(Value::as_str) {
        if let Some(value) = fake_with_pattern(rng, pattern, min_length, max_length) {
            return value;
        }
        debug!(%pattern, "no candidate matches the pattern, using lorem text");
    }

    let words: Vec<String> = Words(1..4).fake_with_rng(rng);
    fit_length(rng, words.join(" "), min_length, max_length)
}

fn usize_keyword(schema: &Value, key: &str) -> Option<usize> {
    schema
        .get(key)
        .and_then(Value::as_u64)
        .and_then(|value| usize::try_from(value).ok())
}

/// Pads with lorem words or truncates so the length (in chars) is within bounds.
fn fit_length<R>(rng: &mut R, mut text: String, min_length: usize, max_length: Option<usize>) -> String
where
    R: Rng + ?Sized,
{
    while text.chars().count() < min_length {
        let word: String = Word().fake_with_rng(rng);
        text.push_str(&word);
    }
    if let Some(max_length) = max_length
        && text.chars().count() > max_length
    {
        text = text.chars().take(max_length).collect();
    }
    text
}

fn fake_format<R>(rng: &mut R, format: &str) -> Option<String>
where
    R: Rng + ?Sized,
{
    let value = match format {
        "date-time" => random_timestamp(rng).to_string(),
        "date" => random_timestamp(rng)
            .to_zoned(TimeZone::UTC)
            .date()
            .to_string(),
        "time" => format!(
            "{:02}:{:02}:{:02}Z",
            rng.gen_range(0..24),
            rng.gen_range(0..60),
            rng.gen_range(0..60)
        ),
        "email" | "idn-email" => SafeEmail().fake_with_rng(rng),
        "uri" | "url" | "iri" | "uri-reference" | "iri-reference" => {
            let host: String = Word().fake_with_rng(rng);
            let path: String = Word().fake_with_rng(rng);
            format!("https://{}.example.com/{}", ascii_label(&host), ascii_label(&path))
        }
        "hostname" | "idn-hostname" => {
            let host: String = Word().fake_with_rng(rng);
            format!("{}.example.com", ascii_label(&host))
        }
        "ipv4" => Ipv4Addr::new(
            rng.gen_range(1..=223),
            rng.gen_range(0..=255),
            rng.gen_range(0..=255),
            rng.gen_range(1..=254),
        )
        .to_string(),
        "ipv6" => {
            let mut segments = [0_u16; 8];
            rng.fill(&mut segments[..]);
            Ipv6Addr::from(segments).to_string()
        }
        "uuid" => {
            let mut bytes = [0_u8; 16];
            rng.fill(&mut bytes[..]);
            uuid::Builder::from_random_bytes(bytes)
                .into_uuid()
                .to_string()
        }
        _ => return None,
    };
    Some(value)
}

fn random_timestamp<R>(rng: &mut R) -> Timestamp
where
    R: Rng + ?Sized,
{
    let second = rng.gen_range(MIN_TIMESTAMP..MAX_TIMESTAMP);
    Timestamp::from_second(second).unwrap_or(Timestamp::UNIX_EPOCH)
}

/// Keeps only ascii alphanumeric chars, never empty.
fn ascii_label(word: &str) -> String {
    let label: String = word
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|ch| ch.to_ascii_lowercase())
        .collect();
    if label.is_empty() {
        "example".to_string()
    } else {
        label
    }
}

/// Tries a few candidate shapes and keeps the first one matching the pattern.
fn fake_with_pattern<R>(
    rng: &mut R,
    pattern: &str,
    min_length: usize,
    max_length: Option<usize>,
) -> Option<String>
where
    R: Rng + ?Sized,
{
    let regex = match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(error) => {
            debug!(%pattern, %error, "unsupported pattern");
            return None;
        }
    };

    let word: String = Word().fake_with_rng(rng);
    let digits = format!("{}", rng.gen_range(100_000..1_000_000));
    let candidates = [
        word.clone(),
        word.to_uppercase(),
        ascii_label(&word),
        digits.clone(),
        format!("{word}{digits}"),
        format!("{word}-{digits}"),
        format!("{word}_{digits}"),
        String::new(),
    ];

    candidates
        .into_iter()
        .map(|candidate| fit_length(rng, candidate, min_length, max_length))
        .find(|candidate| regex.is_match(candidate))
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serde_json::json;

    use super::*;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn should_respect_length_bounds() {
        let mut rng = rng();
        for _ in 0..50 {
            let value = fake_string(&mut rng, &json!({ "minLength": 12, "maxLength": 15 }));
            let length = value.chars().count();
            assert!((12..=15).contains(&length), "{value:?} has length {length}");
        }
    }

    #[test]
    fn should_allow_zero_max_length() {
        let mut rng = rng();
        let value = fake_string(&mut rng, &json!({ "maxLength": 0 }));
        assert_eq!(value, "");
    }

    #[test]
    fn should_generate_formats() {
        let mut rng = rng();

        let email = fake_string(&mut rng, &json!({ "format": "email" }));
        assert!(email.contains('@'), "{email}");

        let date_time = fake_string(&mut rng, &json!({ "format": "date-time" }));
        assert!(date_time.parse::<Timestamp>().is_ok(), "{date_time}");

        let date = fake_string(&mut rng, &json!({ "format": "date" }));
        assert!(date.parse::<jiff::civil::Date>().is_ok(), "{date}");

        let uuid = fake_string(&mut rng, &json!({ "format": "uuid" }));
        assert!(uuid::Uuid::parse_str(&uuid).is_ok(), "{uuid}");

        let ipv4 = fake_string(&mut rng, &json!({ "format": "ipv4" }));
        assert!(ipv4.parse::<Ipv4Addr>().is_ok(), "{ipv4}");

        let ipv6 = fake_string(&mut rng, &json!({ "format": "ipv6" }));
        assert!(ipv6.parse::<Ipv6Addr>().is_ok(), "{ipv6}");

        let uri = fake_string(&mut rng, &json!({ "format": "uri" }));
        assert!(url::Url::parse(&uri).is_ok(), "{uri}");
    }

    #[test]
    fn should_match_simple_patterns() {
        let mut rng = rng();

        let digits = fake_string(&mut rng, &json!({ "pattern": "^[0-9]+$" }));
        assert!(digits.chars().all(|ch| ch.is_ascii_digit()), "{digits}");

        let upper = fake_string(&mut rng, &json!({ "pattern": "^[A-Z]+$" }));
        assert!(upper.chars().all(|ch| ch.is_ascii_uppercase()), "{upper}");
    }

    #[test]
    fn should_fallback_to_lorem_on_unsupported_pattern() {
        let mut rng = rng();
        let value = fake_string(&mut rng, &json!({ "pattern": "^\\d{3}-[a-z]{2}@@$" }));
        assert!(!value.is_empty());
    }
}
