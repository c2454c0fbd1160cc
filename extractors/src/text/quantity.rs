use super::markup::clean_fragment;
use regex::Regex;
use rust_decimal::Decimal;
use shared_types::Allowance;
use std::str::FromStr;
use std::sync::OnceLock;

const MINUTE_WORDS: &[&str] = &["мин", "звонк", "разговор", "minute", "call"];
const DATA_WORDS: &[&str] = &["гб", "гигабайт", "интернет", "трафик", "мобильн", "gb", "data", "internet"];

#[derive(Clone, Copy)]
enum DataUnit {
    Megabytes,
    Gigabytes,
    Terabytes,
}

impl DataUnit {
    fn to_gb(self, value: f64) -> f64 {
        match self {
            DataUnit::Megabytes => value / 1000.0,
            DataUnit::Gigabytes => value,
            DataUnit::Terabytes => value * 1000.0,
        }
    }
}

struct VolumePattern {
    regex: Regex,
    unit: DataUnit,
}

fn price_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:\d{1,3}(?: \d{3})+|\d+)(?:[.,]\d+)*").unwrap())
}

fn unlimited_phrase() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Neighbour words skip a single preposition: "безлимит на интернет"
        Regex::new(
            r"(?:(\w+)\s+(?:(?:на|в|во|с|со|on|for|with)\s+)?)?(?:безлимит|неограничен|unlimited)\w*(?:\s+(?:(?:на|в|во|с|со|on|for|with)\s+)?(\w+))?",
        )
        .unwrap()
    })
}

fn data_patterns() -> &'static [VolumePattern] {
    static PATTERNS: OnceLock<Vec<VolumePattern>> = OnceLock::new();
    // Units must end the word so that speeds like "100 Мбит/с" are not volumes
    PATTERNS.get_or_init(|| {
        vec![
            VolumePattern {
                regex: Regex::new(r"(\d+(?:[.,]\d+)?)\s*(?:гигабайт\w*|гб|gb)(?:\W|$)").unwrap(),
                unit: DataUnit::Gigabytes,
            },
            VolumePattern {
                regex: Regex::new(r"(\d+(?:[.,]\d+)?)\s*(?:терабайт\w*|тб|tb)(?:\W|$)").unwrap(),
                unit: DataUnit::Terabytes,
            },
            VolumePattern {
                regex: Regex::new(r"(\d+(?:[.,]\d+)?)\s*(?:мегабайт\w*|мб|mb)(?:\W|$)").unwrap(),
                unit: DataUnit::Megabytes,
            },
        ]
    })
}

fn minutes_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{1,3}(?: \d{3})+|\d+)\s*(?:мин|min)").unwrap())
}

/// First monetary amount in `text`, or zero when there is none.
///
/// Accepts `1 299,50 ₽`, `1,299.50`, `1.299,50`, `350`, markup and
/// non-breaking spaces included.
pub fn extract_price(text: &str) -> Decimal {
    let cleaned = clean_fragment(text);
    price_token()
        .find(&cleaned)
        .and_then(|token| parse_amount(token.as_str()))
        .unwrap_or(Decimal::ZERO)
}

/// Included data volume in GB.
///
/// Unlimited phrases win over numbers unless they clearly refer to calls.
pub fn extract_data_volume(text: &str) -> Allowance<f64> {
    let cleaned = clean_fragment(text).to_lowercase();

    if has_unlimited_phrase(&cleaned, MINUTE_WORDS) {
        return Allowance::Unlimited;
    }

    for pattern in data_patterns() {
        if let Some(caps) = pattern.regex.captures(&cleaned) {
            if let Ok(value) = caps[1].replace(',', ".").parse::<f64>() {
                return Allowance::Bounded(pattern.unit.to_gb(value));
            }
        }
    }

    Allowance::Bounded(0.0)
}

/// Included call minutes.
pub fn extract_minutes(text: &str) -> Allowance<u32> {
    let cleaned = clean_fragment(text).to_lowercase();

    if has_unlimited_phrase(&cleaned, DATA_WORDS) {
        return Allowance::Unlimited;
    }

    minutes_pattern()
        .captures(&cleaned)
        .and_then(|caps| caps[1].replace(' ', "").parse::<u32>().ok())
        .map(Allowance::Bounded)
        .unwrap_or(Allowance::Bounded(0))
}

/// An unlimited phrase whose neighbouring words do not belong to `other_kind`.
fn has_unlimited_phrase(text: &str, other_kind: &[&str]) -> bool {
    unlimited_phrase().captures_iter(text).any(|caps| {
        let about_other = [caps.get(1), caps.get(2)]
            .into_iter()
            .flatten()
            .any(|word| other_kind.iter().any(|prefix| word.as_str().starts_with(prefix)));
        !about_other
    })
}

fn parse_amount(token: &str) -> Option<Decimal> {
    let token: String = token.chars().filter(|c| !c.is_whitespace()).collect();
    let decimal_sep = decimal_separator(&token);
    let decimal_pos = decimal_sep.and_then(|sep| token.rfind(sep));

    let mut normalized = String::with_capacity(token.len());
    for (i, c) in token.char_indices() {
        if c.is_ascii_digit() {
            normalized.push(c);
        } else if Some(i) == decimal_pos {
            normalized.push('.');
        }
    }

    Decimal::from_str(&normalized).ok()
}

/// Which of `,`/`.` acts as the decimal point, if any.
fn decimal_separator(token: &str) -> Option<char> {
    let commas = token.matches(',').count();
    let dots = token.matches('.').count();

    match (commas, dots) {
        (0, 0) => None,
        (c, d) if c > 0 && d > 0 => token.chars().rev().find(|c| *c == ',' || *c == '.'),
        (1, 0) | (0, 1) => {
            let sep = if commas == 1 { ',' } else { '.' };
            let pos = token.rfind(sep)?;
            let fraction_len = token.len() - pos - 1;
            let zero_integer = token[..pos].chars().all(|c| c == '0');
            if fraction_len == 3 && !zero_integer {
                None
            } else {
                Some(sep)
            }
        }
        _ => None,
    }
}
