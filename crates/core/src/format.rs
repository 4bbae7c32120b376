//! Number formats and date pattern rendering.
//!
//! Only the distinction that matters for text output is modelled: whether a
//! format renders a number as-is or as a date. Locale-aware number rendering
//! (grouping, currency, percent) is not attempted.

use crate::date::ExcelDateTime;
use serde::Serialize;

/// First format index available to workbook-defined (custom) formats.
pub const FIRST_CUSTOM_FORMAT: u16 = 164;

/// A FORMAT record: pattern text registered under a format index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NumberFormat {
    pub index: u16,
    pub pattern: String,
}

impl NumberFormat {
    pub fn new(index: u16, pattern: impl Into<String>) -> Self {
        Self {
            index,
            pattern: pattern.into(),
        }
    }

    /// Whether the index belongs to the custom range.
    pub fn is_custom(&self) -> bool {
        self.index >= FIRST_CUSTOM_FORMAT
    }

    /// Custom patterns containing a digit placeholder or a two-decimal
    /// fraction are numeric; everything else is treated as a date pattern.
    pub fn is_numeric_pattern(&self) -> bool {
        self.pattern.contains('#') || self.pattern.contains(".00")
    }
}

/// Built-in format indices that denote dates or times.
pub fn is_builtin_date_format(index: u16) -> bool {
    matches!(index, 14..=17 | 22 | 27..=36 | 50..=58)
}

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Literal(String),
    Year { full: bool },
    /// `m` run of the given length; may turn out to be minutes.
    Month(usize),
    Minute { pad: bool },
    Day(usize),
    Hour { pad: bool },
    Second { pad: bool },
    Meridiem { short: bool, upper: bool },
    ElapsedHours,
    ElapsedMinutes,
    ElapsedSeconds,
}

impl Token {
    fn is_hour(&self) -> bool {
        matches!(self, Token::Hour { .. } | Token::ElapsedHours)
    }

    fn is_second(&self) -> bool {
        matches!(self, Token::Second { .. } | Token::ElapsedSeconds)
    }
}

/// Render a timestamp with a spreadsheet date/time pattern such as
/// `dd/mm/yyyy hh:mm`.
pub fn format_date(pattern: &str, dt: &ExcelDateTime) -> String {
    let tokens = resolve_minutes(tokenize(first_section(pattern)));
    let twelve_hour = tokens.iter().any(|t| matches!(t, Token::Meridiem { .. }));

    let mut out = String::new();
    for token in &tokens {
        match token {
            Token::Literal(text) => out.push_str(text),
            Token::Year { full: true } => out.push_str(&format!("{:04}", dt.year())),
            Token::Year { full: false } => {
                out.push_str(&format!("{:02}", dt.year().rem_euclid(100)))
            }
            Token::Month(1) => out.push_str(&dt.month().to_string()),
            Token::Month(2) => out.push_str(&format!("{:02}", dt.month())),
            Token::Month(len) => {
                let name = MONTH_NAMES[(dt.month() as usize - 1) % 12];
                match len {
                    3 => out.push_str(&name[..3]),
                    4 => out.push_str(name),
                    _ => out.push_str(&name[..1]),
                }
            }
            Token::Minute { pad } => push_number(&mut out, dt.minute(), *pad),
            Token::Day(len) => {
                let name = DAY_NAMES[dt.weekday() as usize % 7];
                match len {
                    1 => out.push_str(&dt.day().to_string()),
                    2 => out.push_str(&format!("{:02}", dt.day())),
                    3 => out.push_str(&name[..3]),
                    _ => out.push_str(name),
                }
            }
            Token::Hour { pad } => {
                let hour = if twelve_hour {
                    match dt.hour() % 12 {
                        0 => 12,
                        h => h,
                    }
                } else {
                    dt.hour()
                };
                push_number(&mut out, hour, *pad);
            }
            Token::Second { pad } => push_number(&mut out, dt.second(), *pad),
            Token::Meridiem { short, upper } => {
                let text = match (dt.hour() < 12, short) {
                    (true, false) => "AM",
                    (false, false) => "PM",
                    (true, true) => "A",
                    (false, true) => "P",
                };
                if *upper {
                    out.push_str(text);
                } else {
                    out.push_str(&text.to_ascii_lowercase());
                }
            }
            Token::ElapsedHours => out.push_str(&(dt.elapsed_seconds() / 3600).to_string()),
            Token::ElapsedMinutes => out.push_str(&(dt.elapsed_seconds() / 60).to_string()),
            Token::ElapsedSeconds => out.push_str(&dt.elapsed_seconds().to_string()),
        }
    }
    out
}

fn push_number(out: &mut String, value: u32, pad: bool) {
    if pad {
        out.push_str(&format!("{:02}", value));
    } else {
        out.push_str(&value.to_string());
    }
}

/// The part of a pattern before the first unquoted `;`.
fn first_section(pattern: &str) -> &str {
    let mut quoted = false;
    let mut escaped = false;
    for (i, c) in pattern.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => quoted = !quoted,
            ';' if !quoted => return &pattern[..i],
            _ => {}
        }
    }
    pattern
}

fn tokenize(pattern: &str) -> Vec<Token> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|&q| q == '"')
                    .map_or(chars.len(), |p| i + 1 + p);
                tokens.push(Token::Literal(chars[i + 1..end].iter().collect()));
                i = end + 1;
            }
            '\\' => {
                if let Some(&next) = chars.get(i + 1) {
                    tokens.push(Token::Literal(next.to_string()));
                }
                i += 2;
            }
            '_' => {
                tokens.push(Token::Literal(" ".to_string()));
                i += 2;
            }
            '*' => i += 2,
            '[' => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|&q| q == ']')
                    .map_or(chars.len(), |p| i + 1 + p);
                let inner: String = chars[i + 1..end].iter().collect::<String>().to_ascii_lowercase();
                if !inner.is_empty() && inner.chars().all(|c| c == 'h') {
                    tokens.push(Token::ElapsedHours);
                } else if !inner.is_empty() && inner.chars().all(|c| c == 'm') {
                    tokens.push(Token::ElapsedMinutes);
                } else if !inner.is_empty() && inner.chars().all(|c| c == 's') {
                    tokens.push(Token::ElapsedSeconds);
                }
                i = end + 1;
            }
            'a' | 'A' if starts_with_ignore_case(&chars[i..], "am/pm") => {
                tokens.push(Token::Meridiem {
                    short: false,
                    upper: c == 'A',
                });
                i += 5;
            }
            'a' | 'A' if starts_with_ignore_case(&chars[i..], "a/p") => {
                tokens.push(Token::Meridiem {
                    short: true,
                    upper: c == 'A',
                });
                i += 3;
            }
            'y' | 'Y' | 'm' | 'M' | 'd' | 'D' | 'h' | 'H' | 's' | 'S' => {
                let lower = c.to_ascii_lowercase();
                let len = chars[i..]
                    .iter()
                    .take_while(|x| x.to_ascii_lowercase() == lower)
                    .count();
                tokens.push(match lower {
                    'y' => Token::Year { full: len > 2 },
                    'm' => Token::Month(len),
                    'd' => Token::Day(len),
                    'h' => Token::Hour { pad: len > 1 },
                    _ => Token::Second { pad: len > 1 },
                });
                i += len;
            }
            _ => {
                tokens.push(Token::Literal(c.to_string()));
                i += 1;
            }
        }
    }
    tokens
}

fn starts_with_ignore_case(chars: &[char], needle: &str) -> bool {
    let needle: Vec<char> = needle.chars().collect();
    chars.len() >= needle.len()
        && chars
            .iter()
            .zip(&needle)
            .all(|(a, b)| a.to_ascii_lowercase() == *b)
}

/// `m`/`mm` means minutes right after an hour token or right before a
/// seconds token (literals in between are ignored).
fn resolve_minutes(mut tokens: Vec<Token>) -> Vec<Token> {
    for i in 0..tokens.len() {
        let len = match tokens[i] {
            Token::Month(len) if len <= 2 => len,
            _ => continue,
        };
        let after_hour = tokens[..i]
            .iter()
            .rev()
            .find(|t| !matches!(t, Token::Literal(_)))
            .is_some_and(Token::is_hour);
        let before_second = tokens[i + 1..]
            .iter()
            .find(|t| !matches!(t, Token::Literal(_)))
            .is_some_and(Token::is_second);
        if after_hour || before_second {
            tokens[i] = Token::Minute { pad: len == 2 };
        }
    }
    tokens
}
