//! Anonymizer: strips direct identifiers from extracted resume text before any
//! other stage sees it.
//!
//! Passes run in a fixed order (email, phone, title, then line rules) so a later
//! pass never resurrects content an earlier one removed. Every substitution is a
//! fixed token, never an in-place mask, so no byte offsets survive this stage.
//! Placeholder tokens match none of the patterns, which makes `anonymize` a fixed
//! point on its own output.

use std::sync::OnceLock;

use regex::{Captures, Regex};

pub const EMAIL_TOKEN: &str = "[EMAIL]";
pub const PHONE_TOKEN: &str = "[PHONE]";
pub const TITLE_TOKEN: &str = "[TITLE]";
pub const NAME_LINE: &str = "Name: [ANONYMIZED]";
pub const DOB_LINE: &str = "DOB: [ANONYMIZED]";
pub const ADDRESS_LINE: &str = "Address: [ANONYMIZED]";
pub const CANDIDATE_NAME_LINE: &str = "[CANDIDATE NAME]";

/// Minimum digits a number-like run needs before it is treated as a phone number.
/// Keeps date ranges such as "2019 - 2021" intact.
const MIN_PHONE_DIGITS: usize = 10;

/// Lines at index 0..=HEADER_LINES are checked for a bare personal name.
const HEADER_LINES: usize = 3;
const MAX_NAME_WORDS: usize = 4;

const NAME_PREFIXES: &[&str] = &["name:", "full name:"];
const DOB_PREFIXES: &[&str] = &["dob", "date of birth"];
const ADDRESS_PREFIXES: &[&str] = &["address", "location", "current address", "permanent address"];

/// Resume text with identifying spans replaced by placeholder tokens.
/// Only `anonymize` constructs one, so holding this type proves the redaction ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnonymizedText(String);

impl AnonymizedText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl AsRef<str> for AnonymizedText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

struct Patterns {
    email: Regex,
    phone: Regex,
    title: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        email: Regex::new(r"\b[\w.-]+@[\w.-]+\.\w+\b").expect("email pattern is valid"),
        // separators are horizontal only so a match never spans two lines
        phone: Regex::new(r"\+?\d[\d\- ]{8,}\d").expect("phone pattern is valid"),
        title: Regex::new(r"(?i)\b(?:mrs|mr|ms|miss|shri|smt)\b\.?").expect("title pattern is valid"),
    })
}

/// Removes emails, phone numbers, honorifics and name/DOB/address lines.
///
/// Total: empty or whitespace-only input is returned unchanged.
pub fn anonymize(text: &str) -> AnonymizedText {
    if text.trim().is_empty() {
        return AnonymizedText(text.to_string());
    }

    let p = patterns();
    let text = p.email.replace_all(text, EMAIL_TOKEN);
    let text = p.phone.replace_all(&text, |caps: &Captures| {
        let run = &caps[0];
        if run.chars().filter(|c| c.is_ascii_digit()).count() >= MIN_PHONE_DIGITS {
            PHONE_TOKEN.to_string()
        } else {
            run.to_string()
        }
    });
    let text = p.title.replace_all(&text, TITLE_TOKEN);

    // split keeps trailing empty lines, so line count survives a second pass
    let lines: Vec<&str> = text
        .split('\n')
        .enumerate()
        .map(|(index, line)| redact_line(index, line))
        .collect();

    AnonymizedText(lines.join("\n"))
}

fn redact_line(index: usize, line: &str) -> &str {
    let stripped = line.trim();
    let lowered = stripped.to_lowercase();

    if NAME_PREFIXES.iter().any(|p| lowered.starts_with(p)) {
        return NAME_LINE;
    }
    if DOB_PREFIXES.iter().any(|p| lowered.starts_with(p)) {
        return DOB_LINE;
    }
    if ADDRESS_PREFIXES.iter().any(|p| lowered.starts_with(p)) {
        return ADDRESS_LINE;
    }
    if index <= HEADER_LINES && looks_like_name(stripped) {
        return CANDIDATE_NAME_LINE;
    }
    line
}

/// A short line with letters and no digits near the top is most likely a name.
/// This also catches one-word headings like "Summary"; accepted as a precision cost.
fn looks_like_name(stripped: &str) -> bool {
    let words = stripped.split_whitespace().count();
    (1..=MAX_NAME_WORDS).contains(&words)
        && stripped.chars().any(char::is_alphabetic)
        && !stripped.chars().any(|c| c.is_ascii_digit())
}
