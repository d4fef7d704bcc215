//! Regional numbering plan
//!
//! A plan accepts four shapes after normalization (everything except digits
//! and `+` stripped): `+<cc>` prefix, `<cc>` prefix, trunk `0` prefix, and the
//! bare subscriber number. Each is followed by one leading digit from the
//! allowed class and a fixed count of further digits.
//!
//! The default plan is Ghana: `+233`, leading digit 2-5, 8 further digits.

use regex::Regex;
use thiserror::Error;

use crate::defaults;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("country code must be 1-3 digits, got '{0}'")]
    InvalidCountryCode(String),

    #[error("leading digits must be digits or digit ranges like 2-5, got '{0}'")]
    InvalidLeadingDigits(String),

    #[error("subscriber digit count must be between 4 and 12, got {0}")]
    InvalidSubscriberDigits(usize),

    #[error("invalid numbering-plan pattern: {0}")]
    Pattern(#[from] regex::Error),
}

#[derive(Debug, Clone)]
pub struct NumberingPlan {
    country_code: String,
    subscriber_digits: usize,
    /// Any of the four accepted shapes
    accepted: Regex,
    /// `+<cc>` shape only
    international: Regex,
}

impl NumberingPlan {
    pub fn new(
        country_code: &str,
        leading_digits: &str,
        subscriber_digits: usize,
    ) -> Result<Self, PlanError> {
        if country_code.is_empty()
            || country_code.len() > 3
            || !country_code.chars().all(|c| c.is_ascii_digit())
        {
            return Err(PlanError::InvalidCountryCode(country_code.to_string()));
        }
        if leading_digits.is_empty()
            || leading_digits.starts_with('-')
            || !leading_digits.chars().all(|c| c.is_ascii_digit() || c == '-')
        {
            return Err(PlanError::InvalidLeadingDigits(leading_digits.to_string()));
        }
        if !(4..=12).contains(&subscriber_digits) {
            return Err(PlanError::InvalidSubscriberDigits(subscriber_digits));
        }

        let body = format!("[{}]\\d{{{}}}", leading_digits, subscriber_digits);
        let accepted = Regex::new(&format!(
            "^(?:\\+{cc}|{cc}|0)?{body}$",
            cc = country_code,
            body = body
        ))?;
        let international = Regex::new(&format!("^\\+{}{}$", country_code, body))?;

        Ok(Self {
            country_code: country_code.to_string(),
            subscriber_digits,
            accepted,
            international,
        })
    }

    /// Ghana: `+233`, leading digit 2-5, 8 further digits.
    pub fn ghana() -> Self {
        Self::new(
            defaults::DEFAULT_COUNTRY_CODE,
            defaults::DEFAULT_LEADING_DIGITS,
            defaults::DEFAULT_SUBSCRIBER_DIGITS,
        )
        .expect("valid static Ghana numbering plan")
    }

    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    /// Keep digits and `+`, drop everything else.
    pub fn normalize(raw: &str) -> String {
        raw.chars()
            .filter(|c| c.is_ascii_digit() || *c == '+')
            .collect()
    }

    /// True when the normalized number matches one of the accepted shapes.
    pub fn is_valid(&self, raw: &str) -> bool {
        self.accepted.is_match(&Self::normalize(raw))
    }

    /// Strict check for the stored `+<cc>...` form, no normalization.
    pub fn is_international(&self, number: &str) -> bool {
        self.international.is_match(number)
    }

    /// Rewrite trunk-prefixed, bare and `<cc>`-prefixed numbers to `+<cc>...`.
    /// Anything else comes back normalized but otherwise untouched.
    pub fn to_international(&self, raw: &str) -> String {
        let cleaned = Self::normalize(raw.trim());

        if let Some(rest) = cleaned.strip_prefix('0') {
            format!("+{}{}", self.country_code, rest)
        } else if cleaned.starts_with(&self.country_code) {
            format!("+{}", cleaned)
        } else if !cleaned.starts_with('+') && cleaned.len() == self.subscriber_digits + 1 {
            format!("+{}{}", self.country_code, cleaned)
        } else {
            cleaned
        }
    }

    /// `+233 241 234 567` for full international numbers, else the input unchanged.
    pub fn format_for_display(&self, raw: &str) -> String {
        let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
        let cc = self.country_code.len();

        if digits.len() >= cc + 9 && digits.starts_with(&self.country_code) {
            format!(
                "+{} {} {} {}",
                &digits[..cc],
                &digits[cc..cc + 3],
                &digits[cc + 3..cc + 6],
                &digits[cc + 6..]
            )
        } else {
            raw.to_string()
        }
    }
}

impl Default for NumberingPlan {
    fn default() -> Self {
        Self::ghana()
    }
}
