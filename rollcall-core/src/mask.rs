//! Digit-only input masks for registration and kiosk fields.
//!
//! A mask is applied on every keystroke: non-digits are stripped first, the
//! result is truncated to the field's maximum length, and a [`Validity`] is
//! reported for visual feedback. Feedback is advisory; only fields carrying a
//! strict pattern (university ID, phone) are rejected by [`FieldMask::accepts`].

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

/// Strict pattern for university IDs (2024 intake).
pub const UNIVERSITY_ID_PATTERN: &str = r"^24\d{8}$";

/// Strict pattern for phone numbers.
pub const PHONE_PATTERN: &str = r"^\d{10}$";

/// Fixed length shared by the bounded fields.
pub const FIELD_LENGTH: usize = 10;

fn university_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(UNIVERSITY_ID_PATTERN).expect("university id pattern compiles"))
}

fn phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PHONE_PATTERN).expect("phone pattern compiles"))
}

/// Visual state of a masked field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    Empty,
    Partial,
    Valid,
}

impl fmt::Display for Validity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::Partial => write!(f, "partial"),
            Self::Valid => write!(f, "valid"),
        }
    }
}

/// Result of applying a mask to raw input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Masked {
    pub value: String,
    pub validity: Validity,
}

/// A digits-only mask with an optional length bound and strict pattern.
#[derive(Debug, Clone, Copy)]
pub struct FieldMask {
    max_len: Option<usize>,
    strict: Option<&'static Regex>,
}

impl FieldMask {
    /// Digits only, no length bound.
    pub const fn digits() -> Self {
        Self {
            max_len: None,
            strict: None,
        }
    }

    /// Digits only, truncated to `max_len`.
    pub const fn bounded(max_len: usize) -> Self {
        Self {
            max_len: Some(max_len),
            strict: None,
        }
    }

    fn with_strict(mut self, strict: &'static Regex) -> Self {
        self.strict = Some(strict);
        self
    }

    pub fn max_len(&self) -> Option<usize> {
        self.max_len
    }

    /// Strip non-digits, truncate, then classify.
    pub fn apply(&self, input: &str) -> Masked {
        let mut value: String = input.chars().filter(char::is_ascii_digit).collect();
        if let Some(max) = self.max_len {
            value.truncate(max);
        }

        let validity = match (value.len(), self.max_len) {
            (0, _) => Validity::Empty,
            (len, Some(max)) if len < max => Validity::Partial,
            _ => Validity::Valid,
        };

        Masked { value, validity }
    }

    /// Whether downstream code may treat `value` as valid.
    ///
    /// Fields with a strict pattern must match it exactly; other fields only
    /// need to be complete after masking.
    pub fn accepts(&self, value: &str) -> bool {
        match self.strict {
            Some(re) => re.is_match(value),
            None => {
                let masked = self.apply(value);
                masked.validity == Validity::Valid && masked.value == value
            }
        }
    }
}

/// Known input fields and their mask presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    UniversityId,
    UniversityCode,
    Phone,
    BusNumber,
    RollNumber,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::UniversityId,
        Field::UniversityCode,
        Field::Phone,
        Field::BusNumber,
        Field::RollNumber,
    ];

    pub fn mask(self) -> FieldMask {
        match self {
            Self::UniversityId => FieldMask::bounded(FIELD_LENGTH).with_strict(university_id_regex()),
            Self::UniversityCode => FieldMask::bounded(FIELD_LENGTH),
            Self::Phone => FieldMask::bounded(FIELD_LENGTH).with_strict(phone_regex()),
            Self::BusNumber | Self::RollNumber => FieldMask::digits(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::UniversityId => "university_id",
            Self::UniversityCode => "university_code",
            Self::Phone => "phone",
            Self::BusNumber => "bus_number",
            Self::RollNumber => "roll_number",
        }
    }

    /// Whether this field is gated by a strict pattern rather than advisory feedback.
    pub fn is_strict(self) -> bool {
        self.mask().strict.is_some()
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|field| field.name() == normalized)
            .ok_or_else(|| {
                let known: Vec<_> = Self::ALL.iter().map(|f| f.name()).collect();
                format!("unknown field '{s}' (expected one of: {})", known.join(", "))
            })
    }
}

/// Strict university ID check: exactly `24` followed by eight digits.
pub fn validate_university_id(id: &str) -> bool {
    university_id_regex().is_match(id)
}

/// Strict phone check: exactly ten digits.
pub fn validate_phone(phone: &str) -> bool {
    phone_regex().is_match(phone)
}
