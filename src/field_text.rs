//! Field-text markup: one line of text describes one form field.
//!
//! A line is read left to right by an ordered set of extraction rules:
//!
//! - leading tabs/spaces give the nesting **level** (none ⇒ 1); a `-` after any leading tabs marks
//!   the field for deletion instead
//! - the **title** is either a leading `"quoted string"` or everything up to the first `:`, `$`
//!   or `*`
//! - `{...}` holds free-form **settings** and `[...]` holds **options**; both are cut out of the
//!   line before the remaining tokens are read
//! - `$name` declares the **field** identifier (otherwise it is derived from the title)
//! - `@name` declares a **rename** target
//! - a `*` anywhere marks the field **required**
//! - `:type` declares the field **type** (default `markup`)
//!
//! ```rust
//! use datafile::field_text::{parse_field_line, FieldLevel};
//!
//! # fn main() -> Result<(), datafile::DataFileError> {
//! let def = parse_field_line("\tDate first seen* $date_first_seen :date {size=10}")?;
//! assert_eq!(def.level, FieldLevel::Depth(2));
//! assert_eq!(def.title, "Date first seen");
//! assert_eq!(def.field, "date_first_seen");
//! assert_eq!(def.field_type, "date");
//! assert_eq!(def.settings, "size=10");
//! assert!(def.required);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::ser::{Serialize, Serializer};

use crate::error::{DataFileError, DataFileResult};
use crate::types::Row;

/// Longest accepted field identifier, declared or derived.
pub const MAX_FIELD_LEN: usize = 40;

/// Titles are cut to this many characters before being turned into an identifier.
pub const MAX_DERIVED_FIELD_LEN: usize = 30;

/// Type used when a line declares none.
pub const DEFAULT_FIELD_TYPE: &str = "markup";

/// Text form of [`FieldLevel::Delete`].
pub const DELETION_LEVEL: &str = "DEL";

/// Headings of a row built from a [`FieldDefinition`], in column order.
pub const FIELD_TEXT_HEADINGS: [&str; 15] = [
    "Rename", "Level", "Title", "Field", "Type", "Prefix", "Suffix", "Size", "Options", "Min",
    "Max", "Default", "Required", "Settings", "Concepts",
];

// `\s` is spelled out as ASCII whitespace throughout.
static DELETION_PREFIX: LazyLock<Regex> = LazyLock::new(|| compile(r"^\t*-"));
static INDENT: LazyLock<Regex> = LazyLock::new(|| compile(r"^([\t\n\x0B\x0C\r ]*)(.+)"));
static QUOTED_TITLE: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"^[\t\n\x0B\x0C\r >]*"(.+)"(.+)"#));
static PLAIN_TITLE: LazyLock<Regex> = LazyLock::new(|| compile(r"^[\t\n\x0B\x0C\r >]*([^:$*]*)"));
static SETTINGS: LazyLock<Regex> = LazyLock::new(|| compile(r"\{(.+)?\}"));
static OPTIONS: LazyLock<Regex> = LazyLock::new(|| compile(r"\[(.+?)\]"));
static FIELD: LazyLock<Regex> = LazyLock::new(|| compile(r"\$([A-Za-z0-9_-]+)"));
static RENAME: LazyLock<Regex> = LazyLock::new(|| compile(r"@([A-Za-z0-9|_]+)"));
static FIELD_TYPE: LazyLock<Regex> = LazyLock::new(|| compile(r":([a-z|_]+)"));
static TAGS: LazyLock<Regex> = LazyLock::new(|| compile(r"<[^\s>][^>]*>?"));
static NON_FIELD_CHARS: LazyLock<Regex> =
    LazyLock::new(|| compile(r"[^0-9a-zA-Z\t\n\x0B\x0C\r -]"));
static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| compile(r"[\t\n\x0B\x0C\r -]+"));

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("field-text patterns are valid")
}

/// Nesting level of a field, or the deletion marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLevel {
    /// 1-based depth (number of leading tabs/spaces + 1).
    Depth(usize),
    /// The line removes a previously defined field.
    Delete,
}

impl fmt::Display for FieldLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldLevel::Depth(depth) => write!(f, "{depth}"),
            FieldLevel::Delete => f.write_str(DELETION_LEVEL),
        }
    }
}

impl Serialize for FieldLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldLevel::Depth(depth) => serializer.serialize_u64(*depth as u64),
            FieldLevel::Delete => serializer.serialize_str(DELETION_LEVEL),
        }
    }
}

/// Structured result of parsing one field-text line.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FieldDefinition {
    pub level: FieldLevel,
    pub title: String,
    pub settings: String,
    pub options: String,
    pub field: String,
    /// Omitted from serialized output when the line has no `@name` token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rename: Option<String>,
    pub required: bool,
    #[serde(rename = "Type")]
    pub field_type: String,
}

impl FieldDefinition {
    /// Lay the definition out as a row keyed by [`FIELD_TEXT_HEADINGS`].
    ///
    /// Columns the markup cannot express (`Prefix`, `Size`, ...) and a missing rename are `None`;
    /// `Required` is `"1"` or `""`.
    pub fn to_row(&self) -> Row {
        FIELD_TEXT_HEADINGS
            .iter()
            .map(|&heading| {
                let value = match heading {
                    "Rename" => self.rename.clone(),
                    "Level" => Some(self.level.to_string()),
                    "Title" => Some(self.title.clone()),
                    "Field" => Some(self.field.clone()),
                    "Type" => Some(self.field_type.clone()),
                    "Options" => Some(self.options.clone()),
                    "Required" => Some(if self.required { "1" } else { "" }.to_owned()),
                    "Settings" => Some(self.settings.clone()),
                    _ => None,
                };
                (heading.to_owned(), value)
            })
            .collect()
    }
}

/// Parse one line of field-text markup.
///
/// # Errors
///
/// Returns [`DataFileError::FieldTooLong`] when the field identifier is longer than
/// [`MAX_FIELD_LEN`].
pub fn parse_field_line(line: &str) -> DataFileResult<FieldDefinition> {
    let mut text = line.to_owned();

    let level = determine_level(&mut text);
    let title = extract_title(&mut text);

    let settings = first_capture(&SETTINGS, &text);
    let options = first_capture(&OPTIONS, &text);
    if !settings.is_empty() {
        text = text.replacen(&format!("{{{settings}}}"), "", 1);
    }
    if !options.is_empty() {
        text = text.replacen(&format!("[{options}]"), "", 1);
    }

    let field = determine_field(&text, &title)?;
    let rename = RENAME.captures(&text).map(|c| c[1].to_owned());
    let required = text.contains('*');
    let field_type = FIELD_TYPE
        .captures(&text)
        .map_or_else(|| DEFAULT_FIELD_TYPE.to_owned(), |c| c[1].to_owned());

    Ok(FieldDefinition {
        level,
        title,
        settings,
        options,
        field,
        rename,
        required,
        field_type,
    })
}

/// Turn a free-text title into a field identifier.
///
/// Tags are stripped, anything but ASCII letters, digits, whitespace and `-` is dropped, the
/// result is cut to [`MAX_DERIVED_FIELD_LEN`] characters, runs of whitespace/`-` become `_`, and
/// the whole is lower-cased.
pub fn title_to_field(title: &str) -> String {
    let title = TAGS.replace_all(title.trim(), "");
    let title = NON_FIELD_CHARS.replace_all(&title, "");
    let truncated: String = title.chars().take(MAX_DERIVED_FIELD_LEN).collect();
    SEPARATORS.replace_all(&truncated, "_").to_lowercase()
}

fn determine_level(text: &mut String) -> FieldLevel {
    if DELETION_PREFIX.is_match(text) {
        let rest = DELETION_PREFIX.replace(text, "").into_owned();
        *text = rest;
        return FieldLevel::Delete;
    }
    let indent = INDENT.captures(text).map_or(0, |c| c[1].len());
    FieldLevel::Depth(indent + 1)
}

fn extract_title(text: &mut String) -> String {
    let quoted = QUOTED_TITLE
        .captures(text)
        .map(|c| (c[1].trim().to_owned(), c[2].trim().to_owned()));
    if let Some((title, rest)) = quoted {
        *text = rest;
        return title;
    }
    PLAIN_TITLE
        .captures(text)
        .map(|c| c[1].trim().to_owned())
        .unwrap_or_default()
}

fn determine_field(text: &str, title: &str) -> DataFileResult<String> {
    let field = match FIELD.captures(text) {
        Some(caps) => caps[1].to_owned(),
        None => title_to_field(title),
    };
    if field.len() > MAX_FIELD_LEN {
        return Err(DataFileError::FieldTooLong {
            field,
            line: text.to_owned(),
            title: title.to_owned(),
        });
    }
    Ok(field)
}

fn first_capture(re: &Regex, text: &str) -> String {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_to_field_strips_tags_and_punctuation() {
        assert_eq!(title_to_field("<b>Smoking history</b>"), "smoking_history");
        assert_eq!(title_to_field("  Sjögren's syndrome "), "sjgrens_syndrome");
        assert_eq!(title_to_field(""), "");
    }

    #[test]
    fn title_to_field_collapses_separator_runs() {
        assert_eq!(title_to_field("FEV1 - pre"), "fev1_pre");
        assert_eq!(title_to_field("a\t\tb"), "a_b");
    }

    #[test]
    fn title_to_field_truncates_before_replacing() {
        let field = title_to_field("Have you ever kept, or cared for, birds");
        assert_eq!(field, "have_you_ever_kept_or_cared_fo");
    }

    #[test]
    fn unterminated_tag_is_dropped_to_end_of_title() {
        assert_eq!(title_to_field("Weight <span"), "weight_");
    }

    #[test]
    fn less_than_followed_by_space_is_not_a_tag() {
        assert_eq!(title_to_field("Age < 16 years"), "age_16_years");
        let def = parse_field_line("FEV1 < 80 percent :yes_no").unwrap();
        assert_eq!(def.field, "fev1_80_percent");
        assert_eq!(title_to_field("<i>Age</i> < 16"), "age_16");
    }

    #[test]
    fn level_counts_mixed_tabs_and_spaces() {
        let mut text = "\t Title".to_owned();
        assert_eq!(determine_level(&mut text), FieldLevel::Depth(3));
        assert_eq!(text, "\t Title");
    }

    #[test]
    fn deletion_marker_is_removed_with_leading_tabs() {
        let mut text = "\t\t-Old field $old".to_owned();
        assert_eq!(determine_level(&mut text), FieldLevel::Delete);
        assert_eq!(text, "Old field $old");
    }

    #[test]
    fn dash_after_spaces_is_not_a_deletion_marker() {
        let mut text = "  -x".to_owned();
        assert_eq!(determine_level(&mut text), FieldLevel::Depth(3));
    }

    #[test]
    fn empty_braces_leave_settings_empty() {
        let def = parse_field_line("Notes {} :textarea").unwrap();
        assert_eq!(def.settings, "");
        assert_eq!(def.field_type, "textarea");
    }

    #[test]
    fn level_display_matches_row_text() {
        assert_eq!(FieldLevel::Depth(4).to_string(), "4");
        assert_eq!(FieldLevel::Delete.to_string(), "DEL");
    }
}
