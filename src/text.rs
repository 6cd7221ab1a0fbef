//! Display helpers shared by the record renderers.

use crate::{Error, Result};

/// Title-case a string.
///
/// A cased character is title-cased when the character before it is not
/// cased, and lower-cased otherwise. Digits and punctuation therefore start
/// a new word: `"r2"` becomes `"R2"` and `"per-class"` becomes `"Per-Class"`.
/// Title case differs from upper case for digraphs and ligatures:
/// `"ßx"` becomes `"Ssx"`, not `"SSx"`.
///
/// ```rust
/// use arbiter_db::text::title_case;
///
/// assert_eq!(title_case("classifier"), "Classifier");
/// assert_eq!(title_case("macro avg"), "Macro Avg");
/// ```
#[must_use]
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_cased = false;

    for c in s.chars() {
        let cased = c.is_lowercase() || c.is_uppercase() || is_titlecase(c);
        if cased {
            if prev_cased {
                out.extend(c.to_lowercase());
            } else {
                push_titlecase(&mut out, c);
            }
        } else {
            out.push(c);
        }
        prev_cased = cased;
    }

    out
}

/// Letters of general category Lt.
const fn is_titlecase(c: char) -> bool {
    matches!(
        c,
        '\u{01C5}'
            | '\u{01C8}'
            | '\u{01CB}'
            | '\u{01F2}'
            | '\u{1F88}'..='\u{1F8F}'
            | '\u{1F98}'..='\u{1F9F}'
            | '\u{1FA8}'..='\u{1FAF}'
            | '\u{1FBC}'
            | '\u{1FCC}'
            | '\u{1FFC}'
    )
}

/// Append the title case mapping of `c`.
///
/// Only characters whose title case differs from their upper case are
/// listed; everything else falls through to `char::to_uppercase`.
fn push_titlecase(out: &mut String, c: char) {
    let mapped = match c {
        '\u{01C4}'..='\u{01C6}' => "\u{01C5}",
        '\u{01C7}'..='\u{01C9}' => "\u{01C8}",
        '\u{01CA}'..='\u{01CC}' => "\u{01CB}",
        '\u{01F1}'..='\u{01F3}' => "\u{01F2}",
        '\u{00DF}' => "Ss",
        '\u{FB00}' => "Ff",
        '\u{FB01}' => "Fi",
        '\u{FB02}' => "Fl",
        '\u{FB03}' => "Ffi",
        '\u{FB04}' => "Ffl",
        '\u{FB05}' | '\u{FB06}' => "St",
        '\u{0587}' => "\u{0535}\u{0582}",
        '\u{FB13}' => "\u{0544}\u{0576}",
        '\u{FB14}' => "\u{0544}\u{0565}",
        '\u{FB15}' => "\u{0544}\u{056B}",
        '\u{FB16}' => "\u{054E}\u{0576}",
        '\u{FB17}' => "\u{0544}\u{056D}",
        '\u{1FB2}' => "\u{1FBA}\u{0345}",
        '\u{1FB4}' => "\u{0386}\u{0345}",
        '\u{1FB7}' => "\u{0391}\u{0342}\u{0345}",
        '\u{1FC2}' => "\u{1FCA}\u{0345}",
        '\u{1FC4}' => "\u{0389}\u{0345}",
        '\u{1FC7}' => "\u{0397}\u{0342}\u{0345}",
        '\u{1FF2}' => "\u{1FFA}\u{0345}",
        '\u{1FF4}' => "\u{038F}\u{0345}",
        '\u{1FF7}' => "\u{03A9}\u{0342}\u{0345}",
        // Greek with ypogegrammeni: the prosgegrammeni form is a single char
        '\u{1F80}'..='\u{1F87}'
        | '\u{1F90}'..='\u{1F97}'
        | '\u{1FA0}'..='\u{1FA7}' => {
            out.push(char::from_u32(u32::from(c) + 8).unwrap_or(c));
            return;
        }
        '\u{1F88}'..='\u{1F8F}' | '\u{1F98}'..='\u{1F9F}' | '\u{1FA8}'..='\u{1FAF}' => {
            out.push(c);
            return;
        }
        '\u{1FB3}' | '\u{1FBC}' => "\u{1FBC}",
        '\u{1FC3}' | '\u{1FCC}' => "\u{1FCC}",
        '\u{1FF3}' | '\u{1FFC}' => "\u{1FFC}",
        _ => {
            out.extend(c.to_uppercase());
            return;
        }
    };
    out.push_str(mapped);
}

/// Check that an optional string column fits in `max` characters.
///
/// # Errors
///
/// Returns [`Error::FieldTooLong`] when the value is longer than `max`.
pub(crate) fn check_len(field: &'static str, value: Option<&str>, max: usize) -> Result<()> {
    if let Some(value) = value {
        let len = value.chars().count();
        if len > max {
            return Err(Error::FieldTooLong { field, max, len });
        }
    }
    Ok(())
}
