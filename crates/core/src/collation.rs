use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use icu_collator::{Collator, CollatorOptions};
use icu_locid::Locale;
use thiserror::Error;

/// 比較兩行文字的策略。 / Strategy used to order lines when sorting.
pub trait LineCollator {
    fn compare(&self, left: &str, right: &str) -> Ordering;
}

/// 建立語系排序器時的錯誤。 / Errors raised while building a locale collator.
#[derive(Debug, Error)]
pub enum CollationError {
    #[error("language tag '{tag}' is invalid: {reason}")]
    InvalidLanguage { tag: String, reason: String },
    #[error("no collation data for '{tag}': {reason}")]
    Unsupported { tag: String, reason: String },
}

/// 依 Unicode 碼位排序。 / Orders lines by Unicode code point.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodepointCollator;

impl LineCollator for CodepointCollator {
    fn compare(&self, left: &str, right: &str) -> Ordering {
        left.cmp(right)
    }
}

/// 依語系規則排序（例如克羅埃西亞文的 č、ć、dž）。 / Orders lines using the collation rules of a language.
pub struct LocaleCollator {
    tag: String,
    collator: Collator,
}

impl LocaleCollator {
    pub fn new(tag: &str) -> Result<Self, CollationError> {
        let locale = Locale::from_str(tag).map_err(|err| CollationError::InvalidLanguage {
            tag: tag.to_string(),
            reason: err.to_string(),
        })?;
        let collator = Collator::try_new(&locale.into(), CollatorOptions::new()).map_err(
            |err| CollationError::Unsupported {
                tag: tag.to_string(),
                reason: err.to_string(),
            },
        )?;
        Ok(Self {
            tag: tag.to_string(),
            collator,
        })
    }
}

impl LineCollator for LocaleCollator {
    fn compare(&self, left: &str, right: &str) -> Ordering {
        self.collator.compare(left, right)
    }
}

impl fmt::Debug for LocaleCollator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocaleCollator")
            .field("tag", &self.tag)
            .finish()
    }
}

/// 取得語系排序器，失敗時退回碼位排序。 / Returns a collator for `tag`, falling back to code-point order.
pub fn collator_for(tag: &str) -> Box<dyn LineCollator> {
    match LocaleCollator::new(tag) {
        Ok(collator) => Box::new(collator),
        Err(err) => {
            tracing::warn!("falling back to code point ordering: {err}");
            Box::new(CodepointCollator)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn croatian_places_c_caron_after_c() {
        let collator = LocaleCollator::new("hr").unwrap();
        assert_eq!(collator.compare("cvijet", "čaj"), Ordering::Less);
        assert_eq!(collator.compare("čaj", "dan"), Ordering::Less);
    }

    #[test]
    fn locale_collation_ignores_case_at_primary_level() {
        let collator = LocaleCollator::new("en").unwrap();
        assert_eq!(collator.compare("apple", "Banana"), Ordering::Less);
        assert_eq!(CodepointCollator.compare("apple", "Banana"), Ordering::Greater);
    }

    #[test]
    fn invalid_tag_falls_back_to_codepoints() {
        assert!(LocaleCollator::new("not a tag").is_err());
        let collator = collator_for("not a tag");
        assert_eq!(collator.compare("B", "a"), Ordering::Less);
    }
}
