use std::collections::BTreeSet;

use regex::Regex;

/// Character sequence reserved for internal objects (e.g. Oracle's `BIN$`
/// recycle-bin tables); names containing it are never valid.
const RESERVED_MARKER: &str = "$";

/// Include/exclude filter for table, view and routine names.
///
/// Patterns must match the whole name. A filter without patterns or types accepts every legal name.
#[derive(Debug, Clone, Default)]
pub struct NameFilter {
    include: Option<Regex>,
    exclude: Option<Regex>,
    types: Option<BTreeSet<String>>,
}

impl NameFilter {
    /// Build a filter from already-compiled patterns. `types`, when given,
    /// restricts valid object types (compared without case).
    pub fn new(
        include: Option<Regex>,
        exclude: Option<Regex>,
        types: Option<Vec<String>>,
    ) -> Self {
        Self {
            include,
            exclude,
            types: types.map(|t| t.into_iter().map(|s| s.to_uppercase()).collect()),
        }
    }

    /// Decide whether an object named `name` of type `object_type` passes.
    pub fn is_valid(&self, name: &str, object_type: &str) -> bool {
        if let Some(ref types) = self.types {
            if !types.contains(&object_type.to_uppercase()) {
                tracing::debug!("Excluding {object_type} {name}: type not selected");
                return false;
            }
        }

        if name.contains(RESERVED_MARKER) {
            tracing::debug!("Excluding {object_type} {name}: embedded $ implies illegal name");
            return false;
        }

        if let Some(ref exclude) = self.exclude {
            if exclude.is_match(name) {
                tracing::debug!("Excluding {object_type} {name}: matches exclusion pattern");
                return false;
            }
        }

        if let Some(ref include) = self.include {
            if !include.is_match(name) {
                tracing::debug!("Excluding {object_type} {name}: doesn't match inclusion pattern");
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchored(pattern: &str) -> Regex {
        Regex::new(&format!("^(?:{pattern})$")).unwrap()
    }

    #[test]
    fn test_default_accepts_plain_names() {
        let filter = NameFilter::default();
        assert!(filter.is_valid("customer", "TABLE"));
        assert!(filter.is_valid("order_totals", "VIEW"));
    }

    #[test]
    fn test_reserved_marker_rejected() {
        let filter = NameFilter::default();
        assert!(!filter.is_valid("BIN$abc==$0", "TABLE"));
    }

    #[test]
    fn test_include_and_exclude() {
        let filter = NameFilter::new(
            Some(anchored("sales_.*")),
            Some(anchored(".*_archive")),
            None,
        );
        assert!(filter.is_valid("sales_order", "TABLE"));
        assert!(!filter.is_valid("sales_order_archive", "TABLE"));
        assert!(!filter.is_valid("hr_employee", "TABLE"));
        // whole-name match only
        assert!(!filter.is_valid("old_sales_order", "TABLE"));
    }

    #[test]
    fn test_type_filter() {
        let filter = NameFilter::new(None, None, Some(vec!["table".to_string()]));
        assert!(filter.is_valid("customer", "TABLE"));
        assert!(!filter.is_valid("customer_view", "VIEW"));
    }
}
