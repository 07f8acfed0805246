use std::cmp::Ordering;

/// A column participating in an index, by position in the owning table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexColumn {
    pub column: usize,
    pub ascending: bool,
}

#[derive(Debug, Clone)]
pub struct TableIndex {
    pub name: String,
    pub id: Option<i64>,
    pub is_unique: bool,
    pub is_primary: bool,
    columns: Vec<IndexColumn>,
}

impl TableIndex {
    pub fn new(name: &str, id: Option<i64>, is_unique: bool, is_primary: bool) -> Self {
        Self {
            name: name.to_string(),
            id,
            is_unique,
            is_primary,
            columns: Vec::new(),
        }
    }

    pub fn add_column(&mut self, column: usize, ascending: bool) {
        self.columns.push(IndexColumn { column, ascending });
    }

    pub fn columns(&self) -> &[IndexColumn] {
        &self.columns
    }

    pub fn is_single_column(&self) -> bool {
        self.columns.len() == 1
    }

    pub fn covers_column(&self, column: usize) -> bool {
        self.columns.iter().any(|c| c.column == column)
    }

    /// Listing order: primary-key indexes first, then by catalog id when both
    /// sides have one, otherwise by name.
    pub fn display_cmp(&self, other: &TableIndex) -> Ordering {
        other
            .is_primary
            .cmp(&self.is_primary)
            .then_with(|| match (self.id, other.id) {
                (Some(a), Some(b)) => a.cmp(&b),
                _ => self.name.cmp(&other.name),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_sorts_first() {
        let pk = TableIndex::new("zz_pkey", Some(50), true, true);
        let other = TableIndex::new("aa_idx", Some(1), false, false);
        assert_eq!(pk.display_cmp(&other), Ordering::Less);
        assert_eq!(other.display_cmp(&pk), Ordering::Greater);
    }

    #[test]
    fn test_id_then_name() {
        let a = TableIndex::new("b_idx", Some(1), false, false);
        let b = TableIndex::new("a_idx", Some(2), false, false);
        assert_eq!(a.display_cmp(&b), Ordering::Less);

        let c = TableIndex::new("b_idx", None, false, false);
        let d = TableIndex::new("a_idx", Some(2), false, false);
        assert_eq!(c.display_cmp(&d), Ordering::Greater);
    }

    #[test]
    fn test_columns() {
        let mut idx = TableIndex::new("orders_customer_idx", None, false, false);
        idx.add_column(2, true);
        assert!(idx.is_single_column());
        assert!(idx.covers_column(2));
        idx.add_column(0, false);
        assert!(!idx.is_single_column());
        assert_eq!(idx.columns()[1], IndexColumn { column: 0, ascending: false });
    }
}
