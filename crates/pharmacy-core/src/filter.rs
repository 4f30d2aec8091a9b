//! # Product Filtering
//!
//! The product and stock tables narrow their rows by a free-text search on
//! the product name plus optional category and company selections.

use serde::{Deserialize, Serialize};

use crate::types::ProductListing;

/// Criteria for narrowing a product list. `None` means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFilter {
    /// Case-insensitive substring of the product name.
    pub search: Option<String>,
    /// Exact category name.
    pub category: Option<String>,
    /// Exact company name.
    pub company: Option<String>,
}

impl ProductFilter {
    pub fn matches(&self, listing: &ProductListing) -> bool {
        let name_ok = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => listing
                .product
                .name
                .to_lowercase()
                .contains(&needle.to_lowercase()),
        };

        name_ok
            && Self::reference_matches(self.category.as_deref(), listing.category_name.as_deref())
            && Self::reference_matches(self.company.as_deref(), listing.company_name.as_deref())
    }

    /// Rows that pass the filter, order preserved.
    pub fn apply(&self, listings: &[ProductListing]) -> Vec<ProductListing> {
        listings
            .iter()
            .filter(|l| self.matches(l))
            .cloned()
            .collect()
    }

    fn reference_matches(wanted: Option<&str>, actual: Option<&str>) -> bool {
        match wanted {
            None => true,
            Some(w) => actual == Some(w),
        }
    }
}
