//! Value objects for the warehouse domain.

use serde::{Deserialize, Serialize};

/// Article number identifying a product in stock.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleNumber(String);

impl ArticleNumber {
    pub fn new(article_number: impl Into<String>) -> Self {
        Self(article_number.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ArticleNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ArticleNumber {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ArticleNumber {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ArticleNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Requested amounts per article, in the order they were supplied.
///
/// Behaves like an insertion-ordered map: inserting an article that is
/// already present replaces its amount but keeps its original position.
/// Amounts are not validated here; the warehouse decides which are acceptable.
/// Deserialization goes through the same insert, so a repeated article keeps
/// only its last amount.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<(ArticleNumber, i64)>")]
pub struct ProductQuantities(Vec<(ArticleNumber, i64)>);

impl ProductQuantities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, article_number: impl Into<ArticleNumber>, amount: i64) -> Self {
        self.insert(article_number, amount);
        self
    }

    /// Inserts or replaces the amount for an article.
    pub fn insert(&mut self, article_number: impl Into<ArticleNumber>, amount: i64) {
        let article_number = article_number.into();
        match self.0.iter_mut().find(|(a, _)| *a == article_number) {
            Some((_, existing)) => *existing = amount,
            None => self.0.push((article_number, amount)),
        }
    }

    pub fn get(&self, article_number: &ArticleNumber) -> Option<i64> {
        self.0
            .iter()
            .find(|(a, _)| a == article_number)
            .map(|(_, amount)| *amount)
    }

    /// Iterates `(article, amount)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&ArticleNumber, i64)> {
        self.0.iter().map(|(a, amount)| (a, *amount))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<A: Into<ArticleNumber>> FromIterator<(A, i64)> for ProductQuantities {
    fn from_iter<I: IntoIterator<Item = (A, i64)>>(iter: I) -> Self {
        let mut quantities = Self::new();
        for (article_number, amount) in iter {
            quantities.insert(article_number, amount);
        }
        quantities
    }
}

impl From<Vec<(ArticleNumber, i64)>> for ProductQuantities {
    fn from(items: Vec<(ArticleNumber, i64)>) -> Self {
        items.into_iter().collect()
    }
}

impl<A: Into<ArticleNumber>, const N: usize> From<[(A, i64); N]> for ProductQuantities {
    fn from(items: [(A, i64); N]) -> Self {
        items.into_iter().collect()
    }
}

/// Address a shipment is delivered to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub street_and_house_number: String,
    pub post_code_and_town: String,
}

impl DeliveryAddress {
    pub fn new(
        street_and_house_number: impl Into<String>,
        post_code_and_town: impl Into<String>,
    ) -> Self {
        Self {
            street_and_house_number: street_and_house_number.into(),
            post_code_and_town: post_code_and_town.into(),
        }
    }
}

impl std::fmt::Display for DeliveryAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {}",
            self.street_and_house_number, self.post_code_and_town
        )
    }
}
