//! In-memory product catalog

use parking_lot::RwLock;

use crate::ports::outbound::{CatalogError, Product, ProductCatalog};

#[derive(Default)]
pub struct InMemoryProductCatalog {
    products: RwLock<Vec<Product>>,
}

impl InMemoryProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, product: Product) {
        let mut products = self.products.write();
        products.retain(|p| p.id != product.id);
        products.push(product);
    }
}

impl ProductCatalog for InMemoryProductCatalog {
    fn search(&self, term: &str, limit: usize) -> Result<Vec<u64>, CatalogError> {
        let products = self.products.read();
        let term = term.trim().to_lowercase();

        if term.is_empty() {
            let mut all: Vec<&Product> = products.iter().collect();
            all.sort_by(|a, b| a.title.cmp(&b.title));
            return Ok(all.into_iter().take(limit).map(|p| p.id).collect());
        }

        Ok(products
            .iter()
            .filter(|p| p.title.to_lowercase().contains(&term))
            .take(limit)
            .map(|p| p.id)
            .collect())
    }

    fn product(&self, id: u64) -> Result<Option<Product>, CatalogError> {
        Ok(self.products.read().iter().find(|p| p.id == id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: u64, title: &str) -> Product {
        Product { id, title: title.into(), variable_prices: vec![] }
    }

    #[test]
    fn test_search_without_term_sorts_by_title() {
        let catalog = InMemoryProductCatalog::new();
        catalog.insert(product(1, "Zeta"));
        catalog.insert(product(2, "Alpha"));
        catalog.insert(product(3, "Mu"));
        assert_eq!(catalog.search("", 2).unwrap(), vec![2, 3]);
    }

    #[test]
    fn test_search_by_term() {
        let catalog = InMemoryProductCatalog::new();
        catalog.insert(product(1, "Pro License"));
        catalog.insert(product(2, "Starter"));
        catalog.insert(product(3, "pro support"));
        assert_eq!(catalog.search("PRO", 10).unwrap(), vec![1, 3]);
        assert!(catalog.product(9).unwrap().is_none());
    }
}
