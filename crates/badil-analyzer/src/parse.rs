//! Parse the vision model's identification reply.
//!
//! The prompt contract: `[Brand, Parent Company, Product Type]`, `$` for a
//! missing parent, and a bare `#` when no product is visible.

use badil_core::error::{BadilError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Identification {
    Product {
        brand: String,
        parent_company: Option<String>,
        product_type: String,
    },
    /// The model reported no clearly visible product.
    NoProduct,
}

pub fn parse_identification(reply: &str) -> Result<Identification> {
    let reply = reply.trim();

    if reply == "#" {
        return Ok(Identification::NoProduct);
    }

    let inner = reply
        .strip_prefix('[')
        .and_then(|r| r.strip_suffix(']'))
        .unwrap_or(reply);

    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    if parts.len() < 3 || parts[0].is_empty() || parts[2].is_empty() {
        return Err(BadilError::Analysis(format!(
            "unparseable identification reply: {reply:?}"
        )));
    }

    let parent = match parts[1] {
        "$" | "" => None,
        name => Some(name.to_string()),
    };

    Ok(Identification::Product {
        brand: parts[0].to_string(),
        parent_company: parent,
        product_type: parts[2].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_identification() {
        let id = parse_identification("[7 Up, PepsiCo, Soft Drink]").unwrap();
        assert_eq!(
            id,
            Identification::Product {
                brand: "7 Up".into(),
                parent_company: Some("PepsiCo".into()),
                product_type: "Soft Drink".into(),
            }
        );
    }

    #[test]
    fn test_no_parent_company() {
        let id = parse_identification("[Apple, $, smartphone]").unwrap();
        match id {
            Identification::Product { parent_company, .. } => assert!(parent_company.is_none()),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_no_product_marker() {
        assert_eq!(parse_identification("  #  ").unwrap(), Identification::NoProduct);
    }

    #[test]
    fn test_missing_brackets_tolerated() {
        // Models occasionally drop the brackets; the parts still parse.
        let id = parse_identification("Cadbury, Mondelez, chocolate").unwrap();
        match id {
            Identification::Product { brand, .. } => assert_eq!(brand, "Cadbury"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(parse_identification("I cannot identify this image.").is_err());
        assert!(parse_identification("").is_err());
        assert!(parse_identification("[only-one-part]").is_err());
    }
}
