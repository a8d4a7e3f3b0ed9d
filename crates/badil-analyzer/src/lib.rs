//! Analysis pipeline pieces: parsing the vision model's reply, fuzzy
//! company-name matching, and the boycott/alternatives catalog.

pub mod catalog;
pub mod fuzzy;
pub mod parse;
pub mod prompts;

pub use catalog::{Catalog, CatalogData, JsonCatalog};
pub use parse::{Identification, parse_identification};
