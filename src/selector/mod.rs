//! Selector sub-hierarchy and the extension algebra
//! built on top of it.

pub mod algebra;
pub mod complex;
pub mod compound;
pub mod list;
pub mod schema;
pub mod simple;
pub mod subset_map;

pub use complex::{ComplexComponent, ComplexSelector};
pub use compound::CompoundSelector;
pub use list::SelectorList;
pub use schema::{SelectorOrSchema, SelectorSchema};
pub use simple::SimpleSelector;
pub use subset_map::SubsetMap;
