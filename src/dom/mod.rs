pub mod static_doc;
pub mod tree;
pub mod xpath;

pub use static_doc::StaticDocument;
pub use tree::{DomTree, NodeInfo};
