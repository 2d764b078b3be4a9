mod traits;
pub use traits::{GnnModule, GraphClassifier};
pub mod utils;

mod gcn;
pub use gcn::{GcnClassifier, GcnConv, GcnParams, GcnVariant};
