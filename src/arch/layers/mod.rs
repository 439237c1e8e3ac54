mod cache;
mod layer;
mod role;

pub use cache::{ForwardCache, Gradients};
pub use layer::Layer;
pub use role::Role;
