//! Domain types for ReplayLab

pub mod bar;
pub mod fill;
pub mod ids;
pub mod order;
pub mod position;

pub use bar::PriceBar;
pub use fill::Fill;
pub use ids::OrderId;
pub use order::{Order, OrderSide, OrderType};
pub use position::Position;
