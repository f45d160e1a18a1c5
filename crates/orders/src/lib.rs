//! Orders domain module: cart arithmetic, shipping selection and the order
//! status lifecycle. Pure logic, no IO.

pub mod cart;
pub mod order;
pub mod shipping;

pub use cart::{CartLine, CartTotals, Discount, cart_subtotal, compute_totals};
pub use order::{Order, OrderStatus, StatusChange};
pub use shipping::{ShippingRate, ShippingRequest, default_rates, select_rate};
