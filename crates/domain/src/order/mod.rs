//! Orders, their lines, status lifecycle and human-readable numbers.

mod number;
mod record;
mod status;

pub use number::{ORDER_NUMBER_SEQUENCE, OrderNumber};
pub use record::{NewOrder, NewOrderLine, Order, OrderLine, PaymentRefs};
pub use status::OrderStatus;
