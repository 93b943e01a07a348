//! Domain models for the storefront.
//!
//! Row types decoded by the repositories, plus the pure logic that sits on
//! top of them (cart totals, checkout plans, product input validation).

pub mod cart;
pub mod order;
pub mod product;
pub mod session;
pub mod user;

pub use cart::{CartLine, MAX_LINE_QUANTITY, QuantityChange, QuantityError, cart_total};
pub use order::{CheckoutError, CheckoutLine, CheckoutPlan, MAX_ORDER_TOTAL, Order, OrderLine};
pub use product::{Product, ProductInput, ProductInputError};
pub use session::{CurrentUser, FlashLevel, FlashMessage, keys as session_keys};
pub use user::User;
