//! Domain models shared between the server and back-office clients

pub mod order;
pub mod payment;
pub mod sku;
pub mod stock;

pub use order::{Order, OrderItem, OrderStatus, OrderTracking};
pub use payment::{Payment, PaymentStatus, WebhookEvent};
pub use sku::{Product, Sku, VariantAttribute};
pub use stock::{MovementType, StockInfo, StockMovement, Warehouse};
