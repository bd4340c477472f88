pub mod business;
pub mod menu_item;
pub mod order;
pub mod order_item;
pub mod stakeholder;
pub mod subscription;
