pub mod backend;
pub mod dispatch;
pub mod engine;
pub mod extract;
pub mod page;
pub mod popup;
pub mod trigger;
