pub mod describe;
pub mod dispatch;
pub mod node;
