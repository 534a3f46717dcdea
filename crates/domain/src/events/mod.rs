//! 领域事件定义
//!
//! 客户端发起的社交动作载荷，以及传输层使用的事件名称。

pub mod social_event;
pub mod socket_event;

// 重新导出事件类型
pub use social_event::*;
pub use socket_event::*;
