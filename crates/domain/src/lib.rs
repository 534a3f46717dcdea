//! 社交中继核心领域模型
//!
//! 包含用户标识、社交领域事件（评论、反应、好友事件）、通知记录、
//! 附件尺寸分级，以及文档存储 / 附件存储的外部协作方接口。

pub mod entities;
pub mod errors;
pub mod events;
pub mod repositories;
pub mod services;
pub mod value_objects;

// 重新导出常用类型
pub use entities::*;
pub use errors::*;
pub use events::*;
pub use repositories::*;
pub use services::*;
pub use value_objects::*;
