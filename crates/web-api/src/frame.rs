//! WebSocket 文本帧格式
//!
//! 入站：`{"event": "...", "data": ..., "ack": 1}`，`ack` 可选；
//! 出站推送：`{"event": "...", "data": ...}`；
//! 确认：`{"event": "ack", "ack": 1, "data": ...}`。

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientFrame {
    pub event: String,
    #[serde(default)]
    pub data: JsonValue,
    #[serde(default)]
    pub ack: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AckFrame {
    pub event: &'static str,
    pub ack: u64,
    pub data: JsonValue,
}

impl AckFrame {
    pub fn new(ack: u64, data: JsonValue) -> Self {
        Self {
            event: "ack",
            ack,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_frame_defaults_missing_fields() {
        let frame: ClientFrame = serde_json::from_str(r#"{"event":"user:online","data":7}"#).unwrap();
        assert_eq!(frame.event, "user:online");
        assert_eq!(frame.data, json!(7));
        assert_eq!(frame.ack, None);

        let bare: ClientFrame = serde_json::from_str(r#"{"event":"attachment:get","ack":3}"#).unwrap();
        assert!(bare.data.is_null());
        assert_eq!(bare.ack, Some(3));
    }

    #[test]
    fn ack_frame_shape() {
        let frame = AckFrame::new(4, json!({"attachment": null, "error": "Cannot get attachment"}));
        assert_eq!(
            serde_json::to_value(frame).unwrap(),
            json!({"event": "ack", "ack": 4, "data": {"attachment": null, "error": "Cannot get attachment"}})
        );
    }
}
