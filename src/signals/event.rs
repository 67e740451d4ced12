use serde::{Deserialize, Serialize};

use crate::captcha::Raster;

/// Typed event delivered by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// A raw chat line.
    Chat { text: String },
    /// An inventory slot changed; `item` is `None` when the slot emptied.
    SlotChanged { slot: u16, item: Option<String> },
    WindowOpened { id: u8, title: String },
    WindowClosed { id: u8 },
    Sound { name: String },
    Title { text: String },
    /// A challenge raster was received.
    Raster(Raster),
}

impl GameEvent {
    pub fn chat(text: impl Into<String>) -> Self {
        GameEvent::Chat { text: text.into() }
    }

    /// Short label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            GameEvent::Chat { .. } => "chat",
            GameEvent::SlotChanged { .. } => "slot_changed",
            GameEvent::WindowOpened { .. } => "window_opened",
            GameEvent::WindowClosed { .. } => "window_closed",
            GameEvent::Sound { .. } => "sound",
            GameEvent::Title { .. } => "title",
            GameEvent::Raster(_) => "raster",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_tagged_events() {
        let event: GameEvent =
            serde_json::from_str(r#"{"type":"slot_changed","slot":36,"item":"cod"}"#).unwrap();
        assert_eq!(
            event,
            GameEvent::SlotChanged {
                slot: 36,
                item: Some("cod".into())
            }
        );

        let event: GameEvent = serde_json::from_str(
            r#"{"type":"raster","rows":1,"columns":2,"data":[0,34]}"#,
        )
        .unwrap();
        assert_eq!(event.kind(), "raster");
    }

    #[test]
    fn chat_helper() {
        assert_eq!(
            GameEvent::chat("hello"),
            GameEvent::Chat {
                text: "hello".into()
            }
        );
    }
}
