use std::fmt;

use regex::Regex;

use super::event::GameEvent;

type Predicate = dyn Fn(&GameEvent) -> bool + Send + Sync;

/// A named condition over inbound events.
///
/// Predicates run while the event hub is locked and must not call back
/// into the hub.
pub struct Signal {
    name: String,
    predicate: Box<Predicate>,
}

impl Signal {
    pub fn new(
        name: impl Into<String>,
        predicate: impl Fn(&GameEvent) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            predicate: Box::new(predicate),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matches(&self, event: &GameEvent) -> bool {
        (self.predicate)(event)
    }

    /// A chat line equal to `line`.
    pub fn chat_exact(name: impl Into<String>, line: impl Into<String>) -> Self {
        let line = line.into();
        Self::new(name, move |event| {
            matches!(event, GameEvent::Chat { text } if *text == line)
        })
    }

    /// A chat line matching `pattern` anywhere.
    pub fn chat_matching(name: impl Into<String>, pattern: Regex) -> Self {
        Self::new(name, move |event| {
            matches!(event, GameEvent::Chat { text } if pattern.is_match(text))
        })
    }

    /// Inventory `slot` now holds `item`.
    pub fn slot_item(name: impl Into<String>, slot: u16, item: impl Into<String>) -> Self {
        let item = item.into();
        Self::new(name, move |event| match event {
            GameEvent::SlotChanged {
                slot: changed,
                item: Some(held),
            } => *changed == slot && *held == item,
            _ => false,
        })
    }

    /// Inventory `slot` became empty.
    pub fn slot_emptied(name: impl Into<String>, slot: u16) -> Self {
        Self::new(name, move |event| {
            matches!(event, GameEvent::SlotChanged { slot: changed, item: None } if *changed == slot)
        })
    }

    /// Any window opened.
    pub fn window_opened(name: impl Into<String>) -> Self {
        Self::new(name, |event| matches!(event, GameEvent::WindowOpened { .. }))
    }

    /// Any window closed.
    pub fn window_closed(name: impl Into<String>) -> Self {
        Self::new(name, |event| matches!(event, GameEvent::WindowClosed { .. }))
    }

    /// A sound named exactly `sound`.
    pub fn sound(name: impl Into<String>, sound: impl Into<String>) -> Self {
        let sound = sound.into();
        Self::new(name, move |event| {
            matches!(event, GameEvent::Sound { name } if *name == sound)
        })
    }

    /// A title whose text contains `fragment`.
    pub fn title(name: impl Into<String>, fragment: impl Into<String>) -> Self {
        let fragment = fragment.into();
        Self::new(name, move |event| {
            matches!(event, GameEvent::Title { text } if text.contains(fragment.as_str()))
        })
    }

    /// Any challenge raster.
    pub fn raster(name: impl Into<String>) -> Self {
        Self::new(name, |event| matches!(event, GameEvent::Raster(_)))
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal").field("name", &self.name).finish()
    }
}
