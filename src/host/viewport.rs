//! Viewport intersection signals. The engine only sees a stream of
//! [`ViewportEvent`]s per watched element; where they come from is up to the
//! observer implementation.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, trace};

use super::{ElementId, Rect};
use crate::animation::scroll_trigger::TriggerBand;
use crate::error::{MotionError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewportEvent {
    /// Scrolling down, the element crossed into the band
    Enter,
    /// Scrolling down, the element moved past the band's end
    Leave,
    /// Scrolling up, the element came back into the band
    EnterBack,
    /// Scrolling up, the element moved back before the band's start
    LeaveBack,
}

pub type ViewportEvents = UnboundedReceiver<ViewportEvent>;

/// Watches elements against trigger bands. Dropping the returned receiver
/// revokes the watch.
pub trait ViewportObserver {
    fn watch(&mut self, element: ElementId, band: &TriggerBand) -> Result<ViewportEvents>;
}

/// Observer driven by hand, for tests and scripted previews.
#[derive(Debug, Default)]
pub struct ScriptedObserver {
    watches: Vec<(ElementId, UnboundedSender<ViewportEvent>)>,
    refuse: bool,
}

impl ScriptedObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// An observer that rejects every watch, as a host without
    /// intersection support would.
    pub fn refusing() -> Self {
        Self {
            watches: Vec::new(),
            refuse: true,
        }
    }

    /// Deliver `event` to every live watch on `element`. Returns how many
    /// watches received it.
    pub fn emit(&mut self, element: ElementId, event: ViewportEvent) -> usize {
        self.prune();
        self.watches
            .iter()
            .filter(|(watched, _)| *watched == element)
            .filter(|(_, sender)| sender.send(event).is_ok())
            .count()
    }

    pub fn active_watches(&mut self) -> usize {
        self.prune();
        self.watches.len()
    }

    pub fn is_watching(&mut self, element: ElementId) -> bool {
        self.prune();
        self.watches.iter().any(|(watched, _)| *watched == element)
    }

    fn prune(&mut self) {
        self.watches.retain(|(_, sender)| !sender.is_closed());
    }
}

impl ViewportObserver for ScriptedObserver {
    fn watch(&mut self, element: ElementId, _band: &TriggerBand) -> Result<ViewportEvents> {
        if self.refuse {
            return Err(MotionError::ObserverUnavailable(
                "scripted observer refuses watches".to_string(),
            ));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.watches.push((element, tx));
        Ok(rx)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Zone {
    Before,
    Inside,
    After,
}

impl Zone {
    fn locate(scroll_y: f32, (start, end): (f32, f32)) -> Self {
        if scroll_y < start {
            Zone::Before
        } else if scroll_y <= end {
            Zone::Inside
        } else {
            Zone::After
        }
    }

    /// Events crossed when moving from `self` to `next`, in order.
    fn crossing(self, next: Zone) -> &'static [ViewportEvent] {
        use ViewportEvent::*;
        match (self, next) {
            (Zone::Before, Zone::Inside) => &[Enter],
            (Zone::Before, Zone::After) => &[Enter, Leave],
            (Zone::Inside, Zone::After) => &[Leave],
            (Zone::After, Zone::Inside) => &[EnterBack],
            (Zone::After, Zone::Before) => &[EnterBack, LeaveBack],
            (Zone::Inside, Zone::Before) => &[LeaveBack],
            _ => &[],
        }
    }
}

#[derive(Debug)]
struct LayoutWatch {
    element: ElementId,
    band: TriggerBand,
    zone: Zone,
    sender: UnboundedSender<ViewportEvent>,
}

/// Derives band crossings from element boxes and the scroll position.
/// Every watch starts out "before" its band, so an element that is already
/// in view fires `Enter` on the first update.
#[derive(Debug, Default)]
pub struct LayoutObserver {
    watches: Vec<LayoutWatch>,
    scroll_y: f32,
}

impl LayoutObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scroll_y(&self) -> f32 {
        self.scroll_y
    }

    pub fn active_watches(&self) -> usize {
        self.watches.iter().filter(|w| !w.sender.is_closed()).count()
    }

    /// Recompute every watch for a new scroll position. Returns the number
    /// of events sent.
    pub fn update<F>(&mut self, scroll_y: f32, viewport_height: f32, rect_of: F) -> usize
    where
        F: Fn(ElementId) -> Option<Rect>,
    {
        self.watches.retain(|w| !w.sender.is_closed());
        self.scroll_y = scroll_y;

        let mut sent = 0;
        for watch in &mut self.watches {
            let Some(rect) = rect_of(watch.element) else {
                continue;
            };
            let zone = Zone::locate(scroll_y, watch.band.scroll_range(rect, viewport_height));
            for event in watch.zone.crossing(zone) {
                trace!("👁️  {} {:?} at scroll {}", watch.element, event, scroll_y);
                if watch.sender.send(*event).is_ok() {
                    sent += 1;
                }
            }
            watch.zone = zone;
        }
        sent
    }
}

impl ViewportObserver for LayoutObserver {
    fn watch(&mut self, element: ElementId, band: &TriggerBand) -> Result<ViewportEvents> {
        let (sender, rx) = mpsc::unbounded_channel();
        debug!("👁️  Watching {} in layout", element);
        self.watches.push(LayoutWatch {
            element,
            band: *band,
            zone: Zone::Before,
            sender,
        });
        Ok(rx)
    }
}
