//! RenderStateMachine - pure render state and its transitions
//!
//! Transitions only compute [`Effects`]; the owning event loop decides how to
//! act on them. The directive for a frame is a pure function of the state,
//! the current time, a condition catalog and a theme.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use contracts::{AmbientState, ConditionCatalog, VisibilityState, WeatherSnapshot};
use tracing::trace;

use crate::directive::{Background, RenderDirective, Theme, Typeface, WeatherLine};

const INTERACTIVE_TIME_FORMAT: &str = "%-H:%M:%S";
const AMBIENT_TIME_FORMAT: &str = "%-H:%M";
const DATE_FORMAT: &str = "%a, %b %-d %Y";

/// Everything a frame depends on besides the clock
#[derive(Debug, Clone, PartialEq)]
pub struct RenderState {
    snapshot: Option<WeatherSnapshot>,
    ambient: AmbientState,
    visibility: VisibilityState,
    low_bit_ambient: bool,
    utc_offset: FixedOffset,
}

impl Default for RenderState {
    fn default() -> Self {
        Self::new(Utc.fix())
    }
}

impl RenderState {
    /// Hidden, interactive, no data
    pub fn new(utc_offset: FixedOffset) -> Self {
        Self {
            snapshot: None,
            ambient: AmbientState::Interactive,
            visibility: VisibilityState::Hidden,
            low_bit_ambient: false,
            utc_offset,
        }
    }

    pub fn with_visibility(self, visibility: VisibilityState) -> Self {
        Self { visibility, ..self }
    }

    pub fn with_ambient(self, ambient: AmbientState) -> Self {
        Self { ambient, ..self }
    }

    /// Replaces the whole snapshot
    pub fn with_snapshot(self, snapshot: WeatherSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
            ..self
        }
    }

    pub fn with_low_bit_ambient(self, low_bit_ambient: bool) -> Self {
        Self {
            low_bit_ambient,
            ..self
        }
    }

    pub fn with_time_zone(self, utc_offset: FixedOffset) -> Self {
        Self { utc_offset, ..self }
    }

    pub fn snapshot(&self) -> Option<&WeatherSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn ambient(&self) -> AmbientState {
        self.ambient
    }

    pub fn visibility(&self) -> VisibilityState {
        self.visibility
    }

    pub fn low_bit_ambient(&self) -> bool {
        self.low_bit_ambient
    }

    pub fn utc_offset(&self) -> FixedOffset {
        self.utc_offset
    }

    /// The interactive timer runs only while on screen and not ambient
    pub fn should_run(&self) -> bool {
        self.visibility.is_visible() && !self.ambient.is_ambient()
    }

    /// Build the frame for `now`
    pub fn directive(
        &self,
        now: DateTime<Utc>,
        catalog: &dyn ConditionCatalog,
        theme: &Theme,
    ) -> RenderDirective {
        let local = now.with_timezone(&self.utc_offset);
        let ambient = self.ambient.is_ambient();
        let date_text = local.format(DATE_FORMAT).to_string();

        if ambient {
            let weather = match &self.snapshot {
                Some(snapshot) => WeatherLine::Summary(format!(
                    "{} / {} — {}",
                    snapshot.high_temp(),
                    snapshot.low_temp(),
                    catalog.label_for(snapshot.condition_code())
                )),
                None => WeatherLine::Omitted,
            };
            RenderDirective {
                ambient,
                background: Background::Black,
                time_text: local.format(AMBIENT_TIME_FORMAT).to_string(),
                date_text,
                typeface: Typeface::Condensed,
                anti_alias: !self.low_bit_ambient,
                weather,
            }
        } else {
            let weather = match &self.snapshot {
                Some(snapshot) => WeatherLine::Panel {
                    icon: catalog.icon_for(snapshot.condition_code()),
                    high: snapshot.high_temp().to_string(),
                    low: snapshot.low_temp().to_string(),
                },
                None => WeatherLine::Placeholder,
            };
            RenderDirective {
                ambient,
                background: Background::Themed(theme.background),
                time_text: local.format(INTERACTIVE_TIME_FORMAT).to_string(),
                date_text,
                typeface: Typeface::Normal,
                anti_alias: true,
                weather,
            }
        }
    }
}

/// Sync lifecycle change requested by a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Activate,
    Deactivate,
}

/// What the owner should do after a transition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Effects {
    pub redraw: bool,
    pub sync: Option<SyncAction>,
    pub update_timer: bool,
}

impl Effects {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn redraw() -> Self {
        Self {
            redraw: true,
            ..Self::default()
        }
    }
}

/// Owns the [`RenderState`] and applies lifecycle transitions to it
#[derive(Debug, Clone, Default)]
pub struct RenderStateMachine {
    state: RenderState,
}

impl RenderStateMachine {
    pub fn new(state: RenderState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn should_run(&self) -> bool {
        self.state.should_run()
    }

    pub fn directive(
        &self,
        now: DateTime<Utc>,
        catalog: &dyn ConditionCatalog,
        theme: &Theme,
    ) -> RenderDirective {
        self.state.directive(now, catalog, theme)
    }

    pub fn set_visibility(&mut self, visibility: VisibilityState) -> Effects {
        let previous = self.state.visibility;
        self.state = std::mem::take(&mut self.state).with_visibility(visibility);

        let sync = match (previous, visibility) {
            (VisibilityState::Hidden, VisibilityState::Visible) => Some(SyncAction::Activate),
            (VisibilityState::Visible, VisibilityState::Hidden) => Some(SyncAction::Deactivate),
            _ => None,
        };
        trace!(?previous, ?visibility, ?sync, "Visibility transition");

        Effects {
            redraw: visibility.is_visible() && previous != visibility,
            sync,
            update_timer: true,
        }
    }

    pub fn set_ambient(&mut self, ambient: AmbientState) -> Effects {
        let changed = self.state.ambient != ambient;
        self.state = std::mem::take(&mut self.state).with_ambient(ambient);
        trace!(?ambient, changed, "Ambient transition");

        Effects {
            redraw: changed,
            sync: None,
            update_timer: true,
        }
    }

    pub fn update_snapshot(&mut self, snapshot: WeatherSnapshot) -> Effects {
        self.state = std::mem::take(&mut self.state).with_snapshot(snapshot);
        Effects::redraw()
    }

    /// Only affects ambient frames
    pub fn set_low_bit_ambient(&mut self, low_bit_ambient: bool) -> Effects {
        let changed = self.state.low_bit_ambient != low_bit_ambient;
        self.state = std::mem::take(&mut self.state).with_low_bit_ambient(low_bit_ambient);

        Effects {
            redraw: changed && self.state.ambient.is_ambient(),
            ..Effects::none()
        }
    }

    pub fn set_time_zone(&mut self, utc_offset: FixedOffset) -> Effects {
        self.state = std::mem::take(&mut self.state).with_time_zone(utc_offset);
        Effects::redraw()
    }
}
