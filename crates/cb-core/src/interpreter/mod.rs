//! Chat command interpreter
//!
//! Every command moves through the same stages: classify it against the
//! [`RuleTable`], resolve its date and time arguments, call the
//! [`IntervalStore`], then render the [`Outcome`] as reply text. A failure
//! at any stage becomes an error reply; [`CommandInterpreter::interpret`]
//! never fails.

pub mod render;
pub mod rules;
mod types;

pub use rules::{MatchKind, Rule, RuleTable};
pub use types::{Command, CommandArgs, Intent, Outcome};

use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveTime};
use tracing::{debug, error, info};

use crate::error::{Error, Result};
use crate::resolver::{DateTimeResolver, Fallback, LocaleTable, Resolution};
use crate::schedule::{conflicts, free_slots, WorkingHours};
use crate::store::IntervalStore;
use crate::types::{Event, Instant, Interval, RelativeDay};

/// Knobs the interpreter needs from configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterSettings {
    pub calendar_id: String,
    pub working_hours: WorkingHours,
    /// Length of events created by `add`
    pub event_minutes: i64,
    /// Description characters shown in event listings
    pub preview_length: usize,
}

impl Default for InterpreterSettings {
    fn default() -> Self {
        Self {
            calendar_id: "primary".to_string(),
            working_hours: WorkingHours::default(),
            event_minutes: 60,
            preview_length: 50,
        }
    }
}

/// Turns raw chat commands into calendar operations and reply text
#[derive(Clone)]
pub struct CommandInterpreter {
    store: Arc<dyn IntervalStore>,
    resolver: DateTimeResolver,
    rules: RuleTable,
    settings: InterpreterSettings,
}

impl CommandInterpreter {
    pub fn new(store: Arc<dyn IntervalStore>, locale: LocaleTable, settings: InterpreterSettings) -> Self {
        let rules = RuleTable::from_locale(&locale);
        Self {
            store,
            resolver: DateTimeResolver::new(locale),
            rules,
            settings,
        }
    }

    pub fn settings(&self) -> &InterpreterSettings {
        &self.settings
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn store(&self) -> &Arc<dyn IntervalStore> {
        &self.store
    }

    /// Classify without executing
    pub fn classify(&self, raw: &str) -> Result<Command> {
        self.rules.classify(raw)
    }

    /// Run a raw command end to end and return the reply text
    pub async fn interpret(&self, raw: &str, now: Instant) -> String {
        let command = match self.classify(raw) {
            Ok(command) => command,
            Err(e) => {
                debug!("Command rejected at classification: {}", e);
                return render::error(&e);
            }
        };
        info!("Command classified as {:?}", command.intent);

        match self.handle_intent(command.intent, &command.args, now).await {
            Ok(outcome) => self.render(&outcome),
            Err(e) => {
                if matches!(e, Error::Provider(_)) {
                    error!("Calendar provider failed for {:?}: {}", command.intent, e);
                } else {
                    debug!("{:?} failed: {}", command.intent, e);
                }
                render::error(&e)
            }
        }
    }

    /// Render an outcome with this interpreter's settings
    pub fn render(&self, outcome: &Outcome) -> String {
        render::outcome(outcome, self.settings.working_hours, self.settings.preview_length)
    }

    /// Execute an already classified intent
    ///
    /// Structured callers (the HTTP API) enter here directly. For
    /// [`Intent::AddEvent`] a missing `date` with a `time` present means the
    /// time text is a single free-form expression such as `내일 3시`.
    pub async fn handle_intent(&self, intent: Intent, args: &CommandArgs, now: Instant) -> Result<Outcome> {
        match intent {
            Intent::ListEvents => self.list_events(args, now).await,
            Intent::AddEvent => self.add_event(args, now).await,
            Intent::DeleteEvent => self.delete_event(args).await,
            Intent::QueryFreeTime => self.free_time(args, now).await,
            Intent::HealthCheck => {
                let calendar_name = self.store.calendar_name(&self.settings.calendar_id).await?;
                Ok(Outcome::Health { calendar_name })
            }
            Intent::Unknown => Ok(Outcome::Unknown),
        }
    }

    async fn list_events(&self, args: &CommandArgs, now: Instant) -> Result<Outcome> {
        let day = self.day_of(args, &now);
        let days = self.listing_days(args);
        let range = self.day_span(day.value, days, &now)?;
        let mut events = self
            .store
            .list_events(&self.settings.calendar_id, range.start(), range.end())
            .await?;
        events.sort_by_key(|e| e.start());
        debug!("Fetched {} events for {} day(s) from {}", events.len(), days, day.value);

        Ok(Outcome::Events {
            date: day.value,
            days,
            date_defaulted: day.defaulted,
            events,
        })
    }

    async fn add_event(&self, args: &CommandArgs, now: Instant) -> Result<Outcome> {
        let title = args
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| self.usage(Intent::AddEvent))?;

        let start = match (args.date.as_deref(), args.time.as_deref()) {
            (Some(date), Some(time)) => self.resolver.datetime_or_default(date, time, &now, Fallback::OneHourLater),
            (None, Some(text)) | (Some(text), None) => {
                self.resolver.relative_or_default(text, &now, Fallback::OneHourLater)
            }
            (None, None) => return Err(self.usage(Intent::AddEvent)),
        };

        let length = Duration::try_minutes(self.settings.event_minutes)
            .filter(|d| *d > Duration::zero())
            .ok_or_else(|| Error::Config(format!("invalid event length: {} minutes", self.settings.event_minutes)))?;
        let candidate = Interval::starting_at(start.value, length)?;
        let existing = self
            .store
            .list_events(&self.settings.calendar_id, candidate.start(), candidate.end())
            .await?;
        let overlapping = conflicts(&candidate, &existing);
        if !overlapping.is_empty() {
            info!("New event overlaps {} existing events", overlapping.len());
        }

        let event = self
            .store
            .create_event(&self.settings.calendar_id, Event::new(title, candidate))
            .await?;
        info!("Created event {:?} at {}", event.id, event.start());

        Ok(Outcome::Added {
            event,
            conflicts: overlapping,
            time_defaulted: start.defaulted,
        })
    }

    async fn delete_event(&self, args: &CommandArgs) -> Result<Outcome> {
        let event_id = args
            .event_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| self.usage(Intent::DeleteEvent))?;

        self.store
            .delete_event(&self.settings.calendar_id, event_id)
            .await?;
        info!("Deleted event {}", event_id);

        Ok(Outcome::Deleted {
            event_id: event_id.to_string(),
        })
    }

    async fn free_time(&self, args: &CommandArgs, now: Instant) -> Result<Outcome> {
        let day = self.day_of(args, &now);
        let hours = self.settings.working_hours;
        let work = hours.span(day.value, *now.offset())?;
        let busy = self
            .store
            .list_busy(&self.settings.calendar_id, work.start(), work.end())
            .await?;
        let slots = free_slots(day.value, &busy, hours, *now.offset())?;
        debug!("{} busy intervals, fully booked: {}", busy.len(), slots.is_fully_booked());

        Ok(Outcome::FreeTime {
            date: day.value,
            date_defaulted: day.defaulted,
            slots,
        })
    }

    /// The requested day, today when no date was given
    fn day_of(&self, args: &CommandArgs, now: &Instant) -> Resolution<NaiveDate> {
        match args.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            Some(text) => self.resolver.date_or_default(text, now),
            None => Resolution {
                value: now.date_naive(),
                defaulted: false,
            },
        }
    }

    /// Week words list seven days from the resolved date
    fn listing_days(&self, args: &CommandArgs) -> u32 {
        let term = args
            .date
            .as_deref()
            .and_then(|text| self.resolver.locale().day_exact(text));
        match term {
            Some(RelativeDay::ThisWeek | RelativeDay::NextWeek) => 7,
            _ => 1,
        }
    }

    /// `days` whole days starting at midnight of `day`
    fn day_span(&self, day: NaiveDate, days: u32, now: &Instant) -> Result<Interval> {
        let midnight = day
            .and_time(NaiveTime::MIN)
            .and_local_timezone(*now.offset())
            .single()
            .ok_or_else(|| Error::Parse(day.to_string()))?;
        Interval::starting_at(midnight, Duration::days(i64::from(days)))
    }

    fn usage(&self, intent: Intent) -> Error {
        Error::Usage(self.rules.usage(intent).unwrap_or_default().to_string())
    }
}
