//! cb-core: calendar bot core library
//!
//! Date/time resolution, free-time and conflict computation, the command
//! interpreter and the [`IntervalStore`] boundary every calendar provider
//! implements.

pub mod config;
pub mod error;
pub mod interpreter;
pub mod resolver;
pub mod schedule;
pub mod store;
pub mod types;

pub use config::{ApiConfig, CalendarSettings, Config, ProviderKind, ScheduleConfig};
pub use error::{Error, Result};
pub use interpreter::{Command, CommandArgs, CommandInterpreter, Intent, InterpreterSettings, Outcome};
pub use resolver::{DateTimeResolver, Fallback, LocaleConfig, LocaleTable, Resolution};
pub use schedule::{conflicts, free_slots, FreeSlots, WorkingHours};
pub use store::{InMemoryStore, IntervalStore};
pub use types::{DateSpec, Event, Instant, Interval, RelativeDay};
