//! Data models for event records and festival date facts

pub mod event_record;
pub mod festival;

pub use event_record::{EventCandidate, EventRecord, RawEventObservation};
pub use festival::{
    DateSlot, EntityProfile, FactState, FestivalDateCandidate, FestivalDateFact,
    RawFestivalObservation,
};
