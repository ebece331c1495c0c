//! Whole-format test suites for the iCalendar codec.

mod round_trip;
mod scenarios;
