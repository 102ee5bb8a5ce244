//! Shared test doubles for the Worldforge workspace.

mod clock;
mod image;
mod records;
mod text;

pub use clock::FixedClock;
pub use image::{FailingImageGenerator, SelectiveImageGenerator, StaticImageGenerator};
pub use records::{FailingCallRecordRepository, RecordingCallRecordRepository};
pub use text::{CannedTextGenerator, FailingTextGenerator, FlakyTextGenerator};
