pub mod slots;

pub use slots::{compute_slots, MAX_SLOTS_PER_DAY, SLOT_LENGTH_MINUTES};
