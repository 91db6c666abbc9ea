//! Cross-turn persistence of adventure state

mod storage;

pub use storage::{StateStorage, TurnRecord};
