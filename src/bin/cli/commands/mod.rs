pub mod cards;
pub mod decks;
pub mod explain;
pub mod serve;
pub mod study;
