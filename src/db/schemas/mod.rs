//! Table schemas for avolve
//!
//! Serde structures for the hosted tables the handlers read and write. The
//! platform owns constraints and indexes; these only describe row shape.

mod profile;
mod social;
mod token;

pub use profile::{Profile, PROFILES_TABLE};
pub use social::{
    Challenge, Event, Invitation, Message, Notification, PeerRecognition, Post, CHALLENGES_TABLE, EVENTS_TABLE,
    INVITATIONS_TABLE, MESSAGES_TABLE, NOTIFICATIONS_TABLE, PEER_RECOGNITION_TABLE, POSTS_TABLE,
};
pub use token::{TokenBalance, TOKEN_BALANCES_TABLE, TOKEN_STAKING_RULES_TABLE};
