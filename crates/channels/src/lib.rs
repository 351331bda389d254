//! Channel-side collaborator contracts.
//!
//! The chat-platform transport implements [`ChannelOutbound`] (and optionally
//! [`ProfileLookup`]); the dispatcher only ever talks to these traits and
//! describes interactive cards with the typed model in [`card`].

pub mod card;
pub mod error;
pub mod plugin;

pub use {
    card::{ButtonStyle, CardAction, CardElement, CardHeader, CardTemplate, InteractiveCard, SelectOption},
    error::{Error, Result},
    plugin::{ChannelOutbound, ProfileLookup},
};
