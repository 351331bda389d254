//! Message dispatch core.
//!
//! Inbound chat events are classified into a [`MsgInfo`], wrapped in an
//! [`ActionInfo`] together with the shared [`BotServices`], and run through
//! the ordered action chain. Interactive-card callbacks bypass the chain and
//! go to the card callback dispatcher, which shares the same session cache.

pub mod actions;
pub mod callback;
pub mod cards;
pub mod chain;
pub mod error;
pub mod event;
pub mod handler;
pub mod info;
pub mod spawn;
pub mod triggers;

pub use {
    callback::{CardCallback, process_clear},
    cards::{CardMessage, ClearChoice},
    chain::{Action, Flow, run_chain},
    error::{Error, Result},
    event::{InboundEvent, Mention, classify},
    handler::MessageHandler,
    info::{ActionInfo, BotServices, MsgInfo},
    spawn::{TaskSpawner, TokioSpawner},
};
