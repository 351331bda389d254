//! The nine chain steps, in declared order.

mod audio;
mod chat;
mod command;
mod guard;
mod picture;

pub use {
    audio::AudioAction,
    chat::MessageAction,
    command::{ClearAction, HelpAction, RolePlayAction},
    guard::{DedupAction, EmptyAction, MentionAction},
    picture::{PicAction, generate_more},
};

pub(crate) use picture::resolution_for;

use crate::chain::Action;

/// Dedup, addressing, transcription, empty filter, clear, help, role play,
/// picture, then the default chat fallback.
pub fn default_actions() -> Vec<Box<dyn Action>> {
    vec![
        Box::new(DedupAction),
        Box::new(MentionAction),
        Box::new(AudioAction),
        Box::new(EmptyAction),
        Box::new(ClearAction),
        Box::new(HelpAction),
        Box::new(RolePlayAction),
        Box::new(PicAction),
        Box::new(MessageAction),
    ]
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_order() {
        let names: Vec<&str> = default_actions().iter().map(|a| a.name()).collect();
        assert_eq!(names, [
            "dedup", "mention", "audio", "empty", "clear", "help", "roleplay", "picture",
            "message",
        ]);
    }
}
