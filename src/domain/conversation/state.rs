//! Session-scoped message log with split-screen lanes.

use serde::{Deserialize, Serialize};

use super::{Lane, Message};

/// Loading state of one lane.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LaneStatus {
    #[default]
    Idle,
    Thinking,
    Failed { reason: String },
}

/// Messages and status of one split-screen lane.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LaneLog {
    messages: Vec<Message>,
    status: LaneStatus,
}

impl LaneLog {
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn status(&self) -> &LaneStatus {
        &self.status
    }
}

/// Both split-screen lanes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SplitLanes {
    pub primary: LaneLog,
    pub secondary: LaneLog,
}

impl SplitLanes {
    fn get(&self, lane: Lane) -> &LaneLog {
        match lane {
            Lane::Primary => &self.primary,
            Lane::Secondary => &self.secondary,
        }
    }

    fn get_mut(&mut self, lane: Lane) -> &mut LaneLog {
        match lane {
            Lane::Primary => &mut self.primary,
            Lane::Secondary => &mut self.secondary,
        }
    }
}

/// Ordered, append-only conversation for one chat session.
///
/// User messages and single-mode replies go to the main log; split-mode
/// replies go to their lane. `generation` changes on every reset so results
/// from an earlier generation can be recognised and dropped.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConversationState {
    generation: u64,
    messages: Vec<Message>,
    lanes: SplitLanes,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Discards everything and starts a new generation.
    pub fn reset(&mut self) -> u64 {
        self.messages.clear();
        self.lanes = SplitLanes::default();
        self.generation += 1;
        self.generation
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn append_to_lane(&mut self, lane: Lane, message: Message) {
        self.lanes.get_mut(lane).messages.push(message);
    }

    pub fn set_lane_status(&mut self, lane: Lane, status: LaneStatus) {
        self.lanes.get_mut(lane).status = status;
    }

    pub fn lane(&self, lane: Lane) -> &LaneLog {
        self.lanes.get(lane)
    }

    pub fn clear_lanes(&mut self) {
        self.lanes = SplitLanes::default();
    }

    pub fn lanes_are_empty(&self) -> bool {
        self.lanes.primary.messages.is_empty() && self.lanes.secondary.messages.is_empty()
    }

    /// The main log in insertion order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn user_message_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_user()).count()
    }

    /// Contents of every user message, oldest first.
    pub fn user_transcript(&self) -> Vec<String> {
        self.messages
            .iter()
            .filter(|m| m.is_user())
            .map(|m| m.content().to_string())
            .collect()
    }

    /// Main log and both lanes merged by timestamp. Ties keep main, primary,
    /// secondary order.
    pub fn merged_view(&self) -> Vec<&Message> {
        let mut merged: Vec<&Message> = self
            .messages
            .iter()
            .chain(self.lanes.primary.messages.iter())
            .chain(self.lanes.secondary.messages.iter())
            .collect();
        merged.sort_by_key(|m| m.timestamp());
        merged
    }

    /// The last `n` messages of the merged view.
    pub fn last_n(&self, n: usize) -> Vec<Message> {
        let merged = self.merged_view();
        let start = merged.len().saturating_sub(n);
        merged[start..].iter().map(|m| (*m).clone()).collect()
    }

    /// Context to send with the next request: the main log plus the given
    /// lane's replies, merged by timestamp, at most `limit` entries.
    pub fn history_for(&self, lane: Option<Lane>, limit: usize) -> Vec<Message> {
        let mut merged: Vec<&Message> = self.messages.iter().collect();
        if let Some(lane) = lane {
            merged.extend(self.lanes.get(lane).messages.iter());
            merged.sort_by_key(|m| m.timestamp());
        }
        let start = merged.len().saturating_sub(limit);
        merged[start..].iter().map(|m| (*m).clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;

    fn at(secs: u64) -> Timestamp {
        Timestamp::from_unix_secs(1_700_000_000 + secs)
    }

    #[test]
    fn append_preserves_insertion_order() {
        let mut state = ConversationState::new();
        state.append(Message::user("one", at(5)));
        state.append(Message::user("two", at(1)));
        let contents: Vec<_> = state.messages().iter().map(|m| m.content()).collect();
        assert_eq!(contents, vec!["one", "two"]);
    }

    #[test]
    fn user_message_count_ignores_assistant_replies() {
        let mut state = ConversationState::new();
        state.append(Message::user("q", at(0)));
        state.append(Message::assistant("a", at(1)));
        state.append(Message::user("q2", at(2)));
        assert_eq!(state.user_message_count(), 2);
        assert_eq!(state.user_transcript(), vec!["q", "q2"]);
    }

    #[test]
    fn merged_view_interleaves_lanes_by_timestamp() {
        let mut state = ConversationState::new();
        state.append(Message::user("q1", at(0)));
        state.append_to_lane(Lane::Secondary, Message::assistant("s1", at(2)).in_lane(Lane::Secondary));
        state.append_to_lane(Lane::Primary, Message::assistant("p1", at(3)).in_lane(Lane::Primary));
        state.append(Message::user("q2", at(4)));

        let order: Vec<_> = state.merged_view().iter().map(|m| m.content()).collect();
        assert_eq!(order, vec!["q1", "s1", "p1", "q2"]);
    }

    #[test]
    fn merged_view_is_stable_for_equal_timestamps() {
        let mut state = ConversationState::new();
        state.append(Message::user("q", at(1)));
        state.append_to_lane(Lane::Secondary, Message::assistant("s", at(1)));
        state.append_to_lane(Lane::Primary, Message::assistant("p", at(1)));

        let order: Vec<_> = state.merged_view().iter().map(|m| m.content()).collect();
        assert_eq!(order, vec!["q", "p", "s"]);
    }

    #[test]
    fn reset_clears_everything_and_bumps_generation() {
        let mut state = ConversationState::new();
        state.append(Message::user("q", at(0)));
        state.append_to_lane(Lane::Primary, Message::assistant("p", at(1)));
        state.set_lane_status(Lane::Primary, LaneStatus::Thinking);

        let generation = state.reset();

        assert_eq!(generation, 1);
        assert!(state.messages().is_empty());
        assert!(state.lanes_are_empty());
        assert_eq!(state.lane(Lane::Primary).status(), &LaneStatus::Idle);
    }

    #[test]
    fn clear_lanes_keeps_main_log() {
        let mut state = ConversationState::new();
        state.append(Message::user("q", at(0)));
        state.append_to_lane(Lane::Primary, Message::assistant("p", at(1)));
        state.clear_lanes();
        assert_eq!(state.messages().len(), 1);
        assert!(state.lanes_are_empty());
    }

    #[test]
    fn history_for_lane_excludes_the_other_lane() {
        let mut state = ConversationState::new();
        state.append(Message::user("q", at(0)));
        state.append_to_lane(Lane::Primary, Message::assistant("p", at(1)));
        state.append_to_lane(Lane::Secondary, Message::assistant("s", at(2)));

        let history: Vec<_> = state
            .history_for(Some(Lane::Secondary), 10)
            .iter()
            .map(|m| m.content().to_string())
            .collect();
        assert_eq!(history, vec!["q", "s"]);
    }

    #[test]
    fn history_and_last_n_are_bounded() {
        let mut state = ConversationState::new();
        for i in 0..15 {
            state.append(Message::user(format!("m{}", i), at(i)));
        }
        assert_eq!(state.history_for(None, 4).len(), 4);
        let tail = state.last_n(10);
        assert_eq!(tail.len(), 10);
        assert_eq!(tail[0].content(), "m5");
        assert_eq!(tail[9].content(), "m14");
    }
}
