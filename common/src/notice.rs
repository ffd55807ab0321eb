// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Transient, user-visible message ("toast").
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Pending notices, oldest first. Bounded so an unread queue cannot grow forever.
#[derive(Debug, Clone, Default)]
pub struct Notices {
    queue: VecDeque<Notice>,
}

const MAX_PENDING_NOTICES: usize = 32;

impl Notices {
    pub fn push(&mut self, notice: Notice) {
        if self.queue.len() == MAX_PENDING_NOTICES {
            self.queue.pop_front();
        }
        self.queue.push_back(notice);
    }

    pub fn drain(&mut self) -> Vec<Notice> {
        self.queue.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.queue.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_empties_in_order() {
        let mut notices = Notices::default();
        notices.push(Notice::success("Task created"));
        notices.push(Notice::error("Could not move task"));

        let drained = notices.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].level, NoticeLevel::Success);
        assert_eq!(drained[1].message, "Could not move task");
        assert!(notices.is_empty());
    }

    #[test]
    fn test_queue_drops_oldest_when_full() {
        let mut notices = Notices::default();
        for i in 0..MAX_PENDING_NOTICES + 2 {
            notices.push(Notice::success(format!("n{i}")));
        }
        assert_eq!(notices.len(), MAX_PENDING_NOTICES);
        assert_eq!(notices.iter().next().unwrap().message, "n2");
    }
}
