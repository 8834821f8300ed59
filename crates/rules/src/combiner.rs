//! Merging of colliding message-map entries.
//!
//! When two failing sub-outcomes report the same key, their messages are
//! joined according to the group they failed in:
//!
//! | existing | incoming | result                               |
//! |----------|----------|--------------------------------------|
//! | text     | text     | `"{existing} {op} {incoming}"`       |
//! | text     | list     | incoming list with existing appended |
//! | list     | text     | existing list with incoming appended |
//! | list     | list     | concatenation                        |
//! | map      | map      | recursive merge with the same op     |
//! | map      | other    | list `[existing, incoming]`          |
//!
//! With three or more participants the first-seen value is the accumulator
//! and each later one is folded into it with the table above, in iteration
//! order. The result is therefore deterministic for a given input order.

use std::fmt;

use crate::outcome::{MessageMap, MessageValue};

/// Join word used for text collisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOp {
    And,
    Or,
}

impl JoinOp {
    pub fn as_str(self) -> &'static str {
        match self {
            JoinOp::And => "and",
            JoinOp::Or => "or",
        }
    }
}

impl fmt::Display for JoinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MessageCombiner {
    op: JoinOp,
}

impl MessageCombiner {
    pub fn new(op: JoinOp) -> Self {
        Self { op }
    }

    pub fn and() -> Self {
        Self::new(JoinOp::And)
    }

    pub fn or() -> Self {
        Self::new(JoinOp::Or)
    }

    /// Merge all maps into one, in order.
    pub fn combine<I>(&self, maps: I) -> MessageMap
    where
        I: IntoIterator<Item = MessageMap>,
    {
        let mut acc = MessageMap::new();
        for map in maps {
            self.merge_into(&mut acc, map);
        }
        acc
    }

    /// Merge `incoming` into `acc`; new keys are appended, colliding keys joined.
    pub fn merge_into(&self, acc: &mut MessageMap, incoming: MessageMap) {
        for (key, value) in incoming {
            match acc.get_mut(&key) {
                Some(slot) => {
                    let existing = std::mem::replace(slot, MessageValue::List(Vec::new()));
                    *slot = self.join(existing, value);
                }
                None => {
                    acc.insert(key, value);
                }
            }
        }
    }

    /// Join two colliding values.
    pub fn join(&self, existing: MessageValue, incoming: MessageValue) -> MessageValue {
        match (existing, incoming) {
            (MessageValue::Text(a), MessageValue::Text(b)) => {
                MessageValue::Text(format!("{a} {} {b}", self.op))
            }
            (MessageValue::Text(a), MessageValue::List(mut items)) => {
                items.push(MessageValue::Text(a));
                MessageValue::List(items)
            }
            (MessageValue::List(mut items), MessageValue::List(more)) => {
                items.extend(more);
                MessageValue::List(items)
            }
            (MessageValue::List(mut items), other) => {
                items.push(other);
                MessageValue::List(items)
            }
            (MessageValue::Map(mut a), MessageValue::Map(b)) => {
                self.merge_into(&mut a, b);
                MessageValue::Map(a)
            }
            (other, MessageValue::List(mut items)) => {
                items.push(other);
                MessageValue::List(items)
            }
            (a, b) => MessageValue::List(vec![a, b]),
        }
    }
}
