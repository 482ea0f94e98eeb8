//! Group id generation

use uuid::Uuid;

/// Length of generated group ids
///
/// Ids are typed by admins in chat commands, so they are kept short.
pub const GROUP_ID_LEN: usize = 8;

/// Source of candidate group ids
///
/// Candidates may collide; the evaluator retries a bounded number of times.
pub trait GroupIdSource: Send + Sync {
    fn next_id(&self) -> String;
}

/// Random lowercase hex ids
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomGroupIds;

impl GroupIdSource for RandomGroupIds {
    fn next_id(&self) -> String {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(GROUP_ID_LEN);
        id
    }
}
