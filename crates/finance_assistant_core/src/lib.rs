pub mod domain;
pub mod engine;
pub mod ports;
pub mod taxonomy;

pub use domain::{Conversation, Origin, PendingReply, Utterance};
pub use engine::{DialogueEngine, EngineEvent, ReplyDelay};
pub use ports::RandomSource;
pub use taxonomy::{DomainRule, GreetingRule, Taxonomy, TopicRule};
