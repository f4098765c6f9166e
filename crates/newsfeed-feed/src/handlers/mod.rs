pub mod events;
pub mod friends;
pub mod participants;
