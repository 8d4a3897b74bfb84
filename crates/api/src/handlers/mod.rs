pub mod auth;
pub mod character;
pub mod music_link;
pub mod status;
