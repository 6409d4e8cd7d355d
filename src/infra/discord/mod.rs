pub mod image_client;
pub mod serenity_source;

pub use image_client::ImageClient;
pub use serenity_source::SerenityGuildSource;
