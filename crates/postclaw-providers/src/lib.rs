//! # PostClaw Providers
//!
//! Remote services behind the collaborator traits:
//! - [`CloudinaryStore`]: media hosting (`ObjectStore`)
//! - [`InstagramTarget`]: Graph API container/publish (`PublishTarget`)

pub mod cloudinary;
pub mod instagram;

pub use cloudinary::CloudinaryStore;
pub use instagram::InstagramTarget;
