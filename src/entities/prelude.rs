pub use super::advertisers::Entity as Advertisers;
pub use super::likes::Entity as Likes;
pub use super::listings::Entity as Listings;
