pub mod comment;
pub mod favorite;
pub mod publication;
pub mod user;

pub use self::{
    comment::Comment,
    favorite::Favorite,
    publication::Publication,
    user::User,
};
